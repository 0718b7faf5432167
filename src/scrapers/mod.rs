//! Archive scraping: page fetching, article extraction, and the pagination walk.
//!
//! The pipeline has three pieces:
//!
//! 1. **Fetching** ([`archive`]): download page `N` of the author's archive
//! 2. **Extraction** ([`extract`]): decode the JSON-LD blocks on that page into [`Article`]s
//! 3. **Walking** ([`collect_articles`]): repeat from page 1 until a page yields nothing
//!
//! Pages are fetched strictly in order, one at a time, because only an empty
//! page tells the walk where the archive ends.

pub mod archive;
pub mod extract;

use crate::error::Result;
use crate::models::Article;
use extract::Extractor;
use std::future::Future;
use tracing::{info, instrument};

/// Source of raw archive pages.
pub trait PageSource {
    /// Fetch a 1-based page. `Ok(None)` means the page does not exist.
    fn fetch_page(&self, page: u32) -> impl Future<Output = Result<Option<String>>> + Send;
}

/// Walk the archive from page 1 and collect every article, in page order.
///
/// Stops at the first page that yields no articles, whether the page was
/// missing, empty, or held no blocks for the author. Any fetch or
/// extraction error aborts the walk.
#[instrument(level = "info", skip_all)]
pub async fn collect_articles<S>(source: &S, extractor: &Extractor) -> Result<Vec<Article>>
where
    S: PageSource + Sync,
{
    let mut articles = Vec::new();

    for page in 1u32.. {
        let page_articles = match source.fetch_page(page).await? {
            Some(html) => extractor.extract_page(page, &html)?,
            None => Vec::new(),
        };

        if page_articles.is_empty() {
            info!(
                last_page = page - 1,
                count = articles.len(),
                "Reached end of archive"
            );
            break;
        }

        info!(page, count = page_articles.len(), "Collected page of articles");
        articles.extend(page_articles);
    }

    Ok(articles)
}


#[cfg(test)]
mod tests {
    use super::testing::{FakeArchive, FakePage, archive_page};
    use super::*;
    use crate::error::Error;
    use chrono_tz::America::Los_Angeles;

    fn extractor() -> Extractor {
        Extractor::new("Sarah Salisbury", Los_Angeles)
    }

    fn titles(articles: &[Article]) -> Vec<&str> {
        articles.iter().map(|a| a.title.as_str()).collect()
    }

    #[tokio::test]
    async fn test_collect_stops_at_empty_page() {
        let archive = FakeArchive::new(vec![
            FakePage::Html(archive_page(&[
                ("One", "2023-01-05T10:00:00-08:00"),
                ("Two", "2023-01-04T10:00:00-08:00"),
            ])),
            FakePage::Html(archive_page(&[("Three", "2023-01-03T10:00:00-08:00")])),
            FakePage::Html(String::new()),
            FakePage::Html(archive_page(&[("Never", "2023-01-01T10:00:00-08:00")])),
        ]);

        let articles = collect_articles(&archive, &extractor()).await.unwrap();

        assert_eq!(titles(&articles), vec!["One", "Two", "Three"]);
        assert_eq!(archive.requested(), vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn test_collect_not_found_terminates_like_empty_page() {
        let archive = FakeArchive::new(vec![
            FakePage::Html(archive_page(&[("One", "2023-01-05T10:00:00-08:00")])),
            FakePage::NotFound,
            FakePage::Html(archive_page(&[("Never", "2023-01-01T10:00:00-08:00")])),
        ]);

        let articles = collect_articles(&archive, &extractor()).await.unwrap();

        assert_eq!(titles(&articles), vec!["One"]);
        assert_eq!(archive.requested(), vec![1, 2]);
    }

    #[tokio::test]
    async fn test_collect_page_without_author_blocks_terminates() {
        let archive = FakeArchive::new(vec![FakePage::Html(
            "<html><script>{\"@type\": \"Organization\"}</script></html>".to_string(),
        )]);

        let articles = collect_articles(&archive, &extractor()).await.unwrap();

        assert!(articles.is_empty());
        assert_eq!(archive.requested(), vec![1]);
    }

    #[tokio::test]
    async fn test_collect_propagates_transport_failure() {
        let archive = FakeArchive::new(vec![
            FakePage::Html(archive_page(&[("One", "2023-01-05T10:00:00-08:00")])),
            FakePage::Unreachable,
        ]);

        let result = collect_articles(&archive, &extractor()).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_collect_propagates_malformed_block() {
        let archive = FakeArchive::new(vec![FakePage::Html(
            r#"<script>{"name": "x", "author": {"name": "Sarah Salisbury",},}</script>"#
                .to_string(),
        )]);

        let err = collect_articles(&archive, &extractor()).await.unwrap_err();
        assert!(matches!(err, Error::MalformedMetadata { page: 1, .. }));
    }
}

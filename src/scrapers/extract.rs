//! Article extraction from archive page markup.
//!
//! Archive pages embed one JSON-LD `<script>` block per listed article, next to
//! unrelated blocks (site search box, organization, other authors). Blocks are
//! pre-filtered on the author's display name before any JSON decoding, so
//! unrelated garbage never fails a page, while a broken block that does
//! mention the author does.
//!
//! A candidate block looks like:
//!
//! ```json
//! {
//!     "mainEntityOfPage": { "@type": "WebPage", "@id": "https://..." },
//!     "name": "Fish &amp; Chips",
//!     "author": { "name": "Sarah Salisbury" },
//!     "datePublished": "2025-04-01T16:03:01-07:00"
//! }
//! ```

use crate::error::{Error, Result};
use crate::models::Article;
use crate::utils::{parse_timestamp, truncate_for_log};
use chrono_tz::Tz;
use once_cell::sync::Lazy;
use scraper::{Html, Selector};
use serde_json::Value;
use std::fmt;
use tracing::{debug, instrument, warn};

static SCRIPT_SELECTOR: Lazy<Selector> = Lazy::new(|| Selector::parse("script").unwrap());

/// Why a syntactically valid block produced no article.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    MissingName,
    MissingUrl,
    MissingDate,
    InvalidDate(String),
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::MissingName => write!(f, "missing name"),
            SkipReason::MissingUrl => write!(f, "missing mainEntityOfPage.@id"),
            SkipReason::MissingDate => write!(f, "missing datePublished"),
            SkipReason::InvalidDate(raw) => write!(f, "unparseable datePublished {:?}", raw),
        }
    }
}

/// Outcome of decoding one well-formed metadata block.
#[derive(Debug, Clone, PartialEq)]
pub enum Extraction {
    Article(Article),
    Skipped(SkipReason),
}

/// Turns archive page markup into articles for one author.
#[derive(Debug, Clone)]
pub struct Extractor {
    author_name: String,
    timezone: Tz,
}

impl Extractor {
    pub fn new(author_name: impl Into<String>, timezone: Tz) -> Self {
        Self {
            author_name: author_name.into(),
            timezone,
        }
    }

    /// Extract all articles from one page, in document order.
    ///
    /// # Errors
    ///
    /// [`Error::MalformedMetadata`] if any block mentioning the author is not
    /// valid JSON. Incomplete blocks are skipped, not errors.
    #[instrument(level = "debug", skip(self, html), fields(bytes = html.len()))]
    pub fn extract_page(&self, page: u32, html: &str) -> Result<Vec<Article>> {
        let document = Html::parse_document(html);
        let mut articles = Vec::new();

        for script in document.select(&SCRIPT_SELECTOR) {
            let text: String = script.text().collect();
            if !text.contains(&self.author_name) {
                continue;
            }

            match self.decode_block(&text) {
                Ok(Extraction::Article(article)) => articles.push(article),
                Ok(Extraction::Skipped(reason)) => {
                    debug!(page, %reason, "Skipping metadata block");
                }
                Err(source) => {
                    let preview = truncate_for_log(text.trim(), 200);
                    warn!(page, error = %source, %preview, "Malformed metadata block");
                    return Err(Error::MalformedMetadata {
                        page,
                        preview,
                        source,
                    });
                }
            }
        }

        debug!(page, count = articles.len(), "Extracted articles from page");
        Ok(articles)
    }

    /// Decode the raw text of one candidate block.
    ///
    /// The outer `Result` is a JSON syntax failure; a valid document that
    /// lacks a usable field is `Ok(Extraction::Skipped)`.
    pub fn decode_block(&self, text: &str) -> std::result::Result<Extraction, serde_json::Error> {
        let value: Value = serde_json::from_str(text.trim())?;
        Ok(self.article_from_value(&value))
    }

    fn article_from_value(&self, value: &Value) -> Extraction {
        let Some(title) = value.get("name").and_then(Value::as_str) else {
            return Extraction::Skipped(SkipReason::MissingName);
        };

        let url = value
            .get("mainEntityOfPage")
            .and_then(|entity| entity.get("@id"))
            .or_else(|| value.get("@id"))
            .and_then(Value::as_str);
        let Some(url) = url else {
            return Extraction::Skipped(SkipReason::MissingUrl);
        };

        let Some(raw_date) = value.get("datePublished").and_then(Value::as_str) else {
            return Extraction::Skipped(SkipReason::MissingDate);
        };
        let Some(date_published) = parse_timestamp(raw_date, self.timezone) else {
            return Extraction::Skipped(SkipReason::InvalidDate(raw_date.to_string()));
        };

        Extraction::Article(Article::new(title, url, date_published))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::DateTime;
    use chrono_tz::America::Los_Angeles;

    const TEST_TITLE: &str = "Fish &amp; Chips";
    const TEST_URL: &str = "https://google.com";
    const TEST_DATE: &str = "2023-01-01T00:00:00-08:00";

    fn extractor() -> Extractor {
        Extractor::new("Sarah Salisbury", Los_Angeles)
    }

    fn block(entity: &str, date: &str) -> String {
        format!(
            r#"
            {{
                "mainEntityOfPage": {{
                    "@type": "WebPage"{entity}
                }},
                "name" : "{TEST_TITLE}",
                "author" : {{
                    "name" : "Sarah Salisbury"
                }},
                "datePublished": "{date}",
                "dateModified": "2025-04-01T16:03:01-07:00"
            }}
            "#
        )
    }

    fn full_block() -> String {
        block(&format!(",\n\"@id\": \"{TEST_URL}\""), TEST_DATE)
    }

    fn page(scripts: &[String]) -> String {
        let body: String = scripts
            .iter()
            .map(|s| format!("<script type=\"application/ld+json\">{s}</script>\n"))
            .collect();
        format!("<html><head></head><body>{body}</body></html>")
    }

    #[test]
    fn test_decode_block_valid_data() {
        let extraction = extractor().decode_block(&full_block()).unwrap();
        let Extraction::Article(article) = extraction else {
            panic!("expected an article, got {:?}", extraction);
        };
        assert_eq!(article.title, TEST_TITLE);
        assert_eq!(article.url, TEST_URL);
        assert_eq!(
            article.date_published,
            DateTime::parse_from_rfc3339(TEST_DATE).unwrap()
        );
    }

    #[test]
    fn test_decode_block_missing_url_is_skipped() {
        let extraction = extractor().decode_block(&block("", TEST_DATE)).unwrap();
        assert_eq!(extraction, Extraction::Skipped(SkipReason::MissingUrl));
    }

    #[test]
    fn test_decode_block_missing_name_is_skipped() {
        let text = format!(
            r#"{{"mainEntityOfPage": {{"@id": "{TEST_URL}"}}, "author": {{"name": "Sarah Salisbury"}}, "datePublished": "{TEST_DATE}"}}"#
        );
        let extraction = extractor().decode_block(&text).unwrap();
        assert_eq!(extraction, Extraction::Skipped(SkipReason::MissingName));
    }

    #[test]
    fn test_decode_block_missing_date_is_skipped() {
        let text = format!(
            r#"{{"mainEntityOfPage": {{"@id": "{TEST_URL}"}}, "name": "Tacos", "author": {{"name": "Sarah Salisbury"}}}}"#
        );
        let extraction = extractor().decode_block(&text).unwrap();
        assert_eq!(extraction, Extraction::Skipped(SkipReason::MissingDate));
    }

    #[test]
    fn test_decode_block_top_level_id_is_accepted() {
        let text = format!(
            r#"{{"@id": "{TEST_URL}", "name": "Tacos", "author": {{"name": "Sarah Salisbury"}}, "datePublished": "{TEST_DATE}"}}"#
        );
        let extraction = extractor().decode_block(&text).unwrap();
        assert!(matches!(extraction, Extraction::Article(a) if a.url == TEST_URL));
    }

    #[test]
    fn test_decode_block_invalid_date_is_skipped() {
        let text = block(&format!(",\n\"@id\": \"{TEST_URL}\""), "01/01/2023");
        let extraction = extractor().decode_block(&text).unwrap();
        assert_eq!(
            extraction,
            Extraction::Skipped(SkipReason::InvalidDate("01/01/2023".to_string()))
        );
    }

    #[test]
    fn test_decode_block_trailing_commas_is_syntax_error() {
        let text = r#"
            {
                "mainEntityOfPage": { "@type": "WebPage", },
                "name" : "Fish &amp; Chips",
                "author" : { "name" : "Sarah Salisbury", },
            }
        "#;
        assert!(extractor().decode_block(text).is_err());
    }

    #[test]
    fn test_extract_page_filters_unrelated_scripts() {
        let html = page(&[
            full_block(),
            r#"{ "key": "This script should be filtered." }"#.to_string(),
        ]);

        let articles = extractor().extract_page(1, &html).unwrap();

        assert_eq!(articles.len(), 1);
        assert_eq!(articles[0].title, TEST_TITLE);
        assert_eq!(articles[0].url, TEST_URL);
    }

    #[test]
    fn test_extract_page_unrelated_malformed_script_is_ignored() {
        let html = page(&[full_block(), "var x = {not: json};".to_string()]);
        let articles = extractor().extract_page(1, &html).unwrap();
        assert_eq!(articles.len(), 1);
    }

    #[test]
    fn test_extract_page_tolerates_incomplete_block() {
        let html = page(&[full_block(), block("", TEST_DATE)]);
        let articles = extractor().extract_page(1, &html).unwrap();
        assert_eq!(articles.len(), 1);
    }

    #[test]
    fn test_extract_page_skips_nameless_author_block() {
        let nameless = format!(
            r#"{{"@type": "ProfilePage", "@id": "{TEST_URL}", "author": {{"name": "Sarah Salisbury"}}, "datePublished": "{TEST_DATE}"}}"#
        );
        let html = page(&[nameless, full_block()]);

        let articles = extractor().extract_page(1, &html).unwrap();

        assert_eq!(articles.len(), 1);
        assert_eq!(articles[0].title, TEST_TITLE);
    }

    #[test]
    fn test_extract_page_malformed_author_block_is_fatal() {
        let html = page(&[
            full_block(),
            r#"{ "name": "Broken", "author": { "name": "Sarah Salisbury", }, }"#.to_string(),
        ]);

        let err = extractor().extract_page(7, &html).unwrap_err();
        assert!(matches!(err, Error::MalformedMetadata { page: 7, .. }));
    }

    #[test]
    fn test_extract_page_preserves_document_order() {
        let second = full_block()
            .replace(TEST_TITLE, "Second")
            .replace(TEST_DATE, "2023-03-01T00:00:00-08:00");
        let html = page(&[full_block(), second]);

        let articles = extractor().extract_page(1, &html).unwrap();

        let titles: Vec<&str> = articles.iter().map(|a| a.title.as_str()).collect();
        assert_eq!(titles, vec![TEST_TITLE, "Second"]);
    }

    #[test]
    fn test_extract_page_empty_document() {
        assert!(extractor().extract_page(1, "").unwrap().is_empty());
    }
}

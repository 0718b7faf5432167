//! Check cycle and read-only listing, shared by the CLI and the HTTP service.
//!
//! A check cycle runs to completion in one task:
//!
//! 1. read the watermark (default: `lookback_days` before now)
//! 2. walk the whole archive
//! 3. keep articles published at or after the watermark, newest first
//! 4. if any, send one digest and move the watermark to the cycle's start
//!
//! The watermark is never written when nothing new was found, so articles
//! that show up late with an older publish date are still caught next time.
//! Overlapping cycles are not guarded against; triggers are expected to be
//! infrequent and serialized by whatever schedules them.

use crate::config::Settings;
use crate::error::Result;
use crate::filter::new_articles;
use crate::models::Article;
use crate::notify::Notifier;
use crate::scrapers::extract::Extractor;
use crate::scrapers::{PageSource, collect_articles};
use crate::utils::{days_before, now_in};
use crate::watermark::WatermarkStore;
use chrono::{DateTime, FixedOffset};
use tracing::{info, instrument};

/// Result of one check cycle.
#[derive(Debug, Clone, PartialEq)]
pub enum CheckOutcome {
    /// Nothing at or after the watermark; watermark left as it was.
    NoNewArticles,
    /// A digest was sent and the watermark advanced.
    Notified {
        articles: Vec<Article>,
        watermark: DateTime<FixedOffset>,
    },
}

/// The archive pipeline wired to its collaborators.
#[derive(Debug)]
pub struct DigestService<S, W, N> {
    source: S,
    store: W,
    notifier: N,
    extractor: Extractor,
    settings: Settings,
}

impl<S, W, N> DigestService<S, W, N>
where
    S: PageSource + Sync,
    W: WatermarkStore,
    N: Notifier + Sync,
{
    pub fn new(source: S, store: W, notifier: N, settings: Settings) -> Self {
        let extractor = Extractor::new(settings.target.author_name.clone(), settings.timezone);
        Self {
            source,
            store,
            notifier,
            extractor,
            settings,
        }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Run a check cycle starting now.
    pub async fn check(&self) -> Result<CheckOutcome> {
        self.check_at(now_in(self.settings.timezone)).await
    }

    /// Run a check cycle that started at `started`.
    ///
    /// Any fetch, extraction, or delivery error aborts the cycle before the
    /// watermark is touched.
    #[instrument(level = "info", skip(self, started), fields(started = %started.to_rfc3339()))]
    pub async fn check_at(&self, started: DateTime<FixedOffset>) -> Result<CheckOutcome> {
        let watermark = match self.store.get() {
            Some(watermark) => watermark,
            None => {
                let fallback = days_before(started, self.settings.lookback_days)?;
                info!(
                    fallback = %fallback.to_rfc3339(),
                    "No stored watermark; using default lookback"
                );
                fallback
            }
        };

        let all = collect_articles(&self.source, &self.extractor).await?;
        let fresh: Vec<Article> = new_articles(all, watermark).collect();

        if fresh.is_empty() {
            info!(watermark = %watermark.to_rfc3339(), "No new articles; watermark unchanged");
            return Ok(CheckOutcome::NoNewArticles);
        }

        info!(count = fresh.len(), watermark = %watermark.to_rfc3339(), "Found new articles");
        self.notifier.notify(&fresh).await?;
        self.store.set(started)?;
        info!(watermark = %started.to_rfc3339(), "Advanced watermark");

        Ok(CheckOutcome::Notified {
            articles: fresh,
            watermark: started,
        })
    }

    /// Articles published in the last `days` days, newest first, plus the
    /// cutoff used. Does not read or write the watermark.
    #[instrument(level = "info", skip(self))]
    pub async fn recent(&self, days: i64) -> Result<(Vec<Article>, DateTime<FixedOffset>)> {
        let since = days_before(now_in(self.settings.timezone), days)?;
        let all = collect_articles(&self.source, &self.extractor).await?;
        let articles: Vec<Article> = new_articles(all, since).collect();
        info!(count = articles.len(), since = %since.to_rfc3339(), "Listed recent articles");
        Ok((articles, since))
    }
}

/// Check an `Authorization` header value against the configured token.
///
/// Accepts exactly `Bearer <token>` (scheme case-insensitive). An empty
/// configured token rejects everything.
pub fn verify_bearer(header: Option<&str>, expected: &str) -> bool {
    let Some(header) = header else {
        return false;
    };
    let parts: Vec<&str> = header.split_whitespace().collect();
    let [scheme, token] = parts.as_slice() else {
        return false;
    };
    if !scheme.eq_ignore_ascii_case("bearer") || expected.is_empty() {
        return false;
    }
    *token == expected
}

#[cfg(test)]
impl<S, W, N> DigestService<S, W, N> {
    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn store(&self) -> &W {
        &self.store
    }

    pub fn notifier(&self) -> &N {
        &self.notifier
    }
}


#[cfg(test)]
mod tests {
    use super::testing::fake_service;
    use super::*;
    use crate::notify::testing::RecordingNotifier;
    use crate::scrapers::testing::{FakeArchive, FakePage, archive_page};
    use crate::watermark::WatermarkStore;

    fn at(raw: &str) -> DateTime<FixedOffset> {
        DateTime::parse_from_rfc3339(raw).unwrap()
    }

    fn archive() -> FakeArchive {
        FakeArchive::new(vec![
            FakePage::Html(archive_page(&[
                ("Jan 1", "2023-01-01T00:00:00-08:00"),
                ("Dec 30", "2022-12-30T00:00:00-08:00"),
            ])),
            FakePage::Html(archive_page(&[("Jan 2", "2023-01-02T00:00:00-08:00")])),
        ])
    }

    fn titles(articles: &[Article]) -> Vec<&str> {
        articles.iter().map(|a| a.title.as_str()).collect()
    }

    #[tokio::test]
    async fn test_check_notifies_and_advances_watermark() {
        let initial = at("2023-01-01T00:00:00-08:00");
        let started = at("2023-01-05T08:00:00-08:00");
        let service = fake_service(archive(), Some(initial), RecordingNotifier::default());

        let outcome = service.check_at(started).await.unwrap();

        let sent = service.notifier().sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(titles(&sent[0]), vec!["Jan 2", "Jan 1"]);
        assert_eq!(service.store().get(), Some(started));
        assert_eq!(service.store().writes(), 1);
        assert!(matches!(outcome, CheckOutcome::Notified { watermark, .. } if watermark == started));
    }

    #[tokio::test]
    async fn test_check_without_new_articles_leaves_watermark() {
        let initial = at("2023-02-01T00:00:00-08:00");
        let service = fake_service(archive(), Some(initial), RecordingNotifier::default());

        let outcome = service.check_at(at("2023-02-05T08:00:00-08:00")).await.unwrap();

        assert_eq!(outcome, CheckOutcome::NoNewArticles);
        assert!(service.notifier().sent().is_empty());
        assert_eq!(service.store().get(), Some(initial));
        assert_eq!(service.store().writes(), 0);
    }

    #[tokio::test]
    async fn test_check_missing_watermark_uses_lookback() {
        // Started Jan 8: the default week reaches back to Jan 1 exactly.
        let started = at("2023-01-08T00:00:00-08:00");
        let service = fake_service(archive(), None, RecordingNotifier::default());

        service.check_at(started).await.unwrap();

        let sent = service.notifier().sent();
        assert_eq!(titles(&sent[0]), vec!["Jan 2", "Jan 1"]);
        assert_eq!(service.store().get(), Some(started));
    }

    #[tokio::test]
    async fn test_failed_delivery_does_not_advance_watermark() {
        let initial = at("2023-01-01T00:00:00-08:00");
        let service = fake_service(archive(), Some(initial), RecordingNotifier::failing());

        let result = service.check_at(at("2023-01-05T08:00:00-08:00")).await;

        assert!(result.is_err());
        assert_eq!(service.store().get(), Some(initial));
    }

    #[tokio::test]
    async fn test_fetch_failure_aborts_cycle() {
        let initial = at("2022-01-01T00:00:00-08:00");
        let archive = FakeArchive::new(vec![
            FakePage::Html(archive_page(&[("Jan 1", "2023-01-01T00:00:00-08:00")])),
            FakePage::Unreachable,
        ]);
        let service = fake_service(archive, Some(initial), RecordingNotifier::default());

        let result = service.check_at(at("2023-01-05T08:00:00-08:00")).await;

        assert!(result.is_err());
        assert!(service.notifier().sent().is_empty());
        assert_eq!(service.store().writes(), 0);
    }

    #[tokio::test]
    async fn test_recent_does_not_touch_watermark() {
        let initial = at("2023-01-01T00:00:00-08:00");
        let service = fake_service(archive(), Some(initial), RecordingNotifier::default());

        // The fixture dates are years old, so nothing is in the last week.
        let (articles, _since) = service.recent(7).await.unwrap();

        assert!(articles.is_empty());
        assert_eq!(service.store().writes(), 0);
        assert!(service.notifier().sent().is_empty());
    }

    #[tokio::test]
    async fn test_recent_with_wide_window_lists_everything() {
        let service = fake_service(archive(), None, RecordingNotifier::default());

        let (articles, _since) = service.recent(365 * 200).await.unwrap();

        assert_eq!(titles(&articles), vec!["Jan 2", "Jan 1", "Dec 30"]);
    }

    #[tokio::test]
    async fn test_recent_rejects_out_of_range_window_before_fetching() {
        let service = fake_service(archive(), None, RecordingNotifier::default());

        let negative = service.recent(-30).await.unwrap_err();
        let huge = service.recent(200_000_000).await.unwrap_err();

        assert!(matches!(negative, crate::error::Error::Config(_)));
        assert!(matches!(huge, crate::error::Error::Config(_)));
        assert!(service.source().requested().is_empty());
    }

    #[test]
    fn test_verify_bearer() {
        assert!(verify_bearer(Some("Bearer valid_token"), "valid_token"));
        assert!(verify_bearer(Some("bearer valid_token"), "valid_token"));
        assert!(!verify_bearer(None, "valid_token"));
        assert!(!verify_bearer(Some("malformed credentials"), "valid_token"));
        assert!(!verify_bearer(Some("Bearer invalid_token"), "valid_token"));
        assert!(!verify_bearer(Some("Bearer"), "valid_token"));
        assert!(!verify_bearer(Some("Bearer a b"), "valid_token"));
        assert!(!verify_bearer(Some("Bearer "), ""));
        assert!(!verify_bearer(Some("Bearer anything"), ""));
    }
}

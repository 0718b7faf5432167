//! Data models for archive articles.
//!
//! [`Article`] is the only record the pipeline produces. It is built by the
//! extractor from one JSON-LD block on an archive page and flows unchanged
//! through the change filter into the digest and the home page.

use crate::utils::decode_html_entities;
use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};

/// One published article from the author's archive.
///
/// Two articles are equal when title, url and publish instant all match.
/// Instants are compared in UTC, so the same moment written with different
/// offsets is the same article.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Article {
    /// Headline as it appears in the metadata block; may still contain HTML entities.
    pub title: String,
    /// Canonical permalink.
    pub url: String,
    /// Publish instant, always offset-aware.
    pub date_published: DateTime<FixedOffset>,
}

impl Article {
    pub fn new(
        title: impl Into<String>,
        url: impl Into<String>,
        date_published: DateTime<FixedOffset>,
    ) -> Self {
        Self {
            title: title.into(),
            url: url.into(),
            date_published,
        }
    }

    /// Title with HTML entities decoded, e.g. `Fish &amp; Chips` -> `Fish & Chips`.
    pub fn pretty_title(&self) -> String {
        decode_html_entities(&self.title)
    }

    /// Publish date as `MM/DD/YYYY` in the offset the site published it with.
    pub fn pretty_date(&self) -> String {
        self.date_published.format("%m/%d/%Y").to_string()
    }
}

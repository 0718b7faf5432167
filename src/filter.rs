//! Change detection against the watermark.

use crate::models::Article;
use chrono::{DateTime, FixedOffset};
use itertools::Itertools;

/// Articles published at or after `watermark`, most recent first.
///
/// The whole collection is sorted before filtering because archive listing
/// order does not follow publish dates reliably. The sort is stable, so
/// articles sharing a timestamp keep their fetch order. The returned
/// iterator is single-pass; collect it if it must be counted and consumed.
pub fn new_articles(
    articles: Vec<Article>,
    watermark: DateTime<FixedOffset>,
) -> impl Iterator<Item = Article> {
    articles
        .into_iter()
        .sorted_by(|a, b| b.date_published.cmp(&a.date_published))
        .filter(move |a| a.date_published >= watermark)
}

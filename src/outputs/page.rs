//! Home page rendering for the HTTP service.

use crate::models::Article;
use crate::utils::escape_html;
use chrono::{DateTime, FixedOffset};
use std::fmt::Write;

/// Render the "published since" page.
pub fn render_home(articles: &[Article], since: DateTime<FixedOffset>) -> String {
    let since = since.format("%m/%d/%Y").to_string();
    let mut html = String::new();

    writeln!(html, "<!DOCTYPE html>").unwrap();
    writeln!(html, "<html lang=\"en\">").unwrap();
    writeln!(html, "<head>").unwrap();
    writeln!(html, "<meta charset=\"utf-8\">").unwrap();
    writeln!(html, "<title>New Cozymeal Articles</title>").unwrap();
    writeln!(html, "</head>").unwrap();
    writeln!(html, "<body>").unwrap();
    writeln!(html, "<h1>Articles published since {}</h1>", since).unwrap();
    writeln!(html, "<div class=\"articles\">").unwrap();

    if articles.is_empty() {
        writeln!(html, "<p class=\"empty\">No new articles!</p>").unwrap();
    }
    for article in articles {
        writeln!(
            html,
            "<p class=\"article\"><a class=\"article-title\" href=\"{}\">{}</a> <span class=\"article-date\">{}</span></p>",
            escape_html(&article.url),
            escape_html(&article.pretty_title()),
            article.pretty_date()
        )
        .unwrap();
    }

    writeln!(html, "</div>").unwrap();
    writeln!(html, "</body>").unwrap();
    writeln!(html, "</html>").unwrap();
    html
}

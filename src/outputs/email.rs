//! Digest message rendering.
//!
//! Produces the plain-text and HTML bodies of the "new articles" email. Both
//! list the articles in the order given, which callers keep most recent first.

use crate::models::Article;
use crate::utils::escape_html;
use std::fmt::Write;

pub const DIGEST_SUBJECT: &str = "New Cozymeal Articles";
const DIGEST_INTRO: &str = "Some new articles were published from your backlog!";

/// Both bodies of one digest email.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Digest {
    pub subject: String,
    pub text: String,
    pub html: String,
}

/// Render the digest for a non-empty list of new articles.
///
/// The plain-text body has one line per article:
///
/// ```text
/// Some new articles were published from your backlog!
///
/// 01/02/2023: Fish & Chips (https://...)
/// ```
pub fn render_digest(articles: &[Article]) -> Digest {
    Digest {
        subject: DIGEST_SUBJECT.to_string(),
        text: render_text(articles),
        html: render_html(articles),
    }
}

fn render_text(articles: &[Article]) -> String {
    let mut text = String::new();
    writeln!(text, "{}", DIGEST_INTRO).unwrap();
    for article in articles {
        write!(
            text,
            "\n{}: {} ({})",
            article.pretty_date(),
            article.pretty_title(),
            article.url
        )
        .unwrap();
    }
    text
}

fn render_html(articles: &[Article]) -> String {
    let mut html = String::new();
    writeln!(html, "<html>").unwrap();
    writeln!(html, "<body>").unwrap();
    writeln!(html, "<p>{}</p>", escape_html(DIGEST_INTRO)).unwrap();
    writeln!(html, "<ul>").unwrap();
    for article in articles {
        writeln!(
            html,
            "<li><a href=\"{}\">{}</a> <small>{}</small></li>",
            escape_html(&article.url),
            escape_html(&article.pretty_title()),
            article.pretty_date()
        )
        .unwrap();
    }
    writeln!(html, "</ul>").unwrap();
    writeln!(html, "</body>").unwrap();
    writeln!(html, "</html>").unwrap();
    html
}

//! Crate-wide error type.
//!
//! Only failures that abort a check cycle live here. A "not found" archive
//! page and an incomplete metadata block are ordinary outcomes and are
//! modelled in the scraper types instead.

use thiserror::Error;

/// Fatal errors surfaced to the invoking boundary.
#[derive(Error, Debug)]
pub enum Error {
    /// Network-level failure while fetching an archive page (connect, DNS, timeout, body read).
    #[error("transport failure fetching {url}: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// A candidate metadata block on an archive page was not valid JSON.
    #[error("malformed metadata block on page {page}: {source} (block: {preview})")]
    MalformedMetadata {
        page: u32,
        preview: String,
        #[source]
        source: serde_json::Error,
    },

    /// The watermark could not be persisted.
    #[error("failed to persist watermark to {path}: {reason}")]
    Watermark { path: String, reason: String },

    /// The digest could not be built or delivered.
    #[error("failed to deliver digest: {0}")]
    Notify(String),

    /// Invalid runtime settings.
    #[error("invalid configuration: {0}")]
    Config(String),
}

impl Error {
    pub fn transport<U: Into<String>>(url: U, source: reqwest::Error) -> Self {
        Self::Transport {
            url: url.into(),
            source,
        }
    }

    pub fn watermark<P: Into<String>, R: ToString>(path: P, reason: R) -> Self {
        Self::Watermark {
            path: path.into(),
            reason: reason.to_string(),
        }
    }

    pub fn notify<R: ToString>(reason: R) -> Self {
        Self::Notify(reason.to_string())
    }

    pub fn config<M: Into<String>>(message: M) -> Self {
        Self::Config(message.into())
    }
}

pub type Result<T> = std::result::Result<T, Error>;

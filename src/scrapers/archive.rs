//! Archive page fetcher.
//!
//! Pulls one page of the author's archive listing over HTTP. Page `N` lives at
//! `{archive_url}?page=N`; asking past the last page makes the site answer
//! with an error status, which is how pagination learns it is done.

use super::PageSource;
use crate::error::{Error, Result};
use reqwest::Client;
use tracing::{debug, info, instrument, warn};
use url::Url;

/// Fetches archive pages with a shared `reqwest` client.
#[derive(Debug, Clone)]
pub struct ArchiveClient {
    client: Client,
    archive_url: Url,
}

impl ArchiveClient {
    pub fn new(archive_url: Url) -> Self {
        Self {
            client: Client::new(),
            archive_url,
        }
    }

    /// URL of a 1-based archive page.
    pub fn page_url(&self, page: u32) -> Url {
        let mut url = self.archive_url.clone();
        url.query_pairs_mut().append_pair("page", &page.to_string());
        url
    }
}

impl PageSource for ArchiveClient {
    /// Fetch one archive page.
    ///
    /// Returns `Ok(None)` when the server answers with an error status: the
    /// walk has run past the last page. Connection, DNS, timeout and body
    /// read failures are returned as [`Error::Transport`].
    #[instrument(level = "info", skip(self))]
    async fn fetch_page(&self, page: u32) -> Result<Option<String>> {
        let url = self.page_url(page);

        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| Error::transport(url.as_str(), e))?;

        let response = match response.error_for_status() {
            Ok(response) => response,
            Err(e) => {
                let status = e.status().map(|s| s.as_u16()).unwrap_or_default();
                if e.status().is_some_and(|s| s.is_server_error()) {
                    warn!(%url, status, "Archive page returned a server error; treating as end of archive");
                } else {
                    debug!(%url, status, "Archive page not available; end of archive");
                }
                return Ok(None);
            }
        };

        let body = response
            .text()
            .await
            .map_err(|e| Error::transport(url.as_str(), e))?;

        info!(page, bytes = body.len(), "Fetched archive page");
        Ok(Some(body))
    }
}

//! Authenticated download of file attachments.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Url;
use secrecy::{ExposeSecret, SecretString};

use crate::domain::{AppError, Result};

/// Bytes of a downloaded file.
#[derive(Debug, Clone)]
pub struct Download {
    pub bytes: Vec<u8>,
    /// The server redirected the request. For Slack this usually means the
    /// token lacks the `files:read` scope and `bytes` is a login page.
    pub redirected: bool,
}

/// Fetches file contents by URL.
#[async_trait]
pub trait FileFetcher: Send + Sync {
    /// Downloads `url`.
    ///
    /// # Errors
    /// Returns `AppError::Transport` on timeouts, connection failures and
    /// non-success statuses.
    async fn fetch(&self, url: &str) -> Result<Download>;
}

/// [`FileFetcher`] over HTTP with a bearer token and connect/read timeouts.
pub struct HttpFileFetcher {
    http: reqwest::Client,
    token: SecretString,
}

impl HttpFileFetcher {
    /// Creates a downloader.
    ///
    /// # Errors
    /// Returns error if the HTTP client cannot be built.
    pub fn new(
        token: SecretString,
        connect_timeout: Duration,
        read_timeout: Duration,
    ) -> Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent(concat!("slack-history-export/", env!("CARGO_PKG_VERSION")))
            .connect_timeout(connect_timeout)
            .read_timeout(read_timeout)
            .build()
            .map_err(|e| AppError::transport("Failed to build HTTP client", e))?;

        Ok(Self { http, token })
    }
}

#[async_trait]
impl FileFetcher for HttpFileFetcher {
    async fn fetch(&self, url: &str) -> Result<Download> {
        let requested = Url::parse(url).map_err(|e| AppError::InvalidData {
            message: format!("Invalid file URL {url}: {e}"),
        })?;

        let response = self
            .http
            .get(requested.clone())
            .bearer_auth(self.token.expose_secret())
            .send()
            .await
            .map_err(|e| AppError::transport("Download failed", e))?;

        let redirected = response.url() != &requested;

        let response = response
            .error_for_status()
            .map_err(|e| AppError::transport("Download failed", e))?;

        let bytes = response
            .bytes()
            .await
            .map_err(|e| AppError::transport("Download body read failed", e))?;

        Ok(Download {
            bytes: bytes.to_vec(),
            redirected,
        })
    }
}

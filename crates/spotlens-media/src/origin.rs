//! Remote origins that serve asset bytes.
//!
//! The pipeline only sees the [`Origin`] trait, so tests substitute
//! [`MockOrigin`](crate::MockOrigin) for the HTTP client.

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::Client;
use tracing::debug;

use crate::config::FetchConfig;
use crate::error::{Error, Result};

/// Why an origin could not deliver bytes.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FetchError {
    /// The origin answered with a non-2xx status.
    #[error("HTTP {status} from {url}")]
    Status { status: u16, url: String },

    /// No response within the configured timeout.
    #[error("Request to {url} timed out")]
    Timeout { url: String },

    /// Connection, TLS or body read failure.
    #[error("Transport error for {url}: {message}")]
    Transport { url: String, message: String },
}

/// A source of raw asset bytes, addressed by URL.
///
/// # Example
///
/// ```ignore
/// use spotlens_media::{Origin, FetchError};
///
/// async fn size_of<O: Origin + ?Sized>(origin: &O, url: &str) -> Result<usize, FetchError> {
///     Ok(origin.fetch(url).await?.len())
/// }
/// ```
#[async_trait]
pub trait Origin: Send + Sync {
    /// Issue one GET for `url` and return the response body.
    async fn fetch(&self, url: &str) -> std::result::Result<Bytes, FetchError>;
}

/// [`Origin`] backed by a `reqwest` client.
#[derive(Debug, Clone)]
pub struct HttpOrigin {
    client: Client,
}

impl HttpOrigin {
    /// Build a client with the configured timeout and user agent.
    pub fn new(config: &FetchConfig) -> Result<Self> {
        config.validate()?;
        let client = Client::builder()
            .timeout(config.timeout)
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(|e| Error::InvalidConfig(format!("HTTP client: {e}")))?;
        Ok(Self { client })
    }
}

#[async_trait]
impl Origin for HttpOrigin {
    async fn fetch(&self, url: &str) -> std::result::Result<Bytes, FetchError> {
        debug!("GET {}", url);
        let classify = |e: reqwest::Error| {
            if e.is_timeout() {
                FetchError::Timeout {
                    url: url.to_string(),
                }
            } else {
                FetchError::Transport {
                    url: url.to_string(),
                    message: e.to_string(),
                }
            }
        };

        let response = self.client.get(url).send().await.map_err(classify)?;
        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        let body = response.bytes().await.map_err(classify)?;
        debug!("GET {} -> {} bytes", url, body.len());
        Ok(body)
    }
}

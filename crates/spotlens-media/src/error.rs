//! Error types for spotlens-media.
//!
//! Every failure in this crate is local to a single request and never fatal
//! to the host process.
//!
//! # Handling Strategies
//!
//! | Error Type | Strategy | Rationale |
//! |------------|----------|-----------|
//! | [`Error::NotFound`] | Show a placeholder | No cached copy and no origin to ask |
//! | [`Error::DecodeFailure`] | Show a placeholder | Bytes are not an image; a cached copy is dropped |
//! | [`Error::FetchFailure`] | Let the user retry | Network or origin trouble |
//! | [`Error::PersistFailure`] | Log only | The pipeline still returns the fetched asset |
//! | [`Error::InvalidKey`] | Do not retry | The identifier cannot name a cache file |
//! | [`Error::InvalidConfig`] | Fix configuration | Reported at construction |
//!
//! Nothing is retried automatically. Callers re-invoke
//! [`FetchPipeline::fetch_or_load`](crate::FetchPipeline::fetch_or_load),
//! for instance on pull-to-refresh.
//!
//! Errors are `Clone` because a single in-flight fetch delivers its outcome
//! to every request that joined it.

use std::io;
use std::sync::Arc;

use thiserror::Error;

use spotlens_types::CacheKey;

use crate::origin::FetchError;

/// Errors that can occur while loading or caching media.
///
/// This enum is marked `#[non_exhaustive]` to allow adding new error variants
/// in future versions without breaking downstream code.
#[derive(Debug, Clone, Error)]
#[non_exhaustive]
pub enum Error {
    /// The bytes could not be decoded as an image.
    #[error("Failed to decode image '{key}': {reason}")]
    DecodeFailure { key: CacheKey, reason: String },

    /// Nothing is cached under the key and there is no origin to fetch from.
    #[error("Asset not found: {0}")]
    NotFound(CacheKey),

    /// The origin could not deliver the asset.
    #[error("Failed to fetch {url}: {source}")]
    FetchFailure {
        url: String,
        #[source]
        source: FetchError,
    },

    /// Writing the asset to the cache failed.
    #[error("Failed to persist '{key}': {reason}")]
    PersistFailure { key: CacheKey, reason: String },

    /// The key cannot be used as a cache file name.
    #[error("Invalid cache key: {0:?}")]
    InvalidKey(String),

    /// Configuration rejected at construction.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// I/O error outside of a cache write.
    #[error("I/O error: {0}")]
    Io(Arc<io::Error>),

    /// A background decode or fetch task panicked or was cancelled.
    #[error("Background task failed: {0}")]
    Join(String),
}

impl Error {
    /// Whether this error means "nothing to show" rather than a fault.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::NotFound(_))
    }

    pub(crate) fn persist(key: &CacheKey, reason: impl ToString) -> Self {
        Error::PersistFailure {
            key: key.clone(),
            reason: reason.to_string(),
        }
    }
}

impl From<io::Error> for Error {
    fn from(err: io::Error) -> Self {
        Error::Io(Arc::new(err))
    }
}

impl From<tokio::task::JoinError> for Error {
    fn from(err: tokio::task::JoinError) -> Self {
        Error::Join(err.to_string())
    }
}

/// Result type alias using spotlens-media's Error type.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::NotFound(CacheKey::new("abc"));
        assert_eq!(err.to_string(), "Asset not found: abc");

        let err = Error::InvalidKey("../etc".to_string());
        assert_eq!(err.to_string(), "Invalid cache key: \"../etc\"");

        let err = Error::FetchFailure {
            url: "https://cdn.example.com/a.jpg".to_string(),
            source: FetchError::Status {
                status: 404,
                url: "https://cdn.example.com/a.jpg".to_string(),
            },
        };
        assert!(err.to_string().starts_with("Failed to fetch https://cdn.example.com/a.jpg"));
    }

    #[test]
    fn test_io_error_conversion_is_cloneable() {
        let err: Error = io::Error::new(io::ErrorKind::PermissionDenied, "denied").into();
        let copy = err.clone();
        assert!(matches!(copy, Error::Io(_)));
        assert!(copy.to_string().contains("denied"));
    }

    #[test]
    fn test_is_not_found() {
        assert!(Error::NotFound(CacheKey::new("k")).is_not_found());
        assert!(!Error::Join("boom".into()).is_not_found());
    }
}

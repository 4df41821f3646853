//! Construction parameters for the cache and the HTTP origin.

use std::path::PathBuf;
use std::time::Duration;

use crate::error::{Error, Result};
use crate::eviction::EvictionPolicy;
use crate::imaging::DEFAULT_JPEG_QUALITY;

/// Default HTTP timeout for origin fetches.
pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(30);

/// Where and how the media cache stores blobs.
#[derive(Debug, Clone, PartialEq)]
pub struct CacheConfig {
    /// Directory holding one `<key>.jpg` per cached asset.
    pub dir: PathBuf,
    /// JPEG quality (1-100) used when re-encoding fetched images.
    pub jpeg_quality: u8,
    pub eviction: EvictionPolicy,
}

impl CacheConfig {
    /// Config for `dir` with default quality and eviction bounds.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            jpeg_quality: DEFAULT_JPEG_QUALITY,
            eviction: EvictionPolicy::default(),
        }
    }

    pub fn with_jpeg_quality(mut self, quality: u8) -> Self {
        self.jpeg_quality = quality;
        self
    }

    pub fn with_eviction(mut self, eviction: EvictionPolicy) -> Self {
        self.eviction = eviction;
        self
    }

    /// Default cache directory following platform conventions.
    ///
    /// - Linux: `~/.cache/spotlens/media`
    /// - macOS: `~/Library/Caches/spotlens/media`
    /// - Windows: `C:\Users\<user>\AppData\Local\spotlens\media`
    pub fn default_dir() -> PathBuf {
        dirs::cache_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("spotlens")
            .join("media")
    }

    pub fn validate(&self) -> Result<()> {
        if !(1..=100).contains(&self.jpeg_quality) {
            return Err(Error::InvalidConfig(format!(
                "jpeg_quality must be between 1 and 100, got {}",
                self.jpeg_quality
            )));
        }
        if self.eviction.max_entries == Some(0) {
            return Err(Error::InvalidConfig("max_entries must be at least 1".into()));
        }
        if self.eviction.max_bytes == Some(0) {
            return Err(Error::InvalidConfig("max_bytes must be at least 1".into()));
        }
        Ok(())
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self::new(Self::default_dir())
    }
}

/// HTTP origin settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchConfig {
    pub timeout: Duration,
    pub user_agent: String,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_FETCH_TIMEOUT,
            user_agent: concat!("spotlens/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

impl FetchConfig {
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.timeout.is_zero() {
            return Err(Error::InvalidConfig("fetch timeout must be non-zero".into()));
        }
        if self.user_agent.trim().is_empty() {
            return Err(Error::InvalidConfig("user_agent must not be empty".into()));
        }
        Ok(())
    }
}

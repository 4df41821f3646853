//! Decoded assets handed back to callers.

use image::DynamicImage;
use serde::{Deserialize, Serialize};

use spotlens_types::CacheKey;

/// Where an [`Asset`] came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssetSource {
    /// Decoded from the cache directory.
    Cache,
    /// Fetched from the origin and written to the cache.
    Network,
    /// Fetched from the origin, but the cache write failed.
    Unpersisted,
}

/// A decoded image, already fitted to the requested bounding box.
#[derive(Debug, Clone)]
pub struct Asset {
    pub key: CacheKey,
    pub image: DynamicImage,
    pub source: AssetSource,
}

impl Asset {
    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.width(), self.height())
    }

    /// Whether the asset was served without touching the network.
    pub fn is_cached(&self) -> bool {
        self.source == AssetSource::Cache
    }
}

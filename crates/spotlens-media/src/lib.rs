//! Media cache and fetch pipeline for spotlens.
//!
//! This crate turns asset identifiers (bare ids, legacy `local_`/`photo_`
//! ids, CDN URLs) into decoded images fitted to a bounding box, keeping a
//! bounded on-disk cache of everything fetched.
//!
//! # Features
//!
//! - **Media cache**: one JPEG per normalized key, atomic writes, LRU/TTL eviction
//! - **Fetch pipeline**: cache first, one origin fetch per miss, shared by
//!   concurrent requests for the same key
//! - **Load events**: broadcast state transitions for UI adapters
//! - **Metrics**: hit, miss, fetch and failure counters
//! - **Testing**: [`MockOrigin`] with fetch counting, failure injection and latency
//!
//! # Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//! use spotlens_media::{CacheConfig, FetchConfig, FetchPipeline, HttpOrigin, MediaCache, TargetSize};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let cache = Arc::new(MediaCache::open(CacheConfig::default()).await?);
//!     let origin = Arc::new(HttpOrigin::new(&FetchConfig::default())?);
//!     let pipeline = FetchPipeline::new(cache, origin);
//!
//!     let thumb = pipeline
//!         .fetch_or_load("https://cdn.example.com/spots/abc123_1699999999.jpg", TargetSize::square(256))
//!         .await?;
//!     println!("{}x{}", thumb.width(), thumb.height());
//!     Ok(())
//! }
//! ```

pub mod asset;
pub mod cache;
pub mod config;
pub mod error;
pub mod events;
pub mod eviction;
mod imaging;
pub mod metrics;
pub mod mock;
pub mod origin;
pub mod pipeline;
pub mod size;

pub use asset::{Asset, AssetSource};
pub use cache::{CacheStats, EvictionReport, MediaCache};
pub use config::{CacheConfig, DEFAULT_FETCH_TIMEOUT, FetchConfig};
pub use error::{Error, Result};
pub use events::{
    EventDispatcher, EventReceiver, EventSender, LoadEvent, default_event_channel, event_channel,
};
pub use eviction::{DEFAULT_MAX_BYTES, DEFAULT_MAX_ENTRIES, EvictionPolicy};
pub use imaging::DEFAULT_JPEG_QUALITY;
pub use metrics::{MetricsSnapshot, PipelineMetrics};
pub use mock::MockOrigin;
pub use origin::{FetchError, HttpOrigin, Origin};
pub use pipeline::FetchPipeline;
pub use size::{TargetSize, fit_dimensions};

/// Type alias for a shared media cache.
pub type SharedCache = std::sync::Arc<MediaCache>;

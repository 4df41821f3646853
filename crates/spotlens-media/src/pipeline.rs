//! Fetch-and-cache pipeline.
//!
//! [`FetchPipeline::fetch_or_load`] resolves an identifier to a decoded,
//! fitted [`Asset`]:
//!
//! ```text
//! CacheCheck ──exists──────────────▶ HitDecode ──▶ Ready
//!     │        (or not a remote URL)     │
//!     │                                  └─ missing / corrupt ──▶ Failed
//!     └─miss, remote──▶ MissFetch ──▶ decode ──▶ save ──▶ Ready
//!                           └─ fetch or decode error ──▶ Failed
//! ```
//!
//! Concurrent misses for one key share a single origin fetch. The fetch runs
//! in its own task, so a caller that gives up does not cancel it and a later
//! request still finds the cached result.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use futures::future::{BoxFuture, FutureExt, Shared};
use image::DynamicImage;
use tracing::{debug, info, warn};

use spotlens_types::{AssetId, CacheKey};

use crate::asset::{Asset, AssetSource};
use crate::cache::MediaCache;
use crate::error::{Error, Result};
use crate::events::{EventDispatcher, EventReceiver, LoadEvent};
use crate::imaging;
use crate::metrics::{MetricsSnapshot, PipelineMetrics};
use crate::origin::Origin;
use crate::size::TargetSize;

/// Full-size result of one origin fetch, shared by every joined request.
#[derive(Debug, Clone)]
struct Fetched {
    image: Arc<DynamicImage>,
    persisted: bool,
}

type SharedFetch = Shared<BoxFuture<'static, Result<Fetched>>>;
type InflightMap = Arc<Mutex<HashMap<CacheKey, SharedFetch>>>;

/// Removes a key from the in-flight registry when its fetch task ends,
/// including when the task panics.
struct InflightGuard {
    map: InflightMap,
    key: CacheKey,
}

impl Drop for InflightGuard {
    fn drop(&mut self) {
        self.map
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&self.key);
    }
}

/// Loads assets from the cache, falling back to the origin.
///
/// # Example
///
/// ```no_run
/// use std::sync::Arc;
/// use spotlens_media::{CacheConfig, FetchConfig, FetchPipeline, HttpOrigin, MediaCache, TargetSize};
///
/// # async fn example() -> spotlens_media::Result<()> {
/// let cache = Arc::new(MediaCache::open(CacheConfig::default()).await?);
/// let origin = Arc::new(HttpOrigin::new(&FetchConfig::default())?);
/// let pipeline = FetchPipeline::new(cache, origin);
///
/// let asset = pipeline
///     .fetch_or_load("https://cdn.example.com/spots/abc123_1699999999.jpg", TargetSize::square(512))
///     .await?;
/// println!("{}x{} from {:?}", asset.width(), asset.height(), asset.source);
/// # Ok(())
/// # }
/// ```
pub struct FetchPipeline {
    cache: Arc<MediaCache>,
    origin: Arc<dyn Origin>,
    inflight: InflightMap,
    events: EventDispatcher,
    metrics: Arc<PipelineMetrics>,
}

impl std::fmt::Debug for FetchPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FetchPipeline")
            .field("cache", &self.cache.dir())
            .field("in_flight", &self.in_flight())
            .field("metrics", &self.metrics.snapshot())
            .finish()
    }
}

impl FetchPipeline {
    pub fn new(cache: Arc<MediaCache>, origin: Arc<dyn Origin>) -> Self {
        Self {
            cache,
            origin,
            inflight: Arc::new(Mutex::new(HashMap::new())),
            events: EventDispatcher::default(),
            metrics: Arc::new(PipelineMetrics::new()),
        }
    }

    /// Publish events on an existing dispatcher instead of a private one.
    pub fn with_events(mut self, events: EventDispatcher) -> Self {
        self.events = events;
        self
    }

    /// Subscribe to [`LoadEvent`]s for every request.
    pub fn subscribe(&self) -> EventReceiver {
        self.events.subscribe()
    }

    pub fn cache(&self) -> &Arc<MediaCache> {
        &self.cache
    }

    pub fn metrics(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }

    /// Number of origin fetches currently running.
    pub fn in_flight(&self) -> usize {
        self.inflight
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Resolve `identifier` to an asset fitted into `target`.
    ///
    /// Identifiers that are not remote URLs are read from the cache only
    /// and yield [`Error::NotFound`] when absent. A cached blob that fails
    /// to decode is deleted and reported as [`Error::DecodeFailure`]; the
    /// next call fetches it again. When the fetched image cannot be
    /// written to the cache the asset is still returned, marked
    /// [`AssetSource::Unpersisted`]. Nothing is retried automatically.
    pub async fn fetch_or_load(&self, identifier: &str, target: TargetSize) -> Result<Asset> {
        let id = AssetId::parse(identifier);
        let key = id.cache_key();

        let result = self.resolve(&id, &key, target).await;
        match &result {
            Ok(asset) => self.events.send(LoadEvent::Ready {
                key,
                source: asset.source,
                width: asset.width(),
                height: asset.height(),
            }),
            Err(e) => {
                self.metrics.record_failure();
                debug!("Load of {} failed: {}", identifier, e);
                self.events.send(LoadEvent::Failed {
                    key,
                    reason: e.to_string(),
                });
            }
        }
        result
    }

    async fn resolve(&self, id: &AssetId, key: &CacheKey, target: TargetSize) -> Result<Asset> {
        if !key.is_path_safe() {
            return Err(Error::InvalidKey(key.to_string()));
        }

        self.events.send(LoadEvent::CacheCheck { key: key.clone() });
        if self.cache.exists(key).await || !id.is_remote() {
            self.events.send(LoadEvent::HitDecode { key: key.clone() });
            match self.cache.try_load(key, target).await {
                Ok(asset) => {
                    self.metrics.record_hit();
                    return Ok(asset);
                }
                Err(Error::NotFound(_)) if id.is_remote() => {
                    debug!("{} disappeared before decode, fetching", key);
                }
                Err(e @ Error::DecodeFailure { .. }) => {
                    warn!("Dropping corrupt cache entry {}: {}", key, e);
                    if let Err(remove_err) = self.cache.remove(key).await {
                        warn!("Failed to remove corrupt entry {}: {}", key, remove_err);
                    }
                    return Err(e);
                }
                Err(e) => return Err(e),
            }
        }

        let Some(url) = id.remote_url() else {
            return Err(Error::NotFound(key.clone()));
        };

        self.metrics.record_miss();
        let (fetch, joined) = self.join_or_start(key, url);
        self.events.send(LoadEvent::MissFetch {
            key: key.clone(),
            url: url.to_string(),
            joined,
        });

        let fetched = fetch.await?;
        let full = Arc::clone(&fetched.image);
        let image = tokio::task::spawn_blocking(move || imaging::fit(&full, target)).await?;
        Ok(Asset {
            key: key.clone(),
            image,
            source: if fetched.persisted {
                AssetSource::Network
            } else {
                AssetSource::Unpersisted
            },
        })
    }

    /// Join the fetch in flight for `key`, or start one.
    fn join_or_start(&self, key: &CacheKey, url: &str) -> (SharedFetch, bool) {
        let mut inflight = self.inflight.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(existing) = inflight.get(key) {
            self.metrics.record_coalesced();
            debug!("Joining in-flight fetch for {}", key);
            return (existing.clone(), true);
        }

        // The guard's drop takes the registry lock, so the task cannot
        // deregister before the insert below.
        let guard = InflightGuard {
            map: Arc::clone(&self.inflight),
            key: key.clone(),
        };
        let task = tokio::spawn(fetch_and_store(
            Arc::clone(&self.origin),
            Arc::clone(&self.cache),
            Arc::clone(&self.metrics),
            key.clone(),
            url.to_string(),
            guard,
        ));
        let shared = async move { task.await.unwrap_or_else(|e| Err(Error::from(e))) }
            .boxed()
            .shared();
        inflight.insert(key.clone(), shared.clone());
        (shared, false)
    }
}

async fn fetch_and_store(
    origin: Arc<dyn Origin>,
    cache: Arc<MediaCache>,
    metrics: Arc<PipelineMetrics>,
    key: CacheKey,
    url: String,
    _guard: InflightGuard,
) -> Result<Fetched> {
    metrics.record_fetch();
    let bytes = origin
        .fetch(&url)
        .await
        .map_err(|source| Error::FetchFailure {
            url: url.clone(),
            source,
        })?;

    let image = tokio::task::spawn_blocking(move || imaging::decode(&bytes))
        .await?
        .map_err(|reason| Error::DecodeFailure {
            key: key.clone(),
            reason,
        })?;
    let image = Arc::new(image);

    let persisted = match cache.save_shared_image(&key, Arc::clone(&image)).await {
        Ok(()) => {
            info!("Fetched and cached {} from {}", key, url);
            true
        }
        Err(e) => {
            metrics.record_persist_failure();
            warn!("Serving {} without caching it: {}", key, e);
            false
        }
    };

    Ok(Fetched { image, persisted })
}

//! On-disk media cache.
//!
//! Each asset is stored as `<dir>/<key>.jpg`. Writes go to a hidden temp
//! file in the same directory, are fsynced, then renamed over the target, so
//! a concurrent [`MediaCache::exists`] or [`MediaCache::load`] sees either
//! the old blob, the new blob, or nothing; never a partial file. Temp names
//! are random and do not embed the key, so they stay short for any key.
//!
//! Renames into place and deletions happen under the index lock, so the
//! index and the directory never disagree about which blobs exist.
//!
//! # Example
//!
//! ```no_run
//! use spotlens_media::{CacheConfig, MediaCache, TargetSize};
//! use spotlens_types::normalize;
//!
//! # async fn example(jpeg: Vec<u8>) -> spotlens_media::Result<()> {
//! let cache = MediaCache::open(CacheConfig::default()).await?;
//! let key = normalize("photo_3f2b8c1e-9a4d-4e21-b0c7-5d1e2f3a4b5c");
//!
//! cache.save(&key, &jpeg).await?;
//! if let Some(thumb) = cache.load(&key, TargetSize::square(256)).await {
//!     println!("{}x{}", thumb.width(), thumb.height());
//! }
//! # Ok(())
//! # }
//! ```

use std::fs::Metadata;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::SystemTime;

use image::DynamicImage;
use rand::seq::IndexedRandom;
use serde::Serialize;
use time::OffsetDateTime;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use spotlens_types::CacheKey;

use crate::asset::{Asset, AssetSource};
use crate::config::CacheConfig;
use crate::error::{Error, Result};
use crate::eviction::{AccessIndex, EntryMeta, EvictionPolicy};
use crate::imaging;
use crate::size::TargetSize;

const TEMP_SUFFIX: &str = ".tmp";

/// Snapshot of the cache's contents and bounds.
#[derive(Debug, Clone, Serialize)]
pub struct CacheStats {
    pub dir: PathBuf,
    pub entries: usize,
    pub total_bytes: u64,
    pub max_bytes: Option<u64>,
    pub max_entries: Option<usize>,
    /// Last access of the least recently used entry.
    #[serde(with = "time::serde::rfc3339::option")]
    pub oldest_access: Option<OffsetDateTime>,
}

/// What an eviction pass removed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct EvictionReport {
    pub removed: usize,
    pub freed_bytes: u64,
}

/// A directory of cached images keyed by [`CacheKey`].
///
/// Construct one per cache directory and share it behind an `Arc`.
#[derive(Debug)]
pub struct MediaCache {
    dir: PathBuf,
    jpeg_quality: u8,
    policy: EvictionPolicy,
    index: Mutex<AccessIndex>,
}

impl MediaCache {
    /// Open (or create) a cache directory.
    ///
    /// Leftover temp files from interrupted writes are removed and the
    /// access index is rebuilt from file metadata. Bounds are enforced
    /// before returning.
    pub async fn open(config: CacheConfig) -> Result<Self> {
        config.validate()?;
        fs::create_dir_all(&config.dir).await?;

        let mut index = AccessIndex::default();
        let mut stale = 0usize;
        let mut entries = fs::read_dir(&config.dir).await?;
        while let Some(entry) = entries.next_entry().await? {
            let file_name = entry.file_name();
            let Some(name) = file_name.to_str() else {
                continue;
            };
            if name.ends_with(TEMP_SUFFIX) {
                match fs::remove_file(entry.path()).await {
                    Ok(()) => stale += 1,
                    Err(e) => warn!("Failed to remove stale temp file {}: {}", name, e),
                }
                continue;
            }
            let Some(key) = CacheKey::from_file_name(name) else {
                continue;
            };
            let meta = entry.metadata().await?;
            if meta.is_file() {
                index.insert(
                    key,
                    EntryMeta {
                        size: meta.len(),
                        last_access: last_access(&meta),
                    },
                );
            }
        }

        info!(
            "Opened media cache at {:?}: {} entries, {} bytes ({} stale temp files removed)",
            config.dir,
            index.len(),
            index.total_bytes(),
            stale
        );

        let cache = Self {
            dir: config.dir,
            jpeg_quality: config.jpeg_quality,
            policy: config.eviction,
            index: Mutex::new(index),
        };
        cache.evict().await;
        Ok(cache)
    }

    /// The cache directory.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn policy(&self) -> &EvictionPolicy {
        &self.policy
    }

    /// Path of the blob for `key`, rejecting keys that could escape the
    /// directory.
    pub fn path_for(&self, key: &CacheKey) -> Result<PathBuf> {
        if !key.is_path_safe() {
            return Err(Error::InvalidKey(key.to_string()));
        }
        Ok(self.dir.join(key.file_name()))
    }

    /// Whether a blob is stored for `key`.
    pub async fn exists(&self, key: &CacheKey) -> bool {
        let Ok(path) = self.path_for(key) else {
            return false;
        };
        fs::metadata(&path).await.is_ok_and(|m| m.is_file())
    }

    /// Decode the blob for `key` and fit it into `target`.
    ///
    /// A missing or undecodable blob yields `None`; callers fall back to the
    /// network or a placeholder. Use [`MediaCache::try_load`] to tell the
    /// two apart.
    pub async fn load(&self, key: &CacheKey, target: TargetSize) -> Option<Asset> {
        match self.try_load(key, target).await {
            Ok(asset) => Some(asset),
            Err(e) => {
                debug!("Cache load for {} failed: {}", key, e);
                None
            }
        }
    }

    /// Like [`MediaCache::load`], but reports why nothing was loaded.
    ///
    /// Returns [`Error::NotFound`] when no blob exists and
    /// [`Error::DecodeFailure`] when the blob is not an image.
    pub async fn try_load(&self, key: &CacheKey, target: TargetSize) -> Result<Asset> {
        let path = self.path_for(key)?;
        let bytes = match fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                let mut index = self.index.lock().await;
                if !fs::try_exists(&path).await.unwrap_or(false) {
                    index.remove(key);
                }
                return Err(Error::NotFound(key.clone()));
            }
            Err(e) => return Err(e.into()),
        };

        let image = tokio::task::spawn_blocking(move || {
            imaging::decode(&bytes).map(|image| imaging::fit(&image, target))
        })
        .await?
        .map_err(|reason| Error::DecodeFailure {
            key: key.clone(),
            reason,
        })?;

        self.index.lock().await.touch(key, SystemTime::now());
        debug!(
            "Cache hit for {} ({}x{})",
            key,
            image.width(),
            image.height()
        );
        Ok(Asset {
            key: key.clone(),
            image,
            source: AssetSource::Cache,
        })
    }

    /// Store raw bytes under `key`, replacing any existing blob.
    ///
    /// The bytes are written as-is; use [`MediaCache::save_image`] to
    /// re-encode a decoded image. Failures are reported as
    /// [`Error::PersistFailure`] and leave no partial file behind.
    pub async fn save(&self, key: &CacheKey, bytes: &[u8]) -> Result<()> {
        let path = self.path_for(key)?;
        let temp = self
            .dir
            .join(format!(".{:016x}{}", rand::random::<u64>(), TEMP_SUFFIX));

        if let Err(e) = write_temp(&temp, bytes).await {
            discard_temp(&temp).await;
            return Err(Error::persist(key, e));
        }

        {
            let mut index = self.index.lock().await;
            if let Err(e) = fs::rename(&temp, &path).await {
                drop(index);
                discard_temp(&temp).await;
                return Err(Error::persist(key, e));
            }
            index.insert(
                key.clone(),
                EntryMeta {
                    size: bytes.len() as u64,
                    last_access: SystemTime::now(),
                },
            );
        }
        debug!("Cached {} ({} bytes)", key, bytes.len());

        self.evict_keeping(Some(key)).await;
        Ok(())
    }

    /// Re-encode `image` as JPEG at the configured quality and store it.
    pub async fn save_image(&self, key: &CacheKey, image: &DynamicImage) -> Result<()> {
        self.save_shared_image(key, Arc::new(image.clone())).await
    }

    pub(crate) async fn save_shared_image(
        &self,
        key: &CacheKey,
        image: Arc<DynamicImage>,
    ) -> Result<()> {
        self.path_for(key)?;
        let quality = self.jpeg_quality;
        let jpeg = tokio::task::spawn_blocking(move || imaging::encode_jpeg(&image, quality))
            .await?
            .map_err(|reason| Error::persist(key, reason))?;
        self.save(key, &jpeg).await
    }

    /// Delete the blob for `key`. Returns whether one existed.
    pub async fn remove(&self, key: &CacheKey) -> Result<bool> {
        let path = self.path_for(key)?;
        let mut index = self.index.lock().await;
        index.remove(key);
        match fs::remove_file(&path).await {
            Ok(()) => {
                debug!("Removed {} from cache", key);
                Ok(true)
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    /// Delete every blob and temp file. Returns the number of blobs removed.
    pub async fn clear(&self) -> Result<usize> {
        let mut index = self.index.lock().await;
        let mut removed = 0;
        let mut entries = fs::read_dir(&self.dir).await?;
        while let Some(entry) = entries.next_entry().await? {
            let file_name = entry.file_name();
            let Some(name) = file_name.to_str() else {
                continue;
            };
            let is_blob = CacheKey::from_file_name(name).is_some();
            if !is_blob && !name.ends_with(TEMP_SUFFIX) {
                continue;
            }
            match fs::remove_file(entry.path()).await {
                Ok(()) if is_blob => removed += 1,
                Ok(()) => {}
                Err(e) if e.kind() == ErrorKind::NotFound => {}
                Err(e) => return Err(e.into()),
            }
        }
        index.clear();
        info!("Cleared media cache at {:?}: {} entries removed", self.dir, removed);
        Ok(removed)
    }

    /// Every key with a blob on disk, in no particular order.
    pub async fn list_all_keys(&self) -> Result<Vec<CacheKey>> {
        let mut keys = Vec::new();
        let mut entries = fs::read_dir(&self.dir).await?;
        while let Some(entry) = entries.next_entry().await? {
            let Some(key) = entry.file_name().to_str().and_then(CacheKey::from_file_name) else {
                continue;
            };
            if entry.file_type().await.is_ok_and(|t| t.is_file()) {
                keys.push(key);
            }
        }
        Ok(keys)
    }

    /// A uniformly random cached key, or `None` when the cache is empty.
    pub async fn random_key(&self) -> Result<Option<CacheKey>> {
        let keys = self.list_all_keys().await?;
        Ok(keys.choose(&mut rand::rng()).cloned())
    }

    pub async fn stats(&self) -> CacheStats {
        let index = self.index.lock().await;
        CacheStats {
            dir: self.dir.clone(),
            entries: index.len(),
            total_bytes: index.total_bytes(),
            max_bytes: self.policy.max_bytes,
            max_entries: self.policy.max_entries,
            oldest_access: index.oldest_access().map(OffsetDateTime::from),
        }
    }

    /// Apply the eviction policy now.
    pub async fn evict(&self) -> EvictionReport {
        self.evict_keeping(None).await
    }

    async fn evict_keeping(&self, keep: Option<&CacheKey>) -> EvictionReport {
        let mut index = self.index.lock().await;
        let victims = index.select_victims(&self.policy, SystemTime::now(), keep);

        let mut report = EvictionReport::default();
        for key in victims {
            let Some(meta) = index.remove(&key) else {
                continue;
            };
            match fs::remove_file(self.dir.join(key.file_name())).await {
                Ok(()) => {
                    report.removed += 1;
                    report.freed_bytes += meta.size;
                }
                Err(e) if e.kind() == ErrorKind::NotFound => {}
                Err(e) => warn!("Failed to evict {}: {}", key, e),
            }
        }
        drop(index);

        if report.removed > 0 {
            info!(
                "Evicted {} cache entries ({} bytes)",
                report.removed, report.freed_bytes
            );
        }
        report
    }
}

async fn write_temp(temp: &Path, bytes: &[u8]) -> std::io::Result<()> {
    let mut file = fs::File::create(temp).await?;
    file.write_all(bytes).await?;
    file.flush().await?;
    file.sync_all().await
}

async fn discard_temp(temp: &Path) {
    if let Err(e) = fs::remove_file(temp).await
        && e.kind() != ErrorKind::NotFound
    {
        warn!("Failed to remove temp file {:?}: {}", temp, e);
    }
}

/// Later of access and modification time; many mounts do not update atime.
fn last_access(meta: &Metadata) -> SystemTime {
    let modified = meta.modified().unwrap_or(SystemTime::UNIX_EPOCH);
    meta.accessed().map_or(modified, |accessed| accessed.max(modified))
}

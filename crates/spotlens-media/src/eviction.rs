//! Bounded eviction for the media cache.
//!
//! The cache keeps an in-memory index of every blob's size and last access
//! time. After each write, and whenever [`MediaCache::evict`] is called,
//! entries are removed in two passes:
//!
//! 1. **TTL**: entries not accessed within [`EvictionPolicy::max_age`].
//! 2. **LRU**: least recently accessed entries until both
//!    [`EvictionPolicy::max_entries`] and [`EvictionPolicy::max_bytes`] hold.
//!
//! [`MediaCache::evict`]: crate::MediaCache::evict

use std::collections::HashMap;
use std::time::{Duration, SystemTime};

use serde::{Deserialize, Serialize};

use spotlens_types::CacheKey;

/// Default byte budget: 512 MiB.
pub const DEFAULT_MAX_BYTES: u64 = 512 * 1024 * 1024;

/// Default entry budget.
pub const DEFAULT_MAX_ENTRIES: usize = 5_000;

/// Bounds enforced on the cache directory. `None` disables a bound.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvictionPolicy {
    pub max_bytes: Option<u64>,
    pub max_entries: Option<usize>,
    /// Entries idle for longer than this are dropped regardless of size.
    pub max_age: Option<Duration>,
}

impl Default for EvictionPolicy {
    fn default() -> Self {
        Self {
            max_bytes: Some(DEFAULT_MAX_BYTES),
            max_entries: Some(DEFAULT_MAX_ENTRIES),
            max_age: None,
        }
    }
}

impl EvictionPolicy {
    /// No bounds at all.
    pub fn unbounded() -> Self {
        Self {
            max_bytes: None,
            max_entries: None,
            max_age: None,
        }
    }

    pub fn with_max_bytes(mut self, max_bytes: u64) -> Self {
        self.max_bytes = Some(max_bytes);
        self
    }

    pub fn with_max_entries(mut self, max_entries: usize) -> Self {
        self.max_entries = Some(max_entries);
        self
    }

    pub fn with_max_age(mut self, max_age: Duration) -> Self {
        self.max_age = Some(max_age);
        self
    }

    fn over_bounds(&self, entries: usize, bytes: u64) -> bool {
        self.max_entries.is_some_and(|max| entries > max)
            || self.max_bytes.is_some_and(|max| bytes > max)
    }
}

/// Size and recency of one cached blob.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct EntryMeta {
    pub size: u64,
    pub last_access: SystemTime,
}

/// In-memory view of the cache directory.
#[derive(Debug, Default)]
pub(crate) struct AccessIndex {
    entries: HashMap<CacheKey, EntryMeta>,
    total_bytes: u64,
}

impl AccessIndex {
    pub fn insert(&mut self, key: CacheKey, meta: EntryMeta) {
        if let Some(old) = self.entries.insert(key, meta) {
            self.total_bytes -= old.size;
        }
        self.total_bytes += meta.size;
    }

    pub fn touch(&mut self, key: &CacheKey, now: SystemTime) {
        if let Some(meta) = self.entries.get_mut(key) {
            meta.last_access = now;
        }
    }

    pub fn remove(&mut self, key: &CacheKey) -> Option<EntryMeta> {
        let meta = self.entries.remove(key)?;
        self.total_bytes -= meta.size;
        Some(meta)
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.total_bytes = 0;
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn total_bytes(&self) -> u64 {
        self.total_bytes
    }

    pub fn oldest_access(&self) -> Option<SystemTime> {
        self.entries.values().map(|m| m.last_access).min()
    }

    /// Keys to remove so the index satisfies `policy` at `now`.
    ///
    /// `keep` is never selected; it protects a blob that was just written.
    pub fn select_victims(
        &self,
        policy: &EvictionPolicy,
        now: SystemTime,
        keep: Option<&CacheKey>,
    ) -> Vec<CacheKey> {
        let mut by_age: Vec<(&CacheKey, &EntryMeta)> = self.entries.iter().collect();
        by_age.sort_by(|a, b| a.1.last_access.cmp(&b.1.last_access).then_with(|| a.0.cmp(b.0)));

        let mut victims = Vec::new();
        let mut entries = self.entries.len();
        let mut bytes = self.total_bytes;

        for (key, meta) in by_age {
            if Some(key) == keep {
                continue;
            }
            let idle = now.duration_since(meta.last_access).unwrap_or_default();
            let expired = policy.max_age.is_some_and(|max| idle > max);
            if expired || policy.over_bounds(entries, bytes) {
                victims.push(key.clone());
                entries -= 1;
                bytes -= meta.size;
            }
        }

        victims
    }
}

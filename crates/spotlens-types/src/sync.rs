//! Spot-level synchronization state.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use time::{Duration, OffsetDateTime};

/// Where a spot stands relative to the remote sync backend.
///
/// A spot created on this device starts [`SyncState::local`]. Publishing
/// assigns a server id; a spot pulled from the backend starts
/// [`SyncState::pulled`] and becomes stale once its cache expiry passes.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SyncState {
    /// True until the first successful publish.
    pub is_local_only: bool,
    pub is_published: bool,
    /// Last successful pull or push.
    #[cfg_attr(feature = "serde", serde(with = "time::serde::rfc3339::option"))]
    pub last_synced: Option<OffsetDateTime>,
    /// After this instant a pulled record should be refreshed.
    #[cfg_attr(feature = "serde", serde(with = "time::serde::rfc3339::option"))]
    pub cache_expiry: Option<OffsetDateTime>,
    /// Backend identifier, `None` until published.
    pub server_id: Option<String>,
}

impl SyncState {
    /// State of a spot created on this device.
    pub const fn local() -> Self {
        Self {
            is_local_only: true,
            is_published: false,
            last_synced: None,
            cache_expiry: None,
            server_id: None,
        }
    }

    /// State of a spot just pulled from the backend.
    pub fn pulled(server_id: impl Into<String>, now: OffsetDateTime, ttl: Duration) -> Self {
        Self {
            is_local_only: false,
            is_published: true,
            last_synced: Some(now),
            cache_expiry: Some(now + ttl),
            server_id: Some(server_id.into()),
        }
    }

    /// Record a successful publish.
    pub fn mark_published(&mut self, server_id: impl Into<String>, now: OffsetDateTime) {
        self.is_local_only = false;
        self.is_published = true;
        self.server_id = Some(server_id.into());
        self.last_synced = Some(now);
    }

    /// Whether a pulled record should be refreshed from the backend.
    ///
    /// Local-only spots are never stale: this device is their source of truth.
    #[must_use]
    pub fn is_stale(&self, now: OffsetDateTime) -> bool {
        if self.is_local_only {
            return false;
        }
        match self.cache_expiry {
            Some(expiry) => expiry <= now,
            None => true,
        }
    }
}

impl Default for SyncState {
    fn default() -> Self {
        Self::local()
    }
}

//! Load events for UI adapters.
//!
//! Every [`FetchPipeline::fetch_or_load`](crate::FetchPipeline::fetch_or_load)
//! call walks `CacheCheck -> {HitDecode | MissFetch} -> Ready | Failed` and
//! broadcasts each transition. The pipeline itself is thread-agnostic; a UI
//! layer subscribes and hops to its own thread before touching views.

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use spotlens_types::CacheKey;

use crate::asset::AssetSource;

/// A state transition of one load request.
///
/// This enum is marked `#[non_exhaustive]` to allow adding new event types
/// in future versions without breaking downstream code.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
#[non_exhaustive]
pub enum LoadEvent {
    /// Looking the key up in the cache.
    CacheCheck { key: CacheKey },
    /// Reading and decoding the cached blob (or a best-effort local read).
    HitDecode { key: CacheKey },
    /// Fetching from the origin. `joined` is true when another request's
    /// in-flight fetch was reused.
    MissFetch {
        key: CacheKey,
        url: String,
        joined: bool,
    },
    /// The asset is ready.
    Ready {
        key: CacheKey,
        source: AssetSource,
        width: u32,
        height: u32,
    },
    /// The request ended without an asset.
    Failed { key: CacheKey, reason: String },
}

impl LoadEvent {
    /// The key this event is about.
    pub fn key(&self) -> &CacheKey {
        match self {
            LoadEvent::CacheCheck { key }
            | LoadEvent::HitDecode { key }
            | LoadEvent::MissFetch { key, .. }
            | LoadEvent::Ready { key, .. }
            | LoadEvent::Failed { key, .. } => key,
        }
    }

    /// Whether this event ends a request.
    pub fn is_terminal(&self) -> bool {
        matches!(self, LoadEvent::Ready { .. } | LoadEvent::Failed { .. })
    }
}

/// Sender for load events.
pub type EventSender = broadcast::Sender<LoadEvent>;

/// Receiver for load events.
pub type EventReceiver = broadcast::Receiver<LoadEvent>;

/// Default channel capacity.
pub const DEFAULT_EVENT_CAPACITY: usize = 100;

/// Create a new event channel with the given capacity.
pub fn event_channel(capacity: usize) -> (EventSender, EventReceiver) {
    broadcast::channel(capacity)
}

/// Create a default event channel with capacity 100.
pub fn default_event_channel() -> (EventSender, EventReceiver) {
    event_channel(DEFAULT_EVENT_CAPACITY)
}

/// Fans load events out to any number of subscribers.
#[derive(Debug, Clone)]
pub struct EventDispatcher {
    sender: EventSender,
}

impl EventDispatcher {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    pub fn subscribe(&self) -> EventReceiver {
        self.sender.subscribe()
    }

    pub fn send(&self, event: LoadEvent) {
        // Ignore error if no receivers
        let _ = self.sender.send(event);
    }

    pub fn receiver_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventDispatcher {
    fn default() -> Self {
        Self::new(DEFAULT_EVENT_CAPACITY)
    }
}

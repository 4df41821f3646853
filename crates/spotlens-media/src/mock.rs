//! Mock origin for testing.
//!
//! [`MockOrigin`] serves bytes from an in-memory map and records how many
//! fetches it received, so tests can assert on cache hits and request
//! coalescing without a network.
//!
//! # Features
//!
//! - **Fetch counting**: [`MockOrigin::fetch_count`]
//! - **Failure injection**: fail every fetch, or only the next N
//! - **Latency simulation**: delay every response to widen race windows

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU32, AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use image::ImageFormat;
use tokio::sync::RwLock;

use crate::imaging;
use crate::origin::{FetchError, Origin};

/// An in-memory [`Origin`].
///
/// Unknown URLs answer with HTTP 404.
///
/// # Example
///
/// ```
/// use spotlens_media::{MockOrigin, Origin};
///
/// #[tokio::main]
/// async fn main() {
///     let origin = MockOrigin::new()
///         .with_asset("https://cdn.example.com/a.jpg", MockOrigin::sample_jpeg(8, 8));
///
///     assert!(origin.fetch("https://cdn.example.com/a.jpg").await.is_ok());
///     assert!(origin.fetch("https://cdn.example.com/b.jpg").await.is_err());
///     assert_eq!(origin.fetch_count(), 2);
/// }
/// ```
pub struct MockOrigin {
    assets: RwLock<HashMap<String, Bytes>>,
    fetch_count: AtomicU32,
    should_fail: AtomicBool,
    /// Number of upcoming fetches to fail before succeeding again.
    remaining_failures: AtomicU32,
    /// Simulated response latency in milliseconds (0 = no delay).
    latency_ms: AtomicU64,
}

impl std::fmt::Debug for MockOrigin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockOrigin")
            .field("fetch_count", &self.fetch_count.load(Ordering::Relaxed))
            .field("should_fail", &self.should_fail.load(Ordering::Relaxed))
            .field("latency_ms", &self.latency_ms.load(Ordering::Relaxed))
            .finish()
    }
}

impl Default for MockOrigin {
    fn default() -> Self {
        Self::new()
    }
}

impl MockOrigin {
    pub fn new() -> Self {
        Self {
            assets: RwLock::new(HashMap::new()),
            fetch_count: AtomicU32::new(0),
            should_fail: AtomicBool::new(false),
            remaining_failures: AtomicU32::new(0),
            latency_ms: AtomicU64::new(0),
        }
    }

    /// Serve `bytes` at `url`.
    pub fn with_asset(mut self, url: impl Into<String>, bytes: impl Into<Bytes>) -> Self {
        self.assets.get_mut().insert(url.into(), bytes.into());
        self
    }

    /// Delay every response by `latency`.
    pub fn with_latency(self, latency: Duration) -> Self {
        self.set_latency(latency);
        self
    }

    pub async fn insert(&self, url: impl Into<String>, bytes: impl Into<Bytes>) {
        self.assets.write().await.insert(url.into(), bytes.into());
    }

    pub async fn remove(&self, url: &str) -> Option<Bytes> {
        self.assets.write().await.remove(url)
    }

    /// Number of fetches received, including failed ones.
    pub fn fetch_count(&self) -> u32 {
        self.fetch_count.load(Ordering::SeqCst)
    }

    pub fn reset_fetch_count(&self) {
        self.fetch_count.store(0, Ordering::SeqCst);
    }

    /// Fail every fetch until cleared.
    pub fn set_should_fail(&self, fail: bool) {
        self.should_fail.store(fail, Ordering::Relaxed);
    }

    /// Fail only the next `count` fetches.
    pub fn fail_next(&self, count: u32) {
        self.remaining_failures.store(count, Ordering::Relaxed);
    }

    pub fn set_latency(&self, latency: Duration) {
        self.latency_ms
            .store(latency.as_millis() as u64, Ordering::Relaxed);
    }

    /// A small JPEG with a gradient pattern.
    pub fn sample_jpeg(width: u32, height: u32) -> Bytes {
        Bytes::from(imaging::encode_pattern(width, height, ImageFormat::Jpeg))
    }

    /// A small PNG with a gradient pattern.
    pub fn sample_png(width: u32, height: u32) -> Bytes {
        Bytes::from(imaging::encode_pattern(width, height, ImageFormat::Png))
    }

    fn take_failure(&self) -> bool {
        self.remaining_failures
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |n| n.checked_sub(1))
            .is_ok()
            || self.should_fail.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl Origin for MockOrigin {
    async fn fetch(&self, url: &str) -> Result<Bytes, FetchError> {
        self.fetch_count.fetch_add(1, Ordering::SeqCst);

        let latency = self.latency_ms.load(Ordering::Relaxed);
        if latency > 0 {
            tokio::time::sleep(Duration::from_millis(latency)).await;
        }

        if self.take_failure() {
            return Err(FetchError::Transport {
                url: url.to_string(),
                message: "mock failure".to_string(),
            });
        }

        self.assets
            .read()
            .await
            .get(url)
            .cloned()
            .ok_or_else(|| FetchError::Status {
                status: 404,
                url: url.to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const URL: &str = "https://cdn.example.com/spots/abc_1.jpg";

    #[tokio::test]
    async fn test_serves_known_and_404s_unknown() {
        let origin = MockOrigin::new().with_asset(URL, MockOrigin::sample_png(4, 4));

        let bytes = origin.fetch(URL).await.unwrap();
        assert_eq!(image::guess_format(&bytes).unwrap(), ImageFormat::Png);

        let err = origin.fetch("https://cdn.example.com/other.jpg").await.unwrap_err();
        assert!(matches!(err, FetchError::Status { status: 404, .. }));
        assert_eq!(origin.fetch_count(), 2);

        origin.reset_fetch_count();
        assert_eq!(origin.fetch_count(), 0);
    }

    #[tokio::test]
    async fn test_fail_next_then_recover() {
        let origin = MockOrigin::new().with_asset(URL, MockOrigin::sample_jpeg(4, 4));
        origin.fail_next(2);

        assert!(origin.fetch(URL).await.is_err());
        assert!(origin.fetch(URL).await.is_err());
        assert!(origin.fetch(URL).await.is_ok());
        assert_eq!(origin.fetch_count(), 3);
    }

    #[tokio::test]
    async fn test_should_fail_toggle() {
        let origin = MockOrigin::new().with_asset(URL, MockOrigin::sample_jpeg(4, 4));
        origin.set_should_fail(true);
        assert!(matches!(
            origin.fetch(URL).await,
            Err(FetchError::Transport { .. })
        ));
        origin.set_should_fail(false);
        assert!(origin.fetch(URL).await.is_ok());
    }

    #[tokio::test(start_paused = true)]
    async fn test_latency_is_applied() {
        let origin = MockOrigin::new()
            .with_asset(URL, MockOrigin::sample_jpeg(4, 4))
            .with_latency(Duration::from_millis(250));

        let start = tokio::time::Instant::now();
        origin.fetch(URL).await.unwrap();
        assert!(start.elapsed() >= Duration::from_millis(250));
    }

    #[tokio::test]
    async fn test_insert_and_remove() {
        let origin = MockOrigin::new();
        origin.insert(URL, MockOrigin::sample_jpeg(2, 2)).await;
        assert!(origin.fetch(URL).await.is_ok());
        assert!(origin.remove(URL).await.is_some());
        assert!(origin.fetch(URL).await.is_err());
    }
}

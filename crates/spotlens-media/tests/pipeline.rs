//! End-to-end tests for the fetch pipeline and media cache.
//!
//! These run against [`MockOrigin`] and a temporary cache directory, so no
//! network access is needed.

use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use spotlens_media::{
    AssetSource, CacheConfig, Error, FetchPipeline, MediaCache, MockOrigin, TargetSize,
};
use spotlens_types::{CacheKey, normalize};
use tempfile::TempDir;

const URL: &str = "https://cdn.example.com/spots/abc123_1699999999.jpg";

async fn setup(origin: MockOrigin) -> (TempDir, Arc<MockOrigin>, Arc<FetchPipeline>) {
    let dir = tempfile::tempdir().unwrap();
    let cache = MediaCache::open(CacheConfig::new(dir.path())).await.unwrap();
    let origin = Arc::new(origin);
    let pipeline = FetchPipeline::new(Arc::new(cache), origin.clone());
    (dir, origin, Arc::new(pipeline))
}

#[tokio::test]
async fn test_second_request_makes_no_fetch() {
    let (dir, origin, pipeline) =
        setup(MockOrigin::new().with_asset(URL, MockOrigin::sample_jpeg(1200, 800))).await;

    let first = pipeline
        .fetch_or_load(URL, TargetSize::new(300, 300))
        .await
        .unwrap();
    assert_eq!(first.source, AssetSource::Network);
    assert_eq!(first.dimensions(), (300, 200));
    assert_eq!(origin.fetch_count(), 1);
    assert!(dir.path().join("abc123.jpg").is_file());

    let second = pipeline
        .fetch_or_load(URL, TargetSize::new(300, 300))
        .await
        .unwrap();
    assert_eq!(second.source, AssetSource::Cache);
    assert_eq!(second.dimensions(), (300, 200));
    assert_eq!(origin.fetch_count(), 1);
}

#[tokio::test]
async fn test_uncached_legacy_id_is_not_found() {
    let (_dir, origin, pipeline) = setup(MockOrigin::new()).await;

    let err = pipeline
        .fetch_or_load(
            "photo_3f2b8c1e-9a4d-4e21-b0c7-5d1e2f3a4b5c",
            TargetSize::square(128),
        )
        .await
        .unwrap_err();

    assert!(err.is_not_found());
    assert_eq!(origin.fetch_count(), 0);
    assert_eq!(pipeline.metrics().failures, 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_requests_share_one_fetch() {
    let (_dir, origin, pipeline) = setup(
        MockOrigin::new()
            .with_asset(URL, MockOrigin::sample_png(640, 480))
            .with_latency(Duration::from_millis(200)),
    )
    .await;

    let requests = (0..8u32).map(|i| {
        let pipeline = Arc::clone(&pipeline);
        tokio::spawn(async move {
            pipeline
                .fetch_or_load(URL, TargetSize::square(100 + i * 10))
                .await
        })
    });
    let results = join_all(requests).await;

    for (i, result) in results.into_iter().enumerate() {
        let asset = result.unwrap().unwrap();
        let side = 100 + i as u32 * 10;
        assert_eq!(asset.width(), side);
        assert_eq!(asset.source, AssetSource::Network);
    }
    assert_eq!(origin.fetch_count(), 1);

    let metrics = pipeline.metrics();
    assert_eq!(metrics.fetches, 1);
    assert_eq!(metrics.misses, 8);
    assert_eq!(metrics.coalesced, 7);
    assert_eq!(pipeline.in_flight(), 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_abandoned_request_still_populates_cache() {
    let (_dir, origin, pipeline) = setup(
        MockOrigin::new()
            .with_asset(URL, MockOrigin::sample_jpeg(64, 64))
            .with_latency(Duration::from_millis(150)),
    )
    .await;

    let caller = {
        let pipeline = Arc::clone(&pipeline);
        tokio::spawn(async move { pipeline.fetch_or_load(URL, TargetSize::original()).await })
    };
    tokio::time::sleep(Duration::from_millis(30)).await;
    caller.abort();
    assert!(caller.await.unwrap_err().is_cancelled());

    tokio::time::timeout(Duration::from_secs(5), async {
        while pipeline.in_flight() > 0 {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .unwrap();

    let asset = pipeline
        .fetch_or_load(URL, TargetSize::original())
        .await
        .unwrap();
    assert_eq!(asset.source, AssetSource::Cache);
    assert_eq!(origin.fetch_count(), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_saves_for_different_keys() {
    let dir = tempfile::tempdir().unwrap();
    let cache = Arc::new(MediaCache::open(CacheConfig::new(dir.path())).await.unwrap());

    let saves = (1..=16u32).map(|i| {
        let cache = Arc::clone(&cache);
        tokio::spawn(async move {
            let key = CacheKey::new(format!("key-{i}"));
            cache
                .save(&key, &MockOrigin::sample_png(i * 8, i * 4))
                .await
        })
    });
    for result in join_all(saves).await {
        result.unwrap().unwrap();
    }

    for i in 1..=16u32 {
        let key = CacheKey::new(format!("key-{i}"));
        let asset = cache.load(&key, TargetSize::original()).await.unwrap();
        assert_eq!(asset.dimensions(), (i * 8, i * 4));
    }
    assert_eq!(cache.list_all_keys().await.unwrap().len(), 16);

    let leftovers: Vec<_> = std::fs::read_dir(dir.path())
        .unwrap()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_name().to_string_lossy().ends_with(".tmp"))
        .collect();
    assert!(leftovers.is_empty());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_load_never_sees_partial_write() {
    let dir = tempfile::tempdir().unwrap();
    let cache = Arc::new(MediaCache::open(CacheConfig::new(dir.path())).await.unwrap());
    let key = CacheKey::new("contended");
    let small = MockOrigin::sample_png(16, 16);
    let large = MockOrigin::sample_png(128, 96);
    cache.save(&key, &small).await.unwrap();

    let writer = {
        let cache = Arc::clone(&cache);
        let key = key.clone();
        tokio::spawn(async move {
            for i in 0..40 {
                let bytes = if i % 2 == 0 { &large } else { &small };
                cache.save(&key, bytes).await.unwrap();
            }
        })
    };
    let reader = {
        let cache = Arc::clone(&cache);
        let key = key.clone();
        tokio::spawn(async move {
            for _ in 0..100 {
                match cache.try_load(&key, TargetSize::original()).await {
                    Ok(asset) => {
                        assert!(matches!(asset.dimensions(), (16, 16) | (128, 96)));
                    }
                    Err(Error::DecodeFailure { reason, .. }) => {
                        panic!("observed a partial file: {reason}")
                    }
                    Err(e) => panic!("unexpected error: {e}"),
                }
            }
        })
    };

    writer.await.unwrap();
    reader.await.unwrap();
}

#[tokio::test]
async fn test_equivalent_identifiers_share_cache_entry() {
    let uuid = "0c9f3a52-6e1b-4d7a-8f25-b3c4d5e6f708";
    let url = format!("https://cdn.example.com/photos/{uuid}_1712345678.jpg");
    assert_eq!(normalize(&url), normalize(&format!("local_{uuid}")));

    let (_dir, origin, pipeline) =
        setup(MockOrigin::new().with_asset(url.clone(), MockOrigin::sample_jpeg(40, 30))).await;

    pipeline
        .fetch_or_load(&url, TargetSize::original())
        .await
        .unwrap();
    let local = pipeline
        .fetch_or_load(&format!("local_{uuid}"), TargetSize::original())
        .await
        .unwrap();

    assert!(local.is_cached());
    assert_eq!(local.dimensions(), (40, 30));
    assert_eq!(origin.fetch_count(), 1);
}

#[tokio::test]
async fn test_eviction_bounds_hold_under_pipeline_load() {
    let dir = tempfile::tempdir().unwrap();
    let config = CacheConfig::new(dir.path()).with_eviction(
        spotlens_media::EvictionPolicy::unbounded().with_max_entries(3),
    );
    let cache = Arc::new(MediaCache::open(config).await.unwrap());

    let mut origin = MockOrigin::new();
    let urls: Vec<String> = (0..6)
        .map(|i| format!("https://cdn.example.com/spots/img{i}_1.jpg"))
        .collect();
    for url in &urls {
        origin = origin.with_asset(url.clone(), MockOrigin::sample_jpeg(8, 8));
    }
    let pipeline = FetchPipeline::new(Arc::clone(&cache), Arc::new(origin));

    for url in &urls {
        pipeline
            .fetch_or_load(url, TargetSize::original())
            .await
            .unwrap();
    }

    assert_eq!(cache.stats().await.entries, 3);
    assert_eq!(cache.list_all_keys().await.unwrap().len(), 3);
    // The most recent fetch is always kept.
    assert!(cache.exists(&normalize(&urls[5])).await);
}

//! Fetch command - load an asset through the media cache.

use std::path::{Path, PathBuf};

use anyhow::{Context as _, Result};
use serde::Serialize;
use spotlens_media::{AssetSource, FetchPipeline, TargetSize};
use spotlens_types::CacheKey;
use tracing::debug;

use super::Context;
use crate::format::format_metrics_text;

#[derive(Debug, Serialize)]
struct FetchOutput {
    identifier: String,
    key: CacheKey,
    source: AssetSource,
    width: u32,
    height: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    output: Option<PathBuf>,
}

pub async fn cmd_fetch(
    identifier: &str,
    target: TargetSize,
    output: Option<&Path>,
    ctx: &Context,
) -> Result<()> {
    let pipeline = ctx.open_pipeline().await?;
    print!("{}", run(&pipeline, identifier, target, output, ctx).await?);
    Ok(())
}

async fn run(
    pipeline: &FetchPipeline,
    identifier: &str,
    target: TargetSize,
    output: Option<&Path>,
    ctx: &Context,
) -> Result<String> {
    let mut events = pipeline.subscribe();
    let result = pipeline.fetch_or_load(identifier, target).await;
    while let Ok(event) = events.try_recv() {
        debug!(?event, "load event");
    }
    let asset = result.with_context(|| format!("Failed to load '{}'", identifier))?;

    if let Some(path) = output {
        asset
            .image
            .save(path)
            .with_context(|| format!("Failed to write image: {}", path.display()))?;
    }

    let report = FetchOutput {
        identifier: identifier.to_string(),
        key: asset.key.clone(),
        source: asset.source,
        width: asset.width(),
        height: asset.height(),
        output: output.map(Path::to_path_buf),
    };

    if ctx.is_json() {
        return ctx.opts.as_json(&report);
    }

    let source = match report.source {
        AssetSource::Cache => "cache",
        AssetSource::Network => "network",
        AssetSource::Unpersisted => "network, not cached",
    };
    let mut text = format!(
        "{}: {}x{} ({})\n",
        report.key, report.width, report.height, source
    );
    if let Some(path) = &report.output {
        text.push_str(&format!("Saved to {}\n", path.display()));
    }
    if ctx.verbose {
        text.push_str(&format_metrics_text(&pipeline.metrics(), &ctx.opts));
    }
    Ok(text)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use spotlens_media::MockOrigin;

    use super::*;
    use crate::cli::OutputFormat;
    use crate::commands::test_support::temp_context;

    const URL: &str = "https://cdn.example.com/spots/c0ffee_1700000000.jpg";

    async fn pipeline(ctx: &Context, origin: Arc<MockOrigin>) -> FetchPipeline {
        FetchPipeline::new(ctx.open_cache().await.unwrap(), origin)
    }

    #[tokio::test]
    async fn test_fetch_then_hit() {
        let (_dir, ctx) = temp_context(OutputFormat::Text);
        let origin = Arc::new(MockOrigin::new().with_asset(URL, MockOrigin::sample_jpeg(400, 200)));
        let pipeline = pipeline(&ctx, origin.clone()).await;

        let first = run(&pipeline, URL, TargetSize::new(200, 200), None, &ctx)
            .await
            .unwrap();
        assert_eq!(first, "c0ffee: 200x100 (network)\n");

        let second = run(&pipeline, "local_c0ffee", TargetSize::original(), None, &ctx)
            .await
            .unwrap();
        assert_eq!(second, "c0ffee: 400x200 (cache)\n");
        assert_eq!(origin.fetch_count(), 1);
    }

    #[tokio::test]
    async fn test_fetch_writes_output_file() {
        let (dir, ctx) = temp_context(OutputFormat::Json);
        let origin = Arc::new(MockOrigin::new().with_asset(URL, MockOrigin::sample_png(64, 48)));
        let pipeline = pipeline(&ctx, origin).await;
        let out = dir.path().join("thumb.png");

        let json = run(&pipeline, URL, TargetSize::square(32), Some(&out), &ctx)
            .await
            .unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["source"], "network");
        assert_eq!(value["width"], 32);
        assert_eq!(value["height"], 24);

        let written = image::open(&out).unwrap();
        assert_eq!((written.width(), written.height()), (32, 24));
    }

    #[tokio::test]
    async fn test_fetch_failure_names_identifier() {
        let (_dir, ctx) = temp_context(OutputFormat::Text);
        let pipeline = pipeline(&ctx, Arc::new(MockOrigin::new())).await;

        let err = run(&pipeline, URL, TargetSize::original(), None, &ctx)
            .await
            .unwrap_err();
        assert!(err.to_string().contains(URL));
    }
}

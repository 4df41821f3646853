//! Cache command - inspect and maintain the media cache.

use std::io::IsTerminal;

use anyhow::{Result, bail};
use serde::Serialize;
use spotlens_media::MediaCache;

use super::Context;
use crate::cli::CacheAction;
use crate::format::{format_cache_stats_text, format_eviction_text};

/// Execute the cache command.
pub async fn cmd_cache(action: CacheAction, ctx: &Context) -> Result<()> {
    if let CacheAction::Info = action {
        print!("{}", show_info(ctx)?);
        return Ok(());
    }

    let cache = ctx.open_cache().await?;
    if let CacheAction::Clear { yes } = action
        && !yes
        && !confirm_clear(&cache)?
    {
        if !ctx.quiet {
            eprintln!("Cancelled.");
        }
        return Ok(());
    }

    print!("{}", run(&action, &cache, ctx).await?);
    Ok(())
}

async fn run(action: &CacheAction, cache: &MediaCache, ctx: &Context) -> Result<String> {
    match action {
        CacheAction::List => {
            let mut keys = cache.list_all_keys().await?;
            keys.sort();
            if ctx.is_json() {
                return ctx.opts.as_json(&keys);
            }
            if keys.is_empty() {
                return Ok("Cache is empty.\n".to_string());
            }
            Ok(keys.iter().map(|k| format!("{}\n", k)).collect())
        }
        CacheAction::Random => {
            let key = cache.random_key().await?;
            if ctx.is_json() {
                return ctx.opts.as_json(&key);
            }
            Ok(match key {
                Some(key) => format!("{}\n", key),
                None => "Cache is empty.\n".to_string(),
            })
        }
        CacheAction::Stats => {
            let stats = cache.stats().await;
            if ctx.is_json() {
                ctx.opts.as_json(&stats)
            } else {
                Ok(format_cache_stats_text(&stats, &ctx.opts))
            }
        }
        CacheAction::Evict => {
            let report = cache.evict().await;
            if ctx.is_json() {
                ctx.opts.as_json(&report)
            } else {
                Ok(format_eviction_text(&report))
            }
        }
        CacheAction::Clear { .. } => {
            let removed = cache.clear().await?;
            if ctx.is_json() {
                ctx.opts.as_json(&serde_json::json!({ "removed": removed }))
            } else {
                Ok(format!("Removed {} cached asset(s)\n", removed))
            }
        }
        CacheAction::Info => show_info(ctx),
    }
}

fn confirm_clear(cache: &MediaCache) -> Result<bool> {
    if !std::io::stdin().is_terminal() {
        bail!("Refusing to clear the cache without confirmation; pass --yes");
    }
    let prompt = format!("Delete every cached asset in {}?", cache.dir().display());
    Ok(dialoguer::Confirm::new()
        .with_prompt(prompt)
        .default(false)
        .interact()?)
}

#[derive(Serialize)]
struct PathsInfo {
    config_path: String,
    config_exists: bool,
    database_path: String,
    database_exists: bool,
    cache_dir: String,
    cache_exists: bool,
}

fn show_info(ctx: &Context) -> Result<String> {
    let db = ctx.config.store_path();
    let cache_dir = ctx.config.cache_config().dir;
    let info = PathsInfo {
        config_path: ctx.config_path.display().to_string(),
        config_exists: ctx.config_path.exists(),
        database_path: db.display().to_string(),
        database_exists: db.exists(),
        cache_dir: cache_dir.display().to_string(),
        cache_exists: cache_dir.is_dir(),
    };

    if ctx.is_json() {
        return ctx.opts.as_json(&info);
    }

    let mark = |exists: bool| if exists { "" } else { " (not created yet)" };
    Ok(format!(
        "Config:   {}{}\nDatabase: {}{}\nCache:    {}{}\n",
        info.config_path,
        mark(info.config_exists),
        info.database_path,
        mark(info.database_exists),
        info.cache_dir,
        mark(info.cache_exists)
    ))
}

#[cfg(test)]
mod tests {
    use spotlens_media::MockOrigin;
    use spotlens_types::CacheKey;

    use super::*;
    use crate::cli::OutputFormat;
    use crate::commands::test_support::temp_context;

    async fn seeded(ctx: &Context, keys: &[&str]) -> std::sync::Arc<MediaCache> {
        let cache = ctx.open_cache().await.unwrap();
        for key in keys {
            cache
                .save(&CacheKey::new(*key), &MockOrigin::sample_jpeg(8, 8))
                .await
                .unwrap();
        }
        cache
    }

    #[tokio::test]
    async fn test_list_sorted_keys() {
        let (_dir, ctx) = temp_context(OutputFormat::Text);
        let cache = seeded(&ctx, &["b2", "a1"]).await;
        let text = run(&CacheAction::List, &cache, &ctx).await.unwrap();
        assert_eq!(text, "a1\nb2\n");
    }

    #[tokio::test]
    async fn test_random_on_empty_cache() {
        let (_dir, ctx) = temp_context(OutputFormat::Json);
        let cache = seeded(&ctx, &[]).await;
        let json = run(&CacheAction::Random, &cache, &ctx).await.unwrap();
        assert_eq!(json.trim(), "null");
    }

    #[tokio::test]
    async fn test_stats_json() {
        let (_dir, ctx) = temp_context(OutputFormat::Json);
        let cache = seeded(&ctx, &["k1", "k2", "k3"]).await;
        let json = run(&CacheAction::Stats, &cache, &ctx).await.unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["entries"], 3);
        assert!(value["total_bytes"].as_u64().unwrap() > 0);
    }

    #[tokio::test]
    async fn test_clear_removes_everything() {
        let (_dir, ctx) = temp_context(OutputFormat::Text);
        let cache = seeded(&ctx, &["k1", "k2"]).await;
        let text = run(&CacheAction::Clear { yes: true }, &cache, &ctx)
            .await
            .unwrap();
        assert_eq!(text, "Removed 2 cached asset(s)\n");
        assert!(cache.list_all_keys().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_evict_within_bounds() {
        let (_dir, ctx) = temp_context(OutputFormat::Text);
        let cache = seeded(&ctx, &["k1"]).await;
        let text = run(&CacheAction::Evict, &cache, &ctx).await.unwrap();
        assert!(text.contains("nothing evicted"));
    }

    #[test]
    fn test_info_marks_missing_paths() {
        let (_dir, ctx) = temp_context(OutputFormat::Text);
        let text = show_info(&ctx).unwrap();
        assert!(text.contains("spots.db (not created yet)"));
        assert!(text.contains("config.toml (not created yet)"));
    }
}

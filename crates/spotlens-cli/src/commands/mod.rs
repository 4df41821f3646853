//! Command implementations for the CLI.
//!
//! `main` builds one [`Context`] per invocation and hands it to the
//! command. Stores, caches and pipelines are opened here on demand; nothing
//! is kept in globals.

mod cache;
mod config;
mod fetch;
mod normalize;
mod spots;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context as _, Result};
use spotlens_media::{FetchPipeline, HttpOrigin, MediaCache, SharedCache};
use spotlens_store::Store;

use crate::cli::OutputFormat;
use crate::config::Config;
use crate::format::FormatOptions;

pub use cache::cmd_cache;
pub use config::cmd_config;
pub use fetch::cmd_fetch;
pub use normalize::cmd_normalize;
pub use spots::cmd_spots;

/// Everything a command needs from the command line and config file.
#[derive(Debug, Clone)]
pub struct Context {
    pub config: Config,
    /// File the config was (or would be) loaded from.
    pub config_path: PathBuf,
    pub format: OutputFormat,
    pub opts: FormatOptions,
    pub quiet: bool,
    pub verbose: bool,
}

impl Context {
    pub fn is_json(&self) -> bool {
        self.format == OutputFormat::Json
    }

    /// Open the entity store at the configured location.
    pub fn open_store(&self) -> Result<Store> {
        let path = self.config.store_path();
        Store::open(&path).with_context(|| format!("Failed to open database: {}", path.display()))
    }

    /// Open the media cache at the configured location.
    pub async fn open_cache(&self) -> Result<SharedCache> {
        let config = self.config.cache_config();
        let dir = config.dir.clone();
        let cache = MediaCache::open(config)
            .await
            .with_context(|| format!("Failed to open media cache: {}", dir.display()))?;
        Ok(Arc::new(cache))
    }

    /// Wire a fetch pipeline over the configured cache and HTTP origin.
    pub async fn open_pipeline(&self) -> Result<FetchPipeline> {
        let cache = self.open_cache().await?;
        let origin = HttpOrigin::new(&self.config.fetch_config())
            .context("Failed to create HTTP client")?;
        Ok(FetchPipeline::new(cache, Arc::new(origin)))
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use tempfile::TempDir;

    use super::*;

    /// A context whose store and cache live under a temporary directory.
    pub fn temp_context(format: OutputFormat) -> (TempDir, Context) {
        let dir = tempfile::tempdir().unwrap();
        let mut config = Config::default();
        config.store.path = Some(dir.path().join("spots.db"));
        config.cache.dir = Some(dir.path().join("media"));
        let context = Context {
            config,
            config_path: dir.path().join("config.toml"),
            format,
            opts: FormatOptions::new(true),
            quiet: true,
            verbose: false,
        };
        (dir, context)
    }
}

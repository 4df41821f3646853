//! Configuration file management.
//!
//! The CLI reads `config.toml` from the platform config directory (or the
//! path given with `--config`). Every section is optional; a missing file
//! means all defaults.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use spotlens_media::{
    CacheConfig, DEFAULT_JPEG_QUALITY, DEFAULT_MAX_BYTES, DEFAULT_MAX_ENTRIES, EvictionPolicy,
    FetchConfig,
};

const SECONDS_PER_DAY: u64 = 24 * 60 * 60;

/// CLI configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Entity store settings.
    pub store: StoreConfig,
    /// Media cache settings.
    pub cache: CacheSection,
    /// Origin fetch settings.
    pub fetch: FetchSection,
}

/// `[store]` section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Database file; the platform data directory when unset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
    /// Days before imported or pulled spots count as stale.
    pub pull_ttl_days: u32,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: None,
            pull_ttl_days: 7,
        }
    }
}

impl StoreConfig {
    pub fn validate(&self) -> Vec<ValidationError> {
        let mut errors = Vec::new();
        if self.pull_ttl_days == 0 {
            errors.push(ValidationError {
                field: "store.pull_ttl_days".to_string(),
                message: "must be at least 1".to_string(),
            });
        }
        if let Some(path) = &self.path
            && path.as_os_str().is_empty()
        {
            errors.push(ValidationError {
                field: "store.path".to_string(),
                message: "must not be empty".to_string(),
            });
        }
        errors
    }
}

/// `[cache]` section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheSection {
    /// Cache directory; the platform cache directory when unset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dir: Option<PathBuf>,
    pub max_bytes: u64,
    pub max_entries: usize,
    /// Drop entries not accessed for this many days.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_age_days: Option<u64>,
    pub jpeg_quality: u8,
}

impl Default for CacheSection {
    fn default() -> Self {
        Self {
            dir: None,
            max_bytes: DEFAULT_MAX_BYTES,
            max_entries: DEFAULT_MAX_ENTRIES,
            max_age_days: None,
            jpeg_quality: DEFAULT_JPEG_QUALITY,
        }
    }
}

impl CacheSection {
    pub fn validate(&self) -> Vec<ValidationError> {
        let mut errors = Vec::new();
        if self.max_bytes == 0 {
            errors.push(ValidationError {
                field: "cache.max_bytes".to_string(),
                message: "must be greater than 0".to_string(),
            });
        }
        if self.max_entries == 0 {
            errors.push(ValidationError {
                field: "cache.max_entries".to_string(),
                message: "must be greater than 0".to_string(),
            });
        }
        if self.max_age_days == Some(0) {
            errors.push(ValidationError {
                field: "cache.max_age_days".to_string(),
                message: "must be at least 1 when set".to_string(),
            });
        }
        if !(1..=100).contains(&self.jpeg_quality) {
            errors.push(ValidationError {
                field: "cache.jpeg_quality".to_string(),
                message: format!("must be between 1 and 100, got {}", self.jpeg_quality),
            });
        }
        errors
    }
}

/// `[fetch]` section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FetchSection {
    pub timeout_secs: u64,
    /// Overrides the default `spotlens/<version>` user agent.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_agent: Option<String>,
}

impl Default for FetchSection {
    fn default() -> Self {
        Self {
            timeout_secs: spotlens_media::DEFAULT_FETCH_TIMEOUT.as_secs(),
            user_agent: None,
        }
    }
}

impl FetchSection {
    pub fn validate(&self) -> Vec<ValidationError> {
        let mut errors = Vec::new();
        if self.timeout_secs == 0 {
            errors.push(ValidationError {
                field: "fetch.timeout_secs".to_string(),
                message: "must be at least 1".to_string(),
            });
        }
        if let Some(agent) = &self.user_agent
            && agent.trim().is_empty()
        {
            errors.push(ValidationError {
                field: "fetch.user_agent".to_string(),
                message: "must not be blank".to_string(),
            });
        }
        errors
    }
}

impl Config {
    /// Load configuration from the default path, or defaults if absent.
    pub fn load_default() -> Result<Self, ConfigError> {
        let path = default_config_path();
        if path.exists() {
            Self::load(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Load configuration from a file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(|e| ConfigError::Read {
            path: path.as_ref().to_path_buf(),
            source: e,
        })?;
        toml::from_str(&content).map_err(|e| ConfigError::Parse {
            path: path.as_ref().to_path_buf(),
            source: e,
        })
    }

    /// Load `path` if given, otherwise the default location, then validate.
    pub fn resolve(path: Option<&Path>) -> Result<Self, ConfigError> {
        let config = match path {
            Some(path) if path.exists() => Self::load(path)?,
            Some(_) => Self::default(),
            None => Self::load_default()?,
        };
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to a file, creating parent directories.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        let content = toml::to_string_pretty(self).map_err(ConfigError::Serialize)?;

        if let Some(parent) = path.as_ref().parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent).map_err(|e| ConfigError::Write {
                path: parent.to_path_buf(),
                source: e,
            })?;
        }

        std::fs::write(path.as_ref(), content).map_err(|e| ConfigError::Write {
            path: path.as_ref().to_path_buf(),
            source: e,
        })
    }

    /// Validate every section, collecting all problems.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut errors = Vec::new();
        errors.extend(self.store.validate());
        errors.extend(self.cache.validate());
        errors.extend(self.fetch.validate());

        if errors.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::Validation(errors))
        }
    }

    /// Database location.
    pub fn store_path(&self) -> PathBuf {
        self.store
            .path
            .clone()
            .unwrap_or_else(spotlens_store::default_db_path)
    }

    /// Staleness window for pulled and imported spots.
    pub fn pull_ttl(&self) -> time::Duration {
        time::Duration::days(i64::from(self.store.pull_ttl_days))
    }

    /// Media cache settings.
    pub fn cache_config(&self) -> CacheConfig {
        let dir = self.cache.dir.clone().unwrap_or_else(CacheConfig::default_dir);
        let mut eviction = EvictionPolicy::unbounded()
            .with_max_bytes(self.cache.max_bytes)
            .with_max_entries(self.cache.max_entries);
        if let Some(days) = self.cache.max_age_days {
            eviction = eviction.with_max_age(Duration::from_secs(days * SECONDS_PER_DAY));
        }
        CacheConfig::new(dir)
            .with_jpeg_quality(self.cache.jpeg_quality)
            .with_eviction(eviction)
    }

    /// HTTP origin settings.
    pub fn fetch_config(&self) -> FetchConfig {
        let mut config =
            FetchConfig::default().with_timeout(Duration::from_secs(self.fetch.timeout_secs));
        if let Some(agent) = &self.fetch.user_agent {
            config.user_agent = agent.clone();
        }
        config
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
    #[error("Failed to serialize config: {0}")]
    Serialize(toml::ser::Error),
    #[error("Failed to write config file {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Configuration validation failed:\n{}", format_validation_errors(.0))]
    Validation(Vec<ValidationError>),
}

/// A single validation error with context.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// Dotted field path, e.g. `cache.max_bytes`.
    pub field: String,
    pub message: String,
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

fn format_validation_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(|e| format!("  - {}", e))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Default configuration file path.
pub fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("spotlens")
        .join("config.toml")
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_config_default() {
        let config = Config::default();
        assert_eq!(config.store.pull_ttl_days, 7);
        assert_eq!(config.cache.max_bytes, DEFAULT_MAX_BYTES);
        assert_eq!(config.cache.max_entries, DEFAULT_MAX_ENTRIES);
        assert_eq!(config.cache.jpeg_quality, 90);
        assert_eq!(config.fetch.timeout_secs, 30);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_save_and_load() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let mut config = Config::default();
        config.cache.dir = Some(PathBuf::from("/tmp/spotlens-media"));
        config.cache.max_age_days = Some(30);
        config.fetch.user_agent = Some("field-test".to_string());
        config.save(&path).unwrap();

        let loaded = Config::load(&path).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_config_load_nonexistent() {
        let result = Config::load("/nonexistent/path/config.toml");
        assert!(matches!(result, Err(ConfigError::Read { .. })));
    }

    #[test]
    fn test_config_load_invalid_toml() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[cache\nmax_bytes = ").unwrap();

        let result = Config::load(&path);
        assert!(matches!(result, Err(ConfigError::Parse { .. })));
    }

    #[test]
    fn test_partial_toml_fills_defaults() {
        let config: Config = toml::from_str(
            r#"
            [cache]
            max_entries = 250

            [fetch]
            timeout_secs = 5
            "#,
        )
        .unwrap();
        assert_eq!(config.cache.max_entries, 250);
        assert_eq!(config.cache.max_bytes, DEFAULT_MAX_BYTES);
        assert_eq!(config.fetch.timeout_secs, 5);
        assert_eq!(config.store.pull_ttl_days, 7);
    }

    #[test]
    fn test_validation_collects_all_errors() {
        let mut config = Config::default();
        config.store.pull_ttl_days = 0;
        config.cache.max_entries = 0;
        config.cache.jpeg_quality = 0;
        config.fetch.timeout_secs = 0;

        let Err(ConfigError::Validation(errors)) = config.validate() else {
            panic!("expected validation errors");
        };
        let fields: Vec<_> = errors.iter().map(|e| e.field.as_str()).collect();
        assert_eq!(
            fields,
            [
                "store.pull_ttl_days",
                "cache.max_entries",
                "cache.jpeg_quality",
                "fetch.timeout_secs"
            ]
        );
    }

    #[test]
    fn test_validation_error_display() {
        let error = ConfigError::Validation(vec![
            ValidationError {
                field: "cache.max_bytes".to_string(),
                message: "must be greater than 0".to_string(),
            },
            ValidationError {
                field: "fetch.user_agent".to_string(),
                message: "must not be blank".to_string(),
            },
        ]);
        let msg = error.to_string();
        assert!(msg.contains("  - cache.max_bytes: must be greater than 0"));
        assert!(msg.contains("  - fetch.user_agent: must not be blank"));
    }

    #[test]
    fn test_resolve_missing_explicit_path_uses_defaults() {
        let dir = tempdir().unwrap();
        let config = Config::resolve(Some(dir.path().join("absent.toml").as_path())).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_resolve_rejects_invalid_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[cache]\njpeg_quality = 101\n").unwrap();
        assert!(matches!(
            Config::resolve(Some(path.as_path())),
            Err(ConfigError::Validation(_))
        ));
    }

    #[test]
    fn test_cache_config_conversion() {
        let mut config = Config::default();
        config.cache.dir = Some(PathBuf::from("/var/cache/spots"));
        config.cache.max_age_days = Some(2);
        config.cache.jpeg_quality = 75;

        let cache = config.cache_config();
        assert_eq!(cache.dir, PathBuf::from("/var/cache/spots"));
        assert_eq!(cache.jpeg_quality, 75);
        assert_eq!(cache.eviction.max_entries, Some(DEFAULT_MAX_ENTRIES));
        assert_eq!(cache.eviction.max_age, Some(Duration::from_secs(2 * 86_400)));
        assert!(cache.validate().is_ok());
    }

    #[test]
    fn test_fetch_config_conversion() {
        let mut config = Config::default();
        config.fetch.timeout_secs = 12;
        let fetch = config.fetch_config();
        assert_eq!(fetch.timeout, Duration::from_secs(12));
        assert!(fetch.user_agent.starts_with("spotlens/"));

        config.fetch.user_agent = Some("custom/1.0".to_string());
        assert_eq!(config.fetch_config().user_agent, "custom/1.0");
    }

    #[test]
    fn test_pull_ttl() {
        assert_eq!(Config::default().pull_ttl(), time::Duration::days(7));
    }

    #[test]
    fn test_default_config_path() {
        let path = default_config_path();
        assert!(path.ends_with("spotlens/config.toml"));
    }
}

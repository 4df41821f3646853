//! Command-line interface for the spotlens photo-spot store and media cache.
//!
//! # Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `normalize` | Show the cache key an identifier maps to |
//! | `fetch` | Load an asset through the cache, fetching on a miss |
//! | `cache` | List, inspect, evict or clear cached media |
//! | `spots` | List, show, delete, publish and import spots |
//! | `config` | Manage CLI configuration |
//! | `completions` | Generate shell completions |
//!
//! # Configuration
//!
//! Settings live in `~/.config/spotlens/config.toml` (or platform
//! equivalent), overridable with `--config` or `SPOTLENS_CONFIG`:
//!
//! ```toml
//! [store]
//! pull_ttl_days = 7
//!
//! [cache]
//! max_bytes = 536870912
//! max_entries = 5000
//! jpeg_quality = 90
//!
//! [fetch]
//! timeout_secs = 30
//! ```
//!
//! # Environment Variables
//!
//! - `SPOTLENS_CONFIG`: Config file path
//! - `NO_COLOR`: Disable colored output when set
//! - `RUST_LOG`: Log filter when neither `--verbose` nor `--quiet` is given

pub mod cli;
pub mod commands;
pub mod config;
pub mod format;

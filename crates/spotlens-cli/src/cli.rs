//! CLI argument definitions using clap.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use spotlens_types::{Privacy, SpotStatus};
use uuid::Uuid;

/// Output format for commands
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

#[derive(Parser)]
#[command(name = "spotlens")]
#[command(author, version, about = "Local store and media cache for photo spots", long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress non-essential output
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Output as JSON (shorthand for --format json)
    #[arg(long, global = true)]
    pub json: bool,

    /// Output format
    #[arg(short, long, global = true, value_enum, default_value = "text")]
    pub format: OutputFormat,

    /// Disable colored output
    #[arg(long, global = true, env = "NO_COLOR")]
    pub no_color: bool,

    /// Use this config file instead of the default
    #[arg(long, global = true, env = "SPOTLENS_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// `--json` wins over `--format`.
    pub fn output_format(&self) -> OutputFormat {
        if self.json {
            OutputFormat::Json
        } else {
            self.format
        }
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Show the cache key an identifier maps to
    Normalize {
        /// Identifiers (bare ids, local_/photo_ ids, or URLs)
        #[arg(required = true)]
        identifiers: Vec<String>,
    },

    /// Load an asset through the cache, fetching it on a miss
    Fetch {
        /// Identifier or URL of the asset
        identifier: String,

        #[command(flatten)]
        size: SizeArgs,

        /// Write the fitted image to this file (format from extension)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Inspect and maintain the media cache
    Cache {
        #[command(subcommand)]
        action: CacheAction,
    },

    /// Query and manage stored spots
    Spots {
        #[command(subcommand)]
        action: SpotsAction,
    },

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

/// Bounding box for loaded assets
#[derive(Debug, Clone, Copy, Args)]
pub struct SizeArgs {
    /// Maximum width in pixels (defaults to the source width)
    #[arg(short = 'W', long)]
    pub width: Option<u32>,

    /// Maximum height in pixels (defaults to the source height)
    #[arg(short = 'H', long)]
    pub height: Option<u32>,

    /// Enlarge images smaller than the given width or height
    #[arg(long)]
    pub upscale: bool,
}

impl SizeArgs {
    /// The requested box. Upscaling needs at least one explicit side.
    pub fn target(&self) -> spotlens_media::TargetSize {
        let target = spotlens_media::TargetSize::new(
            self.width.unwrap_or(u32::MAX),
            self.height.unwrap_or(u32::MAX),
        );
        if self.upscale && (self.width.is_some() || self.height.is_some()) {
            target.with_upscale()
        } else {
            target
        }
    }
}

/// Cache subcommands
#[derive(Debug, Clone, Subcommand)]
pub enum CacheAction {
    /// List cached keys
    List,

    /// Print a random cached key
    Random,

    /// Show entry count, size and bounds
    Stats,

    /// Apply the eviction policy now
    Evict,

    /// Delete every cached asset
    Clear {
        /// Do not ask for confirmation
        #[arg(short, long)]
        yes: bool,
    },

    /// Show cache and database locations
    Info,
}

/// Spot subcommands
#[derive(Debug, Clone, Subcommand)]
pub enum SpotsAction {
    /// List spots
    #[command(alias = "ls")]
    List {
        #[command(flatten)]
        filter: SpotFilterArgs,
    },

    /// Show one spot with its media and comments
    Show {
        /// Spot id
        id: Uuid,
    },

    /// Delete a spot; its media are kept as unattached media
    #[command(alias = "rm")]
    Delete {
        /// Spot id
        id: Uuid,
    },

    /// Record that a spot was published under a server id
    Publish {
        /// Spot id
        id: Uuid,

        /// Identifier assigned by the backend
        server_id: String,
    },

    /// List local spots waiting to be published
    Pending,

    /// List pulled spots whose cache has expired
    Stale,

    /// List media left behind by deleted spots
    Unattached,

    /// Import a photo-scraper metadata.json file
    Import {
        /// Path to metadata.json
        input: PathBuf,

        /// Days before imported spots count as stale (defaults to config)
        #[arg(long)]
        ttl_days: Option<u32>,
    },
}

/// Filters for `spots list`
#[derive(Debug, Clone, Args)]
pub struct SpotFilterArgs {
    /// Only spots by this creator
    #[arg(long)]
    pub creator: Option<String>,

    /// Only spots with this status (draft, active, pending_review, archived)
    #[arg(long)]
    pub status: Option<SpotStatus>,

    /// Only spots with this privacy (public, friends_only, private)
    #[arg(long)]
    pub privacy: Option<Privacy>,

    /// Only spots carrying this tag
    #[arg(short, long)]
    pub tag: Option<String>,

    /// Only spots that were never published
    #[arg(long, conflicts_with = "synced")]
    pub local_only: bool,

    /// Only spots known to the backend
    #[arg(long)]
    pub synced: bool,

    /// Maximum number of spots (0 for all)
    #[arg(short = 'n', long, default_value = "50")]
    pub limit: u32,

    /// Skip this many spots
    #[arg(long, default_value = "0")]
    pub offset: u32,

    /// Oldest first instead of newest first
    #[arg(long)]
    pub oldest_first: bool,
}

/// Configuration subcommands
#[derive(Debug, Clone, Subcommand)]
pub enum ConfigAction {
    /// Show current configuration
    Show,

    /// Show configuration file path
    Path,

    /// Initialize default configuration
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

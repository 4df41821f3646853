//! Local-first persistence for photo spots.
//!
//! This crate stores spots and their children (media, sun and weather
//! snapshots, access info, comments) in SQLite. Entities are written as
//! flat records whose optional values use sentinel encodings; the
//! [`SentinelCodec`] converts between records and the domain types in
//! `spotlens-types`.
//!
//! # Features
//!
//! - Create, update, query and delete spots with their children
//! - Media survive the deletion of their spot as unattached media
//! - Track publish state and find pulled spots whose cache has expired
//! - Import photo-scraper `metadata.json` files as pulled spots
//!
//! # Example
//!
//! ```no_run
//! use spotlens_store::{SpotQuery, Store};
//! use spotlens_types::{GeoPoint, Spot};
//!
//! let store = Store::open_default()?;
//!
//! let spot = Spot::new_local("Mesa Arch", GeoPoint::new(38.39, -109.87), "me");
//! store.create_spot(&spot)?;
//!
//! let mine = store.list_spots(&SpotQuery::new().creator("me").limit(10))?;
//! # Ok::<(), spotlens_store::Error>(())
//! ```

mod codec;
mod error;
mod import;
mod queries;
mod records;
mod schema;
pub mod sentinel;
mod store;

pub use codec::SentinelCodec;
pub use error::{Error, Result};
pub use import::ImportResult;
pub use queries::SpotQuery;
pub use records::{
    AccessInfoRecord, CommentRecord, MediaRecord, SpotRecord, SunSnapshotRecord,
    WeatherSnapshotRecord,
};
pub use store::{DeleteSummary, PullOutcome, Store};

/// Default database path following platform conventions.
///
/// - Linux: `~/.local/share/spotlens/spots.db`
/// - macOS: `~/Library/Application Support/spotlens/spots.db`
/// - Windows: `C:\Users\<user>\AppData\Local\spotlens\spots.db`
pub fn default_db_path() -> std::path::PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| std::path::PathBuf::from("."))
        .join("spotlens")
        .join("spots.db")
}

//! Domain types for the spotlens photo-spot cache.
//!
//! This crate holds the values shared by the entity store and the media
//! cache: spots and everything a spot owns, the spot-level sync state, and
//! the asset identifier scheme used to key cached images.
//!
//! # Features
//!
//! - Domain entities with real optional fields ([`Spot`], [`Media`],
//!   [`SunSnapshot`], [`WeatherSnapshot`], [`AccessInfo`], [`Comment`])
//! - Publish/pull bookkeeping ([`SyncState`])
//! - Identifier classification and cache-key normalization ([`AssetId`],
//!   [`CacheKey`], [`normalize`])
//!
//! # Example
//!
//! ```
//! use spotlens_types::{GeoPoint, Spot, normalize};
//!
//! let spot = Spot::new_local("Mesa Arch", GeoPoint::new(38.389, -109.868), "user-1");
//! assert!(spot.sync.is_local_only);
//!
//! assert_eq!(normalize("photo_3f2a"), normalize("3f2a"));
//! ```

pub mod asset;
pub mod error;
pub mod sync;
pub mod types;

pub use asset::{AssetId, CACHE_FILE_EXTENSION, CacheKey, LegacyPrefix, MAX_KEY_LEN, normalize};
pub use error::{ParseError, ParseResult};
pub use sync::SyncState;
pub use types::{
    AccessInfo, CaptureMetadata, Comment, Difficulty, ExifBlock, GeoPoint, GpsFix, Media,
    MediaType, Privacy, Resolution, Spot, SpotStatus, SunSnapshot, WeatherCondition,
    WeatherSnapshot,
};

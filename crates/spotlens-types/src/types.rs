//! Core domain types for photo spots and their media.
//!
//! These are the values the rest of the application works with. Optional
//! fields are real [`Option`]s here; how they are laid out on disk is the
//! business of the store crate and never leaks into these types.

use core::fmt;
use core::str::FromStr;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::error::ParseError;
use crate::sync::SyncState;

/// Implements `as_str`, [`Display`](fmt::Display) and [`FromStr`] for a
/// fieldless enum from one table of `Variant => "text"` pairs.
macro_rules! text_enum {
    ($ty:ident, $kind:literal, { $($variant:ident => $text:literal),+ $(,)? }) => {
        impl $ty {
            /// Stable text form used for persistence.
            #[must_use]
            pub const fn as_str(&self) -> &'static str {
                match self {
                    $($ty::$variant => $text),+
                }
            }

            /// All variants, in declaration order.
            pub const ALL: &'static [$ty] = &[$($ty::$variant),+];
        }

        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $ty {
            type Err = ParseError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($text => Ok($ty::$variant),)+
                    other => Err(ParseError::unknown($kind, other)),
                }
            }
        }
    };
}

/// How hard it is to reach a spot.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum Difficulty {
    /// Roadside or a short flat walk.
    Easy,
    /// Some walking or mild elevation.
    #[default]
    Moderate,
    /// Long hike or scrambling.
    Hard,
    /// Technical terrain, experience required.
    Expert,
}

text_enum!(Difficulty, "difficulty", {
    Easy => "easy",
    Moderate => "moderate",
    Hard => "hard",
    Expert => "expert",
});

/// Who may see a spot.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum Privacy {
    /// Visible to everyone.
    #[default]
    Public,
    /// Visible to the creator's friends.
    FriendsOnly,
    /// Visible to the creator only.
    Private,
}

text_enum!(Privacy, "privacy", {
    Public => "public",
    FriendsOnly => "friends_only",
    Private => "private",
});

/// Moderation/lifecycle status of a spot.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum SpotStatus {
    /// Not yet submitted.
    #[default]
    Draft,
    /// Listed and visible.
    Active,
    /// Waiting for moderation.
    PendingReview,
    /// No longer listed.
    Archived,
}

text_enum!(SpotStatus, "spot status", {
    Draft => "draft",
    Active => "active",
    PendingReview => "pending_review",
    Archived => "archived",
});

/// Kind of captured media.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum MediaType {
    /// Still image.
    #[default]
    Photo,
    /// Video clip.
    Video,
}

text_enum!(MediaType, "media type", {
    Photo => "photo",
    Video => "video",
});

/// Coarse sky condition reported with a weather snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum WeatherCondition {
    Clear,
    PartlyCloudy,
    Overcast,
    Fog,
    Rain,
    Snow,
    Storm,
}

text_enum!(WeatherCondition, "weather condition", {
    Clear => "clear",
    PartlyCloudy => "partly_cloudy",
    Overcast => "overcast",
    Fog => "fog",
    Rain => "rain",
    Snow => "snow",
    Storm => "storm",
});

/// A WGS84 coordinate in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct GeoPoint {
    pub latitude: f64,
    pub longitude: f64,
}

impl GeoPoint {
    /// Create a new coordinate.
    pub const fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// Whether both components are finite and inside their valid ranges.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.latitude.is_finite()
            && self.longitude.is_finite()
            && (-90.0..=90.0).contains(&self.latitude)
            && (-180.0..=180.0).contains(&self.longitude)
    }
}

impl fmt::Display for GeoPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.6}, {:.6}", self.latitude, self.longitude)
    }
}

/// Pixel dimensions of a photo or video frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Resolution {
    pub width: u32,
    pub height: u32,
}

/// A GPS fix recorded by the camera.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct GpsFix {
    pub point: GeoPoint,
    /// Altitude above sea level in meters. `Some(0.0)` is sea level.
    pub altitude_m: Option<f64>,
}

/// Fields lifted from a photo's EXIF block.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ExifBlock {
    pub gps: Option<GpsFix>,
    /// EXIF orientation tag (1-8).
    pub orientation: Option<u16>,
    pub software: Option<String>,
    pub flash_fired: Option<bool>,
    #[cfg_attr(feature = "serde", serde(with = "time::serde::rfc3339::option"))]
    pub date_time_original: Option<OffsetDateTime>,
}

/// Metadata produced by the platform EXIF extractor for a freshly captured
/// or imported photo.
///
/// Every field is optional: extractors report only what the file carries.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CaptureMetadata {
    pub exif: Option<ExifBlock>,
    pub device_make: Option<String>,
    pub device_model: Option<String>,
    pub lens_model: Option<String>,
    pub focal_length_mm: Option<f64>,
    pub aperture: Option<f64>,
    pub shutter_speed_s: Option<f64>,
    pub iso: Option<u32>,
    pub exposure_bias: Option<f64>,
    pub resolution: Option<Resolution>,
    pub heading: Option<f64>,
    pub capture_time: Option<OffsetDateTime>,
}

/// A photo or video attached to a spot.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Media {
    pub id: Uuid,
    /// Owning spot, if the media has been attached to one.
    pub spot_id: Option<Uuid>,
    pub user_id: String,
    pub media_type: MediaType,
    /// Asset identifier: a remote URL or a local/legacy id.
    pub url: String,
    pub thumbnail_url: Option<String>,
    #[cfg_attr(feature = "serde", serde(with = "time::serde::rfc3339::option"))]
    pub capture_time: Option<OffsetDateTime>,
    pub exif: Option<ExifBlock>,
    pub device_make: Option<String>,
    pub device_model: Option<String>,
    pub lens_model: Option<String>,
    /// Focal length in millimeters.
    pub focal_length_mm: Option<f64>,
    /// Aperture as an f-number.
    pub aperture: Option<f64>,
    /// Exposure time in seconds.
    pub shutter_speed_s: Option<f64>,
    pub iso: Option<u32>,
    /// Exposure compensation in EV; zero and negative values are legitimate.
    pub exposure_bias: Option<f64>,
    pub resolution: Option<Resolution>,
    pub presets: Vec<String>,
    pub filters: Vec<String>,
    /// Compass heading in degrees; `Some(0.0)` is due north.
    pub heading: Option<f64>,
    pub original_filename: Option<String>,
    #[cfg_attr(feature = "serde", serde(with = "time::serde::rfc3339"))]
    pub created_at: OffsetDateTime,
}

impl Media {
    /// Create a new photo owned by `user_id`, pointing at `url`.
    pub fn new_photo(user_id: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            spot_id: None,
            user_id: user_id.into(),
            media_type: MediaType::Photo,
            url: url.into(),
            thumbnail_url: None,
            capture_time: None,
            exif: None,
            device_make: None,
            device_model: None,
            lens_model: None,
            focal_length_mm: None,
            aperture: None,
            shutter_speed_s: None,
            iso: None,
            exposure_bias: None,
            resolution: None,
            presets: Vec::new(),
            filters: Vec::new(),
            heading: None,
            original_filename: None,
            created_at: OffsetDateTime::now_utc(),
        }
    }

    /// Attach this media to a spot.
    #[must_use]
    pub fn for_spot(mut self, spot_id: Uuid) -> Self {
        self.spot_id = Some(spot_id);
        self
    }
}

/// Sun position and light windows for a spot on a given day.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SunSnapshot {
    pub id: Uuid,
    pub spot_id: Uuid,
    #[cfg_attr(feature = "serde", serde(with = "time::serde::rfc3339"))]
    pub date: OffsetDateTime,
    #[cfg_attr(feature = "serde", serde(with = "time::serde::rfc3339::option"))]
    pub sunrise: Option<OffsetDateTime>,
    #[cfg_attr(feature = "serde", serde(with = "time::serde::rfc3339::option"))]
    pub sunset: Option<OffsetDateTime>,
    #[cfg_attr(feature = "serde", serde(with = "time::serde::rfc3339::option"))]
    pub golden_hour_start: Option<OffsetDateTime>,
    #[cfg_attr(feature = "serde", serde(with = "time::serde::rfc3339::option"))]
    pub golden_hour_end: Option<OffsetDateTime>,
    #[cfg_attr(feature = "serde", serde(with = "time::serde::rfc3339::option"))]
    pub blue_hour_start: Option<OffsetDateTime>,
    #[cfg_attr(feature = "serde", serde(with = "time::serde::rfc3339::option"))]
    pub blue_hour_end: Option<OffsetDateTime>,
    pub sun_azimuth_deg: Option<f64>,
    /// Sun altitude; negative below the horizon.
    pub sun_altitude_deg: Option<f64>,
    /// Minutes until the next golden hour; negative once it has started.
    pub minutes_to_golden_hour: Option<i32>,
    /// Moon phase in `[0, 1)`, where 0 is new moon.
    pub moon_phase: Option<f64>,
    pub moon_illumination_pct: Option<u8>,
}

impl SunSnapshot {
    /// An empty snapshot for `spot_id` taken at `date`.
    pub fn new(spot_id: Uuid, date: OffsetDateTime) -> Self {
        Self {
            id: Uuid::new_v4(),
            spot_id,
            date,
            sunrise: None,
            sunset: None,
            golden_hour_start: None,
            golden_hour_end: None,
            blue_hour_start: None,
            blue_hour_end: None,
            sun_azimuth_deg: None,
            sun_altitude_deg: None,
            minutes_to_golden_hour: None,
            moon_phase: None,
            moon_illumination_pct: None,
        }
    }
}

/// Weather conditions observed or forecast for a spot.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct WeatherSnapshot {
    pub id: Uuid,
    pub spot_id: Uuid,
    #[cfg_attr(feature = "serde", serde(with = "time::serde::rfc3339"))]
    pub date: OffsetDateTime,
    pub temperature_c: Option<f64>,
    pub feels_like_c: Option<f64>,
    pub humidity_pct: Option<u8>,
    pub cloud_cover_pct: Option<u8>,
    pub wind_speed_ms: Option<f64>,
    pub wind_direction_deg: Option<u16>,
    pub visibility_m: Option<u32>,
    pub precipitation_mm: Option<f64>,
    pub uv_index: Option<f64>,
    pub condition: Option<WeatherCondition>,
}

impl WeatherSnapshot {
    /// An empty snapshot for `spot_id` taken at `date`.
    pub fn new(spot_id: Uuid, date: OffsetDateTime) -> Self {
        Self {
            id: Uuid::new_v4(),
            spot_id,
            date,
            temperature_c: None,
            feels_like_c: None,
            humidity_pct: None,
            cloud_cover_pct: None,
            wind_speed_ms: None,
            wind_direction_deg: None,
            visibility_m: None,
            precipitation_mm: None,
            uv_index: None,
            condition: None,
        }
    }
}

/// How to get to a spot.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct AccessInfo {
    pub id: Uuid,
    pub spot_id: Uuid,
    pub parking: Option<GeoPoint>,
    pub parking_notes: Option<String>,
    pub route_distance_m: Option<f64>,
    pub elevation_gain_m: Option<f64>,
    pub hike_minutes: Option<u32>,
    pub route_description: Option<String>,
    pub hazards: Vec<String>,
    /// Free-text fee description ("$5 day pass").
    pub fee: Option<String>,
    pub requires_permit: bool,
    pub best_season: Option<String>,
}

impl AccessInfo {
    /// Access info for `spot_id` with nothing filled in.
    pub fn new(spot_id: Uuid) -> Self {
        Self {
            id: Uuid::new_v4(),
            spot_id,
            parking: None,
            parking_notes: None,
            route_distance_m: None,
            elevation_gain_m: None,
            hike_minutes: None,
            route_description: None,
            hazards: Vec::new(),
            fee: None,
            requires_permit: false,
            best_season: None,
        }
    }
}

/// A user comment on a spot.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Comment {
    pub id: Uuid,
    pub spot_id: Uuid,
    pub user_id: String,
    pub body: String,
    /// Comment this one replies to.
    pub parent_id: Option<Uuid>,
    #[cfg_attr(feature = "serde", serde(with = "time::serde::rfc3339"))]
    pub created_at: OffsetDateTime,
}

impl Comment {
    /// A new top-level comment.
    pub fn new(spot_id: Uuid, user_id: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            spot_id,
            user_id: user_id.into(),
            body: body.into(),
            parent_id: None,
            created_at: OffsetDateTime::now_utc(),
        }
    }
}

/// A photography location.
///
/// Children (`media`, `comments`, snapshots, access info) are owned by the
/// spot but persisted as separate records that reference it by id.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Spot {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub location: GeoPoint,
    /// Suggested shooting direction in degrees.
    pub heading: Option<f64>,
    pub elevation_m: Option<f64>,
    pub tags: Vec<String>,
    pub difficulty: Difficulty,
    pub creator_id: String,
    pub privacy: Privacy,
    pub license: String,
    pub status: SpotStatus,
    #[cfg_attr(feature = "serde", serde(with = "time::serde::rfc3339"))]
    pub created_at: OffsetDateTime,
    #[cfg_attr(feature = "serde", serde(with = "time::serde::rfc3339"))]
    pub updated_at: OffsetDateTime,
    pub media: Vec<Media>,
    pub sun: Option<SunSnapshot>,
    pub weather: Option<WeatherSnapshot>,
    pub access: Option<AccessInfo>,
    pub comments: Vec<Comment>,
    pub vote_count: u32,
    pub sync: SyncState,
}

impl Spot {
    /// Create a spot on this device. It starts local-only and unpublished.
    pub fn new_local(
        title: impl Into<String>,
        location: GeoPoint,
        creator_id: impl Into<String>,
    ) -> Self {
        let now = OffsetDateTime::now_utc();
        Self {
            id: Uuid::new_v4(),
            title: title.into(),
            description: None,
            location,
            heading: None,
            elevation_m: None,
            tags: Vec::new(),
            difficulty: Difficulty::default(),
            creator_id: creator_id.into(),
            privacy: Privacy::default(),
            license: String::new(),
            status: SpotStatus::default(),
            created_at: now,
            updated_at: now,
            media: Vec::new(),
            sun: None,
            weather: None,
            access: None,
            comments: Vec::new(),
            vote_count: 0,
            sync: SyncState::local(),
        }
    }

    /// Add a tag unless it is already present.
    pub fn add_tag(&mut self, tag: impl Into<String>) {
        let tag = tag.into();
        if !self.tags.contains(&tag) {
            self.tags.push(tag);
        }
    }

    /// Identifier of the first photo, used as the spot's cover image.
    #[must_use]
    pub fn cover_asset(&self) -> Option<&str> {
        self.media
            .iter()
            .find(|m| m.media_type == MediaType::Photo)
            .map(|m| m.url.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_enum_text_roundtrip() {
        for d in Difficulty::ALL {
            assert_eq!(d.as_str().parse::<Difficulty>().unwrap(), *d);
        }
        for p in Privacy::ALL {
            assert_eq!(p.as_str().parse::<Privacy>().unwrap(), *p);
        }
        for s in SpotStatus::ALL {
            assert_eq!(s.as_str().parse::<SpotStatus>().unwrap(), *s);
        }
        for c in WeatherCondition::ALL {
            assert_eq!(c.as_str().parse::<WeatherCondition>().unwrap(), *c);
        }
    }

    #[test]
    fn test_unknown_variant_error() {
        let err = "cliff".parse::<Difficulty>().unwrap_err();
        assert_eq!(err.to_string(), "Unknown difficulty: 'cliff'");
    }

    #[test]
    fn test_geo_point_validity() {
        assert!(GeoPoint::new(0.0, 0.0).is_valid());
        assert!(GeoPoint::new(-33.86, 151.21).is_valid());
        assert!(!GeoPoint::new(91.0, 0.0).is_valid());
        assert!(!GeoPoint::new(f64::NAN, 10.0).is_valid());
    }

    #[test]
    fn test_new_local_spot() {
        let spot = Spot::new_local("Mesa Arch", GeoPoint::new(38.39, -109.87), "user-1");
        assert!(spot.sync.is_local_only);
        assert!(!spot.sync.is_published);
        assert!(spot.sync.server_id.is_none());
        assert_eq!(spot.status, SpotStatus::Draft);
        assert_eq!(spot.created_at, spot.updated_at);
    }

    #[test]
    fn test_add_tag_dedups() {
        let mut spot = Spot::new_local("Arch", GeoPoint::new(1.0, 2.0), "u");
        spot.add_tag("sunrise");
        spot.add_tag("sunrise");
        spot.add_tag("desert");
        assert_eq!(spot.tags, vec!["sunrise", "desert"]);
    }

    #[test]
    fn test_cover_asset_skips_video() {
        let mut spot = Spot::new_local("Falls", GeoPoint::new(1.0, 2.0), "u");
        let mut video = Media::new_photo("u", "local_clip");
        video.media_type = MediaType::Video;
        spot.media.push(video);
        spot.media.push(Media::new_photo("u", "photo_abc"));
        assert_eq!(spot.cover_asset(), Some("photo_abc"));
    }
}

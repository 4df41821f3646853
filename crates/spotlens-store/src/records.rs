//! Flat persisted records.
//!
//! Every field here is a plain storage value. Absence is spelled with the
//! sentinels in [`crate::sentinel`]; use [`SentinelCodec`](crate::SentinelCodec)
//! to convert to and from the domain types.

use rusqlite::types::ToSql;
use rusqlite::Row;

/// A flat row in one of the store's tables.
pub(crate) trait StoredRecord: Sized {
    const TABLE: &'static str;
    /// Column names; `id` is always first.
    const COLUMNS: &'static [&'static str];

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self>;

    /// Values in [`COLUMNS`](Self::COLUMNS) order.
    fn values(&self) -> Vec<&dyn ToSql>;
}

/// SQLite stores NaN as NULL; every REAL column reads NULL back as NaN.
fn nan_column(row: &Row<'_>, column: &str) -> rusqlite::Result<f64> {
    Ok(row.get::<_, Option<f64>>(column)?.unwrap_or(f64::NAN))
}

/// Persisted form of a [`Spot`](spotlens_types::Spot), without its children.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SpotRecord {
    pub id: String,
    pub title: String,
    pub description: String,
    pub latitude: f64,
    pub longitude: f64,
    pub heading: f64,
    pub elevation_m: f64,
    pub tags: String,
    pub difficulty: String,
    pub creator_id: String,
    pub privacy: String,
    pub license: String,
    pub status: String,
    pub created_at: String,
    pub updated_at: String,
    pub vote_count: i64,
    pub is_local_only: bool,
    pub is_published: bool,
    pub last_synced: String,
    pub cache_expiry: String,
    pub server_id: String,
}

impl StoredRecord for SpotRecord {
    const TABLE: &'static str = "spots";
    const COLUMNS: &'static [&'static str] = &[
        "id",
        "title",
        "description",
        "latitude",
        "longitude",
        "heading",
        "elevation_m",
        "tags",
        "difficulty",
        "creator_id",
        "privacy",
        "license",
        "status",
        "created_at",
        "updated_at",
        "vote_count",
        "is_local_only",
        "is_published",
        "last_synced",
        "cache_expiry",
        "server_id",
    ];

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get("id")?,
            title: row.get("title")?,
            description: row.get("description")?,
            latitude: nan_column(row, "latitude")?,
            longitude: nan_column(row, "longitude")?,
            heading: nan_column(row, "heading")?,
            elevation_m: nan_column(row, "elevation_m")?,
            tags: row.get("tags")?,
            difficulty: row.get("difficulty")?,
            creator_id: row.get("creator_id")?,
            privacy: row.get("privacy")?,
            license: row.get("license")?,
            status: row.get("status")?,
            created_at: row.get("created_at")?,
            updated_at: row.get("updated_at")?,
            vote_count: row.get("vote_count")?,
            is_local_only: row.get("is_local_only")?,
            is_published: row.get("is_published")?,
            last_synced: row.get("last_synced")?,
            cache_expiry: row.get("cache_expiry")?,
            server_id: row.get("server_id")?,
        })
    }

    fn values(&self) -> Vec<&dyn ToSql> {
        vec![
            &self.id,
            &self.title,
            &self.description,
            &self.latitude,
            &self.longitude,
            &self.heading,
            &self.elevation_m,
            &self.tags,
            &self.difficulty,
            &self.creator_id,
            &self.privacy,
            &self.license,
            &self.status,
            &self.created_at,
            &self.updated_at,
            &self.vote_count,
            &self.is_local_only,
            &self.is_published,
            &self.last_synced,
            &self.cache_expiry,
            &self.server_id,
        ]
    }
}

/// Persisted form of a [`Media`](spotlens_types::Media).
///
/// The EXIF block is flattened with two presence bits: `has_exif` for the
/// block and `exif_has_gps` for its fix, since `(0, 0)` is a real coordinate.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MediaRecord {
    pub id: String,
    /// Empty when the media is not attached to a spot.
    pub spot_id: String,
    pub user_id: String,
    pub media_type: String,
    pub url: String,
    pub thumbnail_url: String,
    pub capture_time: String,
    pub has_exif: bool,
    pub exif_has_gps: bool,
    pub exif_latitude: f64,
    pub exif_longitude: f64,
    pub exif_altitude_m: f64,
    pub exif_orientation: i32,
    pub exif_software: String,
    pub exif_flash_fired: i32,
    pub exif_date_time_original: String,
    pub device_make: String,
    pub device_model: String,
    pub lens_model: String,
    pub focal_length_mm: f64,
    pub aperture: f64,
    pub shutter_speed_s: f64,
    pub iso: i32,
    pub exposure_bias: f64,
    pub resolution_width: i32,
    pub resolution_height: i32,
    pub presets: String,
    pub filters: String,
    pub heading: f64,
    pub original_filename: String,
    pub created_at: String,
}

impl StoredRecord for MediaRecord {
    const TABLE: &'static str = "media";
    const COLUMNS: &'static [&'static str] = &[
        "id",
        "spot_id",
        "user_id",
        "media_type",
        "url",
        "thumbnail_url",
        "capture_time",
        "has_exif",
        "exif_has_gps",
        "exif_latitude",
        "exif_longitude",
        "exif_altitude_m",
        "exif_orientation",
        "exif_software",
        "exif_flash_fired",
        "exif_date_time_original",
        "device_make",
        "device_model",
        "lens_model",
        "focal_length_mm",
        "aperture",
        "shutter_speed_s",
        "iso",
        "exposure_bias",
        "resolution_width",
        "resolution_height",
        "presets",
        "filters",
        "heading",
        "original_filename",
        "created_at",
    ];

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get("id")?,
            spot_id: row.get("spot_id")?,
            user_id: row.get("user_id")?,
            media_type: row.get("media_type")?,
            url: row.get("url")?,
            thumbnail_url: row.get("thumbnail_url")?,
            capture_time: row.get("capture_time")?,
            has_exif: row.get("has_exif")?,
            exif_has_gps: row.get("exif_has_gps")?,
            exif_latitude: nan_column(row, "exif_latitude")?,
            exif_longitude: nan_column(row, "exif_longitude")?,
            exif_altitude_m: nan_column(row, "exif_altitude_m")?,
            exif_orientation: row.get("exif_orientation")?,
            exif_software: row.get("exif_software")?,
            exif_flash_fired: row.get("exif_flash_fired")?,
            exif_date_time_original: row.get("exif_date_time_original")?,
            device_make: row.get("device_make")?,
            device_model: row.get("device_model")?,
            lens_model: row.get("lens_model")?,
            focal_length_mm: nan_column(row, "focal_length_mm")?,
            aperture: nan_column(row, "aperture")?,
            shutter_speed_s: nan_column(row, "shutter_speed_s")?,
            iso: row.get("iso")?,
            exposure_bias: nan_column(row, "exposure_bias")?,
            resolution_width: row.get("resolution_width")?,
            resolution_height: row.get("resolution_height")?,
            presets: row.get("presets")?,
            filters: row.get("filters")?,
            heading: nan_column(row, "heading")?,
            original_filename: row.get("original_filename")?,
            created_at: row.get("created_at")?,
        })
    }

    fn values(&self) -> Vec<&dyn ToSql> {
        vec![
            &self.id,
            &self.spot_id,
            &self.user_id,
            &self.media_type,
            &self.url,
            &self.thumbnail_url,
            &self.capture_time,
            &self.has_exif,
            &self.exif_has_gps,
            &self.exif_latitude,
            &self.exif_longitude,
            &self.exif_altitude_m,
            &self.exif_orientation,
            &self.exif_software,
            &self.exif_flash_fired,
            &self.exif_date_time_original,
            &self.device_make,
            &self.device_model,
            &self.lens_model,
            &self.focal_length_mm,
            &self.aperture,
            &self.shutter_speed_s,
            &self.iso,
            &self.exposure_bias,
            &self.resolution_width,
            &self.resolution_height,
            &self.presets,
            &self.filters,
            &self.heading,
            &self.original_filename,
            &self.created_at,
        ]
    }
}

/// Persisted form of a [`SunSnapshot`](spotlens_types::SunSnapshot).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SunSnapshotRecord {
    pub id: String,
    pub spot_id: String,
    pub date: String,
    pub sunrise: String,
    pub sunset: String,
    pub golden_hour_start: String,
    pub golden_hour_end: String,
    pub blue_hour_start: String,
    pub blue_hour_end: String,
    pub sun_azimuth_deg: f64,
    pub sun_altitude_deg: f64,
    pub minutes_to_golden_hour: i32,
    pub moon_phase: f64,
    pub moon_illumination_pct: i32,
}

impl StoredRecord for SunSnapshotRecord {
    const TABLE: &'static str = "sun_snapshots";
    const COLUMNS: &'static [&'static str] = &[
        "id",
        "spot_id",
        "date",
        "sunrise",
        "sunset",
        "golden_hour_start",
        "golden_hour_end",
        "blue_hour_start",
        "blue_hour_end",
        "sun_azimuth_deg",
        "sun_altitude_deg",
        "minutes_to_golden_hour",
        "moon_phase",
        "moon_illumination_pct",
    ];

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get("id")?,
            spot_id: row.get("spot_id")?,
            date: row.get("date")?,
            sunrise: row.get("sunrise")?,
            sunset: row.get("sunset")?,
            golden_hour_start: row.get("golden_hour_start")?,
            golden_hour_end: row.get("golden_hour_end")?,
            blue_hour_start: row.get("blue_hour_start")?,
            blue_hour_end: row.get("blue_hour_end")?,
            sun_azimuth_deg: nan_column(row, "sun_azimuth_deg")?,
            sun_altitude_deg: nan_column(row, "sun_altitude_deg")?,
            minutes_to_golden_hour: row.get("minutes_to_golden_hour")?,
            moon_phase: nan_column(row, "moon_phase")?,
            moon_illumination_pct: row.get("moon_illumination_pct")?,
        })
    }

    fn values(&self) -> Vec<&dyn ToSql> {
        vec![
            &self.id,
            &self.spot_id,
            &self.date,
            &self.sunrise,
            &self.sunset,
            &self.golden_hour_start,
            &self.golden_hour_end,
            &self.blue_hour_start,
            &self.blue_hour_end,
            &self.sun_azimuth_deg,
            &self.sun_altitude_deg,
            &self.minutes_to_golden_hour,
            &self.moon_phase,
            &self.moon_illumination_pct,
        ]
    }
}

/// Persisted form of a [`WeatherSnapshot`](spotlens_types::WeatherSnapshot).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WeatherSnapshotRecord {
    pub id: String,
    pub spot_id: String,
    pub date: String,
    pub temperature_c: f64,
    pub feels_like_c: f64,
    pub humidity_pct: i32,
    pub cloud_cover_pct: i32,
    pub wind_speed_ms: f64,
    pub wind_direction_deg: i32,
    pub visibility_m: i32,
    pub precipitation_mm: f64,
    pub uv_index: f64,
    pub condition: String,
}

impl StoredRecord for WeatherSnapshotRecord {
    const TABLE: &'static str = "weather_snapshots";
    const COLUMNS: &'static [&'static str] = &[
        "id",
        "spot_id",
        "date",
        "temperature_c",
        "feels_like_c",
        "humidity_pct",
        "cloud_cover_pct",
        "wind_speed_ms",
        "wind_direction_deg",
        "visibility_m",
        "precipitation_mm",
        "uv_index",
        "condition",
    ];

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get("id")?,
            spot_id: row.get("spot_id")?,
            date: row.get("date")?,
            temperature_c: nan_column(row, "temperature_c")?,
            feels_like_c: nan_column(row, "feels_like_c")?,
            humidity_pct: row.get("humidity_pct")?,
            cloud_cover_pct: row.get("cloud_cover_pct")?,
            wind_speed_ms: nan_column(row, "wind_speed_ms")?,
            wind_direction_deg: row.get("wind_direction_deg")?,
            visibility_m: row.get("visibility_m")?,
            precipitation_mm: nan_column(row, "precipitation_mm")?,
            uv_index: nan_column(row, "uv_index")?,
            condition: row.get("condition")?,
        })
    }

    fn values(&self) -> Vec<&dyn ToSql> {
        vec![
            &self.id,
            &self.spot_id,
            &self.date,
            &self.temperature_c,
            &self.feels_like_c,
            &self.humidity_pct,
            &self.cloud_cover_pct,
            &self.wind_speed_ms,
            &self.wind_direction_deg,
            &self.visibility_m,
            &self.precipitation_mm,
            &self.uv_index,
            &self.condition,
        ]
    }
}

/// Persisted form of an [`AccessInfo`](spotlens_types::AccessInfo).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AccessInfoRecord {
    pub id: String,
    pub spot_id: String,
    pub has_parking: bool,
    pub parking_latitude: f64,
    pub parking_longitude: f64,
    pub parking_notes: String,
    pub route_distance_m: f64,
    pub elevation_gain_m: f64,
    pub hike_minutes: i32,
    pub route_description: String,
    pub hazards: String,
    pub fee: String,
    pub requires_permit: bool,
    pub best_season: String,
}

impl StoredRecord for AccessInfoRecord {
    const TABLE: &'static str = "access_info";
    const COLUMNS: &'static [&'static str] = &[
        "id",
        "spot_id",
        "has_parking",
        "parking_latitude",
        "parking_longitude",
        "parking_notes",
        "route_distance_m",
        "elevation_gain_m",
        "hike_minutes",
        "route_description",
        "hazards",
        "fee",
        "requires_permit",
        "best_season",
    ];

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get("id")?,
            spot_id: row.get("spot_id")?,
            has_parking: row.get("has_parking")?,
            parking_latitude: nan_column(row, "parking_latitude")?,
            parking_longitude: nan_column(row, "parking_longitude")?,
            parking_notes: row.get("parking_notes")?,
            route_distance_m: nan_column(row, "route_distance_m")?,
            elevation_gain_m: nan_column(row, "elevation_gain_m")?,
            hike_minutes: row.get("hike_minutes")?,
            route_description: row.get("route_description")?,
            hazards: row.get("hazards")?,
            fee: row.get("fee")?,
            requires_permit: row.get("requires_permit")?,
            best_season: row.get("best_season")?,
        })
    }

    fn values(&self) -> Vec<&dyn ToSql> {
        vec![
            &self.id,
            &self.spot_id,
            &self.has_parking,
            &self.parking_latitude,
            &self.parking_longitude,
            &self.parking_notes,
            &self.route_distance_m,
            &self.elevation_gain_m,
            &self.hike_minutes,
            &self.route_description,
            &self.hazards,
            &self.fee,
            &self.requires_permit,
            &self.best_season,
        ]
    }
}

/// Persisted form of a [`Comment`](spotlens_types::Comment).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CommentRecord {
    pub id: String,
    pub spot_id: String,
    pub user_id: String,
    pub body: String,
    pub parent_id: String,
    pub created_at: String,
}

impl StoredRecord for CommentRecord {
    const TABLE: &'static str = "comments";
    const COLUMNS: &'static [&'static str] =
        &["id", "spot_id", "user_id", "body", "parent_id", "created_at"];

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get("id")?,
            spot_id: row.get("spot_id")?,
            user_id: row.get("user_id")?,
            body: row.get("body")?,
            parent_id: row.get("parent_id")?,
            created_at: row.get("created_at")?,
        })
    }

    fn values(&self) -> Vec<&dyn ToSql> {
        vec![
            &self.id,
            &self.spot_id,
            &self.user_id,
            &self.body,
            &self.parent_id,
            &self.created_at,
        ]
    }
}

//! Conversion between domain entities and flat records.

use spotlens_types::{
    AccessInfo, CaptureMetadata, Comment, ExifBlock, GeoPoint, GpsFix, Media, Resolution, Spot,
    SunSnapshot, SyncState, WeatherSnapshot,
};

use crate::records::{
    AccessInfoRecord, CommentRecord, MediaRecord, SpotRecord, SunSnapshotRecord,
    WeatherSnapshotRecord,
};
use crate::sentinel::*;

/// Bidirectional mapping between a flat record and its domain entity.
///
/// Decoding never fails: unrecognized or corrupt values decode to absent.
/// Encoding into an existing record never touches its `id`.
pub trait SentinelCodec: Sized {
    type Domain;

    /// Reconstruct the domain entity.
    fn decode(&self) -> Self::Domain;

    /// Create a fresh record, taking the id from the entity.
    fn encode(value: &Self::Domain) -> Self;

    /// Overwrite every field except `id`.
    fn encode_into(&mut self, value: &Self::Domain);
}

impl SentinelCodec for SpotRecord {
    type Domain = Spot;

    /// Children are persisted separately and come back empty.
    fn decode(&self) -> Spot {
        Spot {
            id: decode_required_uuid(&self.id),
            title: self.title.clone(),
            description: decode_text(&self.description),
            location: GeoPoint::new(self.latitude, self.longitude),
            heading: decode_nan(self.heading),
            elevation_m: decode_nan(self.elevation_m),
            tags: decode_list(&self.tags),
            difficulty: decode_enum_or_default(&self.difficulty),
            creator_id: self.creator_id.clone(),
            privacy: decode_enum_or_default(&self.privacy),
            license: self.license.clone(),
            status: decode_enum_or_default(&self.status),
            created_at: decode_required_time(&self.created_at),
            updated_at: decode_required_time(&self.updated_at),
            media: Vec::new(),
            sun: None,
            weather: None,
            access: None,
            comments: Vec::new(),
            vote_count: u32::try_from(self.vote_count.max(0)).unwrap_or(u32::MAX),
            sync: SyncState {
                is_local_only: self.is_local_only,
                is_published: self.is_published,
                last_synced: decode_time(&self.last_synced),
                cache_expiry: decode_time(&self.cache_expiry),
                server_id: decode_text(&self.server_id),
            },
        }
    }

    fn encode(value: &Spot) -> Self {
        let mut record = Self {
            id: value.id.to_string(),
            ..Default::default()
        };
        record.encode_into(value);
        record
    }

    fn encode_into(&mut self, value: &Spot) {
        self.title = value.title.clone();
        self.description = encode_text(value.description.as_deref());
        self.latitude = value.location.latitude;
        self.longitude = value.location.longitude;
        self.heading = encode_nan(value.heading);
        self.elevation_m = encode_nan(value.elevation_m);
        self.tags = encode_list(&value.tags);
        self.difficulty = value.difficulty.to_string();
        self.creator_id = value.creator_id.clone();
        self.privacy = value.privacy.to_string();
        self.license = value.license.clone();
        self.status = value.status.to_string();
        self.created_at = encode_required_time(value.created_at);
        self.updated_at = encode_required_time(value.updated_at);
        self.vote_count = i64::from(value.vote_count);
        self.is_local_only = value.sync.is_local_only;
        self.is_published = value.sync.is_published;
        self.last_synced = encode_time(value.sync.last_synced);
        self.cache_expiry = encode_time(value.sync.cache_expiry);
        self.server_id = encode_text(value.sync.server_id.as_deref());
    }
}

impl MediaRecord {
    fn decode_exif(&self) -> Option<ExifBlock> {
        if !self.has_exif {
            return None;
        }
        let gps = self.exif_has_gps.then(|| GpsFix {
            point: GeoPoint::new(self.exif_latitude, self.exif_longitude),
            altitude_m: decode_nan(self.exif_altitude_m),
        });
        Some(ExifBlock {
            gps,
            orientation: decode_non_negative(self.exif_orientation),
            software: decode_text(&self.exif_software),
            flash_fired: decode_flag(self.exif_flash_fired),
            date_time_original: decode_time(&self.exif_date_time_original),
        })
    }

    fn encode_exif(&mut self, exif: Option<&ExifBlock>) {
        self.has_exif = exif.is_some();
        let gps = exif.and_then(|e| e.gps);
        self.exif_has_gps = gps.is_some();
        self.exif_latitude = gps.map_or(0.0, |g| g.point.latitude);
        self.exif_longitude = gps.map_or(0.0, |g| g.point.longitude);
        self.exif_altitude_m = encode_nan(gps.and_then(|g| g.altitude_m));
        self.exif_orientation = encode_non_negative(exif.and_then(|e| e.orientation));
        self.exif_software = encode_text(exif.and_then(|e| e.software.as_deref()));
        self.exif_flash_fired = encode_flag(exif.and_then(|e| e.flash_fired));
        self.exif_date_time_original = encode_time(exif.and_then(|e| e.date_time_original));
    }

    /// Merge extractor output into this record.
    ///
    /// Fields the extractor reports overwrite the stored ones; fields it
    /// leaves out keep their current value.
    pub fn encode_capture(&mut self, metadata: &CaptureMetadata) {
        let mut media = self.decode();
        if let Some(exif) = &metadata.exif {
            media.exif = Some(exif.clone());
        }
        merge(&mut media.device_make, &metadata.device_make);
        merge(&mut media.device_model, &metadata.device_model);
        merge(&mut media.lens_model, &metadata.lens_model);
        merge(&mut media.focal_length_mm, &metadata.focal_length_mm);
        merge(&mut media.aperture, &metadata.aperture);
        merge(&mut media.shutter_speed_s, &metadata.shutter_speed_s);
        merge(&mut media.iso, &metadata.iso);
        merge(&mut media.exposure_bias, &metadata.exposure_bias);
        merge(&mut media.resolution, &metadata.resolution);
        merge(&mut media.heading, &metadata.heading);
        merge(&mut media.capture_time, &metadata.capture_time);
        self.encode_into(&media);
    }
}

fn merge<T: Clone>(target: &mut Option<T>, incoming: &Option<T>) {
    if incoming.is_some() {
        target.clone_from(incoming);
    }
}

impl SentinelCodec for MediaRecord {
    type Domain = Media;

    fn decode(&self) -> Media {
        let resolution = match (
            decode_non_negative::<u32>(self.resolution_width),
            decode_non_negative::<u32>(self.resolution_height),
        ) {
            (Some(width), Some(height)) => Some(Resolution { width, height }),
            _ => None,
        };
        Media {
            id: decode_required_uuid(&self.id),
            spot_id: decode_uuid(&self.spot_id),
            user_id: self.user_id.clone(),
            media_type: decode_enum_or_default(&self.media_type),
            url: self.url.clone(),
            thumbnail_url: decode_text(&self.thumbnail_url),
            capture_time: decode_time(&self.capture_time),
            exif: self.decode_exif(),
            device_make: decode_text(&self.device_make),
            device_model: decode_text(&self.device_model),
            lens_model: decode_text(&self.lens_model),
            focal_length_mm: decode_nonzero(self.focal_length_mm),
            aperture: decode_nonzero(self.aperture),
            shutter_speed_s: decode_nonzero(self.shutter_speed_s),
            iso: decode_non_negative(self.iso),
            exposure_bias: decode_nan(self.exposure_bias),
            resolution,
            presets: decode_list(&self.presets),
            filters: decode_list(&self.filters),
            heading: decode_nan(self.heading),
            original_filename: decode_text(&self.original_filename),
            created_at: decode_required_time(&self.created_at),
        }
    }

    fn encode(value: &Media) -> Self {
        let mut record = Self {
            id: value.id.to_string(),
            ..Default::default()
        };
        record.encode_into(value);
        record
    }

    fn encode_into(&mut self, value: &Media) {
        self.spot_id = encode_uuid(value.spot_id);
        self.user_id = value.user_id.clone();
        self.media_type = value.media_type.to_string();
        self.url = value.url.clone();
        self.thumbnail_url = encode_text(value.thumbnail_url.as_deref());
        self.capture_time = encode_time(value.capture_time);
        self.encode_exif(value.exif.as_ref());
        self.device_make = encode_text(value.device_make.as_deref());
        self.device_model = encode_text(value.device_model.as_deref());
        self.lens_model = encode_text(value.lens_model.as_deref());
        self.focal_length_mm = encode_nonzero(value.focal_length_mm);
        self.aperture = encode_nonzero(value.aperture);
        self.shutter_speed_s = encode_nonzero(value.shutter_speed_s);
        self.iso = encode_non_negative(value.iso);
        self.exposure_bias = encode_nan(value.exposure_bias);
        self.resolution_width = encode_non_negative(value.resolution.map(|r| r.width));
        self.resolution_height = encode_non_negative(value.resolution.map(|r| r.height));
        self.presets = encode_list(&value.presets);
        self.filters = encode_list(&value.filters);
        self.heading = encode_nan(value.heading);
        self.original_filename = encode_text(value.original_filename.as_deref());
        self.created_at = encode_required_time(value.created_at);
    }
}

impl SentinelCodec for SunSnapshotRecord {
    type Domain = SunSnapshot;

    fn decode(&self) -> SunSnapshot {
        SunSnapshot {
            id: decode_required_uuid(&self.id),
            spot_id: decode_required_uuid(&self.spot_id),
            date: decode_required_time(&self.date),
            sunrise: decode_time(&self.sunrise),
            sunset: decode_time(&self.sunset),
            golden_hour_start: decode_time(&self.golden_hour_start),
            golden_hour_end: decode_time(&self.golden_hour_end),
            blue_hour_start: decode_time(&self.blue_hour_start),
            blue_hour_end: decode_time(&self.blue_hour_end),
            sun_azimuth_deg: decode_nan(self.sun_azimuth_deg),
            sun_altitude_deg: decode_nan(self.sun_altitude_deg),
            minutes_to_golden_hour: decode_signed(self.minutes_to_golden_hour),
            moon_phase: decode_nan(self.moon_phase),
            moon_illumination_pct: decode_non_negative(self.moon_illumination_pct),
        }
    }

    fn encode(value: &SunSnapshot) -> Self {
        let mut record = Self {
            id: value.id.to_string(),
            ..Default::default()
        };
        record.encode_into(value);
        record
    }

    fn encode_into(&mut self, value: &SunSnapshot) {
        self.spot_id = value.spot_id.to_string();
        self.date = encode_required_time(value.date);
        self.sunrise = encode_time(value.sunrise);
        self.sunset = encode_time(value.sunset);
        self.golden_hour_start = encode_time(value.golden_hour_start);
        self.golden_hour_end = encode_time(value.golden_hour_end);
        self.blue_hour_start = encode_time(value.blue_hour_start);
        self.blue_hour_end = encode_time(value.blue_hour_end);
        self.sun_azimuth_deg = encode_nan(value.sun_azimuth_deg);
        self.sun_altitude_deg = encode_nan(value.sun_altitude_deg);
        self.minutes_to_golden_hour = encode_signed(value.minutes_to_golden_hour);
        self.moon_phase = encode_nan(value.moon_phase);
        self.moon_illumination_pct = encode_non_negative(value.moon_illumination_pct);
    }
}

impl SentinelCodec for WeatherSnapshotRecord {
    type Domain = WeatherSnapshot;

    fn decode(&self) -> WeatherSnapshot {
        WeatherSnapshot {
            id: decode_required_uuid(&self.id),
            spot_id: decode_required_uuid(&self.spot_id),
            date: decode_required_time(&self.date),
            temperature_c: decode_nan(self.temperature_c),
            feels_like_c: decode_nan(self.feels_like_c),
            humidity_pct: decode_non_negative(self.humidity_pct),
            cloud_cover_pct: decode_non_negative(self.cloud_cover_pct),
            wind_speed_ms: decode_nan(self.wind_speed_ms),
            wind_direction_deg: decode_non_negative(self.wind_direction_deg),
            visibility_m: decode_non_negative(self.visibility_m),
            precipitation_mm: decode_nan(self.precipitation_mm),
            uv_index: decode_nan(self.uv_index),
            condition: decode_enum(&self.condition),
        }
    }

    fn encode(value: &WeatherSnapshot) -> Self {
        let mut record = Self {
            id: value.id.to_string(),
            ..Default::default()
        };
        record.encode_into(value);
        record
    }

    fn encode_into(&mut self, value: &WeatherSnapshot) {
        self.spot_id = value.spot_id.to_string();
        self.date = encode_required_time(value.date);
        self.temperature_c = encode_nan(value.temperature_c);
        self.feels_like_c = encode_nan(value.feels_like_c);
        self.humidity_pct = encode_non_negative(value.humidity_pct);
        self.cloud_cover_pct = encode_non_negative(value.cloud_cover_pct);
        self.wind_speed_ms = encode_nan(value.wind_speed_ms);
        self.wind_direction_deg = encode_non_negative(value.wind_direction_deg);
        self.visibility_m = encode_non_negative(value.visibility_m);
        self.precipitation_mm = encode_nan(value.precipitation_mm);
        self.uv_index = encode_nan(value.uv_index);
        self.condition = encode_enum(value.condition);
    }
}

impl SentinelCodec for AccessInfoRecord {
    type Domain = AccessInfo;

    fn decode(&self) -> AccessInfo {
        AccessInfo {
            id: decode_required_uuid(&self.id),
            spot_id: decode_required_uuid(&self.spot_id),
            parking: self
                .has_parking
                .then(|| GeoPoint::new(self.parking_latitude, self.parking_longitude)),
            parking_notes: decode_text(&self.parking_notes),
            route_distance_m: decode_nan(self.route_distance_m),
            elevation_gain_m: decode_nan(self.elevation_gain_m),
            hike_minutes: decode_non_negative(self.hike_minutes),
            route_description: decode_text(&self.route_description),
            hazards: decode_list(&self.hazards),
            fee: decode_text(&self.fee),
            requires_permit: self.requires_permit,
            best_season: decode_text(&self.best_season),
        }
    }

    fn encode(value: &AccessInfo) -> Self {
        let mut record = Self {
            id: value.id.to_string(),
            ..Default::default()
        };
        record.encode_into(value);
        record
    }

    fn encode_into(&mut self, value: &AccessInfo) {
        self.spot_id = value.spot_id.to_string();
        self.has_parking = value.parking.is_some();
        self.parking_latitude = value.parking.map_or(0.0, |p| p.latitude);
        self.parking_longitude = value.parking.map_or(0.0, |p| p.longitude);
        self.parking_notes = encode_text(value.parking_notes.as_deref());
        self.route_distance_m = encode_nan(value.route_distance_m);
        self.elevation_gain_m = encode_nan(value.elevation_gain_m);
        self.hike_minutes = encode_non_negative(value.hike_minutes);
        self.route_description = encode_text(value.route_description.as_deref());
        self.hazards = encode_list(&value.hazards);
        self.fee = encode_text(value.fee.as_deref());
        self.requires_permit = value.requires_permit;
        self.best_season = encode_text(value.best_season.as_deref());
    }
}

impl SentinelCodec for CommentRecord {
    type Domain = Comment;

    fn decode(&self) -> Comment {
        Comment {
            id: decode_required_uuid(&self.id),
            spot_id: decode_required_uuid(&self.spot_id),
            user_id: self.user_id.clone(),
            body: self.body.clone(),
            parent_id: decode_uuid(&self.parent_id),
            created_at: decode_required_time(&self.created_at),
        }
    }

    fn encode(value: &Comment) -> Self {
        let mut record = Self {
            id: value.id.to_string(),
            ..Default::default()
        };
        record.encode_into(value);
        record
    }

    fn encode_into(&mut self, value: &Comment) {
        self.spot_id = value.spot_id.to_string();
        self.user_id = value.user_id.clone();
        self.body = value.body.clone();
        self.parent_id = encode_uuid(value.parent_id);
        self.created_at = encode_required_time(value.created_at);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use spotlens_types::{Difficulty, MediaType, Privacy, SpotStatus, WeatherCondition};
    use time::macros::datetime;
    use time::Duration;
    use uuid::Uuid;

    fn full_media() -> Media {
        let mut media = Media::new_photo("user-1", "https://cdn.example.com/p/abc_1.jpg");
        media.spot_id = Some(Uuid::new_v4());
        media.thumbnail_url = Some("https://cdn.example.com/t/abc_1.jpg".into());
        media.capture_time = Some(datetime!(2024-06-21 05:12:00 UTC));
        media.exif = Some(ExifBlock {
            gps: Some(GpsFix {
                point: GeoPoint::new(0.0, 0.0),
                altitude_m: Some(0.0),
            }),
            orientation: Some(6),
            software: Some("Darkroom 6".into()),
            flash_fired: Some(false),
            date_time_original: Some(datetime!(2024-06-21 05:11:58 UTC)),
        });
        media.device_make = Some("Fujifilm".into());
        media.device_model = Some("X-T5".into());
        media.lens_model = Some("XF 16-55mm".into());
        media.focal_length_mm = Some(23.0);
        media.aperture = Some(8.0);
        media.shutter_speed_s = Some(1.0 / 250.0);
        media.iso = Some(0);
        media.exposure_bias = Some(0.0);
        media.resolution = Some(Resolution {
            width: 7728,
            height: 5152,
        });
        media.presets = vec!["Classic Chrome".into()];
        media.filters = vec!["ND8".into(), "CPL".into()];
        media.heading = Some(0.0);
        media.original_filename = Some("DSCF0001.RAF".into());
        media
    }

    #[test]
    fn test_spot_roundtrip() {
        let now = datetime!(2024-03-01 12:00:00 UTC);
        let mut spot = Spot::new_local("Mesa Arch", GeoPoint::new(38.39, -109.87), "user-1");
        spot.description = Some("Sunrise through the arch".into());
        spot.heading = Some(0.0);
        spot.elevation_m = Some(-12.0);
        spot.tags = vec!["sunrise".into(), "arch".into()];
        spot.difficulty = Difficulty::Easy;
        spot.privacy = Privacy::FriendsOnly;
        spot.license = "CC-BY-4.0".into();
        spot.status = SpotStatus::Active;
        spot.vote_count = 17;
        spot.sync = SyncState::pulled("srv-1", now, Duration::hours(6));

        let decoded = SpotRecord::encode(&spot).decode();
        assert_eq!(decoded, spot);
    }

    #[test]
    fn test_media_roundtrip_keeps_zero_values() {
        let media = full_media();
        let decoded = MediaRecord::encode(&media).decode();
        assert_eq!(decoded, media);

        let gps = decoded.exif.unwrap().gps.unwrap();
        assert_eq!(gps.point, GeoPoint::new(0.0, 0.0));
        assert_eq!(gps.altitude_m, Some(0.0));
        assert_eq!(decoded.iso, Some(0));
        assert_eq!(decoded.exposure_bias, Some(0.0));
        assert_eq!(decoded.heading, Some(0.0));
    }

    #[test]
    fn test_empty_media_roundtrip() {
        let media = Media::new_photo("user-1", "local_abc");
        let record = MediaRecord::encode(&media);
        assert_eq!(record.spot_id, "");
        assert!(!record.has_exif);
        assert_eq!(record.iso, ABSENT_INT);
        assert!(record.exposure_bias.is_nan());
        assert_eq!(record.focal_length_mm, ABSENT_NONZERO);
        assert_eq!(record.decode(), media);
    }

    #[test]
    fn test_exif_without_gps() {
        let mut media = Media::new_photo("u", "local_1");
        media.exif = Some(ExifBlock {
            orientation: Some(1),
            ..Default::default()
        });
        let record = MediaRecord::encode(&media);
        assert!(record.has_exif);
        assert!(!record.exif_has_gps);
        assert_eq!(record.decode().exif, media.exif);
    }

    #[test]
    fn test_zero_sentinel_fields_lose_zero() {
        let mut media = Media::new_photo("u", "local_1");
        media.aperture = Some(0.0);
        assert_eq!(MediaRecord::encode(&media).decode().aperture, None);
    }

    #[test]
    fn test_encode_into_preserves_id() {
        let media = full_media();
        let mut record = MediaRecord::encode(&media);
        let original_id = record.id.clone();

        let mut other = Media::new_photo("user-2", "photo_xyz");
        other.media_type = MediaType::Video;
        record.encode_into(&other);

        assert_eq!(record.id, original_id);
        let decoded = record.decode();
        assert_eq!(decoded.id, media.id);
        assert_eq!(decoded.user_id, "user-2");
        assert_eq!(decoded.media_type, MediaType::Video);
        assert!(decoded.exif.is_none());
    }

    #[test]
    fn test_corrupt_record_decodes_leniently() {
        let record = SpotRecord {
            id: Uuid::new_v4().to_string(),
            tags: "[not json".into(),
            difficulty: "vertical".into(),
            privacy: "".into(),
            created_at: "yesterday".into(),
            updated_at: "".into(),
            last_synced: "soon".into(),
            heading: f64::NAN,
            elevation_m: f64::NAN,
            ..Default::default()
        };
        let spot = record.decode();
        assert!(spot.tags.is_empty());
        assert_eq!(spot.difficulty, Difficulty::Moderate);
        assert_eq!(spot.privacy, Privacy::Public);
        assert_eq!(spot.created_at, time::OffsetDateTime::UNIX_EPOCH);
        assert_eq!(spot.sync.last_synced, None);
        assert_eq!(spot.heading, None);
    }

    #[test]
    fn test_sun_snapshot_negative_minutes() {
        let mut sun = SunSnapshot::new(Uuid::new_v4(), datetime!(2024-06-21 00:00 UTC));
        sun.minutes_to_golden_hour = Some(-1);
        sun.sun_altitude_deg = Some(-4.5);
        sun.moon_illumination_pct = Some(0);
        sun.sunrise = Some(datetime!(2024-06-21 05:30 UTC));
        assert_eq!(SunSnapshotRecord::encode(&sun).decode(), sun);

        let empty = SunSnapshot::new(Uuid::new_v4(), datetime!(2024-06-21 00:00 UTC));
        let record = SunSnapshotRecord::encode(&empty);
        assert_eq!(record.minutes_to_golden_hour, ABSENT_SIGNED_INT);
        assert_eq!(record.decode(), empty);
    }

    #[test]
    fn test_weather_snapshot_roundtrip() {
        let mut weather = WeatherSnapshot::new(Uuid::new_v4(), datetime!(2024-01-05 08:00 UTC));
        weather.temperature_c = Some(-3.5);
        weather.feels_like_c = Some(0.0);
        weather.humidity_pct = Some(100);
        weather.wind_direction_deg = Some(0);
        weather.visibility_m = Some(12_000);
        weather.condition = Some(WeatherCondition::Fog);
        assert_eq!(WeatherSnapshotRecord::encode(&weather).decode(), weather);

        let mut record = WeatherSnapshotRecord::encode(&weather);
        record.condition = "volcanic ash".into();
        assert_eq!(record.decode().condition, None);
    }

    #[test]
    fn test_access_info_parking_at_origin() {
        let mut access = AccessInfo::new(Uuid::new_v4());
        access.parking = Some(GeoPoint::new(0.0, 0.0));
        access.hike_minutes = Some(0);
        access.hazards = vec!["loose rock".into()];
        access.requires_permit = true;
        assert_eq!(AccessInfoRecord::encode(&access).decode(), access);

        let bare = AccessInfo::new(Uuid::new_v4());
        assert_eq!(AccessInfoRecord::encode(&bare).decode().parking, None);
    }

    #[test]
    fn test_comment_roundtrip() {
        let mut comment = Comment::new(Uuid::new_v4(), "user-9", "Go early");
        assert_eq!(CommentRecord::encode(&comment).decode(), comment);
        comment.parent_id = Some(Uuid::new_v4());
        assert_eq!(CommentRecord::encode(&comment).decode(), comment);
    }

    #[test]
    fn test_encode_capture_merges() {
        let mut media = Media::new_photo("u", "local_1");
        media.device_make = Some("Sony".into());
        media.iso = Some(100);
        let mut record = MediaRecord::encode(&media);

        let metadata = CaptureMetadata {
            device_model: Some("A7R V".into()),
            iso: Some(3200),
            exposure_bias: Some(-0.7),
            ..Default::default()
        };
        record.encode_capture(&metadata);

        let decoded = record.decode();
        assert_eq!(decoded.id, media.id);
        assert_eq!(decoded.device_make.as_deref(), Some("Sony"));
        assert_eq!(decoded.device_model.as_deref(), Some("A7R V"));
        assert_eq!(decoded.iso, Some(3200));
        assert_eq!(decoded.exposure_bias, Some(-0.7));
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;
    use spotlens_types::{Difficulty, Privacy, SpotStatus, WeatherCondition};
    use uuid::Uuid;

    fn finite() -> impl Strategy<Value = f64> {
        -1.0e6..1.0e6f64
    }

    fn positive() -> impl Strategy<Value = f64> {
        0.001..1.0e4f64
    }

    fn text() -> impl Strategy<Value = Option<String>> {
        proptest::option::of("[a-zA-Z0-9 ]{1,16}")
    }

    prop_compose! {
        fn arb_media()(
            heading in proptest::option::of(finite()),
            bias in proptest::option::of(finite()),
            aperture in proptest::option::of(positive()),
            iso in proptest::option::of(0u32..=i32::MAX as u32),
            resolution in proptest::option::of((0u32..20_000, 0u32..20_000)),
            make in text(),
            presets in proptest::collection::vec("[a-z ]{0,8}", 0..4),
            gps in proptest::option::of((-90.0..90.0f64, -180.0..180.0f64, proptest::option::of(finite()))),
            exif in proptest::option::of(proptest::option::of(any::<bool>())),
        ) -> Media {
            let mut media = Media::new_photo("user", "local_abc");
            media.heading = heading;
            media.exposure_bias = bias;
            media.aperture = aperture;
            media.iso = iso;
            media.resolution = resolution.map(|(width, height)| Resolution { width, height });
            media.device_make = make;
            media.presets = presets;
            media.exif = exif.map(|flash_fired| ExifBlock {
                gps: gps.map(|(lat, lon, altitude_m)| GpsFix {
                    point: GeoPoint::new(lat, lon),
                    altitude_m,
                }),
                flash_fired,
                ..Default::default()
            });
            media
        }
    }

    fn timestamp() -> impl Strategy<Value = time::OffsetDateTime> {
        (0i64..4_102_444_800).prop_map(|secs| {
            time::OffsetDateTime::from_unix_timestamp(secs).unwrap()
        })
    }

    fn tags() -> impl Strategy<Value = Vec<String>> {
        proptest::collection::vec("[a-z\", \\[\\]]{0,10}", 0..4)
    }

    prop_compose! {
        fn arb_sync()(
            is_local_only in any::<bool>(),
            is_published in any::<bool>(),
            last_synced in proptest::option::of(timestamp()),
            cache_expiry in proptest::option::of(timestamp()),
            server_id in text(),
        ) -> SyncState {
            SyncState { is_local_only, is_published, last_synced, cache_expiry, server_id }
        }
    }

    prop_compose! {
        fn arb_spot()(
            title in ".{0,24}",
            description in text(),
            lat in -90.0..90.0f64,
            lon in -180.0..180.0f64,
            heading in proptest::option::of(finite()),
            elevation_m in proptest::option::of(finite()),
            tags in tags(),
            difficulty in proptest::sample::select(Difficulty::ALL),
            privacy in proptest::sample::select(Privacy::ALL),
            status in proptest::sample::select(SpotStatus::ALL),
            license in "[A-Z0-9-]{0,12}",
            created_at in timestamp(),
            updated_at in timestamp(),
            vote_count in any::<u32>(),
            sync in arb_sync(),
        ) -> Spot {
            let mut spot = Spot::new_local(title, GeoPoint::new(lat, lon), "creator");
            spot.description = description;
            spot.heading = heading;
            spot.elevation_m = elevation_m;
            spot.tags = tags;
            spot.difficulty = difficulty;
            spot.privacy = privacy;
            spot.status = status;
            spot.license = license;
            spot.created_at = created_at;
            spot.updated_at = updated_at;
            spot.vote_count = vote_count;
            spot.sync = sync;
            spot
        }
    }

    prop_compose! {
        fn arb_weather()(
            date in timestamp(),
            temperature_c in proptest::option::of(finite()),
            feels_like_c in proptest::option::of(finite()),
            humidity_pct in proptest::option::of(any::<u8>()),
            cloud_cover_pct in proptest::option::of(any::<u8>()),
            wind_speed_ms in proptest::option::of(finite()),
            wind_direction_deg in proptest::option::of(any::<u16>()),
            visibility_m in proptest::option::of(0u32..=i32::MAX as u32),
            precipitation_mm in proptest::option::of(finite()),
            uv_index in proptest::option::of(finite()),
            condition in proptest::option::of(proptest::sample::select(WeatherCondition::ALL)),
        ) -> WeatherSnapshot {
            WeatherSnapshot {
                temperature_c,
                feels_like_c,
                humidity_pct,
                cloud_cover_pct,
                wind_speed_ms,
                wind_direction_deg,
                visibility_m,
                precipitation_mm,
                uv_index,
                condition,
                ..WeatherSnapshot::new(Uuid::new_v4(), date)
            }
        }
    }

    prop_compose! {
        fn arb_access()(
            parking in proptest::option::of((-90.0..90.0f64, -180.0..180.0f64)),
            parking_notes in text(),
            route_distance_m in proptest::option::of(finite()),
            elevation_gain_m in proptest::option::of(finite()),
            hike_minutes in proptest::option::of(0u32..=i32::MAX as u32),
            route_description in text(),
            hazards in tags(),
            fee in text(),
            requires_permit in any::<bool>(),
            best_season in text(),
        ) -> AccessInfo {
            AccessInfo {
                parking: parking.map(|(lat, lon)| GeoPoint::new(lat, lon)),
                parking_notes,
                route_distance_m,
                elevation_gain_m,
                hike_minutes,
                route_description,
                hazards,
                fee,
                requires_permit,
                best_season,
                ..AccessInfo::new(Uuid::new_v4())
            }
        }
    }

    prop_compose! {
        fn arb_comment()(
            user_id in "[a-z0-9-]{0,12}",
            body in ".{0,64}",
            reply in any::<bool>(),
            created_at in timestamp(),
        ) -> Comment {
            let mut comment = Comment::new(Uuid::new_v4(), user_id, body);
            comment.parent_id = reply.then(Uuid::new_v4);
            comment.created_at = created_at;
            comment
        }
    }

    proptest! {
        #[test]
        fn spot_decode_inverts_encode(spot in arb_spot()) {
            prop_assert_eq!(SpotRecord::encode(&spot).decode(), spot);
        }

        #[test]
        fn weather_decode_inverts_encode(weather in arb_weather()) {
            prop_assert_eq!(WeatherSnapshotRecord::encode(&weather).decode(), weather);
        }

        #[test]
        fn access_decode_inverts_encode(access in arb_access()) {
            prop_assert_eq!(AccessInfoRecord::encode(&access).decode(), access);
        }

        #[test]
        fn comment_decode_inverts_encode(comment in arb_comment()) {
            prop_assert_eq!(CommentRecord::encode(&comment).decode(), comment);
        }

        #[test]
        fn media_decode_inverts_encode(media in arb_media()) {
            prop_assert_eq!(MediaRecord::encode(&media).decode(), media);
        }

        #[test]
        fn signed_minutes_roundtrip(minutes in proptest::option::of(i32::MIN..i32::MAX)) {
            let mut sun = SunSnapshot::new(Uuid::new_v4(), time::OffsetDateTime::UNIX_EPOCH);
            sun.minutes_to_golden_hour = minutes;
            prop_assert_eq!(SunSnapshotRecord::encode(&sun).decode().minutes_to_golden_hour, minutes);
        }

        #[test]
        fn decode_never_panics(
            spot_id in ".{0,40}",
            media_type in ".{0,12}",
            presets in ".{0,40}",
            iso in any::<i32>(),
            width in any::<i32>(),
            aperture in any::<f64>(),
            flash in any::<i32>(),
            capture_time in ".{0,30}",
        ) {
            let record = MediaRecord {
                spot_id,
                media_type,
                presets,
                iso,
                resolution_width: width,
                resolution_height: width,
                aperture,
                exif_flash_fired: flash,
                capture_time,
                has_exif: true,
                ..Default::default()
            };
            let media = record.decode();
            prop_assert!(media.iso.is_none_or(|v| v <= i32::MAX as u32));
            prop_assert!(media.aperture.is_none_or(|v| v != 0.0));
        }
    }
}

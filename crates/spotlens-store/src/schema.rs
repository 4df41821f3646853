//! Database schema and version tracking.

use rusqlite::Connection;

use crate::error::{Error, Result};

/// Current schema version.
pub const SCHEMA_VERSION: i32 = 1;

/// Initialize the database schema.
pub fn initialize(conn: &Connection) -> Result<()> {
    let version = get_schema_version(conn)?;

    if version > SCHEMA_VERSION {
        return Err(Error::UnsupportedSchema {
            found: version,
            supported: SCHEMA_VERSION,
        });
    }
    if version == 0 {
        create_schema_v1(conn)?;
        set_schema_version(conn, SCHEMA_VERSION)?;
    }

    Ok(())
}

/// Get the current schema version.
fn get_schema_version(conn: &Connection) -> Result<i32> {
    let exists: bool = conn.query_row(
        "SELECT COUNT(*) > 0 FROM sqlite_master WHERE type='table' AND name='schema_version'",
        [],
        |row| row.get(0),
    )?;

    if !exists {
        return Ok(0);
    }

    let version: i32 =
        conn.query_row("SELECT version FROM schema_version", [], |row| row.get(0))?;

    Ok(version)
}

/// Set the schema version.
fn set_schema_version(conn: &Connection, version: i32) -> Result<()> {
    conn.execute(
        "INSERT OR REPLACE INTO schema_version (id, version) VALUES (1, ?)",
        [version],
    )?;
    Ok(())
}

/// Create the initial schema (version 1).
///
/// REAL columns are nullable because SQLite stores NaN as NULL.
/// `media.spot_id` carries no foreign key: orphaned media keep an empty
/// owner, which a foreign key would reject.
fn create_schema_v1(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS schema_version (
            id INTEGER PRIMARY KEY CHECK (id = 1),
            version INTEGER NOT NULL
        );

        CREATE TABLE IF NOT EXISTS spots (
            id TEXT PRIMARY KEY,
            title TEXT NOT NULL,
            description TEXT NOT NULL DEFAULT '',
            latitude REAL,
            longitude REAL,
            heading REAL,
            elevation_m REAL,
            tags TEXT NOT NULL DEFAULT '',
            difficulty TEXT NOT NULL,
            creator_id TEXT NOT NULL,
            privacy TEXT NOT NULL,
            license TEXT NOT NULL DEFAULT '',
            status TEXT NOT NULL,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL,
            vote_count INTEGER NOT NULL DEFAULT 0,
            is_local_only INTEGER NOT NULL,
            is_published INTEGER NOT NULL,
            last_synced TEXT NOT NULL DEFAULT '',
            cache_expiry TEXT NOT NULL DEFAULT '',
            server_id TEXT NOT NULL DEFAULT ''
        );
        CREATE UNIQUE INDEX IF NOT EXISTS idx_spots_server_id
            ON spots(server_id) WHERE server_id <> '';
        CREATE INDEX IF NOT EXISTS idx_spots_created ON spots(created_at);

        CREATE TABLE IF NOT EXISTS media (
            id TEXT PRIMARY KEY,
            spot_id TEXT NOT NULL DEFAULT '',
            user_id TEXT NOT NULL,
            media_type TEXT NOT NULL,
            url TEXT NOT NULL,
            thumbnail_url TEXT NOT NULL DEFAULT '',
            capture_time TEXT NOT NULL DEFAULT '',
            has_exif INTEGER NOT NULL DEFAULT 0,
            exif_has_gps INTEGER NOT NULL DEFAULT 0,
            exif_latitude REAL,
            exif_longitude REAL,
            exif_altitude_m REAL,
            exif_orientation INTEGER NOT NULL DEFAULT -1,
            exif_software TEXT NOT NULL DEFAULT '',
            exif_flash_fired INTEGER NOT NULL DEFAULT -1,
            exif_date_time_original TEXT NOT NULL DEFAULT '',
            device_make TEXT NOT NULL DEFAULT '',
            device_model TEXT NOT NULL DEFAULT '',
            lens_model TEXT NOT NULL DEFAULT '',
            focal_length_mm REAL,
            aperture REAL,
            shutter_speed_s REAL,
            iso INTEGER NOT NULL DEFAULT -1,
            exposure_bias REAL,
            resolution_width INTEGER NOT NULL DEFAULT -1,
            resolution_height INTEGER NOT NULL DEFAULT -1,
            presets TEXT NOT NULL DEFAULT '',
            filters TEXT NOT NULL DEFAULT '',
            heading REAL,
            original_filename TEXT NOT NULL DEFAULT '',
            created_at TEXT NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_media_spot ON media(spot_id, created_at);

        CREATE TABLE IF NOT EXISTS sun_snapshots (
            id TEXT PRIMARY KEY,
            spot_id TEXT NOT NULL UNIQUE REFERENCES spots(id) ON DELETE CASCADE,
            date TEXT NOT NULL,
            sunrise TEXT NOT NULL DEFAULT '',
            sunset TEXT NOT NULL DEFAULT '',
            golden_hour_start TEXT NOT NULL DEFAULT '',
            golden_hour_end TEXT NOT NULL DEFAULT '',
            blue_hour_start TEXT NOT NULL DEFAULT '',
            blue_hour_end TEXT NOT NULL DEFAULT '',
            sun_azimuth_deg REAL,
            sun_altitude_deg REAL,
            minutes_to_golden_hour INTEGER NOT NULL DEFAULT 2147483647,
            moon_phase REAL,
            moon_illumination_pct INTEGER NOT NULL DEFAULT -1
        );

        CREATE TABLE IF NOT EXISTS weather_snapshots (
            id TEXT PRIMARY KEY,
            spot_id TEXT NOT NULL UNIQUE REFERENCES spots(id) ON DELETE CASCADE,
            date TEXT NOT NULL,
            temperature_c REAL,
            feels_like_c REAL,
            humidity_pct INTEGER NOT NULL DEFAULT -1,
            cloud_cover_pct INTEGER NOT NULL DEFAULT -1,
            wind_speed_ms REAL,
            wind_direction_deg INTEGER NOT NULL DEFAULT -1,
            visibility_m INTEGER NOT NULL DEFAULT -1,
            precipitation_mm REAL,
            uv_index REAL,
            condition TEXT NOT NULL DEFAULT ''
        );

        CREATE TABLE IF NOT EXISTS access_info (
            id TEXT PRIMARY KEY,
            spot_id TEXT NOT NULL UNIQUE REFERENCES spots(id) ON DELETE CASCADE,
            has_parking INTEGER NOT NULL DEFAULT 0,
            parking_latitude REAL,
            parking_longitude REAL,
            parking_notes TEXT NOT NULL DEFAULT '',
            route_distance_m REAL,
            elevation_gain_m REAL,
            hike_minutes INTEGER NOT NULL DEFAULT -1,
            route_description TEXT NOT NULL DEFAULT '',
            hazards TEXT NOT NULL DEFAULT '',
            fee TEXT NOT NULL DEFAULT '',
            requires_permit INTEGER NOT NULL DEFAULT 0,
            best_season TEXT NOT NULL DEFAULT ''
        );

        CREATE TABLE IF NOT EXISTS comments (
            id TEXT PRIMARY KEY,
            spot_id TEXT NOT NULL REFERENCES spots(id) ON DELETE CASCADE,
            user_id TEXT NOT NULL,
            body TEXT NOT NULL,
            parent_id TEXT NOT NULL DEFAULT '',
            created_at TEXT NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_comments_spot ON comments(spot_id, created_at);
        "#,
    )?;

    Ok(())
}

//! Sentinel encodings for optional values in persisted records.
//!
//! Records are flat: every column holds a value, and absence is spelled with
//! a reserved sentinel per storage type.
//!
//! | storage | sentinel | used for |
//! |---------|----------|----------|
//! | `i32` | `-1` | counts and other non-negative values |
//! | `i32` | `i32::MAX` | signed values where `-1` is legitimate |
//! | `f64` | `NaN` | readings that may be zero or negative |
//! | `f64` | `0.0` | camera parameters that are never exactly zero |
//! | `String` | empty | text, timestamps, ids, enums, string lists |
//!
//! Decoding is total: anything unrecognized decodes to absent (or to an empty
//! list), never to an error. Encoding is lossy only at the sentinel itself:
//! `Some(NaN)`, `Some(0.0)` for a zero-sentinel field, and `Some("")` all
//! decode as absent, and values outside `i32` saturate.

use time::format_description::well_known::Rfc3339;
use time::{OffsetDateTime, UtcOffset};
use tracing::{debug, warn};
use uuid::Uuid;

/// Sentinel for an absent non-negative integer.
pub const ABSENT_INT: i32 = -1;

/// Sentinel for an absent signed integer.
pub const ABSENT_SIGNED_INT: i32 = i32::MAX;

/// Sentinel for an absent strictly-positive float.
pub const ABSENT_NONZERO: f64 = 0.0;

pub fn encode_non_negative<T: Into<i64>>(value: Option<T>) -> i32 {
    match value {
        None => ABSENT_INT,
        Some(v) => i32::try_from(v.into()).unwrap_or(i32::MAX),
    }
}

pub fn decode_non_negative<T: TryFrom<i32>>(raw: i32) -> Option<T> {
    if raw < 0 {
        return None;
    }
    T::try_from(raw).ok()
}

pub fn encode_signed(value: Option<i32>) -> i32 {
    match value {
        None => ABSENT_SIGNED_INT,
        Some(ABSENT_SIGNED_INT) => ABSENT_SIGNED_INT - 1,
        Some(v) => v,
    }
}

pub fn decode_signed(raw: i32) -> Option<i32> {
    (raw != ABSENT_SIGNED_INT).then_some(raw)
}

pub fn encode_nan(value: Option<f64>) -> f64 {
    value.unwrap_or(f64::NAN)
}

pub fn decode_nan(raw: f64) -> Option<f64> {
    (!raw.is_nan()).then_some(raw)
}

pub fn encode_nonzero(value: Option<f64>) -> f64 {
    value.unwrap_or(ABSENT_NONZERO)
}

pub fn decode_nonzero(raw: f64) -> Option<f64> {
    (raw != ABSENT_NONZERO && !raw.is_nan()).then_some(raw)
}

/// `None`, `Some(false)`, `Some(true)` as `-1`, `0`, `1`.
pub fn encode_flag(value: Option<bool>) -> i32 {
    match value {
        None => ABSENT_INT,
        Some(false) => 0,
        Some(true) => 1,
    }
}

pub fn decode_flag(raw: i32) -> Option<bool> {
    match raw {
        0 => Some(false),
        1 => Some(true),
        _ => None,
    }
}

pub fn encode_text(value: Option<&str>) -> String {
    value.unwrap_or_default().to_string()
}

pub fn decode_text(raw: &str) -> Option<String> {
    (!raw.is_empty()).then(|| raw.to_string())
}

pub fn encode_uuid(value: Option<Uuid>) -> String {
    value.map(|id| id.to_string()).unwrap_or_default()
}

pub fn decode_uuid(raw: &str) -> Option<Uuid> {
    if raw.is_empty() {
        return None;
    }
    Uuid::parse_str(raw).ok()
}

/// Decode a required id. Unparseable ids become the nil UUID.
pub fn decode_required_uuid(raw: &str) -> Uuid {
    decode_uuid(raw).unwrap_or_else(|| {
        warn!("Unparseable record id '{}', using nil id", raw);
        Uuid::nil()
    })
}

/// Timestamps are stored as RFC 3339 text in UTC.
pub fn encode_time(value: Option<OffsetDateTime>) -> String {
    let Some(value) = value else {
        return String::new();
    };
    match value.to_offset(UtcOffset::UTC).format(&Rfc3339) {
        Ok(text) => text,
        Err(e) => {
            warn!("Timestamp {} cannot be stored as RFC 3339: {}", value, e);
            String::new()
        }
    }
}

pub fn decode_time(raw: &str) -> Option<OffsetDateTime> {
    if raw.is_empty() {
        return None;
    }
    OffsetDateTime::parse(raw, &Rfc3339).ok()
}

pub fn encode_required_time(value: OffsetDateTime) -> String {
    encode_time(Some(value))
}

/// Decode a required timestamp. Unparseable text becomes the Unix epoch.
pub fn decode_required_time(raw: &str) -> OffsetDateTime {
    decode_time(raw).unwrap_or(OffsetDateTime::UNIX_EPOCH)
}

/// String lists are stored as a JSON array; an empty list as empty text.
pub fn encode_list(values: &[String]) -> String {
    if values.is_empty() {
        return String::new();
    }
    serde_json::to_string(values).unwrap_or_default()
}

pub fn decode_list(raw: &str) -> Vec<String> {
    if raw.is_empty() {
        return Vec::new();
    }
    match serde_json::from_str(raw) {
        Ok(values) => values,
        Err(e) => {
            debug!("Malformed string list {:?}: {}", raw, e);
            Vec::new()
        }
    }
}

pub fn encode_enum<E: ToString>(value: Option<E>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

pub fn decode_enum<E: std::str::FromStr>(raw: &str) -> Option<E> {
    raw.parse().ok()
}

/// Decode a required enum, falling back to its default for unknown text.
pub fn decode_enum_or_default<E: std::str::FromStr + Default>(raw: &str) -> E {
    decode_enum(raw).unwrap_or_default()
}

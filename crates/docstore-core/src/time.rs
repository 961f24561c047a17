//! Timestamp normalization.
//!
//! Backends store time in different native shapes: the relational adapter
//! keeps integer microseconds so `created_at > ?` compares numerically, the
//! document store keeps BSON datetimes (milliseconds). The HTTP boundary
//! accepts `list-since` dates in a fixed second-precision UTC layout.

use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};

use crate::error::{StoreError, StoreResult};

/// Layout of the `since` route: `2006-01-02T15:04:05Z`.
pub const SINCE_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";

/// [`SINCE_FORMAT`] with an optional fractional second before the `Z`.
const SINCE_PARSE_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.fZ";

/// Returns the current instant.
#[must_use]
pub fn now() -> DateTime<Utc> {
    Utc::now()
}

/// Parses a `since` date as sent on the HTTP boundary.
///
/// A fractional second (`2024-03-01T12:30:00.5Z`) is accepted and kept.
///
/// # Example
///
/// ```
/// use docstore_core::time::since_from_path;
///
/// let t = since_from_path("2024-03-01T12:30:00Z").unwrap();
/// assert_eq!(t.to_rfc3339(), "2024-03-01T12:30:00+00:00");
/// assert!(since_from_path("yesterday").is_err());
/// ```
pub fn since_from_path(raw: &str) -> StoreResult<DateTime<Utc>> {
    if raw.is_empty() {
        return Err(StoreError::invalid_argument("missing date"));
    }
    NaiveDateTime::parse_from_str(raw, SINCE_PARSE_FORMAT)
        .map(|naive| Utc.from_utc_datetime(&naive))
        .map_err(|_| StoreError::invalid_argument(format!("invalid date sent: {raw}")))
}

/// Formats an instant in the `since` layout, truncating to whole seconds.
#[must_use]
pub fn format_since(at: DateTime<Utc>) -> String {
    at.format(SINCE_FORMAT).to_string()
}

/// Encodes an instant as microseconds since the Unix epoch.
#[must_use]
pub fn to_epoch_micros(at: DateTime<Utc>) -> i64 {
    at.timestamp_micros()
}

/// Decodes microseconds since the Unix epoch.
pub fn from_epoch_micros(micros: i64) -> StoreResult<DateTime<Utc>> {
    Utc.timestamp_micros(micros)
        .single()
        .ok_or_else(|| StoreError::backend(format!("timestamp out of range: {micros}us")))
}

/// Encodes an instant as milliseconds since the Unix epoch.
#[must_use]
pub fn to_epoch_millis(at: DateTime<Utc>) -> i64 {
    at.timestamp_millis()
}

/// Decodes milliseconds since the Unix epoch.
pub fn from_epoch_millis(millis: i64) -> StoreResult<DateTime<Utc>> {
    Utc.timestamp_millis_opt(millis)
        .single()
        .ok_or_else(|| StoreError::backend(format!("timestamp out of range: {millis}ms")))
}

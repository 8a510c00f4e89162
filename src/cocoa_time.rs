//! Cocoa timestamps: seconds since 2001-01-01T00:00:00Z.

use chrono::{DateTime, Utc};
use rusqlite::types::Value;

use crate::error::ExtractError;
use crate::models::{describe_value, EventTimestamp};

/// 2001-01-01T00:00:00Z as a Unix timestamp.
pub const COCOA_EPOCH_UNIX_SECONDS: i64 = 978_307_200;

const MICROS_PER_SECOND: f64 = 1_000_000.0;
const COCOA_EPOCH_UNIX_MICROS: i64 = COCOA_EPOCH_UNIX_SECONDS * 1_000_000;

/// Converts Cocoa seconds to an instant, keeping microsecond precision.
/// Returns `None` for non-finite or unrepresentable values.
pub fn cocoa_to_datetime(seconds: f64) -> Option<DateTime<Utc>> {
    if !seconds.is_finite() {
        return None;
    }

    let micros = (seconds * MICROS_PER_SECOND).round();
    if micros < i64::MIN as f64 || micros >= i64::MAX as f64 {
        return None;
    }

    let unix_micros = (micros as i64).checked_add(COCOA_EPOCH_UNIX_MICROS)?;
    DateTime::from_timestamp_micros(unix_micros)
}

/// Inverse of [`cocoa_to_datetime`].
pub fn datetime_to_cocoa(instant: &DateTime<Utc>) -> f64 {
    (instant.timestamp_micros() - COCOA_EPOCH_UNIX_MICROS) as f64 / MICROS_PER_SECOND
}

/// Converts a timestamp column value.
///
/// `NULL` becomes [`EventTimestamp::NotSet`]. Integers and reals are taken as
/// Cocoa seconds; text is accepted when it parses as a number, since SQLite
/// `TIMESTAMP` columns store whatever was written to them.
pub fn timestamp_from_column(
    field: &'static str,
    value: &Value,
) -> Result<EventTimestamp, ExtractError> {
    let seconds = match value {
        Value::Null => return Ok(EventTimestamp::NotSet),
        Value::Integer(v) => *v as f64,
        Value::Real(v) => *v,
        Value::Text(text) => text.trim().parse::<f64>().map_err(|_| malformed(field, value))?,
        Value::Blob(_) => return Err(malformed(field, value)),
    };

    cocoa_to_datetime(seconds)
        .map(EventTimestamp::At)
        .ok_or_else(|| malformed(field, value))
}

fn malformed(field: &'static str, value: &Value) -> ExtractError {
    ExtractError::MalformedTimestamp {
        field,
        value: describe_value(value),
    }
}

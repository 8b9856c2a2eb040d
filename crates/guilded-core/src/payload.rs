//! Field accessors for untyped gateway payloads
//!
//! Gateway documents are loosely shaped: the same field may be present at the top
//! level or nested under `message`/`user`/`channel`, ids may be numbers or strings,
//! and timestamps are ISO-8601 strings with millisecond precision.

use chrono::{DateTime, Utc};
use serde_json::Value;

/// Read a string field, accepting numeric ids as strings
pub fn get_str(data: &Value, key: &str) -> Option<String> {
    match data.get(key)? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Read an integer field, accepting numeric strings
pub fn get_i64(data: &Value, key: &str) -> Option<i64> {
    value_as_i64(data.get(key)?)
}

/// Interpret a value as an integer, accepting numeric strings
pub fn value_as_i64(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.parse().ok(),
        _ => None,
    }
}

/// Read a boolean field, treating absence as `false`
pub fn get_bool(data: &Value, key: &str) -> bool {
    data.get(key).and_then(Value::as_bool).unwrap_or(false)
}

/// Read an ISO-8601 timestamp field
pub fn get_time(data: &Value, key: &str) -> Option<DateTime<Utc>> {
    data.get(key)
        .and_then(Value::as_str)
        .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
        .map(|dt| dt.with_timezone(&Utc))
}

/// Return `data[key]` when it is an object, otherwise `data` itself
pub fn unwrap_object<'a>(data: &'a Value, key: &str) -> &'a Value {
    match data.get(key) {
        Some(inner @ Value::Object(_)) => inner,
        _ => data,
    }
}

/// First present string among several keys
pub fn first_str(data: &Value, keys: &[&str]) -> Option<String> {
    keys.iter().find_map(|key| get_str(data, key))
}

//! Conversions between raw bytes and the structured-value wire form.
//!
//! Text round-trips as a JSON string; non-UTF-8 payloads round-trip as an
//! array of byte values, so agents always get back exactly what they
//! stored.

use serde_json::Value;

use agrama_core::errors::{AgramaResult, ValidationError};

/// Bytes → wire value. UTF-8 becomes a string, anything else an array of
/// numbers.
pub fn bytes_to_value(bytes: &[u8]) -> Value {
    match std::str::from_utf8(bytes) {
        Ok(s) => Value::String(s.to_string()),
        Err(_) => Value::Array(bytes.iter().map(|&b| Value::from(b)).collect()),
    }
}

/// Wire value → bytes. Accepts a string, an array of byte values, or any
/// other JSON value (stored as its serialized form).
pub fn value_to_bytes(value: &Value) -> AgramaResult<Vec<u8>> {
    match value {
        Value::String(s) => Ok(s.clone().into_bytes()),
        Value::Array(items) if items.iter().all(|v| v.is_u64()) => items
            .iter()
            .map(|v| {
                v.as_u64()
                    .filter(|&b| b <= u8::MAX as u64)
                    .map(|b| b as u8)
                    .ok_or_else(|| {
                        ValidationError::MalformedArgument {
                            name: "value".to_string(),
                            reason: "byte array entries must be 0..=255".to_string(),
                        }
                        .into()
                    })
            })
            .collect(),
        other => Ok(serde_json::to_string(other)
            .unwrap_or_default()
            .into_bytes()),
    }
}

/// Required string field from an argument object.
pub fn required_str<'a>(args: &'a Value, name: &str) -> AgramaResult<&'a str> {
    args.get(name)
        .and_then(Value::as_str)
        .ok_or_else(|| missing(name, "string"))
}

/// Optional string field.
pub fn optional_str<'a>(args: &'a Value, name: &str) -> Option<&'a str> {
    args.get(name).and_then(Value::as_str)
}

/// Optional boolean with a default.
pub fn optional_bool(args: &Value, name: &str, default: bool) -> bool {
    args.get(name).and_then(Value::as_bool).unwrap_or(default)
}

/// Optional unsigned integer with a default.
pub fn optional_usize(args: &Value, name: &str, default: usize) -> usize {
    args.get(name)
        .and_then(Value::as_u64)
        .map(|v| v as usize)
        .unwrap_or(default)
}

/// Optional float with a default.
pub fn optional_f64(args: &Value, name: &str, default: f64) -> f64 {
    args.get(name).and_then(Value::as_f64).unwrap_or(default)
}

fn missing(name: &str, expected: &str) -> agrama_core::AgramaError {
    ValidationError::MalformedArgument {
        name: name.to_string(),
        reason: format!("expected {expected}"),
    }
    .into()
}

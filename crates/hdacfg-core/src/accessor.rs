//! Typed reads from dictionaries with defaults
//!
//! Absent keys and values of the wrong type both fall back to the default;
//! neither is an error.

use crate::scalar::parse_integer;
use crate::value::{Dictionary, Value};

/// Read a boolean, falling back to `default` unless `key` holds a bool
pub fn get_bool(dict: &Dictionary, key: &str, default: bool) -> bool {
    dict.get(key).and_then(Value::as_bool).unwrap_or(default)
}

/// Read an unsigned 32-bit integer, accepting numbers and numeric strings
pub fn get_integer(dict: &Dictionary, key: &str, default: u32) -> u32 {
    integer_value(dict.get(key), default)
}

/// Integer view of a raw value: numbers as-is, strings via [`parse_integer`]
pub fn integer_value(value: Option<&Value>, default: u32) -> u32 {
    match value {
        Some(Value::Integer(n)) => *n as u32,
        Some(Value::String(s)) => parse_integer(s),
        _ => default,
    }
}

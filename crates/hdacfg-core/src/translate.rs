//! Translation of flat firmware packages into nested values
//!
//! Firmware can only return packages of strings, integers and buffers, so
//! structure is encoded by convention:
//! - A package whose first element is an empty package is an array; the
//!   marker is dropped and each remaining element is translated.
//! - Any other package is a flat list of key/value pairs and becomes a
//!   dictionary. Keys must be strings and the element count must be even.
//! - Strings `">y"` and `">n"` are booleans; `">>y"` and `">>n"` escape
//!   the literal strings `">y"` and `">n"`.

use thiserror::Error;

use crate::value::{Dictionary, Value};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TranslateError {
    #[error("empty package has no translation")]
    Empty,
    #[error("key/value package has odd length {0}")]
    OddLength(usize),
    #[error("key at index {index} is a {found}, expected string")]
    NonStringKey { index: usize, found: &'static str },
}

/// Translate a single value, or `None` when it is kept as-is
///
/// Arrays that fail to translate are kept as-is as well.
pub fn translate_entry(value: &Value) -> Option<Value> {
    match value {
        Value::Array(items) => translate_array(items).ok(),
        Value::String(s) => translate_string(s),
        _ => None,
    }
}

fn translate_string(s: &str) -> Option<Value> {
    match s {
        ">y" => Some(Value::Bool(true)),
        ">n" => Some(Value::Bool(false)),
        ">>y" | ">>n" => Some(Value::String(s[1..].to_string())),
        _ => None,
    }
}

/// Translate a package into an array or a dictionary
pub fn translate_array(items: &[Value]) -> Result<Value, TranslateError> {
    let (first, rest) = items.split_first().ok_or(TranslateError::Empty)?;

    if matches!(first, Value::Array(marker) if marker.is_empty()) {
        let translated = rest
            .iter()
            .map(|item| translate_entry(item).unwrap_or_else(|| item.clone()))
            .collect();
        return Ok(Value::Array(translated));
    }

    if items.len() % 2 != 0 {
        return Err(TranslateError::OddLength(items.len()));
    }

    let mut dict = Dictionary::new();
    for (pair_index, pair) in items.chunks_exact(2).enumerate() {
        let key = match &pair[0] {
            Value::String(key) => key.clone(),
            other => {
                return Err(TranslateError::NonStringKey {
                    index: pair_index * 2,
                    found: other.type_name(),
                })
            }
        };
        let value = translate_entry(&pair[1]).unwrap_or_else(|| pair[1].clone());
        dict.insert(key, value);
    }
    Ok(Value::Dict(dict))
}

//! Generic property values
//!
//! Profiles and firmware overrides arrive as an untyped tree of arrays,
//! dictionaries and scalars. `Value` is the tagged form of that tree; the
//! translator, the profile resolver and the configuration decoder all match
//! on it exhaustively instead of probing types at runtime.

use serde::Serialize;
use std::collections::BTreeMap;

/// String-keyed dictionary of values
pub type Dictionary = BTreeMap<String, Value>;

/// A single untyped property value
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Value {
    Bool(bool),
    /// Integers keep the width of their source; see [`Value::as_u32`]
    Integer(i64),
    String(String),
    /// Opaque byte buffer
    Data(Vec<u8>),
    Array(Vec<Value>),
    Dict(Dictionary),
}

impl Value {
    /// Short type name, used in log messages
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Bool(_) => "bool",
            Value::Integer(_) => "integer",
            Value::String(_) => "string",
            Value::Data(_) => "data",
            Value::Array(_) => "array",
            Value::Dict(_) => "dict",
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Unsigned 32-bit view of an integer (truncating, so -1 is 0xFFFFFFFF)
    pub fn as_u32(&self) -> Option<u32> {
        match self {
            Value::Integer(n) => Some(*n as u32),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_data(&self) -> Option<&[u8]> {
        match self {
            Value::Data(d) => Some(d),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[Value]> {
        match self {
            Value::Array(a) => Some(a),
            _ => None,
        }
    }

    pub fn as_dict(&self) -> Option<&Dictionary> {
        match self {
            Value::Dict(d) => Some(d),
            _ => None,
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Integer(n)
    }
}

impl From<u32> for Value {
    fn from(n: u32) -> Self {
        Value::Integer(n as i64)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<Vec<u8>> for Value {
    fn from(d: Vec<u8>) -> Self {
        Value::Data(d)
    }
}

impl From<Vec<Value>> for Value {
    fn from(a: Vec<Value>) -> Self {
        Value::Array(a)
    }
}

impl From<Dictionary> for Value {
    fn from(d: Dictionary) -> Self {
        Value::Dict(d)
    }
}

/// Shallow merge: every entry of `src` replaces the same key in `dst`
pub fn merge(dst: &mut Dictionary, src: &Dictionary) {
    for (key, value) in src {
        dst.insert(key.clone(), value.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_as_u32_truncates() {
        assert_eq!(Value::Integer(-1).as_u32(), Some(0xFFFF_FFFF));
        assert_eq!(Value::Integer(0x1_0000_0005).as_u32(), Some(5));
        assert_eq!(Value::from("5").as_u32(), None);
    }

    #[test]
    fn test_merge_is_shallow() {
        let mut inner = Dictionary::new();
        inner.insert("a".to_string(), Value::from(1u32));

        let mut dst = Dictionary::new();
        dst.insert("keep".to_string(), Value::Bool(true));
        dst.insert("nested".to_string(), Value::Dict(inner));

        let mut src = Dictionary::new();
        src.insert("nested".to_string(), Value::Dict(Dictionary::new()));
        src.insert("new".to_string(), Value::from("x"));

        merge(&mut dst, &src);

        assert_eq!(dst.len(), 3);
        assert_eq!(dst["keep"], Value::Bool(true));
        // Nested dictionaries are replaced, not merged
        assert_eq!(dst["nested"], Value::Dict(Dictionary::new()));
        assert_eq!(dst["new"].as_str(), Some("x"));
    }

    #[test]
    fn test_serialize_untagged() {
        let value = Value::Array(vec![Value::Bool(true), Value::from(3u32), Value::from("s")]);
        let json = serde_json::to_string(&value).unwrap();
        assert_eq!(json, r#"[true,3,"s"]"#);
    }
}

//! XML property list reader
//!
//! Profile tables ship inside the driver's `Info.plist`, and firmware
//! override packages are authored in the same format for testing. Only the
//! element types that map onto [`Value`] are accepted: `dict`, `array`,
//! `string`, `integer`, `true`, `false` and `data`.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use quick_xml::events::Event;
use quick_xml::reader::Reader;
use std::path::Path;
use thiserror::Error;

use crate::value::{Dictionary, Value};

#[derive(Error, Debug)]
pub enum PlistError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
    #[error("XML error: {0}")]
    XmlError(#[from] quick_xml::Error),
    #[error("Invalid base64 data: {0}")]
    Base64Error(#[from] base64::DecodeError),
    #[error("Invalid integer: {0:?}")]
    InvalidInteger(String),
    #[error("Unsupported element <{0}>")]
    UnsupportedElement(String),
    #[error("Missing value for key {0:?}")]
    MissingValue(String),
    #[error("Invalid plist structure: {0}")]
    Structure(String),
    #[error("Unexpected end of document")]
    UnexpectedEof,
}

type XmlReader<'a> = Reader<&'a [u8]>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Tag {
    Open,
    SelfClosing,
}

/// Parse a property list document into its root value
///
/// The `<plist>` wrapper is optional; the first value element is the root.
pub fn from_str(text: &str) -> Result<Value, PlistError> {
    let mut reader = Reader::from_str(text);
    loop {
        match reader.read_event()? {
            Event::Start(e) if e.name().as_ref() == b"plist" => {
                let (name, tag) = next_element(&mut reader, b"plist")?
                    .ok_or_else(|| PlistError::Structure("empty <plist>".to_string()))?;
                return parse_element(&mut reader, &name, tag);
            }
            Event::Start(e) => return parse_element(&mut reader, e.name().as_ref(), Tag::Open),
            Event::Empty(e) => {
                return parse_element(&mut reader, e.name().as_ref(), Tag::SelfClosing)
            }
            Event::Eof => return Err(PlistError::UnexpectedEof),
            _ => {}
        }
    }
}

/// Read and parse a property list file
pub fn from_file(path: &Path) -> Result<Value, PlistError> {
    let content = std::fs::read_to_string(path)?;
    from_str(&content)
}

/// Descend through nested dictionaries along `path`
pub fn value_at_path<'a, S: AsRef<str>>(root: &'a Value, path: &[S]) -> Option<&'a Value> {
    path.iter()
        .try_fold(root, |value, key| value.as_dict()?.get(key.as_ref()))
}

/// Next child element of `parent`, or `None` at its closing tag
fn next_element(reader: &mut XmlReader<'_>, parent: &[u8]) -> Result<Option<(Vec<u8>, Tag)>, PlistError> {
    loop {
        match reader.read_event()? {
            Event::Start(e) => return Ok(Some((e.name().as_ref().to_vec(), Tag::Open))),
            Event::Empty(e) => return Ok(Some((e.name().as_ref().to_vec(), Tag::SelfClosing))),
            Event::End(e) if e.name().as_ref() == parent => return Ok(None),
            Event::End(e) => {
                return Err(PlistError::Structure(format!(
                    "unexpected </{}>",
                    String::from_utf8_lossy(e.name().as_ref())
                )))
            }
            Event::Eof => return Err(PlistError::UnexpectedEof),
            // Whitespace between elements, comments, processing instructions
            _ => {}
        }
    }
}

fn parse_element(reader: &mut XmlReader<'_>, name: &[u8], tag: Tag) -> Result<Value, PlistError> {
    let open = tag == Tag::Open;
    match name {
        b"dict" if open => parse_dict(reader),
        b"dict" => Ok(Value::Dict(Dictionary::new())),
        b"array" if open => parse_array(reader),
        b"array" => Ok(Value::Array(Vec::new())),
        b"string" => Ok(Value::String(element_text(reader, name, tag)?)),
        b"integer" => parse_integer(&element_text(reader, name, tag)?),
        b"true" | b"false" => {
            element_text(reader, name, tag)?;
            Ok(Value::Bool(name == b"true"))
        }
        b"data" => {
            let text: String = element_text(reader, name, tag)?
                .chars()
                .filter(|c| !c.is_whitespace())
                .collect();
            Ok(Value::Data(STANDARD.decode(text)?))
        }
        other => Err(PlistError::UnsupportedElement(
            String::from_utf8_lossy(other).into_owned(),
        )),
    }
}

fn parse_array(reader: &mut XmlReader<'_>) -> Result<Value, PlistError> {
    let mut items = Vec::new();
    while let Some((name, tag)) = next_element(reader, b"array")? {
        items.push(parse_element(reader, &name, tag)?);
    }
    Ok(Value::Array(items))
}

fn parse_dict(reader: &mut XmlReader<'_>) -> Result<Value, PlistError> {
    let mut dict = Dictionary::new();
    while let Some((name, tag)) = next_element(reader, b"dict")? {
        if name != b"key" {
            return Err(PlistError::Structure(format!(
                "expected <key> in <dict>, found <{}>",
                String::from_utf8_lossy(&name)
            )));
        }
        let key = element_text(reader, b"key", tag)?;
        let (name, tag) = next_element(reader, b"dict")?
            .ok_or_else(|| PlistError::MissingValue(key.clone()))?;
        if name == b"key" {
            return Err(PlistError::MissingValue(key));
        }
        let value = parse_element(reader, &name, tag)?;
        dict.insert(key, value);
    }
    Ok(Value::Dict(dict))
}

/// Text content of a leaf element, unescaped
fn element_text(reader: &mut XmlReader<'_>, name: &[u8], tag: Tag) -> Result<String, PlistError> {
    if tag == Tag::SelfClosing {
        return Ok(String::new());
    }
    let mut text = String::new();
    loop {
        match reader.read_event()? {
            Event::Text(t) => text.push_str(&t.unescape().map_err(quick_xml::Error::from)?),
            Event::CData(c) => text.push_str(&String::from_utf8_lossy(&c)),
            Event::Comment(_) => {}
            Event::End(e) if e.name().as_ref() == name => return Ok(text),
            Event::Eof => return Err(PlistError::UnexpectedEof),
            _ => {
                return Err(PlistError::Structure(format!(
                    "unexpected markup inside <{}>",
                    String::from_utf8_lossy(name)
                )))
            }
        }
    }
}

/// Decimal (optionally negative) or `0x` hex integer
fn parse_integer(text: &str) -> Result<Value, PlistError> {
    let trimmed = text.trim();
    let parsed = match trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
    {
        Some(hex) => i64::from_str_radix(hex, 16),
        None => trimmed.parse::<i64>(),
    };
    parsed
        .map(Value::Integer)
        .map_err(|_| PlistError::InvalidInteger(text.to_string()))
}

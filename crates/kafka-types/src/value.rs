//! Decoded payload values.

use crate::proto::ProtoMessage;
use std::fmt;

/// A decoded message key or payload.
///
/// Which variant a record carries depends on the deserializer configured
/// for the consumer. Without one, keys and payloads stay [`Value::Bytes`].
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Undecoded bytes
    Bytes(Vec<u8>),
    /// UTF-8 text
    Text(String),
    /// Parsed JSON document
    Json(serde_json::Value),
    /// Protobuf message decoded against a runtime schema
    Protobuf(ProtoMessage),
    /// Absent payload (tombstone)
    Null,
}

impl Value {
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Value::Bytes(b) => Some(b),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_json(&self) -> Option<&serde_json::Value> {
        match self {
            Value::Json(v) => Some(v),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }
}

impl From<Vec<u8>> for Value {
    fn from(bytes: Vec<u8>) -> Self {
        Value::Bytes(bytes)
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

impl From<serde_json::Value> for Value {
    fn from(v: serde_json::Value) -> Self {
        Value::Json(v)
    }
}

/// Writes bytes with printable ASCII kept as is and everything else escaped.
pub(crate) fn write_escaped(f: &mut fmt::Formatter<'_>, bytes: &[u8]) -> fmt::Result {
    for b in bytes {
        for c in std::ascii::escape_default(*b) {
            write!(f, "{}", c as char)?;
        }
    }
    Ok(())
}

/// Write text with control characters escaped, so a value never spans lines.
pub(crate) fn write_escaped_text(f: &mut fmt::Formatter<'_>, text: &str) -> fmt::Result {
    for c in text.chars() {
        if c.is_control() {
            write!(f, "{}", c.escape_default())?;
        } else {
            write!(f, "{c}")?;
        }
    }
    Ok(())
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Bytes(b) => write_escaped(f, b),
            Value::Text(s) => write_escaped_text(f, s),
            Value::Json(v) => write!(f, "{v}"),
            Value::Protobuf(m) => write!(f, "{m}"),
            Value::Null => f.write_str("None"),
        }
    }
}

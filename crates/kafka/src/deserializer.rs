//! Payload deserializers.
//!
//! A deserializer turns the raw bytes of a message key or payload into a
//! [`Value`]. The consumer calls it once per present key/payload; tombstones
//! and missing keys never reach it.

use crate::error::Result;
use crate::proto::decoder::ProtoDecoder;
use crate::proto::parser::parse_schema_file;
use kafka_types::{KafkaTypesError, ProtoSchema, Value};
use std::path::Path;

/// Decodes raw key or payload bytes.
pub trait Deserializer: Send + Sync {
    fn deserialize(&self, topic: &str, data: &[u8]) -> kafka_types::Result<Value>;

    /// Short name used in logs and debug output.
    fn name(&self) -> &str {
        "custom"
    }
}

/// Keeps the bytes as they are.
#[derive(Debug, Clone, Copy, Default)]
pub struct RawDeserializer;

impl Deserializer for RawDeserializer {
    fn deserialize(&self, _topic: &str, data: &[u8]) -> kafka_types::Result<Value> {
        Ok(Value::Bytes(data.to_vec()))
    }

    fn name(&self) -> &str {
        "raw"
    }
}

/// Decodes UTF-8 text; invalid UTF-8 is an error.
#[derive(Debug, Clone, Copy, Default)]
pub struct Utf8Deserializer;

impl Deserializer for Utf8Deserializer {
    fn deserialize(&self, _topic: &str, data: &[u8]) -> kafka_types::Result<Value> {
        Ok(Value::Text(String::from_utf8(data.to_vec())?))
    }

    fn name(&self) -> &str {
        "utf8"
    }
}

/// Parses the bytes as a JSON document.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonDeserializer;

impl Deserializer for JsonDeserializer {
    fn deserialize(&self, _topic: &str, data: &[u8]) -> kafka_types::Result<Value> {
        Ok(Value::Json(serde_json::from_slice(data)?))
    }

    fn name(&self) -> &str {
        "json"
    }
}

/// Decodes protobuf payloads of one message type against a runtime schema.
pub struct ProtobufDeserializer {
    decoder: ProtoDecoder,
    message_type: String,
}

impl ProtobufDeserializer {
    pub fn new(schema: ProtoSchema, message_type: impl Into<String>) -> Result<Self> {
        let message_type = message_type.into();
        if schema.get_message(&message_type).is_none() {
            return Err(KafkaTypesError::MessageTypeNotFound(message_type).into());
        }
        Ok(Self {
            decoder: ProtoDecoder::new(schema),
            message_type,
        })
    }

    /// Load the schema from a `.proto` file.
    pub fn from_proto_file<P: AsRef<Path>>(path: P, message_type: &str) -> Result<Self> {
        Self::new(parse_schema_file(path)?, message_type)
    }

    pub fn message_type(&self) -> &str {
        &self.message_type
    }
}

impl Deserializer for ProtobufDeserializer {
    fn deserialize(&self, _topic: &str, data: &[u8]) -> kafka_types::Result<Value> {
        self.decoder
            .decode(&self.message_type, data)
            .map(Value::Protobuf)
    }

    fn name(&self) -> &str {
        "protobuf"
    }
}

/// Wraps a plain function or closure from bytes to a value.
///
/// Closures report their own failures as [`KafkaTypesError::Custom`].
pub struct FnDeserializer<F> {
    f: F,
}

impl<F> FnDeserializer<F>
where
    F: Fn(&[u8]) -> kafka_types::Result<Value> + Send + Sync,
{
    pub fn new(f: F) -> Self {
        Self { f }
    }
}

impl<F> Deserializer for FnDeserializer<F>
where
    F: Fn(&[u8]) -> kafka_types::Result<Value> + Send + Sync,
{
    fn deserialize(&self, _topic: &str, data: &[u8]) -> kafka_types::Result<Value> {
        (self.f)(data)
    }
}

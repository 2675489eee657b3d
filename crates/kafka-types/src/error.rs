//! Error types for kafka-types crate.

use thiserror::Error;

/// Errors that can occur while turning payload bytes into a [`crate::Value`].
#[derive(Error, Debug)]
pub enum KafkaTypesError {
    #[error("Protobuf decoding error: {0}")]
    ProtobufDecode(String),

    #[error("Invalid UTF-8 payload: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),

    #[error("JSON parse error: {0}")]
    JsonParse(#[from] serde_json::Error),

    #[error("Message type not found: {0}")]
    MessageTypeNotFound(String),

    /// Failure reported by a user-supplied deserializer, e.g. the closure
    /// behind `FnDeserializer` rejecting a payload.
    #[error("Deserializer error: {0}")]
    Custom(String),
}

/// Result type alias for kafka-types operations.
pub type Result<T> = std::result::Result<T, KafkaTypesError>;

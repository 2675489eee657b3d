//! Shared types for the topic-tail consumer crates.
//!
//! The consumer crate produces these, the CLI prints them:
//!
//! ```text
//! RawRecord (bytes from the broker) --deserializers--> Record { key: Option<Value>, value: Value }
//! ```
//!
//! # Modules
//!
//! - [`message`] - Kafka message records, raw and decoded
//! - [`value`] - Decoded payload representation and its display format
//! - [`proto`] - Runtime protobuf schema and decoded message types
//! - [`error`] - Error types for decoding payloads

pub mod error;
pub mod message;
pub mod proto;
pub mod value;

pub use error::{KafkaTypesError, Result};
pub use message::{RawRecord, Record};
pub use proto::{
    ProtoFieldDescriptor, ProtoFieldValue, ProtoMessage, ProtoMessageDescriptor, ProtoSchema,
    ProtoType,
};
pub use value::Value;

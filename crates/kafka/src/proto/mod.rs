//! Runtime protobuf support.
//!
//! Schemas are parsed from `.proto` files at startup; payloads are decoded
//! against them without generated code. The resulting types live in
//! `kafka-types`.

pub mod decoder;
pub mod parser;

pub use decoder::ProtoDecoder;
pub use parser::{parse_schema_file, parse_schema_str};

//! Protobuf wire-format decoder.
//!
//! Decodes binary protobuf data into [`ProtoMessage`] using a schema from
//! the parser module. Fields that are not in the schema are skipped, packed
//! repeated scalars are expanded.

use kafka_types::{
    KafkaTypesError, ProtoFieldDescriptor, ProtoFieldValue, ProtoMessage, ProtoMessageDescriptor,
    ProtoSchema, ProtoType, Result,
};
use protobuf::CodedInputStream;
use std::collections::HashMap;

const WIRE_VARINT: u32 = 0;
const WIRE_FIXED64: u32 = 1;
const WIRE_LEN: u32 = 2;
const WIRE_FIXED32: u32 = 5;

/// Maximum nesting of message fields, the same limit the protobuf crate uses.
const RECURSION_LIMIT: u32 = 100;

fn decode_err(e: impl std::fmt::Display) -> KafkaTypesError {
    KafkaTypesError::ProtobufDecode(e.to_string())
}

/// Runtime protobuf decoder.
pub struct ProtoDecoder {
    schema: ProtoSchema,
}

impl ProtoDecoder {
    pub fn new(schema: ProtoSchema) -> Self {
        Self { schema }
    }

    pub fn schema(&self) -> &ProtoSchema {
        &self.schema
    }

    /// Decode a protobuf message from bytes.
    pub fn decode(&self, message_type: &str, data: &[u8]) -> Result<ProtoMessage> {
        let descriptor = self.descriptor(message_type)?;
        let mut stream = CodedInputStream::from_bytes(data);
        self.decode_message(descriptor, &mut stream, 0)
    }

    fn descriptor(&self, message_type: &str) -> Result<&ProtoMessageDescriptor> {
        self.schema
            .get_message(message_type)
            .ok_or_else(|| KafkaTypesError::MessageTypeNotFound(message_type.to_string()))
    }

    fn decode_message(
        &self,
        descriptor: &ProtoMessageDescriptor,
        stream: &mut CodedInputStream,
        depth: u32,
    ) -> Result<ProtoMessage> {
        let mut fields = HashMap::new();

        while !stream.eof().map_err(decode_err)? {
            let tag = stream.read_raw_varint32().map_err(decode_err)?;
            let field_number = (tag >> 3) as i32;
            let wire_type = tag & 0x7;
            if field_number == 0 {
                return Err(decode_err(format!(
                    "Invalid field number 0 in message {}",
                    descriptor.name
                )));
            }

            let Some(field_desc) = descriptor.field_by_number(field_number) else {
                tracing::trace!(
                    "Skipping unknown field {field_number} in message {}",
                    descriptor.name
                );
                skip_field(wire_type, stream)?;
                continue;
            };

            if field_desc.is_repeated {
                let mut decoded = Vec::new();
                if wire_type == WIRE_LEN && is_packable(&field_desc.field_type) {
                    let len = stream.read_raw_varint32().map_err(decode_err)?;
                    let old_limit = stream.push_limit(len as u64).map_err(decode_err)?;
                    while !stream.eof().map_err(decode_err)? {
                        decoded.push(self.decode_field_value(field_desc, stream, depth)?);
                    }
                    stream.pop_limit(old_limit);
                } else {
                    decoded.push(self.decode_field_value(field_desc, stream, depth)?);
                }

                let entry = fields
                    .entry(field_desc.name.clone())
                    .or_insert_with(|| ProtoFieldValue::Repeated(Vec::new()));
                if let ProtoFieldValue::Repeated(values) = entry {
                    values.extend(decoded);
                }
            } else {
                // last one wins for singular fields
                let value = self.decode_field_value(field_desc, stream, depth)?;
                fields.insert(field_desc.name.clone(), value);
            }
        }

        Ok(ProtoMessage {
            message_type: descriptor.name.clone(),
            fields,
            descriptor: descriptor.clone(),
        })
    }

    fn decode_field_value(
        &self,
        field_desc: &ProtoFieldDescriptor,
        stream: &mut CodedInputStream,
        depth: u32,
    ) -> Result<ProtoFieldValue> {
        let value = match &field_desc.field_type {
            ProtoType::Double => ProtoFieldValue::Double(stream.read_double().map_err(decode_err)?),
            ProtoType::Float => ProtoFieldValue::Float(stream.read_float().map_err(decode_err)?),
            ProtoType::Int32 | ProtoType::Enum(_) => {
                ProtoFieldValue::Int32(stream.read_int32().map_err(decode_err)?)
            }
            ProtoType::Sint32 => ProtoFieldValue::Int32(stream.read_sint32().map_err(decode_err)?),
            ProtoType::Sfixed32 => {
                ProtoFieldValue::Int32(stream.read_sfixed32().map_err(decode_err)?)
            }
            ProtoType::Int64 => ProtoFieldValue::Int64(stream.read_int64().map_err(decode_err)?),
            ProtoType::Sint64 => ProtoFieldValue::Int64(stream.read_sint64().map_err(decode_err)?),
            ProtoType::Sfixed64 => {
                ProtoFieldValue::Int64(stream.read_sfixed64().map_err(decode_err)?)
            }
            ProtoType::Uint32 => ProtoFieldValue::Uint32(stream.read_uint32().map_err(decode_err)?),
            ProtoType::Fixed32 => {
                ProtoFieldValue::Uint32(stream.read_fixed32().map_err(decode_err)?)
            }
            ProtoType::Uint64 => ProtoFieldValue::Uint64(stream.read_uint64().map_err(decode_err)?),
            ProtoType::Fixed64 => {
                ProtoFieldValue::Uint64(stream.read_fixed64().map_err(decode_err)?)
            }
            ProtoType::Bool => ProtoFieldValue::Bool(stream.read_bool().map_err(decode_err)?),
            ProtoType::String => ProtoFieldValue::String(stream.read_string().map_err(decode_err)?),
            ProtoType::Bytes => ProtoFieldValue::Bytes(stream.read_bytes().map_err(decode_err)?),
            ProtoType::Message(type_name) => {
                if depth >= RECURSION_LIMIT {
                    return Err(decode_err(format!(
                        "Message nesting exceeds {RECURSION_LIMIT} levels at field {}",
                        field_desc.name
                    )));
                }
                let nested_descriptor = self.descriptor(type_name)?;
                let len = stream.read_raw_varint32().map_err(decode_err)?;
                let old_limit = stream.push_limit(len as u64).map_err(decode_err)?;
                let nested_message = self.decode_message(nested_descriptor, stream, depth + 1)?;
                stream.pop_limit(old_limit);
                ProtoFieldValue::Message(Box::new(nested_message))
            }
        };
        Ok(value)
    }
}

fn is_packable(field_type: &ProtoType) -> bool {
    !matches!(
        field_type,
        ProtoType::String | ProtoType::Bytes | ProtoType::Message(_)
    )
}

fn skip_field(wire_type: u32, stream: &mut CodedInputStream) -> Result<()> {
    match wire_type {
        WIRE_VARINT => {
            stream.read_raw_varint64().map_err(decode_err)?;
        }
        WIRE_FIXED64 => {
            stream.read_fixed64().map_err(decode_err)?;
        }
        WIRE_LEN => {
            let len = stream.read_raw_varint32().map_err(decode_err)?;
            stream.read_raw_bytes(len).map_err(decode_err)?;
        }
        WIRE_FIXED32 => {
            stream.read_fixed32().map_err(decode_err)?;
        }
        other => {
            return Err(decode_err(format!("Unsupported wire type: {other}")));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::proto::parser::parse_schema_str;

    fn decoder() -> ProtoDecoder {
        let schema = parse_schema_str(
            r#"
                syntax = "proto3";
                package demo;

                message Inner {
                    string label = 1;
                }

                message Event {
                    int32 id = 1;
                    sint32 delta = 2;
                    repeated int32 scores = 3;
                    Inner inner = 4;
                    fixed32 checksum = 5;
                    bool ok = 6;
                }
            "#,
        )
        .expect("Failed to parse proto");
        ProtoDecoder::new(schema)
    }

    #[test]
    fn test_decode_scalars_zigzag_and_fixed() {
        let data = [
            0x08, 0x96, 0x01, // id = 150
            0x10, 0x03, // delta = -2 (zigzag)
            0x2d, 0x01, 0x00, 0x00, 0x00, // checksum = 1
            0x30, 0x01, // ok = true
        ];
        let msg = decoder().decode("Event", &data).unwrap();

        assert_eq!(msg.message_type, "demo.Event");
        assert_eq!(msg.get("id"), Some(&ProtoFieldValue::Int32(150)));
        assert_eq!(msg.get("delta"), Some(&ProtoFieldValue::Int32(-2)));
        assert_eq!(msg.get("checksum"), Some(&ProtoFieldValue::Uint32(1)));
        assert_eq!(msg.get("ok"), Some(&ProtoFieldValue::Bool(true)));
    }

    #[test]
    fn test_decode_packed_repeated_and_nested() {
        let data = [
            0x1a, 0x03, 0x01, 0x02, 0x03, // scores = [1, 2, 3] packed
            0x18, 0x04, // scores += 4 unpacked
            0x22, 0x03, 0x0a, 0x01, b'x', // inner = { label: "x" }
        ];
        let msg = decoder().decode("demo.Event", &data).unwrap();

        assert_eq!(
            msg.get("scores"),
            Some(&ProtoFieldValue::Repeated(vec![
                ProtoFieldValue::Int32(1),
                ProtoFieldValue::Int32(2),
                ProtoFieldValue::Int32(3),
                ProtoFieldValue::Int32(4),
            ]))
        );
        assert_eq!(
            msg.to_string(),
            r#"demo.Event{scores=[1, 2, 3, 4], inner=demo.Inner{label="x"}}"#
        );
    }

    #[test]
    fn test_unknown_fields_are_skipped() {
        let data = [
            0x08, 0x01, // id = 1
            0x78, 0x05, // field 15 varint, unknown
            0x82, 0x01, 0x02, b'h', b'i', // field 16 length-delimited, unknown
        ];
        let msg = decoder().decode("Event", &data).unwrap();
        assert_eq!(msg.fields.len(), 1);
        assert_eq!(msg.get("id"), Some(&ProtoFieldValue::Int32(1)));
    }

    #[test]
    fn test_truncated_payload_is_an_error() {
        let err = decoder().decode("Event", &[0x08]).unwrap_err();
        assert!(matches!(err, KafkaTypesError::ProtobufDecode(_)));

        let err = decoder().decode("Missing", &[]).unwrap_err();
        assert!(matches!(err, KafkaTypesError::MessageTypeNotFound(_)));
    }

    #[test]
    fn test_same_short_name_decodes_against_enclosing_type() {
        let schema = parse_schema_str(
            r#"
                syntax = "proto3";

                message Order {
                    message Line { string sku = 1; }
                    repeated Line lines = 1;
                }

                message Invoice {
                    message Line { int64 cents = 1; }
                    repeated Line items = 1;
                }
            "#,
        )
        .expect("Failed to parse proto");

        let data = [0x0a, 0x04, 0x0a, 0x02, b'a', b'b'];
        let msg = ProtoDecoder::new(schema).decode("Order", &data).unwrap();
        assert_eq!(msg.to_string(), r#"Order{lines=[Order.Line{sku="ab"}]}"#);
    }

    fn nested_nodes(depth: usize) -> Vec<u8> {
        let mut data = Vec::new();
        for _ in 0..depth {
            let mut outer = vec![0x0a];
            let mut len = data.len();
            while len >= 0x80 {
                outer.push((len as u8 & 0x7f) | 0x80);
                len >>= 7;
            }
            outer.push(len as u8);
            outer.extend_from_slice(&data);
            data = outer;
        }
        data
    }

    #[test]
    fn test_deeply_nested_payload_is_rejected() {
        let schema = parse_schema_str(
            r#"
                syntax = "proto3";
                message Node { Node child = 1; }
            "#,
        )
        .expect("Failed to parse proto");
        let decoder = ProtoDecoder::new(schema);

        assert!(decoder.decode("Node", &nested_nodes(50)).is_ok());

        let err = decoder.decode("Node", &nested_nodes(5_000)).unwrap_err();
        assert!(
            matches!(&err, KafkaTypesError::ProtobufDecode(msg) if msg.contains("nesting")),
            "unexpected error: {err}"
        );
    }
}

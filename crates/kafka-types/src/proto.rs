//! Protobuf type definitions.
//!
//! The runtime representation of a parsed `.proto` schema and of messages
//! decoded against it. Parsing and decoding live in the consumer crate.

use crate::value::write_escaped;
use std::collections::HashMap;
use std::fmt;

/// Represents a field value in a decoded protobuf message.
#[derive(Debug, Clone, PartialEq)]
pub enum ProtoFieldValue {
    Double(f64),
    Float(f32),
    Int32(i32),
    Int64(i64),
    Uint32(u32),
    Uint64(u64),
    Bool(bool),
    String(String),
    Bytes(Vec<u8>),
    Message(Box<ProtoMessage>),
    Repeated(Vec<ProtoFieldValue>),
}

impl fmt::Display for ProtoFieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProtoFieldValue::Double(v) => write!(f, "{v}"),
            ProtoFieldValue::Float(v) => write!(f, "{v}"),
            ProtoFieldValue::Int32(v) => write!(f, "{v}"),
            ProtoFieldValue::Int64(v) => write!(f, "{v}"),
            ProtoFieldValue::Uint32(v) => write!(f, "{v}"),
            ProtoFieldValue::Uint64(v) => write!(f, "{v}"),
            ProtoFieldValue::Bool(v) => write!(f, "{v}"),
            ProtoFieldValue::String(v) => write!(f, "{v:?}"),
            ProtoFieldValue::Bytes(v) => write_escaped(f, v),
            ProtoFieldValue::Message(m) => write!(f, "{m}"),
            ProtoFieldValue::Repeated(items) => {
                f.write_str("[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{item}")?;
                }
                f.write_str("]")
            }
        }
    }
}

/// Represents a decoded protobuf message.
///
/// Contains the message type name, decoded fields, and the schema descriptor
/// for field introspection.
#[derive(Debug, Clone, PartialEq)]
pub struct ProtoMessage {
    /// Message type name (e.g., "mypackage.MyMessage")
    pub message_type: String,
    /// Decoded field values by field name
    pub fields: HashMap<String, ProtoFieldValue>,
    /// Schema reference for field introspection
    pub descriptor: ProtoMessageDescriptor,
}

impl ProtoMessage {
    /// Get a decoded field by name.
    pub fn get(&self, field: &str) -> Option<&ProtoFieldValue> {
        self.fields.get(field)
    }
}

/// Renders as `Type{a=1, b="x"}`, fields in declaration order, unset fields omitted.
impl fmt::Display for ProtoMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{{", self.message_type)?;
        let mut first = true;
        for name in self.descriptor.list_fields() {
            if let Some(value) = self.fields.get(name) {
                if !first {
                    f.write_str(", ")?;
                }
                first = false;
                write!(f, "{name}={value}")?;
            }
        }
        f.write_str("}")
    }
}

/// Protobuf field type enumeration.
#[derive(Debug, Clone, PartialEq)]
pub enum ProtoType {
    Double,
    Float,
    Int32,
    Int64,
    Uint32,
    Uint64,
    Sint32,
    Sint64,
    Fixed32,
    Fixed64,
    Sfixed32,
    Sfixed64,
    Bool,
    String,
    Bytes,
    Message(String),
    Enum(String),
}

impl fmt::Display for ProtoType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.type_name())
    }
}

impl ProtoType {
    /// Get the human-readable type name.
    pub fn type_name(&self) -> String {
        match self {
            ProtoType::Double => "double".to_string(),
            ProtoType::Float => "float".to_string(),
            ProtoType::Int32 => "int32".to_string(),
            ProtoType::Int64 => "int64".to_string(),
            ProtoType::Uint32 => "uint32".to_string(),
            ProtoType::Uint64 => "uint64".to_string(),
            ProtoType::Sint32 => "sint32".to_string(),
            ProtoType::Sint64 => "sint64".to_string(),
            ProtoType::Fixed32 => "fixed32".to_string(),
            ProtoType::Fixed64 => "fixed64".to_string(),
            ProtoType::Sfixed32 => "sfixed32".to_string(),
            ProtoType::Sfixed64 => "sfixed64".to_string(),
            ProtoType::Bool => "bool".to_string(),
            ProtoType::String => "string".to_string(),
            ProtoType::Bytes => "bytes".to_string(),
            ProtoType::Message(name) => format!("message:{name}"),
            ProtoType::Enum(name) => format!("enum:{name}"),
        }
    }
}

/// Describes a single field in a protobuf message.
#[derive(Debug, Clone, PartialEq)]
pub struct ProtoFieldDescriptor {
    /// Field name
    pub name: String,
    /// Field number (tag)
    pub number: i32,
    /// Field type
    pub field_type: ProtoType,
    /// Whether the field is repeated
    pub is_repeated: bool,
}

/// Describes a protobuf message type (schema).
#[derive(Debug, Clone, PartialEq)]
pub struct ProtoMessageDescriptor {
    /// Fully qualified message name (e.g., "mypackage.MyMessage")
    pub name: String,
    /// Map of field names to their descriptors
    pub fields: HashMap<String, ProtoFieldDescriptor>,
    /// Ordered list of field names (preserves proto definition order)
    pub field_order: Vec<String>,
}

impl ProtoMessageDescriptor {
    /// Get a field descriptor by name.
    pub fn get_field(&self, name: &str) -> Option<&ProtoFieldDescriptor> {
        self.fields.get(name)
    }

    /// Find a field descriptor by its tag number.
    pub fn field_by_number(&self, number: i32) -> Option<&ProtoFieldDescriptor> {
        self.fields.values().find(|f| f.number == number)
    }

    /// List all field names in definition order.
    pub fn list_fields(&self) -> &[String] {
        &self.field_order
    }
}

/// A parsed protobuf schema, keyed by fully qualified message name.
#[derive(Debug, Clone, Default)]
pub struct ProtoSchema {
    pub messages: HashMap<String, ProtoMessageDescriptor>,
}

impl ProtoSchema {
    /// Get a message descriptor by fully qualified name.
    ///
    /// A partially qualified name such as `Line` or `Order.Line` also
    /// resolves, as long as exactly one message ends with it.
    pub fn get_message(&self, name: &str) -> Option<&ProtoMessageDescriptor> {
        let name = name.trim_start_matches('.');
        if let Some(descriptor) = self.messages.get(name) {
            return Some(descriptor);
        }

        let suffix = format!(".{name}");
        let mut candidates = self
            .messages
            .iter()
            .filter(|(full_name, _)| full_name.ends_with(&suffix))
            .map(|(_, descriptor)| descriptor);
        match (candidates.next(), candidates.next()) {
            (Some(descriptor), None) => Some(descriptor),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn point_descriptor() -> ProtoMessageDescriptor {
        let mut fields = HashMap::new();
        for (name, number, field_type) in [
            ("x", 1, ProtoType::Int32),
            ("label", 2, ProtoType::String),
            ("tags", 3, ProtoType::String),
        ] {
            fields.insert(
                name.to_string(),
                ProtoFieldDescriptor {
                    name: name.to_string(),
                    number,
                    field_type,
                    is_repeated: name == "tags",
                },
            );
        }
        ProtoMessageDescriptor {
            name: "geo.Point".to_string(),
            fields,
            field_order: vec!["x".into(), "label".into(), "tags".into()],
        }
    }

    #[test]
    fn test_message_display_follows_declaration_order() {
        let descriptor = point_descriptor();
        let mut fields = HashMap::new();
        fields.insert(
            "tags".to_string(),
            ProtoFieldValue::Repeated(vec![
                ProtoFieldValue::String("a".into()),
                ProtoFieldValue::String("b".into()),
            ]),
        );
        fields.insert("x".to_string(), ProtoFieldValue::Int32(7));
        let msg = ProtoMessage {
            message_type: descriptor.name.clone(),
            fields,
            descriptor,
        };

        assert_eq!(msg.to_string(), r#"geo.Point{x=7, tags=["a", "b"]}"#);
    }

    #[test]
    fn test_schema_lookup_accepts_qualified_name() {
        let mut schema = ProtoSchema::default();
        schema
            .messages
            .insert("geo.Point".to_string(), point_descriptor());

        assert!(schema.get_message("Point").is_some());
        assert!(schema.get_message("geo.Point").is_some());
        assert!(schema.get_message(".geo.Point").is_some());
        assert!(schema.get_message("Line").is_none());
        assert!(schema.get_message("eo.Point").is_none());
        assert_eq!(
            schema
                .get_message("Point")
                .and_then(|m| m.field_by_number(2))
                .map(|f| f.name.as_str()),
            Some("label")
        );
    }

    #[test]
    fn test_schema_lookup_rejects_ambiguous_short_name() {
        let mut schema = ProtoSchema::default();
        for full_name in ["geo.Point", "chart.Point"] {
            let mut descriptor = point_descriptor();
            descriptor.name = full_name.to_string();
            schema.messages.insert(full_name.to_string(), descriptor);
        }

        assert!(schema.get_message("Point").is_none());
        assert_eq!(
            schema.get_message("chart.Point").map(|m| m.name.as_str()),
            Some("chart.Point")
        );
    }

    #[test]
    fn test_type_names() {
        assert_eq!(ProtoType::Sint64.to_string(), "sint64");
        assert_eq!(
            ProtoType::Message("geo.Point".into()).to_string(),
            "message:geo.Point"
        );
    }
}

use crate::error::{Error, Result};
use kafka_types::{ProtoFieldDescriptor, ProtoMessageDescriptor, ProtoSchema, ProtoType};
use protobuf::descriptor::field_descriptor_proto::{Label, Type};
use protobuf::descriptor::{DescriptorProto, FieldDescriptorProto};
use protobuf_parse::Parser;
use std::collections::HashMap;
use std::path::Path;

/// Parse a .proto file into a schema.
///
/// Imports are resolved relative to the file's directory. Every message,
/// nested ones included, is registered under its fully qualified name.
pub fn parse_schema_file<P: AsRef<Path>>(path: P) -> Result<ProtoSchema> {
    let p = path.as_ref();

    let mut parser = Parser::new();
    parser.pure();
    parser.input(p);
    if let Some(parent) = p.parent() {
        parser.include(parent);
    }

    let parsed = parser
        .parse_and_typecheck()
        .map_err(|e| Error::ProtobufParse(e.to_string()))?;

    let mut messages = HashMap::new();
    for file_descriptor in &parsed.file_descriptors {
        let prefix = file_descriptor.package.clone().unwrap_or_default();
        for message in &file_descriptor.message_type {
            collect_message(&prefix, message, &mut messages)?;
        }
    }

    Ok(ProtoSchema { messages })
}

/// Parse .proto content held in memory.
pub fn parse_schema_str(content: &str) -> Result<ProtoSchema> {
    use std::io::Write;

    let dir = tempfile::tempdir()
        .map_err(|e| Error::ProtobufParse(format!("Failed to create temp dir: {e}")))?;
    let path = dir.path().join("schema.proto");
    let mut file = std::fs::File::create(&path)
        .map_err(|e| Error::ProtobufParse(format!("Failed to write temp file: {e}")))?;
    file.write_all(content.as_bytes())
        .map_err(|e| Error::ProtobufParse(format!("Failed to write temp file: {e}")))?;

    parse_schema_file(&path)
}

fn collect_message(
    prefix: &str,
    message: &DescriptorProto,
    messages: &mut HashMap<String, ProtoMessageDescriptor>,
) -> Result<()> {
    let simple_name = message.name.as_deref().unwrap_or_default();
    let full_name = if prefix.is_empty() {
        simple_name.to_string()
    } else {
        format!("{prefix}.{simple_name}")
    };

    let mut fields = HashMap::new();
    let mut field_order = Vec::new();
    for field in &message.field {
        let field_name = field.name.clone().unwrap_or_default();
        if field_name.is_empty() {
            continue;
        }
        field_order.push(field_name.clone());
        fields.insert(
            field_name.clone(),
            ProtoFieldDescriptor {
                name: field_name,
                number: field.number.unwrap_or(0),
                field_type: field_type(field)?,
                is_repeated: field.label == Some(Label::LABEL_REPEATED.into()),
            },
        );
    }

    for nested in &message.nested_type {
        // map<K, V> entries are synthesized nested types; they decode as plain messages
        collect_message(&full_name, nested, messages)?;
    }

    messages.insert(
        full_name.clone(),
        ProtoMessageDescriptor {
            name: full_name,
            fields,
            field_order,
        },
    );
    Ok(())
}

fn field_type(field: &FieldDescriptorProto) -> Result<ProtoType> {
    let type_enum = field
        .type_
        .ok_or_else(|| Error::ProtobufParse("Field missing type".to_string()))?
        .enum_value_or_default();

    // type_name is fully qualified with a leading dot, e.g. ".pkg.Inner"
    let type_name = || {
        field
            .type_name
            .clone()
            .unwrap_or_default()
            .trim_start_matches('.')
            .to_string()
    };

    Ok(match type_enum {
        Type::TYPE_DOUBLE => ProtoType::Double,
        Type::TYPE_FLOAT => ProtoType::Float,
        Type::TYPE_INT64 => ProtoType::Int64,
        Type::TYPE_UINT64 => ProtoType::Uint64,
        Type::TYPE_INT32 => ProtoType::Int32,
        Type::TYPE_FIXED64 => ProtoType::Fixed64,
        Type::TYPE_FIXED32 => ProtoType::Fixed32,
        Type::TYPE_BOOL => ProtoType::Bool,
        Type::TYPE_STRING => ProtoType::String,
        Type::TYPE_MESSAGE => ProtoType::Message(type_name()),
        Type::TYPE_BYTES => ProtoType::Bytes,
        Type::TYPE_UINT32 => ProtoType::Uint32,
        Type::TYPE_ENUM => ProtoType::Enum(type_name()),
        Type::TYPE_SFIXED32 => ProtoType::Sfixed32,
        Type::TYPE_SFIXED64 => ProtoType::Sfixed64,
        Type::TYPE_SINT32 => ProtoType::Sint32,
        Type::TYPE_SINT64 => ProtoType::Sint64,
        Type::TYPE_GROUP => {
            return Err(Error::ProtobufParse(
                "TYPE_GROUP is Proto2 syntax only and deprecated hence not supported".to_string(),
            ))
        }
    })
}

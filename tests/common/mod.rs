//! Programmatic descriptor builders shared by the integration tests.

#![allow(dead_code)]

use proto_breaking::compat::{Detector, Finding, FindingCategory, FindingStore};
use proto_breaking::model::FileSet;
use protobuf::CodedOutputStream;
use protobuf::Message as _;
use protobuf::descriptor::field_descriptor_proto::{Label, Type};
use protobuf::descriptor::source_code_info::Location;
use protobuf::descriptor::{
    DescriptorProto, EnumDescriptorProto, EnumValueDescriptorProto, FieldDescriptorProto,
    FileDescriptorProto, FileDescriptorSet, MethodDescriptorProto, OneofDescriptorProto,
    ServiceDescriptorProto,
};

pub const LRO_OPERATION: &str = ".google.longrunning.Operation";

pub fn encode(write: impl FnOnce(&mut CodedOutputStream<'_>) -> protobuf::Result<()>) -> Vec<u8> {
    let mut bytes = Vec::new();
    {
        let mut os = CodedOutputStream::vec(&mut bytes);
        write(&mut os).unwrap();
        os.flush().unwrap();
    }
    bytes
}

fn resource_payload(resource_type: &str, patterns: &[&str]) -> Vec<u8> {
    encode(|os| {
        os.write_string(1, resource_type)?;
        for pattern in patterns {
            os.write_string(2, pattern)?;
        }
        Ok(())
    })
}

// ========================================
// Files
// ========================================

pub fn file(name: &str, package: &str) -> FileDescriptorProto {
    let mut file = FileDescriptorProto::new();
    file.set_name(name.to_string());
    file.set_package(package.to_string());
    file.set_syntax("proto3".to_string());
    file
}

pub fn with_dependency(mut file: FileDescriptorProto, dependency: &str) -> FileDescriptorProto {
    file.dependency.push(dependency.to_string());
    file
}

pub fn with_messages(mut file: FileDescriptorProto, messages: Vec<DescriptorProto>) -> FileDescriptorProto {
    file.message_type.extend(messages);
    file
}

pub fn with_enums(mut file: FileDescriptorProto, enums: Vec<EnumDescriptorProto>) -> FileDescriptorProto {
    file.enum_type.extend(enums);
    file
}

pub fn with_services(mut file: FileDescriptorProto, services: Vec<ServiceDescriptorProto>) -> FileDescriptorProto {
    file.service.extend(services);
    file
}

pub fn with_ruby_package(mut file: FileDescriptorProto, value: &str) -> FileDescriptorProto {
    file.options.mut_or_insert_default().set_ruby_package(value.to_string());
    file
}

pub fn with_java_outer_classname(mut file: FileDescriptorProto, value: &str) -> FileDescriptorProto {
    file.options
        .mut_or_insert_default()
        .set_java_outer_classname(value.to_string());
    file
}

pub fn with_resource_definition(
    mut file: FileDescriptorProto,
    resource_type: &str,
    patterns: &[&str],
) -> FileDescriptorProto {
    file.options
        .mut_or_insert_default()
        .mut_unknown_fields()
        .add_length_delimited(1053, resource_payload(resource_type, patterns));
    file
}

/// Records a 1-based `line` and leading comment for the declaration at `path`.
pub fn with_location(mut file: FileDescriptorProto, path: &[i32], line: i32, leading: &str) -> FileDescriptorProto {
    let mut location = Location::new();
    location.path = path.to_vec();
    location.span = vec![line - 1, 0, 1];
    if !leading.is_empty() {
        location.set_leading_comments(leading.to_string());
    }
    file.source_code_info.mut_or_insert_default().location.push(location);
    file
}

pub fn descriptor_set(files: Vec<FileDescriptorProto>) -> FileDescriptorSet {
    let mut set = FileDescriptorSet::new();
    set.file = files;
    set
}

// ========================================
// Messages and fields
// ========================================

pub fn message(name: &str, fields: Vec<FieldDescriptorProto>) -> DescriptorProto {
    let mut message = DescriptorProto::new();
    message.set_name(name.to_string());
    message.field = fields;
    message
}

pub fn with_nested(mut message: DescriptorProto, nested: DescriptorProto) -> DescriptorProto {
    message.nested_type.push(nested);
    message
}

pub fn with_resource(mut message: DescriptorProto, resource_type: &str, patterns: &[&str]) -> DescriptorProto {
    message
        .options
        .mut_or_insert_default()
        .mut_unknown_fields()
        .add_length_delimited(1053, resource_payload(resource_type, patterns));
    message
}

/// Declares a oneof and puts the fields with the given numbers into it.
pub fn with_oneof(mut message: DescriptorProto, name: &str, numbers: &[i32]) -> DescriptorProto {
    let index = message.oneof_decl.len() as i32;
    let mut oneof = OneofDescriptorProto::new();
    oneof.set_name(name.to_string());
    message.oneof_decl.push(oneof);
    for field in message.field.iter_mut().filter(|f| numbers.contains(&f.number())) {
        field.set_oneof_index(index);
    }
    message
}

/// Marks a field proto3 `optional`, with its synthetic oneof.
pub fn with_proto3_optional(mut message: DescriptorProto, number: i32) -> DescriptorProto {
    let Some(name) = message
        .field
        .iter()
        .find(|f| f.number() == number)
        .map(|f| format!("_{}", f.name()))
    else {
        return message;
    };
    message = with_oneof(message, &name, &[number]);
    for field in message.field.iter_mut().filter(|f| f.number() == number) {
        field.set_proto3_optional(true);
    }
    message
}

/// A `map<key, value>` field plus the entry message it needs.
pub fn with_map_field(
    mut message: DescriptorProto,
    message_full_name: &str,
    name: &str,
    number: i32,
    key: FieldDescriptorProto,
    value: FieldDescriptorProto,
) -> DescriptorProto {
    let entry_name = format!(
        "{}Entry",
        name.split('_')
            .map(|part| {
                let mut chars = part.chars();
                match chars.next() {
                    Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                    None => String::new(),
                }
            })
            .collect::<String>()
    );
    let mut entry = DescriptorProto::new();
    entry.set_name(entry_name.clone());
    entry.options.mut_or_insert_default().set_map_entry(true);
    entry.field = vec![key, value];
    message.nested_type.push(entry);

    let field = repeated(message_field(name, number, &format!("{message_full_name}.{entry_name}")));
    message.field.push(field);
    message
}

pub fn scalar(name: &str, number: i32, type_: Type) -> FieldDescriptorProto {
    let mut field = FieldDescriptorProto::new();
    field.set_name(name.to_string());
    field.set_number(number);
    field.set_label(Label::LABEL_OPTIONAL);
    field.set_type(type_);
    field
}

pub fn string_field(name: &str, number: i32) -> FieldDescriptorProto {
    scalar(name, number, Type::TYPE_STRING)
}

pub fn int32_field(name: &str, number: i32) -> FieldDescriptorProto {
    scalar(name, number, Type::TYPE_INT32)
}

pub fn message_field(name: &str, number: i32, type_name: &str) -> FieldDescriptorProto {
    let mut field = scalar(name, number, Type::TYPE_MESSAGE);
    field.set_type_name(type_name.to_string());
    field
}

pub fn enum_field(name: &str, number: i32, type_name: &str) -> FieldDescriptorProto {
    let mut field = scalar(name, number, Type::TYPE_ENUM);
    field.set_type_name(type_name.to_string());
    field
}

pub fn repeated(mut field: FieldDescriptorProto) -> FieldDescriptorProto {
    field.set_label(Label::LABEL_REPEATED);
    field
}

pub fn required(mut field: FieldDescriptorProto) -> FieldDescriptorProto {
    field
        .options
        .mut_or_insert_default()
        .mut_unknown_fields()
        .add_varint(1052, 2);
    field
}

pub fn with_reference_type(mut field: FieldDescriptorProto, resource_type: &str) -> FieldDescriptorProto {
    field
        .options
        .mut_or_insert_default()
        .mut_unknown_fields()
        .add_length_delimited(1055, encode(|os| os.write_string(1, resource_type)));
    field
}

pub fn with_reference_child_type(mut field: FieldDescriptorProto, child_type: &str) -> FieldDescriptorProto {
    field
        .options
        .mut_or_insert_default()
        .mut_unknown_fields()
        .add_length_delimited(1055, encode(|os| os.write_string(2, child_type)));
    field
}

pub fn with_format(mut field: FieldDescriptorProto, format: i32) -> FieldDescriptorProto {
    field
        .options
        .mut_or_insert_default()
        .mut_unknown_fields()
        .add_length_delimited(291403980, encode(|os| os.write_int32(1, format)));
    field
}

// ========================================
// Enums
// ========================================

pub fn enum_type(name: &str, values: &[(&str, i32)]) -> EnumDescriptorProto {
    let mut e = EnumDescriptorProto::new();
    e.set_name(name.to_string());
    for (value_name, number) in values {
        let mut value = EnumValueDescriptorProto::new();
        value.set_name(value_name.to_string());
        value.set_number(*number);
        e.value.push(value);
    }
    e
}

// ========================================
// Services
// ========================================

pub fn service(name: &str, methods: Vec<MethodDescriptorProto>) -> ServiceDescriptorProto {
    let mut service = ServiceDescriptorProto::new();
    service.set_name(name.to_string());
    service.method = methods;
    service
}

pub fn with_default_host(mut service: ServiceDescriptorProto, host: &str) -> ServiceDescriptorProto {
    service
        .options
        .mut_or_insert_default()
        .mut_unknown_fields()
        .add_length_delimited(1049, host.as_bytes().to_vec());
    service
}

pub fn with_oauth_scopes(mut service: ServiceDescriptorProto, scopes: &str) -> ServiceDescriptorProto {
    service
        .options
        .mut_or_insert_default()
        .mut_unknown_fields()
        .add_length_delimited(1050, scopes.as_bytes().to_vec());
    service
}

pub fn method(name: &str, input: &str, output: &str) -> MethodDescriptorProto {
    let mut method = MethodDescriptorProto::new();
    method.set_name(name.to_string());
    method.set_input_type(input.to_string());
    method.set_output_type(output.to_string());
    method
}

pub fn streaming(mut method: MethodDescriptorProto, client: bool, server: bool) -> MethodDescriptorProto {
    method.set_client_streaming(client);
    method.set_server_streaming(server);
    method
}

pub fn with_operation_info(
    mut method: MethodDescriptorProto,
    response_type: &str,
    metadata_type: &str,
) -> MethodDescriptorProto {
    method
        .options
        .mut_or_insert_default()
        .mut_unknown_fields()
        .add_length_delimited(
            1049,
            encode(|os| {
                os.write_string(1, response_type)?;
                os.write_string(2, metadata_type)
            }),
        );
    method
}

/// `verb` is one of get, put, post, delete, patch
pub fn with_http(mut method: MethodDescriptorProto, verb: &str, uri: &str, body: &str) -> MethodDescriptorProto {
    let number = match verb {
        "get" => 2,
        "put" => 3,
        "post" => 4,
        "delete" => 5,
        _ => 6,
    };
    method
        .options
        .mut_or_insert_default()
        .mut_unknown_fields()
        .add_length_delimited(
            72295728,
            encode(|os| {
                os.write_string(number, uri)?;
                if !body.is_empty() {
                    os.write_string(7, body)?;
                }
                Ok(())
            }),
        );
    method
}

pub fn with_method_signature(mut method: MethodDescriptorProto, signature: &str) -> MethodDescriptorProto {
    method
        .options
        .mut_or_insert_default()
        .mut_unknown_fields()
        .add_length_delimited(1051, signature.as_bytes().to_vec());
    method
}

// ========================================
// Running the detector
// ========================================

pub fn detect(original: &FileDescriptorSet, update: &FileDescriptorSet) -> FindingStore {
    let original = FileSet::new(original).unwrap();
    let update = FileSet::new(update).unwrap();
    Detector::new().detect(&original, &update)
}

pub fn categories(findings: &[&Finding]) -> Vec<FindingCategory> {
    findings.iter().map(|f| f.category).collect()
}

pub fn count(findings: &[&Finding], category: FindingCategory) -> usize {
    findings.iter().filter(|f| f.category == category).count()
}

//! Messages, fields and oneofs.

use crate::error::Result;
use crate::model::annotations::{self, FieldFormat, ResourceDescriptor, ResourceReference};
use crate::model::enums::Enum;
use crate::model::location::{LocationIndex, SourceLocation};
use crate::model::registry::ResourceRegistry;
use crate::model::{FileContext, child_path, tag};
use protobuf::Message as _;
use protobuf::descriptor::field_descriptor_proto::{Label, Type};
use protobuf::descriptor::{DescriptorProto, FieldDescriptorProto};
use std::collections::BTreeMap;
use std::sync::Arc;

/// A oneof a field belongs to. Proto3 `optional` fields live in a
/// synthetic single-member oneof.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Oneof {
    name: String,
    synthetic: bool,
}

impl Oneof {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_synthetic(&self) -> bool {
        self.synthetic
    }
}

/// Key and value fields of the synthesized entry message behind a map field.
#[derive(Debug, Clone)]
pub struct MapEntryType<'a> {
    pub key: Field<'a>,
    pub value: Field<'a>,
}

impl MapEntryType<'_> {
    pub fn display(&self) -> String {
        format!("map<{}, {}>", self.key.type_display(), self.value.type_display())
    }
}

/// The message a field is being built for.
struct Scope<'s, 'a> {
    message: &'a DescriptorProto,
    full_name: &'s str,
    path: &'s [i32],
    resource: Option<&'s ResourceDescriptor>,
}

// ========================================
// Field
// ========================================

#[derive(Debug, Clone)]
pub struct Field<'a> {
    proto: &'a FieldDescriptorProto,
    message_name: String,
    path: Vec<i32>,
    locations: Arc<LocationIndex>,
    registry: Arc<ResourceRegistry>,
    proto_type: String,
    required: bool,
    oneof: Option<Oneof>,
    map_entry_type: Option<Box<MapEntryType<'a>>>,
    resource_reference: Option<ResourceReference>,
    message_resource: Option<ResourceDescriptor>,
    format: FieldFormat,
}

impl<'a> Field<'a> {
    fn new(
        proto: &'a FieldDescriptorProto,
        path: Vec<i32>,
        scope: &Scope<'_, 'a>,
        cx: &FileContext<'a>,
    ) -> Result<Self> {
        let file = cx.file_name();
        let options = proto.options.get_or_default().unknown_fields();

        let proto_type = format!("{:?}", proto.type_());
        let proto_type = proto_type
            .strip_prefix("TYPE_")
            .unwrap_or(&proto_type)
            .to_lowercase();

        let oneof = match proto.oneof_index {
            Some(index) => scope.message.oneof_decl.get(index as usize).map(|decl| Oneof {
                name: decl.name().to_string(),
                synthetic: proto.proto3_optional(),
            }),
            None => None,
        };

        let map_entry_type = Self::map_entry_type_of(proto, scope, cx)?.map(Box::new);

        Ok(Self {
            proto,
            message_name: scope.full_name.to_string(),
            path,
            locations: Arc::clone(&cx.locations),
            registry: Arc::clone(&cx.registry),
            proto_type,
            required: annotations::field_behaviors(options, file)?
                .contains(&annotations::FIELD_BEHAVIOR_REQUIRED),
            oneof,
            map_entry_type,
            resource_reference: annotations::resource_reference(options, file)?,
            message_resource: scope.resource.cloned(),
            format: annotations::field_format(options, file)?,
        })
    }

    /// A field is a map iff its type is a sibling nested entry message.
    fn map_entry_type_of(
        proto: &'a FieldDescriptorProto,
        scope: &Scope<'_, 'a>,
        cx: &FileContext<'a>,
    ) -> Result<Option<MapEntryType<'a>>> {
        if proto.type_() != Type::TYPE_MESSAGE || proto.label() != Label::LABEL_REPEATED {
            return Ok(None);
        }
        let Some((index, entry)) = scope.message.nested_type.iter().enumerate().find(|(_, nested)| {
            nested.options.get_or_default().map_entry()
                && proto.type_name() == format!("{}.{}", scope.full_name, nested.name())
        }) else {
            return Ok(None);
        };

        let entry_name = format!("{}.{}", scope.full_name, entry.name());
        let entry_path = child_path(scope.path, tag::MESSAGE_NESTED, index);
        let entry_scope = Scope {
            message: entry,
            full_name: &entry_name,
            path: &entry_path,
            resource: None,
        };
        let field_numbered = |number: i32| -> Result<Option<Field<'a>>> {
            entry
                .field
                .iter()
                .enumerate()
                .find(|(_, f)| f.number() == number)
                .map(|(i, f)| {
                    Field::new(f, child_path(&entry_path, tag::MESSAGE_FIELD, i), &entry_scope, cx)
                })
                .transpose()
        };
        match (field_numbered(1)?, field_numbered(2)?) {
            (Some(key), Some(value)) => Ok(Some(MapEntryType { key, value })),
            _ => Ok(None),
        }
    }

    pub fn name(&self) -> &'a str {
        self.proto.name()
    }

    pub fn number(&self) -> i32 {
        self.proto.number()
    }

    /// Full name of the message declaring this field
    pub fn message_name(&self) -> &str {
        &self.message_name
    }

    pub fn path(&self) -> &[i32] {
        &self.path
    }

    pub fn repeated(&self) -> bool {
        self.proto.label() == Label::LABEL_REPEATED
    }

    /// Whether `google.api.field_behavior` lists REQUIRED
    pub fn required(&self) -> bool {
        self.required
    }

    /// Lower-cased type kind, e.g. `int32`, `message`, `enum`
    pub fn proto_type(&self) -> &str {
        &self.proto_type
    }

    pub fn is_primitive_type(&self) -> bool {
        !matches!(self.proto_type.as_str(), "enum" | "message" | "group")
    }

    /// Fully-qualified referenced type, only for non-primitive fields
    pub fn type_name(&self) -> Option<&'a str> {
        if self.is_primitive_type() {
            None
        } else {
            Some(self.proto.type_name())
        }
    }

    pub fn map_entry_type(&self) -> Option<&MapEntryType<'a>> {
        self.map_entry_type.as_deref()
    }

    /// The type as a reader would write it: `map<k, v>`, a message/enum name
    /// or a scalar kind.
    pub fn type_display(&self) -> String {
        match (&self.map_entry_type, self.type_name()) {
            (Some(map), _) => map.display(),
            (None, Some(type_name)) => type_name.to_string(),
            (None, None) => self.proto_type.clone(),
        }
    }

    pub fn oneof(&self) -> Option<&Oneof> {
        self.oneof.as_ref()
    }

    pub fn proto3_optional(&self) -> bool {
        self.proto.proto3_optional()
    }

    pub fn resource_reference(&self) -> Option<&ResourceReference> {
        self.resource_reference.as_ref()
    }

    /// The `google.api.resource` of the message declaring this field
    pub fn message_resource(&self) -> Option<&ResourceDescriptor> {
        self.message_resource.as_ref()
    }

    pub fn registry(&self) -> &ResourceRegistry {
        &self.registry
    }

    pub fn format(&self) -> FieldFormat {
        self.format
    }

    // ----------------------------------------
    // Locations
    // ----------------------------------------

    pub fn location(&self) -> SourceLocation {
        self.locations.lookup(&self.path)
    }

    pub fn name_location(&self) -> SourceLocation {
        self.locations.lookup_within(&self.path, &[tag::FIELD_NAME])
    }

    pub fn label_location(&self) -> SourceLocation {
        self.locations.lookup_within(&self.path, &[tag::FIELD_LABEL])
    }

    pub fn type_location(&self) -> SourceLocation {
        let type_tag = if self.is_primitive_type() {
            tag::FIELD_TYPE
        } else {
            tag::FIELD_TYPE_NAME
        };
        self.locations.lookup_within(&self.path, &[type_tag])
    }

    pub fn behavior_location(&self) -> SourceLocation {
        self.locations.lookup_within(
            &self.path,
            &[tag::FIELD_OPTIONS, annotations::extension::FIELD_BEHAVIOR as i32],
        )
    }

    pub fn resource_reference_location(&self) -> SourceLocation {
        self.locations.lookup_within(
            &self.path,
            &[tag::FIELD_OPTIONS, annotations::extension::RESOURCE_REFERENCE as i32],
        )
    }

    pub fn format_location(&self) -> SourceLocation {
        self.locations.lookup_within(
            &self.path,
            &[tag::FIELD_OPTIONS, annotations::extension::FIELD_INFO as i32],
        )
    }
}

// ========================================
// Message
// ========================================

#[derive(Debug)]
pub struct Message<'a> {
    proto: &'a DescriptorProto,
    full_name: String,
    path: Vec<i32>,
    locations: Arc<LocationIndex>,
    registry: Arc<ResourceRegistry>,
    resource: Option<ResourceDescriptor>,
    fields: BTreeMap<i32, Field<'a>>,
    nested_messages: BTreeMap<String, Arc<Message<'a>>>,
    nested_enums: BTreeMap<String, Arc<Enum<'a>>>,
}

impl<'a> Message<'a> {
    /// Builds a message and, recursively, everything nested in it.
    /// `parent_name` is the full name of the enclosing scope.
    pub(crate) fn new(
        proto: &'a DescriptorProto,
        parent_name: &str,
        path: Vec<i32>,
        cx: &FileContext<'a>,
    ) -> Result<Self> {
        let full_name = format!("{parent_name}.{}", proto.name());
        let resource =
            annotations::resource(proto.options.get_or_default().unknown_fields(), cx.file_name())?;

        let scope = Scope {
            message: proto,
            full_name: &full_name,
            path: &path,
            resource: resource.as_ref(),
        };
        let mut fields = BTreeMap::new();
        for (i, field) in proto.field.iter().enumerate() {
            let field = Field::new(field, child_path(&path, tag::MESSAGE_FIELD, i), &scope, cx)?;
            fields.insert(field.number(), field);
        }

        let mut nested_messages = BTreeMap::new();
        for (i, nested) in proto.nested_type.iter().enumerate() {
            // Map entries are surfaced through `Field::map_entry_type` instead
            if nested.options.get_or_default().map_entry() {
                continue;
            }
            let nested = Message::new(
                nested,
                &full_name,
                child_path(&path, tag::MESSAGE_NESTED, i),
                cx,
            )?;
            nested_messages.insert(nested.name().to_string(), Arc::new(nested));
        }

        let nested_enums = proto
            .enum_type
            .iter()
            .enumerate()
            .map(|(i, e)| {
                let nested = Enum::new(e, &full_name, child_path(&path, tag::MESSAGE_ENUM, i), cx);
                (nested.name().to_string(), Arc::new(nested))
            })
            .collect();

        Ok(Self {
            proto,
            full_name,
            path,
            locations: Arc::clone(&cx.locations),
            registry: Arc::clone(&cx.registry),
            resource,
            fields,
            nested_messages,
            nested_enums,
        })
    }

    pub fn name(&self) -> &'a str {
        self.proto.name()
    }

    /// Fully-qualified name with a leading dot, e.g. `.google.example.v1.Book`
    pub fn full_name(&self) -> &str {
        &self.full_name
    }

    pub fn path(&self) -> &[i32] {
        &self.path
    }

    pub fn resource(&self) -> Option<&ResourceDescriptor> {
        self.resource.as_ref()
    }

    pub fn registry(&self) -> &ResourceRegistry {
        &self.registry
    }

    /// Fields keyed by number
    pub fn fields(&self) -> &BTreeMap<i32, Field<'a>> {
        &self.fields
    }

    /// Nested messages keyed by name, map entries excluded
    pub fn nested_messages(&self) -> &BTreeMap<String, Arc<Message<'a>>> {
        &self.nested_messages
    }

    pub fn nested_enums(&self) -> &BTreeMap<String, Arc<Enum<'a>>> {
        &self.nested_enums
    }

    pub fn location(&self) -> SourceLocation {
        self.locations.lookup(&self.path)
    }

    pub fn resource_location(&self) -> SourceLocation {
        self.locations.lookup_within(
            &self.path,
            &[tag::MESSAGE_OPTIONS, annotations::extension::RESOURCE as i32],
        )
    }

    /// Full names of every message or enum referenced by fields of this
    /// message or of anything nested in it, map keys and values included.
    pub fn referenced_types(&self) -> Vec<&'a str> {
        let mut referenced = Vec::new();
        let mut pending: Vec<&Message<'a>> = vec![self];
        while let Some(message) = pending.pop() {
            for field in message.fields.values() {
                match field.map_entry_type() {
                    Some(map) => {
                        referenced.extend(map.key.type_name());
                        referenced.extend(map.value.type_name());
                    }
                    None => referenced.extend(field.type_name()),
                }
            }
            pending.extend(message.nested_messages.values().map(Arc::as_ref));
        }
        referenced
    }
}

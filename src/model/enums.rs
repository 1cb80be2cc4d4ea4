//! Enums and enum values.

use crate::model::location::{LocationIndex, SourceLocation};
use crate::model::{FileContext, child_path, tag};
use protobuf::descriptor::{EnumDescriptorProto, EnumValueDescriptorProto};
use std::collections::BTreeMap;
use std::sync::Arc;

#[derive(Debug, Clone)]
pub struct EnumValue<'a> {
    proto: &'a EnumValueDescriptorProto,
    enum_name: String,
    path: Vec<i32>,
    locations: Arc<LocationIndex>,
}

impl<'a> EnumValue<'a> {
    pub fn name(&self) -> &'a str {
        self.proto.name()
    }

    pub fn number(&self) -> i32 {
        self.proto.number()
    }

    /// Full name of the enclosing enum
    pub fn enum_name(&self) -> &str {
        &self.enum_name
    }

    pub fn location(&self) -> SourceLocation {
        self.locations.lookup(&self.path)
    }
}

#[derive(Debug)]
pub struct Enum<'a> {
    proto: &'a EnumDescriptorProto,
    full_name: String,
    path: Vec<i32>,
    locations: Arc<LocationIndex>,
    values: BTreeMap<i32, EnumValue<'a>>,
}

impl<'a> Enum<'a> {
    pub(crate) fn new(
        proto: &'a EnumDescriptorProto,
        parent_name: &str,
        path: Vec<i32>,
        cx: &FileContext<'a>,
    ) -> Self {
        let full_name = format!("{parent_name}.{}", proto.name());
        let mut values = BTreeMap::new();
        for (i, value) in proto.value.iter().enumerate() {
            // With allow_alias the first declaration of a number is canonical
            values.entry(value.number()).or_insert_with(|| EnumValue {
                proto: value,
                enum_name: full_name.clone(),
                path: child_path(&path, tag::ENUM_VALUE, i),
                locations: Arc::clone(&cx.locations),
            });
        }
        Self {
            proto,
            full_name,
            path,
            locations: Arc::clone(&cx.locations),
            values,
        }
    }

    pub fn name(&self) -> &'a str {
        self.proto.name()
    }

    pub fn full_name(&self) -> &str {
        &self.full_name
    }

    /// Values keyed by number
    pub fn values(&self) -> &BTreeMap<i32, EnumValue<'a>> {
        &self.values
    }

    pub fn location(&self) -> SourceLocation {
        self.locations.lookup(&self.path)
    }
}

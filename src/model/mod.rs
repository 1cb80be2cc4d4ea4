//! Annotation-aware semantic view over a compiled descriptor set.
//!
//! Every node wraps a raw descriptor by reference and exposes the derived
//! properties the comparator needs, each paired with a source location.
//! Nodes are built once per tree and never mutated.

pub mod annotations;
pub mod enums;
pub mod file_set;
pub mod location;
pub mod message;
pub mod registry;
pub mod service;

pub use annotations::{FieldFormat, HttpAnnotation, OperationInfo, ResourceDescriptor, ResourceReference};
pub use enums::{Enum, EnumValue};
pub use file_set::FileSet;
pub use location::{LocationIndex, SourceLocation};
pub use message::{Field, MapEntryType, Message, Oneof};
pub use registry::{ResourceEntry, ResourceRegistry};
pub use service::{Method, Service};

use protobuf::descriptor::FileDescriptorProto;
use std::sync::Arc;

/// Per-file state shared by every node built from that file.
#[derive(Debug, Clone)]
pub(crate) struct FileContext<'a> {
    pub file: &'a FileDescriptorProto,
    pub locations: Arc<LocationIndex>,
    pub registry: Arc<ResourceRegistry>,
}

impl<'a> FileContext<'a> {
    pub fn file_name(&self) -> &'a str {
        self.file.name()
    }

    /// Full-name prefix for top-level declarations, e.g. `.google.example.v1`
    pub fn scope(&self) -> String {
        match self.file.package() {
            "" => String::new(),
            package => format!(".{package}"),
        }
    }
}

/// Descriptor path tags used to address declarations.
pub(crate) mod tag {
    pub const FILE_MESSAGE: i32 = 4;
    pub const FILE_ENUM: i32 = 5;
    pub const FILE_SERVICE: i32 = 6;
    pub const FILE_OPTIONS: i32 = 8;

    pub const MESSAGE_FIELD: i32 = 2;
    pub const MESSAGE_NESTED: i32 = 3;
    pub const MESSAGE_ENUM: i32 = 4;
    pub const MESSAGE_OPTIONS: i32 = 7;

    pub const FIELD_NAME: i32 = 1;
    pub const FIELD_LABEL: i32 = 4;
    pub const FIELD_TYPE: i32 = 5;
    pub const FIELD_TYPE_NAME: i32 = 6;
    pub const FIELD_OPTIONS: i32 = 8;

    pub const ENUM_VALUE: i32 = 2;

    pub const SERVICE_METHOD: i32 = 2;
    pub const SERVICE_OPTIONS: i32 = 3;

    pub const METHOD_INPUT: i32 = 2;
    pub const METHOD_OUTPUT: i32 = 3;
    pub const METHOD_OPTIONS: i32 = 4;
    pub const METHOD_CLIENT_STREAMING: i32 = 5;
    pub const METHOD_SERVER_STREAMING: i32 = 6;
}

pub(crate) fn child_path(parent: &[i32], tag: i32, index: usize) -> Vec<i32> {
    let mut path = parent.to_vec();
    path.push(tag);
    path.push(index as i32);
    path
}

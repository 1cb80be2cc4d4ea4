//! Decoding of the `google.api` and `google.longrunning` option extensions.
//!
//! Descriptor sets carry these extensions as unknown fields on the
//! `*Options` messages. Only the handful of annotations the comparator
//! understands are decoded; everything else is ignored.

use crate::error::{DetectorError, Result};
use protobuf::{CodedInputStream, UnknownFields, UnknownValueRef};
use std::fmt;

/// Extension field numbers, per extendee.
pub mod extension {
    /// `google.api.resource_definition` on `FileOptions`
    pub const RESOURCE_DEFINITION: u32 = 1053;
    /// `google.api.resource` on `MessageOptions`
    pub const RESOURCE: u32 = 1053;
    /// `google.api.field_behavior` on `FieldOptions`
    pub const FIELD_BEHAVIOR: u32 = 1052;
    /// `google.api.resource_reference` on `FieldOptions`
    pub const RESOURCE_REFERENCE: u32 = 1055;
    /// `google.api.field_info` on `FieldOptions`
    pub const FIELD_INFO: u32 = 291403980;
    /// `google.api.default_host` on `ServiceOptions`
    pub const DEFAULT_HOST: u32 = 1049;
    /// `google.api.oauth_scopes` on `ServiceOptions`
    pub const OAUTH_SCOPES: u32 = 1050;
    /// `google.api.http` on `MethodOptions`
    pub const HTTP: u32 = 72295728;
    /// `google.api.method_signature` on `MethodOptions`
    pub const METHOD_SIGNATURE: u32 = 1051;
    /// `google.longrunning.operation_info` on `MethodOptions`
    pub const OPERATION_INFO: u32 = 1049;
}

/// `google.api.FieldBehavior.REQUIRED`
pub const FIELD_BEHAVIOR_REQUIRED: i32 = 2;

// ========================================
// Annotation Values
// ========================================

/// A `google.api.ResourceDescriptor`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResourceDescriptor {
    pub resource_type: String,
    pub patterns: Vec<String>,
}

/// A `google.api.ResourceReference`, reduced to whichever form is set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResourceReference {
    Type(String),
    ChildType(String),
}

impl ResourceReference {
    /// The referenced resource type, regardless of form
    pub fn resource_type(&self) -> &str {
        match self {
            ResourceReference::Type(t) | ResourceReference::ChildType(t) => t,
        }
    }
}

/// The effective binding of a `google.api.http` rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpAnnotation {
    pub method: String,
    pub uri: String,
    pub body: Option<String>,
}

/// `google.longrunning.OperationInfo`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OperationInfo {
    pub response_type: String,
    pub metadata_type: String,
}

/// `google.api.FieldInfo.Format`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FieldFormat {
    #[default]
    Unspecified,
    Uuid4,
    Ipv4,
    Ipv6,
    Ipv4OrIpv6,
    Other(i32),
}

impl FieldFormat {
    pub fn from_i32(value: i32) -> Self {
        match value {
            0 => FieldFormat::Unspecified,
            1 => FieldFormat::Uuid4,
            2 => FieldFormat::Ipv4,
            3 => FieldFormat::Ipv6,
            4 => FieldFormat::Ipv4OrIpv6,
            other => FieldFormat::Other(other),
        }
    }
}

impl fmt::Display for FieldFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldFormat::Unspecified => write!(f, "FORMAT_UNSPECIFIED"),
            FieldFormat::Uuid4 => write!(f, "UUID4"),
            FieldFormat::Ipv4 => write!(f, "IPV4"),
            FieldFormat::Ipv6 => write!(f, "IPV6"),
            FieldFormat::Ipv4OrIpv6 => write!(f, "IPV4_OR_IPV6"),
            FieldFormat::Other(value) => write!(f, "{value}"),
        }
    }
}

// ========================================
// Wire Helpers
// ========================================

/// Walks the fields of an encoded message. `visit` gets the field number and
/// the stream positioned at the value; returning `false` skips the value.
fn walk_fields<F>(bytes: &[u8], mut visit: F) -> protobuf::Result<()>
where
    F: FnMut(u32, &mut CodedInputStream<'_>) -> protobuf::Result<bool>,
{
    let mut is = CodedInputStream::from_bytes(bytes);
    let mut skipped = UnknownFields::new();
    while let Some(tag) = is.read_raw_tag_or_eof()? {
        if !visit(tag >> 3, &mut is)? {
            protobuf::rt::read_unknown_or_skip_group(tag, &mut is, &mut skipped)?;
        }
    }
    Ok(())
}

fn payloads(fields: &UnknownFields, number: u32) -> Vec<&[u8]> {
    fields
        .iter()
        .filter_map(|(n, value)| match value {
            UnknownValueRef::LengthDelimited(bytes) if n == number => Some(bytes),
            _ => None,
        })
        .collect()
}

/// Singular message extensions merge across occurrences, which for the
/// wire format is plain concatenation.
fn merged_payload(fields: &UnknownFields, number: u32) -> Option<Vec<u8>> {
    let parts = payloads(fields, number);
    if parts.is_empty() {
        None
    } else {
        Some(parts.concat())
    }
}

fn decode_error(file: &str, annotation: &str, error: impl fmt::Display) -> DetectorError {
    DetectorError::malformed(file, format!("cannot decode {annotation}: {error}"))
}

fn utf8(file: &str, annotation: &str, bytes: &[u8]) -> Result<String> {
    std::str::from_utf8(bytes)
        .map(str::to_string)
        .map_err(|e| decode_error(file, annotation, e))
}

fn decode_resource(bytes: &[u8]) -> protobuf::Result<ResourceDescriptor> {
    let mut resource = ResourceDescriptor::default();
    walk_fields(bytes, |number, is| {
        match number {
            1 => resource.resource_type = is.read_string()?,
            2 => resource.patterns.push(is.read_string()?),
            _ => return Ok(false),
        }
        Ok(true)
    })?;
    Ok(resource)
}

// ========================================
// Extraction
// ========================================

/// Every `google.api.resource_definition` on a file, in declaration order.
pub fn resource_definitions(fields: &UnknownFields, file: &str) -> Result<Vec<ResourceDescriptor>> {
    payloads(fields, extension::RESOURCE_DEFINITION)
        .into_iter()
        .map(|bytes| {
            decode_resource(bytes)
                .map_err(|e| decode_error(file, "google.api.resource_definition", e))
        })
        .collect()
}

/// The `google.api.resource` annotation of a message.
pub fn resource(fields: &UnknownFields, file: &str) -> Result<Option<ResourceDescriptor>> {
    merged_payload(fields, extension::RESOURCE)
        .map(|bytes| {
            decode_resource(&bytes).map_err(|e| decode_error(file, "google.api.resource", e))
        })
        .transpose()
}

pub fn resource_reference(fields: &UnknownFields, file: &str) -> Result<Option<ResourceReference>> {
    let Some(bytes) = merged_payload(fields, extension::RESOURCE_REFERENCE) else {
        return Ok(None);
    };
    let mut resource_type = String::new();
    let mut child_type = String::new();
    walk_fields(&bytes, |number, is| {
        match number {
            1 => resource_type = is.read_string()?,
            2 => child_type = is.read_string()?,
            _ => return Ok(false),
        }
        Ok(true)
    })
    .map_err(|e| decode_error(file, "google.api.resource_reference", e))?;

    Ok(if !resource_type.is_empty() {
        Some(ResourceReference::Type(resource_type))
    } else if !child_type.is_empty() {
        Some(ResourceReference::ChildType(child_type))
    } else {
        None
    })
}

/// All `google.api.field_behavior` values, packed or not.
pub fn field_behaviors(fields: &UnknownFields, file: &str) -> Result<Vec<i32>> {
    let mut behaviors = Vec::new();
    for (number, value) in fields.iter() {
        if number != extension::FIELD_BEHAVIOR {
            continue;
        }
        match value {
            UnknownValueRef::Varint(v) => behaviors.push(v as i32),
            UnknownValueRef::LengthDelimited(bytes) => {
                let mut is = CodedInputStream::from_bytes(bytes);
                while !is
                    .eof()
                    .map_err(|e| decode_error(file, "google.api.field_behavior", e))?
                {
                    behaviors.push(
                        is.read_int32()
                            .map_err(|e| decode_error(file, "google.api.field_behavior", e))?,
                    );
                }
            }
            _ => {
                return Err(decode_error(
                    file,
                    "google.api.field_behavior",
                    "unexpected wire type",
                ));
            }
        }
    }
    Ok(behaviors)
}

pub fn field_format(fields: &UnknownFields, file: &str) -> Result<FieldFormat> {
    let Some(bytes) = merged_payload(fields, extension::FIELD_INFO) else {
        return Ok(FieldFormat::Unspecified);
    };
    let mut format = 0;
    walk_fields(&bytes, |number, is| {
        if number == 1 {
            format = is.read_int32()?;
            return Ok(true);
        }
        Ok(false)
    })
    .map_err(|e| decode_error(file, "google.api.field_info", e))?;
    Ok(FieldFormat::from_i32(format))
}

pub fn default_host(fields: &UnknownFields, file: &str) -> Result<Option<String>> {
    match payloads(fields, extension::DEFAULT_HOST).last() {
        Some(bytes) => Ok(Some(utf8(file, "google.api.default_host", bytes)?)),
        None => Ok(None),
    }
}

/// Scopes from the comma-separated `google.api.oauth_scopes` string.
pub fn oauth_scopes(fields: &UnknownFields, file: &str) -> Result<Vec<String>> {
    let Some(bytes) = payloads(fields, extension::OAUTH_SCOPES).last().copied() else {
        return Ok(Vec::new());
    };
    Ok(utf8(file, "google.api.oauth_scopes", bytes)?
        .split(',')
        .map(str::trim)
        .filter(|scope| !scope.is_empty())
        .map(str::to_string)
        .collect())
}

pub fn method_signatures(fields: &UnknownFields, file: &str) -> Result<Vec<String>> {
    payloads(fields, extension::METHOD_SIGNATURE)
        .into_iter()
        .map(|bytes| utf8(file, "google.api.method_signature", bytes))
        .collect()
}

pub fn operation_info(fields: &UnknownFields, file: &str) -> Result<Option<OperationInfo>> {
    let Some(bytes) = merged_payload(fields, extension::OPERATION_INFO) else {
        return Ok(None);
    };
    let mut info = OperationInfo::default();
    walk_fields(&bytes, |number, is| {
        match number {
            1 => info.response_type = is.read_string()?,
            2 => info.metadata_type = is.read_string()?,
            _ => return Ok(false),
        }
        Ok(true)
    })
    .map_err(|e| decode_error(file, "google.longrunning.operation_info", e))?;
    Ok(Some(info))
}

/// The binding selected from a `google.api.http` rule: the first non-empty
/// of GET, PUT, POST, DELETE, PATCH, then custom.
pub fn http_annotation(fields: &UnknownFields, file: &str) -> Result<Option<HttpAnnotation>> {
    let Some(bytes) = merged_payload(fields, extension::HTTP) else {
        return Ok(None);
    };
    // get, put, post, delete, patch
    let mut verbs: [String; 5] = Default::default();
    let mut custom: Option<Vec<u8>> = None;
    let mut body = String::new();
    walk_fields(&bytes, |number, is| {
        match number {
            2..=6 => verbs[(number - 2) as usize] = is.read_string()?,
            7 => body = is.read_string()?,
            8 => custom = Some(is.read_bytes()?),
            _ => return Ok(false),
        }
        Ok(true)
    })
    .map_err(|e| decode_error(file, "google.api.http", e))?;

    let body = Some(body).filter(|b| !b.is_empty());
    const VERBS: [&str; 5] = ["get", "put", "post", "delete", "patch"];
    if let Some((verb, uri)) = VERBS
        .iter()
        .zip(verbs.iter())
        .find(|(_, uri)| !uri.is_empty())
    {
        return Ok(Some(HttpAnnotation {
            method: verb.to_string(),
            uri: uri.clone(),
            body,
        }));
    }

    let Some(custom) = custom else {
        return Ok(None);
    };
    let mut kind = String::new();
    let mut path = String::new();
    walk_fields(&custom, |number, is| {
        match number {
            1 => kind = is.read_string()?,
            2 => path = is.read_string()?,
            _ => return Ok(false),
        }
        Ok(true)
    })
    .map_err(|e| decode_error(file, "google.api.http", e))?;
    if path.is_empty() {
        return Ok(None);
    }
    Ok(Some(HttpAnnotation {
        method: kind,
        uri: path,
        body,
    }))
}

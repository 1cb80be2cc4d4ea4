//! Services and methods, with their API annotations.

use crate::error::{DetectorError, Result};
use crate::model::annotations::{self, HttpAnnotation, OperationInfo};
use crate::model::location::{LocationIndex, SourceLocation};
use crate::model::message::{Field, Message};
use crate::model::{FileContext, child_path, tag};
use protobuf::Message as _;
use protobuf::descriptor::{MethodDescriptorProto, ServiceDescriptorProto};
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

/// Output type that marks a method as long-running
pub const LRO_SENTINEL: &str = "google.longrunning.Operation";
/// Package that declares the sentinel; its own methods carry no operation_info
const LRO_PACKAGE: &str = "google.longrunning";

// ========================================
// Method
// ========================================

#[derive(Debug)]
pub struct Method<'a> {
    proto: &'a MethodDescriptorProto,
    service_name: String,
    package: &'a str,
    path: Vec<i32>,
    locations: Arc<LocationIndex>,
    longrunning: bool,
    paged_result_field: Option<Field<'a>>,
    method_signatures: Vec<String>,
    http_annotation: Option<HttpAnnotation>,
    lro_annotation: Option<OperationInfo>,
}

impl<'a> Method<'a> {
    pub(crate) fn new(
        proto: &'a MethodDescriptorProto,
        service_name: &str,
        path: Vec<i32>,
        cx: &FileContext<'a>,
        messages: &HashMap<String, Arc<Message<'a>>>,
    ) -> Result<Self> {
        let file = cx.file_name();
        let options = proto.options.get_or_default().unknown_fields();
        let longrunning = proto.output_type().ends_with(LRO_SENTINEL);

        let lro_annotation = if longrunning && cx.file.package() != LRO_PACKAGE {
            match annotations::operation_info(options, file)? {
                Some(info) if !info.response_type.is_empty() && !info.metadata_type.is_empty() => {
                    Some(info)
                }
                _ => {
                    return Err(DetectorError::malformed(
                        file,
                        format!(
                            "long-running method \"{}\" must set both response_type and metadata_type",
                            proto.name()
                        ),
                    ));
                }
            }
        } else {
            None
        };

        Ok(Self {
            proto,
            service_name: service_name.to_string(),
            package: cx.file.package(),
            path,
            locations: Arc::clone(&cx.locations),
            longrunning,
            paged_result_field: Self::paged_result_field_of(proto, longrunning, messages),
            method_signatures: annotations::method_signatures(options, file)?,
            http_annotation: annotations::http_annotation(options, file)?,
            lro_annotation,
        })
    }

    /// The page-size/page-token/next-page-token convention, with the
    /// repeated field numbered 1 of the response as the result field.
    fn paged_result_field_of(
        proto: &MethodDescriptorProto,
        longrunning: bool,
        messages: &HashMap<String, Arc<Message<'a>>>,
    ) -> Option<Field<'a>> {
        if proto.client_streaming() || proto.server_streaming() || longrunning {
            return None;
        }
        let request = messages.get(proto.input_type())?;
        let response = messages.get(proto.output_type())?;
        let has_field = |message: &Message<'a>, name: &str, proto_type: &str| {
            message
                .fields()
                .values()
                .any(|f| f.name() == name && f.proto_type() == proto_type)
        };
        if !has_field(request, "page_size", "int32")
            || !has_field(request, "page_token", "string")
            || !has_field(response, "next_page_token", "string")
        {
            return None;
        }
        response.fields().get(&1).filter(|f| f.repeated()).cloned()
    }

    pub fn name(&self) -> &'a str {
        self.proto.name()
    }

    /// Full name of the enclosing service
    pub fn service_name(&self) -> &str {
        &self.service_name
    }

    pub fn input_type(&self) -> &'a str {
        self.proto.input_type()
    }

    pub fn output_type(&self) -> &'a str {
        self.proto.output_type()
    }

    pub fn client_streaming(&self) -> bool {
        self.proto.client_streaming()
    }

    pub fn server_streaming(&self) -> bool {
        self.proto.server_streaming()
    }

    pub fn longrunning(&self) -> bool {
        self.longrunning
    }

    pub fn paged_result_field(&self) -> Option<&Field<'a>> {
        self.paged_result_field.as_ref()
    }

    pub fn method_signatures(&self) -> &[String] {
        &self.method_signatures
    }

    pub fn http_annotation(&self) -> Option<&HttpAnnotation> {
        self.http_annotation.as_ref()
    }

    pub fn lro_annotation(&self) -> Option<&OperationInfo> {
        self.lro_annotation.as_ref()
    }

    /// Full names of the long-running response and metadata types; bare
    /// names are resolved against the method's package.
    pub fn lro_type_names(&self) -> Vec<String> {
        let Some(info) = &self.lro_annotation else {
            return Vec::new();
        };
        [&info.response_type, &info.metadata_type]
            .into_iter()
            .map(|name| match (name.contains('.'), self.package) {
                (true, _) | (false, "") => format!(".{}", name.trim_start_matches('.')),
                (false, package) => format!(".{package}.{name}"),
            })
            .collect()
    }

    pub fn location(&self) -> SourceLocation {
        self.locations.lookup(&self.path)
    }

    pub fn input_location(&self) -> SourceLocation {
        self.locations.lookup_within(&self.path, &[tag::METHOD_INPUT])
    }

    pub fn output_location(&self) -> SourceLocation {
        self.locations.lookup_within(&self.path, &[tag::METHOD_OUTPUT])
    }

    pub fn client_streaming_location(&self) -> SourceLocation {
        self.locations
            .lookup_within(&self.path, &[tag::METHOD_CLIENT_STREAMING])
    }

    pub fn server_streaming_location(&self) -> SourceLocation {
        self.locations
            .lookup_within(&self.path, &[tag::METHOD_SERVER_STREAMING])
    }

    pub fn method_signature_location(&self) -> SourceLocation {
        self.option_location(annotations::extension::METHOD_SIGNATURE)
    }

    pub fn http_annotation_location(&self) -> SourceLocation {
        self.option_location(annotations::extension::HTTP)
    }

    pub fn lro_annotation_location(&self) -> SourceLocation {
        self.option_location(annotations::extension::OPERATION_INFO)
    }

    fn option_location(&self, extension: u32) -> SourceLocation {
        self.locations
            .lookup_within(&self.path, &[tag::METHOD_OPTIONS, extension as i32])
    }
}

// ========================================
// Service
// ========================================

#[derive(Debug)]
pub struct Service<'a> {
    proto: &'a ServiceDescriptorProto,
    full_name: String,
    path: Vec<i32>,
    locations: Arc<LocationIndex>,
    methods: BTreeMap<String, Method<'a>>,
    default_host: Option<String>,
    oauth_scopes: Vec<String>,
}

impl<'a> Service<'a> {
    pub(crate) fn new(
        proto: &'a ServiceDescriptorProto,
        path: Vec<i32>,
        cx: &FileContext<'a>,
        messages: &HashMap<String, Arc<Message<'a>>>,
    ) -> Result<Self> {
        let file = cx.file_name();
        let full_name = format!("{}.{}", cx.scope(), proto.name());
        let options = proto.options.get_or_default().unknown_fields();

        let mut methods = BTreeMap::new();
        for (i, method) in proto.method.iter().enumerate() {
            let method = Method::new(
                method,
                &full_name,
                child_path(&path, tag::SERVICE_METHOD, i),
                cx,
                messages,
            )?;
            methods.insert(method.name().to_string(), method);
        }

        Ok(Self {
            proto,
            full_name,
            path,
            locations: Arc::clone(&cx.locations),
            methods,
            default_host: annotations::default_host(options, file)?,
            oauth_scopes: annotations::oauth_scopes(options, file)?,
        })
    }

    pub fn name(&self) -> &'a str {
        self.proto.name()
    }

    pub fn full_name(&self) -> &str {
        &self.full_name
    }

    /// Methods keyed by name
    pub fn methods(&self) -> &BTreeMap<String, Method<'a>> {
        &self.methods
    }

    pub fn default_host(&self) -> Option<&str> {
        self.default_host.as_deref()
    }

    pub fn oauth_scopes(&self) -> &[String] {
        &self.oauth_scopes
    }

    pub fn location(&self) -> SourceLocation {
        self.locations.lookup(&self.path)
    }

    pub fn default_host_location(&self) -> SourceLocation {
        self.option_location(annotations::extension::DEFAULT_HOST)
    }

    pub fn oauth_scopes_location(&self) -> SourceLocation {
        self.option_location(annotations::extension::OAUTH_SCOPES)
    }

    fn option_location(&self, extension: u32) -> SourceLocation {
        self.locations
            .lookup_within(&self.path, &[tag::SERVICE_OPTIONS, extension as i32])
    }
}

//! JSON and human-readable rendering of findings.

use crate::compat::{Finding, FindingCategory};
use crate::error::Result;
use std::collections::BTreeMap;

/// Pretty-printed JSON array of findings
pub fn to_json(findings: &[&Finding]) -> Result<String> {
    Ok(serde_json::to_string_pretty(findings)?)
}

/// One sentence per finding, grouped by file:
/// `<file> L<line>: <message>.` or `<file>: <message>.` when the line is
/// unknown or `line_numbers` is off.
pub fn human_readable(findings: &[&Finding], line_numbers: bool) -> String {
    let mut by_file: BTreeMap<&str, Vec<&Finding>> = BTreeMap::new();
    for finding in findings {
        by_file
            .entry(finding.location.proto_file_name.as_str())
            .or_default()
            .push(finding);
    }

    let mut out = String::new();
    for (file, mut findings) in by_file {
        findings.sort_by(|a, b| a.sort_key().cmp(&b.sort_key()));
        for finding in findings {
            match finding.location.source_code_line {
                Some(line) if line_numbers => {
                    out.push_str(&format!("{file} L{line}: {}.\n", message(finding)))
                }
                _ => out.push_str(&format!("{file}: {}.\n", message(finding))),
            }
        }
    }
    out
}

/// The sentence for one finding, without the trailing period
pub fn message(finding: &Finding) -> String {
    let subject = finding.subject.as_str();
    let oldsubject = finding.oldsubject.as_deref().unwrap_or_default();
    let context = finding.context.as_deref().unwrap_or_default();
    let type_ = finding.type_.as_deref().unwrap_or_default();
    let oldtype = finding.oldtype.as_deref().unwrap_or_default();

    use FindingCategory::*;
    match finding.category {
        FieldAddition => format!("A new field `{subject}` is added to message `{context}`"),
        FieldRemoval => format!("An existing field `{subject}` is removed from message `{context}`"),
        FieldNameChange => format!(
            "Name of an existing field is changed from `{oldsubject}` to `{subject}` in message `{context}`"
        ),
        FieldRepeatedChange => format!(
            "Changed {oldtype} field `{subject}` to {type_} field in message `{context}`"
        ),
        FieldTypeChange => format!(
            "Changed type of an existing field `{subject}` from `{oldtype}` to `{type_}` in message `{context}`"
        ),
        FieldBehaviorChange => format!(
            "Changed field behavior for an existing field `{subject}` to REQUIRED in message `{context}`"
        ),
        FieldOneofMoveIn if oldtype.is_empty() => format!(
            "An existing field `{subject}` is moved into oneof `{type_}` in message `{context}`"
        ),
        FieldOneofMoveIn => format!(
            "An existing field `{subject}` is moved from oneof `{oldtype}` into oneof `{type_}` in message `{context}`"
        ),
        FieldOneofRemoval => format!(
            "An existing field `{subject}` is moved out of oneof `{oldtype}` in message `{context}`"
        ),
        FieldProto3OptionalChange => format!(
            "Changed proto3 optional flag of an existing field `{subject}` in message `{context}`"
        ),
        FieldFormatChange => format!(
            "Changed format of an existing field `{subject}` from `{oldtype}` to `{type_}` in message `{context}`"
        ),
        ResourceReferenceAddition => format!(
            "A new resource reference `{type_}` is added to field `{subject}` in message `{context}`"
        ),
        ResourceReferenceRemoval => format!(
            "An existing resource reference `{oldtype}` is removed from field `{subject}` in message `{context}`"
        ),
        ResourceReferenceChange => format!(
            "The resource reference of field `{subject}` is changed from `{oldtype}` to `{type_}` in message `{context}`"
        ),
        ResourceReferenceMoved => format!(
            "The resource reference `{oldtype}` of field `{subject}` is moved to the message level of `{context}`"
        ),
        ResourceDefinitionAddition => format!("A new resource definition `{subject}` is added"),
        ResourceDefinitionRemoval => format!("An existing resource definition `{subject}` is removed"),
        ResourcePatternAddition => format!("A new pattern `{type_}` is added to resource `{subject}`"),
        ResourcePatternRemoval => format!("An existing pattern `{oldtype}` is removed from resource `{subject}`"),
        ResourcePatternChange => format!(
            "An existing pattern of resource `{subject}` is changed from `{oldtype}` to `{type_}`"
        ),
        MessageAddition => format!("A new message `{subject}` is added"),
        MessageRemoval => format!("An existing message `{subject}` is removed"),
        EnumAddition => format!("A new enum `{subject}` is added"),
        EnumRemoval => format!("An existing enum `{subject}` is removed"),
        EnumValueAddition => format!("A new value `{subject}` is added to enum `{context}`"),
        EnumValueRemoval => format!("An existing value `{subject}` is removed from enum `{context}`"),
        EnumValueNameChange => format!(
            "Name of an existing enum value is changed from `{oldsubject}` to `{subject}` in enum `{context}`"
        ),
        ServiceAddition => format!("A new service `{subject}` is added"),
        ServiceRemoval => format!("An existing service `{subject}` is removed"),
        ServiceHostAddition => format!("A new default host `{type_}` is added to service `{subject}`"),
        ServiceHostRemoval => format!("An existing default host `{oldtype}` is removed from service `{subject}`"),
        ServiceHostChange => format!(
            "Default host of service `{subject}` is changed from `{oldtype}` to `{type_}`"
        ),
        OauthScopeAddition => format!("A new OAuth scope `{subject}` is added to service `{context}`"),
        OauthScopeRemoval => format!("An existing OAuth scope `{subject}` is removed from service `{context}`"),
        MethodAddition => format!("A new method `{subject}` is added to service `{context}`"),
        MethodRemoval => format!("An existing method `{subject}` is removed from service `{context}`"),
        MethodInputTypeChange => format!(
            "Input type of method `{subject}` is changed from `{oldtype}` to `{type_}` in service `{context}`"
        ),
        MethodResponseTypeChange => format!(
            "Response type of method `{subject}` is changed from `{oldtype}` to `{type_}` in service `{context}`"
        ),
        MethodClientStreamingChange => format!(
            "Client streaming flag is changed for method `{subject}` in service `{context}`"
        ),
        MethodServerStreamingChange => format!(
            "Server streaming flag is changed for method `{subject}` in service `{context}`"
        ),
        MethodPaginatedResponseChange => format!(
            "Paginated response of method `{subject}` is changed from `{}` to `{}` in service `{context}`",
            or_none(oldtype),
            or_none(type_)
        ),
        MethodSignatureAddition => format!(
            "A new method signature `{type_}` is added to method `{subject}` in service `{context}`"
        ),
        MethodSignatureRemoval => format!(
            "An existing method signature `{oldtype}` is removed from method `{subject}` in service `{context}`"
        ),
        HttpAnnotationAddition => format!(
            "A google.api.http annotation is added to method `{subject}` in service `{context}`"
        ),
        HttpAnnotationRemoval => format!(
            "An existing google.api.http annotation is removed from method `{subject}` in service `{context}`"
        ),
        HttpAnnotationChange => format!(
            "An existing google.api.http annotation {} is changed from `{oldtype}` to `{type_}` for method `{subject}` in service `{context}`",
            finding.extra_info.first().map(String::as_str).unwrap_or("value")
        ),
        LroAnnotationAddition => format!(
            "A long-running operation annotation is added to method `{subject}` in service `{context}`"
        ),
        LroAnnotationRemoval => format!(
            "An existing long-running operation annotation is removed from method `{subject}` in service `{context}`"
        ),
        LroResponseChange => format!(
            "Long-running operation response type of method `{subject}` is changed from `{oldtype}` to `{type_}` in service `{context}`"
        ),
        LroMetadataChange => format!(
            "Long-running operation metadata type of method `{subject}` is changed from `{oldtype}` to `{type_}` in service `{context}`"
        ),
        PackagingOptionAddition => format!("A new packaging option `{type_}` for `{subject}` is added"),
        PackagingOptionRemoval => format!("An existing packaging option `{oldtype}` for `{subject}` is removed"),
        CommentChange if context.is_empty() => format!("Comments of `{subject}` are changed"),
        CommentChange => format!("Comments of `{subject}` in `{context}` are changed"),
    }
}

fn or_none(value: &str) -> &str {
    if value.is_empty() { "none" } else { value }
}

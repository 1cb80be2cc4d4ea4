//! Service and method matcher.

use crate::compat::context::CompareContext;
use crate::compat::types::{Finding, FindingCategory};
use crate::compat::{compare_comments, paired};
use crate::model::{Field, Method, Service, SourceLocation};
use std::collections::BTreeSet;

pub fn compare_service(
    original: Option<&Service<'_>>,
    update: Option<&Service<'_>>,
    cx: &mut CompareContext,
) {
    match (original, update) {
        (None, None) => {}
        (None, Some(update)) => cx.emit(Finding::new(
            FindingCategory::ServiceAddition,
            &update.location(),
            update.name(),
        )),
        (Some(original), None) => cx.emit(Finding::new(
            FindingCategory::ServiceRemoval,
            &original.location(),
            original.name(),
        )),
        (Some(original), Some(update)) => {
            compare_comments(&original.location(), &update.location(), update.name(), None, cx);
            compare_default_host(original, update, cx);
            compare_oauth_scopes(original, update, cx);
            for (before, after) in paired(original.methods(), update.methods()) {
                compare_method(before, after, cx);
            }
        }
    }
}

fn compare_default_host(original: &Service<'_>, update: &Service<'_>, cx: &mut CompareContext) {
    let finding = |category, location: &SourceLocation| Finding::new(category, location, update.name());
    match (original.default_host(), update.default_host()) {
        (None, Some(host)) => cx.emit(
            finding(FindingCategory::ServiceHostAddition, &update.default_host_location()).with_type(host),
        ),
        (Some(host), None) => cx.emit(
            finding(FindingCategory::ServiceHostRemoval, &update.location()).with_oldtype(host),
        ),
        (Some(before), Some(after)) if before != after => cx.emit(
            finding(FindingCategory::ServiceHostChange, &update.default_host_location())
                .with_types(after, before),
        ),
        _ => {}
    }
}

fn compare_oauth_scopes(original: &Service<'_>, update: &Service<'_>, cx: &mut CompareContext) {
    let before: BTreeSet<&str> = original.oauth_scopes().iter().map(String::as_str).collect();
    let after: BTreeSet<&str> = update.oauth_scopes().iter().map(String::as_str).collect();
    let location = update.oauth_scopes_location();
    for removed in before.difference(&after) {
        cx.emit(
            Finding::new(FindingCategory::OauthScopeRemoval, &location, *removed)
                .with_context(update.name()),
        );
    }
    for added in after.difference(&before) {
        cx.emit(
            Finding::new(FindingCategory::OauthScopeAddition, &location, *added)
                .with_context(update.name()),
        );
    }
}

fn compare_method(original: Option<&Method<'_>>, update: Option<&Method<'_>>, cx: &mut CompareContext) {
    match (original, update) {
        (None, None) => {}
        (None, Some(update)) => cx.emit(
            Finding::new(FindingCategory::MethodAddition, &update.location(), update.name())
                .with_context(service_name(update)),
        ),
        (Some(original), None) => cx.emit(
            Finding::new(FindingCategory::MethodRemoval, &original.location(), original.name())
                .with_context(service_name(original)),
        ),
        (Some(original), Some(update)) => MethodComparison { original, update }.compare(cx),
    }
}

fn service_name<'m>(method: &'m Method<'_>) -> &'m str {
    crate::compat::short_name(method.service_name())
}

struct MethodComparison<'m, 'a> {
    original: &'m Method<'a>,
    update: &'m Method<'a>,
}

impl MethodComparison<'_, '_> {
    fn finding(&self, category: FindingCategory, location: &SourceLocation) -> Finding {
        Finding::new(category, location, self.update.name()).with_context(service_name(self.update))
    }

    fn compare(&self, cx: &mut CompareContext) {
        let (original, update) = (self.original, self.update);
        compare_comments(
            &original.location(),
            &update.location(),
            update.name(),
            Some(service_name(update)),
            cx,
        );

        if !cx.versions.equivalent(original.input_type(), update.input_type()) {
            cx.emit(
                self.finding(FindingCategory::MethodInputTypeChange, &update.input_location())
                    .with_types(update.input_type(), original.input_type()),
            );
        }
        if !cx.versions.equivalent(original.output_type(), update.output_type()) {
            cx.emit(
                self.finding(FindingCategory::MethodResponseTypeChange, &update.output_location())
                    .with_types(update.output_type(), original.output_type()),
            );
        }
        if original.client_streaming() != update.client_streaming() {
            cx.emit(self.finding(
                FindingCategory::MethodClientStreamingChange,
                &update.client_streaming_location(),
            ));
        }
        if original.server_streaming() != update.server_streaming() {
            cx.emit(self.finding(
                FindingCategory::MethodServerStreamingChange,
                &update.server_streaming_location(),
            ));
        }

        self.compare_pagination(cx);
        self.compare_signatures(cx);
        self.compare_http(cx);
        self.compare_lro(cx);
    }

    fn compare_pagination(&self, cx: &mut CompareContext) {
        let describe = |field: Option<&Field<'_>>| {
            field.map(|f| format!("{} {}", f.type_display(), f.name()))
        };
        let before = self.original.paged_result_field();
        let after = self.update.paged_result_field();
        let changed = match (before, after) {
            (None, None) => false,
            (Some(before), Some(after)) => {
                before.name() != after.name()
                    || before.proto_type() != after.proto_type()
                    || match (before.type_name(), after.type_name()) {
                        (Some(a), Some(b)) => !cx.versions.equivalent(a, b),
                        _ => false,
                    }
            }
            _ => true,
        };
        if changed {
            let mut finding =
                self.finding(FindingCategory::MethodPaginatedResponseChange, &self.update.output_location());
            finding.type_ = describe(after);
            finding.oldtype = describe(before);
            cx.emit(finding);
        }
    }

    fn compare_signatures(&self, cx: &mut CompareContext) {
        let before: BTreeSet<&str> = self.original.method_signatures().iter().map(String::as_str).collect();
        let after: BTreeSet<&str> = self.update.method_signatures().iter().map(String::as_str).collect();
        let location = self.update.method_signature_location();
        for removed in before.difference(&after) {
            cx.emit(self.finding(FindingCategory::MethodSignatureRemoval, &location).with_oldtype(*removed));
        }
        for added in after.difference(&before) {
            cx.emit(self.finding(FindingCategory::MethodSignatureAddition, &location).with_type(*added));
        }
    }

    fn compare_http(&self, cx: &mut CompareContext) {
        let location = self.update.http_annotation_location();
        match (self.original.http_annotation(), self.update.http_annotation()) {
            (None, None) => {}
            (None, Some(_)) => cx.emit(self.finding(FindingCategory::HttpAnnotationAddition, &location)),
            (Some(_), None) => cx.emit(self.finding(FindingCategory::HttpAnnotationRemoval, &location)),
            (Some(before), Some(after)) => {
                let mut changes = Vec::new();
                if before.method != after.method {
                    changes.push(("method", before.method.clone(), after.method.clone()));
                }
                if !cx.versions.equivalent(&before.uri, &after.uri) {
                    changes.push(("uri", before.uri.clone(), after.uri.clone()));
                }
                if before.body != after.body {
                    let body = |b: &Option<String>| b.clone().unwrap_or_default();
                    changes.push(("body", body(&before.body), body(&after.body)));
                }
                for (aspect, old, new) in changes {
                    cx.emit(
                        self.finding(FindingCategory::HttpAnnotationChange, &location)
                            .with_types(new, old)
                            .with_extra_info(aspect),
                    );
                }
            }
        }
    }

    fn compare_lro(&self, cx: &mut CompareContext) {
        let location = self.update.lro_annotation_location();
        match (self.original.lro_annotation(), self.update.lro_annotation()) {
            (None, None) => {}
            (None, Some(_)) => cx.emit(self.finding(FindingCategory::LroAnnotationAddition, &location)),
            (Some(_), None) => cx.emit(self.finding(FindingCategory::LroAnnotationRemoval, &location)),
            (Some(before), Some(after)) => {
                if !cx.versions.equivalent(&before.response_type, &after.response_type) {
                    cx.emit(
                        self.finding(FindingCategory::LroResponseChange, &location)
                            .with_types(&after.response_type, &before.response_type),
                    );
                }
                if !cx.versions.equivalent(&before.metadata_type, &after.metadata_type) {
                    cx.emit(
                        self.finding(FindingCategory::LroMetadataChange, &location)
                            .with_types(&after.metadata_type, &before.metadata_type),
                    );
                }
            }
        }
    }
}

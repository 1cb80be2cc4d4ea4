//! Field matcher. Fields are paired by number by the message matcher.

use crate::compat::context::{CompareContext, VersionPair};
use crate::compat::types::{Finding, FindingCategory};
use crate::compat::{compare_comments, short_name};
use crate::model::{Field, FieldFormat, ResourceReference, ResourceRegistry};

pub fn compare_field(original: Option<&Field<'_>>, update: Option<&Field<'_>>, cx: &mut CompareContext) {
    match (original, update) {
        (None, None) => {}
        (None, Some(update)) => cx.emit(
            Finding::new(FindingCategory::FieldAddition, &update.location(), update.name())
                .with_context(short_name(update.message_name())),
        ),
        (Some(original), None) => cx.emit(
            Finding::new(FindingCategory::FieldRemoval, &original.location(), original.name())
                .with_context(short_name(original.message_name())),
        ),
        (Some(original), Some(update)) => FieldComparison { original, update }.compare(cx),
    }
}

struct FieldComparison<'f, 'a> {
    original: &'f Field<'a>,
    update: &'f Field<'a>,
}

impl FieldComparison<'_, '_> {
    fn context(&self) -> &str {
        short_name(self.update.message_name())
    }

    fn finding(&self, category: FindingCategory, location: &crate::model::SourceLocation) -> Finding {
        Finding::new(category, location, self.update.name()).with_context(self.context())
    }

    fn compare(&self, cx: &mut CompareContext) {
        let (original, update) = (self.original, self.update);

        if original.name() != update.name() {
            cx.emit(
                self.finding(FindingCategory::FieldNameChange, &update.name_location())
                    .with_oldsubject(original.name()),
            );
        }

        if original.repeated() != update.repeated() {
            cx.emit(
                self.finding(FindingCategory::FieldRepeatedChange, &update.label_location())
                    .with_types(label(update), label(original)),
            );
        }

        // Relaxing REQUIRED is compatible
        if !original.required() && update.required() {
            cx.emit(self.finding(FindingCategory::FieldBehaviorChange, &update.behavior_location()));
        }

        if type_changed(original, update, &cx.versions) {
            cx.emit(
                self.finding(FindingCategory::FieldTypeChange, &update.type_location())
                    .with_types(update.type_display(), original.type_display()),
            );
        }

        self.compare_oneof(cx);
        self.compare_resource_reference(cx);

        if original.format() != update.format() && update.format() != FieldFormat::Unspecified {
            cx.emit(
                self.finding(FindingCategory::FieldFormatChange, &update.format_location())
                    .with_types(update.format().to_string(), original.format().to_string()),
            );
        }

        compare_comments(
            &original.location(),
            &update.location(),
            update.name(),
            Some(self.context()),
            cx,
        );
    }

    fn compare_oneof(&self, cx: &mut CompareContext) {
        let (original, update) = (self.original, self.update);
        let real_oneof = |field: &Field<'_>| {
            field
                .oneof()
                .filter(|oneof| !oneof.is_synthetic())
                .map(|oneof| oneof.name().to_string())
        };

        if original.proto3_optional() != update.proto3_optional() {
            cx.emit(self.finding(FindingCategory::FieldProto3OptionalChange, &update.location()));
        }

        match (real_oneof(original), real_oneof(update)) {
            (Some(from), None) => cx.emit(
                self.finding(FindingCategory::FieldOneofRemoval, &update.location())
                    .with_oldtype(from),
            ),
            (None, Some(to)) => cx.emit(
                self.finding(FindingCategory::FieldOneofMoveIn, &update.location())
                    .with_type(to),
            ),
            (Some(from), Some(to)) if from != to => cx.emit(
                self.finding(FindingCategory::FieldOneofMoveIn, &update.location())
                    .with_types(to, from),
            ),
            _ => {}
        }
    }

    fn compare_resource_reference(&self, cx: &mut CompareContext) {
        let (original, update) = (self.original, self.update);
        let location = update.resource_reference_location();
        match (original.resource_reference(), update.resource_reference()) {
            (None, None) => {}
            (None, Some(added)) => cx.emit(
                self.finding(FindingCategory::ResourceReferenceAddition, &location)
                    .with_type(added.resource_type()),
            ),
            (Some(removed), None) => {
                // Moved onto the message's own resource annotation
                let moved = update
                    .message_resource()
                    .is_some_and(|resource| resource.resource_type == removed.resource_type());
                let category = if moved {
                    FindingCategory::ResourceReferenceMoved
                } else {
                    FindingCategory::ResourceReferenceRemoval
                };
                cx.emit(self.finding(category, &location).with_oldtype(removed.resource_type()));
            }
            (Some(before), Some(after)) => {
                if !references_equivalent(before, original.registry(), after, update.registry()) {
                    cx.emit(
                        self.finding(FindingCategory::ResourceReferenceChange, &location)
                            .with_types(after.resource_type(), before.resource_type()),
                    );
                }
            }
        }
    }
}

fn label(field: &Field<'_>) -> &'static str {
    if field.repeated() { "repeated" } else { "singular" }
}

fn same_type(original: &Field<'_>, update: &Field<'_>, versions: &VersionPair) -> bool {
    original.proto_type() == update.proto_type()
        && match (original.type_name(), update.type_name()) {
            (Some(before), Some(after)) => versions.equivalent(before, after),
            _ => true,
        }
}

fn type_changed(original: &Field<'_>, update: &Field<'_>, versions: &VersionPair) -> bool {
    match (original.map_entry_type(), update.map_entry_type()) {
        (Some(before), Some(after)) => {
            !same_type(&before.key, &after.key, versions)
                || !same_type(&before.value, &after.value, versions)
        }
        (None, None) => !same_type(original, update, versions),
        _ => true,
    }
}

/// `type` and `child_type` references agree when the child type has the
/// other side's type among its parents, resolved in the child side's tree.
fn references_equivalent(
    before: &ResourceReference,
    before_registry: &ResourceRegistry,
    after: &ResourceReference,
    after_registry: &ResourceRegistry,
) -> bool {
    match (before, after) {
        (ResourceReference::Type(a), ResourceReference::Type(b))
        | (ResourceReference::ChildType(a), ResourceReference::ChildType(b)) => a == b,
        (ResourceReference::Type(parent), ResourceReference::ChildType(child)) => {
            has_parent(after_registry, child, parent)
        }
        (ResourceReference::ChildType(child), ResourceReference::Type(parent)) => {
            has_parent(before_registry, child, parent)
        }
    }
}

fn has_parent(registry: &ResourceRegistry, child_type: &str, parent_type: &str) -> bool {
    registry
        .parents_of_child_type(child_type)
        .iter()
        .any(|parent| parent.resource_type() == parent_type)
}

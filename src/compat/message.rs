//! Message matcher. Recurses into fields by number and into nested
//! messages and enums by name.

use crate::compat::context::CompareContext;
use crate::compat::enums::compare_enum;
use crate::compat::field::compare_field;
use crate::compat::resource::{compare_patterns, resource_added, resource_removed};
use crate::compat::types::{Finding, FindingCategory};
use crate::compat::{compare_comments, paired};
use crate::model::Message;
use std::sync::Arc;

pub fn compare_message(
    original: Option<&Message<'_>>,
    update: Option<&Message<'_>>,
    cx: &mut CompareContext,
) {
    match (original, update) {
        (None, None) => {}
        (None, Some(update)) => cx.emit(Finding::new(
            FindingCategory::MessageAddition,
            &update.location(),
            update.name(),
        )),
        (Some(original), None) => cx.emit(Finding::new(
            FindingCategory::MessageRemoval,
            &original.location(),
            original.name(),
        )),
        (Some(original), Some(update)) => compare_matched(original, update, cx),
    }
}

fn compare_matched(original: &Message<'_>, update: &Message<'_>, cx: &mut CompareContext) {
    compare_comments(&original.location(), &update.location(), update.name(), None, cx);
    compare_resource(original, update, cx);

    for (before, after) in paired(original.fields(), update.fields()) {
        compare_field(before, after, cx);
    }
    for (before, after) in paired(original.nested_messages(), update.nested_messages()) {
        compare_message(before.map(Arc::as_ref), after.map(Arc::as_ref), cx);
    }
    for (before, after) in paired(original.nested_enums(), update.nested_enums()) {
        compare_enum(before.map(Arc::as_ref), after.map(Arc::as_ref), cx);
    }
}

fn compare_resource(original: &Message<'_>, update: &Message<'_>, cx: &mut CompareContext) {
    match (original.resource(), update.resource()) {
        (None, None) => {}
        (Some(before), Some(after)) if before.resource_type == after.resource_type => {
            compare_patterns(before, after, &update.resource_location(), cx);
        }
        (before, after) => {
            if let Some(removed) = before {
                resource_removed(removed, &original.resource_location(), update.registry(), cx);
            }
            if let Some(added) = after {
                resource_added(added, &update.resource_location(), original.registry(), cx);
            }
        }
    }
}

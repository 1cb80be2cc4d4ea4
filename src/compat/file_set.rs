//! Top-level matcher: services, surface messages and enums, packaging
//! options and file-level resource definitions.

use crate::compat::context::CompareContext;
use crate::compat::enums::compare_enum;
use crate::compat::message::compare_message;
use crate::compat::paired;
use crate::compat::resource::{compare_patterns, resource_added, resource_removed};
use crate::compat::service::compare_service;
use crate::compat::types::{Finding, FindingCategory};
use crate::model::FileSet;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

/// Option whose value never carries the API version
const VERSION_FREE_OPTION: &str = "java_outer_classname";

pub fn compare_file_sets(original: &FileSet<'_>, update: &FileSet<'_>, cx: &mut CompareContext) {
    for (before, after) in paired(original.services_map(), update.services_map()) {
        compare_service(before, after, cx);
    }
    for (before, after) in paired(original.messages_map(), update.messages_map()) {
        compare_message(before.map(Arc::as_ref), after.map(Arc::as_ref), cx);
    }
    for (before, after) in paired(original.enums_map(), update.enums_map()) {
        compare_enum(before.map(Arc::as_ref), after.map(Arc::as_ref), cx);
    }
    compare_packaging_options(original, update, cx);
    compare_file_resources(original, update, cx);
}

fn compare_packaging_options(original: &FileSet<'_>, update: &FileSet<'_>, cx: &mut CompareContext) {
    let versions = cx.versions.clone();
    let empty = BTreeMap::new();
    let names: BTreeSet<&str> = original
        .packaging_options()
        .keys()
        .chain(update.packaging_options().keys())
        .copied()
        .collect();

    for name in names {
        let before = original.packaging_options().get(name).unwrap_or(&empty);
        let after = update.packaging_options().get(name).unwrap_or(&empty);
        let equivalent = |old: &str, new: &str| {
            if name == VERSION_FREE_OPTION {
                old == new
            } else {
                versions.equivalent_any_case(old, new)
            }
        };

        for (value, location) in before {
            if !after.keys().any(|new| equivalent(value.as_str(), new.as_str())) {
                cx.emit(
                    Finding::new(FindingCategory::PackagingOptionRemoval, location, name)
                        .with_oldtype(value),
                );
            }
        }
        for (value, location) in after {
            if !before.keys().any(|old| equivalent(old.as_str(), value.as_str())) {
                cx.emit(
                    Finding::new(FindingCategory::PackagingOptionAddition, location, name)
                        .with_type(value),
                );
            }
        }
    }
}

fn compare_file_resources(original: &FileSet<'_>, update: &FileSet<'_>, cx: &mut CompareContext) {
    for (before, after) in paired(original.file_resources(), update.file_resources()) {
        match (before, after) {
            (Some(before), Some(after)) => {
                compare_patterns(&before.resource, &after.resource, &after.location, cx)
            }
            (Some(before), None) => {
                resource_removed(&before.resource, &before.location, update.registry(), cx)
            }
            (None, Some(after)) => {
                resource_added(&after.resource, &after.location, original.registry(), cx)
            }
            (None, None) => {}
        }
    }
}

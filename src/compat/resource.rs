//! Resource definition reconciliation, shared by the message and file-set
//! matchers.

use crate::compat::context::CompareContext;
use crate::compat::types::{Finding, FindingCategory};
use crate::model::{ResourceDescriptor, ResourceRegistry, SourceLocation};

/// Patterns are positional: a shrinking list or a changed position breaks
/// clients, appending does not.
pub(crate) fn compare_patterns(
    before: &ResourceDescriptor,
    after: &ResourceDescriptor,
    location: &SourceLocation,
    cx: &mut CompareContext,
) {
    let subject = after.resource_type.as_str();
    if after.patterns.len() < before.patterns.len() {
        for removed in &before.patterns[after.patterns.len()..] {
            cx.emit(
                Finding::new(FindingCategory::ResourcePatternRemoval, location, subject)
                    .with_oldtype(removed),
            );
        }
    }
    for (old, new) in before.patterns.iter().zip(&after.patterns) {
        if old != new {
            cx.emit(
                Finding::new(FindingCategory::ResourcePatternChange, location, subject)
                    .with_types(new, old),
            );
        }
    }
    for added in after.patterns.iter().skip(before.patterns.len()) {
        cx.emit(
            Finding::new(FindingCategory::ResourcePatternAddition, location, subject)
                .with_type(added),
        );
    }
}

/// A resource that is gone from its original declaration site. If the
/// updated tree still registers the type elsewhere, only the patterns are
/// compared.
pub(crate) fn resource_removed(
    removed: &ResourceDescriptor,
    location: &SourceLocation,
    update_registry: &ResourceRegistry,
    cx: &mut CompareContext,
) {
    match update_registry.by_type(&removed.resource_type) {
        Some(entry) => compare_patterns(removed, &entry.resource, &entry.location, cx),
        None => cx.emit(Finding::new(
            FindingCategory::ResourceDefinitionRemoval,
            location,
            removed.resource_type.as_str(),
        )),
    }
}

/// A resource that is new at its declaration site. Types the original tree
/// already registered elsewhere were moved, and the removal side compares them.
pub(crate) fn resource_added(
    added: &ResourceDescriptor,
    location: &SourceLocation,
    original_registry: &ResourceRegistry,
    cx: &mut CompareContext,
) {
    if original_registry.by_type(&added.resource_type).is_none() {
        cx.emit(Finding::new(
            FindingCategory::ResourceDefinitionAddition,
            location,
            added.resource_type.as_str(),
        ));
    }
}

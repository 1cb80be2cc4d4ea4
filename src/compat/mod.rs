//! Breaking change detection between two semantic models
//!
//! Five matchers walk the original and updated trees in lock-step: file set,
//! service, message, field and enum. Each gets an original and an updated
//! node, either of which may be absent, and reports what it sees into the
//! run's [`FindingStore`].

pub mod context;
pub mod engine;
pub mod enums;
pub mod field;
pub mod file_set;
pub mod message;
pub mod resource;
pub mod service;
pub mod store;
pub mod types;

pub use context::{CompareContext, VersionPair};
pub use engine::Detector;
pub use store::{Compatibility, FindingStore};
pub use types::{ChangeType, ConventionalCommitTag, Finding, FindingCategory, FindingLocation};

use crate::model::SourceLocation;
use std::collections::{BTreeMap, BTreeSet};

/// Last segment of a dotted full name
pub(crate) fn short_name(full_name: &str) -> &str {
    full_name.rsplit('.').next().unwrap_or(full_name)
}

/// Pairs the values of two maps by key, in key order.
pub(crate) fn paired<'m, K: Ord, V>(
    original: &'m BTreeMap<K, V>,
    update: &'m BTreeMap<K, V>,
) -> Vec<(Option<&'m V>, Option<&'m V>)> {
    let keys: BTreeSet<&K> = original.keys().chain(update.keys()).collect();
    keys.into_iter()
        .map(|key| (original.get(key), update.get(key)))
        .collect()
}

pub(crate) fn compare_comments(
    original: &SourceLocation,
    update: &SourceLocation,
    subject: &str,
    context: Option<&str>,
    cx: &mut CompareContext,
) {
    if original.leading_comments == update.leading_comments
        && original.trailing_comments == update.trailing_comments
    {
        return;
    }
    let mut finding = Finding::new(FindingCategory::CommentChange, update, subject);
    finding.context = context.map(str::to_string);
    cx.emit(finding);
}

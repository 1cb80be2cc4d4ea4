//! State threaded through one comparison run.

use crate::compat::store::FindingStore;
use crate::compat::types::Finding;

/// API versions of the two sides, used to tolerate version-only renames
/// such as `.example.v1.Book` → `.example.v1beta1.Book`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VersionPair {
    pub original: Option<String>,
    pub update: Option<String>,
}

impl VersionPair {
    pub fn new(original: Option<&str>, update: Option<&str>) -> Self {
        Self {
            original: original.map(str::to_string),
            update: update.map(str::to_string),
        }
    }

    /// Whether `original` equals `update` once the original version is
    /// replaced by the update version.
    pub fn equivalent(&self, original: &str, update: &str) -> bool {
        if original == update {
            return true;
        }
        match (&self.original, &self.update) {
            (Some(from), Some(to)) => original.replace(from.as_str(), to) == update,
            _ => false,
        }
    }

    /// Like [`VersionPair::equivalent`], also trying the capitalized and
    /// upper-case spellings of the versions (`Foo::V1`, `FOO_V1`).
    pub fn equivalent_any_case(&self, original: &str, update: &str) -> bool {
        if self.equivalent(original, update) {
            return true;
        }
        let (Some(from), Some(to)) = (&self.original, &self.update) else {
            return false;
        };
        [(capitalize(from), capitalize(to)), (from.to_uppercase(), to.to_uppercase())]
            .iter()
            .any(|(from, to)| original.replace(from.as_str(), to) == update)
    }
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Shared by every matcher of one run.
#[derive(Debug, Default)]
pub struct CompareContext {
    pub versions: VersionPair,
    pub store: FindingStore,
}

impl CompareContext {
    pub fn new(versions: VersionPair) -> Self {
        Self {
            versions,
            store: FindingStore::new(),
        }
    }

    pub fn emit(&mut self, finding: Finding) {
        self.store.push(finding);
    }

    pub fn into_store(self) -> FindingStore {
        self.store
    }
}

//! Breaking change detection engine
//!
//! Runs the matchers over two semantic models and applies the configured
//! category filter to the result.

use crate::compat::context::{CompareContext, VersionPair};
use crate::compat::file_set::compare_file_sets;
use crate::compat::store::FindingStore;
use crate::config::DetectorConfig;
use crate::model::FileSet;
use tracing::debug;

/// Main engine for breaking change detection
#[derive(Debug, Default)]
pub struct Detector {
    // Stateless, each run owns its own store
}

impl Detector {
    pub fn new() -> Self {
        Self {}
    }

    /// Compares `original` against `update` and returns every finding.
    pub fn detect(&self, original: &FileSet<'_>, update: &FileSet<'_>) -> FindingStore {
        let versions = VersionPair::new(original.api_version(), update.api_version());
        debug!(
            original_version = ?versions.original,
            update_version = ?versions.update,
            "Comparing API definitions"
        );
        let mut cx = CompareContext::new(versions);
        compare_file_sets(original, update, &mut cx);
        let store = cx.into_store();
        debug!(findings = store.len(), "Comparison finished");
        store
    }

    /// Like [`Detector::detect`], dropping the categories the config excludes.
    pub fn check(
        &self,
        original: &FileSet<'_>,
        update: &FileSet<'_>,
        config: &DetectorConfig,
    ) -> FindingStore {
        let mut store = self.detect(original, update);
        store.except(&config.except_categories);
        store
    }
}

//! Collection of findings produced by one comparison run.

use crate::compat::types::{Finding, FindingCategory};
use std::collections::BTreeMap;
use tracing::trace;

/// The result of a compatibility comparison between two API definitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Compatibility {
    /// Nothing changed that the comparator reports.
    Green,
    /// Only backward-compatible changes were found.
    Yellow,
    /// At least one breaking change was found.
    Red,
}

#[derive(Debug, Clone, Default)]
pub struct FindingStore {
    findings: Vec<Finding>,
}

impl FindingStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, finding: Finding) {
        trace!(
            category = %finding.category,
            subject = %finding.subject,
            file = %finding.location.proto_file_name,
            "Finding"
        );
        self.findings.push(finding);
    }

    /// Drops every finding of the given categories
    pub fn except(&mut self, categories: &[FindingCategory]) {
        self.findings.retain(|f| !categories.contains(&f.category));
    }

    /// All findings in report order
    pub fn all_findings(&self) -> Vec<&Finding> {
        let mut findings: Vec<&Finding> = self.findings.iter().collect();
        findings.sort_by(|a, b| a.sort_key().cmp(&b.sort_key()));
        findings
    }

    /// Breaking findings in report order
    pub fn breaking_findings(&self) -> Vec<&Finding> {
        self.all_findings()
            .into_iter()
            .filter(|f| f.is_breaking())
            .collect()
    }

    pub fn has_breaking_changes(&self) -> bool {
        self.findings.iter().any(Finding::is_breaking)
    }

    /// Finding count per category
    pub fn summary(&self) -> BTreeMap<FindingCategory, usize> {
        let mut summary = BTreeMap::new();
        for finding in &self.findings {
            *summary.entry(finding.category).or_insert(0) += 1;
        }
        summary
    }

    pub fn compatibility(&self) -> Compatibility {
        if self.has_breaking_changes() {
            Compatibility::Red
        } else if self.findings.is_empty() {
            Compatibility::Green
        } else {
            Compatibility::Yellow
        }
    }

    pub fn len(&self) -> usize {
        self.findings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.findings.is_empty()
    }
}

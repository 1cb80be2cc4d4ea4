//! Cross-file database of resource declarations.
//!
//! Both file-level `google.api.resource_definition` and message-level
//! `google.api.resource` annotations are registered here, so identifier
//! references can be resolved against the whole tree.

use crate::error::{DetectorError, Result};
use crate::model::annotations::ResourceDescriptor;
use crate::model::location::SourceLocation;
use std::collections::HashMap;
use std::sync::Arc;

/// A registered resource together with where it was declared.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceEntry {
    pub resource: ResourceDescriptor,
    pub location: SourceLocation,
}

impl ResourceEntry {
    pub fn resource_type(&self) -> &str {
        &self.resource.resource_type
    }

    pub fn patterns(&self) -> &[String] {
        &self.resource.patterns
    }
}

#[derive(Debug, Default)]
pub struct ResourceRegistry {
    types: HashMap<String, Arc<ResourceEntry>>,
    patterns: HashMap<String, Arc<ResourceEntry>>,
}

impl ResourceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a resource. Later registrations of the same type or pattern
    /// replace earlier ones.
    pub fn register(&mut self, entry: ResourceEntry) -> Result<()> {
        if entry.resource.resource_type.is_empty() {
            return Err(DetectorError::malformed(
                &entry.location.file_name,
                "resource declaration has no type",
            ));
        }
        if entry.resource.patterns.is_empty() {
            return Err(DetectorError::malformed(
                &entry.location.file_name,
                format!(
                    "resource \"{}\" declares no pattern",
                    entry.resource.resource_type
                ),
            ));
        }

        let entry = Arc::new(entry);
        for pattern in &entry.resource.patterns {
            self.patterns.insert(pattern.clone(), Arc::clone(&entry));
        }
        self.types
            .insert(entry.resource.resource_type.clone(), entry);
        Ok(())
    }

    pub fn by_type(&self, resource_type: &str) -> Option<&ResourceEntry> {
        self.types.get(resource_type).map(Arc::as_ref)
    }

    pub fn by_pattern(&self, pattern: &str) -> Option<&ResourceEntry> {
        self.patterns.get(pattern).map(Arc::as_ref)
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    /// Resources whose pattern is a segment-wise strict prefix of one of the
    /// child's patterns. Results follow pattern-then-segment order and are
    /// not de-duplicated.
    pub fn parents_of_child_type(&self, child_type: &str) -> Vec<&ResourceEntry> {
        let Some(child) = self.by_type(child_type) else {
            return Vec::new();
        };
        let mut parents = Vec::new();
        for pattern in child.patterns() {
            let segments: Vec<&str> = pattern.split('/').collect();
            for end in 1..segments.len() {
                let prefix = segments[..end].join("/");
                if let Some(parent) = self.by_pattern(&prefix) {
                    if parent.resource_type() != child_type {
                        parents.push(parent);
                    }
                }
            }
        }
        parents
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(resource_type: &str, patterns: &[&str]) -> ResourceEntry {
        ResourceEntry {
            resource: ResourceDescriptor {
                resource_type: resource_type.to_string(),
                patterns: patterns.iter().map(|p| p.to_string()).collect(),
            },
            location: SourceLocation {
                file_name: "resources.proto".to_string(),
                ..Default::default()
            },
        }
    }

    #[test]
    fn test_parents_of_child_type() {
        let mut registry = ResourceRegistry::new();
        registry.register(entry("t1", &["foo/{foo}"])).unwrap();
        registry
            .register(entry("t2", &["foo/{foo}/bar/{bar}/t2"]))
            .unwrap();

        let parents: Vec<&str> = registry
            .parents_of_child_type("t2")
            .iter()
            .map(|p| p.resource_type())
            .collect();
        assert!(parents.contains(&"t1"));
        assert!(!parents.contains(&"t2"));
    }

    #[test]
    fn test_parents_are_not_deduplicated() {
        let mut registry = ResourceRegistry::new();
        registry.register(entry("shelf", &["shelves/{shelf}"])).unwrap();
        registry
            .register(entry(
                "book",
                &["shelves/{shelf}/books/{book}", "shelves/{shelf}/archived/{book}"],
            ))
            .unwrap();
        let parents = registry.parents_of_child_type("book");
        assert_eq!(parents.len(), 2);
        assert!(parents.iter().all(|p| p.resource_type() == "shelf"));
    }

    #[test]
    fn test_unknown_child_has_no_parents() {
        let registry = ResourceRegistry::new();
        assert!(registry.parents_of_child_type("missing").is_empty());
    }

    #[test]
    fn test_register_requires_type_and_pattern() {
        let mut registry = ResourceRegistry::new();
        assert!(matches!(
            registry.register(entry("", &["a/{a}"])),
            Err(DetectorError::MalformedInput { .. })
        ));
        assert!(matches!(
            registry.register(entry("t", &[])),
            Err(DetectorError::MalformedInput { .. })
        ));
        assert!(registry.is_empty());
    }

    #[test]
    fn test_duplicate_pattern_last_write_wins() {
        let mut registry = ResourceRegistry::new();
        registry.register(entry("first", &["items/{item}"])).unwrap();
        registry.register(entry("second", &["items/{item}"])).unwrap();
        assert_eq!(
            registry.by_pattern("items/{item}").unwrap().resource_type(),
            "second"
        );
        assert_eq!(registry.len(), 2);
        assert!(registry.by_type("first").is_some());
    }
}

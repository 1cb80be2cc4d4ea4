//! Source location lookup keyed by descriptor path.

use protobuf::descriptor::FileDescriptorProto;
use std::collections::HashMap;

/// Where a declaration lives, as far as the compiler told us.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SourceLocation {
    pub file_name: String,
    /// 1-based line; `None` when the descriptor carries no source info for the path
    pub line: Option<u32>,
    pub leading_comments: String,
    pub trailing_comments: String,
}

#[derive(Debug, Clone, Default)]
struct LocationEntry {
    line: Option<u32>,
    leading_comments: String,
    trailing_comments: String,
}

/// Path → location table for a single file.
#[derive(Debug, Default)]
pub struct LocationIndex {
    file_name: String,
    entries: HashMap<Vec<i32>, LocationEntry>,
}

impl LocationIndex {
    pub fn new(file: &FileDescriptorProto) -> Self {
        let mut entries = HashMap::new();
        if let Some(info) = file.source_code_info.as_ref() {
            for location in &info.location {
                // protoc may emit several spans for one path; the first is the declaration
                entries
                    .entry(location.path.clone())
                    .or_insert_with(|| LocationEntry {
                        line: location.span.first().map(|l| *l as u32 + 1),
                        leading_comments: location.leading_comments().to_string(),
                        trailing_comments: location.trailing_comments().to_string(),
                    });
            }
        }
        Self {
            file_name: file.name().to_string(),
            entries,
        }
    }

    /// Looks up `path`. A missing path yields a location without a line.
    pub fn lookup(&self, path: &[i32]) -> SourceLocation {
        match self.entries.get(path) {
            Some(entry) => SourceLocation {
                file_name: self.file_name.clone(),
                line: entry.line,
                leading_comments: entry.leading_comments.clone(),
                trailing_comments: entry.trailing_comments.clone(),
            },
            None => SourceLocation {
                file_name: self.file_name.clone(),
                ..Default::default()
            },
        }
    }

    /// Looks up `path` extended by `suffix`, falling back to `path` itself.
    pub fn lookup_within(&self, path: &[i32], suffix: &[i32]) -> SourceLocation {
        let mut full = path.to_vec();
        full.extend_from_slice(suffix);
        if self.entries.contains_key(&full) {
            self.lookup(&full)
        } else {
            self.lookup(path)
        }
    }
}

//! Error types for loading, modelling and comparing API definitions.
//!
//! Findings are never errors: a comparison that runs to completion always
//! yields a [`crate::compat::FindingStore`]. Everything here aborts a run.

use thiserror::Error;

/// Result type used throughout the crate
pub type Result<T> = std::result::Result<T, DetectorError>;

/// Errors raised before or during model construction
#[derive(Error, Debug)]
pub enum DetectorError {
    /// Invalid or inconsistent input options, reported before any work starts
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// The descriptor tree is structurally usable but violates an annotation contract
    #[error("Malformed input in {file}: {message}")]
    MalformedInput { file: String, message: String },

    /// The schema compiler could not produce a descriptor set
    #[error("Schema compilation failed: `{command}`\n{output}")]
    InvocationFailed { command: String, output: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Descriptor decoding error: {0}")]
    Descriptor(#[from] protobuf::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl DetectorError {
    pub(crate) fn malformed(file: impl Into<String>, message: impl Into<String>) -> Self {
        DetectorError::MalformedInput {
            file: file.into(),
            message: message.into(),
        }
    }
}

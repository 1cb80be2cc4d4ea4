//! Detector configuration and input description.

use crate::compat::FindingCategory;
use crate::error::{DetectorError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Which `protobuf-parse` backend compiles `.proto` sources
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum CompilerBackend {
    /// Pure Rust parser. It emits no source info, so findings carry no line
    /// numbers and comment changes are not detected.
    Pure,
    /// `protoc` with `--include_source_info`: `$PROTOC` if set, otherwise
    /// the vendored binary
    #[default]
    Protoc,
}

/// Configuration for breaking change detection
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetectorConfig {
    /// Report every finding instead of breaking ones only
    #[serde(default)]
    pub all_changes: bool,
    /// Render findings as sentences instead of JSON on stdout
    #[serde(default)]
    pub human_readable_message: bool,
    #[serde(default = "default_line_numbers")]
    pub line_numbers: bool,
    /// Where to write the JSON report
    #[serde(default)]
    pub output_json_path: Option<PathBuf>,
    /// Categories dropped from the result
    #[serde(default)]
    pub except_categories: Vec<FindingCategory>,
    #[serde(default)]
    pub compiler: CompilerBackend,
}

fn default_line_numbers() -> bool {
    true
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            all_changes: false,
            human_readable_message: false,
            line_numbers: default_line_numbers(),
            output_json_path: None,
            except_categories: Vec::new(),
            compiler: CompilerBackend::default(),
        }
    }
}

impl DetectorConfig {
    /// Load configuration from YAML file
    pub fn from_yaml_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&content)
    }

    /// Load configuration from YAML string
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        #[derive(Deserialize)]
        struct ConfigFile {
            detector: Option<DetectorConfig>,
        }

        let config_file: Option<ConfigFile> = serde_yaml::from_str(yaml)?;
        Ok(config_file
            .and_then(|file| file.detector)
            .unwrap_or_default())
    }
}

/// Where the original and updated definitions come from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DetectorInput {
    /// Pre-compiled serialized `FileDescriptorSet` files
    Descriptors { original: PathBuf, update: PathBuf },
    /// `.proto` sources compiled on the fly
    Sources {
        original_dirs: Vec<PathBuf>,
        original_files: Vec<PathBuf>,
        update_dirs: Vec<PathBuf>,
        update_files: Vec<PathBuf>,
    },
}

impl DetectorInput {
    /// Picks the input mode from the raw option values. Exactly one complete
    /// mode must be given.
    pub fn from_options(
        original_descriptor: Option<PathBuf>,
        update_descriptor: Option<PathBuf>,
        original_dirs: Vec<PathBuf>,
        original_files: Vec<PathBuf>,
        update_dirs: Vec<PathBuf>,
        update_files: Vec<PathBuf>,
    ) -> Result<Self> {
        let any_sources = !original_dirs.is_empty()
            || !original_files.is_empty()
            || !update_dirs.is_empty()
            || !update_files.is_empty();
        let any_descriptors = original_descriptor.is_some() || update_descriptor.is_some();

        match (any_descriptors, any_sources) {
            (true, true) => Err(DetectorError::Config(
                "descriptor set files and proto sources are mutually exclusive".to_string(),
            )),
            (false, false) => Err(DetectorError::Config(
                "either descriptor set files or proto sources must be given".to_string(),
            )),
            (true, false) => match (original_descriptor, update_descriptor) {
                (Some(original), Some(update)) => Ok(DetectorInput::Descriptors { original, update }),
                _ => Err(DetectorError::Config(
                    "both the original and the update descriptor set file are required".to_string(),
                )),
            },
            (false, true) => Ok(DetectorInput::Sources {
                original_dirs,
                original_files,
                update_dirs,
                update_files,
            }),
        }
    }

    /// Checks that every referenced directory and file exists
    pub fn validate(&self) -> Result<()> {
        match self {
            DetectorInput::Descriptors { original, update } => {
                require_file(original)?;
                require_file(update)
            }
            DetectorInput::Sources {
                original_dirs,
                original_files,
                update_dirs,
                update_files,
            } => {
                for (side, dirs, files) in [
                    ("original", original_dirs, original_files),
                    ("update", update_dirs, update_files),
                ] {
                    if dirs.is_empty() {
                        return Err(DetectorError::Config(format!(
                            "no {side} definition directory given"
                        )));
                    }
                    if files.is_empty() {
                        return Err(DetectorError::Config(format!("no {side} proto file given")));
                    }
                    for dir in dirs {
                        if !dir.is_dir() {
                            return Err(DetectorError::Config(format!(
                                "{} is not a directory",
                                dir.display()
                            )));
                        }
                    }
                    for file in files {
                        let found = file.is_file() || dirs.iter().any(|dir| dir.join(file).is_file());
                        if !found {
                            return Err(DetectorError::Config(format!(
                                "{} not found in any {side} definition directory",
                                file.display()
                            )));
                        }
                    }
                }
                Ok(())
            }
        }
    }
}

fn require_file(path: &Path) -> Result<()> {
    if path.is_file() {
        Ok(())
    } else {
        Err(DetectorError::Config(format!("{} is not a file", path.display())))
    }
}

//! Loading and compiling API definitions into descriptor sets.

use crate::compat::{Detector, FindingStore};
use crate::config::{CompilerBackend, DetectorConfig, DetectorInput};
use crate::error::{DetectorError, Result};
use crate::model::FileSet;
use protobuf::Message as _;
use protobuf::descriptor::FileDescriptorSet;
use protobuf_parse::Parser;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// One side of a comparison: a compiled descriptor set.
#[derive(Debug, Clone, Default)]
pub struct ApiDefinition {
    descriptor_set: FileDescriptorSet,
}

impl ApiDefinition {
    pub fn new(descriptor_set: FileDescriptorSet) -> Self {
        Self { descriptor_set }
    }

    pub fn descriptor_set(&self) -> &FileDescriptorSet {
        &self.descriptor_set
    }

    /// Reads a serialized `FileDescriptorSet`
    pub fn from_descriptor_set_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let bytes = std::fs::read(path.as_ref())?;
        let descriptor_set = FileDescriptorSet::parse_from_bytes(&bytes)?;
        debug!(path = %path.as_ref().display(), files = descriptor_set.file.len(), "Loaded descriptor set");
        Ok(Self::new(descriptor_set))
    }

    /// Writes the descriptor set in its serialized form
    pub fn write_descriptor_set_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let bytes = self.descriptor_set.write_to_bytes()?;
        std::fs::write(path, bytes)?;
        Ok(())
    }

    /// Compiles `files` with `include_dirs` on the import path. Relative file
    /// names are looked up in the include directories.
    pub fn compile(
        include_dirs: &[PathBuf],
        files: &[PathBuf],
        backend: CompilerBackend,
    ) -> Result<Self> {
        let inputs: Vec<PathBuf> = files
            .iter()
            .map(|file| {
                if file.is_file() {
                    return file.clone();
                }
                include_dirs
                    .iter()
                    .map(|dir| dir.join(file))
                    .find(|candidate| candidate.is_file())
                    .unwrap_or_else(|| file.clone())
            })
            .collect();

        let mut parser = Parser::new();
        match backend {
            CompilerBackend::Pure => {
                parser.pure();
            }
            CompilerBackend::Protoc => {
                parser
                    .protoc()
                    .protoc_path(&protoc_path()?)
                    .protoc_extra_args(["--include_source_info"]);
            }
        }
        parser.includes(include_dirs).inputs(&inputs);

        let command = describe_command(backend, include_dirs, &inputs);
        info!(command = %command, "Compiling proto sources");
        let descriptor_set = parser
            .file_descriptor_set()
            .map_err(|e| DetectorError::InvocationFailed {
                command,
                output: format!("{e:#}"),
            })?;
        Ok(Self::new(descriptor_set))
    }

    /// Compiles in-memory sources given as `(file name, content)` pairs with
    /// the default backend.
    pub fn from_proto_sources(sources: &[(&str, &str)]) -> Result<Self> {
        Self::from_proto_sources_with(sources, CompilerBackend::default())
    }

    pub fn from_proto_sources_with(sources: &[(&str, &str)], backend: CompilerBackend) -> Result<Self> {
        let temp_dir = tempfile::tempdir()?;
        let mut files = Vec::with_capacity(sources.len());
        for (name, content) in sources {
            let path = temp_dir.path().join(name);
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::write(&path, content)?;
            files.push(path);
        }
        Self::compile(&[temp_dir.path().to_path_buf()], &files, backend)
    }

    /// Loads both sides of a comparison
    pub fn from_input(input: &DetectorInput, backend: CompilerBackend) -> Result<(Self, Self)> {
        input.validate()?;
        match input {
            DetectorInput::Descriptors { original, update } => Ok((
                Self::from_descriptor_set_file(original)?,
                Self::from_descriptor_set_file(update)?,
            )),
            DetectorInput::Sources {
                original_dirs,
                original_files,
                update_dirs,
                update_files,
            } => Ok((
                Self::compile(original_dirs, original_files, backend)?,
                Self::compile(update_dirs, update_files, backend)?,
            )),
        }
    }

    /// The semantic model of this definition
    pub fn file_set(&self) -> Result<FileSet<'_>> {
        FileSet::new(&self.descriptor_set)
    }

    /// Compares this definition, as the original, against `update`.
    pub fn check_breaking_changes(
        &self,
        update: &ApiDefinition,
        config: &DetectorConfig,
    ) -> Result<FindingStore> {
        let original = self.file_set()?;
        let update = update.file_set()?;
        Ok(Detector::new().check(&original, &update, config))
    }
}

/// `$PROTOC` wins over the vendored binary
fn protoc_path() -> Result<PathBuf> {
    if let Some(path) = std::env::var_os("PROTOC") {
        return Ok(PathBuf::from(path));
    }
    protoc_bin_vendored::protoc_bin_path().map_err(|e| DetectorError::InvocationFailed {
        command: "protoc".to_string(),
        output: format!("no vendored protoc for this platform: {e}"),
    })
}

fn describe_command(backend: CompilerBackend, include_dirs: &[PathBuf], inputs: &[PathBuf]) -> String {
    let mut parts = vec![match backend {
        CompilerBackend::Pure => "protobuf-parse(pure)".to_string(),
        CompilerBackend::Protoc => "protoc --include_source_info --include_imports".to_string(),
    }];
    parts.extend(include_dirs.iter().map(|dir| format!("-I{}", dir.display())));
    parts.extend(inputs.iter().map(|input| input.display().to_string()));
    parts.join(" ")
}

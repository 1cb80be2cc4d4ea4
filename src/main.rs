use anyhow::{Context, Result};
use clap::Parser;
use proto_breaking::config::{CompilerBackend, DetectorConfig, DetectorInput};
use proto_breaking::{ApiDefinition, Compatibility, FindingCategory, report};
use std::path::PathBuf;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "proto-breaking")]
#[command(about = "Detect breaking changes between two versions of a Protobuf API")]
#[command(version)]
struct Args {
    #[arg(long, value_delimiter = ',', help = "Import directories of the original definition")]
    original_api_definition_dirs: Vec<PathBuf>,
    #[arg(long, value_delimiter = ',', help = "Import directories of the updated definition")]
    update_api_definition_dirs: Vec<PathBuf>,
    #[arg(long, value_delimiter = ',', help = "Proto files of the original definition")]
    original_proto_files: Vec<PathBuf>,
    #[arg(long, value_delimiter = ',', help = "Proto files of the updated definition")]
    update_proto_files: Vec<PathBuf>,
    #[arg(long, help = "Serialized FileDescriptorSet of the original definition")]
    original_descriptor_set_file_path: Option<PathBuf>,
    #[arg(long, help = "Serialized FileDescriptorSet of the updated definition")]
    update_descriptor_set_file_path: Option<PathBuf>,
    #[arg(long, help = "Write findings as JSON to this file")]
    output_json_path: Option<PathBuf>,
    #[arg(long, help = "Print findings as sentences")]
    human_readable_message: bool,
    #[arg(long, help = "Omit line numbers from sentences")]
    no_line_numbers: bool,
    #[arg(long, help = "Report every change, not only breaking ones")]
    all_changes: bool,
    #[arg(long, help = "YAML configuration file with a `detector:` section")]
    config: Option<PathBuf>,
    #[arg(long, value_delimiter = ',', help = "Finding categories to ignore (comma-separated)")]
    except_categories: Vec<FindingCategory>,
    #[arg(long, value_enum, help = "Compiler used for proto sources")]
    compiler: Option<CompilerBackend>,
}

impl Args {
    fn detector_config(&self) -> Result<DetectorConfig> {
        let mut config = match &self.config {
            Some(path) => DetectorConfig::from_yaml_file(path)
                .with_context(|| format!("Failed to load config '{}'", path.display()))?,
            None => DetectorConfig::default(),
        };
        config.all_changes |= self.all_changes;
        config.human_readable_message |= self.human_readable_message;
        if self.no_line_numbers {
            config.line_numbers = false;
        }
        if let Some(path) = &self.output_json_path {
            config.output_json_path = Some(path.clone());
        }
        config.except_categories.extend(self.except_categories.iter().copied());
        if let Some(compiler) = self.compiler {
            config.compiler = compiler;
        }
        Ok(config)
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let config = args.detector_config()?;
    let input = DetectorInput::from_options(
        args.original_descriptor_set_file_path,
        args.update_descriptor_set_file_path,
        args.original_api_definition_dirs,
        args.original_proto_files,
        args.update_api_definition_dirs,
        args.update_proto_files,
    )?;

    if config.compiler == CompilerBackend::Pure && matches!(input, DetectorInput::Sources { .. }) {
        warn!("The pure parser emits no source info: findings carry no line numbers and comment changes are not detected");
    }
    let (original, update) = ApiDefinition::from_input(&input, config.compiler)?;
    info!("Loaded both API definitions");
    let store = original.check_breaking_changes(&update, &config)?;

    let findings = if config.all_changes {
        store.all_findings()
    } else {
        store.breaking_findings()
    };
    info!(findings = findings.len(), "Detection finished");

    if let Some(path) = &config.output_json_path {
        std::fs::write(path, report::to_json(&findings)?)
            .with_context(|| format!("Failed to write '{}'", path.display()))?;
    }
    if config.human_readable_message {
        print!("{}", report::human_readable(&findings, config.line_numbers));
    } else if config.output_json_path.is_none() {
        println!("{}", report::to_json(&findings)?);
    }

    if store.compatibility() == Compatibility::Red {
        std::process::exit(1);
    }
    Ok(())
}

//! CLI definitions using clap.

use std::path::PathBuf;

use clap::Parser;

use depgen::OutputType;

/// depgen - generate conda environments, requirements files and pyproject
/// dependency tables from dependencies.yaml
#[derive(Parser)]
#[command(name = "depgen")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to the dependencies.yaml file
    #[arg(long, default_value = "dependencies.yaml")]
    pub config: PathBuf,

    /// Only generate this file key (requires --output and --matrix; implies --stdout)
    #[arg(long)]
    pub file_key: Option<String>,

    /// Output type to generate for --file-key
    #[arg(long, value_parser = parse_output_type)]
    pub output: Option<OutputType>,

    /// Matrix for --file-key, e.g. "cuda=11.8;arch=x86_64"
    #[arg(long)]
    pub matrix: Option<String>,

    /// Channel to put before the configured ones (only with --file-key)
    #[arg(long = "prepend-channel")]
    pub prepend_channels: Vec<String>,

    /// Remove previously generated files under ROOT (defaults to the
    /// config's directory) before generating
    #[arg(long, value_name = "ROOT", num_args = 0..=1)]
    pub clean: Option<Option<PathBuf>>,

    /// Write generated files to stdout instead of to disk
    #[arg(long)]
    pub stdout: bool,

    /// Token placed before the CUDA major version in pyproject package names
    #[arg(long, default_value = depgen::ops::DEFAULT_CUDA_SUFFIX)]
    pub cuda_suffix: String,

    /// Enable verbose output
    #[arg(short, long)]
    pub verbose: bool,
}

fn parse_output_type(s: &str) -> Result<OutputType, String> {
    match s.parse::<OutputType>()? {
        OutputType::None => Err("`none` cannot be generated".to_string()),
        ty => Ok(ty),
    }
}

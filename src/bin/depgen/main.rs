//! depgen CLI - generate dependency files from dependencies.yaml

use std::path::{Path, PathBuf};

use anyhow::{bail, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

mod cli;

use cli::Cli;
use depgen::ops::{clean, generate, GenerateOptions};
use depgen::util::diagnostic;
use depgen::{Config, GenerateError, Matrix};

fn main() {
    if let Err(e) = run() {
        match e.downcast_ref::<GenerateError>() {
            Some(err) => diagnostic::emit(&err.to_diagnostic(), false),
            None => eprintln!("error: {:#}", e),
        }
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    // Parse CLI
    let cli = Cli::parse();

    // Set up logging; stdout is reserved for generated files
    let filter = if cli.verbose {
        EnvFilter::new("depgen=debug")
    } else {
        EnvFilter::new("depgen=info")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .without_time()
        .with_writer(std::io::stderr)
        .init();

    let mut config = Config::load(&cli.config)?;
    let mut opts = GenerateOptions {
        to_stdout: cli.stdout,
        cuda_suffix: cli.cuda_suffix.clone(),
        prepend_channels: Vec::new(),
    };

    match (&cli.file_key, cli.output, &cli.matrix) {
        (Some(file_key), Some(output), Some(matrix)) => {
            config = config.with_single_file(file_key, output, Matrix::parse_arg(matrix)?)?;
            opts.to_stdout = true;
            opts.prepend_channels = cli.prepend_channels.clone();
        }
        (None, None, None) => {
            if !cli.prepend_channels.is_empty() {
                bail!("--prepend-channel requires --file-key, --output and --matrix");
            }
        }
        _ => bail!("--file-key, --output and --matrix must be given together"),
    }

    if let Some(root) = &cli.clean {
        let root = root.clone().unwrap_or_else(|| config_dir(&cli.config));
        let removed = clean(&root)?;
        tracing::info!("Removed {} generated file(s) under {}", removed.len(), root.display());
    }

    generate(&config, &cli.config, &opts)
}

fn config_dir(config_path: &Path) -> PathBuf {
    match config_path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    }
}

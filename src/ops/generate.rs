//! Implementation of dependency file generation.
//!
//! Every `(file, output type, matrix combination)` triple resolves to one
//! output path. Several triples may land on the same path (for example
//! three file keys that each fill a different table of one
//! `pyproject.toml`), so contributions are accumulated per path and nothing
//! is written until the whole config has been resolved successfully.

use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};

use crate::core::{grid, Config, MatrixCombination, OutputType};
use crate::ops::assemble::{self, Artifact, DEFAULT_CUDA_SUFFIX};
use crate::ops::output;
use crate::resolver::{requested_output_types, resolve_dependencies};
use crate::util::fs;

/// Name of the tool, as shown in generated headers.
pub const TOOL_NAME: &str = "depgen";

/// First line of every generated file.
pub const HEADER: &str = "# This file is generated by `depgen`.";

/// Options for generating dependency files.
#[derive(Debug, Clone)]
pub struct GenerateOptions {
    /// Write every file to stdout instead of to disk
    pub to_stdout: bool,

    /// Token placed before the CUDA major version in pyproject package names
    pub cuda_suffix: String,

    /// Channels placed before the configured ones
    pub prepend_channels: Vec<String>,
}

impl Default for GenerateOptions {
    fn default() -> Self {
        GenerateOptions {
            to_stdout: false,
            cuda_suffix: DEFAULT_CUDA_SUFFIX.to_string(),
            prepend_channels: Vec::new(),
        }
    }
}

/// A fully rendered output file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedFile {
    /// Destination path
    pub path: PathBuf,

    /// Contents, including the header
    pub contents: String,
}

/// Generate every file requested by the config, writing to disk or stdout.
pub fn generate(config: &Config, config_path: &Path, opts: &GenerateOptions) -> Result<()> {
    let files = render(config, config_path, opts)?;

    if opts.to_stdout {
        let stdout = io::stdout();
        let mut out = stdout.lock();
        write_all(&files, &mut out)?;
        out.flush()?;
    } else {
        for file in &files {
            fs::write_string(&file.path, &file.contents)?;
            tracing::info!("Wrote {}", file.path.display());
        }
    }

    Ok(())
}

/// Write rendered files, one after the other, to a single stream.
pub fn write_all<W: Write>(files: &[RenderedFile], out: &mut W) -> Result<()> {
    for file in files {
        out.write_all(file.contents.as_bytes())
            .with_context(|| format!("failed to write {}", file.path.display()))?;
    }
    Ok(())
}

/// Resolve the config into rendered files, in first-touched order, without
/// writing anything.
pub fn render(config: &Config, config_path: &Path, opts: &GenerateOptions) -> Result<Vec<RenderedFile>> {
    let channels: Vec<String> = opts
        .prepend_channels
        .iter()
        .cloned()
        .chain(config.channels())
        .collect();

    let mut artifacts = Artifacts::default();

    for (file_key, file) in &config.files {
        let output_types = requested_output_types(file_key, &file.output)?;

        for output_type in output_types {
            for combination in grid(&file.matrix) {
                tracing::debug!("Generating `{}` ({}) for {}", file_key, output_type, combination);

                let dependencies =
                    resolve_dependencies(config, file_key, file, output_type, &combination)?.dedupe();

                let name = output::filename(output_type, file_key, &combination);
                let path = output::output_dir(output_type, config_path, file).join(&name);

                let artifact = artifacts.get_or_insert_with(&path, || {
                    new_artifact(output_type, &path, &combination, &opts.cuda_suffix)
                })?;

                match (output_type, artifact) {
                    (OutputType::Conda, Artifact::Text(body)) => {
                        let env_name = Path::new(&name)
                            .file_stem()
                            .and_then(|s| s.to_str())
                            .unwrap_or(&name);
                        *body = assemble::environment(body, env_name, &channels, &dependencies)?;
                    }
                    (OutputType::Requirements, Artifact::Text(body)) => {
                        assemble::append_requirements(body, &dependencies);
                    }
                    (OutputType::Pyproject, Artifact::Pyproject(doc)) => {
                        assemble::update_pyproject(doc, &path, file_key, &file.extras, &dependencies)?;
                    }
                    (output_type, _) => {
                        bail!(
                            "cannot write {} output to {}: the path is already used by another output type",
                            output_type,
                            path.display()
                        );
                    }
                }
            }
        }
    }

    Ok(artifacts.finalize(config_path))
}

fn new_artifact(
    output_type: OutputType,
    path: &Path,
    combination: &MatrixCombination,
    cuda_suffix: &str,
) -> Result<Artifact> {
    if output_type.is_edited_in_place() {
        Artifact::load_pyproject(path, combination, cuda_suffix)
    } else {
        Ok(Artifact::Text(String::new()))
    }
}

/// The two header lines written at the top of a generated file.
pub fn header(config_path: &Path, output_dir: &Path) -> String {
    let relative = fs::relative_path(output_dir, config_path);
    format!(
        "{}\n# To make changes, edit {} and run `{}`.\n",
        HEADER,
        relative.display(),
        TOOL_NAME
    )
}

/// Output artifacts keyed by destination path, remembering the order in
/// which paths were first touched.
#[derive(Debug, Default)]
struct Artifacts {
    order: Vec<PathBuf>,
    by_path: HashMap<PathBuf, Artifact>,
}

impl Artifacts {
    fn get_or_insert_with(
        &mut self,
        path: &Path,
        init: impl FnOnce() -> Result<Artifact>,
    ) -> Result<&mut Artifact> {
        match self.by_path.entry(path.to_path_buf()) {
            Entry::Occupied(entry) => Ok(entry.into_mut()),
            Entry::Vacant(entry) => {
                let artifact = init()?;
                self.order.push(path.to_path_buf());
                Ok(entry.insert(artifact))
            }
        }
    }

    fn finalize(mut self, config_path: &Path) -> Vec<RenderedFile> {
        self.order
            .into_iter()
            .filter_map(|path| {
                let artifact = self.by_path.remove(&path)?;
                let dir = path.parent().unwrap_or_else(|| Path::new(""));
                let contents = artifact.finalize(&header(config_path, dir));
                Some(RenderedFile { path, contents })
            })
            .collect()
    }
}

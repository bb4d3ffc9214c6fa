//! `dependencies.yaml` parsing and schema.
//!
//! The config declares the files to generate (`files`) and a catalog of
//! named dependency sets (`dependencies`) that files pull in through their
//! `includes`. Mapping order is preserved everywhere it shows up in output:
//! file keys, dependency keys and matrix axes.

use std::path::Path;

use anyhow::{bail, Context, Result};
use serde::de::{DeserializeOwned, Deserializer, Error as _};
use serde::Deserialize;

use crate::core::dependency::{deserialize_packages, DependencyItem};
use crate::core::matrix::{scalar_to_string, Condition, Matrix};
use crate::core::output_type::OutputType;

/// Channels used when the config does not declare any.
pub const DEFAULT_CHANNELS: &[&str] = &[
    "rapidsai",
    "rapidsai-nightly",
    "dask/label/dev",
    "conda-forge",
    "nvidia",
];

/// The parsed `dependencies.yaml`.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Conda channels for generated environments
    #[serde(default)]
    pub channels: Option<Vec<String>>,

    /// Files to generate, keyed by file key
    #[serde(deserialize_with = "ordered_map")]
    pub files: Vec<(String, FileSpec)>,

    /// Dependency sets, keyed by include name
    #[serde(deserialize_with = "ordered_map")]
    pub dependencies: Vec<(String, DependencyEntry)>,
}

impl Config {
    /// Load a config from a YAML file.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config: {}", path.display()))?;

        Self::parse(&contents)
            .with_context(|| format!("failed to parse config: {}", path.display()))
    }

    /// Parse a config from YAML text.
    pub fn parse(contents: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(contents)?)
    }

    /// Channels for conda environments, falling back to [`DEFAULT_CHANNELS`]
    /// when none are declared.
    pub fn channels(&self) -> Vec<String> {
        match &self.channels {
            Some(channels) if !channels.is_empty() => channels.clone(),
            _ => DEFAULT_CHANNELS.iter().map(|c| c.to_string()).collect(),
        }
    }

    /// Look up a dependency set by include name.
    pub fn dependency(&self, include: &str) -> Option<&DependencyEntry> {
        self.dependencies
            .iter()
            .find(|(name, _)| name == include)
            .map(|(_, entry)| entry)
    }

    /// Look up a file spec by key.
    pub fn file(&self, file_key: &str) -> Option<&FileSpec> {
        self.files
            .iter()
            .find(|(key, _)| key == file_key)
            .map(|(_, spec)| spec)
    }

    /// Narrow the config to a single file with a forced output type and a
    /// one-value-per-axis matrix.
    pub fn with_single_file(mut self, file_key: &str, output: OutputType, matrix: Matrix) -> Result<Self> {
        let Some(pos) = self.files.iter().position(|(key, _)| key == file_key) else {
            bail!("file key `{}` not found in config", file_key);
        };

        let (key, mut spec) = self.files.swap_remove(pos);
        spec.output = OutputSpec::One(output.as_str().to_string());
        spec.matrix = matrix;
        self.files = vec![(key, spec)];
        Ok(self)
    }
}

/// One entry of the `files` section.
#[derive(Debug, Clone, Deserialize)]
pub struct FileSpec {
    /// Requested output type(s)
    pub output: OutputSpec,

    /// Names of dependency sets to pull in, in order
    pub includes: Vec<String>,

    /// Build matrix; empty means a single file with no axes
    #[serde(default)]
    pub matrix: Matrix,

    /// Output-type specific settings
    #[serde(default)]
    pub extras: Extras,

    /// Directory for conda environments, relative to the config
    #[serde(default)]
    pub conda_dir: Option<String>,

    /// Directory for requirements files, relative to the config
    #[serde(default)]
    pub requirements_dir: Option<String>,

    /// Directory containing `pyproject.toml`, relative to the config
    #[serde(default)]
    pub pyproject_dir: Option<String>,
}

impl FileSpec {
    /// The configured directory override for an output type, if any.
    pub fn dir_override(&self, output_type: OutputType) -> Option<&str> {
        match output_type {
            OutputType::Conda => self.conda_dir.as_deref(),
            OutputType::Requirements => self.requirements_dir.as_deref(),
            OutputType::Pyproject => self.pyproject_dir.as_deref(),
            OutputType::None => None,
        }
    }
}

/// The `output` field: a single identifier or a list of them.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum OutputSpec {
    One(String),
    Many(Vec<String>),
}

impl OutputSpec {
    /// The requested identifiers, as written.
    pub fn values(&self) -> Vec<&str> {
        match self {
            OutputSpec::One(value) => vec![value.as_str()],
            OutputSpec::Many(values) => values.iter().map(String::as_str).collect(),
        }
    }
}

/// Output-type specific settings of a file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct Extras {
    /// Dotted path of the pyproject table to write into
    #[serde(default)]
    pub table: Option<String>,

    /// Key within the table
    #[serde(default)]
    pub key: Option<String>,
}

/// One entry of the `dependencies` section.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DependencyEntry {
    /// Rules that apply to every matrix combination
    #[serde(default, deserialize_with = "nullable_list")]
    pub common: Vec<CommonRule>,

    /// Rules selected by matrix combination
    #[serde(default, deserialize_with = "nullable_list")]
    pub specific: Vec<SpecificRule>,
}

/// An unconditional rule.
#[derive(Debug, Clone, Deserialize)]
pub struct CommonRule {
    /// Output types this rule contributes to
    #[serde(deserialize_with = "one_or_many")]
    pub output_types: Vec<OutputType>,

    #[serde(default, deserialize_with = "deserialize_packages")]
    pub packages: Vec<DependencyItem>,
}

/// A rule whose packages depend on the matrix combination.
#[derive(Debug, Clone, Deserialize)]
pub struct SpecificRule {
    /// Output types this rule contributes to
    #[serde(deserialize_with = "one_or_many")]
    pub output_types: Vec<OutputType>,

    /// Candidate entries, tried in order
    pub matrices: Vec<MatrixRule>,
}

/// One candidate entry of a [`SpecificRule`].
#[derive(Debug, Clone, Deserialize)]
pub struct MatrixRule {
    /// Condition on the combination; empty or absent marks the fallback
    #[serde(default)]
    pub matrix: Condition,

    #[serde(default, deserialize_with = "deserialize_packages")]
    pub packages: Vec<DependencyItem>,
}

impl MatrixRule {
    /// Returns true if this entry is the rule's fallback.
    pub fn is_fallback(&self) -> bool {
        self.matrix.is_empty()
    }
}

/// Deserialize a YAML mapping into `(key, value)` pairs, keeping order.
fn ordered_map<'de, D, T>(deserializer: D) -> Result<Vec<(String, T)>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let mapping = Option::<serde_yaml::Mapping>::deserialize(deserializer)?.unwrap_or_default();
    mapping
        .into_iter()
        .map(|(key, value)| {
            let key = scalar_to_string(&key).ok_or_else(|| D::Error::custom("mapping keys must be scalars"))?;
            let value = serde_yaml::from_value(value)
                .map_err(|e| D::Error::custom(format!("invalid entry `{}`: {}", key, e)))?;
            Ok((key, value))
        })
        .collect()
}

fn nullable_list<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
}

fn one_or_many<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum OneOrMany<T> {
        One(T),
        Many(Vec<T>),
    }

    Ok(match OneOrMany::deserialize(deserializer)? {
        OneOrMany::One(value) => vec![value],
        OneOrMany::Many(values) => values,
    })
}

//! Output file types.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// The kind of dependency file to generate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputType {
    /// Conda environment file (`.yaml`)
    Conda,
    /// pip requirements file (`.txt`)
    Requirements,
    /// Dependency tables of an existing `pyproject.toml`, edited in place
    Pyproject,
    /// Generate nothing
    None,
}

impl OutputType {
    /// Every output type, in declaration order.
    pub const ALL: [OutputType; 4] = [
        OutputType::Conda,
        OutputType::Requirements,
        OutputType::Pyproject,
        OutputType::None,
    ];

    /// The identifier used for this type in `dependencies.yaml`.
    pub fn as_str(&self) -> &'static str {
        match self {
            OutputType::Conda => "conda",
            OutputType::Requirements => "requirements",
            OutputType::Pyproject => "pyproject",
            OutputType::None => "none",
        }
    }

    /// File extension of generated files, including the dot.
    pub fn extension(&self) -> &'static str {
        match self {
            OutputType::Conda => ".yaml",
            OutputType::Requirements => ".txt",
            OutputType::Pyproject => ".toml",
            OutputType::None => "",
        }
    }

    /// Prefix placed before the file key in generated file names.
    pub fn file_prefix(&self) -> Option<&'static str> {
        match self {
            OutputType::Requirements => Some("requirements"),
            _ => None,
        }
    }

    /// Default output directory, relative to the config file.
    pub fn default_dir(&self) -> &'static str {
        match self {
            OutputType::Conda => "conda/environments",
            OutputType::Requirements | OutputType::Pyproject => "python",
            OutputType::None => "",
        }
    }

    /// Whether the file is edited in place rather than generated from scratch.
    pub fn is_edited_in_place(&self) -> bool {
        matches!(self, OutputType::Pyproject)
    }
}

impl fmt::Display for OutputType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OutputType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        OutputType::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| format!("unknown output type `{}`", s))
    }
}

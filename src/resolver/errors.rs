//! Configuration error types and diagnostics.

use thiserror::Error;

use crate::core::{MatrixCombination, OutputType};
use crate::util::diagnostic::Diagnostic;

/// A defect in `dependencies.yaml` found while generating files.
#[derive(Debug, Error)]
pub enum GenerateError {
    #[error("invalid output value `{value}` for file `{file_key}`")]
    InvalidOutput { file_key: String, value: String },

    #[error("'output: [none]' cannot be combined with any other values (file `{file_key}`)")]
    NoneCombined { file_key: String },

    #[error("found multiple matches in `{include}` for matrix {combination}")]
    MultipleMatches {
        include: String,
        combination: MatrixCombination,
    },

    #[error("no matching matrix found in `{include}` for: {combination}")]
    NoMatch {
        include: String,
        combination: MatrixCombination,
    },

    #[error("file `{file_key}` includes unknown dependency set `{include}`")]
    UnknownInclude { file_key: String, include: String },

    #[error("file `{file_key}` requests `pyproject` output without `extras.table`")]
    MissingTable { file_key: String },

    #[error("`{path}` has no [project] name")]
    MissingProjectName { path: String },

    #[error("`{section}` in `{path}` is not a table")]
    NotATable { path: String, section: String },
}

impl GenerateError {
    /// Convert to a user-friendly diagnostic.
    pub fn to_diagnostic(&self) -> Diagnostic {
        match self {
            GenerateError::InvalidOutput { file_key, value } => {
                let allowed = OutputType::ALL
                    .iter()
                    .map(|t| format!("'{}'", t))
                    .collect::<Vec<_>>()
                    .join(", ");
                Diagnostic::error(format!(
                    "invalid output `{}` in file `{}`",
                    value, file_key
                ))
                .with_context(format!(
                    "'output' key can only be {} or a list of the non-'none' values",
                    allowed
                ))
            }

            GenerateError::NoneCombined { file_key } => Diagnostic::error(format!(
                "file `{}` combines 'none' with other outputs",
                file_key
            ))
            .with_suggestion("Use `output: none` on its own to skip the file"),

            GenerateError::MultipleMatches {
                include,
                combination,
            } => Diagnostic::error(format!(
                "multiple `specific` entries in `{}` match the same matrix",
                include
            ))
            .with_context(format!("matrix: {}", combination))
            .with_suggestion("Make the `matrix` conditions of the entries mutually exclusive"),

            GenerateError::NoMatch {
                include,
                combination,
            } => Diagnostic::error(format!("no `specific` entry in `{}` applies", include))
                .with_context(format!("matrix: {}", combination))
                .with_suggestion("Add an entry for this matrix")
                .with_suggestion("Add a fallback entry without a `matrix` key"),

            GenerateError::UnknownInclude { file_key, include } => Diagnostic::error(format!(
                "dependency set `{}` not found",
                include
            ))
            .with_context(format!("included by file `{}`", file_key))
            .with_suggestion("Check the spelling against the keys of `dependencies`"),

            GenerateError::MissingTable { file_key } => {
                Diagnostic::error(format!("file `{}` is missing `extras.table`", file_key))
                    .with_suggestion("Set `extras.table`, e.g. `project` or `build-system`")
            }

            GenerateError::MissingProjectName { path } => {
                Diagnostic::error(format!("`{}` has no [project] name", path)).with_location(path)
            }

            GenerateError::NotATable { path, section } => {
                Diagnostic::error(format!("`{}` is not a table", section)).with_location(path)
            }
        }
    }
}

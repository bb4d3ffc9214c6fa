//! Dependency selection for one generated file.
//!
//! For a `(file, output type, combination)` triple, walk the file's includes
//! in order and collect the packages of every applicable `common` rule and
//! the single applicable entry of every `specific` rule.

use crate::core::{
    Config, DependencyEntry, DependencyList, FileSpec, MatrixCombination, OutputSpec, OutputType,
    SpecificRule,
};
use crate::resolver::errors::GenerateError;

/// Resolve the requested output types of a file.
///
/// `none` alone yields no output types. `none` combined with anything else
/// and unknown identifiers are errors.
pub fn requested_output_types(
    file_key: &str,
    output: &OutputSpec,
) -> Result<Vec<OutputType>, GenerateError> {
    let values = output.values();

    if values == [OutputType::None.as_str()] {
        return Ok(Vec::new());
    }

    if values.len() > 1 && values.contains(&OutputType::None.as_str()) {
        return Err(GenerateError::NoneCombined {
            file_key: file_key.to_string(),
        });
    }

    values
        .into_iter()
        .map(|value| match value.parse::<OutputType>() {
            Ok(ty) if ty != OutputType::None => Ok(ty),
            _ => Err(GenerateError::InvalidOutput {
                file_key: file_key.to_string(),
                value: value.to_string(),
            }),
        })
        .collect()
}

/// Collect the raw (not deduplicated) dependencies of one generated file.
pub fn resolve_dependencies(
    config: &Config,
    file_key: &str,
    file: &FileSpec,
    output_type: OutputType,
    combination: &MatrixCombination,
) -> Result<DependencyList, GenerateError> {
    let mut dependencies = DependencyList::new();

    for include in &file.includes {
        let entry = config
            .dependency(include)
            .ok_or_else(|| GenerateError::UnknownInclude {
                file_key: file_key.to_string(),
                include: include.clone(),
            })?;

        tracing::debug!("Resolving `{}` for {} {}", include, output_type, combination);
        resolve_entry(entry, include, output_type, combination, &mut dependencies)?;
    }

    Ok(dependencies)
}

fn resolve_entry(
    entry: &DependencyEntry,
    include: &str,
    output_type: OutputType,
    combination: &MatrixCombination,
    dependencies: &mut DependencyList,
) -> Result<(), GenerateError> {
    for common in &entry.common {
        if common.output_types.contains(&output_type) {
            dependencies.extend(&common.packages);
        }
    }

    for specific in &entry.specific {
        if specific.output_types.contains(&output_type) {
            resolve_specific(specific, include, combination, dependencies)?;
        }
    }

    Ok(())
}

fn resolve_specific(
    rule: &SpecificRule,
    include: &str,
    combination: &MatrixCombination,
    dependencies: &mut DependencyList,
) -> Result<(), GenerateError> {
    let mut found = false;
    let mut fallback = None;

    for candidate in &rule.matrices {
        if candidate.is_fallback() {
            if fallback.is_some() {
                tracing::warn!(
                    "`{}` declares more than one fallback entry; the last one is used",
                    include
                );
            }
            fallback = Some(candidate);
            continue;
        }

        if combination.matches(&candidate.matrix) {
            if found {
                return Err(GenerateError::MultipleMatches {
                    include: include.to_string(),
                    combination: combination.clone(),
                });
            }
            found = true;
            // An empty list installs nothing
            dependencies.extend(&candidate.packages);
        }
    }

    if !found {
        match fallback {
            Some(fallback) => dependencies.extend(&fallback.packages),
            None => {
                return Err(GenerateError::NoMatch {
                    include: include.to_string(),
                    combination: combination.clone(),
                })
            }
        }
    }

    Ok(())
}

//! Output file names and locations.

use std::path::{Path, PathBuf};

use crate::core::{FileSpec, MatrixCombination, OutputType};

/// Get the name of the file a generated dependency set is written to.
///
/// The name is the `_`-joined output-type prefix, file key and matrix
/// suffix (`cuda-11.8_arch-x86_64`), with every `.` removed, followed by the
/// output type's extension. `pyproject.toml` is never prefixed or suffixed.
pub fn filename(output_type: OutputType, file_key: &str, combination: &MatrixCombination) -> String {
    let (name, suffix) = if output_type.is_edited_in_place() {
        (output_type.as_str(), String::new())
    } else {
        let suffix = combination
            .iter()
            .map(|(axis, value)| format!("{}-{}", axis, value))
            .collect::<Vec<_>>()
            .join("_");
        (file_key, suffix)
    };

    let stem = [output_type.file_prefix().unwrap_or(""), name, suffix.as_str()]
        .into_iter()
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join("_")
        .replace('.', "");

    format!("{}{}", stem, output_type.extension())
}

/// Get the directory a generated file is written to: the file's directory
/// override for this output type, or the type's default, relative to the
/// directory containing the config.
pub fn output_dir(output_type: OutputType, config_path: &Path, file: &FileSpec) -> PathBuf {
    let base = config_path.parent().unwrap_or_else(|| Path::new(""));
    base.join(
        file.dir_override(output_type)
            .unwrap_or_else(|| output_type.default_dir()),
    )
}

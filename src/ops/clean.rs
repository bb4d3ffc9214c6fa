//! Removal of previously generated files.

use std::path::{Path, PathBuf};

use anyhow::Result;

use crate::ops::generate::HEADER;
use crate::util::fs;

/// Delete every `.txt` and `.yaml` file under `root` that carries the
/// generated-file header. Returns the removed paths.
///
/// `pyproject.toml` files are edited in place and are never removed.
pub fn clean(root: &Path) -> Result<Vec<PathBuf>> {
    let mut removed = Vec::new();

    for path in fs::files_with_extensions(root, &["txt", "yaml"]) {
        let contents = match std::fs::read_to_string(&path) {
            Ok(contents) => contents,
            Err(e) => {
                tracing::debug!("Skipping {}: {}", path.display(), e);
                continue;
            }
        };

        if contents.contains(HEADER) {
            fs::remove_file(&path)?;
            tracing::debug!("Removed {}", path.display());
            removed.push(path);
        }
    }

    Ok(removed)
}

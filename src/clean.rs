//! Output cleaning.

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::WrapError;
use crate::platform::Platform;

/// Remove every file in `dir` whose name starts with `prefix`.
///
/// A missing directory has nothing to remove. Returns the removed paths in
/// name order.
pub fn remove_prefixed(dir: &Path, prefix: &str) -> Result<Vec<PathBuf>, WrapError> {
    if !dir.is_dir() {
        return Ok(Vec::new());
    }

    let mut matched = Vec::new();
    for entry in fs::read_dir(dir).map_err(|e| WrapError::prune(dir, e))? {
        let entry = entry.map_err(|e| WrapError::prune(dir, e))?;
        let is_file = entry
            .file_type()
            .map_err(|e| WrapError::prune(entry.path(), e))?
            .is_file();
        if is_file && entry.file_name().to_string_lossy().starts_with(prefix) {
            matched.push(entry.path());
        }
    }
    matched.sort();

    for path in &matched {
        fs::remove_file(path).map_err(|e| WrapError::prune(path, e))?;
    }
    Ok(matched)
}

/// Clean every wrapper and preamble of one platform.
pub fn clean_platform(output_dir: &Path, platform: Platform) -> Result<Vec<PathBuf>, WrapError> {
    remove_prefixed(output_dir, &format!("{}_", platform))
}

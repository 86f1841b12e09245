//! Workspace pruning.
//!
//! After probing, an upstream checkout still contains build scripts, docs,
//! tests and VCS metadata. Pruning deletes everything the wrappers don't
//! reference, leaving only the allow-listed directories, sources, headers and
//! the license. Running it again on a pruned tree removes nothing.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;
use walkdir::WalkDir;

use crate::error::WrapError;

/// Declarative allow-list for one library's top-level tree.
#[derive(Debug, Clone, Copy)]
pub struct PruneRules {
    /// Top-level directories kept intact (except for purges).
    pub keep_dirs: &'static [&'static str],
    /// Top-level files kept regardless of extension.
    pub keep_files: &'static [&'static str],
    /// Top-level files kept by extension (without the dot).
    pub keep_extensions: &'static [&'static str],
    /// Second-level allow-list inside one kept directory.
    pub nested: Option<NestedRules>,
}

/// Allow-list applied inside one kept top-level directory.
#[derive(Debug, Clone, Copy)]
pub struct NestedRules {
    pub dir: &'static str,
    /// Directories kept; loose files are always removed.
    pub keep_dirs: &'static [&'static str],
    /// Directory names deleted wherever they occur below `dir`.
    pub purge: &'static [&'static str],
}

/// What a prune pass removed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PruneReport {
    pub removed: Vec<PathBuf>,
}

impl PruneRules {
    fn keeps_file(&self, name: &str) -> bool {
        if self.keep_files.contains(&name) {
            return true;
        }
        match Path::new(name).extension().and_then(|e| e.to_str()) {
            Some(ext) => self.keep_extensions.contains(&ext),
            None => false,
        }
    }
}

/// Prune `root` according to `rules`.
pub fn prune(root: &Path, rules: &PruneRules) -> Result<PruneReport, WrapError> {
    let mut report = PruneReport::default();

    for (path, is_dir) in sorted_entries(root)? {
        let name = file_name(&path);
        let keep = if is_dir {
            rules.keep_dirs.contains(&name.as_str())
        } else {
            rules.keeps_file(&name)
        };
        if !keep {
            remove(&path, is_dir, &mut report)?;
        }
    }

    if let Some(nested) = &rules.nested {
        let dir = root.join(nested.dir);
        if dir.is_dir() {
            prune_nested(&dir, nested, &mut report)?;
        }
    }

    debug!(root = %root.display(), removed = report.removed.len(), "pruned");
    Ok(report)
}

fn prune_nested(dir: &Path, rules: &NestedRules, report: &mut PruneReport) -> Result<(), WrapError> {
    for (path, is_dir) in sorted_entries(dir)? {
        if is_dir && rules.keep_dirs.contains(&file_name(&path).as_str()) {
            continue;
        }
        remove(&path, is_dir, report)?;
    }

    if rules.purge.is_empty() {
        return Ok(());
    }

    let mut purge = Vec::new();
    let mut walker = WalkDir::new(dir).sort_by_file_name().into_iter();
    while let Some(entry) = walker.next() {
        let entry = entry.map_err(|e| {
            let path = e.path().map(Path::to_path_buf).unwrap_or_else(|| dir.to_path_buf());
            WrapError::prune(path, e.into())
        })?;
        if entry.file_type().is_dir()
            && rules
                .purge
                .iter()
                .any(|p| entry.file_name() == std::ffi::OsStr::new(p))
        {
            purge.push(entry.into_path());
            walker.skip_current_dir();
        }
    }
    for path in purge {
        remove(&path, true, report)?;
    }
    Ok(())
}

fn sorted_entries(dir: &Path) -> Result<Vec<(PathBuf, bool)>, WrapError> {
    let read = fs::read_dir(dir).map_err(|e| WrapError::prune(dir, e))?;
    let mut entries = Vec::new();
    for entry in read {
        let entry = entry.map_err(|e| WrapError::prune(dir, e))?;
        let file_type = entry.file_type().map_err(|e| WrapError::prune(entry.path(), e))?;
        entries.push((entry.path(), file_type.is_dir()));
    }
    entries.sort();
    Ok(entries)
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

fn remove(path: &Path, is_dir: bool, report: &mut PruneReport) -> Result<(), WrapError> {
    let result = if is_dir {
        fs::remove_dir_all(path)
    } else {
        fs::remove_file(path)
    };
    result.map_err(|e| WrapError::prune(path, e))?;
    report.removed.push(path.to_path_buf());
    Ok(())
}

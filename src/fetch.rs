//! Repository acquisition.
//!
//! Every fetch starts by wiping the library workspace, so a re-run never sees
//! drift from a partial earlier run.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::info;

use crate::error::WrapError;
use crate::library::LibrarySpec;
use crate::process::Cmd;
use crate::toolenv::BuildEnv;

/// A fresh checkout of a pinned tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Checkout {
    pub path: PathBuf,
    /// Committer date of the checked-out revision, as printed by git.
    pub commit_date: String,
}

/// Source of upstream trees.
pub trait Fetcher {
    /// Replace `spec.workspace` with a fresh checkout of `spec.tag`.
    fn fetch(&self, spec: &LibrarySpec) -> Result<Checkout, WrapError>;
}

/// Shallow `git clone` of the pinned tag.
pub struct GitFetcher<'a> {
    env: &'a BuildEnv,
}

impl<'a> GitFetcher<'a> {
    pub fn new(env: &'a BuildEnv) -> Self {
        Self { env }
    }
}

impl Fetcher for GitFetcher<'_> {
    fn fetch(&self, spec: &LibrarySpec) -> Result<Checkout, WrapError> {
        let dest = &spec.workspace;
        wipe_workspace(dest)?;

        info!(library = %spec.library, url = spec.url, tag = spec.tag, "cloning");
        Cmd::new("git")
            .args(["clone", "--depth", "1", "-b", spec.tag, spec.url])
            .arg_path(dest)
            .build_env(self.env)
            .run()
            .map_err(|source| WrapError::Fetch {
                url: spec.url.to_string(),
                tag: spec.tag.to_string(),
                source,
            })?;

        let date = Cmd::new("git")
            .args(["show", "-s", "--format=%cd"])
            .dir(dest)
            .build_env(self.env)
            .run()?;

        Ok(Checkout {
            path: dest.clone(),
            commit_date: date.stdout_trimmed().to_string(),
        })
    }
}

/// Remove a workspace left over from an earlier run and create its parent.
pub fn wipe_workspace(dest: &Path) -> Result<(), WrapError> {
    if dest.exists() {
        fs::remove_dir_all(dest).map_err(|e| WrapError::prune(dest, e))?;
    }
    if let Some(parent) = dest.parent() {
        fs::create_dir_all(parent).map_err(|e| WrapError::prune(parent, e))?;
    }
    Ok(())
}

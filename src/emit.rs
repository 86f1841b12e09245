//! Wrapper and preamble emission.
//!
//! A wrapper is a tiny C translation unit that includes exactly one upstream
//! source from the pruned workspace, guarded by the target condition and, for
//! optional libraries, by the feature define. The preamble is a TOML document
//! holding the compiler settings every wrapper of the library needs.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::clean::remove_prefixed;
use crate::error::{EmitCause, WrapError};
use crate::libs::LibraryProfile;
use crate::platform::Platform;
use crate::template::Template;
use crate::unit::WrapperFile;

/// Parsed form of an emitted preamble file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Preamble {
    pub library: String,
    /// `cfg(...)` expression of the platform's targets.
    pub target: String,
    /// C preprocessor form of `target`.
    pub condition: String,
    /// Feature selecting the embedded copy; absent when always embedded.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub feature: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub feature_define: Option<String>,
    /// Include directories, relative to the output directory.
    pub include_dirs: Vec<String>,
    #[serde(default)]
    pub defines: Vec<String>,
    /// Libraries linked whenever this library is embedded.
    #[serde(default)]
    pub link_libs: Vec<String>,
    /// Libraries linked instead when the system copy is used.
    #[serde(default)]
    pub system_libs: Vec<String>,
}

impl Preamble {
    /// Preamble of one library for the given platform.
    ///
    /// Include directories are relative to the output directory: the config
    /// root first, then the workspace directories.
    pub fn for_library(platform: Platform, profile: &LibraryProfile) -> Self {
        let filter = platform.target_filter();
        let workspace = format!("../{}/{}", platform, profile.library);
        let strings = |items: &[&str]| items.iter().map(|s| s.to_string()).collect::<Vec<_>>();

        let mut include_dirs: Vec<String> = profile
            .config_root
            .map(|root| format!("../{}", root))
            .into_iter()
            .collect();
        include_dirs.extend(profile.preamble.include_dirs.iter().map(|dir| {
            if dir.is_empty() {
                workspace.clone()
            } else {
                format!("{}/{}", workspace, dir)
            }
        }));

        Self {
            library: profile.library.name().to_string(),
            target: filter.cfg_expr(),
            condition: filter.c_condition(),
            feature: profile.feature.map(|f| f.name.to_string()),
            feature_define: profile.feature.map(|f| f.define.to_string()),
            include_dirs,
            defines: strings(profile.preamble.defines),
            link_libs: strings(profile.preamble.link_libs),
            system_libs: strings(profile.preamble.system_libs),
        }
    }

    pub fn read(path: &Path) -> Result<Self, WrapError> {
        let text = fs::read_to_string(path).map_err(|e| WrapError::emit(path, e))?;
        toml::from_str(&text).map_err(|e| WrapError::emit(path, e))
    }
}

/// File name of the preamble for one library.
pub fn preamble_name(platform: Platform, profile: &LibraryProfile) -> String {
    format!("{}_{}_preamble.toml", platform, profile.library)
}

/// File-name prefix shared by everything emitted for one library.
pub fn library_prefix(platform: Platform, profile: &LibraryProfile) -> String {
    format!("{}_{}_", platform, profile.library)
}

/// What one emission wrote.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmitReport {
    pub wrappers: Vec<PathBuf>,
    pub preamble: PathBuf,
    /// Files from an earlier run removed before writing.
    pub stale: usize,
}

/// Writes wrappers and the preamble of one library into the output directory.
pub struct Emitter<'a> {
    pub output_dir: &'a Path,
    pub platform: Platform,
    pub profile: &'a LibraryProfile,
    /// Pruned workspace the wrappers include from.
    pub workspace: &'a Path,
}

impl Emitter<'_> {
    /// Replace every file previously emitted for this library.
    pub fn emit(&self, wrappers: &[WrapperFile]) -> Result<EmitReport, WrapError> {
        fs::create_dir_all(self.output_dir).map_err(|e| WrapError::emit(self.output_dir, e))?;
        let stale = remove_prefixed(self.output_dir, &library_prefix(self.platform, self.profile))?;
        if !stale.is_empty() {
            debug!(library = %self.profile.library, removed = stale.len(), "removed stale wrappers");
        }

        let workspace_rel = format!("../{}/{}", self.platform, self.profile.library);
        let template = Template::new(self.profile.unit_template);
        let mut written = Vec::with_capacity(wrappers.len());

        for wrapper in wrappers {
            let dest = self.output_dir.join(&wrapper.output);
            let source = self.workspace.join(&wrapper.source);
            if !source.is_file() {
                return Err(WrapError::emit(dest, EmitCause::MissingSource(source)));
            }
            let text = template
                .render(&[
                    ("TARGET_CFG", wrapper.filter.cfg_expr()),
                    ("TARGET_CONDITION", wrapper.filter.c_condition()),
                    ("PLATFORM", self.platform.to_string()),
                    ("WORKSPACE", workspace_rel.clone()),
                    ("SOURCE", wrapper.source.to_string_lossy().into_owned()),
                ])
                .map_err(|name| WrapError::emit(&dest, EmitCause::Placeholder(name)))?;
            fs::write(&dest, text).map_err(|e| WrapError::emit(&dest, e))?;
            written.push(dest);
        }

        let preamble = self.emit_preamble()?;
        info!(
            library = %self.profile.library,
            wrappers = written.len(),
            "emitted wrappers"
        );

        Ok(EmitReport {
            wrappers: written,
            preamble,
            stale: stale.len(),
        })
    }

    fn emit_preamble(&self) -> Result<PathBuf, WrapError> {
        let dest = self.output_dir.join(preamble_name(self.platform, self.profile));
        let preamble = Preamble::for_library(self.platform, self.profile);
        let body = toml::to_string(&preamble).map_err(|e| WrapError::emit(&dest, e))?;
        let text = format!("# Generated by libtor-wrap. Do not edit.\n{}", body);
        fs::write(&dest, text).map_err(|e| WrapError::emit(&dest, e))?;
        Ok(dest)
    }
}

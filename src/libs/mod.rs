//! Per-library profiles.
//!
//! Each wrapped library is described declaratively: where it comes from, how
//! its build system is queried, what survives pruning, how wrappers and the
//! preamble look, and which configuration headers it ships. The pipeline is
//! the same for all four; only the profile differs.

mod libevent;
mod openssl;
mod tor;
mod zlib;

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use regex::Regex;

use crate::driver::ToolStep;
use crate::error::{ConfigCause, WrapError};
use crate::extract::{Exclusions, Grammar};
use crate::fetch::Checkout;
use crate::library::Library;
use crate::materialize::ConfigArtifact;
use crate::prune::PruneRules;
use crate::unit::CompilationUnit;

/// Substitution values read from an upstream checkout.
pub type Metadata = BTreeMap<&'static str, String>;

/// How the unit set of a library is discovered.
#[derive(Debug, Clone, Copy)]
pub enum Discovery {
    /// Every top-level `.c` file, sorted by name.
    TopLevelSources,
    /// Stems extracted from a build-tool dry run.
    DryRun {
        step: ToolStep,
        grammar: Grammar,
        exclusions: Exclusions,
    },
}

/// Cargo-style feature selecting the embedded copy of a library.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Feature {
    pub name: &'static str,
    /// Preprocessor symbol guarding the wrappers.
    pub define: &'static str,
}

/// Compiler settings every wrapper of a library needs.
#[derive(Debug, Clone, Copy)]
pub struct PreambleSpec {
    /// Include directories inside the workspace; `""` is the workspace itself.
    pub include_dirs: &'static [&'static str],
    pub defines: &'static [&'static str],
    /// Linked whenever the library is embedded.
    pub link_libs: &'static [&'static str],
    /// Linked instead when the system copy is used.
    pub system_libs: &'static [&'static str],
}

/// Everything the pipeline needs to know about one library.
#[derive(Clone, Copy)]
pub struct LibraryProfile {
    pub library: Library,
    pub url: &'static str,
    pub tag: &'static str,
    pub configure: &'static [ToolStep],
    pub discovery: Discovery,
    pub prune: PruneRules,
    pub feature: Option<Feature>,
    /// Wrapper template, rendered once per wrapper file.
    pub unit_template: &'static str,
    /// Compiler settings written to the preamble.
    pub preamble: PreambleSpec,
    /// Output directory for config headers, relative to the repository root.
    pub config_root: Option<&'static str>,
    /// Reads substitution values after configuration, before pruning.
    pub metadata: fn(&Checkout) -> Result<Metadata, WrapError>,
    /// Turns an extracted stem into a compilation unit.
    pub classify: fn(Library, &str) -> CompilationUnit,
    /// Configuration headers to materialize, rendered with the metadata.
    pub config: fn() -> Vec<ConfigArtifact>,
}

impl LibraryProfile {
    pub fn for_library(library: Library) -> &'static LibraryProfile {
        match library {
            Library::Zlib => &zlib::PROFILE,
            Library::Openssl => &openssl::PROFILE,
            Library::Libevent => &libevent::PROFILE,
            Library::Tor => &tor::PROFILE,
        }
    }
}

fn no_metadata(_: &Checkout) -> Result<Metadata, WrapError> {
    Ok(Metadata::new())
}

fn no_config() -> Vec<ConfigArtifact> {
    Vec::new()
}

/// Target classes the autoconf-derived headers are rendered for.
#[derive(Debug, Clone, Copy)]
pub(crate) struct TargetClass {
    pub suffix: &'static str,
    pub selector: &'static str,
    pub lp64: bool,
    pub epoll: bool,
    pub kqueue: bool,
    /// libc ships `strlcpy` and `strlcat` (BSD libcs and bionic, not glibc).
    pub strlcpy: bool,
}

/// Linux and Android in both widths, plus 64-bit macOS and iOS.
pub(crate) const TARGET_CLASSES: [TargetClass; 6] = [
    TargetClass {
        suffix: "linux64",
        selector: "defined(__linux__) && !defined(__ANDROID__) && defined(__LP64__)",
        lp64: true,
        epoll: true,
        kqueue: false,
        strlcpy: false,
    },
    TargetClass {
        suffix: "linux32",
        selector: "defined(__linux__) && !defined(__ANDROID__) && !defined(__LP64__)",
        lp64: false,
        epoll: true,
        kqueue: false,
        strlcpy: false,
    },
    TargetClass {
        suffix: "android64",
        selector: "defined(__ANDROID__) && defined(__LP64__)",
        lp64: true,
        epoll: true,
        kqueue: false,
        strlcpy: true,
    },
    TargetClass {
        suffix: "android32",
        selector: "defined(__ANDROID__) && !defined(__LP64__)",
        lp64: false,
        epoll: true,
        kqueue: false,
        strlcpy: true,
    },
    TargetClass {
        suffix: "macos64",
        selector: "defined(__ENVIRONMENT_MAC_OS_X_VERSION_MIN_REQUIRED__)",
        lp64: true,
        epoll: false,
        kqueue: true,
        strlcpy: true,
    },
    TargetClass {
        suffix: "ios64",
        selector: "defined(__ENVIRONMENT_IPHONE_OS_VERSION_MIN_REQUIRED__)",
        lp64: true,
        epoll: false,
        kqueue: true,
        strlcpy: true,
    },
];

impl TargetClass {
    /// Type sizes shared by every autoconf-derived header.
    pub fn sizes(&self) -> Vec<(&'static str, String)> {
        let word = if self.lp64 { "8" } else { "4" };
        vec![
            ("SIZEOF_LONG", word.to_string()),
            ("SIZEOF_SIZE_T", word.to_string()),
            ("SIZEOF_VOID_P", word.to_string()),
        ]
    }
}

fn classify_direct(library: Library, stem: &str) -> CompilationUnit {
    CompilationUnit::direct(library, stem)
}

/// First capture of `pattern` in the file at `path`.
///
/// A missing file or a pattern without a match are both configuration errors.
pub(crate) fn capture_from(path: &Path, pattern: &'static str) -> Result<String, WrapError> {
    let text = fs::read_to_string(path).map_err(|e| WrapError::config(path, e))?;
    let re = Regex::new(pattern).map_err(|_| WrapError::config(path, ConfigCause::Pattern(pattern)))?;
    re.captures(&text)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().trim().to_string())
        .ok_or_else(|| WrapError::config(path, ConfigCause::Pattern(pattern)))
}

/// Autoconf-style line for an optional feature macro.
pub(crate) fn flag(name: &str, on: bool) -> String {
    if on {
        format!("#define {} 1", name)
    } else {
        format!("/* #undef {} */", name)
    }
}

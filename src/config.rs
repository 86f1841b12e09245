//! Configuration management for libtor-wrap.
//!
//! Reads configuration from the environment after `.env` has been loaded.
//! Environment variables take precedence over `.env`.

use std::path::{Component, Path, PathBuf};

use anyhow::{bail, Context, Result};
use serde::Serialize;

use crate::pipeline::WrapContext;
use crate::platform::Platform;
use crate::toolenv::BuildEnv;

/// Default output directory name, relative to the root.
pub const DEFAULT_OUTPUT: &str = "libtor";

/// Default C compiler for verify builds.
pub const DEFAULT_CC: &str = "cc";

/// libtor-wrap configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Config {
    /// Repository root the workspaces, wrappers and config headers live in.
    pub root: PathBuf,
    /// Name of the wrapper directory directly below the root.
    pub output: String,
    /// Config header templates, one subdirectory per library.
    pub templates: PathBuf,
    /// Platform to wrap for (defaults to the host).
    pub platform: Platform,
    /// Overrides the platform's default CFLAGS.
    pub cflags: Option<String>,
    /// Overrides the platform's default LDFLAGS.
    pub ldflags: Option<String>,
    pub cc: String,
}

impl Config {
    /// Load configuration from the process environment.
    pub fn load(base_dir: &Path) -> Result<Self> {
        Self::from_lookup(base_dir, |key| std::env::var(key).ok())
    }

    /// Build configuration from a variable lookup.
    ///
    /// Relative paths resolve against `base_dir`.
    pub fn from_lookup(base_dir: &Path, lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let resolve = |value: String| {
            let path = PathBuf::from(value);
            if path.is_absolute() {
                path
            } else {
                base_dir.join(path)
            }
        };

        let root = get("LIBTOR_WRAP_ROOT")
            .map(resolve)
            .unwrap_or_else(|| base_dir.to_path_buf());

        // Wrappers include their sources as ../<platform>/<library>/..., so the
        // output must sit directly below the root.
        let output = get("LIBTOR_WRAP_OUTPUT").unwrap_or_else(|| DEFAULT_OUTPUT.to_string());
        let mut components = Path::new(&output).components();
        match (components.next(), components.next()) {
            (Some(Component::Normal(_)), None) => {}
            _ => bail!(
                "LIBTOR_WRAP_OUTPUT must be a single directory name below the root, got '{}'",
                output
            ),
        }

        let templates = get("LIBTOR_WRAP_TEMPLATES")
            .map(resolve)
            .unwrap_or_else(|| Path::new(env!("CARGO_MANIFEST_DIR")).join("config"));

        let platform = match get("LIBTOR_WRAP_PLATFORM") {
            Some(name) => name
                .parse::<Platform>()
                .map_err(anyhow::Error::msg)
                .context("invalid LIBTOR_WRAP_PLATFORM")?,
            None => match Platform::host() {
                Some(platform) => platform,
                None => bail!("unsupported host platform; set LIBTOR_WRAP_PLATFORM to linux or darwin"),
            },
        };

        Ok(Self {
            root,
            output,
            templates,
            platform,
            cflags: get("LIBTOR_WRAP_CFLAGS"),
            ldflags: get("LIBTOR_WRAP_LDFLAGS"),
            cc: get("CC").unwrap_or_else(|| DEFAULT_CC.to_string()),
        })
    }

    /// Build environment for every external invocation of the run.
    pub fn build_env(&self) -> BuildEnv {
        let mut env = BuildEnv::for_platform(self.platform);
        if let Some(cflags) = &self.cflags {
            env = env.with_cflags(cflags).with_var("CFLAGS", cflags);
        }
        if let Some(ldflags) = &self.ldflags {
            env = env.with_ldflags(ldflags).with_var("LDFLAGS", ldflags);
        }
        if self.cc != DEFAULT_CC {
            env = env.with_var("CC", &self.cc);
        }
        env
    }

    /// Run context for the pipeline and verify actions.
    pub fn context(&self) -> WrapContext {
        WrapContext {
            root: self.root.clone(),
            platform: self.platform,
            output_dir: self.root.join(&self.output),
            templates: self.templates.clone(),
            env: self.build_env(),
        }
    }

    /// Print configuration for debugging.
    pub fn print(&self) {
        println!("Configuration:");
        println!("  LIBTOR_WRAP_ROOT: {}", self.root.display());
        println!("  LIBTOR_WRAP_OUTPUT: {}", self.output);
        println!("  LIBTOR_WRAP_TEMPLATES: {}", self.templates.display());
        println!("  LIBTOR_WRAP_PLATFORM: {}", self.platform);
        println!(
            "  LIBTOR_WRAP_CFLAGS: {}",
            self.cflags.as_deref().unwrap_or("(platform default)")
        );
        println!(
            "  LIBTOR_WRAP_LDFLAGS: {}",
            self.ldflags.as_deref().unwrap_or("(platform default)")
        );
        println!("  CC: {}", self.cc);
        self.build_env().print();
        if self.templates.is_dir() {
            println!("  Templates: FOUND");
        } else {
            println!("  Templates: NOT FOUND");
        }
    }
}

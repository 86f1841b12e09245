//! The wrapping pipeline.
//!
//! Each library moves through the same strictly ordered stages:
//!
//! ```text
//! Fetched -> Configured -> Extracted -> Pruned -> Expanded -> Emitted -> Materialized
//! ```
//!
//! Libraries run one after another in link-dependency order. The first error
//! aborts the run; libraries after the failing one are never started.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, error, info};

use crate::clean::clean_platform;
use crate::driver::BuildDriver;
use crate::emit::Emitter;
use crate::error::WrapError;
use crate::expand::expand;
use crate::extract::{extract, Extracted};
use crate::fetch::{Checkout, Fetcher};
use crate::library::{Library, LibrarySpec};
use crate::libs::{Discovery, LibraryProfile, Metadata};
use crate::materialize::materialize;
use crate::platform::Platform;
use crate::prune::prune;
use crate::timing::Timer;
use crate::toolenv::BuildEnv;
use crate::unit::{CompilationUnit, WrapperFile};

/// Per-library pipeline stage, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Stage {
    Fetched,
    Configured,
    Extracted,
    Pruned,
    Expanded,
    Emitted,
    Materialized,
}

impl Stage {
    pub const ALL: [Stage; 7] = [
        Stage::Fetched,
        Stage::Configured,
        Stage::Extracted,
        Stage::Pruned,
        Stage::Expanded,
        Stage::Emitted,
        Stage::Materialized,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Self::Fetched => "fetched",
            Self::Configured => "configured",
            Self::Extracted => "extracted",
            Self::Pruned => "pruned",
            Self::Expanded => "expanded",
            Self::Emitted => "emitted",
            Self::Materialized => "materialized",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Run-wide paths and settings.
#[derive(Debug, Clone)]
pub struct WrapContext {
    /// Repository root; workspaces and config roots live directly below it.
    pub root: PathBuf,
    pub platform: Platform,
    /// Directory the wrappers and preambles are written to.
    pub output_dir: PathBuf,
    /// Directory holding one config template directory per library.
    pub templates: PathBuf,
    pub env: BuildEnv,
}

impl WrapContext {
    /// Context with the default layout below `root`.
    pub fn new(root: impl Into<PathBuf>, platform: Platform) -> Self {
        let root = root.into();
        Self {
            output_dir: root.join("libtor"),
            templates: root.join("config"),
            env: BuildEnv::for_platform(platform),
            root,
            platform,
        }
    }

    /// Clone destination of one library.
    pub fn workspace(&self, library: Library) -> PathBuf {
        self.root.join(self.platform.name()).join(library.name())
    }

    pub fn spec(&self, profile: &LibraryProfile) -> LibrarySpec {
        LibrarySpec {
            library: profile.library,
            url: profile.url,
            tag: profile.tag,
            workspace: self.workspace(profile.library),
        }
    }
}

/// What one library's run produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LibraryReport {
    pub library: Library,
    /// Stages completed, in order.
    pub stages: Vec<Stage>,
    pub units: usize,
    pub wrappers: Vec<PathBuf>,
    pub preamble: PathBuf,
    pub config_files: Vec<PathBuf>,
    /// Entries deleted from the workspace by pruning.
    pub pruned: usize,
}

/// Outcome of a run over several libraries.
#[derive(Debug)]
pub enum RunOutcome {
    Completed(Vec<LibraryReport>),
    Aborted {
        completed: Vec<LibraryReport>,
        library: Library,
        /// Stage the failing library did not reach.
        stage: Stage,
        error: WrapError,
    },
}

impl RunOutcome {
    pub fn is_completed(&self) -> bool {
        matches!(self, Self::Completed(_))
    }

    /// Reports of the libraries that finished.
    pub fn reports(&self) -> &[LibraryReport] {
        match self {
            Self::Completed(reports) => reports,
            Self::Aborted { completed, .. } => completed,
        }
    }
}

/// Runs libraries through every stage.
pub struct Pipeline<'a> {
    ctx: &'a WrapContext,
    fetcher: &'a dyn Fetcher,
    driver: &'a dyn BuildDriver,
}

type StageResult<T> = Result<T, (Stage, WrapError)>;

impl<'a> Pipeline<'a> {
    pub fn new(ctx: &'a WrapContext, fetcher: &'a dyn Fetcher, driver: &'a dyn BuildDriver) -> Self {
        Self {
            ctx,
            fetcher,
            driver,
        }
    }

    /// Clean everything emitted for the platform, then wrap all libraries.
    pub fn run_all(&self) -> Result<RunOutcome, WrapError> {
        let removed = clean_platform(&self.ctx.output_dir, self.ctx.platform)?;
        info!(platform = %self.ctx.platform, removed = removed.len(), "cleaned previous output");
        Ok(self.run(&Library::ALL))
    }

    /// Wrap the given libraries in order, stopping at the first failure.
    pub fn run(&self, libraries: &[Library]) -> RunOutcome {
        let mut completed = Vec::with_capacity(libraries.len());
        for &library in libraries {
            match self.run_library(library) {
                Ok(report) => completed.push(report),
                Err((stage, err)) => {
                    error!(%library, %stage, error = %err, "aborting run");
                    return RunOutcome::Aborted {
                        completed,
                        library,
                        stage,
                        error: err,
                    };
                }
            }
        }
        RunOutcome::Completed(completed)
    }

    fn run_library(&self, library: Library) -> StageResult<LibraryReport> {
        let profile = LibraryProfile::for_library(library);
        let spec = self.ctx.spec(profile);
        let ws = spec.workspace.as_path();
        let mut stages = Vec::with_capacity(Stage::ALL.len());
        info!(%library, tag = spec.tag, "wrapping");

        let checkout = self.stage(library, Stage::Fetched, &mut stages, || self.fetcher.fetch(&spec))?;

        let metadata = self.stage(library, Stage::Configured, &mut stages, || {
            self.configure(profile, &checkout)
        })?;

        let units = self.stage(library, Stage::Extracted, &mut stages, || self.discover(profile, ws))?;

        let pruned = self.stage(library, Stage::Pruned, &mut stages, || prune(ws, &profile.prune))?;

        let wrappers: Vec<WrapperFile> = self.stage(library, Stage::Expanded, &mut stages, || {
            let wrappers = expand(self.ctx.platform, &units)?;
            let variants = units.iter().filter(|u| u.is_arch_variant()).count();
            debug!(%library, units = units.len(), variants, wrappers = wrappers.len(), "expanded");
            Ok(wrappers)
        })?;

        let emitted = self.stage(library, Stage::Emitted, &mut stages, || {
            Emitter {
                output_dir: &self.ctx.output_dir,
                platform: self.ctx.platform,
                profile,
                workspace: ws,
            }
            .emit(&wrappers)
        })?;

        let config_files = self.stage(library, Stage::Materialized, &mut stages, || {
            self.materialize(profile, &metadata)
        })?;

        Ok(LibraryReport {
            library,
            stages,
            units: units.len(),
            wrappers: emitted.wrappers,
            preamble: emitted.preamble,
            config_files,
            pruned: pruned.removed.len(),
        })
    }

    fn stage<T>(
        &self,
        library: Library,
        stage: Stage,
        stages: &mut Vec<Stage>,
        work: impl FnOnce() -> Result<T, WrapError>,
    ) -> StageResult<T> {
        let timer = Timer::start(format!("{} {}", library, stage));
        let out = work().map_err(|e| (stage, e))?;
        timer.finish();
        stages.push(stage);
        Ok(out)
    }

    /// Run the configure steps, then read metadata before pruning removes it.
    fn configure(&self, profile: &LibraryProfile, checkout: &Checkout) -> Result<Metadata, WrapError> {
        for step in profile.configure {
            self.driver.run(step, &checkout.path)?;
        }
        (profile.metadata)(checkout)
    }

    fn discover(&self, profile: &LibraryProfile, ws: &Path) -> Result<Vec<CompilationUnit>, WrapError> {
        let library = profile.library;
        let stems = match &profile.discovery {
            Discovery::TopLevelSources => top_level_sources(library, ws)?,
            Discovery::DryRun {
                step,
                grammar,
                exclusions,
            } => {
                let transcript = self.driver.run(step, ws)?;
                let extracted = extract(&transcript, grammar, exclusions).map_err(|e| WrapError::Extraction {
                    library: library.name(),
                    detail: format!("invalid grammar for {}: {}", grammar.describes, e),
                    source: None,
                })?;
                match extracted {
                    Extracted::Units(stems) if !stems.is_empty() => stems,
                    Extracted::Units(_) => {
                        return Err(WrapError::Extraction {
                            library: library.name(),
                            detail: format!("every unit in `{}` output was excluded", step.command_line()),
                            source: None,
                        })
                    }
                    Extracted::NoMatch => {
                        return Err(WrapError::Extraction {
                            library: library.name(),
                            detail: format!(
                                "`{}` output contains no {}",
                                step.command_line(),
                                grammar.describes
                            ),
                            source: None,
                        })
                    }
                }
            }
        };

        info!(%library, units = stems.len(), "discovered units");
        Ok(stems.iter().map(|stem| (profile.classify)(library, stem)).collect())
    }

    fn materialize(&self, profile: &LibraryProfile, metadata: &Metadata) -> Result<Vec<PathBuf>, WrapError> {
        let Some(config_root) = profile.config_root else {
            return Ok(Vec::new());
        };
        let report = materialize(
            &self.ctx.templates.join(profile.library.name()),
            &self.ctx.root.join(config_root),
            &(profile.config)(),
            metadata,
        )?;
        Ok(report.written)
    }
}

/// Stems of the `.c` files directly inside `ws`, sorted.
fn top_level_sources(library: Library, ws: &Path) -> Result<Vec<String>, WrapError> {
    let unreadable = |e: std::io::Error| WrapError::Extraction {
        library: library.name(),
        detail: format!("cannot list {}", ws.display()),
        source: Some(e),
    };

    let mut stems = Vec::new();
    for entry in fs::read_dir(ws).map_err(unreadable)? {
        let path = entry.map_err(unreadable)?.path();
        if !path.is_file() || path.extension().map_or(true, |ext| ext != "c") {
            continue;
        }
        if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
            stems.push(stem.to_string());
        }
    }
    stems.sort();

    if stems.is_empty() {
        return Err(WrapError::Extraction {
            library: library.name(),
            detail: format!("no top-level C sources in {}", ws.display()),
            source: None,
        });
    }
    Ok(stems)
}

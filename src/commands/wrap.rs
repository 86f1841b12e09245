//! Wrap command - runs the pipeline.

use anyhow::{Context, Result};

use crate::config::Config;
use crate::driver::SystemDriver;
use crate::fetch::GitFetcher;
use crate::library::Library;
use crate::pipeline::{LibraryReport, Pipeline, RunOutcome};
use crate::timing::Timer;

/// Execute the wrap command.
///
/// Without a library, the platform's previous output is cleaned and every
/// library is wrapped in link order. With one, only that library's wrappers
/// and preamble are replaced.
pub fn cmd_wrap(config: &Config, library: Option<Library>) -> Result<()> {
    let ctx = config.context();
    let fetcher = GitFetcher::new(&ctx.env);
    let driver = SystemDriver::new(&ctx.env);
    let pipeline = Pipeline::new(&ctx, &fetcher, &driver);

    let timer = Timer::start(format!("wrap {}", ctx.platform));
    let outcome = match library {
        Some(library) => pipeline.run(&[library]),
        None => pipeline.run_all()?,
    };
    timer.finish();

    print_summary(outcome.reports());

    match outcome {
        RunOutcome::Completed(_) => {
            println!("\n=== Wrapping complete ===");
            println!("  Output: {}", ctx.output_dir.display());
            Ok(())
        }
        RunOutcome::Aborted {
            library,
            stage,
            error,
            ..
        } => Err(error).with_context(|| format!("{} failed before stage '{}'", library, stage)),
    }
}

fn print_summary(reports: &[LibraryReport]) {
    for report in reports {
        println!(
            "  {:<9} {:>4} units, {:>4} wrappers, {:>3} config files, {:>5} pruned",
            report.library.name(),
            report.units,
            report.wrappers.len(),
            report.config_files.len(),
            report.pruned
        );
    }
}

//! Preflight command - runs preflight checks.

use anyhow::Result;

use crate::config::Config;
use crate::preflight;

/// Execute the preflight command.
pub fn cmd_preflight(config: &Config, strict: bool) -> Result<()> {
    let ctx = config.context();
    if strict {
        preflight::run_preflight_or_fail(&ctx, &config.cc)?;
    } else {
        let report = preflight::run_preflight(&ctx, &config.cc);
        report.print();
        if !report.all_passed() {
            println!("Some checks failed. Use --strict to fail the run.");
        }
    }
    Ok(())
}

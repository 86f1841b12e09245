//! Preflight checks.
//!
//! Validates host tools and the wrapping environment before any clone or
//! configure step runs. Run with `libtor-wrap preflight`.

mod environment;
mod host_tools;
mod types;

use anyhow::{bail, Result};

use crate::pipeline::WrapContext;

pub use types::{CheckResult, CheckStatus, PreflightReport};

/// Run all preflight checks.
pub fn run_preflight(ctx: &WrapContext, cc: &str) -> PreflightReport {
    let mut checks = Vec::new();

    println!("Running preflight checks...\n");

    println!("Checking host tools...");
    checks.extend(host_tools::check_host_tools(ctx.platform, cc));

    println!("Checking wrapping environment...");
    checks.extend(environment::check_environment(ctx));

    println!();

    PreflightReport { checks }
}

/// Run preflight and bail if any checks fail.
pub fn run_preflight_or_fail(ctx: &WrapContext, cc: &str) -> Result<()> {
    let report = run_preflight(ctx, cc);
    report.print();

    if !report.all_passed() {
        bail!(
            "Preflight failed: {} check(s) failed. Fix the issues above before wrapping.",
            report.fail_count()
        );
    }

    println!("All preflight checks passed!\n");
    Ok(())
}

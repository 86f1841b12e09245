//! Verify command - compiles the emitted wrappers.

use anyhow::{bail, Result};

use crate::config::Config;
use crate::verify::{Selection, Verifier};

/// Verify target for the verify command.
pub enum VerifyTarget {
    /// Everything embedded
    Static,
    /// Only tor embedded
    Dynamic,
    /// All eight combinations
    Matrix,
}

/// Execute the verify command.
pub fn cmd_verify(config: &Config, target: VerifyTarget) -> Result<()> {
    let ctx = config.context();
    let verifier = Verifier::new(&ctx, &config.cc);
    let selections = match target {
        VerifyTarget::Static => vec![Selection::STATIC],
        VerifyTarget::Dynamic => vec![Selection::DYNAMIC],
        VerifyTarget::Matrix => Selection::matrix(),
    };

    let mut failed = 0;
    for selection in selections {
        match verifier.verify(selection) {
            Ok(report) => println!(
                "  [PASS] {} ({} units{})",
                selection,
                report.compiled,
                if report.linked { ", linked" } else { "" }
            ),
            Err(e) => {
                failed += 1;
                println!("  [FAIL] {}\n{}", selection, e);
            }
        }
    }

    if failed > 0 {
        bail!("{} selection(s) failed to build", failed);
    }
    println!("\nAll selections built.");
    Ok(())
}

//! Clean command - removes the current platform's output.

use anyhow::Result;

use crate::clean;
use crate::config::Config;
use crate::library::Library;

/// Execute the clean command.
///
/// Workspaces are removed too when `workspaces` is set.
pub fn cmd_clean(config: &Config, workspaces: bool) -> Result<()> {
    let ctx = config.context();
    let removed = clean::clean_platform(&ctx.output_dir, ctx.platform)?;
    println!(
        "Removed {} file(s) for {} from {}",
        removed.len(),
        ctx.platform,
        ctx.output_dir.display()
    );

    if workspaces {
        for library in Library::ALL {
            let ws = ctx.workspace(library);
            if ws.exists() {
                crate::fetch::wipe_workspace(&ws)?;
                println!("Removed {}", ws.display());
            }
        }
    }
    Ok(())
}

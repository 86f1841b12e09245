//! Show command - displays information.

use anyhow::Result;

use crate::config::Config;
use crate::digest;

/// Show target for the show command.
pub enum ShowTarget {
    /// Show configuration
    Config { json: bool },
    /// Show the digest of the current output
    Digest,
}

/// Execute the show command.
pub fn cmd_show(config: &Config, target: ShowTarget) -> Result<()> {
    match target {
        ShowTarget::Config { json: true } => {
            println!("{}", serde_json::to_string_pretty(config)?);
        }
        ShowTarget::Config { json: false } => config.print(),
        ShowTarget::Digest => {
            let ctx = config.context();
            println!("{}  {}", digest::output_digest(&ctx)?, ctx.platform);
        }
    }
    Ok(())
}

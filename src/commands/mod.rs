//! CLI command handlers.
//!
//! Each submodule handles a specific CLI command:
//! - `wrap` - Clone, dry-run and emit wrappers for the libraries
//! - `clean` - Remove the current platform's output
//! - `verify` - Compile the emitted wrappers
//! - `show` - Display information
//! - `preflight` - Run preflight checks

pub mod clean;
mod preflight;
pub mod show;
pub mod verify;
mod wrap;

pub use clean::cmd_clean;
pub use preflight::cmd_preflight;
pub use show::cmd_show;
pub use verify::cmd_verify;
pub use wrap::cmd_wrap;

//! libtor-wrap - turns pinned zlib, OpenSSL, libevent and Tor checkouts into
//! per-translation-unit wrappers that a host build compiles in place.
//!
//! One run per platform:
//! - clone each library at its pinned tag
//! - configure it and capture the compile plan from a dry run
//! - prune the tree to what the wrappers include
//! - emit wrappers, a preamble and the config headers

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use libtor_wrap::commands;
use libtor_wrap::config::Config;
use libtor_wrap::Library;

#[derive(Parser)]
#[command(name = "libtor-wrap")]
#[command(about = "Static wrapper generator for zlib, OpenSSL, libevent and Tor")]
#[command(
    after_help = "QUICK START:\n  libtor-wrap preflight  Check host tools and templates\n  libtor-wrap wrap       Wrap every library for this platform\n  libtor-wrap verify     Compile the emitted wrappers\n  libtor-wrap clean      Remove this platform's output"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Clone, configure, dry-run and emit wrappers (all libraries by default)
    Wrap {
        /// Wrap only this library, keeping the others' output
        #[arg(value_enum)]
        library: Option<Library>,
    },

    /// Remove the wrappers and preambles emitted for this platform
    Clean {
        /// Also remove the cloned library workspaces
        #[arg(long)]
        workspaces: bool,
    },

    /// Compile the emitted wrappers against their preambles
    Verify {
        #[command(subcommand)]
        what: Option<VerifyTarget>,
    },

    /// Show information
    Show {
        #[command(subcommand)]
        what: ShowTarget,
    },

    /// Run preflight checks (verify host tools before wrapping)
    Preflight {
        /// Fail if any checks fail (exit code 1)
        #[arg(long)]
        strict: bool,
    },
}

#[derive(Subcommand)]
enum VerifyTarget {
    /// Every library embedded (default)
    Static,
    /// Only tor embedded, the rest linked from the system
    Dynamic,
    /// Every embedded/system combination
    Matrix,
}

#[derive(Subcommand)]
enum ShowTarget {
    /// Show current configuration
    Config {
        /// Print as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show the digest of this platform's output
    Digest,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load .env if present
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let base_dir: PathBuf = std::env::current_dir().context("cannot determine working directory")?;
    let config = Config::load(&base_dir)?;

    match cli.command {
        Commands::Wrap { library } => {
            commands::cmd_wrap(&config, library)?;
        }

        Commands::Clean { workspaces } => {
            commands::cmd_clean(&config, workspaces)?;
        }

        Commands::Verify { what } => {
            let verify_target = match what {
                None | Some(VerifyTarget::Static) => commands::verify::VerifyTarget::Static,
                Some(VerifyTarget::Dynamic) => commands::verify::VerifyTarget::Dynamic,
                Some(VerifyTarget::Matrix) => commands::verify::VerifyTarget::Matrix,
            };
            commands::cmd_verify(&config, verify_target)?;
        }

        Commands::Show { what } => {
            let show_target = match what {
                ShowTarget::Config { json } => commands::show::ShowTarget::Config { json },
                ShowTarget::Digest => commands::show::ShowTarget::Digest,
            };
            commands::cmd_show(&config, show_target)?;
        }

        Commands::Preflight { strict } => {
            commands::cmd_preflight(&config, strict)?;
        }
    }

    Ok(())
}

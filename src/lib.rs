//! libtor-wrap library exports.
//!
//! The binary drives these through `commands`; integration tests drive the
//! pipeline directly with recorded fetchers and build drivers.

pub mod clean;
pub mod commands;
pub mod config;
pub mod digest;
pub mod driver;
pub mod emit;
pub mod error;
pub mod expand;
pub mod extract;
pub mod fetch;
pub mod libs;
pub mod library;
pub mod materialize;
pub mod pipeline;
pub mod platform;
pub mod preflight;
pub mod process;
pub mod prune;
pub mod template;
pub mod timing;
pub mod toolenv;
pub mod unit;
pub mod verify;

pub use error::WrapError;
pub use library::Library;
pub use pipeline::{Pipeline, RunOutcome, Stage, WrapContext};
pub use platform::Platform;

//! The four wrapped libraries and their run-scoped specs.

use std::fmt;
use std::path::PathBuf;

use clap::ValueEnum;

/// One of the pinned upstream libraries, in link-dependency order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, ValueEnum)]
pub enum Library {
    Zlib,
    Openssl,
    Libevent,
    Tor,
}

impl Library {
    /// Fixed processing order (link dependency order).
    pub const ALL: [Library; 4] = [
        Library::Zlib,
        Library::Openssl,
        Library::Libevent,
        Library::Tor,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Self::Zlib => "zlib",
            Self::Openssl => "openssl",
            Self::Libevent => "libevent",
            Self::Tor => "tor",
        }
    }
}

impl fmt::Display for Library {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Identity of one library for the current run. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LibrarySpec {
    pub library: Library,
    pub url: &'static str,
    pub tag: &'static str,
    /// Per-platform clone destination, wiped before every fetch.
    pub workspace: PathBuf,
}

//! Error taxonomy for the wrapping pipeline.
//!
//! Every variant keeps its underlying cause as a `source()`, so a failure in a
//! third-party build system stays diagnosable from the top-level report.

use std::fmt;
use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// An external command exited non-zero or could not be started.
///
/// The captured stdout and stderr are kept verbatim and printed in full by
/// `Display`.
#[derive(Debug)]
pub struct ToolError {
    /// Rendered command line (program plus arguments).
    pub command: String,
    /// Working directory the command ran in, if any.
    pub dir: Option<PathBuf>,
    /// Exit code, `None` when the process never ran or died by signal.
    pub code: Option<i32>,
    /// Captured stdout.
    pub stdout: String,
    /// Captured stderr.
    pub stderr: String,
    /// Spawn failure, when the program could not be executed at all.
    pub spawn: Option<io::Error>,
}

impl fmt::Display for ToolError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.spawn, self.code) {
            (Some(_), _) => write!(f, "failed to execute '{}'", self.command)?,
            (None, Some(code)) => write!(f, "'{}' failed (exit code {})", self.command, code)?,
            (None, None) => write!(f, "'{}' was terminated by a signal", self.command)?,
        }
        if let Some(dir) = &self.dir {
            write!(f, " in {}", dir.display())?;
        }
        if !self.stdout.trim().is_empty() {
            write!(f, "\n--- stdout ---\n{}", self.stdout)?;
        }
        if !self.stderr.trim().is_empty() {
            write!(f, "\n--- stderr ---\n{}", self.stderr)?;
        }
        Ok(())
    }
}

impl std::error::Error for ToolError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.spawn.as_ref().map(|e| e as &(dyn std::error::Error + 'static))
    }
}

/// Why a wrapper or preamble could not be emitted.
#[derive(Debug, Error)]
pub enum EmitCause {
    #[error("unresolved placeholder {{{{{0}}}}}")]
    Placeholder(String),

    #[error("embedded source {} is missing from the pruned tree", .0.display())]
    MissingSource(PathBuf),

    #[error("preamble is not valid TOML: {0}")]
    Preamble(#[from] toml::de::Error),

    #[error("preamble cannot be serialized: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error(transparent)]
    Io(#[from] io::Error),
}

/// Why a configuration input could not be used.
#[derive(Debug, Error)]
pub enum ConfigCause {
    #[error("pattern `{0}` not found")]
    Pattern(&'static str),

    #[error("unresolved placeholder {{{{{0}}}}}")]
    Placeholder(String),

    #[error(transparent)]
    Io(#[from] io::Error),
}

/// Errors raised by the pipeline stages.
#[derive(Debug, Error)]
pub enum WrapError {
    /// Clone failed (network, authentication, unknown tag).
    #[error("failed to clone {url} at {tag}")]
    Fetch {
        url: String,
        tag: String,
        #[source]
        source: ToolError,
    },

    /// A configure or dry-run invocation failed.
    #[error(transparent)]
    Tool(#[from] ToolError),

    /// The dry-run transcript (or source listing) no longer matches what the pinned
    /// tag produced.
    #[error("{library}: {detail}")]
    Extraction {
        library: &'static str,
        detail: String,
        #[source]
        source: Option<io::Error>,
    },

    /// Two units flatten to the same wrapper file name.
    #[error("{library}: {detail}")]
    Expansion { library: &'static str, detail: String },

    /// Filesystem removal failed.
    #[error("failed to prune {}", .path.display())]
    Prune {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Template rendering or file write failed.
    #[error("failed to emit {}", .path.display())]
    Emit {
        path: PathBuf,
        #[source]
        source: EmitCause,
    },

    /// Upstream metadata or config template missing or unparsable.
    #[error("unusable configuration input {}", .path.display())]
    Config {
        path: PathBuf,
        #[source]
        source: ConfigCause,
    },
}

impl WrapError {
    pub(crate) fn prune(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Prune {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn emit(path: impl Into<PathBuf>, source: impl Into<EmitCause>) -> Self {
        Self::Emit {
            path: path.into(),
            source: source.into(),
        }
    }

    pub(crate) fn config(path: impl Into<PathBuf>, source: impl Into<ConfigCause>) -> Self {
        Self::Config {
            path: path.into(),
            source: source.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    fn tool_error() -> ToolError {
        ToolError {
            command: "make --dry-run".to_string(),
            dir: Some(PathBuf::from("/tmp/ws")),
            code: Some(2),
            stdout: "gcc -c foo.c\n".to_string(),
            stderr: "make: *** No rule to make target 'bar.o'.  Stop.\n".to_string(),
            spawn: None,
        }
    }

    #[test]
    fn test_tool_error_keeps_output_verbatim() {
        let msg = tool_error().to_string();
        assert!(msg.contains("'make --dry-run' failed (exit code 2) in /tmp/ws"));
        assert!(msg.contains("gcc -c foo.c\n"));
        assert!(msg.contains("make: *** No rule to make target 'bar.o'.  Stop.\n"));
    }

    #[test]
    fn test_fetch_error_chains_tool_failure() {
        let err = WrapError::Fetch {
            url: "https://example.invalid/zlib".to_string(),
            tag: "v1".to_string(),
            source: tool_error(),
        };
        let source = err.source().expect("fetch error must carry its cause");
        assert!(source.to_string().contains("No rule to make target"));
    }

    #[test]
    fn test_placeholder_message() {
        let cause = EmitCause::Placeholder("SOURCE".to_string());
        assert_eq!(cause.to_string(), "unresolved placeholder {{SOURCE}}");
    }
}

//! Centralized command execution with consistent error handling.
//!
//! Every external invocation (git, configure scripts, make, the C compiler)
//! goes through [`Cmd`], which applies the run's [`BuildEnv`] and captures
//! stdout/stderr so a failure can be reported verbatim.

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::{Command, ExitStatus};

use tracing::debug;

use crate::error::ToolError;
use crate::toolenv::BuildEnv;

/// Result of a command execution.
#[derive(Debug, Clone)]
pub struct CommandResult {
    /// Exit status of the command.
    pub status: ExitStatus,
    /// Captured stdout as a string.
    pub stdout: String,
    /// Captured stderr as a string.
    pub stderr: String,
}

impl CommandResult {
    /// Returns true if the command exited successfully.
    pub fn success(&self) -> bool {
        self.status.success()
    }

    /// Get stdout, trimmed of whitespace.
    pub fn stdout_trimmed(&self) -> &str {
        self.stdout.trim()
    }
}

/// Builder for configuring command execution.
pub struct Cmd {
    program: OsString,
    args: Vec<OsString>,
    current_dir: Option<PathBuf>,
    env: Vec<(OsString, OsString)>,
}

impl Cmd {
    /// Create a new command builder.
    pub fn new(program: impl Into<OsString>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            current_dir: None,
            env: Vec::new(),
        }
    }

    /// Add a single argument.
    pub fn arg(mut self, arg: impl Into<OsString>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Add multiple arguments.
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<OsString>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Add a path as an argument.
    pub fn arg_path(mut self, path: &Path) -> Self {
        self.args.push(path.as_os_str().to_owned());
        self
    }

    /// Set the working directory.
    pub fn dir(mut self, dir: &Path) -> Self {
        self.current_dir = Some(dir.to_path_buf());
        self
    }

    /// Apply the tool environment of the current run.
    pub fn build_env(mut self, env: &BuildEnv) -> Self {
        self.env.extend(env.tool_vars());
        self
    }

    fn describe(&self) -> String {
        let mut line = self.program.to_string_lossy().into_owned();
        for arg in &self.args {
            line.push(' ');
            line.push_str(&arg.to_string_lossy());
        }
        line
    }

    /// Run the command and capture output.
    pub fn run(self) -> Result<CommandResult, ToolError> {
        let command = self.describe();
        debug!(command = %command, dir = ?self.current_dir, "running");

        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args);
        cmd.envs(self.env.iter().map(|(k, v)| (k, v)));

        if let Some(ref dir) = self.current_dir {
            cmd.current_dir(dir);
        }

        let output = match cmd.output() {
            Ok(output) => output,
            Err(e) => {
                return Err(ToolError {
                    command,
                    dir: self.current_dir,
                    code: None,
                    stdout: String::new(),
                    stderr: String::new(),
                    spawn: Some(e),
                })
            }
        };

        let result = CommandResult {
            status: output.status,
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        };

        if !result.success() {
            return Err(ToolError {
                command,
                dir: self.current_dir,
                code: result.status.code(),
                stdout: result.stdout,
                stderr: result.stderr,
                spawn: None,
            });
        }

        Ok(result)
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_success() {
        let result = Cmd::new("echo").arg("hello").run().unwrap();
        assert!(result.success());
        assert_eq!(result.stdout_trimmed(), "hello");
    }

    #[test]
    fn test_run_failure_keeps_stdout_and_stderr() {
        let err = Cmd::new("sh")
            .args(["-c", "echo planned; echo broken >&2; exit 3"])
            .run()
            .unwrap_err();

        assert_eq!(err.code, Some(3));
        assert_eq!(err.stdout, "planned\n");
        assert_eq!(err.stderr, "broken\n");
        let msg = err.to_string();
        assert!(msg.contains("exit code 3"));
        assert!(msg.contains("planned"));
        assert!(msg.contains("broken"));
    }

    #[test]
    fn test_missing_program_is_spawn_error() {
        let err = Cmd::new("nonexistent_program_12345").run().unwrap_err();
        assert!(err.spawn.is_some());
        assert!(err.to_string().contains("failed to execute"));
    }

    #[test]
    fn test_run_in_directory() {
        let result = Cmd::new("pwd").dir(Path::new("/tmp")).run().unwrap();
        assert!(result.stdout_trimmed().contains("tmp"));
    }

    #[test]
    fn test_build_env_is_applied() {
        let env = BuildEnv::default().with_var("LIBTOR_WRAP_MARKER", "visible");
        let result = Cmd::new("sh")
            .args(["-c", "printf %s \"$LIBTOR_WRAP_MARKER\""])
            .build_env(&env)
            .run()
            .unwrap();
        assert_eq!(result.stdout, "visible");
    }
}

//! Driving upstream build systems as oracles.
//!
//! Library profiles describe their configure and dry-run invocations as
//! [`ToolStep`] data; a [`BuildDriver`] executes them against a workspace and
//! hands back the captured transcript. Extraction only ever sees transcripts,
//! so it can be exercised against recorded output without any external tool.

use std::path::{Path, PathBuf};

use tracing::info;

use crate::error::WrapError;
use crate::process::Cmd;
use crate::toolenv::BuildEnv;

/// One external invocation inside a library workspace.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ToolStep {
    /// Program name; a `./` prefix refers to a script inside the workspace.
    pub program: &'static str,
    pub args: &'static [&'static str],
}

impl ToolStep {
    pub const fn new(program: &'static str, args: &'static [&'static str]) -> Self {
        Self { program, args }
    }

    /// Command line, for logs and recorded-transcript lookups.
    pub fn command_line(&self) -> String {
        let mut line = self.program.to_string();
        for arg in self.args {
            line.push(' ');
            line.push_str(arg);
        }
        line
    }
}

/// Executes tool steps and returns their captured stdout.
pub trait BuildDriver {
    fn run(&self, step: &ToolStep, workspace: &Path) -> Result<String, WrapError>;
}

/// Runs steps as real child processes with the run's build environment.
pub struct SystemDriver<'a> {
    env: &'a BuildEnv,
}

impl<'a> SystemDriver<'a> {
    pub fn new(env: &'a BuildEnv) -> Self {
        Self { env }
    }
}

impl BuildDriver for SystemDriver<'_> {
    fn run(&self, step: &ToolStep, workspace: &Path) -> Result<String, WrapError> {
        info!(step = %step.command_line(), dir = %workspace.display(), "running tool");
        let program: PathBuf = match step.program.strip_prefix("./") {
            Some(script) => workspace.join(script),
            None => PathBuf::from(step.program),
        };
        let result = Cmd::new(program)
            .args(step.args.iter().copied())
            .dir(workspace)
            .build_env(self.env)
            .run()?;
        Ok(result.stdout)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::os::unix::fs::PermissionsExt;
    use tempfile::TempDir;

    #[test]
    fn test_command_line() {
        let step = ToolStep::new("./configure", &["--disable-shared", "--enable-static"]);
        assert_eq!(step.command_line(), "./configure --disable-shared --enable-static");
    }

    #[test]
    fn test_system_driver_runs_workspace_script() {
        let tmp = TempDir::new().unwrap();
        let script = tmp.path().join("config");
        fs::write(&script, "#!/bin/sh\necho configured \"$@\"\n").unwrap();
        fs::set_permissions(&script, fs::Permissions::from_mode(0o755)).unwrap();

        let env = BuildEnv::default();
        let out = SystemDriver::new(&env)
            .run(&ToolStep::new("./config", &["no-asm"]), tmp.path())
            .unwrap();
        assert_eq!(out, "configured no-asm\n");
    }

    #[test]
    fn test_system_driver_surfaces_failure_output() {
        let tmp = TempDir::new().unwrap();
        let env = BuildEnv::default();
        let err = SystemDriver::new(&env)
            .run(
                &ToolStep::new("sh", &["-c", "echo 'configure: error: no acceptable C compiler' >&2; exit 77"]),
                tmp.path(),
            )
            .unwrap_err();
        match err {
            WrapError::Tool(tool) => {
                assert_eq!(tool.code, Some(77));
                assert_eq!(tool.stderr, "configure: error: no acceptable C compiler\n");
            }
            other => panic!("expected tool error, got {:?}", other),
        }
    }
}

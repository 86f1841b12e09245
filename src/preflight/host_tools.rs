//! Host tool availability checks.

use crate::platform::Platform;

use super::types::CheckResult;

/// Check that every tool the dry-run and verify stages invoke is installed.
pub fn check_host_tools(platform: Platform, cc: &str) -> Vec<CheckResult> {
    let libtool = match platform {
        Platform::Linux => ("libtoolize", "libtool"),
        // Homebrew installs GNU libtool with a g prefix
        Platform::Darwin => ("glibtoolize", "libtool"),
    };

    let required = [
        ("git", "git", "Required to clone the pinned upstream tags"),
        ("make", "make", "Required for the build-system dry runs"),
        ("autoconf", "autoconf", "Required by the libevent and tor autogen scripts"),
        ("automake", "automake", "Required by the libevent and tor autogen scripts"),
        (libtool.0, libtool.1, "Required by the libevent autogen script"),
        ("perl", "perl", "Required by the OpenSSL configure script"),
        (cc, "a C compiler", "Required by configure scripts and verify"),
    ];

    let mut results: Vec<CheckResult> = required
        .iter()
        .map(|(tool, package, purpose)| check_tool_exists(tool, package, purpose, true))
        .collect();

    results.push(check_tool_exists(
        "ar",
        "binutils",
        "Required for `libtor-wrap verify`",
        false,
    ));

    results
}

/// Check if a tool exists in PATH.
pub(super) fn check_tool_exists(tool: &str, package: &str, purpose: &str, required: bool) -> CheckResult {
    match which::which(tool) {
        Ok(path) => CheckResult::pass_with(tool, &path.display().to_string()),
        Err(_) => {
            let msg = format!("Not found. Install '{}'. {}", package, purpose);
            if required {
                CheckResult::fail(tool, &msg)
            } else {
                CheckResult::warn(tool, &msg)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::preflight::types::CheckStatus;

    #[test]
    fn test_missing_tool_fails_or_warns() {
        let tool = "libtor-wrap-no-such-tool";
        assert_eq!(check_tool_exists(tool, "none", "", true).status, CheckStatus::Fail);
        assert_eq!(check_tool_exists(tool, "none", "", false).status, CheckStatus::Warn);
    }

    #[test]
    fn test_shell_is_found() {
        assert_eq!(check_tool_exists("sh", "sh", "", true).status, CheckStatus::Pass);
    }
}

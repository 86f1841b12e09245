//! Host platforms, target architectures and applicability filters.

use std::fmt;

use clap::ValueEnum;
use serde::Serialize;

/// Host platform a run generates wrappers for.
///
/// The platform name prefixes every emitted file and names the workspace
/// directory the upstream trees are cloned into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, ValueEnum, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    Linux,
    Darwin,
}

impl Platform {
    /// Platform of the machine running this tool, if supported.
    pub fn host() -> Option<Self> {
        if cfg!(target_os = "linux") {
            Some(Self::Linux)
        } else if cfg!(target_os = "macos") {
            Some(Self::Darwin)
        } else {
            None
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Linux => "linux",
            Self::Darwin => "darwin",
        }
    }

    /// Targets a wrapper generated on this platform applies to.
    pub fn target_filter(self) -> TargetFilter {
        match self {
            Self::Linux => TargetFilter::any_arch(&[Os::Linux, Os::Android]),
            Self::Darwin => TargetFilter::new(vec![
                (Os::Macos, Some(Arch::X86_64)),
                (Os::Macos, Some(Arch::Aarch64)),
                (Os::Ios, Some(Arch::X86_64)),
                (Os::Ios, Some(Arch::Aarch64)),
            ]),
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl std::str::FromStr for Platform {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "linux" => Ok(Self::Linux),
            "darwin" | "macos" => Ok(Self::Darwin),
            other => Err(format!("unsupported platform '{}'", other)),
        }
    }
}

/// Operating system component of a target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Os {
    Linux,
    Android,
    Macos,
    Ios,
}

impl Os {
    /// `target_os` value.
    pub fn cfg_name(self) -> &'static str {
        match self {
            Self::Linux => "linux",
            Self::Android => "android",
            Self::Macos => "macos",
            Self::Ios => "ios",
        }
    }

    /// Preprocessor test for this OS (compiler-predefined macros only).
    pub fn c_condition(self) -> &'static str {
        match self {
            Self::Linux => "defined(__linux__)",
            Self::Android => "defined(__ANDROID__)",
            Self::Macos => "defined(__ENVIRONMENT_MAC_OS_X_VERSION_MIN_REQUIRED__)",
            Self::Ios => "defined(__ENVIRONMENT_IPHONE_OS_VERSION_MIN_REQUIRED__)",
        }
    }
}

/// Architecture groups a unit body can be selected by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Arch {
    X86_64,
    Aarch64,
    X86,
    Arm,
}

impl Arch {
    pub const ALL: [Arch; 4] = [Arch::X86_64, Arch::Aarch64, Arch::X86, Arch::Arm];

    /// `target_arch` value, also used as the wrapper file suffix.
    pub fn name(self) -> &'static str {
        match self {
            Self::X86_64 => "x86_64",
            Self::Aarch64 => "aarch64",
            Self::X86 => "x86",
            Self::Arm => "arm",
        }
    }

    pub fn c_condition(self) -> &'static str {
        match self {
            Self::X86_64 => "defined(__x86_64__)",
            Self::Aarch64 => "defined(__aarch64__)",
            Self::X86 => "defined(__i386__)",
            Self::Arm => "defined(__arm__)",
        }
    }

    pub fn is_64bit(self) -> bool {
        matches!(self, Self::X86_64 | Self::Aarch64)
    }
}

/// Applicability expression over (operating system, architecture) pairs.
///
/// A pair with no architecture matches every architecture of that OS. An
/// empty filter matches nothing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetFilter {
    pairs: Vec<(Os, Option<Arch>)>,
}

impl TargetFilter {
    pub fn new(pairs: Vec<(Os, Option<Arch>)>) -> Self {
        Self { pairs }
    }

    /// Filter matching the given operating systems on any architecture.
    pub fn any_arch(oses: &[Os]) -> Self {
        Self::new(oses.iter().map(|os| (*os, None)).collect())
    }

    pub fn pairs(&self) -> &[(Os, Option<Arch>)] {
        &self.pairs
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    /// Narrow the filter to a single architecture.
    pub fn restrict_to(&self, arch: Arch) -> Self {
        let pairs = self
            .pairs
            .iter()
            .filter_map(|(os, a)| match a {
                None => Some((*os, Some(arch))),
                Some(a) if *a == arch => Some((*os, Some(arch))),
                Some(_) => None,
            })
            .collect();
        Self { pairs }
    }

    /// Render as a Rust `cfg(...)` expression.
    pub fn cfg_expr(&self) -> String {
        let terms: Vec<String> = self
            .pairs
            .iter()
            .map(|(os, arch)| match arch {
                None => format!("target_os = \"{}\"", os.cfg_name()),
                Some(arch) => format!(
                    "all(target_os = \"{}\", target_arch = \"{}\")",
                    os.cfg_name(),
                    arch.name()
                ),
            })
            .collect();
        match terms.len() {
            1 => format!("cfg({})", terms[0]),
            _ => format!("cfg(any({}))", terms.join(", ")),
        }
    }

    /// Render as a C preprocessor condition.
    pub fn c_condition(&self) -> String {
        if self.pairs.is_empty() {
            return "0".to_string();
        }
        self.pairs
            .iter()
            .map(|(os, arch)| match arch {
                None => os.c_condition().to_string(),
                Some(arch) => format!("({} && {})", os.c_condition(), arch.c_condition()),
            })
            .collect::<Vec<_>>()
            .join(" || ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_linux_filter_renders() {
        let filter = Platform::Linux.target_filter();
        assert_eq!(
            filter.cfg_expr(),
            r#"cfg(any(target_os = "linux", target_os = "android"))"#
        );
        assert_eq!(
            filter.c_condition(),
            "defined(__linux__) || defined(__ANDROID__)"
        );
    }

    #[test]
    fn test_restrict_any_arch_filter() {
        let filter = Platform::Linux.target_filter().restrict_to(Arch::Arm);
        assert_eq!(
            filter.pairs(),
            &[(Os::Linux, Some(Arch::Arm)), (Os::Android, Some(Arch::Arm))]
        );
        assert_eq!(
            filter.c_condition(),
            "(defined(__linux__) && defined(__arm__)) || (defined(__ANDROID__) && defined(__arm__))"
        );
    }

    #[test]
    fn test_restrict_explicit_arch_filter() {
        let darwin = Platform::Darwin.target_filter();
        let arm64 = darwin.restrict_to(Arch::Aarch64);
        assert_eq!(
            arm64.pairs(),
            &[(Os::Macos, Some(Arch::Aarch64)), (Os::Ios, Some(Arch::Aarch64))]
        );

        // darwin targets carry no 32-bit architectures
        let x86 = darwin.restrict_to(Arch::X86);
        assert!(x86.is_empty());
        assert_eq!(x86.cfg_expr(), "cfg(any())");
        assert_eq!(x86.c_condition(), "0");
    }

    #[test]
    fn test_single_term_cfg() {
        let filter = TargetFilter::new(vec![(Os::Ios, Some(Arch::Aarch64))]);
        assert_eq!(
            filter.cfg_expr(),
            r#"cfg(all(target_os = "ios", target_arch = "aarch64"))"#
        );
    }

    #[test]
    fn test_platform_parse() {
        assert_eq!("linux".parse::<Platform>().unwrap(), Platform::Linux);
        assert_eq!("macos".parse::<Platform>().unwrap(), Platform::Darwin);
        assert!("windows".parse::<Platform>().is_err());
    }
}

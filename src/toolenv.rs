//! Compiler/linker flags shared by every external invocation of a run.
//!
//! Built once from the platform defaults plus configuration overrides and
//! then only read. Nothing here mutates the process environment; [`Cmd`]
//! applies the values to each child process individually.
//!
//! [`Cmd`]: crate::process::Cmd

use std::collections::BTreeMap;
use std::env;
use std::ffi::OsString;
use std::path::PathBuf;

use crate::platform::Platform;

/// Homebrew prefix of the OpenSSL 1.1 keg the Tor configure script needs on macOS.
const DARWIN_OPENSSL_PREFIX: &str = "/usr/local/opt/openssl@1.1";

/// Tor's autogen fails with autoconf 2.71, so macOS builds pin 2.69.
const DARWIN_AUTOCONF_BIN: &str = "/usr/local/opt/autoconf@2.69/bin";

/// Immutable build environment for one run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BuildEnv {
    vars: BTreeMap<String, String>,
    path_prefix: Vec<PathBuf>,
    search_prefix: BTreeMap<String, Vec<PathBuf>>,
    cflags: String,
    ldflags: String,
}

impl BuildEnv {
    /// Default environment for the given host platform.
    pub fn for_platform(platform: Platform) -> Self {
        match platform {
            Platform::Linux => Self {
                cflags: r#"-g -O2 -DSHARE_DATADIR="./data" -DLOCALSTATEDIR="./state""#.to_string(),
                ..Self::default()
            },
            Platform::Darwin => {
                let lib = format!("{}/lib", DARWIN_OPENSSL_PREFIX);
                let include = format!("{}/include", DARWIN_OPENSSL_PREFIX);
                let mut search_prefix = BTreeMap::new();
                search_prefix.insert("LD_LIBRARY_PATH".to_string(), vec![PathBuf::from(&lib)]);
                search_prefix.insert("CPATH".to_string(), vec![PathBuf::from(&include)]);
                search_prefix.insert(
                    "PKG_CONFIG_PATH".to_string(),
                    vec![PathBuf::from(format!("{}/pkgconfig", lib))],
                );
                let cflags = format!("-g -O2 -I{}", include);
                let ldflags = format!("-g -O2 -L{}", lib);
                let mut vars = BTreeMap::new();
                vars.insert("CFLAGS".to_string(), cflags.clone());
                vars.insert("LDFLAGS".to_string(), ldflags.clone());
                Self {
                    vars,
                    path_prefix: vec![PathBuf::from(DARWIN_AUTOCONF_BIN)],
                    search_prefix,
                    cflags,
                    ldflags,
                }
            }
        }
    }

    /// Add a fixed environment variable for child processes.
    pub fn with_var(mut self, key: &str, value: &str) -> Self {
        self.vars.insert(key.to_string(), value.to_string());
        self
    }

    /// Override the C flags used when compiling wrappers.
    pub fn with_cflags(mut self, cflags: &str) -> Self {
        self.cflags = cflags.to_string();
        self
    }

    /// Override the linker flags used when linking wrappers.
    pub fn with_ldflags(mut self, ldflags: &str) -> Self {
        self.ldflags = ldflags.to_string();
        self
    }

    /// C flags for compiling emitted wrappers.
    pub fn cflags(&self) -> &str {
        &self.cflags
    }

    /// Linker flags for linking emitted wrappers.
    pub fn ldflags(&self) -> &str {
        &self.ldflags
    }

    /// Variables to set on a child process.
    ///
    /// Search-path style variables are prepended to the inherited value.
    pub fn tool_vars(&self) -> Vec<(OsString, OsString)> {
        let mut out: Vec<(OsString, OsString)> = self
            .vars
            .iter()
            .map(|(k, v)| (OsString::from(k), OsString::from(v)))
            .collect();

        if !self.path_prefix.is_empty() {
            out.push(("PATH".into(), prepend("PATH", &self.path_prefix)));
        }
        for (key, prefix) in &self.search_prefix {
            out.push((key.into(), prepend(key, prefix)));
        }
        out
    }

    /// Print environment for debugging.
    pub fn print(&self) {
        println!("  CFLAGS (wrappers): {}", self.cflags);
        println!("  LDFLAGS (wrappers): {}", self.ldflags);
        for (k, v) in &self.vars {
            println!("  {} (tools): {}", k, v);
        }
        for p in &self.path_prefix {
            println!("  PATH prefix: {}", p.display());
        }
        for (k, prefix) in &self.search_prefix {
            for p in prefix {
                println!("  {} prefix: {}", k, p.display());
            }
        }
    }
}

fn prepend(key: &str, prefix: &[PathBuf]) -> OsString {
    let mut paths: Vec<PathBuf> = prefix.to_vec();
    if let Some(current) = env::var_os(key) {
        paths.extend(env::split_paths(&current));
    }
    // join_paths only fails on entries containing the separator itself.
    env::join_paths(&paths).unwrap_or_else(|_| prefix[0].clone().into_os_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_linux_defaults_only_touch_wrapper_flags() {
        let env = BuildEnv::for_platform(Platform::Linux);
        assert!(env.tool_vars().is_empty());
        assert!(env.cflags().contains(r#"-DSHARE_DATADIR="./data""#));
        assert!(env.cflags().contains(r#"-DLOCALSTATEDIR="./state""#));
    }

    #[test]
    fn test_darwin_prefixes_search_paths() {
        let env = BuildEnv::for_platform(Platform::Darwin);
        let vars = env.tool_vars();
        let path = vars
            .iter()
            .find(|(k, _)| k == "PATH")
            .map(|(_, v)| v.to_string_lossy().into_owned())
            .unwrap();
        assert!(path.starts_with(DARWIN_AUTOCONF_BIN));
        assert!(vars.iter().any(|(k, v)| k == "CFLAGS" && v.to_string_lossy().contains("openssl@1.1/include")));
        assert!(vars.iter().any(|(k, _)| k == "PKG_CONFIG_PATH"));
    }

    #[test]
    fn test_overrides() {
        let env = BuildEnv::for_platform(Platform::Linux)
            .with_cflags("-O0")
            .with_ldflags("-static");
        assert_eq!(env.cflags(), "-O0");
        assert_eq!(env.ldflags(), "-static");
    }
}

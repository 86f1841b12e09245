//! Compile checks over the emitted wrappers.
//!
//! Every wrapper of the embedded libraries is compiled on its own with the
//! settings its preamble declares. Libraries that are not embedded are
//! expected to come from the system, so their preamble's `system_libs` must
//! resolve at link time.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use tempfile::TempDir;
use tracing::{debug, info};

use crate::emit::{library_prefix, preamble_name, Preamble};
use crate::error::WrapError;
use crate::libs::LibraryProfile;
use crate::library::Library;
use crate::pipeline::WrapContext;
use crate::process::Cmd;

/// Which optional libraries are embedded. Tor always is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Selection {
    pub zlib: bool,
    pub openssl: bool,
    pub libevent: bool,
}

impl Selection {
    pub const STATIC: Selection = Selection {
        zlib: true,
        openssl: true,
        libevent: true,
    };

    pub const DYNAMIC: Selection = Selection {
        zlib: false,
        openssl: false,
        libevent: false,
    };

    /// All eight combinations, fully static first.
    pub fn matrix() -> Vec<Selection> {
        let mut out = Vec::with_capacity(8);
        for zlib in [true, false] {
            for openssl in [true, false] {
                for libevent in [true, false] {
                    out.push(Selection {
                        zlib,
                        openssl,
                        libevent,
                    });
                }
            }
        }
        out
    }

    pub fn embeds(&self, library: Library) -> bool {
        match library {
            Library::Zlib => self.zlib,
            Library::Openssl => self.openssl,
            Library::Libevent => self.libevent,
            Library::Tor => true,
        }
    }

    pub fn is_fully_static(&self) -> bool {
        *self == Self::STATIC
    }
}

impl fmt::Display for Selection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = |embedded: bool| if embedded { "sta" } else { "dyn" };
        write!(
            f,
            "zlib={} openssl={} libevent={}",
            kind(self.zlib),
            kind(self.openssl),
            kind(self.libevent)
        )
    }
}

/// Outcome of one verified selection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifyReport {
    pub selection: Selection,
    pub compiled: usize,
    /// Linked against system copies of the libraries not embedded.
    pub linked: bool,
}

/// Compiles the wrappers of one platform's output directory.
pub struct Verifier<'a> {
    ctx: &'a WrapContext,
    cc: &'a str,
}

impl<'a> Verifier<'a> {
    pub fn new(ctx: &'a WrapContext, cc: &'a str) -> Self {
        Self { ctx, cc }
    }

    /// Parsed preambles of the current platform, in library order.
    pub fn preambles(&self) -> Result<Vec<(Library, Preamble)>, WrapError> {
        Library::ALL
            .iter()
            .map(|library| {
                let profile = LibraryProfile::for_library(*library);
                let path = self.ctx.output_dir.join(preamble_name(self.ctx.platform, profile));
                Ok((*library, Preamble::read(&path)?))
            })
            .collect()
    }

    /// Wrapper files of one library, sorted.
    pub fn wrappers(&self, library: Library) -> Result<Vec<PathBuf>, WrapError> {
        let prefix = library_prefix(self.ctx.platform, LibraryProfile::for_library(library));
        let dir = &self.ctx.output_dir;
        let mut files = Vec::new();
        for entry in fs::read_dir(dir).map_err(|e| WrapError::emit(dir, e))? {
            let path = entry.map_err(|e| WrapError::emit(dir, e))?.path();
            let matches = path
                .file_name()
                .map(|n| n.to_string_lossy())
                .is_some_and(|n| n.starts_with(&prefix) && n.ends_with(".c"));
            if matches {
                files.push(path);
            }
        }
        files.sort();
        Ok(files)
    }

    /// Compiler arguments for the embedded libraries of `selection`.
    pub fn compile_flags(&self, preambles: &[(Library, Preamble)], selection: Selection) -> Vec<String> {
        let mut flags: Vec<String> = self
            .ctx
            .env
            .cflags()
            .split_whitespace()
            .map(str::to_string)
            .collect();
        for (library, preamble) in preambles {
            if !selection.embeds(*library) {
                continue;
            }
            for dir in &preamble.include_dirs {
                flags.push(format!("-I{}", self.ctx.output_dir.join(dir).display()));
            }
            for define in &preamble.defines {
                flags.push(format!("-D{}", define));
            }
            if let Some(define) = &preamble.feature_define {
                flags.push(format!("-D{}", define));
            }
        }
        flags
    }

    /// Linker arguments: embedded link libs plus system copies of the rest.
    pub fn link_flags(&self, preambles: &[(Library, Preamble)], selection: Selection) -> Vec<String> {
        let mut flags: Vec<String> = self
            .ctx
            .env
            .ldflags()
            .split_whitespace()
            .map(str::to_string)
            .collect();
        for (library, preamble) in preambles {
            let libs = if selection.embeds(*library) {
                &preamble.link_libs
            } else {
                &preamble.system_libs
            };
            flags.extend(libs.iter().map(|lib| format!("-l{}", lib)));
        }
        flags
    }

    /// Compile every embedded wrapper, archive the objects, and link against
    /// system libraries when anything is not embedded.
    pub fn verify(&self, selection: Selection) -> Result<VerifyReport, WrapError> {
        info!(%selection, "verifying");
        let preambles = self.preambles()?;
        let cflags = self.compile_flags(&preambles, selection);
        let scratch = TempDir::new().map_err(|e| WrapError::emit(std::env::temp_dir(), e))?;

        let mut objects = Vec::new();
        for library in Library::ALL.iter().filter(|l| selection.embeds(**l)) {
            for source in self.wrappers(*library)? {
                let object = scratch.path().join(format!("{}.o", objects.len()));
                debug!(source = %source.display(), "compiling");
                Cmd::new(self.cc)
                    .args(&cflags)
                    .arg("-c")
                    .arg_path(&source)
                    .arg("-o")
                    .arg_path(&object)
                    .dir(&self.ctx.output_dir)
                    .build_env(&self.ctx.env)
                    .run()?;
                objects.push(object);
            }
        }

        let archive = scratch.path().join("libtor.a");
        Cmd::new("ar")
            .arg("rcs")
            .arg_path(&archive)
            .args(objects.iter().map(|o| o.as_os_str().to_owned()))
            .build_env(&self.ctx.env)
            .run()?;

        let linked = !selection.is_fully_static();
        if linked {
            self.link(scratch.path(), &objects, &self.link_flags(&preambles, selection))?;
        }

        Ok(VerifyReport {
            selection,
            compiled: objects.len(),
            linked,
        })
    }

    fn link(&self, scratch: &Path, objects: &[PathBuf], flags: &[String]) -> Result<(), WrapError> {
        Cmd::new(self.cc)
            .arg("-shared")
            .arg("-o")
            .arg_path(&scratch.join("libtor.so"))
            .args(objects.iter().map(|o| o.as_os_str().to_owned()))
            .args(flags)
            .build_env(&self.ctx.env)
            .run()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::Platform;
    use tempfile::TempDir;

    fn preamble(library: &str, feature_define: Option<&str>, system: &[&str], link: &[&str]) -> Preamble {
        Preamble {
            library: library.to_string(),
            target: "cfg(target_os = \"linux\")".to_string(),
            condition: "defined(__linux__)".to_string(),
            feature: feature_define.map(|_| format!("static-{}", library)),
            feature_define: feature_define.map(str::to_string),
            include_dirs: vec![format!("../linux/{}", library)],
            defines: Vec::new(),
            link_libs: link.iter().map(|s| s.to_string()).collect(),
            system_libs: system.iter().map(|s| s.to_string()).collect(),
        }
    }

    fn preambles() -> Vec<(Library, Preamble)> {
        let mut tor = preamble("tor", None, &[], &["m"]);
        tor.defines.push(r#"SHARE_DATADIR="./data""#.to_string());
        vec![
            (Library::Zlib, preamble("zlib", Some("LIBTOR_STATIC_ZLIB"), &["z"], &[])),
            (Library::Openssl, preamble("openssl", Some("LIBTOR_STATIC_OPENSSL"), &["ssl", "crypto"], &[])),
            (Library::Libevent, preamble("libevent", Some("LIBTOR_STATIC_LIBEVENT"), &["event"], &[])),
            (Library::Tor, tor),
        ]
    }

    #[test]
    fn test_matrix_covers_every_combination() {
        let matrix = Selection::matrix();
        assert_eq!(matrix.len(), 8);
        assert_eq!(matrix[0], Selection::STATIC);
        assert_eq!(matrix[7], Selection::DYNAMIC);
        for (i, a) in matrix.iter().enumerate() {
            assert!(matrix[i + 1..].iter().all(|b| a != b));
        }
    }

    #[test]
    fn test_flags_follow_selection() {
        let ctx = WrapContext::new("/r", Platform::Linux);
        let verifier = Verifier::new(&ctx, "cc");
        let selection = Selection {
            zlib: true,
            openssl: false,
            libevent: true,
        };

        let cflags = verifier.compile_flags(&preambles(), selection);
        assert!(cflags.contains(&"-DLIBTOR_STATIC_ZLIB".to_string()));
        assert!(cflags.contains(&"-DLIBTOR_STATIC_LIBEVENT".to_string()));
        assert!(!cflags.contains(&"-DLIBTOR_STATIC_OPENSSL".to_string()));
        assert!(cflags.contains(&"-I/r/libtor/../linux/tor".to_string()));
        assert!(cflags.contains(&r#"-DSHARE_DATADIR="./data""#.to_string()));

        let ldflags = verifier.link_flags(&preambles(), selection);
        assert_eq!(ldflags, vec!["-lssl", "-lcrypto", "-lm"]);
    }

    #[test]
    fn test_selection_label() {
        let selection = Selection {
            zlib: false,
            openssl: true,
            libevent: true,
        };
        assert_eq!(selection.to_string(), "zlib=dyn openssl=sta libevent=sta");
    }

    #[test]
    fn test_wrappers_filtered_by_library() {
        let tmp = TempDir::new().unwrap();
        let mut ctx = WrapContext::new(tmp.path(), Platform::Linux);
        ctx.output_dir = tmp.path().join("libtor");
        fs::create_dir_all(&ctx.output_dir).unwrap();
        for f in [
            "linux_zlib_crc32.c",
            "linux_zlib_adler32.c",
            "linux_zlib_preamble.toml",
            "linux_tor_src_lib_log_log.c",
            "darwin_zlib_adler32.c",
        ] {
            fs::write(ctx.output_dir.join(f), "").unwrap();
        }

        let verifier = Verifier::new(&ctx, "cc");
        let files = verifier.wrappers(Library::Zlib).unwrap();
        assert_eq!(
            files,
            vec![
                ctx.output_dir.join("linux_zlib_adler32.c"),
                ctx.output_dir.join("linux_zlib_crc32.c"),
            ]
        );
    }
}

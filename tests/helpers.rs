//! Shared test utilities for libtor-wrap integration tests.
//!
//! `FixtureFetcher` writes small upstream-shaped trees instead of cloning, and
//! `RecordedDriver` answers tool steps with canned transcripts, so the whole
//! pipeline runs without network access or a C toolchain.

#![allow(dead_code)]

use std::cell::RefCell;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use tempfile::TempDir;

use libtor_wrap::driver::{BuildDriver, ToolStep};
use libtor_wrap::error::ToolError;
use libtor_wrap::fetch::{wipe_workspace, Checkout, Fetcher};
use libtor_wrap::library::LibrarySpec;
use libtor_wrap::{Library, Platform, WrapContext, WrapError};

pub const COMMIT_DATE: &str = "Tue Sep 21 13:16:39 2021 +0100";

/// Test environment rooted in a temporary directory.
pub struct TestEnv {
    /// Temporary directory (kept alive for lifetime of TestEnv)
    pub _temp_dir: TempDir,
    pub root: PathBuf,
}

impl TestEnv {
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let root = temp_dir.path().to_path_buf();
        Self {
            _temp_dir: temp_dir,
            root,
        }
    }

    /// Linux context using the shipped config templates.
    pub fn context(&self) -> WrapContext {
        let mut ctx = WrapContext::new(&self.root, Platform::Linux);
        ctx.templates = Path::new(env!("CARGO_MANIFEST_DIR")).join("config");
        ctx
    }
}

/// Writes fixture trees into the workspace in place of a clone.
pub struct FixtureFetcher {
    trees: HashMap<Library, Vec<(&'static str, String)>>,
    pub fetched: RefCell<Vec<Library>>,
}

impl FixtureFetcher {
    pub fn new() -> Self {
        let mut trees = HashMap::new();
        trees.insert(Library::Zlib, zlib_tree());
        trees.insert(Library::Openssl, openssl_tree());
        trees.insert(Library::Libevent, libevent_tree());
        trees.insert(Library::Tor, tor_tree());
        Self {
            trees,
            fetched: RefCell::new(Vec::new()),
        }
    }

    /// Replace one file of a library's fixture tree.
    pub fn with_file(mut self, library: Library, path: &'static str, contents: &str) -> Self {
        let tree = self.trees.entry(library).or_default();
        tree.retain(|(p, _)| *p != path);
        tree.push((path, contents.to_string()));
        self
    }

    pub fn without_file(mut self, library: Library, path: &str) -> Self {
        if let Some(tree) = self.trees.get_mut(&library) {
            tree.retain(|(p, _)| *p != path);
        }
        self
    }
}

impl Fetcher for FixtureFetcher {
    fn fetch(&self, spec: &LibrarySpec) -> Result<Checkout, WrapError> {
        self.fetched.borrow_mut().push(spec.library);
        wipe_workspace(&spec.workspace)?;
        for (path, contents) in self.trees.get(&spec.library).into_iter().flatten() {
            let dest = spec.workspace.join(path);
            fs::create_dir_all(dest.parent().expect("fixture path has a parent"))
                .expect("Failed to create fixture dir");
            fs::write(&dest, contents).expect("Failed to write fixture file");
        }
        Ok(Checkout {
            path: spec.workspace.clone(),
            commit_date: COMMIT_DATE.to_string(),
        })
    }
}

/// Answers tool steps from recorded transcripts keyed by workspace name and
/// command line. Unrecorded steps succeed with empty output.
pub struct RecordedDriver {
    transcripts: HashMap<(String, String), String>,
    failing: Option<(String, String)>,
    pub calls: RefCell<Vec<String>>,
}

impl RecordedDriver {
    pub fn new() -> Self {
        let mut transcripts = HashMap::new();
        transcripts.insert(key("openssl", "make --dry-run"), OPENSSL_DRY_RUN.to_string());
        transcripts.insert(key("libevent", "make --dry-run libevent.la"), LIBEVENT_DRY_RUN.to_string());
        transcripts.insert(key("tor", "make --dry-run"), TOR_DRY_RUN.to_string());
        Self {
            transcripts,
            failing: None,
            calls: RefCell::new(Vec::new()),
        }
    }

    pub fn with_transcript(mut self, library: &str, command: &str, transcript: &str) -> Self {
        self.transcripts.insert(key(library, command), transcript.to_string());
        self
    }

    /// Make one step exit with status 2.
    pub fn failing(mut self, library: &str, command: &str) -> Self {
        self.failing = Some(key(library, command));
        self
    }
}

fn key(library: &str, command: &str) -> (String, String) {
    (library.to_string(), command.to_string())
}

impl BuildDriver for RecordedDriver {
    fn run(&self, step: &ToolStep, workspace: &Path) -> Result<String, WrapError> {
        let library = workspace
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let key = key(&library, &step.command_line());
        self.calls.borrow_mut().push(format!("{}: {}", key.0, key.1));

        if self.failing.as_ref() == Some(&key) {
            return Err(WrapError::Tool(ToolError {
                command: key.1,
                dir: Some(workspace.to_path_buf()),
                code: Some(2),
                stdout: String::new(),
                stderr: "configure: error: recorded failure\n".to_string(),
                spawn: None,
            }));
        }
        Ok(self.transcripts.get(&key).cloned().unwrap_or_default())
    }
}

fn tree(files: &[(&'static str, &str)]) -> Vec<(&'static str, String)> {
    files.iter().map(|(p, c)| (*p, c.to_string())).collect()
}

fn zlib_tree() -> Vec<(&'static str, String)> {
    tree(&[
        ("adler32.c", "#include \"zutil.h\"\n"),
        ("crc32.c", "#include \"zutil.h\"\n"),
        ("zutil.c", "#include \"zutil.h\"\n"),
        ("zutil.h", "#include \"zlib.h\"\n"),
        ("zlib.h", "#define ZLIB_VERSION \"1.2.11\"\n"),
        ("LICENSE", "zlib license\n"),
        ("Makefile.in", "all:\n"),
        ("contrib/minizip/unzip.c", "\n"),
        ("test/example.c", "int main(void) { return 0; }\n"),
    ])
}

fn openssl_tree() -> Vec<(&'static str, String)> {
    tree(&[
        ("crypto/cryptlib.c", "\n"),
        ("crypto/aes/aes_core.c", "\n"),
        ("ssl/ssl_lib.c", "\n"),
        ("include/openssl/opensslv.h", "\n"),
        ("apps/openssl.c", "int main(void) { return 0; }\n"),
        ("fuzz/asn1.c", "\n"),
        ("Configure", "#!/usr/bin/env perl\n"),
        ("LICENSE", "openssl license\n"),
    ])
}

fn libevent_tree() -> Vec<(&'static str, String)> {
    tree(&[
        (
            "configure.ac",
            "AC_INIT(libevent,2.1.12-stable)\nAC_DEFINE(NUMERIC_VERSION, 0x02010c00, [Numeric representation of the version])\n",
        ),
        ("event.c", "\n"),
        ("buffer.c", "\n"),
        ("epoll.c", "\n"),
        ("include/event2/event.h", "\n"),
        ("compat/sys/queue.h", "\n"),
        ("test/regress.c", "\n"),
        ("LICENSE", "libevent license\n"),
    ])
}

fn tor_tree() -> Vec<(&'static str, String)> {
    tree(&[
        ("src/win32/orconfig.h", "#define VERSION \"0.4.6.10\"\n"),
        ("src/app/main/tor_main.c", "int main(void) { return 0; }\n"),
        ("src/core/or/channel.c", "\n"),
        ("src/core/or/.deps/channel.Po", "# dummy\n"),
        ("src/lib/log/log.c", "\n"),
        ("src/ext/curve25519_donna/curve25519-donna-c64.c", "\n"),
        ("src/ext/curve25519_donna/curve25519-donna.c", "\n"),
        ("src/test/test.c", "\n"),
        ("src/tools/tor-resolve.c", "\n"),
        ("src/Makefile.nmake", "\n"),
        ("doc/tor.1.txt", "\n"),
        ("LICENSE", "tor license\n"),
    ])
}

pub const OPENSSL_DRY_RUN: &str = "\
gcc  -I. -Iinclude -fPIC -pthread -m64 -Wa,--noexecstack -Wall -O3 -DOPENSSL_USE_NODELETE -DNDEBUG -MMD -MF apps/openssl.d.tmp -MT apps/openssl.o -c -o apps/openssl.o apps/openssl.c
gcc  -I. -Iinclude -fPIC -pthread -m64 -O3 -MMD -MF crypto/aes/aes_core.d.tmp -MT crypto/aes/aes_core.o -c -o crypto/aes/aes_core.o crypto/aes/aes_core.c
gcc  -I. -Iinclude -fPIC -pthread -m64 -O3 -MMD -MF crypto/cryptlib.d.tmp -MT crypto/cryptlib.o -c -o crypto/cryptlib.o crypto/cryptlib.c
gcc  -I. -Iinclude -fPIC -pthread -m64 -O3 -MMD -MF fuzz/asn1.d.tmp -MT fuzz/asn1.o -c -o fuzz/asn1.o fuzz/asn1.c
gcc  -I. -Iinclude -fPIC -pthread -m64 -O3 -MMD -MF ssl/ssl_lib.d.tmp -MT ssl/ssl_lib.o -c -o ssl/ssl_lib.o ssl/ssl_lib.c
ar r libcrypto.a crypto/aes/aes_core.o crypto/cryptlib.o
";

pub const LIBEVENT_DRY_RUN: &str = "\
echo \"  CC      \" buffer.lo;/bin/bash ./libtool  --silent --tag=CC   --mode=compile gcc -DHAVE_CONFIG_H -I. -c -o buffer.lo buffer.c
echo \"  CC      \" event.lo;/bin/bash ./libtool  --silent --tag=CC   --mode=compile gcc -DHAVE_CONFIG_H -I. -c -o event.lo event.c
echo \"  CC      \" epoll.lo;/bin/bash ./libtool  --silent --tag=CC   --mode=compile gcc -DHAVE_CONFIG_H -I. -c -o epoll.lo epoll.c
echo \"  CCLD    \" libevent.la;/bin/bash ./libtool  --silent --tag=CC   --mode=link gcc -o libevent.la
";

pub const TOR_DRY_RUN: &str = "\
make  all-am
echo \"  CC      \" src/app/main/tor_main.o;gcc -DHAVE_CONFIG_H -I. -c -o src/app/main/tor_main.o src/app/main/tor_main.c
echo \"  CC      \" src/core/or/channel.o;gcc -DHAVE_CONFIG_H -I. -c -o src/core/or/channel.o src/core/or/channel.c
echo \"  CC      \" src/lib/log/log.o;gcc -DHAVE_CONFIG_H -I. -c -o src/lib/log/log.o src/lib/log/log.c
echo \"  CC      \" src/ext/curve25519_donna/curve25519-donna-c64.o;gcc -c -o src/ext/curve25519_donna/curve25519-donna-c64.o src/ext/curve25519_donna/curve25519-donna-c64.c
gcc -c -o src/test/test.o src/test/test.c
gcc -c -o src/tools/tor-resolve.o src/tools/tor-resolve.c
";

//! Tor 0.4.6: the embedded daemon itself.
//!
//! Tor is never swapped for a system copy, so its wrappers carry only the
//! platform guard. The curve25519-donna implementation ships a 64-bit body
//! (`-c64`) and a portable one; those units expand per architecture.

use super::{
    capture_from, flag, Discovery, LibraryProfile, Metadata, PreambleSpec, TARGET_CLASSES,
};
use crate::driver::ToolStep;
use crate::error::WrapError;
use crate::extract::{Exclusions, Grammar};
use crate::fetch::Checkout;
use crate::library::Library;
use crate::materialize::{ConfigArtifact, ConfigHeaderVariant, HeaderFamily};
use crate::platform::Arch;
use crate::prune::{NestedRules, PruneRules};
use crate::unit::CompilationUnit;

const UNIT_TEMPLATE: &str = r#"/* Generated by libtor-wrap. Do not edit. */
/* target: {{TARGET_CFG}} */
#if {{TARGET_CONDITION}}

#include "{{WORKSPACE}}/{{SOURCE}}"

#endif
"#;

const PREAMBLE: PreambleSpec = PreambleSpec {
    include_dirs: &[
        "",
        "src",
        "src/core/or",
        "src/ext",
        "src/ext/trunnel",
        "src/feature/api",
    ],
    defines: &["ED25519_CUSTOMRANDOM", "ED25519_CUSTOMHASH", "ED25519_SUFFIX=_donna"],
    link_libs: &["m"],
    system_libs: &[],
};

/// Suffix marking the 64-bit-only body of an architecture-variant unit.
const WIDE_SUFFIX: &str = "-c64";

/// Version string from the bundled Windows header; the configure-generated
/// `orconfig.h` is host-specific and not used.
const VERSION: &str = r#"define VERSION "(.+)""#;

pub(super) static PROFILE: LibraryProfile = LibraryProfile {
    library: Library::Tor,
    url: "https://git.torproject.org/tor.git",
    tag: "release-0.4.6",
    configure: &[
        ToolStep::new("./autogen.sh", &[]),
        ToolStep::new("./configure", &["--disable-asciidoc"]),
    ],
    discovery: Discovery::DryRun {
        step: ToolStep::new("make", &["--dry-run"]),
        grammar: Grammar {
            describes: "C sources mentioned anywhere in the build plan",
            pattern: r"([a-z0-9_/-]+)\.c\b",
        },
        exclusions: Exclusions {
            prefixes: &["src/ext/tinytest", "src/test/", "src/tools/"],
            entry_point: Some("tor_main"),
        },
    },
    prune: PruneRules {
        keep_dirs: &["src"],
        keep_files: &["LICENSE", "orconfig.h"],
        keep_extensions: &[],
        nested: Some(NestedRules {
            dir: "src",
            keep_dirs: &["app", "core", "ext", "feature", "lib", "trunnel", "win32"],
            purge: &[".deps"],
        }),
    },
    feature: None,
    unit_template: UNIT_TEMPLATE,
    preamble: PREAMBLE,
    config_root: Some("tor_config"),
    metadata: version,
    classify,
    config,
};

fn version(checkout: &Checkout) -> Result<Metadata, WrapError> {
    let path = checkout.path.join("src/win32/orconfig.h");
    let mut meta = Metadata::new();
    meta.insert("VERSION", capture_from(&path, VERSION)?);
    Ok(meta)
}

fn classify(library: Library, stem: &str) -> CompilationUnit {
    let Some(portable) = stem.strip_suffix(WIDE_SUFFIX) else {
        return CompilationUnit::direct(library, stem);
    };
    let bodies = Arch::ALL
        .iter()
        .map(|arch| {
            let body = if arch.is_64bit() { stem } else { portable };
            (*arch, body.to_string())
        })
        .collect();
    CompilationUnit::arch_variant(library, stem, bodies)
}

fn config() -> Vec<ConfigArtifact> {
    let variants = TARGET_CLASSES
        .iter()
        .map(|class| {
            let mut values = class.sizes();
            let time_t = if class.lp64 { "8" } else { "4" };
            values.push(("SIZEOF_TIME_T", time_t.to_string()));
            values.push(("HAVE_EPOLL", flag("HAVE_EPOLL_CREATE", class.epoll)));
            values.push(("HAVE_SYS_EPOLL_H", flag("HAVE_SYS_EPOLL_H", class.epoll)));
            values.push(("HAVE_KQUEUE", flag("HAVE_KQUEUE", class.kqueue)));
            values.push(("HAVE_EVENTFD", flag("HAVE_EVENTFD", class.epoll)));
            values.push(("HAVE_SYS_EVENTFD_H", flag("HAVE_SYS_EVENTFD_H", class.epoll)));
            values.push(("HAVE_PIPE2", flag("HAVE_PIPE2", class.epoll)));
            values.push(("HAVE_STRLCPY", flag("HAVE_STRLCPY", class.strlcpy)));
            values.push(("HAVE_STRLCAT", flag("HAVE_STRLCAT", class.strlcpy)));
            ConfigHeaderVariant {
                suffix: class.suffix,
                selector: class.selector,
                values,
            }
        })
        .collect();

    vec![
        ConfigArtifact::Family(HeaderFamily {
            name: "orconfig",
            directory: "",
            template: "orconfig.h.in",
            variants,
        }),
        ConfigArtifact::Verbatim {
            template: "micro-revision.i",
            dest: "micro-revision.i",
        },
    ]
}

//! OpenSSL 1.1.1: units listed by `make --dry-run`, four config header families.

use super::{classify_direct, Discovery, Feature, LibraryProfile, Metadata, PreambleSpec};
use crate::driver::ToolStep;
use crate::error::WrapError;
use crate::extract::{Exclusions, Grammar};
use crate::fetch::Checkout;
use crate::library::Library;
use crate::materialize::{ConfigArtifact, ConfigHeaderVariant, HeaderFamily};
use crate::prune::PruneRules;

const UNIT_TEMPLATE: &str = r#"/* Generated by libtor-wrap. Do not edit. */
/* target: {{TARGET_CFG}} */
/* feature: static-openssl */
#if ({{TARGET_CONDITION}}) && defined(LIBTOR_STATIC_OPENSSL)

#define DSO_NONE
#define OPENSSLDIR "/usr/local/ssl"
#define ENGINESDIR "/usr/local/lib/engines"

#include "{{WORKSPACE}}/{{SOURCE}}"

#endif
"#;

const PREAMBLE: PreambleSpec = PreambleSpec {
    include_dirs: &[
        "",
        "include",
        "crypto/ec/curve448",
        "crypto/ec/curve448/arch_32",
        "crypto/modes",
    ],
    defines: &[],
    link_libs: &[],
    system_libs: &["ssl", "crypto"],
};

pub(super) static PROFILE: LibraryProfile = LibraryProfile {
    library: Library::Openssl,
    url: "https://github.com/openssl/openssl",
    tag: "OpenSSL_1_1_1-stable",
    configure: &[ToolStep::new(
        "./config",
        &["no-shared", "no-zlib", "no-asm", "no-async", "no-sctp"],
    )],
    discovery: Discovery::DryRun {
        step: ToolStep::new("make", &["--dry-run"]),
        grammar: Grammar {
            describes: "compile commands ending in a .c source",
            pattern: r"(?m)([a-z0-9_/-]+)\.c$",
        },
        exclusions: Exclusions {
            prefixes: &["apps/", "fuzz/", "test/"],
            entry_point: None,
        },
    },
    prune: PruneRules {
        keep_dirs: &["crypto", "engines", "include", "ssl"],
        keep_files: &["LICENSE"],
        keep_extensions: &["c", "h"],
        nested: None,
    },
    feature: Some(Feature {
        name: "static-openssl",
        define: "LIBTOR_STATIC_OPENSSL",
    }),
    unit_template: UNIT_TEMPLATE,
    preamble: PREAMBLE,
    config_root: Some("openssl_config"),
    metadata: commit_date,
    classify: classify_direct,
    config,
};

/// `buildinf.h` records when the sources were built; the commit date keeps
/// reruns reproducible.
fn commit_date(checkout: &Checkout) -> Result<Metadata, WrapError> {
    let mut meta = Metadata::new();
    meta.insert("DATE", checkout.commit_date.clone());
    Ok(meta)
}

const X64: &str = "!defined(__APPLE__) && defined(__LP64__)";
const X86: &str = "!defined(__APPLE__) && !defined(__LP64__)";
const MACOS64: &str = "defined(__ENVIRONMENT_MAC_OS_X_VERSION_MIN_REQUIRED__)";
const IOS64: &str = "defined(__ENVIRONMENT_IPHONE_OS_VERSION_MIN_REQUIRED__)";

fn variant(suffix: &'static str, selector: &'static str, values: &[(&'static str, &str)]) -> ConfigHeaderVariant {
    ConfigHeaderVariant {
        suffix,
        selector,
        values: values.iter().map(|(k, v)| (*k, v.to_string())).collect(),
    }
}

fn config() -> Vec<ConfigArtifact> {
    let dso_conf = HeaderFamily {
        name: "dso_conf",
        directory: "crypto",
        template: "dso_conf.h.in",
        variants: vec![
            variant("linux", "defined(__linux__)", &[("DSO_EXTENSION", ".so")]),
            variant("darwin", "defined(__APPLE__)", &[("DSO_EXTENSION", ".dylib")]),
        ],
    };

    let bn_conf = HeaderFamily {
        name: "bn_conf",
        directory: "crypto",
        template: "bn_conf.h.in",
        variants: vec![
            variant("x64", "defined(__LP64__)", &[("BN_LIMB", "SIXTY_FOUR_BIT_LONG")]),
            variant("x86", "!defined(__LP64__)", &[("BN_LIMB", "THIRTY_TWO_BIT")]),
        ],
    };

    let buildinf = HeaderFamily {
        name: "buildinf",
        directory: "",
        template: "buildinf.h.in",
        variants: vec![
            variant("x64", X64, &[("PLATFORM", "linux-x86_64")]),
            variant("x86", X86, &[("PLATFORM", "linux-x86")]),
            variant("macos64", MACOS64, &[("PLATFORM", "darwin64-x86_64-cc")]),
            variant("ios64", IOS64, &[("PLATFORM", "ios64-cross")]),
        ],
    };

    let opensslconf = HeaderFamily {
        name: "opensslconf",
        directory: "openssl",
        template: "opensslconf.h.in",
        variants: vec![
            variant("x64", X64, &[("BN_LIMB", "SIXTY_FOUR_BIT_LONG"), ("RC4_INT", "unsigned int")]),
            variant("x86", X86, &[("BN_LIMB", "THIRTY_TWO_BIT"), ("RC4_INT", "unsigned int")]),
            variant("macos64", MACOS64, &[("BN_LIMB", "SIXTY_FOUR_BIT_LONG"), ("RC4_INT", "unsigned int")]),
            variant("ios64", IOS64, &[("BN_LIMB", "SIXTY_FOUR_BIT_LONG"), ("RC4_INT", "unsigned char")]),
        ],
    };

    vec![
        ConfigArtifact::Family(dso_conf),
        ConfigArtifact::Family(bn_conf),
        ConfigArtifact::Family(buildinf),
        ConfigArtifact::Family(opensslconf),
    ]
}

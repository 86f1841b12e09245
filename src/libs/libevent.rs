//! libevent 2.1: autotools build, units listed by a dry run of the `libevent.la` target.

use super::{
    capture_from, classify_direct, flag, Discovery, Feature, LibraryProfile, Metadata,
    PreambleSpec, TARGET_CLASSES,
};
use crate::driver::ToolStep;
use crate::error::WrapError;
use crate::extract::{Exclusions, Grammar};
use crate::fetch::Checkout;
use crate::library::Library;
use crate::materialize::{ConfigArtifact, ConfigHeaderVariant, HeaderFamily};
use crate::prune::PruneRules;

const UNIT_TEMPLATE: &str = r#"/* Generated by libtor-wrap. Do not edit. */
/* target: {{TARGET_CFG}} */
/* feature: static-libevent */
#if ({{TARGET_CONDITION}}) && defined(LIBTOR_STATIC_LIBEVENT)

#include <compat/sys/queue.h>
#include "{{WORKSPACE}}/{{SOURCE}}"

#endif
"#;

const PREAMBLE: PreambleSpec = PreambleSpec {
    include_dirs: &["", "compat", "include"],
    defines: &[],
    link_libs: &[],
    system_libs: &["event"],
};

const NUMERIC_VERSION: &str = r"AC_DEFINE\(NUMERIC_VERSION, (0x[0-9a-f]{8}),";
const STRING_VERSION: &str = r"AC_INIT\(libevent,(.+)\)";

pub(super) static PROFILE: LibraryProfile = LibraryProfile {
    library: Library::Libevent,
    url: "https://github.com/libevent/libevent",
    tag: "release-2.1.12-stable",
    configure: &[
        ToolStep::new("./autogen.sh", &[]),
        ToolStep::new("./configure", &["--disable-shared", "--enable-static"]),
    ],
    discovery: Discovery::DryRun {
        step: ToolStep::new("make", &["--dry-run", "libevent.la"]),
        grammar: Grammar {
            describes: "libtool objects of the libevent.la target",
            pattern: r" ([a-z_]+)\.lo;",
        },
        exclusions: Exclusions::NONE,
    },
    prune: PruneRules {
        keep_dirs: &["include", "compat"],
        keep_files: &["LICENSE"],
        keep_extensions: &["c", "h"],
        nested: None,
    },
    feature: Some(Feature {
        name: "static-libevent",
        define: "LIBTOR_STATIC_LIBEVENT",
    }),
    unit_template: UNIT_TEMPLATE,
    preamble: PREAMBLE,
    config_root: Some("libevent_config"),
    metadata: versions,
    classify: classify_direct,
    config,
};

/// Versions declared in `configure.ac`, which pruning removes.
fn versions(checkout: &Checkout) -> Result<Metadata, WrapError> {
    let path = checkout.path.join("configure.ac");
    let mut meta = Metadata::new();
    meta.insert("NUMERIC_VERSION", capture_from(&path, NUMERIC_VERSION)?);
    meta.insert("STRING_VERSION", capture_from(&path, STRING_VERSION)?);
    Ok(meta)
}

fn config() -> Vec<ConfigArtifact> {
    let variants = TARGET_CLASSES
        .iter()
        .map(|class| {
            let mut values = class.sizes();
            values.push(("HAVE_EPOLL", flag("EVENT__HAVE_EPOLL", class.epoll)));
            values.push(("HAVE_EPOLL_CTL", flag("EVENT__HAVE_EPOLL_CTL", class.epoll)));
            values.push(("HAVE_KQUEUE", flag("EVENT__HAVE_KQUEUE", class.kqueue)));
            ConfigHeaderVariant {
                suffix: class.suffix,
                selector: class.selector,
                values,
            }
        })
        .collect();

    vec![ConfigArtifact::Family(HeaderFamily {
        name: "event-config",
        directory: "event2",
        template: "event-config.h.in",
        variants,
    })]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ConfigCause;
    use crate::extract::{extract, Extracted};
    use std::fs;
    use tempfile::TempDir;

    const TRANSCRIPT: &str = "\
/bin/bash ./libtool  --tag=CC   --mode=compile gcc -DHAVE_CONFIG_H -I.  -I./compat -I./include -g -O2 -c -o buffer.lo buffer.c
echo \"  CC      \" bufferevent.lo;/bin/bash ./libtool  --silent --tag=CC   --mode=compile gcc -c -o bufferevent.lo bufferevent.c
echo \"  CC      \" event.lo;/bin/bash ./libtool  --silent --mode=compile gcc -c -o event.lo event.c
echo \"  CC      \" epoll.lo;/bin/bash ./libtool  --silent --mode=compile gcc -c -o epoll.lo epoll.c
echo \"  CC      \" event.lo;/bin/bash ./libtool  --silent --mode=compile gcc -c -o event.lo event.c
";

    #[test]
    fn test_libtool_object_extraction() {
        let Discovery::DryRun { grammar, exclusions, .. } = PROFILE.discovery else {
            panic!("libevent units come from a dry run");
        };
        let got = extract(TRANSCRIPT, &grammar, &exclusions).unwrap();
        assert_eq!(
            got,
            Extracted::Units(vec![
                "bufferevent".to_string(),
                "event".to_string(),
                "epoll".to_string(),
            ])
        );
    }

    #[test]
    fn test_versions_from_configure_ac() {
        let tmp = TempDir::new().unwrap();
        fs::write(
            tmp.path().join("configure.ac"),
            "AC_INIT(libevent,2.1.12-stable)\nAC_DEFINE(NUMERIC_VERSION, 0x02010c00, [Numeric representation of the version])\n",
        )
        .unwrap();
        let checkout = Checkout {
            path: tmp.path().to_path_buf(),
            commit_date: String::new(),
        };
        let meta = versions(&checkout).unwrap();
        assert_eq!(meta["NUMERIC_VERSION"], "0x02010c00");
        assert_eq!(meta["STRING_VERSION"], "2.1.12-stable");
    }

    #[test]
    fn test_missing_numeric_version_is_config_error() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("configure.ac"), "AC_INIT(libevent,2.1.12-stable)\n").unwrap();
        let checkout = Checkout {
            path: tmp.path().to_path_buf(),
            commit_date: String::new(),
        };
        let err = versions(&checkout).unwrap_err();
        assert!(matches!(
            err,
            WrapError::Config { source: ConfigCause::Pattern(p), .. } if p == NUMERIC_VERSION
        ));
    }

    #[test]
    fn test_six_variants_with_backend_flags() {
        let artifacts = config();
        let ConfigArtifact::Family(family) = &artifacts[0] else {
            panic!("event-config is a family");
        };
        let suffixes: Vec<_> = family.variants.iter().map(|v| v.suffix).collect();
        assert_eq!(
            suffixes,
            ["linux64", "linux32", "android64", "android32", "macos64", "ios64"]
        );
        let macos = &family.variants[4];
        assert!(macos
            .values
            .contains(&("HAVE_KQUEUE", "#define EVENT__HAVE_KQUEUE 1".to_string())));
        assert!(macos
            .values
            .contains(&("HAVE_EPOLL", "/* #undef EVENT__HAVE_EPOLL */".to_string())));
    }
}

//! zlib: plain C with no generated headers.

use super::{classify_direct, no_config, no_metadata, Discovery, Feature, LibraryProfile, PreambleSpec};
use crate::library::Library;
use crate::prune::PruneRules;

const UNIT_TEMPLATE: &str = r#"/* Generated by libtor-wrap. Do not edit. */
/* target: {{TARGET_CFG}} */
/* feature: static-zlib */
#if ({{TARGET_CONDITION}}) && defined(LIBTOR_STATIC_ZLIB)

#define HAVE_UNISTD_H
#define HAVE_STDARG_H

#include "{{WORKSPACE}}/{{SOURCE}}"

#endif
"#;

/// Workspace root only; zlib keeps its headers next to the sources.
const PREAMBLE: PreambleSpec = PreambleSpec {
    include_dirs: &[""],
    defines: &[],
    link_libs: &[],
    system_libs: &["z"],
};

pub(super) static PROFILE: LibraryProfile = LibraryProfile {
    library: Library::Zlib,
    url: "https://github.com/madler/zlib",
    tag: "v1.2.11",
    configure: &[],
    discovery: Discovery::TopLevelSources,
    prune: PruneRules {
        keep_dirs: &[],
        keep_files: &["LICENSE"],
        keep_extensions: &["c", "h"],
        nested: None,
    },
    feature: Some(Feature {
        name: "static-zlib",
        define: "LIBTOR_STATIC_ZLIB",
    }),
    unit_template: UNIT_TEMPLATE,
    preamble: PREAMBLE,
    config_root: None,
    metadata: no_metadata,
    classify: classify_direct,
    config: no_config,
};

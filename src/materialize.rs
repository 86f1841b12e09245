//! Configuration header materialization.
//!
//! Upstream configure scripts bake host facts (type sizes, available event
//! backends, version strings, build dates) into generated headers. Wrappers
//! must compile on every target the platform filter admits, so each such
//! header is rendered once per target class from a checked-in template and a
//! generated dispatcher picks the right one at compile time.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::{ConfigCause, WrapError};
use crate::libs::Metadata;
use crate::template::Template;

/// One rendering of a header family for a class of targets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigHeaderVariant {
    /// File-name suffix, e.g. `linux64` in `event-config.linux64.h`.
    pub suffix: &'static str,
    /// Preprocessor condition selecting this variant.
    pub selector: &'static str,
    /// Target-specific substitution values.
    pub values: Vec<(&'static str, String)>,
}

/// A set of interchangeable header variants plus their dispatcher.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeaderFamily {
    /// Base name of the header, without `.h`.
    pub name: &'static str,
    /// Subdirectory of the config root the headers land in.
    pub directory: &'static str,
    /// Template file, relative to the library's template directory.
    pub template: &'static str,
    pub variants: Vec<ConfigHeaderVariant>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigArtifact {
    Family(HeaderFamily),
    /// Copied byte-for-byte.
    Verbatim {
        template: &'static str,
        dest: &'static str,
    },
}

impl HeaderFamily {
    fn dir(&self, config_root: &Path) -> PathBuf {
        if self.directory.is_empty() {
            config_root.to_path_buf()
        } else {
            config_root.join(self.directory)
        }
    }

    fn variant_file(&self, variant: &ConfigHeaderVariant) -> String {
        format!("{}.{}.h", self.name, variant.suffix)
    }

    /// Header that includes the variant matching the compilation target.
    pub fn dispatcher(&self) -> String {
        let guard = format!(
            "LIBTOR_{}_DISPATCH_H",
            self.name.to_ascii_uppercase().replace(['-', '/', '.'], "_")
        );
        let mut out = String::new();
        out.push_str("/* Generated by libtor-wrap. Do not edit. */\n");
        out.push_str(&format!("#ifndef {}\n#define {}\n\n", guard, guard));
        for (i, variant) in self.variants.iter().enumerate() {
            let keyword = if i == 0 { "#if" } else { "#elif" };
            out.push_str(&format!("{} {}\n", keyword, variant.selector));
            out.push_str(&format!("#include \"{}\"\n", self.variant_file(variant)));
        }
        out.push_str("#else\n");
        out.push_str(&format!("#error \"{}.h: unsupported target\"\n", self.name));
        out.push_str("#endif\n\n");
        out.push_str(&format!("#endif /* {} */\n", guard));
        out
    }
}

/// Files written by one materialization.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MaterializeReport {
    pub written: Vec<PathBuf>,
}

/// Replace `config_root` with every artifact rendered from `templates`.
///
/// Variant values take precedence over metadata values of the same name.
pub fn materialize(
    templates: &Path,
    config_root: &Path,
    artifacts: &[ConfigArtifact],
    metadata: &Metadata,
) -> Result<MaterializeReport, WrapError> {
    let mut report = MaterializeReport::default();

    if config_root.exists() {
        fs::remove_dir_all(config_root).map_err(|e| WrapError::emit(config_root, e))?;
    }
    fs::create_dir_all(config_root).map_err(|e| WrapError::emit(config_root, e))?;

    for artifact in artifacts {
        match artifact {
            ConfigArtifact::Family(family) => {
                let source = templates.join(family.template);
                let text = fs::read_to_string(&source).map_err(|e| WrapError::config(&source, e))?;
                let template = Template::new(&text);
                let dir = family.dir(config_root);
                fs::create_dir_all(&dir).map_err(|e| WrapError::emit(&dir, e))?;

                for variant in &family.variants {
                    let mut values: Vec<(&str, &str)> = variant
                        .values
                        .iter()
                        .map(|(k, v)| (*k, v.as_str()))
                        .collect();
                    values.extend(metadata.iter().map(|(k, v)| (*k, v.as_str())));
                    let rendered = template
                        .render(&values)
                        .map_err(|name| WrapError::config(&source, ConfigCause::Placeholder(name)))?;
                    let dest = dir.join(family.variant_file(variant));
                    write(&dest, rendered.as_bytes(), &mut report)?;
                }

                let dest = dir.join(format!("{}.h", family.name));
                write(&dest, family.dispatcher().as_bytes(), &mut report)?;
            }
            ConfigArtifact::Verbatim { template, dest } => {
                let source = templates.join(template);
                let blob = fs::read(&source).map_err(|e| WrapError::config(&source, e))?;
                let dest = config_root.join(dest);
                if let Some(parent) = dest.parent() {
                    fs::create_dir_all(parent).map_err(|e| WrapError::emit(parent, e))?;
                }
                write(&dest, &blob, &mut report)?;
            }
        }
    }

    debug!(root = %config_root.display(), files = report.written.len(), "materialized config");
    Ok(report)
}

fn write(dest: &Path, contents: &[u8], report: &mut MaterializeReport) -> Result<(), WrapError> {
    fs::write(dest, contents).map_err(|e| WrapError::emit(dest, e))?;
    report.written.push(dest.to_path_buf());
    Ok(())
}

//! Architecture-variant expansion.
//!
//! Direct units map to exactly one wrapper. An architecture-variant unit maps
//! to one wrapper per declared architecture group, each narrowed to that
//! architecture and naming that group's source body.

use std::collections::HashMap;
use std::path::PathBuf;

use crate::error::WrapError;
use crate::platform::Platform;
use crate::unit::{CompilationUnit, UnitKind, WrapperFile};

/// Expand units into wrapper descriptors for one platform.
///
/// Fails when two units would write the same wrapper file.
pub fn expand(platform: Platform, units: &[CompilationUnit]) -> Result<Vec<WrapperFile>, WrapError> {
    let filter = platform.target_filter();
    let mut wrappers = Vec::with_capacity(units.len());

    for unit in units {
        let stem = format!("{}_{}_{}", platform.name(), unit.library.name(), unit.flat_name());
        match &unit.kind {
            UnitKind::Direct => wrappers.push(WrapperFile {
                unit: unit.path.clone(),
                filter: filter.clone(),
                output: format!("{}.c", stem),
                source: PathBuf::from(format!("{}.c", unit.path)),
            }),
            UnitKind::ArchVariant(bodies) => {
                for (arch, body) in bodies {
                    wrappers.push(WrapperFile {
                        unit: unit.path.clone(),
                        filter: filter.restrict_to(*arch),
                        output: format!("{}_{}.c", stem, arch.name()),
                        source: PathBuf::from(format!("{}.c", body)),
                    });
                }
            }
        }
    }

    let mut owners: HashMap<&str, &str> = HashMap::with_capacity(wrappers.len());
    for wrapper in &wrappers {
        if let Some(other) = owners.insert(&wrapper.output, &wrapper.unit) {
            return Err(WrapError::Expansion {
                library: units[0].library.name(),
                detail: format!("{} and {} both flatten to {}", other, wrapper.unit, wrapper.output),
            });
        }
    }

    Ok(wrappers)
}

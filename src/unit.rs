//! Compilation units and the wrapper descriptors expanded from them.

use std::path::PathBuf;

use crate::library::Library;
use crate::platform::{Arch, TargetFilter};

/// How a logical unit maps onto upstream source bodies.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UnitKind {
    /// One source body valid on every target of the platform.
    Direct,
    /// Interchangeable bodies selected by architecture; one entry per
    /// architecture group, each naming the source stem to embed there.
    ArchVariant(Vec<(Arch, String)>),
}

/// One translation unit discovered in an upstream tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompilationUnit {
    pub library: Library,
    /// Path relative to the workspace, without the `.c` suffix.
    pub path: String,
    pub kind: UnitKind,
}

impl CompilationUnit {
    pub fn direct(library: Library, path: impl Into<String>) -> Self {
        Self {
            library,
            path: path.into(),
            kind: UnitKind::Direct,
        }
    }

    pub fn arch_variant(library: Library, path: impl Into<String>, bodies: Vec<(Arch, String)>) -> Self {
        Self {
            library,
            path: path.into(),
            kind: UnitKind::ArchVariant(bodies),
        }
    }

    pub fn is_arch_variant(&self) -> bool {
        matches!(self.kind, UnitKind::ArchVariant(_))
    }

    /// Unit path with separators flattened, as used in wrapper file names.
    pub fn flat_name(&self) -> String {
        self.path.replace('/', "_")
    }
}

/// One wrapper file to be emitted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WrapperFile {
    /// Logical unit path this wrapper belongs to.
    pub unit: String,
    pub filter: TargetFilter,
    /// File name inside the output directory.
    pub output: String,
    /// Embedded source, relative to the library workspace.
    pub source: PathBuf,
}

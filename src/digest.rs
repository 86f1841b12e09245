//! Content digest of everything a run emits.
//!
//! Two runs against the same pinned tags must produce byte-identical output;
//! comparing digests is the cheap way to check.

use std::fs;
use std::path::{Path, PathBuf};

use sha2::{Digest, Sha256};
use walkdir::WalkDir;

use crate::error::WrapError;
use crate::libs::LibraryProfile;
use crate::library::Library;
use crate::pipeline::WrapContext;

/// SHA-256 over the sorted relative paths and contents below each root.
///
/// Missing roots contribute nothing. Only files whose name starts with
/// `prefix` are hashed directly below a root.
pub fn hash_tree(roots: &[(&Path, Option<&str>)]) -> Result<String, WrapError> {
    let mut hasher = Sha256::new();
    for (root, prefix) in roots {
        if !root.exists() {
            continue;
        }
        for entry in WalkDir::new(root).sort_by_file_name() {
            let entry = entry.map_err(|e| {
                let path = e.path().map(Path::to_path_buf).unwrap_or_else(|| root.to_path_buf());
                WrapError::emit(path, std::io::Error::from(e))
            })?;
            if !entry.file_type().is_file() {
                continue;
            }
            if let Some(prefix) = prefix {
                let direct = entry.depth() == 1;
                if !direct || !entry.file_name().to_string_lossy().starts_with(prefix) {
                    continue;
                }
            }
            let rel = entry.path().strip_prefix(root).unwrap_or(entry.path());
            let content = fs::read(entry.path()).map_err(|e| WrapError::emit(entry.path(), e))?;
            hasher.update(rel.to_string_lossy().as_bytes());
            hasher.update([0u8]);
            hasher.update((content.len() as u64).to_le_bytes());
            hasher.update(&content);
        }
    }
    Ok(format!("{:x}", hasher.finalize()))
}

/// Digest of the current platform's wrappers and every config root.
pub fn output_digest(ctx: &WrapContext) -> Result<String, WrapError> {
    let prefix = format!("{}_", ctx.platform);
    let config_roots: Vec<PathBuf> = Library::ALL
        .iter()
        .filter_map(|l| LibraryProfile::for_library(*l).config_root)
        .map(|dir| ctx.root.join(dir))
        .collect();

    let mut roots: Vec<(&Path, Option<&str>)> = vec![(ctx.output_dir.as_path(), Some(prefix.as_str()))];
    roots.extend(config_roots.iter().map(|p| (p.as_path(), None)));
    hash_tree(&roots)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_digest_is_stable_and_content_sensitive() {
        let tmp = TempDir::new().unwrap();
        let out = tmp.path().join("libtor");
        fs::create_dir_all(&out).unwrap();
        fs::write(out.join("linux_zlib_adler32.c"), "a").unwrap();

        let first = hash_tree(&[(out.as_path(), Some("linux_"))]).unwrap();
        assert_eq!(first, hash_tree(&[(out.as_path(), Some("linux_"))]).unwrap());

        fs::write(out.join("darwin_zlib_adler32.c"), "other platform").unwrap();
        assert_eq!(first, hash_tree(&[(out.as_path(), Some("linux_"))]).unwrap());

        fs::write(out.join("linux_zlib_adler32.c"), "b").unwrap();
        assert_ne!(first, hash_tree(&[(out.as_path(), Some("linux_"))]).unwrap());
    }

    #[test]
    fn test_digest_includes_paths() {
        let tmp = TempDir::new().unwrap();
        let a = tmp.path().join("a");
        let b = tmp.path().join("b");
        fs::create_dir_all(a.join("event2")).unwrap();
        fs::create_dir_all(b.join("openssl")).unwrap();
        fs::write(a.join("event2/x.h"), "same").unwrap();
        fs::write(b.join("openssl/x.h"), "same").unwrap();
        assert_ne!(
            hash_tree(&[(a.as_path(), None)]).unwrap(),
            hash_tree(&[(b.as_path(), None)]).unwrap()
        );
    }

    #[test]
    fn test_missing_roots_hash_empty() {
        let tmp = TempDir::new().unwrap();
        let ctx = WrapContext::new(tmp.path(), crate::platform::Platform::Linux);
        let empty = format!("{:x}", Sha256::new().finalize());
        assert_eq!(output_digest(&ctx).unwrap(), empty);
    }
}

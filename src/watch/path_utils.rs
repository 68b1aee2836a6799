// src/watch/path_utils.rs

//! Utility functions for path handling in the watcher.

use std::io;
use std::path::{Component, Path, PathBuf};

/// Make `path` absolute (against the current directory) and lexically
/// normalised: `.` segments are dropped and `..` pops its parent.
///
/// Symlinks are not resolved; event paths have to stay comparable with the
/// roots they were registered under.
pub fn absolute(path: &Path) -> io::Result<PathBuf> {
    let abs = std::path::absolute(path)?;
    Ok(normalize(&abs))
}

/// Lexical normalisation without touching the filesystem.
pub fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                // `/..` stays `/`
                if !out.pop() && !out.has_root() {
                    out.push("..");
                }
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

/// Whether `path` is `root` itself or lies below it.
///
/// Comparison is per path segment, so `/tmp/xy` is **not** inside `/tmp/x`.
pub fn is_within(root: &Path, path: &Path) -> bool {
    path.starts_with(root)
}

/// Join a snapshot-relative directory back onto its root.
///
/// The root itself is stored as the empty relative path and maps back to
/// `root` unchanged (no trailing separator).
pub fn resolve(root: &Path, rel: &Path) -> PathBuf {
    if rel.as_os_str().is_empty() {
        root.to_path_buf()
    } else {
        root.join(rel)
    }
}

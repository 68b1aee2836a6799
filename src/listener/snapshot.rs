// src/listener/snapshot.rs

//! Directory snapshots and the set difference between two of them.

use std::collections::BTreeSet;
use std::io;
use std::path::{Path, PathBuf};

use crate::errors::{ComposeWatchError, Result};
use crate::fs::{EntryKind, FileSystem};

/// Relative paths of every directory found under a root by one full walk.
///
/// The root itself is the empty path. Entries are kept in lexical order.
/// A snapshot is never patched in place; reconciliation replaces it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DirectorySnapshot {
    dirs: BTreeSet<PathBuf>,
}

impl DirectorySnapshot {
    /// Recursively walk `root` and record every subdirectory.
    ///
    /// Symlinks are not followed. Entries that vanish between listing and
    /// inspection are skipped; any other failure aborts the walk.
    pub fn walk(fs: &dyn FileSystem, root: &Path) -> Result<Self> {
        let mut dirs = BTreeSet::new();
        dirs.insert(PathBuf::new());

        let mut stack = vec![root.to_path_buf()];
        while let Some(dir) = stack.pop() {
            let entries = fs.read_dir(&dir).map_err(|source| ComposeWatchError::Walk {
                path: dir.clone(),
                source,
            })?;

            for entry in entries {
                match fs.lstat(&entry) {
                    Ok(EntryKind::Dir) => {}
                    Ok(_) => continue,
                    Err(err) if err.kind() == io::ErrorKind::NotFound => continue,
                    Err(err) => {
                        return Err(ComposeWatchError::Walk {
                            path: entry,
                            source: err.into(),
                        });
                    }
                }

                let rel = entry
                    .strip_prefix(root)
                    .map_err(|err| ComposeWatchError::Walk {
                        path: entry.clone(),
                        source: err.into(),
                    })?
                    .to_path_buf();
                dirs.insert(rel);
                stack.push(entry);
            }
        }

        Ok(Self { dirs })
    }

    pub fn from_relative<I, P>(paths: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        Self {
            dirs: paths.into_iter().map(Into::into).collect(),
        }
    }

    pub fn contains(&self, rel: &Path) -> bool {
        self.dirs.contains(rel)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Path> {
        self.dirs.iter().map(PathBuf::as_path)
    }

    pub fn len(&self) -> usize {
        self.dirs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dirs.is_empty()
    }

    /// What changed going from `self` to `newer`.
    pub fn diff(&self, newer: &DirectorySnapshot) -> WatchSetDelta {
        path_diff(&self.dirs, &newer.dirs)
    }
}

/// Directories to start and stop watching, relative to their root.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WatchSetDelta {
    pub added: BTreeSet<PathBuf>,
    pub removed: BTreeSet<PathBuf>,
}

impl WatchSetDelta {
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty()
    }
}

/// `added = dst - src`, `removed = src - dst`.
pub fn path_diff(src: &BTreeSet<PathBuf>, dst: &BTreeSet<PathBuf>) -> WatchSetDelta {
    WatchSetDelta {
        added: dst.difference(src).cloned().collect(),
        removed: src.difference(dst).cloned().collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::mock::MockFileSystem;

    fn set(items: &[&str]) -> BTreeSet<PathBuf> {
        items.iter().map(PathBuf::from).collect()
    }

    #[test]
    fn walk_records_nested_dirs_only() {
        let fs = MockFileSystem::new();
        fs.add_dir("/tmp/x/a/b");
        fs.add_dir("/tmp/x/c");
        fs.add_file("/tmp/x/a/file.txt", "x");
        fs.add_file("/tmp/x/top.txt", "x");

        let snap = DirectorySnapshot::walk(&fs, Path::new("/tmp/x")).unwrap();
        let got: Vec<&Path> = snap.iter().collect();
        assert_eq!(
            got,
            vec![Path::new(""), Path::new("a"), Path::new("a/b"), Path::new("c")]
        );
    }

    #[test]
    fn walk_of_missing_root_fails() {
        let fs = MockFileSystem::new();
        let err = DirectorySnapshot::walk(&fs, Path::new("/nope")).unwrap_err();
        assert!(matches!(err, ComposeWatchError::Walk { .. }));
    }

    #[test]
    fn diff_against_empty_adds_everything() {
        let newer = DirectorySnapshot::from_relative(["", "a", "a/b"]);
        let delta = DirectorySnapshot::default().diff(&newer);
        assert_eq!(delta.added, set(&["", "a", "a/b"]));
        assert!(delta.removed.is_empty());
    }

    #[test]
    fn path_diff_splits_added_and_removed() {
        let delta = path_diff(&set(&["", "a", "b"]), &set(&["", "b", "c"]));
        assert_eq!(delta.added, set(&["c"]));
        assert_eq!(delta.removed, set(&["a"]));
    }

    #[test]
    fn path_diff_of_equal_sets_is_empty() {
        let s = set(&["", "a"]);
        assert!(path_diff(&s, &s).is_empty());
    }
}

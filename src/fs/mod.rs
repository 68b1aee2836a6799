// src/fs/mod.rs

//! Filesystem abstraction shared by the recursive walk and the compose reader.
//!
//! Everything that touches the disk goes through [`FileSystem`], so tests can
//! swap in [`mock::MockFileSystem`] instead of patching global state.

use std::fmt::Debug;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

pub mod mock;

/// What a path points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    File,
    Dir,
    Symlink,
}

/// Abstract filesystem interface.
pub trait FileSystem: Send + Sync + Debug {
    fn read_to_string(&self, path: &Path) -> Result<String>;

    /// Kind of the entry at `path`, following symlinks.
    fn stat(&self, path: &Path) -> io::Result<EntryKind>;

    /// Kind of the entry at `path` without following symlinks.
    fn lstat(&self, path: &Path) -> io::Result<EntryKind>;

    /// Return a list of entries in a directory.
    /// Returns full paths.
    fn read_dir(&self, path: &Path) -> Result<Vec<PathBuf>>;
}

/// Implementation that uses `std::fs`.
#[derive(Debug, Clone, Default)]
pub struct RealFileSystem;

fn kind_of(meta: &fs::Metadata) -> EntryKind {
    let ft = meta.file_type();
    if ft.is_symlink() {
        EntryKind::Symlink
    } else if ft.is_dir() {
        EntryKind::Dir
    } else {
        EntryKind::File
    }
}

impl FileSystem for RealFileSystem {
    fn read_to_string(&self, path: &Path) -> Result<String> {
        fs::read_to_string(path).with_context(|| format!("reading file {:?}", path))
    }

    fn stat(&self, path: &Path) -> io::Result<EntryKind> {
        fs::metadata(path).map(|m| kind_of(&m))
    }

    fn lstat(&self, path: &Path) -> io::Result<EntryKind> {
        fs::symlink_metadata(path).map(|m| kind_of(&m))
    }

    fn read_dir(&self, path: &Path) -> Result<Vec<PathBuf>> {
        let mut entries = Vec::new();
        for entry in fs::read_dir(path).with_context(|| format!("reading dir {:?}", path))? {
            let entry = entry?;
            entries.push(entry.path());
        }
        Ok(entries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn real_fs_reports_entry_kinds() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("f.txt");
        fs::write(&file, "x").unwrap();

        let fs = RealFileSystem;
        assert_eq!(fs.stat(dir.path()).unwrap(), EntryKind::Dir);
        assert_eq!(fs.lstat(&file).unwrap(), EntryKind::File);
        assert_eq!(
            fs.stat(&dir.path().join("missing")).unwrap_err().kind(),
            io::ErrorKind::NotFound
        );

        let entries = fs.read_dir(dir.path()).unwrap();
        assert_eq!(entries, vec![file]);
    }

    #[cfg(unix)]
    #[test]
    fn lstat_does_not_follow_symlinks() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("target");
        fs::create_dir(&target).unwrap();
        let link = dir.path().join("link");
        std::os::unix::fs::symlink(&target, &link).unwrap();

        let fs = RealFileSystem;
        assert_eq!(fs.stat(&link).unwrap(), EntryKind::Dir);
        assert_eq!(fs.lstat(&link).unwrap(), EntryKind::Symlink);
    }
}

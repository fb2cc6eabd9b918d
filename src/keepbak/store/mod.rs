//! # Storage Layer
//!
//! The core only needs a handful of filesystem primitives: look at an entry, list a
//! directory, copy a file or a tree, remove an entry. They sit behind [`BackupStore`]
//! so the transfer and retention logic can run against a real directory or an
//! in-memory tree.
//!
//! ## Implementations
//!
//! - [`fs::FsStore`]: production, backed by `std::fs` and `walkdir`.
//! - [`memory::MemStore`]: in-memory tree for tests, with hooks to inject failures and
//!   concurrent deletions.
//!
//! All primitives return plain `io::Result`. Attaching meaning to a failure (was it the
//! transfer? a cleanup?) is the caller's job.

use crate::model::ArtifactKind;
use std::ffi::OsString;
use std::io;
use std::path::{Path, PathBuf};

pub mod fs;
pub mod memory;

/// A directory entry as seen at listing time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreEntry {
    pub name: OsString,
    pub path: PathBuf,
}

pub trait BackupStore {
    /// What sits at `path`, or `None` when nothing does.
    ///
    /// Symbolic links are followed; a dangling link still counts as a file.
    fn kind_of(&self, path: &Path) -> io::Result<Option<ArtifactKind>>;

    /// Like [`kind_of`](Self::kind_of), but a dangling link counts as missing: there is
    /// nothing behind it to back up.
    fn source_kind(&self, path: &Path) -> io::Result<Option<ArtifactKind>> {
        self.kind_of(path)
    }

    /// Direct children of `dir`, in the order the backend yields them.
    fn list_dir(&self, dir: &Path) -> io::Result<Vec<StoreEntry>>;

    /// Create a single directory. Its parent must already exist.
    fn create_dir(&self, path: &Path) -> io::Result<()>;

    /// Copy one file, overwriting whatever file is at `dst`.
    fn copy_file(&self, src: &Path, dst: &Path) -> io::Result<()>;

    /// Copy a directory tree to `dst`, which must not exist yet.
    fn copy_dir(&self, src: &Path, dst: &Path) -> io::Result<()>;

    /// Remove an entry: recursively for directories, a single unlink otherwise.
    fn remove(&self, path: &Path, kind: ArtifactKind) -> io::Result<()>;

    fn canonicalize(&self, path: &Path) -> io::Result<PathBuf>;
}

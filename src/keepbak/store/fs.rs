use super::{BackupStore, StoreEntry};
use crate::model::ArtifactKind;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Store backed by the real filesystem.
#[derive(Debug, Clone, Copy, Default)]
pub struct FsStore;

impl FsStore {
    pub fn new() -> Self {
        Self
    }
}

fn kind_from(meta: &fs::Metadata) -> ArtifactKind {
    if meta.is_dir() {
        ArtifactKind::Directory
    } else {
        ArtifactKind::File
    }
}

fn with_path(err: io::Error, action: &str, path: &Path) -> io::Error {
    io::Error::new(
        err.kind(),
        format!("failed to {} {}: {}", action, path.display(), err),
    )
}

#[cfg(unix)]
fn copy_symlink(src: &Path, dst: &Path) -> io::Result<()> {
    let target = fs::read_link(src).map_err(|e| with_path(e, "read symlink", src))?;
    std::os::unix::fs::symlink(&target, dst).map_err(|e| with_path(e, "create symlink", dst))
}

#[cfg(not(unix))]
fn copy_symlink(src: &Path, dst: &Path) -> io::Result<()> {
    if fs::metadata(src)?.is_dir() {
        FsStore.copy_dir(src, dst)
    } else {
        fs::copy(src, dst).map(|_| ())
    }
}

impl BackupStore for FsStore {
    fn kind_of(&self, path: &Path) -> io::Result<Option<ArtifactKind>> {
        match fs::metadata(path) {
            Ok(meta) => Ok(Some(kind_from(&meta))),
            Err(e) if e.kind() == io::ErrorKind::NotFound => match fs::symlink_metadata(path) {
                // Dangling link: it exists, and unlinking is the only way to remove it.
                Ok(_) => Ok(Some(ArtifactKind::File)),
                Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
                Err(e) => Err(e),
            },
            Err(e) => Err(e),
        }
    }

    fn source_kind(&self, path: &Path) -> io::Result<Option<ArtifactKind>> {
        match fs::metadata(path) {
            Ok(meta) => Ok(Some(kind_from(&meta))),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e),
        }
    }

    fn list_dir(&self, dir: &Path) -> io::Result<Vec<StoreEntry>> {
        let mut entries = Vec::new();
        for entry in fs::read_dir(dir).map_err(|e| with_path(e, "read", dir))? {
            let entry = entry.map_err(|e| with_path(e, "read", dir))?;
            entries.push(StoreEntry {
                name: entry.file_name(),
                path: entry.path(),
            });
        }
        Ok(entries)
    }

    fn create_dir(&self, path: &Path) -> io::Result<()> {
        fs::create_dir(path).map_err(|e| with_path(e, "create", path))
    }

    fn copy_file(&self, src: &Path, dst: &Path) -> io::Result<()> {
        fs::copy(src, dst).map_err(|e| {
            io::Error::new(
                e.kind(),
                format!("failed to copy {} -> {}: {}", src.display(), dst.display(), e),
            )
        })?;
        Ok(())
    }

    fn copy_dir(&self, src: &Path, dst: &Path) -> io::Result<()> {
        fs::create_dir(dst).map_err(|e| with_path(e, "create", dst))?;

        for entry in WalkDir::new(src) {
            let entry = entry.map_err(io::Error::from)?;
            let rel = entry
                .path()
                .strip_prefix(src)
                .map_err(|e| io::Error::other(e.to_string()))?;
            if rel.as_os_str().is_empty() {
                continue;
            }

            let out = dst.join(rel);
            let file_type = entry.file_type();
            if file_type.is_dir() {
                fs::create_dir(&out).map_err(|e| with_path(e, "create", &out))?;
            } else if file_type.is_symlink() {
                copy_symlink(entry.path(), &out)?;
            } else {
                self.copy_file(entry.path(), &out)?;
            }
        }
        Ok(())
    }

    fn remove(&self, path: &Path, kind: ArtifactKind) -> io::Result<()> {
        let is_link = fs::symlink_metadata(path)?.file_type().is_symlink();
        let result = if kind.is_dir() && !is_link {
            fs::remove_dir_all(path)
        } else {
            fs::remove_file(path)
        };
        result.map_err(|e| with_path(e, "remove", path))
    }

    fn canonicalize(&self, path: &Path) -> io::Result<PathBuf> {
        fs::canonicalize(path)
    }
}

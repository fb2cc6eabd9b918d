use chrono::NaiveDate;
use std::path::PathBuf;

/// How an artifact is laid out on disk, which decides how it gets removed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArtifactKind {
    File,
    Directory,
}

impl ArtifactKind {
    pub fn is_dir(self) -> bool {
        matches!(self, ArtifactKind::Directory)
    }
}

/// One backup living in the destination directory.
///
/// The base name and date are not stored anywhere else: both are recovered from the
/// entry's name (see [`crate::naming`]).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackupArtifact {
    pub path: PathBuf,
    pub source_base_name: String,
    pub backup_date: NaiveDate,
    pub kind: ArtifactKind,
}

impl BackupArtifact {
    pub fn new(
        path: PathBuf,
        source_base_name: impl Into<String>,
        backup_date: NaiveDate,
        kind: ArtifactKind,
    ) -> Self {
        Self {
            path,
            source_base_name: source_base_name.into(),
            backup_date,
            kind,
        }
    }

    /// The entry name inside the destination directory.
    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    }
}

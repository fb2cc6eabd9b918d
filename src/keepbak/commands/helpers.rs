use crate::error::{KeepbakError, Result};
use crate::model::ArtifactKind;
use crate::naming::source_base_name;
use crate::store::BackupStore;
use std::path::Path;

/// What sits at `src`, failing validation when nothing does.
pub fn existing_source<S: BackupStore>(store: &S, src: &Path) -> Result<ArtifactKind> {
    let kind = store.source_kind(src).map_err(|e| {
        KeepbakError::Validation(format!("unable to inspect src {}: {}", src.display(), e))
    })?;
    kind.ok_or_else(|| {
        KeepbakError::Validation(format!("src path does not exist: {}", src.display()))
    })
}

/// The base name `src` is backed up under.
pub fn resolve_base_name<S: BackupStore>(store: &S, src: &Path) -> Result<String> {
    if src.file_name().is_some() {
        return source_base_name(src, None);
    }
    let resolved = store.canonicalize(src).map_err(|e| {
        KeepbakError::Validation(format!("unable to resolve src {}: {}", src.display(), e))
    })?;
    source_base_name(src, Some(&resolved))
}

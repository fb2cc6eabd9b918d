use crate::commands::helpers::{existing_source, resolve_base_name};
use crate::commands::{CmdMessage, CmdResult};
use crate::error::{KeepbakError, Result};
use crate::model::{ArtifactKind, BackupArtifact};
use crate::naming::encode_artifact_name;
use crate::store::BackupStore;
use chrono::NaiveDate;
use std::io;
use std::path::Path;

/// Write today's backup of `src` into `dest`, replacing one made earlier the same day.
///
/// `dest` must already be a directory. Any failure past validation is a
/// [`KeepbakError::Transfer`].
pub fn run<S: BackupStore>(
    store: &S,
    src: &Path,
    dest: &Path,
    today: NaiveDate,
) -> Result<CmdResult> {
    let kind = existing_source(store, src)?;
    let base_name = resolve_base_name(store, src)?;
    let target = dest.join(encode_artifact_name(today, &base_name));

    let existing = store
        .kind_of(&target)
        .map_err(|e| KeepbakError::transfer(&target, e))?;

    // Only a file may overwrite a file in place; anything else clears the target first.
    if let Some(existing_kind) = existing {
        let in_place = kind == ArtifactKind::File && existing_kind == ArtifactKind::File;
        if !in_place {
            remove_if_present(store, &target, existing_kind)
                .map_err(|e| KeepbakError::transfer(&target, e))?;
        }
    }

    match kind {
        ArtifactKind::Directory => store.copy_dir(src, &target),
        ArtifactKind::File => store.copy_file(src, &target),
    }
    .map_err(|e| KeepbakError::transfer(&target, e))?;

    let mut result = CmdResult::default();
    if existing.is_some() {
        result.add_message(CmdMessage::info(format!(
            "Replaced earlier backup from today: {}",
            target.display()
        )));
    }
    result.add_message(CmdMessage::success(format!(
        "Backed up {} to {}",
        src.display(),
        target.display()
    )));

    Ok(result.with_created(BackupArtifact::new(target, base_name, today, kind)))
}

fn remove_if_present<S: BackupStore>(store: &S, path: &Path, kind: ArtifactKind) -> io::Result<()> {
    match store.remove(path, kind) {
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        other => other,
    }
}

use crate::commands::helpers::{existing_source, resolve_base_name};
use crate::commands::{retention, transfer, CmdMessage, CmdResult};
use crate::config::RetentionPolicy;
use crate::error::{KeepbakError, Result};
use crate::model::ArtifactKind;
use crate::store::BackupStore;
use chrono::NaiveDate;
use std::path::Path;

/// One full run: validate, make sure `dest` exists, transfer, then prune.
///
/// Nothing is written before validation passes, and retention only starts once the
/// transfer has fully succeeded.
pub fn run<S: BackupStore>(
    store: &S,
    src: &Path,
    dest: &Path,
    today: NaiveDate,
    policy: RetentionPolicy,
) -> Result<CmdResult> {
    existing_source(store, src)?;
    resolve_base_name(store, src)?;
    let needs_dest = check_destination(store, dest)?;

    let mut result = CmdResult::default();
    if needs_dest {
        store
            .create_dir(dest)
            .map_err(|e| KeepbakError::transfer(dest, e))?;
        result.add_message(CmdMessage::info(format!(
            "Created backup directory {}",
            dest.display()
        )));
    }

    let result = result.merge(transfer::run(store, src, dest, today)?);
    match retention::run(store, src, dest, policy) {
        Ok(retained) => Ok(result.merge(retained)),
        Err(KeepbakError::Cleanup(mut failures)) => {
            failures.outcome = result.merge(std::mem::take(&mut failures.outcome));
            Err(KeepbakError::Cleanup(failures))
        }
        Err(e) => Err(e),
    }
}

/// Returns whether `dest` still has to be created.
fn check_destination<S: BackupStore>(store: &S, dest: &Path) -> Result<bool> {
    let inspect_err = |path: &Path, e: std::io::Error| {
        KeepbakError::Validation(format!("unable to inspect {}: {}", path.display(), e))
    };

    match store.kind_of(dest).map_err(|e| inspect_err(dest, e))? {
        Some(ArtifactKind::Directory) => Ok(false),
        Some(ArtifactKind::File) => Err(KeepbakError::Validation(format!(
            "dest is not a directory: {}",
            dest.display()
        ))),
        None => {
            // Only the last component is ever created.
            let parent = dest.parent().filter(|p| !p.as_os_str().is_empty());
            if let Some(parent) = parent {
                let kind = store.kind_of(parent).map_err(|e| inspect_err(parent, e))?;
                if kind != Some(ArtifactKind::Directory) {
                    return Err(KeepbakError::Validation(format!(
                        "parent of dest does not exist: {}",
                        parent.display()
                    )));
                }
            }
            Ok(true)
        }
    }
}

//! # API Facade
//!
//! [`BackupApi`] is the single entry point for UIs. It owns the store and the clock,
//! dispatches to the command layer, and returns `Result<CmdResult>`. It holds no
//! business logic of its own and never prints.
//!
//! Generic over [`BackupStore`] and [`Clock`]:
//! - Production: `BackupApi<FsStore, SystemClock>`
//! - Testing: `BackupApi<MemStore, FixedClock>`

use crate::clock::Clock;
use crate::commands::{self, retention::RetentionPlan};
use crate::config::RetentionPolicy;
use crate::error::Result;
use crate::model::BackupArtifact;
use crate::naming::ArtifactMatcher;
use crate::store::BackupStore;
use std::path::Path;

pub use crate::commands::{CmdMessage, CmdResult, MessageLevel};

pub struct BackupApi<S: BackupStore, C: Clock> {
    store: S,
    clock: C,
}

impl<S: BackupStore, C: Clock> BackupApi<S, C> {
    pub fn new(store: S, clock: C) -> Self {
        Self { store, clock }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Back up `src` into `dest`, then keep only the `copies` most recent backups.
    pub fn backup(&self, src: &Path, dest: &Path, copies: usize) -> Result<CmdResult> {
        commands::backup::run(
            &self.store,
            src,
            dest,
            self.clock.today(),
            RetentionPolicy::keep(copies),
        )
    }

    /// Only the transfer step; `dest` must already exist.
    pub fn transfer(&self, src: &Path, dest: &Path) -> Result<CmdResult> {
        commands::transfer::run(&self.store, src, dest, self.clock.today())
    }

    /// Only the retention step.
    pub fn prune(&self, src: &Path, dest: &Path, copies: usize) -> Result<CmdResult> {
        commands::retention::run(&self.store, src, dest, RetentionPolicy::keep(copies))
    }

    /// Backups of `src` currently in `dest`, newest first.
    pub fn backups(&self, src: &Path, dest: &Path) -> Result<Vec<BackupArtifact>> {
        let base_name = commands::helpers::resolve_base_name(&self.store, src)?;
        let matcher = ArtifactMatcher::new(&base_name)?;
        let found = commands::retention::discover(&self.store, dest, &matcher)?;
        Ok(RetentionPlan::new(found, RetentionPolicy::keep(usize::MAX)).keep)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;
    use crate::error::KeepbakError;
    use crate::store::memory::MemStore;
    use std::path::PathBuf;

    fn api_on(day: u32) -> BackupApi<MemStore, FixedClock> {
        let store = MemStore::new();
        store.add_file("/home/notes.txt", "x").add_dir("/b");
        BackupApi::new(store, FixedClock::ymd(2024, 7, day).unwrap())
    }

    #[test]
    fn backup_uses_injected_date() {
        let api = api_on(4);
        let result = api.backup(Path::new("/home/notes.txt"), Path::new("/b"), 12).unwrap();
        assert_eq!(
            result.created.unwrap().path,
            PathBuf::from("/b/2024_07_04_notes.txt.bkp")
        );
    }

    #[test]
    fn transfer_then_prune_match_backup() {
        let api = api_on(4);
        api.store().add_file("/b/2024_07_01_notes.txt.bkp", "old");

        api.transfer(Path::new("/home/notes.txt"), Path::new("/b")).unwrap();
        let pruned = api.prune(Path::new("/home/notes.txt"), Path::new("/b"), 1).unwrap();

        assert_eq!(pruned.pruned.len(), 1);
        assert_eq!(pruned.pruned[0].path, PathBuf::from("/b/2024_07_01_notes.txt.bkp"));
    }

    #[test]
    fn listing_a_missing_destination_is_an_io_error() {
        let api = api_on(4);
        let err = api
            .backups(Path::new("/home/notes.txt"), Path::new("/nowhere"))
            .unwrap_err();
        match err {
            KeepbakError::Io(e) => assert_eq!(e.kind(), std::io::ErrorKind::NotFound),
            other => panic!("expected io error, got {other:?}"),
        }
    }

    #[test]
    fn backups_lists_newest_first() {
        let api = api_on(4);
        api.store()
            .add_file("/b/2024_07_01_notes.txt.bkp", "")
            .add_file("/b/2024_07_03_notes.txt.bkp", "")
            .add_file("/b/2024_07_02_other.txt.bkp", "");

        let names: Vec<_> = api
            .backups(Path::new("/home/notes.txt"), Path::new("/b"))
            .unwrap()
            .iter()
            .map(BackupArtifact::file_name)
            .collect();
        assert_eq!(
            names,
            vec!["2024_07_03_notes.txt.bkp", "2024_07_01_notes.txt.bkp"]
        );
    }
}

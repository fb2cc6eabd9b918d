//! # Retention
//!
//! Keeps the `copies` most recent backups of one source and removes the rest.
//!
//! Candidates are the destination entries whose names decode as an artifact of this
//! source (see [`crate::naming`]). Everything else in the directory is invisible here:
//! it is never counted and never removed.
//!
//! Ordering is by the date embedded in the name, newest first. The sort is stable, so
//! entries with equal dates keep the order the directory listing produced them in.
//!
//! Deletion is best effort per artifact. An artifact that disappeared since it was
//! listed counts as already removed. A failed removal is recorded and the pass moves
//! on; the collected failures surface as one [`KeepbakError::Cleanup`] at the end.

use crate::commands::helpers::resolve_base_name;
use crate::commands::{CmdMessage, CmdResult};
use crate::config::RetentionPolicy;
use crate::error::{CleanupFailures, KeepbakError, Result};
use crate::model::BackupArtifact;
use crate::naming::ArtifactMatcher;
use crate::store::BackupStore;
use std::io;
use std::path::Path;

/// Which candidates survive and which go.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RetentionPlan {
    /// Newest first.
    pub keep: Vec<BackupArtifact>,
    /// Newest first; every entry is older than (or as old as) the last kept one.
    pub prune: Vec<BackupArtifact>,
}

impl RetentionPlan {
    pub fn new(mut candidates: Vec<BackupArtifact>, policy: RetentionPolicy) -> Self {
        // `sort_by` is stable: equal dates stay in discovery order.
        candidates.sort_by(|a, b| b.backup_date.cmp(&a.backup_date));
        let prune = candidates.split_off(policy.copies.min(candidates.len()));
        Self {
            keep: candidates,
            prune,
        }
    }
}

/// Every artifact of `matcher`'s source currently in `dest`, in listing order.
///
/// Entries that vanish between the listing and the lookup are skipped.
pub fn discover<S: BackupStore>(
    store: &S,
    dest: &Path,
    matcher: &ArtifactMatcher,
) -> io::Result<Vec<BackupArtifact>> {
    let mut found = Vec::new();
    for entry in store.list_dir(dest)? {
        let Some(name) = entry.name.to_str() else {
            continue;
        };
        let Some(date) = matcher.decode(name) else {
            continue;
        };
        let Some(kind) = store.kind_of(&entry.path)? else {
            continue;
        };
        found.push(BackupArtifact::new(
            entry.path,
            matcher.base_name(),
            date,
            kind,
        ));
    }
    Ok(found)
}

/// Remove each stale artifact, attempting all of them before reporting failures.
///
/// On failure the returned [`KeepbakError::Cleanup`] still carries everything that
/// did get removed in its `outcome`.
pub fn prune<S: BackupStore>(store: &S, stale: Vec<BackupArtifact>) -> Result<CmdResult> {
    let mut result = CmdResult::default();
    let mut failures = CleanupFailures {
        attempted: stale.len(),
        ..CleanupFailures::default()
    };

    for artifact in stale {
        let current = match store.kind_of(&artifact.path) {
            Ok(current) => current,
            Err(e) => {
                result.add_message(removal_failed(&artifact.path, &e));
                failures.push(&artifact.path, e);
                continue;
            }
        };
        let Some(kind) = current else {
            result.add_message(already_removed(&artifact));
            continue;
        };

        match store.remove(&artifact.path, kind) {
            Ok(()) => {
                result.add_message(CmdMessage::info(format!(
                    "Removed stale backup: {}",
                    artifact.path.display()
                )));
                result.pruned.push(artifact);
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                result.add_message(already_removed(&artifact));
            }
            Err(e) => {
                result.add_message(removal_failed(&artifact.path, &e));
                failures.push(&artifact.path, e);
            }
        }
    }

    if failures.is_empty() {
        Ok(result)
    } else {
        failures.outcome = result;
        Err(KeepbakError::Cleanup(failures))
    }
}

fn already_removed(artifact: &BackupArtifact) -> CmdMessage {
    CmdMessage::warning(format!(
        "Stale backup already gone: {}",
        artifact.path.display()
    ))
}

fn removal_failed(path: &Path, err: &io::Error) -> CmdMessage {
    CmdMessage::error(format!(
        "Failed to remove stale backup {}: {}",
        path.display(),
        err
    ))
}

/// Scan `dest` for backups of `src` and prune beyond `policy`.
pub fn run<S: BackupStore>(
    store: &S,
    src: &Path,
    dest: &Path,
    policy: RetentionPolicy,
) -> Result<CmdResult> {
    let base_name = resolve_base_name(store, src)?;
    let matcher = ArtifactMatcher::new(&base_name)?;

    let candidates = discover(store, dest, &matcher).map_err(|e| {
        let mut failures = CleanupFailures::default();
        failures.outcome.add_message(CmdMessage::error(format!(
            "Failed to scan {}: {}",
            dest.display(),
            e
        )));
        failures.push(dest, e);
        KeepbakError::Cleanup(failures)
    })?;
    let plan = RetentionPlan::new(candidates, policy);
    let kept = plan.keep.len();

    let mut result = match prune(store, plan.prune) {
        Ok(result) => result.with_kept(plan.keep),
        Err(KeepbakError::Cleanup(mut failures)) => {
            failures.outcome.kept = plan.keep;
            return Err(KeepbakError::Cleanup(failures));
        }
        Err(e) => return Err(e),
    };
    if !result.pruned.is_empty() {
        result.add_message(CmdMessage::success(format!(
            "Pruned {} stale backup(s) of {}, kept {}",
            result.pruned.len(),
            base_name,
            kept
        )));
    }
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::MessageLevel;
    use crate::model::ArtifactKind;
    use crate::naming::encode_artifact_name;
    use crate::store::memory::MemStore;
    use crate::store::StoreEntry;
    use chrono::{Days, NaiveDate};
    use std::path::PathBuf;

    fn day(n: u64) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, 1)
            .unwrap()
            .checked_add_days(Days::new(n))
            .unwrap()
    }

    fn artifact(n: u64, tag: &str) -> BackupArtifact {
        BackupArtifact::new(
            PathBuf::from(format!("/b/{}", tag)),
            "notes.txt",
            day(n),
            ArtifactKind::File,
        )
    }

    fn seed(store: &MemStore, base: &str, days: impl IntoIterator<Item = u64>) {
        for n in days {
            store.add_file(format!("/b/{}", encode_artifact_name(day(n), base)), "x");
        }
    }

    fn stored(n: u64, base: &str) -> String {
        format!("/b/{}", encode_artifact_name(day(n), base))
    }

    fn dates(artifacts: &[BackupArtifact]) -> Vec<NaiveDate> {
        artifacts.iter().map(|a| a.backup_date).collect()
    }

    fn run_notes(store: &MemStore, copies: usize) -> Result<CmdResult> {
        run(
            store,
            Path::new("/home/notes.txt"),
            Path::new("/b"),
            RetentionPolicy::keep(copies),
        )
    }

    /// Lists directories back to front, like a filesystem with its own entry order.
    struct ReversedListing<'a>(&'a MemStore);

    impl BackupStore for ReversedListing<'_> {
        fn kind_of(&self, path: &Path) -> io::Result<Option<ArtifactKind>> {
            self.0.kind_of(path)
        }

        fn list_dir(&self, dir: &Path) -> io::Result<Vec<StoreEntry>> {
            let mut entries = self.0.list_dir(dir)?;
            entries.reverse();
            Ok(entries)
        }

        fn create_dir(&self, path: &Path) -> io::Result<()> {
            self.0.create_dir(path)
        }

        fn copy_file(&self, src: &Path, dst: &Path) -> io::Result<()> {
            self.0.copy_file(src, dst)
        }

        fn copy_dir(&self, src: &Path, dst: &Path) -> io::Result<()> {
            self.0.copy_dir(src, dst)
        }

        fn remove(&self, path: &Path, kind: ArtifactKind) -> io::Result<()> {
            self.0.remove(path, kind)
        }

        fn canonicalize(&self, path: &Path) -> io::Result<PathBuf> {
            self.0.canonicalize(path)
        }
    }

    #[test]
    fn plan_keeps_newest_first() {
        let plan = RetentionPlan::new(
            vec![
                artifact(3, "c"),
                artifact(9, "i"),
                artifact(1, "a"),
                artifact(5, "e"),
            ],
            RetentionPolicy::keep(2),
        );
        assert_eq!(dates(&plan.keep), vec![day(9), day(5)]);
        assert_eq!(dates(&plan.prune), vec![day(3), day(1)]);
    }

    #[test]
    fn plan_ties_keep_discovery_order() {
        let plan = RetentionPlan::new(
            vec![
                artifact(1, "first"),
                artifact(2, "newer"),
                artifact(1, "second"),
            ],
            RetentionPolicy::keep(2),
        );
        let kept: Vec<_> = plan.keep.iter().map(|a| a.path.clone()).collect();
        assert_eq!(
            kept,
            vec![PathBuf::from("/b/newer"), PathBuf::from("/b/first")]
        );
        assert_eq!(plan.prune[0].path, PathBuf::from("/b/second"));
    }

    #[test]
    fn discovery_follows_listing_order() {
        let store = MemStore::new();
        seed(&store, "notes.txt", [0, 1, 2]);
        let matcher = ArtifactMatcher::new("notes.txt").unwrap();

        let forward = discover(&store, Path::new("/b"), &matcher).unwrap();
        let reversed = discover(&ReversedListing(&store), Path::new("/b"), &matcher).unwrap();

        assert_eq!(dates(&forward), vec![day(0), day(1), day(2)]);
        assert_eq!(dates(&reversed), vec![day(2), day(1), day(0)]);
    }

    #[test]
    fn discovered_ties_keep_candidate_order() {
        // Two sources stamped the same day: equal dates straight out of `discover`.
        let store = MemStore::new();
        seed(&store, "a.txt", [4]);
        seed(&store, "b.txt", [4]);

        let mut candidates = Vec::new();
        for base in ["a.txt", "b.txt"] {
            let matcher = ArtifactMatcher::new(base).unwrap();
            candidates.extend(discover(&store, Path::new("/b"), &matcher).unwrap());
        }
        let mut swapped = candidates.clone();
        swapped.reverse();

        let plan = RetentionPlan::new(candidates, RetentionPolicy::keep(1));
        assert_eq!(plan.keep[0].source_base_name, "a.txt");
        assert_eq!(plan.prune[0].source_base_name, "b.txt");

        let plan = RetentionPlan::new(swapped, RetentionPolicy::keep(1));
        assert_eq!(plan.keep[0].source_base_name, "b.txt");
        assert_eq!(plan.prune[0].source_base_name, "a.txt");
    }

    #[test]
    fn plan_with_zero_copies_prunes_everything() {
        let plan = RetentionPlan::new(
            vec![artifact(1, "a"), artifact(2, "b")],
            RetentionPolicy::keep(0),
        );
        assert!(plan.keep.is_empty());
        assert_eq!(plan.prune.len(), 2);
    }

    #[test]
    fn plan_with_more_copies_than_candidates_prunes_nothing() {
        let plan = RetentionPlan::new(vec![artifact(1, "a")], RetentionPolicy::keep(12));
        assert_eq!(plan.keep.len(), 1);
        assert!(plan.prune.is_empty());
        assert_eq!(
            RetentionPlan::new(vec![], RetentionPolicy::keep(3)),
            RetentionPlan::default()
        );
    }

    #[test]
    fn keeps_twelve_most_recent_of_fifteen() {
        let store = MemStore::new();
        seed(&store, "notes.txt", 0..15);

        let result = run_notes(&store, 12).unwrap();

        assert_eq!(result.pruned.len(), 3);
        assert_eq!(
            dates(&result.kept),
            (3..15).rev().map(day).collect::<Vec<_>>()
        );
        assert_eq!(store.children("/b").len(), 12);
        for n in 0..3 {
            assert!(!store.exists(stored(n, "notes.txt")));
        }
    }

    #[test]
    fn other_sources_and_lookalikes_are_never_touched() {
        let store = MemStore::new();
        seed(&store, "notes.txt", 0..3);
        seed(&store, "other.txt", 0..3);
        store
            .add_file("/b/2024_13_01_notes.txt.bkp", "bad month")
            .add_file("/b/2024_01_01_notes.txt.bak", "wrong suffix")
            .add_file("/b/notes.txt.bkp", "no date")
            .add_file("/b/README", "unrelated");

        let result = run_notes(&store, 0).unwrap();

        assert_eq!(result.pruned.len(), 3);
        let left = store.children("/b");
        assert_eq!(left.len(), 7);
        let survivors: Vec<_> = left
            .iter()
            .filter(|name| name.ends_with("_notes.txt.bkp"))
            .collect();
        assert_eq!(survivors, vec!["2024_13_01_notes.txt.bkp"]);
    }

    #[test]
    fn directory_artifacts_are_removed_recursively() {
        let store = MemStore::new();
        for n in 0..3 {
            store.add_file(format!("{}/deep/a.jpg", stored(n, "photos")), "a");
        }

        let result = run(
            &store,
            Path::new("/home/photos"),
            Path::new("/b"),
            RetentionPolicy::keep(1),
        )
        .unwrap();

        assert_eq!(result.pruned.len(), 2);
        assert!(
            result
                .pruned
                .iter()
                .all(|a| a.kind == ArtifactKind::Directory)
        );
        assert_eq!(
            store.children("/b"),
            vec![encode_artifact_name(day(2), "photos")]
        );
    }

    #[test]
    fn entry_removed_by_someone_else_counts_as_gone() {
        let store = MemStore::new();
        seed(&store, "notes.txt", 0..4);
        store.race_removal_of(stored(0, "notes.txt"));

        let result = run_notes(&store, 2).unwrap();

        assert_eq!(result.pruned.len(), 1);
        assert_eq!(store.children("/b").len(), 2);
        let gone = result
            .messages
            .iter()
            .find(|m| m.content.contains("already gone"))
            .unwrap();
        assert_eq!(gone.level, MessageLevel::Warning);
    }

    #[test]
    fn prune_skips_artifacts_that_vanished_after_discovery() {
        let store = MemStore::new();
        seed(&store, "notes.txt", 0..3);
        let matcher = ArtifactMatcher::new("notes.txt").unwrap();
        let plan = RetentionPlan::new(
            discover(&store, Path::new("/b"), &matcher).unwrap(),
            RetentionPolicy::keep(1),
        );

        store.remove(&plan.prune[0].path, ArtifactKind::File).unwrap();
        let result = prune(&store, plan.prune).unwrap();

        assert_eq!(result.pruned.len(), 1);
        assert_eq!(store.children("/b").len(), 1);
    }

    #[test]
    fn failed_removal_does_not_stop_the_rest() {
        let store = MemStore::new();
        seed(&store, "notes.txt", 0..5);
        let stuck = PathBuf::from(stored(1, "notes.txt"));
        store.fail_removal_of(&stuck);

        let err = run_notes(&store, 1).unwrap_err();

        let KeepbakError::Cleanup(failures) = err else {
            panic!("expected cleanup error");
        };
        assert_eq!(failures.len(), 1);
        assert_eq!(failures.attempted, 4);
        assert_eq!(failures.first().unwrap().path, stuck);
        // Older and newer stale artifacts around the stuck one were still removed.
        assert_eq!(store.removals().len(), 3);
        assert_eq!(store.children("/b").len(), 2);
    }

    #[test]
    fn failed_cleanup_still_reports_what_was_done() {
        let store = MemStore::new();
        seed(&store, "notes.txt", 0..4);
        store.fail_removal_of(stored(0, "notes.txt"));

        let Err(KeepbakError::Cleanup(failures)) = run_notes(&store, 1) else {
            panic!("expected cleanup error");
        };

        let outcome = &failures.outcome;
        assert_eq!(dates(&outcome.kept), vec![day(3)]);
        assert_eq!(dates(&outcome.pruned), vec![day(2), day(1)]);
        let errors: Vec<_> = outcome
            .messages
            .iter()
            .filter(|m| m.level == MessageLevel::Error)
            .collect();
        assert_eq!(errors.len(), 1);
        assert!(errors[0].content.contains(&stored(0, "notes.txt")));
    }

    #[test]
    fn unreadable_destination_is_a_cleanup_error() {
        let store = MemStore::new();
        let err = run(
            &store,
            Path::new("/home/notes.txt"),
            Path::new("/missing"),
            RetentionPolicy::default(),
        )
        .unwrap_err();
        assert!(matches!(err, KeepbakError::Cleanup(_)));
    }

    #[cfg(unix)]
    #[test]
    fn non_utf8_entries_are_never_candidates() {
        use crate::test_utils::TestEnv;
        use std::ffi::OsStr;
        use std::os::unix::ffi::OsStrExt;

        let env = TestEnv::new();
        let dest = env.make_dir("b");
        for n in 0..2 {
            env.write_file(&format!("b/{}", encode_artifact_name(day(n), "notes.txt")), "x");
        }
        let mut raw = encode_artifact_name(day(0), "notes").into_bytes();
        raw.extend_from_slice(b"\xff.txt.bkp");
        let odd = dest.join(OsStr::from_bytes(&raw));
        std::fs::write(&odd, "odd").unwrap();

        let matcher = ArtifactMatcher::new("notes.txt").unwrap();
        assert_eq!(discover(&env.store, &dest, &matcher).unwrap().len(), 2);

        let result = run(
            &env.store,
            Path::new("/home/notes.txt"),
            &dest,
            RetentionPolicy::keep(0),
        )
        .unwrap();
        assert_eq!(result.pruned.len(), 2);
        assert!(odd.exists());
        assert_eq!(std::fs::read_dir(&dest).unwrap().count(), 1);
    }
}

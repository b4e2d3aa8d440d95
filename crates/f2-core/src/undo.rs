use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, error, info, warn};

use crate::backup::BackupStore;
use crate::change::{files_before_dirs, Change};
use crate::config::Config;
use crate::{Error, RenameOutcome, Result};

/// The inverse of a recorded batch, ready to be committed.
#[derive(Debug, Clone)]
pub struct UndoPlan {
    pub backup_path: PathBuf,
    pub changes: Vec<Change>,
}

#[derive(Debug)]
pub struct UndoOutcome {
    pub outcome: RenameOutcome,
    /// Set when the spent backup could not be deleted.
    pub removal_warning: Option<Error>,
}

impl UndoOutcome {
    /// Fails with [`Error::UndoFailed`] when any change could not be reverted.
    pub fn check(&self) -> Result<()> {
        if self.outcome.errors.is_empty() {
            Ok(())
        } else {
            Err(Error::UndoFailed {
                count: self.outcome.errors.len(),
            })
        }
    }
}

/// Loads the snapshot for `working_dir` and inverts it.
pub fn plan(store: &BackupStore, working_dir: &Path) -> Result<UndoPlan> {
    let backup_path = store.find(working_dir)?;
    let snapshot = store.load(&backup_path)?;

    let mut changes: Vec<Change> = snapshot.changes.into_iter().map(Change::invert).collect();
    files_before_dirs(&mut changes, true);

    info!(
        "Loaded backup {:?} with {} change(s) to revert",
        backup_path,
        changes.len()
    );

    Ok(UndoPlan {
        backup_path,
        changes,
    })
}

/// Commits an undo plan through the regular rename pipeline. The backup is
/// removed only after every change was reverted.
///
/// Partial failures are returned in the outcome so they can still be
/// reported; [`UndoOutcome::check`] turns them into [`Error::UndoFailed`].
pub fn apply(config: &Config, store: &BackupStore, plan: UndoPlan) -> Result<UndoOutcome> {
    let config = Config {
        revert: true,
        ..config.clone()
    };

    let outcome = crate::rename(&config, plan.changes, store);

    if !outcome.errors.is_empty() {
        for &index in &outcome.errors {
            let change = &outcome.changes[index];
            error!(
                "Failed to restore {:?} -> {:?}: {}",
                change.source_path(),
                change.target_path(),
                change.error.as_deref().unwrap_or("unknown error")
            );
        }
        return Ok(UndoOutcome {
            outcome,
            removal_warning: None,
        });
    }

    if outcome.dry_run {
        return Ok(UndoOutcome {
            outcome,
            removal_warning: None,
        });
    }

    for change in &outcome.changes {
        remove_empty_parents(change);
    }

    let removal_warning = match store.remove(&plan.backup_path) {
        Ok(()) => None,
        Err(err) => {
            warn!("{}", err);
            Some(err)
        }
    };

    info!("Reverted {} change(s)", outcome.changes.len());

    Ok(UndoOutcome {
        outcome,
        removal_warning,
    })
}

/// Removes the directories a reverted change's old target sat in, innermost
/// first, stopping at `base_dir` or at the first one that is not empty.
fn remove_empty_parents(change: &Change) {
    let mut relative = change.source.parent();

    while let Some(dir) = relative.filter(|dir| !dir.as_os_str().is_empty()) {
        let path = change.base_dir.join(dir);
        match fs::remove_dir(&path) {
            Ok(()) => debug!("Removed empty directory {:?}", path),
            Err(err) => {
                debug!("Keeping directory {:?}: {}", path, err);
                break;
            }
        }
        relative = dir.parent();
    }
}

pub fn undo(config: &Config, store: &BackupStore) -> Result<UndoOutcome> {
    let plan = plan(store, &config.working_dir)?;
    apply(config, store, plan)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn setup() -> (tempfile::TempDir, tempfile::TempDir, BackupStore, Config) {
        let work = tempfile::tempdir().unwrap();
        let data = tempfile::tempdir().unwrap();
        let store = BackupStore::new(data.path());
        let mut config = Config::new(work.path());
        config.exec = true;
        (work, data, store, config)
    }

    #[test]
    fn test_undo_without_backup() {
        let (_work, _data, store, config) = setup();

        let result = undo(&config, &store);

        assert!(matches!(result, Err(Error::NothingToUndo)));
    }

    #[test]
    fn test_plan_inverts_and_orders_for_revert() {
        let (work, _data, store, config) = setup();
        let root = work.path();
        let changes = vec![
            Change::new(root.join("d"), "a.txt", "b.txt"),
            Change::new(root, "d", "d2").dir(),
        ];
        store.persist(&changes, &config).unwrap();

        let plan = plan(&store, root).unwrap();

        assert_eq!(plan.changes[0], Change::new(root, "d2", "d").dir());
        assert_eq!(plan.changes[1], Change::new(root.join("d"), "b.txt", "a.txt"));
    }

    #[test]
    fn test_successful_undo_removes_backup() {
        let (work, _data, store, config) = setup();
        fs::write(work.path().join("b.txt"), "").unwrap();
        store
            .persist(&[Change::new(work.path(), "a.txt", "b.txt")], &config)
            .unwrap();

        let undone = undo(&config, &store).unwrap();

        assert!(undone.removal_warning.is_none());
        assert!(work.path().join("a.txt").is_file());
        assert!(!store.backup_path(work.path()).exists());
    }

    #[test]
    fn test_dry_run_undo_keeps_everything() {
        let (work, _data, store, mut config) = setup();
        config.exec = false;
        fs::write(work.path().join("b.txt"), "").unwrap();
        store
            .persist(&[Change::new(work.path(), "a.txt", "b.txt")], &config)
            .unwrap();

        let undone = undo(&config, &store).unwrap();

        assert!(undone.outcome.dry_run);
        assert!(work.path().join("b.txt").is_file());
        assert!(store.backup_path(work.path()).is_file());
    }

    #[test]
    fn test_failed_undo_keeps_backup() {
        let (work, _data, store, config) = setup();
        fs::write(work.path().join("b.txt"), "").unwrap();
        store
            .persist(
                &[
                    Change::new(work.path(), "a.txt", "vanished.txt"),
                    Change::new(work.path(), "c.txt", "b.txt"),
                ],
                &config,
            )
            .unwrap();

        let undone = undo(&config, &store).unwrap();

        assert!(matches!(undone.check(), Err(Error::UndoFailed { count: 1 })));
        assert_eq!(undone.outcome.changes.len(), 2);
        assert_eq!(undone.outcome.errors, vec![1]);
        assert_eq!(undone.outcome.changes[1].source, PathBuf::from("vanished.txt"));
        assert!(work.path().join("c.txt").is_file());
        assert!(store.backup_path(work.path()).is_file());
    }

    #[test]
    fn test_undo_removes_directories_created_for_targets() {
        let (work, _data, store, config) = setup();
        fs::create_dir(work.path().join("kept")).unwrap();
        fs::write(work.path().join("kept/other.txt"), "").unwrap();
        fs::create_dir_all(work.path().join("2024/jan")).unwrap();
        fs::write(work.path().join("2024/jan/a.txt"), "").unwrap();
        fs::write(work.path().join("kept/b.txt"), "").unwrap();
        store
            .persist(
                &[
                    Change::new(work.path(), "a.txt", "2024/jan/a.txt"),
                    Change::new(work.path(), "b.txt", "kept/b.txt"),
                ],
                &config,
            )
            .unwrap();

        let undone = undo(&config, &store).unwrap();

        assert!(undone.check().is_ok());
        assert!(work.path().join("a.txt").is_file());
        assert!(work.path().join("b.txt").is_file());
        assert!(!work.path().join("2024").exists());
        assert!(work.path().join("kept/other.txt").is_file());
    }
}

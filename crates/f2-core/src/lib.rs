use std::path::PathBuf;
use tracing::{info, warn};

pub mod backup;
pub mod change;
pub mod commit;
pub mod config;
pub mod find;
pub mod naming;
pub mod output;
pub mod path_set;
pub mod undo;

pub use backup::BackupStore;
pub use change::Change;
pub use config::{Config, Conflicts, FindOptions};
pub use find::{discover, Discovery};
pub use naming::NamingRules;
pub use output::Output;
pub use path_set::{DirEntry, PathSet};

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("No such file or directory: {}", .path.display())]
    NotFound { path: PathBuf },
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("Invalid pattern: {0}")]
    Regex(#[from] regex::Error),
    #[error("Backup format error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Unable to determine the user data directory")]
    DataDir,
    #[error("{count} item(s) could not be renamed. Revert the changes with `f2 undo`")]
    RenameFailed { count: usize },
    #[error("Nothing to undo")]
    NothingToUndo,
    #[error("Reverting the renaming operation failed: {count} item(s) could not be restored")]
    UndoFailed { count: usize },
    #[error(
        "Unable to remove redundant backup file {} after reverting the changes. Please remove it manually",
        .path.display()
    )]
    BackupFileRemovalFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

pub type Result<T> = std::result::Result<T, Error>;

/// Result of running a batch through [`rename`].
#[derive(Debug)]
pub struct RenameOutcome {
    pub changes: Vec<Change>,
    /// Positions in `changes` of the items that failed.
    pub errors: Vec<usize>,
    pub dry_run: bool,
    /// Set when the batch was applied but its backup could not be written.
    pub backup_error: Option<Error>,
}

impl RenameOutcome {
    pub fn check(&self) -> Result<()> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(Error::RenameFailed {
                count: self.errors.len(),
            })
        }
    }

    pub fn to_output(&self, config: &Config) -> Output {
        Output::new(config, self.changes.clone(), self.errors.clone(), self.dry_run)
    }
}

/// Runs a planned batch: orders it, commits it unless this is a dry run, and
/// records a backup for anything that is not itself an undo.
///
/// A failed backup does not undo the renames; it is returned as
/// `backup_error` alongside the applied changes.
pub fn rename(config: &Config, mut changes: Vec<Change>, store: &BackupStore) -> RenameOutcome {
    if config.include_dir() || changes.iter().any(|change| change.is_dir) {
        change::files_before_dirs(&mut changes, config.revert);
    }

    if !config.exec {
        info!("Dry run: {} change(s) planned, nothing committed", changes.len());
        return RenameOutcome {
            changes,
            errors: Vec::new(),
            dry_run: true,
            backup_error: None,
        };
    }

    info!("Committing {} change(s)", changes.len());
    let mut errors = commit::commit(&mut changes);

    let backup_error = if config.revert {
        None
    } else {
        match store.persist(&changes, config) {
            Ok(_) => None,
            Err(err) => {
                warn!("Failed to back up the renaming operation: {}", err);
                Some(err)
            }
        }
    };

    if !errors.is_empty() {
        errors = change::errors_last(&mut changes);
    }

    RenameOutcome {
        changes,
        errors,
        dry_run: false,
        backup_error,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_dry_run_touches_nothing() {
        let work = tempfile::tempdir().unwrap();
        let data = tempfile::tempdir().unwrap();
        fs::write(work.path().join("a.txt"), "").unwrap();
        let store = BackupStore::new(data.path());
        let config = Config::new(work.path());

        let outcome = rename(&config, vec![Change::new(work.path(), "a.txt", "b.txt")], &store);

        assert!(outcome.dry_run);
        assert!(work.path().join("a.txt").is_file());
        assert!(!store.backup_path(work.path()).exists());
    }

    #[test]
    fn test_failures_float_last_and_check_reports_them() {
        let work = tempfile::tempdir().unwrap();
        let data = tempfile::tempdir().unwrap();
        fs::write(work.path().join("b.txt"), "").unwrap();
        let store = BackupStore::new(data.path());
        let mut config = Config::new(work.path());
        config.exec = true;
        let changes = vec![
            Change::new(work.path(), "missing.txt", "x.txt"),
            Change::new(work.path(), "b.txt", "c.txt"),
        ];

        let outcome = rename(&config, changes, &store);

        assert_eq!(outcome.errors, vec![1]);
        assert_eq!(outcome.changes[1].source, PathBuf::from("missing.txt"));
        assert!(matches!(outcome.check(), Err(Error::RenameFailed { count: 1 })));
        assert!(outcome.backup_error.is_none());

        let snapshot = store.load(&store.backup_path(work.path())).unwrap();
        assert_eq!(snapshot.changes.len(), 1);
        assert_eq!(snapshot.changes[0].target, PathBuf::from("c.txt"));
    }

    #[test]
    fn test_dir_changes_are_ordered_without_include_dir() {
        let work = tempfile::tempdir().unwrap();
        let data = tempfile::tempdir().unwrap();
        fs::create_dir(work.path().join("d")).unwrap();
        fs::write(work.path().join("d/a.txt"), "").unwrap();
        let store = BackupStore::new(data.path());
        let mut config = Config::new(work.path());
        config.exec = true;
        let changes = vec![
            Change::new(work.path(), "d", "e").dir(),
            Change::new(work.path().join("d"), "a.txt", "b.txt"),
        ];

        let outcome = rename(&config, changes, &store);

        assert!(outcome.check().is_ok());
        assert!(work.path().join("e/b.txt").is_file());
    }

    #[test]
    fn test_backup_failure_is_reported_not_rolled_back() {
        let work = tempfile::tempdir().unwrap();
        let data = tempfile::tempdir().unwrap();
        fs::write(work.path().join("a.txt"), "").unwrap();
        let blocker = data.path().join("not-a-dir");
        fs::write(&blocker, "").unwrap();
        let store = BackupStore::new(&blocker);
        let mut config = Config::new(work.path());
        config.exec = true;

        let outcome = rename(&config, vec![Change::new(work.path(), "a.txt", "b.txt")], &store);

        assert!(outcome.backup_error.is_some());
        assert!(outcome.check().is_ok());
        assert!(work.path().join("b.txt").is_file());
    }
}

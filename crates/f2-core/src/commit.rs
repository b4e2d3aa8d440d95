use chrono::Utc;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::change::Change;

/// Applies every change to disk in order and returns the indices of the ones
/// that failed. A failure is recorded on its change and never stops the
/// batch.
///
/// Callers are responsible for ordering: when directories are renamed in the
/// same batch as their contents, sort with
/// [`files_before_dirs`](crate::change::files_before_dirs) first.
pub fn commit(changes: &mut [Change]) -> Vec<usize> {
    let mut failed = Vec::new();
    let mut renamed = 0;

    for (index, change) in changes.iter_mut().enumerate() {
        match apply(change) {
            Ok(true) => renamed += 1,
            Ok(false) => debug!("Skipping unchanged path: {:?}", change.source_path()),
            Err(err) => {
                debug!(
                    "Failed to rename {:?} -> {:?}: {}",
                    change.source_path(),
                    change.target_path(),
                    err
                );
                change.error = Some(err.to_string());
                failed.push(index);
            }
        }
    }

    info!("Commit complete: {} renamed, {} failed", renamed, failed.len());

    failed
}

/// Returns `Ok(false)` when the change is a no-op.
fn apply(change: &Change) -> io::Result<bool> {
    let source = change.source_path();
    let target = change.target_path();

    if source == target {
        return Ok(false);
    }

    if change.target.components().count() > 1 {
        if let Some(parent) = target.parent() {
            create_dirs(parent)?;
        }
    }

    if differs_only_in_case(&source, &target) {
        rename_via_intermediate(&source, &target)?;
    } else {
        debug!("Renaming {:?} -> {:?}", source, target);
        fs::rename(&source, &target)?;
    }

    Ok(true)
}

fn differs_only_in_case(source: &Path, target: &Path) -> bool {
    source.to_string_lossy().to_lowercase() == target.to_string_lossy().to_lowercase()
}

fn intermediate_path(target: &Path) -> PathBuf {
    let stamp = Utc::now().timestamp_nanos_opt().unwrap_or_default();
    let name = target
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();

    target.with_file_name(format!("__{}__{}", stamp, name))
}

/// On case-insensitive filesystems `a.txt -> A.txt` resolves to the same
/// entry, so the rename goes through a uniquely named sibling.
fn rename_via_intermediate(source: &Path, target: &Path) -> io::Result<()> {
    let intermediate = intermediate_path(target);

    debug!("Renaming {:?} -> {:?} via {:?}", source, target, intermediate);
    fs::rename(source, &intermediate)?;

    if let Err(err) = fs::rename(&intermediate, target) {
        if let Err(restore) = fs::rename(&intermediate, source) {
            warn!(
                "Unable to restore {:?} from {:?}: {}",
                source, intermediate, restore
            );
        }
        return Err(err);
    }

    Ok(())
}

#[cfg(unix)]
fn create_dirs(dir: &Path) -> io::Result<()> {
    use std::os::unix::fs::DirBuilderExt;

    fs::DirBuilder::new().recursive(true).mode(0o750).create(dir)
}

#[cfg(not(unix))]
fn create_dirs(dir: &Path) -> io::Result<()> {
    fs::create_dir_all(dir)
}

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::path::{Component, Path, PathBuf};

/// One planned or completed rename. `source` and `target` are relative to
/// `base_dir`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Change {
    pub source: PathBuf,
    pub target: PathBuf,
    pub base_dir: PathBuf,
    #[serde(default)]
    pub is_dir: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl Change {
    pub fn new(
        base_dir: impl Into<PathBuf>,
        source: impl Into<PathBuf>,
        target: impl Into<PathBuf>,
    ) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
            base_dir: base_dir.into(),
            is_dir: false,
            error: None,
        }
    }

    pub fn dir(mut self) -> Self {
        self.is_dir = true;
        self
    }

    pub fn source_path(&self) -> PathBuf {
        self.base_dir.join(&self.source)
    }

    pub fn target_path(&self) -> PathBuf {
        self.base_dir.join(&self.target)
    }

    /// True when source and target resolve to the same path.
    pub fn is_noop(&self) -> bool {
        self.source_path() == self.target_path()
    }

    pub fn failed(&self) -> bool {
        self.error.is_some()
    }

    /// The operation that reverses this one.
    pub fn invert(self) -> Self {
        Self {
            source: self.target,
            target: self.source,
            error: None,
            ..self
        }
    }
}

fn depth(path: &Path) -> usize {
    path.components()
        .filter(|component| !matches!(component, Component::CurDir))
        .count()
}

/// Orders a batch so that renaming a directory never invalidates the paths of
/// changes inside it.
///
/// Forward: every file first, then directories deepest-first.
/// Revert: shallowest base directory first, so a restored directory exists
/// before its former children are moved back.
pub fn files_before_dirs(changes: &mut [Change], revert: bool) {
    if revert {
        changes.sort_by_key(|change| depth(&change.base_dir));
        return;
    }

    changes.sort_by(|a, b| match (a.is_dir, b.is_dir) {
        (false, false) => Ordering::Equal,
        (false, true) => Ordering::Less,
        (true, false) => Ordering::Greater,
        (true, true) => depth(&b.base_dir).cmp(&depth(&a.base_dir)),
    });
}

/// Moves failed changes behind successful ones, preserving relative order
/// within each group, and returns the new positions of the failures.
pub fn errors_last(changes: &mut Vec<Change>) -> Vec<usize> {
    let (succeeded, failed): (Vec<_>, Vec<_>) =
        std::mem::take(changes).into_iter().partition(|change| !change.failed());

    let first_failure = succeeded.len();
    let positions = (first_failure..first_failure + failed.len()).collect();

    changes.extend(succeeded);
    changes.extend(failed);

    positions
}

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf, MAIN_SEPARATOR};
use tracing::{debug, info};

use crate::change::Change;
use crate::config::Config;
use crate::output::Output;
use crate::{Error, Result};

/// Backup file name for a working directory: separators (and the drive
/// colon on Windows) become underscores.
///
/// This is lossy: `/a_b` and `/a/b` map to the same file.
pub fn backup_file_name(working_dir: &Path) -> String {
    let mut name = working_dir
        .to_string_lossy()
        .replace(MAIN_SEPARATOR, "_");

    if cfg!(windows) {
        name = name.replace(':', "_");
    }

    format!("{}.json", name)
}

/// One snapshot file per working directory, holding the successful changes
/// of the last committed batch.
#[derive(Debug, Clone)]
pub struct BackupStore {
    root: PathBuf,
}

impl BackupStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// `<user data dir>/f2/backups`.
    pub fn from_data_dir() -> Result<Self> {
        let data_dir = dirs::data_dir().ok_or(Error::DataDir)?;
        Ok(Self::new(data_dir.join("f2").join("backups")))
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn backup_path(&self, working_dir: &Path) -> PathBuf {
        self.root.join(backup_file_name(working_dir))
    }

    /// Writes the successful subset of `changes`, replacing any previous
    /// snapshot for the same working directory.
    pub fn persist(&self, changes: &[Change], config: &Config) -> Result<PathBuf> {
        let successful: Vec<Change> = changes
            .iter()
            .filter(|change| !change.failed())
            .cloned()
            .collect();

        let path = self.backup_path(&config.working_dir);
        fs::create_dir_all(&self.root)?;

        let snapshot = Output::new(config, successful, Vec::new(), false);

        let mut writer = BufWriter::new(File::create(&path)?);
        snapshot.write_to(&mut writer)?;
        writer.flush()?;

        info!(
            "Backup written: {} change(s) to {:?}",
            snapshot.changes.len(),
            path
        );

        Ok(path)
    }

    /// Locates the snapshot for `working_dir`.
    pub fn find(&self, working_dir: &Path) -> Result<PathBuf> {
        let path = self.backup_path(working_dir);
        if path.is_file() {
            debug!("Found backup: {:?}", path);
            Ok(path)
        } else {
            Err(Error::NothingToUndo)
        }
    }

    pub fn load(&self, path: &Path) -> Result<Output> {
        let contents = fs::read(path)?;
        Ok(serde_json::from_slice(&contents)?)
    }

    pub fn remove(&self, path: &Path) -> Result<()> {
        fs::remove_file(path).map_err(|source| Error::BackupFileRemovalFailed {
            path: path.to_path_buf(),
            source,
        })
    }
}

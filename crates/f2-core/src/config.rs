use chrono::{DateTime, Local};
use std::path::PathBuf;

use crate::naming::NamingRules;

/// Conflict report produced by the conflict validator. Carried verbatim into
/// the output and backup schema.
pub type Conflicts = serde_json::Map<String, serde_json::Value>;

/// Options controlling which entries discovery returns.
#[derive(Debug, Clone, Default)]
pub struct FindOptions {
    /// Files or directories to search; empty means the current directory.
    pub paths: Vec<PathBuf>,
    /// Levels to descend when recursive; 0 is unbounded.
    pub max_depth: usize,
    pub recursive: bool,
    pub include_hidden: bool,
    pub include_dir: bool,
    pub only_dir: bool,
    pub ignore_ext: bool,
    /// Exclusion patterns, joined with alternation.
    pub exclude: Vec<String>,
}

impl FindOptions {
    pub fn includes_dirs(&self) -> bool {
        self.include_dir || self.only_dir
    }
}

/// Settings for one invocation.
#[derive(Debug, Clone)]
pub struct Config {
    pub find: FindOptions,
    pub naming: NamingRules,
    pub csv_file: Option<PathBuf>,
    pub exec: bool,
    pub revert: bool,
    /// Confirm the plan with the user before committing.
    pub interactive: bool,
    pub working_dir: PathBuf,
    pub date: DateTime<Local>,
    pub conflicts: Conflicts,
}

impl Config {
    pub fn new(working_dir: impl Into<PathBuf>) -> Self {
        Self {
            find: FindOptions::default(),
            naming: NamingRules::default(),
            csv_file: None,
            exec: false,
            revert: false,
            interactive: false,
            working_dir: working_dir.into(),
            date: Local::now(),
            conflicts: Conflicts::new(),
        }
    }

    pub fn include_dir(&self) -> bool {
        self.find.includes_dirs()
    }
}

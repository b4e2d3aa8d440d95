//! Discovery of rename candidates, either by searching directories or from a
//! CSV manifest of `source,target` rows.

use regex::Regex;
use std::collections::{HashMap, HashSet};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::change::Change;
use crate::config::{Config, FindOptions};
use crate::naming::{self, NamingRules};
use crate::path_set::{
    is_hidden, normalize, parent_dir, read_entries, split_extension, DirEntry, PathSet,
};
use crate::{Error, Result};

/// Everything discovery produced for one invocation.
#[derive(Debug, Default)]
pub struct Discovery {
    pub paths: PathSet,
    /// Absolute source path to its raw manifest record. CSV mode only.
    pub csv_rows: HashMap<PathBuf, Vec<String>>,
    /// Set when no find/replace was supplied with the manifest, so each row's
    /// target column decides the new name.
    pub manifest_only: bool,
}

impl Discovery {
    pub fn plan(&self, config: &Config) -> Vec<Change> {
        if self.manifest_only {
            return self.manifest_plan();
        }
        naming::plan(&self.paths, &config.naming, config.find.ignore_ext)
    }

    /// The manifest target of the row listing `source`, if it names one.
    pub fn manifest_target(&self, source: &Path) -> Option<&str> {
        self.csv_rows
            .get(source)
            .and_then(|row| row.get(1))
            .map(|target| target.trim())
            .filter(|target| !target.is_empty())
    }

    fn manifest_plan(&self) -> Vec<Change> {
        let mut changes = Vec::new();

        for (dir, entries) in &self.paths {
            for entry in entries {
                let Some(target) = self.manifest_target(&dir.join(&entry.name)) else {
                    continue;
                };
                if target == entry.name {
                    continue;
                }

                debug!("Manifest rename in {:?}: '{}' -> '{}'", dir, entry.name, target);

                let mut change = Change::new(dir, &entry.name, target);
                change.is_dir = entry.is_dir;
                changes.push(change);
            }
        }

        changes
    }
}

pub fn discover(config: &Config) -> Result<Discovery> {
    if let Some(csv_file) = &config.csv_file {
        return read_csv_manifest(csv_file, &config.naming);
    }

    let options = &config.find;

    info!("Searching {} path(s)", options.paths.len().max(1));

    let mut paths = search_paths(
        &options.paths,
        options.max_depth,
        options.recursive,
        options.include_hidden,
    )?;

    filter_matches(&mut paths, config.naming.search(), options)?;

    info!(
        "Discovery complete: {} matching entries in {} director(ies)",
        paths.values().map(Vec::len).sum::<usize>(),
        paths.len()
    );

    Ok(Discovery {
        paths,
        ..Discovery::default()
    })
}

fn stat(path: &Path) -> Result<fs::Metadata> {
    fs::metadata(path).map_err(|err| match err.kind() {
        io::ErrorKind::NotFound => Error::NotFound {
            path: path.to_path_buf(),
        },
        _ => Error::Io(err),
    })
}

fn push_unique(paths: &mut PathSet, dir: PathBuf, entry: DirEntry) {
    let entries = paths.entry(dir).or_default();
    if !entries.iter().any(|existing| existing.name == entry.name) {
        entries.push(entry);
    }
}

/// Seeds a path set from the given files and directories and, when
/// `recursive`, expands it level by level.
///
/// A directory contributes all of its entries. A file contributes only its
/// own entry under its parent directory.
pub fn search_paths(
    paths: &[PathBuf],
    max_depth: usize,
    recursive: bool,
    include_hidden: bool,
) -> Result<PathSet> {
    let current_dir = [PathBuf::from(".")];
    let paths = if paths.is_empty() { &current_dir[..] } else { paths };

    let mut set = PathSet::new();
    let mut listed = HashSet::new();

    for path in paths {
        let path = normalize(path);
        let metadata = stat(&path)?;

        if metadata.is_dir() {
            debug!("Reading directory: {:?}", path);
            let entries = read_entries(&path)?;
            listed.insert(path.clone());
            set.insert(path, entries);
            continue;
        }

        let Some(name) = path.file_name() else {
            continue;
        };
        let entry = DirEntry::new(name.to_string_lossy(), false);
        push_unique(&mut set, parent_dir(&path), entry);
    }

    if recursive {
        walk(&mut set, listed, max_depth, include_hidden)?;
    }

    Ok(set)
}

/// Breadth-first expansion: each pass reads every unlisted subdirectory of
/// the current frontier, merges the results, and makes them the next
/// frontier. Every directory is read at most once.
///
/// `listed` holds the keys whose entries are a full listing. Other keys were
/// seeded from file arguments; when the walk reaches one of them its partial
/// entries are replaced by the full listing.
fn walk(
    paths: &mut PathSet,
    mut listed: HashSet<PathBuf>,
    max_depth: usize,
    include_hidden: bool,
) -> Result<()> {
    let mut frontier: Vec<PathBuf> = paths
        .keys()
        .filter(|dir| listed.contains(*dir))
        .cloned()
        .collect();
    let mut depth = 0;

    while !frontier.is_empty() {
        let mut next_level = PathSet::new();

        for dir in &frontier {
            let Some(entries) = paths.get(dir) else {
                continue;
            };

            for entry in entries.iter().filter(|entry| entry.is_dir) {
                if !include_hidden && is_hidden(&entry.name, dir)? {
                    debug!("Skipping hidden directory: {:?}", dir.join(&entry.name));
                    continue;
                }

                let child = normalize(&dir.join(&entry.name));
                if !listed.insert(child.clone()) {
                    continue;
                }

                debug!("Expanding directory: {:?}", child);
                let child_entries = read_entries(&child)?;
                next_level.insert(child, child_entries);
            }
        }

        if next_level.is_empty() {
            break;
        }

        depth += 1;
        frontier = next_level.keys().cloned().collect();
        paths.extend(next_level);

        if max_depth > 0 && depth >= max_depth {
            debug!("Reached maximum depth {}", max_depth);
            break;
        }
    }

    Ok(())
}

fn absolute_key(path: &Path) -> io::Result<String> {
    let absolute = std::path::absolute(path)?;
    Ok(normalize(&absolute).to_string_lossy().to_lowercase())
}

/// Drops entries that do not match `search` (or that match the exclusion
/// patterns), honouring the directory and hidden-file flags. Directories left
/// without entries are removed from the set.
///
/// Hidden entries that were passed explicitly in `options.paths` are kept.
pub fn filter_matches(
    paths: &mut PathSet,
    search: Option<&Regex>,
    options: &FindOptions,
) -> Result<()> {
    let exclude = if options.exclude.is_empty() {
        None
    } else {
        Some(Regex::new(&options.exclude.join("|"))?)
    };

    let explicit = options
        .paths
        .iter()
        .map(|path| absolute_key(path))
        .collect::<io::Result<Vec<_>>>()?;

    let include_dir = options.includes_dirs();

    for (dir, entries) in paths.iter_mut() {
        let mut kept = Vec::with_capacity(entries.len());

        for entry in std::mem::take(entries) {
            if entry.is_dir && !include_dir {
                continue;
            }

            if options.only_dir && !entry.is_dir {
                continue;
            }

            if !options.include_hidden && is_hidden(&entry.name, dir)? {
                let key = absolute_key(&dir.join(&entry.name))?;
                if !explicit.contains(&key) {
                    debug!("Skipping hidden entry: {:?}", dir.join(&entry.name));
                    continue;
                }
            }

            let name = if options.ignore_ext && !entry.is_dir {
                split_extension(&entry.name).0
            } else {
                entry.name.as_str()
            };

            if exclude.as_ref().is_some_and(|pattern| pattern.is_match(name)) {
                continue;
            }

            if search.map_or(true, |pattern| pattern.is_match(name)) {
                kept.push(entry);
            }
        }

        *entries = kept;
    }

    paths.retain(|_, entries| !entries.is_empty());

    Ok(())
}

/// Reads a header-less CSV manifest. Column 0 is a source path relative to
/// the manifest's directory; column 1, when present, is the target name.
///
/// When `naming` is empty the manifest alone decides the renames: every
/// listed source is a candidate and its row's target is used verbatim.
pub fn read_csv_manifest(csv_file: &Path, naming: &NamingRules) -> Result<Discovery> {
    info!("Reading CSV manifest: {:?}", csv_file);

    let csv_dir = parent_dir(&std::path::absolute(csv_file)?);

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_path(csv_file)?;

    let mut discovery = Discovery {
        manifest_only: naming.is_empty(),
        ..Discovery::default()
    };

    for record in reader.records() {
        let record = record?;
        let Some(source) = record.get(0).map(str::trim).filter(|source| !source.is_empty()) else {
            continue;
        };

        let source_path = normalize(&csv_dir.join(source));
        let metadata = stat(&source_path)?;

        let Some(name) = source_path.file_name().map(|name| name.to_string_lossy().into_owned())
        else {
            continue;
        };

        debug!("Manifest row: {:?} -> {:?}", source_path, record.get(1));

        push_unique(
            &mut discovery.paths,
            parent_dir(&source_path),
            DirEntry::new(name, metadata.is_dir()),
        );

        discovery
            .csv_rows
            .insert(source_path, record.iter().map(str::to_string).collect());
    }

    info!("CSV manifest lists {} source(s)", discovery.csv_rows.len());

    Ok(discovery)
}

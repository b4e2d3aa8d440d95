use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Component, Path, PathBuf};

/// A single entry discovered inside a directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirEntry {
    pub name: String,
    pub is_dir: bool,
}

impl DirEntry {
    pub fn new(name: impl Into<String>, is_dir: bool) -> Self {
        Self {
            name: name.into(),
            is_dir,
        }
    }

    fn from_fs(entry: &fs::DirEntry) -> io::Result<Self> {
        let is_dir = entry.file_type()?.is_dir();
        Ok(Self::new(entry.file_name().to_string_lossy(), is_dir))
    }
}

/// Directory path mapped to the entries discovered there.
pub type PathSet = BTreeMap<PathBuf, Vec<DirEntry>>;

pub(crate) fn read_entries(dir: &Path) -> io::Result<Vec<DirEntry>> {
    let mut entries = fs::read_dir(dir)?
        .map(|entry| entry.and_then(|entry| DirEntry::from_fs(&entry)))
        .collect::<Result<Vec<_>, _>>()?;

    entries.sort_by(|a, b| a.name.cmp(&b.name));

    Ok(entries)
}

/// Lexically cleans a path: drops `.` components, folds `..` into the
/// preceding name, and falls back to `.` when nothing is left. `..` at the
/// root is dropped; leading `..` of a relative path are kept.
pub fn normalize(path: &Path) -> PathBuf {
    let mut cleaned = PathBuf::new();

    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => match cleaned.components().next_back() {
                Some(Component::Normal(_)) => {
                    cleaned.pop();
                }
                Some(Component::RootDir | Component::Prefix(_)) => {}
                _ => cleaned.push(component),
            },
            _ => cleaned.push(component),
        }
    }

    if cleaned.as_os_str().is_empty() {
        PathBuf::from(".")
    } else {
        cleaned
    }
}

/// Directory that holds `path`, `.` for bare file names.
pub fn parent_dir(path: &Path) -> PathBuf {
    match path.parent() {
        Some(parent) => normalize(parent),
        None => PathBuf::from("."),
    }
}

/// Splits a file name into its stem and extension (with the leading dot).
/// A leading dot alone does not start an extension.
pub fn split_extension(name: &str) -> (&str, &str) {
    match name.rfind('.') {
        Some(index) if index > 0 => name.split_at(index),
        _ => (name, ""),
    }
}

#[cfg(not(windows))]
pub(crate) fn is_hidden(name: &str, _dir: &Path) -> io::Result<bool> {
    Ok(name.starts_with('.'))
}

#[cfg(windows)]
pub(crate) fn is_hidden(name: &str, dir: &Path) -> io::Result<bool> {
    use std::os::windows::fs::MetadataExt;

    const FILE_ATTRIBUTE_HIDDEN: u32 = 0x2;

    let metadata = fs::symlink_metadata(dir.join(name))?;
    Ok(metadata.file_attributes() & FILE_ATTRIBUTE_HIDDEN != 0)
}

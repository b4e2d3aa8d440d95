use regex::Regex;
use tracing::debug;

use crate::change::Change;
use crate::path_set::{split_extension, PathSet};
use crate::Result;

/// Find patterns paired with replacement strings.
///
/// Pattern `i` is replaced with replacement `i`; when there are fewer
/// replacements than patterns the last replacement is reused. Rules apply in
/// sequence, each to the output of the previous one.
#[derive(Debug, Clone, Default)]
pub struct NamingRules {
    find: Vec<Regex>,
    replacement: Vec<String>,
}

impl NamingRules {
    pub fn new(find: &[String], replacement: &[String]) -> Result<Self> {
        let find = find
            .iter()
            .map(|pattern| Regex::new(pattern))
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(Self {
            find,
            replacement: replacement.to_vec(),
        })
    }

    pub fn is_empty(&self) -> bool {
        self.find.is_empty() && self.replacement.is_empty()
    }

    /// The inclusion pattern used to filter discovered entries. `None`
    /// matches everything.
    pub fn search(&self) -> Option<&Regex> {
        self.find.first()
    }

    fn replacement_for(&self, index: usize) -> &str {
        self.replacement
            .get(index)
            .or_else(|| self.replacement.last())
            .map(String::as_str)
            .unwrap_or("")
    }

    pub fn apply(&self, name: &str) -> String {
        let mut result = name.to_string();

        for (index, pattern) in self.find.iter().enumerate() {
            if !pattern.is_match(&result) {
                continue;
            }

            result = pattern
                .replace_all(&result, self.replacement_for(index))
                .into_owned();
        }

        result
    }
}

/// Computes a change for every discovered entry whose name the rules alter.
pub fn plan(paths: &PathSet, rules: &NamingRules, ignore_ext: bool) -> Vec<Change> {
    let mut changes = Vec::new();

    for (dir, entries) in paths {
        for entry in entries {
            let target = if ignore_ext && !entry.is_dir {
                let (stem, extension) = split_extension(&entry.name);
                format!("{}{}", rules.apply(stem), extension)
            } else {
                rules.apply(&entry.name)
            };

            if target == entry.name {
                continue;
            }

            debug!("Planned rename in {:?}: '{}' -> '{}'", dir, entry.name, target);

            let mut change = Change::new(dir, &entry.name, target);
            change.is_dir = entry.is_dir;
            changes.push(change);
        }
    }

    changes
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::path_set::DirEntry;
    use std::path::PathBuf;

    fn strings(values: &[&str]) -> Vec<String> {
        values.iter().map(|value| value.to_string()).collect()
    }

    #[test]
    fn test_regex_rules_chain() {
        let rules = NamingRules::new(&strings(&["img", "_(\\d+)"]), &strings(&["photo", "-$1"])).unwrap();

        assert_eq!(rules.apply("img_001.jpg"), "photo-001.jpg");
    }

    #[test]
    fn test_missing_replacement_reuses_last() {
        let rules = NamingRules::new(&strings(&["a", "b"]), &strings(&["x"])).unwrap();

        assert_eq!(rules.apply("ab"), "xx");
    }

    #[test]
    fn test_plan_skips_unchanged_and_keeps_extension() {
        let mut paths = PathSet::new();
        paths.insert(
            PathBuf::from("photos"),
            vec![
                DirEntry::new("jpg_album", true),
                DirEntry::new("holiday.jpg", false),
                DirEntry::new("notes.txt", false),
            ],
        );
        let rules = NamingRules::new(&strings(&["jpg|holiday"]), &strings(&["png"])).unwrap();

        let changes = plan(&paths, &rules, true);

        assert_eq!(changes.len(), 2);
        assert_eq!(changes[0].source, PathBuf::from("jpg_album"));
        assert_eq!(changes[0].target, PathBuf::from("png_album"));
        assert!(changes[0].is_dir);
        assert_eq!(changes[1].target, PathBuf::from("png.jpg"));
        assert_eq!(changes[1].base_dir, PathBuf::from("photos"));
    }
}

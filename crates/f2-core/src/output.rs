use chrono::SecondsFormat;
use serde::{Deserialize, Serialize};
use std::io::Write;
use std::path::PathBuf;

use crate::change::Change;
use crate::config::{Config, Conflicts};
use crate::Result;

/// The structure printed by `--json` and stored in backup files.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Output {
    #[serde(default, skip_serializing_if = "Conflicts::is_empty")]
    pub conflicts: Conflicts,
    pub working_dir: PathBuf,
    pub date: String,
    #[serde(default)]
    pub changes: Vec<Change>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<usize>,
    #[serde(default)]
    pub dry_run: bool,
}

impl Output {
    pub fn new(config: &Config, changes: Vec<Change>, errors: Vec<usize>, dry_run: bool) -> Self {
        Self {
            conflicts: config.conflicts.clone(),
            working_dir: config.working_dir.clone(),
            date: config.date.to_rfc3339_opts(SecondsFormat::Secs, false),
            changes,
            errors,
            dry_run,
        }
    }

    pub fn write_to<W: Write>(&self, writer: W) -> Result<()> {
        let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
        let mut serializer = serde_json::Serializer::with_formatter(writer, formatter);
        self.serialize(&mut serializer)?;
        Ok(())
    }

    pub fn to_json(&self) -> Result<String> {
        let mut buffer = Vec::new();
        self.write_to(&mut buffer)?;
        Ok(String::from_utf8_lossy(&buffer).into_owned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::DateTime;

    #[test]
    fn test_empty_fields_are_omitted_but_changes_is_an_array() {
        let config = Config::new("/work");
        let output = Output::new(&config, Vec::new(), Vec::new(), true);

        let json: serde_json::Value = serde_json::from_str(&output.to_json().unwrap()).unwrap();

        assert_eq!(json["changes"], serde_json::json!([]));
        assert_eq!(json["working_dir"], "/work");
        assert_eq!(json["dry_run"], true);
        assert!(json.get("errors").is_none());
        assert!(json.get("conflicts").is_none());
        assert!(DateTime::parse_from_rfc3339(json["date"].as_str().unwrap()).is_ok());
    }

    #[test]
    fn test_conflicts_pass_through_verbatim() {
        let mut config = Config::new("/work");
        config.conflicts.insert(
            "target_exists".to_string(),
            serde_json::json!([{ "source": ["a.txt"], "target": "b.txt" }]),
        );
        let output = Output::new(&config, vec![Change::new("/work", "a", "b")], vec![0], false);

        let parsed: Output = serde_json::from_str(&output.to_json().unwrap()).unwrap();

        assert_eq!(parsed.conflicts, config.conflicts);
        assert_eq!(parsed.errors, vec![0]);
        assert_eq!(parsed.changes.len(), 1);
    }

    #[test]
    fn test_indented_with_four_spaces() {
        let output = Output::new(&Config::new("/work"), Vec::new(), Vec::new(), false);

        assert!(output.to_json().unwrap().contains("\n    \"working_dir\""));
    }
}

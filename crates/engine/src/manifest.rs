//! Manifest store
//!
//! Reads the YAML registry of declared tests and writes it back whole.

use std::path::{Path, PathBuf};
use tcsync_common::{Error, ManifestEntry, Result};
use tracing::{debug, info};

/// Owns the on-disk location of the manifest
pub struct ManifestStore {
    path: PathBuf,
}

impl ManifestStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load and validate the manifest
    ///
    /// The root must be a YAML sequence; anything else is fatal.
    pub fn load(&self) -> Result<Vec<ManifestEntry>> {
        let content = std::fs::read_to_string(&self.path).map_err(|e| Error::io_at(&self.path, e))?;
        let entries = Self::parse(&self.path, &content)?;
        info!("Loaded {} manifest entries from {}", entries.len(), self.path.display());
        Ok(entries)
    }

    /// Parse manifest text, `origin` is only used in error messages
    pub fn parse(origin: &Path, content: &str) -> Result<Vec<ManifestEntry>> {
        let root: serde_yaml::Value = serde_yaml::from_str(content)?;

        let records = match root {
            serde_yaml::Value::Sequence(records) => records,
            other => {
                return Err(Error::ManifestShape {
                    path: origin.to_path_buf(),
                    found: value_kind(&other).to_string(),
                })
            }
        };

        records
            .into_iter()
            .enumerate()
            .map(|(index, record)| {
                if !record.is_mapping() {
                    return Err(Error::ManifestRecord {
                        index,
                        message: format!("expected a mapping, found {}", value_kind(&record)),
                    });
                }
                serde_yaml::from_value(record).map_err(|e| Error::ManifestRecord {
                    index,
                    message: e.to_string(),
                })
            })
            .collect()
    }

    /// Rewrite the whole manifest from the in-memory entries
    pub fn save(&self, entries: &[ManifestEntry]) -> Result<()> {
        let yaml = serde_yaml::to_string(entries)?;
        std::fs::write(&self.path, yaml).map_err(|e| Error::io_at(&self.path, e))?;
        debug!("Wrote {} manifest entries to {}", entries.len(), self.path.display());
        Ok(())
    }
}

fn value_kind(value: &serde_yaml::Value) -> &'static str {
    match value {
        serde_yaml::Value::Null => "an empty document",
        serde_yaml::Value::Bool(_) => "a boolean",
        serde_yaml::Value::Number(_) => "a number",
        serde_yaml::Value::String(_) => "a string",
        serde_yaml::Value::Sequence(_) => "a list",
        serde_yaml::Value::Mapping(_) => "a mapping",
        serde_yaml::Value::Tagged(_) => "a tagged value",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tcsync_common::Automation;
    use tempfile::TempDir;

    #[test]
    fn test_load_list_manifest() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("tests.yml");
        std::fs::write(
            &path,
            r#"
- testId: TC-001
  testFile: endUser/login.spec.ts
  title: Verify Invalid Login Shows Error Message
  bugId: SHOP-1234
  priority: P0
  tags: ["@regression", "@auth"]
  automation: ui
  isAutomated: true
- test_id: TC-002
"#,
        )
        .unwrap();

        let entries = ManifestStore::new(&path).load().unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].bug_id.as_deref(), Some("SHOP-1234"));
        assert_eq!(entries[0].automation, Automation::Ui);
        assert_eq!(entries[1].test_id, "TC-002");
        assert!(!entries[1].is_automated);
    }

    #[test]
    fn test_mapping_root_is_fatal() {
        let err = ManifestStore::parse(Path::new("tests.yml"), "tests:\n  - testId: TC-1\n").unwrap_err();
        match err {
            Error::ManifestShape { found, .. } => assert_eq!(found, "a mapping"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_empty_document_is_fatal() {
        assert!(ManifestStore::parse(Path::new("tests.yml"), "").is_err());
        let err = ManifestStore::parse(Path::new("tests.yml"), "~\n").unwrap_err();
        assert!(matches!(err, Error::ManifestShape { .. }));
    }

    #[test]
    fn test_scalar_record_is_rejected() {
        let err = ManifestStore::parse(Path::new("tests.yml"), "- TC-1\n").unwrap_err();
        assert!(matches!(err, Error::ManifestRecord { index: 0, .. }));
    }

    #[test]
    fn test_empty_list_is_valid() {
        let entries = ManifestStore::parse(Path::new("tests.yml"), "[]\n").unwrap();
        assert!(entries.is_empty());
    }

    #[test]
    fn test_save_then_load_preserves_entries() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("tests.yml");
        std::fs::write(&path, "- testId: TC-9\n  testFile: a.spec.ts\n  owner: qa\n").unwrap();

        let store = ManifestStore::new(&path);
        let entries = store.load().unwrap();
        store.save(&entries).unwrap();

        let reloaded = store.load().unwrap();
        assert_eq!(entries, reloaded);
        assert!(std::fs::read_to_string(&path).unwrap().contains("owner: qa"));
    }

    #[test]
    fn test_missing_manifest_is_io_error() {
        let dir = TempDir::new().unwrap();
        let err = ManifestStore::new(dir.path().join("missing.yml")).load().unwrap_err();
        assert!(matches!(err, Error::IoAt { .. }));
    }
}

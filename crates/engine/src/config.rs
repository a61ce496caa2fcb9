//! Sync configuration

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tcsync_common::{Error, KeyScope, Result};

/// Default configuration file name, looked up in the working directory
pub const DEFAULT_CONFIG_FILE: &str = "tcsync.toml";

/// Configuration for one sync run
///
/// Built once at startup and handed to every component.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    /// YAML manifest of declared test cases
    pub manifest_path: PathBuf,

    /// Root directory scanned for test sources
    pub tests_dir: PathBuf,

    /// File name suffixes that mark a test source
    pub file_extensions: Vec<String>,

    /// Identifier prefix, `TC` matches `TC-12`, `TC:12` and `@TC-12`
    pub id_prefix: String,

    /// Bytes searched forward from an annotation for its owning test
    pub association_window: usize,

    /// Whether ids are unique per file or across the whole manifest
    pub key_scope: KeyScope,

    /// Where the run summary is written
    pub stats_path: PathBuf,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            manifest_path: PathBuf::from("./tests.yml"),
            tests_dir: PathBuf::from("./tests"),
            file_extensions: vec![
                ".spec.ts".to_string(),
                ".test.js".to_string(),
                ".spec.js".to_string(),
            ],
            id_prefix: "TC".to_string(),
            association_window: 500,
            key_scope: KeyScope::File,
            stats_path: PathBuf::from("./summary-stats.json"),
        }
    }
}

impl SyncConfig {
    /// Load configuration from file, falling back to defaults when absent
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| Error::io_at(path, e))?;
        let config: Self = toml::from_str(&content).map_err(|e| Error::Config {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to file
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| Error::InvalidConfig(e.to_string()))?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, content).map_err(|e| Error::io_at(path, e))?;
        Ok(())
    }

    /// Reject values no run could work with
    pub fn validate(&self) -> Result<()> {
        if self.file_extensions.is_empty() {
            return Err(Error::InvalidConfig(
                "file_extensions must name at least one suffix".to_string(),
            ));
        }
        if self.id_prefix.trim().is_empty() {
            return Err(Error::InvalidConfig("id_prefix must not be empty".to_string()));
        }
        if self.association_window == 0 {
            return Err(Error::InvalidConfig(
                "association_window must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

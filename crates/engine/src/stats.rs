//! Run summary statistics

use crate::reconciler::ReconcileReport;
use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tcsync_common::{Error, ManifestEntry, Result};
use tracing::info;

/// Summary written after every sync
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncStats {
    pub total_manifested: usize,
    /// Automated and not skipped
    pub automated: usize,
    /// Skipped, whether or not found in code
    pub manual: usize,
    /// Percentage of automated entries with two decimals, `"0"` for an empty manifest
    pub coverage: String,
    pub shadow_count: usize,
    pub shadow_tests: Vec<String>,
    pub orphan_count: usize,
    pub orphaned_tests: Vec<String>,
    pub timestamp: String,
}

impl SyncStats {
    /// Compute statistics over the reconciled manifest
    pub fn compute(entries: &[ManifestEntry], report: &ReconcileReport) -> Self {
        let total = entries.len();
        let automated = entries.iter().filter(|e| e.is_automated && !e.is_skipped).count();
        let manual = entries.iter().filter(|e| e.is_skipped).count();

        let coverage = if total == 0 {
            "0".to_string()
        } else {
            format!("{:.2}", automated as f64 / total as f64 * 100.0)
        };

        Self {
            total_manifested: total,
            automated,
            manual,
            coverage,
            shadow_count: report.shadows.len(),
            shadow_tests: report.shadows.iter().map(ToString::to_string).collect(),
            orphan_count: report.orphans.len(),
            orphaned_tests: report.orphans.iter().map(ToString::to_string).collect(),
            timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
        }
    }

    /// Same statistics ignoring when they were taken
    pub fn same_counts(&self, other: &Self) -> bool {
        Self {
            timestamp: String::new(),
            ..self.clone()
        } == Self {
            timestamp: String::new(),
            ..other.clone()
        }
    }
}

/// Write statistics as pretty JSON
pub fn write_stats(path: &Path, stats: &SyncStats) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| Error::io_at(parent, e))?;
    }
    let json = serde_json::to_string_pretty(stats)?;
    std::fs::write(path, json).map_err(|e| Error::io_at(path, e))?;
    info!("Statistics written to: {}", path.display());
    Ok(())
}

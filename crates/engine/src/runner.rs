//! Sync pipeline
//!
//! Load manifest, scan sources, reconcile, then persist statistics and the
//! updated manifest.

use crate::config::SyncConfig;
use crate::extractor::AnnotationExtractor;
use crate::manifest::ManifestStore;
use crate::reconciler::{ReconcileReport, Reconciler};
use crate::stats::{self, SyncStats};
use crate::walker;
use tcsync_common::{Error, Result, ScanIndex};
use tracing::{debug, info, warn};

/// Options for one sync run
#[derive(Debug, Clone, Copy, Default)]
pub struct SyncOptions {
    /// Do everything except write the manifest and statistics
    pub dry_run: bool,

    /// Append shadow tests to the manifest instead of failing
    pub accept_shadows: bool,
}

/// Result of a sync run
#[derive(Debug, Clone)]
pub struct SyncOutcome {
    pub report: ReconcileReport,
    pub stats: SyncStats,
    pub files_scanned: usize,
    pub unidentified_tests: usize,
}

impl SyncOutcome {
    /// Process exit status, 1 while shadow tests remain unresolved
    pub fn exit_code(&self) -> i32 {
        if self.report.has_unresolved_shadows() {
            1
        } else {
            0
        }
    }
}

/// Results of scanning the source tree
#[derive(Debug, Clone, Default)]
pub struct ScanSummary {
    pub index: ScanIndex,
    pub files_scanned: usize,
    pub unidentified_tests: usize,
}

/// Runs the sync pipeline for one configuration
pub struct SyncRunner {
    config: SyncConfig,
    extractor: AnnotationExtractor,
}

impl SyncRunner {
    pub fn new(config: SyncConfig) -> Result<Self> {
        config.validate()?;
        let extractor = AnnotationExtractor::new(&config)?;
        Ok(Self { config, extractor })
    }

    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    /// Walk the scan root and extract every identified test
    pub fn scan(&self) -> Result<ScanSummary> {
        let root = &self.config.tests_dir;
        info!("Scanning {}", root.display());

        let sources = walker::collect_sources(root, &self.config.file_extensions)?;
        let mut summary = ScanSummary {
            files_scanned: sources.len(),
            ..Default::default()
        };

        for source in &sources {
            let bytes = std::fs::read(&source.path).map_err(|e| Error::io_at(&source.path, e))?;
            let text = String::from_utf8_lossy(&bytes);
            let scan = self.extractor.extract(&source.relative, &text);

            summary.unidentified_tests += scan.unidentified;
            for (id, meta) in scan.tests {
                let key = self.config.key_scope.key(&source.relative, &id);
                if let Some(previous) = summary.index.insert(key.clone(), meta) {
                    warn!(
                        "Test {} also declared in {}, keeping {}",
                        key, previous.test_file, source.relative
                    );
                }
            }
        }

        info!(
            "Found {} tests in {} files ({} without identifier)",
            summary.index.len(),
            summary.files_scanned,
            summary.unidentified_tests
        );
        Ok(summary)
    }

    /// Reconcile the manifest with the source tree
    ///
    /// The manifest is validated before anything is scanned; a fatal error
    /// leaves every file on disk untouched.
    pub fn run(&self, options: SyncOptions) -> Result<SyncOutcome> {
        let store = ManifestStore::new(&self.config.manifest_path);
        let mut entries = store.load()?;
        let scan = self.scan()?;

        let report = Reconciler::new(self.config.key_scope).reconcile(
            &mut entries,
            &scan.index,
            options.accept_shadows,
        );
        let stats = SyncStats::compute(&entries, &report);

        if options.dry_run {
            info!("Dry run, nothing written");
        } else {
            stats::write_stats(&self.config.stats_path, &stats)?;
            store.save(&entries)?;
            info!("Manifest updated: {}", store.path().display());
        }

        debug!(
            "Coverage {}% ({} automated, {} manual of {})",
            stats.coverage, stats.automated, stats.manual, stats.total_manifested
        );

        Ok(SyncOutcome {
            report,
            stats,
            files_scanned: scan.files_scanned,
            unidentified_tests: scan.unidentified_tests,
        })
    }
}

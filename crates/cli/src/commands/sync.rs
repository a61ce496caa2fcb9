//! Sync Command

use anyhow::Result;
use clap::Args;
use serde::Serialize;
use std::path::PathBuf;
use tcsync_engine::{SyncConfig, SyncOptions, SyncOutcome, SyncRunner, SyncStats};

use crate::output::{print_error, print_info, print_pairs, print_success, print_value, print_warning, OutputFormat};

#[derive(Args)]
pub struct SyncArgs {
    /// Manifest file, overrides `manifest_path`
    #[arg(long)]
    pub manifest: Option<PathBuf>,

    /// Root directory to scan, overrides `tests_dir`
    #[arg(long)]
    pub tests_dir: Option<PathBuf>,

    /// Statistics output file, overrides `stats_path`
    #[arg(long)]
    pub stats: Option<PathBuf>,

    /// Report what would change without writing anything
    #[arg(long)]
    pub dry_run: bool,

    /// Add shadow tests to the manifest instead of failing
    #[arg(long)]
    pub accept_shadows: bool,
}

/// Machine-readable run result
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SyncSummary<'a> {
    stats: &'a SyncStats,
    updated: Vec<UpdatedEntry>,
    promoted: Vec<String>,
    files_scanned: usize,
    unidentified_tests: usize,
    dry_run: bool,
}

#[derive(Serialize)]
struct UpdatedEntry {
    key: String,
    fields: Vec<&'static str>,
}

pub fn execute(args: SyncArgs, mut config: SyncConfig, format: OutputFormat) -> Result<i32> {
    if let Some(path) = args.manifest {
        config.manifest_path = path;
    }
    if let Some(dir) = args.tests_dir {
        config.tests_dir = dir;
    }
    if let Some(path) = args.stats {
        config.stats_path = path;
    }

    let options = SyncOptions {
        dry_run: args.dry_run,
        accept_shadows: args.accept_shadows,
    };
    let runner = SyncRunner::new(config)?;
    let outcome = runner.run(options)?;

    if format.is_table() {
        print_report(&outcome, options);
    } else {
        print_value(
            &SyncSummary {
                stats: &outcome.stats,
                updated: outcome
                    .report
                    .updates
                    .iter()
                    .map(|u| UpdatedEntry {
                        key: u.key.to_string(),
                        fields: u.fields.clone(),
                    })
                    .collect(),
                promoted: outcome.report.promoted.iter().map(ToString::to_string).collect(),
                files_scanned: outcome.files_scanned,
                unidentified_tests: outcome.unidentified_tests,
                dry_run: options.dry_run,
            },
            format,
        );
    }

    Ok(outcome.exit_code())
}

fn print_report(outcome: &SyncOutcome, options: SyncOptions) {
    let report = &outcome.report;
    let stats = &outcome.stats;

    for update in &report.updates {
        print_info(&format!("[UPDATE] {}: {}", update.key, update.fields.join(", ")));
    }
    for key in &report.promoted {
        print_info(&format!("[ADDED] {key}"));
    }
    if !report.orphans.is_empty() {
        print_warning(&format!(
            "Orphaned tests (in the manifest, not found in code): {}",
            stats.orphaned_tests.join(", ")
        ));
    }

    if options.dry_run {
        print_success("Dry run complete, nothing written");
    } else {
        print_success("Sync Complete!");
    }
    print_pairs(&[
        ("Files scanned", outcome.files_scanned.to_string()),
        ("Total manifested", stats.total_manifested.to_string()),
        ("Automated", stats.automated.to_string()),
        ("Manual", stats.manual.to_string()),
        ("Coverage", format!("{}%", stats.coverage)),
        ("Shadow tests", stats.shadow_count.to_string()),
        ("Orphaned tests", stats.orphan_count.to_string()),
        ("Without identifier", outcome.unidentified_tests.to_string()),
        ("Timestamp", stats.timestamp.clone()),
    ]);

    if report.has_unresolved_shadows() {
        print_error("Shadow Tests Detected!");
        print_error("The following tests exist in code but are NOT registered in the manifest:");
        print_error(&stats.shadow_tests.join(", "));
        print_error("Action Required: register the shadow tests in the manifest or rerun with --accept-shadows.");
    }
}

//! Scan Command

use anyhow::Result;
use clap::Args;
use serde::Serialize;
use std::path::PathBuf;
use tcsync_common::CodeMetadata;
use tcsync_engine::{SyncConfig, SyncRunner};

use crate::output::{print_info, print_list, OutputFormat, TableDisplay};

#[derive(Args)]
pub struct ScanArgs {
    /// Root directory to scan, overrides `tests_dir`
    #[arg(long)]
    pub tests_dir: Option<PathBuf>,
}

/// One discovered test, flattened for display
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DiscoveredTest {
    pub key: String,
    #[serde(flatten)]
    pub meta: CodeMetadata,
}

impl TableDisplay for DiscoveredTest {
    fn headers() -> Vec<&'static str> {
        vec!["ID", "File", "Title", "Bug", "Priority", "Tags", "Automation"]
    }

    fn row(&self) -> Vec<String> {
        vec![
            self.meta.test_id.clone(),
            self.meta.test_file.clone(),
            self.meta.title.clone(),
            self.meta.bug_id.clone().unwrap_or_default(),
            self.meta.priority.clone().unwrap_or_default(),
            self.meta.tags.as_deref().unwrap_or_default().join(" "),
            self.meta.automation.to_string(),
        ]
    }
}

pub fn execute(args: ScanArgs, mut config: SyncConfig, format: OutputFormat) -> Result<i32> {
    if let Some(dir) = args.tests_dir {
        config.tests_dir = dir;
    }

    let runner = SyncRunner::new(config)?;
    let summary = runner.scan()?;

    let tests: Vec<DiscoveredTest> = summary
        .index
        .into_iter()
        .map(|(key, meta)| DiscoveredTest {
            key: key.to_string(),
            meta,
        })
        .collect();

    print_list(&tests, format);
    if format.is_table() {
        print_info(&format!(
            "{} tests in {} files, {} declarations without an identifier",
            tests.len(),
            summary.files_scanned,
            summary.unidentified_tests
        ));
    }

    Ok(0)
}

//! End-to-end sync runs against temporary test trees

use std::fs;
use std::path::PathBuf;
use tcsync_common::{Automation, Error, ManifestEntry, TestKey};
use tcsync_engine::{ManifestStore, SyncConfig, SyncOptions, SyncRunner, SyncStats};
use tempfile::TempDir;

struct Workspace {
    _dir: TempDir,
    root: PathBuf,
    config: SyncConfig,
}

impl Workspace {
    fn new() -> Self {
        let dir = TempDir::new().unwrap();
        let root = dir.path().to_path_buf();
        fs::create_dir_all(root.join("tests")).unwrap();
        let config = SyncConfig {
            manifest_path: root.join("tests.yml"),
            tests_dir: root.join("tests"),
            stats_path: root.join("summary-stats.json"),
            ..Default::default()
        };
        Self { _dir: dir, root, config }
    }

    fn source(&self, relative: &str, content: &str) -> &Self {
        let path = self.root.join("tests").join(relative);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
        self
    }

    fn manifest(&self, content: &str) -> &Self {
        fs::write(&self.config.manifest_path, content).unwrap();
        self
    }

    fn manifest_text(&self) -> String {
        fs::read_to_string(&self.config.manifest_path).unwrap()
    }

    fn entries(&self) -> Vec<ManifestEntry> {
        ManifestStore::new(&self.config.manifest_path).load().unwrap()
    }

    fn written_stats(&self) -> SyncStats {
        serde_json::from_str(&fs::read_to_string(&self.config.stats_path).unwrap()).unwrap()
    }

    fn runner(&self) -> SyncRunner {
        SyncRunner::new(self.config.clone()).unwrap()
    }
}

const LOGIN_SPEC: &str = r#"
import { test, expect } from '@playwright/test';

test.describe('Login', () => {
    /**
     * Invalid credentials are rejected
     * @jira SHOP-1234
     * @priority P0
     * @feature authentication
     */
    test('TC-001: Verify Invalid Login Shows Error Message', { tag: ['@regression', '@auth'] }, async ({ page }) => {
        await page.fill('#user', 'nobody');
        await expect(page.locator('.error')).toBeVisible();
    });

    // @skip
    test('TC-002: Remember me', async ({ page }) => {
        await page.check('#remember');
    });
});
"#;

#[test]
fn sync_is_idempotent() {
    let ws = Workspace::new();
    ws.source("endUser/login.spec.ts", LOGIN_SPEC).manifest(
        r#"
- testId: TC-001
  testFile: endUser/login.spec.ts
  owner: qa-team
- testId: TC-002
  testFile: endUser/login.spec.ts
"#,
    );

    let first = ws.runner().run(SyncOptions::default()).unwrap();
    assert!(!first.report.updates.is_empty());
    assert_eq!(first.exit_code(), 0);
    let manifest_after_first = ws.manifest_text();

    let second = ws.runner().run(SyncOptions::default()).unwrap();
    assert!(second.report.updates.is_empty());
    assert_eq!(ws.manifest_text(), manifest_after_first);
    assert!(second.stats.same_counts(&first.stats));

    let entries = ws.entries();
    let invalid = &entries[0];
    assert_eq!(invalid.title, "Verify Invalid Login Shows Error Message");
    assert_eq!(invalid.bug_id.as_deref(), Some("SHOP-1234"));
    assert_eq!(invalid.priority.as_deref(), Some("P0"));
    assert_eq!(invalid.feature.as_deref(), Some("authentication"));
    assert_eq!(invalid.description.as_deref(), Some("Invalid credentials are rejected"));
    assert_eq!(
        invalid.expected_result.as_deref(),
        Some("expect(page.locator('.error')).toBeVisible()")
    );
    assert!(invalid.is_automated);
    assert!(invalid.extra.contains_key("owner"));

    let remember = &entries[1];
    assert!(remember.is_skipped);
    assert_eq!(remember.automation, Automation::Manual);
}

#[test]
fn shadow_test_fails_the_run_but_still_writes() {
    let mut ws = Workspace::new();
    ws.config.file_extensions = vec![".spec".to_string()];
    ws.source("a.spec", "test('TC-010: new test', async () => {});\n")
        .manifest("[]\n");

    let outcome = ws.runner().run(SyncOptions::default()).unwrap();
    assert_eq!(outcome.report.shadows, vec![TestKey::new("a.spec", "TC-010")]);
    assert_eq!(outcome.exit_code(), 1);

    let stats = ws.written_stats();
    assert_eq!(stats.shadow_count, 1);
    assert_eq!(stats.shadow_tests, vec!["a.spec::TC-010"]);
    assert!(ws.entries().is_empty());
}

#[test]
fn accepting_shadows_adds_them_to_the_manifest() {
    let mut ws = Workspace::new();
    ws.config.file_extensions = vec![".spec".to_string()];
    ws.source("a.spec", "test('TC-010: new test', async () => {});\n")
        .manifest("[]\n");

    let outcome = ws
        .runner()
        .run(SyncOptions {
            accept_shadows: true,
            ..Default::default()
        })
        .unwrap();
    assert_eq!(outcome.exit_code(), 0);
    assert_eq!(outcome.report.promoted, vec![TestKey::new("a.spec", "TC-010")]);

    let entries = ws.entries();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].title, "new test");
    assert!(entries[0].is_automated);
}

#[test]
fn orphan_only_warns() {
    let mut ws = Workspace::new();
    ws.config.file_extensions = vec![".spec".to_string()];
    ws.manifest("- testId: TC-020\n  testFile: b.spec\n  isAutomated: true\n");

    let outcome = ws.runner().run(SyncOptions::default()).unwrap();
    assert_eq!(outcome.report.orphans, vec![TestKey::new("b.spec", "TC-020")]);
    assert_eq!(outcome.exit_code(), 0);
    assert_eq!(ws.written_stats().orphaned_tests, vec!["b.spec::TC-020"]);
    assert!(!ws.entries()[0].is_automated);
}

#[test]
fn coverage_counts_automated_and_skipped() {
    let ws = Workspace::new();

    let mut source = String::new();
    let mut manifest = String::new();
    for n in 1..=10 {
        match n {
            1..=6 => source.push_str(&format!("test('TC-{n}: runs', async () => {{}});\n")),
            7..=8 => source.push_str(&format!("test.skip('TC-{n}: parked', async () => {{}});\n")),
            _ => {}
        }
        manifest.push_str(&format!("- testId: TC-{n}\n  testFile: suite.spec.ts\n"));
    }
    ws.source("suite.spec.ts", &source).manifest(&manifest);

    let outcome = ws.runner().run(SyncOptions::default()).unwrap();
    assert_eq!(outcome.stats.total_manifested, 10);
    assert_eq!(outcome.stats.automated, 6);
    assert_eq!(outcome.stats.manual, 2);
    assert_eq!(outcome.stats.coverage, "60.00");
    assert_eq!(outcome.stats.orphan_count, 2);
    assert_eq!(outcome.exit_code(), 0);
}

#[test]
fn skipped_suite_makes_tests_manual() {
    let ws = Workspace::new();
    ws.source(
        "suite.spec.ts",
        r#"
test.describe.skip('parked suite', () => {
    test('TC-030: waits for backend', async ({ page }) => {
        const data = { nested: { value: '}' } };
    });
});
"#,
    )
    .manifest("- testId: TC-030\n  testFile: suite.spec.ts\n");

    ws.runner().run(SyncOptions::default()).unwrap();
    let entries = ws.entries();
    let entry = &entries[0];
    assert!(entry.is_skipped);
    assert_eq!(entry.automation, Automation::Manual);
}

#[test]
fn tag_order_does_not_cause_an_update() {
    let ws = Workspace::new();
    ws.source(
        "tags.spec.ts",
        "test('TC-7: tagged', { tag: ['@smoke', '@auth'] }, async () => {});\n",
    )
    .manifest(
        r#"
- testId: TC-7
  testFile: tags.spec.ts
  title: tagged
  tags: ["@auth", "@smoke"]
  automation: ui
  isAutomated: true
"#,
    );

    let outcome = ws.runner().run(SyncOptions::default()).unwrap();
    assert!(outcome.report.updates.is_empty());
    assert_eq!(
        ws.entries()[0].tags,
        Some(vec!["@auth".to_string(), "@smoke".to_string()])
    );
}

#[test]
fn separated_comment_block_is_not_a_description() {
    let ws = Workspace::new();
    ws.source(
        "sep.spec.ts",
        r#"
/**
 * Helpers shared by the checkout tests
 */

const cart = createCart();
test('TC-41: checkout', async () => {});
"#,
    )
    .manifest("- testId: TC-41\n  testFile: sep.spec.ts\n  description: stale\n");

    ws.runner().run(SyncOptions::default()).unwrap();
    assert_eq!(ws.entries()[0].description, None);
}

#[test]
fn mapping_manifest_aborts_without_writes() {
    let ws = Workspace::new();
    ws.source("a.spec.ts", "test('TC-1: a', async () => {});\n")
        .manifest("tests:\n  - testId: TC-1\n");

    let err = ws.runner().run(SyncOptions::default()).unwrap_err();
    assert!(matches!(err, Error::ManifestShape { .. }));
    assert_eq!(ws.manifest_text(), "tests:\n  - testId: TC-1\n");
    assert!(!ws.config.stats_path.exists());
}

#[test]
fn dry_run_writes_nothing() {
    let ws = Workspace::new();
    ws.source("a.spec.ts", "test('TC-1: renamed', async () => {});\n")
        .manifest("- testId: TC-1\n  testFile: a.spec.ts\n  title: old\n");

    let outcome = ws
        .runner()
        .run(SyncOptions {
            dry_run: true,
            ..Default::default()
        })
        .unwrap();
    assert_eq!(outcome.report.updates.len(), 1);
    assert_eq!(ws.entries()[0].title, "old");
    assert!(!ws.config.stats_path.exists());
}

#[test]
fn scan_reports_files_and_unidentified_tests() {
    let ws = Workspace::new();
    ws.source("a.spec.ts", "test('TC-1: a', () => {});\ntest('no id', () => {});\n")
        .source("nested/b.test.js", "it('TC-2: b', () => {});\n")
        .source("pages/LoginPage.ts", "test('TC-3: not a test file', () => {});\n");

    let summary = ws.runner().scan().unwrap();
    assert_eq!(summary.files_scanned, 2);
    assert_eq!(summary.unidentified_tests, 1);
    let keys: Vec<String> = summary.index.keys().map(ToString::to_string).collect();
    assert_eq!(keys, vec!["a.spec.ts::TC-1", "nested/b.test.js::TC-2"]);
}

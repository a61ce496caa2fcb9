//! Reconciliation of the manifest against scanned code
//!
//! Code is the source of truth for metadata of tests it contains; the
//! manifest is the source of truth for which tests exist.

use std::collections::BTreeSet;
use tcsync_common::{CodeMetadata, KeyScope, ManifestEntry, ScanIndex, TestKey};
use tracing::{debug, info, warn};

/// Fields changed on one manifest entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryUpdate {
    pub key: TestKey,
    /// Manifest field names, e.g. `title`, `isAutomated`
    pub fields: Vec<&'static str>,
}

/// Outcome of one reconciliation
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconcileReport {
    pub updates: Vec<EntryUpdate>,

    /// In code, absent from the manifest, not promoted
    pub shadows: Vec<TestKey>,

    /// In the manifest, absent from code
    pub orphans: Vec<TestKey>,

    /// Shadows appended to the manifest on request
    pub promoted: Vec<TestKey>,
}

impl ReconcileReport {
    pub fn has_unresolved_shadows(&self) -> bool {
        !self.shadows.is_empty()
    }
}

/// Applies a ScanIndex to manifest entries
pub struct Reconciler {
    scope: KeyScope,
}

impl Reconciler {
    pub fn new(scope: KeyScope) -> Self {
        Self { scope }
    }

    /// Bring `entries` in line with `index`
    ///
    /// Entries are never removed. With `accept_shadows`, tests missing from
    /// the manifest are appended in key order instead of being reported.
    pub fn reconcile(
        &self,
        entries: &mut Vec<ManifestEntry>,
        index: &ScanIndex,
        accept_shadows: bool,
    ) -> ReconcileReport {
        let mut report = ReconcileReport::default();
        let mut orphans = BTreeSet::new();

        for entry in entries.iter_mut() {
            let key = entry.key(self.scope);
            let fields = match index.get(&key) {
                Some(meta) => self.sync_entry(entry, meta),
                None => {
                    orphans.insert(key.clone());
                    let mut fields = Vec::new();
                    set(&mut entry.is_automated, false, "isAutomated", &mut fields);
                    fields
                }
            };

            if !fields.is_empty() {
                info!("Updated {}: {}", key, fields.join(", "));
                report.updates.push(EntryUpdate { key, fields });
            }
        }

        let known: BTreeSet<TestKey> = entries.iter().map(|e| e.key(self.scope)).collect();
        for (key, meta) in index {
            if known.contains(key) {
                continue;
            }
            if accept_shadows {
                info!("Adding {} to the manifest", key);
                entries.push(ManifestEntry::from_metadata(meta));
                report.promoted.push(key.clone());
            } else {
                warn!("Shadow test {} is not in the manifest", key);
                report.shadows.push(key.clone());
            }
        }

        for key in &orphans {
            warn!("Orphaned test {} has no code", key);
        }
        report.orphans = orphans.into_iter().collect();

        debug!(
            "Reconciled: {} updated, {} shadows, {} orphans, {} promoted",
            report.updates.len(),
            report.shadows.len(),
            report.orphans.len(),
            report.promoted.len()
        );
        report
    }

    /// Overwrite the code-owned fields of `entry`, returning what changed
    fn sync_entry(&self, entry: &mut ManifestEntry, meta: &CodeMetadata) -> Vec<&'static str> {
        let mut fields = Vec::new();

        if self.scope == KeyScope::Global {
            set(&mut entry.test_file, meta.test_file.clone(), "testFile", &mut fields);
        }
        set(&mut entry.title, meta.title.clone(), "title", &mut fields);
        set(&mut entry.bug_id, meta.bug_id.clone(), "bugId", &mut fields);
        set(&mut entry.priority, meta.priority.clone(), "priority", &mut fields);
        set(&mut entry.feature, meta.feature.clone(), "feature", &mut fields);
        if !same_tags(entry.tags.as_deref(), meta.tags.as_deref()) {
            entry.tags = meta.tags.clone();
            fields.push("tags");
        }
        set(&mut entry.is_skipped, meta.is_skipped, "isSkipped", &mut fields);
        set(&mut entry.automation, meta.automation, "automation", &mut fields);
        set(&mut entry.description, meta.description.clone(), "description", &mut fields);
        set(
            &mut entry.expected_result,
            meta.expected_result.clone(),
            "expectedResult",
            &mut fields,
        );
        set(&mut entry.is_automated, true, "isAutomated", &mut fields);

        fields
    }
}

fn set<T: PartialEq>(slot: &mut T, value: T, name: &'static str, changed: &mut Vec<&'static str>) {
    if *slot != value {
        *slot = value;
        changed.push(name);
    }
}

/// Tag lists compare as sets; an empty list equals no list
fn same_tags(current: Option<&[String]>, scanned: Option<&[String]>) -> bool {
    fn sorted(tags: Option<&[String]>) -> Vec<&String> {
        let mut tags: Vec<&String> = tags.unwrap_or_default().iter().collect();
        tags.sort();
        tags.dedup();
        tags
    }
    sorted(current) == sorted(scanned)
}

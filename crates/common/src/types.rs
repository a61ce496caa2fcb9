//! Core types for tcsync

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// How a test is exercised
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Automation {
    Ui,
    Manual,
}

impl Automation {
    /// Skipped tests count as manual, everything else runs through the UI
    pub fn from_skipped(is_skipped: bool) -> Self {
        if is_skipped {
            Automation::Manual
        } else {
            Automation::Ui
        }
    }
}

impl Default for Automation {
    fn default() -> Self {
        Self::Manual
    }
}

impl std::fmt::Display for Automation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Automation::Ui => write!(f, "ui"),
            Automation::Manual => write!(f, "manual"),
        }
    }
}

/// Uniqueness scope for test identifiers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KeyScope {
    /// `(testFile, testId)` composite key
    #[default]
    File,
    /// Identifier alone, as in older manifests without `testFile`
    Global,
}

impl KeyScope {
    /// Build the key for a test under this scope
    pub fn key(&self, file: &str, id: &str) -> TestKey {
        match self {
            KeyScope::File => TestKey::new(file, id),
            KeyScope::Global => TestKey::new("", id),
        }
    }
}

/// Composite key identifying one test across manifest and code
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TestKey {
    pub file: String,
    pub id: String,
}

impl TestKey {
    pub fn new(file: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            file: file.into(),
            id: id.into(),
        }
    }
}

impl std::fmt::Display for TestKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.file.is_empty() {
            write!(f, "{}", self.id)
        } else {
            write!(f, "{}::{}", self.file, self.id)
        }
    }
}

/// One declared test case in the manifest
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ManifestEntry {
    #[serde(alias = "test_id")]
    pub test_id: String,

    #[serde(default, alias = "test_file")]
    pub test_file: String,

    #[serde(default)]
    pub title: String,

    #[serde(default, alias = "bug_id")]
    pub bug_id: Option<String>,

    #[serde(default)]
    pub priority: Option<String>,

    #[serde(default, alias = "type")]
    pub feature: Option<String>,

    #[serde(default)]
    pub tags: Option<Vec<String>>,

    #[serde(default, alias = "is_skipped")]
    pub is_skipped: bool,

    #[serde(default)]
    pub automation: Automation,

    #[serde(default)]
    pub description: Option<String>,

    #[serde(default, alias = "expected_result")]
    pub expected_result: Option<String>,

    #[serde(default, alias = "is_automated")]
    pub is_automated: bool,

    /// Keys this tool does not manage, carried through untouched
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_yaml::Value>,
}

impl ManifestEntry {
    /// Key of this entry under the given scope
    pub fn key(&self, scope: KeyScope) -> TestKey {
        scope.key(&self.test_file, &self.test_id)
    }

    /// Promote a discovered test into a manifest entry
    pub fn from_metadata(meta: &CodeMetadata) -> Self {
        Self {
            test_id: meta.test_id.clone(),
            test_file: meta.test_file.clone(),
            title: meta.title.clone(),
            bug_id: meta.bug_id.clone(),
            priority: meta.priority.clone(),
            feature: meta.feature.clone(),
            tags: meta.tags.clone(),
            is_skipped: meta.is_skipped,
            automation: meta.automation,
            description: meta.description.clone(),
            expected_result: meta.expected_result.clone(),
            is_automated: true,
            extra: BTreeMap::new(),
        }
    }
}

/// Metadata extracted from source for a single test declaration
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CodeMetadata {
    pub test_id: String,
    pub test_file: String,
    pub title: String,
    pub bug_id: Option<String>,
    pub priority: Option<String>,
    pub feature: Option<String>,
    pub tags: Option<Vec<String>>,
    pub is_skipped: bool,
    pub automation: Automation,
    pub description: Option<String>,
    pub expected_result: Option<String>,
}

impl CodeMetadata {
    /// Metadata with only the identity fields filled in
    pub fn new(test_file: impl Into<String>, test_id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            test_id: test_id.into(),
            test_file: test_file.into(),
            title: title.into(),
            bug_id: None,
            priority: None,
            feature: None,
            tags: None,
            is_skipped: false,
            automation: Automation::Ui,
            description: None,
            expected_result: None,
        }
    }
}

/// Everything discovered in code during one run, keyed by composite key
pub type ScanIndex = BTreeMap<TestKey, CodeMetadata>;

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case("a.spec", "TC-010", "a.spec::TC-010" ; "file scoped")]
    #[test_case("", "TC-010", "TC-010" ; "global")]
    fn test_key_display(file: &str, id: &str, expected: &str) {
        assert_eq!(TestKey::new(file, id).to_string(), expected);
    }

    #[test]
    fn test_global_scope_ignores_file() {
        let a = KeyScope::Global.key("a.spec.ts", "TC-1");
        let b = KeyScope::Global.key("b.spec.ts", "TC-1");
        assert_eq!(a, b);
        assert_ne!(KeyScope::File.key("a.spec.ts", "TC-1"), KeyScope::File.key("b.spec.ts", "TC-1"));
    }

    #[test]
    fn test_parse_legacy_entry() {
        let yaml = r#"
test_id: TC-001
title: Invalid login
isAutomated: false
owner: qa-team
"#;
        let entry: ManifestEntry = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(entry.test_id, "TC-001");
        assert_eq!(entry.test_file, "");
        assert_eq!(entry.automation, Automation::Manual);
        assert_eq!(
            entry.extra.get("owner"),
            Some(&serde_yaml::Value::String("qa-team".to_string()))
        );
    }

    #[test]
    fn test_entry_serializes_camel_case() {
        let mut meta = CodeMetadata::new("login.spec.ts", "TC-7", "Login works");
        meta.bug_id = Some("SHOP-1".to_string());
        let entry = ManifestEntry::from_metadata(&meta);

        let yaml = serde_yaml::to_string(&entry).unwrap();
        assert!(yaml.contains("testId: TC-7"));
        assert!(yaml.contains("testFile: login.spec.ts"));
        assert!(yaml.contains("bugId: SHOP-1"));
        assert!(yaml.contains("automation: ui"));
        assert!(yaml.contains("isAutomated: true"));
    }

    #[test]
    fn test_feature_accepts_type_alias() {
        let entry: ManifestEntry = serde_yaml::from_str("testId: TC-2\ntype: checkout\n").unwrap();
        assert_eq!(entry.feature.as_deref(), Some("checkout"));
    }

    #[test]
    fn test_automation_from_skipped() {
        assert_eq!(Automation::from_skipped(true), Automation::Manual);
        assert_eq!(Automation::from_skipped(false), Automation::Ui);
    }
}

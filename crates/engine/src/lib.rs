//! tcsync Engine
//!
//! Keeps a YAML test manifest in step with annotated JavaScript/TypeScript
//! test sources:
//! - Walks the scan root for test files
//! - Extracts identifiers and annotations per test declaration
//! - Reconciles extracted metadata into the manifest
//! - Reports shadow and orphaned tests and coverage statistics
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │  SyncRunner::run(options) -> SyncOutcome                    │
//! ├─────────────────────────────────────────────────────────────┤
//! │  ManifestStore::load()           tests.yml -> entries       │
//! │  walker::collect_sources()       tests/**/*.spec.ts         │
//! │  AnnotationExtractor::extract()  file -> FileScan           │
//! │    ├── tokenizer  (code / string / comment, brace bounds)   │
//! │    └── patterns   (declarations, annotations, doc blocks)   │
//! │  Reconciler::reconcile()         entries + ScanIndex        │
//! │  SyncStats::compute()            -> summary-stats.json      │
//! │  ManifestStore::save()           entries -> tests.yml       │
//! └─────────────────────────────────────────────────────────────┘
//! ```

pub mod config;
pub mod extractor;
pub mod manifest;
pub mod reconciler;
pub mod runner;
pub mod stats;
pub mod walker;

pub use config::SyncConfig;
pub use extractor::{AnnotationExtractor, FileScan};
pub use manifest::ManifestStore;
pub use reconciler::{EntryUpdate, ReconcileReport, Reconciler};
pub use runner::{ScanSummary, SyncOptions, SyncOutcome, SyncRunner};
pub use stats::SyncStats;

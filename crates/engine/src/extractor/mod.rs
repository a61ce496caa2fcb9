//! Annotation extractor
//!
//! Turns the raw text of one test source into per-test metadata. Matching is
//! regex based; the tokenizer decides which matches sit in code, which sit in
//! comments, and where suite and test bodies end.

pub mod patterns;
pub mod tokenizer;

use crate::config::SyncConfig;
use patterns::{Annotation, AnnotationKind, DocBlock, Patterns, RawDeclaration};
use std::collections::BTreeMap;
use tcsync_common::{Automation, CodeMetadata, Result};
use tokenizer::{Region, SourceMap};
use tracing::{debug, trace, warn};

/// Tests found in a single file
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FileScan {
    /// Identified tests by canonical identifier
    pub tests: BTreeMap<String, CodeMetadata>,

    /// Declarations whose title carries no identifier
    pub unidentified: usize,
}

/// A declaration located in code, with its resolved extent
struct Declaration {
    raw: RawDeclaration,
    id: Option<String>,
    /// `{` and `}` of the test function body
    body: Option<(usize, usize)>,
    suite: Option<usize>,
}

/// Annotations gathered for one declaration
#[derive(Default)]
struct Attached {
    bug_id: Option<String>,
    priority: Option<String>,
    feature: Option<String>,
    description: Option<String>,
    skip: bool,
}

/// Extracts test metadata from source text
pub struct AnnotationExtractor {
    patterns: Patterns,
    window: usize,
}

impl AnnotationExtractor {
    pub fn new(config: &SyncConfig) -> Result<Self> {
        Ok(Self {
            patterns: Patterns::new(&config.id_prefix)?,
            window: config.association_window,
        })
    }

    /// Extract every identified test declared in `src`
    ///
    /// `file` is the scan-root-relative path stored as `testFile`.
    pub fn extract(&self, file: &str, src: &str) -> FileScan {
        let map = SourceMap::new(src);
        let suites = skipped_suite_ranges(src, &map);

        let declarations: Vec<Declaration> = patterns::declarations(src)
            .into_iter()
            .filter(|raw| map.is_code(raw.start))
            .map(|raw| {
                let id = self.patterns.identifier(&raw.raw_title);
                let body = tokenizer::body_open(src, raw.title_end).map(|open| {
                    let close = tokenizer::block_end(src, open).unwrap_or(src.len());
                    (open, close)
                });
                let suite = suite_of(&suites, raw.start);
                Declaration { raw, id, body, suite }
            })
            .collect();

        let mut attached: Vec<Attached> = declarations.iter().map(|_| Attached::default()).collect();
        for annotation in patterns::annotations(src) {
            if !accepts(&map, &annotation) {
                continue;
            }
            let Some(index) = self.owner(&declarations, annotation.offset) else {
                trace!("{}: no test within reach of annotation at {}", file, annotation.offset);
                continue;
            };
            let declaration = &declarations[index];
            if declaration.id.is_none() {
                debug!(
                    "{}: dropped {:?} annotation, nearest test '{}' has no identifier",
                    file, annotation.kind, declaration.raw.raw_title
                );
                continue;
            }
            if suite_of(&suites, annotation.offset) != declaration.suite {
                debug!(
                    "{}: dropped {:?} annotation crossing a skipped suite boundary",
                    file, annotation.kind
                );
                continue;
            }
            attach(&mut attached[index], annotation);
        }

        let docs = patterns::doc_blocks(src, &map);

        let mut scan = FileScan::default();
        for (declaration, found) in declarations.iter().zip(attached) {
            let Some(id) = declaration.id.clone() else {
                trace!("{}: test without identifier: '{}'", file, declaration.raw.raw_title);
                scan.unidentified += 1;
                continue;
            };

            let doc = docs.iter().rev().find(|block| {
                block.end <= declaration.raw.start
                    && src[block.end..declaration.raw.start].trim().is_empty()
            });
            let meta = self.build(file, src, &map, declaration, id, found, doc);

            if let Some(previous) = scan.tests.insert(meta.test_id.clone(), meta) {
                warn!(
                    "Duplicate test id {} in {}, keeping the later declaration",
                    previous.test_id, file
                );
            }
        }

        debug!(
            "{}: {} identified, {} unidentified",
            file,
            scan.tests.len(),
            scan.unidentified
        );
        scan
    }

    /// Nearest declaration at or after `offset` that fits inside the window
    fn owner(&self, declarations: &[Declaration], offset: usize) -> Option<usize> {
        let index = declarations.iter().position(|d| d.raw.start >= offset)?;
        (declarations[index].raw.title_end <= offset + self.window).then_some(index)
    }

    #[allow(clippy::too_many_arguments)]
    fn build(
        &self,
        file: &str,
        src: &str,
        map: &SourceMap,
        declaration: &Declaration,
        id: String,
        found: Attached,
        doc: Option<&DocBlock>,
    ) -> CodeMetadata {
        let raw = &declaration.raw;
        let options_end = match declaration.body {
            Some((open, _)) => open,
            None => tokenizer::call_end(src, raw.title_end)
                .unwrap_or_else(|| floor_char_boundary(src, raw.title_end + self.window)),
        };

        let mut tags = patterns::option_tags(src, raw.title_end, options_end);
        if let Some(listed) = doc.and_then(|d| d.tag("tags")) {
            for tag in listed.split([',', ' ']).map(str::trim).filter(|t| !t.is_empty()) {
                let tag = if tag.starts_with('@') {
                    tag.to_string()
                } else {
                    format!("@{tag}")
                };
                if !tags.contains(&tag) {
                    tags.push(tag);
                }
            }
        }

        let description = doc
            .and_then(|d| d.tag("description").map(str::to_string).or_else(|| d.summary.clone()))
            .or(found.description);

        let expected_result = doc
            .and_then(|d| d.tag("expectedResult").or_else(|| d.tag("expected")))
            .map(str::to_string)
            .or_else(|| {
                declaration
                    .body
                    .and_then(|(open, close)| synthesize_expected(src, map, open + 1, close))
            });

        let is_skipped = raw.has_skip_marker() || found.skip || declaration.suite.is_some();

        CodeMetadata {
            test_id: id,
            test_file: file.to_string(),
            title: self.patterns.display_title(&raw.raw_title),
            bug_id: found.bug_id,
            priority: found.priority,
            feature: found.feature,
            tags: (!tags.is_empty()).then_some(tags),
            is_skipped,
            automation: Automation::from_skipped(is_skipped),
            description,
            expected_result,
        }
    }
}

/// Comment annotations only; the description fallback must be a `//` line
fn accepts(map: &SourceMap, annotation: &Annotation) -> bool {
    match annotation.kind {
        AnnotationKind::Description => map.region(annotation.offset) == Region::LineComment,
        _ => map.is_comment(annotation.offset),
    }
}

fn attach(found: &mut Attached, annotation: Annotation) {
    let value = Some(annotation.value).filter(|v| !v.is_empty());
    match annotation.kind {
        AnnotationKind::Bug => found.bug_id = value,
        AnnotationKind::Priority => found.priority = value,
        AnnotationKind::Feature => found.feature = value,
        AnnotationKind::Description => found.description = value,
        AnnotationKind::Skip => found.skip = true,
    }
}

/// `[start, end]` of every disabled suite that opens in code
fn skipped_suite_ranges(src: &str, map: &SourceMap) -> Vec<(usize, usize)> {
    patterns::skipped_suites(src)
        .into_iter()
        .filter(|(start, _)| map.is_code(*start))
        .filter_map(|(start, args)| {
            let open = tokenizer::body_open(src, args)?;
            let end = tokenizer::block_end(src, open).unwrap_or(src.len());
            Some((start, end))
        })
        .collect()
}

/// Innermost disabled suite containing `offset`
fn suite_of(suites: &[(usize, usize)], offset: usize) -> Option<usize> {
    suites
        .iter()
        .enumerate()
        .filter(|(_, (start, end))| *start <= offset && offset <= *end)
        .map(|(index, _)| index)
        .last()
}

fn synthesize_expected(src: &str, map: &SourceMap, from: usize, to: usize) -> Option<String> {
    let statements: Vec<String> = patterns::assertions(src, from, to)
        .into_iter()
        .filter(|offset| map.is_code(*offset))
        .map(|offset| {
            let end = tokenizer::statement_end(src, offset).min(to);
            patterns::clean_assertion(&src[offset..end])
        })
        .filter(|statement| !statement.is_empty())
        .collect();

    (!statements.is_empty()).then(|| statements.join("; "))
}

fn floor_char_boundary(src: &str, index: usize) -> usize {
    let mut index = index.min(src.len());
    while !src.is_char_boundary(index) {
        index -= 1;
    }
    index
}

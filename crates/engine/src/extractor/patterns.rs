//! Regular expressions for test declarations and annotations

use super::tokenizer::{Region, SourceMap};
use once_cell::sync::Lazy;
use regex::Regex;
use tcsync_common::{Error, Result};

/// `test(`, `it(`, `xit(` and their modifiers, followed by a quoted title
static DECLARATION: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r#"\b(test|it|xit)(?:\.(only|skip|fixme|fail|slow))?\s*\(\s*(?:'((?:[^'\\\n]|\\.)*)'|"((?:[^"\\\n]|\\.)*)"|`([^`]*)`)"#,
    )
    .unwrap()
});

/// Opening of a disabled suite
static SKIPPED_SUITE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b(?:(?:test\.)?describe(?:\.(?:serial|parallel))?\.(?:skip|fixme)|xdescribe)\s*\(").unwrap()
});

static BUG: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"@(?:jira|bug|issue)\b[ \t:]*([A-Za-z0-9][\w.#/-]*)").unwrap()
});

static PRIORITY: Lazy<Regex> = Lazy::new(|| Regex::new(r"@priority\b[ \t:]*([A-Za-z0-9][\w-]*)").unwrap());

static FEATURE: Lazy<Regex> = Lazy::new(|| Regex::new(r"@feature\b[ \t:]*([A-Za-z0-9][\w./-]*)").unwrap());

static SKIP_TAG: Lazy<Regex> = Lazy::new(|| Regex::new(r"@skip\b").unwrap());

static DESCRIPTION_LINE: Lazy<Regex> = Lazy::new(|| Regex::new(r"@description\b[ \t:]*([^\r\n]+)").unwrap());

static TAG_OPTION: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"\btag\s*:\s*(\[[^\]]*\]|'[^'\n]*'|"[^"\n]*")"#).unwrap()
});

static QUOTED: Lazy<Regex> = Lazy::new(|| Regex::new(r#"'([^']*)'|"([^"]*)"|`([^`]*)`"#).unwrap());

static ASSERTION: Lazy<Regex> = Lazy::new(|| Regex::new(r"\bexpect(?:\.soft|\.poll)?\s*\(").unwrap());

static AWAIT: Lazy<Regex> = Lazy::new(|| Regex::new(r"\bawait\s+").unwrap());

static WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());

static CHAIN_GAP: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+\.").unwrap());

/// Kind of free-standing annotation found in a comment
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnnotationKind {
    Bug,
    Priority,
    Feature,
    Skip,
    Description,
}

/// A free-standing annotation and where it was found
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Annotation {
    pub kind: AnnotationKind,
    pub offset: usize,
    pub value: String,
}

/// A test declaration as matched in source
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawDeclaration {
    pub start: usize,
    /// Offset just past the closing quote of the title
    pub title_end: usize,
    pub keyword: String,
    pub modifier: Option<String>,
    pub raw_title: String,
}

impl RawDeclaration {
    /// Declared as skipped through `test.skip(`, `test.fixme(` or `xit(`
    pub fn has_skip_marker(&self) -> bool {
        self.keyword == "xit" || matches!(self.modifier.as_deref(), Some("skip") | Some("fixme"))
    }
}

/// Patterns that depend on the configured identifier prefix
pub struct Patterns {
    id: Regex,
    prefix_title: Regex,
    suffix_title: Regex,
    prefix: String,
}

impl Patterns {
    /// Compile patterns for identifiers such as `TC-12`, `TC:12` or `@TC-12`
    pub fn new(id_prefix: &str) -> Result<Self> {
        let p = regex::escape(id_prefix.trim());
        let compile = |pattern: String| Regex::new(&pattern).map_err(|e| Error::Pattern(e.to_string()));

        Ok(Self {
            id: compile(format!(r"@?\b{p}[-:] ?(\d+)\b"))?,
            prefix_title: compile(format!(r"^\s*@?{p}[-:] ?\d+\b\s*[:\-–]?\s*"))?,
            suffix_title: compile(format!(r"\s*@?\b{p}[-:] ?\d+\s*$"))?,
            prefix: id_prefix.trim().to_string(),
        })
    }

    /// Canonical identifier embedded in a title, e.g. `TC:1 - x` gives `TC-1`
    pub fn identifier(&self, title: &str) -> Option<String> {
        let caps = self.id.captures(title)?;
        Some(format!("{}-{}", self.prefix, &caps[1]))
    }

    /// Display title with the identifier stripped from whichever end holds it
    pub fn display_title(&self, title: &str) -> String {
        let stripped = if self.prefix_title.is_match(title) {
            self.prefix_title.replace(title, "")
        } else {
            self.suffix_title.replace(title, "")
        };
        stripped.trim().to_string()
    }
}

/// All test declarations in source order
pub fn declarations(src: &str) -> Vec<RawDeclaration> {
    DECLARATION
        .captures_iter(src)
        .filter_map(|caps| {
            let whole = caps.get(0)?;
            if preceded_by_member_access(src, whole.start()) {
                return None;
            }
            let title = caps.get(3).or_else(|| caps.get(4)).or_else(|| caps.get(5))?;
            Some(RawDeclaration {
                start: whole.start(),
                title_end: whole.end(),
                keyword: caps[1].to_string(),
                modifier: caps.get(2).map(|m| m.as_str().to_string()),
                raw_title: unescape(title.as_str()),
            })
        })
        .collect()
}

/// `(start, arguments_start)` of each disabled suite opening
pub fn skipped_suites(src: &str) -> Vec<(usize, usize)> {
    SKIPPED_SUITE
        .find_iter(src)
        .filter(|m| !preceded_by_member_access(src, m.start()))
        .map(|m| (m.start(), m.end()))
        .collect()
}

/// Every free-standing annotation, unfiltered by region
pub fn annotations(src: &str) -> Vec<Annotation> {
    let kinds: [(&Regex, AnnotationKind); 5] = [
        (&*BUG, AnnotationKind::Bug),
        (&*PRIORITY, AnnotationKind::Priority),
        (&*FEATURE, AnnotationKind::Feature),
        (&*SKIP_TAG, AnnotationKind::Skip),
        (&*DESCRIPTION_LINE, AnnotationKind::Description),
    ];

    let mut found = Vec::new();
    for (regex, kind) in kinds {
        for caps in regex.captures_iter(src) {
            let Some(whole) = caps.get(0) else { continue };
            let value = caps
                .get(1)
                .map(|m| m.as_str().trim().to_string())
                .unwrap_or_default();
            found.push(Annotation {
                kind,
                offset: whole.start(),
                value,
            });
        }
    }

    found.sort_by_key(|a| a.offset);
    found
}

/// A `/** ... */` block split into free text and `@tag` sections
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DocBlock {
    pub start: usize,
    pub end: usize,
    pub summary: Option<String>,
    pub tags: Vec<(String, String)>,
}

impl DocBlock {
    /// Value of the last `@name` section
    pub fn tag(&self, name: &str) -> Option<&str> {
        self.tags
            .iter()
            .rev()
            .find(|(tag, _)| tag == name)
            .map(|(_, value)| value.as_str())
            .filter(|value| !value.is_empty())
    }
}

/// Every JSDoc block that opens a comment
///
/// `/**` inside string literals or inside another comment does not start a
/// block.
pub fn doc_blocks(src: &str, map: &SourceMap) -> Vec<DocBlock> {
    let mut blocks = Vec::new();
    let mut cursor = 0;

    while let Some(found) = src[cursor..].find("/**") {
        let start = cursor + found;
        let opens_comment = map.region(start) == Region::BlockComment
            && (start == 0 || !map.is_comment(start - 1) || src[..start].ends_with("*/"));
        if !opens_comment || src[start..].starts_with("/**/") {
            cursor = start + 3;
            continue;
        }

        let body_start = start + 3;
        let Some(close) = src[body_start..].find("*/") else {
            break;
        };
        let end = body_start + close + 2;
        let mut block = parse_doc_body(&src[body_start..body_start + close]);
        block.start = start;
        block.end = end;
        blocks.push(block);
        cursor = end;
    }

    blocks
}

fn parse_doc_body(body: &str) -> DocBlock {
    let mut summary: Vec<&str> = Vec::new();
    let mut tags: Vec<(String, Vec<&str>)> = Vec::new();

    for line in body.lines() {
        let line = line.trim().trim_start_matches('*').trim();
        if line.is_empty() {
            continue;
        }
        if let Some(rest) = line.strip_prefix('@') {
            let (name, value) = rest.split_once(char::is_whitespace).unwrap_or((rest, ""));
            tags.push((name.to_string(), vec![value.trim()]));
        } else if let Some((_, lines)) = tags.last_mut() {
            lines.push(line);
        } else {
            summary.push(line);
        }
    }

    DocBlock {
        start: 0,
        end: 0,
        summary: Some(join_lines(&summary)).filter(|s| !s.is_empty()),
        tags: tags
            .iter()
            .map(|(name, lines)| (name.clone(), join_lines(lines)))
            .collect(),
    }
}

fn join_lines(lines: &[&str]) -> String {
    let text = lines
        .iter()
        .filter(|l| !l.is_empty())
        .copied()
        .collect::<Vec<_>>()
        .join(" ");
    normalize_whitespace(&text)
}

/// Tags from a `tag: [...]` or `tag: '...'` option within `src[from..to]`
pub fn option_tags(src: &str, from: usize, to: usize) -> Vec<String> {
    let Some(head) = src.get(from..to) else {
        return Vec::new();
    };
    let Some(caps) = TAG_OPTION.captures(head) else {
        return Vec::new();
    };
    QUOTED
        .captures_iter(&caps[1])
        .filter_map(|q| q.get(1).or_else(|| q.get(2)).or_else(|| q.get(3)))
        .map(|m| m.as_str().trim().to_string())
        .filter(|tag| !tag.is_empty())
        .collect()
}

/// Offsets of `expect(` assertions within `src[from..to]`
pub fn assertions(src: &str, from: usize, to: usize) -> Vec<usize> {
    let Some(body) = src.get(from..to) else {
        return Vec::new();
    };
    ASSERTION.find_iter(body).map(|m| from + m.start()).collect()
}

/// Collapse whitespace and drop `await` from an assertion statement
pub fn clean_assertion(statement: &str) -> String {
    let without_await = AWAIT.replace_all(statement, "");
    let joined = CHAIN_GAP.replace_all(without_await.trim().trim_end_matches(';'), ".");
    normalize_whitespace(&joined)
}

pub fn normalize_whitespace(text: &str) -> String {
    WHITESPACE.replace_all(text.trim(), " ").into_owned()
}

fn preceded_by_member_access(src: &str, start: usize) -> bool {
    src[..start].trim_end().ends_with('.')
}

fn unescape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars();
    while let Some(c) = chars.next() {
        if c == '\\' {
            if let Some(next) = chars.next() {
                out.push(next);
            }
        } else {
            out.push(c);
        }
    }
    out
}

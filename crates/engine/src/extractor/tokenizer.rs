//! Position-tracking tokenizer for JavaScript/TypeScript test sources
//!
//! This is not a parser. It walks bytes and tracks just enough state to tell
//! code apart from string literals and comments and to know how deep inside
//! parentheses the current byte sits. Brace matching and statement bounds
//! are built on top of it.

/// What a byte belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Region {
    Code,
    SingleQuote,
    DoubleQuote,
    Template,
    LineComment,
    BlockComment,
}

impl Region {
    pub fn is_string(self) -> bool {
        matches!(self, Region::SingleQuote | Region::DoubleQuote | Region::Template)
    }

    pub fn is_comment(self) -> bool {
        matches!(self, Region::LineComment | Region::BlockComment)
    }
}

/// One classified byte
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token {
    pub offset: usize,
    pub byte: u8,
    pub region: Region,
    /// Open parentheses before this byte, relative to where the walk started
    pub paren_depth: usize,
}

/// Byte walker with string/comment/parenthesis state
pub struct Tokenizer<'a> {
    bytes: &'a [u8],
    pos: usize,
    region: Region,
    paren_depth: usize,
    escaped: bool,
    closing_block: bool,
}

impl<'a> Tokenizer<'a> {
    pub fn new(src: &'a str) -> Self {
        Self::at(src, 0)
    }

    /// Start walking at `offset`, assumed to be in code at parenthesis depth 0
    pub fn at(src: &'a str, offset: usize) -> Self {
        Self {
            bytes: src.as_bytes(),
            pos: offset,
            region: Region::Code,
            paren_depth: 0,
            escaped: false,
            closing_block: false,
        }
    }

    fn peek(&self, ahead: usize) -> Option<u8> {
        self.bytes.get(self.pos + ahead).copied()
    }
}

impl Iterator for Tokenizer<'_> {
    type Item = Token;

    fn next(&mut self) -> Option<Token> {
        let byte = *self.bytes.get(self.pos)?;
        let offset = self.pos;
        let paren_depth = self.paren_depth;

        let region = match self.region {
            Region::Code => match byte {
                b'/' if self.peek(1) == Some(b'/') => {
                    self.region = Region::LineComment;
                    Region::LineComment
                }
                b'/' if self.peek(1) == Some(b'*') => {
                    self.region = Region::BlockComment;
                    // skip the `*` so `/*/` does not close immediately
                    self.pos += 1;
                    Region::BlockComment
                }
                b'\'' => {
                    self.region = Region::SingleQuote;
                    Region::SingleQuote
                }
                b'"' => {
                    self.region = Region::DoubleQuote;
                    Region::DoubleQuote
                }
                b'`' => {
                    self.region = Region::Template;
                    Region::Template
                }
                b'(' => {
                    self.paren_depth += 1;
                    Region::Code
                }
                b')' => {
                    self.paren_depth = self.paren_depth.saturating_sub(1);
                    Region::Code
                }
                _ => Region::Code,
            },
            Region::SingleQuote | Region::DoubleQuote | Region::Template => {
                let current = self.region;
                if self.escaped {
                    self.escaped = false;
                } else if byte == b'\\' {
                    self.escaped = true;
                } else if (byte == b'\'' && current == Region::SingleQuote)
                    || (byte == b'"' && current == Region::DoubleQuote)
                    || (byte == b'`' && current == Region::Template)
                {
                    self.region = Region::Code;
                } else if byte == b'\n' && current != Region::Template {
                    // unterminated literal, recover at end of line
                    self.region = Region::Code;
                    self.pos += 1;
                    return Some(Token {
                        offset,
                        byte,
                        region: Region::Code,
                        paren_depth,
                    });
                }
                current
            }
            Region::LineComment => {
                if byte == b'\n' {
                    self.region = Region::Code;
                    Region::Code
                } else {
                    Region::LineComment
                }
            }
            Region::BlockComment => {
                if self.closing_block {
                    self.closing_block = false;
                    self.region = Region::Code;
                } else if byte == b'*' && self.peek(1) == Some(b'/') {
                    self.closing_block = true;
                }
                Region::BlockComment
            }
        };

        self.pos += 1;
        Some(Token {
            offset,
            byte,
            region,
            paren_depth,
        })
    }
}

/// Region of every byte in a source file
pub struct SourceMap {
    regions: Vec<Region>,
}

impl SourceMap {
    pub fn new(src: &str) -> Self {
        let mut regions = vec![Region::Code; src.len()];
        for token in Tokenizer::new(src) {
            regions[token.offset] = token.region;
        }
        // the `*` of an opening `/*` is skipped by the walker
        for i in 1..regions.len() {
            if regions[i - 1] == Region::BlockComment
                && src.as_bytes()[i - 1] == b'/'
                && src.as_bytes()[i] == b'*'
            {
                regions[i] = Region::BlockComment;
            }
        }
        Self { regions }
    }

    pub fn region(&self, offset: usize) -> Region {
        self.regions.get(offset).copied().unwrap_or(Region::Code)
    }

    pub fn is_code(&self, offset: usize) -> bool {
        self.region(offset) == Region::Code
    }

    pub fn is_comment(&self, offset: usize) -> bool {
        self.region(offset).is_comment()
    }
}

/// Offset of the `}` closing the `{` at `open`
///
/// Depth starts at 1 on the opening brace. Braces in strings, comments, or
/// inside parentheses opened after `open` are not counted, so destructured
/// parameters such as `async ({ page }) =>` cannot unbalance the count.
pub fn block_end(src: &str, open: usize) -> Option<usize> {
    let mut depth = 1usize;
    for token in Tokenizer::at(src, open + 1) {
        if token.region != Region::Code || token.paren_depth != 0 {
            continue;
        }
        match token.byte {
            b'{' => depth += 1,
            b'}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(token.offset);
                }
            }
            _ => {}
        }
    }
    None
}

/// Offset of the function-body `{` of a call whose arguments start at `from`
///
/// The body brace is the first top-level `{` following `=>` or `)`. Object
/// literals such as `{ tag: [...] }` follow a comma and are passed over.
/// Returns `None` once the call's own closing parenthesis is reached.
pub fn body_open(src: &str, from: usize) -> Option<usize> {
    let mut prev = [b' ', b' '];
    for token in Tokenizer::at(src, from) {
        if token.region.is_comment() {
            continue;
        }
        if token.region.is_string() {
            prev = [prev[1], b'"'];
            continue;
        }
        if token.paren_depth == 0 {
            match token.byte {
                b')' => return None,
                b'{' if prev[1] == b')' || prev == [b'=', b'>'] => return Some(token.offset),
                _ => {}
            }
        }
        if !token.byte.is_ascii_whitespace() {
            prev = [prev[1], token.byte];
        }
    }
    None
}

/// Offset of the `)` closing a call whose arguments start at `from`
pub fn call_end(src: &str, from: usize) -> Option<usize> {
    Tokenizer::at(src, from)
        .find(|token| token.region == Region::Code && token.paren_depth == 0 && token.byte == b')')
        .map(|token| token.offset)
}

/// End (exclusive) of the statement starting at `from`
///
/// Stops at a top-level `;`, at a bracket closing the enclosing scope, or at
/// a newline not followed by a `.` chain continuation.
pub fn statement_end(src: &str, from: usize) -> usize {
    let bytes = src.as_bytes();
    for token in Tokenizer::at(src, from) {
        if token.region != Region::Code || token.paren_depth != 0 {
            continue;
        }
        match token.byte {
            b';' | b'}' | b')' => return token.offset,
            b'\n' => {
                let next = bytes[token.offset..]
                    .iter()
                    .copied()
                    .find(|b| !b.is_ascii_whitespace());
                if next != Some(b'.') {
                    return token.offset;
                }
            }
            _ => {}
        }
    }
    src.len()
}

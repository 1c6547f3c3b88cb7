//! The tokenizing state machine.
//!
//! Turns a character stream into an ordered token sequence honoring YAML's
//! block/flow duality and indentation rules.
//!
//! Responsibilities
//! - Track context: a `flow_level` counter (0 = block context) and an
//!   indentation stack; block context compares columns to emit
//!   BLOCK-SEQUENCE-START / BLOCK-MAPPING-START / BLOCK-END tokens.
//! - Dispatch by lookahead character to the per-construct sub-scanners.
//! - Track simple-key candidates per flow level so a KEY token can be
//!   inserted retroactively when a `:` confirms the key, within a bounded
//!   lookahead of 1024 characters on the same line.
//! - Scan block scalars (chomping, explicit or inferred indentation,
//!   folding), flow scalars (escapes), plain scalars, directives, tags,
//!   anchors and aliases.
//!
//! One `Scanner` instance consumes exactly one character stream and is
//! exhausted once the stream-end token has been taken. Every malformed
//! construct aborts the scan with an [`Error::Scan`] carrying the current
//! mark; there is no recovery.

use std::collections::VecDeque;

use ahash::AHashMap;
use smallvec::SmallVec;

use crate::error::Error;
use crate::mark::Mark;
use crate::reader::Reader;
use crate::token::{ScalarStyle, Token, TokenId, TokenKind};

/// A simple key must resolve within this many characters of its start.
const SIMPLE_KEY_LOOKAHEAD: usize = 1024;

/// How trailing line breaks of a block scalar are treated.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Chomping {
    /// `-`: drop all trailing breaks.
    Strip,
    /// Default: keep exactly one trailing break when content is non-empty.
    Clip,
    /// `+`: keep all trailing breaks.
    Keep,
}

/// A candidate for a simple (non-`?`) mapping key, tracked per flow level.
///
/// At most one candidate exists per level at a time. When a `:` arrives on
/// the same line within the lookahead budget, a KEY token is inserted
/// retroactively at `token_number`.
struct SimpleKey {
    /// Position in the overall token sequence where KEY would be inserted.
    token_number: usize,
    /// A key that unambiguously started (e.g. in block context at the
    /// current indent) must resolve; dropping it silently is an error.
    required: bool,
    index: usize,
    line: usize,
    column: usize,
    mark: Mark,
}

#[inline]
fn is_break(ch: char) -> bool {
    matches!(ch, '\r' | '\n' | '\u{85}' | '\u{2028}' | '\u{2029}')
}

#[inline]
fn is_break_or_nul(ch: char) -> bool {
    ch == '\0' || is_break(ch)
}

#[inline]
fn is_blank_or_break_or_nul(ch: char) -> bool {
    matches!(ch, ' ' | '\t') || is_break_or_nul(ch)
}

#[inline]
fn is_word_char(ch: char) -> bool {
    ch.is_ascii_alphanumeric() || ch == '-' || ch == '_'
}

/// The scanner. See the module docs for the overall contract.
pub struct Scanner {
    reader: Reader,
    /// Set once the stream-end token has been emitted.
    done: bool,
    /// 0 in block context, >0 inside nested flow collections.
    flow_level: usize,
    /// Tokens scanned but not yet taken by the caller.
    tokens: VecDeque<Token>,
    /// Number of tokens already handed out, for simple-key bookkeeping.
    tokens_taken: usize,
    /// Current indentation column, -1 before the first block construct.
    indent: i64,
    /// Enclosing indentation columns.
    indents: SmallVec<[i64; 16]>,
    /// Whether a simple key may start at the current position.
    allow_simple_key: bool,
    /// Pending simple-key candidate per flow level.
    possible_simple_keys: AHashMap<usize, SimpleKey>,
}

impl Scanner {
    pub fn new(input: &str) -> Self {
        let reader = Reader::new(input);
        let mark = reader.mark();
        let mut tokens = VecDeque::new();
        tokens.push_back(Token::new(TokenKind::StreamStart, mark, mark));
        Self {
            reader,
            done: false,
            flow_level: 0,
            tokens,
            tokens_taken: 0,
            indent: -1,
            indents: SmallVec::new(),
            allow_simple_key: true,
            possible_simple_keys: AHashMap::new(),
        }
    }

    /// The next token without consuming it, or `None` once the stream-end
    /// token has been taken.
    pub fn peek_token(&mut self) -> Result<Option<&Token>, Error> {
        while self.need_more_tokens()? {
            self.fetch_more_tokens()?;
        }
        Ok(self.tokens.front())
    }

    /// Return and consume the next token, or `None` when exhausted.
    pub fn next_token(&mut self) -> Result<Option<Token>, Error> {
        while self.need_more_tokens()? {
            self.fetch_more_tokens()?;
        }
        match self.tokens.pop_front() {
            Some(token) => {
                self.tokens_taken += 1;
                Ok(Some(token))
            }
            None => Ok(None),
        }
    }

    /// Whether the next token's kind is one of `choices`, without
    /// consuming it. An empty slice asks only "is there a next token".
    pub fn check(&mut self, choices: &[TokenId]) -> Result<bool, Error> {
        match self.peek_token()? {
            Some(token) => Ok(choices.is_empty() || choices.contains(&token.id())),
            None => Ok(false),
        }
    }

    fn need_more_tokens(&mut self) -> Result<bool, Error> {
        if self.done {
            return Ok(false);
        }
        if self.tokens.is_empty() {
            return Ok(true);
        }
        // The current token may be a potential simple key, so we need to
        // look further to confirm or deny it.
        self.stale_possible_simple_keys()?;
        Ok(self.next_possible_simple_key() == Some(self.tokens_taken))
    }

    fn fetch_more_tokens(&mut self) -> Result<(), Error> {
        self.scan_to_next_token();
        self.stale_possible_simple_keys()?;
        self.unwind_indent(self.reader.column() as i64);

        let ch = self.reader.ch();
        match ch {
            '\0' => self.fetch_stream_end(),
            '%' if self.check_directive() => self.fetch_directive(),
            '-' if self.check_document_indicator("---") => {
                self.fetch_document_indicator(TokenKind::DocumentStart)
            }
            '.' if self.check_document_indicator("...") => {
                self.fetch_document_indicator(TokenKind::DocumentEnd)
            }
            '[' => self.fetch_flow_collection_start(TokenKind::FlowSequenceStart),
            '{' => self.fetch_flow_collection_start(TokenKind::FlowMappingStart),
            ']' => self.fetch_flow_collection_end(TokenKind::FlowSequenceEnd),
            '}' => self.fetch_flow_collection_end(TokenKind::FlowMappingEnd),
            ',' => self.fetch_flow_entry(),
            '-' if self.check_block_entry() => self.fetch_block_entry(),
            '?' if self.check_key() => self.fetch_key(),
            ':' if self.check_value() => self.fetch_value(),
            '*' => self.fetch_anchor_or_alias(true),
            '&' => self.fetch_anchor_or_alias(false),
            '!' => self.fetch_tag(),
            '|' if self.flow_level == 0 => self.fetch_block_scalar(ScalarStyle::Literal),
            '>' if self.flow_level == 0 => self.fetch_block_scalar(ScalarStyle::Folded),
            '\'' => self.fetch_flow_scalar(ScalarStyle::SingleQuoted),
            '"' => self.fetch_flow_scalar(ScalarStyle::DoubleQuoted),
            _ if self.check_plain() => self.fetch_plain(),
            _ => Err(Error::scan(
                format!("found character {ch:?} that cannot start any token"),
                self.reader.mark(),
            )
            .with_context("scanning for the next token", self.reader.mark())),
        }
    }

    // ----- lookahead checks -----

    /// `%` introduces a directive only at the start of a line.
    fn check_directive(&self) -> bool {
        self.reader.column() == 0
    }

    /// `---`/`...` at the start of a line, followed by a blank or break.
    fn check_document_indicator(&self, marker: &str) -> bool {
        self.reader.column() == 0
            && self.reader.prefix(3) == marker
            && is_blank_or_break_or_nul(self.reader.peek(3))
    }

    /// `-` starts a block entry only when followed by a blank or break.
    fn check_block_entry(&self) -> bool {
        is_blank_or_break_or_nul(self.reader.peek(1))
    }

    /// `?` always starts a key in flow context; in block context it must
    /// be followed by a blank or break.
    fn check_key(&self) -> bool {
        self.flow_level > 0 || is_blank_or_break_or_nul(self.reader.peek(1))
    }

    /// `:` is a value indicator unconditionally in flow context; in block
    /// context only when followed by a blank or break.
    fn check_value(&self) -> bool {
        self.flow_level > 0 || is_blank_or_break_or_nul(self.reader.peek(1))
    }

    /// A plain scalar may start with most characters; indicators are only
    /// excluded when they would be ambiguous in the current context.
    fn check_plain(&self) -> bool {
        let ch = self.reader.ch();
        let excluded = is_blank_or_break_or_nul(ch)
            || "-?:,[]{}#&*!|>'\"%@`".contains(ch);
        !excluded
            || (!is_blank_or_break_or_nul(self.reader.peek(1))
                && (ch == '-' || (self.flow_level == 0 && (ch == '?' || ch == ':'))))
    }

    // ----- indentation -----

    /// Pop indentation levels deeper than `column`, emitting one BLOCK-END
    /// per popped level. Flow context ignores indentation entirely.
    fn unwind_indent(&mut self, column: i64) {
        if self.flow_level > 0 {
            return;
        }
        while self.indent > column {
            let mark = self.reader.mark();
            self.indent = self.indents.pop().unwrap_or(-1);
            self.tokens
                .push_back(Token::new(TokenKind::BlockEnd, mark, mark));
        }
    }

    /// Push a deeper indentation level; true if `column` actually deepens.
    fn add_indent(&mut self, column: i64) -> bool {
        if self.indent < column {
            self.indents.push(self.indent);
            self.indent = column;
            true
        } else {
            false
        }
    }

    // ----- simple keys -----

    fn next_possible_simple_key(&self) -> Option<usize> {
        self.possible_simple_keys
            .values()
            .map(|key| key.token_number)
            .min()
    }

    /// Drop candidates that can no longer become keys: the line ended, or
    /// the 1024-character budget ran out. A required candidate in that
    /// state is a scan error, not a silent drop.
    fn stale_possible_simple_keys(&mut self) -> Result<(), Error> {
        let line = self.reader.line();
        let index = self.reader.index();
        let mut stale_required = None;
        self.possible_simple_keys.retain(|_, key| {
            let stale = key.line != line || index - key.index > SIMPLE_KEY_LOOKAHEAD;
            if stale && key.required && stale_required.is_none() {
                stale_required = Some(key.mark);
            }
            !stale
        });
        if let Some(key_mark) = stale_required {
            return Err(Error::scan("could not find expected ':'", self.reader.mark())
                .with_context("scanning a simple key", key_mark));
        }
        Ok(())
    }

    /// Record the current position as a simple-key candidate for the
    /// current flow level, if one is allowed here.
    fn save_possible_simple_key(&mut self) -> Result<(), Error> {
        let required = self.flow_level == 0 && self.indent == self.reader.column() as i64;
        if self.allow_simple_key {
            self.remove_possible_simple_key()?;
            let token_number = self.tokens_taken + self.tokens.len();
            let key = SimpleKey {
                token_number,
                required,
                index: self.reader.index(),
                line: self.reader.line(),
                column: self.reader.column(),
                mark: self.reader.mark(),
            };
            self.possible_simple_keys.insert(self.flow_level, key);
        }
        Ok(())
    }

    fn remove_possible_simple_key(&mut self) -> Result<(), Error> {
        if let Some(key) = self.possible_simple_keys.remove(&self.flow_level) {
            if key.required {
                return Err(
                    Error::scan("could not find expected ':'", self.reader.mark())
                        .with_context("scanning a simple key", key.mark),
                );
            }
        }
        Ok(())
    }

    // ----- fetchers -----

    fn fetch_stream_end(&mut self) -> Result<(), Error> {
        self.unwind_indent(-1);
        self.remove_possible_simple_key()?;
        self.allow_simple_key = false;
        self.possible_simple_keys.clear();
        let mark = self.reader.mark();
        self.tokens
            .push_back(Token::new(TokenKind::StreamEnd, mark, mark));
        self.done = true;
        Ok(())
    }

    fn fetch_directive(&mut self) -> Result<(), Error> {
        self.unwind_indent(-1);
        self.remove_possible_simple_key()?;
        self.allow_simple_key = false;
        let token = self.scan_directive()?;
        self.tokens.push_back(token);
        Ok(())
    }

    fn fetch_document_indicator(&mut self, kind: TokenKind) -> Result<(), Error> {
        self.unwind_indent(-1);
        self.remove_possible_simple_key()?;
        self.allow_simple_key = false;
        let start = self.reader.mark();
        self.reader.forward(3);
        let end = self.reader.mark();
        self.tokens.push_back(Token::new(kind, start, end));
        Ok(())
    }

    fn fetch_flow_collection_start(&mut self, kind: TokenKind) -> Result<(), Error> {
        self.save_possible_simple_key()?;
        self.flow_level += 1;
        self.allow_simple_key = true;
        let start = self.reader.mark();
        self.reader.forward(1);
        let end = self.reader.mark();
        self.tokens.push_back(Token::new(kind, start, end));
        Ok(())
    }

    fn fetch_flow_collection_end(&mut self, kind: TokenKind) -> Result<(), Error> {
        self.remove_possible_simple_key()?;
        self.flow_level = self.flow_level.saturating_sub(1);
        self.allow_simple_key = false;
        let start = self.reader.mark();
        self.reader.forward(1);
        let end = self.reader.mark();
        self.tokens.push_back(Token::new(kind, start, end));
        Ok(())
    }

    fn fetch_flow_entry(&mut self) -> Result<(), Error> {
        self.allow_simple_key = true;
        self.remove_possible_simple_key()?;
        let start = self.reader.mark();
        self.reader.forward(1);
        let end = self.reader.mark();
        self.tokens
            .push_back(Token::new(TokenKind::FlowEntry, start, end));
        Ok(())
    }

    fn fetch_block_entry(&mut self) -> Result<(), Error> {
        if self.flow_level == 0 {
            if !self.allow_simple_key {
                return Err(Error::scan(
                    "sequence entries are not allowed here",
                    self.reader.mark(),
                ));
            }
            if self.add_indent(self.reader.column() as i64) {
                let mark = self.reader.mark();
                self.tokens
                    .push_back(Token::new(TokenKind::BlockSequenceStart, mark, mark));
            }
        }
        // In flow context `-` is left for the composer to reject.
        self.allow_simple_key = true;
        self.remove_possible_simple_key()?;
        let start = self.reader.mark();
        self.reader.forward(1);
        let end = self.reader.mark();
        self.tokens
            .push_back(Token::new(TokenKind::BlockEntry, start, end));
        Ok(())
    }

    fn fetch_key(&mut self) -> Result<(), Error> {
        if self.flow_level == 0 {
            if !self.allow_simple_key {
                return Err(Error::scan(
                    "mapping keys are not allowed here",
                    self.reader.mark(),
                ));
            }
            if self.add_indent(self.reader.column() as i64) {
                let mark = self.reader.mark();
                self.tokens
                    .push_back(Token::new(TokenKind::BlockMappingStart, mark, mark));
            }
        }
        self.allow_simple_key = self.flow_level == 0;
        self.remove_possible_simple_key()?;
        let start = self.reader.mark();
        self.reader.forward(1);
        let end = self.reader.mark();
        self.tokens.push_back(Token::new(TokenKind::Key, start, end));
        Ok(())
    }

    fn fetch_value(&mut self) -> Result<(), Error> {
        if let Some(key) = self.possible_simple_keys.remove(&self.flow_level) {
            // The candidate is confirmed: insert KEY (and, for the first
            // key at this indentation, BLOCK-MAPPING-START) retroactively.
            let insert_at = key.token_number - self.tokens_taken;
            self.tokens.insert(
                insert_at,
                Token::new(TokenKind::Key, key.mark, key.mark),
            );
            if self.flow_level == 0 && self.add_indent(key.column as i64) {
                self.tokens.insert(
                    insert_at,
                    Token::new(TokenKind::BlockMappingStart, key.mark, key.mark),
                );
            }
            self.allow_simple_key = false;
        } else {
            if self.flow_level == 0 {
                if !self.allow_simple_key {
                    return Err(Error::scan(
                        "mapping values are not allowed here",
                        self.reader.mark(),
                    ));
                }
                if self.add_indent(self.reader.column() as i64) {
                    let mark = self.reader.mark();
                    self.tokens
                        .push_back(Token::new(TokenKind::BlockMappingStart, mark, mark));
                }
            }
            self.allow_simple_key = self.flow_level == 0;
            self.remove_possible_simple_key()?;
        }
        let start = self.reader.mark();
        self.reader.forward(1);
        let end = self.reader.mark();
        self.tokens
            .push_back(Token::new(TokenKind::Value, start, end));
        Ok(())
    }

    fn fetch_anchor_or_alias(&mut self, alias: bool) -> Result<(), Error> {
        self.save_possible_simple_key()?;
        self.allow_simple_key = false;
        let token = self.scan_anchor(alias)?;
        self.tokens.push_back(token);
        Ok(())
    }

    fn fetch_tag(&mut self) -> Result<(), Error> {
        self.save_possible_simple_key()?;
        self.allow_simple_key = false;
        let token = self.scan_tag()?;
        self.tokens.push_back(token);
        Ok(())
    }

    fn fetch_block_scalar(&mut self, style: ScalarStyle) -> Result<(), Error> {
        self.allow_simple_key = true;
        self.remove_possible_simple_key()?;
        let token = self.scan_block_scalar(style)?;
        self.tokens.push_back(token);
        Ok(())
    }

    fn fetch_flow_scalar(&mut self, style: ScalarStyle) -> Result<(), Error> {
        self.save_possible_simple_key()?;
        self.allow_simple_key = false;
        let token = self.scan_flow_scalar(style)?;
        self.tokens.push_back(token);
        Ok(())
    }

    fn fetch_plain(&mut self) -> Result<(), Error> {
        self.save_possible_simple_key()?;
        self.allow_simple_key = false;
        let token = self.scan_plain()?;
        self.tokens.push_back(token);
        Ok(())
    }

    // ----- whitespace and comments -----

    fn scan_to_next_token(&mut self) {
        loop {
            while self.reader.ch() == ' ' {
                self.reader.forward(1);
            }
            if self.reader.ch() == '#' {
                while !is_break_or_nul(self.reader.ch()) {
                    self.reader.forward(1);
                }
            }
            if self.scan_line_break().is_empty() {
                break;
            }
            // Only a line break re-enables simple keys in block context.
            if self.flow_level == 0 {
                self.allow_simple_key = true;
            }
        }
    }

    /// Consume one line break and return its folded form: `\r\n`, `\r`,
    /// `\n` and `\x85` all normalize to `\n`; the Unicode separators are
    /// preserved verbatim. Returns `""` when not at a break.
    fn scan_line_break(&mut self) -> &'static str {
        match self.reader.ch() {
            '\r' => {
                if self.reader.peek(1) == '\n' {
                    self.reader.forward(2);
                } else {
                    self.reader.forward(1);
                }
                "\n"
            }
            '\n' | '\u{85}' => {
                self.reader.forward(1);
                "\n"
            }
            '\u{2028}' => {
                self.reader.forward(1);
                "\u{2028}"
            }
            '\u{2029}' => {
                self.reader.forward(1);
                "\u{2029}"
            }
            _ => "",
        }
    }

    // ----- directives -----

    fn scan_directive(&mut self) -> Result<Token, Error> {
        let start = self.reader.mark();
        self.reader.forward(1);
        let name = self.scan_directive_name(start)?;
        let (kind, end) = match name.as_str() {
            "YAML" => {
                let (major, minor) = self.scan_yaml_directive_value(start)?;
                (
                    TokenKind::VersionDirective { major, minor },
                    self.reader.mark(),
                )
            }
            "TAG" => {
                let (handle, prefix) = self.scan_tag_directive_value(start)?;
                (
                    TokenKind::TagDirective { handle, prefix },
                    self.reader.mark(),
                )
            }
            _ => {
                // Unknown directives are scanned over and surfaced by name
                // only; the composer ignores them.
                let end = self.reader.mark();
                while !is_break_or_nul(self.reader.ch()) {
                    self.reader.forward(1);
                }
                (TokenKind::ReservedDirective { name }, end)
            }
        };
        self.scan_directive_ignore_line(start)?;
        Ok(Token::new(kind, start, end))
    }

    fn scan_directive_name(&mut self, start: Mark) -> Result<String, Error> {
        let mut length = 0;
        while is_word_char(self.reader.peek(length)) {
            length += 1;
        }
        if length == 0 {
            return Err(Error::scan(
                format!(
                    "expected alphabetic or numeric character, but found {:?}",
                    self.reader.ch()
                ),
                self.reader.mark(),
            )
            .with_context("scanning a directive", start));
        }
        let value = self.reader.prefix(length);
        self.reader.forward(length);
        let ch = self.reader.ch();
        if ch != ' ' && !is_break_or_nul(ch) {
            return Err(Error::scan(
                format!("expected alphabetic or numeric character, but found {ch:?}"),
                self.reader.mark(),
            )
            .with_context("scanning a directive", start));
        }
        Ok(value)
    }

    fn scan_yaml_directive_value(&mut self, start: Mark) -> Result<(u32, u32), Error> {
        while self.reader.ch() == ' ' {
            self.reader.forward(1);
        }
        let major = self.scan_yaml_directive_number(start)?;
        if self.reader.ch() != '.' {
            return Err(Error::scan(
                format!("expected a digit or '.', but found {:?}", self.reader.ch()),
                self.reader.mark(),
            )
            .with_context("scanning a directive", start));
        }
        self.reader.forward(1);
        let minor = self.scan_yaml_directive_number(start)?;
        let ch = self.reader.ch();
        if ch != ' ' && !is_break_or_nul(ch) {
            return Err(Error::scan(
                format!("expected a digit or ' ', but found {ch:?}"),
                self.reader.mark(),
            )
            .with_context("scanning a directive", start));
        }
        Ok((major, minor))
    }

    fn scan_yaml_directive_number(&mut self, start: Mark) -> Result<u32, Error> {
        if !self.reader.ch().is_ascii_digit() {
            return Err(Error::scan(
                format!("expected a digit, but found {:?}", self.reader.ch()),
                self.reader.mark(),
            )
            .with_context("scanning a directive", start));
        }
        let mut length = 0;
        while self.reader.peek(length).is_ascii_digit() {
            length += 1;
        }
        let digits = self.reader.prefix(length);
        self.reader.forward(length);
        digits.parse::<u32>().map_err(|_| {
            Error::scan("found an out-of-range version number", self.reader.mark())
                .with_context("scanning a directive", start)
        })
    }

    fn scan_tag_directive_value(&mut self, start: Mark) -> Result<(String, String), Error> {
        while self.reader.ch() == ' ' {
            self.reader.forward(1);
        }
        let handle = self.scan_tag_handle("directive", start)?;
        if self.reader.ch() != ' ' {
            return Err(Error::scan(
                format!("expected ' ', but found {:?}", self.reader.ch()),
                self.reader.mark(),
            )
            .with_context("scanning a directive", start));
        }
        while self.reader.ch() == ' ' {
            self.reader.forward(1);
        }
        let prefix = self.scan_tag_uri("directive", start)?;
        let ch = self.reader.ch();
        if ch != ' ' && !is_break_or_nul(ch) {
            return Err(Error::scan(
                format!("expected ' ', but found {ch:?}"),
                self.reader.mark(),
            )
            .with_context("scanning a directive", start));
        }
        Ok((handle, prefix))
    }

    fn scan_directive_ignore_line(&mut self, start: Mark) -> Result<(), Error> {
        while self.reader.ch() == ' ' {
            self.reader.forward(1);
        }
        if self.reader.ch() == '#' {
            while !is_break_or_nul(self.reader.ch()) {
                self.reader.forward(1);
            }
        }
        if !is_break_or_nul(self.reader.ch()) {
            return Err(Error::scan(
                format!(
                    "expected a comment or a line break, but found {:?}",
                    self.reader.ch()
                ),
                self.reader.mark(),
            )
            .with_context("scanning a directive", start));
        }
        self.scan_line_break();
        Ok(())
    }

    // ----- anchors, aliases, tags -----

    fn scan_anchor(&mut self, alias: bool) -> Result<Token, Error> {
        let what = if alias { "an alias" } else { "an anchor" };
        let start = self.reader.mark();
        self.reader.forward(1);
        let mut length = 0;
        while self.reader.peek(length).is_alphanumeric() {
            length += 1;
        }
        if length == 0 {
            return Err(Error::scan(
                format!(
                    "expected alphabetic or numeric character, but found {:?}",
                    self.reader.peek(length)
                ),
                self.reader.mark(),
            )
            .with_context(format!("scanning {what}"), start));
        }
        let name = self.reader.prefix(length);
        self.reader.forward(length);
        let ch = self.reader.ch();
        if !is_blank_or_break_or_nul(ch) && !"?:,]}%@`".contains(ch) {
            return Err(Error::scan(
                format!("expected alphabetic or numeric character, but found {ch:?}"),
                self.reader.mark(),
            )
            .with_context(format!("scanning {what}"), start));
        }
        let end = self.reader.mark();
        let kind = if alias {
            TokenKind::Alias { name }
        } else {
            TokenKind::Anchor { name }
        };
        Ok(Token::new(kind, start, end))
    }

    fn scan_tag(&mut self) -> Result<Token, Error> {
        let start = self.reader.mark();
        let ch = self.reader.peek(1);
        let (handle, suffix) = if ch == '<' {
            // Verbatim tag: !<tag:example.org,2002:thing>
            self.reader.forward(2);
            let suffix = self.scan_tag_uri("tag", start)?;
            if self.reader.ch() != '>' {
                return Err(Error::scan(
                    format!("expected '>', but found {:?}", self.reader.ch()),
                    self.reader.mark(),
                )
                .with_context("scanning a tag", start));
            }
            self.reader.forward(1);
            (None, suffix)
        } else if is_blank_or_break_or_nul(ch) {
            // Non-specific "!".
            self.reader.forward(1);
            (None, "!".to_string())
        } else {
            // Decide between "!suffix" and "!handle!suffix" by looking for
            // a second '!' before the end of the word.
            let mut length = 1;
            let mut use_handle = false;
            let mut probe = ch;
            while probe != '\0' && probe != ' ' && !is_break(probe) {
                if probe == '!' {
                    use_handle = true;
                    break;
                }
                length += 1;
                probe = self.reader.peek(length);
            }
            let handle = if use_handle {
                self.scan_tag_handle("tag", start)?
            } else {
                self.reader.forward(1);
                "!".to_string()
            };
            let suffix = self.scan_tag_uri("tag", start)?;
            (Some(handle), suffix)
        };
        let ch = self.reader.ch();
        if ch != ' ' && !is_break_or_nul(ch) {
            return Err(
                Error::scan(format!("expected ' ', but found {ch:?}"), self.reader.mark())
                    .with_context("scanning a tag", start),
            );
        }
        let end = self.reader.mark();
        Ok(Token::new(TokenKind::Tag { handle, suffix }, start, end))
    }

    fn scan_tag_handle(&mut self, what: &'static str, start: Mark) -> Result<String, Error> {
        if self.reader.ch() != '!' {
            return Err(Error::scan(
                format!("expected '!', but found {:?}", self.reader.ch()),
                self.reader.mark(),
            )
            .with_context(format!("scanning a {what}"), start));
        }
        let mut length = 1;
        let mut ch = self.reader.peek(length);
        if ch != ' ' {
            while is_word_char(ch) {
                length += 1;
                ch = self.reader.peek(length);
            }
            if ch != '!' {
                self.reader.forward(length);
                return Err(Error::scan(
                    format!("expected '!', but found {ch:?}"),
                    self.reader.mark(),
                )
                .with_context(format!("scanning a {what}"), start));
            }
            length += 1;
        }
        let value = self.reader.prefix(length);
        self.reader.forward(length);
        Ok(value)
    }

    fn scan_tag_uri(&mut self, what: &'static str, start: Mark) -> Result<String, Error> {
        let mut chunks = String::new();
        let mut length = 0;
        let mut ch = self.reader.peek(length);
        while is_word_char(ch) || ";/?:@&=+$,.!~*'()[]%".contains(ch) {
            if ch == '%' {
                chunks.push_str(&self.reader.prefix(length));
                self.reader.forward(length);
                length = 0;
                chunks.push_str(&self.scan_uri_escapes(what, start)?);
            } else {
                length += 1;
            }
            ch = self.reader.peek(length);
        }
        if length > 0 {
            chunks.push_str(&self.reader.prefix(length));
            self.reader.forward(length);
        }
        if chunks.is_empty() {
            return Err(
                Error::scan(format!("expected URI, but found {ch:?}"), self.reader.mark())
                    .with_context(format!("scanning a {what}"), start),
            );
        }
        Ok(chunks)
    }

    /// Decode a run of `%xx` escapes as a UTF-8 byte sequence.
    fn scan_uri_escapes(&mut self, what: &'static str, start: Mark) -> Result<String, Error> {
        let mut bytes = Vec::new();
        let mark = self.reader.mark();
        while self.reader.ch() == '%' {
            self.reader.forward(1);
            for k in 0..2 {
                if !self.reader.peek(k).is_ascii_hexdigit() {
                    return Err(Error::scan(
                        format!(
                            "expected URI escape sequence of 2 hexdecimal numbers, but found {:?}",
                            self.reader.peek(k)
                        ),
                        self.reader.mark(),
                    )
                    .with_context(format!("scanning a {what}"), start));
                }
            }
            let byte = u8::from_str_radix(&self.reader.prefix(2), 16)
                .unwrap_or_default();
            bytes.push(byte);
            self.reader.forward(2);
        }
        String::from_utf8(bytes).map_err(|_| {
            Error::scan("found invalid UTF-8 data encoded in URI", mark)
                .with_context(format!("scanning a {what}"), start)
        })
    }

    // ----- block scalars -----

    fn scan_block_scalar(&mut self, style: ScalarStyle) -> Result<Token, Error> {
        let folded = style == ScalarStyle::Folded;
        let start = self.reader.mark();
        self.reader.forward(1);

        let (chomping, increment) = self.scan_block_scalar_indicators(start)?;
        self.scan_block_scalar_ignored_line(start)?;

        let min_indent = (self.indent + 1).max(1);
        let mut chunks = String::new();
        let (mut breaks, indent, mut end) = match increment {
            Some(increment) => {
                let indent = min_indent + increment as i64 - 1;
                let (breaks, end) = self.scan_block_scalar_breaks(indent);
                (breaks, indent, end)
            }
            None => {
                // No explicit indentation: infer it from the deepest column
                // reached across the leading blank lines.
                let (breaks, max_indent, end) = self.scan_block_scalar_indentation();
                (breaks, min_indent.max(max_indent), end)
            }
        };

        let mut line_break = "";
        while self.reader.column() as i64 == indent && self.reader.ch() != '\0' {
            chunks.push_str(&breaks);
            let leading_non_space = !matches!(self.reader.ch(), ' ' | '\t');
            let mut length = 0;
            while !is_break_or_nul(self.reader.peek(length)) {
                length += 1;
            }
            chunks.push_str(&self.reader.prefix(length));
            self.reader.forward(length);
            line_break = self.scan_line_break();
            let (next_breaks, next_end) = self.scan_block_scalar_breaks(indent);
            breaks = next_breaks;
            end = next_end;
            if self.reader.column() as i64 == indent && self.reader.ch() != '\0' {
                // Folded style joins two non-blank, non-indented lines with
                // a space; everything else keeps the break.
                if folded
                    && line_break == "\n"
                    && leading_non_space
                    && !matches!(self.reader.ch(), ' ' | '\t')
                {
                    if breaks.is_empty() {
                        chunks.push(' ');
                    }
                } else {
                    chunks.push_str(line_break);
                }
            } else {
                break;
            }
        }

        if chomping != Chomping::Strip {
            chunks.push_str(line_break);
        }
        if chomping == Chomping::Keep {
            chunks.push_str(&breaks);
        }

        Ok(Token::new(
            TokenKind::Scalar {
                value: chunks,
                style,
            },
            start,
            end,
        ))
    }

    /// Parse the optional chomping indicator and explicit indentation
    /// increment from a block scalar header, in either order.
    fn scan_block_scalar_indicators(
        &mut self,
        start: Mark,
    ) -> Result<(Chomping, Option<u32>), Error> {
        let mut chomping = Chomping::Clip;
        let mut increment = None;
        let mut ch = self.reader.ch();
        if ch == '+' || ch == '-' {
            chomping = if ch == '+' { Chomping::Keep } else { Chomping::Strip };
            self.reader.forward(1);
            ch = self.reader.ch();
            if ch.is_ascii_digit() {
                increment = Some(self.scan_block_scalar_increment(start, ch)?);
            }
        } else if ch.is_ascii_digit() {
            increment = Some(self.scan_block_scalar_increment(start, ch)?);
            ch = self.reader.ch();
            if ch == '+' || ch == '-' {
                chomping = if ch == '+' { Chomping::Keep } else { Chomping::Strip };
                self.reader.forward(1);
            }
        }
        let ch = self.reader.ch();
        if ch != ' ' && !is_break_or_nul(ch) {
            return Err(Error::scan(
                format!("expected chomping or indentation indicators, but found {ch:?}"),
                self.reader.mark(),
            )
            .with_context("scanning a block scalar", start));
        }
        Ok((chomping, increment))
    }

    fn scan_block_scalar_increment(&mut self, start: Mark, ch: char) -> Result<u32, Error> {
        let increment = ch as u32 - '0' as u32;
        if increment == 0 {
            return Err(Error::scan(
                "expected indentation indicator in the range 1-9, but found 0",
                self.reader.mark(),
            )
            .with_context("scanning a block scalar", start));
        }
        self.reader.forward(1);
        Ok(increment)
    }

    /// The rest of a block scalar header line: spaces, an optional comment,
    /// then a required line break.
    fn scan_block_scalar_ignored_line(&mut self, start: Mark) -> Result<(), Error> {
        while self.reader.ch() == ' ' {
            self.reader.forward(1);
        }
        if self.reader.ch() == '#' {
            while !is_break_or_nul(self.reader.ch()) {
                self.reader.forward(1);
            }
        }
        if !is_break_or_nul(self.reader.ch()) {
            return Err(Error::scan(
                format!(
                    "expected a comment or a line break, but found {:?}",
                    self.reader.ch()
                ),
                self.reader.mark(),
            )
            .with_context("scanning a block scalar", start));
        }
        self.scan_line_break();
        Ok(())
    }

    /// Leading blank lines of an auto-indented block scalar; tracks the
    /// deepest column reached so the content indentation can be inferred.
    fn scan_block_scalar_indentation(&mut self) -> (String, i64, Mark) {
        let mut breaks = String::new();
        let mut max_indent = 0i64;
        let mut end = self.reader.mark();
        loop {
            let ch = self.reader.ch();
            if ch == ' ' {
                self.reader.forward(1);
                if self.reader.column() as i64 > max_indent {
                    max_indent = self.reader.column() as i64;
                }
            } else if is_break(ch) {
                breaks.push_str(self.scan_line_break());
                end = self.reader.mark();
            } else {
                break;
            }
        }
        (breaks, max_indent, end)
    }

    /// Blank lines between content lines at the established indentation.
    fn scan_block_scalar_breaks(&mut self, indent: i64) -> (String, Mark) {
        let mut breaks = String::new();
        let mut end = self.reader.mark();
        while (self.reader.column() as i64) < indent && self.reader.ch() == ' ' {
            self.reader.forward(1);
        }
        while is_break(self.reader.ch()) {
            breaks.push_str(self.scan_line_break());
            end = self.reader.mark();
            while (self.reader.column() as i64) < indent && self.reader.ch() == ' ' {
                self.reader.forward(1);
            }
        }
        (breaks, end)
    }

    // ----- flow scalars -----

    fn scan_flow_scalar(&mut self, style: ScalarStyle) -> Result<Token, Error> {
        let double = style == ScalarStyle::DoubleQuoted;
        let start = self.reader.mark();
        let quote = self.reader.ch();
        self.reader.forward(1);
        let mut chunks = String::new();
        self.scan_flow_scalar_non_spaces(&mut chunks, double, start)?;
        while self.reader.ch() != quote {
            self.scan_flow_scalar_spaces(&mut chunks, start)?;
            self.scan_flow_scalar_non_spaces(&mut chunks, double, start)?;
        }
        self.reader.forward(1);
        let end = self.reader.mark();
        Ok(Token::new(
            TokenKind::Scalar {
                value: chunks,
                style,
            },
            start,
            end,
        ))
    }

    fn scan_flow_scalar_non_spaces(
        &mut self,
        chunks: &mut String,
        double: bool,
        start: Mark,
    ) -> Result<(), Error> {
        loop {
            let mut length = 0;
            loop {
                let ch = self.reader.peek(length);
                if matches!(ch, '\'' | '"' | '\\') || is_blank_or_break_or_nul(ch) {
                    break;
                }
                length += 1;
            }
            if length > 0 {
                chunks.push_str(&self.reader.prefix(length));
                self.reader.forward(length);
            }
            let ch = self.reader.ch();
            if !double && ch == '\'' && self.reader.peek(1) == '\'' {
                // '' is the only escape inside single quotes.
                chunks.push('\'');
                self.reader.forward(2);
            } else if (double && ch == '\'') || (!double && (ch == '"' || ch == '\\')) {
                chunks.push(ch);
                self.reader.forward(1);
            } else if double && ch == '\\' {
                self.reader.forward(1);
                let ch = self.reader.ch();
                if let Some(replacement) = escape_replacement(ch) {
                    chunks.push(replacement);
                    self.reader.forward(1);
                } else if let Some(width) = escape_code_width(ch) {
                    self.reader.forward(1);
                    for k in 0..width {
                        if !self.reader.peek(k).is_ascii_hexdigit() {
                            return Err(Error::scan(
                                format!(
                                    "expected escape sequence of {width} hexdecimal numbers, \
                                     but found {:?}",
                                    self.reader.peek(k)
                                ),
                                self.reader.mark(),
                            )
                            .with_context("scanning a double-quoted scalar", start));
                        }
                    }
                    let code = u32::from_str_radix(&self.reader.prefix(width), 16)
                        .unwrap_or_default();
                    let decoded = char::from_u32(code).ok_or_else(|| {
                        Error::scan(
                            format!("found invalid Unicode character escape {code:#x}"),
                            self.reader.mark(),
                        )
                        .with_context("scanning a double-quoted scalar", start)
                    })?;
                    chunks.push(decoded);
                    self.reader.forward(width);
                } else if is_break(ch) {
                    self.scan_line_break();
                    self.scan_flow_scalar_breaks(chunks, start)?;
                } else {
                    return Err(Error::scan(
                        format!("found unknown escape character {ch:?}"),
                        self.reader.mark(),
                    )
                    .with_context("scanning a double-quoted scalar", start));
                }
            } else {
                return Ok(());
            }
        }
    }

    fn scan_flow_scalar_spaces(&mut self, chunks: &mut String, start: Mark) -> Result<(), Error> {
        let mut length = 0;
        while matches!(self.reader.peek(length), ' ' | '\t') {
            length += 1;
        }
        let whitespaces = self.reader.prefix(length);
        self.reader.forward(length);
        let ch = self.reader.ch();
        if ch == '\0' {
            return Err(
                Error::scan("found unexpected end of stream", self.reader.mark())
                    .with_context("scanning a quoted scalar", start),
            );
        }
        if is_break(ch) {
            let line_break = self.scan_line_break();
            let mut breaks = String::new();
            self.scan_flow_scalar_breaks(&mut breaks, start)?;
            // A single break folds to a space; extra breaks are kept.
            if line_break != "\n" {
                chunks.push_str(line_break);
            } else if breaks.is_empty() {
                chunks.push(' ');
            }
            chunks.push_str(&breaks);
        } else {
            chunks.push_str(&whitespaces);
        }
        Ok(())
    }

    fn scan_flow_scalar_breaks(&mut self, chunks: &mut String, start: Mark) -> Result<(), Error> {
        loop {
            let prefix = self.reader.prefix(3);
            if (prefix == "---" || prefix == "...")
                && self.reader.column() == 0
                && is_blank_or_break_or_nul(self.reader.peek(3))
            {
                return Err(Error::scan(
                    "found unexpected document separator",
                    self.reader.mark(),
                )
                .with_context("scanning a quoted scalar", start));
            }
            while matches!(self.reader.ch(), ' ' | '\t') {
                self.reader.forward(1);
            }
            if is_break(self.reader.ch()) {
                chunks.push_str(self.scan_line_break());
            } else {
                return Ok(());
            }
        }
    }

    // ----- plain scalars -----

    fn scan_plain(&mut self) -> Result<Token, Error> {
        let mut chunks = String::new();
        let start = self.reader.mark();
        let mut end = start;
        let indent = self.indent + 1;
        let mut spaces = String::new();
        loop {
            if self.reader.ch() == '#' {
                break;
            }
            let mut length = 0;
            loop {
                let ch = self.reader.peek(length);
                let terminator = is_blank_or_break_or_nul(ch)
                    || (ch == ':' && {
                        let next = self.reader.peek(length + 1);
                        is_blank_or_break_or_nul(next)
                            || (self.flow_level > 0 && ",[]{}".contains(next))
                    })
                    || (self.flow_level > 0 && ",?[]{}".contains(ch));
                if terminator {
                    break;
                }
                length += 1;
            }
            if length == 0 {
                break;
            }
            self.allow_simple_key = false;
            chunks.push_str(&spaces);
            chunks.push_str(&self.reader.prefix(length));
            self.reader.forward(length);
            end = self.reader.mark();
            spaces = self.scan_plain_spaces();
            if spaces.is_empty()
                || self.reader.ch() == '#'
                || (self.flow_level == 0 && (self.reader.column() as i64) < indent)
            {
                break;
            }
        }
        Ok(Token::new(
            TokenKind::Scalar {
                value: chunks,
                style: ScalarStyle::Plain,
            },
            start,
            end,
        ))
    }

    /// Whitespace and line breaks between plain scalar chunks, folded per
    /// the single-vs-multiple-break rule. Returns `""` when the scalar must
    /// end here (no continuation, or a document separator follows).
    fn scan_plain_spaces(&mut self) -> String {
        let mut chunks = String::new();
        let mut length = 0;
        while self.reader.peek(length) == ' ' {
            length += 1;
        }
        let whitespaces = self.reader.prefix(length);
        self.reader.forward(length);
        let ch = self.reader.ch();
        if is_break(ch) {
            let line_break = self.scan_line_break();
            self.allow_simple_key = true;
            if self.at_document_separator() {
                return String::new();
            }
            let mut breaks = String::new();
            loop {
                let ch = self.reader.ch();
                if ch == ' ' {
                    self.reader.forward(1);
                } else if is_break(ch) {
                    breaks.push_str(self.scan_line_break());
                    if self.at_document_separator() {
                        return String::new();
                    }
                } else {
                    break;
                }
            }
            if line_break != "\n" {
                chunks.push_str(line_break);
            } else if breaks.is_empty() {
                chunks.push(' ');
            }
            chunks.push_str(&breaks);
        } else if !whitespaces.is_empty() {
            chunks.push_str(&whitespaces);
        }
        chunks
    }

    fn at_document_separator(&self) -> bool {
        let prefix = self.reader.prefix(3);
        (prefix == "---" || prefix == "...") && is_blank_or_break_or_nul(self.reader.peek(3))
    }
}

/// Fixed replacement table for single-character escapes in double-quoted
/// scalars.
fn escape_replacement(ch: char) -> Option<char> {
    Some(match ch {
        '0' => '\0',
        'a' => '\x07',
        'b' => '\x08',
        't' | '\t' => '\t',
        'n' => '\n',
        'v' => '\x0b',
        'f' => '\x0c',
        'r' => '\r',
        'e' => '\x1b',
        ' ' => ' ',
        '"' => '"',
        '\\' => '\\',
        '/' => '/',
        'N' => '\u{85}',
        '_' => '\u{a0}',
        'L' => '\u{2028}',
        'P' => '\u{2029}',
        _ => return None,
    })
}

/// Fixed-width hex escapes: `\xXX`, `\uXXXX`, `\UXXXXXXXX`.
fn escape_code_width(ch: char) -> Option<usize> {
    match ch {
        'x' => Some(2),
        'u' => Some(4),
        'U' => Some(8),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scan_all(input: &str) -> Vec<TokenKind> {
        let mut scanner = Scanner::new(input);
        let mut kinds = Vec::new();
        while let Some(token) = scanner.next_token().unwrap() {
            kinds.push(token.kind);
        }
        kinds
    }

    fn scalar(value: &str, style: ScalarStyle) -> TokenKind {
        TokenKind::Scalar {
            value: value.to_string(),
            style,
        }
    }

    #[test]
    fn block_mapping_tokens() {
        let kinds = scan_all("a: 1\nb: 2\n");
        assert_eq!(
            kinds,
            vec![
                TokenKind::StreamStart,
                TokenKind::BlockMappingStart,
                TokenKind::Key,
                scalar("a", ScalarStyle::Plain),
                TokenKind::Value,
                scalar("1", ScalarStyle::Plain),
                TokenKind::Key,
                scalar("b", ScalarStyle::Plain),
                TokenKind::Value,
                scalar("2", ScalarStyle::Plain),
                TokenKind::BlockEnd,
                TokenKind::StreamEnd,
            ]
        );
    }

    #[test]
    fn nested_block_ends_are_balanced() {
        let kinds = scan_all("a:\n  b:\n    - 1\n    - 2\nc: 3\n");
        let mut depth = 0i32;
        let mut max_depth = 0;
        for kind in &kinds {
            match kind {
                TokenKind::BlockMappingStart | TokenKind::BlockSequenceStart => {
                    depth += 1;
                    max_depth = max_depth.max(depth);
                }
                TokenKind::BlockEnd => depth -= 1,
                _ => {}
            }
            assert!(depth >= 0, "BLOCK-END without matching start");
        }
        assert_eq!(depth, 0, "unbalanced block tokens: {kinds:?}");
        assert_eq!(max_depth, 3);
    }

    #[test]
    fn flow_collection_tokens() {
        let kinds = scan_all("[a, {b: c}]");
        assert_eq!(
            kinds,
            vec![
                TokenKind::StreamStart,
                TokenKind::FlowSequenceStart,
                scalar("a", ScalarStyle::Plain),
                TokenKind::FlowEntry,
                TokenKind::FlowMappingStart,
                TokenKind::Key,
                scalar("b", ScalarStyle::Plain),
                TokenKind::Value,
                scalar("c", ScalarStyle::Plain),
                TokenKind::FlowMappingEnd,
                TokenKind::FlowSequenceEnd,
                TokenKind::StreamEnd,
            ]
        );
    }

    #[test]
    fn single_quote_escape() {
        let kinds = scan_all("'it''s'");
        assert!(kinds.contains(&scalar("it's", ScalarStyle::SingleQuoted)));
    }

    #[test]
    fn double_quote_named_and_hex_escapes() {
        let kinds = scan_all(r#""a\tb\x41\u0042\U00000043\n""#);
        assert!(kinds.contains(&scalar("a\tbABC\n", ScalarStyle::DoubleQuoted)));
    }

    #[test]
    fn truncated_hex_escape_is_an_error() {
        let mut scanner = Scanner::new(r#""\x4""#);
        let err = loop {
            match scanner.next_token() {
                Ok(Some(_)) => continue,
                Ok(None) => panic!("expected a scan error"),
                Err(err) => break err,
            }
        };
        assert!(err.to_string().contains("hexdecimal"), "{err}");
    }

    #[test]
    fn unknown_escape_is_an_error() {
        let mut scanner = Scanner::new(r#""\q""#);
        let err = loop {
            match scanner.next_token() {
                Ok(Some(_)) => continue,
                Ok(None) => panic!("expected a scan error"),
                Err(err) => break err,
            }
        };
        assert!(err.to_string().contains("unknown escape character"), "{err}");
    }

    #[test]
    fn document_separator_inside_quoted_scalar_is_an_error() {
        let mut scanner = Scanner::new("\"a\n--- \"");
        let err = loop {
            match scanner.next_token() {
                Ok(Some(_)) => continue,
                Ok(None) => panic!("expected a scan error"),
                Err(err) => break err,
            }
        };
        assert!(err.to_string().contains("document separator"), "{err}");
    }

    #[test]
    fn literal_block_scalar_clips_by_default() {
        let kinds = scan_all("|\n  line1\n  line2\n\n\n");
        assert!(kinds.contains(&scalar("line1\nline2\n", ScalarStyle::Literal)));
    }

    #[test]
    fn block_scalar_chomping_modes() {
        let keep = scan_all("|+\n  text\n\n\n");
        assert!(keep.contains(&scalar("text\n\n\n", ScalarStyle::Literal)));
        let strip = scan_all("|-\n  text\n\n\n");
        assert!(strip.contains(&scalar("text", ScalarStyle::Literal)));
    }

    #[test]
    fn folded_scalar_folds_single_breaks() {
        let kinds = scan_all(">\n  one\n  two\n\n  three\n");
        assert!(kinds.contains(&scalar("one two\nthree\n", ScalarStyle::Folded)));
    }

    #[test]
    fn block_scalar_explicit_indent() {
        let kinds = scan_all("|2\n   text\n");
        assert!(kinds.contains(&scalar(" text\n", ScalarStyle::Literal)));
    }

    #[test]
    fn zero_indent_indicator_is_an_error() {
        let mut scanner = Scanner::new("|0\n text\n");
        let err = loop {
            match scanner.next_token() {
                Ok(Some(_)) => continue,
                Ok(None) => panic!("expected a scan error"),
                Err(err) => break err,
            }
        };
        assert!(err.to_string().contains("range 1-9"), "{err}");
    }

    #[test]
    fn directives_and_document_markers() {
        let kinds = scan_all("%YAML 1.1\n%TAG !e! tag:example.com,2000:\n---\nx\n...\n");
        assert_eq!(kinds[1], TokenKind::VersionDirective { major: 1, minor: 1 });
        assert_eq!(
            kinds[2],
            TokenKind::TagDirective {
                handle: "!e!".to_string(),
                prefix: "tag:example.com,2000:".to_string(),
            }
        );
        assert_eq!(kinds[3], TokenKind::DocumentStart);
        assert!(kinds.contains(&TokenKind::DocumentEnd));
    }

    #[test]
    fn unknown_directive_is_skipped() {
        let kinds = scan_all("%FOO bar baz\n---\nx\n");
        assert_eq!(
            kinds[1],
            TokenKind::ReservedDirective {
                name: "FOO".to_string()
            }
        );
    }

    #[test]
    fn anchor_alias_and_tag_tokens() {
        let kinds = scan_all("a: &x !!str hi\nb: *x\n");
        assert!(kinds.contains(&TokenKind::Anchor {
            name: "x".to_string()
        }));
        assert!(kinds.contains(&TokenKind::Alias {
            name: "x".to_string()
        }));
        assert!(kinds.contains(&TokenKind::Tag {
            handle: Some("!!".to_string()),
            suffix: "str".to_string(),
        }));
    }

    #[test]
    fn verbatim_tag() {
        let kinds = scan_all("!<tag:example.org,2002:thing> x\n");
        assert!(kinds.contains(&TokenKind::Tag {
            handle: None,
            suffix: "tag:example.org,2002:thing".to_string(),
        }));
    }

    #[test]
    fn percent_escapes_in_tag_uri_decode_as_utf8() {
        let kinds = scan_all("!e%C3%A9 x\n");
        assert!(kinds.contains(&TokenKind::Tag {
            handle: Some("!".to_string()),
            suffix: "e\u{e9}".to_string(),
        }));
    }

    #[test]
    fn plain_scalar_multiline_folds() {
        let kinds = scan_all("key: word1\n  word2\n");
        assert!(kinds.contains(&scalar("word1 word2", ScalarStyle::Plain)));
    }

    #[test]
    fn plain_scalar_keeps_inner_colon_in_block_context() {
        let kinds = scan_all("a:b\n");
        assert!(kinds.contains(&scalar("a:b", ScalarStyle::Plain)));
    }

    #[test]
    fn explicit_key_token() {
        let kinds = scan_all("? complex\n: value\n");
        let keys: Vec<_> = kinds
            .iter()
            .filter(|kind| matches!(kind, TokenKind::Key))
            .collect();
        assert_eq!(keys.len(), 1);
    }

    #[test]
    fn unresolved_required_simple_key_is_an_error() {
        // Inside a block mapping, a candidate starting at the mapping's
        // indentation column is required; a line break before ':' kills it.
        let mut scanner = Scanner::new("a: 1\nb\nc: 3\n");
        let err = loop {
            match scanner.next_token() {
                Ok(Some(_)) => continue,
                Ok(None) => panic!("expected a scan error"),
                Err(err) => break err,
            }
        };
        assert!(err.to_string().contains("could not find expected ':'"), "{err}");
    }

    #[test]
    fn check_matches_token_ids() {
        let mut scanner = Scanner::new("a: 1\n");
        assert!(scanner.check(&[TokenId::StreamStart]).unwrap());
        scanner.next_token().unwrap();
        assert!(scanner
            .check(&[TokenId::BlockMappingStart, TokenId::FlowMappingStart])
            .unwrap());
        assert!(!scanner.check(&[TokenId::Scalar]).unwrap());
    }

    #[test]
    fn peek_does_not_consume() {
        let mut scanner = Scanner::new("x\n");
        let first = scanner.peek_token().unwrap().unwrap().kind.clone();
        let second = scanner.next_token().unwrap().unwrap().kind;
        assert_eq!(first, second);
    }

    #[test]
    fn marks_increase_monotonically() {
        let mut scanner = Scanner::new("a: [1, 2]\nb: |\n  x\n");
        let mut last = 0;
        while let Some(token) = scanner.next_token().unwrap() {
            assert!(token.end.index() >= token.start.index());
            assert!(token.start.index() >= last, "out of order: {:?}", token.kind);
            last = token.start.index();
        }
    }
}

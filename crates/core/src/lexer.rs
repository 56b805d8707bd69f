//! Tokenizer: a stacked-state automaton over the bytes of one file.
//!
//! The bottom of the state stack is always [`LexState::Whitespace`]. When a
//! character's class is recognized a run state is pushed on top of it, and
//! the character is either consumed or handed back unconsumed so the new top
//! state dispatches it again ([`Step::Hold`]). A run ends at whitespace or at
//! a reserved character; the terminator is held and starts its own token.

use std::collections::{HashMap, HashSet};

use tracing::debug;

use crate::chars;
use crate::error::LexError;
use crate::stream::TokenStream;
use crate::token::{Keyword, Location, Span, Token, TokenKind};

/// Owns the token streams of every file lexed so far, keyed by filename.
#[derive(Debug, Default)]
pub struct Tokenizer {
    files: HashMap<String, TokenStream>,
    seen: HashSet<String>,
}

impl Tokenizer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Tokenize `source` under `filename`. A filename can only be tokenized
    /// successfully once per tokenizer.
    pub fn tokenize(
        &mut self,
        filename: &str,
        source: impl Into<String>,
    ) -> Result<&mut TokenStream, LexError> {
        if self.seen.contains(filename) {
            return Err(LexError::file(
                filename,
                format!("file '{}' has already been tokenized", filename),
            ));
        }
        let stream = tokenize(filename, source.into())?;
        self.seen.insert(filename.to_owned());
        Ok(self.files.entry(filename.to_owned()).or_insert(stream))
    }

    pub fn stream(&self, filename: &str) -> Option<&TokenStream> {
        self.files.get(filename)
    }

    pub fn stream_mut(&mut self, filename: &str) -> Option<&mut TokenStream> {
        self.files.get_mut(filename)
    }

    /// Hand a stream over to the caller. The filename stays registered, so
    /// it still cannot be tokenized again.
    pub fn take(&mut self, filename: &str) -> Option<TokenStream> {
        self.files.remove(filename)
    }

    pub fn files(&self) -> impl Iterator<Item = &str> {
        self.files.keys().map(String::as_str)
    }
}

/// Tokenize a single file outside of any [`Tokenizer`] registry.
pub fn tokenize(filename: &str, source: String) -> Result<TokenStream, LexError> {
    let (tokens, newlines) = Scanner::new(filename, &source).run()?;
    debug!(file = filename, tokens = tokens.len(), "tokenized");
    Ok(TokenStream::from_parts(filename, source, tokens, newlines))
}

// ──────────────────────────────────────────────
// Automaton
// ──────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LexState {
    Whitespace,
    Alpha,
    AlphaDigit,
    Integer,
    Decimal,
    Version,
    Hex,
    Binary,
    String,
    /// A one-character operator, bracket or punctuation token.
    Single,
    /// `:` seen; may still become `:=`.
    Colon,
    LineComment,
    BlockComment,
    /// `}` seen inside a block comment with `#` right behind it.
    BlockCommentClose,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Step {
    /// Consume the current character.
    Consume,
    /// Leave the current character for the new top state.
    Hold,
}

struct Scanner<'a> {
    file: &'a str,
    text: &'a str,
    src: &'a [u8],
    pos: usize,
    line: u32,
    column: u32,
    states: Vec<LexState>,
    /// Where the run on top of the stack started.
    start: Location,
    tokens: Vec<Token>,
    newlines: Vec<usize>,
}

impl<'a> Scanner<'a> {
    fn new(file: &'a str, text: &'a str) -> Self {
        Scanner {
            file,
            text,
            src: text.as_bytes(),
            pos: 0,
            line: 1,
            column: 1,
            states: vec![LexState::Whitespace],
            start: Location::default(),
            tokens: Vec::new(),
            newlines: Vec::new(),
        }
    }

    fn run(mut self) -> Result<(Vec<Token>, Vec<usize>), LexError> {
        while self.pos < self.src.len() {
            let c = self.src[self.pos];
            if self.dispatch(c)? == Step::Consume {
                self.bump();
            }
        }
        self.finish()?;
        Ok((self.tokens, self.newlines))
    }

    fn state(&self) -> LexState {
        self.states.last().copied().unwrap_or(LexState::Whitespace)
    }

    fn dispatch(&mut self, c: u8) -> Result<Step, LexError> {
        match self.state() {
            LexState::Whitespace => self.whitespace(c),
            LexState::Alpha => {
                if chars::is_alpha(c) {
                    Ok(Step::Consume)
                } else if chars::is_digit(c) {
                    self.switch(LexState::AlphaDigit);
                    Ok(Step::Consume)
                } else {
                    self.end_word(c)
                }
            }
            LexState::AlphaDigit => {
                if chars::is_alpha(c) || chars::is_digit(c) {
                    Ok(Step::Consume)
                } else {
                    self.end_word(c)
                }
            }
            LexState::Integer => self.integer(c),
            LexState::Decimal => {
                if chars::is_digit(c) {
                    Ok(Step::Consume)
                } else if c == b'.' {
                    self.expect_digit_before(c)?;
                    self.switch(LexState::Version);
                    Ok(Step::Consume)
                } else {
                    self.end_number(c, TokenKind::DecimalLiteral)
                }
            }
            LexState::Version => {
                if chars::is_digit(c) {
                    Ok(Step::Consume)
                } else if c == b'.' {
                    self.expect_digit_before(c)?;
                    Ok(Step::Consume)
                } else {
                    self.end_number(c, TokenKind::VersionLiteral)
                }
            }
            LexState::Hex => {
                if chars::is_hex_digit(c) {
                    Ok(Step::Consume)
                } else {
                    self.end_number(c, TokenKind::HexadecimalLiteral)
                }
            }
            LexState::Binary => {
                if chars::is_binary_digit(c) {
                    Ok(Step::Consume)
                } else if chars::is_digit(c) {
                    Err(self.error_here(format!("invalid binary digit '{}'", c as char)))
                } else {
                    self.end_number(c, TokenKind::BinaryLiteral)
                }
            }
            LexState::String => {
                if chars::is_quote(c) {
                    self.bump();
                    self.emit(TokenKind::StringLiteral);
                    self.pop();
                    Ok(Step::Hold)
                } else {
                    Ok(Step::Consume)
                }
            }
            LexState::Single => {
                let first = self.src[self.start.offset];
                match TokenKind::from_single_char(first) {
                    Some(kind) => self.emit(kind),
                    None => return Err(self.error_at_start("invalid character")),
                }
                self.pop();
                Ok(Step::Hold)
            }
            LexState::Colon => match c {
                b'=' => {
                    self.bump();
                    self.emit(TokenKind::Assignment);
                    self.pop();
                    Ok(Step::Hold)
                }
                b':' => Err(self.error_at_start("'::' is reserved")),
                _ => {
                    self.emit(TokenKind::Colon);
                    self.pop();
                    Ok(Step::Hold)
                }
            },
            LexState::LineComment => {
                // `{` directly after the opening `#` turns this into a block comment.
                if c == b'{' && self.pos == self.start.offset + 1 && self.src[self.pos - 1] == b'#' {
                    self.switch(LexState::BlockComment);
                    Ok(Step::Consume)
                } else if c == b'\n' {
                    self.emit_line_comment();
                    self.pop();
                    Ok(Step::Hold)
                } else {
                    Ok(Step::Consume)
                }
            }
            LexState::BlockComment => {
                if c == b'}' && self.src.get(self.pos + 1) == Some(&b'#') {
                    self.switch(LexState::BlockCommentClose);
                }
                Ok(Step::Consume)
            }
            LexState::BlockCommentClose => {
                self.bump();
                self.emit(TokenKind::BlockComment);
                self.pop();
                Ok(Step::Hold)
            }
        }
    }

    fn whitespace(&mut self, c: u8) -> Result<Step, LexError> {
        if chars::is_whitespace(c) {
            return Ok(Step::Consume);
        }
        if chars::is_alpha(c) {
            self.begin(LexState::Alpha);
            return Ok(Step::Hold);
        }
        if chars::is_digit(c) {
            self.begin(LexState::Integer);
            return Ok(Step::Hold);
        }
        if chars::is_quote(c) {
            self.begin(LexState::String);
            return Ok(Step::Consume);
        }
        if chars::is_comment_marker(c) {
            self.begin(LexState::LineComment);
            return Ok(Step::Consume);
        }
        if c == b':' {
            self.begin(LexState::Colon);
            return Ok(Step::Consume);
        }
        if TokenKind::from_single_char(c).is_some() {
            self.begin(LexState::Single);
            return Ok(Step::Consume);
        }
        Err(self.invalid_character())
    }

    fn integer(&mut self, c: u8) -> Result<Step, LexError> {
        let leading_zero = self.pos == self.start.offset + 1 && self.src[self.start.offset] == b'0';
        match c {
            b'0'..=b'9' => Ok(Step::Consume),
            b'x' | b'X' if leading_zero => {
                self.switch(LexState::Hex);
                Ok(Step::Consume)
            }
            b'b' | b'B' if leading_zero => {
                self.switch(LexState::Binary);
                Ok(Step::Consume)
            }
            b'.' => {
                self.switch(LexState::Decimal);
                Ok(Step::Consume)
            }
            _ => self.end_number(c, TokenKind::IntegerLiteral),
        }
    }

    // -- Run termination ----------------------------------------

    fn end_word(&mut self, c: u8) -> Result<Step, LexError> {
        if !chars::is_run_terminator(c) {
            return Err(self.invalid_character());
        }
        self.emit_word();
        self.pop();
        Ok(Step::Hold)
    }

    fn end_number(&mut self, c: u8, kind: TokenKind) -> Result<Step, LexError> {
        if !chars::is_run_terminator(c) {
            return Err(self.error_here(format!(
                "invalid character '{}' in numeric literal",
                self.current_char()
            )));
        }
        self.emit_number(kind)?;
        self.pop();
        Ok(Step::Hold)
    }

    fn emit_word(&mut self) {
        let word = &self.text[self.start.offset..self.pos];
        let kind = match Keyword::lookup(word) {
            Some(Keyword::True) | Some(Keyword::False) => TokenKind::BooleanLiteral,
            Some(_) => TokenKind::Keyword,
            None => TokenKind::Identifier,
        };
        self.emit(kind);
    }

    fn emit_number(&mut self, kind: TokenKind) -> Result<(), LexError> {
        let run = &self.src[self.start.offset..self.pos];
        let well_formed = match kind {
            TokenKind::HexadecimalLiteral | TokenKind::BinaryLiteral => run.len() > 2,
            TokenKind::DecimalLiteral | TokenKind::VersionLiteral => {
                run.last().is_some_and(|b| chars::is_digit(*b))
            }
            _ => true,
        };
        if !well_formed {
            return Err(self.error_at_start("malformed numeric literal"));
        }
        self.emit(kind);
        Ok(())
    }

    fn emit_line_comment(&mut self) {
        let mut end = self.pos;
        if end > self.start.offset && self.src[end - 1] == b'\r' {
            end -= 1;
        }
        self.emit_span(TokenKind::LineComment, end);
    }

    /// A `.` may only follow a digit inside a decimal or version run.
    fn expect_digit_before(&self, c: u8) -> Result<(), LexError> {
        if chars::is_digit(self.src[self.pos - 1]) {
            Ok(())
        } else {
            Err(self.error_here(format!("unexpected '{}' in numeric literal", c as char)))
        }
    }

    /// Close whatever run is open when input runs out.
    fn finish(&mut self) -> Result<(), LexError> {
        match self.state() {
            LexState::Whitespace => {}
            LexState::Alpha | LexState::AlphaDigit => self.emit_word(),
            LexState::Integer => self.emit_number(TokenKind::IntegerLiteral)?,
            LexState::Decimal => self.emit_number(TokenKind::DecimalLiteral)?,
            LexState::Version => self.emit_number(TokenKind::VersionLiteral)?,
            LexState::Hex => self.emit_number(TokenKind::HexadecimalLiteral)?,
            LexState::Binary => self.emit_number(TokenKind::BinaryLiteral)?,
            LexState::Single => {
                let first = self.src[self.start.offset];
                match TokenKind::from_single_char(first) {
                    Some(kind) => self.emit(kind),
                    None => return Err(self.error_at_start("invalid character")),
                }
            }
            LexState::Colon => self.emit(TokenKind::Colon),
            LexState::LineComment => self.emit_line_comment(),
            LexState::String => return Err(self.error_at_start("unterminated string literal")),
            LexState::BlockComment | LexState::BlockCommentClose => {
                return Err(self.error_at_start("unterminated block comment"))
            }
        }
        self.pop();
        Ok(())
    }

    // -- State stack --------------------------------------------

    fn begin(&mut self, state: LexState) {
        self.start = Location {
            line: self.line,
            column: self.column,
            offset: self.pos,
        };
        self.states.push(state);
    }

    fn switch(&mut self, state: LexState) {
        if let Some(top) = self.states.last_mut() {
            *top = state;
        }
    }

    fn pop(&mut self) {
        if self.states.len() > 1 {
            self.states.pop();
        }
    }

    // -- Input --------------------------------------------------

    fn bump(&mut self) {
        let c = self.src[self.pos];
        if c == b'\n' {
            self.newlines.push(self.pos);
            self.line += 1;
            self.column = 1;
        } else if c & 0xC0 != 0x80 {
            // UTF-8 continuation bytes share the column of their lead byte.
            self.column += 1;
        }
        self.pos += 1;
    }

    fn current_char(&self) -> char {
        self.text[self.pos..].chars().next().unwrap_or('\0')
    }

    // -- Output -------------------------------------------------

    fn emit(&mut self, kind: TokenKind) {
        self.emit_span(kind, self.pos);
    }

    fn emit_span(&mut self, kind: TokenKind, end: usize) {
        self.tokens.push(Token {
            kind,
            span: Span {
                start: self.start.offset,
                end,
            },
            location: self.start,
        });
    }

    // -- Errors -------------------------------------------------

    fn invalid_character(&self) -> LexError {
        self.error_here(format!("invalid character '{}'", self.current_char()))
    }

    fn error_here(&self, message: String) -> LexError {
        let here = Location {
            line: self.line,
            column: self.column,
            offset: self.pos,
        };
        self.error_at(here, message)
    }

    fn error_at_start(&self, message: &str) -> LexError {
        self.error_at(self.start, message.to_owned())
    }

    fn error_at(&self, at: Location, message: String) -> LexError {
        LexError::new(
            self.file,
            at.line,
            at.column,
            at.offset,
            line_at(self.text, at.offset),
            message,
        )
    }
}

fn line_at(text: &str, offset: usize) -> &str {
    let start = text[..offset].rfind('\n').map(|i| i + 1).unwrap_or(0);
    let end = text[offset..]
        .find('\n')
        .map(|i| offset + i)
        .unwrap_or(text.len());
    let line = &text[start..end];
    line.strip_suffix('\r').unwrap_or(line)
}

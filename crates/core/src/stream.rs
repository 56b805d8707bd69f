//! Per-file token storage with a cursor.
//!
//! A [`TokenStream`] owns the source text of one file and the tokens the
//! tokenizer produced for it. After tokenization the token sequence never
//! changes; only the cursor moves. A single saved-cursor slot supports the
//! parser's bounded lookahead.

use crate::error::StreamError;
use crate::token::{Location, Token, TokenKind};

#[derive(Debug)]
pub struct TokenStream {
    filename: String,
    source: String,
    tokens: Vec<Token>,
    /// Byte offsets of every `\n` in `source`.
    newlines: Vec<usize>,
    cursor: usize,
    saved: Option<usize>,
}

impl TokenStream {
    pub(crate) fn from_parts(
        filename: &str,
        source: String,
        tokens: Vec<Token>,
        newlines: Vec<usize>,
    ) -> Self {
        TokenStream {
            filename: filename.to_owned(),
            source,
            tokens,
            newlines,
            cursor: 0,
            saved: None,
        }
    }

    pub fn filename(&self) -> &str {
        &self.filename
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn tokens(&self) -> &[Token] {
        &self.tokens
    }

    pub fn newlines(&self) -> &[usize] {
        &self.newlines
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// The source text a token spans.
    pub fn text(&self, token: &Token) -> &str {
        token.text(&self.source)
    }

    // -- Cursor -------------------------------------------------

    pub fn position(&self) -> usize {
        self.cursor
    }

    pub fn at_end(&self) -> bool {
        self.cursor >= self.tokens.len()
    }

    /// The token under the cursor, `None` once every token is consumed.
    pub fn current(&self) -> Option<&Token> {
        self.tokens.get(self.cursor)
    }

    pub fn advance(&mut self) -> Result<(), StreamError> {
        if self.at_end() {
            return Err(StreamError::AtEnd);
        }
        self.cursor += 1;
        Ok(())
    }

    pub fn retreat(&mut self) -> Result<(), StreamError> {
        if self.cursor == 0 {
            return Err(StreamError::AtBegin);
        }
        self.cursor -= 1;
        Ok(())
    }

    /// The token `n` places after the cursor, without moving it.
    pub fn peek(&self, n: usize) -> Result<&Token, StreamError> {
        self.tokens
            .get(self.cursor + n)
            .ok_or(StreamError::OutOfRange { offset: n as isize })
    }

    /// The token just before the cursor.
    pub fn peek_behind(&self) -> Result<&Token, StreamError> {
        self.relative(-1)
    }

    pub fn relative(&self, offset: isize) -> Result<&Token, StreamError> {
        let index = self.cursor as isize + offset;
        if index < 0 {
            return Err(StreamError::OutOfRange { offset });
        }
        self.tokens
            .get(index as usize)
            .ok_or(StreamError::OutOfRange { offset })
    }

    pub fn current_kind(&self) -> Option<TokenKind> {
        self.current().map(|t| t.kind)
    }

    /// Save the cursor in the single mark slot.
    pub fn mark(&mut self) -> Result<(), StreamError> {
        if self.saved.is_some() {
            return Err(StreamError::MarkInUse);
        }
        self.saved = Some(self.cursor);
        Ok(())
    }

    /// Move the cursor back to the saved mark and clear the slot.
    pub fn restore(&mut self) -> Result<(), StreamError> {
        let saved = self.saved.take().ok_or(StreamError::NoMark)?;
        self.cursor = saved;
        Ok(())
    }

    /// Rewind to the first token, dropping any saved mark.
    pub fn reset(&mut self) {
        self.cursor = 0;
        self.saved = None;
    }

    // -- Diagnostics --------------------------------------------

    /// The full source line containing byte `offset`, without its newline.
    pub fn get_line(&self, offset: usize) -> &str {
        let bytes = self.source.as_bytes();
        let offset = offset.min(bytes.len());
        let mut start = offset;
        while start > 0 && bytes[start - 1] != b'\n' {
            start -= 1;
        }
        let mut end = offset;
        while end < bytes.len() && bytes[end] != b'\n' {
            end += 1;
        }
        let line = &self.source[start..end];
        line.strip_suffix('\r').unwrap_or(line)
    }

    /// Location just past the last token, used for end-of-input errors.
    pub fn end_location(&self) -> Location {
        let offset = self.source.len();
        let line_start = self.newlines.last().map(|n| n + 1).unwrap_or(0);
        Location {
            line: self.newlines.len() as u32 + 1,
            column: self.source[line_start..].chars().count() as u32 + 1,
            offset,
        }
    }
}

use serde::Serialize;
use std::path::PathBuf;

/// A lexical error. Fatal to the file being tokenized.
#[derive(Debug, Clone, PartialEq, Serialize, thiserror::Error)]
#[error("{file}:{line}:{column}: {message}")]
pub struct LexError {
    pub file: String,
    pub line: u32,
    pub column: u32,
    pub offset: usize,
    pub message: String,
    /// The offending source line, without its newline.
    pub source_line: String,
}

impl LexError {
    pub fn new(
        file: &str,
        line: u32,
        column: u32,
        offset: usize,
        source_line: &str,
        message: impl Into<String>,
    ) -> Self {
        LexError {
            file: file.to_owned(),
            line,
            column,
            offset,
            message: message.into(),
            source_line: source_line.to_owned(),
        }
    }

    /// An error that is not tied to a position, e.g. re-lexing a file.
    pub fn file(file: &str, message: impl Into<String>) -> Self {
        LexError::new(file, 0, 0, 0, "", message)
    }

    pub fn render(&self) -> String {
        render_diagnostic(
            &self.file,
            self.line,
            self.column,
            &self.source_line,
            &self.message,
        )
    }

    pub fn to_json_value(&self) -> serde_json::Value {
        serde_json::json!({
            "kind":        "lex",
            "file":        self.file,
            "line":        self.line,
            "column":      self.column,
            "offset":      self.offset,
            "message":     self.message,
            "source_line": self.source_line,
        })
    }
}

/// A parse error. Fatal to the whole compilation unit.
#[derive(Debug, Clone, PartialEq, Serialize, thiserror::Error)]
#[error("{file}:{line}:{column}: {message}")]
pub struct ParseError {
    pub file: String,
    pub line: u32,
    pub column: u32,
    pub offset: usize,
    pub message: String,
    pub source_line: String,
    /// Kind of the partially built node destroyed while unwinding.
    pub discarded: Option<String>,
    /// Names of the parse states active when the error was raised,
    /// outermost first. Only captured when the parser is configured to.
    pub states: Vec<String>,
}

impl ParseError {
    pub fn render(&self) -> String {
        let mut out = render_diagnostic(
            &self.file,
            self.line,
            self.column,
            &self.source_line,
            &self.message,
        );
        if !self.states.is_empty() {
            out.push_str("\n  while parsing: ");
            out.push_str(&self.states.join(" > "));
        }
        out
    }

    pub fn to_json_value(&self) -> serde_json::Value {
        serde_json::json!({
            "kind":        "parse",
            "file":        self.file,
            "line":        self.line,
            "column":      self.column,
            "offset":      self.offset,
            "message":     self.message,
            "source_line": self.source_line,
            "discarded":   self.discarded,
            "states":      self.states,
        })
    }
}

/// Cursor misuse on a [`TokenStream`](crate::stream::TokenStream).
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum StreamError {
    #[error("cursor is already past the last token")]
    AtEnd,
    #[error("cursor is already at the first token")]
    AtBegin,
    #[error("no token at relative offset {offset}")]
    OutOfRange { offset: isize },
    #[error("a cursor mark is already saved")]
    MarkInUse,
    #[error("no cursor mark to restore")]
    NoMark,
}

/// Any failure of the front end for one compilation unit.
#[derive(Debug, thiserror::Error)]
pub enum FrontendError {
    #[error(transparent)]
    Lex(#[from] LexError),
    #[error(transparent)]
    Parse(#[from] ParseError),
    #[error("cannot read '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl FrontendError {
    pub fn render(&self) -> String {
        match self {
            FrontendError::Lex(e) => e.render(),
            FrontendError::Parse(e) => e.render(),
            FrontendError::Io { .. } => format!("error: {}", self),
        }
    }

    pub fn to_json_value(&self) -> serde_json::Value {
        match self {
            FrontendError::Lex(e) => e.to_json_value(),
            FrontendError::Parse(e) => e.to_json_value(),
            FrontendError::Io { path, source } => serde_json::json!({
                "kind":    "io",
                "file":    path.display().to_string(),
                "message": source.to_string(),
            }),
        }
    }
}

/// Source line, a caret under the column, then the message.
fn render_diagnostic(file: &str, line: u32, column: u32, source_line: &str, message: &str) -> String {
    if line == 0 {
        return format!("{}: error: {}", file, message);
    }
    let caret_pad: String = source_line
        .chars()
        .take(column.saturating_sub(1) as usize)
        .map(|c| if c == '\t' { '\t' } else { ' ' })
        .collect();
    format!(
        "{}\n{}^\n{}:{}:{}: error: {}",
        source_line, caret_pad, file, line, column, message
    )
}

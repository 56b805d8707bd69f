//! Recursive-descent parser for one compilation unit.
//!
//! Every grammar production runs inside [`Parser::production`], which pushes
//! a [`ParseState`], remembers how much of the arena existed on entry, and on
//! failure destroys everything the production allocated before the error
//! propagates. A failed parse therefore never leaves a partially attached
//! subtree behind.
//!
//! Comments are collected lazily, the first time the parser looks at the
//! token after them, and attached to the innermost comment-accepting node
//! still being parsed. Comments met before that node exists are held back
//! and handed to it when it is created.
use tracing::{debug, trace};

use crate::ast::{Ast, NodeId, NodeKind};
use crate::error::{ParseError, StreamError};
use crate::stream::TokenStream;
use crate::token::{Keyword, Location, Token, TokenKind};

mod classes;
mod expressions;
mod statements;
mod units;

// ──────────────────────────────────────────────
// Parse states
// ──────────────────────────────────────────────

/// One grammar production. The active states form a stack that mirrors the
/// recursion, innermost last.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseState {
    Unit,
    CodeFragment,
    Flags,
    Module,
    Namespace,
    Statements,
    Statement,
    ClassBlock,
    ScopeBlock,
    RecordBlock,
    MessageBlock,
    MessageDeclaration,
    Param,
    ReturnType,
    TypeDeclaration,
    VariableDef,
    Assignment,
    Expression,
    ReturnExpression,
    GroupedExpression,
    SendMessage,
    Message,
    Argument,
    Literal,
    ArrayLiteral,
    Instance,
}

impl ParseState {
    pub fn name(self) -> &'static str {
        match self {
            ParseState::Unit => "unit",
            ParseState::CodeFragment => "code fragment",
            ParseState::Flags => "flags",
            ParseState::Module => "module",
            ParseState::Namespace => "namespace",
            ParseState::Statements => "statements",
            ParseState::Statement => "statement",
            ParseState::ClassBlock => "class",
            ParseState::ScopeBlock => "scope",
            ParseState::RecordBlock => "record",
            ParseState::MessageBlock => "message block",
            ParseState::MessageDeclaration => "message declaration",
            ParseState::Param => "parameter",
            ParseState::ReturnType => "return type",
            ParseState::TypeDeclaration => "type declaration",
            ParseState::VariableDef => "variable definition",
            ParseState::Assignment => "assignment",
            ParseState::Expression => "expression",
            ParseState::ReturnExpression => "return expression",
            ParseState::GroupedExpression => "grouped expression",
            ParseState::SendMessage => "message send",
            ParseState::Message => "message",
            ParseState::Argument => "argument",
            ParseState::Literal => "literal",
            ParseState::ArrayLiteral => "array literal",
            ParseState::Instance => "instance",
        }
    }
}

impl std::fmt::Display for ParseState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Knobs for a single parse.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParserOptions {
    /// Record the active state names in every [`ParseError`].
    pub capture_state_stack: bool,
}

impl Default for ParserOptions {
    fn default() -> Self {
        ParserOptions {
            capture_state_stack: cfg!(debug_assertions),
        }
    }
}

/// Deepest state stack a parse may build. Every production costs a few
/// native stack frames, so this bounds stack use on pathological input.
pub const MAX_NESTING: usize = 256;

// ──────────────────────────────────────────────
// Parser
// ──────────────────────────────────────────────

struct Parser<'s> {
    stream: &'s mut TokenStream,
    ast: Ast,
    options: ParserOptions,
    states: Vec<ParseState>,
    /// Open nodes that accept comments, innermost last.
    comment_targets: Vec<NodeId>,
    /// Comments seen before any comment-accepting node was open.
    pending_comments: Vec<NodeId>,
    /// Flags from an `@` prefix, consumed by the next allocated node.
    pending_flags: Option<Vec<String>>,
}

impl<'s> Parser<'s> {
    fn new(stream: &'s mut TokenStream, options: ParserOptions) -> Self {
        stream.reset();
        let ast = Ast::new(stream.filename());
        Parser {
            stream,
            ast,
            options,
            states: Vec::new(),
            comment_targets: Vec::new(),
            pending_comments: Vec::new(),
            pending_flags: None,
        }
    }

    // -- Token access -------------------------------------------

    /// Turn any comment tokens under the cursor into `Comment` nodes.
    fn collect_comments(&mut self) {
        while let Some(token) = self.stream.current().copied() {
            if !token.kind.is_comment() {
                break;
            }
            let text = self.stream.text(&token).to_owned();
            let comment = self.ast.alloc(NodeKind::Comment { text }, token.location);
            match self.comment_targets.last() {
                Some(target) => self.ast.attach_comment(*target, comment),
                None => self.pending_comments.push(comment),
            }
            if self.stream.advance().is_err() {
                break;
            }
        }
    }

    /// The next significant token.
    fn current(&mut self) -> Option<Token> {
        self.collect_comments();
        self.stream.current().copied()
    }

    fn peek_kind(&mut self) -> Option<TokenKind> {
        self.current().map(|t| t.kind)
    }

    fn at(&mut self, kind: TokenKind) -> bool {
        self.peek_kind() == Some(kind)
    }

    fn keyword(&mut self) -> Option<Keyword> {
        let token = self.current()?;
        if token.kind != TokenKind::Keyword {
            return None;
        }
        Keyword::lookup(self.stream.text(&token))
    }

    fn at_keyword(&mut self, keyword: Keyword) -> bool {
        self.keyword() == Some(keyword)
    }

    /// Location of the next significant token, or the end of input.
    fn location(&mut self) -> Location {
        match self.current() {
            Some(token) => token.location,
            None => self.stream.end_location(),
        }
    }

    fn bump(&mut self) -> Result<Token, ParseError> {
        let token = match self.current() {
            Some(token) => token,
            None => return Err(self.error("unexpected end of input")),
        };
        self.stream.advance().map_err(|e| self.stream_error(e))?;
        Ok(token)
    }

    fn text(&self, token: &Token) -> String {
        self.stream.text(token).to_owned()
    }

    fn expect(&mut self, kind: TokenKind, what: &str) -> Result<Token, ParseError> {
        if self.at(kind) {
            self.bump()
        } else {
            Err(self.error(format!("expected {}, found {}", what, self.found())))
        }
    }

    fn expect_keyword(&mut self, keyword: Keyword) -> Result<Token, ParseError> {
        if self.at_keyword(keyword) {
            self.bump()
        } else {
            Err(self.error(format!("expected '{}', found {}", keyword, self.found())))
        }
    }

    fn take_identifier(&mut self, what: &str) -> Result<String, ParseError> {
        let token = self.expect(TokenKind::Identifier, what)?;
        Ok(self.text(&token))
    }

    // -- Lookahead ----------------------------------------------

    /// Run `scan` over the upcoming tokens and put the cursor back. The scan
    /// skips comments without collecting them and never allocates nodes.
    fn speculate(&mut self, scan: impl FnOnce(&mut Self) -> bool) -> Result<bool, ParseError> {
        self.stream.mark().map_err(|e| self.stream_error(e))?;
        let matched = scan(self);
        self.stream.restore().map_err(|e| self.stream_error(e))?;
        Ok(matched)
    }

    /// Whether the next significant tokens have exactly these kinds.
    fn look_ahead(&mut self, pattern: &[TokenKind]) -> Result<bool, ParseError> {
        self.speculate(|p| pattern.iter().all(|kind| p.scan_accept(*kind)))
    }

    fn scan_kind(&mut self) -> Option<TokenKind> {
        while let Some(token) = self.stream.current() {
            if !token.kind.is_comment() {
                return Some(token.kind);
            }
            if self.stream.advance().is_err() {
                return None;
            }
        }
        None
    }

    fn scan_accept(&mut self, kind: TokenKind) -> bool {
        self.scan_kind() == Some(kind) && self.stream.advance().is_ok()
    }

    /// `IDENT ('.' IDENT)*`
    fn scan_dotted_name(&mut self) -> bool {
        if !self.scan_accept(TokenKind::Identifier) {
            return false;
        }
        while self.scan_kind() == Some(TokenKind::Dot) {
            if !(self.scan_accept(TokenKind::Dot) && self.scan_accept(TokenKind::Identifier)) {
                return false;
            }
        }
        true
    }

    // -- Nodes --------------------------------------------------

    /// Allocate a node. It takes any pending flags, and if it accepts
    /// comments it becomes the comment target until its production ends.
    fn open(&mut self, kind: NodeKind, location: Location) -> NodeId {
        let accepts_comments = kind.accepts_comments();
        let id = self.ast.alloc(kind, location);
        if let Some(flags) = self.pending_flags.take() {
            self.ast.set_flags(id, flags);
        }
        if accepts_comments {
            self.comment_targets.push(id);
            for comment in std::mem::take(&mut self.pending_comments) {
                self.ast.attach_comment(id, comment);
            }
        }
        id
    }

    // -- State guard --------------------------------------------

    /// Run one production under `state`. On success the state stack and
    /// comment targets are back where they were on entry. On failure every
    /// node allocated since entry is destroyed before the error is returned.
    fn production<T>(
        &mut self,
        state: ParseState,
        body: impl FnOnce(&mut Self) -> Result<T, ParseError>,
    ) -> Result<T, ParseError> {
        let depth = self.states.len();
        if depth >= MAX_NESTING {
            return Err(self.error("expression nested too deeply"));
        }
        let targets = self.comment_targets.len();
        let mark = self.ast.len();
        self.states.push(state);
        trace!(state = state.name(), depth, "enter");

        let result = match body(self) {
            Ok(_) if self.states.len() != depth + 1 || self.states.last() != Some(&state) => Err(
                self.error(format!("parser state corrupted while parsing {}", state)),
            ),
            other => other,
        };

        match result {
            Ok(value) => {
                trace!(state = state.name(), depth, "leave");
                self.states.truncate(depth);
                self.comment_targets.truncate(targets);
                Ok(value)
            }
            Err(mut err) => {
                if let Some(kind) = self.ast.discard_from(mark) {
                    if err.discarded.is_none() {
                        err.discarded = Some(kind.to_owned());
                    }
                }
                self.pending_comments.retain(|c| c.index() < mark);
                self.pending_flags = None;
                self.states.truncate(depth);
                self.comment_targets.truncate(targets);
                debug!(state = state.name(), line = err.line, column = err.column, "production failed");
                Err(err)
            }
        }
    }

    // -- Errors -------------------------------------------------

    /// The next significant token without collecting comments.
    fn significant(&self) -> Option<&Token> {
        let mut n = 0;
        while let Ok(token) = self.stream.peek(n) {
            if !token.kind.is_comment() {
                return Some(token);
            }
            n += 1;
        }
        None
    }

    fn found(&self) -> String {
        match self.significant() {
            Some(token) => format!("'{}'", self.stream.text(token)),
            None => "end of input".to_owned(),
        }
    }

    /// An error located at the next significant token.
    fn error(&self, message: impl Into<String>) -> ParseError {
        let at = match self.significant() {
            Some(token) => token.location,
            None => self.stream.end_location(),
        };
        self.error_at(at, message)
    }

    fn error_at(&self, at: Location, message: impl Into<String>) -> ParseError {
        let states = if self.options.capture_state_stack {
            self.states.iter().map(|s| s.name().to_owned()).collect()
        } else {
            Vec::new()
        };
        ParseError {
            file: self.stream.filename().to_owned(),
            line: at.line,
            column: at.column,
            offset: at.offset,
            message: message.into(),
            source_line: self.stream.get_line(at.offset).to_owned(),
            discarded: None,
            states,
        }
    }

    fn stream_error(&self, err: StreamError) -> ParseError {
        self.error(format!("token stream: {}", err))
    }
}

// ──────────────────────────────────────────────
// Entry points
// ──────────────────────────────────────────────

/// Parse the whole stream into a tree with default options. The cursor is
/// rewound first, so a stream can be parsed more than once.
pub fn parse(stream: &mut TokenStream) -> Result<Ast, ParseError> {
    parse_with_options(stream, ParserOptions::default())
}

pub fn parse_with_options(
    stream: &mut TokenStream,
    options: ParserOptions,
) -> Result<Ast, ParseError> {
    let result = Parser::new(stream, options).parse_unit();
    match &result {
        Ok(ast) => debug!(file = ast.file(), nodes = ast.len(), "parsed"),
        Err(err) => debug!(file = %err.file, message = %err.message, "parse failed"),
    }
    result
}

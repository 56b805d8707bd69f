#![allow(clippy::result_large_err)]
//! courier-core: front end of the Courier compiler.
//!
//! Turns `.cour` source text into an arena-allocated syntax tree in two
//! stages:
//!
//! - [`lexer`] -- a character-class automaton producing a [`TokenStream`]
//!   per file
//! - [`parser`] -- a recursive-descent parser producing an [`Ast`]
//!
//! [`frontend`] ties the two together for strings, files and multi-file
//! checks. Consumers walk the tree with an [`ast::Visitor`].

pub mod ast;
pub mod chars;
pub mod error;
pub mod frontend;
pub mod lexer;
pub mod parser;
pub mod source;
pub mod stream;
pub mod token;

// ── Convenience re-exports ───────────────────────────────────────────

pub use ast::{Ast, Node, NodeId, NodeKind, Phase, Visibility, Visitor};
pub use error::{FrontendError, LexError, ParseError, StreamError};
pub use frontend::{check_files, parse_file, parse_source, FileReport};
pub use lexer::{tokenize, Tokenizer};
pub use parser::{parse, parse_with_options, ParseState, ParserOptions};
pub use source::{FileSystemProvider, InMemoryProvider, SourceProvider};
pub use stream::TokenStream;
pub use token::{Keyword, Location, Span, Token, TokenKind};

/// File extension of Courier sources.
pub const SOURCE_EXTENSION: &str = "cour";

use serde::Serialize;
use std::fmt;

/// The kind of a lexical token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TokenKind {
    // Literals
    IntegerLiteral,
    DecimalLiteral,
    HexadecimalLiteral,
    BinaryLiteral,
    VersionLiteral,
    StringLiteral,
    BooleanLiteral,

    Identifier,
    Keyword,

    // Operators
    Plus,
    Minus,
    Multiply,
    Divide,
    Modulo,
    Assignment, // :=

    // Punctuation
    Colon,
    Comma,
    Dot,
    At,
    EndOfStatement, // ;

    // Brackets
    LeftParen,
    RightParen,
    LeftBrace,
    RightBrace,
    LeftBracket,
    RightBracket,

    // Comments
    LineComment,
    BlockComment,
}

impl TokenKind {
    pub fn name(self) -> &'static str {
        match self {
            TokenKind::IntegerLiteral => "INTEGER_LITERAL",
            TokenKind::DecimalLiteral => "DECIMAL_LITERAL",
            TokenKind::HexadecimalLiteral => "HEXADECIMAL_LITERAL",
            TokenKind::BinaryLiteral => "BINARY_LITERAL",
            TokenKind::VersionLiteral => "VERSION_LITERAL",
            TokenKind::StringLiteral => "STRING_LITERAL",
            TokenKind::BooleanLiteral => "BOOLEAN_LITERAL",
            TokenKind::Identifier => "IDENTIFIER",
            TokenKind::Keyword => "KEYWORD",
            TokenKind::Plus => "PLUS",
            TokenKind::Minus => "MINUS",
            TokenKind::Multiply => "MULTIPLY",
            TokenKind::Divide => "DIVIDE",
            TokenKind::Modulo => "MODULO",
            TokenKind::Assignment => "ASSIGNMENT",
            TokenKind::Colon => "COLON",
            TokenKind::Comma => "COMMA",
            TokenKind::Dot => "DOT",
            TokenKind::At => "AT",
            TokenKind::EndOfStatement => "END_OF_STATEMENT",
            TokenKind::LeftParen => "LEFT_PAREN",
            TokenKind::RightParen => "RIGHT_PAREN",
            TokenKind::LeftBrace => "LEFT_BRACE",
            TokenKind::RightBrace => "RIGHT_BRACE",
            TokenKind::LeftBracket => "LEFT_BRACKET",
            TokenKind::RightBracket => "RIGHT_BRACKET",
            TokenKind::LineComment => "LINE_COMMENT",
            TokenKind::BlockComment => "BLOCK_COMMENT",
        }
    }

    pub fn is_comment(self) -> bool {
        matches!(self, TokenKind::LineComment | TokenKind::BlockComment)
    }

    pub fn is_literal(self) -> bool {
        matches!(
            self,
            TokenKind::IntegerLiteral
                | TokenKind::DecimalLiteral
                | TokenKind::HexadecimalLiteral
                | TokenKind::BinaryLiteral
                | TokenKind::VersionLiteral
                | TokenKind::StringLiteral
                | TokenKind::BooleanLiteral
        )
    }

    /// Operators that may be used as a message selector.
    pub fn is_message_operator(self) -> bool {
        matches!(
            self,
            TokenKind::Plus
                | TokenKind::Minus
                | TokenKind::Multiply
                | TokenKind::Divide
                | TokenKind::Modulo
                | TokenKind::Assignment
        )
    }

    /// Kind of a token consisting of exactly one reserved character.
    pub fn from_single_char(c: u8) -> Option<TokenKind> {
        let kind = match c {
            b'+' => TokenKind::Plus,
            b'-' => TokenKind::Minus,
            b'*' => TokenKind::Multiply,
            b'/' => TokenKind::Divide,
            b'%' => TokenKind::Modulo,
            b',' => TokenKind::Comma,
            b'.' => TokenKind::Dot,
            b'@' => TokenKind::At,
            b';' => TokenKind::EndOfStatement,
            b'(' => TokenKind::LeftParen,
            b')' => TokenKind::RightParen,
            b'{' => TokenKind::LeftBrace,
            b'}' => TokenKind::RightBrace,
            b'[' => TokenKind::LeftBracket,
            b']' => TokenKind::RightBracket,
            _ => return None,
        };
        Some(kind)
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Byte range of a token inside its file's source text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }
}

/// Where a token starts. Lines and columns are 1-based; `offset` is the
/// byte offset into the source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct Location {
    pub line: u32,
    pub column: u32,
    pub offset: usize,
}

/// An immutable token. Its text is a span into the owning
/// [`TokenStream`](crate::stream::TokenStream)'s source, see
/// [`TokenStream::text`](crate::stream::TokenStream::text).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Token {
    pub kind: TokenKind,
    pub span: Span,
    pub location: Location,
}

impl Token {
    pub fn text<'s>(&self, source: &'s str) -> &'s str {
        &source[self.span.start..self.span.end]
    }
}

// ──────────────────────────────────────────────
// Keywords
// ──────────────────────────────────────────────

/// Reserved words, matched case-insensitively.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Keyword {
    If,
    Else,
    True,
    False,
    Module,
    Program,
    Lib,
    Import,
    Namespace,
    Class,
    Record,
    Inherits,
    Implements,
    Private,
    Public,
    Static,
    Return,
    Nil,
    SelfRef,
    Super,
    Msg,
}

pub const KEYWORDS: &[(&str, Keyword)] = &[
    ("if", Keyword::If),
    ("else", Keyword::Else),
    ("true", Keyword::True),
    ("false", Keyword::False),
    ("module", Keyword::Module),
    ("program", Keyword::Program),
    ("lib", Keyword::Lib),
    ("import", Keyword::Import),
    ("namespace", Keyword::Namespace),
    ("class", Keyword::Class),
    ("record", Keyword::Record),
    ("inherits", Keyword::Inherits),
    ("implements", Keyword::Implements),
    ("private", Keyword::Private),
    ("public", Keyword::Public),
    ("static", Keyword::Static),
    ("return", Keyword::Return),
    ("nil", Keyword::Nil),
    ("self", Keyword::SelfRef),
    ("super", Keyword::Super),
    ("msg", Keyword::Msg),
];

impl Keyword {
    pub fn lookup(word: &str) -> Option<Keyword> {
        KEYWORDS
            .iter()
            .find(|(text, _)| text.eq_ignore_ascii_case(word))
            .map(|(_, kw)| *kw)
    }

    pub fn as_str(self) -> &'static str {
        KEYWORDS
            .iter()
            .find(|(_, kw)| *kw == self)
            .map(|(text, _)| *text)
            .unwrap_or("?")
    }
}

impl fmt::Display for Keyword {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keyword_lookup_ignores_case() {
        assert_eq!(Keyword::lookup("MODULE"), Some(Keyword::Module));
        assert_eq!(Keyword::lookup("Msg"), Some(Keyword::Msg));
        assert_eq!(Keyword::lookup("self"), Some(Keyword::SelfRef));
        assert_eq!(Keyword::lookup("fooBar"), None);
    }

    #[test]
    fn keyword_table_has_every_reserved_word() {
        assert_eq!(KEYWORDS.len(), 21);
        for (text, kw) in KEYWORDS {
            assert_eq!(kw.as_str(), *text);
        }
    }

    #[test]
    fn single_char_kinds() {
        assert_eq!(TokenKind::from_single_char(b';'), Some(TokenKind::EndOfStatement));
        assert_eq!(TokenKind::from_single_char(b'%'), Some(TokenKind::Modulo));
        assert_eq!(TokenKind::from_single_char(b':'), None);
        assert_eq!(TokenKind::from_single_char(b'#'), None);
    }

    #[test]
    fn kind_names_match_serialized_form() {
        let json = serde_json::to_value(TokenKind::HexadecimalLiteral).unwrap();
        assert_eq!(json, serde_json::json!("HEXADECIMAL_LITERAL"));
        assert_eq!(TokenKind::HexadecimalLiteral.to_string(), "HEXADECIMAL_LITERAL");
    }
}

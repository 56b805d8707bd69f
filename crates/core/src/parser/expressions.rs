use super::{ParseState, Parser};
use crate::ast::{NodeId, NodeKind};
use crate::error::ParseError;
use crate::token::{Keyword, TokenKind};

impl<'s> Parser<'s> {
    /// `returnExpression | primary message?`
    pub(super) fn parse_expression(&mut self) -> Result<NodeId, ParseError> {
        self.production(ParseState::Expression, |p| {
            if p.at_keyword(Keyword::Return) {
                return p.parse_return_expression();
            }
            let primary = p.parse_primary()?;
            if p.starts_message() {
                p.parse_send_message(primary)
            } else {
                Ok(primary)
            }
        })
    }

    /// A message parameter or assigned value. Anything but `return`.
    pub(super) fn parse_argument(&mut self) -> Result<NodeId, ParseError> {
        self.production(ParseState::Argument, |p| {
            if p.at_keyword(Keyword::Return) {
                return Err(p.error("'return' cannot be used as a value"));
            }
            p.parse_expression()
        })
    }

    fn starts_message(&mut self) -> bool {
        match self.peek_kind() {
            Some(TokenKind::Identifier) => true,
            Some(kind) => kind.is_message_operator(),
            None => false,
        }
    }

    /// `'return' argument?`. A bare `return` returns `nil`.
    fn parse_return_expression(&mut self) -> Result<NodeId, ParseError> {
        self.production(ParseState::ReturnExpression, |p| {
            let start = p.location();
            p.expect_keyword(Keyword::Return)?;
            let ret = p.open(NodeKind::ReturnExpression, start);
            let value = if p.at(TokenKind::EndOfStatement) {
                let at = p.location();
                p.open(NodeKind::Nil, at)
            } else {
                p.parse_argument()?
            };
            p.ast.attach(ret, value);
            Ok(ret)
        })
    }

    fn parse_primary(&mut self) -> Result<NodeId, ParseError> {
        match (self.peek_kind(), self.keyword()) {
            (Some(TokenKind::LeftParen), _) => self.parse_grouped_expression(),
            (Some(TokenKind::LeftBracket), _) => self.parse_array_literal(),
            (Some(kind), _) if kind.is_literal() => self.parse_literal(),
            (_, Some(Keyword::Nil)) => self.parse_literal(),
            (_, Some(Keyword::Msg)) => self.parse_message_block(),
            (Some(TokenKind::Identifier), _) | (_, Some(Keyword::SelfRef | Keyword::Super)) => {
                self.parse_instance()
            }
            _ => Err(self.error(format!("expected expression, found {}", self.found()))),
        }
    }

    /// `'(' expression ')'`
    fn parse_grouped_expression(&mut self) -> Result<NodeId, ParseError> {
        self.production(ParseState::GroupedExpression, |p| {
            let start = p.location();
            p.expect(TokenKind::LeftParen, "'('")?;
            let group = p.open(NodeKind::GroupedExpression, start);
            let inner = p.parse_expression()?;
            p.ast.attach(group, inner);
            p.expect(TokenKind::RightParen, "')'")?;
            Ok(group)
        })
    }

    /// `receiver message`
    fn parse_send_message(&mut self, receiver: NodeId) -> Result<NodeId, ParseError> {
        self.production(ParseState::SendMessage, |p| {
            let at = p.ast.node(receiver).location();
            let send = p.open(NodeKind::SendMessage, at);
            let message = p.parse_message()?;
            p.ast.attach(send, receiver);
            p.ast.attach(send, message);
            Ok(send)
        })
    }

    /// `IDENT (':' argument)*` or `operator argument`
    fn parse_message(&mut self) -> Result<NodeId, ParseError> {
        self.production(ParseState::Message, |p| {
            let start = p.location();
            match p.peek_kind() {
                Some(TokenKind::Identifier) => {
                    let name = p.take_identifier("message name")?;
                    let message = p.open(
                        NodeKind::Message {
                            name,
                            return_value: None,
                        },
                        start,
                    );
                    while p.at(TokenKind::Colon) {
                        p.bump()?;
                        let param = p.parse_argument()?;
                        p.ast.attach(message, param);
                    }
                    Ok(message)
                }
                Some(kind) if kind.is_message_operator() => {
                    let operator = p.bump()?;
                    let name = p.text(&operator);
                    let message = p.open(
                        NodeKind::Message {
                            name,
                            return_value: None,
                        },
                        start,
                    );
                    let param = p.parse_argument()?;
                    p.ast.attach(message, param);
                    Ok(message)
                }
                _ => Err(p.error(format!("expected message, found {}", p.found()))),
            }
        })
    }

    // -- Values -------------------------------------------------

    fn parse_literal(&mut self) -> Result<NodeId, ParseError> {
        self.production(ParseState::Literal, |p| {
            let is_nil = p.at_keyword(Keyword::Nil);
            let token = p.bump()?;
            let value = p.text(&token);
            let kind = match token.kind {
                TokenKind::IntegerLiteral => NodeKind::IntegerLiteral { value },
                TokenKind::DecimalLiteral => NodeKind::DecimalLiteral { value },
                TokenKind::HexadecimalLiteral => NodeKind::HexLiteral { value },
                TokenKind::BinaryLiteral => NodeKind::BinaryLiteral { value },
                TokenKind::BooleanLiteral => NodeKind::BooleanLiteral {
                    value: value.to_ascii_lowercase(),
                },
                TokenKind::StringLiteral => NodeKind::StringLiteral {
                    value: unquote(&value).to_owned(),
                },
                TokenKind::Keyword if is_nil => NodeKind::Nil,
                _ => {
                    return Err(p.error_at(
                        token.location,
                        format!("'{}' cannot be used as a value", value),
                    ))
                }
            };
            Ok(p.open(kind, token.location))
        })
    }

    /// `'[' (element (',' element)*)? ']'` where an element is a literal or
    /// an instance.
    fn parse_array_literal(&mut self) -> Result<NodeId, ParseError> {
        self.production(ParseState::ArrayLiteral, |p| {
            let start = p.location();
            p.expect(TokenKind::LeftBracket, "'['")?;
            let array = p.open(NodeKind::ArrayLiteral, start);
            if !p.at(TokenKind::RightBracket) {
                loop {
                    let element = match (p.peek_kind(), p.keyword()) {
                        (Some(kind), _) if kind.is_literal() => p.parse_literal()?,
                        (_, Some(Keyword::Nil)) => p.parse_literal()?,
                        (Some(TokenKind::Identifier), _) => p.parse_instance()?,
                        _ => {
                            return Err(p.error(format!(
                                "expected literal or name in array literal, found {}",
                                p.found()
                            )))
                        }
                    };
                    p.ast.attach(array, element);
                    if !p.at(TokenKind::Comma) {
                        break;
                    }
                    p.bump()?;
                }
            }
            if !p.at(TokenKind::RightBracket) {
                return Err(p.error_at(start, "unterminated array literal"));
            }
            p.bump()?;
            Ok(array)
        })
    }

    /// `(IDENT | 'self' | 'super') ('.' IDENT)*`
    pub(super) fn parse_instance(&mut self) -> Result<NodeId, ParseError> {
        self.production(ParseState::Instance, |p| {
            let start = p.location();
            let mut name = match (p.peek_kind(), p.keyword()) {
                (Some(TokenKind::Identifier), _)
                | (_, Some(Keyword::SelfRef | Keyword::Super)) => {
                    let token = p.bump()?;
                    p.text(&token)
                }
                _ => return Err(p.error(format!("expected a name, found {}", p.found()))),
            };
            while p.at(TokenKind::Dot) {
                p.bump()?;
                name.push('.');
                name.push_str(&p.take_identifier("name after '.'")?);
            }
            Ok(p.open(
                NodeKind::Instance {
                    name,
                    type_name: None,
                },
                start,
            ))
        })
    }
}

/// Token text of a string literal without its delimiting quotes.
fn unquote(text: &str) -> &str {
    match text.strip_prefix('"').and_then(|t| t.strip_suffix('"')) {
        Some(inner) => inner,
        None => text,
    }
}

use super::{ParseState, Parser};
use crate::ast::{NodeId, NodeKind};
use crate::error::ParseError;
use crate::token::{Keyword, TokenKind};

impl<'s> Parser<'s> {
    /// Statements up to, not including, the closing `}`. Always yields a
    /// block, possibly empty.
    pub(super) fn parse_statements(&mut self) -> Result<NodeId, ParseError> {
        self.production(ParseState::Statements, |p| {
            let start = p.location();
            let block = p.open(NodeKind::StatementsBlock, start);
            while !matches!(p.peek_kind(), Some(TokenKind::RightBrace) | None) {
                let statement = p.parse_statement()?;
                p.ast.attach(block, statement);
            }
            Ok(block)
        })
    }

    /// A class or record block, or a variable definition, assignment or
    /// expression terminated by `;`.
    ///
    /// The forms starting with an identifier are told apart by lookahead:
    /// `IDENT ':' typeName ';'` is a definition, `IDENT ':'` otherwise starts
    /// a typed assignment, `IDENT ('.' IDENT)* ':='` a plain one.
    fn parse_statement(&mut self) -> Result<NodeId, ParseError> {
        self.production(ParseState::Statement, |p| {
            match p.keyword() {
                Some(Keyword::Class) => return p.parse_class_block(),
                Some(Keyword::Record) => return p.parse_record_block(),
                _ => {}
            }
            let node = if p.at(TokenKind::Identifier) {
                if p.looks_like_variable_def()? {
                    p.parse_variable_def()?
                } else if p.look_ahead(&[TokenKind::Identifier, TokenKind::Colon])?
                    || p.looks_like_plain_assignment()?
                {
                    p.parse_assignment()?
                } else {
                    p.parse_expression()?
                }
            } else {
                p.parse_expression()?
            };
            p.expect(TokenKind::EndOfStatement, "';'")?;
            Ok(node)
        })
    }

    fn looks_like_variable_def(&mut self) -> Result<bool, ParseError> {
        self.speculate(|p| {
            p.scan_accept(TokenKind::Identifier)
                && p.scan_accept(TokenKind::Colon)
                && p.scan_dotted_name()
                && p.scan_accept(TokenKind::EndOfStatement)
        })
    }

    fn looks_like_plain_assignment(&mut self) -> Result<bool, ParseError> {
        self.speculate(|p| p.scan_dotted_name() && p.scan_accept(TokenKind::Assignment))
    }

    /// `IDENT ':' typeName`
    pub(super) fn parse_variable_def(&mut self) -> Result<NodeId, ParseError> {
        self.production(ParseState::VariableDef, |p| {
            let start = p.location();
            let name = p.take_identifier("variable name")?;
            p.expect(TokenKind::Colon, "':' after variable name")?;
            let type_name = p.parse_type_declaration()?;
            Ok(p.open(
                NodeKind::Variable {
                    name,
                    type_name: Some(type_name),
                },
                start,
            ))
        })
    }

    /// `(variableDef | instance) ':=' expression`. The right-hand side is
    /// the single parameter of a `:=` message.
    fn parse_assignment(&mut self) -> Result<NodeId, ParseError> {
        self.production(ParseState::Assignment, |p| {
            let start = p.location();
            let assignment = p.open(NodeKind::Assignment, start);
            let target = if p.look_ahead(&[TokenKind::Identifier, TokenKind::Colon])? {
                p.parse_variable_def()?
            } else {
                p.parse_instance()?
            };
            let operator = p.expect(TokenKind::Assignment, "':='")?;
            let message = p.open(
                NodeKind::Message {
                    name: ":=".to_owned(),
                    return_value: None,
                },
                operator.location,
            );
            let value = p.parse_argument()?;
            p.ast.attach(message, value);
            p.ast.attach(assignment, target);
            p.ast.attach(assignment, message);
            Ok(assignment)
        })
    }

    /// `IDENT ('.' IDENT)*`, returned as the joined name.
    pub(super) fn parse_type_declaration(&mut self) -> Result<String, ParseError> {
        self.production(ParseState::TypeDeclaration, |p| {
            let mut name = p.take_identifier("type name")?;
            while p.at(TokenKind::Dot) {
                p.bump()?;
                name.push('.');
                name.push_str(&p.take_identifier("type name after '.'")?);
            }
            Ok(name)
        })
    }
}

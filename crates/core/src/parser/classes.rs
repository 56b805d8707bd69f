use super::{ParseState, Parser};
use crate::ast::{NodeId, NodeKind, Visibility};
use crate::error::ParseError;
use crate::token::{Keyword, TokenKind};

impl<'s> Parser<'s> {
    // -- Classes and records ------------------------------------

    /// `'class' IDENT ('inherits' typeName)? '{' (scope | flags? messageBlock)* '}'`
    pub(super) fn parse_class_block(&mut self) -> Result<NodeId, ParseError> {
        self.production(ParseState::ClassBlock, |p| {
            let start = p.location();
            p.expect_keyword(Keyword::Class)?;
            let name = p.take_identifier("class name")?;
            let superclass = p.parse_inherits()?;
            let class = p.open(NodeKind::ClassBlock { name, superclass }, start);
            p.expect(TokenKind::LeftBrace, "'{'")?;
            loop {
                match (p.peek_kind(), p.keyword()) {
                    (Some(TokenKind::RightBrace), _) | (None, _) => break,
                    (_, Some(Keyword::Public | Keyword::Private)) => {
                        let scope = p.parse_scope_block()?;
                        p.ast.attach(class, scope);
                    }
                    (Some(TokenKind::At), _) | (_, Some(Keyword::Msg)) => {
                        if p.at(TokenKind::At) {
                            p.parse_flags()?;
                        }
                        let block = p.parse_message_block()?;
                        p.ast.attach(class, block);
                    }
                    _ => {
                        return Err(p.error(format!(
                            "expected 'public', 'private' or 'msg' in class body, found {}",
                            p.found()
                        )))
                    }
                }
            }
            p.expect(TokenKind::RightBrace, "'}'")?;
            Ok(class)
        })
    }

    /// `'record' IDENT ('inherits' typeName)? '{' (variableDef ';')* '}'`
    pub(super) fn parse_record_block(&mut self) -> Result<NodeId, ParseError> {
        self.production(ParseState::RecordBlock, |p| {
            let start = p.location();
            p.expect_keyword(Keyword::Record)?;
            let name = p.take_identifier("record name")?;
            let superclass = p.parse_inherits()?;
            let record = p.open(NodeKind::RecordBlock { name, superclass }, start);
            p.expect(TokenKind::LeftBrace, "'{'")?;
            p.parse_member_variables(record)?;
            p.expect(TokenKind::RightBrace, "'}'")?;
            Ok(record)
        })
    }

    fn parse_inherits(&mut self) -> Result<Option<String>, ParseError> {
        if !self.at_keyword(Keyword::Inherits) {
            return Ok(None);
        }
        self.bump()?;
        Ok(Some(self.parse_type_declaration()?))
    }

    /// `('public' | 'private') '{' (variableDef ';')* '}'`
    fn parse_scope_block(&mut self) -> Result<NodeId, ParseError> {
        self.production(ParseState::ScopeBlock, |p| {
            let start = p.location();
            let visibility = match p.keyword() {
                Some(Keyword::Public) => Visibility::Public,
                Some(Keyword::Private) => Visibility::Private,
                _ => {
                    return Err(p.error(format!(
                        "expected 'public' or 'private', found {}",
                        p.found()
                    )))
                }
            };
            p.bump()?;
            let scope = p.open(NodeKind::Scope { visibility }, start);
            p.expect(TokenKind::LeftBrace, "'{'")?;
            p.parse_member_variables(scope)?;
            p.expect(TokenKind::RightBrace, "'}'")?;
            Ok(scope)
        })
    }

    fn parse_member_variables(&mut self, owner: NodeId) -> Result<(), ParseError> {
        while !matches!(self.peek_kind(), Some(TokenKind::RightBrace) | None) {
            let variable = self.parse_variable_def()?;
            self.expect(TokenKind::EndOfStatement, "';'")?;
            self.ast.attach(owner, variable);
        }
        Ok(())
    }

    // -- Messages -----------------------------------------------

    /// `messageDecl '{' statements '}'`. Also used for closures, where the
    /// declaration has no name.
    pub(super) fn parse_message_block(&mut self) -> Result<NodeId, ParseError> {
        self.production(ParseState::MessageBlock, |p| {
            let start = p.location();
            let block = p.open(NodeKind::MessageBlock, start);
            let declaration = p.parse_message_declaration()?;
            p.ast.attach(block, declaration);
            p.expect(TokenKind::LeftBrace, "'{'")?;
            let statements = p.parse_statements()?;
            p.ast.attach(block, statements);
            p.expect(TokenKind::RightBrace, "'}'")?;
            Ok(block)
        })
    }

    /// `'msg' IDENT? ((':' | '(') params ')'?)? returnType?`
    fn parse_message_declaration(&mut self) -> Result<NodeId, ParseError> {
        self.production(ParseState::MessageDeclaration, |p| {
            let start = p.location();
            p.expect_keyword(Keyword::Msg)?;
            let name = if p.at(TokenKind::Identifier) {
                Some(p.take_identifier("message name")?)
            } else {
                None
            };
            let declaration = p.open(NodeKind::MessageDeclaration { name }, start);
            match p.peek_kind() {
                Some(TokenKind::Colon) => {
                    p.bump()?;
                    p.parse_params(declaration)?;
                }
                Some(TokenKind::LeftParen) => {
                    p.bump()?;
                    if !p.at(TokenKind::RightParen) {
                        p.parse_params(declaration)?;
                    }
                    p.expect(TokenKind::RightParen, "')' after parameters")?;
                }
                _ => {}
            }
            if p.at(TokenKind::LeftBracket) {
                let returns = p.parse_return_type()?;
                p.ast.attach(declaration, returns);
            }
            Ok(declaration)
        })
    }

    fn parse_params(&mut self, declaration: NodeId) -> Result<(), ParseError> {
        loop {
            let param = self.parse_param()?;
            self.ast.attach(declaration, param);
            if !self.at(TokenKind::Comma) {
                return Ok(());
            }
            self.bump()?;
        }
    }

    /// `IDENT ':' typeName`
    fn parse_param(&mut self) -> Result<NodeId, ParseError> {
        self.production(ParseState::Param, |p| {
            let start = p.location();
            let name = p.take_identifier("parameter name")?;
            p.expect(TokenKind::Colon, "':' after parameter name")?;
            let type_name = p.parse_type_declaration()?;
            Ok(p.open(NodeKind::Param { name, type_name }, start))
        })
    }

    /// `'[' typeName (',' typeName)* ']'` or the named form
    /// `'[' IDENT ':' typeName (',' ...)* ']'`
    fn parse_return_type(&mut self) -> Result<NodeId, ParseError> {
        self.production(ParseState::ReturnType, |p| {
            let start = p.location();
            p.expect(TokenKind::LeftBracket, "'['")?;
            let named = p.look_ahead(&[TokenKind::Identifier, TokenKind::Colon])?;
            let mut types = Vec::new();
            let mut fields = Vec::new();
            loop {
                if named {
                    let name = p.take_identifier("field name")?;
                    p.expect(TokenKind::Colon, "':' after field name")?;
                    fields.push((name, p.parse_type_declaration()?));
                } else {
                    types.push(p.parse_type_declaration()?);
                }
                if !p.at(TokenKind::Comma) {
                    break;
                }
                p.bump()?;
            }
            if !p.at(TokenKind::RightBracket) {
                return Err(p.error(format!(
                    "missing ']' to close the return type, found {}",
                    p.found()
                )));
            }
            p.bump()?;
            let kind = if named {
                NodeKind::NamedTuple { fields }
            } else {
                NodeKind::Tuple { fields: types }
            };
            Ok(p.open(kind, start))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::super::tests::{dump, parse_src};
    use crate::ast::NodeKind;

    #[test]
    fn class_with_scope_and_message() {
        let src = "{ class A inherits B { public { y:string; } msg hello { } } }";
        assert_eq!(
            dump(src),
            vec![
                "CodeFragmentBlock",
                "  StatementsBlock",
                "    ClassBlock A inherits B",
                "      Scope public",
                "        Variable y : string",
                "      MessageBlock",
                "        MessageDeclaration hello",
                "        StatementsBlock",
            ]
        );
    }

    #[test]
    fn class_children_are_exactly_one_scope_and_one_message_block() {
        let ast = parse_src("{ class A inherits B { public { y:string; } msg hello { } } }").unwrap();
        let class = ast
            .ids()
            .find(|id| matches!(ast.kind(*id), NodeKind::ClassBlock { .. }))
            .unwrap();
        let kinds: Vec<&str> = ast.children(class).iter().map(|c| ast.kind(*c).name()).collect();
        assert_eq!(kinds, vec!["Scope", "MessageBlock"]);
    }

    #[test]
    fn record_with_members() {
        assert_eq!(
            dump("{ record P inherits base.Point { x:int32; y:int32; } }")[2..],
            [
                "    RecordBlock P inherits base.Point",
                "      Variable x : int32",
                "      Variable y : int32",
            ]
        );
    }

    #[test]
    fn colon_and_paren_parameter_forms() {
        let colon = dump("{ class A { msg add: a:int32, b:int32 [int32] { } } }");
        let paren = dump("{ class A { msg add (a:int32, b:int32) [int32] { } } }");
        assert_eq!(colon, paren);
        assert_eq!(
            colon[4..8],
            [
                "        MessageDeclaration add",
                "          Param a : int32",
                "          Param b : int32",
                "          Tuple [int32]",
            ]
        );
    }

    #[test]
    fn named_return_tuple() {
        let lines = dump("{ class A { msg div: a:int32 [q:int32, r:int32] { } } }");
        assert_eq!(lines[6], "          NamedTuple [q:int32, r:int32]");
    }

    #[test]
    fn flags_go_to_the_message_block() {
        let lines = dump("{ class A { @[inline] msg f { } } }");
        assert_eq!(lines[3], "      MessageBlock @[inline]");
        assert_eq!(lines[4], "        MessageDeclaration f");
    }

    #[test]
    fn missing_return_bracket_is_an_error() {
        let err = parse_src("{ class A { msg f [int32 { } } }").unwrap_err();
        assert_eq!(err.message, "missing ']' to close the return type, found '{'");
    }

    #[test]
    fn missing_class_brace_raises_one_error_after_last_construct() {
        let src = "{\n  class A {\n    public { y:string; }\n    msg hello { }\n  x := 1;\n}";
        let err = parse_src(src).unwrap_err();
        assert_eq!((err.line, err.column), (5, 3));
        assert_eq!(
            err.message,
            "expected 'public', 'private' or 'msg' in class body, found 'x'"
        );
        assert_eq!(err.discarded.as_deref(), Some("ClassBlock"));
    }

    #[test]
    fn unclosed_paren_parameters() {
        let err = parse_src("{ class A { msg f (a:int32 { } } }").unwrap_err();
        assert_eq!(err.message, "expected ')' after parameters, found '{'");
    }

    #[test]
    fn scope_accepts_only_variable_definitions() {
        let err = parse_src("{ class A { private { x := 1; } } }").unwrap_err();
        assert_eq!(err.message, "expected ':' after variable name, found ':='");
    }
}

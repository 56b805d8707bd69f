use super::{ParseState, Parser};
use crate::ast::{Ast, NodeId, NodeKind};
use crate::error::ParseError;
use crate::token::{Keyword, TokenKind};

impl<'s> Parser<'s> {
    // -- Compilation unit ---------------------------------------

    pub(super) fn parse_unit(mut self) -> Result<Ast, ParseError> {
        let root = self.production(ParseState::Unit, |p| {
            let root = match (p.peek_kind(), p.keyword()) {
                (Some(TokenKind::At), _) | (Some(TokenKind::LeftBrace), _) => {
                    p.parse_code_fragment()?
                }
                (_, Some(Keyword::Module)) => p.parse_module()?,
                (_, Some(Keyword::Program)) | (_, Some(Keyword::Lib)) => {
                    return Err(p.error("program and library units are not supported"));
                }
                (None, _) => return Err(p.error("empty compilation unit")),
                _ => {
                    return Err(p.error(format!(
                        "expected '{{', '@' or 'module', found {}",
                        p.found()
                    )))
                }
            };
            if p.current().is_some() {
                return Err(p.error(format!(
                    "unexpected {} after the end of the compilation unit",
                    p.found()
                )));
            }
            Ok(root)
        })?;

        // Comments after the last token have no open node left to go to.
        for comment in std::mem::take(&mut self.pending_comments) {
            self.ast.attach_comment(root, comment);
        }
        self.ast.set_root(root);
        Ok(self.ast)
    }

    /// `flags? '{' (namespace* | statements) '}'`
    pub(super) fn parse_code_fragment(&mut self) -> Result<NodeId, ParseError> {
        self.production(ParseState::CodeFragment, |p| {
            let start = p.location();
            if p.at(TokenKind::At) {
                p.parse_flags()?;
            }
            let fragment = p.open(NodeKind::CodeFragmentBlock, start);
            p.expect(TokenKind::LeftBrace, "'{'")?;
            p.parse_block_body(fragment)?;
            p.expect(TokenKind::RightBrace, "'}'")?;
            Ok(fragment)
        })
    }

    /// Either a run of namespaces or one (possibly empty) statements block.
    fn parse_block_body(&mut self, owner: NodeId) -> Result<(), ParseError> {
        if !self.at_keyword(Keyword::Namespace) {
            let statements = self.parse_statements()?;
            self.ast.attach(owner, statements);
            return Ok(());
        }
        while self.at_keyword(Keyword::Namespace) {
            let namespace = self.parse_namespace()?;
            self.ast.attach(owner, namespace);
        }
        if !matches!(self.peek_kind(), Some(TokenKind::RightBrace) | None) {
            return Err(self.error(format!(
                "expected 'namespace' or '}}', found {}",
                self.found()
            )));
        }
        Ok(())
    }

    fn parse_namespace(&mut self) -> Result<NodeId, ParseError> {
        self.production(ParseState::Namespace, |p| {
            let start = p.location();
            p.expect_keyword(Keyword::Namespace)?;
            let name = p.take_identifier("namespace name")?;
            let namespace = p.open(NodeKind::NamespaceBlock { name }, start);
            p.expect(TokenKind::LeftBrace, "'{'")?;
            p.parse_block_body(namespace)?;
            p.expect(TokenKind::RightBrace, "'}'")?;
            Ok(namespace)
        })
    }

    /// `'module' IDENT (',' version)? '{' codeFragment '}'`
    fn parse_module(&mut self) -> Result<NodeId, ParseError> {
        self.production(ParseState::Module, |p| {
            let start = p.location();
            p.expect_keyword(Keyword::Module)?;
            let name = p.take_identifier("module name")?;
            let version = if p.at(TokenKind::Comma) {
                p.bump()?;
                match p.peek_kind() {
                    Some(
                        TokenKind::VersionLiteral
                        | TokenKind::DecimalLiteral
                        | TokenKind::IntegerLiteral,
                    ) => {
                        let token = p.bump()?;
                        Some(p.text(&token))
                    }
                    _ => {
                        return Err(p.error(format!(
                            "expected module version, found {}",
                            p.found()
                        )))
                    }
                }
            } else {
                None
            };
            let module = p.open(NodeKind::ModuleBlock { name, version }, start);
            p.expect(TokenKind::LeftBrace, "'{'")?;
            let fragment = p.parse_code_fragment()?;
            p.ast.attach(module, fragment);
            p.expect(TokenKind::RightBrace, "'}'")?;
            Ok(module)
        })
    }

    /// `'@' ('[' flag (',' flag)* ']')?`. The flags go to the next node
    /// allocated.
    pub(super) fn parse_flags(&mut self) -> Result<(), ParseError> {
        self.production(ParseState::Flags, |p| {
            p.expect(TokenKind::At, "'@'")?;
            let mut flags = Vec::new();
            if p.at(TokenKind::LeftBracket) {
                p.bump()?;
                while !p.at(TokenKind::RightBracket) {
                    match p.peek_kind() {
                        Some(TokenKind::Identifier | TokenKind::Keyword) => {
                            let token = p.bump()?;
                            flags.push(p.text(&token));
                        }
                        _ => return Err(p.error(format!("expected flag name, found {}", p.found()))),
                    }
                    match p.peek_kind() {
                        Some(TokenKind::Comma) => {
                            p.bump()?;
                        }
                        Some(TokenKind::RightBracket) => {}
                        _ => {
                            return Err(p.error(format!(
                                "expected ',' or ']' in flag list, found {}",
                                p.found()
                            )))
                        }
                    }
                }
                p.bump()?;
            }
            p.pending_flags = Some(flags);
            Ok(())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::super::tests::{dump, parse_src};

    #[test]
    fn empty_fragment_owns_empty_statements() {
        assert_eq!(dump("{ }"), vec!["CodeFragmentBlock", "  StatementsBlock"]);
    }

    #[test]
    fn module_wraps_fragment() {
        assert_eq!(
            dump("module Foo { { x:int32; } }"),
            vec![
                "ModuleBlock Foo",
                "  CodeFragmentBlock",
                "    StatementsBlock",
                "      Variable x : int32",
            ]
        );
    }

    #[test]
    fn module_version_is_kept_verbatim() {
        assert_eq!(dump("module Foo, 1.2.3 { { } }")[0], "ModuleBlock Foo 1.2.3");
        assert_eq!(dump("module Foo, 2.0 { { } }")[0], "ModuleBlock Foo 2.0");
    }

    #[test]
    fn flags_attach_to_the_fragment() {
        assert_eq!(dump("@[inline, pure] { }")[0], "CodeFragmentBlock @[inline, pure]");
        assert_eq!(dump("@ { }")[0], "CodeFragmentBlock @[]");
    }

    #[test]
    fn nested_namespaces() {
        assert_eq!(
            dump("{ namespace a { namespace b { x; } } namespace c { } }"),
            vec![
                "CodeFragmentBlock",
                "  NamespaceBlock a",
                "    NamespaceBlock b",
                "      StatementsBlock",
                "        Instance x",
                "  NamespaceBlock c",
                "    StatementsBlock",
            ]
        );
    }

    #[test]
    fn statements_cannot_follow_namespaces() {
        let err = parse_src("{ namespace a { } x; }").unwrap_err();
        assert_eq!(err.message, "expected 'namespace' or '}', found 'x'");
    }

    #[test]
    fn program_and_lib_units_are_rejected() {
        let err = parse_src("program P { }").unwrap_err();
        assert_eq!(err.message, "program and library units are not supported");
        assert!(parse_src("lib L { }").is_err());
    }

    #[test]
    fn empty_and_comment_only_units_are_errors() {
        assert_eq!(parse_src("").unwrap_err().message, "empty compilation unit");
        assert_eq!(
            parse_src("# nothing here\n").unwrap_err().message,
            "empty compilation unit"
        );
    }

    #[test]
    fn trailing_tokens_fail_and_leave_no_tree() {
        let err = parse_src("{ } x").unwrap_err();
        assert_eq!(err.message, "unexpected 'x' after the end of the compilation unit");
        assert_eq!((err.line, err.column), (1, 5));
        assert_eq!(err.discarded.as_deref(), Some("CodeFragmentBlock"));
    }

    #[test]
    fn unterminated_flag_list() {
        let err = parse_src("@[a b] { }").unwrap_err();
        assert_eq!(err.message, "expected ',' or ']' in flag list, found 'b'");
    }
}

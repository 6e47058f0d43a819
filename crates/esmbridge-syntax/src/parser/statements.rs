// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Statement parsing: declarations, imports, exports and skipped forms.

use super::Parser;
use crate::analyzer::bound_names;
use crate::ast::*;
use crate::error::{Result, SyntaxError, SyntaxErrorKind};
use crate::lexer::{Span, TokenKind};

impl<'a> Parser<'a> {
    /// Parses a single statement. Only top-level statements may import or
    /// export.
    pub(super) fn parse_statement(&mut self, top_level: bool) -> Result<Statement> {
        let start = self.current.span.start;

        let kind = match &self.current.kind {
            TokenKind::Var | TokenKind::Const => {
                StatementKind::Declaration(Declaration::Variable(self.parse_variable_declaration()?))
            }
            TokenKind::Let if self.let_starts_declaration() => {
                StatementKind::Declaration(Declaration::Variable(self.parse_variable_declaration()?))
            }
            TokenKind::Function => {
                StatementKind::Declaration(Declaration::Function(self.parse_function(false)?))
            }
            TokenKind::Async if self.async_function_follows() => {
                StatementKind::Declaration(Declaration::Function(self.parse_function(false)?))
            }
            TokenKind::Class => StatementKind::Declaration(Declaration::Class(self.parse_class(false)?)),
            TokenKind::Import if !self.import_starts_expression() => {
                self.check_module_item(top_level)?;
                StatementKind::Import(self.parse_import()?)
            }
            TokenKind::Export => {
                self.check_module_item(top_level)?;
                self.parse_export()?
            }
            TokenKind::Semicolon => {
                self.bump()?;
                StatementKind::Empty
            }
            TokenKind::LeftBrace => {
                self.skip_balanced()?;
                StatementKind::Other
            }
            TokenKind::If => {
                self.bump()?;
                self.skip_condition()?;
                self.parse_statement(false)?;
                if self.check(&TokenKind::Else) {
                    self.bump()?;
                    self.parse_statement(false)?;
                }
                StatementKind::Other
            }
            TokenKind::For => {
                self.bump()?;
                if self.check(&TokenKind::Await) {
                    self.bump()?;
                }
                self.skip_condition()?;
                self.parse_statement(false)?;
                StatementKind::Other
            }
            TokenKind::While | TokenKind::With => {
                self.bump()?;
                self.skip_condition()?;
                self.parse_statement(false)?;
                StatementKind::Other
            }
            TokenKind::Do => {
                self.bump()?;
                self.parse_statement(false)?;
                self.expect(&TokenKind::While)?;
                self.skip_condition()?;
                // The semicolon after do-while is always optional
                if self.check(&TokenKind::Semicolon) {
                    self.bump()?;
                }
                StatementKind::Other
            }
            TokenKind::Switch => {
                self.bump()?;
                self.skip_condition()?;
                self.expect_block()?;
                StatementKind::Other
            }
            TokenKind::Try => {
                self.bump()?;
                self.expect_block()?;
                if self.check(&TokenKind::Catch) {
                    self.bump()?;
                    if self.check(&TokenKind::LeftParen) {
                        self.skip_balanced()?;
                    }
                    self.expect_block()?;
                }
                if self.check(&TokenKind::Finally) {
                    self.bump()?;
                    self.expect_block()?;
                }
                StatementKind::Other
            }
            TokenKind::Return | TokenKind::Throw | TokenKind::Break | TokenKind::Continue => {
                self.bump()?;
                if !self.at_statement_end() {
                    self.skip_expression(false)?;
                }
                self.finish_statement()?;
                StatementKind::Other
            }
            TokenKind::Debugger => {
                self.bump()?;
                self.finish_statement()?;
                StatementKind::Other
            }
            TokenKind::Identifier(_) if self.peek().kind == TokenKind::Colon => {
                // Labeled statement
                self.bump()?;
                self.bump()?;
                self.parse_statement(false)?;
                StatementKind::Other
            }
            _ => StatementKind::Expression(self.parse_expression_statement()?),
        };

        Ok(Statement {
            kind,
            span: Span::new(start, self.previous_end),
        })
    }

    fn check_module_item(&self, top_level: bool) -> Result<()> {
        let message = if !self.source_type.is_module() {
            "'import' and 'export' may appear only with 'sourceType: module'"
        } else if !top_level {
            "'import' and 'export' may only appear at the top level"
        } else {
            return Ok(());
        };
        Err(SyntaxError::new(
            SyntaxErrorKind::UnexpectedToken,
            self.source,
            self.current.span.start,
            message,
        ))
    }

    fn let_starts_declaration(&self) -> bool {
        let next = self.peek().kind;
        matches!(
            next,
            TokenKind::Identifier(_) | TokenKind::LeftBracket | TokenKind::LeftBrace
        ) || next.is_contextual()
    }

    fn async_function_follows(&self) -> bool {
        let next = self.peek();
        next.kind == TokenKind::Function && !next.newline_before
    }

    /// `import(...)` and `import.meta` are expressions.
    fn import_starts_expression(&self) -> bool {
        matches!(self.peek().kind, TokenKind::LeftParen | TokenKind::Dot)
    }

    fn skip_condition(&mut self) -> Result<Span> {
        if !self.check(&TokenKind::LeftParen) {
            return Err(self.unexpected());
        }
        self.skip_balanced()
    }

    fn expect_block(&mut self) -> Result<Span> {
        if !self.check(&TokenKind::LeftBrace) {
            return Err(self.unexpected());
        }
        self.skip_balanced()
    }

    fn parse_expression_statement(&mut self) -> Result<Expression> {
        let start = self.current.span.start;
        let base = self.depth();

        // A parenthesized string is still a string literal expression
        let mut parens = 0;
        while self.check(&TokenKind::LeftParen) {
            self.bump()?;
            parens += 1;
        }

        if let TokenKind::String(value) = &self.current.kind {
            let literal = StringLiteral {
                value: value.clone(),
                span: self.current.span,
            };
            self.bump()?;

            let mut closed = 0;
            while closed < parens && self.check(&TokenKind::RightParen) {
                self.bump()?;
                closed += 1;
            }

            if closed == parens && self.at_statement_end() {
                self.finish_statement()?;
                return Ok(Expression::StringLiteral(literal));
            }

            let span = self.skip_expression_rest(start, base, false)?;
            self.finish_statement()?;
            return Ok(Expression::Other(span));
        }

        if parens > 0 {
            let span = self.skip_expression_rest(start, base, false)?;
            self.finish_statement()?;
            return Ok(Expression::Other(span));
        }

        let span = self.skip_expression(false)?;
        self.finish_statement()?;
        Ok(Expression::Other(span))
    }

    fn parse_variable_declaration(&mut self) -> Result<VariableDeclaration> {
        let kind = match self.bump()?.kind {
            TokenKind::Var => VariableKind::Var,
            TokenKind::Let => VariableKind::Let,
            _ => VariableKind::Const,
        };

        let mut declarations = Vec::new();

        loop {
            let id = self.parse_binding_pattern()?;
            let init = if self.check(&TokenKind::Equal) {
                self.bump()?;
                Some(self.skip_expression(true)?)
            } else {
                None
            };
            declarations.push(VariableDeclarator { id, init });

            if self.check(&TokenKind::Comma) {
                self.bump()?;
            } else {
                break;
            }
        }

        self.finish_statement()?;
        Ok(VariableDeclaration { kind, declarations })
    }

    /// Parses `[async] function [*] [name] (...) {...}`. The name may be
    /// omitted only in `export default`.
    fn parse_function(&mut self, anonymous_allowed: bool) -> Result<FunctionDeclaration> {
        let is_async = self.check(&TokenKind::Async);
        if is_async {
            self.bump()?;
        }
        self.expect(&TokenKind::Function)?;

        let is_generator = self.check(&TokenKind::Star);
        if is_generator {
            self.bump()?;
        }

        let id = if self.check(&TokenKind::LeftParen) && anonymous_allowed {
            None
        } else {
            Some(self.parse_binding_identifier()?)
        };

        self.skip_condition()?;
        self.expect_block()?;

        Ok(FunctionDeclaration {
            id,
            is_async,
            is_generator,
        })
    }

    /// Parses `class [name] [extends expr] {...}`.
    fn parse_class(&mut self, anonymous_allowed: bool) -> Result<ClassDeclaration> {
        self.expect(&TokenKind::Class)?;

        let anonymous = matches!(self.current.kind, TokenKind::LeftBrace | TokenKind::Extends);
        let id = if anonymous && anonymous_allowed {
            None
        } else {
            Some(self.parse_binding_identifier()?)
        };

        let super_class = if self.check(&TokenKind::Extends) {
            self.bump()?;
            let start = self.current.span.start;
            let depth = self.depth();
            while !(self.depth() == depth && self.check(&TokenKind::LeftBrace)) {
                if self.is_at_end() {
                    return Err(SyntaxError::unexpected_eof(self.source));
                }
                self.bump()?;
            }
            if start == self.current.span.start {
                return Err(self.unexpected());
            }
            Some(Span::new(start, self.previous_end))
        } else {
            None
        };

        self.expect_block()?;

        Ok(ClassDeclaration { id, super_class })
    }

    fn parse_import(&mut self) -> Result<ImportDeclaration> {
        self.expect(&TokenKind::Import)?;

        let mut specifiers = Vec::new();

        if !matches!(self.current.kind, TokenKind::String(_)) {
            if !matches!(self.current.kind, TokenKind::Star | TokenKind::LeftBrace) {
                let local = self.parse_binding_identifier()?;
                specifiers.push(ImportSpecifier::Default { local });

                if self.check(&TokenKind::Comma) {
                    self.bump()?;
                    if !matches!(self.current.kind, TokenKind::Star | TokenKind::LeftBrace) {
                        return Err(self.unexpected());
                    }
                }
            }

            if self.check(&TokenKind::Star) {
                self.bump()?;
                self.expect_contextual("as")?;
                let local = self.parse_binding_identifier()?;
                specifiers.push(ImportSpecifier::Namespace { local });
            } else if self.check(&TokenKind::LeftBrace) {
                self.bump()?;
                while !self.check(&TokenKind::RightBrace) {
                    // `import { x }` binds the import name itself
                    let token = self.current.clone();
                    let imported = self.parse_module_export_name()?;
                    let local = if self.check_contextual("as") {
                        self.bump()?;
                        self.parse_binding_identifier()?
                    } else {
                        self.binding_from_token(&token)?
                    };
                    specifiers.push(ImportSpecifier::Named { imported, local });

                    if !self.check(&TokenKind::RightBrace) {
                        self.expect(&TokenKind::Comma)?;
                    }
                }
                self.bump()?;
            }

            self.expect_contextual("from")?;
        }

        let source = self.parse_module_source()?;
        let attributes = self.parse_import_attributes()?;
        self.finish_statement()?;

        Ok(ImportDeclaration {
            specifiers,
            source,
            attributes,
        })
    }

    fn parse_module_source(&mut self) -> Result<StringLiteral> {
        match &self.current.kind {
            TokenKind::String(value) => {
                let literal = StringLiteral {
                    value: value.clone(),
                    span: self.current.span,
                };
                self.bump()?;
                Ok(literal)
            }
            _ => Err(self.unexpected()),
        }
    }

    /// `with { type: "json" }`, or the older `assert { ... }`.
    fn parse_import_attributes(&mut self) -> Result<Option<Span>> {
        let attributes = self.check(&TokenKind::With)
            || (self.check_contextual("assert") && !self.current.newline_before);
        if !attributes {
            return Ok(None);
        }
        self.bump()?;
        self.expect_block().map(Some)
    }

    fn parse_module_export_name(&mut self) -> Result<ModuleExportName> {
        let name = match &self.current.kind {
            TokenKind::String(value) => value.clone(),
            kind => match kind.name_text() {
                Some(text) => text.to_string(),
                None => return Err(self.unexpected()),
            },
        };
        let span = self.current.span;
        self.bump()?;
        Ok(ModuleExportName { name, span })
    }

    fn parse_export(&mut self) -> Result<StatementKind> {
        self.expect(&TokenKind::Export)?;

        match &self.current.kind {
            TokenKind::Default => {
                let position = self.current.span.start;
                self.bump()?;
                self.record_export("default", position)?;

                let declaration = if self.check(&TokenKind::Function) || self.async_function_follows_here() {
                    ExportDefaultDeclaration::Function(self.parse_function(true)?)
                } else if self.check(&TokenKind::Class) {
                    ExportDefaultDeclaration::Class(self.parse_class(true)?)
                } else {
                    let span = self.skip_expression(false)?;
                    self.finish_statement()?;
                    ExportDefaultDeclaration::Expression(span)
                };
                Ok(StatementKind::ExportDefault(declaration))
            }
            TokenKind::Star => {
                self.bump()?;
                let exported = if self.check_contextual("as") {
                    self.bump()?;
                    let name = self.parse_module_export_name()?;
                    self.record_export(&name.name, name.span.start)?;
                    Some(name)
                } else {
                    None
                };
                self.expect_contextual("from")?;
                let source = self.parse_module_source()?;
                self.parse_import_attributes()?;
                self.finish_statement()?;
                Ok(StatementKind::ExportAll(ExportAllDeclaration { exported, source }))
            }
            TokenKind::LeftBrace => {
                self.bump()?;
                let mut specifiers = Vec::new();
                while !self.check(&TokenKind::RightBrace) {
                    let local = self.parse_module_export_name()?;
                    let exported = if self.check_contextual("as") {
                        self.bump()?;
                        self.parse_module_export_name()?
                    } else {
                        local.clone()
                    };
                    self.record_export(&exported.name, exported.span.start)?;
                    specifiers.push(ExportSpecifier { local, exported });

                    if !self.check(&TokenKind::RightBrace) {
                        self.expect(&TokenKind::Comma)?;
                    }
                }
                self.bump()?;

                let source = if self.check_contextual("from") {
                    self.bump()?;
                    let source = self.parse_module_source()?;
                    self.parse_import_attributes()?;
                    Some(source)
                } else {
                    None
                };
                self.finish_statement()?;

                Ok(StatementKind::ExportNamed(ExportNamedDeclaration {
                    declaration: None,
                    specifiers,
                    source,
                }))
            }
            _ => {
                let declaration = match &self.current.kind {
                    TokenKind::Var | TokenKind::Let | TokenKind::Const => {
                        let var = self.parse_variable_declaration()?;
                        for declarator in &var.declarations {
                            for id in bound_names(&declarator.id) {
                                self.record_export(&id.name, id.span.start)?;
                            }
                        }
                        Declaration::Variable(var)
                    }
                    TokenKind::Function | TokenKind::Async => {
                        let func = self.parse_function(false)?;
                        if let Some(id) = &func.id {
                            self.record_export(&id.name, id.span.start)?;
                        }
                        Declaration::Function(func)
                    }
                    TokenKind::Class => {
                        let class = self.parse_class(false)?;
                        if let Some(id) = &class.id {
                            self.record_export(&id.name, id.span.start)?;
                        }
                        Declaration::Class(class)
                    }
                    _ => return Err(self.unexpected()),
                };

                Ok(StatementKind::ExportNamed(ExportNamedDeclaration {
                    declaration: Some(declaration),
                    specifiers: Vec::new(),
                    source: None,
                }))
            }
        }
    }

    fn async_function_follows_here(&self) -> bool {
        self.check(&TokenKind::Async) && self.async_function_follows()
    }

    fn record_export(&mut self, name: &str, position: usize) -> Result<()> {
        if self.exported.insert(name.to_string()) {
            Ok(())
        } else {
            Err(SyntaxError::duplicate_export(self.source, position, name))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(source: &str) -> Result<Program> {
        Parser::new(source, SourceType::Module).parse_program()
    }

    fn kinds(source: &str) -> Vec<StatementKind> {
        parse(source).unwrap().body.into_iter().map(|stmt| stmt.kind).collect()
    }

    #[test]
    fn test_import_forms() {
        let program = parse(
            "import a, * as ns from 'x';\nimport { b, c as d, 'e f' as g } from \"y\"\nimport 'z'",
        )
        .unwrap();
        assert_eq!(program.body.len(), 3);

        let StatementKind::Import(first) = &program.body[0].kind else {
            panic!("expected import");
        };
        let locals: Vec<&str> = first.specifiers.iter().map(|s| s.local().name.as_str()).collect();
        assert_eq!(locals, vec!["a", "ns"]);
        assert_eq!(first.source.value, "x");

        let StatementKind::Import(second) = &program.body[1].kind else {
            panic!("expected import");
        };
        let imported: Vec<Option<&str>> = second.specifiers.iter().map(|s| s.imported_name()).collect();
        assert_eq!(imported, vec![Some("b"), Some("c"), Some("e f")]);
        assert_eq!(second.specifiers[2].local().name, "g");

        let StatementKind::Import(third) = &program.body[2].kind else {
            panic!("expected import");
        };
        assert!(third.specifiers.is_empty());
    }

    #[test]
    fn test_import_attributes() {
        let program = parse("import data from './data.json' with { type: 'json' };").unwrap();
        let StatementKind::Import(import) = &program.body[0].kind else {
            panic!("expected import");
        };
        assert!(import.attributes.is_some());
    }

    #[test]
    fn test_dynamic_import_is_expression() {
        let kinds = kinds("import('x').then(run);\nconsole.log(import.meta.url)");
        assert!(matches!(kinds[0], StatementKind::Expression(Expression::Other(_))));
        assert!(matches!(kinds[1], StatementKind::Expression(Expression::Other(_))));
    }

    #[test]
    fn test_export_forms() {
        let kinds = kinds(
            "export default function () {}\n\
             export const a = 1, { b, c: [d] } = obj;\n\
             export { a as e, d as 'f g' };\n\
             export * from 'x';\n\
             export * as ns from 'y';\n\
             export { h } from 'z';\n\
             export class K extends Base {}",
        );
        assert_eq!(kinds.len(), 7);
        assert!(matches!(
            &kinds[0],
            StatementKind::ExportDefault(ExportDefaultDeclaration::Function(FunctionDeclaration { id: None, .. }))
        ));
        assert!(matches!(
            &kinds[1],
            StatementKind::ExportNamed(ExportNamedDeclaration { declaration: Some(Declaration::Variable(_)), .. })
        ));
        assert!(matches!(&kinds[3], StatementKind::ExportAll(ExportAllDeclaration { exported: None, .. })));
        assert!(matches!(&kinds[4], StatementKind::ExportAll(ExportAllDeclaration { exported: Some(_), .. })));
        assert!(matches!(
            &kinds[5],
            StatementKind::ExportNamed(ExportNamedDeclaration { source: Some(_), .. })
        ));
    }

    #[test]
    fn test_export_default_expression() {
        let program = parse("export default a + b\nlet c = 1").unwrap();
        assert_eq!(program.body.len(), 2);
        assert!(matches!(
            program.body[0].kind,
            StatementKind::ExportDefault(ExportDefaultDeclaration::Expression(_))
        ));
    }

    #[test]
    fn test_duplicate_export() {
        let error = parse("export const a = 1;\nexport { b as a };").unwrap_err();
        assert_eq!(error.kind, SyntaxErrorKind::DuplicateExport);
        assert_eq!(error.message, "Duplicate export 'a'");
        assert_eq!(error.position, 34);

        let error = parse("export default 1;\nexport default 2;").unwrap_err();
        assert_eq!(error.message, "Duplicate export 'default'");
    }

    #[test]
    fn test_star_exports_do_not_collide() {
        assert!(parse("export * from 'a';\nexport * from 'b';").is_ok());
    }

    #[test]
    fn test_import_in_script_is_rejected() {
        let error = Parser::new("import x from 'y'", SourceType::Script)
            .parse_program()
            .unwrap_err();
        assert_eq!(error.message, "'import' and 'export' may appear only with 'sourceType: module'");
    }

    #[test]
    fn test_nested_export_is_rejected() {
        let error = parse("if (x) export const y = 1;").unwrap_err();
        assert_eq!(error.message, "'import' and 'export' may only appear at the top level");
    }

    #[test]
    fn test_control_flow_is_skipped() {
        let kinds = kinds(
            "if (a) b()\nelse { c() }\n\
             for (let i = 0; i < 3; i++) {}\n\
             do x++; while (x < 5)\n\
             try { t() } catch { } finally { f() }\n\
             label: for (;;) break label\n\
             switch (v) { case 1: break }",
        );
        assert_eq!(kinds.len(), 7);
        assert!(kinds.iter().all(|kind| matches!(kind, StatementKind::Other | StatementKind::Expression(_))));
    }

    #[test]
    fn test_class_and_function_declarations() {
        let kinds = kinds("async function* gen() {}\nclass A extends mixin(B, { c: 1 }) { m() {} }");
        let StatementKind::Declaration(Declaration::Function(func)) = &kinds[0] else {
            panic!("expected function");
        };
        assert!(func.is_async && func.is_generator);
        assert_eq!(func.id.as_ref().map(|id| id.name.as_str()), Some("gen"));

        let StatementKind::Declaration(Declaration::Class(class)) = &kinds[1] else {
            panic!("expected class");
        };
        assert!(class.super_class.is_some());
    }

    #[test]
    fn test_let_as_identifier_in_script() {
        let program = Parser::new("let = 5;", SourceType::Script).parse_program().unwrap();
        assert!(matches!(program.body[0].kind, StatementKind::Expression(_)));
    }

    #[test]
    fn test_statement_spans_include_semicolon() {
        let program = parse("\"use strict\"; \"use asm\"; let x = 1;").unwrap();
        assert_eq!(program.body[0].span, Span::new(0, 13));
        assert_eq!(program.body[1].span, Span::new(14, 24));
    }
}

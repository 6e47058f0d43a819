// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! The parser core.

use rustc_hash::FxHashSet;

use crate::ast::{Program, SourceType, Statement};
use crate::error::{Result, SyntaxError};
use crate::lexer::{Scanner, Span, Token, TokenKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FrameKind {
    Brace,
    Paren,
    Bracket,
    /// The body of `x => expr`; closed by `,`, `;` or an enclosing closer
    ConciseArrow,
}

#[derive(Debug, Clone, Copy)]
struct Frame {
    kind: FrameKind,
    /// Code inside this frame belongs to a function or class body
    function: bool,
    /// A paren that follows `if`, `for`, `while`, `switch`, `catch` or `with`
    control: bool,
}

/// A top-level parser for ECMAScript source.
pub struct Parser<'a> {
    pub(super) source: &'a str,
    scanner: Scanner<'a>,
    pub(super) current: Token,
    pub(super) previous: TokenKind,
    before_previous: TokenKind,
    pub(super) previous_end: usize,
    pub(super) source_type: SourceType,
    frames: Vec<Frame>,
    last_paren_control: bool,
    pending_class: Option<usize>,
    pub(super) exported: FxHashSet<String>,
    first_await_outside_function: Option<usize>,
}

impl<'a> Parser<'a> {
    /// Creates a new parser for the given source code.
    pub fn new(source: &'a str, source_type: SourceType) -> Self {
        let mut scanner = Scanner::new(source);
        let current = scanner.next_token();
        Self {
            source,
            scanner,
            current,
            previous: TokenKind::Eof,
            before_previous: TokenKind::Eof,
            previous_end: 0,
            source_type,
            frames: Vec::new(),
            last_paren_control: false,
            pending_class: None,
            exported: FxHashSet::default(),
            first_await_outside_function: None,
        }
    }

    /// Parses the source code into a Program AST node.
    pub fn parse_program(&mut self) -> Result<Program> {
        self.parse_program_with(|_| Ok(()))
    }

    /// Parses the source code, handing each top-level statement to `visit`
    /// as soon as it is complete. An error from `visit` stops the parse.
    pub fn parse_program_with<F>(&mut self, mut visit: F) -> Result<Program>
    where
        F: FnMut(&Statement) -> Result<()>,
    {
        if let TokenKind::Invalid(error) = self.current.kind {
            return Err(SyntaxError::from_lex(self.source, self.current.span.start, error));
        }

        let mut body = Vec::new();

        while !self.is_at_end() {
            let stmt = self.parse_statement(true)?;
            visit(&stmt)?;
            body.push(stmt);
        }

        Ok(Program {
            body,
            span: Span::new(0, self.source.len()),
            source_type: self.source_type,
            first_await_outside_function: self.first_await_outside_function,
            top: None,
        })
    }

    /// Position of the first `await` seen outside any function so far.
    pub fn first_await_outside_function(&self) -> Option<usize> {
        self.first_await_outside_function
    }

    pub(super) fn is_at_end(&self) -> bool {
        self.current.kind == TokenKind::Eof
    }

    pub(super) fn check(&self, kind: &TokenKind) -> bool {
        &self.current.kind == kind
    }

    /// True when the current token is the identifier `word`.
    pub(super) fn check_contextual(&self, word: &str) -> bool {
        matches!(&self.current.kind, TokenKind::Identifier(name) if name == word)
    }

    /// Returns the token after the current one without consuming anything.
    pub(super) fn peek(&self) -> Token {
        self.scanner.clone().next_token()
    }

    /// Consumes the current token and returns it.
    pub(super) fn bump(&mut self) -> Result<Token> {
        let next = self.scanner.next_token();
        if let TokenKind::Invalid(error) = next.kind {
            return Err(SyntaxError::from_lex(self.source, next.span.start, error));
        }

        let token = std::mem::replace(&mut self.current, next);
        self.track(&token)?;
        self.before_previous = std::mem::replace(&mut self.previous, token.kind.clone());
        self.previous_end = token.span.end;
        Ok(token)
    }

    pub(super) fn expect(&mut self, kind: &TokenKind) -> Result<Token> {
        if self.check(kind) {
            self.bump()
        } else {
            Err(self.unexpected())
        }
    }

    pub(super) fn expect_contextual(&mut self, word: &str) -> Result<Token> {
        if self.check_contextual(word) {
            self.bump()
        } else {
            Err(self.unexpected())
        }
    }

    /// An error at the current token.
    pub(super) fn unexpected(&self) -> SyntaxError {
        if self.is_at_end() {
            SyntaxError::unexpected_eof(self.source)
        } else {
            SyntaxError::unexpected(self.source, self.current.span.start)
        }
    }

    /// Number of open brackets. Concise arrow bodies do not count.
    pub(super) fn depth(&self) -> usize {
        self.frames
            .iter()
            .filter(|frame| frame.kind != FrameKind::ConciseArrow)
            .count()
    }

    fn in_function(&self) -> bool {
        self.frames.iter().any(|frame| frame.function)
    }

    fn close_concise(&mut self) {
        while self
            .frames
            .last()
            .is_some_and(|frame| frame.kind == FrameKind::ConciseArrow)
        {
            self.frames.pop();
        }
    }

    /// Updates bracket frames and await tracking for a consumed token.
    /// `self.current` is already the token after it.
    fn track(&mut self, token: &Token) -> Result<()> {
        match &token.kind {
            TokenKind::LeftParen => {
                let control = matches!(
                    self.previous,
                    TokenKind::If
                        | TokenKind::For
                        | TokenKind::While
                        | TokenKind::Switch
                        | TokenKind::Catch
                        | TokenKind::With
                ) || (self.previous == TokenKind::Await && self.before_previous == TokenKind::For);
                self.push(FrameKind::Paren, false, control);
            }
            TokenKind::LeftBracket => self.push(FrameKind::Bracket, false, false),
            TokenKind::LeftBrace => {
                let class_body = self.pending_class == Some(self.frames.len());
                if class_body {
                    self.pending_class = None;
                }
                let function = class_body
                    || match self.previous {
                        TokenKind::Arrow => true,
                        TokenKind::RightParen => !self.last_paren_control,
                        _ => false,
                    };
                self.push(FrameKind::Brace, function, false);
            }
            TokenKind::RightParen | TokenKind::RightBracket | TokenKind::RightBrace => {
                self.close_concise();
                let expected = match token.kind {
                    TokenKind::RightParen => FrameKind::Paren,
                    TokenKind::RightBracket => FrameKind::Bracket,
                    _ => FrameKind::Brace,
                };
                match self.frames.pop() {
                    Some(frame) if frame.kind == expected => {
                        if expected == FrameKind::Paren {
                            self.last_paren_control = frame.control;
                        }
                    }
                    _ => return Err(SyntaxError::unexpected(self.source, token.span.start)),
                }
            }
            TokenKind::Comma | TokenKind::Semicolon => self.close_concise(),
            TokenKind::Arrow => {
                if self.current.kind != TokenKind::LeftBrace {
                    self.push(FrameKind::ConciseArrow, true, false);
                }
            }
            TokenKind::Class => {
                let property = matches!(self.previous, TokenKind::Dot | TokenKind::QuestionDot)
                    || self.current.kind == TokenKind::Colon;
                if !property {
                    self.pending_class = Some(self.frames.len());
                }
            }
            TokenKind::Await => self.track_await(token),
            _ => {}
        }
        Ok(())
    }

    fn push(&mut self, kind: FrameKind, function: bool, control: bool) {
        self.frames.push(Frame {
            kind,
            function,
            control,
        });
    }

    fn track_await(&mut self, token: &Token) {
        if self.first_await_outside_function.is_some() || self.in_function() {
            return;
        }
        if matches!(self.previous, TokenKind::Dot | TokenKind::QuestionDot) {
            return;
        }

        let operator = match self.source_type {
            SourceType::Module => self.current.kind != TokenKind::Colon,
            // `await` is an ordinary identifier in scripts unless an operand follows it
            SourceType::Script => !self.current.newline_before && starts_operand(&self.current.kind),
        };

        if operator {
            tracing::trace!(position = token.span.start, "await outside function");
            self.first_await_outside_function = Some(token.span.start);
        }
    }

    /// Steps over a bracketed region starting at the current opener.
    pub(super) fn skip_balanced(&mut self) -> Result<Span> {
        if !matches!(
            self.current.kind,
            TokenKind::LeftParen | TokenKind::LeftBracket | TokenKind::LeftBrace
        ) {
            return Err(self.unexpected());
        }

        let start = self.current.span.start;
        let depth = self.depth();
        self.bump()?;

        while self.depth() > depth {
            if self.is_at_end() {
                return Err(SyntaxError::unexpected_eof(self.source));
            }
            self.bump()?;
        }

        Ok(Span::new(start, self.previous_end))
    }

    /// Steps over a non-empty expression. With `stop_at_comma` the
    /// expression ends at a comma at its own nesting level, as in
    /// initializers and defaults.
    pub(super) fn skip_expression(&mut self, stop_at_comma: bool) -> Result<Span> {
        let base = self.depth();
        if self.at_expression_stop(stop_at_comma) {
            return Err(self.unexpected());
        }

        let start = self.current.span.start;
        self.bump()?;
        self.skip_expression_rest(start, base, stop_at_comma)
    }

    /// Continues an expression whose first tokens are already consumed.
    pub(super) fn skip_expression_rest(&mut self, start: usize, base: usize, stop_at_comma: bool) -> Result<Span> {
        loop {
            if self.depth() == base {
                let asi = base == 0 && self.current.newline_before && !self.continues_expression();
                if asi || self.at_expression_stop(stop_at_comma) {
                    break;
                }
            } else if self.is_at_end() {
                return Err(SyntaxError::unexpected_eof(self.source));
            }
            self.bump()?;
        }

        self.close_concise();
        Ok(Span::new(start, self.previous_end))
    }

    fn at_expression_stop(&self, stop_at_comma: bool) -> bool {
        match self.current.kind {
            TokenKind::Semicolon
            | TokenKind::RightParen
            | TokenKind::RightBracket
            | TokenKind::RightBrace
            | TokenKind::Eof => true,
            TokenKind::Comma => stop_at_comma,
            _ => false,
        }
    }

    /// True when the statement has ended here, explicitly or by automatic
    /// semicolon insertion.
    pub(super) fn at_statement_end(&self) -> bool {
        match self.current.kind {
            TokenKind::Semicolon | TokenKind::RightBrace | TokenKind::Eof => true,
            _ => self.current.newline_before && !self.continues_expression(),
        }
    }

    /// Consumes an optional semicolon and returns the statement end.
    pub(super) fn finish_statement(&mut self) -> Result<usize> {
        match self.current.kind {
            TokenKind::Semicolon => {
                self.bump()?;
            }
            TokenKind::RightBrace | TokenKind::Eof => {}
            _ if self.current.newline_before => {}
            _ => return Err(self.unexpected()),
        }
        Ok(self.previous_end)
    }

    /// Whether the current token, which follows a line break, continues
    /// the expression before it.
    fn continues_expression(&self) -> bool {
        // Restricted productions end at a line break
        if matches!(
            self.previous,
            TokenKind::Return
                | TokenKind::Break
                | TokenKind::Continue
                | TokenKind::Throw
                | TokenKind::Yield
                | TokenKind::Update(_)
        ) {
            return false;
        }

        let previous_continues = matches!(
            self.previous,
            TokenKind::Operator(_)
                | TokenKind::Equal
                | TokenKind::Arrow
                | TokenKind::Dot
                | TokenKind::QuestionDot
                | TokenKind::Comma
                | TokenKind::Question
                | TokenKind::Colon
                | TokenKind::Star
                | TokenKind::Ellipsis
                | TokenKind::In
                | TokenKind::Instanceof
                | TokenKind::Typeof
                | TokenKind::Void
                | TokenKind::Delete
                | TokenKind::New
                | TokenKind::Extends
                | TokenKind::Function
                | TokenKind::Class
        );
        if previous_continues {
            return true;
        }

        match &self.current.kind {
            TokenKind::LeftParen
            | TokenKind::LeftBracket
            | TokenKind::Dot
            | TokenKind::QuestionDot
            | TokenKind::Template
            | TokenKind::Equal
            | TokenKind::Arrow
            | TokenKind::Comma
            | TokenKind::Question
            | TokenKind::Colon
            | TokenKind::Star
            | TokenKind::In
            | TokenKind::Instanceof => true,
            TokenKind::Operator(op) => !matches!(*op, "!" | "~"),
            // `function ()\n{` and `class extends Base\n{`
            TokenKind::LeftBrace => {
                (self.previous == TokenKind::RightParen && !self.last_paren_control)
                    || self.pending_class.is_some()
            }
            _ => false,
        }
    }
}

/// Tokens that can begin the operand of a unary operator.
fn starts_operand(kind: &TokenKind) -> bool {
    match kind {
        TokenKind::Identifier(_)
        | TokenKind::Number(_)
        | TokenKind::String(_)
        | TokenKind::Template
        | TokenKind::RegExp
        | TokenKind::True
        | TokenKind::False
        | TokenKind::Null
        | TokenKind::This
        | TokenKind::Super
        | TokenKind::New
        | TokenKind::Function
        | TokenKind::Class
        | TokenKind::Async
        | TokenKind::Await
        | TokenKind::Typeof
        | TokenKind::Void
        | TokenKind::Delete
        | TokenKind::Update(_) => true,
        TokenKind::Operator(op) => matches!(*op, "!" | "~"),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{Expression, StatementKind};

    fn parse(source: &str) -> Program {
        Parser::new(source, SourceType::Module).parse_program().unwrap()
    }

    #[test]
    fn test_asi_splits_statements() {
        let program = parse("a = 1\nb = 2\n(c)");
        assert_eq!(program.body.len(), 2);
        assert_eq!(program.body[0].span, Span::new(0, 5));
    }

    #[test]
    fn test_continuation_operators_join_lines() {
        let program = parse("a = 1 +\n2\nb = x\n.y");
        assert_eq!(program.body.len(), 2);
    }

    #[test]
    fn test_await_at_top_level() {
        let program = parse("const x = 1;\nconst y = await x;");
        assert_eq!(program.first_await_outside_function, Some(23));
    }

    #[test]
    fn test_await_inside_functions_is_ignored() {
        let sources = [
            "async function f() { await x }",
            "const f = async () => { await x };",
            "const f = async x => await x;",
            "const o = { async m() { await x } };",
            "class A { async m() { await x } }",
            "const o = { await: 1 }; o.await;",
        ];
        for source in sources {
            let program = parse(source);
            assert_eq!(program.first_await_outside_function, None, "{}", source);
        }
    }

    #[test]
    fn test_await_after_concise_arrow() {
        let program = parse("const f = x => x, y = await g();");
        assert_eq!(program.first_await_outside_function, Some(22));
    }

    #[test]
    fn test_await_in_control_block_counts() {
        let program = parse("if (ready) { await start() }");
        assert_eq!(program.first_await_outside_function, Some(13));
    }

    #[test]
    fn test_script_await_identifier() {
        let program = Parser::new("var await = 1; await + 1;", SourceType::Script)
            .parse_program()
            .unwrap();
        assert_eq!(program.first_await_outside_function, None);

        let program = Parser::new("await fetch();", SourceType::Script)
            .parse_program()
            .unwrap();
        assert_eq!(program.first_await_outside_function, Some(0));
    }

    #[test]
    fn test_directive_detection() {
        let program = parse("'use strict'\n'use strict'.length;");
        assert!(matches!(
            program.body[0].kind,
            StatementKind::Expression(Expression::StringLiteral(_))
        ));
        assert!(matches!(program.body[1].kind, StatementKind::Expression(Expression::Other(_))));
    }

    #[test]
    fn test_parenthesized_string_statement() {
        let program = parse("((\"use strict\"));\n(\"a\" + b);\n(\"c\")(d);\n(() => 1);");
        assert_eq!(program.body.len(), 4);
        assert!(matches!(
            &program.body[0].kind,
            StatementKind::Expression(Expression::StringLiteral(literal)) if literal.value == "use strict"
        ));
        for stmt in &program.body[1..] {
            assert!(matches!(stmt.kind, StatementKind::Expression(Expression::Other(_))));
        }
    }

    #[test]
    fn test_unbalanced_brackets() {
        let error = Parser::new("foo(", SourceType::Module).parse_program().unwrap_err();
        assert_eq!(error.message, "Unexpected end of input");

        let error = Parser::new("foo)", SourceType::Module).parse_program().unwrap_err();
        assert_eq!(error.message, "Unexpected token");
        assert_eq!(error.position, 3);
    }

    #[test]
    fn test_lex_errors_surface() {
        let error = Parser::new("let s = 'abc", SourceType::Module)
            .parse_program()
            .unwrap_err();
        assert_eq!(error.message, "Unterminated string constant");
        assert_eq!(error.position, 8);
    }
}

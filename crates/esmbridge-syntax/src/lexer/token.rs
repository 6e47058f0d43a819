// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Token definitions for the module scanner.

use serde::Serialize;

/// A span in the source code, representing a range of bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
pub struct Span {
    /// Start byte offset (inclusive)
    pub start: usize,
    /// End byte offset (exclusive)
    pub end: usize,
}

impl Span {
    /// Creates a new span.
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    /// Returns the length of this span in bytes.
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    /// Returns true if this span is empty.
    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// Returns the smallest span covering both `self` and `other`.
    pub fn to(&self, other: Span) -> Span {
        Span::new(self.start.min(other.start), self.end.max(other.end))
    }
}

/// A token produced by the scanner.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    /// The kind of token
    pub kind: TokenKind,
    /// The span in the source code
    pub span: Span,
    /// Whether a line terminator appeared between the previous token and this one
    pub newline_before: bool,
}

impl Token {
    /// Creates a new token.
    pub fn new(kind: TokenKind, span: Span, newline_before: bool) -> Self {
        Self {
            kind,
            span,
            newline_before,
        }
    }
}

/// Reasons the scanner could not produce a well-formed token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LexError {
    /// A string literal ran into a line terminator or the end of input
    UnterminatedString,
    /// A template literal ran into the end of input
    UnterminatedTemplate,
    /// A regular expression literal ran into a line terminator or the end of input
    UnterminatedRegExp,
    /// A block comment was never closed
    UnterminatedComment,
    /// A character that cannot start any token
    UnexpectedCharacter,
}

/// The kinds of tokens the top-level parser distinguishes.
///
/// Operators that never matter for statement structure share the
/// [`TokenKind::Operator`] variant.
#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    // Literals
    /// Numeric or BigInt literal (raw text)
    Number(String),
    /// String literal (cooked value)
    String(String),
    /// Complete template literal, substitutions included
    Template,
    /// Regular expression literal
    RegExp,
    /// Boolean true
    True,
    /// Boolean false
    False,
    /// null
    Null,

    // Identifiers
    /// Identifier or contextual keyword such as `as`, `from`, `of`
    Identifier(String),
    /// Private identifier (#name)
    PrivateIdentifier(String),

    // Keywords
    Async,
    Await,
    Break,
    Case,
    Catch,
    Class,
    Const,
    Continue,
    Debugger,
    Default,
    Delete,
    Do,
    Else,
    Export,
    Extends,
    Finally,
    For,
    Function,
    If,
    Import,
    In,
    Instanceof,
    Let,
    New,
    Return,
    Static,
    Super,
    Switch,
    This,
    Throw,
    Try,
    Typeof,
    Var,
    Void,
    While,
    With,
    Yield,

    // Punctuation
    /// {
    LeftBrace,
    /// }
    RightBrace,
    /// (
    LeftParen,
    /// )
    RightParen,
    /// [
    LeftBracket,
    /// ]
    RightBracket,
    /// .
    Dot,
    /// ...
    Ellipsis,
    /// ;
    Semicolon,
    /// ,
    Comma,
    /// :
    Colon,
    /// ?
    Question,
    /// ?.
    QuestionDot,
    /// =
    Equal,
    /// =>
    Arrow,
    /// *
    Star,
    /// ++ or --
    Update(&'static str),
    /// Any other operator
    Operator(&'static str),

    // Special
    /// End of file
    Eof,
    /// Malformed input
    Invalid(LexError),
}

impl TokenKind {
    /// Returns true if this token is a reserved or contextual keyword.
    pub fn is_keyword(&self) -> bool {
        self.keyword_text().is_some()
    }

    /// Returns the source text of a keyword token.
    pub fn keyword_text(&self) -> Option<&'static str> {
        let text = match self {
            TokenKind::Async => "async",
            TokenKind::Await => "await",
            TokenKind::Break => "break",
            TokenKind::Case => "case",
            TokenKind::Catch => "catch",
            TokenKind::Class => "class",
            TokenKind::Const => "const",
            TokenKind::Continue => "continue",
            TokenKind::Debugger => "debugger",
            TokenKind::Default => "default",
            TokenKind::Delete => "delete",
            TokenKind::Do => "do",
            TokenKind::Else => "else",
            TokenKind::Export => "export",
            TokenKind::Extends => "extends",
            TokenKind::Finally => "finally",
            TokenKind::For => "for",
            TokenKind::Function => "function",
            TokenKind::If => "if",
            TokenKind::Import => "import",
            TokenKind::In => "in",
            TokenKind::Instanceof => "instanceof",
            TokenKind::Let => "let",
            TokenKind::New => "new",
            TokenKind::Return => "return",
            TokenKind::Static => "static",
            TokenKind::Super => "super",
            TokenKind::Switch => "switch",
            TokenKind::This => "this",
            TokenKind::Throw => "throw",
            TokenKind::Try => "try",
            TokenKind::Typeof => "typeof",
            TokenKind::Var => "var",
            TokenKind::Void => "void",
            TokenKind::While => "while",
            TokenKind::With => "with",
            TokenKind::Yield => "yield",
            TokenKind::True => "true",
            TokenKind::False => "false",
            TokenKind::Null => "null",
            _ => return None,
        };
        Some(text)
    }

    /// Returns true if this token is a literal.
    pub fn is_literal(&self) -> bool {
        matches!(
            self,
            TokenKind::Number(_)
                | TokenKind::String(_)
                | TokenKind::Template
                | TokenKind::RegExp
                | TokenKind::True
                | TokenKind::False
                | TokenKind::Null
        )
    }

    /// Keywords that may still be used as binding names outside strict code.
    pub fn is_contextual(&self) -> bool {
        matches!(
            self,
            TokenKind::Async | TokenKind::Await | TokenKind::Let | TokenKind::Static | TokenKind::Yield
        )
    }

    /// Returns the name this token spells when it can be a property or export name.
    pub fn name_text(&self) -> Option<&str> {
        match self {
            TokenKind::Identifier(name) => Some(name),
            other => other.keyword_text(),
        }
    }

    /// True when a `/` following this token starts a regular expression.
    pub fn allows_regexp_after(&self) -> bool {
        match self {
            TokenKind::Identifier(_)
            | TokenKind::PrivateIdentifier(_)
            | TokenKind::Number(_)
            | TokenKind::String(_)
            | TokenKind::Template
            | TokenKind::RegExp
            | TokenKind::True
            | TokenKind::False
            | TokenKind::Null
            | TokenKind::This
            | TokenKind::Super
            | TokenKind::RightParen
            | TokenKind::RightBracket
            | TokenKind::Update(_) => false,
            _ => true,
        }
    }
}

/// Maps identifier text to its keyword token, if any.
pub(crate) fn keyword(name: &str) -> Option<TokenKind> {
    let kind = match name {
        "async" => TokenKind::Async,
        "await" => TokenKind::Await,
        "break" => TokenKind::Break,
        "case" => TokenKind::Case,
        "catch" => TokenKind::Catch,
        "class" => TokenKind::Class,
        "const" => TokenKind::Const,
        "continue" => TokenKind::Continue,
        "debugger" => TokenKind::Debugger,
        "default" => TokenKind::Default,
        "delete" => TokenKind::Delete,
        "do" => TokenKind::Do,
        "else" => TokenKind::Else,
        "export" => TokenKind::Export,
        "extends" => TokenKind::Extends,
        "false" => TokenKind::False,
        "finally" => TokenKind::Finally,
        "for" => TokenKind::For,
        "function" => TokenKind::Function,
        "if" => TokenKind::If,
        "import" => TokenKind::Import,
        "in" => TokenKind::In,
        "instanceof" => TokenKind::Instanceof,
        "let" => TokenKind::Let,
        "new" => TokenKind::New,
        "null" => TokenKind::Null,
        "return" => TokenKind::Return,
        "static" => TokenKind::Static,
        "super" => TokenKind::Super,
        "switch" => TokenKind::Switch,
        "this" => TokenKind::This,
        "throw" => TokenKind::Throw,
        "true" => TokenKind::True,
        "try" => TokenKind::Try,
        "typeof" => TokenKind::Typeof,
        "var" => TokenKind::Var,
        "void" => TokenKind::Void,
        "while" => TokenKind::While,
        "with" => TokenKind::With,
        "yield" => TokenKind::Yield,
        _ => return None,
    };
    Some(kind)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_span_to() {
        let joined = Span::new(4, 8).to(Span::new(10, 12));
        assert_eq!(joined, Span::new(4, 12));
        assert_eq!(joined.len(), 8);
    }

    #[test]
    fn test_keyword_round_trip() {
        for text in ["function", "class", "import", "export", "await", "let"] {
            let kind = keyword(text).unwrap();
            assert_eq!(kind.keyword_text(), Some(text));
        }
        assert!(keyword("from").is_none());
    }

    #[test]
    fn test_contextual_keywords() {
        assert!(TokenKind::Let.is_contextual());
        assert!(TokenKind::Async.is_contextual());
        assert!(!TokenKind::Function.is_contextual());
    }

    #[test]
    fn test_regexp_context() {
        assert!(TokenKind::Equal.allows_regexp_after());
        assert!(TokenKind::Return.allows_regexp_after());
        assert!(!TokenKind::Identifier("x".into()).allows_regexp_after());
        assert!(!TokenKind::RightParen.allows_regexp_after());
    }

    #[test]
    fn test_name_text() {
        assert_eq!(TokenKind::Identifier("as".into()).name_text(), Some("as"));
        assert_eq!(TokenKind::Default.name_text(), Some("default"));
        assert_eq!(TokenKind::Comma.name_text(), None);
    }
}

// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! The scanner that produces tokens from source text.

use super::token::keyword;
use super::{LexError, Span, Token, TokenKind};

/// Punctuators ordered so that longer spellings are tried first.
const PUNCTUATORS: &[&str] = &[
    ">>>=", "...", "===", "!==", "**=", "<<=", ">>=", ">>>", "&&=", "||=", "??=", "=>", "==",
    "!=", "<=", ">=", "&&", "||", "??", "?.", "++", "--", "+=", "-=", "*=", "/=", "%=", "&=",
    "|=", "^=", "**", "<<", ">>", "+", "-", "*", "/", "%", "<", ">", "&", "|", "^", "!", "~",
    "=", "?", ":", ".", ";", ",", "(", ")", "[", "]", "{", "}",
];

/// A scanner that tokenizes ECMAScript source code.
///
/// Whether a `/` starts a regular expression is decided from the previous
/// significant token, which is enough for the statement shapes the
/// top-level parser cares about.
#[derive(Debug, Clone)]
pub struct Scanner<'a> {
    source: &'a str,
    pos: usize,
    regexp_allowed: bool,
}

impl<'a> Scanner<'a> {
    /// Creates a new scanner for the given source code.
    pub fn new(source: &'a str) -> Self {
        let mut scanner = Self {
            source,
            pos: 0,
            regexp_allowed: true,
        };
        scanner.skip_hashbang();
        scanner
    }

    /// Returns the source text the scanner was created with.
    pub fn source(&self) -> &'a str {
        self.source
    }

    /// Returns the next token from the source.
    pub fn next_token(&mut self) -> Token {
        let newline_before = match self.skip_whitespace_and_comments() {
            Ok(newline) => newline,
            Err(error) => {
                let span = Span::new(self.pos, self.source.len());
                self.pos = self.source.len();
                return Token::new(TokenKind::Invalid(error), span, false);
            }
        };

        let start = self.pos;

        let Some(ch) = self.advance() else {
            return Token::new(TokenKind::Eof, Span::new(start, start), newline_before);
        };

        let kind = match ch {
            '"' | '\'' => self.scan_string(ch),
            '`' => self.scan_template(),
            '0'..='9' => self.scan_number(),
            '.' if self.peek().is_some_and(|c| c.is_ascii_digit()) => self.scan_number(),
            '/' if self.regexp_allowed => self.scan_regexp(),
            '#' => self.scan_private_identifier(),
            _ if is_id_start(ch) => self.scan_identifier(start),
            _ => {
                self.pos = start;
                self.scan_punctuator()
            }
        };

        self.regexp_allowed = kind.allows_regexp_after();
        Token::new(kind, Span::new(start, self.pos), newline_before)
    }

    fn advance(&mut self) -> Option<char> {
        let ch = self.source[self.pos..].chars().next()?;
        self.pos += ch.len_utf8();
        Some(ch)
    }

    fn peek(&self) -> Option<char> {
        self.source[self.pos..].chars().next()
    }

    fn peek_next(&self) -> Option<char> {
        let mut chars = self.source[self.pos..].chars();
        chars.next();
        chars.next()
    }

    fn skip_hashbang(&mut self) {
        if self.source.starts_with("#!") {
            while let Some(ch) = self.peek() {
                if is_line_terminator(ch) {
                    break;
                }
                self.advance();
            }
        }
    }

    fn skip_whitespace_and_comments(&mut self) -> Result<bool, LexError> {
        let mut newline = false;

        loop {
            match self.peek() {
                Some(ch) if is_line_terminator(ch) => {
                    newline = true;
                    self.advance();
                }
                Some(ch) if ch.is_whitespace() || ch == '\u{feff}' => {
                    self.advance();
                }
                Some('/') => match self.peek_next() {
                    Some('/') => {
                        while let Some(ch) = self.peek() {
                            if is_line_terminator(ch) {
                                break;
                            }
                            self.advance();
                        }
                    }
                    Some('*') => {
                        self.pos += 2;
                        let rest = &self.source[self.pos..];
                        let Some(end) = rest.find("*/") else {
                            return Err(LexError::UnterminatedComment);
                        };
                        if rest[..end].chars().any(is_line_terminator) {
                            newline = true;
                        }
                        self.pos += end + 2;
                    }
                    _ => break,
                },
                _ => break,
            }
        }

        Ok(newline)
    }

    fn scan_punctuator(&mut self) -> TokenKind {
        let rest = &self.source[self.pos..];
        let Some(punct) = PUNCTUATORS.iter().copied().find(|p| rest.starts_with(p)) else {
            self.advance();
            return TokenKind::Invalid(LexError::UnexpectedCharacter);
        };

        // `a?.5:1` is a conditional, not optional chaining
        if punct == "?." && rest[2..].starts_with(|c: char| c.is_ascii_digit()) {
            self.pos += 1;
            return TokenKind::Question;
        }

        self.pos += punct.len();

        match punct {
            "{" => TokenKind::LeftBrace,
            "}" => TokenKind::RightBrace,
            "(" => TokenKind::LeftParen,
            ")" => TokenKind::RightParen,
            "[" => TokenKind::LeftBracket,
            "]" => TokenKind::RightBracket,
            "." => TokenKind::Dot,
            "..." => TokenKind::Ellipsis,
            ";" => TokenKind::Semicolon,
            "," => TokenKind::Comma,
            ":" => TokenKind::Colon,
            "?" => TokenKind::Question,
            "?." => TokenKind::QuestionDot,
            "=" => TokenKind::Equal,
            "=>" => TokenKind::Arrow,
            "*" => TokenKind::Star,
            "++" | "--" => TokenKind::Update(punct),
            _ => TokenKind::Operator(punct),
        }
    }

    fn scan_string(&mut self, quote: char) -> TokenKind {
        let mut value = String::new();

        loop {
            match self.advance() {
                None => return TokenKind::Invalid(LexError::UnterminatedString),
                Some(ch) if ch == quote => break,
                Some('\n' | '\r') => return TokenKind::Invalid(LexError::UnterminatedString),
                Some('\\') => {
                    let Some(escaped) = self.advance() else {
                        return TokenKind::Invalid(LexError::UnterminatedString);
                    };
                    match escaped {
                        'n' => value.push('\n'),
                        'r' => value.push('\r'),
                        't' => value.push('\t'),
                        'b' => value.push('\u{8}'),
                        'f' => value.push('\u{c}'),
                        'v' => value.push('\u{b}'),
                        '0' if !self.peek().is_some_and(|c| c.is_ascii_digit()) => value.push('\0'),
                        'x' => {
                            if let Some(ch) = self.scan_hex_escape(2) {
                                value.push(ch);
                            }
                        }
                        'u' => {
                            if let Some(ch) = self.scan_unicode_escape() {
                                value.push(ch);
                            }
                        }
                        // Line continuation
                        '\r' => {
                            if self.peek() == Some('\n') {
                                self.advance();
                            }
                        }
                        ch if is_line_terminator(ch) => {}
                        other => value.push(other),
                    }
                }
                Some(ch) => value.push(ch),
            }
        }

        TokenKind::String(value)
    }

    fn scan_hex_escape(&mut self, digits: usize) -> Option<char> {
        let text = self.source.get(self.pos..self.pos + digits)?;
        let code = u32::from_str_radix(text, 16).ok()?;
        self.pos += digits;
        char::from_u32(code)
    }

    fn scan_unicode_escape(&mut self) -> Option<char> {
        if self.peek() == Some('{') {
            let rest = &self.source[self.pos + 1..];
            let end = rest.find('}')?;
            let code = u32::from_str_radix(&rest[..end], 16).ok()?;
            self.pos += end + 2;
            char::from_u32(code)
        } else {
            self.scan_hex_escape(4)
        }
    }

    /// Scans a whole template literal. Substitutions are tokenized so that
    /// braces inside nested strings, templates and comments do not end them.
    fn scan_template(&mut self) -> TokenKind {
        loop {
            match self.advance() {
                None => return TokenKind::Invalid(LexError::UnterminatedTemplate),
                Some('`') => return TokenKind::Template,
                Some('\\') => {
                    self.advance();
                }
                Some('$') if self.peek() == Some('{') => {
                    self.advance();
                    if let Err(error) = self.skip_substitution() {
                        return TokenKind::Invalid(error);
                    }
                }
                Some(_) => {}
            }
        }
    }

    fn skip_substitution(&mut self) -> Result<(), LexError> {
        self.regexp_allowed = true;
        let mut depth = 0usize;

        loop {
            let token = self.next_token();
            match token.kind {
                TokenKind::LeftBrace => depth += 1,
                TokenKind::RightBrace if depth == 0 => return Ok(()),
                TokenKind::RightBrace => depth -= 1,
                TokenKind::Eof => return Err(LexError::UnterminatedTemplate),
                TokenKind::Invalid(error) => return Err(error),
                _ => {}
            }
        }
    }

    fn scan_regexp(&mut self) -> TokenKind {
        let mut in_class = false;

        loop {
            match self.advance() {
                None => return TokenKind::Invalid(LexError::UnterminatedRegExp),
                Some(ch) if is_line_terminator(ch) => {
                    return TokenKind::Invalid(LexError::UnterminatedRegExp);
                }
                Some('\\') => {
                    if self.advance().is_none_or(is_line_terminator) {
                        return TokenKind::Invalid(LexError::UnterminatedRegExp);
                    }
                }
                Some('[') => in_class = true,
                Some(']') => in_class = false,
                Some('/') if !in_class => break,
                Some(_) => {}
            }
        }

        // Flags
        while self.peek().is_some_and(is_id_continue) {
            self.advance();
        }

        TokenKind::RegExp
    }

    /// Scans the remainder of a numeric literal. The raw text is kept; the
    /// parser never needs the numeric value.
    fn scan_number(&mut self) -> TokenKind {
        let start = self.pos - 1;
        let radix_prefixed = self.source[start..].starts_with("0x")
            || self.source[start..].starts_with("0X")
            || self.source[start..].starts_with("0b")
            || self.source[start..].starts_with("0B")
            || self.source[start..].starts_with("0o")
            || self.source[start..].starts_with("0O");
        let mut prev = self.source[start..].chars().next().unwrap_or('0');

        while let Some(ch) = self.peek() {
            let exponent_sign = !radix_prefixed && matches!(prev, 'e' | 'E') && matches!(ch, '+' | '-');
            if ch.is_ascii_alphanumeric() || ch == '_' || ch == '.' || exponent_sign {
                prev = ch;
                self.advance();
            } else {
                break;
            }
        }

        TokenKind::Number(self.source[start..self.pos].to_string())
    }

    fn scan_identifier(&mut self, start: usize) -> TokenKind {
        while self.peek().is_some_and(is_id_continue) {
            self.advance();
        }

        let name = &self.source[start..self.pos];
        keyword(name).unwrap_or_else(|| TokenKind::Identifier(name.to_string()))
    }

    fn scan_private_identifier(&mut self) -> TokenKind {
        let start = self.pos;

        while self.peek().is_some_and(is_id_continue) {
            self.advance();
        }

        if start == self.pos {
            TokenKind::Invalid(LexError::UnexpectedCharacter)
        } else {
            TokenKind::PrivateIdentifier(self.source[start..self.pos].to_string())
        }
    }
}

/// Checks if a character can start an identifier.
fn is_id_start(ch: char) -> bool {
    ch == '_' || ch == '$' || unicode_xid::UnicodeXID::is_xid_start(ch)
}

/// Checks if a character can continue an identifier.
fn is_id_continue(ch: char) -> bool {
    ch == '_' || ch == '$' || ch == '\u{200c}' || ch == '\u{200d}' || unicode_xid::UnicodeXID::is_xid_continue(ch)
}

/// Checks for the four ECMAScript line terminators.
pub(crate) fn is_line_terminator(ch: char) -> bool {
    matches!(ch, '\n' | '\r' | '\u{2028}' | '\u{2029}')
}

impl<'a> Iterator for Scanner<'a> {
    type Item = Token;

    fn next(&mut self) -> Option<Self::Item> {
        let token = self.next_token();
        if token.kind == TokenKind::Eof {
            None
        } else {
            Some(token)
        }
    }
}

// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Syntax errors and source positions.

use serde::Serialize;
use thiserror::Error;

use crate::lexer::{LexError, is_line_terminator};

/// Result type for parsing and analysis.
pub type Result<T> = std::result::Result<T, SyntaxError>;

/// The reasons parsing or analysis can fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SyntaxErrorKind {
    /// A name declared twice where module rules forbid it
    Redeclaration,
    /// The same name exported twice
    DuplicateExport,
    /// A token that cannot appear where it does
    UnexpectedToken,
    /// A string, template, regular expression or comment with no end
    Unterminated,
    /// Input ended inside an open bracket
    UnexpectedEof,
}

/// A syntax error, raised at the first problem found.
///
/// Display renders the message with a ` (line:column)` suffix.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message} ({line}:{column})")]
pub struct SyntaxError {
    /// What went wrong
    pub kind: SyntaxErrorKind,
    /// Byte offset of the offending token or identifier
    pub position: usize,
    /// The message without location
    pub message: String,
    /// 1-based line
    pub line: usize,
    /// 0-based column, in characters
    pub column: usize,
}

impl SyntaxError {
    /// Creates an error at `position` in `source`.
    pub fn new(kind: SyntaxErrorKind, source: &str, position: usize, message: impl Into<String>) -> Self {
        let (line, column) = LineIndex::new(source).location(position);
        Self {
            kind,
            position,
            message: message.into(),
            line,
            column,
        }
    }

    /// `Identifier '<name>' has already been declared`
    pub fn redeclaration(source: &str, position: usize, name: &str) -> Self {
        Self::new(
            SyntaxErrorKind::Redeclaration,
            source,
            position,
            format!("Identifier '{}' has already been declared", name),
        )
    }

    /// `Duplicate export '<name>'`
    pub fn duplicate_export(source: &str, position: usize, name: &str) -> Self {
        Self::new(
            SyntaxErrorKind::DuplicateExport,
            source,
            position,
            format!("Duplicate export '{}'", name),
        )
    }

    /// `Unexpected token`
    pub fn unexpected(source: &str, position: usize) -> Self {
        Self::new(SyntaxErrorKind::UnexpectedToken, source, position, "Unexpected token")
    }

    /// `Unexpected end of input`
    pub fn unexpected_eof(source: &str) -> Self {
        Self::new(
            SyntaxErrorKind::UnexpectedEof,
            source,
            source.len(),
            "Unexpected end of input",
        )
    }

    /// Converts a scanner failure into a syntax error.
    pub fn from_lex(source: &str, position: usize, error: LexError) -> Self {
        let (kind, message) = match error {
            LexError::UnterminatedString => (SyntaxErrorKind::Unterminated, "Unterminated string constant"),
            LexError::UnterminatedTemplate => (SyntaxErrorKind::Unterminated, "Unterminated template"),
            LexError::UnterminatedRegExp => {
                (SyntaxErrorKind::Unterminated, "Unterminated regular expression")
            }
            LexError::UnterminatedComment => (SyntaxErrorKind::Unterminated, "Unterminated comment"),
            LexError::UnexpectedCharacter => (SyntaxErrorKind::UnexpectedToken, "Unexpected character"),
        };
        Self::new(kind, source, position, message)
    }
}

/// Maps byte offsets to line and column numbers.
#[derive(Debug, Clone)]
pub struct LineIndex<'a> {
    source: &'a str,
    line_starts: Vec<usize>,
}

impl<'a> LineIndex<'a> {
    /// Indexes the line starts of `source`.
    pub fn new(source: &'a str) -> Self {
        let mut line_starts = vec![0];
        let mut chars = source.char_indices().peekable();

        while let Some((offset, ch)) = chars.next() {
            if !is_line_terminator(ch) {
                continue;
            }
            // \r\n is one line break
            if ch == '\r' && matches!(chars.peek(), Some((_, '\n'))) {
                chars.next();
                line_starts.push(offset + 2);
            } else {
                line_starts.push(offset + ch.len_utf8());
            }
        }

        Self { source, line_starts }
    }

    /// Returns the 1-based line and 0-based column of a byte offset.
    pub fn location(&self, offset: usize) -> (usize, usize) {
        let offset = offset.min(self.source.len());
        let line = self.line_starts.partition_point(|&start| start <= offset);
        let line_start = self.line_starts[line - 1];
        let column = self
            .source
            .get(line_start..offset)
            .map_or(offset - line_start, |text| text.chars().count());
        (line, column)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_line_index() {
        let index = LineIndex::new("ab\ncd\r\nef");
        assert_eq!(index.location(0), (1, 0));
        assert_eq!(index.location(4), (2, 1));
        assert_eq!(index.location(7), (3, 0));
        assert_eq!(index.location(100), (3, 2));
    }

    #[test]
    fn test_display_has_location() {
        let error = SyntaxError::redeclaration("let a;\nvar  a;", 12, "a");
        assert_eq!(error.kind, SyntaxErrorKind::Redeclaration);
        assert_eq!(error.to_string(), "Identifier 'a' has already been declared (2:5)");
    }
}

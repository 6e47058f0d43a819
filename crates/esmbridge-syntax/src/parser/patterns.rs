// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Binding patterns and binding identifiers.

use super::Parser;
use crate::ast::{Identifier, ObjectPatternProperty, Pattern, PropertyKey, SourceType};
use crate::error::{Result, SyntaxError};
use crate::lexer::{Token, TokenKind};

impl<'a> Parser<'a> {
    /// Parses a binding identifier: a plain identifier or a contextual
    /// keyword the current source type allows as a name.
    pub(super) fn parse_binding_identifier(&mut self) -> Result<Identifier> {
        let token = self.current.clone();
        let id = self.binding_from_token(&token)?;
        self.bump()?;
        Ok(id)
    }

    pub(super) fn binding_from_token(&self, token: &Token) -> Result<Identifier> {
        let name = match &token.kind {
            TokenKind::Identifier(name) => name.clone(),
            kind if kind.is_contextual() && self.binding_keyword_allowed(kind) => {
                kind.keyword_text().unwrap_or_default().to_string()
            }
            _ => return Err(SyntaxError::unexpected(self.source, token.span.start)),
        };
        Ok(Identifier { name, span: token.span })
    }

    /// Module code is strict and reserves `await`, `yield`, `let` and `static`.
    fn binding_keyword_allowed(&self, kind: &TokenKind) -> bool {
        match self.source_type {
            SourceType::Module => *kind == TokenKind::Async,
            SourceType::Script => true,
        }
    }

    /// Parses an identifier, array or object binding pattern.
    pub(super) fn parse_binding_pattern(&mut self) -> Result<Pattern> {
        match &self.current.kind {
            TokenKind::LeftBracket => self.parse_array_pattern(),
            TokenKind::LeftBrace => self.parse_object_pattern(),
            _ => Ok(Pattern::Identifier(self.parse_binding_identifier()?)),
        }
    }

    /// A pattern with an optional `= default`.
    fn parse_binding_element(&mut self) -> Result<Pattern> {
        let target = self.parse_binding_pattern()?;
        if !self.check(&TokenKind::Equal) {
            return Ok(target);
        }
        self.bump()?;
        let default = self.skip_expression(true)?;
        Ok(Pattern::Assignment {
            target: Box::new(target),
            default,
        })
    }

    fn parse_array_pattern(&mut self) -> Result<Pattern> {
        self.expect(&TokenKind::LeftBracket)?;
        let mut elements = Vec::new();

        loop {
            match self.current.kind {
                TokenKind::RightBracket => break,
                TokenKind::Comma => {
                    self.bump()?;
                    elements.push(None);
                    continue;
                }
                TokenKind::Ellipsis => {
                    self.bump()?;
                    let rest = self.parse_binding_pattern()?;
                    elements.push(Some(Pattern::Rest(Box::new(rest))));
                }
                _ => elements.push(Some(self.parse_binding_element()?)),
            }

            if !self.check(&TokenKind::RightBracket) {
                self.expect(&TokenKind::Comma)?;
            }
        }

        self.bump()?;
        Ok(Pattern::Array(elements))
    }

    fn parse_object_pattern(&mut self) -> Result<Pattern> {
        self.expect(&TokenKind::LeftBrace)?;
        let mut properties = Vec::new();

        while !self.check(&TokenKind::RightBrace) {
            if self.check(&TokenKind::Ellipsis) {
                self.bump()?;
                let rest = Pattern::Identifier(self.parse_binding_identifier()?);
                properties.push(ObjectPatternProperty::Rest(rest));
            } else {
                properties.push(self.parse_pattern_property()?);
            }

            if !self.check(&TokenKind::RightBrace) {
                self.expect(&TokenKind::Comma)?;
            }
        }

        self.bump()?;
        Ok(Pattern::Object(properties))
    }

    fn parse_pattern_property(&mut self) -> Result<ObjectPatternProperty> {
        let token = self.current.clone();

        let key = match &token.kind {
            TokenKind::LeftBracket => PropertyKey::Computed(self.skip_balanced()?),
            TokenKind::String(value) | TokenKind::Number(value) => {
                let key = PropertyKey::Named(value.clone());
                self.bump()?;
                key
            }
            kind => match kind.name_text() {
                Some(name) => {
                    let key = PropertyKey::Named(name.to_string());
                    self.bump()?;
                    key
                }
                None => return Err(self.unexpected()),
            },
        };

        if self.check(&TokenKind::Colon) {
            self.bump()?;
            let value = self.parse_binding_element()?;
            return Ok(ObjectPatternProperty::Property { key, value });
        }

        // Shorthand `{ a }` or `{ a = 1 }` binds the key itself
        if !matches!(key, PropertyKey::Named(_)) || matches!(token.kind, TokenKind::String(_) | TokenKind::Number(_)) {
            return Err(self.unexpected());
        }
        let mut value = Pattern::Identifier(self.binding_from_token(&token)?);
        if self.check(&TokenKind::Equal) {
            self.bump()?;
            let default = self.skip_expression(true)?;
            value = Pattern::Assignment {
                target: Box::new(value),
                default,
            };
        }

        Ok(ObjectPatternProperty::Property { key, value })
    }
}

#[cfg(test)]
mod tests {
    use crate::ast::*;
    use crate::parser::Parser;

    fn declarator(source: &str) -> Pattern {
        let program = Parser::new(source, SourceType::Module).parse_program().unwrap();
        let StatementKind::Declaration(Declaration::Variable(var)) = &program.body[0].kind else {
            panic!("expected variable declaration");
        };
        var.declarations[0].id.clone()
    }

    #[test]
    fn test_array_pattern_with_holes_and_defaults() {
        let Pattern::Array(elements) = declarator("let [a, , b = [1, 2], ...c] = xs;") else {
            panic!("expected array pattern");
        };
        assert_eq!(elements.len(), 4);
        assert!(elements[1].is_none());
        assert!(matches!(elements[2], Some(Pattern::Assignment { .. })));
        assert!(matches!(elements[3], Some(Pattern::Rest(_))));
    }

    #[test]
    fn test_object_pattern_keys() {
        let Pattern::Object(properties) = declarator("const { a, b: { c }, [k]: d, 'e': f, g = h(1, 2), ...rest } = obj;") else {
            panic!("expected object pattern");
        };
        assert_eq!(properties.len(), 6);
        assert!(matches!(
            &properties[2],
            ObjectPatternProperty::Property { key: PropertyKey::Computed(_), .. }
        ));
        assert!(matches!(&properties[5], ObjectPatternProperty::Rest(_)));
    }

    #[test]
    fn test_reserved_binding_in_module() {
        assert!(Parser::new("let await = 1;", SourceType::Module).parse_program().is_err());
        assert!(Parser::new("var yield = 1;", SourceType::Script).parse_program().is_ok());
    }

    #[test]
    fn test_shorthand_keyword_is_rejected() {
        assert!(Parser::new("const { default } = obj;", SourceType::Module).parse_program().is_err());
        assert!(Parser::new("const { default: d } = obj;", SourceType::Module).parse_program().is_ok());
    }
}

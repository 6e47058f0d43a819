// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

use crate::ast::{Identifier, ObjectPatternProperty, Pattern};

/// Returns the names a binding pattern introduces, in source order.
pub fn bound_names(pattern: &Pattern) -> Vec<&Identifier> {
    let mut names = Vec::new();
    collect(pattern, &mut names);
    names
}

fn collect<'p>(pattern: &'p Pattern, names: &mut Vec<&'p Identifier>) {
    match pattern {
        Pattern::Identifier(id) => names.push(id),
        Pattern::Array(elements) => {
            for element in elements.iter().flatten() {
                collect(element, names);
            }
        }
        Pattern::Object(properties) => {
            for property in properties {
                match property {
                    ObjectPatternProperty::Property { value, .. } => collect(value, names),
                    ObjectPatternProperty::Rest(rest) => collect(rest, names),
                }
            }
        }
        Pattern::Assignment { target, .. } => collect(target, names),
        Pattern::Rest(inner) => collect(inner, names),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::PropertyKey;
    use crate::lexer::Span;

    fn id(name: &str, at: usize) -> Pattern {
        Pattern::Identifier(Identifier {
            name: name.to_string(),
            span: Span::new(at, at + name.len()),
        })
    }

    #[test]
    fn test_nested_pattern() {
        // { a, b: [c, , d = 1], ...e }
        let pattern = Pattern::Object(vec![
            ObjectPatternProperty::Property {
                key: PropertyKey::Named("a".into()),
                value: id("a", 2),
            },
            ObjectPatternProperty::Property {
                key: PropertyKey::Named("b".into()),
                value: Pattern::Array(vec![
                    Some(id("c", 9)),
                    None,
                    Some(Pattern::Assignment {
                        target: Box::new(id("d", 14)),
                        default: Span::new(18, 19),
                    }),
                ]),
            },
            ObjectPatternProperty::Rest(id("e", 26)),
        ]);

        let names: Vec<&str> = bound_names(&pattern).iter().map(|id| id.name.as_str()).collect();
        assert_eq!(names, vec!["a", "c", "d", "e"]);
    }

    #[test]
    fn test_simple_identifier() {
        let pattern = Pattern::Rest(Box::new(id("rest", 3)));
        assert_eq!(bound_names(&pattern)[0].span, Span::new(3, 7));
    }
}

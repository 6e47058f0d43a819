// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! # esmbridge-syntax
//!
//! Top-level parsing and hoisting analysis for ECMAScript modules.
//!
//! ## Overview
//!
//! This crate provides:
//! - A scanner for ECMAScript source text
//! - A parser that structures declarations, imports and exports
//! - A top-level declaration analyzer computing hoisting data and
//!   rejecting redeclarations
//!
//! ## Quick Start
//!
//! ```rust
//! use esmbridge_syntax::{SourceType, parse_module};
//!
//! let program = parse_module("\"use strict\";\nimport a from 'a';\nexport let b = a;", SourceType::Module)?;
//! let top = program.top.as_ref().unwrap();
//! assert_eq!(top.insert_index, 13);
//! assert!(top.imported_bindings.contains("a"));
//! # Ok::<(), esmbridge_syntax::SyntaxError>(())
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod analyzer;
pub mod ast;
pub mod error;
pub mod lexer;
pub mod parser;

pub use analyzer::{IdentifierTable, Provenance, TopLevel, analyze};
pub use ast::{Program, SourceType};
pub use error::{LineIndex, Result, SyntaxError, SyntaxErrorKind};
pub use parser::Parser;

use analyzer::TopLevelAnalyzer;

/// Parses `source` without analyzing it.
pub fn parse(source: &str, source_type: SourceType) -> Result<Program> {
    Parser::new(source, source_type).parse_program()
}

/// Parses and analyzes `source`, attaching the hoisting data as
/// `program.top`.
///
/// Each statement is analyzed as soon as it is parsed, so the first error
/// in source order wins, whether it is a syntax error or a redeclaration.
pub fn parse_module(source: &str, source_type: SourceType) -> Result<Program> {
    let mut parser = Parser::new(source, source_type);
    let mut analyzer = TopLevelAnalyzer::new(source, source_type, 0);

    let mut program = parser.parse_program_with(|stmt| analyzer.visit(stmt))?;
    let top = analyzer.finish(program.first_await_outside_function);

    tracing::debug!(
        ?source_type,
        statements = program.body.len(),
        identifiers = top.identifiers.len(),
        first_await = ?top.first_await_outside_function,
        "parsed module"
    );

    program.top = Some(top);
    Ok(program)
}

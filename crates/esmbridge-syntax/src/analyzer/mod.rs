// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Hoisting analysis over a program's top-level statements.
//!
//! The analyzer computes the identifier table, the import bindings and a
//! safe insertion point for generated code, and rejects redeclarations at
//! the offending identifier as it goes.

mod patterns;
mod top_level;

pub use patterns::bound_names;
pub use top_level::{IdentifierTable, Provenance, TopLevel, TopLevelAnalyzer};

use crate::ast::Program;
use crate::error::Result;

/// Analyzes an already parsed program and attaches the result as
/// `program.top`.
///
/// `source` is the text the program was parsed from; it is only used to
/// place errors.
pub fn analyze<'p>(program: &'p mut Program, source: &str) -> Result<&'p TopLevel> {
    let mut analyzer = TopLevelAnalyzer::new(source, program.source_type, program.span.start);

    for stmt in &program.body {
        analyzer.visit(stmt)?;
    }

    let top = analyzer.finish(program.first_await_outside_function);
    tracing::debug!(
        identifiers = top.identifiers.len(),
        imports = top.imported_bindings.len(),
        insert_index = top.insert_index,
        "analyzed top level"
    );

    let top: &TopLevel = program.top.insert(top);
    Ok(top)
}

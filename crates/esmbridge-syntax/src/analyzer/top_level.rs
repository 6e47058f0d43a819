// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Top-level declaration analysis.

use indexmap::{IndexMap, IndexSet};
use rustc_hash::FxHashSet;
use serde::Serialize;

use super::bound_names;
use crate::ast::{DeclarationRef, SourceType, Statement};
use crate::error::{Result, SyntaxError};

/// How a top-level name was declared.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Provenance {
    /// var, let or const
    VarLike,
    /// Function declaration
    Function,
    /// Class declaration
    Class,
    /// Import binding
    Imported,
}

/// Top-level names in first-declaration order.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct IdentifierTable {
    names: IndexMap<String, Provenance>,
}

impl IdentifierTable {
    /// Creates an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a name. A name seen before keeps its position and takes the
    /// new provenance.
    pub fn record(&mut self, name: &str, provenance: Provenance) {
        match self.names.get_mut(name) {
            Some(existing) => *existing = provenance,
            None => {
                self.names.insert(name.to_string(), provenance);
            }
        }
    }

    /// True if `name` has been recorded.
    pub fn contains(&self, name: &str) -> bool {
        self.names.contains_key(name)
    }

    /// The latest provenance recorded for `name`.
    pub fn get(&self, name: &str) -> Option<Provenance> {
        self.names.get(name).copied()
    }

    /// Iterates over names and provenances in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, Provenance)> {
        self.names.iter().map(|(name, provenance)| (name.as_str(), *provenance))
    }

    /// Iterates over names in declaration order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.names.keys().map(String::as_str)
    }

    /// Number of recorded names.
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// True if nothing has been recorded.
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

/// Hoisting data for one program.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TopLevel {
    /// Position of the first `await` outside any function body
    pub first_await_outside_function: Option<usize>,
    /// Every top-level binding and how it was declared
    pub identifiers: IdentifierTable,
    /// Import bindings in declaration order
    pub imported_bindings: IndexSet<String>,
    /// Where generated code may be inserted, past any directive prologue
    pub insert_index: usize,
    /// What must precede inserted code: `""`, or `";"` after a directive
    pub insert_prefix: &'static str,
}

/// Walks top-level statements left to right, failing at the first
/// redeclaration.
///
/// Statements can be fed while the parser is still running, so a
/// redeclaration is reported before any later syntax error.
#[derive(Debug)]
pub struct TopLevelAnalyzer<'s> {
    source: &'s str,
    in_module: bool,
    funcs: FxHashSet<String>,
    identifiers: IdentifierTable,
    imported_bindings: IndexSet<String>,
    insert_index: usize,
    insert_prefix: &'static str,
    inited: bool,
}

impl<'s> TopLevelAnalyzer<'s> {
    /// Starts an analysis of `source`, whose program begins at `start`.
    pub fn new(source: &'s str, source_type: SourceType, start: usize) -> Self {
        Self {
            source,
            in_module: source_type.is_module(),
            funcs: FxHashSet::default(),
            identifiers: IdentifierTable::new(),
            imported_bindings: IndexSet::new(),
            insert_index: start,
            insert_prefix: "",
            inited: false,
        }
    }

    /// Processes the next top-level statement.
    pub fn visit(&mut self, stmt: &Statement) -> Result<()> {
        if !self.inited {
            // Nothing may be hoisted above "use strict" and friends
            if stmt.directive().is_some() {
                self.insert_index = stmt.span.end;
                self.insert_prefix = ";";
            } else {
                self.inited = true;
            }
        }

        match stmt.declaration() {
            Some(DeclarationRef::Variable(var)) => {
                for declarator in &var.declarations {
                    for id in bound_names(&declarator.id) {
                        if self.in_module && self.funcs.contains(&id.name) {
                            return Err(SyntaxError::redeclaration(self.source, id.span.start, &id.name));
                        }
                        self.identifiers.record(&id.name, Provenance::VarLike);
                    }
                }
            }
            Some(DeclarationRef::Class(class)) => {
                if let Some(id) = &class.id {
                    self.identifiers.record(&id.name, Provenance::Class);
                }
            }
            Some(DeclarationRef::Function(func)) => {
                if let Some(id) = &func.id {
                    if self.in_module && self.identifiers.contains(&id.name) {
                        return Err(SyntaxError::redeclaration(self.source, id.span.start, &id.name));
                    }
                    self.funcs.insert(id.name.clone());
                    self.identifiers.record(&id.name, Provenance::Function);
                }
            }
            Some(DeclarationRef::Import(import)) => {
                for specifier in &import.specifiers {
                    let local = specifier.local();
                    let clash = self.imported_bindings.contains(&local.name)
                        || (self.in_module && self.identifiers.contains(&local.name));
                    if clash {
                        return Err(SyntaxError::redeclaration(self.source, local.span.start, &local.name));
                    }
                    self.identifiers.record(&local.name, Provenance::Imported);
                    self.imported_bindings.insert(local.name.clone());
                }
            }
            None => {}
        }

        Ok(())
    }

    /// Completes the analysis.
    pub fn finish(self, first_await_outside_function: Option<usize>) -> TopLevel {
        TopLevel {
            first_await_outside_function,
            identifiers: self.identifiers,
            imported_bindings: self.imported_bindings,
            insert_index: self.insert_index,
            insert_prefix: self.insert_prefix,
        }
    }
}

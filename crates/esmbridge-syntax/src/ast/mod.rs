// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Abstract Syntax Tree (AST) definitions for module top levels.
//!
//! Only the statement shapes that matter for hoisting and linking are
//! structured. Everything else is kept as an opaque statement with a span.
//! Names follow ESTree where possible.

use serde::Serialize;

use crate::analyzer::TopLevel;
use crate::lexer::Span;

/// Whether source text is parsed under module or script rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceType {
    /// ES module rules: strict, `await` reserved, redeclarations checked
    #[default]
    Module,
    /// Sloppy script rules
    Script,
}

impl SourceType {
    /// True under module rules.
    pub fn is_module(self) -> bool {
        self == SourceType::Module
    }
}

/// A parsed program.
#[derive(Debug, Clone, PartialEq)]
pub struct Program {
    /// The top-level statements in source order
    pub body: Vec<Statement>,
    /// The span of the whole program
    pub span: Span,
    /// The rules the program was parsed under
    pub source_type: SourceType,
    /// Position of the first `await` outside any function, as seen by the parser
    pub first_await_outside_function: Option<usize>,
    /// Hoisting data attached by the analyzer
    pub top: Option<TopLevel>,
}

/// An identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identifier {
    /// The name of the identifier
    pub name: String,
    /// Where it appears
    pub span: Span,
}

/// A string literal with its cooked value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StringLiteral {
    /// The cooked value
    pub value: String,
    /// Where it appears, quotes included
    pub span: Span,
}

/// A top-level statement.
#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    /// What kind of statement this is
    pub kind: StatementKind,
    /// The span, including a trailing semicolon when present
    pub span: Span,
}

/// The statement forms the top-level parser distinguishes.
#[derive(Debug, Clone, PartialEq)]
pub enum StatementKind {
    /// A variable, function or class declaration
    Declaration(Declaration),
    /// `import ... from "source"` or `import "source"`
    Import(ImportDeclaration),
    /// `export <declaration>` or `export { ... } [from "source"]`
    ExportNamed(ExportNamedDeclaration),
    /// `export default ...`
    ExportDefault(ExportDefaultDeclaration),
    /// `export * [as name] from "source"`
    ExportAll(ExportAllDeclaration),
    /// An expression statement
    Expression(Expression),
    /// Empty statement (;)
    Empty,
    /// Any other statement, left unstructured
    Other,
}

/// A declaration that can appear at the top level or behind `export`.
#[derive(Debug, Clone, PartialEq)]
pub enum Declaration {
    /// var, let or const
    Variable(VariableDeclaration),
    /// Function declaration
    Function(FunctionDeclaration),
    /// Class declaration
    Class(ClassDeclaration),
}

/// Variable declaration kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VariableKind {
    /// var declaration
    Var,
    /// let declaration
    Let,
    /// const declaration
    Const,
}

/// A variable declaration statement.
#[derive(Debug, Clone, PartialEq)]
pub struct VariableDeclaration {
    /// The kind of declaration
    pub kind: VariableKind,
    /// The declarators
    pub declarations: Vec<VariableDeclarator>,
}

/// A single variable declarator. Initializers are skipped, not parsed.
#[derive(Debug, Clone, PartialEq)]
pub struct VariableDeclarator {
    /// The binding pattern being declared
    pub id: Pattern,
    /// The span of the initializer, if any
    pub init: Option<Span>,
}

/// A function declaration.
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionDeclaration {
    /// The function name; only `export default function () {}` omits it
    pub id: Option<Identifier>,
    /// Whether this is an async function
    pub is_async: bool,
    /// Whether this is a generator function
    pub is_generator: bool,
}

/// A class declaration.
#[derive(Debug, Clone, PartialEq)]
pub struct ClassDeclaration {
    /// The class name; only `export default class {}` omits it
    pub id: Option<Identifier>,
    /// The span of the `extends` expression, if any
    pub super_class: Option<Span>,
}

/// A binding pattern.
#[derive(Debug, Clone, PartialEq)]
pub enum Pattern {
    /// A plain name
    Identifier(Identifier),
    /// `[a, , b = 1, ...rest]`; holes are `None`
    Array(Vec<Option<Pattern>>),
    /// `{ a, b: c, [k]: d, ...rest }`
    Object(Vec<ObjectPatternProperty>),
    /// A pattern with a default value
    Assignment {
        /// The pattern receiving the value
        target: Box<Pattern>,
        /// The span of the default expression
        default: Span,
    },
    /// `...pattern`
    Rest(Box<Pattern>),
}

/// One property of an object pattern.
#[derive(Debug, Clone, PartialEq)]
pub enum ObjectPatternProperty {
    /// `key: value` or shorthand `value`
    Property {
        /// The property key
        key: PropertyKey,
        /// The pattern bound to the property
        value: Pattern,
    },
    /// `...rest`
    Rest(Pattern),
}

/// A property key in an object pattern.
#[derive(Debug, Clone, PartialEq)]
pub enum PropertyKey {
    /// An identifier, string or numeric key
    Named(String),
    /// `[expression]`
    Computed(Span),
}

/// An import declaration.
#[derive(Debug, Clone, PartialEq)]
pub struct ImportDeclaration {
    /// Local bindings introduced by the import, empty for `import "x"`
    pub specifiers: Vec<ImportSpecifier>,
    /// The module request
    pub source: StringLiteral,
    /// The span of a `with { ... }` clause, if any
    pub attributes: Option<Span>,
}

/// One binding introduced by an import declaration.
#[derive(Debug, Clone, PartialEq)]
pub enum ImportSpecifier {
    /// `import local from "x"`
    Default {
        /// The local binding
        local: Identifier,
    },
    /// `import * as local from "x"`
    Namespace {
        /// The local binding
        local: Identifier,
    },
    /// `import { imported as local } from "x"`
    Named {
        /// The export name requested from the source module
        imported: ModuleExportName,
        /// The local binding
        local: Identifier,
    },
}

impl ImportSpecifier {
    /// Returns the local binding this specifier introduces.
    pub fn local(&self) -> &Identifier {
        match self {
            ImportSpecifier::Default { local }
            | ImportSpecifier::Namespace { local }
            | ImportSpecifier::Named { local, .. } => local,
        }
    }

    /// Returns the export name requested from the source module.
    /// Namespace imports request the whole module and return `None`.
    pub fn imported_name(&self) -> Option<&str> {
        match self {
            ImportSpecifier::Default { .. } => Some("default"),
            ImportSpecifier::Namespace { .. } => None,
            ImportSpecifier::Named { imported, .. } => Some(&imported.name),
        }
    }
}

/// An identifier or string naming a module export.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleExportName {
    /// The name
    pub name: String,
    /// Where it appears
    pub span: Span,
}

/// `export { local as exported }`
#[derive(Debug, Clone, PartialEq)]
pub struct ExportSpecifier {
    /// The local name, or the imported name when re-exporting
    pub local: ModuleExportName,
    /// The name other modules see
    pub exported: ModuleExportName,
}

/// `export <declaration>` or `export { ... } [from "source"]`.
#[derive(Debug, Clone, PartialEq)]
pub struct ExportNamedDeclaration {
    /// The exported declaration, if any
    pub declaration: Option<Declaration>,
    /// The export specifiers
    pub specifiers: Vec<ExportSpecifier>,
    /// The re-export source
    pub source: Option<StringLiteral>,
}

/// `export default ...`
#[derive(Debug, Clone, PartialEq)]
pub enum ExportDefaultDeclaration {
    /// `export default function ...`
    Function(FunctionDeclaration),
    /// `export default class ...`
    Class(ClassDeclaration),
    /// `export default <expression>`
    Expression(Span),
}

/// `export * [as exported] from "source"`.
#[derive(Debug, Clone, PartialEq)]
pub struct ExportAllDeclaration {
    /// The namespace export name for `export * as name`
    pub exported: Option<ModuleExportName>,
    /// The module request
    pub source: StringLiteral,
}

/// An expression in statement position.
#[derive(Debug, Clone, PartialEq)]
pub enum Expression {
    /// A lone string literal
    StringLiteral(StringLiteral),
    /// Anything else
    Other(Span),
}

impl Statement {
    /// Returns the directive text when this statement is a lone string
    /// literal expression.
    pub fn directive(&self) -> Option<&str> {
        match &self.kind {
            StatementKind::Expression(Expression::StringLiteral(literal)) => Some(&literal.value),
            _ => None,
        }
    }

    /// Looks through `export` wrappers to the declaration underneath.
    pub fn declaration(&self) -> Option<DeclarationRef<'_>> {
        match &self.kind {
            StatementKind::Declaration(decl) => Some(DeclarationRef::from(decl)),
            StatementKind::ExportNamed(export) => export.declaration.as_ref().map(DeclarationRef::from),
            StatementKind::ExportDefault(ExportDefaultDeclaration::Function(func)) => {
                Some(DeclarationRef::Function(func))
            }
            StatementKind::ExportDefault(ExportDefaultDeclaration::Class(class)) => {
                Some(DeclarationRef::Class(class))
            }
            StatementKind::Import(import) => Some(DeclarationRef::Import(import)),
            _ => None,
        }
    }
}

/// A borrowed view of the declaration a statement introduces.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DeclarationRef<'a> {
    /// var, let or const
    Variable(&'a VariableDeclaration),
    /// Function declaration
    Function(&'a FunctionDeclaration),
    /// Class declaration
    Class(&'a ClassDeclaration),
    /// Import declaration
    Import(&'a ImportDeclaration),
}

impl<'a> From<&'a Declaration> for DeclarationRef<'a> {
    fn from(decl: &'a Declaration) -> Self {
        match decl {
            Declaration::Variable(var) => DeclarationRef::Variable(var),
            Declaration::Function(func) => DeclarationRef::Function(func),
            Declaration::Class(class) => DeclarationRef::Class(class),
        }
    }
}

// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Error taxonomy for the module loader
//!
//! Every failure the loader can raise is an [`EsmError`] built by one of the
//! constructors below. Building an error never fails.

use std::fmt;
use std::path::Path;

use esmbridge_syntax::{SyntaxError, SyntaxErrorKind};
use thiserror::Error;
use url::Url;

use crate::modules::util::{InspectOptions, inspect};
use crate::value::Value;

/// Result type for loader operations
pub type Result<T> = std::result::Result<T, EsmError>;

/// Inspected values longer than this are cut in messages
const TRUNCATE_AT: usize = 128;

/// The closed set of error kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// A binding declared twice in one program
    Redeclaration,
    /// The same name exported twice in one program
    DuplicateExport,
    /// Any other parse failure
    Syntax,
    /// Import of a name the module does not export
    ExportMissing,
    /// Two star exports supply different bindings for one name
    ExportStarConflict,
    /// Read of a binding still in its temporal dead zone
    UseBeforeInit,
    /// A `.mjs` file that is not an ES module
    InvalidEsmFileExtension,
    /// Unrecognized `mode` option
    InvalidEsmMode,
    /// Unrecognized option key
    UnknownEsmOption,
    /// Argument of the wrong type
    InvalidArgType,
    /// Argument of the right type but a bad value
    InvalidArgValue,
    /// URL with an unsupported scheme
    InvalidProtocol,
    /// Import resolution that only the legacy algorithm satisfies
    ModuleResolutionLegacy,
    /// `require` of an ES module
    RequireEsm,
    /// File with an extension the loader does not handle
    UnknownFileExtension,
    /// Unknown module request
    ModuleNotFound,
    /// Failure raised by a native host function
    Host,
}

impl ErrorKind {
    /// The stable code, for kinds that have one.
    pub fn code(self) -> Option<&'static str> {
        Some(match self {
            Self::ExportMissing => "ERR_EXPORT_MISSING",
            Self::ExportStarConflict => "ERR_EXPORT_STAR_CONFLICT",
            Self::InvalidEsmFileExtension => "ERR_INVALID_ESM_FILE_EXTENSION",
            Self::InvalidEsmMode => "ERR_INVALID_ESM_MODE",
            Self::UnknownEsmOption => "ERR_UNKNOWN_ESM_OPTION",
            Self::InvalidArgType => "ERR_INVALID_ARG_TYPE",
            Self::InvalidArgValue => "ERR_INVALID_ARG_VALUE",
            Self::InvalidProtocol => "ERR_INVALID_PROTOCOL",
            Self::ModuleResolutionLegacy => "ERR_MODULE_RESOLUTION_LEGACY",
            Self::RequireEsm => "ERR_REQUIRE_ESM",
            Self::UnknownFileExtension => "ERR_UNKNOWN_FILE_EXTENSION",
            Self::ModuleNotFound => "MODULE_NOT_FOUND",
            Self::Redeclaration
            | Self::DuplicateExport
            | Self::Syntax
            | Self::UseBeforeInit
            | Self::Host => return None,
        })
    }

    /// The error class values of this kind are instances of.
    pub fn class(self) -> ErrorClass {
        match self {
            Self::Redeclaration
            | Self::DuplicateExport
            | Self::Syntax
            | Self::ExportMissing
            | Self::ExportStarConflict => ErrorClass::SyntaxError,
            Self::UseBeforeInit => ErrorClass::ReferenceError,
            Self::InvalidArgType => ErrorClass::TypeError,
            _ => ErrorClass::Error,
        }
    }

    /// Node-style errors expose their code and carry it in their name.
    pub fn is_node_style(self) -> bool {
        matches!(
            self,
            Self::InvalidArgType
                | Self::InvalidArgValue
                | Self::InvalidProtocol
                | Self::ModuleResolutionLegacy
                | Self::RequireEsm
                | Self::UnknownFileExtension
                | Self::ModuleNotFound
        )
    }
}

/// Host error classes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorClass {
    /// `Error`
    Error,
    /// `SyntaxError`
    SyntaxError,
    /// `TypeError`
    TypeError,
    /// `ReferenceError`
    ReferenceError,
}

impl ErrorClass {
    /// The class name.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Error => "Error",
            Self::SyntaxError => "SyntaxError",
            Self::TypeError => "TypeError",
            Self::ReferenceError => "ReferenceError",
        }
    }
}

impl fmt::Display for ErrorClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A loader error.
///
/// `code` and `name` may be rewritten after construction, the rest is fixed.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{name}: {message}")]
pub struct EsmError {
    kind: ErrorKind,
    class: ErrorClass,
    code: Option<String>,
    name: String,
    message: String,
    position: Option<usize>,
}

impl EsmError {
    /// Builds an error of `kind` with a ready message.
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        let class = kind.class();
        let (code, name) = match kind.code() {
            Some(code) if kind == ErrorKind::ModuleNotFound => {
                (Some(code.to_string()), class.to_string())
            }
            Some(code) if kind.is_node_style() => {
                (Some(code.to_string()), format!("{} [{}]", class, code))
            }
            _ => (None, class.to_string()),
        };

        Self {
            kind,
            class,
            code,
            name,
            message: message.into(),
            position: None,
        }
    }

    /// Attaches a source position.
    pub fn at(mut self, position: usize) -> Self {
        self.position = Some(position);
        self
    }

    /// The error kind
    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// The error class
    pub fn class(&self) -> ErrorClass {
        self.class
    }

    /// The error code, if any
    pub fn code(&self) -> Option<&str> {
        self.code.as_deref()
    }

    /// The error name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The message, without the name
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Source offset, when the error comes from source text
    pub fn position(&self) -> Option<usize> {
        self.position
    }

    /// Replaces the code.
    pub fn set_code(&mut self, code: impl Into<String>) {
        self.code = Some(code.into());
    }

    /// Replaces the name.
    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    /// `ERR_EXPORT_MISSING`
    pub fn export_missing(request: &str, export_name: &str) -> Self {
        Self::new(
            ErrorKind::ExportMissing,
            format!(
                "ES Module {} does not provide an export named '{}'",
                to_string_literal(&module_url(request), '\''),
                export_name
            ),
        )
    }

    /// `ERR_EXPORT_STAR_CONFLICT`
    pub fn export_star_conflict(request: &str, export_name: &str) -> Self {
        Self::new(
            ErrorKind::ExportStarConflict,
            format!(
                "ES Module {} contains conflicting star exports for name '{}'",
                to_string_literal(&module_url(request), '\''),
                export_name
            ),
        )
    }

    /// `ERR_INVALID_ESM_FILE_EXTENSION`
    pub fn invalid_esm_file_extension(request: &str) -> Self {
        Self::new(
            ErrorKind::InvalidEsmFileExtension,
            format!(
                "ES Module {} cannot be loaded from .mjs files",
                to_string_literal(&module_url(request), '\'')
            ),
        )
    }

    /// `ERR_INVALID_ESM_MODE`
    pub fn invalid_esm_mode(mode: &Value) -> Self {
        Self::new(
            ErrorKind::InvalidEsmMode,
            format!("The ESM option 'mode' is invalid. Received {}", trunc_inspect(mode)),
        )
    }

    /// `ERR_UNKNOWN_ESM_OPTION`
    pub fn unknown_esm_option(option_name: &str) -> Self {
        Self::new(
            ErrorKind::UnknownEsmOption,
            format!("Unknown ESM option: {}", option_name),
        )
    }

    /// `ERR_INVALID_ARG_TYPE`. The received type is only named when
    /// `actual` is given.
    pub fn invalid_arg_type(arg_name: &str, expected: &str, actual: Option<&Value>) -> Self {
        let mut message = format!("The '{}' argument must be {}", arg_name, expected);
        if let Some(actual) = actual {
            let type_name = match actual {
                Value::Null => "null",
                other => other.type_of(),
            };
            message.push_str(". Received type ");
            message.push_str(type_name);
        }
        Self::new(ErrorKind::InvalidArgType, message)
    }

    /// `ERR_INVALID_ARG_VALUE`. `reason` defaults to "is invalid".
    pub fn invalid_arg_value(arg_name: &str, value: &Value, reason: Option<&str>) -> Self {
        Self::new(
            ErrorKind::InvalidArgValue,
            format!(
                "The argument '{}' {}. Received {}",
                arg_name,
                reason.unwrap_or("is invalid"),
                trunc_inspect(value)
            ),
        )
    }

    /// `ERR_INVALID_PROTOCOL`
    pub fn invalid_protocol(protocol: &str, expected: &str) -> Self {
        Self::new(
            ErrorKind::InvalidProtocol,
            format!("Protocol '{}' not supported. Expected '{}'", protocol, expected),
        )
    }

    /// `ERR_MODULE_RESOLUTION_LEGACY`
    pub fn module_resolution_legacy(id: &str, from_path: &str, found_path: &str) -> Self {
        Self::new(
            ErrorKind::ModuleResolutionLegacy,
            format!(
                "{} not found by import in {}. Legacy behavior in require() would have found it at {}",
                id, from_path, found_path
            ),
        )
    }

    /// `ERR_REQUIRE_ESM`
    pub fn require_esm(request: &str) -> Self {
        Self::new(
            ErrorKind::RequireEsm,
            format!("Must use import to load ES Module: {}", module_url(request)),
        )
    }

    /// `ERR_UNKNOWN_FILE_EXTENSION`
    pub fn unknown_file_extension(filename: &str) -> Self {
        Self::new(
            ErrorKind::UnknownFileExtension,
            format!("Unknown file extension: {}", filename),
        )
    }

    /// `MODULE_NOT_FOUND`
    pub fn module_not_found(request: &str) -> Self {
        Self::new(
            ErrorKind::ModuleNotFound,
            format!("Cannot find module {}", to_string_literal(request, '\'')),
        )
    }

    /// A binding declared twice.
    pub fn redeclaration(name: &str, position: usize) -> Self {
        Self::new(
            ErrorKind::Redeclaration,
            format!("Identifier '{}' has already been declared", name),
        )
        .at(position)
    }

    /// A binding read before its declaration ran.
    pub fn use_before_init(name: &str) -> Self {
        Self::new(
            ErrorKind::UseBeforeInit,
            format!("Cannot access '{}' before initialization", name),
        )
    }

    /// A failure raised by native code under its own error name, such as
    /// `AssertionError`.
    pub fn host(name: &str, message: impl Into<String>) -> Self {
        let mut error = Self::new(ErrorKind::Host, message);
        error.set_name(name);
        error
    }
}

impl From<SyntaxError> for EsmError {
    fn from(error: SyntaxError) -> Self {
        let kind = match error.kind {
            SyntaxErrorKind::Redeclaration => ErrorKind::Redeclaration,
            SyntaxErrorKind::DuplicateExport => ErrorKind::DuplicateExport,
            _ => ErrorKind::Syntax,
        };
        Self::new(kind, error.to_string()).at(error.position)
    }
}

/// Renders absolute paths as `file://` URLs. Anything else is returned as
/// given.
pub fn module_url(request: &str) -> String {
    let path = Path::new(request);
    if path.is_absolute() {
        if let Ok(url) = Url::from_file_path(path) {
            return url.to_string();
        }
    }
    request.to_string()
}

/// Quotes `value` as a string literal using `quote`.
pub fn to_string_literal(value: &str, quote: char) -> String {
    let mut literal = String::with_capacity(value.len() + 2);
    literal.push(quote);
    for ch in value.chars() {
        match ch {
            '\\' => literal.push_str("\\\\"),
            '\n' => literal.push_str("\\n"),
            '\r' => literal.push_str("\\r"),
            '\t' => literal.push_str("\\t"),
            '\u{8}' => literal.push_str("\\b"),
            '\u{c}' => literal.push_str("\\f"),
            c if c == quote => {
                literal.push('\\');
                literal.push(c);
            }
            c if c.is_control() => literal.push_str(&format!("\\u{:04x}", c as u32)),
            c => literal.push(c),
        }
    }
    literal.push(quote);
    literal
}

fn trunc_inspect(value: &Value) -> String {
    let inspected = inspect(value, &InspectOptions::default());
    match inspected.char_indices().nth(TRUNCATE_AT) {
        Some((cut, _)) => format!("{}...", &inspected[..cut]),
        None => inspected,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_errors_have_no_code() {
        let error = EsmError::export_missing("./dep.mjs", "x");
        assert_eq!(error.code(), None);
        assert_eq!(error.name(), "SyntaxError");
        assert_eq!(
            error.message(),
            "ES Module './dep.mjs' does not provide an export named 'x'"
        );
    }

    #[test]
    fn test_node_style_name_carries_code() {
        let error = EsmError::invalid_arg_type("options", "of type object", Some(&Value::Null));
        assert_eq!(error.code(), Some("ERR_INVALID_ARG_TYPE"));
        assert_eq!(error.name(), "TypeError [ERR_INVALID_ARG_TYPE]");
        assert_eq!(
            error.to_string(),
            "TypeError [ERR_INVALID_ARG_TYPE]: The 'options' argument must be of type object. Received type null"
        );
    }

    #[test]
    fn test_received_type_only_when_given() {
        let error = EsmError::invalid_arg_type("id", "a string", None);
        assert_eq!(error.message(), "The 'id' argument must be a string");
    }

    #[test]
    fn test_module_not_found_keeps_plain_name() {
        let mut error = EsmError::module_not_found("left-pad");
        assert_eq!(error.name(), "Error");
        assert_eq!(error.code(), Some("MODULE_NOT_FOUND"));
        assert_eq!(error.message(), "Cannot find module 'left-pad'");

        error.set_code("ERR_MODULE_NOT_FOUND");
        error.set_name("Error [ERR_MODULE_NOT_FOUND]");
        assert_eq!(error.code(), Some("ERR_MODULE_NOT_FOUND"));
        assert_eq!(error.kind(), ErrorKind::ModuleNotFound);
    }

    #[test]
    fn test_absolute_requests_become_file_urls() {
        #[cfg(unix)]
        assert_eq!(module_url("/tmp/a b.mjs"), "file:///tmp/a%20b.mjs");
        assert_eq!(module_url("./rel.mjs"), "./rel.mjs");
    }

    #[test]
    fn test_string_literal_escapes_quote() {
        assert_eq!(to_string_literal("it's\n", '\''), "'it\\'s\\n'");
        assert_eq!(to_string_literal("\"x\"", '\''), "'\"x\"'");
    }

    #[test]
    fn test_long_values_are_truncated() {
        let value = Value::String("x".repeat(300));
        let error = EsmError::invalid_arg_value("source", &value, None);
        let received = error.message().split("Received ").nth(1).unwrap();
        assert_eq!(received.len(), 131);
        assert!(received.ends_with("..."));
        assert!(error.message().starts_with("The argument 'source' is invalid."));
    }

    #[test]
    fn test_syntax_error_conversion_keeps_position() {
        let source = "let a;\nlet a;";
        let syntax = esmbridge_syntax::SyntaxError::redeclaration(source, 11, "a");
        let error = EsmError::from(syntax);
        assert_eq!(error.kind(), ErrorKind::Redeclaration);
        assert_eq!(error.position(), Some(11));
        assert_eq!(error.class(), ErrorClass::SyntaxError);
    }
}

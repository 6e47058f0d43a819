// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Host module records

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use once_cell::sync::Lazy;
use parking_lot::RwLock;

use crate::error::EsmError;
use crate::value::{Function, FunctionRef, Object, Properties, Value};

static NEXT_KEY: AtomicU64 = AtomicU64::new(1);

/// Process-unique module identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ModuleKey(u64);

impl ModuleKey {
    fn next() -> Self {
        Self(NEXT_KEY.fetch_add(1, Ordering::Relaxed))
    }
}

/// How a module's source is interpreted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ModuleKind {
    /// ECMAScript module
    EsModule,
    /// CommonJS module
    CommonJs,
    /// JSON document
    Json,
    /// Built-in module supplied by the host
    Builtin,
}

/// A host module record: what `require` sees.
///
/// Two modules with the same `id` are still different modules; identity is
/// the [`ModuleKey`] handed out at construction.
#[derive(Debug)]
pub struct Module {
    key: ModuleKey,
    id: String,
    filename: Option<PathBuf>,
    kind: ModuleKind,
    exports: RwLock<Value>,
    loaded: AtomicBool,
}

/// Shared module handle
pub type ModuleRef = Arc<Module>;

impl Module {
    /// Creates a module whose exports start as an empty object.
    pub fn new(id: impl Into<String>, kind: ModuleKind) -> Self {
        Self {
            key: ModuleKey::next(),
            id: id.into(),
            filename: None,
            kind,
            exports: RwLock::new(Value::Object(Object::new())),
            loaded: AtomicBool::new(false),
        }
    }

    /// Sets the file the module was loaded from.
    pub fn with_filename(mut self, filename: impl Into<PathBuf>) -> Self {
        self.filename = Some(filename.into());
        self
    }

    /// Identity key
    pub fn key(&self) -> ModuleKey {
        self.key
    }

    /// Module id
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Source file, if any
    pub fn filename(&self) -> Option<&Path> {
        self.filename.as_deref()
    }

    /// Interpretation
    pub fn kind(&self) -> ModuleKind {
        self.kind
    }

    /// Current `module.exports`
    pub fn exports(&self) -> Value {
        self.exports.read().clone()
    }

    /// Replaces `module.exports`.
    pub fn set_exports(&self, exports: Value) {
        *self.exports.write() = exports;
    }

    /// Whether evaluation finished
    pub fn is_loaded(&self) -> bool {
        self.loaded.load(Ordering::Acquire)
    }

    /// Marks evaluation finished or not.
    pub fn set_loaded(&self, loaded: bool) {
        self.loaded.store(loaded, Ordering::Release);
    }
}

static MODULE_CONSTRUCTOR: Lazy<FunctionRef> = Lazy::new(|| {
    let constructor = Function::constructor("Module", |_, args| {
        let id = args.first().cloned().unwrap_or_else(|| Value::string(""));
        if !matches!(id, Value::String(_)) {
            return Err(EsmError::invalid_arg_type("id", "of type string", Some(&id)));
        }
        let module = Object::with_class("Module");
        module.set("id", id);
        module.set("exports", Value::Object(Object::new()));
        module.set("loaded", Value::Boolean(false));
        Ok(Value::Object(module))
    });

    constructor.set(
        "wrap",
        Value::function("wrap", |_, args| {
            let source = match args.first() {
                Some(Value::String(source)) => source.as_str(),
                _ => "",
            };
            Ok(Value::String(wrap(source)))
        }),
    );
    constructor.set("Module", Value::Function(constructor.clone()));
    constructor
});

/// The loader's `Module` constructor. The same function is returned on
/// every call.
pub fn module_constructor() -> FunctionRef {
    MODULE_CONSTRUCTOR.clone()
}

/// Wraps CommonJS source in its function wrapper.
pub fn wrap(source: &str) -> String {
    format!(
        "(function (exports, require, module, __filename, __dirname) {{ {}\n}});",
        source
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keys_are_unique() {
        let a = Module::new("same", ModuleKind::CommonJs);
        let b = Module::new("same", ModuleKind::CommonJs);
        assert_ne!(a.key(), b.key());
    }

    #[test]
    fn test_exports_start_empty() {
        let module = Module::new("m", ModuleKind::CommonJs);
        assert!(module.exports().own_names().is_empty());
        assert!(!module.is_loaded());
    }

    #[test]
    fn test_module_constructor_is_shared() {
        let a = module_constructor();
        let b = module_constructor();
        assert!(Arc::ptr_eq(&a, &b));

        let made = a.call(&Value::Undefined, &[Value::from("x")]).unwrap();
        assert_eq!(made.get("id").unwrap(), Value::from("x"));
        assert!(a.call(&Value::Undefined, &[Value::Number(1.0)]).is_err());
    }

    #[test]
    fn test_wrap() {
        assert_eq!(
            wrap("x"),
            "(function (exports, require, module, __filename, __dirname) { x\n});"
        );
    }
}

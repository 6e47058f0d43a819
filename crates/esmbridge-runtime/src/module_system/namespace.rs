// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Namespace objects and live exports proxies
//!
//! Both views hold their entry weakly; the entry registry owns entries for
//! the life of the process.

use std::fmt;
use std::sync::{Arc, Weak};

use super::entry::{Entry, Resolution};
use crate::error::Result;
use crate::value::{Object, ObjectRef, Properties, PropertyKey, Value};

struct NamespaceInner {
    entry: Weak<Entry>,
}

/// Read-only view over an entry's exports.
///
/// Names and reads resolve through the entry every time, so they observe
/// exports declared after the namespace was handed out and the current
/// getter of each binding. Clones are the same namespace.
#[derive(Clone)]
pub struct Namespace(Arc<NamespaceInner>);

impl Namespace {
    pub(crate) fn new(entry: &Arc<Entry>) -> Self {
        Self(Arc::new(NamespaceInner {
            entry: Arc::downgrade(entry),
        }))
    }

    /// The entry this namespace views
    pub fn entry(&self) -> Option<Arc<Entry>> {
        self.0.entry.upgrade()
    }

    /// Export names in declaration order. Names whose star exports
    /// conflict are left out.
    pub fn keys(&self) -> Vec<String> {
        let Some(entry) = self.entry() else {
            return Vec::new();
        };
        entry
            .exported_names()
            .into_iter()
            .filter(|name| matches!(entry.resolve_export(name), Resolution::Found(_)))
            .collect()
    }

    /// True if `name` is exported
    pub fn has(&self, name: &str) -> bool {
        self.entry()
            .is_some_and(|entry| matches!(entry.resolve_export(name), Resolution::Found(_)))
    }

    /// Reads export `name`; `None` if it is not exported.
    pub fn get(&self, name: &str) -> Result<Option<Value>> {
        if !self.has(name) {
            return Ok(None);
        }
        match self.entry() {
            Some(entry) => entry.read_export(name),
            None => Ok(None),
        }
    }

    /// True if both are the same namespace object.
    pub fn ptr_eq(&self, other: &Namespace) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }

    /// Snapshots the current values into a plain object tagged `Module`.
    pub fn to_object(&self) -> Result<ObjectRef> {
        let object = Object::with_class("Module");
        for key in self.keys() {
            if let Some(value) = self.get(&key)? {
                object.set(key.as_str(), value);
            }
        }
        Ok(object)
    }
}

impl fmt::Debug for Namespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Namespace")
            .field("entry", &self.entry().map(|entry| entry.id()))
            .field("keys", &self.keys())
            .finish()
    }
}

struct ProxyInner {
    entry: Weak<Entry>,
    target: Value,
}

/// Live view of a built-in module's exports.
///
/// Exported names read through the entry, anything else reads the
/// underlying object. Writes always go to the underlying object.
#[derive(Clone)]
pub struct ExportsProxy(Arc<ProxyInner>);

impl ExportsProxy {
    pub(crate) fn new(entry: &Arc<Entry>, target: Value) -> Self {
        Self(Arc::new(ProxyInner {
            entry: Arc::downgrade(entry),
            target,
        }))
    }

    /// The entry whose bindings this proxy reads
    pub fn entry(&self) -> Option<Arc<Entry>> {
        self.0.entry.upgrade()
    }

    /// The underlying exports object
    pub fn target(&self) -> &Value {
        &self.0.target
    }

    /// Reads a property.
    pub fn get(&self, name: &str) -> Result<Value> {
        // `default` is the proxy itself, not a property of it
        if name != "default" {
            if let Some(entry) = self.entry().filter(|entry| entry.has_export(name)) {
                return Ok(entry.read_export(name)?.unwrap_or_default());
            }
        }
        self.0.target.get(name)
    }

    /// Writes a property of the underlying object.
    pub fn set(&self, key: impl Into<PropertyKey>, value: Value) -> bool {
        self.0.target.set(key, value)
    }

    /// Calls the underlying function.
    pub fn call(&self, this: &Value, args: &[Value]) -> Result<Value> {
        self.0.target.call(this, args)
    }

    /// True if both are the same proxy.
    pub fn ptr_eq(&self, other: &ExportsProxy) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for ExportsProxy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExportsProxy")
            .field("entry", &self.entry().map(|entry| entry.id()))
            .field("target", &self.0.target)
            .finish()
    }
}

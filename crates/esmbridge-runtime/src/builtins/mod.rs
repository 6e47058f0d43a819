// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Built-in bridge
//!
//! Wraps the host's module objects in entries so `import "path"` gets the
//! same namespace semantics as an analyzed module. Each entry is built on
//! first request. The host module's `exports` are swapped for a live
//! [`ExportsProxy`], so CommonJS callers and the namespace observe the same
//! bindings.

mod corrections;
mod host;

pub use corrections::{CORRECTIONS, Correction, correction_for};
pub use host::{HostModules, NativeModules};

use std::sync::Arc;

use dashmap::DashMap;
use tracing::debug;

use crate::error::{EsmError, Result};
use crate::module_system::{Entry, EntryRegistry, ExportsProxy, Getter, Module, ModuleKind};
use crate::value::{Properties, Value, unwrap_proxy};

/// Lazily built entries for the host's modules.
pub struct BuiltinEntries {
    host: Arc<dyn HostModules>,
    registry: Arc<EntryRegistry>,
    entries: DashMap<String, Arc<Entry>>,
}

impl BuiltinEntries {
    /// Creates the bridge; entries are created in `registry`.
    pub fn new(host: Arc<dyn HostModules>, registry: Arc<EntryRegistry>) -> Self {
        Self {
            host,
            registry,
            entries: DashMap::new(),
        }
    }

    /// Ids the host provides
    pub fn ids(&self) -> Vec<String> {
        self.host.builtin_ids()
    }

    /// True if `id` names a host module, with or without `node:`.
    pub fn is_builtin(&self, id: &str) -> bool {
        let id = strip_scheme(id);
        self.host.builtin_ids().iter().any(|known| known == id)
    }

    /// The entry for built-in `id`, built on first request.
    pub fn get(&self, id: &str) -> Result<Arc<Entry>> {
        let id = strip_scheme(id);
        if let Some(entry) = self.entries.get(id) {
            return Ok(entry.clone());
        }
        if !self.is_builtin(id) {
            return Err(EsmError::module_not_found(id));
        }

        self.entries
            .entry(id.to_string())
            .or_try_insert_with(|| self.build(id))
            .map(|entry| entry.clone())
    }

    fn build(&self, id: &str) -> Result<Arc<Entry>> {
        let host_exports = self
            .host
            .require(id)
            .map(unwrap_proxy)
            .ok_or_else(|| EsmError::module_not_found(id))?;

        let exported = match correction_for(id) {
            Some(correct) => correct(host_exports)?,
            None => host_exports,
        };

        let module = Arc::new(Module::new(id, ModuleKind::Builtin));
        let entry = self.registry.get(&module);
        module.set_exports(exported.clone());
        module.set_loaded(true);

        for name in exported.own_names() {
            let source = exported.clone();
            let key = name.clone();
            let getter: Getter = Arc::new(move || Some(source.get(&key).unwrap_or_default()));
            entry.declare_export(&name, getter);
        }

        let proxy = ExportsProxy::new(&entry, exported.clone());
        let default = Value::Proxy(proxy.clone());
        entry.declare_export("default", Arc::new(move || Some(default.clone())));
        module.set_exports(Value::Proxy(proxy.clone()));

        if let Value::Function(function) = &exported {
            if let Some(prototype) = function.prototype() {
                let points_back = matches!(
                    prototype.get("constructor"),
                    Some(Value::Function(constructor)) if Arc::ptr_eq(&constructor, function)
                );
                if points_back {
                    prototype.set("constructor", Value::Proxy(proxy));
                }
            }
        }

        entry.set_builtin(true);
        entry.set_id(id);
        entry.loaded();
        debug!(id, exports = exported.own_names().len(), "wrapped builtin");
        Ok(entry)
    }
}

fn strip_scheme(id: &str) -> &str {
    id.strip_prefix("node:").unwrap_or(id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::module_system::EntryState;

    fn bridge() -> BuiltinEntries {
        BuiltinEntries::new(Arc::new(NativeModules::new()), Arc::new(EntryRegistry::new()))
    }

    #[test]
    fn test_entry_is_cached() {
        let bridge = bridge();
        let first = bridge.get("path").unwrap();
        let second = bridge.get("node:path").unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert!(first.is_builtin());
        assert_eq!(first.id(), "path");
        assert_eq!(first.state(), EntryState::Loaded);
    }

    #[test]
    fn test_unknown_builtin() {
        let error = bridge().get("fs").unwrap_err();
        assert_eq!(error.kind(), ErrorKind::ModuleNotFound);
        assert_eq!(error.code(), Some("MODULE_NOT_FOUND"));
    }

    #[test]
    fn test_exports_become_the_proxy() {
        let bridge = bridge();
        let entry = bridge.get("path").unwrap();
        let exports = entry.module().exports();
        assert!(matches!(exports, Value::Proxy(_)));

        let namespace = entry.namespace().unwrap();
        assert!(namespace.has("join"));
        assert_eq!(namespace.get("default").unwrap(), Some(exports));
    }

    #[test]
    fn test_constructor_back_reference_points_at_proxy() {
        let bridge = bridge();
        let entry = bridge.get("events").unwrap();
        let exports = entry.module().exports();
        let constructor = exports.get("prototype").unwrap().get("constructor").unwrap();
        assert_eq!(constructor, exports);
    }
}

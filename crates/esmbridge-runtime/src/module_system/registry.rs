// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Entry registry

use std::sync::Arc;

use dashmap::DashMap;
use parking_lot::Mutex;
use tracing::debug;

use super::entry::{Entry, EntryState};
use super::module::{ModuleKey, ModuleRef};
use crate::value::Value;

/// One entry per module, for the life of the registry.
pub struct EntryRegistry {
    entries: DashMap<ModuleKey, Arc<Entry>>,
    initializing: Mutex<Vec<Arc<Entry>>>,
}

impl EntryRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self {
            entries: DashMap::new(),
            initializing: Mutex::new(Vec::new()),
        }
    }

    /// The entry for `module`, created on first request.
    pub fn get(&self, module: &ModuleRef) -> Arc<Entry> {
        self.entries
            .entry(module.key())
            .or_insert_with(|| {
                debug!(id = module.id(), kind = ?module.kind(), "created entry");
                Entry::new(module.clone())
            })
            .clone()
    }

    /// The entry for `module`, if one exists.
    pub fn find(&self, module: &ModuleRef) -> Option<Arc<Entry>> {
        self.entries.get(&module.key()).map(|entry| entry.clone())
    }

    /// The entry behind a namespace or exports proxy made by this registry's
    /// entries.
    pub fn entry_of(&self, value: &Value) -> Option<Arc<Entry>> {
        let entry = match value {
            Value::Namespace(namespace) => namespace.entry(),
            Value::Proxy(proxy) => proxy.entry(),
            _ => None,
        }?;
        self.entries.contains_key(&entry.key()).then_some(entry)
    }

    /// Starts linking `entry`.
    ///
    /// Returns false if the entry is already being initialized; every entry
    /// from it to the most recent one is then on a cycle and is marked
    /// circular.
    pub fn begin_linking(&self, entry: &Arc<Entry>) -> bool {
        let mut initializing = self.initializing.lock();
        if let Some(start) = initializing.iter().position(|e| Arc::ptr_eq(e, entry)) {
            for member in &initializing[start..] {
                member.set_circular();
            }
            debug!(id = %entry.id(), length = initializing.len() - start, "import cycle");
            return false;
        }

        entry.set_state(EntryState::Linking);
        initializing.push(entry.clone());
        true
    }

    /// Finishes linking `entry` and marks it loaded.
    pub fn finish_linking(&self, entry: &Arc<Entry>) {
        self.initializing.lock().retain(|e| !Arc::ptr_eq(e, entry));
        entry.loaded();
    }

    /// Abandons linking `entry` after a failure. The entry leaves the stack
    /// without being marked loaded and can be linked again.
    pub fn abort_linking(&self, entry: &Arc<Entry>) {
        self.initializing.lock().retain(|e| !Arc::ptr_eq(e, entry));
        entry.set_state(EntryState::Unlinked);
    }

    /// True while `entry` is being initialized
    pub fn is_initializing(&self, entry: &Arc<Entry>) -> bool {
        self.initializing.lock().iter().any(|e| Arc::ptr_eq(e, entry))
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if the registry is empty
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for EntryRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::module_system::module::{Module, ModuleKind};

    fn module(id: &str) -> ModuleRef {
        Arc::new(Module::new(id, ModuleKind::EsModule))
    }

    #[test]
    fn test_get_is_idempotent() {
        let registry = EntryRegistry::new();
        let m = module("m");
        let first = registry.get(&m);
        let second = registry.get(&m);
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_identity_is_not_the_id() {
        let registry = EntryRegistry::new();
        let a = registry.get(&module("same"));
        let b = registry.get(&module("same"));
        assert!(!Arc::ptr_eq(&a, &b));
    }

    #[test]
    fn test_find_does_not_create() {
        let registry = EntryRegistry::new();
        assert!(registry.find(&module("m")).is_none());
        assert!(registry.is_empty());
    }

    #[test]
    fn test_cycle_marks_members() {
        let registry = EntryRegistry::new();
        let root = registry.get(&module("root"));
        let a = registry.get(&module("a"));
        let b = registry.get(&module("b"));

        assert!(registry.begin_linking(&root));
        assert!(registry.begin_linking(&a));
        assert!(registry.begin_linking(&b));
        assert!(!registry.begin_linking(&a));

        assert!(!root.is_circular());
        assert!(a.is_circular());
        assert!(b.is_circular());
        assert_eq!(a.state(), EntryState::Linking);

        registry.finish_linking(&b);
        assert_eq!(b.state(), EntryState::Loaded);
        assert!(!registry.is_initializing(&b));
        assert!(registry.is_initializing(&a));
    }

    #[test]
    fn test_abort_linking_allows_relinking() {
        let registry = EntryRegistry::new();
        let a = registry.get(&module("a"));

        assert!(registry.begin_linking(&a));
        registry.abort_linking(&a);
        assert!(!registry.is_initializing(&a));
        assert_eq!(a.state(), EntryState::Unlinked);

        assert!(registry.begin_linking(&a));
        assert!(!a.is_circular());
    }

    #[test]
    fn test_entry_of_namespace() {
        let registry = EntryRegistry::new();
        let entry = registry.get(&module("m"));
        let namespace = entry.namespace().unwrap();

        let found = registry.entry_of(&Value::Namespace(namespace)).unwrap();
        assert!(Arc::ptr_eq(&found, &entry));
        assert!(registry.entry_of(&Value::Null).is_none());
    }
}

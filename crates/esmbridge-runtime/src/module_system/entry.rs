// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Per-module export records
//!
//! An [`Entry`] holds the export table of one module. Exports are references
//! to bindings, never copies: a local export names a getter in the owning
//! entry, an indirect export names an export of another entry, and star
//! exports are consulted for names no explicit export provides.
//!
//! Names can be declared before their getters exist. That is what lets a
//! module in a cycle hand out its namespace before its body has run; reads
//! of such names fail with a use-before-initialization error until the
//! getter is installed.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use indexmap::IndexMap;
use once_cell::sync::OnceCell;
use parking_lot::RwLock;
use tracing::{debug, trace, warn};

use super::binding::{BindingName, Getter, LiveBinding, ResolvedBinding};
use super::module::{ModuleKey, ModuleKind, ModuleRef};
use super::namespace::Namespace;
use crate::error::{EsmError, Result};
use crate::value::Value;

/// Link state of an entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntryState {
    /// Created, nothing declared yet
    Unlinked,
    /// Declarations are being hoisted or the body is running
    Linking,
    /// Evaluation finished
    Loaded,
}

/// Outcome of resolving an export name.
#[derive(Debug, Clone, PartialEq)]
pub enum Resolution {
    /// The name resolves to exactly one binding
    Found(ResolvedBinding),
    /// Star exports supply different bindings for the name
    Ambiguous,
    /// No export supplies the name
    NotFound,
}

#[derive(Clone)]
enum ExportSlot {
    Local(String),
    Indirect { source: Arc<Entry>, import_name: String },
    Namespace(Arc<Entry>),
}

/// Export record for one module.
pub struct Entry {
    module: ModuleRef,
    id: RwLock<String>,
    state: RwLock<EntryState>,
    builtin: AtomicBool,
    circular: AtomicBool,
    exports: RwLock<IndexMap<String, ExportSlot>>,
    locals: RwLock<HashMap<String, Option<Getter>>>,
    stars: RwLock<Vec<Arc<Entry>>>,
    namespace: OnceCell<Namespace>,
}

impl Entry {
    pub(crate) fn new(module: ModuleRef) -> Arc<Self> {
        Arc::new(Self {
            id: RwLock::new(module.id().to_string()),
            module,
            state: RwLock::new(EntryState::Unlinked),
            builtin: AtomicBool::new(false),
            circular: AtomicBool::new(false),
            exports: RwLock::new(IndexMap::new()),
            locals: RwLock::new(HashMap::new()),
            stars: RwLock::new(Vec::new()),
            namespace: OnceCell::new(),
        })
    }

    /// Identity of the owning module
    pub fn key(&self) -> ModuleKey {
        self.module.key()
    }

    /// The owning module
    pub fn module(&self) -> &ModuleRef {
        &self.module
    }

    /// Module id used in messages
    pub fn id(&self) -> String {
        self.id.read().clone()
    }

    /// Replaces the id.
    pub fn set_id(&self, id: impl Into<String>) {
        *self.id.write() = id.into();
    }

    /// Current link state
    pub fn state(&self) -> EntryState {
        *self.state.read()
    }

    pub(crate) fn set_state(&self, state: EntryState) {
        let previous = std::mem::replace(&mut *self.state.write(), state);
        debug!(id = %self.id(), ?previous, ?state, "entry state");
    }

    /// True for entries made by the built-in bridge
    pub fn is_builtin(&self) -> bool {
        self.builtin.load(Ordering::Acquire)
    }

    /// Marks the entry as made by the built-in bridge.
    pub fn set_builtin(&self, builtin: bool) {
        self.builtin.store(builtin, Ordering::Release);
    }

    /// True once the entry has been found on an import cycle
    pub fn is_circular(&self) -> bool {
        self.circular.load(Ordering::Acquire)
    }

    pub(crate) fn set_circular(&self) {
        self.circular.store(true, Ordering::Release);
    }

    /// True when the owning module is an ES module
    pub fn is_es_module(&self) -> bool {
        self.module.kind() == ModuleKind::EsModule
    }

    /// Marks evaluation finished. Namespaces already handed out keep
    /// working; their reads were live all along.
    pub fn loaded(&self) {
        self.module.set_loaded(true);
        self.set_state(EntryState::Loaded);
    }

    /// Declares `name` as an export of the local binding `local` without a
    /// getter. Reads fail until [`Entry::declare_export_as`] supplies one.
    pub fn hoist_export(&self, name: &str, local: &str) {
        self.exports
            .write()
            .entry(name.to_string())
            .or_insert_with(|| ExportSlot::Local(local.to_string()));
        self.locals.write().entry(local.to_string()).or_insert(None);
        trace!(id = %self.id(), name, local, "hoisted export");
    }

    /// Installs the getter of an export whose local name is the export
    /// name. A second call replaces the getter.
    pub fn declare_export(&self, name: &str, getter: Getter) {
        self.declare_export_as(name, name, getter);
    }

    /// Installs the getter of `local` and exports it as `name`.
    pub fn declare_export_as(&self, name: &str, local: &str, getter: Getter) {
        self.exports
            .write()
            .insert(name.to_string(), ExportSlot::Local(local.to_string()));
        self.locals.write().insert(local.to_string(), Some(getter));
        trace!(id = %self.id(), name, local, "declared export");
    }

    /// Records `export { import_name as name } from source`.
    pub fn add_reexport(&self, name: &str, source: &Arc<Entry>, import_name: &str) {
        self.exports.write().insert(
            name.to_string(),
            ExportSlot::Indirect {
                source: source.clone(),
                import_name: import_name.to_string(),
            },
        );
    }

    /// Records `export * from source`.
    pub fn add_star_export(&self, source: &Arc<Entry>) {
        let mut stars = self.stars.write();
        if !stars.iter().any(|star| Arc::ptr_eq(star, source)) {
            stars.push(source.clone());
        }
    }

    /// Records `export * as name from source`.
    pub fn add_namespace_reexport(&self, name: &str, source: &Arc<Entry>) {
        self.exports
            .write()
            .insert(name.to_string(), ExportSlot::Namespace(source.clone()));
    }

    /// True if the entry's own table names `name`. Star exports are not
    /// consulted.
    pub fn has_export(&self, name: &str) -> bool {
        self.exports.read().contains_key(name)
    }

    pub(crate) fn local_getter(&self, local: &str) -> Option<Getter> {
        self.locals.read().get(local).cloned().flatten()
    }

    /// Resolves `name` through local, indirect and star exports.
    pub fn resolve_export(self: &Arc<Self>, name: &str) -> Resolution {
        self.resolve_in(name, &mut Vec::new())
    }

    fn resolve_in(self: &Arc<Self>, name: &str, resolve_set: &mut Vec<(ModuleKey, String)>) -> Resolution {
        let visit = (self.key(), name.to_string());
        if resolve_set.contains(&visit) {
            // Circular re-export
            return Resolution::NotFound;
        }
        resolve_set.push(visit);

        let slot = self.exports.read().get(name).cloned();
        match slot {
            Some(ExportSlot::Local(local)) => {
                return Resolution::Found(ResolvedBinding::new(self.clone(), BindingName::Local(local)));
            }
            Some(ExportSlot::Indirect { source, import_name }) => {
                return source.resolve_in(&import_name, resolve_set);
            }
            Some(ExportSlot::Namespace(source)) => {
                return Resolution::Found(ResolvedBinding::new(source, BindingName::Namespace));
            }
            None => {}
        }

        if name == "default" {
            return Resolution::NotFound;
        }

        let stars = self.stars.read().clone();
        let mut found: Option<ResolvedBinding> = None;
        for star in &stars {
            match star.resolve_in(name, resolve_set) {
                Resolution::Ambiguous => return Resolution::Ambiguous,
                Resolution::NotFound => {}
                Resolution::Found(binding) => match &found {
                    Some(existing) if *existing != binding => return Resolution::Ambiguous,
                    Some(_) => {}
                    None => found = Some(binding),
                },
            }
        }

        found.map_or(Resolution::NotFound, Resolution::Found)
    }

    /// Every name the module exports: its own names in declaration order,
    /// then names contributed by star exports in first-seen order.
    pub fn exported_names(&self) -> Vec<String> {
        let mut names = Vec::new();
        self.collect_names(&mut names, &mut Vec::new());
        names
    }

    fn collect_names(&self, names: &mut Vec<String>, visited: &mut Vec<ModuleKey>) {
        if visited.contains(&self.key()) {
            return;
        }
        visited.push(self.key());

        let own: Vec<String> = self.exports.read().keys().cloned().collect();
        let top_level = visited.len() == 1;
        for name in own {
            if (top_level || name != "default") && !names.contains(&name) {
                names.push(name);
            }
        }

        let stars = self.stars.read().clone();
        for star in stars {
            star.collect_names(names, visited);
        }
    }

    /// Binds a named import of `name`.
    pub fn import_binding(self: &Arc<Self>, name: &str) -> Result<LiveBinding> {
        match self.resolve_export(name) {
            Resolution::Found(binding) => Ok(LiveBinding::new(name, binding)),
            Resolution::Ambiguous => Err(EsmError::export_star_conflict(&self.id(), name)),
            Resolution::NotFound => Err(EsmError::export_missing(&self.id(), name)),
        }
    }

    /// Reads the current value of export `name`; `None` if nothing exports
    /// it.
    pub fn read_export(self: &Arc<Self>, name: &str) -> Result<Option<Value>> {
        match self.resolve_export(name) {
            Resolution::Found(binding) => binding.read(name).map(Some),
            Resolution::Ambiguous => Err(EsmError::export_star_conflict(&self.id(), name)),
            Resolution::NotFound => Ok(None),
        }
    }

    /// The namespace object, built on first request.
    ///
    /// Fails when star exports conflict on any name; a failed build is
    /// retried on the next request. The namespace only fixes identity: its
    /// names follow the export table.
    pub fn namespace(self: &Arc<Self>) -> Result<Namespace> {
        self.namespace
            .get_or_try_init(|| {
                let names = self.exported_names();
                for name in &names {
                    if self.resolve_export(name) == Resolution::Ambiguous {
                        warn!(id = %self.id(), name, "conflicting star exports");
                        return Err(EsmError::export_star_conflict(&self.id(), name));
                    }
                }
                debug!(id = %self.id(), exports = names.len(), "built namespace");
                Ok(Namespace::new(self))
            })
            .cloned()
    }
}

impl fmt::Debug for Entry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Entry")
            .field("id", &self.id())
            .field("state", &self.state())
            .field("builtin", &self.is_builtin())
            .field("circular", &self.is_circular())
            .field("exports", &self.exports.read().keys().collect::<Vec<_>>())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::module_system::binding::LiveCell;
    use crate::module_system::module::Module;

    fn entry(id: &str) -> Arc<Entry> {
        Entry::new(Arc::new(Module::new(id, ModuleKind::EsModule)))
    }

    #[test]
    fn test_local_export_reads_live() {
        let a = entry("a");
        let cell = LiveCell::initialized(Value::Number(1.0));
        a.declare_export("x", cell.getter());

        let x = a.import_binding("x").unwrap();
        assert_eq!(x.get().unwrap(), Value::Number(1.0));
        cell.set(Value::Number(5.0));
        assert_eq!(x.get().unwrap(), Value::Number(5.0));
    }

    #[test]
    fn test_indirect_export_resolves_to_source() {
        let a = entry("a");
        let b = entry("b");
        b.declare_export("y", LiveCell::initialized(Value::Null).getter());
        a.add_reexport("z", &b, "y");

        let Resolution::Found(binding) = a.resolve_export("z") else {
            panic!("expected z to resolve");
        };
        assert_eq!(binding.owner().key(), b.key());
        assert_eq!(binding.name(), &BindingName::Local("y".into()));
    }

    #[test]
    fn test_default_is_not_star_exported() {
        let a = entry("a");
        let b = entry("b");
        b.declare_export("default", LiveCell::initialized(Value::Null).getter());
        b.declare_export("named", LiveCell::initialized(Value::Null).getter());
        a.add_star_export(&b);

        assert_eq!(a.resolve_export("default"), Resolution::NotFound);
        assert_eq!(a.exported_names(), vec!["named"]);
    }

    #[test]
    fn test_exported_names_order() {
        let a = entry("a");
        let b = entry("b");
        b.hoist_export("late", "late");
        b.hoist_export("first", "first");
        a.hoist_export("first", "first");
        a.hoist_export("own", "own");
        a.add_star_export(&b);

        assert_eq!(a.exported_names(), vec!["first", "own", "late"]);
    }

    #[test]
    fn test_self_star_export_terminates() {
        let a = entry("a");
        a.add_star_export(&a);
        assert_eq!(a.resolve_export("missing"), Resolution::NotFound);
        assert!(a.exported_names().is_empty());
    }

    #[test]
    fn test_redeclare_replaces_getter() {
        let a = entry("a");
        a.declare_export("x", LiveCell::initialized(Value::Number(1.0)).getter());
        a.declare_export("x", LiveCell::initialized(Value::Number(2.0)).getter());
        assert_eq!(a.read_export("x").unwrap(), Some(Value::Number(2.0)));
        assert_eq!(a.exported_names(), vec!["x"]);
    }

    #[test]
    fn test_namespace_sees_later_exports() {
        let a = entry("a");
        let namespace = a.namespace().unwrap();
        assert!(namespace.keys().is_empty());

        a.declare_export("late", LiveCell::initialized(Value::Number(7.0)).getter());
        assert_eq!(namespace.keys(), vec!["late"]);
        assert!(namespace.has("late"));
        assert_eq!(namespace.get("late").unwrap(), Some(Value::Number(7.0)));
        assert!(namespace.ptr_eq(&a.namespace().unwrap()));
    }

    #[test]
    fn test_missing_import() {
        let a = entry("/srv/a.mjs");
        let error = a.import_binding("nope").unwrap_err();
        assert_eq!(error.code(), None);
        assert!(error.message().contains("does not provide an export named 'nope'"));
    }
}

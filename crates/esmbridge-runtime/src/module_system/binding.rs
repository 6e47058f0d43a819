// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Live bindings

use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;

use super::entry::Entry;
use crate::error::{EsmError, Result};
use crate::value::Value;

/// Reads a binding's current value. `None` means the binding has not been
/// initialized yet.
pub type Getter = Arc<dyn Fn() -> Option<Value> + Send + Sync>;

/// A shareable storage slot for a module-level binding.
///
/// Clones share the slot. The slot starts uninitialized.
#[derive(Clone, Default)]
pub struct LiveCell {
    slot: Arc<RwLock<Option<Value>>>,
}

impl LiveCell {
    /// Creates an uninitialized cell.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a cell holding `value`.
    pub fn initialized(value: Value) -> Self {
        let cell = Self::new();
        cell.set(value);
        cell
    }

    /// Stores a new value.
    pub fn set(&self, value: Value) {
        *self.slot.write() = Some(value);
    }

    /// Current value, `None` before the first `set`.
    pub fn get(&self) -> Option<Value> {
        self.slot.read().clone()
    }

    /// A getter over this cell.
    pub fn getter(&self) -> Getter {
        let slot = self.slot.clone();
        Arc::new(move || slot.read().clone())
    }
}

impl fmt::Debug for LiveCell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("LiveCell").field(&self.get()).finish()
    }
}

/// What a resolved export ultimately names in its owning module.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BindingName {
    /// A local binding
    Local(String),
    /// The owning module's namespace object
    Namespace,
}

/// The binding an export name resolves to.
///
/// Two resolutions are the same binding when they have the same owner and
/// name, however many re-exports led to them.
#[derive(Clone)]
pub struct ResolvedBinding {
    owner: Arc<Entry>,
    name: BindingName,
}

impl ResolvedBinding {
    pub(crate) fn new(owner: Arc<Entry>, name: BindingName) -> Self {
        Self { owner, name }
    }

    /// The entry that owns the binding
    pub fn owner(&self) -> &Arc<Entry> {
        &self.owner
    }

    /// The binding within its owner
    pub fn name(&self) -> &BindingName {
        &self.name
    }

    /// Reads the current value. `export_name` names the binding in the
    /// error raised while it is uninitialized.
    pub fn read(&self, export_name: &str) -> Result<Value> {
        match &self.name {
            BindingName::Local(local) => self
                .owner
                .local_getter(local)
                .and_then(|getter| getter())
                .ok_or_else(|| EsmError::use_before_init(export_name)),
            BindingName::Namespace => self.owner.namespace().map(Value::Namespace),
        }
    }
}

impl PartialEq for ResolvedBinding {
    fn eq(&self, other: &Self) -> bool {
        self.owner.key() == other.owner.key() && self.name == other.name
    }
}

impl fmt::Debug for ResolvedBinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResolvedBinding")
            .field("owner", &self.owner.id())
            .field("name", &self.name)
            .finish()
    }
}

/// An imported binding. Every `get` re-reads the exporting module's
/// current value.
#[derive(Debug, Clone)]
pub struct LiveBinding {
    name: String,
    binding: ResolvedBinding,
}

impl LiveBinding {
    pub(crate) fn new(name: &str, binding: ResolvedBinding) -> Self {
        Self {
            name: name.to_string(),
            binding,
        }
    }

    /// The imported export name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Where the import resolved to
    pub fn binding(&self) -> &ResolvedBinding {
        &self.binding
    }

    /// Reads the current value.
    pub fn get(&self) -> Result<Value> {
        self.binding.read(&self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cell_getter_is_live() {
        let cell = LiveCell::new();
        let getter = cell.getter();
        assert_eq!(getter(), None);

        cell.set(Value::Number(1.0));
        assert_eq!(getter(), Some(Value::Number(1.0)));

        let shared = cell.clone();
        shared.set(Value::Number(2.0));
        assert_eq!(getter(), Some(Value::Number(2.0)));
    }

    #[test]
    fn test_initialized_cell() {
        let cell = LiveCell::initialized(Value::from("x"));
        assert_eq!(cell.get(), Some(Value::from("x")));
    }
}

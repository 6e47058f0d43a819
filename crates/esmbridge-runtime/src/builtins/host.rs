// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Host module providers

use dashmap::DashMap;

use crate::modules::{NATIVE_MODULE_IDS, create_native_module};
use crate::value::Value;

/// Source of the host's own module objects.
pub trait HostModules: Send + Sync {
    /// Ids of every module this host can hand out
    fn builtin_ids(&self) -> Vec<String>;

    /// The exports of module `id`, as the host's `require` returns them.
    /// Repeated calls return the same object.
    fn require(&self, id: &str) -> Option<Value>;
}

/// The native modules compiled into this crate.
#[derive(Default)]
pub struct NativeModules {
    cache: DashMap<String, Value>,
}

impl NativeModules {
    /// Creates an empty host; modules are built on first require.
    pub fn new() -> Self {
        Self::default()
    }
}

impl HostModules for NativeModules {
    fn builtin_ids(&self) -> Vec<String> {
        NATIVE_MODULE_IDS.iter().map(|id| id.to_string()).collect()
    }

    fn require(&self, id: &str) -> Option<Value> {
        if let Some(exports) = self.cache.get(id) {
            return Some(exports.clone());
        }
        let exports = create_native_module(id)?;
        Some(self.cache.entry(id.to_string()).or_insert(exports).clone())
    }
}

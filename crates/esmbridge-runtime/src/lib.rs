// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! # esmbridge-runtime
//!
//! ES module semantics layered over a CommonJS-style host.
//!
//! ## Overview
//!
//! This crate provides:
//! - Per-module entries holding live export bindings
//! - Namespace objects whose reads always see the current binding value
//! - `export *` resolution with conflict detection
//! - A bridge that wraps the host's built-in modules as entries
//! - Package options (`mode`, `cjs`, `await`) and the error taxonomy
//!
//! ## Quick Start
//!
//! ```rust
//! use std::sync::Arc;
//! use esmbridge_runtime::{LiveCell, Loader, Module, ModuleKind, Options};
//!
//! let loader = Loader::new(Options::default());
//! let module = Arc::new(Module::new("/app/counter.mjs", ModuleKind::EsModule));
//! let entry = loader.link(&module, "export let count = 0;", |_| None)?;
//!
//! let count = LiveCell::initialized(0.0.into());
//! entry.declare_export("count", count.getter());
//! loader.registry().finish_linking(&entry);
//!
//! let namespace = loader.import(&module)?;
//! count.set(1.0.into());
//! assert_eq!(namespace.get("count")?, Some(1.0.into()));
//! # Ok::<(), esmbridge_runtime::EsmError>(())
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod builtins;
pub mod error;
pub mod module_system;
pub mod modules;
pub mod options;
pub mod value;

pub use builtins::{BuiltinEntries, HostModules, NativeModules};
pub use error::{EsmError, ErrorClass, ErrorKind, Result, module_url};
pub use module_system::{
    Entry, EntryRegistry, EntryState, ExportsProxy, LiveBinding, LiveCell, Loader, Module,
    ModuleKind, ModuleRef, Namespace,
};
pub use options::{Mode, Options};
pub use value::{Function, Object, Properties, PropertyKey, Value};

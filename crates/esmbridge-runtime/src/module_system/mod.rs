// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! ES module emulation over host modules
//!
//! ## Entries
//! - One [`Entry`] per [`Module`], keyed by identity
//! - Export tables of live binding references
//! - Link states and import cycle tracking
//!
//! ## Namespaces
//! - Created lazily, one per entry
//! - Reads always go through the current getter
//! - Enumeration in export declaration order

mod binding;
mod entry;
mod loader;
mod module;
mod namespace;
mod registry;

pub use binding::{BindingName, Getter, LiveBinding, LiveCell, ResolvedBinding};
pub use entry::{Entry, EntryState, Resolution};
pub use loader::{DEFAULT_LOCAL, Loader, check_protocol};
pub use module::{Module, ModuleKey, ModuleKind, ModuleRef, module_constructor, wrap};
pub use namespace::{ExportsProxy, Namespace};
pub use registry::EntryRegistry;

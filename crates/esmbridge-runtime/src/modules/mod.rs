// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Native host modules
//!
//! These are the objects the host's own `require` hands out. They know
//! nothing about ES modules; the built-in bridge adapts them.

pub mod assert;
pub mod events;
pub mod module;
pub mod path;
pub mod util;
pub mod vm;

use crate::error::{EsmError, Result};
use crate::value::Value;

/// Ids of the native modules, sorted
pub const NATIVE_MODULE_IDS: &[&str] = &["assert", "events", "module", "path", "util", "vm"];

/// Create the exports of native module `id`
pub fn create_native_module(id: &str) -> Option<Value> {
    let exports = match id {
        "assert" => assert::create_module(),
        "events" => events::create_module(),
        "module" => module::create_module(),
        "path" => path::create_module(),
        "util" => util::create_module(),
        "vm" => vm::create_module(),
        _ => return None,
    };
    Some(exports)
}

/// Reads argument `index` as a string.
pub(crate) fn string_arg(args: &[Value], index: usize, name: &str) -> Result<String> {
    match args.get(index) {
        Some(Value::String(s)) => Ok(s.clone()),
        other => Err(EsmError::invalid_arg_type(
            name,
            "of type string",
            Some(other.unwrap_or(&Value::Undefined)),
        )),
    }
}

/// Reads an optional string argument; `undefined` counts as absent.
pub(crate) fn optional_string_arg(args: &[Value], index: usize, name: &str) -> Result<Option<String>> {
    match args.get(index) {
        None | Some(Value::Undefined) => Ok(None),
        Some(_) => string_arg(args, index, name).map(Some),
    }
}

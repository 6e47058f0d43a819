// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Shape corrections applied to host modules before they are wrapped
//!
//! Adding a built-in that needs fixing up means adding a row to
//! [`CORRECTIONS`]; the bridge itself stays the same.

use crate::error::Result;
use crate::module_system::module_constructor;
use crate::modules::util::types;
use crate::value::{Function, Object, ObjectRef, Properties, PropertyKey, Value, INSPECT_CUSTOM};

/// Rewrites a host module's exports into the shape the bridge wraps.
pub type Correction = fn(Value) -> Result<Value>;

/// Module id to correction
pub static CORRECTIONS: &[(&str, Correction)] = &[
    ("module", correct_module),
    ("util", correct_util),
    ("vm", correct_vm),
];

/// The correction registered for `id`, if any.
pub fn correction_for(id: &str) -> Option<Correction> {
    CORRECTIONS
        .iter()
        .find(|(name, _)| *name == id)
        .map(|(_, correction)| *correction)
}

/// The loader's `Module` constructor stands in for the host's.
fn correct_module(_exports: Value) -> Result<Value> {
    Ok(Value::Function(module_constructor()))
}

fn correct_util(exports: Value) -> Result<Value> {
    let corrected = copy_except(&exports, &["inspect", "types"])?;

    let inspect = exports.get("inspect")?;
    if let Value::Function(original) = &inspect {
        let delegate = original.clone();
        let wrapped = Function::new(original.name(), move |this, args| {
            let mut args = args.to_vec();
            if let Some(first) = args.first_mut() {
                let unwrapped = match &*first {
                    Value::Namespace(namespace) => Value::Object(namespace.to_object()?),
                    Value::Proxy(proxy) => proxy.target().clone(),
                    other => other.clone(),
                };
                *first = unwrapped;
            }
            delegate.call(this, &args)
        });
        for (key, value) in original.entries() {
            wrapped.set(key, value);
        }
        corrected.set("inspect", Value::Function(wrapped));
    } else if !inspect.is_undefined() {
        corrected.set("inspect", inspect);
    }

    let host_types = exports.get("types")?;
    if !host_types.is_undefined() {
        let types_copy = copy_except(&host_types, &[])?;
        types_copy.set(
            "isProxy",
            Value::function("isProxy", |_, args| {
                let value = args.first().cloned().unwrap_or_default();
                Ok(Value::Boolean(!value.is_own_proxy() && types::is_proxy(&value)))
            }),
        );
        corrected.set("types", Value::Object(types_copy));
    }

    let marker = PropertyKey::Symbol(INSPECT_CUSTOM);
    if !corrected.has(&marker) {
        corrected.set(marker, Value::Boolean(true));
    }

    Ok(Value::Object(corrected))
}

/// `vm.Module` would be mistaken for the loader's own module records.
fn correct_vm(exports: Value) -> Result<Value> {
    Ok(Value::Object(copy_except(&exports, &["Module"])?))
}

fn copy_except(source: &Value, skip: &[&str]) -> Result<ObjectRef> {
    let copy = Object::new();
    for key in source.own_keys() {
        if key.as_str().is_some_and(|name| skip.contains(&name)) {
            continue;
        }
        let value = source.get_key(&key)?;
        copy.set(key, value);
    }
    Ok(copy)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modules::{util, vm};

    #[test]
    fn test_lookup() {
        assert!(correction_for("util").is_some());
        assert!(correction_for("vm").is_some());
        assert!(correction_for("module").is_some());
        assert!(correction_for("path").is_none());
    }

    #[test]
    fn test_vm_hides_module() {
        let corrected = correct_vm(vm::create_module()).unwrap();
        let names = corrected.own_names();
        assert!(!names.contains(&"Module".to_string()));
        assert!(names.contains(&"Script".to_string()));
    }

    #[test]
    fn test_util_gains_custom_inspect_marker() {
        let corrected = correct_util(util::create_module()).unwrap();
        let marker = corrected.get_key(&PropertyKey::Symbol(INSPECT_CUSTOM)).unwrap();
        assert_eq!(marker, Value::Boolean(true));
        assert!(corrected.get("format").unwrap().as_function().is_some());
    }

    #[test]
    fn test_module_is_replaced() {
        let corrected = correct_module(Value::Undefined).unwrap();
        assert_eq!(corrected, Value::Function(module_constructor()));
    }
}

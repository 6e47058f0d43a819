// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Native `module` module
//!
//! The host's own `Module` constructor. The bridge swaps it for the
//! loader's constructor so both views agree on one identity.

use crate::modules::{NATIVE_MODULE_IDS, string_arg};
use crate::value::{Function, Object, Properties, Value};

/// Create the module module exports
pub fn create_module() -> Value {
    let module = Function::constructor("Module", |_, args| {
        let instance = Object::with_class("Module");
        instance.set("id", Value::String(string_arg(args, 0, "id")?));
        instance.set("exports", Value::Object(Object::new()));
        Ok(Value::Object(instance))
    });

    let ids = NATIVE_MODULE_IDS.iter().map(|id| Value::string(*id));
    module.set("builtinModules", Value::Object(Object::array(ids)));
    module.set(
        "isBuiltin",
        Value::function("isBuiltin", |_, args| {
            let id = string_arg(args, 0, "moduleName")?;
            Ok(Value::Boolean(is_builtin(&id)))
        }),
    );

    Value::Function(module)
}

/// True for native module ids, with or without the `node:` scheme.
pub fn is_builtin(id: &str) -> bool {
    let id = id.strip_prefix("node:").unwrap_or(id);
    NATIVE_MODULE_IDS.contains(&id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_builtin() {
        assert!(is_builtin("path"));
        assert!(is_builtin("node:events"));
        assert!(!is_builtin("fs"));
        assert!(!is_builtin("./path"));
    }

    #[test]
    fn test_builtin_modules_list() {
        let exports = create_module();
        let list = exports.get("builtinModules").unwrap();
        assert_eq!(list.get("0").unwrap(), Value::from("assert"));
        assert_eq!(list.own_names().len(), NATIVE_MODULE_IDS.len());
    }
}

// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Native `vm` module
//!
//! There is no evaluator behind these, so running code is an error. The
//! constructors and context helpers exist so callers can probe the shape.

use crate::error::{EsmError, Result};
use crate::modules::string_arg;
use crate::value::{Function, Object, Properties, Value};

const CONTEXT_CLASS: &str = "Context";

/// Create the vm module exports
pub fn create_module() -> Value {
    let exports = Object::new();

    let script = Function::constructor("Script", |_, args| {
        let code = string_arg(args, 0, "code")?;
        let instance = Object::with_class("Script");
        instance.set("code", Value::String(code));
        Ok(Value::Object(instance))
    });
    if let Some(proto) = script.prototype() {
        proto.set("runInThisContext", Value::function("runInThisContext", |_, _| not_supported()));
    }
    exports.set("Script", Value::Function(script));

    // Host flavor of a source text module; the bridge hides it.
    let module = Function::constructor("Module", |_, args| {
        let source = string_arg(args, 0, "sourceText")?;
        let instance = Object::with_class("SourceTextModule");
        instance.set("status", Value::string("unlinked"));
        instance.set("source", Value::String(source));
        Ok(Value::Object(instance))
    });
    exports.set("Module", Value::Function(module));

    exports.set(
        "createContext",
        Value::function("createContext", |_, args| {
            let context = Object::with_class(CONTEXT_CLASS);
            match args.first() {
                None | Some(Value::Undefined) => {}
                Some(Value::Object(sandbox)) => {
                    for (key, value) in sandbox.entries() {
                        context.set(key, value);
                    }
                }
                Some(other) => {
                    return Err(EsmError::invalid_arg_type("contextObject", "of type object", Some(other)));
                }
            }
            Ok(Value::Object(context))
        }),
    );
    exports.set(
        "isContext",
        Value::function("isContext", |_, args| {
            Ok(Value::Boolean(matches!(
                args.first(),
                Some(Value::Object(object)) if object.class() == Some(CONTEXT_CLASS)
            )))
        }),
    );
    exports.set(
        "runInThisContext",
        Value::function("runInThisContext", |_, args| {
            string_arg(args, 0, "code")?;
            not_supported()
        }),
    );

    Value::Object(exports)
}

fn not_supported() -> Result<Value> {
    Err(EsmError::host("Error", "Code evaluation is not available in this host"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_context_round_trip() {
        let exports = create_module();
        let sandbox = Value::object([("x", Value::Number(2.0))]);
        let context = exports
            .get("createContext")
            .unwrap()
            .call(&Value::Undefined, &[sandbox.clone()])
            .unwrap();
        assert_eq!(context.get("x").unwrap(), Value::Number(2.0));

        let is_context = exports.get("isContext").unwrap();
        assert_eq!(is_context.call(&Value::Undefined, &[context]).unwrap(), Value::Boolean(true));
        assert_eq!(is_context.call(&Value::Undefined, &[sandbox]).unwrap(), Value::Boolean(false));
    }

    #[test]
    fn test_running_code_fails() {
        let exports = create_module();
        let run = exports.get("runInThisContext").unwrap();
        assert!(run.call(&Value::Undefined, &[Value::from("1 + 1")]).is_err());

        let script = exports
            .get("Script")
            .unwrap()
            .call(&Value::Undefined, &[Value::from("1")])
            .unwrap();
        assert_eq!(script.get("code").unwrap(), Value::from("1"));
    }

    #[test]
    fn test_host_exposes_module() {
        let exports = create_module();
        assert!(exports.own_names().contains(&"Module".to_string()));
    }
}

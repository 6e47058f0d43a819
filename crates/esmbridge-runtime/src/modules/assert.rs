// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Native `assert` module
//!
//! `require("assert")` is itself the `ok` assertion, with the other
//! assertions hung off it as properties.

use crate::error::{EsmError, Result};
use crate::modules::util;
use crate::value::{Function, Object, Properties, Value};

type Check = fn(&Value, &Value, Option<&str>) -> Result<()>;

/// Create the assert module exports
pub fn create_module() -> Value {
    let exports = Function::new("ok", |_, args| {
        let value = args.first().cloned().unwrap_or_default();
        assert(&value, message_arg(args, 1).as_deref()).map(|()| Value::Undefined)
    });

    exports.set(
        "ok",
        Value::function("ok", |_, args| {
            let value = args.first().cloned().unwrap_or_default();
            ok(&value, message_arg(args, 1).as_deref()).map(|()| Value::Undefined)
        }),
    );

    let checks: [(&str, Check); 6] = [
        ("equal", equal),
        ("notEqual", not_equal),
        ("strictEqual", strict_equal),
        ("notStrictEqual", not_strict_equal),
        ("deepStrictEqual", deep_strict_equal),
        ("notDeepStrictEqual", not_deep_strict_equal),
    ];
    for (name, check) in checks {
        exports.set(
            name,
            Value::function(name, move |_, args| {
                let actual = args.first().cloned().unwrap_or_default();
                let expected = args.get(1).cloned().unwrap_or_default();
                check(&actual, &expected, message_arg(args, 2).as_deref()).map(|()| Value::Undefined)
            }),
        );
    }

    exports.set(
        "fail",
        Value::function("fail", |_, args| {
            fail(message_arg(args, 0).as_deref()).map(|()| Value::Undefined)
        }),
    );

    let assertion_error = Function::constructor("AssertionError", |_, args| {
        let error = Object::with_class("AssertionError");
        let message = args.first().map(|options| options.get("message")).transpose()?;
        error.set("message", message.unwrap_or_else(|| Value::string("Failed")));
        error.set("code", Value::string("ERR_ASSERTION"));
        Ok(Value::Object(error))
    });
    exports.set("AssertionError", Value::Function(assertion_error));

    Value::Function(exports)
}

fn message_arg(args: &[Value], index: usize) -> Option<String> {
    args.get(index).and_then(|message| message.as_str().map(str::to_string))
}

fn assertion(message: &str) -> EsmError {
    let mut error = EsmError::host("AssertionError", message);
    error.set_code("ERR_ASSERTION");
    error
}

/// assert(value, message?) - assert that value is truthy
pub fn assert(value: &Value, message: Option<&str>) -> Result<()> {
    if !value.is_truthy() {
        Err(assertion(message.unwrap_or("The expression evaluated to a falsy value")))
    } else {
        Ok(())
    }
}

/// assert.ok(value, message?) - same as assert()
pub fn ok(value: &Value, message: Option<&str>) -> Result<()> {
    assert(value, message)
}

/// assert.equal(actual, expected, message?) - loose equality (==)
pub fn equal(actual: &Value, expected: &Value, message: Option<&str>) -> Result<()> {
    if !loose_equal(actual, expected) {
        Err(assertion(message.unwrap_or("Values are not equal")))
    } else {
        Ok(())
    }
}

/// assert.notEqual(actual, expected, message?) - loose inequality (!=)
pub fn not_equal(actual: &Value, expected: &Value, message: Option<&str>) -> Result<()> {
    if loose_equal(actual, expected) {
        Err(assertion(message.unwrap_or("Values are equal")))
    } else {
        Ok(())
    }
}

/// assert.strictEqual(actual, expected, message?) - strict equality (===)
pub fn strict_equal(actual: &Value, expected: &Value, message: Option<&str>) -> Result<()> {
    if actual != expected {
        Err(assertion(message.unwrap_or("Values are not strictly equal")))
    } else {
        Ok(())
    }
}

/// assert.notStrictEqual(actual, expected, message?) - strict inequality (!==)
pub fn not_strict_equal(actual: &Value, expected: &Value, message: Option<&str>) -> Result<()> {
    if actual == expected {
        Err(assertion(message.unwrap_or("Values are strictly equal")))
    } else {
        Ok(())
    }
}

/// assert.deepStrictEqual(actual, expected, message?) - deep strict equality
pub fn deep_strict_equal(actual: &Value, expected: &Value, message: Option<&str>) -> Result<()> {
    if !util::is_deep_strict_equal(actual, expected) {
        Err(assertion(message.unwrap_or("Values are not deeply strictly equal")))
    } else {
        Ok(())
    }
}

/// assert.notDeepStrictEqual(actual, expected, message?)
pub fn not_deep_strict_equal(actual: &Value, expected: &Value, message: Option<&str>) -> Result<()> {
    if util::is_deep_strict_equal(actual, expected) {
        Err(assertion(message.unwrap_or("Values are deeply strictly equal")))
    } else {
        Ok(())
    }
}

/// assert.fail(message?)
pub fn fail(message: Option<&str>) -> Result<()> {
    Err(assertion(message.unwrap_or("Failed")))
}

fn loose_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Undefined | Value::Null, Value::Undefined | Value::Null) => true,
        (Value::Number(n), Value::String(s)) | (Value::String(s), Value::Number(n)) => {
            s.trim().parse::<f64>().is_ok_and(|parsed| parsed == *n)
        }
        (Value::Boolean(b), other) | (other, Value::Boolean(b)) => {
            loose_equal(&Value::Number(f64::from(u8::from(*b))), other)
        }
        _ => a == b,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn test_assert_truthy() {
        assert!(assert(&Value::Boolean(true), None).is_ok());
        assert!(assert(&Value::Number(1.0), None).is_ok());
        assert!(assert(&Value::from("hello"), None).is_ok());

        assert!(assert(&Value::Boolean(false), None).is_err());
        assert!(assert(&Value::Number(0.0), None).is_err());
        assert!(assert(&Value::from(""), None).is_err());
        assert!(assert(&Value::Null, None).is_err());
        assert!(assert(&Value::Undefined, None).is_err());
    }

    #[test]
    fn test_loose_and_strict_equal() {
        assert!(equal(&Value::Number(1.0), &Value::from("1"), None).is_ok());
        assert!(equal(&Value::Null, &Value::Undefined, None).is_ok());
        assert!(equal(&Value::Boolean(true), &Value::Number(1.0), None).is_ok());
        assert!(strict_equal(&Value::Number(1.0), &Value::from("1"), None).is_err());
    }

    #[test]
    fn test_failure_is_an_assertion_error() {
        let error = fail(Some("nope")).unwrap_err();
        assert_eq!(error.kind(), ErrorKind::Host);
        assert_eq!(error.name(), "AssertionError");
        assert_eq!(error.code(), Some("ERR_ASSERTION"));
        assert_eq!(error.to_string(), "AssertionError: nope");
    }

    #[test]
    fn test_module_is_callable() {
        let exports = create_module();
        assert!(exports.call(&Value::Undefined, &[Value::Boolean(true)]).is_ok());
        assert!(exports.call(&Value::Undefined, &[Value::Number(0.0)]).is_err());

        let deep = exports.get("deepStrictEqual").unwrap();
        let a = Value::object([("x", Value::Number(1.0))]);
        let b = Value::object([("x", Value::Number(1.0))]);
        assert!(deep.call(&Value::Undefined, &[a, b]).is_ok());
    }
}

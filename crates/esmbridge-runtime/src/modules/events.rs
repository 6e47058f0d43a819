// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Native `events` module - EventEmitter
//!
//! `require("events")` is the `EventEmitter` constructor itself, and
//! `EventEmitter.EventEmitter` points back at it.

use crate::error::{EsmError, Result};
use crate::modules::string_arg;
use crate::value::{Function, Object, ObjectRef, Properties, Value};

/// Default maximum listeners per event
pub const DEFAULT_MAX_LISTENERS: f64 = 10.0;

const LISTENERS: &str = "_events";

/// Create the events module exports
pub fn create_module() -> Value {
    let emitter = Function::constructor("EventEmitter", |_, _| {
        let instance = Object::with_class("EventEmitter");
        instance.set(LISTENERS, Value::Object(Object::new()));
        Ok(Value::Object(instance))
    });

    emitter.set("defaultMaxListeners", Value::Number(DEFAULT_MAX_LISTENERS));
    emitter.set("EventEmitter", Value::Function(emitter.clone()));

    if let Some(proto) = emitter.prototype() {
        proto.set("on", Value::function("on", |this, args| on(this, args)));
        proto.set("emit", Value::function("emit", |this, args| emit(this, args)));
        proto.set(
            "listenerCount",
            Value::function("listenerCount", |this, args| {
                let event = string_arg(args, 0, "eventName")?;
                Ok(Value::Number(listeners(this, &event)?.len() as f64))
            }),
        );
    }

    Value::Function(emitter)
}

fn table(this: &Value) -> Result<ObjectRef> {
    match this.get(LISTENERS)? {
        Value::Object(table) => Ok(table),
        _ => Err(EsmError::invalid_arg_type("this", "an EventEmitter", Some(this))),
    }
}

fn listeners(this: &Value, event: &str) -> Result<Vec<Value>> {
    Ok(match table(this)?.get(event) {
        Some(Value::Object(list)) => list.entries().into_iter().map(|(_, listener)| listener).collect(),
        _ => Vec::new(),
    })
}

/// emitter.on(eventName, listener)
fn on(this: &Value, args: &[Value]) -> Result<Value> {
    let event = string_arg(args, 0, "eventName")?;
    let listener = match args.get(1) {
        Some(listener @ Value::Function(_)) => listener.clone(),
        other => {
            return Err(EsmError::invalid_arg_type(
                "listener",
                "of type function",
                Some(other.unwrap_or(&Value::Undefined)),
            ));
        }
    };

    let mut current = listeners(this, &event)?;
    current.push(listener);
    table(this)?.set(event, Value::Object(Object::array(current)));
    Ok(this.clone())
}

/// emitter.emit(eventName, ...args)
fn emit(this: &Value, args: &[Value]) -> Result<Value> {
    let event = string_arg(args, 0, "eventName")?;
    let current = listeners(this, &event)?;
    for listener in &current {
        listener.call(this, &args[1..])?;
    }
    Ok(Value::Boolean(!current.is_empty()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_exports_is_its_own_property() {
        let exports = create_module();
        assert_eq!(exports.get("EventEmitter").unwrap(), exports);
        assert_eq!(exports.get("defaultMaxListeners").unwrap(), Value::Number(10.0));
    }

    #[test]
    fn test_on_and_emit() {
        let ctor = create_module();
        let emitter = ctor.call(&Value::Undefined, &[]).unwrap();
        let proto = ctor.get("prototype").unwrap();

        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let listener = Value::function("listener", move |_, args| {
            assert_eq!(args, &[Value::Number(7.0)]);
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(Value::Undefined)
        });

        let on = proto.get("on").unwrap();
        on.call(&emitter, &[Value::from("tick"), listener.clone()]).unwrap();
        on.call(&emitter, &[Value::from("tick"), listener]).unwrap();

        let emit = proto.get("emit").unwrap();
        let fired = emit.call(&emitter, &[Value::from("tick"), Value::Number(7.0)]).unwrap();
        assert_eq!(fired, Value::Boolean(true));
        assert_eq!(calls.load(Ordering::SeqCst), 2);

        let idle = emit.call(&emitter, &[Value::from("idle")]).unwrap();
        assert_eq!(idle, Value::Boolean(false));

        let count = proto.get("listenerCount").unwrap();
        assert_eq!(count.call(&emitter, &[Value::from("tick")]).unwrap(), Value::Number(2.0));
    }

    #[test]
    fn test_listener_must_be_a_function() {
        let ctor = create_module();
        let emitter = ctor.call(&Value::Undefined, &[]).unwrap();
        let on = ctor.get("prototype").unwrap().get("on").unwrap();
        let error = on.call(&emitter, &[Value::from("x"), Value::Null]).unwrap_err();
        assert_eq!(error.code(), Some("ERR_INVALID_ARG_TYPE"));
    }
}

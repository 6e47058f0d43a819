// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Host values
//!
//! Objects and functions are shared by reference, so two values are the
//! same object exactly when their `Arc`s point at the same allocation.

use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;
use parking_lot::RwLock;

use crate::error::{EsmError, Result};
use crate::module_system::{ExportsProxy, Namespace};

/// Description of the symbol `util.inspect` looks up for custom inspection
pub const INSPECT_CUSTOM: &str = "nodejs.util.inspect.custom";

/// Property key: a string or a well-known symbol
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PropertyKey {
    /// String key
    String(String),
    /// Symbol key, identified by its description
    Symbol(&'static str),
}

impl PropertyKey {
    /// The string key, if this is one.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            Self::Symbol(_) => None,
        }
    }
}

impl From<&str> for PropertyKey {
    fn from(key: &str) -> Self {
        Self::String(key.to_string())
    }
}

impl From<String> for PropertyKey {
    fn from(key: String) -> Self {
        Self::String(key)
    }
}

impl fmt::Display for PropertyKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::String(s) => f.write_str(s),
            Self::Symbol(description) => write!(f, "Symbol({})", description),
        }
    }
}

const MAX_SAFE_INTEGER: f64 = 9_007_199_254_740_992.0;

type PropertyTable = RwLock<IndexMap<PropertyKey, Value>>;

/// Ordered own properties, shared by objects and functions.
pub trait Properties {
    /// The backing table.
    fn table(&self) -> &PropertyTable;

    /// Reads a string-keyed property.
    fn get(&self, key: &str) -> Option<Value> {
        self.get_key(&PropertyKey::from(key))
    }

    /// Reads any property.
    fn get_key(&self, key: &PropertyKey) -> Option<Value> {
        self.table().read().get(key).cloned()
    }

    /// Writes a property, keeping its position if it already exists.
    fn set(&self, key: impl Into<PropertyKey>, value: Value) {
        self.table().write().insert(key.into(), value);
    }

    /// True if the property exists.
    fn has(&self, key: &PropertyKey) -> bool {
        self.table().read().contains_key(key)
    }

    /// Removes a property, keeping the order of the rest.
    fn remove(&self, key: &str) -> Option<Value> {
        self.table().write().shift_remove(&PropertyKey::from(key))
    }

    /// All own keys, strings and symbols, in insertion order.
    fn keys(&self) -> Vec<PropertyKey> {
        self.table().read().keys().cloned().collect()
    }

    /// Own string keys in insertion order.
    fn names(&self) -> Vec<String> {
        self.table()
            .read()
            .keys()
            .filter_map(|key| key.as_str().map(str::to_string))
            .collect()
    }

    /// Snapshot of all own properties.
    fn entries(&self) -> Vec<(PropertyKey, Value)> {
        self.table()
            .read()
            .iter()
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect()
    }
}

/// A plain object with an optional class tag.
#[derive(Default)]
pub struct Object {
    class: Option<String>,
    properties: PropertyTable,
}

/// Shared object handle
pub type ObjectRef = Arc<Object>;

impl Object {
    /// Creates an empty plain object.
    pub fn new() -> ObjectRef {
        Arc::new(Self::default())
    }

    /// Creates an empty object tagged with `class`.
    pub fn with_class(class: impl Into<String>) -> ObjectRef {
        Arc::new(Self {
            class: Some(class.into()),
            properties: PropertyTable::default(),
        })
    }

    /// Creates an array-like object from `items`.
    pub fn array(items: impl IntoIterator<Item = Value>) -> ObjectRef {
        let array = Self::with_class("Array");
        for (index, item) in items.into_iter().enumerate() {
            array.set(index.to_string(), item);
        }
        array
    }

    /// The class tag, if any.
    pub fn class(&self) -> Option<&str> {
        self.class.as_deref()
    }

    /// True for objects built by [`Object::array`].
    pub fn is_array(&self) -> bool {
        self.class() == Some("Array")
    }
}

impl Properties for Object {
    fn table(&self) -> &PropertyTable {
        &self.properties
    }
}

impl fmt::Debug for Object {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Object")
            .field("class", &self.class)
            .field("keys", &self.keys())
            .finish()
    }
}

/// Native function body: `(this, arguments)`.
pub type NativeFn = dyn Fn(&Value, &[Value]) -> Result<Value> + Send + Sync;

/// A callable host value.
pub struct Function {
    name: String,
    body: Box<NativeFn>,
    properties: PropertyTable,
    prototype: Option<ObjectRef>,
}

/// Shared function handle
pub type FunctionRef = Arc<Function>;

impl Function {
    /// Creates a function without a prototype.
    pub fn new<F>(name: impl Into<String>, body: F) -> FunctionRef
    where
        F: Fn(&Value, &[Value]) -> Result<Value> + Send + Sync + 'static,
    {
        Arc::new(Self {
            name: name.into(),
            body: Box::new(body),
            properties: PropertyTable::default(),
            prototype: None,
        })
    }

    /// Creates a constructor whose `prototype.constructor` is itself.
    pub fn constructor<F>(name: impl Into<String>, body: F) -> FunctionRef
    where
        F: Fn(&Value, &[Value]) -> Result<Value> + Send + Sync + 'static,
    {
        let prototype = Object::new();
        let function = Arc::new(Self {
            name: name.into(),
            body: Box::new(body),
            properties: PropertyTable::default(),
            prototype: Some(prototype.clone()),
        });
        prototype.set("constructor", Value::Function(function.clone()));
        function
    }

    /// The function name, empty for anonymous functions.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The `prototype` object, for constructors.
    pub fn prototype(&self) -> Option<&ObjectRef> {
        self.prototype.as_ref()
    }

    /// Invokes the function.
    pub fn call(&self, this: &Value, args: &[Value]) -> Result<Value> {
        (self.body)(this, args)
    }
}

impl Properties for Function {
    fn table(&self) -> &PropertyTable {
        &self.properties
    }
}

impl fmt::Debug for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Function")
            .field("name", &self.name)
            .field("constructor", &self.prototype.is_some())
            .finish()
    }
}

/// A host value.
#[derive(Debug, Clone, Default)]
pub enum Value {
    /// `undefined`
    #[default]
    Undefined,
    /// `null`
    Null,
    /// Boolean
    Boolean(bool),
    /// Number
    Number(f64),
    /// String
    String(String),
    /// Object
    Object(ObjectRef),
    /// Function
    Function(FunctionRef),
    /// Module namespace created by the loader
    Namespace(Namespace),
    /// Live exports of a built-in module created by the loader
    Proxy(ExportsProxy),
}

impl Value {
    /// String value
    pub fn string(s: impl Into<String>) -> Self {
        Self::String(s.into())
    }

    /// Plain object with the given string-keyed properties
    pub fn object<'a>(properties: impl IntoIterator<Item = (&'a str, Value)>) -> Self {
        let object = Object::new();
        for (key, value) in properties {
            object.set(key, value);
        }
        Self::Object(object)
    }

    /// Native function value
    pub fn function<F>(name: &str, body: F) -> Self
    where
        F: Fn(&Value, &[Value]) -> Result<Value> + Send + Sync + 'static,
    {
        Self::Function(Function::new(name, body))
    }

    /// The `typeof` string.
    pub fn type_of(&self) -> &'static str {
        match self {
            Self::Undefined => "undefined",
            Self::Boolean(_) => "boolean",
            Self::Number(_) => "number",
            Self::String(_) => "string",
            Self::Function(_) => "function",
            Self::Proxy(proxy) => proxy.target().type_of(),
            Self::Null | Self::Object(_) | Self::Namespace(_) => "object",
        }
    }

    /// True for `undefined`
    pub fn is_undefined(&self) -> bool {
        matches!(self, Self::Undefined)
    }

    /// JavaScript truthiness
    pub fn is_truthy(&self) -> bool {
        match self {
            Self::Undefined | Self::Null => false,
            Self::Boolean(b) => *b,
            Self::Number(n) => *n != 0.0 && !n.is_nan(),
            Self::String(s) => !s.is_empty(),
            _ => true,
        }
    }

    /// True for namespaces and exports proxies the loader created.
    pub fn is_own_proxy(&self) -> bool {
        matches!(self, Self::Namespace(_) | Self::Proxy(_))
    }

    /// The string, if this is one.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    /// The function, if this is one.
    pub fn as_function(&self) -> Option<&FunctionRef> {
        match self {
            Self::Function(f) => Some(f),
            _ => None,
        }
    }

    /// Reads a string-keyed property. Missing properties read as
    /// `undefined`; reads through loader proxies are live and may fail.
    pub fn get(&self, key: &str) -> Result<Value> {
        match self {
            Self::Object(object) => Ok(object.get(key).unwrap_or_default()),
            Self::Function(function) => Ok(match key {
                "name" if !function.has(&PropertyKey::from(key)) => {
                    Value::string(function.name())
                }
                "prototype" => function
                    .prototype()
                    .map(|proto| Value::Object(proto.clone()))
                    .unwrap_or_default(),
                _ => function.get(key).unwrap_or_default(),
            }),
            Self::Namespace(namespace) => Ok(namespace.get(key)?.unwrap_or_default()),
            Self::Proxy(proxy) => proxy.get(key),
            _ => Ok(Value::Undefined),
        }
    }

    /// Reads any own property of an object or function.
    pub fn get_key(&self, key: &PropertyKey) -> Result<Value> {
        match key {
            PropertyKey::String(name) => self.get(name),
            PropertyKey::Symbol(_) => Ok(match self {
                Self::Object(object) => object.get_key(key).unwrap_or_default(),
                Self::Function(function) => function.get_key(key).unwrap_or_default(),
                Self::Proxy(proxy) => return proxy.target().get_key(key),
                _ => Value::Undefined,
            }),
        }
    }

    /// Writes a property. Returns false when the value does not accept
    /// writes: primitives and namespaces.
    pub fn set(&self, key: impl Into<PropertyKey>, value: Value) -> bool {
        match self {
            Self::Object(object) => {
                object.set(key, value);
                true
            }
            Self::Function(function) => {
                function.set(key, value);
                true
            }
            Self::Proxy(proxy) => proxy.set(key, value),
            _ => false,
        }
    }

    /// Own keys, strings and symbols.
    pub fn own_keys(&self) -> Vec<PropertyKey> {
        match self {
            Self::Object(object) => object.keys(),
            Self::Function(function) => function.keys(),
            Self::Namespace(namespace) => {
                namespace.keys().into_iter().map(PropertyKey::String).collect()
            }
            Self::Proxy(proxy) => proxy.target().own_keys(),
            _ => Vec::new(),
        }
    }

    /// Own string keys.
    pub fn own_names(&self) -> Vec<String> {
        self.own_keys()
            .into_iter()
            .filter_map(|key| match key {
                PropertyKey::String(name) => Some(name),
                PropertyKey::Symbol(_) => None,
            })
            .collect()
    }

    /// Calls the value.
    pub fn call(&self, this: &Value, args: &[Value]) -> Result<Value> {
        match self {
            Self::Function(function) => function.call(this, args),
            Self::Proxy(proxy) => proxy.call(this, args),
            other => Err(EsmError::invalid_arg_type("callee", "of type function", Some(other))),
        }
    }

    /// Converts to JSON, as `JSON.stringify` would. `undefined` and
    /// functions have no JSON form.
    pub fn to_json(&self) -> Option<serde_json::Value> {
        use serde_json::Value as Json;

        Some(match self {
            Self::Undefined | Self::Function(_) => return None,
            Self::Null => Json::Null,
            Self::Boolean(b) => Json::Bool(*b),
            Self::Number(n) if n.fract() == 0.0 && n.abs() < MAX_SAFE_INTEGER => Json::from(*n as i64),
            Self::Number(n) => serde_json::Number::from_f64(*n).map_or(Json::Null, Json::Number),
            Self::String(s) => Json::String(s.clone()),
            Self::Object(object) if object.is_array() => Json::Array(
                object
                    .entries()
                    .into_iter()
                    .map(|(_, item)| item.to_json().unwrap_or(Json::Null))
                    .collect(),
            ),
            Self::Object(object) => Json::Object(
                object
                    .entries()
                    .into_iter()
                    .filter_map(|(key, value)| match key {
                        PropertyKey::String(name) => value.to_json().map(|json| (name, json)),
                        PropertyKey::Symbol(_) => None,
                    })
                    .collect(),
            ),
            Self::Namespace(namespace) => {
                return namespace.to_object().ok().and_then(|object| Value::Object(object).to_json());
            }
            Self::Proxy(proxy) => return proxy.target().to_json(),
        })
    }
}

/// Strict equality: primitives by value, everything else by identity.
impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Undefined, Self::Undefined) | (Self::Null, Self::Null) => true,
            (Self::Boolean(a), Self::Boolean(b)) => a == b,
            (Self::Number(a), Self::Number(b)) => a == b,
            (Self::String(a), Self::String(b)) => a == b,
            (Self::Object(a), Self::Object(b)) => Arc::ptr_eq(a, b),
            (Self::Function(a), Self::Function(b)) => Arc::ptr_eq(a, b),
            (Self::Namespace(a), Self::Namespace(b)) => a.ptr_eq(b),
            (Self::Proxy(a), Self::Proxy(b)) => a.ptr_eq(b),
            _ => false,
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Self::Boolean(b)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Self::Number(n)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Self::String(s)
    }
}

impl From<&serde_json::Value> for Value {
    fn from(json: &serde_json::Value) -> Self {
        use serde_json::Value as Json;

        match json {
            Json::Null => Self::Null,
            Json::Bool(b) => Self::Boolean(*b),
            Json::Number(n) => Self::Number(n.as_f64().unwrap_or(f64::NAN)),
            Json::String(s) => Self::String(s.clone()),
            Json::Array(items) => Self::Object(Object::array(items.iter().map(Value::from))),
            Json::Object(map) => {
                let object = Object::new();
                for (key, value) in map {
                    object.set(key.as_str(), Value::from(value));
                }
                Self::Object(object)
            }
        }
    }
}

/// Returns an exports proxy's target. Other values pass through.
pub fn unwrap_proxy(value: Value) -> Value {
    match value {
        Value::Proxy(proxy) => proxy.target().clone(),
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity_equality() {
        let a = Value::object([("x", Value::Number(1.0))]);
        let b = Value::object([("x", Value::Number(1.0))]);
        assert_eq!(a, a.clone());
        assert_ne!(a, b);
        assert_ne!(Value::Number(f64::NAN), Value::Number(f64::NAN));
    }

    #[test]
    fn test_constructor_points_back() {
        let ctor = Function::constructor("Thing", |_, _| Ok(Value::Undefined));
        let proto = ctor.prototype().unwrap();
        assert_eq!(proto.get("constructor"), Some(Value::Function(ctor.clone())));
        assert_eq!(Value::Function(ctor).get("name").unwrap(), Value::from("Thing"));
    }

    #[test]
    fn test_properties_keep_order() {
        let object = Object::new();
        object.set("b", Value::Null);
        object.set("a", Value::Null);
        object.set(PropertyKey::Symbol(INSPECT_CUSTOM), Value::Boolean(true));
        object.set("b", Value::Boolean(true));

        assert_eq!(object.names(), vec!["b", "a"]);
        assert_eq!(object.keys().len(), 3);
        object.remove("b");
        assert_eq!(object.names(), vec!["a"]);
    }

    #[test]
    fn test_type_of() {
        assert_eq!(Value::Null.type_of(), "object");
        assert_eq!(Value::function("f", |_, _| Ok(Value::Undefined)).type_of(), "function");
        assert_eq!(Value::Undefined.type_of(), "undefined");
    }

    #[test]
    fn test_primitives_reject_writes() {
        assert!(!Value::Number(1.0).set("x", Value::Null));
        assert!(Value::object([]).set("x", Value::Null));
    }

    #[test]
    fn test_json_conversion() {
        let json = serde_json::json!({ "mode": "all", "list": [1, true] });
        let value = Value::from(&json);
        assert_eq!(value.get("mode").unwrap(), Value::from("all"));
        assert_eq!(value.to_json(), Some(json));
    }
}

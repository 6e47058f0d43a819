// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Native `util` module

use crate::error::to_string_literal;
use crate::modules::string_arg;
use crate::value::{Function, Object, Properties, PropertyKey, Value};

/// Create the util module exports
pub fn create_module() -> Value {
    let exports = Object::new();

    exports.set(
        "format",
        Value::function("format", |_, args| {
            let Some((first, rest)) = args.split_first() else {
                return Ok(Value::string(""));
            };
            Ok(Value::String(match first {
                Value::String(fmt) => format(fmt, rest),
                _ => format("", args),
            }))
        }),
    );

    let inspect_fn = Function::new("inspect", |_, args| {
        let value = args.first().cloned().unwrap_or_default();
        let options = args.get(1).map(InspectOptions::from_value).unwrap_or_default();
        Ok(Value::String(inspect(&value, &options)))
    });
    exports.set("inspect", Value::Function(inspect_fn));

    exports.set(
        "isDeepStrictEqual",
        Value::function("isDeepStrictEqual", |_, args| {
            let a = args.first().cloned().unwrap_or_default();
            let b = args.get(1).cloned().unwrap_or_default();
            Ok(Value::Boolean(is_deep_strict_equal(&a, &b)))
        }),
    );

    exports.set(
        "toUSVString",
        Value::function("toUSVString", |_, args| {
            // Rust strings cannot hold lone surrogates
            string_arg(args, 0, "string").map(Value::String)
        }),
    );

    exports.set("types", create_types_module());

    Value::Object(exports)
}

/// Create util.types submodule
fn create_types_module() -> Value {
    let types = Object::new();

    let predicates: [(&str, fn(&Value) -> bool); 4] = [
        ("isProxy", types::is_proxy),
        ("isModuleNamespaceObject", types::is_module_namespace_object),
        ("isNativeError", types::is_native_error),
        ("isBoxedPrimitive", types::is_boxed_primitive),
    ];
    for (name, predicate) in predicates {
        types.set(
            name,
            Value::function(name, move |_, args| {
                Ok(Value::Boolean(args.first().is_some_and(predicate)))
            }),
        );
    }

    Value::Object(types)
}

/// util.format(format, ...args) - Printf-like formatting
pub fn format(fmt: &str, args: &[Value]) -> String {
    let mut result = String::new();
    let mut arg_index = 0;
    let mut chars = fmt.chars().peekable();

    while let Some(c) = chars.next() {
        if c != '%' {
            result.push(c);
            continue;
        }
        let Some(&next) = chars.peek() else {
            result.push('%');
            continue;
        };
        if next == '%' {
            chars.next();
            result.push('%');
            continue;
        }
        if !matches!(next, 's' | 'd' | 'i' | 'f' | 'j' | 'o' | 'O') {
            result.push('%');
            continue;
        }

        chars.next();
        let Some(arg) = args.get(arg_index) else {
            result.push('%');
            result.push(next);
            continue;
        };
        arg_index += 1;

        match next {
            's' => result.push_str(&value_to_string(arg)),
            'd' | 'i' => result.push_str(&value_to_integer_string(arg)),
            'f' => result.push_str(&value_to_float_string(arg)),
            'j' => result.push_str(&value_to_json(arg)),
            _ => result.push_str(&inspect(arg, &InspectOptions::default())),
        }
    }

    for arg in args.iter().skip(arg_index) {
        if !result.is_empty() {
            result.push(' ');
        }
        match arg {
            Value::String(s) => result.push_str(s),
            other => result.push_str(&inspect(other, &InspectOptions::default())),
        }
    }

    result
}

fn value_to_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => format_number(*n),
        Value::Undefined | Value::Null | Value::Boolean(_) => inspect(value, &InspectOptions::default()),
        other => inspect(
            other,
            &InspectOptions {
                depth: Some(0),
                ..InspectOptions::default()
            },
        ),
    }
}

fn value_to_number(value: &Value) -> f64 {
    match value {
        Value::Number(n) => *n,
        Value::String(s) if s.trim().is_empty() => 0.0,
        Value::String(s) => s.trim().parse::<f64>().unwrap_or(f64::NAN),
        Value::Boolean(b) => f64::from(u8::from(*b)),
        Value::Null => 0.0,
        _ => f64::NAN,
    }
}

fn value_to_integer_string(value: &Value) -> String {
    let n = value_to_number(value);
    if n.is_finite() {
        format_number(n.trunc())
    } else {
        format_number(n)
    }
}

fn value_to_float_string(value: &Value) -> String {
    format_number(value_to_number(value))
}

fn value_to_json(value: &Value) -> String {
    match value.to_json() {
        Some(json) => json.to_string(),
        None => "undefined".to_string(),
    }
}

fn format_number(n: f64) -> String {
    if n.is_nan() {
        "NaN".to_string()
    } else if n.is_infinite() {
        if n.is_sign_positive() { "Infinity" } else { "-Infinity" }.to_string()
    } else if n == 0.0 && n.is_sign_negative() {
        "-0".to_string()
    } else {
        n.to_string()
    }
}

/// util.inspect options
#[derive(Debug, Clone)]
pub struct InspectOptions {
    /// Depth to recurse, `None` for unlimited
    pub depth: Option<u32>,
    /// Show exports proxies as `Proxy [ target ]`
    pub show_proxy: bool,
    /// Max string length
    pub max_string_length: Option<usize>,
    /// Sort object keys
    pub sorted: bool,
}

impl Default for InspectOptions {
    fn default() -> Self {
        Self {
            depth: Some(2),
            show_proxy: true,
            max_string_length: Some(10000),
            sorted: false,
        }
    }
}

impl InspectOptions {
    /// Reads options from an options object argument.
    pub fn from_value(value: &Value) -> Self {
        let mut options = Self::default();
        let field = |name: &str| value.get(name).unwrap_or_default();

        match field("depth") {
            Value::Number(n) if n.is_finite() && n >= 0.0 => options.depth = Some(n as u32),
            Value::Number(n) if n.is_infinite() => options.depth = None,
            Value::Null => options.depth = None,
            _ => {}
        }
        if let Value::Boolean(show) = field("showProxy") {
            options.show_proxy = show;
        }
        if let Value::Boolean(sorted) = field("sorted") {
            options.sorted = sorted;
        }
        match field("maxStringLength") {
            Value::Number(n) if n >= 0.0 && n.is_finite() => options.max_string_length = Some(n as usize),
            Value::Null => options.max_string_length = None,
            _ => {}
        }
        options
    }
}

/// util.inspect - format a value for debugging
pub fn inspect(value: &Value, options: &InspectOptions) -> String {
    inspect_value(value, options, 0)
}

fn inspect_value(value: &Value, options: &InspectOptions, depth: u32) -> String {
    match value {
        Value::Undefined => "undefined".to_string(),
        Value::Null => "null".to_string(),
        Value::Boolean(b) => b.to_string(),
        Value::Number(n) => format_number(*n),
        Value::String(s) => inspect_string(s, options),
        Value::Function(function) => {
            let base = if function.name().is_empty() {
                "[Function (anonymous)]".to_string()
            } else {
                format!("[Function: {}]", function.name())
            };
            let entries = function.entries();
            if entries.is_empty() || exceeds(options, depth) {
                base
            } else {
                format!("{} {}", base, inspect_entries(entries, options, depth))
            }
        }
        Value::Object(object) => {
            let label = object.class().unwrap_or("Object");
            if exceeds(options, depth) {
                return format!("[{}]", label);
            }
            if object.is_array() {
                let items: Vec<String> = object
                    .entries()
                    .iter()
                    .map(|(_, item)| inspect_value(item, options, depth + 1))
                    .collect();
                return if items.is_empty() {
                    "[]".to_string()
                } else {
                    format!("[ {} ]", items.join(", "))
                };
            }
            let prefix = match object.class() {
                None => String::new(),
                Some("Module") => "[Module: null prototype] ".to_string(),
                Some(class) => format!("{} ", class),
            };
            format!("{}{}", prefix, inspect_entries(object.entries(), options, depth))
        }
        // Namespaces hide their bindings from plain inspection
        Value::Namespace(_) => "[Object: null prototype] {}".to_string(),
        Value::Proxy(proxy) if options.show_proxy => {
            format!("Proxy [ {} ]", inspect_value(proxy.target(), options, depth))
        }
        Value::Proxy(proxy) => inspect_value(proxy.target(), options, depth),
    }
}

fn exceeds(options: &InspectOptions, depth: u32) -> bool {
    options.depth.is_some_and(|max| depth > max)
}

fn inspect_string(s: &str, options: &InspectOptions) -> String {
    match options.max_string_length {
        Some(max) if s.chars().count() > max => {
            let cut: String = s.chars().take(max).collect();
            let remaining = s.chars().count() - max;
            format!(
                "{}... {} more character{}",
                to_string_literal(&cut, '\''),
                remaining,
                if remaining == 1 { "" } else { "s" }
            )
        }
        _ => to_string_literal(s, '\''),
    }
}

fn inspect_entries(mut entries: Vec<(PropertyKey, Value)>, options: &InspectOptions, depth: u32) -> String {
    if entries.is_empty() {
        return "{}".to_string();
    }
    if options.sorted {
        entries.sort_by_key(|(key, _)| key.to_string());
    }
    let items: Vec<String> = entries
        .iter()
        .map(|(key, value)| format!("{}: {}", inspect_key(key), inspect_value(value, options, depth + 1)))
        .collect();
    format!("{{ {} }}", items.join(", "))
}

fn inspect_key(key: &PropertyKey) -> String {
    match key {
        PropertyKey::Symbol(description) => format!("[Symbol({})]", description),
        PropertyKey::String(name) if is_identifier(name) => name.clone(),
        PropertyKey::String(name) => to_string_literal(name, '\''),
    }
}

fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    chars
        .next()
        .is_some_and(|first| first.is_alphabetic() || first == '_' || first == '$')
        && chars.all(|c| c.is_alphanumeric() || c == '_' || c == '$')
}

/// util.isDeepStrictEqual - deep equality check
pub fn is_deep_strict_equal(val1: &Value, val2: &Value) -> bool {
    match (val1, val2) {
        (Value::Number(a), Value::Number(b)) => (a.is_nan() && b.is_nan()) || a == b,
        (Value::Object(a), Value::Object(b)) => {
            if a.class() != b.class() {
                return false;
            }
            let left = a.entries();
            let right = b.entries();
            left.len() == right.len()
                && left.iter().all(|(key, value)| {
                    b.get_key(key)
                        .is_some_and(|other| is_deep_strict_equal(value, &other))
                })
        }
        _ => val1 == val2,
    }
}

/// util.types - type checking utilities
pub mod types {
    use crate::value::Value;

    /// True for proxies. The only proxies in this host are the loader's own.
    pub fn is_proxy(value: &Value) -> bool {
        value.is_own_proxy()
    }

    /// True for module namespace objects
    pub fn is_module_namespace_object(value: &Value) -> bool {
        matches!(value, Value::Namespace(_))
    }

    /// True for error objects
    pub fn is_native_error(value: &Value) -> bool {
        matches!(value, Value::Object(object) if object.class().is_some_and(|class| class.ends_with("Error")))
    }

    /// True for boxed primitives; this host has none
    pub fn is_boxed_primitive(_value: &Value) -> bool {
        false
    }
}

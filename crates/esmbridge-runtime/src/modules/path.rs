// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Native `path` module (POSIX flavor)

use crate::modules::{optional_string_arg, string_arg};
use crate::value::{Object, Properties, Value};

/// Create the path module exports
pub fn create_module() -> Value {
    let exports = Object::new();

    exports.set("sep", Value::string("/"));
    exports.set("delimiter", Value::string(":"));

    exports.set(
        "basename",
        Value::function("basename", |_, args| {
            let path = string_arg(args, 0, "path")?;
            let ext = optional_string_arg(args, 1, "ext")?;
            Ok(Value::String(basename(&path, ext.as_deref())))
        }),
    );
    exports.set(
        "dirname",
        Value::function("dirname", |_, args| Ok(Value::String(dirname(&string_arg(args, 0, "path")?)))),
    );
    exports.set(
        "extname",
        Value::function("extname", |_, args| Ok(Value::String(extname(&string_arg(args, 0, "path")?)))),
    );
    exports.set(
        "isAbsolute",
        Value::function("isAbsolute", |_, args| {
            Ok(Value::Boolean(is_absolute(&string_arg(args, 0, "path")?)))
        }),
    );
    exports.set(
        "normalize",
        Value::function("normalize", |_, args| Ok(Value::String(normalize(&string_arg(args, 0, "path")?)))),
    );
    exports.set(
        "join",
        Value::function("join", |_, args| {
            let parts = (0..args.len())
                .map(|index| string_arg(args, index, "path"))
                .collect::<crate::error::Result<Vec<_>>>()?;
            let parts: Vec<&str> = parts.iter().map(String::as_str).collect();
            Ok(Value::String(join(&parts)))
        }),
    );

    Value::Object(exports)
}

/// path.basename(path, ext?)
pub fn basename(path: &str, ext: Option<&str>) -> String {
    let trimmed = path.trim_end_matches('/');
    let name = trimmed.rsplit('/').next().unwrap_or_default();

    match ext {
        Some(ext) if name.len() > ext.len() && name.ends_with(ext) => name[..name.len() - ext.len()].to_string(),
        _ => name.to_string(),
    }
}

/// path.dirname(path)
pub fn dirname(path: &str) -> String {
    let trimmed = path.trim_end_matches('/');
    if trimmed.is_empty() {
        return if path.starts_with('/') { "/" } else { "." }.to_string();
    }
    match trimmed.rfind('/') {
        Some(0) => "/".to_string(),
        Some(index) => trimmed[..index].trim_end_matches('/').to_string(),
        None => ".".to_string(),
    }
}

/// path.extname(path)
pub fn extname(path: &str) -> String {
    let name = basename(path, None);
    match name.rfind('.') {
        Some(0) | None => String::new(),
        Some(index) => name[index..].to_string(),
    }
}

/// path.isAbsolute(path)
pub fn is_absolute(path: &str) -> bool {
    path.starts_with('/')
}

/// path.join(...paths)
pub fn join(paths: &[&str]) -> String {
    let joined = paths
        .iter()
        .filter(|part| !part.is_empty())
        .copied()
        .collect::<Vec<_>>()
        .join("/");
    if joined.is_empty() {
        ".".to_string()
    } else {
        normalize(&joined)
    }
}

/// path.normalize(path)
pub fn normalize(path: &str) -> String {
    if path.is_empty() {
        return ".".to_string();
    }
    let is_absolute = path.starts_with('/');
    let trailing = path.ends_with('/');
    let mut components: Vec<&str> = Vec::new();

    for component in path.split('/') {
        match component {
            "" | "." => continue,
            ".." => {
                if !components.is_empty() && components.last() != Some(&"..") {
                    components.pop();
                } else if !is_absolute {
                    components.push("..");
                }
            }
            c => components.push(c),
        }
    }

    let mut result = components.join("/");
    if is_absolute {
        result.insert(0, '/');
    } else if result.is_empty() {
        result.push('.');
    }
    if trailing && !result.ends_with('/') {
        result.push('/');
    }
    result
}

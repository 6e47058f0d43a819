// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Host modules seen through the built-in bridge.

use std::sync::Arc;

use esmbridge_runtime::module_system::module_constructor;
use esmbridge_runtime::modules::util::{self, InspectOptions};
use esmbridge_runtime::value::unwrap_proxy;
use esmbridge_runtime::{
    ErrorKind, HostModules, LiveCell, Loader, Module, ModuleKind, Object, Options, Properties,
    Value,
};

fn counter_namespace(loader: &Loader) -> Value {
    let module = Arc::new(Module::new("/app/counter.mjs", ModuleKind::EsModule));
    let entry = loader.link(&module, "export let x = 1;", |_| None).unwrap();
    entry.declare_export("x", LiveCell::initialized(Value::Number(1.0)).getter());
    loader.registry().finish_linking(&entry);
    Value::Namespace(loader.import(&module).unwrap())
}

fn export(loader: &Loader, id: &str, name: &str) -> Value {
    loader.import_builtin(id).unwrap().get(name).unwrap().unwrap()
}

#[test]
fn util_inspect_renders_namespaces_as_modules() {
    let loader = Loader::new(Options::default());
    let namespace = counter_namespace(&loader);

    let raw = util::inspect(&namespace, &InspectOptions::default());
    assert_eq!(raw, "[Object: null prototype] {}");

    let inspect = export(&loader, "util", "inspect");
    let rendered = inspect.call(&Value::Undefined, &[namespace]).unwrap();
    assert_eq!(rendered, Value::from("[Module: null prototype] { x: 1 }"));
}

#[test]
fn util_inspect_unwraps_exports_proxies() {
    let loader = Loader::new(Options::default());
    let path = export(&loader, "path", "default");
    assert!(matches!(path, Value::Proxy(_)));

    let raw = util::inspect(&path, &InspectOptions::default());
    assert!(raw.starts_with("Proxy [ "), "{raw}");

    let inspect = export(&loader, "util", "inspect");
    let rendered = inspect.call(&Value::Undefined, &[path]).unwrap();
    assert!(rendered.as_str().unwrap().starts_with("{ sep: '/', delimiter: ':'"));
}

#[test]
fn util_types_does_not_report_own_proxies() {
    let loader = Loader::new(Options::default());
    let namespace = counter_namespace(&loader);
    assert!(util::types::is_proxy(&namespace));

    let types = export(&loader, "util", "types");
    let is_proxy = types.get("isProxy").unwrap();
    assert_eq!(is_proxy.call(&Value::Undefined, &[namespace]).unwrap(), Value::Boolean(false));

    let is_namespace = types.get("isModuleNamespaceObject").unwrap();
    let namespace = counter_namespace(&loader);
    assert_eq!(is_namespace.call(&Value::Undefined, &[namespace]).unwrap(), Value::Boolean(true));
}

#[test]
fn vm_module_is_hidden() {
    let loader = Loader::new(Options::default());
    let vm = loader.import_builtin("vm").unwrap();
    assert!(vm.has("Script"));
    assert!(!vm.has("Module"));

    let required = loader
        .require(&Arc::new(Module::new("vm", ModuleKind::Builtin)))
        .unwrap();
    assert_eq!(required.get("Module").unwrap(), Value::Undefined);
}

#[test]
fn module_builtin_is_the_loader_constructor() {
    let loader = Loader::new(Options::default());
    let default = export(&loader, "module", "default");
    assert_eq!(unwrap_proxy(default), Value::Function(module_constructor()));

    let wrap = export(&loader, "module", "wrap");
    let wrapped = wrap.call(&Value::Undefined, &[Value::from("1")]).unwrap();
    assert!(wrapped.as_str().unwrap().starts_with("(function (exports, require"));
}

#[test]
fn events_constructor_points_back_at_the_proxy() {
    let loader = Loader::new(Options::default());
    let events = export(&loader, "events", "default");
    let prototype = events.get("prototype").unwrap();
    assert_eq!(prototype.get("constructor").unwrap(), events);

    let emitter = events.call(&Value::Undefined, &[]).unwrap();
    assert!(matches!(emitter, Value::Object(ref object) if object.class() == Some("EventEmitter")));
}

#[test]
fn unknown_builtins_are_not_found() {
    let loader = Loader::new(Options::default());
    let error = loader.import_builtin("node:fs").unwrap_err();
    assert_eq!(error.kind(), ErrorKind::ModuleNotFound);
    assert_eq!(error.name(), "Error");
    assert_eq!(error.code(), Some("MODULE_NOT_FOUND"));
    assert_eq!(error.message(), "Cannot find module 'fs'");
}

#[test]
fn proxy_writes_reach_the_target_and_reads_stay_live() {
    let loader = Loader::new(Options::default());
    let namespace = loader.import_builtin("path").unwrap();
    let proxy = namespace.get("default").unwrap().unwrap();

    assert!(proxy.set("sep", Value::from("\\")));
    assert_eq!(namespace.get("sep").unwrap(), Some(Value::from("\\")));
    assert_eq!(proxy.get("sep").unwrap(), Value::from("\\"));

    // New properties land on the target but are not exports.
    assert!(proxy.set("extra", Value::Boolean(true)));
    assert_eq!(proxy.get("extra").unwrap(), Value::Boolean(true));
    assert!(!namespace.has("extra"));
}

struct FixedHost;

impl HostModules for FixedHost {
    fn builtin_ids(&self) -> Vec<String> {
        vec!["config".to_string()]
    }

    fn require(&self, id: &str) -> Option<Value> {
        (id == "config").then(|| {
            let exports = Object::new();
            exports.set("port", Value::Number(8080.0));
            Value::Object(exports)
        })
    }
}

#[test]
fn custom_hosts_are_wrapped_without_corrections() {
    let loader = Loader::with_host(Options::default(), Arc::new(FixedHost));
    let config = loader.import_builtin("config").unwrap();
    assert_eq!(config.keys(), ["port", "default"]);
    assert_eq!(config.get("port").unwrap(), Some(Value::Number(8080.0)));
    assert!(loader.import_builtin("path").is_err());
}

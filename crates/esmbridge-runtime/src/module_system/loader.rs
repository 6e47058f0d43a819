// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Loader facade
//!
//! Ties the entry registry, the built-in bridge and the package options
//! together. Resolution of specifiers to files stays with the caller.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use esmbridge_syntax::analyzer::bound_names;
use esmbridge_syntax::ast::{
    Declaration, ExportAllDeclaration, ExportDefaultDeclaration, ExportNamedDeclaration, Program,
    StatementKind,
};
use esmbridge_syntax::{SourceType, parse_module};
use tracing::debug;
use url::Url;

use super::entry::Entry;
use super::module::{ModuleKind, ModuleRef};
use super::namespace::Namespace;
use super::registry::EntryRegistry;
use crate::builtins::{BuiltinEntries, HostModules, NativeModules};
use crate::error::{EsmError, ErrorKind, Result};
use crate::options::Options;
use crate::value::Value;

/// Local name given to anonymous default exports
pub const DEFAULT_LOCAL: &str = "*default*";

/// Module loader core.
pub struct Loader {
    registry: Arc<EntryRegistry>,
    builtins: BuiltinEntries,
    options: Options,
}

impl Loader {
    /// Creates a loader backed by the native host modules.
    pub fn new(options: Options) -> Self {
        Self::with_host(options, Arc::new(NativeModules::new()))
    }

    /// Creates a loader backed by `host`.
    pub fn with_host(options: Options, host: Arc<dyn HostModules>) -> Self {
        let registry = Arc::new(EntryRegistry::new());
        let builtins = BuiltinEntries::new(host, registry.clone());
        Self {
            registry,
            builtins,
            options,
        }
    }

    /// Entry registry
    pub fn registry(&self) -> &Arc<EntryRegistry> {
        &self.registry
    }

    /// Built-in bridge
    pub fn builtins(&self) -> &BuiltinEntries {
        &self.builtins
    }

    /// Package options
    pub fn options(&self) -> &Options {
        &self.options
    }

    /// The namespace `import * as ns` yields for `module`.
    pub fn import(&self, module: &ModuleRef) -> Result<Namespace> {
        if module.kind() == ModuleKind::Builtin {
            return self.builtins.get(module.id())?.namespace();
        }
        check_extension(module)?;
        self.registry.get(module).namespace()
    }

    /// The namespace of built-in `id`.
    pub fn import_builtin(&self, id: &str) -> Result<Namespace> {
        self.builtins.get(id)?.namespace()
    }

    /// What `require` yields for `module`.
    ///
    /// ES modules can only be required when CommonJS interop is enabled,
    /// in which case their namespace is returned.
    pub fn require(&self, module: &ModuleRef) -> Result<Value> {
        match module.kind() {
            ModuleKind::Builtin => Ok(self.builtins.get(module.id())?.module().exports()),
            ModuleKind::EsModule if self.options.cjs => {
                self.registry.get(module).namespace().map(Value::Namespace)
            }
            ModuleKind::EsModule => {
                let request = module
                    .filename()
                    .map(|path| path.to_string_lossy().into_owned())
                    .unwrap_or_else(|| module.id().to_string());
                Err(EsmError::require_esm(&request))
            }
            ModuleKind::CommonJs | ModuleKind::Json => Ok(module.exports()),
        }
    }

    /// How a file is interpreted, by extension.
    pub fn classify(&self, path: &Path) -> Result<ModuleKind> {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("mjs") => Ok(ModuleKind::EsModule),
            Some("cjs") => Ok(ModuleKind::CommonJs),
            Some("json") => Ok(ModuleKind::Json),
            Some("js") if self.options.mode.allows_js() => Ok(ModuleKind::EsModule),
            Some("js") | None => Ok(ModuleKind::CommonJs),
            Some(_) => Err(EsmError::unknown_file_extension(&path.to_string_lossy())),
        }
    }

    /// Parses `source` and hoists the export declarations of `module` into
    /// its entry, which is left linking.
    ///
    /// `resolve` maps a module specifier to the module it names; built-in
    /// ids are routed through the bridge first. The caller installs getters
    /// as the body runs and then calls
    /// [`EntryRegistry::finish_linking`].
    pub fn link<F>(&self, module: &ModuleRef, source: &str, mut resolve: F) -> Result<Arc<Entry>>
    where
        F: FnMut(&str) -> Option<ModuleRef>,
    {
        check_extension(module)?;
        let program = parse_module(source, SourceType::Module)?;

        if let Some(position) = program.first_await_outside_function {
            if !self.options.await_ {
                return Err(EsmError::new(
                    ErrorKind::Syntax,
                    "await is only valid in async functions and the top level bodies of modules",
                )
                .at(position));
            }
        }

        let entry = self.registry.get(module);
        let started = self.registry.begin_linking(&entry);
        if !started {
            debug!(id = module.id(), "relinking a module still on the stack");
        }
        if let Err(error) = self.hoist(&entry, &program, &mut resolve) {
            // Only the link that pushed the entry may pop it
            if started {
                self.registry.abort_linking(&entry);
            }
            return Err(error);
        }

        debug!(
            id = module.id(),
            exports = entry.exported_names().len(),
            circular = entry.is_circular(),
            "linked module"
        );
        Ok(entry)
    }

    fn hoist(
        &self,
        entry: &Arc<Entry>,
        program: &Program,
        resolve: &mut dyn FnMut(&str) -> Option<ModuleRef>,
    ) -> Result<()> {
        // Import bindings by local name; imports hoist, so collect them first
        let mut imports: HashMap<&str, (&str, Option<&str>)> = HashMap::new();
        for stmt in &program.body {
            if let StatementKind::Import(import) = &stmt.kind {
                for specifier in &import.specifiers {
                    imports.insert(
                        specifier.local().name.as_str(),
                        (import.source.value.as_str(), specifier.imported_name()),
                    );
                }
            }
        }

        for stmt in &program.body {
            match &stmt.kind {
                StatementKind::ExportNamed(ExportNamedDeclaration {
                    declaration: Some(declaration),
                    ..
                }) => {
                    for name in declared_names(declaration) {
                        entry.hoist_export(&name, &name);
                    }
                }
                StatementKind::ExportNamed(ExportNamedDeclaration {
                    specifiers,
                    source: None,
                    ..
                }) => {
                    for specifier in specifiers {
                        let name = &specifier.exported.name;
                        match imports.get(specifier.local.name.as_str()) {
                            Some((source, Some(import_name))) => {
                                let target = self.resolve_entry(source, resolve)?;
                                entry.add_reexport(name, &target, import_name);
                            }
                            Some((source, None)) => {
                                let target = self.resolve_entry(source, resolve)?;
                                entry.add_namespace_reexport(name, &target);
                            }
                            None => entry.hoist_export(name, &specifier.local.name),
                        }
                    }
                }
                StatementKind::ExportNamed(ExportNamedDeclaration {
                    specifiers,
                    source: Some(source),
                    ..
                }) => {
                    let target = self.resolve_entry(&source.value, resolve)?;
                    for specifier in specifiers {
                        entry.add_reexport(&specifier.exported.name, &target, &specifier.local.name);
                    }
                }
                StatementKind::ExportAll(ExportAllDeclaration { exported, source }) => {
                    let target = self.resolve_entry(&source.value, resolve)?;
                    match exported {
                        Some(name) => entry.add_namespace_reexport(&name.name, &target),
                        None => entry.add_star_export(&target),
                    }
                }
                StatementKind::ExportDefault(default) => {
                    let local = match default {
                        ExportDefaultDeclaration::Function(func) => func.id.as_ref().map(|id| id.name.as_str()),
                        ExportDefaultDeclaration::Class(class) => class.id.as_ref().map(|id| id.name.as_str()),
                        ExportDefaultDeclaration::Expression(_) => None,
                    };
                    entry.hoist_export("default", local.unwrap_or(DEFAULT_LOCAL));
                }
                _ => {}
            }
        }
        Ok(())
    }

    fn resolve_entry(
        &self,
        specifier: &str,
        resolve: &mut dyn FnMut(&str) -> Option<ModuleRef>,
    ) -> Result<Arc<Entry>> {
        if self.builtins.is_builtin(specifier) {
            return self.builtins.get(specifier);
        }
        match resolve(specifier) {
            Some(module) => Ok(self.registry.get(&module)),
            None => Err(EsmError::module_not_found(specifier)),
        }
    }
}

fn declared_names(declaration: &Declaration) -> Vec<String> {
    match declaration {
        Declaration::Variable(var) => var
            .declarations
            .iter()
            .flat_map(|declarator| bound_names(&declarator.id))
            .map(|id| id.name.clone())
            .collect(),
        Declaration::Function(func) => func.id.iter().map(|id| id.name.clone()).collect(),
        Declaration::Class(class) => class.id.iter().map(|id| id.name.clone()).collect(),
    }
}

/// A `.mjs` file must be an ES module.
fn check_extension(module: &ModuleRef) -> Result<()> {
    let is_mjs = module
        .filename()
        .and_then(|path| path.extension())
        .is_some_and(|ext| ext == "mjs");
    if is_mjs && module.kind() != ModuleKind::EsModule {
        return Err(EsmError::invalid_esm_file_extension(module.id()));
    }
    Ok(())
}

/// Rejects URLs whose scheme is not `file:`. Strings that are not URLs are
/// treated as paths and accepted.
pub fn check_protocol(request: &str) -> Result<()> {
    match Url::parse(request) {
        Ok(url) if url.scheme() != "file" => {
            Err(EsmError::invalid_protocol(&format!("{}:", url.scheme()), "file:"))
        }
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::module_system::module::Module;
    use crate::options::Mode;

    #[test]
    fn test_classify_by_mode() {
        let strict = Loader::new(Options::default());
        assert_eq!(strict.classify(Path::new("a.mjs")).unwrap(), ModuleKind::EsModule);
        assert_eq!(strict.classify(Path::new("a.js")).unwrap(), ModuleKind::CommonJs);
        assert_eq!(strict.classify(Path::new("a.json")).unwrap(), ModuleKind::Json);

        let relaxed = Loader::new(Options {
            mode: Mode::Js,
            ..Options::default()
        });
        assert_eq!(relaxed.classify(Path::new("a.js")).unwrap(), ModuleKind::EsModule);

        let error = strict.classify(Path::new("a.ts")).unwrap_err();
        assert_eq!(error.code(), Some("ERR_UNKNOWN_FILE_EXTENSION"));
        assert_eq!(error.message(), "Unknown file extension: a.ts");
    }

    #[test]
    fn test_check_protocol() {
        assert!(check_protocol("file:///tmp/a.mjs").is_ok());
        assert!(check_protocol("./a.mjs").is_ok());

        let error = check_protocol("https://example.com/a.mjs").unwrap_err();
        assert_eq!(error.name(), "Error [ERR_INVALID_PROTOCOL]");
        assert_eq!(error.message(), "Protocol 'https:' not supported. Expected 'file:'");
    }

    #[test]
    fn test_require_of_es_module() {
        let loader = Loader::new(Options::default());
        let module = Arc::new(Module::new("esm", ModuleKind::EsModule).with_filename("lib.mjs"));
        let error = loader.require(&module).unwrap_err();
        assert_eq!(error.code(), Some("ERR_REQUIRE_ESM"));
        assert_eq!(error.message(), "Must use import to load ES Module: lib.mjs");

        let interop = Loader::new(Options {
            cjs: true,
            ..Options::default()
        });
        assert!(matches!(interop.require(&module), Ok(Value::Namespace(_))));
    }

    #[test]
    fn test_mjs_must_be_es_module() {
        let loader = Loader::new(Options::default());
        let module = Arc::new(Module::new("odd", ModuleKind::CommonJs).with_filename("odd.mjs"));
        let error = loader.import(&module).unwrap_err();
        assert_eq!(error.kind(), ErrorKind::InvalidEsmFileExtension);
    }

    #[test]
    fn test_top_level_await_needs_option() {
        let loader = Loader::new(Options::default());
        let module = Arc::new(Module::new("tla", ModuleKind::EsModule));
        let error = loader
            .link(&module, "const x = await f();", |_| None)
            .unwrap_err();
        assert_eq!(error.kind(), ErrorKind::Syntax);
        assert_eq!(error.position(), Some(10));

        let permissive = Loader::new(Options {
            await_: true,
            ..Options::default()
        });
        let module = Arc::new(Module::new("tla", ModuleKind::EsModule));
        assert!(permissive.link(&module, "const x = await f();", |_| None).is_ok());
    }
}

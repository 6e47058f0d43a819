// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Package-level loader options
//!
//! Options come from the `"esm"` field of the nearest `package.json`:
//!
//! ```json
//! { "esm": { "mode": "all", "cjs": true, "await": true } }
//! ```
//!
//! A bare string is shorthand for the mode: `{ "esm": "js" }`.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::Value as Json;
use tracing::debug;

use crate::error::{EsmError, Result};
use crate::value::Value;

/// Which files may contain ES module syntax
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    /// Only `.mjs` files
    #[default]
    Mjs,
    /// `.mjs` and `.js` files
    Js,
    /// Like `js`, with CommonJS interop inside ES modules
    All,
}

impl Mode {
    /// True if `.js` files may be ES modules.
    pub fn allows_js(self) -> bool {
        matches!(self, Self::Js | Self::All)
    }
}

/// Loader options
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct Options {
    /// Which files are ES modules
    pub mode: Mode,
    /// Allow `require` of ES modules
    pub cjs: bool,
    /// Allow top-level `await`
    #[serde(rename = "await")]
    pub await_: bool,
}

impl Options {
    /// Validates a raw `"esm"` field.
    pub fn from_json(raw: &Json) -> Result<Self> {
        let fields = match raw {
            Json::String(_) => return Ok(Self { mode: parse_mode(raw)?, ..Self::default() }),
            Json::Object(fields) => fields,
            other => {
                return Err(EsmError::invalid_arg_type(
                    "options",
                    "of type object",
                    Some(&Value::from(other)),
                ));
            }
        };

        let mut options = Self::default();
        for (name, value) in fields {
            match name.as_str() {
                "mode" => options.mode = parse_mode(value)?,
                "cjs" => options.cjs = parse_flag("cjs", value)?,
                "await" => options.await_ = parse_flag("await", value)?,
                unknown => return Err(EsmError::unknown_esm_option(unknown)),
            }
        }
        Ok(options)
    }

    /// Options for `path` from the nearest `package.json` that has an
    /// `"esm"` field, searching upward from `path`'s directory.
    pub fn find_for(path: &Path) -> Result<Option<Self>> {
        for manifest in manifest_candidates(path) {
            let Ok(text) = fs::read_to_string(&manifest) else {
                continue;
            };
            // Malformed manifests are skipped, like missing ones
            let Ok(json) = serde_json::from_str::<Json>(&text) else {
                debug!(path = %manifest.display(), "unreadable package.json");
                continue;
            };
            if let Some(raw) = json.get("esm") {
                debug!(path = %manifest.display(), "found esm options");
                return Self::from_json(raw).map(Some);
            }
        }
        Ok(None)
    }
}

fn parse_mode(raw: &Json) -> Result<Mode> {
    serde_json::from_value(raw.clone()).map_err(|_| EsmError::invalid_esm_mode(&Value::from(raw)))
}

fn parse_flag(name: &str, raw: &Json) -> Result<bool> {
    raw.as_bool()
        .ok_or_else(|| EsmError::invalid_arg_value(name, &Value::from(raw), Some("must be a boolean")))
}

/// The `package.json` files that would be consulted for `path`, nearest
/// first.
pub fn manifest_candidates(path: &Path) -> Vec<PathBuf> {
    let start = if path.is_dir() { Some(path) } else { path.parent() };
    start
        .into_iter()
        .flat_map(Path::ancestors)
        .map(|dir| dir.join("package.json"))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use serde_json::json;

    #[test]
    fn test_defaults() {
        let options = Options::from_json(&json!({})).unwrap();
        assert_eq!(options, Options::default());
        assert_eq!(options.mode, Mode::Mjs);
    }

    #[test]
    fn test_string_shorthand() {
        let options = Options::from_json(&json!("all")).unwrap();
        assert_eq!(options.mode, Mode::All);
        assert!(!options.cjs);
    }

    #[test]
    fn test_full_options() {
        let options = Options::from_json(&json!({ "mode": "js", "cjs": true, "await": true })).unwrap();
        assert_eq!(
            options,
            Options {
                mode: Mode::Js,
                cjs: true,
                await_: true
            }
        );
    }

    #[test]
    fn test_invalid_mode() {
        let error = Options::from_json(&json!({ "mode": "strict" })).unwrap_err();
        assert_eq!(error.kind(), ErrorKind::InvalidEsmMode);
        assert_eq!(error.message(), "The ESM option 'mode' is invalid. Received 'strict'");
    }

    #[test]
    fn test_unknown_option() {
        let error = Options::from_json(&json!({ "sourceMap": true })).unwrap_err();
        assert_eq!(error.message(), "Unknown ESM option: sourceMap");
        assert_eq!(error.code(), None);
    }

    #[test]
    fn test_non_boolean_flag() {
        let error = Options::from_json(&json!({ "cjs": "yes" })).unwrap_err();
        assert_eq!(error.code(), Some("ERR_INVALID_ARG_VALUE"));
        assert_eq!(
            error.message(),
            "The argument 'cjs' must be a boolean. Received 'yes'"
        );
    }

    #[test]
    fn test_non_object_options() {
        let error = Options::from_json(&json!(3)).unwrap_err();
        assert_eq!(
            error.message(),
            "The 'options' argument must be of type object. Received type number"
        );
    }

    #[test]
    fn test_find_nearest_manifest() {
        let root = tempfile::tempdir().unwrap();
        let nested = root.path().join("pkg").join("src");
        fs::create_dir_all(&nested).unwrap();
        fs::write(root.path().join("package.json"), r#"{ "esm": "all" }"#).unwrap();
        fs::write(root.path().join("pkg").join("package.json"), r#"{ "name": "pkg" }"#).unwrap();

        let file = nested.join("index.js");
        let options = Options::find_for(&file).unwrap().unwrap();
        assert_eq!(options.mode, Mode::All);

        fs::write(
            root.path().join("pkg").join("package.json"),
            r#"{ "esm": { "cjs": true } }"#,
        )
        .unwrap();
        let options = Options::find_for(&file).unwrap().unwrap();
        assert_eq!(options.mode, Mode::Mjs);
        assert!(options.cjs);
    }

    #[test]
    fn test_manifest_candidates_start_at_parent() {
        let candidates = manifest_candidates(Path::new("/a/b/c.js"));
        assert_eq!(candidates[0], Path::new("/a/b/package.json"));
        assert_eq!(candidates.last().unwrap(), Path::new("/package.json"));
    }
}

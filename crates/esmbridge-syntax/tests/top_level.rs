// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Hoisting analysis over whole programs.

use esmbridge_syntax::{
    Provenance, SourceType, SyntaxErrorKind, TopLevel, analyze, parse, parse_module,
};

fn top(source: &str) -> TopLevel {
    parse_module(source, SourceType::Module)
        .unwrap()
        .top
        .unwrap()
}

#[test]
fn identifiers_are_the_union_of_all_declaration_forms() {
    let top = top("import d, { a as b } from 'x';\n\
         import * as ns from 'y';\n\
         var v = 1, [w, { z }] = pair;\n\
         let l;\n\
         const c = () => {};\n\
         function f() {}\n\
         class K {}\n\
         export function g() {}\n\
         export default class D {}\n\
         export const e = 2;");

    let names: Vec<&str> = top.identifiers.names().collect();
    assert_eq!(
        names,
        vec!["d", "b", "ns", "v", "w", "z", "l", "c", "f", "K", "g", "D", "e"]
    );
    assert_eq!(top.identifiers.get("f"), Some(Provenance::Function));
    assert_eq!(top.identifiers.get("K"), Some(Provenance::Class));
    assert_eq!(top.identifiers.get("ns"), Some(Provenance::Imported));
    assert_eq!(top.identifiers.get("z"), Some(Provenance::VarLike));

    let imports: Vec<&str> = top.imported_bindings.iter().map(String::as_str).collect();
    assert_eq!(imports, vec!["d", "b", "ns"]);
}

#[test]
fn import_after_function_fails_at_the_import() {
    let source = "function f() {}\nimport { f } from 'x';";
    let error = parse_module(source, SourceType::Module).unwrap_err();

    assert_eq!(error.kind, SyntaxErrorKind::Redeclaration);
    assert_eq!(error.message, "Identifier 'f' has already been declared");
    assert_eq!(error.position, source.rfind("f }").unwrap());
    assert_eq!((error.line, error.column), (2, 9));
}

#[test]
fn function_after_import_fails_at_the_function() {
    let source = "import { f } from 'x';\nfunction f() {}";
    let error = parse_module(source, SourceType::Module).unwrap_err();
    assert_eq!(error.position, source.find("f()").unwrap());
}

#[test]
fn var_after_function_fails_in_module_mode() {
    let source = "function f() {}\nvar [a, f] = xs;";
    let error = parse_module(source, SourceType::Module).unwrap_err();
    assert_eq!(error.position, source.rfind('f').unwrap());

    assert!(parse_module(source, SourceType::Script).is_ok());
}

#[test]
fn function_after_var_fails_in_module_mode() {
    let source = "var f = 1;\nfunction f() {}";
    assert!(parse_module(source, SourceType::Module).is_err());

    let program = parse_module(source, SourceType::Script).unwrap();
    let top = program.top.unwrap();
    assert_eq!(top.identifiers.get("f"), Some(Provenance::Function));
}

#[test]
fn class_redeclaration_is_not_checked() {
    let top = top("var C = 1;\nclass C {}");
    assert_eq!(top.identifiers.get("C"), Some(Provenance::Class));
    assert_eq!(top.identifiers.len(), 1);
}

#[test]
fn duplicate_import_fails_at_the_second_binding() {
    let source = "import a from 'x';\nimport { a } from 'y';";
    let error = parse_module(source, SourceType::Module).unwrap_err();
    assert_eq!(error.position, source.rfind('a').unwrap());
}

#[test]
fn insertion_point_skips_directive_prologue() {
    let source = "\"use strict\"; \"use asm\"; let x = 1;";
    let top = top(source);
    assert_eq!(top.insert_index, 24);
    assert_eq!(&source[..top.insert_index], "\"use strict\"; \"use asm\";");
    assert_eq!(top.insert_prefix, ";");
}

#[test]
fn insertion_point_skips_parenthesized_strings() {
    let source = "(\"use strict\"); let x = 1;";
    let top = top(source);
    assert_eq!(top.insert_index, 15);
    assert_eq!(top.insert_prefix, ";");
}

#[test]
fn insertion_point_without_directives() {
    let top = top("let x = 1;\n'not a directive';");
    assert_eq!(top.insert_index, 0);
    assert_eq!(top.insert_prefix, "");
}

#[test]
fn insertion_point_with_asi_directive() {
    let top = top("'use strict'\nfoo()");
    assert_eq!(top.insert_index, 12);
}

#[test]
fn directive_followed_by_member_access_is_not_a_directive() {
    let top = top("'use strict'.length;\n'late';");
    assert_eq!(top.insert_index, 0);
}

#[test]
fn first_await_is_reported() {
    let source = "async function f() { await g() }\nconst v = await f();";
    let top = top(source);
    assert_eq!(top.first_await_outside_function, source.rfind("await"));

    let top = self::top("export const later = async () => await 1;");
    assert_eq!(top.first_await_outside_function, None);
}

#[test]
fn analyze_after_parse_matches_parse_module() {
    let source = "'use strict';\nimport x from 'x';\nexport let y = x;";
    let mut program = parse(source, SourceType::Module).unwrap();
    let analyzed = analyze(&mut program, source).unwrap().clone();

    assert_eq!(Some(&analyzed), program.top.as_ref());
    assert_eq!(analyzed, top(source));
}

#[test]
fn redeclaration_is_reported_before_a_later_syntax_error() {
    let source = "function f() {}\nlet f = 1;\nlet = ;";
    let error = parse_module(source, SourceType::Module).unwrap_err();
    assert_eq!(error.kind, SyntaxErrorKind::Redeclaration);
}

#[test]
fn top_level_serializes_with_camel_case_keys() {
    let top = top("import a from 'a';\nvar b;");
    let json = serde_json::to_value(&top).unwrap();

    assert_eq!(json["insertIndex"], 0);
    assert_eq!(json["insertPrefix"], "");
    assert_eq!(json["firstAwaitOutsideFunction"], serde_json::Value::Null);
    assert_eq!(json["identifiers"]["a"], "imported");
    assert_eq!(json["importedBindings"][0], "a");
}

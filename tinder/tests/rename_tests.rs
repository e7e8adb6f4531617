//! Rename-pass tests.

mod common;

use common::compile_src;
use pretty_assertions::assert_eq;
use tinder::rename::{rename_symbols, reset, RenameOptions};
use tinder::scope::SymbolKind;
use tinder::Compilation;

fn final_names(result: &Compilation, written: &str) -> Vec<String> {
    result
        .sema
        .table
        .symbol_ids()
        .filter(|&s| {
            let symbol = result.sema.table.symbol(s);
            symbol.name == written && symbol.kind != SymbolKind::OverloadedFunc
        })
        .map(|s| result.sema.table.symbol(s).final_name.clone())
        .collect()
}

#[test]
fn test_reserved_word_gets_prefixed() {
    let mut result = compile_src("void f() {\n  int prototype = 1\n  int other = 2\n}");
    assert!(result.module.is_some());
    rename_symbols(&result.ast, &mut result.sema, &RenameOptions::dynamic_target());
    assert_eq!(final_names(&result, "prototype"), vec!["_prototype".to_string()]);
    // Non-clashing names are untouched.
    assert_eq!(final_names(&result, "other"), vec!["other".to_string()]);
}

#[test]
fn test_systems_target_has_different_reserved_set() {
    // `prototype` is fine on the systems target; `template` is not.
    let mut result = compile_src("void f() {\n  int prototype = 1\n  int template = 2\n}");
    assert!(result.module.is_some());
    rename_symbols(&result.ast, &mut result.sema, &RenameOptions::systems_target());
    assert_eq!(final_names(&result, "prototype"), vec!["prototype".to_string()]);
    assert_eq!(final_names(&result, "template"), vec!["_template".to_string()]);
}

#[test]
fn test_overload_mangling_on_dynamic_target() {
    let mut result = compile_src(
        "class Box {\n  int v\n}\nvoid p(int a) {\n}\nvoid p(float a) {\n}\nvoid p(Box b) {\n}\nvoid f() {\n  p(1)\n}",
    );
    assert!(result.module.is_some(), "{:?}", result.render_diagnostics());
    rename_symbols(&result.ast, &mut result.sema, &RenameOptions::dynamic_target());
    let mut names = final_names(&result, "p");
    names.sort();
    assert_eq!(
        names,
        vec!["pBox".to_string(), "pFloat".to_string(), "pInt".to_string()]
    );
}

#[test]
fn test_systems_target_keeps_overloads() {
    let mut result = compile_src("void p(int a) {\n}\nvoid p(float a) {\n}\nvoid f() {\n  p(1)\n}");
    assert!(result.module.is_some());
    rename_symbols(&result.ast, &mut result.sema, &RenameOptions::systems_target());
    assert_eq!(final_names(&result, "p"), vec!["p".to_string(), "p".to_string()]);
}

#[test]
fn test_rename_is_reversible() {
    let mut result = compile_src("void f() {\n  int prototype = 1\n}");
    rename_symbols(&result.ast, &mut result.sema, &RenameOptions::dynamic_target());
    assert_eq!(final_names(&result, "prototype"), vec!["_prototype".to_string()]);
    reset(&mut result.sema);
    assert_eq!(final_names(&result, "prototype"), vec!["prototype".to_string()]);
    // A second emitter can rename again from pristine names.
    rename_symbols(&result.ast, &mut result.sema, &RenameOptions::systems_target());
    assert_eq!(final_names(&result, "prototype"), vec!["prototype".to_string()]);
}

#[test]
fn test_nullable_argument_fragment() {
    let mut result = compile_src(
        "void p(int? a) {\n}\nvoid p(string s) {\n}\nvoid f() {\n  p(\"x\")\n}",
    );
    assert!(result.module.is_some(), "{:?}", result.render_diagnostics());
    rename_symbols(&result.ast, &mut result.sema, &RenameOptions::dynamic_target());
    let mut names = final_names(&result, "p");
    names.sort();
    assert_eq!(
        names,
        vec!["pNullableInt".to_string(), "pString".to_string()]
    );
}

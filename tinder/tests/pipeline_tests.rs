//! Driver-level tests: diagnostic format, pass skipping, serialization.

mod common;

use common::{compile_src, errors, messages, warnings};
use pretty_assertions::assert_eq;
use tinder::{Diagnostic, Severity};

#[test]
fn test_diagnostic_line_format() {
    let result = compile_src("void f() {\n  g()\n}");
    let rendered = result.render_diagnostics();
    assert_eq!(rendered.len(), 1);
    assert_eq!(rendered[0], "test.tin:2:3: error: undefined symbol \"g\"");
}

#[test]
fn test_module_present_iff_no_errors() {
    assert!(compile_src("void f() {\n}").module.is_some());
    assert!(compile_src("void f() {\n  g()\n}").module.is_none());
    // Warnings alone keep the module.
    let warned = compile_src("void use(int a) {\n}\nvoid f(int? x) {\n  use(x)\n}");
    assert!(!warned.diagnostics.is_empty());
    assert!(warned.module.is_some());
}

#[test]
fn test_parse_error_skips_semantic_passes() {
    let result = compile_src("void f() {\n  int x = ]\n  g()\n}");
    // Only the parse error: the undefined call is never analyzed.
    assert_eq!(errors(&result).len(), 1);
    assert!(errors(&result)[0].contains("unexpected"));
}

#[test]
fn test_structural_error_skips_typing() {
    let result = compile_src("class C {\n  return\n}");
    assert_eq!(
        errors(&result),
        vec!["statement not allowed in a class body".to_string()]
    );
}

#[test]
fn test_module_scope_initializer_rejected() {
    let result = compile_src("int x = 1");
    assert_eq!(
        errors(&result),
        vec!["variable initializer not allowed at module scope".to_string()]
    );
}

#[test]
fn test_external_rules() {
    let clean = compile_src("external {\n  void host(int x)\n  int limit\n}");
    assert!(clean.module.is_some(), "{:?}", clean.render_diagnostics());

    let with_body = compile_src("external {\n  void host(int x) {\n  }\n}");
    assert_eq!(
        errors(&with_body),
        vec!["a function inside \"external\" cannot have a body".to_string()]
    );

    let missing_body = compile_src("void f(int x)");
    assert_eq!(errors(&missing_body), vec!["function must have a body".to_string()]);
}

#[test]
fn test_default_argument_rejected() {
    let result = compile_src("void f(int x = 1) {\n}");
    assert_eq!(
        errors(&result),
        vec!["function arguments cannot have default values".to_string()]
    );
}

#[test]
fn test_external_shares_enclosing_scope() {
    let result = compile_src(
        "external {\n  void host(int x)\n}\nvoid f() {\n  host(1)\n}",
    );
    assert!(result.module.is_some(), "{:?}", result.render_diagnostics());
}

#[test]
fn test_unknown_escape_warning_flows_through() {
    let result = compile_src("void f() {\n  string s = \"a\\qb\"\n}");
    assert_eq!(warnings(&result), vec!["unknown escape sequence \"\\q\"".to_string()]);
    assert!(result.module.is_some());
}

#[test]
fn test_fatal_lexer_error() {
    let result = compile_src("void f() {\n  string s = \"open\n}");
    assert_eq!(messages(&result).len(), 1);
    assert!(messages(&result)[0].contains("unterminated string"));
    assert!(result.module.is_none());
}

#[test]
fn test_diagnostics_serialize_to_json() {
    let result = compile_src("void f() {\n  g()\n}");
    let json = serde_json::to_string(&result.diagnostics).expect("serialization failed");
    let back: Vec<Diagnostic> = serde_json::from_str(&json).expect("deserialization failed");
    assert_eq!(back.len(), 1);
    assert_eq!(back[0].severity, Severity::Error);
    assert!(back[0].message.contains("undefined symbol"));
    assert_eq!(back[0].span.map(|s| s.line), Some(2));
}

#[test]
fn test_default_initializers_materialized() {
    use tinder_parser::ast::{ExprKind, StmtKind};

    let result = compile_src("void f() {\n  bool b\n  int i\n  float x\n  string s\n  int? n\n}");
    assert!(result.module.is_some(), "{:?}", result.render_diagnostics());

    let mut inits = Vec::new();
    for id in (0..result.ast.stmt_count() as u32).map(tinder_parser::StmtId) {
        if let StmtKind::Var(def) = &result.ast.stmt(id).kind {
            let init = def.init.expect("uninitialized variable survived");
            inits.push(result.ast.expr(init).kind.clone());
        }
    }
    assert_eq!(inits.len(), 5);
    assert!(matches!(inits[0], ExprKind::Bool(false)));
    assert!(matches!(inits[1], ExprKind::Int(0)));
    assert!(matches!(inits[2], ExprKind::Float(_)));
    assert!(matches!(inits[3], ExprKind::Str(ref s) if s.is_empty()));
    // Non-primitive types default through a null cast.
    assert!(matches!(inits[4], ExprKind::Cast { ty: None, .. }));
}

#[test]
fn test_comma_declarators_share_type() {
    let result = compile_src("void f() {\n  int x = 1, y = 2, z\n  int s = x + y + z\n}");
    assert!(result.module.is_some(), "{:?}", result.render_diagnostics());
}

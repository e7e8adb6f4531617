//! Expression-typing and overload-resolution tests.

mod common;

use common::{assert_clean, compile_src, errors, messages};
use pretty_assertions::assert_eq;
use tinder_parser::ast::{BuiltinType, ExprKind};
use tinder::Type;

#[test]
fn test_overload_selection_exact_beats_implicit() {
    let result = compile_src(
        "void p(int a) {\n}\nvoid p(float a) {\n}\nvoid f() {\n  p(1)\n  p(1.5)\n}",
    );
    assert_clean(&result);
}

#[test]
fn test_overload_no_match() {
    let result = compile_src(
        "void p(int a) {\n}\nvoid p(float a) {\n}\nvoid f() {\n  p(true)\n}",
    );
    assert_eq!(
        errors(&result),
        vec!["cannot call \"p\" with arguments \"(bool)\"".to_string()]
    );
}

#[test]
fn test_overload_without_context() {
    let result = compile_src(
        "void p(int a) {\n}\nvoid p(float a) {\n}\nvoid f() {\n  function<void, int> q = p\n}",
    );
    assert_eq!(
        errors(&result),
        vec!["cannot resolve overloaded function \"p\" without context".to_string()]
    );
}

#[test]
fn test_list_literal_with_context() {
    let result = compile_src("void f() {\n  list<int> xs = [1, 2, 3]\n}");
    assert_clean(&result);
}

#[test]
fn test_list_literal_item_mismatch() {
    let result = compile_src("void f() {\n  list<int> xs = [1, 1.5]\n}");
    assert_eq!(
        errors(&result),
        vec!["type mismatch: expected \"int\" but found \"float\"".to_string()]
    );
}

#[test]
fn test_list_literal_without_context() {
    let result = compile_src("void f() {\n  [1, 2]\n}");
    assert_eq!(
        errors(&result),
        vec!["cannot resolve type of list literal without context".to_string()]
    );
}

#[test]
fn test_type_annotation_totality() {
    let result = compile_src(
        "class Counter {\n  int value\n  int bump(int by) {\n    this.value2()\n    return this.value + by\n  }\n  int value2() {\n    return 2\n  }\n}\nvoid f(int? maybe) {\n  Counter c = Counter()\n  list<float> xs = [1, 2.5]\n  int got = c.bump(maybe ?? 0)\n}",
    );
    assert_clean(&result);
    for id in result.ast.expr_ids() {
        let ty = result.sema.expr_type(id);
        assert!(
            !ty.is_error(),
            "expression {:?} has no computed type: {:?}",
            id,
            result.ast.expr(id)
        );
        assert!(
            !matches!(ty, Type::Overloaded(_)),
            "unresolved overload left in tree"
        );
        // Free constructors appear only transiently as the base of a
        // generic instantiation (`list` in `list<float>`).
        let is_generic_base = matches!(
            result.ast.expr(id).kind,
            ExprKind::Builtin(BuiltinType::List) | ExprKind::Builtin(BuiltinType::Function)
        );
        if !is_generic_base {
            assert!(!ty.has_free_params(), "free parameters left in tree");
        }
    }
}

#[test]
fn test_implicit_conversions_are_cast_nodes() {
    let result = compile_src("void use(float a) {\n}\nvoid f() {\n  use(1)\n  float x = 2\n}");
    assert_clean(&result);
    // One cast for the argument, one for the initializer.
    let casts = result
        .ast
        .expr_ids()
        .filter(|&id| matches!(result.ast.expr(id).kind, ExprKind::Cast { ty: None, .. }))
        .count();
    assert_eq!(casts, 2);
}

#[test]
fn test_numeric_widening_in_binary() {
    let result = compile_src("void f() {\n  float x = 1 + 2.5\n  bool b = 1 < 2.5\n}");
    assert_clean(&result);
}

#[test]
fn test_string_concat_and_compare() {
    let result = compile_src("void f() {\n  string s = \"a\" + \"b\"\n  bool b = \"a\" < \"b\"\n}");
    assert_clean(&result);
}

#[test]
fn test_bitwise_needs_int() {
    let result = compile_src("void f() {\n  int x = 1 << 2\n  1.5 & 2.0\n}");
    assert_eq!(
        errors(&result),
        vec!["cannot apply operator \"&\" to \"float\" and \"float\"".to_string()]
    );
}

#[test]
fn test_metatype_operand_rejected() {
    let result = compile_src("void f() {\n  int + 1\n}");
    assert_eq!(errors(&result), vec!["a type cannot be used as a value".to_string()]);
}

#[test]
fn test_coalesce_requires_nullable() {
    let result = compile_src("void f(int? x, int y) {\n  int a = x ?? 0\n  int b = y ?? 0\n}");
    assert_eq!(
        errors(&result),
        vec!["cannot apply operator \"??\" to \"int\" and \"int\"".to_string()]
    );
}

#[test]
fn test_var_inference() {
    let result = compile_src("void f() {\n  var x = 1\n  var s = \"hi\"\n  float y = x + 0.5\n  string t = s\n}");
    assert_clean(&result);
}

#[test]
fn test_var_cannot_infer_from_null() {
    let result = compile_src("void f() {\n  var x = null\n}");
    assert_eq!(errors(&result), vec!["type \"null\" cannot be used here".to_string()]);
}

#[test]
fn test_this_in_static_function() {
    let result = compile_src(
        "class C {\n  int v\n  static int f() {\n    return this.v\n  }\n}",
    );
    assert!(errors(&result)
        .contains(&"\"this\" is only available in non-static member functions".to_string()));
}

#[test]
fn test_member_lookup_static_vs_instance() {
    let result = compile_src(
        "class C {\n  int v\n  static int limit() {\n    return 9\n  }\n}\nvoid f() {\n  C c = C()\n  int a = c.v\n  int b = C.limit()\n}",
    );
    assert_clean(&result);
}

#[test]
fn test_instance_member_not_reachable_statically() {
    let result = compile_src(
        "class C {\n  int v\n}\nvoid f() {\n  int a = C.v\n}",
    );
    assert_eq!(errors(&result), vec!["undefined symbol \"v\"".to_string()]);
}

#[test]
fn test_class_members_invisible_by_bare_name() {
    let result = compile_src(
        "class C {\n  int v\n  int f() {\n    return v\n  }\n}",
    );
    assert_eq!(errors(&result), vec!["undefined symbol \"v\"".to_string()]);
}

#[test]
fn test_use_before_definition() {
    let result = compile_src("void g(int a) {\n}\nvoid f() {\n  g(x)\n  int x = 1\n}");
    assert!(errors(&result).contains(&"\"x\" used before its definition".to_string()));
}

#[test]
fn test_invalid_cast() {
    let result = compile_src("void f() {\n  bool b = 1 as bool\n}");
    assert_eq!(errors(&result), vec!["cannot cast \"int\" to \"bool\"".to_string()]);
}

#[test]
fn test_numeric_cast_allowed() {
    let result = compile_src("void f() {\n  int x = 1.5 as int\n}");
    assert_clean(&result);
}

#[test]
fn test_nullable_of_nullable_rejected() {
    // `??` is the coalesce operator, so a doubled postfix needs a space.
    let result = compile_src("void f(int? ? x) {\n}");
    assert_eq!(
        errors(&result),
        vec!["type \"int?\" cannot be made nullable".to_string()]
    );
}

#[test]
fn test_bad_type_param_count() {
    let result = compile_src("void f(list<int, int> xs) {\n}");
    assert_eq!(
        errors(&result),
        vec!["wrong number of type parameters for \"list\"".to_string()]
    );
}

#[test]
fn test_void_only_as_return_type() {
    let result = compile_src("void f() {\n  void x\n}");
    assert_eq!(errors(&result), vec!["type \"void\" cannot be used here".to_string()]);
}

#[test]
fn test_return_type_checking() {
    let result = compile_src("int f() {\n  return\n}\nvoid g() {\n  return 1\n}");
    let found = errors(&result);
    assert!(found.contains(&"function must return a value".to_string()));
    assert!(found.contains(&"function cannot return a value".to_string()));
}

#[test]
fn test_return_inserts_conversion() {
    let result = compile_src("float f() {\n  return 1\n}");
    assert_clean(&result);
}

#[test]
fn test_condition_must_be_bool() {
    let result = compile_src("void f() {\n  if 1 {\n  }\n}");
    assert_eq!(
        errors(&result),
        vec!["type mismatch: expected \"bool\" but found \"int\"".to_string()]
    );
}

#[test]
fn test_safe_deref_on_non_nullable() {
    let result = compile_src(
        "class Box {\n  int v\n}\nvoid f(Box b) {\n  int? x = b?.v\n}",
    );
    assert!(errors(&result)
        .contains(&"\"?.\" applied to a value that is never null".to_string()));
}

#[test]
fn test_safe_deref_widens_result() {
    let result = compile_src(
        "class Box {\n  int v\n}\nvoid f(Box? b) {\n  int? x = b?.v\n}",
    );
    assert_clean(&result);
}

#[test]
fn test_redefinition() {
    let result = compile_src("void f() {\n  int x\n  float x\n}");
    assert_eq!(errors(&result), vec!["redefinition of \"x\"".to_string()]);
}

#[test]
fn test_overload_changed_modifier() {
    let result = compile_src(
        "class C {\n  int f() {\n    return 1\n  }\n  static int f(int a) {\n    return a\n  }\n}",
    );
    assert_eq!(
        errors(&result),
        vec!["overload of \"f\" changes \"static\" modifier".to_string()]
    );
}

#[test]
fn test_error_type_suppresses_cascades() {
    // The undefined symbol produces exactly one diagnostic even though it
    // is used in further arithmetic.
    let result = compile_src("void f() {\n  int x = missing + 1 * 2\n}");
    assert_eq!(messages(&result), vec!["undefined symbol \"missing\"".to_string()]);
}

#[test]
fn test_ctor_recognized() {
    let result = compile_src("class Foo {\n  int v\n}\nvoid f() {\n  Foo a = Foo()\n}");
    assert_clean(&result);
    assert_eq!(result.sema.ctor_calls.len(), 1);
}

#[test]
fn test_index_typing() {
    let result = compile_src("void f() {\n  list<int> xs = [1]\n  int a = xs[0]\n  xs[1.5]\n}");
    assert_eq!(
        errors(&result),
        vec!["type mismatch: expected \"int\" but found \"float\"".to_string()]
    );
}

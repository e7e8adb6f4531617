//! Parser structure tests.

use tinder_parser::ast::{Ast, BinaryOp, ExprId, ExprKind, StmtId, StmtKind};
use tinder_parser::{parse_source, Parsed};

fn parse_ok(source: &str) -> Parsed {
    let parsed = parse_source(source).expect("lexing failed");
    assert!(parsed.errors.is_empty(), "parse errors: {:?}", parsed.errors);
    parsed
}

fn top_stmts(parsed: &Parsed) -> Vec<StmtId> {
    match &parsed.ast.stmt(parsed.module.block).kind {
        StmtKind::Block { stmts } => stmts.clone(),
        other => panic!("module root is not a block: {other:?}"),
    }
}

fn only_expr(parsed: &Parsed) -> ExprId {
    let stmts = top_stmts(parsed);
    assert_eq!(stmts.len(), 1);
    match &parsed.ast.stmt(stmts[0]).kind {
        StmtKind::Expr { expr } => *expr,
        other => panic!("not an expression statement: {other:?}"),
    }
}

fn binary(ast: &Ast, id: ExprId) -> (BinaryOp, ExprId, ExprId) {
    match &ast.expr(id).kind {
        ExprKind::Binary { op, lhs, rhs } => (*op, *lhs, *rhs),
        other => panic!("not a binary expression: {other:?}"),
    }
}

#[test]
fn test_precedence_mul_over_add() {
    let parsed = parse_ok("1 + 2 * 3");
    let root = only_expr(&parsed);
    let (op, lhs, rhs) = binary(&parsed.ast, root);
    assert_eq!(op, BinaryOp::Add);
    assert!(matches!(parsed.ast.expr(lhs).kind, ExprKind::Int(1)));
    let (op, _, _) = binary(&parsed.ast, rhs);
    assert_eq!(op, BinaryOp::Mul);
}

#[test]
fn test_assignment_is_right_associative() {
    let parsed = parse_ok("a = b = c");
    let root = only_expr(&parsed);
    let (op, lhs, rhs) = binary(&parsed.ast, root);
    assert_eq!(op, BinaryOp::Assign);
    assert!(matches!(&parsed.ast.expr(lhs).kind, ExprKind::Ident(n) if n == "a"));
    let (inner, _, _) = binary(&parsed.ast, rhs);
    assert_eq!(inner, BinaryOp::Assign);
}

#[test]
fn test_cast_binds_tighter_than_add() {
    let parsed = parse_ok("a + b as float");
    let root = only_expr(&parsed);
    let (op, _, rhs) = binary(&parsed.ast, root);
    assert_eq!(op, BinaryOp::Add);
    assert!(matches!(
        parsed.ast.expr(rhs).kind,
        ExprKind::Cast { ty: Some(_), .. }
    ));
}

#[test]
fn test_nullable_type_in_cast() {
    let parsed = parse_ok("x as int?");
    let root = only_expr(&parsed);
    match &parsed.ast.expr(root).kind {
        ExprKind::Cast { ty: Some(ty), .. } => {
            assert!(matches!(
                parsed.ast.expr(*ty).kind,
                ExprKind::Nullable { .. }
            ));
        }
        other => panic!("not a cast: {other:?}"),
    }
}

#[test]
fn test_safe_member_and_coalesce() {
    let parsed = parse_ok("a?.b ?? c");
    let root = only_expr(&parsed);
    let (op, lhs, _) = binary(&parsed.ast, root);
    assert_eq!(op, BinaryOp::Coalesce);
    assert!(matches!(
        &parsed.ast.expr(lhs).kind,
        ExprKind::Member { safe: true, .. }
    ));
}

#[test]
fn test_var_definition_with_extra_declarators() {
    let parsed = parse_ok("int x = 1, y, z = 3");
    let stmts = top_stmts(&parsed);
    assert_eq!(stmts.len(), 3);
    let names: Vec<_> = stmts
        .iter()
        .map(|s| match &parsed.ast.stmt(*s).kind {
            StmtKind::Var(def) => def.name.clone(),
            other => panic!("not a var def: {other:?}"),
        })
        .collect();
    assert_eq!(names, vec!["x", "y", "z"]);
    // Each declarator gets its own type expression node.
    let tys: Vec<_> = stmts
        .iter()
        .map(|s| match &parsed.ast.stmt(*s).kind {
            StmtKind::Var(def) => def.ty,
            _ => unreachable!(),
        })
        .collect();
    assert_ne!(tys[0], tys[1]);
    assert_ne!(tys[1], tys[2]);
}

#[test]
fn test_function_definition() {
    let parsed = parse_ok("void use(int a, float b) {\n  a + b\n}");
    let stmts = top_stmts(&parsed);
    assert_eq!(stmts.len(), 1);
    match &parsed.ast.stmt(stmts[0]).kind {
        StmtKind::Func(def) => {
            assert_eq!(def.name, "use");
            assert!(!def.is_static);
            assert_eq!(def.args.len(), 2);
            assert!(def.body.is_some());
        }
        other => panic!("not a function: {other:?}"),
    }
}

#[test]
fn test_static_function_definition() {
    let parsed = parse_ok("class C {\n  static int f() { return 1 }\n}");
    let stmts = top_stmts(&parsed);
    match &parsed.ast.stmt(stmts[0]).kind {
        StmtKind::Class(class) => match &parsed.ast.stmt(class.body).kind {
            StmtKind::Block { stmts } => match &parsed.ast.stmt(stmts[0]).kind {
                StmtKind::Func(def) => assert!(def.is_static),
                other => panic!("not a function: {other:?}"),
            },
            other => panic!("not a block: {other:?}"),
        },
        other => panic!("not a class: {other:?}"),
    }
}

#[test]
fn test_else_if_collapses() {
    let parsed = parse_ok("void f(int x) {\n  if x == 1 {\n  } else if x == 2 {\n  } else {\n  }\n}");
    let stmts = top_stmts(&parsed);
    let body = match &parsed.ast.stmt(stmts[0]).kind {
        StmtKind::Func(def) => def.body.unwrap(),
        other => panic!("not a function: {other:?}"),
    };
    let inner = match &parsed.ast.stmt(body).kind {
        StmtKind::Block { stmts } => stmts.clone(),
        other => panic!("not a block: {other:?}"),
    };
    match &parsed.ast.stmt(inner[0]).kind {
        StmtKind::If { else_block, .. } => {
            let else_block = else_block.expect("missing else");
            assert!(matches!(
                parsed.ast.stmt(else_block).kind,
                StmtKind::If { .. }
            ));
        }
        other => panic!("not an if: {other:?}"),
    }
}

#[test]
fn test_external_block_marks_definitions() {
    let parsed = parse_ok("external {\n  void host(int x)\n  int limit\n}");
    let stmts = top_stmts(&parsed);
    match &parsed.ast.stmt(stmts[0]).kind {
        StmtKind::External { body } => match &parsed.ast.stmt(*body).kind {
            StmtKind::Block { stmts } => {
                match &parsed.ast.stmt(stmts[0]).kind {
                    StmtKind::Func(def) => {
                        assert!(def.in_external);
                        assert!(def.body.is_none());
                    }
                    other => panic!("not a function: {other:?}"),
                }
                match &parsed.ast.stmt(stmts[1]).kind {
                    StmtKind::Var(def) => assert!(def.in_external),
                    other => panic!("not a var: {other:?}"),
                }
            }
            other => panic!("not a block: {other:?}"),
        },
        other => panic!("not external: {other:?}"),
    }
}

#[test]
fn test_char_literal_is_int() {
    let parsed = parse_ok("'a'");
    let root = only_expr(&parsed);
    assert!(matches!(parsed.ast.expr(root).kind, ExprKind::Int(97)));
}

#[test]
fn test_generic_instantiation() {
    let parsed = parse_ok("list<int> xs = [1, 2, 3]");
    let stmts = top_stmts(&parsed);
    match &parsed.ast.stmt(stmts[0]).kind {
        StmtKind::Var(def) => {
            assert!(matches!(
                parsed.ast.expr(def.ty).kind,
                ExprKind::Param { .. }
            ));
            let init = def.init.expect("missing initializer");
            assert!(matches!(&parsed.ast.expr(init).kind, ExprKind::List(items) if items.len() == 3));
        }
        other => panic!("not a var def: {other:?}"),
    }
}

#[test]
fn test_unexpected_token_is_recovered() {
    let parsed = parse_source("int x = ]\nint y = 2").unwrap();
    assert_eq!(parsed.errors.len(), 1);
    assert!(parsed.errors[0].to_string().contains("unexpected"));
    // The second statement still parsed.
    let stmts = match &parsed.ast.stmt(parsed.module.block).kind {
        StmtKind::Block { stmts } => stmts.clone(),
        other => panic!("module root is not a block: {other:?}"),
    };
    assert!(!stmts.is_empty());
}

#[test]
fn test_bad_integer_literal() {
    let parsed = parse_source("int x = 0b777").unwrap();
    assert_eq!(parsed.errors.len(), 1);
    assert!(parsed.errors[0].to_string().contains("invalid integer"));
}

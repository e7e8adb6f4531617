//! Default initialization.
//!
//! Synthesizes an initializer for every uninitialized variable: `false`,
//! `0`, `0.0`, or `""` for the value primitives, and a null-cast for every
//! other type. This is the one place the compiler produces a null value of
//! a non-nullable reference type; emitters translate it as they see fit.
//!
//! Function arguments and `external` declarations are left alone.

use tinder_parser::ast::{Ast, ExprKind, StmtKind};
use tinder_parser::{Module, StmtId};

use crate::sema::Sema;
use crate::types::{Prim, Type};

pub fn run(ast: &mut Ast, module: &Module, sema: &mut Sema) {
    init_block(ast, sema, module.block);
}

fn init_block(ast: &mut Ast, sema: &mut Sema, block: StmtId) {
    let stmts = match &ast.stmt(block).kind {
        StmtKind::Block { stmts } => stmts.clone(),
        _ => return,
    };
    for stmt in stmts {
        init_stmt(ast, sema, stmt);
    }
}

fn init_stmt(ast: &mut Ast, sema: &mut Sema, stmt: StmtId) {
    match ast.stmt(stmt).kind.clone() {
        StmtKind::Var(def) => {
            if def.in_external || def.init.is_some() {
                return;
            }
            let Some(&sym) = sema.def_symbols.get(&stmt) else {
                return;
            };
            let ty = sema.table.symbol(sym).ty.clone();
            if ty.is_error() {
                return;
            }
            let span = ast.stmt(stmt).span;
            let init = match ty {
                Type::Prim(Prim::Bool) => {
                    let e = ast.alloc_expr(ExprKind::Bool(false), span);
                    sema.expr_types.insert(e, Type::BOOL);
                    e
                }
                Type::Prim(Prim::Int) => {
                    let e = ast.alloc_expr(ExprKind::Int(0), span);
                    sema.expr_types.insert(e, Type::INT);
                    e
                }
                Type::Prim(Prim::Float) => {
                    let e = ast.alloc_expr(ExprKind::Float(0.0), span);
                    sema.expr_types.insert(e, Type::FLOAT);
                    e
                }
                Type::Prim(Prim::Str) => {
                    let e = ast.alloc_expr(ExprKind::Str(String::new()), span);
                    sema.expr_types.insert(e, Type::STR);
                    e
                }
                other => {
                    let null = ast.alloc_expr(ExprKind::Null, span);
                    sema.expr_types.insert(null, Type::Null);
                    let cast = ast.alloc_expr(ExprKind::Cast { value: null, ty: None }, span);
                    sema.expr_types.insert(cast, other);
                    cast
                }
            };
            if let StmtKind::Var(def) = &mut ast.stmt_mut(stmt).kind {
                def.init = Some(init);
            }
        }
        StmtKind::Func(def) => {
            if let Some(body) = def.body {
                init_block(ast, sema, body);
            }
        }
        StmtKind::Class(class) => init_block(ast, sema, class.body),
        StmtKind::External { body } => init_block(ast, sema, body),
        StmtKind::If {
            then_block,
            else_block,
            ..
        } => {
            init_block(ast, sema, then_block);
            if let Some(else_block) = else_block {
                match ast.stmt(else_block).kind {
                    StmtKind::Block { .. } => init_block(ast, sema, else_block),
                    _ => init_stmt(ast, sema, else_block),
                }
            }
        }
        StmtKind::While { body, .. } => init_block(ast, sema, body),
        _ => {}
    }
}

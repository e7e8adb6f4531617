//! Fixed-point analysis and flow diagnostics.
//!
//! A depth-first worklist pushes per-path knowledge through the graph.
//! Memoization on `(node, incoming knowledge)` both accelerates
//! convergence and bounds the loop: the lattice is finite, so at most
//! `|nodes| * 4^|locals|` states can ever be enqueued.
//!
//! After the fixed point, three diagnostic families read the node states:
//! dead code (a statement whose entry node was never reached, reported
//! once per block), not-all-paths-return (the exit node of a non-void
//! function is still reachable), and null / possibly-null dereferences
//! (the knowledge cached at each nullable-unwrapping cast).

use std::collections::HashSet;

use tinder_parser::ast::{Ast, ExprKind, StmtKind};
use tinder_parser::{ExprId, Module, StmtId};

use crate::diag::{DiagKind, Log};
use crate::flow::build::{build, FunctionFlow};
use crate::flow::{Effect, FlowNodeId, IsNull, Knowledge};
use crate::sema::Sema;
use crate::types::Type;

pub fn run(ast: &Ast, module: &Module, sema: &mut Sema, log: &mut Log) {
    let mut functions = Vec::new();
    collect_functions(ast, module.block, &mut functions);
    for func in functions {
        validate_function(ast, sema, log, func);
    }
}

/// Functions with bodies, in source order (module level, then class
/// members as encountered).
fn collect_functions(ast: &Ast, block: StmtId, out: &mut Vec<StmtId>) {
    let stmts = match &ast.stmt(block).kind {
        StmtKind::Block { stmts } => stmts.clone(),
        _ => return,
    };
    for stmt in stmts {
        match &ast.stmt(stmt).kind {
            StmtKind::Func(def) => {
                if def.body.is_some() {
                    out.push(stmt);
                }
            }
            StmtKind::Class(class) => collect_functions(ast, class.body, out),
            StmtKind::External { body } => collect_functions(ast, *body, out),
            _ => {}
        }
    }
}

fn validate_function(ast: &Ast, sema: &mut Sema, log: &mut Log, func: StmtId) {
    let Some(mut flow) = build(ast, sema, func) else {
        return;
    };
    analyze(&mut flow);

    let (body, func_span) = match &ast.stmt(func).kind {
        StmtKind::Func(def) => match def.body {
            Some(body) => (body, ast.stmt(func).span),
            None => return,
        },
        _ => return,
    };

    // Dead code, once per block.
    scan_dead_code(ast, &flow, log, body);

    // A non-void function whose exit is still reachable can fall off the end.
    let ret = sema
        .def_symbols
        .get(&func)
        .map(|&s| sema.table.symbol(s).ty.clone())
        .and_then(|ty| match ty {
            Type::Func { ret, .. } => ret.map(|r| *r),
            _ => None,
        })
        .unwrap_or(Type::Error);
    if !ret.is_error()
        && !ret.equals(&Type::Void)
        && flow.graph.node(flow.exit).knowledge.is_some()
    {
        log.report(Some(func_span), DiagKind::NotAllPathsReturnValue);
    }

    // Dereference warnings, in source order.
    let mut casts = Vec::new();
    collect_casts_in_block(ast, body, &mut casts);
    for cast in casts {
        judge_cast(ast, sema, log, &flow, cast);
    }
}

// ==================== Fixed point ====================

fn analyze(flow: &mut FunctionFlow) {
    let mut work: Vec<(FlowNodeId, Knowledge)> = vec![(flow.entry, Knowledge::new())];
    let mut memo: HashSet<(FlowNodeId, Knowledge)> = HashSet::new();

    while let Some((id, knowledge)) = work.pop() {
        if !memo.insert((id, knowledge.clone())) {
            continue;
        }
        let mut updated = knowledge;
        let alive = match flow.graph.node(id).effect {
            Effect::None | Effect::Blocker => true,
            Effect::Assign { sym, value } => {
                updated.set(sym, value);
                true
            }
            Effect::Alias { left, right } => {
                let value = updated.get(right);
                updated.set(left, value);
                true
            }
            Effect::Check { sym, expect } => {
                let narrowed = updated.get(sym).meet(expect);
                if narrowed.is_unknown() {
                    // This path cannot happen.
                    false
                } else {
                    updated.set(sym, narrowed);
                    true
                }
            }
        };
        if !alive {
            continue;
        }

        let node = flow.graph.node_mut(id);
        if let Some(existing) = &mut node.knowledge {
            existing.join(&updated);
        } else {
            node.knowledge = Some(updated.clone());
        }
        let next = node.next.clone();
        for succ in next {
            work.push((succ, updated.clone()));
        }
    }
}

// ==================== Dead code ====================

fn scan_dead_code(ast: &Ast, flow: &FunctionFlow, log: &mut Log, block: StmtId) {
    let stmts = match &ast.stmt(block).kind {
        StmtKind::Block { stmts } => stmts.clone(),
        _ => return,
    };
    for stmt in stmts {
        if let Some(&node) = flow.graph.stmt_nodes.get(&stmt) {
            if flow.graph.node(node).knowledge.is_none() {
                let span = ast.stmt(stmt).span;
                log.report(Some(span), DiagKind::DeadCode);
                return;
            }
        }
        match &ast.stmt(stmt).kind {
            StmtKind::If {
                then_block,
                else_block,
                ..
            } => {
                scan_dead_code(ast, flow, log, *then_block);
                if let Some(else_block) = else_block {
                    match ast.stmt(*else_block).kind {
                        StmtKind::Block { .. } => scan_dead_code(ast, flow, log, *else_block),
                        _ => scan_dead_else_if(ast, flow, log, *else_block),
                    }
                }
            }
            StmtKind::While { body, .. } => scan_dead_code(ast, flow, log, *body),
            _ => {}
        }
    }
}

fn scan_dead_else_if(ast: &Ast, flow: &FunctionFlow, log: &mut Log, stmt: StmtId) {
    if let Some(&node) = flow.graph.stmt_nodes.get(&stmt) {
        if flow.graph.node(node).knowledge.is_none() {
            let span = ast.stmt(stmt).span;
            log.report(Some(span), DiagKind::DeadCode);
            return;
        }
    }
    if let StmtKind::If {
        then_block,
        else_block,
        ..
    } = ast.stmt(stmt).kind
    {
        scan_dead_code(ast, flow, log, then_block);
        if let Some(else_block) = else_block {
            match ast.stmt(else_block).kind {
                StmtKind::Block { .. } => scan_dead_code(ast, flow, log, else_block),
                _ => scan_dead_else_if(ast, flow, log, else_block),
            }
        }
    }
}

// ==================== Dereference warnings ====================

fn collect_casts_in_block(ast: &Ast, block: StmtId, out: &mut Vec<ExprId>) {
    let stmts = match &ast.stmt(block).kind {
        StmtKind::Block { stmts } => stmts.clone(),
        _ => return,
    };
    for stmt in stmts {
        collect_casts_in_stmt(ast, stmt, out);
    }
}

fn collect_casts_in_stmt(ast: &Ast, stmt: StmtId, out: &mut Vec<ExprId>) {
    match &ast.stmt(stmt).kind {
        StmtKind::If {
            test,
            then_block,
            else_block,
        } => {
            collect_casts(ast, *test, out);
            collect_casts_in_block(ast, *then_block, out);
            if let Some(else_block) = else_block {
                match ast.stmt(*else_block).kind {
                    StmtKind::Block { .. } => collect_casts_in_block(ast, *else_block, out),
                    _ => collect_casts_in_stmt(ast, *else_block, out),
                }
            }
        }
        StmtKind::While { test, body } => {
            collect_casts(ast, *test, out);
            collect_casts_in_block(ast, *body, out);
        }
        StmtKind::Return { value } => {
            if let Some(value) = value {
                collect_casts(ast, *value, out);
            }
        }
        StmtKind::Expr { expr } => collect_casts(ast, *expr, out),
        StmtKind::Var(def) => {
            if let Some(init) = def.init {
                collect_casts(ast, init, out);
            }
        }
        _ => {}
    }
}

/// Casts in evaluation order: operands first, then the cast itself.
fn collect_casts(ast: &Ast, expr: ExprId, out: &mut Vec<ExprId>) {
    match &ast.expr(expr).kind {
        ExprKind::List(items) => {
            for &item in items {
                collect_casts(ast, item, out);
            }
        }
        ExprKind::Unary { operand, .. } => collect_casts(ast, *operand, out),
        ExprKind::Binary { lhs, rhs, .. } => {
            collect_casts(ast, *lhs, out);
            collect_casts(ast, *rhs, out);
        }
        ExprKind::Call { callee, args } => {
            collect_casts(ast, *callee, out);
            for &arg in args {
                collect_casts(ast, arg, out);
            }
        }
        ExprKind::Param { base, args } => {
            collect_casts(ast, *base, out);
            for &arg in args {
                collect_casts(ast, arg, out);
            }
        }
        ExprKind::Cast { value, ty } => {
            collect_casts(ast, *value, out);
            if let Some(ty) = ty {
                collect_casts(ast, *ty, out);
            }
            out.push(expr);
        }
        ExprKind::Member { obj, .. } => collect_casts(ast, *obj, out),
        ExprKind::Index { obj, index } => {
            collect_casts(ast, *obj, out);
            collect_casts(ast, *index, out);
        }
        ExprKind::Nullable { operand } => collect_casts(ast, *operand, out),
        _ => {}
    }
}

/// Warn when a nullable-to-non-nullable cast can observe null.
fn judge_cast(ast: &Ast, sema: &Sema, log: &mut Log, flow: &FunctionFlow, cast: ExprId) {
    let Some(&node) = flow.graph.cast_nodes.get(&cast) else {
        return;
    };
    let Some(knowledge) = &flow.graph.node(node).knowledge else {
        // The cast is unreachable; dead code was already reported.
        return;
    };

    let value = match ast.expr(cast).kind {
        ExprKind::Cast { value, .. } => value,
        _ => return,
    };
    let from = sema.expr_type(value);
    let to = sema.expr_type(cast);
    if !from.is_nullable() || to.is_nullable() || to.is_error() {
        return;
    }

    let span = ast.expr(cast).span;
    match &ast.expr(value).kind {
        ExprKind::Ident(name) => {
            let sym = sema.symbol_of_use(value);
            match sym {
                Some(sym) if flow.locals.contains(&sym) => match knowledge.get(sym) {
                    IsNull::YES => log.report(
                        Some(span),
                        DiagKind::NullDereference {
                            name: Some(name.clone()),
                        },
                    ),
                    IsNull::MAYBE => log.report(
                        Some(span),
                        DiagKind::NullableDereference {
                            name: Some(name.clone()),
                        },
                    ),
                    _ => {}
                },
                // Non-local identifiers get the conservative warning.
                _ => log.report(
                    Some(span),
                    DiagKind::NullableDereference {
                        name: Some(name.clone()),
                    },
                ),
            }
        }
        _ => log.report(Some(span), DiagKind::NullableDereference { name: None }),
    }
}

//! Flow-graph construction.
//!
//! Statements are visited in reverse within each block, threading a
//! "current successor" forward edge. Boolean contexts carry a
//! (true, false) successor pair so `and`/`or` short-circuit and `not`
//! swaps branches; `x == null` / `x != null` over a function-local emits
//! the dual pair of `Check` nodes. Casts get a plain node each so the
//! analyzer can later read the knowledge that held at the cast.
//!
//! Argument bindings are wired in reverse after the body, so the first
//! thing forward flow sees is the nullability of each argument.

use std::collections::HashSet;

use tinder_parser::ast::{Ast, BinaryOp, ExprKind, StmtKind, UnaryOp};
use tinder_parser::{ExprId, StmtId};

use crate::flow::{Effect, FlowGraph, FlowNodeId, IsNull};
use crate::scope::SymbolId;
use crate::sema::Sema;
use crate::types::Type;

/// A built graph plus its distinguished nodes.
#[derive(Debug)]
pub struct FunctionFlow {
    pub graph: FlowGraph,
    pub entry: FlowNodeId,
    /// Reached only when the body can fall off the end.
    pub exit: FlowNodeId,
    /// The symbols the analysis tracked.
    pub locals: HashSet<SymbolId>,
}

pub fn build(ast: &Ast, sema: &Sema, func: StmtId) -> Option<FunctionFlow> {
    let (args, body) = match &ast.stmt(func).kind {
        StmtKind::Func(def) => (def.args.clone(), def.body?),
        _ => return None,
    };

    let mut builder = Builder {
        ast,
        sema,
        graph: FlowGraph::new(),
        locals: HashSet::new(),
    };
    builder.collect_locals(&args, body);

    let exit = builder.graph.alloc(Effect::None, Vec::new());
    let mut entry = builder.block(body, exit);
    for &arg in args.iter().rev() {
        entry = builder.arg_binding(arg, entry);
    }

    Some(FunctionFlow {
        locals: builder.locals.clone(),
        graph: builder.graph,
        entry,
        exit,
    })
}

struct Builder<'a> {
    ast: &'a Ast,
    sema: &'a Sema,
    graph: FlowGraph,
    /// Symbols the analysis tracks: arguments and body variables.
    locals: HashSet<SymbolId>,
}

impl<'a> Builder<'a> {
    fn collect_locals(&mut self, args: &[StmtId], body: StmtId) {
        for &arg in args {
            if let Some(&sym) = self.sema.def_symbols.get(&arg) {
                self.locals.insert(sym);
            }
        }
        self.collect_block_locals(body);
    }

    fn collect_block_locals(&mut self, block: StmtId) {
        let stmts = match &self.ast.stmt(block).kind {
            StmtKind::Block { stmts } => stmts.clone(),
            _ => return,
        };
        for stmt in stmts {
            match &self.ast.stmt(stmt).kind {
                StmtKind::Var(_) => {
                    if let Some(&sym) = self.sema.def_symbols.get(&stmt) {
                        self.locals.insert(sym);
                    }
                }
                StmtKind::If {
                    then_block,
                    else_block,
                    ..
                } => {
                    let (then_block, else_block) = (*then_block, *else_block);
                    self.collect_block_locals(then_block);
                    if let Some(else_block) = else_block {
                        match self.ast.stmt(else_block).kind {
                            StmtKind::Block { .. } => self.collect_block_locals(else_block),
                            _ => {
                                // Collapsed `else if`.
                                if let StmtKind::If { .. } = self.ast.stmt(else_block).kind {
                                    self.collect_else_if(else_block);
                                }
                            }
                        }
                    }
                }
                StmtKind::While { body, .. } => self.collect_block_locals(*body),
                _ => {}
            }
        }
    }

    fn collect_else_if(&mut self, stmt: StmtId) {
        if let StmtKind::If {
            then_block,
            else_block,
            ..
        } = self.ast.stmt(stmt).kind
        {
            self.collect_block_locals(then_block);
            if let Some(else_block) = else_block {
                match self.ast.stmt(else_block).kind {
                    StmtKind::Block { .. } => self.collect_block_locals(else_block),
                    StmtKind::If { .. } => self.collect_else_if(else_block),
                    _ => {}
                }
            }
        }
    }

    fn is_local(&self, sym: SymbolId) -> bool {
        self.locals.contains(&sym)
    }

    /// Initial knowledge for an argument: `Maybe` for `T?`, `No` for `T`,
    /// `Yes` for a literal null initializer.
    fn arg_binding(&mut self, arg: StmtId, succ: FlowNodeId) -> FlowNodeId {
        let Some(&sym) = self.sema.def_symbols.get(&arg) else {
            return succ;
        };
        let value = match &self.ast.stmt(arg).kind {
            StmtKind::Var(def) => match def.init {
                Some(init) if self.is_null_literal(init) => IsNull::YES,
                _ => {
                    if self.sema.table.symbol(sym).ty.is_nullable() {
                        IsNull::MAYBE
                    } else {
                        IsNull::NO
                    }
                }
            },
            _ => IsNull::MAYBE,
        };
        self.graph.alloc(Effect::Assign { sym, value }, vec![succ])
    }

    // ==================== Statements ====================

    fn block(&mut self, block: StmtId, succ: FlowNodeId) -> FlowNodeId {
        let stmts = match &self.ast.stmt(block).kind {
            StmtKind::Block { stmts } => stmts.clone(),
            _ => return succ,
        };
        let mut succ = succ;
        for &stmt in stmts.iter().rev() {
            succ = self.stmt(stmt, succ);
        }
        succ
    }

    fn stmt(&mut self, stmt: StmtId, succ: FlowNodeId) -> FlowNodeId {
        let mut head = match self.ast.stmt(stmt).kind.clone() {
            StmtKind::Return { value } => {
                let blocker = self.graph.alloc(Effect::Blocker, Vec::new());
                match value {
                    Some(value) => self.expr(value, blocker),
                    None => blocker,
                }
            }
            StmtKind::Expr { expr } => self.expr(expr, succ),
            StmtKind::Var(def) => match def.init {
                Some(init) => {
                    let after = self.assign_to(stmt_symbol(self.sema, stmt), init, succ);
                    self.expr(init, after)
                }
                None => succ,
            },
            StmtKind::If {
                test,
                then_block,
                else_block,
            } => {
                let then_inner = self.block(then_block, succ);
                let then_entry = self.graph.alloc(Effect::None, vec![then_inner]);
                let else_entry = match else_block {
                    Some(else_block) => {
                        let inner = match self.ast.stmt(else_block).kind {
                            StmtKind::Block { .. } => self.block(else_block, succ),
                            _ => self.stmt(else_block, succ),
                        };
                        self.graph.alloc(Effect::None, vec![inner])
                    }
                    None => succ,
                };
                self.cond(test, then_entry, else_entry)
            }
            StmtKind::While { test, body } => {
                let back = self.graph.alloc(Effect::None, Vec::new());
                let body_entry = self.block(body, back);
                let test_entry = self.cond(test, body_entry, succ);
                self.graph.node_mut(back).next = vec![test_entry];
                test_entry
            }
            // No flow contribution.
            _ => succ,
        };
        if head == succ {
            head = self.graph.alloc(Effect::None, vec![succ]);
        }
        self.graph.stmt_nodes.insert(stmt, head);
        head
    }

    // ==================== Boolean context ====================

    /// Wire a test expression with distinct true/false successors.
    fn cond(&mut self, expr: ExprId, on_true: FlowNodeId, on_false: FlowNodeId) -> FlowNodeId {
        match self.ast.expr(expr).kind.clone() {
            ExprKind::Unary {
                op: UnaryOp::Not,
                operand,
            } => self.cond(operand, on_false, on_true),
            ExprKind::Binary {
                op: BinaryOp::And,
                lhs,
                rhs,
            } => {
                let rhs_entry = self.cond(rhs, on_true, on_false);
                self.cond(lhs, rhs_entry, on_false)
            }
            ExprKind::Binary {
                op: BinaryOp::Or,
                lhs,
                rhs,
            } => {
                let rhs_entry = self.cond(rhs, on_true, on_false);
                self.cond(lhs, on_true, rhs_entry)
            }
            ExprKind::Binary { op, lhs, rhs } if matches!(op, BinaryOp::Eq | BinaryOp::Ne) => {
                if let Some(sym) = self.null_comparison(lhs, rhs) {
                    let on_null = if op == BinaryOp::Eq { IsNull::YES } else { IsNull::NO };
                    let t = self.graph.alloc(
                        Effect::Check {
                            sym,
                            expect: on_null,
                        },
                        vec![on_true],
                    );
                    let f = self.graph.alloc(
                        Effect::Check {
                            sym,
                            expect: on_null.invert(),
                        },
                        vec![on_false],
                    );
                    let branch = self.graph.alloc(Effect::None, vec![t, f]);
                    let after_rhs = self.expr(rhs, branch);
                    self.expr(lhs, after_rhs)
                } else {
                    self.cond_default(expr, on_true, on_false)
                }
            }
            _ => self.cond_default(expr, on_true, on_false),
        }
    }

    fn cond_default(&mut self, expr: ExprId, on_true: FlowNodeId, on_false: FlowNodeId) -> FlowNodeId {
        let branch = self.graph.alloc(Effect::None, vec![on_true, on_false]);
        self.expr(expr, branch)
    }

    /// `x == null` / `null == x` where `x` is a function-local.
    fn null_comparison(&self, lhs: ExprId, rhs: ExprId) -> Option<SymbolId> {
        let other = if self.is_null_literal(lhs) {
            rhs
        } else if self.is_null_literal(rhs) {
            lhs
        } else {
            return None;
        };
        self.local_ident(other)
    }

    fn is_null_literal(&self, expr: ExprId) -> bool {
        matches!(
            self.ast.expr(self.strip_casts(expr)).kind,
            ExprKind::Null
        )
    }

    /// Strip explicit and inserted casts; they are transparent to flow.
    fn strip_casts(&self, expr: ExprId) -> ExprId {
        let mut current = expr;
        while let ExprKind::Cast { value, .. } = self.ast.expr(current).kind {
            current = value;
        }
        current
    }

    fn local_ident(&self, expr: ExprId) -> Option<SymbolId> {
        let stripped = self.strip_casts(expr);
        match &self.ast.expr(stripped).kind {
            ExprKind::Ident(_) => {
                let sym = self.sema.symbol_of_use(stripped)?;
                self.is_local(sym).then_some(sym)
            }
            _ => None,
        }
    }

    // ==================== Expression effects ====================

    /// Chain the side effects of evaluating `expr` before `succ`.
    fn expr(&mut self, expr: ExprId, succ: FlowNodeId) -> FlowNodeId {
        match self.ast.expr(expr).kind.clone() {
            ExprKind::Binary {
                op: BinaryOp::Assign,
                lhs,
                rhs,
            } => {
                let target = self.local_ident_direct(lhs);
                let after = self.assign_to(target, rhs, succ);
                let n = self.expr(rhs, after);
                if matches!(self.ast.expr(lhs).kind, ExprKind::Ident(_)) {
                    n
                } else {
                    self.expr(lhs, n)
                }
            }
            ExprKind::Binary { op, .. } if matches!(op, BinaryOp::And | BinaryOp::Or) => {
                // Value-position short-circuit: both branches rejoin.
                let join = self.graph.alloc(Effect::None, vec![succ]);
                self.cond(expr, join, join)
            }
            ExprKind::Binary { lhs, rhs, .. } => {
                let n = self.expr(rhs, succ);
                self.expr(lhs, n)
            }
            ExprKind::Unary { operand, .. } => self.expr(operand, succ),
            ExprKind::Cast { value, .. } => {
                let point = self.graph.alloc(Effect::None, vec![succ]);
                self.graph.cast_nodes.insert(expr, point);
                self.expr(value, point)
            }
            ExprKind::Call { callee, args } => {
                let mut n = succ;
                for &arg in args.iter().rev() {
                    n = self.expr(arg, n);
                }
                self.expr(callee, n)
            }
            ExprKind::Member { obj, .. } => self.expr(obj, succ),
            ExprKind::Index { obj, index } => {
                let n = self.expr(index, succ);
                self.expr(obj, n)
            }
            ExprKind::List(items) => {
                let mut n = succ;
                for &item in items.iter().rev() {
                    n = self.expr(item, n);
                }
                n
            }
            _ => succ,
        }
    }

    fn local_ident_direct(&self, expr: ExprId) -> Option<SymbolId> {
        match &self.ast.expr(expr).kind {
            ExprKind::Ident(_) => {
                let sym = self.sema.symbol_of_use(expr)?;
                self.is_local(sym).then_some(sym)
            }
            _ => None,
        }
    }

    /// Emit the `Assign`/`Alias` effect of binding `rhs` into `target`.
    /// Chained assignments recurse on the inner left side; casts on the
    /// right are transparent.
    fn assign_to(
        &mut self,
        target: Option<SymbolId>,
        rhs: ExprId,
        succ: FlowNodeId,
    ) -> FlowNodeId {
        let Some(sym) = target else {
            return succ;
        };
        let stripped = self.strip_casts(rhs);
        let effect = match &self.ast.expr(stripped).kind {
            ExprKind::Null => Effect::Assign {
                sym,
                value: IsNull::YES,
            },
            ExprKind::Ident(_) => match self.sema.symbol_of_use(stripped) {
                Some(right) => Effect::Alias { left: sym, right },
                None => Effect::Assign {
                    sym,
                    value: IsNull::MAYBE,
                },
            },
            ExprKind::Binary {
                op: BinaryOp::Assign,
                lhs: inner_lhs,
                ..
            } => match self.local_ident_direct(*inner_lhs) {
                Some(right) => Effect::Alias { left: sym, right },
                None => self.typed_assign(sym, stripped),
            },
            _ => self.typed_assign(sym, stripped),
        };
        self.graph.alloc(effect, vec![succ])
    }

    fn typed_assign(&self, sym: SymbolId, rhs: ExprId) -> Effect {
        let value = match self.sema.expr_type(rhs) {
            Type::Null => IsNull::YES,
            ty if ty.is_nullable() => IsNull::MAYBE,
            _ => IsNull::NO,
        };
        Effect::Assign { sym, value }
    }
}

fn stmt_symbol(sema: &Sema, stmt: StmtId) -> Option<SymbolId> {
    sema.def_symbols.get(&stmt).copied()
}

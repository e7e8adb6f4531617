//! Abstract syntax tree.
//!
//! Nodes live in two arenas on [`Ast`] and refer to each other through
//! [`ExprId`]/[`StmtId`] handles, so later passes can decorate the tree
//! through side tables and splice synthesized nodes (implicit casts,
//! default initializers) without touching ownership.

use serde::{Deserialize, Serialize};

use crate::span::Span;

/// Handle to an expression in the [`Ast`] arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ExprId(pub u32);

/// Handle to a statement in the [`Ast`] arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct StmtId(pub u32);

/// The root of a parsed source: a module wrapping one top-level block.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Module {
    pub block: StmtId,
}

/// A built-in type keyword used as an expression.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BuiltinType {
    Void,
    Bool,
    Int,
    Float,
    String,
    List,
    Function,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UnaryOp {
    Neg,
    Not,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BinaryOp {
    Assign,
    Coalesce,
    And,
    Or,
    Eq,
    Ne,
    Lt,
    Gt,
    Le,
    Ge,
    Shl,
    Shr,
    BitAnd,
    BitOr,
    BitXor,
    Add,
    Sub,
    Mul,
    Div,
}

impl BinaryOp {
    pub fn symbol(self) -> &'static str {
        match self {
            BinaryOp::Assign => "=",
            BinaryOp::Coalesce => "??",
            BinaryOp::And => "and",
            BinaryOp::Or => "or",
            BinaryOp::Eq => "==",
            BinaryOp::Ne => "!=",
            BinaryOp::Lt => "<",
            BinaryOp::Gt => ">",
            BinaryOp::Le => "<=",
            BinaryOp::Ge => ">=",
            BinaryOp::Shl => "<<",
            BinaryOp::Shr => ">>",
            BinaryOp::BitAnd => "&",
            BinaryOp::BitOr => "|",
            BinaryOp::BitXor => "^",
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
        }
    }
}

/// Expression node.
#[derive(Debug, Clone)]
pub struct Expr {
    pub kind: ExprKind,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub enum ExprKind {
    /// The `var` keyword in type position.
    VarKeyword,
    Null,
    This,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    Ident(String),
    /// A built-in type keyword (`int`, `list`, ...); evaluates to a meta-type.
    Builtin(BuiltinType),
    List(Vec<ExprId>),
    Unary {
        op: UnaryOp,
        operand: ExprId,
    },
    Binary {
        op: BinaryOp,
        lhs: ExprId,
        rhs: ExprId,
    },
    Call {
        callee: ExprId,
        args: Vec<ExprId>,
    },
    /// Generic instantiation: `list<int>`, `function<void, float>`.
    Param {
        base: ExprId,
        args: Vec<ExprId>,
    },
    /// `value as type`, or (with `ty` absent) a conversion inserted by the
    /// type pass / default initialization.
    Cast {
        value: ExprId,
        ty: Option<ExprId>,
    },
    Member {
        obj: ExprId,
        name: String,
        /// `?.` rather than `.`
        safe: bool,
    },
    Index {
        obj: ExprId,
        index: ExprId,
    },
    /// Postfix `?` on a type expression.
    Nullable {
        operand: ExprId,
    },
}

/// Statement node.
#[derive(Debug, Clone)]
pub struct Stmt {
    pub kind: StmtKind,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub struct VarDef {
    pub name: String,
    /// Declared type expression (may be the `var` keyword).
    pub ty: ExprId,
    pub init: Option<ExprId>,
    /// Declared inside an `external` block.
    pub in_external: bool,
}

#[derive(Debug, Clone)]
pub struct FuncDef {
    pub name: String,
    pub is_static: bool,
    /// Return type expression.
    pub ret: ExprId,
    /// Ordered argument declarations; each is a `StmtKind::Var`.
    pub args: Vec<StmtId>,
    /// Absent for functions declared inside `external` blocks.
    pub body: Option<StmtId>,
    pub in_external: bool,
}

#[derive(Debug, Clone)]
pub struct ClassDef {
    pub name: String,
    pub body: StmtId,
    pub in_external: bool,
}

#[derive(Debug, Clone)]
pub enum StmtKind {
    Block {
        stmts: Vec<StmtId>,
    },
    If {
        test: ExprId,
        then_block: StmtId,
        /// Either a block or, for `else if`, a nested `If` statement.
        else_block: Option<StmtId>,
    },
    While {
        test: ExprId,
        body: StmtId,
    },
    Return {
        value: Option<ExprId>,
    },
    Expr {
        expr: ExprId,
    },
    External {
        body: StmtId,
    },
    Var(VarDef),
    Func(FuncDef),
    Class(ClassDef),
}

/// Node arenas for one compilation.
#[derive(Debug, Default)]
pub struct Ast {
    exprs: Vec<Expr>,
    stmts: Vec<Stmt>,
}

impl Ast {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn alloc_expr(&mut self, kind: ExprKind, span: Span) -> ExprId {
        let id = ExprId(self.exprs.len() as u32);
        self.exprs.push(Expr { kind, span });
        id
    }

    pub fn alloc_stmt(&mut self, kind: StmtKind, span: Span) -> StmtId {
        let id = StmtId(self.stmts.len() as u32);
        self.stmts.push(Stmt { kind, span });
        id
    }

    pub fn expr(&self, id: ExprId) -> &Expr {
        &self.exprs[id.0 as usize]
    }

    pub fn expr_mut(&mut self, id: ExprId) -> &mut Expr {
        &mut self.exprs[id.0 as usize]
    }

    pub fn stmt(&self, id: StmtId) -> &Stmt {
        &self.stmts[id.0 as usize]
    }

    pub fn stmt_mut(&mut self, id: StmtId) -> &mut Stmt {
        &mut self.stmts[id.0 as usize]
    }

    pub fn expr_count(&self) -> usize {
        self.exprs.len()
    }

    pub fn stmt_count(&self) -> usize {
        self.stmts.len()
    }

    /// Iterate all expression ids in allocation order.
    pub fn expr_ids(&self) -> impl Iterator<Item = ExprId> {
        (0..self.exprs.len() as u32).map(ExprId)
    }

    /// Deep-clone an expression subtree (used for comma-separated variable
    /// declarations that share one written type).
    pub fn clone_expr(&mut self, id: ExprId) -> ExprId {
        let Expr { kind, span } = self.expr(id).clone();
        let kind = match kind {
            ExprKind::List(items) => {
                ExprKind::List(items.into_iter().map(|e| self.clone_expr(e)).collect())
            }
            ExprKind::Unary { op, operand } => ExprKind::Unary {
                op,
                operand: self.clone_expr(operand),
            },
            ExprKind::Binary { op, lhs, rhs } => ExprKind::Binary {
                op,
                lhs: self.clone_expr(lhs),
                rhs: self.clone_expr(rhs),
            },
            ExprKind::Call { callee, args } => ExprKind::Call {
                callee: self.clone_expr(callee),
                args: args.into_iter().map(|e| self.clone_expr(e)).collect(),
            },
            ExprKind::Param { base, args } => ExprKind::Param {
                base: self.clone_expr(base),
                args: args.into_iter().map(|e| self.clone_expr(e)).collect(),
            },
            ExprKind::Cast { value, ty } => ExprKind::Cast {
                value: self.clone_expr(value),
                ty: ty.map(|t| self.clone_expr(t)),
            },
            ExprKind::Member { obj, name, safe } => ExprKind::Member {
                obj: self.clone_expr(obj),
                name,
                safe,
            },
            ExprKind::Index { obj, index } => ExprKind::Index {
                obj: self.clone_expr(obj),
                index: self.clone_expr(index),
            },
            ExprKind::Nullable { operand } => ExprKind::Nullable {
                operand: self.clone_expr(operand),
            },
            leaf => leaf,
        };
        self.alloc_expr(kind, span)
    }

    /// Replace every occurrence of child `old` in `parent`'s operand slots.
    pub fn replace_expr_child(&mut self, parent: ExprId, old: ExprId, new: ExprId) {
        let swap = |slot: &mut ExprId| {
            if *slot == old {
                *slot = new;
            }
        };
        match &mut self.expr_mut(parent).kind {
            ExprKind::List(items) => items.iter_mut().for_each(swap),
            ExprKind::Unary { operand, .. } => swap(operand),
            ExprKind::Binary { lhs, rhs, .. } => {
                swap(lhs);
                swap(rhs);
            }
            ExprKind::Call { callee, args } => {
                swap(callee);
                args.iter_mut().for_each(swap);
            }
            ExprKind::Param { base, args } => {
                swap(base);
                args.iter_mut().for_each(swap);
            }
            ExprKind::Cast { value, ty } => {
                swap(value);
                if let Some(t) = ty {
                    swap(t);
                }
            }
            ExprKind::Member { obj, .. } => swap(obj),
            ExprKind::Index { obj, index } => {
                swap(obj);
                swap(index);
            }
            ExprKind::Nullable { operand } => swap(operand),
            _ => {}
        }
    }

    /// Replace every occurrence of child `old` in `parent`'s expression slots.
    pub fn replace_stmt_child(&mut self, parent: StmtId, old: ExprId, new: ExprId) {
        let swap = |slot: &mut ExprId| {
            if *slot == old {
                *slot = new;
            }
        };
        match &mut self.stmt_mut(parent).kind {
            StmtKind::If { test, .. } => swap(test),
            StmtKind::While { test, .. } => swap(test),
            StmtKind::Return { value } => {
                if let Some(v) = value {
                    swap(v);
                }
            }
            StmtKind::Expr { expr } => swap(expr),
            StmtKind::Var(def) => {
                swap(&mut def.ty);
                if let Some(init) = &mut def.init {
                    swap(init);
                }
            }
            StmtKind::Func(def) => swap(&mut def.ret),
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_arena_roundtrip() {
        let mut ast = Ast::new();
        let one = ast.alloc_expr(ExprKind::Int(1), Span::default());
        let two = ast.alloc_expr(ExprKind::Int(2), Span::default());
        let sum = ast.alloc_expr(
            ExprKind::Binary {
                op: BinaryOp::Add,
                lhs: one,
                rhs: two,
            },
            Span::default(),
        );
        assert!(matches!(ast.expr(sum).kind, ExprKind::Binary { .. }));
        assert_eq!(ast.expr_count(), 3);
    }

    #[test]
    fn test_replace_child() {
        let mut ast = Ast::new();
        let one = ast.alloc_expr(ExprKind::Int(1), Span::default());
        let two = ast.alloc_expr(ExprKind::Int(2), Span::default());
        let sum = ast.alloc_expr(
            ExprKind::Binary {
                op: BinaryOp::Add,
                lhs: one,
                rhs: two,
            },
            Span::default(),
        );
        let cast = ast.alloc_expr(
            ExprKind::Cast {
                value: two,
                ty: None,
            },
            Span::default(),
        );
        ast.replace_expr_child(sum, two, cast);
        match &ast.expr(sum).kind {
            ExprKind::Binary { rhs, .. } => assert_eq!(*rhs, cast),
            other => panic!("unexpected kind: {other:?}"),
        }
    }

    #[test]
    fn test_clone_expr_is_deep() {
        let mut ast = Ast::new();
        let inner = ast.alloc_expr(ExprKind::Builtin(BuiltinType::Int), Span::default());
        let outer = ast.alloc_expr(ExprKind::Nullable { operand: inner }, Span::default());
        let copy = ast.clone_expr(outer);
        assert_ne!(copy, outer);
        match &ast.expr(copy).kind {
            ExprKind::Nullable { operand } => assert_ne!(*operand, inner),
            other => panic!("unexpected kind: {other:?}"),
        }
    }
}

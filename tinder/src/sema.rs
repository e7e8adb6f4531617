//! Semantic side tables.
//!
//! The AST itself stays syntactic; every decoration the passes produce
//! (scopes, resolved symbols, computed types, constructor-call marks) is
//! keyed by node handle here.

use std::collections::{HashMap, HashSet};

use tinder_parser::{ExprId, StmtId};

use crate::scope::{ScopeId, SymbolId, SymbolTable};
use crate::types::Type;

/// Decorations accumulated over the pass pipeline.
#[derive(Debug, Default)]
pub struct Sema {
    pub table: SymbolTable,
    /// Scope attached to each block statement.
    pub block_scopes: HashMap<StmtId, ScopeId>,
    /// Function scope per `FuncDef` (holds the arguments).
    pub func_scopes: HashMap<StmtId, ScopeId>,
    /// Class scope per `ClassDef`.
    pub class_scopes: HashMap<StmtId, ScopeId>,
    /// Symbol created by each definition statement.
    pub def_symbols: HashMap<StmtId, SymbolId>,
    /// Symbol resolved for each identifier / member expression.
    pub use_symbols: HashMap<ExprId, SymbolId>,
    /// Computed type of every expression.
    pub expr_types: HashMap<ExprId, Type>,
    /// Call expressions recognized as constructor calls.
    pub ctor_calls: HashSet<ExprId>,
}

impl Sema {
    pub fn new() -> Self {
        Self::default()
    }

    /// Computed type of an expression; the error type when the expression
    /// was never typed (only happens after earlier errors).
    pub fn expr_type(&self, expr: ExprId) -> Type {
        self.expr_types.get(&expr).cloned().unwrap_or(Type::Error)
    }

    pub fn symbol_of_use(&self, expr: ExprId) -> Option<SymbolId> {
        self.use_symbols.get(&expr).copied()
    }
}

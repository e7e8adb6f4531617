//! Scope construction and symbol definition.
//!
//! Builds the scope tree and defines every variable, function, and class
//! symbol. Class scopes are parented to the enclosing scope, so bare names
//! inside methods resolve to module scope, not to sibling members.
//! External blocks share the enclosing scope. Overloading is handled by
//! [`crate::scope::SymbolTable::define`].

use tinder_parser::ast::{Ast, StmtKind};
use tinder_parser::{Module, StmtId};

use crate::diag::{DiagKind, Log};
use crate::scope::{DefineError, ScopeId, ScopeKind, Symbol, SymbolKind};
use crate::sema::Sema;

struct Definer<'a> {
    ast: &'a Ast,
    sema: &'a mut Sema,
    log: &'a mut Log,
}

pub fn run(ast: &Ast, module: &Module, sema: &mut Sema, log: &mut Log) {
    let mut definer = Definer { ast, sema, log };
    let root = definer
        .sema
        .table
        .new_scope(None, ScopeKind::Module);
    definer.sema.block_scopes.insert(module.block, root);
    definer.define_block(module.block, root);
}

impl<'a> Definer<'a> {
    fn define_block(&mut self, block: StmtId, scope: ScopeId) {
        let stmts = match &self.ast.stmt(block).kind {
            StmtKind::Block { stmts } => stmts.clone(),
            _ => return,
        };
        for stmt in stmts {
            self.define_stmt(stmt, scope);
        }
    }

    fn define_stmt(&mut self, stmt: StmtId, scope: ScopeId) {
        match &self.ast.stmt(stmt).kind {
            StmtKind::Var(def) => {
                let symbol = Symbol::new(SymbolKind::Variable, false, Some(stmt), &def.name);
                self.define(stmt, scope, symbol);
            }
            StmtKind::Func(def) => {
                let (name, is_static, args, body) =
                    (def.name.clone(), def.is_static, def.args.clone(), def.body);
                let symbol = Symbol::new(SymbolKind::Func, is_static, Some(stmt), &name);
                self.define(stmt, scope, symbol);

                let func_scope = self.sema.table.new_scope(Some(scope), ScopeKind::Func);
                self.sema.func_scopes.insert(stmt, func_scope);
                for arg in args {
                    if let StmtKind::Var(arg_def) = &self.ast.stmt(arg).kind {
                        let symbol =
                            Symbol::new(SymbolKind::Variable, false, Some(arg), &arg_def.name);
                        self.define(arg, func_scope, symbol);
                    }
                }
                if let Some(body) = body {
                    self.sema.block_scopes.insert(body, func_scope);
                    self.define_block(body, func_scope);
                }
            }
            StmtKind::Class(class) => {
                let (name, body) = (class.name.clone(), class.body);
                let mut symbol = Symbol::new(SymbolKind::Class, false, Some(stmt), &name);
                symbol.ty = crate::types::Type::Meta(Box::new(crate::types::Type::Class(stmt)));
                self.define(stmt, scope, symbol);

                let class_scope = self.sema.table.new_scope(Some(scope), ScopeKind::Class);
                self.sema.class_scopes.insert(stmt, class_scope);
                self.sema.block_scopes.insert(body, class_scope);
                self.define_block(body, class_scope);
            }
            StmtKind::External { body } => {
                let body = *body;
                self.sema.block_scopes.insert(body, scope);
                self.define_block(body, scope);
            }
            StmtKind::If {
                then_block,
                else_block,
                ..
            } => {
                let (then_block, else_block) = (*then_block, *else_block);
                let inner = self.sema.table.new_scope(Some(scope), ScopeKind::Local);
                self.sema.block_scopes.insert(then_block, inner);
                self.define_block(then_block, inner);
                if let Some(else_block) = else_block {
                    match self.ast.stmt(else_block).kind {
                        StmtKind::Block { .. } => {
                            let inner = self.sema.table.new_scope(Some(scope), ScopeKind::Local);
                            self.sema.block_scopes.insert(else_block, inner);
                            self.define_block(else_block, inner);
                        }
                        _ => self.define_stmt(else_block, scope),
                    }
                }
            }
            StmtKind::While { body, .. } => {
                let body = *body;
                let inner = self.sema.table.new_scope(Some(scope), ScopeKind::Local);
                self.sema.block_scopes.insert(body, inner);
                self.define_block(body, inner);
            }
            StmtKind::Return { .. } | StmtKind::Expr { .. } | StmtKind::Block { .. } => {}
        }
    }

    fn define(&mut self, stmt: StmtId, scope: ScopeId, symbol: Symbol) {
        let span = self.ast.stmt(stmt).span;
        let name = symbol.name.clone();
        match self.sema.table.define(scope, symbol) {
            Ok(id) => {
                self.sema.def_symbols.insert(stmt, id);
            }
            Err(DefineError::Redefinition) => {
                self.log.report(Some(span), DiagKind::Redefinition { name });
            }
            Err(DefineError::ChangedModifier) => {
                self.log
                    .report(Some(span), DiagKind::OverloadChangedModifier { name });
            }
        }
    }
}

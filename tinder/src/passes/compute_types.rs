//! Expression typing.
//!
//! Visits every expression bottom-up, filling the type side table,
//! resolving overloads, and materializing implicit conversions as cast
//! nodes. A rolling one-expression context carries "what type is wanted
//! here": argument types for overload resolution, a target type for
//! coercion (list literals need one to exist at all).
//!
//! The same visitor doubles as the declared-type resolver used by the
//! symbol-typing pass, which runs it over type expressions only.

use tinder_parser::ast::{Ast, BinaryOp, BuiltinType, ExprKind, StmtKind, UnaryOp};
use tinder_parser::{ExprId, Module, Span, StmtId};

use crate::diag::{DiagKind, Log};
use crate::scope::{LookupMode, ScopeId, ScopeKind, SymbolId, SymbolKind};
use crate::sema::Sema;
use crate::types::{display_arg_types, Type};

enum ResolveError {
    NoMatch,
    Ambiguous,
}

pub struct TypeChecker<'a> {
    ast: &'a mut Ast,
    sema: &'a mut Sema,
    log: &'a mut Log,
    scope: ScopeId,
    class_stack: Vec<StmtId>,
    func_stack: Vec<StmtId>,
    static_stack: Vec<bool>,
    /// When non-zero the visitor is peeking: no diagnostics, no tree edits.
    probe: u32,
    ctx_arg_types: Option<Vec<Type>>,
    ctx_target: Option<Type>,
}

pub fn run(ast: &mut Ast, module: &Module, sema: &mut Sema, log: &mut Log) {
    let mut checker = TypeChecker::new(ast, module, sema, log);
    checker.visit_block(module.block);
}

impl<'a> TypeChecker<'a> {
    pub fn new(ast: &'a mut Ast, module: &Module, sema: &'a mut Sema, log: &'a mut Log) -> Self {
        let scope = sema
            .block_scopes
            .get(&module.block)
            .copied()
            .expect("define pass must run first");
        Self {
            ast,
            sema,
            log,
            scope,
            class_stack: Vec::new(),
            func_stack: Vec::new(),
            static_stack: Vec::new(),
            probe: 0,
            ctx_arg_types: None,
            ctx_target: None,
        }
    }

    fn report(&mut self, span: Span, kind: DiagKind) {
        self.log.report(Some(span), kind);
    }

    fn set_type(&mut self, expr: ExprId, ty: Type) -> Type {
        self.sema.expr_types.insert(expr, ty.clone());
        ty
    }

    fn display(&self, ty: &Type) -> String {
        ty.display(self.ast)
    }

    // ==================== Declared types ====================

    /// Resolve the declared types of every variable and function signature,
    /// visiting only type expressions (the symbol-typing pass).
    pub fn resolve_declarations(&mut self, module: &Module) {
        self.declare_block(module.block);
    }

    fn declare_block(&mut self, block: StmtId) {
        let saved = self.scope;
        if let Some(&scope) = self.sema.block_scopes.get(&block) {
            self.scope = scope;
        }
        let stmts = match &self.ast.stmt(block).kind {
            StmtKind::Block { stmts } => stmts.clone(),
            _ => return,
        };
        for stmt in stmts {
            self.declare_stmt(stmt);
        }
        self.scope = saved;
    }

    fn declare_stmt(&mut self, stmt: StmtId) {
        match self.ast.stmt(stmt).kind.clone() {
            StmtKind::Var(def) => {
                // `var`-typed declarations are inferred from their
                // initializer later, during expression typing.
                if matches!(self.ast.expr(def.ty).kind, ExprKind::VarKeyword) {
                    return;
                }
                let ty = self.eval_declared_type(def.ty, false);
                if let Some(&sym) = self.sema.def_symbols.get(&stmt) {
                    self.sema.table.symbol_mut(sym).ty = ty;
                }
            }
            StmtKind::Func(def) => {
                let ret = self.eval_declared_type(def.ret, true);
                let mut arg_types = Vec::with_capacity(def.args.len());
                for &arg in &def.args {
                    let arg_ty = match self.ast.stmt(arg).kind.clone() {
                        StmtKind::Var(arg_def) => {
                            if matches!(self.ast.expr(arg_def.ty).kind, ExprKind::VarKeyword) {
                                let span = self.ast.expr(arg_def.ty).span;
                                self.report(span, DiagKind::NotUseableType { ty: "var".into() });
                                self.set_type(arg_def.ty, Type::Error);
                                Type::Error
                            } else {
                                self.eval_declared_type(arg_def.ty, false)
                            }
                        }
                        _ => Type::Error,
                    };
                    if let Some(&sym) = self.sema.def_symbols.get(&arg) {
                        self.sema.table.symbol_mut(sym).ty = arg_ty.clone();
                    }
                    arg_types.push(arg_ty);
                }
                if let Some(&sym) = self.sema.def_symbols.get(&stmt) {
                    self.sema.table.symbol_mut(sym).ty = Type::Func {
                        ret: Some(Box::new(ret)),
                        args: arg_types,
                    };
                }
                if let Some(body) = def.body {
                    self.declare_block(body);
                }
            }
            StmtKind::Class(class) => self.declare_block(class.body),
            StmtKind::External { body } => self.declare_block(body),
            StmtKind::If {
                then_block,
                else_block,
                ..
            } => {
                self.declare_block(then_block);
                if let Some(else_block) = else_block {
                    match self.ast.stmt(else_block).kind {
                        StmtKind::Block { .. } => self.declare_block(else_block),
                        _ => self.declare_stmt(else_block),
                    }
                }
            }
            StmtKind::While { body, .. } => self.declare_block(body),
            _ => {}
        }
    }

    /// Evaluate a type expression. It must produce a meta-type whose
    /// instance has no free parameters; `void` is accepted only where the
    /// caller says so (function return types).
    pub fn eval_declared_type(&mut self, expr: ExprId, allow_void: bool) -> Type {
        let span = self.ast.expr(expr).span;
        let ty = self.visit_expr(expr);
        if ty.is_error() {
            return Type::Error;
        }
        match ty {
            Type::Meta(inner) => {
                if matches!(*inner, Type::Void) {
                    if allow_void {
                        return Type::Void;
                    }
                    self.report(span, DiagKind::NotUseableType { ty: "void".into() });
                    return Type::Error;
                }
                if inner.has_free_params() {
                    let shown = self.display(&inner);
                    self.report(span, DiagKind::NotUseableType { ty: shown });
                    return Type::Error;
                }
                *inner
            }
            other => {
                let shown = self.display(&other);
                self.report(span, DiagKind::NotUseableType { ty: shown });
                Type::Error
            }
        }
    }

    // ==================== Statements ====================

    fn visit_block(&mut self, block: StmtId) {
        let saved = self.scope;
        if let Some(&scope) = self.sema.block_scopes.get(&block) {
            self.scope = scope;
        }
        let stmts = match &self.ast.stmt(block).kind {
            StmtKind::Block { stmts } => stmts.clone(),
            _ => return,
        };
        for stmt in stmts {
            self.visit_stmt(stmt);
        }
        self.scope = saved;
    }

    fn visit_stmt(&mut self, stmt: StmtId) {
        match self.ast.stmt(stmt).kind.clone() {
            StmtKind::Block { .. } => self.visit_block(stmt),
            StmtKind::If {
                test,
                then_block,
                else_block,
            } => {
                self.check_condition(stmt, test);
                self.visit_block(then_block);
                if let Some(else_block) = else_block {
                    self.visit_stmt(else_block);
                }
            }
            StmtKind::While { test, body } => {
                self.check_condition(stmt, test);
                self.visit_block(body);
            }
            StmtKind::Return { value } => self.visit_return(stmt, value),
            StmtKind::Expr { expr } => {
                self.visit_expr(expr);
            }
            StmtKind::External { body } => self.visit_block(body),
            StmtKind::Var(_) => self.visit_var_def(stmt),
            StmtKind::Func(def) => {
                if let Some(body) = def.body {
                    self.func_stack.push(stmt);
                    self.static_stack.push(def.is_static);
                    self.visit_block(body);
                    self.static_stack.pop();
                    self.func_stack.pop();
                }
            }
            StmtKind::Class(class) => {
                self.class_stack.push(stmt);
                self.visit_block(class.body);
                self.class_stack.pop();
            }
        }
    }

    fn check_condition(&mut self, _stmt: StmtId, test: ExprId) {
        let span = self.ast.expr(test).span;
        let ty = self.visit_expr(test);
        if !ty.is_error() && !ty.equals(&Type::BOOL) {
            let found = self.display(&ty);
            self.report(
                span,
                DiagKind::TypeMismatch {
                    expected: "bool".into(),
                    found,
                },
            );
        }
    }

    fn visit_var_def(&mut self, stmt: StmtId) {
        let def = match self.ast.stmt(stmt).kind.clone() {
            StmtKind::Var(def) => def,
            _ => return,
        };
        let sym = self.sema.def_symbols.get(&stmt).copied();

        if matches!(self.ast.expr(def.ty).kind, ExprKind::VarKeyword) {
            let inferred = match def.init {
                Some(init) => {
                    let ty = self.visit_expr(init);
                    match ty {
                        Type::Null | Type::Void | Type::Meta(_) | Type::Overloaded(_) => {
                            let shown = self.display(&ty);
                            let span = self.ast.expr(init).span;
                            self.report(span, DiagKind::NotUseableType { ty: shown });
                            Type::Error
                        }
                        other => other,
                    }
                }
                None => {
                    let span = self.ast.expr(def.ty).span;
                    self.report(span, DiagKind::NotUseableType { ty: "var".into() });
                    Type::Error
                }
            };
            self.set_type(def.ty, Type::Meta(Box::new(inferred.clone())));
            if let Some(sym) = sym {
                self.sema.table.symbol_mut(sym).ty = inferred;
            }
            return;
        }

        // Declared type was resolved by the symbol-typing pass.
        let declared = sym
            .map(|s| self.sema.table.symbol(s).ty.clone())
            .unwrap_or(Type::Error);
        if let Some(init) = def.init {
            self.ctx_target = Some(declared.clone());
            self.visit_expr(init);
            self.coerce_in_stmt(stmt, init, &declared);
        }
    }

    fn visit_return(&mut self, stmt: StmtId, value: Option<ExprId>) {
        let span = self.ast.stmt(stmt).span;
        let Some(&func) = self.func_stack.last() else {
            if let Some(value) = value {
                self.visit_expr(value);
            }
            return;
        };
        let ret = self
            .sema
            .def_symbols
            .get(&func)
            .map(|&s| self.sema.table.symbol(s).ty.clone())
            .and_then(|ty| match ty {
                Type::Func { ret, .. } => ret.map(|r| *r),
                _ => None,
            })
            .unwrap_or(Type::Error);

        match (value, ret.equals(&Type::Void)) {
            (Some(value), true) => {
                self.visit_expr(value);
                self.report(span, DiagKind::VoidReturn { should_be_void: true });
            }
            (None, false) => {
                if !ret.is_error() {
                    self.report(span, DiagKind::VoidReturn { should_be_void: false });
                }
            }
            (Some(value), false) => {
                self.ctx_target = Some(ret.clone());
                self.visit_expr(value);
                self.coerce_in_stmt(stmt, value, &ret);
            }
            (None, true) => {}
        }
    }

    // ==================== Coercion ====================

    fn insert_cast(&mut self, value: ExprId, to: Type) -> ExprId {
        let span = self.ast.expr(value).span;
        let cast = self.ast.alloc_expr(ExprKind::Cast { value, ty: None }, span);
        self.set_type(cast, to);
        cast
    }

    fn coerce_in_expr(&mut self, parent: ExprId, child: ExprId, expected: &Type) {
        if let Some(cast) = self.coerce(child, expected) {
            self.ast.replace_expr_child(parent, child, cast);
        }
    }

    fn coerce_in_stmt(&mut self, parent: StmtId, child: ExprId, expected: &Type) {
        if let Some(cast) = self.coerce(child, expected) {
            self.ast.replace_stmt_child(parent, child, cast);
        }
    }

    /// Check `child` against `expected`; returns a replacement cast node
    /// when an implicit conversion has to be materialized.
    fn coerce(&mut self, child: ExprId, expected: &Type) -> Option<ExprId> {
        let found = self.sema.expr_type(child);
        if found.is_error() || expected.is_error() {
            return None;
        }
        if found.equals(expected) {
            return None;
        }
        if found.converts_to(expected) {
            if self.probe == 0 {
                return Some(self.insert_cast(child, expected.clone()));
            }
            return None;
        }
        let span = self.ast.expr(child).span;
        let expected = self.display(expected);
        let found = self.display(&found);
        self.report(span, DiagKind::TypeMismatch { expected, found });
        None
    }

    // ==================== Expressions ====================

    fn probe_type(&mut self, expr: ExprId) -> Type {
        self.probe += 1;
        self.log.suspend();
        let ty = self.visit_expr(expr);
        self.log.resume();
        self.probe -= 1;
        ty
    }

    fn visit_expr(&mut self, expr: ExprId) -> Type {
        let ctx_args = self.ctx_arg_types.take();
        let ctx_target = self.ctx_target.take();
        let span = self.ast.expr(expr).span;
        let ty = match self.ast.expr(expr).kind.clone() {
            ExprKind::VarKeyword => {
                self.report(span, DiagKind::BadKeyword { keyword: "var".into() });
                Type::Error
            }
            ExprKind::Null => Type::Null,
            ExprKind::This => self.visit_this(span),
            ExprKind::Bool(_) => Type::BOOL,
            ExprKind::Int(_) => Type::INT,
            ExprKind::Float(_) => Type::FLOAT,
            ExprKind::Str(_) => Type::STR,
            ExprKind::Ident(name) => self.visit_ident(expr, &name, span, ctx_args),
            ExprKind::Builtin(builtin) => Type::Meta(Box::new(match builtin {
                BuiltinType::Void => Type::Void,
                BuiltinType::Bool => Type::BOOL,
                BuiltinType::Int => Type::INT,
                BuiltinType::Float => Type::FLOAT,
                BuiltinType::String => Type::STR,
                BuiltinType::List => Type::List(None),
                BuiltinType::Function => Type::Func {
                    ret: None,
                    args: Vec::new(),
                },
            })),
            ExprKind::List(items) => self.visit_list(expr, &items, span, ctx_target),
            ExprKind::Unary { op, operand } => self.visit_unary(op, operand, span),
            ExprKind::Binary { op, lhs, rhs } => self.visit_binary(expr, op, lhs, rhs, span),
            ExprKind::Call { callee, args } => self.visit_call(expr, callee, &args, span),
            ExprKind::Param { base, args } => self.visit_param(base, &args, span),
            ExprKind::Cast { value, ty: Some(tex) } => self.visit_cast(value, tex, span),
            ExprKind::Cast { value, ty: None } => {
                // Synthesized conversions are typed at insertion time.
                let recorded = self.sema.expr_type(expr);
                if recorded.is_error() {
                    self.visit_expr(value)
                } else {
                    recorded
                }
            }
            ExprKind::Member { obj, name, safe } => {
                self.visit_member(expr, obj, &name, safe, span, ctx_args)
            }
            ExprKind::Index { obj, index } => self.visit_index(obj, index, span),
            ExprKind::Nullable { operand } => self.visit_nullable(operand, span),
        };
        self.set_type(expr, ty)
    }

    fn visit_this(&mut self, span: Span) -> Type {
        let in_method = !self.func_stack.is_empty() && !self.class_stack.is_empty();
        let is_static = self.static_stack.last().copied().unwrap_or(false);
        if in_method && !is_static {
            Type::Class(*self.class_stack.last().unwrap())
        } else {
            self.report(span, DiagKind::BadThis);
            Type::Error
        }
    }

    fn visit_ident(
        &mut self,
        expr: ExprId,
        name: &str,
        span: Span,
        ctx_args: Option<Vec<Type>>,
    ) -> Type {
        let Some((sym, found_in)) = self.sema.table.lookup(self.scope, name, LookupMode::Normal)
        else {
            self.report(span, DiagKind::UndefinedSymbol { name: name.into() });
            return Type::Error;
        };

        // A local variable may not be read above its declaration.
        let symbol = self.sema.table.symbol(sym);
        if symbol.kind == SymbolKind::Variable
            && matches!(
                self.sema.table.scope(found_in).kind,
                ScopeKind::Func | ScopeKind::Local
            )
        {
            if let Some(def) = symbol.def {
                if self.ast.stmt(def).span.start > span.start {
                    self.report(span, DiagKind::UseBeforeDefinition { name: name.into() });
                }
            }
        }

        self.sema.use_symbols.insert(expr, sym);
        let ty = self.sema.table.symbol(sym).ty.clone();
        match ty {
            Type::Overloaded(candidates) => {
                self.resolve_overload_use(expr, name, &candidates, ctx_args, span)
            }
            other => other,
        }
    }

    fn resolve_overload_use(
        &mut self,
        expr: ExprId,
        name: &str,
        candidates: &[SymbolId],
        ctx_args: Option<Vec<Type>>,
        span: Span,
    ) -> Type {
        let Some(arg_types) = ctx_args else {
            if self.probe > 0 {
                return Type::Overloaded(candidates.to_vec());
            }
            self.report(span, DiagKind::NoOverloadContext { name: name.into() });
            return Type::Error;
        };
        if arg_types.iter().any(Type::is_error) {
            return Type::Error;
        }
        match self.resolve_overload(candidates, &arg_types) {
            Ok(sym) => {
                self.sema.use_symbols.insert(expr, sym);
                self.sema.table.symbol(sym).ty.clone()
            }
            Err(ResolveError::Ambiguous) => {
                let args = display_arg_types(&arg_types, self.ast);
                self.report(
                    span,
                    DiagKind::MultipleOverloadsFound {
                        name: name.into(),
                        args,
                    },
                );
                Type::Error
            }
            Err(ResolveError::NoMatch) => {
                let args = display_arg_types(&arg_types, self.ast);
                self.report(
                    span,
                    DiagKind::CallNotFound {
                        name: name.into(),
                        args,
                    },
                );
                Type::Error
            }
        }
    }

    /// Partition candidates into exact and implicit matches; exact wins.
    fn resolve_overload(
        &self,
        candidates: &[SymbolId],
        arg_types: &[Type],
    ) -> Result<SymbolId, ResolveError> {
        let params_of = |sym: SymbolId| -> Option<Vec<Type>> {
            match &self.sema.table.symbol(sym).ty {
                Type::Func { args, .. } => Some(args.clone()),
                _ => None,
            }
        };

        let exact: Vec<_> = candidates
            .iter()
            .copied()
            .filter(|&c| {
                params_of(c).is_some_and(|params| {
                    params.len() == arg_types.len()
                        && params.iter().zip(arg_types).all(|(p, a)| a.equals(p))
                })
            })
            .collect();
        let matched = if exact.is_empty() {
            candidates
                .iter()
                .copied()
                .filter(|&c| {
                    params_of(c).is_some_and(|params| {
                        params.len() == arg_types.len()
                            && params
                                .iter()
                                .zip(arg_types)
                                .all(|(p, a)| a.equals(p) || a.converts_to(p))
                    })
                })
                .collect()
        } else {
            exact
        };
        match matched.len() {
            0 => Err(ResolveError::NoMatch),
            1 => Ok(matched[0]),
            _ => Err(ResolveError::Ambiguous),
        }
    }

    fn visit_member(
        &mut self,
        expr: ExprId,
        obj: ExprId,
        name: &str,
        safe: bool,
        span: Span,
        ctx_args: Option<Vec<Type>>,
    ) -> Type {
        let obj_ty = self.visit_expr(obj);
        if obj_ty.is_error() {
            return Type::Error;
        }

        let mut widen = false;
        let receiver = match obj_ty {
            Type::Nullable(inner) => {
                if safe {
                    widen = true;
                } else if self.probe == 0 {
                    // Plain access on a nullable auto-unwraps; the inserted
                    // cast is what flow validation later judges.
                    let cast = self.insert_cast(obj, (*inner).clone());
                    self.ast.replace_expr_child(expr, obj, cast);
                }
                *inner
            }
            other => {
                if safe {
                    self.report(span, DiagKind::BadSafeDereference);
                }
                other
            }
        };

        let (member_scope, mode) = match &receiver {
            Type::Meta(inner) => match **inner {
                Type::Class(def) => match self.sema.class_scopes.get(&def) {
                    Some(&scope) => (scope, LookupMode::StaticMember),
                    None => return Type::Error,
                },
                _ => {
                    let shown = self.display(&receiver);
                    self.report(span, DiagKind::BadMemberAccess { ty: shown });
                    return Type::Error;
                }
            },
            Type::Class(def) => match self.sema.class_scopes.get(def) {
                Some(&scope) => (scope, LookupMode::InstanceMember),
                None => return Type::Error,
            },
            _ => {
                let shown = self.display(&receiver);
                self.report(span, DiagKind::BadMemberAccess { ty: shown });
                return Type::Error;
            }
        };

        let Some((sym, _)) = self.sema.table.lookup(member_scope, name, mode) else {
            self.report(span, DiagKind::UndefinedSymbol { name: name.into() });
            return Type::Error;
        };
        self.sema.use_symbols.insert(expr, sym);
        let ty = self.sema.table.symbol(sym).ty.clone();
        let ty = match ty {
            Type::Overloaded(candidates) => {
                self.resolve_overload_use(expr, name, &candidates, ctx_args, span)
            }
            other => other,
        };
        if widen && !ty.is_error() {
            ty.nullable()
        } else {
            ty
        }
    }

    fn visit_call(&mut self, expr: ExprId, callee: ExprId, args: &[ExprId], span: Span) -> Type {
        let peeked = self.probe_type(callee);

        if matches!(peeked, Type::Overloaded(_)) {
            // Arguments first, then the callee again with their types as
            // resolution context.
            let arg_types: Vec<Type> = args.iter().map(|&a| self.visit_expr(a)).collect();
            self.ctx_arg_types = Some(arg_types);
            let resolved = self.visit_expr(callee);
            return match resolved {
                Type::Func { ret, args: params } => {
                    for (&a, p) in args.iter().zip(&params) {
                        self.coerce_in_expr(expr, a, p);
                    }
                    ret.map(|r| *r).unwrap_or(Type::Error)
                }
                _ => Type::Error,
            };
        }

        let callee_ty = self.visit_expr(callee);
        match callee_ty {
            Type::Error => {
                for &a in args {
                    self.visit_expr(a);
                }
                Type::Error
            }
            Type::Meta(inner) => match *inner {
                Type::Class(def) if args.is_empty() => {
                    if self.probe == 0 {
                        self.sema.ctor_calls.insert(expr);
                    }
                    Type::Class(def)
                }
                other => {
                    let arg_types: Vec<Type> = args.iter().map(|&a| self.visit_expr(a)).collect();
                    let name = self.display(&other);
                    let args = display_arg_types(&arg_types, self.ast);
                    self.report(span, DiagKind::CallNotFound { name, args });
                    Type::Error
                }
            },
            Type::Func { ret, args: params } => {
                self.check_args(expr, callee, args, &params, span);
                ret.map(|r| *r).unwrap_or(Type::Error)
            }
            Type::Nullable(inner) => {
                // A safe member access widened the function type; calling
                // through it keeps the short-circuit nullability.
                let is_safe_member =
                    matches!(self.ast.expr(callee).kind, ExprKind::Member { safe: true, .. });
                match (*inner, is_safe_member) {
                    (Type::Func { ret, args: params }, true) => {
                        self.check_args(expr, callee, args, &params, span);
                        ret.map(|r| (*r).nullable()).unwrap_or(Type::Error)
                    }
                    _ => self.fail_call(callee, args, span),
                }
            }
            _ => self.fail_call(callee, args, span),
        }
    }

    fn check_args(
        &mut self,
        expr: ExprId,
        callee: ExprId,
        args: &[ExprId],
        params: &[Type],
        span: Span,
    ) {
        if args.len() != params.len() {
            let arg_types: Vec<Type> = args.iter().map(|&a| self.visit_expr(a)).collect();
            let name = self.callee_name(callee);
            let args = display_arg_types(&arg_types, self.ast);
            self.report(span, DiagKind::CallNotFound { name, args });
            return;
        }
        for (&a, p) in args.iter().zip(params) {
            self.ctx_target = Some(p.clone());
            self.visit_expr(a);
            self.coerce_in_expr(expr, a, p);
        }
    }

    fn fail_call(&mut self, callee: ExprId, args: &[ExprId], span: Span) -> Type {
        let arg_types: Vec<Type> = args.iter().map(|&a| self.visit_expr(a)).collect();
        let name = self.callee_name(callee);
        let shown = display_arg_types(&arg_types, self.ast);
        self.report(span, DiagKind::CallNotFound { name, args: shown });
        Type::Error
    }

    fn callee_name(&self, callee: ExprId) -> String {
        match &self.ast.expr(callee).kind {
            ExprKind::Ident(name) => name.clone(),
            ExprKind::Member { name, .. } => name.clone(),
            _ => self.display(&self.sema.expr_type(callee)),
        }
    }

    fn visit_unary(&mut self, op: UnaryOp, operand: ExprId, span: Span) -> Type {
        let ty = self.visit_expr(operand);
        if ty.is_error() {
            return Type::Error;
        }
        if matches!(ty, Type::Meta(_)) {
            self.report(span, DiagKind::MetaTypeExpr);
            return Type::Error;
        }
        match op {
            UnaryOp::Neg if ty.is_numeric() => ty,
            UnaryOp::Not if ty.equals(&Type::BOOL) => Type::BOOL,
            _ => {
                let shown = self.display(&ty);
                self.report(
                    span,
                    DiagKind::UnaryOpNotFound {
                        op: match op {
                            UnaryOp::Neg => "-",
                            UnaryOp::Not => "not",
                        },
                        ty: shown,
                    },
                );
                Type::Error
            }
        }
    }

    fn visit_binary(
        &mut self,
        expr: ExprId,
        op: BinaryOp,
        lhs: ExprId,
        rhs: ExprId,
        span: Span,
    ) -> Type {
        match op {
            BinaryOp::Assign => {
                let lt = self.visit_expr(lhs);
                self.ctx_target = Some(lt.clone());
                let rt = self.visit_expr(rhs);
                if lt.is_error() || rt.is_error() {
                    return Type::Error;
                }
                if self.reject_meta(&lt, &rt, span) {
                    return Type::Error;
                }
                self.coerce_in_expr(expr, rhs, &lt);
                lt
            }
            BinaryOp::Coalesce => {
                let lt = self.visit_expr(lhs);
                match lt {
                    Type::Error => {
                        self.visit_expr(rhs);
                        Type::Error
                    }
                    Type::Nullable(inner) => {
                        self.ctx_target = Some((*inner).clone());
                        let rt = self.visit_expr(rhs);
                        if rt.is_error() {
                            return Type::Error;
                        }
                        self.coerce_in_expr(expr, rhs, &inner);
                        *inner
                    }
                    other => {
                        let rt = self.visit_expr(rhs);
                        if rt.is_error() {
                            return Type::Error;
                        }
                        let lhs_shown = self.display(&other);
                        let rhs_shown = self.display(&rt);
                        self.report(
                            span,
                            DiagKind::BinaryOpNotFound {
                                op: "??",
                                lhs: lhs_shown,
                                rhs: rhs_shown,
                            },
                        );
                        Type::Error
                    }
                }
            }
            BinaryOp::And | BinaryOp::Or => {
                let lt = self.visit_expr(lhs);
                let rt = self.visit_expr(rhs);
                if lt.is_error() || rt.is_error() {
                    return Type::Error;
                }
                if self.reject_meta(&lt, &rt, span) {
                    return Type::Error;
                }
                for (side, ty) in [(lhs, &lt), (rhs, &rt)] {
                    if !ty.equals(&Type::BOOL) {
                        let found = self.display(ty);
                        let side_span = self.ast.expr(side).span;
                        self.report(
                            side_span,
                            DiagKind::TypeMismatch {
                                expected: "bool".into(),
                                found,
                            },
                        );
                    }
                }
                Type::BOOL
            }
            BinaryOp::Add
            | BinaryOp::Sub
            | BinaryOp::Mul
            | BinaryOp::Div => {
                let lt = self.visit_expr(lhs);
                let rt = self.visit_expr(rhs);
                if lt.is_error() || rt.is_error() {
                    return Type::Error;
                }
                if self.reject_meta(&lt, &rt, span) {
                    return Type::Error;
                }
                if lt.is_numeric() && rt.is_numeric() {
                    return self.widen_numeric(expr, lhs, &lt, rhs, &rt);
                }
                if op == BinaryOp::Add && lt.equals(&Type::STR) && rt.equals(&Type::STR) {
                    return Type::STR;
                }
                self.report_binary_mismatch(op, &lt, &rt, span)
            }
            BinaryOp::Shl | BinaryOp::Shr | BinaryOp::BitAnd | BinaryOp::BitOr | BinaryOp::BitXor => {
                let lt = self.visit_expr(lhs);
                let rt = self.visit_expr(rhs);
                if lt.is_error() || rt.is_error() {
                    return Type::Error;
                }
                if self.reject_meta(&lt, &rt, span) {
                    return Type::Error;
                }
                if lt.equals(&Type::INT) && rt.equals(&Type::INT) {
                    return Type::INT;
                }
                self.report_binary_mismatch(op, &lt, &rt, span)
            }
            BinaryOp::Eq | BinaryOp::Ne => {
                let lt = self.visit_expr(lhs);
                let rt = self.visit_expr(rhs);
                if lt.is_error() || rt.is_error() {
                    return Type::Error;
                }
                if self.reject_meta(&lt, &rt, span) {
                    return Type::Error;
                }
                if lt.equals(&rt) {
                    return Type::BOOL;
                }
                if lt.converts_to(&rt) {
                    if self.probe == 0 {
                        let cast = self.insert_cast(lhs, rt.clone());
                        self.ast.replace_expr_child(expr, lhs, cast);
                    }
                    return Type::BOOL;
                }
                if rt.converts_to(&lt) {
                    if self.probe == 0 {
                        let cast = self.insert_cast(rhs, lt.clone());
                        self.ast.replace_expr_child(expr, rhs, cast);
                    }
                    return Type::BOOL;
                }
                self.report_binary_mismatch(op, &lt, &rt, span)
            }
            BinaryOp::Lt | BinaryOp::Gt | BinaryOp::Le | BinaryOp::Ge => {
                let lt = self.visit_expr(lhs);
                let rt = self.visit_expr(rhs);
                if lt.is_error() || rt.is_error() {
                    return Type::Error;
                }
                if self.reject_meta(&lt, &rt, span) {
                    return Type::Error;
                }
                if lt.is_numeric() && rt.is_numeric() {
                    self.widen_numeric(expr, lhs, &lt, rhs, &rt);
                    return Type::BOOL;
                }
                if lt.equals(&Type::STR) && rt.equals(&Type::STR) {
                    return Type::BOOL;
                }
                self.report_binary_mismatch(op, &lt, &rt, span)
            }
        }
    }

    /// Operators never apply to type descriptions.
    fn reject_meta(&mut self, lt: &Type, rt: &Type, span: Span) -> bool {
        if matches!(lt, Type::Meta(_)) || matches!(rt, Type::Meta(_)) {
            self.report(span, DiagKind::MetaTypeExpr);
            true
        } else {
            false
        }
    }

    /// Insert an `int → float` cast on whichever numeric side needs it;
    /// returns the widened result type.
    fn widen_numeric(
        &mut self,
        expr: ExprId,
        lhs: ExprId,
        lt: &Type,
        rhs: ExprId,
        rt: &Type,
    ) -> Type {
        if lt.equals(rt) {
            return lt.clone();
        }
        if self.probe == 0 {
            if lt.equals(&Type::INT) {
                let cast = self.insert_cast(lhs, Type::FLOAT);
                self.ast.replace_expr_child(expr, lhs, cast);
            } else {
                let cast = self.insert_cast(rhs, Type::FLOAT);
                self.ast.replace_expr_child(expr, rhs, cast);
            }
        }
        Type::FLOAT
    }

    fn report_binary_mismatch(&mut self, op: BinaryOp, lt: &Type, rt: &Type, span: Span) -> Type {
        let lhs = self.display(lt);
        let rhs = self.display(rt);
        self.report(
            span,
            DiagKind::BinaryOpNotFound {
                op: op.symbol(),
                lhs,
                rhs,
            },
        );
        Type::Error
    }

    fn visit_list(
        &mut self,
        expr: ExprId,
        items: &[ExprId],
        span: Span,
        ctx_target: Option<Type>,
    ) -> Type {
        let target = ctx_target.map(|t| t.unwrap_nullable().clone());
        match target {
            Some(Type::List(Some(item))) => {
                for &it in items {
                    self.ctx_target = Some((*item).clone());
                    self.visit_expr(it);
                    self.coerce_in_expr(expr, it, &item);
                }
                Type::List(Some(item))
            }
            Some(Type::Error) => {
                for &it in items {
                    self.visit_expr(it);
                }
                Type::Error
            }
            _ => {
                for &it in items {
                    self.visit_expr(it);
                }
                self.report(span, DiagKind::NoListContext);
                Type::Error
            }
        }
    }

    fn visit_param(&mut self, base: ExprId, args: &[ExprId], span: Span) -> Type {
        let base_ty = self.visit_expr(base);
        let arg_types: Vec<Type> = args.iter().map(|&a| self.visit_expr(a)).collect();
        if base_ty.is_error() {
            return Type::Error;
        }
        match base_ty {
            Type::Meta(inner) => match *inner {
                Type::List(None) => {
                    if args.len() != 1 {
                        self.report(span, DiagKind::BadTypeParamCount { ty: "list".into() });
                        return Type::Error;
                    }
                    match self.instance_arg(args[0], &arg_types[0], false) {
                        Some(item) => Type::Meta(Box::new(Type::List(Some(Box::new(item))))),
                        None => Type::Error,
                    }
                }
                Type::Func { ret: None, .. } => {
                    if args.is_empty() {
                        self.report(span, DiagKind::BadTypeParamCount { ty: "function".into() });
                        return Type::Error;
                    }
                    let Some(ret) = self.instance_arg(args[0], &arg_types[0], true) else {
                        return Type::Error;
                    };
                    let mut params = Vec::with_capacity(args.len() - 1);
                    for (&a, t) in args[1..].iter().zip(&arg_types[1..]) {
                        match self.instance_arg(a, t, false) {
                            Some(param) => params.push(param),
                            None => return Type::Error,
                        }
                    }
                    Type::Meta(Box::new(Type::Func {
                        ret: Some(Box::new(ret)),
                        args: params,
                    }))
                }
                other => {
                    let shown = self.display(&other);
                    self.report(span, DiagKind::BadTypeParamCount { ty: shown });
                    Type::Error
                }
            },
            other => {
                let shown = self.display(&other);
                self.report(span, DiagKind::BadTypeParamCount { ty: shown });
                Type::Error
            }
        }
    }

    /// A type argument must itself be a usable meta-type.
    fn instance_arg(&mut self, expr: ExprId, ty: &Type, allow_void: bool) -> Option<Type> {
        let span = self.ast.expr(expr).span;
        if ty.is_error() {
            return None;
        }
        match ty {
            Type::Meta(inner) => {
                if matches!(**inner, Type::Void) {
                    if allow_void {
                        return Some(Type::Void);
                    }
                    self.report(span, DiagKind::NotUseableType { ty: "void".into() });
                    return None;
                }
                if inner.has_free_params() {
                    let shown = self.display(inner);
                    self.report(span, DiagKind::NotUseableType { ty: shown });
                    return None;
                }
                Some((**inner).clone())
            }
            other => {
                let shown = self.display(other);
                self.report(span, DiagKind::NotUseableType { ty: shown });
                None
            }
        }
    }

    fn visit_cast(&mut self, value: ExprId, tex: ExprId, span: Span) -> Type {
        let vt = self.visit_expr(value);
        let target = self.eval_declared_type(tex, false);
        self.set_type(tex, Type::Meta(Box::new(target.clone())));
        if vt.is_error() || target.is_error() {
            return Type::Error;
        }
        let valid = vt.equals(&target)
            || vt.converts_to(&target)
            || (vt.is_numeric() && target.is_numeric());
        if !valid {
            let from = self.display(&vt);
            let to = self.display(&target);
            self.report(span, DiagKind::InvalidCast { from, to });
            return Type::Error;
        }
        target
    }

    fn visit_index(&mut self, obj: ExprId, index: ExprId, span: Span) -> Type {
        let ot = self.visit_expr(obj);
        let it = self.visit_expr(index);
        if ot.is_error() {
            return Type::Error;
        }
        match ot {
            Type::List(Some(item)) => {
                if !it.is_error() && !it.equals(&Type::INT) {
                    let found = self.display(&it);
                    let index_span = self.ast.expr(index).span;
                    self.report(
                        index_span,
                        DiagKind::TypeMismatch {
                            expected: "int".into(),
                            found,
                        },
                    );
                }
                *item
            }
            other => {
                let found = self.display(&other);
                self.report(
                    span,
                    DiagKind::TypeMismatch {
                        expected: "list".into(),
                        found,
                    },
                );
                Type::Error
            }
        }
    }

    fn visit_nullable(&mut self, operand: ExprId, span: Span) -> Type {
        let ty = self.visit_expr(operand);
        if ty.is_error() {
            return Type::Error;
        }
        match ty {
            Type::Meta(inner) => {
                if matches!(*inner, Type::Nullable(_) | Type::Void | Type::Null) {
                    let shown = self.display(&inner);
                    self.report(span, DiagKind::BadNullableType { ty: shown });
                    Type::Error
                } else {
                    Type::Meta(Box::new(Type::Nullable(inner)))
                }
            }
            other => {
                let shown = self.display(&other);
                self.report(span, DiagKind::BadNullableType { ty: shown });
                Type::Error
            }
        }
    }
}

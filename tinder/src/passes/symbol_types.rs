//! Declared-type resolution.
//!
//! Fills `symbol.ty` for every variable and function declaration by
//! evaluating the written type expressions (never bodies or initializers).
//! The evaluation itself is the type checker's; this pass just drives it
//! over declarations so signatures exist before any body is typed.

use tinder_parser::ast::Ast;
use tinder_parser::Module;

use crate::diag::Log;
use crate::passes::compute_types::TypeChecker;
use crate::sema::Sema;

pub fn run(ast: &mut Ast, module: &Module, sema: &mut Sema, log: &mut Log) {
    let mut checker = TypeChecker::new(ast, module, sema, log);
    checker.resolve_declarations(module);
}

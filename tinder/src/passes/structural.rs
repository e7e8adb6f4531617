//! Structural checks.
//!
//! Post-parse placement rules that depend only on syntactic kinds and the
//! lexical context: which statements may appear where, where initializers
//! are forbidden, and which functions must (not) have bodies.

use tinder_parser::ast::{Ast, StmtKind};
use tinder_parser::{Module, StmtId};

use crate::diag::{DiagKind, Log};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Place {
    Module,
    Class,
    External,
    Func,
}

impl Place {
    fn describe(self) -> &'static str {
        match self {
            Place::Module => "at module scope",
            Place::Class => "in a class body",
            Place::External => "in an external block",
            Place::Func => "in a function body",
        }
    }
}

struct Checker<'a> {
    ast: &'a Ast,
    log: &'a mut Log,
}

pub fn run(ast: &Ast, module: &Module, log: &mut Log) {
    let mut checker = Checker { ast, log };
    checker.check_block(module.block, Place::Module, false);
}

impl<'a> Checker<'a> {
    fn check_block(&mut self, block: StmtId, place: Place, in_external: bool) {
        let stmts = match &self.ast.stmt(block).kind {
            StmtKind::Block { stmts } => stmts.clone(),
            _ => return,
        };
        for stmt in stmts {
            self.check_stmt(stmt, place, in_external);
        }
    }

    fn check_stmt(&mut self, stmt: StmtId, place: Place, in_external: bool) {
        let span = self.ast.stmt(stmt).span;
        match &self.ast.stmt(stmt).kind {
            StmtKind::External { body } => {
                let body = *body;
                if place != Place::Module {
                    self.log.report(
                        Some(span),
                        DiagKind::StmtNotAllowed {
                            place: place.describe(),
                        },
                    );
                }
                self.check_block(body, Place::External, true);
            }
            StmtKind::Class(class) => {
                let body = class.body;
                if place == Place::Func {
                    self.log.report(
                        Some(span),
                        DiagKind::StmtNotAllowed {
                            place: place.describe(),
                        },
                    );
                }
                self.check_block(body, Place::Class, in_external);
            }
            StmtKind::Var(def) => {
                let forbidden = place == Place::Module || in_external;
                if forbidden && def.init.is_some() {
                    self.log
                        .report(Some(span), DiagKind::InitializerNotAllowed {
                            place: if in_external {
                                Place::External.describe()
                            } else {
                                place.describe()
                            },
                        });
                }
            }
            StmtKind::Func(def) => {
                let args = def.args.clone();
                let body = def.body;
                if place == Place::Func {
                    self.log.report(
                        Some(span),
                        DiagKind::StmtNotAllowed {
                            place: place.describe(),
                        },
                    );
                }
                for arg in args {
                    if let StmtKind::Var(arg_def) = &self.ast.stmt(arg).kind {
                        if arg_def.init.is_some() {
                            let arg_span = self.ast.stmt(arg).span;
                            self.log
                                .report(Some(arg_span), DiagKind::DefaultArgNotAllowed);
                        }
                    }
                }
                if in_external && body.is_some() {
                    self.log
                        .report(Some(span), DiagKind::FunctionBody { in_external: true });
                }
                if !in_external && body.is_none() {
                    self.log
                        .report(Some(span), DiagKind::FunctionBody { in_external: false });
                }
                if let Some(body) = body {
                    self.check_block(body, Place::Func, in_external);
                }
            }
            StmtKind::If {
                then_block,
                else_block,
                ..
            } => {
                let (then_block, else_block) = (*then_block, *else_block);
                if place != Place::Func {
                    self.log.report(
                        Some(span),
                        DiagKind::StmtNotAllowed {
                            place: place.describe(),
                        },
                    );
                }
                self.check_block(then_block, Place::Func, in_external);
                if let Some(else_block) = else_block {
                    // Either a block or a collapsed `else if`.
                    match self.ast.stmt(else_block).kind {
                        StmtKind::Block { .. } => {
                            self.check_block(else_block, Place::Func, in_external)
                        }
                        _ => self.check_stmt(else_block, Place::Func, in_external),
                    }
                }
            }
            StmtKind::While { body, .. } => {
                let body = *body;
                if place != Place::Func {
                    self.log.report(
                        Some(span),
                        DiagKind::StmtNotAllowed {
                            place: place.describe(),
                        },
                    );
                }
                self.check_block(body, Place::Func, in_external);
            }
            StmtKind::Return { .. } | StmtKind::Expr { .. } => {
                if place != Place::Func {
                    self.log.report(
                        Some(span),
                        DiagKind::StmtNotAllowed {
                            place: place.describe(),
                        },
                    );
                }
            }
            StmtKind::Block { .. } => {
                self.check_block(stmt, place, in_external);
            }
        }
    }
}

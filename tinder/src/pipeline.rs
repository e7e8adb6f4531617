//! Compilation driver.
//!
//! Runs the front-end and the semantic passes in order. Each pass is
//! skipped once an earlier pass has produced errors; the module is handed
//! to callers only when the whole pipeline stayed error-free. Warnings
//! never suppress output.

use tinder_parser::ast::Ast;
use tinder_parser::{brackets, lexer, parser, Module, SourceMap};

use crate::diag::{Diagnostic, Log};
use crate::passes::{compute_types, default_init, define_symbols, structural, symbol_types};
use crate::sema::Sema;
use crate::flow;

/// Everything one compilation produced. The tree and side tables are
/// returned even when compilation failed, so embedders can inspect what
/// was built; `module` is present iff there were no errors.
#[derive(Debug)]
pub struct Compilation {
    pub file: String,
    pub ast: Ast,
    pub module: Option<Module>,
    pub sema: Sema,
    pub diagnostics: Vec<Diagnostic>,
}

impl Compilation {
    /// Diagnostics rendered as `<file>:<line>:<column>: <severity>: <text>`.
    pub fn render_diagnostics(&self) -> Vec<String> {
        self.diagnostics
            .iter()
            .map(|d| d.render(&self.file))
            .collect()
    }
}

/// Compile a source text.
pub fn compile(file_name: &str, source: &str) -> Compilation {
    let mut log = Log::new(file_name);
    let map = SourceMap::new(source);

    let lexed = match lexer::tokenize(source) {
        Ok(lexed) => lexed,
        Err(fatal) => {
            log.push_error(Some(fatal.span()), fatal.to_string());
            return Compilation {
                file: file_name.to_string(),
                ast: Ast::new(),
                module: None,
                sema: Sema::new(),
                diagnostics: log.take(),
            };
        }
    };
    for warning in &lexed.warnings {
        log.push_warning(Some(warning.span), warning.message.clone());
    }

    let tokens = brackets::disambiguate(lexed.tokens, &map);
    let (mut ast, module, parse_errors) = parser::parse(tokens);
    for error in parse_errors {
        log.push_error(Some(error.span()), error.to_string());
    }

    let mut sema = Sema::new();
    let ok = !log.has_errors()
        && {
            structural::run(&ast, &module, &mut log);
            !log.has_errors()
        }
        && {
            define_symbols::run(&ast, &module, &mut sema, &mut log);
            !log.has_errors()
        }
        && {
            symbol_types::run(&mut ast, &module, &mut sema, &mut log);
            !log.has_errors()
        }
        && {
            compute_types::run(&mut ast, &module, &mut sema, &mut log);
            !log.has_errors()
        }
        && {
            default_init::run(&mut ast, &module, &mut sema);
            flow::run(&ast, &module, &mut sema, &mut log);
            !log.has_errors()
        };

    Compilation {
        file: file_name.to_string(),
        ast,
        module: ok.then_some(module),
        sema,
        diagnostics: log.take(),
    }
}

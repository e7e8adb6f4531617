//! Symbol renaming for emitters.
//!
//! Runs after compilation, once per emitter. Symbols whose written name
//! collides with the target's reserved words get `_` prepended until the
//! name is free; on targets that cannot represent overloading, each
//! overload is mangled by appending capitalized fragments of its argument
//! types' printed forms. Renaming only touches `final_name` and is undone
//! with [`reset`], so successive emitters start from pristine names.

use std::collections::HashSet;

use once_cell::sync::Lazy;
use tinder_parser::ast::{Ast, StmtKind};

use crate::scope::{SymbolId, SymbolKind};
use crate::sema::Sema;
use crate::types::{Prim, Type};

/// Reserved words of the dynamic (prototype-classes) target.
static DYNAMIC_RESERVED: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        "abstract", "arguments", "break", "case", "catch", "class", "const", "continue",
        "debugger", "default", "delete", "do", "else", "enum", "export", "extends", "false",
        "finally", "for", "function", "if", "implements", "import", "in", "instanceof", "let",
        "new", "null", "package", "private", "protected", "prototype", "public", "return",
        "static", "super", "switch", "this", "throw", "true", "try", "typeof", "undefined",
        "var", "void", "while", "with", "yield",
    ]
    .into_iter()
    .collect()
});

/// Reserved words of the systems (value/pointer) target.
static SYSTEMS_RESERVED: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        "auto", "bool", "break", "case", "catch", "char", "class", "const", "continue",
        "default", "delete", "do", "double", "else", "enum", "explicit", "extern", "false",
        "float", "for", "friend", "goto", "if", "inline", "int", "long", "namespace", "new",
        "nullptr", "operator", "private", "protected", "public", "return", "short", "signed",
        "sizeof", "static", "struct", "switch", "template", "this", "throw", "true", "try",
        "typedef", "typename", "union", "unsigned", "using", "virtual", "void", "while",
    ]
    .into_iter()
    .collect()
});

/// Per-target rename policy.
#[derive(Debug, Clone, Copy)]
pub struct RenameOptions {
    pub reserved: &'static Lazy<HashSet<&'static str>>,
    /// Whether overload sets must be flattened to distinct names.
    pub mangle_overloads: bool,
}

impl RenameOptions {
    /// The dynamic target cannot represent overloading.
    pub fn dynamic_target() -> Self {
        Self {
            reserved: &DYNAMIC_RESERVED,
            mangle_overloads: true,
        }
    }

    /// The systems target keeps overloads as-is.
    pub fn systems_target() -> Self {
        Self {
            reserved: &SYSTEMS_RESERVED,
            mangle_overloads: false,
        }
    }
}

/// Rewrite `final_name` for every clashing symbol.
pub fn rename_symbols(ast: &Ast, sema: &mut Sema, options: &RenameOptions) {
    for scope_id in sema.table.scope_ids().collect::<Vec<_>>() {
        let entries: Vec<(String, SymbolId)> = sema
            .table
            .scope(scope_id)
            .map
            .iter()
            .map(|(name, &sym)| (name.clone(), sym))
            .collect();
        let mut taken: HashSet<String> = entries.iter().map(|(name, _)| name.clone()).collect();

        for (name, sym) in entries {
            let kind = sema.table.symbol(sym).kind;
            if kind == SymbolKind::OverloadedFunc && options.mangle_overloads {
                let members = match &sema.table.symbol(sym).ty {
                    Type::Overloaded(members) => members.clone(),
                    _ => continue,
                };
                for member in members {
                    let mangled = format!("{}{}", name, mangle_args(ast, sema, member));
                    let unique = free_name(mangled, options, &taken);
                    taken.insert(unique.clone());
                    sema.table.symbol_mut(member).final_name = unique;
                }
                continue;
            }

            if options.reserved.contains(name.as_str()) {
                let unique = free_name(name, options, &taken);
                taken.insert(unique.clone());
                sema.table.symbol_mut(sym).final_name = unique;
            }
        }
    }
}

/// Restore every `final_name` to the written name.
pub fn reset(sema: &mut Sema) {
    sema.table.reset_final_names();
}

/// Prepend `_` until the candidate clashes with nothing.
fn free_name(candidate: String, options: &RenameOptions, taken: &HashSet<String>) -> String {
    let mut candidate = candidate;
    while options.reserved.contains(candidate.as_str()) || taken.contains(&candidate) {
        candidate.insert(0, '_');
    }
    candidate
}

fn mangle_args(ast: &Ast, sema: &Sema, member: SymbolId) -> String {
    match &sema.table.symbol(member).ty {
        Type::Func { args, .. } => args.iter().map(|a| fragment(ast, a)).collect(),
        _ => String::new(),
    }
}

/// A capitalized, identifier-safe fragment of a type's printed form.
fn fragment(ast: &Ast, ty: &Type) -> String {
    match ty {
        Type::Void => "Void".to_string(),
        Type::Prim(Prim::Bool) => "Bool".to_string(),
        Type::Prim(Prim::Int) => "Int".to_string(),
        Type::Prim(Prim::Float) => "Float".to_string(),
        Type::Prim(Prim::Str) => "String".to_string(),
        Type::List(item) => match item {
            Some(item) => format!("List{}", fragment(ast, item)),
            None => "List".to_string(),
        },
        Type::Func { ret, args } => {
            let mut out = "Function".to_string();
            if let Some(ret) = ret {
                out.push_str(&fragment(ast, ret));
            }
            for arg in args {
                out.push_str(&fragment(ast, arg));
            }
            out
        }
        Type::Class(def) => {
            let name = match &ast.stmt(*def).kind {
                StmtKind::Class(class) => class.name.clone(),
                _ => String::new(),
            };
            let mut chars = name.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
                None => String::new(),
            }
        }
        Type::Nullable(inner) => format!("Nullable{}", fragment(ast, inner)),
        Type::Meta(_) | Type::Overloaded(_) | Type::Null | Type::Error => String::new(),
    }
}

//! Scopes and symbols.
//!
//! Symbols are owned by a single arena and referenced from the AST side
//! tables through [`SymbolId`] handles; symbol equality is handle
//! identity. Scopes form a parent-linked tree with one name map each.

use std::collections::BTreeMap;

use tinder_parser::StmtId;

use crate::types::Type;

/// Handle into the symbol arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SymbolId(pub u32);

/// Handle into the scope arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ScopeId(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SymbolKind {
    Variable,
    Func,
    Class,
    /// Synthetic symbol holding two or more same-name functions.
    OverloadedFunc,
}

#[derive(Debug, Clone)]
pub struct Symbol {
    pub kind: SymbolKind,
    pub is_static: bool,
    /// The defining statement; absent for overload sets.
    pub def: Option<StmtId>,
    pub ty: Type,
    pub name: String,
    /// Starts equal to `name`; rewritten by the rename pass.
    pub final_name: String,
}

impl Symbol {
    pub fn new(kind: SymbolKind, is_static: bool, def: Option<StmtId>, name: &str) -> Self {
        Self {
            kind,
            is_static,
            def,
            ty: Type::Error,
            name: name.to_string(),
            final_name: name.to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScopeKind {
    Module,
    Class,
    Func,
    Local,
}

#[derive(Debug)]
pub struct Scope {
    pub parent: Option<ScopeId>,
    pub kind: ScopeKind,
    pub map: BTreeMap<String, SymbolId>,
}

/// How a name lookup walks the scope tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LookupMode {
    /// Walk all parents.
    Any,
    /// Walk parents but skip class scopes: class members are not visible
    /// by bare name inside methods.
    Normal,
    /// This (class) scope only, static symbols.
    StaticMember,
    /// This (class) scope only, instance symbols.
    InstanceMember,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DefineError {
    Redefinition,
    /// A function overload that flips the `static` modifier.
    ChangedModifier,
}

/// Owner of all scopes and symbols for one compilation.
#[derive(Debug, Default)]
pub struct SymbolTable {
    scopes: Vec<Scope>,
    symbols: Vec<Symbol>,
}

impl SymbolTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn new_scope(&mut self, parent: Option<ScopeId>, kind: ScopeKind) -> ScopeId {
        let id = ScopeId(self.scopes.len() as u32);
        self.scopes.push(Scope {
            parent,
            kind,
            map: BTreeMap::new(),
        });
        id
    }

    pub fn scope(&self, id: ScopeId) -> &Scope {
        &self.scopes[id.0 as usize]
    }

    pub fn symbol(&self, id: SymbolId) -> &Symbol {
        &self.symbols[id.0 as usize]
    }

    pub fn symbol_mut(&mut self, id: SymbolId) -> &mut Symbol {
        &mut self.symbols[id.0 as usize]
    }

    pub fn scope_ids(&self) -> impl Iterator<Item = ScopeId> {
        (0..self.scopes.len() as u32).map(ScopeId)
    }

    pub fn symbol_ids(&self) -> impl Iterator<Item = SymbolId> {
        (0..self.symbols.len() as u32).map(SymbolId)
    }

    fn alloc_symbol(&mut self, symbol: Symbol) -> SymbolId {
        let id = SymbolId(self.symbols.len() as u32);
        self.symbols.push(symbol);
        id
    }

    /// Define a symbol in a scope.
    ///
    /// Defining over an existing name is a redefinition error, unless both
    /// the old and new symbols are functions with the same `static`
    /// modifier; then the entry is promoted to an overload set.
    pub fn define(&mut self, scope: ScopeId, symbol: Symbol) -> Result<SymbolId, DefineError> {
        let name = symbol.name.clone();
        let Some(&existing) = self.scopes[scope.0 as usize].map.get(&name) else {
            let id = self.alloc_symbol(symbol);
            self.scopes[scope.0 as usize].map.insert(name, id);
            return Ok(id);
        };

        let existing_kind = self.symbol(existing).kind;
        let existing_static = self.symbol(existing).is_static;
        if symbol.kind != SymbolKind::Func
            || !matches!(existing_kind, SymbolKind::Func | SymbolKind::OverloadedFunc)
        {
            return Err(DefineError::Redefinition);
        }
        if existing_static != symbol.is_static {
            return Err(DefineError::ChangedModifier);
        }

        let is_static = symbol.is_static;
        let new_id = self.alloc_symbol(symbol);
        match existing_kind {
            SymbolKind::Func => {
                let mut set = Symbol::new(SymbolKind::OverloadedFunc, is_static, None, &name);
                set.ty = Type::Overloaded(vec![existing, new_id]);
                let set_id = self.alloc_symbol(set);
                self.scopes[scope.0 as usize].map.insert(name, set_id);
            }
            SymbolKind::OverloadedFunc => {
                if let Type::Overloaded(members) = &mut self.symbol_mut(existing).ty {
                    members.push(new_id);
                }
            }
            _ => unreachable!(),
        }
        Ok(new_id)
    }

    /// Look up a name, returning the symbol and the scope it was found in.
    pub fn lookup(
        &self,
        from: ScopeId,
        name: &str,
        mode: LookupMode,
    ) -> Option<(SymbolId, ScopeId)> {
        match mode {
            LookupMode::Any | LookupMode::Normal => {
                let mut current = Some(from);
                while let Some(id) = current {
                    let scope = self.scope(id);
                    let skip = mode == LookupMode::Normal && scope.kind == ScopeKind::Class;
                    if !skip {
                        if let Some(&sym) = scope.map.get(name) {
                            return Some((sym, id));
                        }
                    }
                    current = scope.parent;
                }
                None
            }
            LookupMode::StaticMember | LookupMode::InstanceMember => {
                let want_static = mode == LookupMode::StaticMember;
                let sym = *self.scope(from).map.get(name)?;
                (self.symbol(sym).is_static == want_static).then_some((sym, from))
            }
        }
    }

    /// Restore every symbol's `final_name` to its written name (undoes the
    /// rename pass).
    pub fn reset_final_names(&mut self) {
        for symbol in &mut self.symbols {
            symbol.final_name = symbol.name.clone();
        }
    }
}

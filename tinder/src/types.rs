//! The Tinder type model.
//!
//! A closed variant set with structural equality. Two deliberate quirks
//! keep diagnostics honest: the error type compares unequal to everything
//! (including itself), which is why this module exposes [`Type::equals`]
//! instead of deriving `PartialEq`; and nullable types never nest, so
//! wrapping a nullable is the identity.

use tinder_parser::ast::{Ast, StmtKind};
use tinder_parser::StmtId;

use crate::scope::SymbolId;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Prim {
    Bool,
    Int,
    Float,
    Str,
}

#[derive(Debug, Clone)]
pub enum Type {
    Void,
    Prim(Prim),
    /// `list`, or `list<T>` once instantiated. An absent item type means
    /// the free generic constructor, which may only appear under `Param`.
    List(Option<Box<Type>>),
    /// `function`, or `function<R, A...>` once instantiated.
    Func {
        ret: Option<Box<Type>>,
        args: Vec<Type>,
    },
    /// An instance of a user class; points back at its `ClassDef`.
    Class(StmtId),
    /// The type of a type expression.
    Meta(Box<Type>),
    /// An unresolved overload set (the member function symbols).
    Overloaded(Vec<SymbolId>),
    /// The type of the `null` literal.
    Null,
    Nullable(Box<Type>),
    /// Propagating error; silently swallowed by diagnostics.
    Error,
}

impl Type {
    pub const BOOL: Type = Type::Prim(Prim::Bool);
    pub const INT: Type = Type::Prim(Prim::Int);
    pub const FLOAT: Type = Type::Prim(Prim::Float);
    pub const STR: Type = Type::Prim(Prim::Str);

    /// Structural equality. The error type equals nothing, not even itself.
    pub fn equals(&self, other: &Type) -> bool {
        match (self, other) {
            (Type::Void, Type::Void) => true,
            (Type::Prim(a), Type::Prim(b)) => a == b,
            (Type::List(a), Type::List(b)) => match (a, b) {
                (None, None) => true,
                (Some(a), Some(b)) => a.equals(b),
                _ => false,
            },
            (
                Type::Func { ret: r1, args: a1 },
                Type::Func { ret: r2, args: a2 },
            ) => {
                let rets = match (r1, r2) {
                    (None, None) => true,
                    (Some(r1), Some(r2)) => r1.equals(r2),
                    _ => false,
                };
                rets && a1.len() == a2.len()
                    && a1.iter().zip(a2.iter()).all(|(x, y)| x.equals(y))
            }
            (Type::Class(a), Type::Class(b)) => a == b,
            (Type::Meta(a), Type::Meta(b)) => a.equals(b),
            (Type::Overloaded(a), Type::Overloaded(b)) => a == b,
            (Type::Null, Type::Null) => true,
            (Type::Nullable(a), Type::Nullable(b)) => a.equals(b),
            _ => false,
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Type::Error)
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self, Type::Prim(Prim::Int) | Type::Prim(Prim::Float))
    }

    pub fn is_nullable(&self) -> bool {
        matches!(self, Type::Nullable(_))
    }

    /// Wrap in a nullable; wrapping a nullable yields the same nullable.
    pub fn nullable(self) -> Type {
        match self {
            Type::Nullable(_) => self,
            other => Type::Nullable(Box::new(other)),
        }
    }

    /// The wrapped type of a nullable, or the type itself.
    pub fn unwrap_nullable(&self) -> &Type {
        match self {
            Type::Nullable(inner) => inner,
            other => other,
        }
    }

    /// Whether a type still contains a free `list` or `function` parameter.
    pub fn has_free_params(&self) -> bool {
        match self {
            Type::List(None) => true,
            Type::List(Some(item)) => item.has_free_params(),
            Type::Func { ret: None, .. } => true,
            Type::Func { ret: Some(ret), args } => {
                ret.has_free_params() || args.iter().any(Type::has_free_params)
            }
            Type::Meta(inner) => inner.has_free_params(),
            Type::Nullable(inner) => inner.has_free_params(),
            _ => false,
        }
    }

    /// Whether a value of this type can exist (usable as a variable or
    /// argument type).
    pub fn is_instantiable(&self) -> bool {
        !matches!(
            self,
            Type::Void | Type::Meta(_) | Type::Overloaded(_) | Type::Null | Type::Error
        ) && !self.has_free_params()
    }

    /// The implicit-convertibility relation: `int → float`, `T → T?` for
    /// non-nullable `T`, `null → T?`, and the transitive closure through
    /// the nullable unwrap on either side. Unwrapping the source (`T? → T`)
    /// is what lets a nullable flow into a non-nullable slot; the inserted
    /// cast is the dereference the flow analyzer later judges. Not
    /// reflexive; equality is checked separately.
    pub fn converts_to(&self, to: &Type) -> bool {
        match (self, to) {
            (Type::Prim(Prim::Int), Type::Prim(Prim::Float)) => true,
            (Type::Null, Type::Nullable(_)) => true,
            (Type::Nullable(inner), to) => inner.equals(to) || inner.converts_to(to),
            (from, Type::Nullable(inner)) => from.equals(inner) || from.converts_to(inner),
            _ => false,
        }
    }

    /// Render for diagnostics; class names come from the tree.
    pub fn display(&self, ast: &Ast) -> String {
        match self {
            Type::Void => "void".to_string(),
            Type::Prim(Prim::Bool) => "bool".to_string(),
            Type::Prim(Prim::Int) => "int".to_string(),
            Type::Prim(Prim::Float) => "float".to_string(),
            Type::Prim(Prim::Str) => "string".to_string(),
            Type::List(None) => "list".to_string(),
            Type::List(Some(item)) => format!("list<{}>", item.display(ast)),
            Type::Func { ret: None, .. } => "function".to_string(),
            Type::Func { ret: Some(ret), args } => {
                let mut parts = vec![ret.display(ast)];
                parts.extend(args.iter().map(|a| a.display(ast)));
                format!("function<{}>", parts.join(", "))
            }
            Type::Class(def) => class_name(ast, *def),
            Type::Meta(inner) => inner.display(ast),
            Type::Overloaded(_) => "(overloaded function)".to_string(),
            Type::Null => "null".to_string(),
            Type::Nullable(inner) => format!("{}?", inner.display(ast)),
            Type::Error => "<error>".to_string(),
        }
    }
}

fn class_name(ast: &Ast, def: StmtId) -> String {
    match &ast.stmt(def).kind {
        StmtKind::Class(class) => class.name.clone(),
        _ => "<class>".to_string(),
    }
}

/// Render an argument-type tuple like `(int, float)` for call diagnostics.
pub fn display_arg_types(args: &[Type], ast: &Ast) -> String {
    let rendered: Vec<_> = args.iter().map(|a| a.display(ast)).collect();
    format!("({})", rendered.join(", "))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_equals_nothing() {
        assert!(!Type::Error.equals(&Type::Error));
        assert!(!Type::Error.equals(&Type::INT));
        assert!(Type::INT.equals(&Type::INT));
    }

    #[test]
    fn test_null_equals_only_itself() {
        assert!(Type::Null.equals(&Type::Null));
        assert!(!Type::Null.equals(&Type::INT.nullable()));
    }

    #[test]
    fn test_nullable_never_nests() {
        let once = Type::INT.nullable();
        let twice = once.clone().nullable();
        assert!(once.equals(&twice));
    }

    #[test]
    fn test_conversions() {
        assert!(Type::INT.converts_to(&Type::FLOAT));
        assert!(!Type::FLOAT.converts_to(&Type::INT));
        assert!(Type::INT.converts_to(&Type::INT.nullable()));
        assert!(Type::Null.converts_to(&Type::INT.nullable()));
        // Transitive through the nullable unwrap, both directions:
        assert!(Type::INT.converts_to(&Type::FLOAT.nullable()));
        assert!(Type::INT.nullable().converts_to(&Type::INT));
        assert!(Type::INT.nullable().converts_to(&Type::FLOAT.nullable()));
        // `null` never reaches a non-nullable slot implicitly.
        assert!(!Type::Null.converts_to(&Type::INT));
        // Not reflexive by construction.
        assert!(!Type::INT.converts_to(&Type::INT));
    }

    #[test]
    fn test_free_params() {
        assert!(Type::List(None).has_free_params());
        assert!(!Type::List(Some(Box::new(Type::INT))).has_free_params());
        assert!(Type::Func { ret: None, args: vec![] }.has_free_params());
        assert!(!Type::List(None).is_instantiable());
    }

    #[test]
    fn test_display() {
        let ast = Ast::new();
        assert_eq!(Type::INT.nullable().display(&ast), "int?");
        assert_eq!(
            Type::List(Some(Box::new(Type::INT))).display(&ast),
            "list<int>"
        );
        assert_eq!(
            Type::Func {
                ret: Some(Box::new(Type::Void)),
                args: vec![Type::INT],
            }
            .display(&ast),
            "function<void, int>"
        );
        assert_eq!(display_arg_types(&[Type::BOOL], &ast), "(bool)");
    }
}

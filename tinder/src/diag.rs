//! Diagnostics log.
//!
//! Passes never unwind through the driver: every problem becomes a
//! [`Diagnostic`] appended to the [`Log`], and the driver checks the error
//! count between passes. The log can be suspended while the type pass
//! peeks at a callee, so the probing visit stays silent.

use std::fmt;

use serde::{Deserialize, Serialize};
use tinder_parser::Span;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Warning,
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Warning => write!(f, "warning"),
            Severity::Error => write!(f, "error"),
        }
    }
}

/// Every diagnostic the compiler can produce.
///
/// Variants carry pre-rendered type names so the log needs no access to
/// the tree.
#[derive(Debug, Clone, PartialEq)]
pub enum DiagKind {
    Redefinition { name: String },
    StmtNotAllowed { place: &'static str },
    InitializerNotAllowed { place: &'static str },
    DefaultArgNotAllowed,
    FunctionBody { in_external: bool },
    UndefinedSymbol { name: String },
    NotUseableType { ty: String },
    BadNullableType { ty: String },
    TypeMismatch { expected: String, found: String },
    UnaryOpNotFound { op: &'static str, ty: String },
    BinaryOpNotFound { op: &'static str, lhs: String, rhs: String },
    InvalidCast { from: String, to: String },
    BadSafeDereference,
    BadMemberAccess { ty: String },
    CallNotFound { name: String, args: String },
    MultipleOverloadsFound { name: String, args: String },
    BadThis,
    VoidReturn { should_be_void: bool },
    NotAllPathsReturnValue,
    UseBeforeDefinition { name: String },
    OverloadChangedModifier { name: String },
    NoOverloadContext { name: String },
    NoListContext,
    MetaTypeExpr,
    BadTypeParamCount { ty: String },
    BadKeyword { keyword: String },
    DeadCode,
    NullDereference { name: Option<String> },
    NullableDereference { name: Option<String> },
}

impl DiagKind {
    pub fn severity(&self) -> Severity {
        match self {
            DiagKind::DeadCode
            | DiagKind::NullDereference { .. }
            | DiagKind::NullableDereference { .. } => Severity::Warning,
            _ => Severity::Error,
        }
    }
}

impl fmt::Display for DiagKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DiagKind::Redefinition { name } => write!(f, "redefinition of \"{name}\""),
            DiagKind::StmtNotAllowed { place } => {
                write!(f, "statement not allowed {place}")
            }
            DiagKind::InitializerNotAllowed { place } => {
                write!(f, "variable initializer not allowed {place}")
            }
            DiagKind::DefaultArgNotAllowed => {
                write!(f, "function arguments cannot have default values")
            }
            DiagKind::FunctionBody { in_external: true } => {
                write!(f, "a function inside \"external\" cannot have a body")
            }
            DiagKind::FunctionBody { in_external: false } => {
                write!(f, "function must have a body")
            }
            DiagKind::UndefinedSymbol { name } => write!(f, "undefined symbol \"{name}\""),
            DiagKind::NotUseableType { ty } => {
                write!(f, "type \"{ty}\" cannot be used here")
            }
            DiagKind::BadNullableType { ty } => {
                write!(f, "type \"{ty}\" cannot be made nullable")
            }
            DiagKind::TypeMismatch { expected, found } => {
                write!(f, "type mismatch: expected \"{expected}\" but found \"{found}\"")
            }
            DiagKind::UnaryOpNotFound { op, ty } => {
                write!(f, "cannot apply operator \"{op}\" to \"{ty}\"")
            }
            DiagKind::BinaryOpNotFound { op, lhs, rhs } => {
                write!(f, "cannot apply operator \"{op}\" to \"{lhs}\" and \"{rhs}\"")
            }
            DiagKind::InvalidCast { from, to } => {
                write!(f, "cannot cast \"{from}\" to \"{to}\"")
            }
            DiagKind::BadSafeDereference => {
                write!(f, "\"?.\" applied to a value that is never null")
            }
            DiagKind::BadMemberAccess { ty } => {
                write!(f, "value of type \"{ty}\" has no members")
            }
            DiagKind::CallNotFound { name, args } => {
                write!(f, "cannot call \"{name}\" with arguments \"{args}\"")
            }
            DiagKind::MultipleOverloadsFound { name, args } => {
                write!(f, "multiple overloads of \"{name}\" match arguments \"{args}\"")
            }
            DiagKind::BadThis => {
                write!(f, "\"this\" is only available in non-static member functions")
            }
            DiagKind::VoidReturn { should_be_void: true } => {
                write!(f, "function cannot return a value")
            }
            DiagKind::VoidReturn { should_be_void: false } => {
                write!(f, "function must return a value")
            }
            DiagKind::NotAllPathsReturnValue => {
                write!(f, "not all control paths return a value")
            }
            DiagKind::UseBeforeDefinition { name } => {
                write!(f, "\"{name}\" used before its definition")
            }
            DiagKind::OverloadChangedModifier { name } => {
                write!(f, "overload of \"{name}\" changes \"static\" modifier")
            }
            DiagKind::NoOverloadContext { name } => {
                write!(f, "cannot resolve overloaded function \"{name}\" without context")
            }
            DiagKind::NoListContext => {
                write!(f, "cannot resolve type of list literal without context")
            }
            DiagKind::MetaTypeExpr => write!(f, "a type cannot be used as a value"),
            DiagKind::BadTypeParamCount { ty } => {
                write!(f, "wrong number of type parameters for \"{ty}\"")
            }
            DiagKind::BadKeyword { keyword } => {
                write!(f, "keyword \"{keyword}\" not allowed here")
            }
            DiagKind::DeadCode => write!(f, "dead code"),
            DiagKind::NullDereference { name: Some(name) } => {
                write!(f, "dereference of definitely null value \"{name}\"")
            }
            DiagKind::NullDereference { name: None } => {
                write!(f, "dereference of definitely null value")
            }
            DiagKind::NullableDereference { name: Some(name) } => {
                write!(f, "dereference of possibly null value \"{name}\"")
            }
            DiagKind::NullableDereference { name: None } => {
                write!(f, "dereference of possibly null value")
            }
        }
    }
}

/// A single reported problem.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Diagnostic {
    pub severity: Severity,
    pub span: Option<Span>,
    pub message: String,
}

impl Diagnostic {
    /// Render as `<file>:<line>:<column>: <severity>: <text>`.
    pub fn render(&self, file: &str) -> String {
        match self.span {
            Some(span) => format!(
                "{}:{}:{}: {}: {}",
                file, span.line, span.column, self.severity, self.message
            ),
            None => format!("<unprintable location>: {}: {}", self.severity, self.message),
        }
    }
}

/// Ordered diagnostic accumulator for one compilation.
#[derive(Debug)]
pub struct Log {
    file: String,
    diagnostics: Vec<Diagnostic>,
    errors: usize,
    suspended: u32,
}

impl Log {
    pub fn new(file: impl Into<String>) -> Self {
        Self {
            file: file.into(),
            diagnostics: Vec::new(),
            errors: 0,
            suspended: 0,
        }
    }

    pub fn file(&self) -> &str {
        &self.file
    }

    pub fn report(&mut self, span: Option<Span>, kind: DiagKind) {
        if self.suspended > 0 {
            return;
        }
        let severity = kind.severity();
        if severity == Severity::Error {
            self.errors += 1;
        }
        self.diagnostics.push(Diagnostic {
            severity,
            span,
            message: kind.to_string(),
        });
    }

    /// Record an error whose message is already rendered (parser errors).
    pub fn push_error(&mut self, span: Option<Span>, message: impl Into<String>) {
        if self.suspended > 0 {
            return;
        }
        self.errors += 1;
        self.diagnostics.push(Diagnostic {
            severity: Severity::Error,
            span,
            message: message.into(),
        });
    }

    /// Record a warning whose message is already rendered (lexer warnings).
    pub fn push_warning(&mut self, span: Option<Span>, message: impl Into<String>) {
        if self.suspended > 0 {
            return;
        }
        self.diagnostics.push(Diagnostic {
            severity: Severity::Warning,
            span,
            message: message.into(),
        });
    }

    pub fn has_errors(&self) -> bool {
        self.errors > 0
    }

    pub fn error_count(&self) -> usize {
        self.errors
    }

    /// Silence the log while the type pass probes a sub-expression.
    pub fn suspend(&mut self) {
        self.suspended += 1;
    }

    pub fn resume(&mut self) {
        debug_assert!(self.suspended > 0);
        self.suspended = self.suspended.saturating_sub(1);
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    pub fn take(self) -> Vec<Diagnostic> {
        self.diagnostics
    }

    /// Render every diagnostic in report order.
    pub fn render_all(&self) -> Vec<String> {
        self.diagnostics
            .iter()
            .map(|d| d.render(&self.file))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_format() {
        let diag = Diagnostic {
            severity: Severity::Error,
            span: Some(Span::new(4, 5, 2, 3)),
            message: "undefined symbol \"x\"".to_string(),
        };
        assert_eq!(diag.render("demo.tin"), "demo.tin:2:3: error: undefined symbol \"x\"");

        let diag = Diagnostic {
            severity: Severity::Warning,
            span: None,
            message: "dead code".to_string(),
        };
        assert_eq!(diag.render("demo.tin"), "<unprintable location>: warning: dead code");
    }

    #[test]
    fn test_suspension_drops_reports() {
        let mut log = Log::new("demo.tin");
        log.suspend();
        log.report(None, DiagKind::BadThis);
        log.resume();
        assert!(!log.has_errors());
        log.report(None, DiagKind::BadThis);
        assert!(log.has_errors());
        assert_eq!(log.diagnostics().len(), 1);
    }

    #[test]
    fn test_warning_does_not_count_as_error() {
        let mut log = Log::new("demo.tin");
        log.report(None, DiagKind::DeadCode);
        assert!(!log.has_errors());
        assert_eq!(log.diagnostics().len(), 1);
    }
}

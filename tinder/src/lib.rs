//! tinder
//!
//! Compiler core for the Tinder language: semantic analysis over the tree
//! built by `tinder_parser`, plus the nullability flow analyzer.
//!
//! The pipeline is linear, leaves first: structural check, symbol
//! definition, declared-type resolution, expression typing, default
//! initialization, flow validation. The decorated tree plus side tables
//! are what downstream emitters walk; the rename pass prepares symbol
//! names per target right before emission.

// Library code reports through the diagnostic log, never to stderr.
// CLI binaries (bin/) may use eprintln!() for user-facing messages.
#![deny(clippy::print_stderr)]

pub mod diag;
pub mod flow;
pub mod passes;
pub mod pipeline;
pub mod rename;
pub mod scope;
pub mod sema;
pub mod types;

pub use diag::{DiagKind, Diagnostic, Log, Severity};
pub use pipeline::{compile, Compilation};
pub use rename::{rename_symbols, RenameOptions};
pub use sema::Sema;
pub use types::Type;

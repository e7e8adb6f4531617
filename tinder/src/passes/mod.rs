//! Semantic analysis passes, in pipeline order.

pub mod structural;

pub mod define_symbols;

pub mod symbol_types;

pub mod compute_types;

pub mod default_init;

//! Shared helpers for the integration suites.

#![allow(dead_code)]

use tinder::{compile, Compilation, Severity};

pub fn compile_src(source: &str) -> Compilation {
    compile("test.tin", source)
}

pub fn messages(result: &Compilation) -> Vec<String> {
    result.diagnostics.iter().map(|d| d.message.clone()).collect()
}

pub fn errors(result: &Compilation) -> Vec<String> {
    result
        .diagnostics
        .iter()
        .filter(|d| d.severity == Severity::Error)
        .map(|d| d.message.clone())
        .collect()
}

pub fn warnings(result: &Compilation) -> Vec<String> {
    result
        .diagnostics
        .iter()
        .filter(|d| d.severity == Severity::Warning)
        .map(|d| d.message.clone())
        .collect()
}

pub fn assert_clean(result: &Compilation) {
    assert!(
        result.diagnostics.is_empty(),
        "unexpected diagnostics: {:?}",
        result.render_diagnostics()
    );
    assert!(result.module.is_some(), "module missing on clean compile");
}

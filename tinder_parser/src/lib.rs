//! tinder_parser
//!
//! Front-end for the Tinder language. Turns source text into an arena AST
//! in three steps:
//!
//! 1. raw tokenization ([`lexer`]),
//! 2. bracket disambiguation, which confirms type-parameter `<`/`>` pairs
//!    and normalizes newlines ([`brackets`]),
//! 3. Pratt parsing ([`parser`]).
//!
//! Semantic analysis lives in the `tinder` crate; this crate stays purely
//! syntactic so embedders can reuse it for highlighting or formatting.

pub mod ast;
pub mod brackets;
pub mod error;
pub mod lexer;
pub mod parser;
pub mod span;
pub mod token;

// Re-exports
pub use ast::{Ast, ExprId, Module, StmtId};
pub use error::{LexWarning, ParseError, ParseErrors, ParseResult};
pub use lexer::{Lexed, Lexer, SpannedToken};
pub use parser::Parser;
pub use span::{SourceMap, Span};
pub use token::Token;

/// Everything the front-end produced for one source.
#[derive(Debug)]
pub struct Parsed {
    pub ast: Ast,
    pub module: Module,
    pub warnings: Vec<LexWarning>,
    pub errors: Vec<ParseError>,
}

/// Run all three front-end phases on a source string.
///
/// A fatal lexer condition (unterminated string or block comment) aborts
/// before parsing; every other problem is accumulated in `errors`.
pub fn parse_source(source: &str) -> Result<Parsed, ParseError> {
    let map = SourceMap::new(source);
    let lexed = lexer::tokenize(source)?;
    let warnings = lexed.warnings;
    let tokens = brackets::disambiguate(lexed.tokens, &map);
    let (ast, module, errors) = parser::parse(tokens);
    Ok(Parsed {
        ast,
        module,
        warnings,
        errors: errors.take(),
    })
}

/// Tokenize a source string through both token phases.
pub fn tokenize(source: &str) -> ParseResult<Vec<SpannedToken<'_>>> {
    let map = SourceMap::new(source);
    let lexed = lexer::tokenize(source)?;
    Ok(brackets::disambiguate(lexed.tokens, &map))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_empty() {
        let parsed = parse_source("").unwrap();
        assert!(parsed.errors.is_empty());
    }

    #[test]
    fn test_tokenize_ends_with_eof() {
        let tokens = tokenize("1 + 2").unwrap();
        assert_eq!(tokens.last().unwrap().kind, Token::EndOfFile);
        assert_eq!(tokens[tokens.len() - 2].kind, Token::Newline);
    }
}

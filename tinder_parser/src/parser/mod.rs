//! Pratt parser for Tinder source.
//!
//! Consumes the disambiguated token stream and builds the arena AST.
//! Statements are keyword-dispatched; everything else starts as an
//! expression, and an expression followed by an identifier re-reads as the
//! type of a variable or function definition.

mod expr;
mod literals;
mod stmt;

use crate::ast::{Ast, Module, StmtKind};
use crate::error::{ParseError, ParseErrors, ParseResult};
use crate::lexer::SpannedToken;
use crate::span::Span;
use crate::token::Token;

/// Tinder parser.
pub struct Parser<'a> {
    tokens: Vec<SpannedToken<'a>>,
    pos: usize,
    pub(crate) ast: Ast,
    pub(crate) errors: ParseErrors,
    /// Depth of enclosing `external` blocks; definitions record `> 0`.
    pub(crate) external_depth: u32,
}

impl<'a> Parser<'a> {
    /// Create a parser over a disambiguated token stream.
    ///
    /// The stream must end with `Newline`, `EndOfFile` (see
    /// [`crate::brackets::disambiguate`]).
    pub fn new(tokens: Vec<SpannedToken<'a>>) -> Self {
        Self {
            tokens,
            pos: 0,
            ast: Ast::new(),
            errors: ParseErrors::new(),
            external_depth: 0,
        }
    }

    /// Parse a whole module.
    pub fn parse(mut self) -> (Ast, Module, ParseErrors) {
        let start = self.current().span;
        let mut stmts = Vec::new();

        self.skip_separators();
        while !self.at_end() {
            if let Err(e) = self.parse_stmt_into(&mut stmts) {
                self.errors.push(e);
                self.synchronize();
            }
            self.skip_separators();
        }

        let span = start.to(self.current().span);
        let block = self.ast.alloc_stmt(StmtKind::Block { stmts }, span);
        (self.ast, Module { block }, self.errors)
    }

    // ==================== Token Management ====================

    pub(crate) fn current(&self) -> SpannedToken<'a> {
        self.tokens[self.pos.min(self.tokens.len() - 1)]
    }

    pub(crate) fn kind(&self) -> Token {
        self.current().kind
    }

    pub(crate) fn advance(&mut self) -> SpannedToken<'a> {
        let tok = self.current();
        if self.pos + 1 < self.tokens.len() {
            self.pos += 1;
        }
        tok
    }

    pub(crate) fn check(&self, expected: Token) -> bool {
        self.kind() == expected
    }

    pub(crate) fn eat(&mut self, expected: Token) -> bool {
        if self.check(expected) {
            self.advance();
            true
        } else {
            false
        }
    }

    pub(crate) fn expect(&mut self, expected: Token) -> ParseResult<SpannedToken<'a>> {
        if self.check(expected) {
            Ok(self.advance())
        } else {
            Err(self.unexpected())
        }
    }

    pub(crate) fn at_end(&self) -> bool {
        self.kind() == Token::EndOfFile
    }

    pub(crate) fn mark(&self) -> usize {
        self.pos
    }

    pub(crate) fn rewind(&mut self, mark: usize) {
        self.pos = mark;
    }

    pub(crate) fn span(&self) -> Span {
        self.current().span
    }

    /// `unexpected <token>` at the current token.
    pub(crate) fn unexpected(&self) -> ParseError {
        let tok = self.current();
        if tok.kind == Token::EndOfFile {
            ParseError::UnexpectedEof {
                expected: "statement or expression".to_string(),
                span: tok.span,
            }
        } else {
            ParseError::unexpected(tok.kind.describe(tok.text), tok.span)
        }
    }

    /// Skip newlines and semicolons between statements.
    pub(crate) fn skip_separators(&mut self) {
        while matches!(self.kind(), Token::Newline | Token::Semicolon) {
            self.advance();
        }
    }

    /// End-of-statement is `;`, a newline, or lookahead at `}` / end of input.
    pub(crate) fn expect_stmt_end(&mut self) -> ParseResult<()> {
        match self.kind() {
            Token::Semicolon | Token::Newline => {
                self.advance();
                Ok(())
            }
            Token::RBrace | Token::EndOfFile => Ok(()),
            _ => Err(self.unexpected()),
        }
    }

    /// Error recovery: skip to the next statement boundary.
    pub(crate) fn synchronize(&mut self) {
        // Always advance at least once so recovery makes progress even
        // when the offending token is a closing brace.
        self.advance();
        while !self.at_end() {
            match self.kind() {
                Token::Newline | Token::Semicolon => {
                    self.advance();
                    return;
                }
                Token::RBrace => return,
                _ => {
                    self.advance();
                }
            }
        }
    }
}

/// Parse a disambiguated token stream into an AST.
pub fn parse(tokens: Vec<SpannedToken<'_>>) -> (Ast, Module, ParseErrors) {
    Parser::new(tokens).parse()
}

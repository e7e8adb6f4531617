//! Statement parsing.

use super::Parser;
use crate::ast::{ClassDef, ExprId, FuncDef, StmtId, StmtKind, VarDef};
use crate::error::ParseResult;
use crate::span::Span;
use crate::token::Token;

impl<'a> Parser<'a> {
    /// Parse one statement. A comma-separated variable declaration expands
    /// to several `Var` statements, hence the out-parameter.
    pub(crate) fn parse_stmt_into(&mut self, stmts: &mut Vec<StmtId>) -> ParseResult<()> {
        match self.kind() {
            Token::KwIf => {
                let stmt = self.parse_if()?;
                stmts.push(stmt);
            }
            Token::KwWhile => {
                let stmt = self.parse_while()?;
                stmts.push(stmt);
            }
            Token::KwReturn => {
                let stmt = self.parse_return()?;
                stmts.push(stmt);
            }
            Token::KwExternal => {
                let stmt = self.parse_external()?;
                stmts.push(stmt);
            }
            Token::KwClass => {
                let stmt = self.parse_class()?;
                stmts.push(stmt);
            }
            Token::KwStatic => {
                let start = self.advance().span;
                let ty = self.parse_expr(0)?;
                let name = self.expect(Token::Identifier)?;
                if !self.check(Token::LParen) {
                    // `static` only modifies function definitions.
                    return Err(self.unexpected());
                }
                let stmt = self.parse_func_rest(start, ty, name.text.to_string(), true)?;
                stmts.push(stmt);
            }
            _ => {
                let expr = self.parse_expr(0)?;
                if self.check(Token::Identifier) {
                    self.parse_definition(expr, stmts)?;
                } else {
                    self.expect_stmt_end()?;
                    let span = self.ast.expr(expr).span;
                    stmts.push(self.ast.alloc_stmt(StmtKind::Expr { expr }, span));
                }
            }
        }
        Ok(())
    }

    /// A parsed expression followed by an identifier is a definition; the
    /// expression re-reads as the declared type.
    fn parse_definition(&mut self, ty: ExprId, stmts: &mut Vec<StmtId>) -> ParseResult<()> {
        let ty_span = self.ast.expr(ty).span;
        let name = self.expect(Token::Identifier)?;

        if self.check(Token::LParen) {
            let stmt = self.parse_func_rest(ty_span, ty, name.text.to_string(), false)?;
            stmts.push(stmt);
            return Ok(());
        }

        let in_external = self.external_depth > 0;
        let init = if self.eat(Token::Eq) {
            Some(self.parse_expr(0)?)
        } else {
            None
        };
        let end = init.map(|e| self.ast.expr(e).span).unwrap_or(name.span);
        stmts.push(self.ast.alloc_stmt(
            StmtKind::Var(VarDef {
                name: name.text.to_string(),
                ty,
                init,
                in_external,
            }),
            ty_span.to(end),
        ));

        // Additional declarators share the written type.
        while self.eat(Token::Comma) {
            let extra = self.expect(Token::Identifier)?;
            let extra_ty = self.ast.clone_expr(ty);
            let init = if self.eat(Token::Eq) {
                Some(self.parse_expr(0)?)
            } else {
                None
            };
            let end = init.map(|e| self.ast.expr(e).span).unwrap_or(extra.span);
            stmts.push(self.ast.alloc_stmt(
                StmtKind::Var(VarDef {
                    name: extra.text.to_string(),
                    ty: extra_ty,
                    init,
                    in_external,
                }),
                extra.span.to(end),
            ));
        }

        self.expect_stmt_end()
    }

    /// Parse the remainder of a function definition, cursor at `(`.
    fn parse_func_rest(
        &mut self,
        start: Span,
        ret: ExprId,
        name: String,
        is_static: bool,
    ) -> ParseResult<StmtId> {
        self.expect(Token::LParen)?;
        let in_external = self.external_depth > 0;

        let mut args = Vec::new();
        if !self.check(Token::RParen) {
            loop {
                let arg_ty = self.parse_expr(0)?;
                let arg_name = self.expect(Token::Identifier)?;
                // Default arguments parse here and are rejected by the
                // structural check, so they get a proper diagnostic.
                let init = if self.eat(Token::Eq) {
                    Some(self.parse_expr(0)?)
                } else {
                    None
                };
                let span = self.ast.expr(arg_ty).span.to(arg_name.span);
                args.push(self.ast.alloc_stmt(
                    StmtKind::Var(VarDef {
                        name: arg_name.text.to_string(),
                        ty: arg_ty,
                        init,
                        in_external,
                    }),
                    span,
                ));
                if !self.eat(Token::Comma) {
                    break;
                }
            }
        }
        let close = self.expect(Token::RParen)?;

        let (body, end) = if self.check(Token::LBrace) {
            let block = self.parse_block()?;
            let end = self.ast.stmt(block).span;
            (Some(block), end)
        } else {
            self.expect_stmt_end()?;
            (None, close.span)
        };

        Ok(self.ast.alloc_stmt(
            StmtKind::Func(FuncDef {
                name,
                is_static,
                ret,
                args,
                body,
                in_external,
            }),
            start.to(end),
        ))
    }

    /// Parse a braced block.
    pub(crate) fn parse_block(&mut self) -> ParseResult<StmtId> {
        let open = self.expect(Token::LBrace)?;
        let mut stmts = Vec::new();

        self.skip_separators();
        while !self.check(Token::RBrace) && !self.at_end() {
            if let Err(e) = self.parse_stmt_into(&mut stmts) {
                self.errors.push(e);
                self.synchronize();
            }
            self.skip_separators();
        }
        let close = self.expect(Token::RBrace)?;

        Ok(self
            .ast
            .alloc_stmt(StmtKind::Block { stmts }, open.span.to(close.span)))
    }

    fn parse_if(&mut self) -> ParseResult<StmtId> {
        let start = self.expect(Token::KwIf)?.span;
        let test = self.parse_expr(0)?;
        let then_block = self.parse_block()?;
        let mut end = self.ast.stmt(then_block).span;

        // Look past newlines for `else`; back off if it is not there.
        let mark = self.mark();
        self.skip_separators();
        let else_block = if self.eat(Token::KwElse) {
            // `else if` nests directly instead of wrapping a block.
            let branch = if self.check(Token::KwIf) {
                self.parse_if()?
            } else {
                self.parse_block()?
            };
            end = self.ast.stmt(branch).span;
            Some(branch)
        } else {
            self.rewind(mark);
            None
        };

        Ok(self.ast.alloc_stmt(
            StmtKind::If {
                test,
                then_block,
                else_block,
            },
            start.to(end),
        ))
    }

    fn parse_while(&mut self) -> ParseResult<StmtId> {
        let start = self.expect(Token::KwWhile)?.span;
        let test = self.parse_expr(0)?;
        let body = self.parse_block()?;
        let end = self.ast.stmt(body).span;
        Ok(self
            .ast
            .alloc_stmt(StmtKind::While { test, body }, start.to(end)))
    }

    fn parse_return(&mut self) -> ParseResult<StmtId> {
        let start = self.expect(Token::KwReturn)?.span;
        let value = if matches!(
            self.kind(),
            Token::Semicolon | Token::Newline | Token::RBrace | Token::EndOfFile
        ) {
            None
        } else {
            Some(self.parse_expr(0)?)
        };
        let end = value.map(|e| self.ast.expr(e).span).unwrap_or(start);
        self.expect_stmt_end()?;
        Ok(self
            .ast
            .alloc_stmt(StmtKind::Return { value }, start.to(end)))
    }

    fn parse_external(&mut self) -> ParseResult<StmtId> {
        let start = self.expect(Token::KwExternal)?.span;
        self.external_depth += 1;
        let body = self.parse_block();
        self.external_depth -= 1;
        let body = body?;
        let end = self.ast.stmt(body).span;
        Ok(self
            .ast
            .alloc_stmt(StmtKind::External { body }, start.to(end)))
    }

    fn parse_class(&mut self) -> ParseResult<StmtId> {
        let start = self.expect(Token::KwClass)?.span;
        let name = self.expect(Token::Identifier)?;
        let body = self.parse_block()?;
        let end = self.ast.stmt(body).span;
        Ok(self.ast.alloc_stmt(
            StmtKind::Class(ClassDef {
                name: name.text.to_string(),
                body,
                in_external: self.external_depth > 0,
            }),
            start.to(end),
        ))
    }
}

//! Expression parsing (Pratt parser core).

use super::literals;
use super::Parser;
use crate::ast::{BinaryOp, BuiltinType, ExprId, ExprKind, UnaryOp};
use crate::error::ParseResult;
use crate::token::{bp, Token};

impl<'a> Parser<'a> {
    /// Parse an expression: run the prefix parser for the current token,
    /// then fold in infix parsers while their left binding power exceeds
    /// `rbp`.
    pub(crate) fn parse_expr(&mut self, rbp: u8) -> ParseResult<ExprId> {
        let mut left = self.parse_prefix()?;
        loop {
            let Some(lbp) = self.kind().left_binding_power() else {
                break;
            };
            if lbp <= rbp {
                break;
            }
            left = self.parse_infix(left)?;
        }
        Ok(left)
    }

    fn parse_prefix(&mut self) -> ParseResult<ExprId> {
        let tok = self.current();
        let kind = match tok.kind {
            Token::IntLit => {
                self.advance();
                ExprKind::Int(literals::decode_int(tok.text, tok.span)?)
            }
            Token::FloatLit => {
                self.advance();
                ExprKind::Float(literals::decode_float(tok.text, tok.span)?)
            }
            Token::StrLit => {
                self.advance();
                ExprKind::Str(literals::decode_str(tok.text))
            }
            Token::CharLit => {
                self.advance();
                ExprKind::Int(literals::decode_char(tok.text, tok.span)?)
            }
            Token::KwTrue => {
                self.advance();
                ExprKind::Bool(true)
            }
            Token::KwFalse => {
                self.advance();
                ExprKind::Bool(false)
            }
            Token::KwNull => {
                self.advance();
                ExprKind::Null
            }
            Token::KwThis => {
                self.advance();
                ExprKind::This
            }
            Token::KwVar => {
                self.advance();
                ExprKind::VarKeyword
            }
            Token::Identifier => {
                self.advance();
                ExprKind::Ident(tok.text.to_string())
            }
            Token::KwVoid => self.builtin(BuiltinType::Void),
            Token::KwBool => self.builtin(BuiltinType::Bool),
            Token::KwInt => self.builtin(BuiltinType::Int),
            Token::KwFloat => self.builtin(BuiltinType::Float),
            Token::KwString => self.builtin(BuiltinType::String),
            Token::KwList => self.builtin(BuiltinType::List),
            Token::KwFunction => self.builtin(BuiltinType::Function),
            Token::Minus => {
                self.advance();
                let operand = self.parse_expr(bp::UNARY)?;
                let span = tok.span.to(self.ast.expr(operand).span);
                return Ok(self.ast.alloc_expr(
                    ExprKind::Unary {
                        op: UnaryOp::Neg,
                        operand,
                    },
                    span,
                ));
            }
            Token::KwNot => {
                self.advance();
                let operand = self.parse_expr(bp::UNARY)?;
                let span = tok.span.to(self.ast.expr(operand).span);
                return Ok(self.ast.alloc_expr(
                    ExprKind::Unary {
                        op: UnaryOp::Not,
                        operand,
                    },
                    span,
                ));
            }
            Token::LParen => {
                self.advance();
                let inner = self.parse_expr(0)?;
                self.expect(Token::RParen)?;
                return Ok(inner);
            }
            Token::LBracket => {
                self.advance();
                let mut items = Vec::new();
                if !self.check(Token::RBracket) {
                    loop {
                        items.push(self.parse_expr(0)?);
                        if !self.eat(Token::Comma) {
                            break;
                        }
                    }
                }
                let close = self.expect(Token::RBracket)?;
                return Ok(self
                    .ast
                    .alloc_expr(ExprKind::List(items), tok.span.to(close.span)));
            }
            _ => return Err(self.unexpected()),
        };
        Ok(self.ast.alloc_expr(kind, tok.span))
    }

    fn builtin(&mut self, ty: BuiltinType) -> ExprKind {
        self.advance();
        ExprKind::Builtin(ty)
    }

    fn parse_infix(&mut self, left: ExprId) -> ParseResult<ExprId> {
        let tok = self.current();
        let left_span = self.ast.expr(left).span;
        match tok.kind {
            Token::KwAs => {
                self.advance();
                let ty = self.parse_expr(bp::CAST)?;
                let span = left_span.to(self.ast.expr(ty).span);
                Ok(self.ast.alloc_expr(
                    ExprKind::Cast {
                        value: left,
                        ty: Some(ty),
                    },
                    span,
                ))
            }
            Token::Dot | Token::QuestionDot => {
                let safe = tok.kind == Token::QuestionDot;
                self.advance();
                let name = self.expect(Token::Identifier)?;
                let span = left_span.to(name.span);
                Ok(self.ast.alloc_expr(
                    ExprKind::Member {
                        obj: left,
                        name: name.text.to_string(),
                        safe,
                    },
                    span,
                ))
            }
            Token::Question => {
                self.advance();
                let span = left_span.to(tok.span);
                Ok(self
                    .ast
                    .alloc_expr(ExprKind::Nullable { operand: left }, span))
            }
            Token::LParen => {
                self.advance();
                let mut args = Vec::new();
                if !self.check(Token::RParen) {
                    loop {
                        args.push(self.parse_expr(0)?);
                        if !self.eat(Token::Comma) {
                            break;
                        }
                    }
                }
                let close = self.expect(Token::RParen)?;
                Ok(self.ast.alloc_expr(
                    ExprKind::Call { callee: left, args },
                    left_span.to(close.span),
                ))
            }
            Token::LParam => {
                self.advance();
                let mut args = Vec::new();
                if !self.check(Token::RParam) {
                    loop {
                        args.push(self.parse_expr(0)?);
                        if !self.eat(Token::Comma) {
                            break;
                        }
                    }
                }
                let close = self.expect(Token::RParam)?;
                Ok(self.ast.alloc_expr(
                    ExprKind::Param { base: left, args },
                    left_span.to(close.span),
                ))
            }
            Token::LBracket => {
                self.advance();
                let index = self.parse_expr(0)?;
                let close = self.expect(Token::RBracket)?;
                Ok(self.ast.alloc_expr(
                    ExprKind::Index { obj: left, index },
                    left_span.to(close.span),
                ))
            }
            _ => {
                let Some(op) = binary_op(tok.kind) else {
                    return Err(self.unexpected());
                };
                let lbp = tok.kind.left_binding_power().unwrap_or(0);
                self.advance();
                let rbp = if tok.kind.is_right_associative() {
                    lbp - 1
                } else {
                    lbp
                };
                let rhs = self.parse_expr(rbp)?;
                let span = left_span.to(self.ast.expr(rhs).span);
                Ok(self.ast.alloc_expr(
                    ExprKind::Binary {
                        op,
                        lhs: left,
                        rhs,
                    },
                    span,
                ))
            }
        }
    }
}

fn binary_op(kind: Token) -> Option<BinaryOp> {
    Some(match kind {
        Token::Eq => BinaryOp::Assign,
        Token::QuestionQuestion => BinaryOp::Coalesce,
        Token::KwAnd => BinaryOp::And,
        Token::KwOr => BinaryOp::Or,
        Token::EqEq => BinaryOp::Eq,
        Token::NotEq => BinaryOp::Ne,
        Token::Lt => BinaryOp::Lt,
        Token::Gt => BinaryOp::Gt,
        Token::LtEq => BinaryOp::Le,
        Token::GtEq => BinaryOp::Ge,
        Token::LtLt => BinaryOp::Shl,
        Token::GtGt => BinaryOp::Shr,
        Token::Amp => BinaryOp::BitAnd,
        Token::Pipe => BinaryOp::BitOr,
        Token::Caret => BinaryOp::BitXor,
        Token::Plus => BinaryOp::Add,
        Token::Minus => BinaryOp::Sub,
        Token::Star => BinaryOp::Mul,
        Token::Slash => BinaryOp::Div,
        _ => return None,
    })
}

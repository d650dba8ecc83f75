use crate::language::{BinOp, NamedRegister, UnOp};
use crate::lex::TokenKind;
use crate::source::Source;
use crate::{Expr, Literal};

use super::{ParseError, ParseErrorKind, Parser};

impl<S: Source> Parser<'_, S> {
    pub(super) fn expr(&mut self) -> Result<Expr, ParseError> {
        self.expr_bp(0)
    }

    /// The operand of a `-` that has already been consumed.
    pub(super) fn negated(&mut self) -> Result<Expr, ParseError> {
        let expr = self.expr_bp(UnOp::Neg.binding_power())?;
        let lhs = Expr::Unary {
            op: UnOp::Neg,
            expr: Box::new(expr),
        };
        self.expr_continue(lhs, 0)
    }

    fn expr_bp(&mut self, min_bp: u8) -> Result<Expr, ParseError> {
        let lhs = self.prefix()?;
        self.expr_continue(lhs, min_bp)
    }

    /// Folds infix operators binding tighter than `min_bp` onto `lhs`.
    pub(super) fn expr_continue(&mut self, mut lhs: Expr, min_bp: u8) -> Result<Expr, ParseError> {
        while let Some(op) = self.peek_binary()? {
            let bp = op.binding_power();
            // equal power stops here, leaving the operator to the caller: left associative
            if bp <= min_bp {
                break;
            }
            self.bump()?;
            let rhs = self.expr_bp(bp)?;
            lhs = Expr::Binary {
                op,
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
            };
        }
        Ok(lhs)
    }

    fn peek_binary(&mut self) -> Result<Option<BinOp>, ParseError> {
        let registry = self.registry;
        let tok = self.peek()?;
        if tok.kind != TokenKind::Operator {
            return Ok(None);
        }
        Ok(registry.operator(&tok.text).and_then(|op| op.binary))
    }

    fn prefix(&mut self) -> Result<Expr, ParseError> {
        let tok = self.bump()?;
        match tok.kind {
            TokenKind::Number(radix) => Ok(Expr::Literal(Literal {
                radix,
                digits: tok.text,
            })),
            TokenKind::Ident => Ok(Expr::Ident(self.si.get_or_intern(&tok.text))),
            TokenKind::Register if self.registry.register(&tok.text) == Some(NamedRegister::Pc) => {
                Ok(Expr::Pc)
            }
            TokenKind::OpenParen => {
                let expr = self.expr_bp(0)?;
                self.close_paren()?;
                Ok(expr)
            }
            TokenKind::Function => {
                let Some(func) = self.registry.function(&tok.text) else {
                    return Err(self.unexpected(&tok, "in expression"));
                };
                let open = self.bump()?;
                if open.kind != TokenKind::OpenParen {
                    return Err(self.unexpected(&open, format!("after function '{}'", tok.text)));
                }
                let arg = self.expr_bp(0)?;
                self.close_paren()?;
                Ok(Expr::Call {
                    func,
                    arg: Box::new(arg),
                })
            }
            TokenKind::Operator => {
                let Some(op) = self.registry.operator(&tok.text).and_then(|op| op.unary) else {
                    return Err(self.unexpected(&tok, "in expression"));
                };
                let expr = self.expr_bp(op.binding_power())?;
                Ok(Expr::Unary {
                    op,
                    expr: Box::new(expr),
                })
            }
            TokenKind::Instruction | TokenKind::Directive => {
                Err(self.error(ParseErrorKind::KeywordOperand(tok.text)))
            }
            _ => Err(self.unexpected(&tok, "in expression")),
        }
    }

    fn close_paren(&mut self) -> Result<(), ParseError> {
        let tok = self.bump()?;
        if tok.kind != TokenKind::CloseParen {
            return Err(self.unexpected(&tok, "where ')' was expected"));
        }
        Ok(())
    }
}

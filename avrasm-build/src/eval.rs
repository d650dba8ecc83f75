#[cfg(test)]
mod test;

use avrasm::language::{PointerMode, Value};
use avrasm::{Expr, Literal, Operand, Radix};
use string_interner::{DefaultBackend, StringInterner};
use thiserror::Error;

use crate::symbols::SymbolTable;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EvalError {
    #[error("identifier '{0}' unknown")]
    UnknownIdent(String),
    #[error("division by zero")]
    DivisionByZero,
    #[error("{radix} literal '{prefix}{digits}' does not fit in 64 bits", prefix = .radix.prefix())]
    Overflow { radix: Radix, digits: String },
}

/// Everything an expression can refer to.
#[derive(Debug, Clone, Copy)]
pub struct Scope<'a> {
    pub symbols: &'a SymbolTable,
    pub names: &'a StringInterner<DefaultBackend>,
    /// word address of the instruction being assembled
    pub pc: u64,
}

impl Scope<'_> {
    /// With `relative` set, identifiers become offsets from the next word:
    /// `value - pc - 1`.
    pub fn expr(&self, expr: &Expr, relative: bool) -> Result<u64, EvalError> {
        match expr {
            Expr::Literal(lit) => literal(lit),
            Expr::Ident(sym) => {
                let Some(value) = self.symbols.get(*sym) else {
                    let name = self.names.resolve(*sym).unwrap_or("<unknown>");
                    return Err(EvalError::UnknownIdent(name.to_owned()));
                };
                if relative {
                    Ok(value.wrapping_sub(self.pc).wrapping_sub(1))
                } else {
                    Ok(value)
                }
            }
            Expr::Pc => Ok(self.pc),
            Expr::Unary { op, expr } => Ok(op.apply(self.expr(expr, relative)?)),
            Expr::Binary { op, lhs, rhs } => {
                let lhs = self.expr(lhs, relative)?;
                let rhs = self.expr(rhs, relative)?;
                op.apply(lhs, rhs).ok_or(EvalError::DivisionByZero)
            }
            Expr::Call { func, arg } => Ok(func.apply(self.expr(arg, relative)?)),
        }
    }

    pub fn operand(&self, operand: &Operand, relative: bool) -> Result<Value, EvalError> {
        Ok(match operand {
            Operand::None => Value::None,
            Operand::Register(r) => Value::Register(*r),
            Operand::Pair { high, low } => Value::Pair {
                high: *high,
                low: *low,
            },
            Operand::Pointer { reg, mode } => Value::Pointer {
                reg: *reg,
                mode: match mode {
                    PointerMode::Plain => PointerMode::Plain,
                    PointerMode::PostInc => PointerMode::PostInc,
                    PointerMode::PreDec => PointerMode::PreDec,
                    PointerMode::Displacement(q) => PointerMode::Displacement(literal(q)?),
                },
            },
            Operand::Expr(expr) => Value::Int(self.expr(expr, relative)?),
        })
    }
}

pub fn literal(lit: &Literal) -> Result<u64, EvalError> {
    u64::from_str_radix(&lit.digits, lit.radix.base()).map_err(|_| EvalError::Overflow {
        radix: lit.radix,
        digits: lit.digits.clone(),
    })
}

use std::fmt;

use string_interner::{DefaultBackend, DefaultSymbol, StringInterner};

use crate::language::PointerMode;
use crate::{DirValue, Expr, Line, Literal, Operand};

/// An AST node paired with the interner its symbols came from.
pub struct Resolved<'a, T> {
    si: &'a StringInterner<DefaultBackend>,
    node: &'a T,
}

impl<'a, T> Resolved<'a, T> {
    pub fn new(si: &'a StringInterner<DefaultBackend>, node: &'a T) -> Self {
        Self { si, node }
    }

    fn wrap<U>(&self, node: &'a U) -> Resolved<'a, U> {
        Resolved { si: self.si, node }
    }

    fn name(&self, sym: DefaultSymbol) -> &'a str {
        self.si.resolve(sym).unwrap_or("<unknown>")
    }
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.radix.prefix(), self.digits)
    }
}

impl fmt::Display for Resolved<'_, Line> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.node {
            Line::Eof => write!(f, "EOF"),
            Line::Comment(text) => write!(f, "COMMENT '{text}'"),
            Line::Label { name, line } => write!(f, "{line} : LABEL '{}'", self.name(*name)),
            Line::Directive {
                directive,
                value,
                line,
            } => write!(f, "{line} : DIR '{directive}' {}", self.wrap(value)),
            Line::Instruction {
                mnemonic,
                op1,
                op2,
                line,
            } => {
                write!(f, "{line} : INSTR '{mnemonic}'")?;
                if *op1 != Operand::None {
                    write!(f, " '{}'", self.wrap(op1))?;
                }
                if *op2 != Operand::None {
                    write!(f, ", '{}'", self.wrap(op2))?;
                }
                Ok(())
            }
        }
    }
}

impl fmt::Display for Resolved<'_, DirValue> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.node {
            DirValue::Ident(sym) => write!(f, "'{}'", self.name(*sym)),
            DirValue::Immediate(lit) => write!(f, "'{lit}'"),
            DirValue::Expr(expr) => write!(f, "'{}'", self.wrap(expr)),
            DirValue::Assign { name, expr } => {
                write!(f, "'{}' = '{}'", self.name(*name), self.wrap(expr))
            }
        }
    }
}

impl fmt::Display for Resolved<'_, Operand> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.node {
            Operand::None => Ok(()),
            Operand::Register(r) => write!(f, "r{r}"),
            Operand::Pair { high, low } => write!(f, "r{high}:r{low}"),
            Operand::Pointer { reg, mode } => match mode {
                PointerMode::Plain => write!(f, "{reg}"),
                PointerMode::PostInc => write!(f, "{reg}+"),
                PointerMode::PreDec => write!(f, "-{reg}"),
                PointerMode::Displacement(q) => write!(f, "{reg}+{q}"),
            },
            Operand::Expr(expr) => write!(f, "{}", self.wrap(expr)),
        }
    }
}

/// Fully parenthesised, so the printed form shows how the tree was built.
impl fmt::Display for Resolved<'_, Expr> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.node {
            Expr::Literal(lit) => write!(f, "{lit}"),
            Expr::Ident(sym) => f.write_str(self.name(*sym)),
            Expr::Pc => f.write_str("pc"),
            Expr::Unary { op, expr } => write!(f, "({}{})", op.symbol(), self.wrap(&**expr)),
            Expr::Binary { op, lhs, rhs } => write!(
                f,
                "({} {} {})",
                self.wrap(&**lhs),
                op.symbol(),
                self.wrap(&**rhs)
            ),
            Expr::Call { func, arg } => write!(f, "{}({})", func.name(), self.wrap(&**arg)),
        }
    }
}

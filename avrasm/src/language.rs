//! The fixed vocabulary of the assembly language.
//!
//! Everything the lexer and parser need to classify a word lives in a
//! [`Registry`], built once and shared by reference.

#[cfg(test)]
mod test;

mod field;
mod instructions;

use std::fmt;

use ahash::AHashMap;

use crate::device::Core;

pub use self::field::{validate_pair, EncodeError, Field, PointerMode, PointerReg, Value};
pub use self::instructions::Template;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Keyword {
    Instruction,
    Directive(Directive),
    Function(Func),
    Register(NamedRegister),
    /// not a keyword
    Ident,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NamedRegister {
    Pointer(PointerReg),
    Pc,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Directive {
    Device,
    Equ,
}

impl fmt::Display for Directive {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Directive::Device => "device",
            Directive::Equ => "equ",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Func {
    Low,
    High,
    Byte2,
    Byte3,
    Byte4,
    Lwrd,
    Hwrd,
    Page,
    Exp2,
    Log2,
    Abs,
}

impl Func {
    pub fn name(self) -> &'static str {
        match self {
            Func::Low => "low",
            Func::High => "high",
            Func::Byte2 => "byte2",
            Func::Byte3 => "byte3",
            Func::Byte4 => "byte4",
            Func::Lwrd => "lwrd",
            Func::Hwrd => "hwrd",
            Func::Page => "page",
            Func::Exp2 => "exp2",
            Func::Log2 => "log2",
            Func::Abs => "abs",
        }
    }

    pub fn apply(self, v: u64) -> u64 {
        match self {
            Func::Low => v & 0xff,
            Func::High | Func::Byte2 => (v >> 8) & 0xff,
            Func::Byte3 => (v >> 16) & 0xff,
            Func::Byte4 => (v >> 24) & 0xff,
            Func::Lwrd => v & 0xffff,
            Func::Hwrd => (v >> 16) & 0xffff,
            Func::Page => (v & 0xf_0000) >> 16,
            Func::Exp2 => 1u64.checked_shl(v.min(u32::MAX as u64) as u32).unwrap_or(0),
            Func::Log2 => v.checked_ilog2().map_or(0, u64::from),
            Func::Abs => (v as i64).unsigned_abs(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnOp {
    Neg,
    Not,
    BitNot,
}

impl UnOp {
    pub fn binding_power(self) -> u8 {
        match self {
            UnOp::Neg => 16,
            UnOp::Not | UnOp::BitNot => 14,
        }
    }

    pub fn symbol(self) -> &'static str {
        match self {
            UnOp::Neg => "-",
            UnOp::Not => "!",
            UnOp::BitNot => "~",
        }
    }

    pub fn apply(self, v: u64) -> u64 {
        match self {
            UnOp::Neg => v.wrapping_neg(),
            UnOp::Not => (v == 0) as u64,
            UnOp::BitNot => !v,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinOp {
    Mul,
    Div,
    Mod,
    Add,
    Sub,
    Shl,
    Shr,
    Lt,
    Le,
    Gt,
    Ge,
    Eq,
    Ne,
    BitAnd,
    BitXor,
    BitOr,
    And,
    Or,
}

impl BinOp {
    pub fn binding_power(self) -> u8 {
        use BinOp::*;
        match self {
            Mul | Div | Mod => 13,
            Add | Sub => 12,
            Shl | Shr => 11,
            Lt | Le | Gt | Ge => 10,
            Eq | Ne => 9,
            BitAnd => 8,
            BitXor => 7,
            BitOr => 6,
            And => 5,
            Or => 4,
        }
    }

    pub fn symbol(self) -> &'static str {
        use BinOp::*;
        match self {
            Mul => "*",
            Div => "/",
            Mod => "%",
            Add => "+",
            Sub => "-",
            Shl => "<<",
            Shr => ">>",
            Lt => "<",
            Le => "<=",
            Gt => ">",
            Ge => ">=",
            Eq => "==",
            Ne => "!=",
            BitAnd => "&",
            BitXor => "^",
            BitOr => "|",
            And => "&&",
            Or => "||",
        }
    }

    /// Wrapping 64-bit arithmetic. `None` only for a zero divisor.
    pub fn apply(self, a: u64, b: u64) -> Option<u64> {
        use BinOp::*;
        let shift = |v: u64| v.min(u32::MAX as u64) as u32;
        Some(match self {
            Mul => a.wrapping_mul(b),
            Div => a.checked_div(b)?,
            Mod => a.checked_rem(b)?,
            Add => a.wrapping_add(b),
            Sub => a.wrapping_sub(b),
            Shl => a.checked_shl(shift(b)).unwrap_or(0),
            Shr => a.checked_shr(shift(b)).unwrap_or(0),
            Lt => (a < b) as u64,
            Le => (a <= b) as u64,
            Gt => (a > b) as u64,
            Ge => (a >= b) as u64,
            Eq => (a == b) as u64,
            Ne => (a != b) as u64,
            BitAnd => a & b,
            BitXor => a ^ b,
            BitOr => a | b,
            And => (a != 0 && b != 0) as u64,
            Or => (a != 0 || b != 0) as u64,
        })
    }
}

/// An operator token may stand for a prefix form, an infix form, or both.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Operator {
    pub unary: Option<UnOp>,
    pub binary: Option<BinOp>,
}

#[derive(Debug)]
pub struct Registry {
    base: AHashMap<&'static str, Template>,
    enhanced: AHashMap<&'static str, Template>,
    directives: AHashMap<&'static str, Directive>,
    functions: AHashMap<&'static str, Func>,
    operators: AHashMap<&'static str, Operator>,
    registers: AHashMap<&'static str, NamedRegister>,
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

impl Registry {
    pub fn new() -> Self {
        let directives = [("device", Directive::Device), ("equ", Directive::Equ)];
        let functions = [
            Func::Low,
            Func::High,
            Func::Byte2,
            Func::Byte3,
            Func::Byte4,
            Func::Lwrd,
            Func::Hwrd,
            Func::Page,
            Func::Exp2,
            Func::Log2,
            Func::Abs,
        ];
        let registers = [
            ("x", NamedRegister::Pointer(PointerReg::X)),
            ("y", NamedRegister::Pointer(PointerReg::Y)),
            ("z", NamedRegister::Pointer(PointerReg::Z)),
            ("pc", NamedRegister::Pc),
        ];
        let mut operators = AHashMap::new();
        for op in [UnOp::Neg, UnOp::Not, UnOp::BitNot] {
            operators.entry(op.symbol()).or_insert_with(Operator::default).unary = Some(op);
        }
        use BinOp::*;
        for op in [
            Mul, Div, Mod, Add, Sub, Shl, Shr, Lt, Le, Gt, Ge, Eq, Ne, BitAnd, BitXor, BitOr, And,
            Or,
        ] {
            operators.entry(op.symbol()).or_insert_with(Operator::default).binary = Some(op);
        }
        Self {
            base: instructions::BASE.iter().copied().collect(),
            enhanced: instructions::ENHANCED.iter().copied().collect(),
            directives: directives.into_iter().collect(),
            functions: functions.into_iter().map(|f| (f.name(), f)).collect(),
            operators,
            registers: registers.into_iter().collect(),
        }
    }

    /// Classifies an already lowercased word.
    pub fn classify(&self, word: &str) -> Keyword {
        if let Some(reg) = self.registers.get(word) {
            Keyword::Register(*reg)
        } else if self.base.contains_key(word) || self.enhanced.contains_key(word) {
            Keyword::Instruction
        } else if let Some(dir) = self.directives.get(word) {
            Keyword::Directive(*dir)
        } else if let Some(func) = self.functions.get(word) {
            Keyword::Function(*func)
        } else {
            Keyword::Ident
        }
    }

    /// The template `mnemonic` assembles to on `core`.
    ///
    /// The enhanced core is a superset of the classic one, so it falls back
    /// to the base table.
    pub fn instruction(&self, mnemonic: &str, core: Core) -> Option<Template> {
        match core {
            Core::AvrE => self.enhanced.get(mnemonic).or_else(|| self.base.get(mnemonic)),
            Core::Avr => self.base.get(mnemonic),
        }
        .copied()
    }

    pub fn directive(&self, name: &str) -> Option<Directive> {
        self.directives.get(name).copied()
    }

    pub fn function(&self, name: &str) -> Option<Func> {
        self.functions.get(name).copied()
    }

    pub fn operator(&self, text: &str) -> Option<Operator> {
        self.operators.get(text).copied()
    }

    pub fn register(&self, name: &str) -> Option<NamedRegister> {
        self.registers.get(name).copied()
    }
}

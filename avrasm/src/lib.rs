use string_interner::DefaultSymbol;

pub mod device;
pub mod language;
pub mod lex;
pub mod parse;
pub mod source;

pub use self::language::{BinOp, Directive, Func, PointerMode, PointerReg, UnOp};
pub use self::lex::Radix;

/// A single statement pulled from the parser.
///
/// Every variant other than `Eof` and `Comment` carries the 1-based line the
/// statement started on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Line {
    Eof,
    Comment(String),
    Label {
        name: DefaultSymbol,
        line: u32,
    },
    Directive {
        directive: Directive,
        value: DirValue,
        line: u32,
    },
    Instruction {
        mnemonic: String,
        op1: Operand,
        op2: Operand,
        line: u32,
    },
}

impl Line {
    pub fn number(&self) -> Option<u32> {
        match self {
            Line::Eof | Line::Comment(_) => None,
            Line::Label { line, .. }
            | Line::Directive { line, .. }
            | Line::Instruction { line, .. } => Some(*line),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DirValue {
    Ident(DefaultSymbol),
    Immediate(Literal),
    Expr(Expr),
    Assign { name: DefaultSymbol, expr: Expr },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operand {
    None,
    Register(u32),
    /// `rH:rL`, only meaningful for the upper word registers.
    Pair {
        high: u32,
        low: u32,
    },
    Pointer {
        reg: PointerReg,
        mode: PointerMode<Literal>,
    },
    Expr(Expr),
}

/// Digits as written, without any radix prefix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Literal {
    pub radix: Radix,
    pub digits: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Expr {
    Literal(Literal),
    Ident(DefaultSymbol),
    /// the reserved `pc` identifier
    Pc,
    Unary {
        op: UnOp,
        expr: Box<Expr>,
    },
    Binary {
        op: BinOp,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },
    Call {
        func: Func,
        arg: Box<Expr>,
    },
}

use super::field::{validate_pair, EncodeError, Field, Value};

/// An opcode with its operand slots.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Template {
    /// Opcode with every operand bit clear. Long instructions keep the
    /// first word in the upper half.
    pub opcode: u32,
    pub op1: Option<Field>,
    pub op2: Option<Field>,
    /// two words instead of one
    pub long: bool,
    /// operands in a relative field are offsets from the next instruction
    pub relative: bool,
}

impl Template {
    const fn new(opcode: u32, op1: Option<Field>, op2: Option<Field>) -> Self {
        Self {
            opcode,
            op1,
            op2,
            long: false,
            relative: false,
        }
    }

    const fn long(self) -> Self {
        Self { long: true, ..self }
    }

    const fn relative(self) -> Self {
        Self {
            relative: true,
            ..self
        }
    }

    /// Size in program words.
    pub fn words(&self) -> u64 {
        if self.long {
            2
        } else {
            1
        }
    }

    /// Whether each operand is evaluated relative to the program counter.
    pub fn relative_operands(&self) -> (bool, bool) {
        let rel = |f: Option<Field>| self.relative && f.is_some_and(Field::is_relative);
        (rel(self.op1), rel(self.op2))
    }

    pub fn encode(&self, op1: &Value, op2: &Value) -> Result<u32, EncodeError> {
        validate_pair(op1, op2)?;
        let opcode = Field::apply(self.op1, self.opcode, op1)?;
        Field::apply(self.op2, opcode, op2)
    }

    /// Appends `opcode` as little-endian words, first word first.
    pub fn emit(&self, opcode: u32, out: &mut Vec<u8>) {
        if self.long {
            out.extend_from_slice(&((opcode >> 16) as u16).to_le_bytes());
        }
        out.extend_from_slice(&(opcode as u16).to_le_bytes());
    }
}

use Field::*;

const fn none(opcode: u32) -> Template {
    Template::new(opcode, None, None)
}

const fn one(opcode: u32, op1: Field) -> Template {
    Template::new(opcode, Some(op1), None)
}

const fn two(opcode: u32, op1: Field, op2: Field) -> Template {
    Template::new(opcode, Some(op1), Some(op2))
}

const fn branch(opcode: u32) -> Template {
    one(opcode, K7).relative()
}

/// Instructions every core implements.
pub(super) const BASE: &[(&str, Template)] = &[
    ("adc", two(0x1c00, Rd, Rr)),
    ("add", two(0x0c00, Rd, Rr)),
    ("adiw", two(0x9600, Pair, K6)),
    ("and", two(0x2000, Rd, Rr)),
    ("andi", two(0x7000, RdHigh, K8)),
    ("asr", one(0x9405, Rd)),
    ("bclr", one(0x9488, SregBit)),
    ("bld", two(0xf800, Rd, Bit)),
    ("brbc", two(0xf400, Bit, K7).relative()),
    ("brbs", two(0xf000, Bit, K7).relative()),
    ("brcc", branch(0xf400)),
    ("brcs", branch(0xf000)),
    ("breq", branch(0xf001)),
    ("brge", branch(0xf404)),
    ("brhc", branch(0xf405)),
    ("brhs", branch(0xf005)),
    ("brid", branch(0xf407)),
    ("brie", branch(0xf007)),
    ("brlo", branch(0xf000)),
    ("brlt", branch(0xf004)),
    ("brmi", branch(0xf002)),
    ("brne", branch(0xf401)),
    ("brpl", branch(0xf402)),
    ("brsh", branch(0xf400)),
    ("brtc", branch(0xf406)),
    ("brts", branch(0xf006)),
    ("brvc", branch(0xf403)),
    ("brvs", branch(0xf003)),
    ("bset", one(0x9408, SregBit)),
    ("bst", two(0xfa00, Rd, Bit)),
    ("cbi", two(0x9800, A5, Bit)),
    ("cbr", two(0x7000, RdHigh, K8Complement)),
    ("clc", none(0x9488)),
    ("clh", none(0x94d8)),
    ("cli", none(0x94f8)),
    ("cln", none(0x94a8)),
    ("clr", one(0x2400, RdRr)),
    ("cls", none(0x94c8)),
    ("clt", none(0x94e8)),
    ("clv", none(0x94b8)),
    ("clz", none(0x9498)),
    ("com", one(0x9400, Rd)),
    ("cp", two(0x1400, Rd, Rr)),
    ("cpc", two(0x0400, Rd, Rr)),
    ("cpi", two(0x3000, RdHigh, K8)),
    ("cpse", two(0x1000, Rd, Rr)),
    ("dec", one(0x940a, Rd)),
    ("eor", two(0x2400, Rd, Rr)),
    ("icall", none(0x9509)),
    ("ijmp", none(0x9409)),
    ("in", two(0xb000, Rd, A6)),
    ("inc", one(0x9403, Rd)),
    ("ld", two(0x8000, Rd, Pointer)),
    ("ldd", two(0x8000, Rd, Displacement)),
    ("ldi", two(0xe000, RdHigh, K8)),
    ("lds", two(0x9000_0000, RdLong, K16).long()),
    ("lpm", none(0x95c8)),
    ("lsl", one(0x0c00, RdRr)),
    ("lsr", one(0x9406, Rd)),
    ("mov", two(0x2c00, Rd, Rr)),
    ("neg", one(0x9401, Rd)),
    ("nop", none(0x0000)),
    ("or", two(0x2800, Rd, Rr)),
    ("ori", two(0x6000, RdHigh, K8)),
    ("out", two(0xb800, A6, Rd)),
    ("pop", one(0x900f, Rd)),
    ("push", one(0x920f, Rd)),
    ("rcall", one(0xd000, K12).relative()),
    ("ret", none(0x9508)),
    ("reti", none(0x9518)),
    ("rjmp", one(0xc000, K12).relative()),
    ("rol", one(0x1c00, RdRr)),
    ("ror", one(0x9407, Rd)),
    ("sbc", two(0x0800, Rd, Rr)),
    ("sbci", two(0x4000, RdHigh, K8)),
    ("sbi", two(0x9a00, A5, Bit)),
    ("sbic", two(0x9900, A5, Bit)),
    ("sbis", two(0x9b00, A5, Bit)),
    ("sbiw", two(0x9700, Pair, K6)),
    ("sbr", two(0x6000, RdHigh, K8)),
    ("sbrc", two(0xfc00, Rd, Bit)),
    ("sbrs", two(0xfe00, Rd, Bit)),
    ("sec", none(0x9408)),
    ("seh", none(0x9458)),
    ("sei", none(0x9478)),
    ("sen", none(0x9428)),
    ("ser", one(0xef0f, RdHigh)),
    ("ses", none(0x9448)),
    ("set", none(0x9468)),
    ("sev", none(0x9438)),
    ("sez", none(0x9418)),
    ("sleep", none(0x9588)),
    ("st", two(0x8200, Pointer, Rd)),
    ("std", two(0x8200, Displacement, Rd)),
    ("sts", two(0x9200_0000, K16, RdLong).long()),
    ("sub", two(0x1800, Rd, Rr)),
    ("subi", two(0x5000, RdHigh, K8)),
    ("swap", one(0x9402, Rd)),
    ("tst", one(0x2000, RdRr)),
    ("wdr", none(0x95a8)),
];

/// Additions of the enhanced core.
pub(super) const ENHANCED: &[(&str, Template)] = &[
    ("break", none(0x9598)),
    ("call", one(0x940e_0000, K22).long()),
    ("fmul", two(0x0308, RdMul, RrMul)),
    ("fmuls", two(0x0380, RdMul, RrMul)),
    ("fmulsu", two(0x0388, RdMul, RrMul)),
    ("jmp", one(0x940c_0000, K22).long()),
    ("movw", two(0x0100, RdEven, RrEven)),
    ("mul", two(0x9c00, Rd, Rr)),
    ("muls", two(0x0200, RdHigh, RrHigh)),
    ("mulsu", two(0x0300, RdMul, RrMul)),
    ("spm", none(0x95e8)),
];

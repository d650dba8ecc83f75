use std::fmt;

use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerReg {
    X,
    Y,
    Z,
}

impl PointerReg {
    /// The general purpose registers backing this pointer, low byte first.
    pub fn registers(self) -> [u32; 2] {
        match self {
            PointerReg::X => [26, 27],
            PointerReg::Y => [28, 29],
            PointerReg::Z => [30, 31],
        }
    }
}

impl fmt::Display for PointerReg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            PointerReg::X => "x",
            PointerReg::Y => "y",
            PointerReg::Z => "z",
        })
    }
}

/// `D` is the displacement: a literal in the AST, a number once evaluated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerMode<D> {
    Plain,
    PostInc,
    PreDec,
    Displacement(D),
}

/// An operand after evaluation, ready to be packed into an opcode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Value {
    None,
    Register(u32),
    Pair { high: u32, low: u32 },
    Pointer { reg: PointerReg, mode: PointerMode<u64> },
    Int(u64),
}

impl Value {
    fn kind(&self) -> &'static str {
        match self {
            Value::None => "nothing",
            Value::Register(_) => "a register",
            Value::Pair { .. } => "a register pair",
            Value::Pointer { .. } => "a pointer",
            Value::Int(_) => "a number",
        }
    }
}

struct PointerForm(PointerReg, PointerMode<u64>);

impl fmt::Display for PointerForm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.1 {
            PointerMode::Plain => write!(f, "{}", self.0),
            PointerMode::PostInc => write!(f, "{}+", self.0),
            PointerMode::PreDec => write!(f, "-{}", self.0),
            PointerMode::Displacement(q) => write!(f, "{}+{q}", self.0),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EncodeError {
    #[error("register specified does not exist")]
    NoSuchRegister,
    #[error("instruction only operates on registers {0}")]
    RegisterClass(&'static str),
    #[error("registers r{high}:r{low} do not form a pair")]
    NotAPair { high: u32, low: u32 },
    #[error("{field} larger than {bits} bits")]
    TooLarge { field: &'static str, bits: u32 },
    #[error("{field} out of range for a signed {bits} bit field")]
    OutOfRange { field: &'static str, bits: u32 },
    #[error("expected {expected}, found {found}")]
    Mismatch {
        expected: &'static str,
        found: &'static str,
    },
    #[error("missing operand, expected {0}")]
    Missing(&'static str),
    #[error("unexpected operand, found {0}")]
    Unexpected(&'static str),
    #[error("pointer does not take a displacement here")]
    DisplacementNotAllowed,
    #[error("pointer must be y or z with a displacement")]
    DisplacementRequired,
    #[error("using r{register} with {pointer} is undefined")]
    Undefined { register: u32, pointer: String },
}

/// How an operand is packed into its instruction word.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    /// destination register, bits 4-8
    Rd,
    /// source register, bits 0-3 and 9
    Rr,
    /// one register written into both `Rd` and `Rr`
    RdRr,
    /// r16-r31, bits 4-7
    RdHigh,
    /// r16-r31, bits 0-3
    RrHigh,
    /// r16-r23, bits 4-6
    RdMul,
    /// r16-r23, bits 0-2
    RrMul,
    /// even register, halved into bits 4-7
    RdEven,
    /// even register, halved into bits 0-3
    RrEven,
    /// register in the first word of a long instruction
    RdLong,
    /// r24, r26, r28 or r30 as a pair, bits 4-5
    Pair,
    /// 8-bit immediate, bits 0-3 and 8-11
    K8,
    /// 8-bit immediate stored inverted
    K8Complement,
    /// 6-bit immediate, bits 0-3 and 6-7
    K6,
    /// signed 7-bit word offset, bits 3-9
    K7,
    /// signed 12-bit word offset
    K12,
    /// 16-bit data address in the second word
    K16,
    /// 22-bit program address split across both words
    K22,
    /// 5-bit I/O address, bits 3-7
    A5,
    /// 6-bit I/O address, bits 0-3 and 9-10
    A6,
    Bit,
    SregBit,
    /// `x`, `y`, `z` with optional post-increment or pre-decrement
    Pointer,
    /// `y+q` or `z+q`
    Displacement,
}

impl Field {
    /// Branch targets are encoded as offsets from the next instruction.
    pub fn is_relative(self) -> bool {
        matches!(self, Field::K7 | Field::K12)
    }

    fn expects(self) -> &'static str {
        use Field::*;
        match self {
            Rd | Rr | RdRr | RdHigh | RrHigh | RdMul | RrMul | RdEven | RrEven | RdLong => {
                "a register"
            }
            Pair => "a register pair",
            K8 | K8Complement | K6 | K7 | K12 | K16 | K22 | A5 | A6 | Bit | SregBit => "a number",
            Pointer | Displacement => "a pointer",
        }
    }

    /// Folds `value` into `opcode`.
    pub fn encode(self, opcode: u32, value: &Value) -> Result<u32, EncodeError> {
        use Field::*;
        let bits = match self {
            Rd => register(value)? << 4,
            Rr => {
                let r = register(value)?;
                (r & 0xf) | (r & 0x10) << 5
            }
            RdRr => {
                let r = register(value)?;
                r << 4 | (r & 0xf) | (r & 0x10) << 5
            }
            RdHigh => (ranged(value, 16, 31, "r16-r31")? - 16) << 4,
            RrHigh => ranged(value, 16, 31, "r16-r31")? - 16,
            RdMul => (ranged(value, 16, 23, "r16-r23")? - 16) << 4,
            RrMul => ranged(value, 16, 23, "r16-r23")? - 16,
            RdEven => even(value)? << 4,
            RrEven => even(value)?,
            RdLong => register(value)? << 20,
            Pair => (word_pair(value)? - 24) / 2 << 4,
            K8 => {
                let k = byte(value)?;
                (k & 0xf) | (k & 0xf0) << 4
            }
            K8Complement => {
                let k = !byte(value)? & 0xff;
                (k & 0xf) | (k & 0xf0) << 4
            }
            K6 => {
                let k = unsigned(value, "k", 6)?;
                (k & 0xf) | (k & 0x30) << 2
            }
            K7 => signed(value, "k", 7)? << 3,
            K12 => signed(value, "k", 12)?,
            K16 => unsigned(value, "k", 16)?,
            K22 => {
                let k = unsigned(value, "k", 22)?;
                (k & 0x1_ffff) | (k >> 17) << 20
            }
            A5 => unsigned(value, "address", 5)? << 3,
            A6 => {
                let a = unsigned(value, "address", 6)?;
                (a & 0xf) | (a & 0x30) << 5
            }
            Bit => unsigned(value, "bit", 3)?,
            SregBit => unsigned(value, "bit", 3)? << 4,
            Pointer => pointer(value)?,
            Displacement => displacement(value)?,
        };
        Ok(opcode | bits)
    }

    /// Like [`Field::encode`], but also checks presence: a missing field
    /// must pair with [`Value::None`].
    pub fn apply(field: Option<Field>, opcode: u32, value: &Value) -> Result<u32, EncodeError> {
        match (field, value) {
            (None, Value::None) => Ok(opcode),
            (None, v) => Err(EncodeError::Unexpected(v.kind())),
            (Some(f), Value::None) => Err(EncodeError::Missing(f.expects())),
            (Some(f), v) => f.encode(opcode, v),
        }
    }
}

fn mismatch(expected: &'static str, found: &Value) -> EncodeError {
    EncodeError::Mismatch {
        expected,
        found: found.kind(),
    }
}

fn register(value: &Value) -> Result<u32, EncodeError> {
    match *value {
        Value::Register(r) if r <= 31 => Ok(r),
        Value::Register(_) => Err(EncodeError::NoSuchRegister),
        ref v => Err(mismatch("a register", v)),
    }
}

fn ranged(value: &Value, lo: u32, hi: u32, class: &'static str) -> Result<u32, EncodeError> {
    let r = register(value)?;
    if (lo..=hi).contains(&r) {
        Ok(r)
    } else {
        Err(EncodeError::RegisterClass(class))
    }
}

/// An even register, given either bare or as the low half of `rH:rL`.
fn even(value: &Value) -> Result<u32, EncodeError> {
    let r = match *value {
        Value::Pair { high, low } => pair(high, low)?,
        ref v => register(v)?,
    };
    if r % 2 == 0 {
        Ok(r / 2)
    } else {
        Err(EncodeError::RegisterClass("with an even number"))
    }
}

fn pair(high: u32, low: u32) -> Result<u32, EncodeError> {
    if high > 31 || low > 31 {
        Err(EncodeError::NoSuchRegister)
    } else if low % 2 != 0 || high != low + 1 {
        Err(EncodeError::NotAPair { high, low })
    } else {
        Ok(low)
    }
}

fn word_pair(value: &Value) -> Result<u32, EncodeError> {
    let low = match *value {
        Value::Pair { high, low } => pair(high, low)?,
        Value::Register(r) if r > 31 => return Err(EncodeError::NoSuchRegister),
        Value::Register(r) => r,
        ref v => return Err(mismatch("a register pair", v)),
    };
    match low {
        24 | 26 | 28 | 30 => Ok(low),
        _ => Err(EncodeError::RegisterClass("r24, r26, r28 and r30")),
    }
}

fn int(value: &Value) -> Result<u64, EncodeError> {
    match *value {
        Value::Int(k) => Ok(k),
        ref v => Err(mismatch("a number", v)),
    }
}

fn unsigned(value: &Value, field: &'static str, bits: u32) -> Result<u32, EncodeError> {
    let k = int(value)?;
    if k >> bits != 0 {
        return Err(EncodeError::TooLarge { field, bits });
    }
    Ok(k as u32)
}

/// Two's complement, truncated to `bits`.
fn signed(value: &Value, field: &'static str, bits: u32) -> Result<u32, EncodeError> {
    let k = int(value)? as i64;
    let limit = 1i64 << (bits - 1);
    if k < -limit || k >= limit {
        return Err(EncodeError::OutOfRange { field, bits });
    }
    Ok(k as u32 & ((1 << bits) - 1))
}

/// Accepts -128..=255 so both `ldi r16, -1` and `ldi r16, 0xff` work.
fn byte(value: &Value) -> Result<u32, EncodeError> {
    let k = int(value)? as i64;
    if !(-128..=255).contains(&k) {
        return Err(EncodeError::TooLarge { field: "k", bits: 8 });
    }
    Ok(k as u32 & 0xff)
}

fn pointer(value: &Value) -> Result<u32, EncodeError> {
    let Value::Pointer { reg, mode } = *value else {
        return Err(mismatch("a pointer", value));
    };
    let step = match mode {
        PointerMode::Plain => 0,
        PointerMode::PostInc => 1,
        PointerMode::PreDec => 2,
        PointerMode::Displacement(_) => return Err(EncodeError::DisplacementNotAllowed),
    };
    let select = match reg {
        PointerReg::X => 0xc,
        PointerReg::Y => 0x8,
        PointerReg::Z => 0x0,
    };
    // plain y and z share the displacement encoding with q = 0
    let indexed = if reg == PointerReg::X || mode != PointerMode::Plain {
        0x1000
    } else {
        0
    };
    Ok(indexed | select | step)
}

fn displacement(value: &Value) -> Result<u32, EncodeError> {
    let Value::Pointer { reg, mode } = *value else {
        return Err(mismatch("a pointer", value));
    };
    let q = match (reg, mode) {
        (PointerReg::X, _) => return Err(EncodeError::DisplacementRequired),
        (_, PointerMode::Plain) => 0,
        (_, PointerMode::Displacement(q)) => q,
        (_, PointerMode::PostInc | PointerMode::PreDec) => {
            return Err(EncodeError::DisplacementRequired)
        }
    };
    if q > 63 {
        return Err(EncodeError::TooLarge {
            field: "displacement",
            bits: 6,
        });
    }
    let q = q as u32;
    let select = if reg == PointerReg::Y { 0x8 } else { 0 };
    Ok((q & 0x20) << 8 | (q & 0x18) << 7 | (q & 0x7) | select)
}

/// Rejects register/pointer combinations whose result the hardware leaves
/// undefined, e.g. `ld r26, x+` or `st -z, r31`.
pub fn validate_pair(op1: &Value, op2: &Value) -> Result<(), EncodeError> {
    let (register, reg, mode) = match (*op1, *op2) {
        (Value::Register(r), Value::Pointer { reg, mode })
        | (Value::Pointer { reg, mode }, Value::Register(r)) => (r, reg, mode),
        _ => return Ok(()),
    };
    let writes_back = matches!(mode, PointerMode::PostInc | PointerMode::PreDec);
    if writes_back && reg.registers().contains(&register) {
        return Err(EncodeError::Undefined {
            register,
            pointer: PointerForm(reg, mode).to_string(),
        });
    }
    Ok(())
}

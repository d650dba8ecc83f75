use expect_test::{expect, Expect};

use crate::device::Core;

use super::*;

fn check(mnemonic: &str, op1: Value, op2: Value, expect: Expect) {
    let registry = Registry::new();
    let template = registry.instruction(mnemonic, Core::AvrE).unwrap();
    let actual = match template.encode(&op1, &op2) {
        Ok(opcode) if template.long => format!("{opcode:#010x}"),
        Ok(opcode) => format!("{opcode:#06x}"),
        Err(e) => e.to_string(),
    };
    expect.assert_eq(&actual);
}

use Value::{Int, Register as R};

fn neg(k: i64) -> Value {
    Int(k as u64)
}

fn ptr(reg: PointerReg, mode: PointerMode<u64>) -> Value {
    Value::Pointer { reg, mode }
}

#[test]
fn registers() {
    check("add", R(1), R(2), expect!["0x0c12"]);
    check("add", R(31), R(31), expect!["0x0fff"]);
    check("clr", R(17), Value::None, expect!["0x2711"]);
    check("mov", R(32), R(0), expect!["register specified does not exist"]);
    check("add", R(1), Int(2), expect!["expected a register, found a number"]);
    check("add", R(1), Value::None, expect!["missing operand, expected a register"]);
    check("nop", Int(1), Value::None, expect!["unexpected operand, found a number"]);
}

#[test]
fn immediates() {
    check("ldi", R(16), Int(255), expect!["0xef0f"]);
    check("ldi", R(16), neg(-1), expect!["0xef0f"]);
    check("ldi", R(31), Int(0x12), expect!["0xe1f2"]);
    check("ldi", R(16), Int(256), expect!["k larger than 8 bits"]);
    check("ldi", R(15), Int(1), expect!["instruction only operates on registers r16-r31"]);
    check("cbr", R(16), Int(0x0f), expect!["0x7f00"]);
    check("ser", R(20), Value::None, expect!["0xef4f"]);
}

#[test]
fn word_pairs() {
    check("adiw", R(24), Int(1), expect!["0x9601"]);
    check("adiw", Value::Pair { high: 31, low: 30 }, Int(63), expect!["0x96ff"]);
    check("sbiw", R(26), Int(64), expect!["k larger than 6 bits"]);
    check(
        "adiw",
        R(25),
        Int(1),
        expect!["instruction only operates on registers r24, r26, r28 and r30"],
    );
    check(
        "adiw",
        Value::Pair { high: 27, low: 24 },
        Int(1),
        expect!["registers r27:r24 do not form a pair"],
    );
    check("movw", R(24), R(22), expect!["0x01cb"]);
    check(
        "movw",
        R(23),
        R(22),
        expect!["instruction only operates on registers with an even number"],
    );
}

#[test]
fn multiply() {
    check("mul", R(0), R(31), expect!["0x9e0f"]);
    check("muls", R(16), R(31), expect!["0x020f"]);
    check("fmul", R(23), R(16), expect!["0x0378"]);
    check("mulsu", R(24), R(16), expect!["instruction only operates on registers r16-r23"]);
}

#[test]
fn branches() {
    check("rjmp", neg(-1), Value::None, expect!["0xcfff"]);
    check("rjmp", Int(2047), Value::None, expect!["0xc7ff"]);
    check("rjmp", Int(2048), Value::None, expect!["k out of range for a signed 12 bit field"]);
    check("brne", neg(-1), Value::None, expect!["0xf7f9"]);
    check("brne", neg(-65), Value::None, expect!["k out of range for a signed 7 bit field"]);
    check("brbs", Int(1), Int(4), expect!["0xf021"]);
}

#[test]
fn long_instructions() {
    check("jmp", Int(0x3f_ffff), Value::None, expect!["0x95fdffff"]);
    check("jmp", Int(0x40_0000), Value::None, expect!["k larger than 22 bits"]);
    check("call", Int(0x100), Value::None, expect!["0x940e0100"]);
    check("lds", R(16), Int(0x100), expect!["0x91000100"]);
    check("sts", Int(0xffff), R(31), expect!["0x93f0ffff"]);
}

#[test]
fn io() {
    check("in", R(16), Int(0x3f), expect!["0xb70f"]);
    check("out", Int(0x3f), R(0), expect!["0xbe0f"]);
    check("out", Int(0x40), R(0), expect!["address larger than 6 bits"]);
    check("sbi", Int(0x1f), Int(7), expect!["0x9aff"]);
    check("cbi", Int(0x1f), Int(8), expect!["bit larger than 3 bits"]);
    check("bset", Int(7), Value::None, expect!["0x9478"]);
}

#[test]
fn pointers() {
    use PointerMode::*;
    use PointerReg::*;
    check("ld", R(0), ptr(X, Plain), expect!["0x900c"]);
    check("ld", R(0), ptr(X, PostInc), expect!["0x900d"]);
    check("ld", R(16), ptr(Z, Plain), expect!["0x8100"]);
    check("ld", R(1), ptr(Y, PreDec), expect!["0x901a"]);
    check("st", ptr(Y, PreDec), R(2), expect!["0x922a"]);
    check(
        "ld",
        R(0),
        ptr(Y, Displacement(1)),
        expect!["pointer does not take a displacement here"],
    );
    check("ldd", R(4), ptr(Y, Displacement(63)), expect!["0xac4f"]);
    check("ldd", R(4), ptr(Y, Displacement(64)), expect!["displacement larger than 6 bits"]);
    check(
        "ldd",
        R(0),
        ptr(X, Displacement(1)),
        expect!["pointer must be y or z with a displacement"],
    );
    check("std", ptr(Z, Displacement(1)), R(0), expect!["0x8201"]);
    check("ld", R(0), Int(1), expect!["expected a pointer, found a number"]);
}

#[test]
fn undefined_combinations() {
    use PointerMode::*;
    use PointerReg::*;
    check("ld", R(26), ptr(X, PostInc), expect!["using r26 with x+ is undefined"]);
    check("st", ptr(Z, PreDec), R(31), expect!["using r31 with -z is undefined"]);
    check("ld", R(26), ptr(X, Plain), expect!["0x91ac"]);
    check("ld", R(28), ptr(X, PostInc), expect!["0x91cd"]);
    assert_eq!(validate_pair(&R(30), &Int(1)), Ok(()));
}

#[test]
fn classify() {
    let registry = Registry::new();
    let kinds: Vec<_> = ["ldi", "jmp", "equ", "low", "x", "pc", "loop", "r16"]
        .iter()
        .map(|w| registry.classify(w))
        .collect();
    assert_eq!(
        kinds,
        [
            Keyword::Instruction,
            Keyword::Instruction,
            Keyword::Directive(Directive::Equ),
            Keyword::Function(Func::Low),
            Keyword::Register(NamedRegister::Pointer(PointerReg::X)),
            Keyword::Register(NamedRegister::Pc),
            Keyword::Ident,
            Keyword::Ident,
        ]
    );
}

#[test]
fn cores() {
    let registry = Registry::new();
    assert!(registry.instruction("mul", Core::Avr).is_none());
    assert!(registry.instruction("mul", Core::AvrE).is_some());
    assert_eq!(
        registry.instruction("nop", Core::Avr),
        registry.instruction("nop", Core::AvrE)
    );
    assert_eq!(registry.instruction("jmp", Core::AvrE).map(|t| t.words()), Some(2));
    let relative = |m: &str| registry.instruction(m, Core::AvrE).map(|t| t.relative_operands());
    assert_eq!(relative("rjmp"), Some((true, false)));
    assert_eq!(relative("brbs"), Some((false, true)));
}

#[test]
fn operators() {
    let registry = Registry::new();
    let minus = registry.operator("-").unwrap();
    assert_eq!(minus.unary, Some(UnOp::Neg));
    assert_eq!(minus.binary, Some(BinOp::Sub));
    assert_eq!(registry.operator("~").and_then(|o| o.binary), None);
    assert_eq!(registry.operator("<=").and_then(|o| o.binary), Some(BinOp::Le));
    assert_eq!(registry.operator("?"), None);
    assert!(BinOp::Mul.binding_power() > BinOp::Add.binding_power());
    assert!(UnOp::Neg.binding_power() > BinOp::Mul.binding_power());
}

#[test]
fn arithmetic() {
    assert_eq!(BinOp::Div.apply(7, 0), None);
    assert_eq!(BinOp::Mod.apply(7, 0), None);
    assert_eq!(BinOp::Sub.apply(0, 1), Some(u64::MAX));
    assert_eq!(BinOp::Shl.apply(1, 70), Some(0));
    assert_eq!(BinOp::And.apply(2, 3), Some(1));
    assert_eq!(UnOp::Not.apply(5), 0);
    assert_eq!(UnOp::BitNot.apply(0), u64::MAX);
}

#[test]
fn functions() {
    let results: Vec<u64> = [
        (Func::Low, 0x1234),
        (Func::High, 0x1234),
        (Func::Byte3, 0x12_3456),
        (Func::Byte4, 0x1234_5678),
        (Func::Lwrd, 0x1234_5678),
        (Func::Hwrd, 0x1234_5678),
        (Func::Page, 0x1_2345),
        (Func::Exp2, 3),
        (Func::Log2, 1024),
        (Func::Log2, 0),
        (Func::Abs, (-5i64) as u64),
    ]
    .iter()
    .map(|&(f, v)| f.apply(v))
    .collect();
    assert_eq!(results, [0x34, 0x12, 0x12, 0x12, 0x5678, 0x1234, 1, 8, 10, 0, 5]);
}

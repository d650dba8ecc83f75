use avrasm::language::Registry;
use avrasm::parse::Parser;
use avrasm::source::BufferSource;
use avrasm::{Line, Operand};
use expect_test::{expect, Expect};

use super::Scope;
use crate::symbols::SymbolTable;

/// Evaluates the operand of `rjmp <expr>` with `word = 0x1234` and
/// `target = 10` defined, printing the result as a signed number.
fn check(expr: &str, relative: bool, pc: u64, expect: Expect) {
    let registry = Registry::new();
    let src = format!("rjmp {expr}");
    let mut parser = Parser::new(BufferSource::from(src.as_str()), &registry);
    let mut symbols = SymbolTable::default();
    symbols.insert(parser.si.get_or_intern("word"), 0x1234).unwrap();
    symbols.insert(parser.si.get_or_intern("target"), 10).unwrap();
    let Line::Instruction { op1: Operand::Expr(expr), .. } = parser.next_line().unwrap() else {
        panic!("expected an expression operand");
    };
    let scope = Scope {
        symbols: &symbols,
        names: &parser.si,
        pc,
    };
    let actual = match scope.expr(&expr, relative) {
        Ok(v) => (v as i64).to_string(),
        Err(e) => e.to_string(),
    };
    expect.assert_eq(&actual);
}

#[test]
fn arithmetic() {
    check("1 + 2 * 3", false, 0, expect!["7"]);
    check("(1 + 2) * 3", false, 0, expect!["9"]);
    check("-2 * 3", false, 0, expect!["-6"]);
    check("0x10 | 0b0011 ^ 017", false, 0, expect!["28"]);
    check("1 << 4 >> 2", false, 0, expect!["4"]);
    check("7 % 4 == 3 && 2 > 1", false, 0, expect!["1"]);
    check("~0", false, 0, expect!["-1"]);
    check("!5 || 0", false, 0, expect!["0"]);
    check("0 - 1", false, 0, expect!["-1"]);
}

#[test]
fn functions() {
    check("low(word)", false, 0, expect!["52"]);
    check("high(word) + byte2(word)", false, 0, expect!["36"]);
    check("exp2(log2(64))", false, 0, expect!["64"]);
    check("abs(-5)", false, 0, expect!["5"]);
}

#[test]
fn identifiers() {
    check("target", false, 4, expect!["10"]);
    check("pc", false, 4, expect!["4"]);
    check("pc + 2", true, 4, expect!["6"]);
    check("missing + 1", false, 0, expect!["identifier 'missing' unknown"]);
}

#[test]
fn relative() {
    check("target", true, 4, expect!["5"]);
    check("target", true, 9, expect!["0"]);
    check("target", true, 10, expect!["-1"]);
    check("target", true, 11, expect!["-2"]);
}

#[test]
fn errors() {
    check("1 / 0", false, 0, expect!["division by zero"]);
    check("word % (target - 10)", false, 0, expect!["division by zero"]);
    check(
        "0x1ffffffffffffffff",
        false,
        0,
        expect!["hexadecimal literal '0x1ffffffffffffffff' does not fit in 64 bits"],
    );
}

#[test]
fn operands() {
    let registry = Registry::new();
    let mut parser = Parser::new(BufferSource::from("ldd r1, y+0x3f"), &registry);
    let Line::Instruction { op1, op2, .. } = parser.next_line().unwrap() else {
        panic!("expected an instruction");
    };
    let symbols = SymbolTable::default();
    let scope = Scope {
        symbols: &symbols,
        names: &parser.si,
        pc: 0,
    };
    let op1 = scope.operand(&op1, false).unwrap();
    let op2 = scope.operand(&op2, false).unwrap();
    assert_eq!(
        format!("{op1:?} {op2:?}"),
        "Register(1) Pointer { reg: Y, mode: Displacement(63) }"
    );
    assert_eq!(scope.operand(&Operand::None, true), Ok(avrasm::language::Value::None));
}

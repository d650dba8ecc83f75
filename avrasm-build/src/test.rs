use avrasm::language::Registry;
use avrasm::source::BufferSource;
use expect_test::{expect, Expect};

use super::sink::BufferSink;
use super::{assemble, Assembler};

fn check(src: &str, expect: Expect) {
    let actual = match assemble(src) {
        Ok(image) => image
            .iter()
            .map(|b| format!("{b:02x}"))
            .collect::<Vec<_>>()
            .join(" "),
        Err(e) => e.to_string(),
    };
    expect.assert_eq(&actual);
}

#[test]
fn empty() {
    check("", expect![[""]]);
    check("; nothing here\n\n", expect![[""]]);
}

#[test]
fn backward_branch() {
    check("loop: nop\nrjmp loop", expect!["00 00 fe cf"]);
}

#[test]
fn forward_branch() {
    check("rjmp end\nnop\nend: nop", expect!["01 c0 00 00 00 00"]);
    check("rjmp next\nnext: nop", expect!["00 c0 00 00"]);
    check("here: rjmp here", expect!["ff cf"]);
    check("breq done\nnop\ndone:", expect!["09 f0 00 00"]);
}

#[test]
fn immediate_range() {
    check("ldi r16, 255", expect!["0f ef"]);
    check("ldi r16, 256", expect!["k larger than 8 bits on line 1"]);
}

#[test]
fn constants() {
    check(
        ".equ port = 0x18\n.equ bit = 3\nsbi port, bit\n\
         ldi r16, low(0x1234)\nldi r17, high(0x1234)",
        expect!["c3 9a 04 e3 12 e1"],
    );
    check(".equ a = b\n.equ b = 1", expect!["identifier 'b' unknown on line 1"]);
    check(".equ v = 1\nv: nop", expect!["duplicate label 'v' on line 2"]);
    check("v: nop\n.equ v = 1", expect!["duplicate label 'v' on line 2"]);
    check(".equ x = 1", expect!["unexpected register 'x' in expression on line 1"]);
}

#[test]
fn duplicate_label() {
    check("a: nop\na: nop", expect!["duplicate label 'a' on line 2"]);
}

#[test]
fn devices() {
    check(".device unknownname", expect!["unrecognised device 'unknownname' on line 1"]);
    check("jmp 0x100", expect!["instruction 'jmp' is not available on the AVR core on line 1"]);
    check(
        ".device atmega328p\njmp start\nstart: call start",
        expect!["0c 94 02 00 0e 94 02 00"],
    );
    check(".device atmega8\nmul r0, r1", expect!["01 9c"]);
    check(".device 5", expect![".device expects a device name on line 1"]);
    check(".equ v", expect![".equ expects an assignment such as 'name = value' on line 1"]);
}

#[test]
fn long_instructions() {
    check("lds r16, 0x0100\nsts 0x0101, r16", expect!["00 91 00 01 00 93 01 01"]);
}

#[test]
fn errors_carry_lines() {
    check("ld r26, x+", expect!["using r26 with x+ is undefined on line 1"]);
    check(
        "nop\nldi r16 r17",
        expect!["unexpected register 'r17' at the end of a statement on line 2"],
    );
    check(
        "; header\n\nnop\n  rjmp nowhere ; x\n",
        expect!["identifier 'nowhere' unknown on line 4"],
    );
    check("nop\n\n\nfoo", expect!["unexpected end of file after identifier 'foo' on line 4"]);
}

#[test]
fn pass_one_counts_match_image() {
    let registry = Registry::new();
    let src = "nop\nlds r0, 1\nloop: rjmp loop\n.device atmega328p\ncall loop\nend:\n";
    let mut asm = Assembler::new(BufferSource::from(src), &registry);
    let image = asm.run().unwrap();
    assert_eq!(asm.symbol("loop"), Some(3));
    assert_eq!(asm.symbol("end"), Some(6));
    assert_eq!(image.len() as u64, 2 * asm.symbol("end").unwrap());
    assert_eq!(asm.pc(), 6);
    assert_eq!(asm.device().name, "atmega328p");
}

#[test]
fn rerun_is_identical() {
    let registry = Registry::new();
    let src = "start: ldi r16, 1\nbrne start\n.equ k = 4\nsbiw r24, k";
    let mut asm = Assembler::new(BufferSource::from(src), &registry);
    let first = asm.run().unwrap();
    let second = asm.run().unwrap();
    assert_eq!(first, second);
    assert_eq!(asm.symbols().len(), 2);
    assert!(!asm.symbols().is_empty());

    let mut sink = BufferSink::default();
    assert_eq!(asm.assemble_into(&mut sink).unwrap(), first.len());
    assert_eq!(sink.into_bytes(), first);
}

#[test]
fn failed_run_writes_nothing() {
    let registry = Registry::new();
    let mut asm = Assembler::new(BufferSource::from("nop\nrjmp missing"), &registry);
    let mut sink = BufferSink::default();
    let err = asm.assemble_into(&mut sink).unwrap_err();
    assert_eq!(err.line(), Some(2));
    assert!(asm.symbols().is_empty());
    assert!(sink.bytes().is_empty());
}

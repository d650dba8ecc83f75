use std::io;

use expect_test::{expect, Expect};

use super::{Lexer, Token, TokenKind};
use crate::language::Registry;
use crate::source::{BufferSource, Source};

fn check(src: &str, expect: Expect) {
    let registry = Registry::new();
    let mut lexer = Lexer::new(BufferSource::from(src), &registry);
    let actual: String = lexer
        .tokens()
        .map(|tok| format!("{}\n", tok.unwrap()))
        .collect();
    expect.assert_eq(&actual);
}

#[test]
fn instruction() {
    check(
        "ldi r16, 0xff ; load\n",
        expect![[r#"
            [IST : ldi]
            [REG : 16]
            [,   : ,]
            [HEX : ff]
            [COM :  load]
            [EOL : \n]
            [EOF : ]
        "#]],
    );
}

#[test]
fn label_and_directive() {
    check(
        "loop: rjmp loop\n.equ k = (0b101 + 017) << 2\n",
        expect![[r#"
            [IDT : loop]
            [:   : :]
            [IST : rjmp]
            [IDT : loop]
            [EOL : \n]
            [.   : .]
            [DIR : equ]
            [IDT : k]
            [=   : =]
            [(   : (]
            [BIN : 101]
            [OP  : +]
            [OCT : 17]
            [)   : )]
            [OP  : <<]
            [IMM : 2]
            [EOL : \n]
            [EOF : ]
        "#]],
    );
}

#[test]
fn named_registers() {
    check(
        "LD R0, X+\nst -Y, r1\nlow(pc)",
        expect![[r#"
            [IST : ld]
            [REG : 0]
            [,   : ,]
            [REG : x]
            [OP  : +]
            [EOL : \n]
            [IST : st]
            [OP  : -]
            [REG : y]
            [,   : ,]
            [REG : 1]
            [EOL : \n]
            [FUN : low]
            [(   : (]
            [REG : pc]
            [)   : )]
            [EOF : ]
        "#]],
    );
}

#[test]
fn words_starting_with_r() {
    check(
        "r ret r31x",
        expect![[r#"
            [IDT : r]
            [IST : ret]
            [IDT : r31x]
            [EOF : ]
        "#]],
    );
}

#[test]
fn operators() {
    check(
        "a<=b!=c&&d||e>f>=g==h&i|j!k",
        expect![[r#"
            [IDT : a]
            [OP  : <=]
            [IDT : b]
            [OP  : !=]
            [IDT : c]
            [OP  : &&]
            [IDT : d]
            [OP  : ||]
            [IDT : e]
            [OP  : >]
            [IDT : f]
            [OP  : >=]
            [IDT : g]
            [OP  : ==]
            [IDT : h]
            [OP  : &]
            [IDT : i]
            [OP  : |]
            [IDT : j]
            [OP  : !]
            [IDT : k]
            [EOF : ]
        "#]],
    );
}

#[test]
fn numbers() {
    check(
        "0 10 0x1F 0b0110 0777",
        expect![[r#"
            [IMM : 0]
            [IMM : 10]
            [HEX : 1f]
            [BIN : 0110]
            [OCT : 777]
            [EOF : ]
        "#]],
    );
}

#[test]
fn malformed() {
    check(
        "ldi r16, 12a",
        expect![[r#"
            [IST : ldi]
            [REG : 16]
            [,   : ,]
            [ERR : 12a]
        "#]],
    );
    check("nop ?", expect![[r#"
        [IST : nop]
        [ERR : ?]
    "#]]);
    check("0x\nnop", expect![[r#"
        [ERR : 0x]
    "#]]);
    check("0b", expect![[r#"
        [ERR : 0b]
    "#]]);
    check("089", expect![[r#"
        [ERR : 08]
    "#]]);
    check("0x1g", expect![[r#"
        [ERR : 0x1g]
    "#]]);
    check("0b12", expect![[r#"
        [ERR : 0b12]
    "#]]);
    check("0179", expect![[r#"
        [ERR : 0179]
    "#]]);
    check("$", expect![[r#"
        [ERR : $]
    "#]]);
}

#[test]
fn eof_after_error() {
    let registry = Registry::new();
    let mut lexer = Lexer::new(BufferSource::from("@ nop"), &registry);
    assert_eq!(lexer.next_token().unwrap().kind, TokenKind::Error);
    assert_eq!(lexer.next_token().unwrap(), Token::eof());
    assert_eq!(lexer.next_token().unwrap(), Token::eof());
}

#[test]
fn reset_replays() {
    let registry = Registry::new();
    let mut lexer = Lexer::new(BufferSource::from("add r1, r2 ; sum\nret"), &registry);
    let first: Vec<Token> = lexer.tokens().map(Result::unwrap).collect();
    assert_eq!(lexer.next_token().unwrap(), Token::eof());
    lexer.reset().unwrap();
    let second: Vec<Token> = lexer.tokens().map(Result::unwrap).collect();
    assert_eq!(first, second);
    assert_eq!(first.len(), 8);
}

#[test]
fn reset_mid_statement() {
    let registry = Registry::new();
    let src = "ldi r16, 1 ; c\nnop";
    let mut lexer = Lexer::new(BufferSource::from(src), &registry);
    let whole: Vec<Token> = lexer.tokens().map(Result::unwrap).collect();
    lexer.reset().unwrap();
    for tok in &whole[..2] {
        assert_eq!(&lexer.next_token().unwrap(), tok);
    }
    lexer.reset().unwrap();
    let again: Vec<Token> = lexer.tokens().map(Result::unwrap).collect();
    assert_eq!(whole, again);
}

#[test]
fn words_survive() {
    let registry = Registry::new();
    let src = "add r1, r2\nsub r3, r4\nmov r30, r31";
    let mut lexer = Lexer::new(BufferSource::from(src), &registry);
    let mut rebuilt = String::new();
    for tok in lexer.tokens() {
        let tok = tok.unwrap();
        match tok.kind {
            TokenKind::Register => rebuilt.push('r'),
            TokenKind::Eof => break,
            _ => {}
        }
        rebuilt.push_str(&tok.text);
    }
    assert_eq!(rebuilt, src.replace(' ', ""));
}

struct Broken;

impl Source for Broken {
    fn next(&mut self) -> io::Result<Option<char>> {
        Err(io::Error::new(io::ErrorKind::Other, "disk on fire"))
    }
    fn reset(&mut self) -> io::Result<()> {
        Ok(())
    }
}

#[test]
fn io_error_surfaces() {
    let registry = Registry::new();
    let mut lexer = Lexer::new(Broken, &registry);
    let err = lexer.next_token().unwrap_err();
    assert_eq!(err.to_string(), "disk on fire");
}

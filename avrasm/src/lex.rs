#[cfg(test)]
mod test;

mod state;

use std::collections::VecDeque;
use std::{fmt, io, mem};

use crate::language::{Keyword, Registry};
use crate::source::Source;

use self::state::State;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Radix {
    Binary,
    Octal,
    Decimal,
    Hex,
}

impl Radix {
    pub fn base(self) -> u32 {
        match self {
            Radix::Binary => 2,
            Radix::Octal => 8,
            Radix::Decimal => 10,
            Radix::Hex => 16,
        }
    }

    pub fn prefix(self) -> &'static str {
        match self {
            Radix::Binary => "0b",
            Radix::Octal => "0",
            Radix::Decimal => "",
            Radix::Hex => "0x",
        }
    }
}

impl fmt::Display for Radix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Radix::Binary => "binary",
            Radix::Octal => "octal",
            Radix::Decimal => "decimal",
            Radix::Hex => "hexadecimal",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    Eof,
    Eol,
    /// Terminal, the lexer yields only `Eof` afterwards.
    Error,
    Dot,
    Comma,
    Colon,
    OpenParen,
    CloseParen,
    Assign,
    Comment,
    Instruction,
    Directive,
    Function,
    Ident,
    Operator,
    /// `x`, `y`, `z`, `pc`, or the digits of `rN`
    Register,
    Number(Radix),
}

impl TokenKind {
    fn tag(self) -> &'static str {
        match self {
            TokenKind::Eof => "EOF",
            TokenKind::Eol => "EOL",
            TokenKind::Error => "ERR",
            TokenKind::Dot => ".",
            TokenKind::Comma => ",",
            TokenKind::Colon => ":",
            TokenKind::OpenParen => "(",
            TokenKind::CloseParen => ")",
            TokenKind::Assign => "=",
            TokenKind::Comment => "COM",
            TokenKind::Instruction => "IST",
            TokenKind::Directive => "DIR",
            TokenKind::Function => "FUN",
            TokenKind::Ident => "IDT",
            TokenKind::Operator => "OP",
            TokenKind::Register => "REG",
            TokenKind::Number(Radix::Binary) => "BIN",
            TokenKind::Number(Radix::Octal) => "OCT",
            TokenKind::Number(Radix::Decimal) => "IMM",
            TokenKind::Number(Radix::Hex) => "HEX",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub text: String,
}

impl Token {
    pub fn eof() -> Self {
        Token {
            kind: TokenKind::Eof,
            text: String::new(),
        }
    }

    /// A short phrase naming the token, for error messages.
    pub fn describe(&self) -> String {
        match self.kind {
            TokenKind::Eof => "end of file".to_owned(),
            TokenKind::Eol => "end of line".to_owned(),
            TokenKind::Comment => "comment".to_owned(),
            TokenKind::Register if self.text.starts_with(|c: char| c.is_ascii_digit()) => {
                format!("register 'r{}'", self.text)
            }
            TokenKind::Number(radix) => format!("number '{}{}'", radix.prefix(), self.text),
            kind => {
                let what = match kind {
                    TokenKind::Instruction => "instruction ",
                    TokenKind::Directive => "directive ",
                    TokenKind::Function => "function ",
                    TokenKind::Ident => "identifier ",
                    TokenKind::Operator => "operator ",
                    TokenKind::Register => "register ",
                    TokenKind::Error => "malformed token ",
                    _ => "",
                };
                format!("{what}'{}'", self.text)
            }
        }
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{:<3} : {}]", self.kind.tag(), self.text.escape_debug())
    }
}

/// Turns a character [`Source`] into [`Token`]s.
///
/// Characters are lowercased on the way in. Each character drives one step
/// of a small state machine, and completed tokens wait in a queue until
/// they are asked for.
#[derive(Debug)]
pub struct Lexer<'r, S> {
    src: S,
    registry: &'r Registry,
    state: State,
    buf: String,
    queue: VecDeque<Token>,
}

impl<'r, S: Source> Lexer<'r, S> {
    pub fn new(src: S, registry: &'r Registry) -> Self {
        Self {
            src,
            registry,
            state: State::Start,
            buf: String::new(),
            queue: VecDeque::with_capacity(2),
        }
    }

    /// Once `Eof` has been returned every further call returns `Eof` again.
    pub fn next_token(&mut self) -> io::Result<Token> {
        loop {
            if let Some(tok) = self.queue.pop_front() {
                return Ok(tok);
            }
            if matches!(self.state, State::End | State::Halted) {
                return Ok(Token::eof());
            }
            let ch = self
                .src
                .next()?
                .map(|c| c.to_lowercase().next().unwrap_or(c));
            self.state = self.step(ch);
        }
    }

    /// Rewinds to the start of the source.
    pub fn reset(&mut self) -> io::Result<()> {
        self.src.reset()?;
        self.state = State::Start;
        self.buf.clear();
        self.queue.clear();
        Ok(())
    }

    pub fn close(&mut self) {
        self.src.close();
    }

    /// Iterates up to and including the first `Eof` or `Error` token.
    pub fn tokens(&mut self) -> Tokens<'_, 'r, S> {
        Tokens {
            lexer: self,
            done: false,
        }
    }

    fn emit(&mut self, kind: TokenKind) {
        let text = mem::take(&mut self.buf);
        self.queue.push_back(Token { kind, text });
    }

    fn emit_word(&mut self) {
        let kind = match self.registry.classify(&self.buf) {
            Keyword::Instruction => TokenKind::Instruction,
            Keyword::Directive(_) => TokenKind::Directive,
            Keyword::Function(_) => TokenKind::Function,
            Keyword::Register(_) => TokenKind::Register,
            Keyword::Ident => TokenKind::Ident,
        };
        self.emit(kind);
    }

    /// Emits `rN` as a register token holding `N`.
    fn emit_register(&mut self) {
        self.buf.remove(0);
        self.emit(TokenKind::Register);
    }

    fn emit_operator(&mut self) -> State {
        if self.registry.operator(&self.buf).is_some() {
            self.emit(TokenKind::Operator);
            State::Start
        } else {
            self.emit(TokenKind::Error);
            State::Halted
        }
    }
}

pub struct Tokens<'l, 'r, S> {
    lexer: &'l mut Lexer<'r, S>,
    done: bool,
}

impl<S: Source> Iterator for Tokens<'_, '_, S> {
    type Item = io::Result<Token>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        let res = self.lexer.next_token();
        self.done = match &res {
            Ok(tok) => matches!(tok.kind, TokenKind::Eof | TokenKind::Error),
            Err(_) => true,
        };
        Some(res)
    }
}

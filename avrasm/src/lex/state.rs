use super::{Lexer, Radix, TokenKind};
use crate::source::Source;

/// Where the lexer is inside the token it is accumulating.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum State {
    Start,
    Comment,
    Ident,
    /// a lone `r`, which may become a register or a word
    R,
    Register,
    /// a leading `0`, which may become a radix prefix
    Zero,
    Decimal,
    /// `0x` with no digits yet
    X,
    Hex,
    /// `0b` with no digits yet
    B,
    Binary,
    Octal,
    Lt,
    Gt,
    Eq,
    Bang,
    Amp,
    Bar,
    End,
    Halted,
}

fn is_word(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

/// Characters that may end a word or number without a space in between.
fn is_boundary(c: char) -> bool {
    matches!(
        c,
        ' ' | '\t'
            | '\r'
            | '\n'
            | ';'
            | '.'
            | ','
            | ':'
            | '('
            | ')'
            | '='
            | '~'
            | '*'
            | '/'
            | '%'
            | '+'
            | '-'
            | '^'
            | '<'
            | '>'
            | '!'
            | '&'
            | '|'
            | '?'
    )
}

impl State {
    /// The literal prefix dropped from the buffer on entering this state.
    fn prefix(self) -> &'static str {
        match self {
            State::X | State::Hex => "0x",
            State::B | State::Binary => "0b",
            State::Octal => "0",
            _ => "",
        }
    }
}

impl<S: Source> Lexer<'_, S> {
    /// Advances by one character, `None` being end of input.
    pub(super) fn step(&mut self, ch: Option<char>) -> State {
        use State::*;
        let Some(ch) = ch else {
            return if self.flush() { End } else { Halted };
        };
        let next = match (self.state, ch) {
            (End | Halted, _) => return self.state,
            (Start, _) => return self.start(ch),
            (Comment, '\n') => None,
            (Comment, _) => Some(Comment),
            (Ident, c) if is_word(c) => Some(Ident),
            (R | Register, '0'..='9') => Some(Register),
            (R | Register, c) if is_word(c) => Some(Ident),
            (Zero, '0'..='7') => {
                self.buf.clear();
                Some(Octal)
            }
            (Zero, 'x') => {
                self.buf.clear();
                return X;
            }
            (Zero, 'b') => {
                self.buf.clear();
                return B;
            }
            (Decimal, '0'..='9') => Some(Decimal),
            (X | Hex, c) if c.is_ascii_hexdigit() => Some(Hex),
            (B | Binary, '0' | '1') => Some(Binary),
            (Octal, '0'..='7') => Some(Octal),
            (Lt, '<' | '=') | (Gt, '>' | '=') | (Eq | Bang, '=') | (Amp, '&') | (Bar, '|') => {
                self.buf.push(ch);
                return self.emit_operator();
            }
            // a literal running straight into something that is not a separator
            (Zero | Decimal | X | Hex | B | Binary | Octal, c) if !is_boundary(c) => {
                self.buf.insert_str(0, self.state.prefix());
                self.buf.push(c);
                self.emit(TokenKind::Error);
                return Halted;
            }
            _ => None,
        };
        match next {
            Some(state) => {
                self.buf.push(ch);
                state
            }
            None if self.flush() => self.start(ch),
            None => Halted,
        }
    }

    /// Emits whatever the current state was accumulating. `false` if that
    /// turned out to be malformed.
    fn flush(&mut self) -> bool {
        use State::*;
        match self.state {
            Start | End | Halted => {}
            Comment => self.emit(TokenKind::Comment),
            Ident | R => self.emit_word(),
            Register => self.emit_register(),
            Zero | Decimal => self.emit(TokenKind::Number(Radix::Decimal)),
            Hex => self.emit(TokenKind::Number(Radix::Hex)),
            Binary => self.emit(TokenKind::Number(Radix::Binary)),
            Octal => self.emit(TokenKind::Number(Radix::Octal)),
            X | B => {
                self.buf.insert_str(0, self.state.prefix());
                self.emit(TokenKind::Error);
                return false;
            }
            Eq => self.emit(TokenKind::Assign),
            Lt | Gt | Bang | Amp | Bar => return self.emit_operator() == Start,
        }
        true
    }

    fn start(&mut self, ch: char) -> State {
        use State::*;
        let next = match ch {
            ' ' | '\t' | '\r' => return Start,
            ';' => return Comment,
            '\n' => Some(TokenKind::Eol),
            '.' => Some(TokenKind::Dot),
            ',' => Some(TokenKind::Comma),
            ':' => Some(TokenKind::Colon),
            '(' => Some(TokenKind::OpenParen),
            ')' => Some(TokenKind::CloseParen),
            _ => None,
        };
        self.buf.push(ch);
        if let Some(kind) = next {
            self.emit(kind);
            return Start;
        }
        match ch {
            '~' | '*' | '/' | '%' | '+' | '-' | '^' | '?' => self.emit_operator(),
            '<' => Lt,
            '>' => Gt,
            '=' => Eq,
            '!' => Bang,
            '&' => Amp,
            '|' => Bar,
            'r' => R,
            '0' => Zero,
            '1'..='9' => Decimal,
            c if c.is_alphabetic() || c == '_' => Ident,
            _ => {
                self.emit(TokenKind::Error);
                Halted
            }
        }
    }
}

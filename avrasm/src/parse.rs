
mod display;
mod expr;

use std::io;

use string_interner::{DefaultBackend, DefaultSymbol, StringInterner};
use thiserror::Error;

use crate::language::{NamedRegister, PointerMode, PointerReg, Registry};
use crate::lex::{Lexer, Token, TokenKind};
use crate::source::Source;
use crate::{DirValue, Expr, Line, Literal, Operand};

pub use self::display::Resolved;

#[derive(Debug, Error)]
#[error("{kind} on line {line}")]
pub struct ParseError {
    pub line: u32,
    pub kind: ParseErrorKind,
}

#[derive(Debug, Error)]
pub enum ParseErrorKind {
    #[error("failed to read source: {0}")]
    Io(#[from] io::Error),
    #[error("malformed token '{0}'")]
    Malformed(String),
    #[error("unexpected {found} {context}")]
    Unexpected { found: String, context: String },
    #[error("keyword '{0}' cannot be used as a label")]
    KeywordLabel(String),
    #[error("keyword '{0}' cannot be used as an operand")]
    KeywordOperand(String),
    #[error("'{0}' is not a directive")]
    NotDirective(String),
    #[error("register 'r{0}' is out of range")]
    BadRegister(String),
}

/// Pulls one [`Line`] at a time out of a token stream.
///
/// Identifiers are interned into `si`, which outlives [`Parser::reset`], so
/// symbols handed out in one pass stay valid in the next.
#[derive(Debug)]
pub struct Parser<'r, S> {
    lexer: Lexer<'r, S>,
    registry: &'r Registry,
    pub si: StringInterner<DefaultBackend>,
    cur: Option<Token>,
    line: u32,
}

impl<'r, S: Source> Parser<'r, S> {
    pub fn new(src: S, registry: &'r Registry) -> Self {
        Self {
            lexer: Lexer::new(src, registry),
            registry,
            si: StringInterner::new(),
            cur: None,
            line: 1,
        }
    }

    pub fn reset(&mut self) -> io::Result<()> {
        self.lexer.reset()?;
        self.cur = None;
        self.line = 1;
        Ok(())
    }

    pub fn close(&mut self) {
        self.lexer.close();
    }

    /// The line the next statement starts on.
    pub fn line(&self) -> u32 {
        self.line
    }

    pub fn resolve(&self, sym: DefaultSymbol) -> &str {
        self.si.resolve(sym).unwrap_or("<unknown>")
    }

    /// Wraps an AST node so it displays with names resolved.
    pub fn display<'a, T>(&'a self, node: &'a T) -> Resolved<'a, T> {
        Resolved::new(&self.si, node)
    }

    /// Yields [`Line::Eof`] once the input is exhausted, and again on every
    /// later call.
    pub fn next_line(&mut self) -> Result<Line, ParseError> {
        loop {
            let tok = self.bump()?;
            let line = self.line;
            return match tok.kind {
                TokenKind::Eol => {
                    self.line += 1;
                    continue;
                }
                TokenKind::Eof => Ok(Line::Eof),
                TokenKind::Comment => Ok(Line::Comment(tok.text)),
                TokenKind::Ident => self.label(tok, line),
                TokenKind::Dot => self.directive(line),
                TokenKind::Instruction => self.instruction(tok, line),
                TokenKind::Error => Err(self.error(ParseErrorKind::Malformed(tok.text))),
                TokenKind::Directive | TokenKind::Function | TokenKind::Register => {
                    if self.peek_kind()? == TokenKind::Colon {
                        Err(self.error(ParseErrorKind::KeywordLabel(keyword_name(&tok))))
                    } else {
                        Err(self.unexpected(&tok, "at the start of a line"))
                    }
                }
                _ => Err(self.unexpected(&tok, "at the start of a line")),
            };
        }
    }

    fn label(&mut self, tok: Token, line: u32) -> Result<Line, ParseError> {
        let next = self.bump()?;
        if next.kind != TokenKind::Colon {
            return Err(self.unexpected(&next, format!("after identifier '{}'", tok.text)));
        }
        let name = self.si.get_or_intern(&tok.text);
        Ok(Line::Label { name, line })
    }

    fn directive(&mut self, line: u32) -> Result<Line, ParseError> {
        let tok = self.bump()?;
        let directive = match tok.kind {
            TokenKind::Directive => self.registry.directive(&tok.text),
            TokenKind::Instruction
            | TokenKind::Function
            | TokenKind::Ident
            | TokenKind::Register => None,
            _ => return Err(self.unexpected(&tok, "after '.'")),
        };
        let Some(directive) = directive else {
            return Err(self.error(ParseErrorKind::NotDirective(tok.text)));
        };
        let value = self.directive_value()?;
        self.end_of_statement()?;
        Ok(Line::Directive {
            directive,
            value,
            line,
        })
    }

    /// The value shape is decided by how it starts, never by the directive.
    fn directive_value(&mut self) -> Result<DirValue, ParseError> {
        match self.peek_kind()? {
            TokenKind::Ident => {
                let tok = self.bump()?;
                let name = self.si.get_or_intern(&tok.text);
                match self.peek_kind()? {
                    TokenKind::Assign => {
                        self.bump()?;
                        let expr = self.expr()?;
                        Ok(DirValue::Assign { name, expr })
                    }
                    kind if is_terminator(kind) => Ok(DirValue::Ident(name)),
                    _ => Ok(DirValue::Expr(self.expr_continue(Expr::Ident(name), 0)?)),
                }
            }
            TokenKind::Number(radix) => {
                let tok = self.bump()?;
                let lit = Literal {
                    radix,
                    digits: tok.text,
                };
                if is_terminator(self.peek_kind()?) {
                    Ok(DirValue::Immediate(lit))
                } else {
                    Ok(DirValue::Expr(self.expr_continue(Expr::Literal(lit), 0)?))
                }
            }
            kind if is_terminator(kind) => {
                let tok = self.bump()?;
                Err(self.unexpected(&tok, "where a directive value was expected"))
            }
            _ => Ok(DirValue::Expr(self.expr()?)),
        }
    }

    fn instruction(&mut self, tok: Token, line: u32) -> Result<Line, ParseError> {
        if self.peek_kind()? == TokenKind::Colon {
            return Err(self.error(ParseErrorKind::KeywordLabel(tok.text)));
        }
        let op1 = self.operand()?;
        let op2 = if self.peek_kind()? == TokenKind::Comma {
            self.bump()?;
            if is_terminator(self.peek_kind()?) {
                let tok = self.bump()?;
                return Err(self.unexpected(&tok, "after ','"));
            }
            self.operand()?
        } else {
            Operand::None
        };
        self.end_of_statement()?;
        Ok(Line::Instruction {
            mnemonic: tok.text,
            op1,
            op2,
            line,
        })
    }

    fn operand(&mut self) -> Result<Operand, ParseError> {
        let registry = self.registry;
        let (kind, minus) = {
            let tok = self.peek()?;
            (tok.kind, tok.kind == TokenKind::Operator && tok.text == "-")
        };
        match kind {
            kind if is_terminator(kind) => Ok(Operand::None),
            TokenKind::Register => {
                let tok = self.bump()?;
                self.register(tok)
            }
            TokenKind::Operator if minus => {
                self.bump()?;
                let pre_dec = {
                    let next = self.peek()?;
                    match (next.kind, registry.register(&next.text)) {
                        (TokenKind::Register, Some(NamedRegister::Pointer(reg))) => Some(reg),
                        _ => None,
                    }
                };
                match pre_dec {
                    Some(reg) => {
                        self.bump()?;
                        Ok(Operand::Pointer {
                            reg,
                            mode: PointerMode::PreDec,
                        })
                    }
                    None => Ok(Operand::Expr(self.negated()?)),
                }
            }
            TokenKind::Instruction | TokenKind::Directive => {
                let tok = self.bump()?;
                Err(self.error(ParseErrorKind::KeywordOperand(tok.text)))
            }
            _ => Ok(Operand::Expr(self.expr()?)),
        }
    }

    fn register(&mut self, tok: Token) -> Result<Operand, ParseError> {
        match self.registry.register(&tok.text) {
            Some(NamedRegister::Pc) => Ok(Operand::Expr(self.expr_continue(Expr::Pc, 0)?)),
            Some(NamedRegister::Pointer(reg)) => self.pointer(reg),
            None => {
                let high = self.register_number(&tok)?;
                if self.peek_kind()? != TokenKind::Colon {
                    return Ok(Operand::Register(high));
                }
                self.bump()?;
                let tok = self.bump()?;
                if tok.kind != TokenKind::Register || self.registry.register(&tok.text).is_some() {
                    return Err(self.unexpected(&tok, format!("after 'r{high}:'")));
                }
                let low = self.register_number(&tok)?;
                Ok(Operand::Pair { high, low })
            }
        }
    }

    fn register_number(&self, tok: &Token) -> Result<u32, ParseError> {
        tok.text
            .parse()
            .map_err(|_| self.error(ParseErrorKind::BadRegister(tok.text.clone())))
    }

    /// `x`, `x+`, or `y+q` once the register itself has been consumed.
    fn pointer(&mut self, reg: PointerReg) -> Result<Operand, ParseError> {
        let tok = self.peek()?;
        if tok.kind != TokenKind::Operator {
            return Ok(Operand::Pointer {
                reg,
                mode: PointerMode::Plain,
            });
        }
        let tok = self.bump()?;
        if tok.text != "+" {
            return Err(self.unexpected(&tok, format!("after pointer '{reg}'")));
        }
        let mode = match self.peek_kind()? {
            TokenKind::Number(radix) => {
                let tok = self.bump()?;
                PointerMode::Displacement(Literal {
                    radix,
                    digits: tok.text,
                })
            }
            _ => PointerMode::PostInc,
        };
        Ok(Operand::Pointer { reg, mode })
    }

    /// Consumes the end of line, or leaves a trailing comment or end of file
    /// for the next call.
    fn end_of_statement(&mut self) -> Result<(), ParseError> {
        match self.peek_kind()? {
            TokenKind::Eol => {
                self.bump()?;
                self.line += 1;
                Ok(())
            }
            TokenKind::Comment | TokenKind::Eof => Ok(()),
            _ => {
                let tok = self.bump()?;
                Err(self.unexpected(&tok, "at the end of a statement"))
            }
        }
    }

    fn peek(&mut self) -> Result<&Token, ParseError> {
        let tok = match self.cur.take() {
            Some(tok) => tok,
            None => self.lexer.next_token().map_err(|e| self.error(e.into()))?,
        };
        Ok(self.cur.insert(tok))
    }

    fn peek_kind(&mut self) -> Result<TokenKind, ParseError> {
        Ok(self.peek()?.kind)
    }

    fn bump(&mut self) -> Result<Token, ParseError> {
        match self.cur.take() {
            Some(tok) => Ok(tok),
            None => self.lexer.next_token().map_err(|e| self.error(e.into())),
        }
    }

    fn error(&self, kind: ParseErrorKind) -> ParseError {
        ParseError {
            line: self.line,
            kind,
        }
    }

    fn unexpected(&self, tok: &Token, context: impl Into<String>) -> ParseError {
        let kind = match tok.kind {
            TokenKind::Error => ParseErrorKind::Malformed(tok.text.clone()),
            _ => ParseErrorKind::Unexpected {
                found: tok.describe(),
                context: context.into(),
            },
        };
        self.error(kind)
    }
}

fn is_terminator(kind: TokenKind) -> bool {
    matches!(kind, TokenKind::Eol | TokenKind::Comment | TokenKind::Eof)
}

fn keyword_name(tok: &Token) -> String {
    match tok.kind {
        TokenKind::Register if tok.text.starts_with(|c: char| c.is_ascii_digit()) => {
            format!("r{}", tok.text)
        }
        _ => tok.text.clone(),
    }
}

//! Two-pass driver: turns AVR assembly into a flat little-endian image.
//!
//! Pass one records label addresses and applies directives while counting
//! words. Pass two rewinds the source and encodes every instruction against
//! the completed symbol table.

#[cfg(test)]
mod test;

pub mod eval;
pub mod sink;
pub mod symbols;

use std::io;

use avrasm::device::{Core, Device};
use avrasm::language::{EncodeError, Registry, Template};
use avrasm::parse::{ParseError, Parser};
use avrasm::source::{BufferSource, Source};
use avrasm::{DirValue, Directive, Line, Operand};
use string_interner::DefaultSymbol;
use thiserror::Error;

use self::eval::{EvalError, Scope};
use self::sink::Sink;
use self::symbols::SymbolTable;

#[derive(Debug, Error)]
pub enum AsmError {
    #[error(transparent)]
    Parse(#[from] ParseError),
    #[error("{kind} on line {line}")]
    Semantic { line: u32, kind: SemanticError },
    #[error("failed to rewind source: {0}")]
    Rewind(io::Error),
    #[error("failed to write output: {0}")]
    Write(io::Error),
}

impl AsmError {
    /// The source line the error points at, if any.
    pub fn line(&self) -> Option<u32> {
        match self {
            AsmError::Parse(e) => Some(e.line),
            AsmError::Semantic { line, .. } => Some(*line),
            AsmError::Rewind(_) | AsmError::Write(_) => None,
        }
    }
}

#[derive(Debug, Error)]
pub enum SemanticError {
    #[error("duplicate label '{0}'")]
    DuplicateLabel(String),
    #[error("unrecognised device '{0}'")]
    UnknownDevice(String),
    #[error("instruction '{mnemonic}' is not available on the {core} core")]
    UnknownMnemonic { mnemonic: String, core: Core },
    #[error(".{directive} expects {expected}")]
    DirectiveValue {
        directive: Directive,
        expected: &'static str,
    },
    #[error(transparent)]
    Eval(#[from] EvalError),
    #[error(transparent)]
    Encode(#[from] EncodeError),
}

#[derive(Debug)]
pub struct Assembler<'r, S> {
    parser: Parser<'r, S>,
    registry: &'r Registry,
    device: Device,
    symbols: SymbolTable,
    pc: u64,
}

impl<'r, S: Source> Assembler<'r, S> {
    pub fn new(src: S, registry: &'r Registry) -> Self {
        Self {
            parser: Parser::new(src, registry),
            registry,
            device: Device::default(),
            symbols: SymbolTable::default(),
            pc: 0,
        }
    }

    /// Runs both passes and returns the image. Nothing is kept from an
    /// earlier run, so calling this twice yields the same bytes.
    pub fn run(&mut self) -> Result<Vec<u8>, AsmError> {
        self.hard_reset()?;
        tracing::debug!("first pass");
        self.first_pass()?;
        let words = self.pc;
        tracing::debug!(
            words,
            symbols = self.symbols.len(),
            device = self.device.name,
            "first pass done"
        );
        self.soft_reset()?;
        tracing::debug!("second pass");
        let image = self.second_pass(words)?;
        tracing::debug!(bytes = image.len(), "second pass done");
        Ok(image)
    }

    /// Assembles and writes the image to `sink` only once both passes
    /// succeeded.
    pub fn assemble_into(&mut self, mut sink: impl Sink) -> Result<usize, AsmError> {
        let image = self.run()?;
        sink.write(&image).map_err(AsmError::Write)?;
        sink.close().map_err(AsmError::Write)?;
        Ok(image.len())
    }

    pub fn symbols(&self) -> &SymbolTable {
        &self.symbols
    }

    pub fn device(&self) -> &Device {
        &self.device
    }

    /// Word address reached by the last pass.
    pub fn pc(&self) -> u64 {
        self.pc
    }

    pub fn resolve(&self, sym: DefaultSymbol) -> &str {
        self.parser.resolve(sym)
    }

    /// Value of a label or constant defined by the last run.
    pub fn symbol(&self, name: &str) -> Option<u64> {
        self.symbols.get(self.parser.si.get(name)?)
    }

    pub fn close(&mut self) {
        self.parser.close();
    }

    fn hard_reset(&mut self) -> Result<(), AsmError> {
        self.soft_reset()?;
        self.symbols.clear();
        self.device = Device::default();
        Ok(())
    }

    /// Rewinds the source. Symbols and the selected device survive.
    fn soft_reset(&mut self) -> Result<(), AsmError> {
        self.parser.reset().map_err(AsmError::Rewind)?;
        self.pc = 0;
        Ok(())
    }

    fn first_pass(&mut self) -> Result<(), AsmError> {
        loop {
            match self.parser.next_line()? {
                Line::Eof => return Ok(()),
                Line::Comment(_) => {}
                Line::Label { name, line } => {
                    tracing::trace!(line, pc = self.pc, "label {}", self.resolve(name));
                    self.define(name, self.pc)
                        .map_err(|kind| semantic(line, kind))?;
                }
                Line::Directive {
                    directive,
                    value,
                    line,
                } => {
                    self.directive(directive, &value)
                        .map_err(|kind| semantic(line, kind))?;
                }
                Line::Instruction { mnemonic, line, .. } => {
                    let template = self
                        .template(&mnemonic)
                        .map_err(|kind| semantic(line, kind))?;
                    self.pc += template.words();
                }
            }
        }
    }

    fn second_pass(&mut self, words: u64) -> Result<Vec<u8>, AsmError> {
        let mut image = Vec::with_capacity(words as usize * 2);
        loop {
            let (mnemonic, op1, op2, line) = match self.parser.next_line()? {
                Line::Eof => return Ok(image),
                Line::Instruction {
                    mnemonic,
                    op1,
                    op2,
                    line,
                } => (mnemonic, op1, op2, line),
                Line::Comment(_) | Line::Label { .. } | Line::Directive { .. } => continue,
            };
            let template = self
                .template(&mnemonic)
                .map_err(|kind| semantic(line, kind))?;
            let opcode = self
                .encode(&template, &op1, &op2)
                .map_err(|kind| semantic(line, kind))?;
            tracing::trace!(line, pc = self.pc, "{mnemonic} => {opcode:#06x}");
            template.emit(opcode, &mut image);
            self.pc += template.words();
        }
    }

    fn template(&self, mnemonic: &str) -> Result<Template, SemanticError> {
        let core = self.device.core;
        self.registry
            .instruction(mnemonic, core)
            .ok_or_else(|| SemanticError::UnknownMnemonic {
                mnemonic: mnemonic.to_owned(),
                core,
            })
    }

    fn scope(&self) -> Scope<'_> {
        Scope {
            symbols: &self.symbols,
            names: &self.parser.si,
            pc: self.pc,
        }
    }

    /// Evaluates both operands, then checks and packs them.
    fn encode(
        &self,
        template: &Template,
        op1: &Operand,
        op2: &Operand,
    ) -> Result<u32, SemanticError> {
        let (rel1, rel2) = template.relative_operands();
        let scope = self.scope();
        let op1 = scope.operand(op1, rel1)?;
        let op2 = scope.operand(op2, rel2)?;
        Ok(template.encode(&op1, &op2)?)
    }

    fn define(&mut self, name: DefaultSymbol, value: u64) -> Result<(), SemanticError> {
        self.symbols.insert(name, value).map_err(|_| {
            SemanticError::DuplicateLabel(self.parser.resolve(name).to_owned())
        })
    }

    fn directive(&mut self, directive: Directive, value: &DirValue) -> Result<(), SemanticError> {
        match (directive, value) {
            (Directive::Device, DirValue::Ident(name)) => {
                let name = self.parser.resolve(*name);
                let device = Device::lookup(name)
                    .ok_or_else(|| SemanticError::UnknownDevice(name.to_owned()))?;
                tracing::debug!(device = device.name, core = %device.core, "device selected");
                self.device = device;
                Ok(())
            }
            (Directive::Equ, DirValue::Assign { name, expr }) => {
                let value = self.scope().expr(expr, false)?;
                tracing::trace!(value, "equ {}", self.resolve(*name));
                self.define(*name, value)
            }
            (Directive::Device, _) => Err(SemanticError::DirectiveValue {
                directive,
                expected: "a device name",
            }),
            (Directive::Equ, _) => Err(SemanticError::DirectiveValue {
                directive,
                expected: "an assignment such as 'name = value'",
            }),
        }
    }
}

fn semantic(line: u32, kind: SemanticError) -> AsmError {
    AsmError::Semantic { line, kind }
}

/// Assembles an in-memory program.
pub fn assemble(src: &str) -> Result<Vec<u8>, AsmError> {
    let registry = Registry::new();
    Assembler::new(BufferSource::from(src), &registry).run()
}

use std::error::Error;
use std::fmt::Write as _;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use avrasm::language::Registry;
use avrasm::lex::{Lexer, TokenKind};
use avrasm::parse::Parser;
use avrasm::source::FileSource;
use avrasm::Line;
use avrasm_build::sink::{FileSink, Sink};
use avrasm_build::Assembler;
use clap::{Args, Parser as _, Subcommand};
use tracing::Level;

#[derive(clap::Parser)]
#[command(
    name = "avrasm",
    version,
    about = "Assembler for 8-bit AVR microcontrollers",
    long_about = None
)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// More logging on stderr; repeat for trace output
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Command {
    /// Dump the token stream
    Lex(Files),
    /// Dump the parsed lines
    Parse(Files),
    /// Assemble to a flat binary image
    Build(Files),
}

#[derive(Args)]
struct Files {
    /// Assembly source file
    input: PathBuf,

    /// Output file (default: input name with .txt or .bin in the current directory)
    #[arg(short, long)]
    output: Option<PathBuf>,
}

impl Files {
    fn output(&self, extension: &str) -> PathBuf {
        match &self.output {
            Some(path) => path.clone(),
            None => Path::new(self.input.file_stem().unwrap_or_default()).with_extension(extension),
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    let level = match cli.verbose {
        0 => Level::WARN,
        1 => Level::DEBUG,
        _ => Level::TRACE,
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = run(cli.command) {
        tracing::error!("{e}");
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}

fn run(command: Command) -> Result<(), Box<dyn Error>> {
    let registry = Registry::new();
    match command {
        Command::Lex(files) => {
            let mut lexer = Lexer::new(FileSource::open(&files.input)?, &registry);
            let mut out = String::new();
            let mut malformed = None;
            for tok in lexer.tokens() {
                let tok = tok?;
                writeln!(out, "{tok}")?;
                if tok.kind == TokenKind::Error {
                    malformed = Some(tok.text);
                    break;
                }
            }
            lexer.close();
            write_out(&files.output("txt"), out.as_bytes())?;
            match malformed {
                Some(text) => Err(format!("malformed token '{text}'").into()),
                None => Ok(()),
            }
        }
        Command::Parse(files) => {
            let mut parser = Parser::new(FileSource::open(&files.input)?, &registry);
            let mut out = String::new();
            loop {
                let line = parser.next_line()?;
                if line == Line::Eof {
                    break;
                }
                writeln!(out, "{}", parser.display(&line))?;
            }
            parser.close();
            write_out(&files.output("txt"), out.as_bytes())
        }
        Command::Build(files) => {
            let src = FileSource::open(&files.input)?;
            let mut asm = Assembler::new(src, &registry);
            let image = asm.run()?;
            asm.close();
            tracing::info!(
                bytes = image.len(),
                device = asm.device().name,
                "assembled {}",
                files.input.display()
            );
            write_out(&files.output("bin"), &image)
        }
    }
}

/// Only touches the file system once the whole output is ready.
fn write_out(path: &Path, bytes: &[u8]) -> Result<(), Box<dyn Error>> {
    let mut sink =
        FileSink::create(path).map_err(|e| format!("cant open {}: {e}", path.display()))?;
    sink.write(bytes)?;
    sink.close()?;
    Ok(())
}

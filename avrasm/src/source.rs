use std::fs::File;
use std::io::{self, BufRead, BufReader, Seek, SeekFrom};
use std::path::Path;

/// A rewindable stream of characters feeding the lexer.
pub trait Source {
    /// `Ok(None)` marks the end of input.
    fn next(&mut self) -> io::Result<Option<char>>;
    fn reset(&mut self) -> io::Result<()>;
    fn close(&mut self) {}
}

impl<S: Source + ?Sized> Source for &mut S {
    fn next(&mut self) -> io::Result<Option<char>> {
        (**self).next()
    }
    fn reset(&mut self) -> io::Result<()> {
        (**self).reset()
    }
    fn close(&mut self) {
        (**self).close()
    }
}

/// In-memory source, used when the assembler is embedded in a host that
/// hands over the program as a byte buffer.
#[derive(Debug, Default, Clone)]
pub struct BufferSource {
    text: String,
    pos: usize,
}

impl BufferSource {
    pub fn new(bytes: impl AsRef<[u8]>) -> Self {
        let mut src = Self::default();
        src.load(bytes.as_ref());
        src
    }
    /// Replaces the contents and rewinds.
    pub fn load(&mut self, bytes: &[u8]) {
        self.text = String::from_utf8_lossy(bytes).into_owned();
        self.pos = 0;
    }
    pub fn as_str(&self) -> &str {
        &self.text
    }
}

impl From<&str> for BufferSource {
    fn from(src: &str) -> Self {
        Self {
            text: src.to_owned(),
            pos: 0,
        }
    }
}

impl Source for BufferSource {
    fn next(&mut self) -> io::Result<Option<char>> {
        let ch = self.text[self.pos..].chars().next();
        if let Some(ch) = ch {
            self.pos += ch.len_utf8();
        }
        Ok(ch)
    }
    fn reset(&mut self) -> io::Result<()> {
        self.pos = 0;
        Ok(())
    }
}

#[derive(Debug)]
pub struct FileSource {
    reader: BufReader<File>,
}

impl FileSource {
    pub fn open(path: impl AsRef<Path>) -> io::Result<Self> {
        Ok(Self {
            reader: BufReader::new(File::open(path)?),
        })
    }

    fn byte(&mut self) -> io::Result<Option<u8>> {
        let buf = self.reader.fill_buf()?;
        let Some(&b) = buf.first() else {
            return Ok(None);
        };
        self.reader.consume(1);
        Ok(Some(b))
    }
}

fn invalid_utf8() -> io::Error {
    io::Error::new(io::ErrorKind::InvalidData, "source is not valid utf-8")
}

impl Source for FileSource {
    fn next(&mut self) -> io::Result<Option<char>> {
        let Some(first) = self.byte()? else {
            return Ok(None);
        };
        let width = match first {
            0x00..=0x7f => return Ok(Some(first as char)),
            0xc0..=0xdf => 2,
            0xe0..=0xef => 3,
            0xf0..=0xf7 => 4,
            _ => return Err(invalid_utf8()),
        };
        let mut bytes = [first, 0, 0, 0];
        for b in &mut bytes[1..width] {
            *b = self.byte()?.ok_or_else(invalid_utf8)?;
        }
        let s = std::str::from_utf8(&bytes[..width]).map_err(|_| invalid_utf8())?;
        Ok(s.chars().next())
    }
    fn reset(&mut self) -> io::Result<()> {
        self.reader.seek(SeekFrom::Start(0))?;
        Ok(())
    }
}

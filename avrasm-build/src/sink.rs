use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

/// Where the assembled image goes.
pub trait Sink {
    fn write(&mut self, bytes: &[u8]) -> io::Result<()>;
    /// Flushes anything still buffered.
    fn close(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl<W: Sink + ?Sized> Sink for &mut W {
    fn write(&mut self, bytes: &[u8]) -> io::Result<()> {
        (**self).write(bytes)
    }
    fn close(&mut self) -> io::Result<()> {
        (**self).close()
    }
}

#[derive(Debug, Default)]
pub struct BufferSink {
    buf: Vec<u8>,
}

impl BufferSink {
    pub fn bytes(&self) -> &[u8] {
        &self.buf
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }
}

impl Sink for BufferSink {
    fn write(&mut self, bytes: &[u8]) -> io::Result<()> {
        self.buf.extend_from_slice(bytes);
        Ok(())
    }
}

#[derive(Debug)]
pub struct FileSink {
    writer: BufWriter<File>,
}

impl FileSink {
    /// Creates or truncates `path`.
    pub fn create(path: impl AsRef<Path>) -> io::Result<Self> {
        Ok(Self {
            writer: BufWriter::new(File::create(path)?),
        })
    }
}

impl Sink for FileSink {
    fn write(&mut self, bytes: &[u8]) -> io::Result<()> {
        self.writer.write_all(bytes)
    }
    fn close(&mut self) -> io::Result<()> {
        self.writer.flush()
    }
}

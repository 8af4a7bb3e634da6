//! Byte-position tracking for readers and writers.
//!
//! Offsets of records (and of gzip members) are absolute positions in the
//! underlying container, so both sides of the codec count every byte that
//! passes through them.

use std::io::{BufRead, Read, Result as IoResult, Seek, SeekFrom, Write};

/// A reader that tracks how many bytes have been consumed from `inner`.
///
/// When `inner` implements [`BufRead`], only bytes that are
/// [`consume`](BufRead::consume)d are counted, so peeking with
/// [`fill_buf`](BufRead::fill_buf) does not advance the position.
#[derive(Debug)]
pub struct CountingReader<R> {
    inner: R,
    position: u64,
}

impl<R> CountingReader<R> {
    pub fn new(inner: R) -> Self {
        Self::with_position(inner, 0)
    }

    /// Wrap a reader that has already been positioned at `position`.
    pub fn with_position(inner: R, position: u64) -> Self {
        Self { inner, position }
    }

    #[inline]
    #[must_use]
    pub fn position(&self) -> u64 {
        self.position
    }

    pub fn get_ref(&self) -> &R {
        &self.inner
    }

    pub fn get_mut(&mut self) -> &mut R {
        &mut self.inner
    }

    pub fn into_inner(self) -> R {
        self.inner
    }
}

impl<R: Read> Read for CountingReader<R> {
    fn read(&mut self, buf: &mut [u8]) -> IoResult<usize> {
        let n = self.inner.read(buf)?;
        self.position += n as u64;
        Ok(n)
    }
}

impl<R: BufRead> BufRead for CountingReader<R> {
    fn fill_buf(&mut self) -> IoResult<&[u8]> {
        self.inner.fill_buf()
    }

    fn consume(&mut self, amt: usize) {
        self.inner.consume(amt);
        self.position += amt as u64;
    }
}

impl<R: Seek> Seek for CountingReader<R> {
    fn seek(&mut self, pos: SeekFrom) -> IoResult<u64> {
        self.position = self.inner.seek(pos)?;
        Ok(self.position)
    }
}

/// A writer that tracks how many bytes have been emitted to `inner`.
#[derive(Debug)]
pub struct CountingWriter<W> {
    inner: W,
    position: u64,
}

impl<W> CountingWriter<W> {
    pub fn new(inner: W) -> Self {
        Self { inner, position: 0 }
    }

    #[inline]
    #[must_use]
    pub fn position(&self) -> u64 {
        self.position
    }

    pub fn get_ref(&self) -> &W {
        &self.inner
    }

    pub fn get_mut(&mut self) -> &mut W {
        &mut self.inner
    }

    pub fn into_inner(self) -> W {
        self.inner
    }
}

impl<W: Write> Write for CountingWriter<W> {
    fn write(&mut self, buf: &[u8]) -> IoResult<usize> {
        let n = self.inner.write(buf)?;
        self.position += n as u64;
        Ok(n)
    }

    fn flush(&mut self) -> IoResult<()> {
        self.inner.flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{BufReader, Cursor};

    #[test]
    fn reader_counts_reads_and_consumes() {
        let mut reader = CountingReader::new(BufReader::new(Cursor::new(b"hello world".to_vec())));
        let mut head = [0u8; 5];
        reader.read_exact(&mut head).unwrap();
        assert_eq!(reader.position(), 5);

        // Peeking is free.
        assert_eq!(reader.fill_buf().unwrap(), b" world");
        assert_eq!(reader.position(), 5);
        reader.consume(1);
        assert_eq!(reader.position(), 6);

        let mut rest = String::new();
        reader.read_line(&mut rest).unwrap();
        assert_eq!(rest, "world");
        assert_eq!(reader.position(), 11);
    }

    #[test]
    fn reader_seek_resets_position() {
        let mut reader = CountingReader::new(Cursor::new(b"0123456789".to_vec()));
        reader.seek(SeekFrom::Start(7)).unwrap();
        assert_eq!(reader.position(), 7);
        let mut rest = Vec::new();
        reader.read_to_end(&mut rest).unwrap();
        assert_eq!(rest, b"789");
        assert_eq!(reader.position(), 10);
    }

    #[test]
    fn writer_counts_bytes() {
        let mut writer = CountingWriter::new(Vec::new());
        writer.write_all(b"WARC/1.0\r\n").unwrap();
        writer.write_all(b"\r\n").unwrap();
        assert_eq!(writer.position(), 12);
        assert_eq!(writer.into_inner().len(), 12);
    }
}

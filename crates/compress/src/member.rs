//! Per-record gzip members.
//!
//! A compressed container is a concatenation of complete gzip members, one
//! per record. Writing frames each record with its own [`MemberEncoder`];
//! reading walks the members one at a time with a [`MemberReader`], which
//! exposes the compressed offset each member starts at so it can be seeked
//! back to later.

use crate::Compression;
use crate::counting::CountingReader;
use crate::error::{ErrorKind, Result};
use exn::ResultExt;
use flate2::{Compression as GzCompression, bufread::GzDecoder, bufread::MultiGzDecoder, write::GzEncoder};
use std::io::{BufRead, Error as IoError, Read, Result as IoResult, Seek, SeekFrom, Write};
use tracing::instrument;

// Records are written on the crawl's hot path, so favour the zlib default
// over the best ratio.
const GZIP_LEVEL: GzCompression = GzCompression::new(6);

/// Frames everything written to it as a single member of the given format.
///
/// Call [`finish`](Self::finish) once the whole record has been written; for
/// gzip this writes the member trailer.
pub enum MemberEncoder<W: Write> {
    Plain(W),
    Gzip(GzEncoder<W>),
}

impl<W: Write> MemberEncoder<W> {
    /// Complete the member and return the underlying writer.
    pub fn finish(self) -> Result<W> {
        match self {
            MemberEncoder::Plain(writer) => Ok(writer),
            MemberEncoder::Gzip(encoder) => encoder.finish().or_raise(|| ErrorKind::Io),
        }
    }
}

impl<W: Write> Write for MemberEncoder<W> {
    fn write(&mut self, buf: &[u8]) -> IoResult<usize> {
        match self {
            MemberEncoder::Plain(writer) => writer.write(buf),
            MemberEncoder::Gzip(encoder) => encoder.write(buf),
        }
    }

    fn flush(&mut self) -> IoResult<()> {
        match self {
            MemberEncoder::Plain(writer) => writer.flush(),
            MemberEncoder::Gzip(encoder) => encoder.flush(),
        }
    }
}

impl Compression {
    /// Start a new member on `writer`.
    ///
    /// # Examples
    ///
    /// ```
    /// use std::io::Write;
    /// use harc_compress::Compression;
    ///
    /// let mut encoder = Compression::Gzip.member_encoder(Vec::new());
    /// encoder.write_all(b"WARC/1.0\r\n").unwrap();
    /// let member = encoder.finish().unwrap();
    /// assert!(Compression::Gzip.check_magic_bytes(&member));
    /// ```
    pub fn member_encoder<W: Write>(&self, writer: W) -> MemberEncoder<W> {
        match self {
            Compression::None => MemberEncoder::Plain(writer),
            Compression::Gzip => MemberEncoder::Gzip(GzEncoder::new(writer, GZIP_LEVEL)),
        }
    }

    /// Decompress every member of an in-memory container.
    #[instrument(skip(input), fields(format = %self, input_size = input.len(), output_size))]
    pub fn decompress(&self, input: &[u8]) -> Result<Vec<u8>> {
        let mut output = Vec::new();
        match self {
            Compression::None => output.extend_from_slice(input),
            Compression::Gzip => {
                MultiGzDecoder::new(input).read_to_end(&mut output).or_raise(|| ErrorKind::InvalidData)?;
            },
        }
        tracing::Span::current().record("output_size", output.len());
        Ok(output)
    }
}

enum State<R> {
    Between(CountingReader<R>),
    Within { start: u64, decoder: GzDecoder<CountingReader<R>> },
    Poisoned,
}

/// Decodes a gzip container one member at a time.
///
/// Reading yields the decompressed bytes of the current member only and
/// returns `Ok(0)` at its end; [`next_member`](Self::next_member) moves on.
/// The compressed input is never read past the end of the current member.
pub struct MemberReader<R> {
    state: State<R>,
}

impl<R: BufRead> MemberReader<R> {
    pub fn new(inner: R) -> Self {
        Self::with_position(inner, 0)
    }

    /// Wrap an input that has already been positioned at compressed offset
    /// `position`, which must be the start of a member.
    pub fn with_position(inner: R, position: u64) -> Self {
        Self { state: State::Between(CountingReader::with_position(inner, position)) }
    }

    /// Compressed offset of the input.
    #[must_use]
    pub fn position(&self) -> u64 {
        match &self.state {
            State::Between(inner) => inner.position(),
            State::Within { decoder, .. } => decoder.get_ref().position(),
            State::Poisoned => 0,
        }
    }

    /// Compressed offset of the member currently being decoded.
    #[must_use]
    pub fn member_start(&self) -> Option<u64> {
        match &self.state {
            State::Within { start, .. } => Some(*start),
            _ => None,
        }
    }

    /// Advance to the next member, discarding whatever is left of the current
    /// one. Returns the compressed offset the new member starts at, or `None`
    /// at the end of the input.
    pub fn next_member(&mut self) -> Result<Option<u64>> {
        self.finish_member()?;
        let inner = match &mut self.state {
            State::Between(inner) => inner,
            _ => exn::bail!(ErrorKind::Poisoned),
        };
        if inner.fill_buf().or_raise(|| ErrorKind::Io)?.is_empty() {
            return Ok(None);
        }
        let State::Between(inner) = std::mem::replace(&mut self.state, State::Poisoned) else {
            exn::bail!(ErrorKind::Poisoned);
        };
        let start = inner.position();
        self.state = State::Within { start, decoder: GzDecoder::new(inner) };
        Ok(Some(start))
    }

    /// Decode and discard the rest of the current member, returning how many
    /// decompressed bytes were left.
    pub fn finish_member(&mut self) -> Result<u64> {
        match std::mem::replace(&mut self.state, State::Poisoned) {
            State::Between(inner) => {
                self.state = State::Between(inner);
                Ok(0)
            },
            State::Within { mut decoder, .. } => {
                let remaining = std::io::copy(&mut decoder, &mut std::io::sink()).or_raise(|| ErrorKind::InvalidData)?;
                self.state = State::Between(decoder.into_inner());
                Ok(remaining)
            },
            State::Poisoned => exn::bail!(ErrorKind::Poisoned),
        }
    }
}

impl<R: BufRead + Seek> MemberReader<R> {
    /// Reposition onto the member starting at compressed offset `offset`.
    pub fn seek_member(&mut self, offset: u64) -> Result<()> {
        let mut inner = match std::mem::replace(&mut self.state, State::Poisoned) {
            State::Between(inner) => inner,
            State::Within { decoder, .. } => decoder.into_inner(),
            State::Poisoned => exn::bail!(ErrorKind::Poisoned),
        };
        inner.seek(SeekFrom::Start(offset)).or_raise(|| ErrorKind::Io)?;
        self.state = State::Between(inner);
        Ok(())
    }
}

impl<R: BufRead> Read for MemberReader<R> {
    fn read(&mut self, buf: &mut [u8]) -> IoResult<usize> {
        match &mut self.state {
            State::Between(_) => Ok(0),
            State::Within { decoder, .. } => decoder.read(buf),
            State::Poisoned => Err(IoError::other("gzip member reader is unusable after an earlier failure")),
        }
    }
}

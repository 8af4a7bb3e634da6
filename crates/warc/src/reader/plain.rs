use super::{BodyState, Record, malformed};
use crate::codec;
use crate::consts::{CRLF, HEADER_KEY_TYPE, RECORD_TERMINATOR};
use crate::error::{ErrorKind, Result};
use exn::ResultExt;
use harc_compress::CountingReader;
use std::io::{BufRead, BufReader, Read, Seek, SeekFrom};

/// Reads an uncompressed container.
///
/// Offsets reported in headers are byte positions in the input.
pub struct PlainReader<R> {
    input: CountingReader<BufReader<R>>,
    identifier: String,
    digests: bool,
    current: Option<BodyState>,
}

impl<R: Read> PlainReader<R> {
    pub fn new(identifier: impl Into<String>, input: R) -> Self {
        Self::from_buffered(identifier, BufReader::new(input), 0)
    }

    /// Wrap an input already positioned at byte `position`, the start of a record.
    pub(crate) fn from_buffered(identifier: impl Into<String>, input: BufReader<R>, position: u64) -> Self {
        Self {
            input: CountingReader::with_position(input, position),
            identifier: identifier.into(),
            digests: false,
            current: None,
        }
    }

    #[must_use]
    pub fn with_digests(mut self, enabled: bool) -> Self {
        self.digests = enabled;
        self
    }

    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    /// Byte offset of the input.
    pub fn position(&self) -> u64 {
        self.input.position()
    }

    pub fn next_record(&mut self) -> Result<Option<Record<'_>>> {
        self.end_record()?;
        let offset = self.input.position();
        if self.input.fill_buf().map_err(|e| ErrorKind::reading(&e, offset))?.is_empty() {
            return Ok(None);
        }
        let header = codec::parse(&mut self.input, offset, &self.identifier)?;
        tracing::trace!(
            offset,
            kind = header.field(HEADER_KEY_TYPE),
            content_length = header.content_length(),
            "Read record header"
        );
        let state = self.current.insert(BodyState::new(&header, self.digests));
        Ok(Some(Record::new(header, &mut self.input, state)))
    }

    /// Skip the rest of the open record and its terminator.
    fn end_record(&mut self) -> Result<()> {
        let Some(mut state) = self.current.take() else {
            return Ok(());
        };
        state.skip(&mut self.input)?;
        let offset = state.offset;
        // A record without a body has half of its terminator consumed with
        // the header's blank line.
        let expected: &[u8] = if state.content_length == 0 { CRLF } else { RECORD_TERMINATOR };
        let mut buf = [0u8; 4];
        let found = &mut buf[..expected.len()];
        self.input.read_exact(found).map_err(|e| ErrorKind::reading(&e, offset))?;
        if found != expected {
            return Err(malformed(format!("record at offset {offset} is not followed by two CRLF pairs")));
        }
        if state.content_length == 0 && self.peek(offset)? == Some(CRLF[0]) {
            // The pair may straddle a buffer refill, so take it a byte at a time.
            self.input.consume(1);
            if self.peek(offset)? != Some(CRLF[1]) {
                return Err(malformed(format!("record at offset {offset} is followed by a stray carriage return")));
            }
            self.input.consume(1);
        }
        Ok(())
    }

    /// The next input byte, without consuming it.
    fn peek(&mut self, offset: u64) -> Result<Option<u8>> {
        let buf = self.input.fill_buf().map_err(|e| ErrorKind::reading(&e, offset))?;
        Ok(buf.first().copied())
    }

    /// Skip the rest of the open record and release the input.
    pub fn close(mut self) -> Result<()> {
        self.end_record()
    }
}

impl<R: Read + Seek> PlainReader<R> {
    /// Open `input` at the record starting at byte `offset`.
    pub fn open_at(identifier: impl Into<String>, mut input: R, offset: u64) -> Result<Self> {
        input.seek(SeekFrom::Start(offset)).or_raise(|| ErrorKind::Io)?;
        Ok(Self::from_buffered(identifier, BufReader::new(input), offset))
    }

    /// Parse the record starting at byte `offset`. The open record, if any,
    /// is abandoned without reading the rest of its body.
    pub fn get(&mut self, offset: u64) -> Result<Record<'_>> {
        self.current = None;
        self.input.seek(SeekFrom::Start(offset)).or_raise(|| ErrorKind::Io)?;
        self.next_record()?.ok_or_else(|| malformed(format!("no record at offset {offset}")))
    }
}

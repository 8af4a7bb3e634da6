use super::{BodyState, Record, malformed};
use crate::codec;
use crate::consts::{HEADER_KEY_TYPE, RECORD_TERMINATOR};
use crate::error::{ErrorKind, Result};
use exn::ResultExt;
use harc_compress::MemberReader;
use std::io::{BufRead, BufReader, Read, Seek, SeekFrom};

/// Reads a container made of one gzip member per record.
///
/// Offsets reported in headers are compressed offsets of the member holding
/// the record, so they can be handed back to [`get`](Self::get).
pub struct CompressedReader<R> {
    members: BufReader<MemberReader<BufReader<R>>>,
    identifier: String,
    digests: bool,
    current: Option<BodyState>,
}

impl<R: Read> CompressedReader<R> {
    pub fn new(identifier: impl Into<String>, input: R) -> Self {
        Self::from_buffered(identifier, BufReader::new(input), 0)
    }

    /// Wrap an input already positioned at compressed offset `position`,
    /// the start of a member.
    pub(crate) fn from_buffered(identifier: impl Into<String>, input: BufReader<R>, position: u64) -> Self {
        Self {
            members: BufReader::new(MemberReader::with_position(input, position)),
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

    /// Compressed offset of the input.
    pub fn position(&self) -> u64 {
        self.members.get_ref().position()
    }

    pub fn next_record(&mut self) -> Result<Option<Record<'_>>> {
        self.end_record()?;
        self.discard_buffer();
        let Some(offset) = self.members.get_mut().next_member().map_err(ErrorKind::compression)? else {
            return Ok(None);
        };
        let header = codec::parse(&mut self.members, offset, &self.identifier)?;
        tracing::trace!(
            offset,
            kind = header.field(HEADER_KEY_TYPE),
            content_length = header.content_length(),
            "Read record header"
        );
        let state = self.current.insert(BodyState::new(&header, self.digests));
        Ok(Some(Record::new(header, &mut self.members, state)))
    }

    /// Skip the rest of the open record and whatever trails it in its member.
    fn end_record(&mut self) -> Result<()> {
        let Some(mut state) = self.current.take() else {
            return Ok(());
        };
        state.skip(&mut self.members)?;
        let trailing = std::io::copy(&mut self.members, &mut std::io::sink())
            .map_err(|e| ErrorKind::reading(&e, state.offset))?;
        if trailing > RECORD_TERMINATOR.len() as u64 {
            tracing::warn!(
                offset = state.offset,
                trailing,
                identifier = %self.identifier,
                "Unexpected bytes after record in gzip member"
            );
        }
        Ok(())
    }

    /// Drop decompressed bytes buffered from a member that is no longer read.
    fn discard_buffer(&mut self) {
        let buffered = self.members.buffer().len();
        self.members.consume(buffered);
    }

    /// Skip the rest of the open record and release the input.
    pub fn close(mut self) -> Result<()> {
        self.end_record()
    }
}

impl<R: Read + Seek> CompressedReader<R> {
    /// Open `input` at the member starting at compressed offset `offset`.
    pub fn open_at(identifier: impl Into<String>, mut input: R, offset: u64) -> Result<Self> {
        input.seek(SeekFrom::Start(offset)).or_raise(|| ErrorKind::Io)?;
        Ok(Self::from_buffered(identifier, BufReader::new(input), offset))
    }

    /// Parse the record held by the member starting at compressed offset
    /// `offset`. The open record, if any, is abandoned without reading the
    /// rest of its body.
    pub fn get(&mut self, offset: u64) -> Result<Record<'_>> {
        self.current = None;
        self.discard_buffer();
        self.members.get_mut().seek_member(offset).map_err(ErrorKind::compression)?;
        self.next_record()?.ok_or_else(|| malformed(format!("no gzip member at offset {offset}")))
    }
}

//! Sequential and random-access record readers.
//!
//! A container is read either as plain bytes ([`PlainReader`]) or as a
//! concatenation of gzip members holding one record each
//! ([`CompressedReader`]). [`WarcReader`] wraps whichever of the two the
//! [factory](crate::factory) picked for a given input.
//!
//! Records are handed out one at a time as [`Record`]s that borrow the
//! reader, so a record's body can only be read until the next call to
//! `next_record` or `get`. Whatever part of the body was left unread is
//! skipped at that point.

mod compressed;
mod plain;

pub use self::compressed::CompressedReader;
pub use self::plain::PlainReader;

use crate::error::{Error, ErrorKind, Result};
use crate::models::RecordHeader;
use sha2::{Digest, Sha256};
use std::io::{BufRead, Error as IoError, ErrorKind as IoErrorKind, Read, Result as IoResult, Seek, Write};
use std::path::Path;

/// Progress through the body of the record currently open on a reader.
pub(crate) struct BodyState {
    offset: u64,
    content_length: u64,
    remaining: u64,
    hasher: Option<Sha256>,
}
impl BodyState {
    fn new(header: &RecordHeader, digest: bool) -> Self {
        Self {
            offset: header.offset(),
            content_length: header.content_length(),
            remaining: header.content_length(),
            hasher: digest.then(Sha256::new),
        }
    }

    fn read(&mut self, input: &mut dyn BufRead, buf: &mut [u8]) -> IoResult<usize> {
        if self.remaining == 0 || buf.is_empty() {
            return Ok(0);
        }
        let limit = buf.len().min(usize::try_from(self.remaining).unwrap_or(usize::MAX));
        let read = input.read(&mut buf[..limit])?;
        if read == 0 {
            return Err(IoError::new(
                IoErrorKind::UnexpectedEof,
                format!("body of record at offset {} ends {} bytes early", self.offset, self.remaining),
            ));
        }
        self.remaining -= read as u64;
        if let Some(hasher) = &mut self.hasher {
            hasher.update(&buf[..read]);
        }
        Ok(read)
    }

    /// Read and discard the rest of the body.
    fn skip(&mut self, input: &mut dyn BufRead) -> Result<()> {
        let mut buf = [0u8; 8 * 1024];
        while self.remaining > 0 {
            self.read(input, &mut buf).map_err(|e| ErrorKind::reading(&e, self.offset))?;
        }
        Ok(())
    }

    fn digest(&self) -> Option<String> {
        if self.remaining > 0 {
            return None;
        }
        self.hasher.as_ref().map(|hasher| format!("sha256:{}", hex::encode(hasher.clone().finalize())))
    }
}

/// One record read from a container.
///
/// Reading from a `Record` yields its body, exactly
/// [`content_length`](RecordHeader::content_length) bytes. A body that ends
/// early is reported as an [`UnexpectedEof`](IoErrorKind::UnexpectedEof)
/// I/O error.
pub struct Record<'r> {
    header: RecordHeader,
    input: &'r mut dyn BufRead,
    state: &'r mut BodyState,
}
impl<'r> Record<'r> {
    pub(crate) fn new(header: RecordHeader, input: &'r mut dyn BufRead, state: &'r mut BodyState) -> Self {
        Self { header, input, state }
    }

    pub fn header(&self) -> &RecordHeader {
        &self.header
    }

    /// Body bytes not yet read.
    pub fn remaining(&self) -> u64 {
        self.state.remaining
    }

    /// Block digest as `sha256:<hex>`, available once the whole body has
    /// been read from a reader with digests enabled.
    pub fn digest(&self) -> Option<String> {
        self.state.digest()
    }

    /// Read the rest of the body and return the header, with its digest
    /// filled in when digests are enabled.
    pub fn finish(self) -> Result<RecordHeader> {
        let Record { header, input, state } = self;
        state.skip(input)?;
        Ok(header.with_digest(state.digest()))
    }

    /// Read the rest of the body into memory.
    pub fn into_parts(mut self) -> Result<(RecordHeader, Vec<u8>)> {
        let capacity = usize::try_from(self.state.remaining).unwrap_or(0).min(1024 * 1024);
        let mut body = Vec::with_capacity(capacity);
        self.read_to_end(&mut body).map_err(|e| ErrorKind::reading(&e, self.header.offset()))?;
        Ok((self.finish()?, body))
    }

    /// Stream the rest of the body into `writer`.
    pub fn copy_into<W: Write>(&mut self, writer: &mut W) -> Result<u64> {
        std::io::copy(self, writer).map_err(|e| ErrorKind::reading(&e, self.header.offset()).into())
    }
}
impl Read for Record<'_> {
    fn read(&mut self, buf: &mut [u8]) -> IoResult<usize> {
        self.state.read(&mut *self.input, buf)
    }
}

/// A container reader of either variant.
///
/// # Examples
///
/// ```
/// use harc_compress::Compression;
/// use harc_warc::{RecordInfo, RecordType, WarcWriter, factory};
/// use std::io::{Cursor, Read};
///
/// let mut writer = WarcWriter::with_uuids(Vec::new(), Compression::Gzip);
/// writer.write_resource(RecordInfo::from_bytes(RecordType::Resource, b"hello").url("http://example.com/")).unwrap();
/// let container = writer.into_inner().unwrap();
///
/// let mut reader = factory::from_stream("memory", Cursor::new(container)).unwrap();
/// assert!(reader.is_compressed());
/// let mut record = reader.next_record().unwrap().unwrap();
/// let mut body = String::new();
/// record.read_to_string(&mut body).unwrap();
/// assert_eq!(body, "hello");
/// ```
pub enum WarcReader<R> {
    Plain(PlainReader<R>),
    Compressed(CompressedReader<R>),
}

impl<R: Read> WarcReader<R> {
    /// Parse the next record, skipping whatever is left of the previous one.
    /// Returns `None` at the end of the container.
    pub fn next_record(&mut self) -> Result<Option<Record<'_>>> {
        match self {
            WarcReader::Plain(reader) => reader.next_record(),
            WarcReader::Compressed(reader) => reader.next_record(),
        }
    }

    /// Compute a SHA-256 block digest of every record body read from now on.
    #[must_use]
    pub fn with_digests(self, enabled: bool) -> Self {
        match self {
            WarcReader::Plain(reader) => WarcReader::Plain(reader.with_digests(enabled)),
            WarcReader::Compressed(reader) => WarcReader::Compressed(reader.with_digests(enabled)),
        }
    }

    pub fn is_compressed(&self) -> bool {
        matches!(self, WarcReader::Compressed(_))
    }

    /// Identifier given to every header read from this container.
    pub fn identifier(&self) -> &str {
        match self {
            WarcReader::Plain(reader) => reader.identifier(),
            WarcReader::Compressed(reader) => reader.identifier(),
        }
    }

    /// The identifier's file name without directories, in-progress,
    /// compression or container extensions.
    pub fn stripped_file_name(&self) -> String {
        let name = Path::new(self.identifier()).file_name().and_then(|name| name.to_str()).unwrap_or_default();
        let name = name.strip_suffix(crate::consts::OCCUPIED_SUFFIX).unwrap_or(name);
        let name = name.strip_suffix(".gz").unwrap_or(name);
        name.strip_suffix(".warc").unwrap_or(name).to_string()
    }

    /// Skip the rest of the current record, if any, and release the input.
    pub fn close(self) -> Result<()> {
        match self {
            WarcReader::Plain(reader) => reader.close(),
            WarcReader::Compressed(reader) => reader.close(),
        }
    }

    /// Read every remaining record, returning their headers.
    ///
    /// When `expected` is given the number of records must match it.
    pub fn validate(mut self, expected: Option<usize>) -> Result<Vec<RecordHeader>> {
        let mut headers = Vec::new();
        while let Some(record) = self.next_record()? {
            headers.push(record.finish()?);
        }
        if let Some(expected) = expected
            && expected != headers.len()
        {
            exn::bail!(ErrorKind::RecordCount { expected, actual: headers.len() });
        }
        Ok(headers)
    }

    /// An iterator over the headers of every remaining record. Each body is
    /// read in full, so digests are filled in when enabled. Iteration stops
    /// after the first error.
    pub fn headers(self) -> Headers<R> {
        Headers { reader: self, done: false }
    }
}

impl<R: Read + Seek> WarcReader<R> {
    /// Parse the record starting at `offset`, as previously reported by
    /// [`RecordHeader::offset`].
    pub fn get(&mut self, offset: u64) -> Result<Record<'_>> {
        match self {
            WarcReader::Plain(reader) => reader.get(offset),
            WarcReader::Compressed(reader) => reader.get(offset),
        }
    }
}

/// Owning iterator over record headers. See [`WarcReader::headers`].
pub struct Headers<R> {
    reader: WarcReader<R>,
    done: bool,
}
impl<R: Read> Iterator for Headers<R> {
    type Item = Result<RecordHeader>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        let next: Result<Option<RecordHeader>> = match self.reader.next_record() {
            Ok(Some(record)) => record.finish().map(Some),
            Ok(None) => Ok(None),
            Err(err) => Err(err),
        };
        match next {
            Ok(Some(header)) => Some(Ok(header)),
            Ok(None) => {
                self.done = true;
                None
            },
            Err(err) => {
                self.done = true;
                Some(Err(err))
            },
        }
    }
}

/// Shorthand used by both variants for an error that ends reading.
pub(crate) fn malformed(message: String) -> Error {
    Error::from(ErrorKind::MalformedContainer(message))
}

#[cfg(test)]
mod tests;

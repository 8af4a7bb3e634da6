//! Sequential record writer.
//!
//! A [`WarcWriter`] appends one framed record at a time to the output it
//! owns:
//!
//! ```text
//! <header block> [CRLF <content>] CRLF CRLF
//! ```
//!
//! Each record is staged in a spooled buffer (compressed as its own gzip
//! member when compression is enabled) and only copied to the output once it
//! is complete, so a record that fails validation or comes up short leaves
//! nothing behind.

use crate::codec;
use crate::consts::*;
use crate::date::now14;
use crate::error::{ErrorKind, Result};
use crate::id::{RecordIdGenerator, UuidGenerator};
use crate::models::{RecordId, RecordInfo, RecordType};
use crate::stats::StatTally;
use exn::ResultExt;
use harc_compress::{Compression, CountingWriter};
use std::io::{Read, Seek, SeekFrom, Write};
use std::sync::Arc;
use tracing::instrument;

/// Records up to this size are staged in memory; larger ones spill to a
/// temporary file.
pub const DEFAULT_SPOOL_MEMORY: usize = 1024 * 1024;

/// Contents of the `warcinfo` record that opens every new container.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Warcinfo {
    /// Written as `Content-Description` when present.
    pub description: Option<String>,
    /// Opaque body of the record.
    pub metadata: Vec<u8>,
}
impl Warcinfo {
    /// Body made of `lines`, each terminated by CRLF.
    pub fn from_lines<S: AsRef<str>>(description: Option<String>, lines: &[S]) -> Self {
        let mut metadata = Vec::new();
        for line in lines {
            metadata.extend_from_slice(line.as_ref().as_bytes());
            metadata.extend_from_slice(CRLF);
        }
        Self { description, metadata }
    }
}

/// Appends framed records to an owned output.
///
/// # Examples
///
/// ```
/// use harc_compress::Compression;
/// use harc_warc::{RecordInfo, RecordType, WarcWriter};
///
/// let mut writer = WarcWriter::with_uuids(Vec::new(), Compression::None);
/// let info = RecordInfo::from_bytes(RecordType::Resource, b"hello").url("http://example.com/");
/// writer.write_resource(info).unwrap();
/// let bytes = writer.into_inner().unwrap();
/// assert!(bytes.starts_with(b"WARC/1.0\r\n"));
/// assert!(bytes.ends_with(b"hello\r\n\r\n"));
/// ```
pub struct WarcWriter<W: Write> {
    out: CountingWriter<W>,
    compression: Compression,
    ids: Arc<dyn RecordIdGenerator>,
    warcinfo: Warcinfo,
    spool_memory: usize,
    tally: StatTally,
}

impl<W: Write> WarcWriter<W> {
    pub fn new(out: W, compression: Compression, ids: Arc<dyn RecordIdGenerator>) -> Self {
        Self {
            out: CountingWriter::new(out),
            compression,
            ids,
            warcinfo: Warcinfo::default(),
            spool_memory: DEFAULT_SPOOL_MEMORY,
            tally: StatTally::new(),
        }
    }

    /// A writer identifying records with random UUID URNs.
    pub fn with_uuids(out: W, compression: Compression) -> Self {
        Self::new(out, compression, Arc::new(UuidGenerator))
    }

    /// Set the contents of the bootstrap record written by [`bootstrap`](Self::bootstrap).
    #[must_use]
    pub fn warcinfo(mut self, warcinfo: Warcinfo) -> Self {
        self.warcinfo = warcinfo;
        self
    }

    /// Maximum record size staged in memory before spilling to disk.
    #[must_use]
    pub fn spool_memory(mut self, bytes: usize) -> Self {
        self.spool_memory = bytes;
        self
    }

    /// Write the `warcinfo` record that opens a freshly created container
    /// named `filename`. Any in-progress suffix is stripped from the name.
    pub fn bootstrap(&mut self, filename: &str) -> Result<RecordId> {
        let filename = filename.strip_suffix(OCCUPIED_SUFFIX).unwrap_or(filename);
        let metadata = self.warcinfo.metadata.clone();
        let mut info = RecordInfo::new(RecordType::Warcinfo, &metadata[..], metadata.len() as u64)
            .mimetype(WARC_FIELDS_TYPE)
            .record_id(self.ids.generate_qualified("type", RecordType::Warcinfo.as_str()))
            .field(HEADER_KEY_FILENAME, filename);
        if let Some(description) = &self.warcinfo.description {
            info = info.field(CONTENT_DESCRIPTION, description.as_str());
        }
        self.write_warcinfo(info)
    }

    pub fn write_warcinfo(&mut self, info: RecordInfo<'_>) -> Result<RecordId> {
        self.write(info.with_kind(RecordType::Warcinfo).enforce_length(true))
    }

    pub fn write_request(&mut self, info: RecordInfo<'_>) -> Result<RecordId> {
        self.write(info.with_kind(RecordType::Request).enforce_length(true))
    }

    pub fn write_resource(&mut self, info: RecordInfo<'_>) -> Result<RecordId> {
        self.write(info.with_kind(RecordType::Resource).enforce_length(true))
    }

    pub fn write_response(&mut self, info: RecordInfo<'_>) -> Result<RecordId> {
        self.write(info.with_kind(RecordType::Response).enforce_length(true))
    }

    /// Revisit bodies may be withheld, so a short content stream is accepted.
    pub fn write_revisit(&mut self, info: RecordInfo<'_>) -> Result<RecordId> {
        self.write(info.with_kind(RecordType::Revisit).enforce_length(false))
    }

    pub fn write_metadata(&mut self, info: RecordInfo<'_>) -> Result<RecordId> {
        self.write(info.with_kind(RecordType::Metadata).enforce_length(true))
    }

    /// Write one record exactly as described by `info`.
    ///
    /// Returns the identifier of the written record, generated when `info`
    /// did not carry one.
    ///
    /// # Errors
    ///
    /// - [`ErrorKind::EmptyRecord`] when there is neither a body nor extra fields
    /// - [`ErrorKind::HeaderValidation`] for values the header cannot carry
    /// - [`ErrorKind::LengthMismatch`] when the content stream is short and
    ///   the length is enforced. Otherwise a short body is written with the
    ///   `Content-Length` it actually has.
    /// - [`ErrorKind::Io`] for failures of the content stream or the output
    ///
    /// Apart from output failures, nothing is written when an error is returned.
    #[instrument(skip_all, fields(kind = %info.kind, url = info.url.as_deref(), offset = self.out.position(), size_on_disk))]
    pub fn write(&mut self, info: RecordInfo<'_>) -> Result<RecordId> {
        let RecordInfo {
            kind,
            url,
            date,
            mimetype,
            record_id,
            extra_fields,
            mut content,
            content_length,
            enforce_length,
        } = info;
        if content_length == 0 && extra_fields.is_empty() {
            exn::bail!(ErrorKind::EmptyRecord);
        }
        let record_id = record_id.unwrap_or_else(|| self.ids.generate(kind));
        let date = date.unwrap_or_else(now14);
        let mut header =
            codec::encode(kind, url.as_deref(), &date, mimetype.as_deref(), &record_id, &extra_fields, content_length)?;

        // The body is staged on its own first so the header can carry the
        // length that was actually available.
        let mut body = tempfile::spooled_tempfile(self.spool_memory);
        let mut content_written = 0;
        if content_length > 0 {
            content_written =
                std::io::copy(&mut content.by_ref().take(content_length), &mut body).or_raise(|| ErrorKind::Io)?;
        }
        if content_written < content_length {
            if enforce_length {
                exn::bail!(ErrorKind::LengthMismatch { expected: content_length, actual: content_written });
            }
            if content_written == 0 && extra_fields.is_empty() {
                exn::bail!(ErrorKind::EmptyRecord);
            }
            tracing::debug!(declared = content_length, written = content_written, "Body is short, writing what was read");
            header = codec::encode(
                kind,
                url.as_deref(),
                &date,
                mimetype.as_deref(),
                &record_id,
                &extra_fields,
                content_written,
            )?;
        }

        let mut spool = tempfile::spooled_tempfile(self.spool_memory);
        let mut member = self.compression.member_encoder(&mut spool);
        member.write_all(&header).or_raise(|| ErrorKind::Io)?;
        if content_written > 0 {
            body.rewind().or_raise(|| ErrorKind::Io)?;
            member.write_all(CRLF).or_raise(|| ErrorKind::Io)?;
            std::io::copy(&mut body, &mut member).or_raise(|| ErrorKind::Io)?;
        }
        member.write_all(RECORD_TERMINATOR).or_raise(|| ErrorKind::Io)?;
        member.finish().map_err(ErrorKind::compression)?;

        let total_bytes = header.len() as u64
            + if content_written > 0 { CRLF.len() as u64 + content_written } else { 0 }
            + RECORD_TERMINATOR.len() as u64;
        let size_on_disk = spool.seek(SeekFrom::End(0)).or_raise(|| ErrorKind::Io)?;
        spool.rewind().or_raise(|| ErrorKind::Io)?;
        std::io::copy(&mut spool, &mut self.out).or_raise(|| ErrorKind::Io)?;

        self.tally.record(kind, content_written, total_bytes, size_on_disk);
        tracing::Span::current().record("size_on_disk", size_on_disk);
        tracing::debug!(id = %record_id, total_bytes, "Wrote record");
        Ok(record_id)
    }

    /// Bytes emitted to the output so far.
    #[inline]
    #[must_use]
    pub fn position(&self) -> u64 {
        self.out.position()
    }

    pub fn compression(&self) -> Compression {
        self.compression
    }

    pub fn tally(&self) -> &StatTally {
        &self.tally
    }

    /// Snapshot the tally and reset its counters.
    pub fn drain_tally(&mut self) -> StatTally {
        self.tally.drain()
    }

    pub fn tally_mut(&mut self) -> &mut StatTally {
        &mut self.tally
    }

    pub fn flush(&mut self) -> Result<()> {
        self.out.flush().or_raise(|| ErrorKind::Io)
    }

    pub fn get_ref(&self) -> &W {
        self.out.get_ref()
    }

    /// Flush and return the output.
    pub fn into_inner(mut self) -> Result<W> {
        self.flush()?;
        Ok(self.out.into_inner())
    }
}

//! Header block encoding and parsing.
//!
//! A header block is the magic line followed by RFC 822 style `name: value`
//! lines, all CRLF terminated:
//!
//! ```text
//! WARC/1.0
//! WARC-Type: resource
//! WARC-Target-URI: http://example.com/
//! WARC-Date: 20240101120000
//! WARC-Record-ID: <urn:uuid:...>
//! Content-Type: text/plain
//! Content-Length: 5
//! ```
//!
//! The writer follows it with a CRLF when the record has a body, and always
//! ends the record with two more. When parsing, the block extends through
//! the first blank line.

use crate::consts::*;
use crate::error::{ErrorKind, Result};
use crate::models::{NamedFields, RecordHeader, RecordId, RecordType};
use exn::{OptionExt, ResultExt};
use std::io::{BufRead, Read};
use tracing::instrument;

/// Encode the header block of a record, ending with the `Content-Length` line.
///
/// Fields are written in a fixed order: type, URL (when given), date, extra
/// fields, record identifier, content type (only for a non-empty body) and
/// content length last.
///
/// # Errors
///
/// [`ErrorKind::HeaderValidation`] when the URL, date or record identifier
/// contain whitespace or control characters, when the mimetype still
/// contains a control character after normalization, or when an extra field
/// would break the line structure.
///
/// # Examples
///
/// ```
/// use harc_warc::{NamedFields, RecordId, RecordType, codec};
///
/// let block = codec::encode(
///     RecordType::Resource,
///     Some("http://example.com/"),
///     "20240101120000",
///     Some("text/plain"),
///     &RecordId::new("urn:uuid:1"),
///     &NamedFields::new(),
///     5,
/// )
/// .unwrap();
/// assert!(block.starts_with(b"WARC/1.0\r\nWARC-Type: resource\r\n"));
/// assert!(block.ends_with(b"Content-Type: text/plain\r\nContent-Length: 5\r\n"));
/// ```
pub fn encode(
    kind: RecordType,
    url: Option<&str>,
    date: &str,
    mimetype: Option<&str>,
    record_id: &RecordId,
    extra_fields: &NamedFields,
    content_length: u64,
) -> Result<Vec<u8>> {
    let mut block = String::with_capacity(256);
    block.push_str(WARC_ID);
    block.push_str("\r\n");
    push_field(&mut block, HEADER_KEY_TYPE, kind.as_str());
    if let Some(url) = url
        && !url.is_empty()
    {
        check_header_value(url)?;
        push_field(&mut block, HEADER_KEY_URI, url);
    }
    check_header_value(date)?;
    push_field(&mut block, HEADER_KEY_DATE, date);
    for (name, value) in extra_fields.iter() {
        check_field(name, value)?;
        push_field(&mut block, name, value);
    }
    check_header_value(record_id.as_str())?;
    push_field(&mut block, HEADER_KEY_ID, &record_id.bracketed());
    if content_length > 0
        && let Some(mimetype) = mimetype
        && !mimetype.is_empty()
    {
        push_field(&mut block, CONTENT_TYPE, &normalize_mimetype(mimetype)?);
    }
    push_field(&mut block, CONTENT_LENGTH, &content_length.to_string());
    Ok(block.into_bytes())
}

fn push_field(block: &mut String, name: &str, value: &str) {
    block.push_str(name);
    block.push_str(COLON_SPACE);
    block.push_str(value);
    block.push_str("\r\n");
}

/// Reject values that cannot appear unquoted in a named field: control
/// characters and whitespace.
pub fn check_header_value(value: &str) -> Result<()> {
    for c in value.chars() {
        if c.is_control() {
            exn::bail!(ErrorKind::HeaderValidation(format!(
                "contains illegal character {:#x}: {value}",
                u32::from(c)
            )));
        }
        if c.is_whitespace() {
            exn::bail!(ErrorKind::HeaderValidation(format!(
                "contains disallowed white space {:#x}: {value}",
                u32::from(c)
            )));
        }
    }
    Ok(())
}

fn check_field(name: &str, value: &str) -> Result<()> {
    if name.is_empty() || name.contains(':') {
        exn::bail!(ErrorKind::HeaderValidation(format!("invalid field name: {name:?}")));
    }
    check_header_value(name)?;
    if value.contains(['\r', '\n']) {
        exn::bail!(ErrorKind::HeaderValidation(format!("field {name} contains a line break")));
    }
    Ok(())
}

/// Collapse every run of whitespace in a mimetype to a single space.
///
/// Whitespace is collapsed rather than removed since parameters may contain
/// quoted strings. Control characters that are not whitespace are rejected.
///
/// ```
/// use harc_warc::codec::normalize_mimetype;
///
/// let normalized = normalize_mimetype("multipart/mixed; \r\n boundary=\"x\"").unwrap();
/// assert_eq!(normalized, "multipart/mixed; boundary=\"x\"");
/// ```
pub fn normalize_mimetype(mimetype: &str) -> Result<String> {
    let mut normalized = String::with_capacity(mimetype.len());
    let mut in_whitespace = false;
    for c in mimetype.chars() {
        if c.is_whitespace() {
            if !in_whitespace {
                normalized.push(' ');
            }
            in_whitespace = true;
            continue;
        }
        in_whitespace = false;
        if c.is_control() {
            exn::bail!(ErrorKind::HeaderValidation(format!(
                "contains illegal character {:#x}: {mimetype}",
                u32::from(c)
            )));
        }
        normalized.push(c);
    }
    Ok(normalized)
}

/// Parse one header block from `input`, which must be positioned at the
/// start of a record.
///
/// `offset` and `reader_identifier` are carried into the returned header
/// unchanged. The number of bytes consumed, up to and including the blank
/// line, becomes [`RecordHeader::header_length`]. The input is left at the
/// first byte of the body.
#[instrument(level = "trace", skip(input))]
pub fn parse<R: BufRead>(input: &mut R, offset: u64, reader_identifier: &str) -> Result<RecordHeader> {
    let mut consumed = 0u64;
    let mut line = Vec::with_capacity(128);

    consumed += read_line(input, &mut line, offset)?;
    if line.is_empty() {
        exn::bail!(ErrorKind::MalformedContainer(format!("expected a record at offset {offset}, found end of input")));
    }
    let magic = String::from_utf8_lossy(&line);
    let version = trim_line_end(&magic).strip_prefix(MAGIC).ok_or_raise(|| {
        ErrorKind::MalformedContainer(format!(
            "record at offset {offset} does not start with {MAGIC}: {:?}",
            trim_line_end(&magic)
        ))
    })?;
    let version = version.to_string();

    let mut fields = NamedFields::new();
    loop {
        line.clear();
        consumed += read_line(input, &mut line, offset)?;
        if line.is_empty() {
            exn::bail!(ErrorKind::MalformedContainer(format!(
                "header block at offset {offset} ended before its blank line"
            )));
        }
        let text = String::from_utf8_lossy(&line);
        let text = trim_line_end(&text);
        if text.is_empty() {
            break;
        }
        if text.starts_with([' ', '\t']) {
            let previous = fields.last_value_mut().ok_or_raise(|| {
                ErrorKind::MalformedContainer(format!("continuation line before any field at offset {offset}"))
            })?;
            previous.push(' ');
            previous.push_str(text.trim());
            continue;
        }
        let (name, value) = text.split_once(':').ok_or_raise(|| {
            ErrorKind::MalformedContainer(format!("header line without a colon at offset {offset}: {text:?}"))
        })?;
        let name = name.trim();
        if name.is_empty() {
            exn::bail!(ErrorKind::MalformedContainer(format!("header line without a name at offset {offset}")));
        }
        fields.add(name, value.trim());
    }

    let content_length = fields
        .get(CONTENT_LENGTH)
        .ok_or_raise(|| ErrorKind::MalformedContainer(format!("record at offset {offset} has no {CONTENT_LENGTH}")))?
        .parse::<u64>()
        .or_raise(|| ErrorKind::MalformedContainer(format!("record at offset {offset} has an invalid {CONTENT_LENGTH}")))?;

    Ok(RecordHeader::new(version, fields, content_length, consumed, offset, reader_identifier.to_string()))
}

/// Read one line, newline included, into `line`. Returns the bytes consumed.
/// Leaves `line` empty at end of input.
fn read_line<R: BufRead>(input: &mut R, line: &mut Vec<u8>, offset: u64) -> Result<u64> {
    let read =
        input.by_ref().take(MAX_LINE_LENGTH).read_until(b'\n', line).map_err(|e| ErrorKind::reading(&e, offset))? as u64;
    if read > 0 && !line.ends_with(b"\n") {
        if read >= MAX_LINE_LENGTH {
            exn::bail!(ErrorKind::MalformedContainer(format!(
                "header line at offset {offset} is longer than {MAX_LINE_LENGTH} bytes"
            )));
        }
        exn::bail!(ErrorKind::MalformedContainer(format!("header block at offset {offset} is truncated")));
    }
    Ok(read)
}

fn trim_line_end(line: &str) -> &str {
    let line = line.strip_suffix('\n').unwrap_or(line);
    line.strip_suffix('\r').unwrap_or(line)
}

//! Container Error Types
//!
//! This module provides structured errors using `exn` for automatic location
//! tracking and error tree construction.

use derive_more::{Display, Error};
use harc_compress::error::{Error as CompressionError, ErrorKind as CompressionErrorKind};
use std::io::{Error as IoError, ErrorKind as IoErrorKind};
use std::path::PathBuf;

/// A container error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for container operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Actionable error categories.
///
/// These describe what the caller should *do*, not what went wrong internally.
#[derive(Debug, Display, Error, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// Bad magic, broken record terminator or truncated input. Reading cannot
    /// continue past this point in the container.
    #[display("malformed container: {_0}")]
    MalformedContainer(#[error(not(source))] String),
    /// A header value contains a character the wire format cannot carry.
    /// Nothing was written for the record.
    #[display("invalid header value: {_0}")]
    HeaderValidation(#[error(not(source))] String),
    /// The content stream ended before the declared content length.
    #[display("content length mismatch: declared {expected} bytes but only {actual} were available")]
    LengthMismatch { expected: u64, actual: u64 },
    /// The record type is not one of the known record types.
    #[display("unknown record type: {_0}")]
    UnknownRecordType(#[error(not(source))] String),
    /// A record must carry a body, named fields, or both.
    #[display("record has neither content nor named fields")]
    EmptyRecord,
    /// The path or stream could not be identified as a container.
    #[display("not a WARC container: {_0}")]
    NotAContainer(#[error(not(source))] String),
    /// The number of records in a container differs from what was expected.
    #[display("expected {expected} records but found {actual}")]
    RecordCount { expected: usize, actual: usize },
    /// Compression/decompression error
    #[display("compression error: {_0}")]
    Compression(CompressionErrorKind),
    /// Underlying I/O error
    #[display("I/O error")]
    Io,
}

impl ErrorKind {
    /// Convert a compression error into a container error, preserving the
    /// compress crate's `Exn` frame as a child in its own error tree.
    #[track_caller]
    pub fn compression(err: CompressionError) -> Error {
        let inner = (*err).clone();
        err.raise(ErrorKind::Compression(inner))
    }

    /// Classify an I/O failure hit while reading the record at `offset`.
    /// Running out of input, or input that does not decompress, means the
    /// container itself is broken.
    pub fn reading(err: &IoError, offset: u64) -> Self {
        match err.kind() {
            IoErrorKind::UnexpectedEof => Self::MalformedContainer(format!("record at offset {offset} is truncated: {err}")),
            IoErrorKind::InvalidData | IoErrorKind::InvalidInput => {
                Self::MalformedContainer(format!("record at offset {offset} is corrupt: {err}"))
            },
            _ => Self::Io,
        }
    }

    /// Shorthand for a [`NotAContainer`](Self::NotAContainer) error about a path.
    pub fn not_a_container(path: impl Into<PathBuf>) -> Self {
        Self::NotAContainer(path.into().display().to_string())
    }

    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Io => true,
            Self::Compression(inner) => inner.is_retryable(),
            _ => false,
        }
    }

    /// Returns `true` for errors that leave a reader unable to continue.
    pub fn is_fatal_for_reader(&self) -> bool {
        matches!(self, Self::MalformedContainer(_) | Self::Compression(_) | Self::Io)
    }
}

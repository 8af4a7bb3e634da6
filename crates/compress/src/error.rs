//! Compression errors.

use derive_more::{Display, Error};

pub type Error = exn::Exn<ErrorKind>;
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Display, Error, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// A gzip member could not be decoded.
    #[display("invalid or corrupted data")]
    InvalidData,
    /// Names a compression format other than `none` or `gzip`.
    #[display("unsupported format: {_0}")]
    UnsupportedFormat(#[error(not(source))] String),
    /// An earlier failure left the member reader between states.
    #[display("member reader is unusable after an earlier failure")]
    Poisoned,
    /// Reading, seeking or writing the underlying stream failed.
    #[display("I/O error")]
    Io,
}

impl ErrorKind {
    /// Only stream failures are worth retrying; corrupt members stay corrupt.
    pub fn is_retryable(&self) -> bool {
        matches!(self, ErrorKind::Io)
    }
}

//! Pool Error Types

use derive_more::{Display, Error};
use harc_warc::error::{Error as WarcError, ErrorKind as WarcErrorKind};

pub type Error = exn::Exn<ErrorKind>;
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Display, Error, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// Every member stayed checked out for the whole wait limit.
    #[display("no pool member became available in time")]
    Exhausted,
    /// The pool no longer hands out members.
    #[display("pool is closed")]
    Closed,
    /// A new member could not be created.
    #[display("failed to create pool member")]
    Create,
    /// A member could not be retired cleanly.
    #[display("failed to retire pool member")]
    Destroy,
    /// None of the configured output directories can be written to.
    #[display("no usable output directory")]
    NoDirectory,
    #[display("writer error: {_0}")]
    Writer(WarcErrorKind),
    #[display("invalid pool settings: {_0}")]
    InvalidSettings(#[error(not(source))] String),
    /// Underlying I/O error
    #[display("I/O error")]
    Io,
}

impl ErrorKind {
    /// Re-raise a container error, keeping it as a child frame.
    #[track_caller]
    pub fn writer(err: WarcError) -> Error {
        let inner = (*err).clone();
        err.raise(ErrorKind::Writer(inner))
    }

    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Exhausted | Self::Io => true,
            Self::Writer(inner) => inner.is_retryable(),
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn writer_errors_keep_their_kind() {
        let inner: WarcError = exn::Exn::from(WarcErrorKind::EmptyRecord);
        let err = ErrorKind::writer(inner);
        assert_eq!(*err, ErrorKind::Writer(WarcErrorKind::EmptyRecord));
        assert!(!err.is_retryable());
    }

    #[test]
    fn retryable() {
        assert!(ErrorKind::Exhausted.is_retryable());
        assert!(ErrorKind::Writer(WarcErrorKind::Io).is_retryable());
        assert!(!ErrorKind::Closed.is_retryable());
    }
}

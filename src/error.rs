use derive_more::{Display, Error};

pub type Error = exn::Exn<ErrorKind>;
pub type Result<T> = std::result::Result<T, Error>;

/// What a command failed to do.
#[derive(Debug, Display, Error, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    #[display("invalid command-line arguments: {_0}")]
    Arguments(#[error(not(source))] String),
    #[display("could not load configuration")]
    Config,
    #[display("could not read {_0}")]
    Read(#[error(not(source))] String),
    #[display("{_0} is not a valid container")]
    Invalid(#[error(not(source))] String),
    #[display("could not write records")]
    Write,
    #[display("could not write to standard output")]
    Output,
}

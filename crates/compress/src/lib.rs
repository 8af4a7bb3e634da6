//! Compression detection and per-record gzip members.
//!
//! Containers are either plain or a concatenation of independent gzip
//! members, one per record. This crate provides:
//!
//! - **Format detection** from magic bytes ([`Compression::from_magic_bytes`])
//!   or a format name (`FromStr`)
//! - **Member encoding** via [`Compression::member_encoder`], which frames
//!   everything written to it as exactly one gzip member
//! - **Member decoding** via [`MemberReader`], which decodes one member at a
//!   time and reports the compressed offset where each member begins
//! - **Position tracking** via [`CountingReader`] and [`CountingWriter`]
//! - **Command-line flags** via [`cli::Preference`]
//!
//! Gzip members stay independently decompressable, which is what makes
//! random access by compressed offset possible.

pub mod cli;
mod construct;
mod counting;
pub mod error;
mod member;

pub use crate::counting::{CountingReader, CountingWriter};
pub use crate::member::{MemberEncoder, MemberReader};

/// A supported container compression format.
///
/// Defaults to [`None`](Self::None) (uncompressed). Displays as the name
/// accepted by [`FromStr`](std::str::FromStr).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, derive_more::Display)]
pub enum Compression {
    /// Uncompressed
    #[default]
    #[display("none")]
    None,
    /// One gzip member per record (.gz)
    #[display("gzip")]
    Gzip,
}

impl Compression {
    /// Appended to the `.warc` extension of a container file name.
    #[inline]
    #[must_use]
    pub fn extension(&self) -> &'static str {
        match self {
            Compression::None => "",
            Compression::Gzip => ".gz",
        }
    }

    /// Whether each record is framed as its own member.
    #[inline]
    #[must_use]
    pub fn is_compressed(&self) -> bool {
        *self != Compression::None
    }
}

//! Detecting the compression of a container.

use crate::Compression;
use crate::error::{Error, ErrorKind};
use std::str::FromStr;

pub(crate) const GZIP_MAGIC: [u8; 2] = [0x1F, 0x8B];

impl FromStr for Compression {
    type Err = Error;

    /// Accepts `none`/`plain` and `gz`/`gzip`, in any case.
    fn from_str(name: &str) -> Result<Self, Self::Err> {
        if name.eq_ignore_ascii_case("none") || name.eq_ignore_ascii_case("plain") {
            return Ok(Compression::None);
        }
        if name.eq_ignore_ascii_case("gz") || name.eq_ignore_ascii_case("gzip") {
            return Ok(Compression::Gzip);
        }
        exn::bail!(ErrorKind::UnsupportedFormat(name.to_string()))
    }
}

impl From<bool> for Compression {
    fn from(compress: bool) -> Self {
        if compress { Compression::Gzip } else { Compression::None }
    }
}

impl From<&[u8]> for Compression {
    fn from(head: &[u8]) -> Self {
        Compression::from_magic_bytes(head)
    }
}

impl Compression {
    /// Sniff the first bytes of a stream. Anything too short to tell, or
    /// without the gzip magic, is plain.
    #[must_use]
    pub fn from_magic_bytes(head: &[u8]) -> Self {
        if head.starts_with(&GZIP_MAGIC) { Compression::Gzip } else { Compression::None }
    }

    /// Whether `head` starts the way this format's data does.
    #[must_use]
    pub fn check_magic_bytes(&self, head: &[u8]) -> bool {
        Self::from_magic_bytes(head) == *self
    }
}

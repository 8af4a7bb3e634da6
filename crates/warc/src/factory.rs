//! Pick the right reader for a container.
//!
//! Gzip input is always read as a [`CompressedReader`]. Anything else must
//! start with the container magic, and when opened from a path must also
//! carry the `.warc` extension, to be read as a [`PlainReader`].

use crate::consts::{EXTENSION, MAGIC, OCCUPIED_SUFFIX};
use crate::error::{ErrorKind, Result};
use crate::reader::{CompressedReader, PlainReader, WarcReader};
use exn::ResultExt;
use harc_compress::Compression;
use std::fs::File;
use std::io::{BufRead, BufReader, Read, Seek, SeekFrom};
use std::path::Path;
use tracing::instrument;

/// Open the container at `path` from its first record.
#[instrument(level = "debug", skip(path), fields(path = %path.as_ref().display()))]
pub fn open(path: impl AsRef<Path>) -> Result<WarcReader<File>> {
    let path = path.as_ref();
    let (compression, input) = detect_path(path)?;
    Ok(build(path.display().to_string(), compression, input, 0))
}

/// Open the container at `path` positioned at the record starting at
/// `offset`, as reported by [`RecordHeader::offset`](crate::RecordHeader::offset).
#[instrument(level = "debug", skip(path), fields(path = %path.as_ref().display()))]
pub fn open_at(path: impl AsRef<Path>, offset: u64) -> Result<WarcReader<File>> {
    let path = path.as_ref();
    let (compression, mut input) = detect_path(path)?;
    input.seek(SeekFrom::Start(offset)).or_raise(|| ErrorKind::Io)?;
    Ok(build(path.display().to_string(), compression, input, offset))
}

/// Read a container from an arbitrary stream, detecting the variant from
/// its first bytes.
pub fn from_stream<R: Read>(identifier: impl Into<String>, input: R) -> Result<WarcReader<R>> {
    let identifier = identifier.into();
    let mut input = BufReader::new(input);
    match sniff(&mut input)? {
        Some(compression) => Ok(build(identifier, compression, input, 0)),
        None => exn::bail!(ErrorKind::NotAContainer(identifier)),
    }
}

/// Whether `path` can be opened as a container.
pub fn is_container(path: impl AsRef<Path>) -> bool {
    detect_path(path.as_ref()).is_ok()
}

fn detect_path(path: &Path) -> Result<(Compression, BufReader<File>)> {
    let file = File::open(path).or_raise(|| ErrorKind::Io)?;
    let mut input = BufReader::new(file);
    match sniff(&mut input)? {
        Some(Compression::Gzip) => Ok((Compression::Gzip, input)),
        Some(Compression::None) if has_container_extension(path) => Ok((Compression::None, input)),
        _ => exn::bail!(ErrorKind::not_a_container(path)),
    }
}

/// Look at the first buffered bytes without consuming them.
fn sniff<R: Read>(input: &mut BufReader<R>) -> Result<Option<Compression>> {
    let head = input.fill_buf().or_raise(|| ErrorKind::Io)?;
    if Compression::Gzip.check_magic_bytes(head) {
        return Ok(Some(Compression::Gzip));
    }
    if head.starts_with(MAGIC.as_bytes()) {
        return Ok(Some(Compression::None));
    }
    Ok(None)
}

fn has_container_extension(path: &Path) -> bool {
    let Some(name) = path.file_name().and_then(|name| name.to_str()) else {
        return false;
    };
    let name = name.strip_suffix(OCCUPIED_SUFFIX).unwrap_or(name);
    Path::new(name).extension().is_some_and(|ext| ext.eq_ignore_ascii_case(EXTENSION))
}

fn build<R: Read>(identifier: String, compression: Compression, input: BufReader<R>, offset: u64) -> WarcReader<R> {
    tracing::debug!(identifier = %identifier, %compression, offset, "Opening container");
    match compression {
        Compression::None => WarcReader::Plain(PlainReader::from_buffered(identifier, input, offset)),
        Compression::Gzip => WarcReader::Compressed(CompressedReader::from_buffered(identifier, input, offset)),
    }
}

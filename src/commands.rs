//! What each subcommand does, writing its report to `out`.

use crate::error::{ErrorKind, Result};
use exn::ResultExt;
use harc_config::WriterSettings;
use harc_pool::WriterPool;
use harc_warc::consts::MAGIC;
use harc_warc::{RecordHeader, RecordInfo, RecordType, StatTally, UuidGenerator, factory};
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::instrument;

const DEFAULT_MIMETYPE: &str = "application/octet-stream";

/// One line per record: offset, type, content length and target URL.
#[instrument(skip(out), fields(path = %path.display()))]
pub fn list(path: &Path, out: &mut impl Write) -> Result<usize> {
    let name = path.display().to_string();
    let reader = factory::open(path).map_err(|err| err.raise(ErrorKind::Read(name.clone())))?;
    let mut count = 0;
    for header in reader.headers() {
        let header = header.map_err(|err| err.raise(ErrorKind::Invalid(name.clone())))?;
        writeln!(
            out,
            "{}\t{}\t{}\t{}",
            header.offset(),
            header.field(harc_warc::consts::HEADER_KEY_TYPE).unwrap_or("-"),
            header.content_length(),
            header.url().unwrap_or("-"),
        )
        .or_raise(|| ErrorKind::Output)?;
        count += 1;
    }
    Ok(count)
}

/// Print header blocks, either of every record or of the one at `offset`.
/// Bodies are printed too when `body` is set.
#[instrument(skip(out), fields(path = %path.display()))]
pub fn dump(path: &Path, offset: Option<u64>, body: bool, out: &mut impl Write) -> Result<()> {
    let name = path.display().to_string();
    let mut reader = factory::open(path).map_err(|err| err.raise(ErrorKind::Read(name.clone())))?;
    if let Some(offset) = offset {
        let mut record = reader.get(offset).map_err(|err| err.raise(ErrorKind::Invalid(name.clone())))?;
        write_header(out, record.header())?;
        if body {
            record.copy_into(out).map_err(|err| err.raise(ErrorKind::Invalid(name.clone())))?;
            writeln!(out).or_raise(|| ErrorKind::Output)?;
        }
        return Ok(());
    }
    while let Some(mut record) = reader.next_record().map_err(|err| err.raise(ErrorKind::Invalid(name.clone())))? {
        write_header(out, record.header())?;
        if body {
            record.copy_into(out).map_err(|err| err.raise(ErrorKind::Invalid(name.clone())))?;
            writeln!(out).or_raise(|| ErrorKind::Output)?;
        }
    }
    Ok(())
}

fn write_header(out: &mut impl Write, header: &RecordHeader) -> Result<()> {
    writeln!(out, "# offset {} in {}", header.offset(), header.reader_identifier()).or_raise(|| ErrorKind::Output)?;
    writeln!(out, "{MAGIC}{}", header.version()).or_raise(|| ErrorKind::Output)?;
    for (name, value) in header.fields().iter() {
        writeln!(out, "{name}: {value}").or_raise(|| ErrorKind::Output)?;
    }
    writeln!(out).or_raise(|| ErrorKind::Output)
}

/// Read every record of a container, digesting each body. Fails on the
/// first unreadable record, or when the number of records differs from
/// `expected`.
#[instrument(skip(out), fields(path = %path.display()))]
pub fn validate(path: &Path, expected: Option<usize>, out: &mut impl Write) -> Result<usize> {
    let name = path.display().to_string();
    let reader = factory::open(path).map_err(|err| err.raise(ErrorKind::Read(name.clone())))?;
    let headers =
        reader.with_digests(true).validate(expected).map_err(|err| err.raise(ErrorKind::Invalid(name.clone())))?;
    for header in &headers {
        tracing::debug!(offset = header.offset(), digest = header.digest(), "Record is readable");
    }
    writeln!(out, "{name}: OK, {} records", headers.len()).or_raise(|| ErrorKind::Output)?;
    Ok(headers.len())
}

/// Outcome of [`pack`].
#[derive(Debug, Default)]
pub struct Packed {
    pub stats: StatTally,
    /// Inputs that were not archived.
    pub failed: Vec<PathBuf>,
}

/// Archive every input file as a `resource` record, through a writer pool
/// configured by `settings`.
#[instrument(skip_all, fields(inputs = inputs.len()))]
pub fn pack(settings: &WriterSettings, inputs: &[PathBuf]) -> Result<Packed> {
    let pool = WriterPool::from_settings(settings, Arc::new(UuidGenerator)).map_err(|err| err.raise(ErrorKind::Write))?;
    let mut failed = Vec::new();
    for input in inputs {
        if let Err(err) = pack_one(&pool, input) {
            tracing::error!(path = %input.display(), error = ?err, "Failed to archive file");
            failed.push(input.clone());
        }
    }
    pool.close().map_err(|err| err.raise(ErrorKind::Write))?;
    Ok(Packed { stats: pool.stats(), failed })
}

fn pack_one(pool: &WriterPool, input: &Path) -> Result<()> {
    let name = input.display().to_string();
    let file = File::open(input).or_raise(|| ErrorKind::Read(name.clone()))?;
    let length = file.metadata().or_raise(|| ErrorKind::Read(name.clone()))?.len();
    let url = file_url(input).or_raise(|| ErrorKind::Read(name.clone()))?;

    let mut handle = pool.checkout().map_err(|err| err.raise(ErrorKind::Write))?;
    let before = handle.size();
    let info = RecordInfo::new(RecordType::Resource, file, length).url(url).mimetype(DEFAULT_MIMETYPE);
    match handle.write_resource(info) {
        Ok(id) => {
            tracing::info!(path = %name, record_id = %id, container = %handle.path().display(), "Archived file");
            pool.checkin(handle).map_err(|err| err.raise(ErrorKind::Write))
        },
        Err(err) => {
            // Nothing reached the container unless its size moved.
            if handle.size() == before {
                pool.checkin(handle).map_err(|err| err.raise(ErrorKind::Write))?;
            } else {
                pool.invalidate(handle).map_err(|err| err.raise(ErrorKind::Write))?;
            }
            Err(err.raise(ErrorKind::Write))
        },
    }
}

/// A `file://` URL for `path`, with white space, control characters and `%`
/// percent-encoded.
fn file_url(path: &Path) -> std::io::Result<String> {
    let absolute = std::fs::canonicalize(path)?;
    let mut url = String::from("file://");
    for c in absolute.to_string_lossy().chars() {
        if c.is_whitespace() || c.is_control() || c == '%' {
            let mut buf = [0u8; 4];
            for byte in c.encode_utf8(&mut buf).bytes() {
                url.push_str(&format!("%{byte:02X}"));
            }
        } else {
            url.push(c);
        }
    }
    Ok(url)
}

//! One container file being written by the pool.

use crate::error::{ErrorKind, Result};
use exn::ResultExt;
use harc_compress::Compression;
use harc_warc::consts::{INVALID_SUFFIX, OCCUPIED_SUFFIX};
use harc_warc::{RecordIdGenerator, WarcWriter, Warcinfo};
use std::fs::{File, OpenOptions};
use std::io::BufWriter;
use std::ops::{Deref, DerefMut};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::instrument;

/// A writer bound to a freshly created container file.
///
/// The file carries the in-progress suffix until it is closed. Dereferences
/// to the [`WarcWriter`] appending to it.
pub struct WarcFile {
    writer: WarcWriter<BufWriter<File>>,
    path: PathBuf,
    max_size: u64,
}

impl WarcFile {
    /// Create the file at `path` and write its `warcinfo` record. Nothing is
    /// left on disk when this fails.
    #[instrument(skip_all, fields(path = %path.display()))]
    pub fn create(
        path: PathBuf,
        compression: Compression,
        ids: Arc<dyn RecordIdGenerator>,
        warcinfo: Warcinfo,
        spool_memory: usize,
        max_size: u64,
    ) -> Result<Self> {
        let file = OpenOptions::new().write(true).create_new(true).open(&path).or_raise(|| ErrorKind::Create)?;
        let mut writer =
            WarcWriter::new(BufWriter::new(file), compression, ids).warcinfo(warcinfo).spool_memory(spool_memory);
        let name = path.file_name().map(|name| name.to_string_lossy().into_owned()).unwrap_or_default();
        if let Err(err) = writer.bootstrap(&name).and_then(|_| writer.flush()) {
            drop(writer);
            if let Err(remove) = std::fs::remove_file(&path) {
                tracing::warn!(error = %remove, "Failed to remove container after failed bootstrap");
            }
            return Err(err.raise(ErrorKind::Create));
        }
        tracing::info!(size = writer.position(), "Opened container");
        Ok(Self { writer, path, max_size })
    }

    /// Current path, including the in-progress suffix.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Path the file will have once closed.
    pub fn final_path(&self) -> PathBuf {
        strip_occupied(&self.path)
    }

    /// Bytes written to the file so far.
    pub fn size(&self) -> u64 {
        self.writer.position()
    }

    /// Whether the file has grown past the rotation threshold.
    pub fn is_full(&self) -> bool {
        self.size() > self.max_size
    }

    /// Flush the file and drop the in-progress suffix. Returns the final path.
    #[instrument(skip_all, fields(path = %self.path.display(), size = self.size()))]
    pub fn close(self) -> Result<PathBuf> {
        let target = self.final_path();
        self.finish(target)
    }

    /// Close the file and rename it with the invalid suffix so it is not
    /// mistaken for a complete container.
    #[instrument(skip_all, fields(path = %self.path.display(), size = self.size()))]
    pub fn invalidate(self) -> Result<PathBuf> {
        let mut target = self.final_path().into_os_string();
        target.push(INVALID_SUFFIX);
        self.finish(PathBuf::from(target))
    }

    fn finish(self, target: PathBuf) -> Result<PathBuf> {
        let Self { writer, path, .. } = self;
        let file = writer.into_inner().map_err(ErrorKind::writer)?.into_inner().or_raise(|| ErrorKind::Io)?;
        file.sync_all().or_raise(|| ErrorKind::Io)?;
        drop(file);
        std::fs::rename(&path, &target).or_raise(|| ErrorKind::Destroy)?;
        tracing::info!(path = %target.display(), "Closed container");
        Ok(target)
    }
}

impl Deref for WarcFile {
    type Target = WarcWriter<BufWriter<File>>;

    fn deref(&self) -> &Self::Target {
        &self.writer
    }
}

impl DerefMut for WarcFile {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.writer
    }
}

fn strip_occupied(path: &Path) -> PathBuf {
    let name = path.file_name().and_then(|name| name.to_str()).unwrap_or_default();
    match name.strip_suffix(OCCUPIED_SUFFIX) {
        Some(stripped) => path.with_file_name(stripped),
        None => path.to_path_buf(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use harc_warc::{RecordInfo, RecordType, UuidGenerator, factory};

    fn create(dir: &Path, name: &str, max_size: u64) -> WarcFile {
        let warcinfo = Warcinfo::from_lines(Some("test crawl".to_string()), &["operator: tests"]);
        WarcFile::create(dir.join(name), Compression::Gzip, Arc::new(UuidGenerator), warcinfo, 1024, max_size).unwrap()
    }

    #[test]
    fn bootstraps_and_renames_on_close() {
        let dir = tempfile::tempdir().unwrap();
        let mut file = create(dir.path(), "T-00000-20240101000000.warc.gz.open", 1 << 20);
        assert!(file.path().exists());
        assert!(file.size() > 0);
        file.write_resource(RecordInfo::from_bytes(RecordType::Resource, b"body").url("http://a.test/")).unwrap();

        let closed = file.close().unwrap();
        assert_eq!(closed, dir.path().join("T-00000-20240101000000.warc.gz"));
        assert!(!dir.path().join("T-00000-20240101000000.warc.gz.open").exists());

        let headers = factory::open(&closed).unwrap().validate(Some(2)).unwrap();
        assert_eq!(headers[0].record_type().unwrap(), RecordType::Warcinfo);
        assert_eq!(headers[0].filename(), Some("T-00000-20240101000000.warc.gz"));
        assert_eq!(headers[0].field("Content-Description"), Some("test crawl"));
        assert_eq!(headers[1].url(), Some("http://a.test/"));
    }

    #[test]
    fn full_after_threshold() {
        let dir = tempfile::tempdir().unwrap();
        // The warcinfo record alone is larger than the threshold.
        assert!(create(dir.path(), "T.warc.gz.open", 10).is_full());
        let mut roomy = create(dir.path(), "U.warc.gz.open", 1 << 20);
        assert!(!roomy.is_full());
        roomy.write_resource(RecordInfo::from_bytes(RecordType::Resource, b"x").url("http://a.test/")).unwrap();
        assert!(!roomy.is_full());
    }

    #[test]
    fn invalidate_renames() {
        let dir = tempfile::tempdir().unwrap();
        let file = create(dir.path(), "T.warc.gz.open", 1 << 20);
        let invalid = file.invalidate().unwrap();
        assert_eq!(invalid, dir.path().join("T.warc.gz.invalid"));
        assert!(invalid.exists());
    }

    #[test]
    fn existing_file_is_not_overwritten() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("T.warc.gz.open");
        std::fs::write(&path, b"keep").unwrap();
        let err = WarcFile::create(path.clone(), Compression::Gzip, Arc::new(UuidGenerator), Warcinfo::default(), 1024, 1)
            .err()
            .unwrap();
        assert_eq!(*err, ErrorKind::Create);
        assert_eq!(std::fs::read(&path).unwrap(), b"keep");
    }
}

//! Container file names and output directory rotation.

use crate::error::{ErrorKind, Result};
use harc_compress::Compression;
use harc_warc::consts::{EXTENSION, OCCUPIED_SUFFIX};
use harc_warc::date::now14;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, AtomicUsize, Ordering};

/// Hands out unique paths for new containers:
/// `<prefix>-<serial>-<timestamp>[-<suffix>].warc[.gz].open`.
///
/// The serial number is shared by every file a namer creates, and can be
/// shared between namers with [`with_serial`](Self::with_serial).
#[derive(Debug)]
pub struct FileNamer {
    prefix: String,
    suffix: String,
    compression: Compression,
    directories: Vec<PathBuf>,
    serial: Arc<AtomicU32>,
    next_directory: AtomicUsize,
}

impl FileNamer {
    pub fn new(prefix: impl Into<String>, suffix: impl Into<String>, compression: Compression, directories: Vec<PathBuf>) -> Self {
        Self {
            prefix: prefix.into(),
            suffix: suffix.into(),
            compression,
            directories,
            serial: Arc::new(AtomicU32::new(0)),
            next_directory: AtomicUsize::new(0),
        }
    }

    #[must_use]
    pub fn with_serial(mut self, serial: Arc<AtomicU32>) -> Self {
        self.serial = serial;
        self
    }

    pub fn serial(&self) -> &Arc<AtomicU32> {
        &self.serial
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn compression(&self) -> Compression {
        self.compression
    }

    /// The in-progress name for a container.
    pub fn file_name(&self, serial: u32, timestamp: &str) -> String {
        let mut name = format!("{}-{serial:05}-{timestamp}", self.prefix);
        if !self.suffix.is_empty() {
            name.push('-');
            name.push_str(&self.suffix);
        }
        name.push('.');
        name.push_str(EXTENSION);
        name.push_str(self.compression.extension());
        name.push_str(OCCUPIED_SUFFIX);
        name
    }

    /// A fresh path in the next usable directory.
    pub fn next_path(&self) -> Result<PathBuf> {
        let directory = self.next_directory()?;
        let serial = self.serial.fetch_add(1, Ordering::SeqCst);
        Ok(directory.join(self.file_name(serial, &now14())))
    }

    /// Directories are used in turn. One that cannot be created or written
    /// to is skipped for this round.
    fn next_directory(&self) -> Result<PathBuf> {
        let count = self.directories.len();
        if count == 0 {
            exn::bail!(ErrorKind::NoDirectory);
        }
        let start = self.next_directory.fetch_add(1, Ordering::Relaxed);
        for step in 0..count {
            let directory = &self.directories[(start + step) % count];
            match writable(directory) {
                Ok(()) => return Ok(directory.clone()),
                Err(err) => {
                    tracing::warn!(directory = %directory.display(), error = %err, "Skipping unusable output directory");
                },
            }
        }
        exn::bail!(ErrorKind::NoDirectory)
    }
}

fn writable(directory: &Path) -> std::io::Result<()> {
    std::fs::create_dir_all(directory)?;
    if std::fs::metadata(directory)?.permissions().readonly() {
        return Err(std::io::Error::new(std::io::ErrorKind::PermissionDenied, "directory is read-only"));
    }
    Ok(())
}

//! Pool of writers over rotating container files.

use crate::error::{ErrorKind, Result};
use crate::member::WarcFile;
use crate::naming::FileNamer;
use crate::pool::{Checkout, MemberFactory, Pool};
use harc_config::WriterSettings;
use harc_warc::{RecordIdGenerator, StatTally, StatsAggregator, Warcinfo};
use std::sync::Arc;
use std::sync::atomic::AtomicU32;
use std::time::Duration;
use tracing::instrument;

/// Creates, rotates and retires [`WarcFile`]s.
///
/// Tallies of returned and retired files are drained into a shared
/// [`StatsAggregator`].
pub struct WarcFileFactory {
    namer: FileNamer,
    ids: Arc<dyn RecordIdGenerator>,
    warcinfo: Warcinfo,
    spool_memory: usize,
    max_size: u64,
    stats: Arc<StatsAggregator>,
}

impl WarcFileFactory {
    pub fn new(namer: FileNamer, ids: Arc<dyn RecordIdGenerator>, warcinfo: Warcinfo, max_size: u64) -> Self {
        Self {
            namer,
            ids,
            warcinfo,
            spool_memory: harc_warc::DEFAULT_SPOOL_MEMORY,
            max_size,
            stats: Arc::new(StatsAggregator::new()),
        }
    }

    #[must_use]
    pub fn spool_memory(mut self, bytes: usize) -> Self {
        self.spool_memory = bytes;
        self
    }

    pub fn stats(&self) -> &Arc<StatsAggregator> {
        &self.stats
    }

    pub fn namer(&self) -> &FileNamer {
        &self.namer
    }
}

impl MemberFactory for WarcFileFactory {
    type Member = WarcFile;

    fn create(&self) -> Result<WarcFile> {
        let path = self.namer.next_path()?;
        WarcFile::create(
            path,
            self.namer.compression(),
            self.ids.clone(),
            self.warcinfo.clone(),
            self.spool_memory,
            self.max_size,
        )
    }

    fn destroy(&self, mut member: WarcFile) -> Result<()> {
        self.stats.absorb(member.tally_mut());
        member.close().map(|_| ())
    }

    fn is_reusable(&self, member: &WarcFile) -> bool {
        !member.is_full()
    }

    fn passivate(&self, member: &mut WarcFile) -> Result<()> {
        self.stats.absorb(member.tally_mut());
        member.flush().map_err(ErrorKind::writer)
    }

    fn invalidate(&self, mut member: WarcFile) -> Result<()> {
        self.stats.absorb(member.tally_mut());
        let path = member.invalidate()?;
        tracing::warn!(path = %path.display(), "Invalidated container");
        Ok(())
    }
}

/// Exclusive use of one writer. Dereferences to the [`WarcFile`], and so to
/// its [`WarcWriter`](harc_warc::WarcWriter); returned to the pool on drop.
pub type WriterHandle<'p> = Checkout<'p, WarcFileFactory>;

/// Hands out writers bound to open, under-size container files.
///
/// # Examples
///
/// ```
/// use harc_config::WriterSettings;
/// use harc_pool::WriterPool;
/// use harc_warc::{RecordInfo, RecordType, UuidGenerator};
/// use std::sync::Arc;
///
/// let dir = tempfile::tempdir().unwrap();
/// let settings = WriterSettings { directories: vec![dir.path().to_path_buf()], ..WriterSettings::default() };
/// let pool = WriterPool::from_settings(&settings, Arc::new(UuidGenerator)).unwrap();
///
/// let mut writer = pool.checkout().unwrap();
/// writer.write_resource(RecordInfo::from_bytes(RecordType::Resource, b"hello").url("http://example.com/")).unwrap();
/// pool.checkin(writer).unwrap();
/// pool.close().unwrap();
/// assert_eq!(pool.stats().of(RecordType::Resource).records, 1);
/// ```
pub struct WriterPool {
    pool: Pool<WarcFileFactory>,
}

impl WriterPool {
    pub fn new(factory: WarcFileFactory, max_active: usize, max_wait: Duration) -> Result<Self> {
        if max_active == 0 {
            exn::bail!(ErrorKind::InvalidSettings("max_active must be at least 1".to_string()));
        }
        tracing::info!(
            prefix = factory.namer.prefix(),
            compression = %factory.namer.compression(),
            max_size = factory.max_size,
            max_active,
            max_wait_ms = max_wait.as_millis() as u64,
            "Created writer pool"
        );
        Ok(Self { pool: Pool::new(factory, max_active, max_wait) })
    }

    pub fn from_settings(settings: &WriterSettings, ids: Arc<dyn RecordIdGenerator>) -> Result<Self> {
        Self::with_serial(settings, ids, Arc::new(AtomicU32::new(0)))
    }

    /// Like [`from_settings`](Self::from_settings), numbering files from a
    /// serial shared with other pools.
    pub fn with_serial(settings: &WriterSettings, ids: Arc<dyn RecordIdGenerator>, serial: Arc<AtomicU32>) -> Result<Self> {
        if settings.directories.is_empty() {
            exn::bail!(ErrorKind::InvalidSettings("at least one output directory is required".to_string()));
        }
        let namer = FileNamer::new(
            settings.prefix.clone(),
            settings.resolved_suffix(),
            settings.compression(),
            settings.directories.clone(),
        )
        .with_serial(serial);
        let warcinfo = Warcinfo::from_lines(settings.description.clone(), &settings.metadata);
        let factory =
            WarcFileFactory::new(namer, ids, warcinfo, settings.max_size).spool_memory(settings.spool_memory);
        Self::new(factory, settings.max_active, settings.max_wait())
    }

    /// A writer for exclusive use. Full containers are closed and replaced by
    /// a freshly bootstrapped one first.
    #[instrument(level = "debug", skip(self), fields(state = %self.pool.state()))]
    pub fn checkout(&self) -> Result<WriterHandle<'_>> {
        let handle = self.pool.checkout()?;
        tracing::debug!(path = %handle.path().display(), size = handle.size(), "Checked out writer");
        Ok(handle)
    }

    /// Return a writer. Its container is closed if it has grown past the
    /// size limit.
    pub fn checkin(&self, handle: WriterHandle<'_>) -> Result<()> {
        handle.checkin()
    }

    /// Retire a writer whose container must not be trusted, renaming the
    /// file with the invalid suffix.
    pub fn invalidate(&self, handle: WriterHandle<'_>) -> Result<()> {
        handle.invalidate()
    }

    /// Close every idle container. Writers still checked out are closed when
    /// they are returned.
    #[instrument(skip(self), fields(state = %self.pool.state()))]
    pub fn close(&self) -> Result<()> {
        self.pool.close()
    }

    pub fn num_active(&self) -> usize {
        self.pool.num_active()
    }

    pub fn num_idle(&self) -> usize {
        self.pool.num_idle()
    }

    pub fn state(&self) -> String {
        self.pool.state()
    }

    /// Everything written through writers that have since been returned.
    pub fn stats(&self) -> StatTally {
        self.pool.factory().stats().snapshot()
    }

    pub fn serial(&self) -> &Arc<AtomicU32> {
        self.pool.factory().namer().serial()
    }
}

use harc_compress::Compression;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_PREFIX: &str = "IAH";
/// Replaced by the host name when file names are generated.
pub const HOSTNAME_VARIABLE: &str = "${HOSTNAME}";
pub const DEFAULT_MAX_SIZE: u64 = 1024 * 1024 * 1024;
pub const DEFAULT_MAX_ACTIVE: usize = 1;
pub const DEFAULT_MAX_WAIT_MS: u64 = 5 * 60 * 1000;
pub const DEFAULT_SPOOL_MEMORY: usize = 1024 * 1024;

/// How the writer pool names, sizes and fills container files.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WriterSettings {
    /// Output directories, used in turn.
    pub directories: Vec<PathBuf>,
    pub prefix: String,
    /// May contain `${HOSTNAME}`.
    pub suffix: String,
    /// One gzip member per record, and a `.warc.gz` extension.
    pub compress: bool,
    /// Size on disk, in bytes, past which a container is rotated.
    pub max_size: u64,
    /// Maximum number of writers checked out at once.
    pub max_active: usize,
    /// How long a checkout waits for a writer to become free.
    pub max_wait_ms: u64,
    /// Records up to this many bytes are staged in memory.
    pub spool_memory: usize,
    /// `Content-Description` of the `warcinfo` record opening each container.
    pub description: Option<String>,
    /// Lines making up the body of the `warcinfo` record.
    pub metadata: Vec<String>,
}

impl Default for WriterSettings {
    fn default() -> Self {
        Self {
            directories: vec![PathBuf::from("warcs")],
            prefix: DEFAULT_PREFIX.to_string(),
            suffix: HOSTNAME_VARIABLE.to_string(),
            compress: true,
            max_size: DEFAULT_MAX_SIZE,
            max_active: DEFAULT_MAX_ACTIVE,
            max_wait_ms: DEFAULT_MAX_WAIT_MS,
            spool_memory: DEFAULT_SPOOL_MEMORY,
            description: None,
            metadata: Vec::new(),
        }
    }
}

impl WriterSettings {
    pub fn compression(&self) -> Compression {
        Compression::from(self.compress)
    }

    pub fn max_wait(&self) -> Duration {
        Duration::from_millis(self.max_wait_ms)
    }

    /// The suffix with `${HOSTNAME}` replaced by the `HOSTNAME` environment
    /// variable, or `localhost` when it is unset.
    pub fn resolved_suffix(&self) -> String {
        if !self.suffix.contains(HOSTNAME_VARIABLE) {
            return self.suffix.clone();
        }
        let hostname = std::env::var("HOSTNAME")
            .ok()
            .filter(|name| !name.trim().is_empty())
            .unwrap_or_else(|| "localhost".to_string());
        self.suffix.replace(HOSTNAME_VARIABLE, hostname.trim())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let settings = WriterSettings::default();
        assert_eq!(settings.directories, vec![PathBuf::from("warcs")]);
        assert_eq!(settings.prefix, "IAH");
        assert_eq!(settings.compression(), Compression::Gzip);
        assert_eq!(settings.max_wait(), Duration::from_secs(300));
        assert_eq!(settings.max_active, 1);
    }

    #[test]
    fn suffix_without_variable_is_kept() {
        let settings = WriterSettings { suffix: "crawler-7".to_string(), ..WriterSettings::default() };
        assert_eq!(settings.resolved_suffix(), "crawler-7");
    }

    #[test]
    fn suffix_variable_is_replaced() {
        let settings = WriterSettings::default();
        let resolved = settings.resolved_suffix();
        assert!(!resolved.contains(HOSTNAME_VARIABLE));
        assert!(!resolved.is_empty());
    }
}

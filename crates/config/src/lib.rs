//! Layered configuration.
//!
//! Values are merged in order, later sources winning:
//!
//! 1. built-in defaults,
//! 2. an optional TOML, YAML or JSON file, picked by extension,
//! 3. environment variables prefixed `HARC_`, with `__` between nested keys
//!    (`HARC_WRITER__MAX_SIZE=1000000`).

pub mod error;
mod writer;

use crate::error::{ErrorKind, Result};
use directories::ProjectDirs;
use exn::ResultExt;
use figment::Figment;
use figment::providers::{Env, Format, Json, Serialized, Toml, Yaml};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::instrument;

pub use crate::writer::*;

pub const ENV_PREFIX: &str = "HARC_";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub writer: WriterSettings,
}

impl Config {
    /// Every source merged, without extracting or validating.
    pub fn figment(path: Option<&Path>) -> Figment {
        let mut figment = Figment::from(Serialized::defaults(Config::default()));
        if let Some(path) = path {
            let extension = path.extension().and_then(|ext| ext.to_str()).map(str::to_lowercase);
            figment = match extension.as_deref() {
                Some("yaml" | "yml") => figment.merge(Yaml::file(path)),
                Some("json") => figment.merge(Json::file(path)),
                _ => figment.merge(Toml::file(path)),
            };
        }
        figment.merge(Env::prefixed(ENV_PREFIX).split("__"))
    }

    /// Load and validate. A missing file is the same as an empty one.
    #[instrument(level = "debug")]
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let config: Config = Self::figment(path).extract().or_raise(|| ErrorKind::Load)?;
        config.validate()?;
        tracing::debug!(?config, "Loaded configuration");
        Ok(config)
    }

    /// Where a configuration file is looked for when none is given.
    pub fn default_path() -> Option<PathBuf> {
        ProjectDirs::from("org", "harc", "harc").map(|dirs| dirs.config_dir().join("config.toml"))
    }

    pub fn validate(&self) -> Result<()> {
        let writer = &self.writer;
        if writer.directories.is_empty() {
            exn::bail!(ErrorKind::Invalid("writer.directories must name at least one directory".to_string()));
        }
        if writer.max_active == 0 {
            exn::bail!(ErrorKind::Invalid("writer.max_active must be at least 1".to_string()));
        }
        if writer.max_size == 0 {
            exn::bail!(ErrorKind::Invalid("writer.max_size must be greater than 0".to_string()));
        }
        if writer.prefix.is_empty() {
            exn::bail!(ErrorKind::Invalid("writer.prefix must not be empty".to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use figment::Jail;
    use rstest::rstest;

    #[test]
    fn defaults_without_file() {
        Jail::expect_with(|_jail| {
            let config = Config::load(None).unwrap();
            assert_eq!(config, Config::default());
            Ok(())
        });
    }

    #[rstest]
    #[case("harc.toml", "[writer]\nprefix = \"TEST\"\nmax_size = 2048\ncompress = false\n")]
    #[case("harc.yaml", "writer:\n  prefix: TEST\n  max_size: 2048\n  compress: false\n")]
    #[case("harc.json", r#"{"writer": {"prefix": "TEST", "max_size": 2048, "compress": false}}"#)]
    fn file_by_extension(#[case] name: &str, #[case] contents: &str) {
        Jail::expect_with(|jail| {
            jail.create_file(name, contents)?;
            let config = Config::load(Some(Path::new(name))).unwrap();
            assert_eq!(config.writer.prefix, "TEST");
            assert_eq!(config.writer.max_size, 2048);
            assert!(!config.writer.compress);
            assert_eq!(config.writer.max_active, DEFAULT_MAX_ACTIVE);
            Ok(())
        });
    }

    #[test]
    fn environment_overrides_file() {
        Jail::expect_with(|jail| {
            jail.create_file("harc.toml", "[writer]\nprefix = \"FILE\"\nmax_active = 2\n")?;
            jail.set_env("HARC_WRITER__PREFIX", "ENV");
            jail.set_env("HARC_WRITER__MAX_WAIT_MS", "10");
            let config = Config::load(Some(Path::new("harc.toml"))).unwrap();
            assert_eq!(config.writer.prefix, "ENV");
            assert_eq!(config.writer.max_active, 2);
            assert_eq!(config.writer.max_wait_ms, 10);
            Ok(())
        });
    }

    #[rstest]
    #[case("[writer]\nmax_active = 0\n")]
    #[case("[writer]\nmax_size = 0\n")]
    #[case("[writer]\ndirectories = []\n")]
    #[case("[writer]\nprefix = \"\"\n")]
    fn rejects_unusable_values(#[case] contents: &str) {
        Jail::expect_with(|jail| {
            jail.create_file("harc.toml", contents)?;
            let err = Config::load(Some(Path::new("harc.toml"))).unwrap_err();
            assert!(matches!(*err, ErrorKind::Invalid(_)));
            Ok(())
        });
    }

    #[test]
    fn malformed_file() {
        Jail::expect_with(|jail| {
            jail.create_file("harc.toml", "[writer\nprefix = ")?;
            let err = Config::load(Some(Path::new("harc.toml"))).unwrap_err();
            assert_eq!(*err, ErrorKind::Load);
            Ok(())
        });
    }

    #[test]
    fn missing_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        Jail::expect_with(|_jail| {
            let config = Config::load(Some(&dir.path().join("absent.toml"))).unwrap();
            assert_eq!(config.writer.prefix, DEFAULT_PREFIX);
            Ok(())
        });
    }
}

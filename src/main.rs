//! harc
//!
//! Write, list, dump and validate WARC containers.
//!
//! # Commands
//!
//! - `list` - One line per record: offset, type, length and URL
//! - `dump` - Print header blocks, and optionally bodies
//! - `validate` - Read every record of each container, digesting bodies
//! - `pack` - Archive files as `resource` records through a writer pool

mod commands;
mod error;

use crate::error::{ErrorKind, Result};
use clap::{ArgAction, Parser, Subcommand};
use exn::ResultExt;
use harc_compress::Compression;
use harc_compress::cli::{Flag, Preference};
use harc_config::Config;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "harc")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// More logging on standard error; repeat for more detail. RUST_LOG
    /// takes precedence when set.
    #[arg(global = true, short, long, action = ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List the records of each container
    List {
        #[arg(required = true)]
        paths: Vec<PathBuf>,
    },

    /// Print the header blocks of a container
    Dump {
        path: PathBuf,

        /// Only the record starting at this offset
        #[arg(short, long)]
        offset: Option<u64>,

        /// Print record bodies as well
        #[arg(short, long)]
        body: bool,
    },

    /// Check that each container can be read to the end
    Validate {
        #[arg(required = true)]
        paths: Vec<PathBuf>,

        /// Number of records each container must hold
        #[arg(short, long)]
        records: Option<usize>,
    },

    /// Archive files into containers
    Pack {
        #[arg(required = true)]
        inputs: Vec<PathBuf>,

        /// Configuration file (TOML, YAML or JSON)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Output directory, overriding the configured ones; may be repeated
        #[arg(short = 'd', long = "directory")]
        directories: Vec<PathBuf>,

        /// Compress each record; FORMAT is `gzip` (the default) or `none`
        #[arg(long, value_name = "FORMAT", num_args = 0..=1, require_equals = true)]
        compress: Option<Option<String>>,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    let outcome = match cli.command {
        Command::List { paths } => each(&paths, |path| commands::list(path, &mut out).map(|_| ())),
        Command::Dump { path, offset, body } => commands::dump(&path, offset, body, &mut out).map(|()| 0),
        Command::Validate { paths, records } => {
            each(&paths, |path| commands::validate(path, records, &mut out).map(|_| ()))
        },
        Command::Pack { inputs, config, directories, compress } => pack(inputs, config, directories, compress, &mut out),
    };
    if let Err(err) = out.flush() {
        tracing::error!(error = %err, "Failed to flush standard output");
        return ExitCode::FAILURE;
    }

    match outcome {
        Ok(0) => ExitCode::SUCCESS,
        Ok(failed) => {
            tracing::warn!(failed, "Finished with failures");
            ExitCode::FAILURE
        },
        Err(err) => {
            tracing::error!(error = ?err, "Command failed");
            ExitCode::FAILURE
        },
    }
}

fn init_logging(verbosity: u8) {
    let level = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr).init();
}

/// Run `command` on every path, logging failures and moving on. Returns the
/// number of paths that failed.
fn each(paths: &[PathBuf], mut command: impl FnMut(&Path) -> Result<()>) -> Result<usize> {
    let mut failed = 0;
    for path in paths {
        if let Err(err) = command(path) {
            tracing::error!(path = %path.display(), error = ?err, "Failed to process container");
            failed += 1;
        }
    }
    Ok(failed)
}

fn pack(
    inputs: Vec<PathBuf>,
    config: Option<PathBuf>,
    directories: Vec<PathBuf>,
    compress: Flag,
    out: &mut impl Write,
) -> Result<usize> {
    let preference = Preference::try_from(compress).map_err(|err| {
        let message = (*err).to_string();
        err.raise(ErrorKind::Arguments(message))
    })?;
    let path = config.or_else(|| Config::default_path().filter(|path| path.exists()));
    let mut config = Config::load(path.as_deref()).map_err(|err| err.raise(ErrorKind::Config))?;
    if !directories.is_empty() {
        config.writer.directories = directories;
    }
    config.writer.compress = preference.resolve(config.writer.compression()) == Compression::Gzip;
    config.validate().map_err(|err| err.raise(ErrorKind::Config))?;

    let packed = commands::pack(&config.writer, &inputs)?;
    write!(out, "{}", packed.stats.report()).or_raise(|| ErrorKind::Output)?;
    Ok(packed.failed.len())
}

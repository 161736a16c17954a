//! Logging initialization for the CLI.
//!
//! Installs a console layer and, optionally, a file layer writing
//! `logs/<destination-stem>-<timestamp>.log`. Library components only emit
//! through `tracing` macros; with no subscriber installed those are no-ops,
//! so embedding the library never requires calling into this module.

use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};

use time::OffsetDateTime;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

use crate::fsops;

/// Logging sinks and verbosity.
#[derive(Debug, Clone)]
pub struct LogOptions {
    /// Log to the console (stderr).
    pub console: bool,
    /// Log to a timestamped file under `log_dir`.
    pub file: bool,
    /// Directory log files are written into.
    pub log_dir: PathBuf,
    /// Default to debug-level verbosity (`RUST_LOG` still wins).
    pub debug: bool,
}

impl Default for LogOptions {
    fn default() -> Self {
        Self {
            console: true,
            file: true,
            log_dir: PathBuf::from("logs"),
            debug: false,
        }
    }
}

/// Initialize the global tracing subscriber.
///
/// The file log is named after the destination file's stem plus a
/// timestamp. Returns the appender guard, which the caller must keep alive
/// for the duration of the process so buffered log lines are flushed.
pub fn init_logging(destination: &Path, options: &LogOptions) -> io::Result<Option<WorkerGuard>> {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(if options.debug { "debug" } else { "info" })
    });

    let console_layer = options.console.then(fmt::layer);

    let (file_layer, guard) = if options.file {
        fsops::ensure_directory(&options.log_dir, true)?;
        let file = File::create(log_file_path(&options.log_dir, destination))?;
        let (writer, guard) = tracing_appender::non_blocking(file);
        let layer = fmt::layer().with_writer(writer).with_ansi(false);
        (Some(layer), Some(guard))
    } else {
        (None, None)
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(console_layer)
        .with(file_layer)
        .try_init()
        .map_err(|e| io::Error::new(io::ErrorKind::Other, e.to_string()))?;

    Ok(guard)
}

/// Compute the log file path: `<log_dir>/<stem>-<timestamp>.log`.
fn log_file_path(log_dir: &Path, destination: &Path) -> PathBuf {
    let stem = destination
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| "windlass".to_string());
    log_dir.join(format!("{}-{}.log", stem, timestamp()))
}

/// Filesystem-safe UTC timestamp.
fn timestamp() -> String {
    let now = OffsetDateTime::now_utc();
    match time::format_description::parse("[year]-[month]-[day]T[hour]-[minute]-[second]") {
        Ok(format) => now
            .format(&format)
            .unwrap_or_else(|_| now.unix_timestamp().to_string()),
        Err(_) => now.unix_timestamp().to_string(),
    }
}

//! Log sink setup
//!
//! Every line written to the log file looks like
//! `[YYYY-MM-DD HH:MM:SS] message`. Level, target and colors are left out of
//! the file so it reads like a classic daemon log.
//!
//! The same lines also go to the system log under the `SyncDaemon`
//! identity, without the timestamp since syslog adds its own.
//!
//! Setup happens in two steps. [`open_log_sink`] creates the rolling file
//! appender and runs before the process detaches, so a bad log location is
//! reported to whoever started the daemon. [`init`] starts the non-blocking
//! writer thread and installs the subscriber, and runs after the fork.

use crate::types::SyncError;
use chrono::{DateTime, Local};
use std::ffi::CString;
use std::fmt;
use std::path::{Path, PathBuf};
use syslog_tracing::Syslog;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::fmt::format::Writer;
use tracing_subscriber::fmt::time::FormatTime;
use tracing_subscriber::layer::SubscriberExt as _;
use tracing_subscriber::util::SubscriberInitExt as _;
use tracing_subscriber::EnvFilter;

/// Rotated log files kept on disk
pub const MAX_LOG_FILES: usize = 7;

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Identity the daemon logs under in the system log
pub const SYSLOG_IDENTITY: &str = "SyncDaemon";

/// Local-time timer producing `[YYYY-MM-DD HH:MM:SS]`
#[derive(Debug, Clone, Copy, Default)]
pub struct BracketedLocalTime;

impl FormatTime for BracketedLocalTime {
    fn format_time(&self, w: &mut Writer<'_>) -> fmt::Result {
        write!(w, "{}", format_timestamp(&Local::now()))
    }
}

pub fn format_timestamp(at: &DateTime<Local>) -> String {
    format!("[{}]", at.format(TIMESTAMP_FORMAT))
}

/// An opened, not yet active, log destination.
pub struct LogSink {
    appender: RollingFileAppender,
    directory: PathBuf,
    prefix: String,
}

impl LogSink {
    /// Directory the log files are written to.
    pub fn directory(&self) -> &Path {
        &self.directory
    }

    /// File name prefix; the appender adds a date suffix on rotation.
    pub fn prefix(&self) -> &str {
        &self.prefix
    }
}

/// Keeps the background writer alive; dropping it flushes pending lines.
pub struct LogGuard {
    _guard: WorkerGuard,
}

/// Create the daily-rotating appender for `log_file`.
///
/// A relative path is resolved against the current directory now, since the
/// daemon later moves to `/`.
pub fn open_log_sink(log_file: &Path) -> Result<LogSink, SyncError> {
    let log_file = if log_file.is_absolute() {
        log_file.to_path_buf()
    } else {
        std::env::current_dir()
            .map_err(|e| SyncError::Logging(format!("cannot resolve {}: {e}", log_file.display())))?
            .join(log_file)
    };

    let prefix = log_file
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .ok_or_else(|| SyncError::Logging(format!("{} has no file name", log_file.display())))?;
    let directory = match log_file.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("/"),
    };

    let appender = RollingFileAppender::builder()
        .rotation(Rotation::DAILY)
        .filename_prefix(&prefix)
        .max_log_files(MAX_LOG_FILES)
        .build(&directory)
        .map_err(|e| SyncError::Logging(format!("{}: {e}", log_file.display())))?;

    Ok(LogSink {
        appender,
        directory,
        prefix,
    })
}

/// Open the system log writer (user facility, pid included).
///
/// Returns `None` when the process already holds a syslog connection.
pub fn open_syslog() -> Result<Option<Syslog>, SyncError> {
    let identity = CString::new(SYSLOG_IDENTITY)
        .map_err(|e| SyncError::Logging(format!("invalid syslog identity: {e}")))?;
    let (options, facility) = Default::default();
    Ok(Syslog::new(identity, options, facility))
}

/// Install the global subscriber writing to `sink` and the system log, plus
/// stderr when in the foreground.
///
/// `RUST_LOG` overrides the default level (`info`, or `debug` when verbose).
pub fn init(sink: LogSink, verbose: bool, foreground: bool) -> Result<LogGuard, SyncError> {
    let (writer, guard) = tracing_appender::non_blocking(sink.appender);
    let syslog = open_syslog()?;
    let syslog_missing = syslog.is_none();

    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let file_layer = tracing_subscriber::fmt::layer()
        .with_writer(writer)
        .with_timer(BracketedLocalTime)
        .with_ansi(false)
        .with_level(false)
        .with_target(false);

    let syslog_layer = syslog.map(|syslog| {
        tracing_subscriber::fmt::layer()
            .with_writer(syslog)
            .without_time()
            .with_ansi(false)
            .with_level(false)
            .with_target(false)
    });

    let stderr_layer = foreground.then(|| {
        tracing_subscriber::fmt::layer()
            .with_writer(std::io::stderr)
            .with_timer(BracketedLocalTime)
            .with_target(false)
    });

    tracing_subscriber::registry()
        .with(filter)
        .with(file_layer)
        .with(syslog_layer)
        .with(stderr_layer)
        .try_init()
        .map_err(|e| SyncError::Logging(e.to_string()))?;

    if syslog_missing {
        tracing::warn!("system log already in use, logging to the file only");
    }

    Ok(LogGuard { _guard: guard })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use tempfile::TempDir;

    #[test]
    fn test_timestamp_format() {
        let at = Local
            .with_ymd_and_hms(2024, 3, 9, 7, 5, 1)
            .single()
            .expect("unambiguous local time");
        assert_eq!(format_timestamp(&at), "[2024-03-09 07:05:01]");
    }

    #[test]
    fn test_timer_writes_bracketed_timestamp() {
        let mut line = String::new();
        BracketedLocalTime
            .format_time(&mut Writer::new(&mut line))
            .expect("format time");

        assert_eq!(line.len(), "[YYYY-MM-DD HH:MM:SS]".len());
        assert!(line.starts_with('['));
        assert!(line.ends_with(']'));
        assert_eq!(&line[5..6], "-");
        assert_eq!(&line[11..12], " ");
    }

    #[test]
    fn test_open_syslog_connects() {
        let syslog = open_syslog().expect("valid identity");
        assert!(syslog.is_some());
    }

    #[test]
    fn test_open_log_sink_splits_path() {
        let temp = TempDir::new().expect("create tempdir");
        let sink = open_log_sink(&temp.path().join("syncdaemon.log")).expect("open sink");

        assert_eq!(sink.directory(), temp.path());
        assert_eq!(sink.prefix(), "syncdaemon.log");
    }

    #[test]
    fn test_open_log_sink_unusable_directory() {
        let temp = TempDir::new().expect("create tempdir");
        let blocker = temp.path().join("not-a-dir");
        std::fs::write(&blocker, b"x").expect("write blocker");

        let err = match open_log_sink(&blocker.join("syncdaemon.log")) {
            Ok(_) => panic!("log directory under a regular file must fail"),
            Err(err) => err,
        };
        assert!(matches!(err, SyncError::Logging(_)));
    }
}

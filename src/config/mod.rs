//! Configuration management

use crate::types::SyncError;
use clap::Parser;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Default sleep between passes (5 minutes)
pub const DEFAULT_INTERVAL_SECS: u64 = 300;

/// Files larger than this are copied through a memory map (1 MiB)
pub const DEFAULT_MMAP_THRESHOLD: u64 = 1024 * 1024;

pub const DEFAULT_LOG_FILE: &str = "/var/log/syncdaemon.log";

/// Command-line arguments
#[derive(Debug, Clone, Parser)]
#[command(
    name = "syncdaemon",
    version,
    about = "Keep a destination directory mirroring a source directory"
)]
pub struct Cli {
    /// Source directory
    pub source: PathBuf,

    /// Destination directory
    pub destination: PathBuf,

    /// Synchronize subdirectories recursively
    #[arg(short = 'R', long)]
    pub recursive: bool,

    /// Seconds to sleep between passes
    #[arg(short = 't', long = "interval", value_name = "SECONDS")]
    pub interval: Option<u64>,

    /// Files larger than this many bytes are copied via mmap
    #[arg(short = 'm', long = "mmap-threshold", value_name = "BYTES")]
    pub mmap_threshold: Option<u64>,

    /// TOML file with default settings
    #[arg(short = 'c', long = "config", value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Log file location
    #[arg(long = "log-file", value_name = "PATH")]
    pub log_file: Option<PathBuf>,

    /// Stay attached to the terminal and also log to stderr
    #[arg(short = 'f', long)]
    pub foreground: bool,

    /// Enable debug logging
    #[arg(short = 'v', long)]
    pub verbose: bool,
}

/// Settings accepted from a `--config` file
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    pub recursive: Option<bool>,
    pub interval_secs: Option<u64>,
    pub mmap_threshold: Option<u64>,
    pub log_file: Option<PathBuf>,
}

impl FileConfig {
    /// Load and parse a TOML settings file
    pub fn load(path: &Path) -> Result<Self, SyncError> {
        let content = fs::read_to_string(path).map_err(|e| {
            SyncError::Config(format!("Cannot read config file {}: {}", path.display(), e))
        })?;
        Self::parse(&content)
            .map_err(|e| SyncError::Config(format!("Invalid config file {}: {}", path.display(), e)))
    }

    fn parse(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }
}

/// Immutable daemon configuration, built once at startup
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// Source directory (absolute)
    pub source: PathBuf,

    /// Destination directory (absolute)
    pub destination: PathBuf,

    /// Recurse into subdirectories
    pub recursive: bool,

    /// Sleep between passes
    pub interval: Duration,

    /// Copy-strategy threshold in bytes
    pub mmap_threshold: u64,

    pub log_file: PathBuf,

    /// Skip daemonizing
    pub foreground: bool,

    pub verbose: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            source: PathBuf::new(),
            destination: PathBuf::new(),
            recursive: false,
            interval: Duration::from_secs(DEFAULT_INTERVAL_SECS),
            mmap_threshold: DEFAULT_MMAP_THRESHOLD,
            log_file: PathBuf::from(DEFAULT_LOG_FILE),
            foreground: false,
            verbose: false,
        }
    }
}

impl Config {
    /// Merge CLI flags over file settings over defaults, then validate.
    pub fn from_parts(cli: Cli, file: FileConfig) -> Result<Self, SyncError> {
        let defaults = Config::default();
        let interval_secs = cli
            .interval
            .or(file.interval_secs)
            .unwrap_or(DEFAULT_INTERVAL_SECS);

        let config = Config {
            source: resolve_root(&cli.source)?,
            destination: resolve_root(&cli.destination)?,
            recursive: cli.recursive || file.recursive.unwrap_or(false),
            interval: Duration::from_secs(interval_secs),
            mmap_threshold: cli
                .mmap_threshold
                .or(file.mmap_threshold)
                .unwrap_or(defaults.mmap_threshold),
            log_file: cli.log_file.or(file.log_file).unwrap_or(defaults.log_file),
            foreground: cli.foreground,
            verbose: cli.verbose,
        };

        config.validate()?;
        Ok(config)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), SyncError> {
        for root in [&self.source, &self.destination] {
            if !root.is_dir() {
                return Err(SyncError::NotADirectory { path: root.clone() });
            }
        }

        check_disjoint_roots(&self.source, &self.destination)?;

        if self.interval.is_zero() {
            return Err(SyncError::Config(
                "Sleep interval must be at least 1 second".to_string(),
            ));
        }

        if self.log_file.file_name().is_none() {
            return Err(SyncError::Config(format!(
                "Log file path has no file name: {}",
                self.log_file.display()
            )));
        }

        Ok(())
    }
}

impl TryFrom<Cli> for Config {
    type Error = SyncError;

    fn try_from(cli: Cli) -> Result<Self, Self::Error> {
        let file = match &cli.config {
            Some(path) => FileConfig::load(path)?,
            None => FileConfig::default(),
        };
        Config::from_parts(cli, file)
    }
}

/// Reject roots that are equal or nested inside one another.
///
/// A source inside the destination would be removed as an orphan; a
/// destination inside the source would be copied into itself on every level.
/// Both paths are expected to be canonical.
pub fn check_disjoint_roots(source: &Path, destination: &Path) -> Result<(), SyncError> {
    if source == destination {
        return Err(SyncError::Config(
            "Source and destination cannot be the same".to_string(),
        ));
    }
    if source.starts_with(destination) || destination.starts_with(source) {
        return Err(SyncError::Config(format!(
            "Source {} and destination {} must not be nested inside each other",
            source.display(),
            destination.display()
        )));
    }
    Ok(())
}

/// Canonicalize a root so it survives the daemon's `chdir("/")`.
fn resolve_root(path: &Path) -> Result<PathBuf, SyncError> {
    let canonical = fs::canonicalize(path).map_err(|_| SyncError::NotADirectory {
        path: path.to_path_buf(),
    })?;
    if !canonical.is_dir() {
        return Err(SyncError::NotADirectory {
            path: path.to_path_buf(),
        });
    }
    Ok(canonical)
}

//! # syncdaemon - directory mirroring daemon
//!
//! Keeps a destination directory tree mirroring a source tree. Every pass
//! copies new or updated files (newer modification time wins), creates
//! missing directories and removes destination entries that no longer exist
//! in the source. Between passes the daemon sleeps for a fixed interval;
//! `SIGUSR1` wakes it early.

// Module declarations
pub mod commands;
pub mod config;
pub mod diff;
pub mod executor;
pub mod logging;
pub mod scanner;
pub mod scheduler;
pub mod types;

// Re-export commonly used types
pub use config::Config;
pub use types::{DirectoryPair, Entry, EntryKind, SyncAction, SyncError};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

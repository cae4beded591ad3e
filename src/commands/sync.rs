//! One synchronization pass over the configured root pair

use crate::diff::{synchronize, SyncOptions};
use crate::executor::{ExecutionEvent, ExecutionStats};
use crate::types::{DirectoryPair, SyncError};
use crate::Config;
use indicatif::HumanBytes;

/// Run one pass and log what it did.
pub fn run_pass(config: &Config) -> ExecutionStats {
    let pair = DirectoryPair::new(&config.source, &config.destination);
    let options = SyncOptions::from_config(config);

    tracing::info!(
        "Synchronizing {} -> {}",
        config.source.display(),
        config.destination.display()
    );

    let stats = synchronize(&pair, &options, Some(&log_event));
    tracing::info!("{}", format_summary(&stats));
    stats
}

fn log_event(event: &ExecutionEvent) {
    match event {
        ExecutionEvent::EnterDirectory { pair } => {
            tracing::debug!(
                "Entering {} -> {}",
                pair.source.display(),
                pair.dest.display()
            );
        }
        ExecutionEvent::ActionSuccess {
            action,
            path,
            bytes_copied,
            strategy,
        } => {
            let path = path.as_deref().map(|p| p.display().to_string()).unwrap_or_default();
            match strategy {
                Some(strategy) => tracing::info!(
                    "{action} {path} ({}, {})",
                    HumanBytes(*bytes_copied),
                    strategy.as_str()
                ),
                None => tracing::info!("{action} {path}"),
            }
        }
        ExecutionEvent::ActionError {
            action,
            path,
            error,
        } => {
            let path = path.as_deref().map(|p| p.display().to_string()).unwrap_or_default();
            tracing::warn!("{action} {path} failed: {} ({error})", error_kind_label(error));
        }
        ExecutionEvent::EntryError { error } => {
            tracing::warn!("{}: {error}", error_kind_label(error));
        }
        // The summary line is written by run_pass.
        ExecutionEvent::Complete { .. } => {}
    }
}

fn error_kind_label(error: &SyncError) -> &'static str {
    match error {
        SyncError::Io(_) | SyncError::Path { .. } => "I/O error",
        SyncError::PermissionDenied { .. } => "Permission denied",
        SyncError::Vanished { .. } => "Vanished",
        SyncError::Map { .. } => "Mapping failed",
        SyncError::Cycle { .. } => "Symlink cycle",
        SyncError::NotADirectory { .. } => "Not a directory",
        SyncError::Config(_) => "Configuration error",
        SyncError::Daemon(_) => "Daemon error",
        SyncError::Logging(_) => "Logging error",
    }
}

/// The pass-completion log line.
pub fn format_summary(stats: &ExecutionStats) -> String {
    if !stats.changed_anything() && stats.errors == 0 {
        return format!(
            "Directories synchronized: nothing to do ({} directories checked)",
            stats.dirs_visited
        );
    }

    format!(
        "Directories synchronized: copied {} ({}; {} read/write, {} mmap)  \
         removed {}  mkdir {}  rmdir {}  errors {}",
        stats.files_copied,
        HumanBytes(stats.bytes_copied),
        stats.buffered_copies,
        stats.mapped_copies,
        stats.files_removed,
        stats.dirs_created,
        stats.dirs_removed,
        stats.errors
    )
}

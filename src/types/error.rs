//! Error types for syncdaemon

use std::io::{Error as IoError, ErrorKind};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Error types for syncdaemon operations
#[derive(Debug, Error)]
pub enum SyncError {
    /// Standard IO error (automatically converted via #[from])
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// IO error tied to a specific path
    #[error("I/O error at {path}: {source}")]
    Path {
        path: PathBuf,
        #[source]
        source: IoError,
    },

    /// Permission denied for specific path
    #[error("Permission denied: {path}")]
    PermissionDenied { path: PathBuf },

    /// Entry disappeared between enumeration and access
    #[error("Entry vanished during sync: {path}")]
    Vanished { path: PathBuf },

    /// Memory-mapping the source file failed
    #[error("Failed to map {path}: {source}")]
    Map {
        path: PathBuf,
        #[source]
        source: IoError,
    },

    /// A symlinked directory leads back to one of its ancestors
    #[error("Directory cycle through symlink: {path}")]
    Cycle { path: PathBuf },

    /// A root argument is not a directory
    #[error("{path} is not a directory")]
    NotADirectory { path: PathBuf },

    /// Invalid configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// Fork, session or working-directory setup failed
    #[error("Daemon setup failed: {0}")]
    Daemon(String),

    /// Log sink could not be created
    #[error("Logging setup failed: {0}")]
    Logging(String),
}

impl SyncError {
    /// Per-entry errors that the next pass will retry on its own
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            SyncError::Io(_)
                | SyncError::Path { .. }
                | SyncError::PermissionDenied { .. }
                | SyncError::Vanished { .. }
                | SyncError::Map { .. }
                | SyncError::Cycle { .. }
        )
    }

    /// Check if this error is a configuration error
    pub fn is_config_error(&self) -> bool {
        matches!(
            self,
            SyncError::Config(_) | SyncError::NotADirectory { .. }
        )
    }

    /// Check if this error is related to permissions
    pub fn is_permission_error(&self) -> bool {
        matches!(self, SyncError::PermissionDenied { .. })
    }

    /// Check if the entry vanished mid-pass
    pub fn is_vanished(&self) -> bool {
        matches!(self, SyncError::Vanished { .. })
    }
}

/// Attach `path` to a filesystem error, classifying the common kinds.
pub fn map_fs_error(path: &Path, error: IoError) -> SyncError {
    match error.kind() {
        ErrorKind::PermissionDenied => SyncError::PermissionDenied {
            path: path.to_path_buf(),
        },
        ErrorKind::NotFound => SyncError::Vanished {
            path: path.to_path_buf(),
        },
        _ => SyncError::Path {
            path: path.to_path_buf(),
            source: error,
        },
    }
}

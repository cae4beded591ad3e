//! SyncAction - Actions determined by the sync policy

use super::{DirectoryPair, Entry};
use std::path::{Path, PathBuf};

/// Sync action determined by the sync policy
///
/// Actions are derived and applied within the same pass; nothing stores them.
#[derive(Debug, Clone, PartialEq)]
pub enum SyncAction {
    /// Copy a source file over (or into) `dest`
    CopyToDest { entry: Entry, dest: PathBuf },

    /// Delete a destination file
    RemoveFromDest(PathBuf),

    /// Reconcile a matching subdirectory pair
    RecurseInto(DirectoryPair),

    /// Create a destination directory
    CreateDestDir(PathBuf),

    /// Remove a destination directory and everything below it
    RemoveDestDir(PathBuf),

    /// Nothing to do (in sync, or out of scope)
    Skip,
}

impl SyncAction {
    /// Short label used in log lines
    pub fn action_name(&self) -> &'static str {
        match self {
            SyncAction::CopyToDest { .. } => "Copy",
            SyncAction::RemoveFromDest(_) => "Remove",
            SyncAction::RecurseInto(_) => "Recurse",
            SyncAction::CreateDestDir(_) => "Mkdir",
            SyncAction::RemoveDestDir(_) => "Rmdir",
            SyncAction::Skip => "Skip",
        }
    }

    /// Destination-side path this action touches, if any
    pub fn path(&self) -> Option<&Path> {
        match self {
            SyncAction::CopyToDest { dest, .. } => Some(dest),
            SyncAction::RemoveFromDest(path)
            | SyncAction::CreateDestDir(path)
            | SyncAction::RemoveDestDir(path) => Some(path),
            SyncAction::RecurseInto(pair) => Some(&pair.dest),
            SyncAction::Skip => None,
        }
    }

    pub fn is_skip(&self) -> bool {
        matches!(self, SyncAction::Skip)
    }

    pub fn is_copy(&self) -> bool {
        matches!(self, SyncAction::CopyToDest { .. })
    }

    /// Whether the action writes to or removes from the destination tree
    pub fn mutates_dest(&self) -> bool {
        !matches!(self, SyncAction::Skip | SyncAction::RecurseInto(_))
    }
}

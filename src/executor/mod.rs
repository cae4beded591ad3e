//! Executor module for destination-side file operations

pub mod copy;
pub mod remove;

use crate::types::{map_fs_error, DirectoryPair, SyncAction, SyncError};
use std::fs;
use std::path::{Path, PathBuf};

pub use copy::{copy_file, CopyOutcome, CopyStrategy};
pub use remove::{remove_dir_tree, remove_file};

/// Mode for directories created in the destination
pub const DEST_DIR_MODE: u32 = 0o755;

/// Counters for one sync pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExecutionStats {
    /// Files copied (new or overwritten).
    pub files_copied: usize,
    /// Aggregate copied bytes.
    pub bytes_copied: u64,
    /// Copies that went through the buffered path.
    pub buffered_copies: usize,
    /// Copies that went through the mapped path.
    pub mapped_copies: usize,
    /// Destination files removed.
    pub files_removed: usize,
    /// Destination directories created.
    pub dirs_created: usize,
    /// Destination directory trees removed.
    pub dirs_removed: usize,
    /// Directory pairs reconciled, the root included.
    pub dirs_visited: usize,
    /// Failed actions plus entries that could not be listed or stat'ed.
    pub errors: usize,
}

impl ExecutionStats {
    /// Whether the pass wrote to or removed anything from the destination.
    pub fn changed_anything(&self) -> bool {
        self.files_copied + self.files_removed + self.dirs_created + self.dirs_removed > 0
    }

    fn record(&mut self, action: &SyncAction, outcome: &ActionOutcome) {
        match action {
            SyncAction::CopyToDest { .. } => {
                self.files_copied += 1;
                self.bytes_copied += outcome.bytes_copied;
                match outcome.strategy {
                    Some(CopyStrategy::Buffered) => self.buffered_copies += 1,
                    Some(CopyStrategy::Mapped) => self.mapped_copies += 1,
                    None => {}
                }
            }
            SyncAction::RemoveFromDest(_) => self.files_removed += 1,
            SyncAction::CreateDestDir(_) => self.dirs_created += 1,
            SyncAction::RemoveDestDir(_) => self.dirs_removed += 1,
            SyncAction::RecurseInto(_) | SyncAction::Skip => {}
        }
    }
}

/// What a successful action did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ActionOutcome {
    pub bytes_copied: u64,
    pub strategy: Option<CopyStrategy>,
}

/// Events emitted while a pass runs.
#[derive(Debug)]
pub enum ExecutionEvent {
    /// A directory pair is about to be reconciled.
    EnterDirectory { pair: DirectoryPair },
    /// An action changed the destination tree.
    ActionSuccess {
        action: &'static str,
        path: Option<PathBuf>,
        bytes_copied: u64,
        strategy: Option<CopyStrategy>,
    },
    /// An action failed; the pass continues with the next entry.
    ActionError {
        action: &'static str,
        path: Option<PathBuf>,
        error: SyncError,
    },
    /// A directory could not be listed or an entry could not be stat'ed.
    EntryError { error: SyncError },
    /// The pass finished.
    Complete { stats: ExecutionStats },
}

/// Optional callback used to receive execution events.
pub type ExecutionCallback = dyn Fn(&ExecutionEvent) + Send + Sync;

/// Apply one destination-mutating action.
///
/// `RecurseInto` and `Skip` are handled by the differ and are no-ops here.
pub fn apply_action(action: &SyncAction, threshold: u64) -> Result<ActionOutcome, SyncError> {
    match action {
        SyncAction::CopyToDest { entry, dest } => {
            let outcome = copy_file(&entry.path, dest, entry.size, threshold)?;
            Ok(ActionOutcome {
                bytes_copied: outcome.bytes,
                strategy: Some(outcome.strategy),
            })
        }
        SyncAction::RemoveFromDest(path) => remove_file(path).map(|_| ActionOutcome::default()),
        SyncAction::CreateDestDir(path) => create_dir(path).map(|_| ActionOutcome::default()),
        SyncAction::RemoveDestDir(path) => {
            remove_dir_tree(path).map(|_| ActionOutcome::default())
        }
        SyncAction::RecurseInto(_) | SyncAction::Skip => Ok(ActionOutcome::default()),
    }
}

/// Apply `action`, update `stats` and report the result.
///
/// Returns `true` when the action succeeded.
pub fn execute_action(
    action: &SyncAction,
    threshold: u64,
    stats: &mut ExecutionStats,
    on_event: Option<&ExecutionCallback>,
) -> bool {
    match apply_action(action, threshold) {
        Ok(outcome) => {
            stats.record(action, &outcome);
            if action.mutates_dest() {
                emit_event(
                    on_event,
                    ExecutionEvent::ActionSuccess {
                        action: action.action_name(),
                        path: action.path().map(Path::to_path_buf),
                        bytes_copied: outcome.bytes_copied,
                        strategy: outcome.strategy,
                    },
                );
            }
            true
        }
        Err(error) => {
            stats.errors += 1;
            emit_event(
                on_event,
                ExecutionEvent::ActionError {
                    action: action.action_name(),
                    path: action.path().map(Path::to_path_buf),
                    error,
                },
            );
            false
        }
    }
}

fn create_dir(path: &Path) -> Result<(), SyncError> {
    let mut builder = fs::DirBuilder::new();

    #[cfg(unix)]
    {
        use std::os::unix::fs::DirBuilderExt;
        builder.mode(DEST_DIR_MODE);
    }

    builder.create(path).map_err(|e| map_fs_error(path, e))
}

pub(crate) fn emit_event(on_event: Option<&ExecutionCallback>, event: ExecutionEvent) {
    if let Some(callback) = on_event {
        callback(&event);
    }
}

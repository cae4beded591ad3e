//! Core type definitions for syncdaemon

mod action;
mod entry;
mod error;

pub use action::SyncAction;
pub use entry::{DirectoryPair, Entry, EntryKind};
pub use error::{map_fs_error, SyncError};

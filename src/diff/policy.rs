//! Sync policy: the per-entry decision table
//!
//! | Source        | Dest          | Action                                   |
//! |---------------|---------------|------------------------------------------|
//! | file          | missing       | copy                                     |
//! | file          | older file    | copy (overwrite)                         |
//! | file          | newer file    | nothing                                  |
//! | file          | same second   | nothing                                  |
//! | dir (-R)      | missing       | create dir, recurse                      |
//! | dir (-R)      | dir           | recurse                                  |
//! | missing       | file          | remove file                              |
//! | missing       | dir (-R)      | remove dir tree                          |
//! | file          | dir (-R)      | remove dir tree, copy                    |
//! | dir (-R)      | file          | remove file, create dir, recurse         |
//!
//! Without `-R` directories are never created, entered or removed.

use super::compare::{compare_files, Freshness};
use crate::types::{DirectoryPair, Entry, EntryKind, SyncAction};
use std::path::PathBuf;

/// Actions for a source entry during the forward pass, in execution order.
///
/// An empty vector means nothing to do.
pub fn forward_actions(
    pair: &DirectoryPair,
    src: &Entry,
    dest: Option<&Entry>,
    recursive: bool,
) -> Vec<SyncAction> {
    let dest_path = pair.dest_path(&src.name);

    match (src.kind, dest) {
        (EntryKind::File, None) => vec![copy(src, dest_path)],
        (EntryKind::File, Some(dest)) if dest.is_file() => match compare_files(src, dest) {
            Freshness::SourceNewer => vec![copy(src, dest_path)],
            Freshness::DestNewer | Freshness::InSync => Vec::new(),
        },
        (EntryKind::File, Some(_)) if recursive => {
            vec![SyncAction::RemoveDestDir(dest_path.clone()), copy(src, dest_path)]
        }
        (EntryKind::File, Some(_)) => Vec::new(),
        (EntryKind::Directory, _) if !recursive => Vec::new(),
        (EntryKind::Directory, None) => vec![
            SyncAction::CreateDestDir(dest_path),
            SyncAction::RecurseInto(pair.child(&src.name)),
        ],
        (EntryKind::Directory, Some(dest)) if dest.is_dir() => {
            vec![SyncAction::RecurseInto(pair.child(&src.name))]
        }
        (EntryKind::Directory, Some(_)) => vec![
            SyncAction::RemoveFromDest(dest_path.clone()),
            SyncAction::CreateDestDir(dest_path),
            SyncAction::RecurseInto(pair.child(&src.name)),
        ],
    }
}

/// Action for a destination entry during the reverse pass.
///
/// `src` is whatever carries the same name in the source directory.
pub fn reverse_action(
    pair: &DirectoryPair,
    dest: &Entry,
    src: Option<&Entry>,
    recursive: bool,
) -> SyncAction {
    let src_kind = src.map(|s| s.kind);

    match dest.kind {
        EntryKind::File => {
            if src_kind == Some(EntryKind::File) {
                SyncAction::Skip
            } else {
                SyncAction::RemoveFromDest(dest.path.clone())
            }
        }
        EntryKind::Directory if !recursive => SyncAction::Skip,
        EntryKind::Directory => {
            if src_kind == Some(EntryKind::Directory) {
                SyncAction::RecurseInto(pair.child(&dest.name))
            } else {
                SyncAction::RemoveDestDir(dest.path.clone())
            }
        }
    }
}

fn copy(src: &Entry, dest: PathBuf) -> SyncAction {
    SyncAction::CopyToDest {
        entry: src.clone(),
        dest,
    }
}

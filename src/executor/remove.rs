//! Destination-side removal primitives

use crate::types::{map_fs_error, SyncError};
use std::fs;
use std::io::ErrorKind;
use std::path::Path;

/// Remove one destination file. A file that is already gone counts as removed.
pub fn remove_file(path: &Path) -> Result<(), SyncError> {
    match fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
        Err(e) => Err(map_fs_error(path, e)),
    }
}

/// Remove `path` and everything below it, children first.
///
/// Symlinks are unlinked, never followed, `path` itself included. Removal
/// keeps going past a failing child so that as much as possible is cleaned
/// up; the first error is returned and the directory itself is then left in
/// place.
///
/// Returns the number of entries removed, `path` included.
pub fn remove_dir_tree(path: &Path) -> Result<u64, SyncError> {
    match fs::symlink_metadata(path) {
        Ok(meta) if meta.file_type().is_symlink() => return remove_file(path).map(|_| 1),
        Ok(_) => {}
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(0),
        Err(e) => return Err(map_fs_error(path, e)),
    }

    let mut removed = 0u64;
    let mut first_error: Option<SyncError> = None;

    let children = match fs::read_dir(path) {
        Ok(children) => children,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(0),
        Err(e) => return Err(map_fs_error(path, e)),
    };

    for child in children {
        let result = child
            .map_err(|e| map_fs_error(path, e))
            .and_then(|child| remove_child(&child.path()));
        match result {
            Ok(count) => removed += count,
            Err(err) => {
                tracing::debug!(path = %path.display(), error = %err, "failed to remove child");
                first_error.get_or_insert(err);
            }
        }
    }

    if let Some(err) = first_error {
        return Err(err);
    }

    match fs::remove_dir(path) {
        Ok(()) => Ok(removed + 1),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(removed),
        Err(e) => Err(map_fs_error(path, e)),
    }
}

fn remove_child(path: &Path) -> Result<u64, SyncError> {
    let meta = fs::symlink_metadata(path).map_err(|e| map_fs_error(path, e))?;
    if meta.file_type().is_dir() {
        remove_dir_tree(path)
    } else {
        remove_file(path).map(|_| 1)
    }
}

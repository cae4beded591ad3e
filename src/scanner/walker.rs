//! Single-level directory listing

use crate::types::{map_fs_error, Entry, EntryKind, SyncError};
use std::fs;
use std::io::ErrorKind;
use std::path::Path;
use std::time::SystemTime;

/// How symlinks met while listing are treated
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Symlinks {
    /// Stat the target. Used on the source side.
    Follow,
    /// Describe the link itself as a file entry. Used on the destination
    /// side, so nothing is ever written or removed through a link.
    Preserve,
}

/// Result of listing one directory level
///
/// Entries that could not be stat'ed are reported in `errors`; the rest of
/// the level is still returned.
#[derive(Debug, Default)]
pub struct DirListing {
    pub entries: Vec<Entry>,
    pub errors: Vec<SyncError>,
}

/// List the immediate children of `dir`, sorted by name.
///
/// Uses the `ignore` walker limited to depth 1 with every filter disabled, so
/// hidden files and ignore files are treated like any other entry. Each child
/// is stat'ed according to `symlinks`; sockets, FIFOs and devices are skipped.
///
/// # Errors
/// Returns an error only when `dir` itself cannot be read as a directory.
/// Per-entry failures end up in [`DirListing::errors`].
pub fn list_directory(dir: &Path, symlinks: Symlinks) -> Result<DirListing, SyncError> {
    let meta = fs::metadata(dir).map_err(|e| map_fs_error(dir, e))?;
    if !meta.is_dir() {
        return Err(SyncError::NotADirectory {
            path: dir.to_path_buf(),
        });
    }
    // The walker reports an unreadable root as an ordinary item; check up front.
    fs::read_dir(dir).map_err(|e| map_fs_error(dir, e))?;

    let walker = ignore::WalkBuilder::new(dir)
        .standard_filters(false)
        .follow_links(false)
        .max_depth(Some(1))
        .sort_by_file_name(|a, b| a.cmp(b))
        .build();

    let mut listing = DirListing::default();

    for result in walker {
        match result {
            Ok(dent) => {
                if dent.depth() == 0 {
                    continue;
                }
                match stat_entry(dent.path(), symlinks) {
                    Ok(Some(entry)) => listing.entries.push(entry),
                    Ok(None) => {
                        tracing::debug!(path = %dent.path().display(), "skipping special file");
                    }
                    Err(err) => listing.errors.push(err),
                }
            }
            Err(err) => {
                let io = err
                    .into_io_error()
                    .unwrap_or_else(|| std::io::Error::other("directory traversal failed"));
                listing.errors.push(map_fs_error(dir, io));
            }
        }
    }

    Ok(listing)
}

/// Stat `path`.
///
/// A missing path, or a special file that is never synchronized, yields
/// `Ok(None)`. With [`Symlinks::Follow`] a dangling symlink is an error: the
/// name is taken but there is nothing to copy. With [`Symlinks::Preserve`] any
/// symlink, dangling or not, comes back as a [`EntryKind::File`] entry for the
/// link itself.
pub fn stat_entry(path: &Path, symlinks: Symlinks) -> Result<Option<Entry>, SyncError> {
    if symlinks == Symlinks::Preserve {
        match fs::symlink_metadata(path) {
            Ok(meta) if meta.file_type().is_symlink() => {
                let modified_at = meta.modified().unwrap_or(SystemTime::UNIX_EPOCH);
                return Ok(Some(Entry::new(
                    path.to_path_buf(),
                    EntryKind::File,
                    0,
                    modified_at,
                )));
            }
            Ok(_) => {}
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(map_fs_error(path, e)),
        }
    }

    match fs::metadata(path) {
        Ok(meta) => Ok(Entry::from_metadata(path.to_path_buf(), &meta)),
        Err(e) if e.kind() == ErrorKind::NotFound => {
            if fs::symlink_metadata(path).is_ok() {
                Err(dangling_link_error(path, e))
            } else {
                Ok(None)
            }
        }
        Err(e) => Err(map_fs_error(path, e)),
    }
}

fn dangling_link_error(path: &Path, error: std::io::Error) -> SyncError {
    SyncError::Path {
        path: path.to_path_buf(),
        source: error,
    }
}

//! File comparison logic

use crate::types::Entry;
use std::cmp::Ordering;

/// Outcome of comparing a source file with its destination counterpart
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Freshness {
    /// Source is strictly newer: the destination is stale
    SourceNewer,
    /// Destination is strictly newer: left alone
    DestNewer,
    /// Same whole-second mtime: already in sync
    InSync,
}

/// Compare two files by modification time at one-second resolution.
///
/// Sizes and contents are not looked at: a file whose content
/// changed without an mtime bump is not detected, and a touched destination
/// counts as up to date.
pub fn compare_files(src: &Entry, dest: &Entry) -> Freshness {
    match src.mtime_secs().cmp(&dest.mtime_secs()) {
        Ordering::Greater => Freshness::SourceNewer,
        Ordering::Less => Freshness::DestNewer,
        Ordering::Equal => Freshness::InSync,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::EntryKind;
    use std::path::PathBuf;
    use std::time::{Duration, UNIX_EPOCH};

    fn file_at(millis: u64, size: u64) -> Entry {
        Entry::new(
            PathBuf::from("/x/file.txt"),
            EntryKind::File,
            size,
            UNIX_EPOCH + Duration::from_millis(millis),
        )
    }

    #[test]
    fn test_source_newer() {
        assert_eq!(
            compare_files(&file_at(2_000, 1), &file_at(1_000, 1)),
            Freshness::SourceNewer
        );
    }

    #[test]
    fn test_dest_newer() {
        assert_eq!(
            compare_files(&file_at(1_000, 1), &file_at(2_000, 1)),
            Freshness::DestNewer
        );
    }

    #[test]
    fn test_same_second_is_in_sync() {
        // 1.1s vs 1.9s: equal at second resolution
        assert_eq!(
            compare_files(&file_at(1_900, 1), &file_at(1_100, 1)),
            Freshness::InSync
        );
    }

    #[test]
    fn test_size_difference_is_ignored() {
        assert_eq!(
            compare_files(&file_at(1_000, 10), &file_at(1_000, 99)),
            Freshness::InSync
        );
    }
}

//! Entry - A single file or directory met during a pass

use filetime::FileTime;
use std::ffi::{OsStr, OsString};
use std::fs::Metadata;
use std::path::PathBuf;
use std::time::SystemTime;

/// Kind of a synchronized entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    File,
    Directory,
}

/// A file or directory as seen by one pass
///
/// Built from a fresh `stat` every time; never cached across passes.
#[derive(Debug, Clone, PartialEq)]
pub struct Entry {
    /// Last path component, used to match entries across trees
    pub name: OsString,

    /// Absolute path
    pub path: PathBuf,

    pub kind: EntryKind,

    /// File size in bytes (0 for directories)
    pub size: u64,

    /// Last modification time
    pub modified_at: SystemTime,
}

impl Entry {
    /// Create a new Entry with the given parameters
    pub fn new(path: PathBuf, kind: EntryKind, size: u64, modified_at: SystemTime) -> Self {
        let name = path
            .file_name()
            .map(OsStr::to_os_string)
            .unwrap_or_default();
        Self {
            name,
            path,
            kind,
            size,
            modified_at,
        }
    }

    /// Build an entry from followed metadata.
    ///
    /// Returns `None` for anything that is neither a regular file nor a directory.
    pub fn from_metadata(path: PathBuf, metadata: &Metadata) -> Option<Self> {
        let kind = if metadata.is_dir() {
            EntryKind::Directory
        } else if metadata.is_file() {
            EntryKind::File
        } else {
            return None;
        };
        let size = match kind {
            EntryKind::File => metadata.len(),
            EntryKind::Directory => 0,
        };
        // Platforms without mtime support fall back to the epoch, which compares as "oldest".
        let modified_at = metadata.modified().unwrap_or(SystemTime::UNIX_EPOCH);
        Some(Self::new(path, kind, size, modified_at))
    }

    pub fn is_file(&self) -> bool {
        self.kind == EntryKind::File
    }

    pub fn is_dir(&self) -> bool {
        self.kind == EntryKind::Directory
    }

    /// Modification time truncated to whole seconds since the epoch
    pub fn mtime_secs(&self) -> i64 {
        FileTime::from_system_time(self.modified_at).unix_seconds()
    }
}

/// A (source, destination) directory pair, the unit the differ recurses over
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectoryPair {
    pub source: PathBuf,
    pub dest: PathBuf,
}

impl DirectoryPair {
    pub fn new(source: impl Into<PathBuf>, dest: impl Into<PathBuf>) -> Self {
        Self {
            source: source.into(),
            dest: dest.into(),
        }
    }

    /// The pair one level down, matched by name
    pub fn child(&self, name: &OsStr) -> Self {
        Self {
            source: self.source.join(name),
            dest: self.dest.join(name),
        }
    }

    /// Destination path for an entry named `name` at this level
    pub fn dest_path(&self, name: &OsStr) -> PathBuf {
        self.dest.join(name)
    }

    /// Source path for an entry named `name` at this level
    pub fn source_path(&self, name: &OsStr) -> PathBuf {
        self.source.join(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{Duration, UNIX_EPOCH};

    #[test]
    fn test_new_entry_takes_name_from_path() {
        let mtime = UNIX_EPOCH + Duration::from_secs(1000);
        let entry = Entry::new(PathBuf::from("/src/sub/a.txt"), EntryKind::File, 100, mtime);

        assert_eq!(entry.name, OsString::from("a.txt"));
        assert_eq!(entry.size, 100);
        assert!(entry.is_file());
        assert!(!entry.is_dir());
    }

    #[test]
    fn test_mtime_secs_truncates_subsecond_part() {
        let mtime = UNIX_EPOCH + Duration::from_millis(5_999);
        let entry = Entry::new(PathBuf::from("/src/a.txt"), EntryKind::File, 1, mtime);

        assert_eq!(entry.mtime_secs(), 5);
    }

    #[test]
    fn test_from_metadata_file_and_dir() {
        let temp = tempfile::tempdir().expect("create tempdir");
        let file = temp.path().join("f.bin");
        std::fs::write(&file, b"12345").expect("write file");

        let file_meta = std::fs::metadata(&file).expect("file metadata");
        let entry = Entry::from_metadata(file.clone(), &file_meta).expect("file entry");
        assert_eq!(entry.kind, EntryKind::File);
        assert_eq!(entry.size, 5);

        let dir_meta = std::fs::metadata(temp.path()).expect("dir metadata");
        let dir = Entry::from_metadata(temp.path().to_path_buf(), &dir_meta).expect("dir entry");
        assert_eq!(dir.kind, EntryKind::Directory);
        assert_eq!(dir.size, 0);
    }

    #[test]
    fn test_pair_child_joins_both_sides() {
        let pair = DirectoryPair::new("/src", "/dst");
        let child = pair.child(OsStr::new("sub"));

        assert_eq!(child.source, PathBuf::from("/src/sub"));
        assert_eq!(child.dest, PathBuf::from("/dst/sub"));
        assert_eq!(pair.dest_path(OsStr::new("x")), PathBuf::from("/dst/x"));
        assert_eq!(pair.source_path(OsStr::new("x")), PathBuf::from("/src/x"));
    }
}

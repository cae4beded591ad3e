//! Size-based file copy: buffered streaming or a single memory-mapped write

use crate::types::{map_fs_error, SyncError};
use memmap2::Mmap;
use std::fs::{self, File, OpenOptions};
use std::io::{Read, Write};
use std::path::Path;

/// Chunk size for buffered copies
pub const COPY_BUFFER_SIZE: usize = 128 * 1024;

/// Mode for newly created destination files
pub const DEST_FILE_MODE: u32 = 0o644;

/// How a file gets copied
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CopyStrategy {
    /// read/write loop with a fixed-size buffer
    Buffered,
    /// map the whole source and write it out in one call
    Mapped,
}

impl CopyStrategy {
    /// Files up to and including `threshold` bytes are buffered; larger ones are mapped.
    pub fn select(file_size: u64, threshold: u64) -> Self {
        if file_size <= threshold {
            CopyStrategy::Buffered
        } else {
            CopyStrategy::Mapped
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            CopyStrategy::Buffered => "read/write",
            CopyStrategy::Mapped => "mmap",
        }
    }
}

/// Result of a successful copy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CopyOutcome {
    pub strategy: CopyStrategy,
    pub bytes: u64,
}

/// Copy `src` over `dest`, choosing the strategy from `file_size` and `threshold`.
///
/// The destination is created or truncated; a symlink at `dest` is unlinked
/// first so its target is left alone. No metadata is carried over: new
/// files get mode 0644 and the destination mtime becomes the time of the copy.
///
/// Every descriptor and mapping is owned by a local and released on return,
/// including on error, so a failure only affects this one file.
///
/// # Example
/// ```no_run
/// use syncdaemon::executor::copy_file;
/// use std::path::Path;
///
/// let outcome = copy_file(Path::new("/src/a.txt"), Path::new("/dst/a.txt"), 100, 1024 * 1024)?;
/// assert_eq!(outcome.bytes, 100);
/// # Ok::<(), syncdaemon::types::SyncError>(())
/// ```
pub fn copy_file(
    src: &Path,
    dest: &Path,
    file_size: u64,
    threshold: u64,
) -> Result<CopyOutcome, SyncError> {
    let strategy = CopyStrategy::select(file_size, threshold);
    let bytes = match strategy {
        CopyStrategy::Buffered => copy_buffered(src, dest)?,
        CopyStrategy::Mapped => copy_mapped(src, dest)?,
    };
    Ok(CopyOutcome { strategy, bytes })
}

fn copy_buffered(src: &Path, dest: &Path) -> Result<u64, SyncError> {
    let mut src_file = File::open(src).map_err(|e| map_fs_error(src, e))?;
    let mut dest_file = open_dest(dest)?;

    let mut buffer = vec![0u8; COPY_BUFFER_SIZE];
    let mut total_bytes = 0u64;

    loop {
        let bytes_read = src_file.read(&mut buffer).map_err(|e| map_fs_error(src, e))?;
        if bytes_read == 0 {
            break;
        }

        // write_all turns a short write into an error
        dest_file
            .write_all(&buffer[..bytes_read])
            .map_err(|e| map_fs_error(dest, e))?;
        total_bytes += bytes_read as u64;
    }

    Ok(total_bytes)
}

fn copy_mapped(src: &Path, dest: &Path) -> Result<u64, SyncError> {
    let src_file = File::open(src).map_err(|e| map_fs_error(src, e))?;

    // SAFETY: the mapping is read-only and dropped before returning. A
    // concurrent writer truncating the source can still fault the process;
    // that is the accepted cost of the mapped strategy.
    let mapped = unsafe { Mmap::map(&src_file) }.map_err(|e| SyncError::Map {
        path: src.to_path_buf(),
        source: e,
    })?;

    let mut dest_file = open_dest(dest)?;
    dest_file
        .write_all(&mapped[..])
        .map_err(|e| map_fs_error(dest, e))?;

    Ok(mapped.len() as u64)
}

fn open_dest(dest: &Path) -> Result<File, SyncError> {
    // A link at the destination is replaced, never written through.
    if let Ok(meta) = fs::symlink_metadata(dest) {
        if meta.file_type().is_symlink() {
            fs::remove_file(dest).map_err(|e| map_fs_error(dest, e))?;
        }
    }

    let mut options = OpenOptions::new();
    options.write(true).create(true).truncate(true);

    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(DEST_FILE_MODE);
    }

    options.open(dest).map_err(|e| map_fs_error(dest, e))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_select_boundary() {
        assert_eq!(CopyStrategy::select(0, 0), CopyStrategy::Buffered);
        assert_eq!(CopyStrategy::select(1024, 1024), CopyStrategy::Buffered);
        assert_eq!(CopyStrategy::select(1025, 1024), CopyStrategy::Mapped);
        assert_eq!(CopyStrategy::select(1, 0), CopyStrategy::Mapped);
    }

    #[test]
    fn test_strategy_labels() {
        assert_eq!(CopyStrategy::Buffered.as_str(), "read/write");
        assert_eq!(CopyStrategy::Mapped.as_str(), "mmap");
    }
}

//! Tests for the size-based copy strategies

use std::fs;
use std::io::Write;
use std::path::Path;
use std::time::{Duration, SystemTime};
use syncdaemon::executor::{copy_file, CopyStrategy};
use syncdaemon::SyncError;
use tempfile::TempDir;

fn create_test_file(path: &Path, content: &[u8]) {
    let mut file = fs::File::create(path).expect("Failed to create test file");
    file.write_all(content)
        .expect("Failed to write test content");
    file.flush().expect("Failed to flush");
}

fn set_file_mtime(path: &Path, mtime: SystemTime) {
    let filetime_mtime = filetime::FileTime::from_system_time(mtime);
    filetime::set_file_mtime(path, filetime_mtime).expect("Failed to set mtime");
}

fn patterned(len: usize) -> Vec<u8> {
    (0..len).map(|i| (i % 251) as u8).collect()
}

#[test]
fn test_copy_at_threshold_is_buffered() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let root = temp_dir.path();
    let content = patterned(4096);

    let src_path = root.join("exact.bin");
    create_test_file(&src_path, &content);
    let dest_path = root.join("exact.copy");

    let outcome = copy_file(&src_path, &dest_path, 4096, 4096).expect("buffered copy should succeed");

    assert_eq!(outcome.strategy, CopyStrategy::Buffered);
    assert_eq!(outcome.bytes, 4096);
    assert_eq!(fs::read(&dest_path).expect("Failed to read dest file"), content);
}

#[test]
fn test_copy_above_threshold_is_mapped() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let root = temp_dir.path();
    let content = patterned(4097);

    let src_path = root.join("over.bin");
    create_test_file(&src_path, &content);
    let dest_path = root.join("over.copy");

    let outcome = copy_file(&src_path, &dest_path, 4097, 4096).expect("mapped copy should succeed");

    assert_eq!(outcome.strategy, CopyStrategy::Mapped);
    assert_eq!(outcome.bytes, 4097);
    assert_eq!(fs::read(&dest_path).expect("Failed to read dest file"), content);
}

#[test]
fn test_copy_larger_than_buffer() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let root = temp_dir.path();
    // Several buffer lengths plus a partial chunk
    let content = patterned(3 * 128 * 1024 + 17);

    let src_path = root.join("large.bin");
    create_test_file(&src_path, &content);

    let buffered = root.join("large.buffered");
    let mapped = root.join("large.mapped");
    let size = content.len() as u64;

    copy_file(&src_path, &buffered, size, u64::MAX).expect("buffered copy should succeed");
    copy_file(&src_path, &mapped, size, 0).expect("mapped copy should succeed");

    assert_eq!(fs::read(&buffered).expect("Failed to read buffered copy"), content);
    assert_eq!(fs::read(&mapped).expect("Failed to read mapped copy"), content);
}

#[test]
fn test_copy_empty_file() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let root = temp_dir.path();

    let src_path = root.join("empty.txt");
    create_test_file(&src_path, b"");
    let dest_path = root.join("empty.copy");

    let outcome = copy_file(&src_path, &dest_path, 0, 1024).expect("empty copy should succeed");

    assert_eq!(outcome.bytes, 0);
    assert!(dest_path.is_file());
}

#[test]
fn test_copy_truncates_longer_destination() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let root = temp_dir.path();

    let src_path = root.join("short.txt");
    create_test_file(&src_path, b"short");
    let dest_path = root.join("existing.txt");
    create_test_file(&dest_path, b"a much longer previous version");

    copy_file(&src_path, &dest_path, 5, 1024).expect("overwrite should succeed");

    assert_eq!(fs::read(&dest_path).expect("Failed to read dest file"), b"short");
}

#[test]
fn test_copy_does_not_preserve_mtime() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let root = temp_dir.path();

    let src_path = root.join("old.txt");
    create_test_file(&src_path, b"old content");
    let old = SystemTime::now() - Duration::from_secs(3600 * 24 * 30);
    set_file_mtime(&src_path, old);

    let dest_path = root.join("old.copy");
    copy_file(&src_path, &dest_path, 11, 1024).expect("copy should succeed");

    let dest_mtime = fs::metadata(&dest_path)
        .expect("Failed to stat dest")
        .modified()
        .expect("mtime available");
    assert!(dest_mtime > old + Duration::from_secs(3600));
}

#[test]
#[cfg(unix)]
fn test_new_destination_mode() {
    use std::os::unix::fs::PermissionsExt;

    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let root = temp_dir.path();

    let src_path = root.join("script.sh");
    create_test_file(&src_path, b"#!/bin/sh\n");
    fs::set_permissions(&src_path, fs::Permissions::from_mode(0o755))
        .expect("Failed to chmod source");

    let dest_path = root.join("script.copy");
    copy_file(&src_path, &dest_path, 10, 1024).expect("copy should succeed");

    let mode = fs::metadata(&dest_path)
        .expect("Failed to stat dest")
        .permissions()
        .mode()
        & 0o777;
    assert_eq!(mode & 0o111, 0, "execute bits are not carried over");
    assert_eq!(mode & !0o644, 0);
}

#[test]
fn test_copy_missing_source_reports_path() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let root = temp_dir.path();
    let src_path = root.join("missing.txt");

    let err = copy_file(&src_path, &root.join("out.txt"), 10, 1024)
        .expect_err("missing source must fail");

    assert!(matches!(err, SyncError::Vanished { .. }));
    assert!(err.to_string().contains("missing.txt"));
    assert!(!root.join("out.txt").exists(), "no destination without a source");
}

#[test]
fn test_copy_into_missing_directory_fails() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let root = temp_dir.path();

    let src_path = root.join("a.txt");
    create_test_file(&src_path, b"a");

    let result = copy_file(&src_path, &root.join("no/such/dir/a.txt"), 1, 1024);
    assert!(result.is_err());
}

#[test]
#[cfg(unix)]
fn test_copy_replaces_destination_symlink() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let root = temp_dir.path();

    let outside = root.join("outside.txt");
    create_test_file(&outside, b"must not change");
    let dest_path = root.join("dest.txt");
    std::os::unix::fs::symlink(&outside, &dest_path).expect("Failed to create symlink");

    let src_path = root.join("source.txt");
    create_test_file(&src_path, b"fresh");

    copy_file(&src_path, &dest_path, 5, 1024).expect("buffered copy should succeed");
    fs::remove_file(&dest_path).expect("Failed to reset dest");
    std::os::unix::fs::symlink(&outside, &dest_path).expect("Failed to recreate symlink");
    copy_file(&src_path, &dest_path, 5, 0).expect("mapped copy should succeed");

    let meta = fs::symlink_metadata(&dest_path).expect("Failed to stat dest");
    assert!(meta.file_type().is_file(), "destination is now a regular file");
    assert_eq!(fs::read(&dest_path).expect("Failed to read dest file"), b"fresh");
    assert_eq!(
        fs::read(&outside).expect("Failed to read link target"),
        b"must not change"
    );
}

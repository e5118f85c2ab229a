use chrono::{TimeZone, Utc};
use nsc_fs::{Error, io};
use pretty_assertions::assert_eq;
use std::fs;
use tempfile::TempDir;

#[test]
fn test_set_times_round_trips_modified_time() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("file.csv");
    fs::write(&path, "x").unwrap();

    let modified = Utc.with_ymd_and_hms(2023, 1, 2, 3, 4, 5).unwrap();
    let accessed = Utc.with_ymd_and_hms(2023, 6, 7, 8, 9, 10).unwrap();
    io::set_times(&path, modified, accessed).unwrap();

    assert_eq!(io::modified_time(&path).unwrap(), modified);
}

#[test]
fn test_touch_atomic_replaces_existing_stamp() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("__Latest File Date");

    let first = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
    let second = Utc.with_ymd_and_hms(2024, 2, 1, 0, 0, 0).unwrap();
    io::touch_atomic(&path, first).unwrap();
    io::touch_atomic(&path, second).unwrap();

    assert_eq!(io::modified_time(&path).unwrap(), second);
}

#[test]
fn test_modified_time_missing_file_is_io_error() {
    let temp = TempDir::new().unwrap();
    let result = io::modified_time(&temp.path().join("absent"));
    assert!(matches!(result, Err(Error::Io { .. })));
}

#[test]
fn test_archive_move_renames_with_suffix() {
    let temp = TempDir::new().unwrap();
    let outbox = temp.path().join("send");
    let archive = temp.path().join("archive");
    fs::create_dir_all(&outbox).unwrap();
    let source = outbox.join("request.txt");
    fs::write(&source, "payload").unwrap();

    let target = io::archive_move(&source, &archive, "20240815_101500").unwrap();

    assert_eq!(target, archive.join("request_20240815_101500.txt"));
    assert!(!source.exists());
    assert_eq!(fs::read_to_string(&target).unwrap(), "payload");
}

#[test]
fn test_archive_move_refuses_to_overwrite() {
    let temp = TempDir::new().unwrap();
    let archive = temp.path().join("archive");
    fs::create_dir_all(&archive).unwrap();
    fs::write(archive.join("a_s.txt"), "old").unwrap();
    let source = temp.path().join("a.txt");
    fs::write(&source, "new").unwrap();

    let result = io::archive_move(&source, &archive, "s");

    assert!(matches!(result, Err(Error::ArchiveCollision { .. })));
    assert!(source.exists());
    assert_eq!(fs::read_to_string(archive.join("a_s.txt")).unwrap(), "old");
}

#[test]
fn test_copy_atomic_copies_into_new_directory() {
    let temp = TempDir::new().unwrap();
    let source = temp.path().join("remote.csv");
    fs::write(&source, "a,b\n1,2\n").unwrap();
    let target = temp.path().join("local/renamed.csv");

    let bytes = io::copy_atomic(&source, &target).unwrap();

    assert_eq!(bytes, 8);
    assert_eq!(fs::read_to_string(&target).unwrap(), "a,b\n1,2\n");
}

#[test]
fn test_copy_atomic_missing_source_leaves_no_target() {
    let temp = TempDir::new().unwrap();
    let target = temp.path().join("out.csv");

    let result = io::copy_atomic(&temp.path().join("absent.csv"), &target);

    assert!(result.is_err());
    assert!(!target.exists());
}

fn temp_leftovers(dir: &std::path::Path) -> Vec<String> {
    fs::read_dir(dir)
        .unwrap()
        .filter_map(|e| e.ok())
        .map(|e| e.file_name().to_string_lossy().into_owned())
        .filter(|name| name.ends_with(".tmp"))
        .collect()
}

#[test]
fn test_copy_atomic_overwrites_and_leaves_no_temp() {
    let temp = TempDir::new().unwrap();
    let source = temp.path().join("remote.csv");
    let target = temp.path().join("local.csv");
    fs::write(&source, "updated").unwrap();
    fs::write(&target, "original").unwrap();

    io::copy_atomic(&source, &target).unwrap();

    assert_eq!(fs::read_to_string(&target).unwrap(), "updated");
    assert!(temp_leftovers(temp.path()).is_empty());
}

#[test]
fn test_copy_atomic_failed_rename_removes_temp() {
    let temp = TempDir::new().unwrap();
    let source = temp.path().join("remote.csv");
    fs::write(&source, "payload").unwrap();
    // A non-empty directory in the way makes the final rename fail
    let target = temp.path().join("occupied");
    fs::create_dir_all(target.join("inner")).unwrap();

    let result = io::copy_atomic(&source, &target);

    assert!(matches!(result, Err(Error::Io { .. })));
    assert!(target.is_dir());
    assert_eq!(temp_leftovers(temp.path()), Vec::<String>::new());
}

#[test]
fn test_touch_atomic_failed_rename_removes_temp() {
    let temp = TempDir::new().unwrap();
    let target = temp.path().join("__Latest File Date");
    fs::create_dir_all(target.join("inner")).unwrap();

    let stamp = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
    let result = io::touch_atomic(&target, stamp);

    assert!(result.is_err());
    assert_eq!(temp_leftovers(temp.path()), Vec::<String>::new());
}

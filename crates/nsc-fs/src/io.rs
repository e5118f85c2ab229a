//! Atomic writes, timestamp stamping and archive moves

use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use chrono::{DateTime, Utc};
use filetime::FileTime;

use crate::{Error, Result};

/// Copy `source` to `target` through a temporary file in the target
/// directory, so a failed copy never leaves a truncated target behind.
pub fn copy_atomic(source: &Path, target: &Path) -> Result<u64> {
    let temp_path = prepare_temp(target)?;

    let copied = match fs::copy(source, &temp_path) {
        Ok(bytes) => bytes,
        Err(e) => {
            let _ = fs::remove_file(&temp_path);
            return Err(Error::io(source, e));
        }
    };

    commit_temp(&temp_path, target)?;
    Ok(copied)
}

/// Atomically replace `path` with an empty file whose modification and
/// access times are both `stamp`.
///
/// The times are set on the temporary file before the rename, so the
/// target either keeps its old stamp or carries the new one.
pub fn touch_atomic(path: &Path, stamp: DateTime<Utc>) -> Result<()> {
    let temp_path = prepare_temp(path)?;

    fs::write(&temp_path, b"").map_err(|e| Error::io(&temp_path, e))?;
    if let Err(e) = set_times(&temp_path, stamp, stamp) {
        let _ = fs::remove_file(&temp_path);
        return Err(e);
    }

    commit_temp(&temp_path, path)
}

/// Set the modification and access times of a file.
pub fn set_times(path: &Path, modified: DateTime<Utc>, accessed: DateTime<Utc>) -> Result<()> {
    let mtime = FileTime::from_system_time(SystemTime::from(modified));
    let atime = FileTime::from_system_time(SystemTime::from(accessed));
    filetime::set_file_times(path, atime, mtime).map_err(|e| Error::io(path, e))
}

/// Read the modification time of a file.
pub fn modified_time(path: &Path) -> Result<DateTime<Utc>> {
    let metadata = fs::metadata(path).map_err(|e| Error::io(path, e))?;
    let modified = metadata.modified().map_err(|e| Error::io(path, e))?;
    Ok(DateTime::<Utc>::from(modified))
}

/// Create a directory and all of its parents.
pub fn ensure_dir(path: &Path) -> Result<()> {
    fs::create_dir_all(path).map_err(|e| Error::io(path, e))
}

/// Compute the archive file name for `file_name` with `suffix` inserted
/// before the extension.
///
/// `report.csv` with suffix `20240815_101500` becomes
/// `report_20240815_101500.csv`. Names without an extension get the suffix
/// appended.
pub fn archive_name(file_name: &str, suffix: &str) -> String {
    match file_name.rfind('.') {
        Some(idx) if idx > 0 => {
            format!("{}_{}{}", &file_name[..idx], suffix, &file_name[idx..])
        }
        _ => format!("{}_{}", file_name, suffix),
    }
}

/// Move a file into `archive_dir`, renaming it with `suffix`.
///
/// Refuses to overwrite an existing archive entry. Falls back to
/// copy-then-remove when the archive lives on another filesystem.
pub fn archive_move(source: &Path, archive_dir: &Path, suffix: &str) -> Result<PathBuf> {
    let file_name = source
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let target = archive_dir.join(archive_name(&file_name, suffix));

    if target.exists() {
        return Err(Error::ArchiveCollision { path: target });
    }
    ensure_dir(archive_dir)?;

    if let Err(rename_err) = fs::rename(source, &target) {
        tracing::debug!(
            source = %source.display(),
            error = %rename_err,
            "rename failed, copying across filesystems"
        );
        fs::copy(source, &target).map_err(|e| Error::io(&target, e))?;
        fs::remove_file(source).map_err(|e| Error::io(source, e))?;
    }

    Ok(target)
}

fn prepare_temp(path: &Path) -> Result<PathBuf> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        ensure_dir(parent)?;
    }

    let temp_name = format!(
        ".{}.{}.tmp",
        path.file_name()
            .map(|n| n.to_string_lossy())
            .unwrap_or_default(),
        std::process::id()
    );
    Ok(path.with_file_name(temp_name))
}

/// Rename a finished temp file over `target`, removing it if that fails.
fn commit_temp(temp_path: &Path, target: &Path) -> Result<()> {
    fs::rename(temp_path, target).map_err(|e| {
        let _ = fs::remove_file(temp_path);
        Error::io(target, e)
    })
}

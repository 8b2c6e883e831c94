//! Retention rotation
//!
//! Keeps the `keep` most recent backups in a directory and deletes the
//! rest, oldest first. The first failed deletion stops the rotation.

use std::fs;
use std::path::{Path, PathBuf};

use super::access;
use super::index::list_backups;
use crate::error::{BackupError, BackupResult};
use crate::models::BackupRecord;

/// Parse a keep-count given as text (e.g. on the command line)
pub fn parse_retention(value: &str) -> BackupResult<usize> {
    let trimmed = value.trim();
    if trimmed.is_empty() || !trimmed.bytes().all(|b| b.is_ascii_digit()) {
        return Err(BackupError::InvalidRetentionValue(value.to_string()));
    }
    trimmed
        .parse()
        .map_err(|_| BackupError::InvalidRetentionValue(value.to_string()))
}

/// Records that fall outside the retention window
///
/// `backups` must be in index order (newest first); the result is oldest first.
pub fn rotation_candidates(backups: &[BackupRecord], keep: usize) -> Vec<&BackupRecord> {
    if keep >= backups.len() {
        return Vec::new();
    }
    backups[keep..].iter().rev().collect()
}

/// Delete one backup file
///
/// Relative filenames are taken from `directory`. Returns the removed path.
pub fn delete(filename: &str, directory: &Path) -> BackupResult<PathBuf> {
    let path = directory.join(filename);

    if !access::is_writable(&path) {
        return Err(BackupError::DeleteNotWritable(path));
    }

    fs::remove_file(&path).map_err(|e| BackupError::DeleteFailed {
        path: path.clone(),
        reason: e.to_string(),
    })?;

    tracing::info!(path = %path.display(), "deleted backup");

    Ok(path)
}

/// Keep the `keep` newest backups and delete the others
///
/// Returns the deleted filenames, oldest first. Keeping at least as many
/// backups as exist deletes nothing and is not an error. If a deletion
/// fails, the remaining candidates are left alone and the error lists the
/// files already removed.
pub fn rotate(keep: usize, directory: &Path) -> BackupResult<Vec<String>> {
    rotate_with(keep, directory, delete)
}

/// [`rotate`] with the per-file removal supplied by the caller
fn rotate_with<F>(keep: usize, directory: &Path, mut remove: F) -> BackupResult<Vec<String>>
where
    F: FnMut(&str, &Path) -> BackupResult<PathBuf>,
{
    let backups = list_backups(directory)?;

    if keep >= backups.len() {
        tracing::debug!(keep, present = backups.len(), "nothing to rotate");
        return Ok(Vec::new());
    }

    let mut deleted = Vec::new();
    for backup in rotation_candidates(&backups, keep) {
        if let Err(err) = remove(&backup.filename, directory) {
            tracing::warn!(file = %backup.filename, error = %err, "rotation aborted");
            return Err(BackupError::RotationAborted {
                deleted,
                source: Box::new(err),
            });
        }
        deleted.push(backup.filename.clone());
    }

    tracing::info!(keep, deleted = deleted.len(), "rotated backups");

    Ok(deleted)
}

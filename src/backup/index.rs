//! Backup index
//!
//! Scans a backup directory (non-recursively) and rebuilds the list of
//! backups, newest first. Ties on the timestamp are broken by filename so
//! that repeated scans of an unchanged directory give the same order.

use std::fs;
use std::path::Path;

use chrono::{DateTime, Local, NaiveDate, NaiveDateTime};
use once_cell::sync::Lazy;
use regex::Regex;

use super::access;
use crate::error::{BackupError, BackupResult};
use crate::models::{compression_for, BackupRecord};

/// `<name>(<14-digit timestamp>)?.{sql|sql.gz|sql.bz2}`, case-insensitive
static BACKUP_FILENAME: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(\d{14})?\.(sql|sql\.gz|sql\.bz2)$").expect("backup filename pattern is valid")
});

/// List all backups in a directory, newest first
///
/// Fails with `DirectoryNotReadable` before looking at any entry if the
/// directory cannot be read. Returns an empty list when nothing matches.
pub fn list_backups(directory: &Path) -> BackupResult<Vec<BackupRecord>> {
    if !directory.is_dir() || !access::is_readable(directory) {
        return Err(BackupError::DirectoryNotReadable(directory.to_path_buf()));
    }

    let entries = fs::read_dir(directory)
        .map_err(|_| BackupError::DirectoryNotReadable(directory.to_path_buf()))?;

    let mut backups = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| {
            BackupError::Io(format!("Failed to read directory entry: {}", e))
        })?;

        let metadata = match fs::metadata(entry.path()) {
            Ok(metadata) if metadata.is_file() => metadata,
            _ => continue,
        };

        let filename = entry.file_name().to_string_lossy().to_string();
        if let Some(record) = parse_backup_entry(&filename, directory, &metadata)? {
            backups.push(record);
        }
    }

    sort_backups(&mut backups);

    tracing::debug!(directory = %directory.display(), count = backups.len(), "indexed backups");

    Ok(backups)
}

/// Get the most recent backup, if any
pub fn latest_backup(directory: &Path) -> BackupResult<Option<BackupRecord>> {
    Ok(list_backups(directory)?.into_iter().next())
}

/// Sort records newest first, ties by filename
pub fn sort_backups(backups: &mut [BackupRecord]) {
    backups.sort_by(|a, b| a.recency_cmp(b));
}

/// Build a record for one directory entry
///
/// Returns `Ok(None)` for names that don't follow the backup convention.
fn parse_backup_entry(
    filename: &str,
    directory: &Path,
    metadata: &fs::Metadata,
) -> BackupResult<Option<BackupRecord>> {
    let Some(captures) = BACKUP_FILENAME.captures(filename) else {
        return Ok(None);
    };

    let extension = captures[2].to_ascii_lowercase();
    // The pattern only admits registered extensions, so a miss here means
    // the pattern and the registry disagree.
    let compression = compression_for(&extension)?;

    let token_time = captures.get(1).and_then(|m| parse_timestamp_token(m.as_str()));
    let timestamp = match token_time {
        Some(timestamp) => timestamp,
        None => modified_time(metadata)?,
    };

    Ok(Some(BackupRecord {
        filename: filename.to_string(),
        path: directory.join(filename),
        extension,
        compression,
        timestamp,
        size_bytes: metadata.len(),
    }))
}

/// Parse a `YYYYMMDDHHMMSS` token; invalid calendar values yield `None`
pub fn parse_timestamp_token(token: &str) -> Option<NaiveDateTime> {
    if token.len() != 14 || !token.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }

    let year: i32 = token[0..4].parse().ok()?;
    let month: u32 = token[4..6].parse().ok()?;
    let day: u32 = token[6..8].parse().ok()?;
    let hour: u32 = token[8..10].parse().ok()?;
    let minute: u32 = token[10..12].parse().ok()?;
    let second: u32 = token[12..14].parse().ok()?;

    NaiveDate::from_ymd_opt(year, month, day)?.and_hms_opt(hour, minute, second)
}

fn modified_time(metadata: &fs::Metadata) -> BackupResult<NaiveDateTime> {
    let modified = metadata
        .modified()
        .map_err(|e| BackupError::Io(format!("Failed to read modification time: {}", e)))?;
    Ok(DateTime::<Local>::from(modified).naive_local())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::CompressionKind;
    use chrono::TimeZone;
    use std::fs::File;
    use std::time::SystemTime;
    use tempfile::TempDir;

    fn touch(dir: &Path, name: &str) {
        fs::write(dir.join(name), "-- dump").unwrap();
    }

    fn set_mtime(path: &Path, when: SystemTime) {
        File::options()
            .write(true)
            .open(path)
            .unwrap()
            .set_modified(when)
            .unwrap();
    }

    #[test]
    fn test_parse_timestamp_token() {
        let ts = parse_timestamp_token("20230101120000").unwrap();
        assert_eq!(
            ts,
            NaiveDate::from_ymd_opt(2023, 1, 1)
                .unwrap()
                .and_hms_opt(12, 0, 0)
                .unwrap()
        );
        assert!(parse_timestamp_token("20231399000000").is_none());
        assert!(parse_timestamp_token("2023").is_none());
    }

    #[test]
    fn test_filename_with_timestamp() {
        let temp = TempDir::new().unwrap();
        touch(temp.path(), "backup_mydb_20230101120000.sql.gz");

        let backups = list_backups(temp.path()).unwrap();
        assert_eq!(backups.len(), 1);
        let record = &backups[0];
        assert_eq!(record.filename, "backup_mydb_20230101120000.sql.gz");
        assert_eq!(record.extension, "sql.gz");
        assert_eq!(record.compression, CompressionKind::Gzip);
        assert_eq!(record.timestamp, parse_timestamp_token("20230101120000").unwrap());
        assert_eq!(record.path, temp.path().join("backup_mydb_20230101120000.sql.gz"));
    }

    #[test]
    fn test_filename_without_timestamp_uses_mtime() {
        let temp = TempDir::new().unwrap();
        touch(temp.path(), "mybackup.sql");
        let mtime = Local.with_ymd_and_hms(2022, 6, 15, 8, 30, 0).unwrap();
        set_mtime(&temp.path().join("mybackup.sql"), mtime.into());

        let backups = list_backups(temp.path()).unwrap();
        assert_eq!(backups.len(), 1);
        assert_eq!(backups[0].compression, CompressionKind::None);
        assert_eq!(backups[0].timestamp, mtime.naive_local());
    }

    #[test]
    fn test_non_matching_entries_ignored() {
        let temp = TempDir::new().unwrap();
        touch(temp.path(), "notes.txt");
        touch(temp.path(), "archive.sql.zip");
        touch(temp.path(), "README");
        fs::create_dir(temp.path().join("nested.sql")).unwrap();
        touch(temp.path(), "UPPER_20240101000000.SQL.BZ2");

        let backups = list_backups(temp.path()).unwrap();
        assert_eq!(backups.len(), 1);
        assert_eq!(backups[0].extension, "sql.bz2");
        assert_eq!(backups[0].compression, CompressionKind::Bzip2);
    }

    #[test]
    fn test_sorted_newest_first() {
        let temp = TempDir::new().unwrap();
        touch(temp.path(), "b_20230102000000.sql");
        touch(temp.path(), "a_20230103000000.sql");
        touch(temp.path(), "c_20230101000000.sql.gz");

        let names: Vec<_> = list_backups(temp.path())
            .unwrap()
            .into_iter()
            .map(|b| b.filename)
            .collect();
        assert_eq!(
            names,
            vec![
                "a_20230103000000.sql",
                "b_20230102000000.sql",
                "c_20230101000000.sql.gz"
            ]
        );
    }

    #[test]
    fn test_equal_timestamps_are_deterministic() {
        let temp = TempDir::new().unwrap();
        touch(temp.path(), "zeta_20230101000000.sql");
        touch(temp.path(), "alpha_20230101000000.sql");
        touch(temp.path(), "mid_20230101000000.sql.gz");

        let first: Vec<_> = list_backups(temp.path()).unwrap();
        let second: Vec<_> = list_backups(temp.path()).unwrap();
        assert_eq!(first, second);
        assert_eq!(first[0].filename, "alpha_20230101000000.sql");
        assert_eq!(first[2].filename, "zeta_20230101000000.sql");
    }

    #[test]
    fn test_empty_directory() {
        let temp = TempDir::new().unwrap();
        assert!(list_backups(temp.path()).unwrap().is_empty());
        assert!(latest_backup(temp.path()).unwrap().is_none());
    }

    #[test]
    fn test_missing_directory_not_readable() {
        let temp = TempDir::new().unwrap();
        let err = list_backups(&temp.path().join("missing")).unwrap_err();
        assert!(matches!(err, BackupError::DirectoryNotReadable(_)));
    }

    #[test]
    fn test_latest_backup() {
        let temp = TempDir::new().unwrap();
        touch(temp.path(), "old_20200101000000.sql");
        touch(temp.path(), "new_20250101000000.sql");

        let latest = latest_backup(temp.path()).unwrap().unwrap();
        assert_eq!(latest.filename, "new_20250101000000.sql");
    }
}

//! Backup record model
//!
//! One file in the backup directory that matches the naming convention.
//! Records are rebuilt on every scan and never persisted.

use std::cmp::Ordering;
use std::path::PathBuf;

use chrono::NaiveDateTime;
use serde::Serialize;

use super::compression::CompressionKind;

/// Metadata about a backup file
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BackupRecord {
    /// Backup filename (no directory)
    pub filename: String,
    /// Full path to the backup
    pub path: PathBuf,
    /// Matched extension, lowercased (`sql`, `sql.gz`, `sql.bz2`)
    pub extension: String,
    pub compression: CompressionKind,
    /// From the filename token when present, else the file's mtime (local time)
    pub timestamp: NaiveDateTime,
    /// Size in bytes
    pub size_bytes: u64,
}

impl BackupRecord {
    /// Ordering used by the index: newest first, then filename ascending
    pub fn recency_cmp(&self, other: &Self) -> Ordering {
        other
            .timestamp
            .cmp(&self.timestamp)
            .then_with(|| self.filename.cmp(&other.filename))
    }
}

//! Custom error types for dbbackup
//!
//! This module defines the error hierarchy for the backup lifecycle using
//! thiserror. Every variant renders a single message that the CLI prints
//! before aborting the current command.

use std::path::PathBuf;

use thiserror::Error;

/// The main error type for dbbackup operations
#[derive(Error, Debug)]
pub enum BackupError {
    /// Extension outside `sql`, `sql.gz`, `sql.bz2`
    #[error("The {0} extension is not supported")]
    UnsupportedExtension(String),

    /// Compression outside `none`, `gzip`, `bzip2`
    #[error("The {0} compression is not supported")]
    UnsupportedCompression(String),

    /// Named connection could not be resolved
    #[error("Invalid connection: {0}")]
    InvalidConnection(String),

    /// Filename has no parseable suffix
    #[error("Invalid file extension: {}", .0.display())]
    MissingExtension(PathBuf),

    /// Import was started without a source file
    #[error("The filename is missing")]
    MissingFilename,

    #[error("File or directory {} not writeable", .0.display())]
    DirectoryNotWritable(PathBuf),

    #[error("File or directory {} not readable", .0.display())]
    DirectoryNotReadable(PathBuf),

    #[error("File or directory {} already exists", .0.display())]
    FileAlreadyExists(PathBuf),

    #[error("File or directory {} not readable", .0.display())]
    FileNotReadable(PathBuf),

    /// `latest` was requested but the backup directory holds no backups
    #[error("No backup files found in {}", .0.display())]
    NoBackups(PathBuf),

    /// Dump pipeline did not produce a readable output file
    #[error("Export failed: {0}")]
    ExportFailed(String),

    /// Restore pipeline exited unsuccessfully
    #[error("Import failed: {0}")]
    ImportFailed(String),

    /// Keep-count is not a non-negative integer
    #[error("Invalid value for the rotation: {0}")]
    InvalidRetentionValue(String),

    #[error("File or directory {} not writeable", .0.display())]
    DeleteNotWritable(PathBuf),

    #[error("Impossible to delete the file {}: {reason}", .path.display())]
    DeleteFailed { path: PathBuf, reason: String },

    /// Rotation stopped at the first failed deletion
    #[error("Rotation aborted after deleting {} file(s): {source}", .deleted.len())]
    RotationAborted {
        deleted: Vec<String>,
        #[source]
        source: Box<BackupError>,
    },

    /// Dump, restore or compression binary could not be located
    #[error("The executable file for {0} was not found")]
    ToolNotFound(String),

    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// File I/O errors
    #[error("I/O error: {0}")]
    Io(String),
}

impl BackupError {
    /// Check if this error came from a failed deletion during rotation
    pub fn is_rotation_failure(&self) -> bool {
        matches!(
            self,
            Self::RotationAborted { .. } | Self::DeleteNotWritable(_) | Self::DeleteFailed { .. }
        )
    }

    /// Files removed before a rotation was aborted
    pub fn deleted_before_failure(&self) -> &[String] {
        match self {
            Self::RotationAborted { deleted, .. } => deleted,
            _ => &[],
        }
    }
}

impl From<std::io::Error> for BackupError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

impl From<serde_json::Error> for BackupError {
    fn from(err: serde_json::Error) -> Self {
        Self::Config(err.to_string())
    }
}

/// Result type alias for dbbackup operations
pub type BackupResult<T> = Result<T, BackupError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = BackupError::UnsupportedExtension("zip".into());
        assert_eq!(err.to_string(), "The zip extension is not supported");

        let err = BackupError::FileAlreadyExists(PathBuf::from("/tmp/out.sql"));
        assert_eq!(err.to_string(), "File or directory /tmp/out.sql already exists");
    }

    #[test]
    fn test_rotation_aborted_reports_deleted() {
        let err = BackupError::RotationAborted {
            deleted: vec!["a.sql".into(), "b.sql".into()],
            source: Box::new(BackupError::DeleteNotWritable(PathBuf::from("/b/c.sql"))),
        };
        assert!(err.is_rotation_failure());
        assert_eq!(err.deleted_before_failure().len(), 2);
        assert_eq!(
            err.to_string(),
            "Rotation aborted after deleting 2 file(s): File or directory /b/c.sql not writeable"
        );
    }

    #[test]
    fn test_from_io_error() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: BackupError = io_err.into();
        assert!(matches!(err, BackupError::Io(_)));
        assert!(!err.is_rotation_failure());
    }
}

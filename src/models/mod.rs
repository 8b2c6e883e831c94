//! Core data models for dbbackup
//!
//! Compression kinds and their file extensions, connection parameters, and
//! the records produced by scanning a backup directory.

pub mod compression;
pub mod connection;
pub mod record;

pub use compression::{compression_for, extension_for, CompressionKind, SUPPORTED_EXTENSIONS};
pub use connection::{ConnectionParams, ConnectionProvider, SecretString};
pub use record::BackupRecord;

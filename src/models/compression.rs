//! Compression registry
//!
//! Static, bidirectional mapping between compression kinds and backup file
//! extensions. Pure lookups only.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{BackupError, BackupResult};

/// Supported (extension, compression) pairs
///
/// Compound extensions come first so suffix matching prefers `sql.gz` over `sql`.
pub const SUPPORTED_EXTENSIONS: [(&str, CompressionKind); 3] = [
    ("sql.gz", CompressionKind::Gzip),
    ("sql.bz2", CompressionKind::Bzip2),
    ("sql", CompressionKind::None),
];

/// Compression applied to a backup file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum CompressionKind {
    /// Plain SQL (default)
    #[default]
    None,
    Gzip,
    Bzip2,
}

impl CompressionKind {
    /// All compression kinds
    pub const ALL: [CompressionKind; 3] = [Self::None, Self::Gzip, Self::Bzip2];

    /// File extension for this compression (no leading dot)
    pub fn extension(&self) -> &'static str {
        match self {
            Self::None => "sql",
            Self::Gzip => "sql.gz",
            Self::Bzip2 => "sql.bz2",
        }
    }

    /// Name used in settings and on the command line
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Gzip => "gzip",
            Self::Bzip2 => "bzip2",
        }
    }

    pub fn is_compressed(&self) -> bool {
        !matches!(self, Self::None)
    }
}

impl fmt::Display for CompressionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CompressionKind {
    type Err = BackupError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "none" => Ok(Self::None),
            "gzip" => Ok(Self::Gzip),
            "bzip2" => Ok(Self::Bzip2),
            _ => Err(BackupError::UnsupportedCompression(s.to_string())),
        }
    }
}

/// Get the compression kind for a file extension
///
/// Matching is case-insensitive; the extension has no leading dot.
pub fn compression_for(extension: &str) -> BackupResult<CompressionKind> {
    let lowered = extension.to_ascii_lowercase();
    SUPPORTED_EXTENSIONS
        .iter()
        .find(|(ext, _)| *ext == lowered)
        .map(|(_, kind)| *kind)
        .ok_or_else(|| BackupError::UnsupportedExtension(extension.to_string()))
}

/// Get the file extension for a compression name such as `gzip`
pub fn extension_for(compression: &str) -> BackupResult<&'static str> {
    compression
        .parse::<CompressionKind>()
        .map(|kind| kind.extension())
}

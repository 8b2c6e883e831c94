//! External binaries
//!
//! The dump, restore and compression programs are found through a
//! [`ToolLocator`], so tests can substitute fake executables.

use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;

use crate::error::{BackupError, BackupResult};
use crate::models::CompressionKind;

/// An external program used by the pipelines
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Tool {
    /// `mysqldump`
    Dump,
    /// `mysql`
    Restore,
    Gzip,
    Bzip2,
}

impl Tool {
    pub const ALL: [Tool; 4] = [Self::Dump, Self::Restore, Self::Gzip, Self::Bzip2];

    /// Binary name looked up on `PATH`
    pub fn binary_name(&self) -> &'static str {
        match self {
            Self::Dump => "mysqldump",
            Self::Restore => "mysql",
            Self::Gzip => "gzip",
            Self::Bzip2 => "bzip2",
        }
    }

    /// Compression program for a compression kind, if any
    pub fn for_compression(compression: CompressionKind) -> Option<Tool> {
        match compression {
            CompressionKind::None => None,
            CompressionKind::Gzip => Some(Self::Gzip),
            CompressionKind::Bzip2 => Some(Self::Bzip2),
        }
    }
}

impl fmt::Display for Tool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.binary_name())
    }
}

/// Resolves a [`Tool`] to an executable path
pub trait ToolLocator {
    fn locate(&self, tool: Tool) -> BackupResult<PathBuf>;
}

/// Looks tools up on `PATH`, with optional explicit overrides
#[derive(Debug, Clone, Default)]
pub struct PathLocator {
    overrides: HashMap<Tool, PathBuf>,
}

impl PathLocator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a fixed path for one tool instead of searching `PATH`
    pub fn with_override(mut self, tool: Tool, path: impl Into<PathBuf>) -> Self {
        self.overrides.insert(tool, path.into());
        self
    }
}

impl ToolLocator for PathLocator {
    fn locate(&self, tool: Tool) -> BackupResult<PathBuf> {
        if let Some(path) = self.overrides.get(&tool) {
            if path.is_file() {
                return Ok(path.clone());
            }
            return Err(BackupError::ToolNotFound(format!(
                "{} ({})",
                tool,
                path.display()
            )));
        }

        which::which(tool.binary_name())
            .map_err(|_| BackupError::ToolNotFound(tool.binary_name().to_string()))
    }
}

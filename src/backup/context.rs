//! Collaborators shared by one export or import invocation

use std::path::{Path, PathBuf};

use super::export::BackupExport;
use super::import::BackupImport;
use super::tools::{Tool, ToolLocator};
use crate::error::{BackupError, BackupResult};
use crate::models::{ConnectionParams, ConnectionProvider};

/// Connection name used when a session does not pick one
pub const DEFAULT_CONNECTION: &str = "default";

/// Permission mode applied to freshly exported files
pub const DEFAULT_FILE_MODE: u32 = 0o660;

/// Backup directory, connection lookup and binary lookup
pub struct BackupContext {
    backup_dir: PathBuf,
    connections: Box<dyn ConnectionProvider>,
    tools: Box<dyn ToolLocator>,
    default_connection: String,
    file_mode: u32,
}

impl BackupContext {
    pub fn new(
        backup_dir: impl Into<PathBuf>,
        connections: impl ConnectionProvider + 'static,
        tools: impl ToolLocator + 'static,
    ) -> Self {
        Self {
            backup_dir: backup_dir.into(),
            connections: Box::new(connections),
            tools: Box::new(tools),
            default_connection: DEFAULT_CONNECTION.to_string(),
            file_mode: DEFAULT_FILE_MODE,
        }
    }

    pub fn with_default_connection(mut self, name: impl Into<String>) -> Self {
        self.default_connection = name.into();
        self
    }

    /// Set the mode for exported files; the world-write bit is always dropped
    pub fn with_file_mode(mut self, mode: u32) -> Self {
        self.file_mode = mode & 0o775;
        self
    }

    pub fn backup_dir(&self) -> &Path {
        &self.backup_dir
    }

    pub fn default_connection(&self) -> &str {
        &self.default_connection
    }

    pub fn file_mode(&self) -> u32 {
        self.file_mode
    }

    /// Load a named connection
    pub fn connection(&self, name: &str) -> BackupResult<ConnectionParams> {
        self.connections
            .connection(name)
            .ok_or_else(|| BackupError::InvalidConnection(name.to_string()))
    }

    pub fn locate(&self, tool: Tool) -> BackupResult<PathBuf> {
        self.tools.locate(tool)
    }

    /// Start configuring an export
    pub fn export(&self) -> BackupExport<'_> {
        BackupExport::new(self)
    }

    /// Start configuring an import
    pub fn import(&self) -> BackupImport<'_> {
        BackupImport::new(self)
    }
}

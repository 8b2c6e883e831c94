//! User settings for dbbackup
//!
//! Named connections, export defaults and explicit binary locations, stored
//! as `config.json` in the home directory.

use std::collections::BTreeMap;
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::paths::BackupPaths;
use crate::backup::{BackupContext, PathLocator, Tool, DEFAULT_CONNECTION, DEFAULT_FILE_MODE};
use crate::error::{BackupError, BackupResult};
use crate::models::{CompressionKind, ConnectionParams, ConnectionProvider};

/// Explicit executable paths; unset entries are searched on `PATH`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BinarySettings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mysqldump: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mysql: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gzip: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bzip2: Option<PathBuf>,
}

impl BinarySettings {
    pub fn get(&self, tool: Tool) -> Option<&PathBuf> {
        match tool {
            Tool::Dump => self.mysqldump.as_ref(),
            Tool::Restore => self.mysql.as_ref(),
            Tool::Gzip => self.gzip.as_ref(),
            Tool::Bzip2 => self.bzip2.as_ref(),
        }
    }
}

/// User settings for dbbackup
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Schema version for migration support
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,

    /// Backup directory; `<home>/backups` when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub backup_dir: Option<PathBuf>,

    #[serde(default = "default_connection_name")]
    pub default_connection: String,

    #[serde(default)]
    pub connections: BTreeMap<String, ConnectionParams>,

    /// Compression used by `export` when none is requested
    #[serde(default)]
    pub compression: CompressionKind,

    /// Keep-count applied after every export
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rotate: Option<usize>,

    /// Permission bits for exported files
    #[serde(default = "default_file_mode")]
    pub file_mode: u32,

    #[serde(default)]
    pub binaries: BinarySettings,

    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_schema_version() -> u32 {
    1
}

fn default_connection_name() -> String {
    DEFAULT_CONNECTION.to_string()
}

fn default_file_mode() -> u32 {
    DEFAULT_FILE_MODE
}

fn default_log_level() -> String {
    "warn".to_string()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            schema_version: default_schema_version(),
            backup_dir: None,
            default_connection: default_connection_name(),
            connections: BTreeMap::new(),
            compression: CompressionKind::default(),
            rotate: None,
            file_mode: default_file_mode(),
            binaries: BinarySettings::default(),
            log_level: default_log_level(),
        }
    }
}

impl Settings {
    /// Load settings from disk, or default settings if the file doesn't exist
    pub fn load_or_create(paths: &BackupPaths) -> BackupResult<Self> {
        let settings_path = paths.settings_file();

        if settings_path.exists() {
            let contents = std::fs::read_to_string(&settings_path)
                .map_err(|e| BackupError::Io(format!("Failed to read settings file: {}", e)))?;

            let settings: Settings = serde_json::from_str(&contents)
                .map_err(|e| BackupError::Config(format!("Failed to parse settings file: {}", e)))?;

            Ok(settings)
        } else {
            // Don't save yet - let caller decide when to persist
            Ok(Settings::default())
        }
    }

    /// Save settings to disk
    ///
    /// The file holds passwords, so on unix it is readable by the owner only.
    pub fn save(&self, paths: &BackupPaths) -> BackupResult<()> {
        paths.ensure_directories()?;

        let settings_path = paths.settings_file();
        let contents = serde_json::to_string_pretty(self)
            .map_err(|e| BackupError::Config(format!("Failed to serialize settings: {}", e)))?;

        let mut file = open_private(&settings_path)
            .map_err(|e| BackupError::Io(format!("Failed to open settings file: {}", e)))?;
        file.write_all(contents.as_bytes())
            .map_err(|e| BackupError::Io(format!("Failed to write settings file: {}", e)))?;

        Ok(())
    }

    /// Backup directory, with `override_dir` taking precedence
    pub fn backup_dir(&self, paths: &BackupPaths, override_dir: Option<&Path>) -> PathBuf {
        override_dir
            .map(Path::to_path_buf)
            .or_else(|| self.backup_dir.clone())
            .unwrap_or_else(|| paths.backup_dir())
    }

    /// PATH lookup with the configured overrides applied
    pub fn tool_locator(&self) -> PathLocator {
        Tool::ALL
            .into_iter()
            .fold(PathLocator::new(), |locator, tool| match self.binaries.get(tool) {
                Some(path) => locator.with_override(tool, path.clone()),
                None => locator,
            })
    }

    /// Build the collaborators for one export or import run
    pub fn context(&self, backup_dir: impl Into<PathBuf>) -> BackupContext {
        BackupContext::new(backup_dir, self.connections.clone(), self.tool_locator())
            .with_default_connection(self.default_connection.clone())
            .with_file_mode(self.file_mode)
    }
}

/// Open for writing, created owner-only; an existing file is truncated and
/// restricted before anything is written
#[cfg(unix)]
fn open_private(path: &Path) -> std::io::Result<File> {
    use std::os::unix::fs::{OpenOptionsExt, PermissionsExt};

    let file = OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .mode(0o600)
        .open(path)?;
    file.set_permissions(std::fs::Permissions::from_mode(0o600))?;
    Ok(file)
}

#[cfg(not(unix))]
fn open_private(path: &Path) -> std::io::Result<File> {
    OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .open(path)
}

impl ConnectionProvider for Settings {
    fn connection(&self, name: &str) -> Option<ConnectionParams> {
        self.connections.get(name).cloned()
    }
}

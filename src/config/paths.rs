//! Path management for dbbackup
//!
//! ## Path Resolution Order
//!
//! 1. `DBBACKUP_HOME` environment variable (if set)
//! 2. Unix (Linux/macOS): `$XDG_CONFIG_HOME/dbbackup` or `~/.config/dbbackup`
//! 3. Windows: `%APPDATA%\dbbackup`

use std::path::{Path, PathBuf};

use crate::error::{BackupError, BackupResult};

/// Environment variable that relocates the whole home directory
pub const HOME_ENV: &str = "DBBACKUP_HOME";

/// Home directory layout: settings file plus the default backup directory
#[derive(Debug, Clone)]
pub struct BackupPaths {
    base_dir: PathBuf,
}

impl BackupPaths {
    /// Resolve the home directory from the environment
    ///
    /// # Errors
    ///
    /// Returns an error if no home directory can be determined.
    pub fn new() -> BackupResult<Self> {
        let base_dir = match std::env::var_os(HOME_ENV) {
            Some(custom) if !custom.is_empty() => PathBuf::from(custom),
            _ => resolve_default_path()?,
        };

        Ok(Self { base_dir })
    }

    /// Create BackupPaths with a custom base directory (useful for testing)
    pub fn with_base_dir(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
        }
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    /// Default backup directory (`<home>/backups`)
    pub fn backup_dir(&self) -> PathBuf {
        self.base_dir.join("backups")
    }

    pub fn settings_file(&self) -> PathBuf {
        self.base_dir.join("config.json")
    }

    /// Create the home directory
    pub fn ensure_directories(&self) -> BackupResult<()> {
        std::fs::create_dir_all(&self.base_dir)
            .map_err(|e| BackupError::Io(format!("Failed to create home directory: {}", e)))
    }

    /// Check if a settings file has been written
    pub fn is_initialized(&self) -> bool {
        self.settings_file().exists()
    }
}

#[cfg(not(windows))]
fn resolve_default_path() -> BackupResult<PathBuf> {
    let config_base = match std::env::var_os("XDG_CONFIG_HOME") {
        Some(xdg) if !xdg.is_empty() => PathBuf::from(xdg),
        _ => {
            let home = std::env::var_os("HOME").ok_or_else(|| {
                BackupError::Config("HOME environment variable not set".into())
            })?;
            PathBuf::from(home).join(".config")
        }
    };
    Ok(config_base.join("dbbackup"))
}

#[cfg(windows)]
fn resolve_default_path() -> BackupResult<PathBuf> {
    let appdata = std::env::var_os("APPDATA")
        .ok_or_else(|| BackupError::Config("Could not determine APPDATA directory".into()))?;
    Ok(PathBuf::from(appdata).join("dbbackup"))
}

//! Temporary credential files
//!
//! The password is handed to the MySQL client tools through an option
//! file instead of the command line, where any local user could read it
//! from the process list. The file is removed when the guard is dropped,
//! whether or not the subprocess succeeded.

use std::fs;
use std::io::Write;
use std::path::Path;

use tempfile::NamedTempFile;

use crate::error::{BackupError, BackupResult};
use crate::models::ConnectionParams;

/// Option-file section read by the client tool
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialSection {
    /// `[mysqldump]`, read by the dump tool
    Dump,
    /// `[client]`, read by every client tool
    Client,
}

impl CredentialSection {
    pub fn header(&self) -> &'static str {
        match self {
            Self::Dump => "mysqldump",
            Self::Client => "client",
        }
    }
}

/// Render the option-file contents
pub fn render_credentials(section: CredentialSection, connection: &ConnectionParams) -> String {
    format!(
        "[{}]\nuser={}\npassword=\"{}\"\nhost={}\n",
        section.header(),
        connection.username,
        connection.password.expose(),
        connection.host
    )
}

/// A credential file that lives as long as this guard
#[derive(Debug)]
pub struct CredentialsFile {
    file: NamedTempFile,
}

impl CredentialsFile {
    /// Write the credentials to a fresh owner-only temporary file
    pub fn create(section: CredentialSection, connection: &ConnectionParams) -> BackupResult<Self> {
        let mut file = tempfile::Builder::new()
            .prefix("auth")
            .tempfile()
            .map_err(|e| BackupError::Io(format!("Failed to create credentials file: {}", e)))?;

        restrict_permissions(file.path())?;

        file.write_all(render_credentials(section, connection).as_bytes())
            .and_then(|_| file.flush())
            .map_err(|e| BackupError::Io(format!("Failed to write credentials file: {}", e)))?;

        Ok(Self { file })
    }

    pub fn path(&self) -> &Path {
        self.file.path()
    }

    /// Delete the file now, reporting any error
    pub fn remove(self) -> BackupResult<()> {
        self.file
            .close()
            .map_err(|e| BackupError::Io(format!("Failed to remove credentials file: {}", e)))
    }
}

#[cfg(unix)]
fn restrict_permissions(path: &Path) -> BackupResult<()> {
    use std::os::unix::fs::PermissionsExt;

    fs::set_permissions(path, fs::Permissions::from_mode(0o600))
        .map_err(|e| BackupError::Io(format!("Failed to secure credentials file: {}", e)))
}

#[cfg(not(unix))]
fn restrict_permissions(_path: &Path) -> BackupResult<()> {
    Ok(())
}

//! Database export
//!
//! A [`BackupExport`] is configured step by step (connection, then
//! compression or filename, then optional rotation) and consumed by
//! [`BackupExport::export`]. Defaults such as the filename timestamp are
//! computed when they are needed, so a session is never reused.

use std::path::{Path, PathBuf};

use chrono::Local;

use super::access;
use super::context::BackupContext;
use super::credentials::{CredentialSection, CredentialsFile};
use super::filename::{default_filename, resolve_export_target, ResolvedBackup};
use super::pipeline::{Pipeline, PipelineError};
use super::rotation::rotate;
use super::tools::Tool;
use crate::error::{BackupError, BackupResult};
use crate::models::{CompressionKind, ConnectionParams};

/// Result of a successful export
#[derive(Debug)]
pub struct ExportOutcome {
    /// Absolute path of the created backup
    pub path: PathBuf,
    pub compression: CompressionKind,
    /// Files removed by the post-export rotation, if one was requested.
    /// A rotation error does not undo the export.
    pub rotation: Option<BackupResult<Vec<String>>>,
}

/// Export session for one database dump
pub struct BackupExport<'a> {
    context: &'a BackupContext,
    connection: Option<ConnectionParams>,
    compression: Option<CompressionKind>,
    target: Option<ResolvedBackup>,
    rotate: Option<usize>,
}

impl<'a> BackupExport<'a> {
    pub fn new(context: &'a BackupContext) -> Self {
        Self {
            context,
            connection: None,
            compression: None,
            target: None,
            rotate: None,
        }
    }

    /// Use the named connection
    pub fn set_connection(&mut self, name: &str) -> BackupResult<&ConnectionParams> {
        let params = self.context.connection(name)?;
        Ok(self.connection.insert(params))
    }

    /// Request a compression
    ///
    /// Once a filename has been set its extension decides the compression
    /// and this request is ignored. Returns the compression that will be used.
    pub fn set_compression(&mut self, compression: CompressionKind) -> CompressionKind {
        if let Some(target) = &self.target {
            if target.compression != compression {
                tracing::warn!(
                    requested = %compression,
                    from_filename = %target.compression,
                    "compression is fixed by the filename extension"
                );
            }
            return target.compression;
        }
        self.compression = Some(compression);
        compression
    }

    /// Set the output file, fixing the compression from its extension
    ///
    /// Relative names go into the backup directory. Placeholders are
    /// expanded now, against the current connection.
    pub fn set_filename(&mut self, filename: &str) -> BackupResult<&Path> {
        let connection = self.ensure_connection()?.clone();
        let target = resolve_export_target(
            filename,
            self.context.backup_dir(),
            &connection,
            Local::now(),
        )?;
        self.compression = Some(target.compression);
        Ok(&self.target.insert(target).path)
    }

    /// Keep only the `keep` newest backups after a successful export
    ///
    /// A keep-count of 0 turns post-export rotation off.
    pub fn set_rotation(&mut self, keep: usize) {
        self.rotate = (keep > 0).then_some(keep);
    }

    fn ensure_connection(&mut self) -> BackupResult<&ConnectionParams> {
        if self.connection.is_none() {
            let name = self.context.default_connection().to_string();
            self.set_connection(&name)?;
        }
        self.connection
            .as_ref()
            .ok_or_else(|| BackupError::InvalidConnection(self.context.default_connection().to_string()))
    }

    /// Dump the database into the target file
    pub fn export(mut self) -> BackupResult<ExportOutcome> {
        let connection = self.ensure_connection()?.clone();

        let target = match self.target.take() {
            Some(target) => target,
            None => {
                let compression = self.compression.unwrap_or_default();
                let now = Local::now();
                let filename = default_filename(&connection.database, compression, now);
                resolve_export_target(&filename, self.context.backup_dir(), &connection, now)?
            }
        };

        let dump = self.context.locate(Tool::Dump)?;
        let compressor = Tool::for_compression(target.compression)
            .map(|tool| self.context.locate(tool))
            .transpose()?;

        let credentials = CredentialsFile::create(CredentialSection::Dump, &connection)?;

        let mut pipeline = Pipeline::new(&dump)
            .arg(format!("--defaults-file={}", credentials.path().display()))
            .arg(&connection.database);
        if let Some(compressor) = &compressor {
            pipeline = pipeline.pipe(compressor);
        }
        let pipeline = pipeline.write_to(&target.path);

        tracing::debug!(pipeline = %pipeline.describe(), "running export");
        let result = pipeline.run();

        if let Err(err) = credentials.remove() {
            tracing::warn!(error = %err, "credentials file cleanup failed");
        }

        result.map_err(|err| match err {
            PipelineError::OutputExists(path) => BackupError::FileAlreadyExists(path),
            other => BackupError::ExportFailed(other.to_string()),
        })?;

        if !target.path.is_file() || !access::is_readable(&target.path) {
            return Err(BackupError::ExportFailed(format!(
                "File or directory {} has not been created",
                target.path.display()
            )));
        }

        apply_file_mode(&target.path, self.context.file_mode());

        tracing::info!(path = %target.path.display(), compression = %target.compression, "created backup");

        let rotation = self.rotate.map(|keep| {
            let result = rotate(keep, self.context.backup_dir());
            if let Err(err) = &result {
                tracing::warn!(error = %err, "rotation after export failed");
            }
            result
        });

        Ok(ExportOutcome {
            path: absolute(&target.path),
            compression: target.compression,
            rotation,
        })
    }
}

fn absolute(path: &Path) -> PathBuf {
    if path.is_absolute() {
        return path.to_path_buf();
    }
    std::env::current_dir()
        .map(|cwd| cwd.join(path))
        .unwrap_or_else(|_| path.to_path_buf())
}

#[cfg(unix)]
fn apply_file_mode(path: &Path, mode: u32) {
    use std::os::unix::fs::PermissionsExt;

    let mode = mode & !0o002;
    if let Err(err) = std::fs::set_permissions(path, std::fs::Permissions::from_mode(mode)) {
        tracing::warn!(path = %path.display(), error = %err, "could not set backup permissions");
    }
}

#[cfg(not(unix))]
fn apply_file_mode(_path: &Path, _mode: u32) {}

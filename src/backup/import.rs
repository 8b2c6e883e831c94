//! Database import
//!
//! Restores an existing backup file into a database, decompressing it on
//! the way when its extension says so. Import never deletes files.

use std::path::{Path, PathBuf};

use super::context::BackupContext;
use super::credentials::{CredentialSection, CredentialsFile};
use super::filename::{resolve_import_source, ResolvedBackup};
use super::pipeline::Pipeline;
use super::tools::Tool;
use crate::error::{BackupError, BackupResult};
use crate::models::ConnectionParams;

/// Import session for one backup file
pub struct BackupImport<'a> {
    context: &'a BackupContext,
    connection: Option<ConnectionParams>,
    source: Option<ResolvedBackup>,
}

impl<'a> BackupImport<'a> {
    pub fn new(context: &'a BackupContext) -> Self {
        Self {
            context,
            connection: None,
            source: None,
        }
    }

    /// Use the named connection
    pub fn set_connection(&mut self, name: &str) -> BackupResult<&ConnectionParams> {
        let params = self.context.connection(name)?;
        Ok(self.connection.insert(params))
    }

    /// Choose the backup to restore
    ///
    /// Relative names are looked up in the backup directory. The file must
    /// be readable and carry a known extension.
    pub fn set_filename(&mut self, filename: &str) -> BackupResult<&ResolvedBackup> {
        let source = resolve_import_source(filename, self.context.backup_dir())?;
        Ok(self.source.insert(source))
    }

    /// Restore the chosen backup and return its path
    pub fn import(mut self) -> BackupResult<PathBuf> {
        let source = self.source.take().ok_or(BackupError::MissingFilename)?;
        let connection = match self.connection.take() {
            Some(connection) => connection,
            None => self.context.connection(self.context.default_connection())?,
        };

        let restore = self.context.locate(Tool::Restore)?;
        let decompressor = Tool::for_compression(source.compression)
            .map(|tool| self.context.locate(tool))
            .transpose()?;

        let credentials = CredentialsFile::create(CredentialSection::Client, &connection)?;
        let pipeline = restore_pipeline(
            &source.path,
            decompressor.as_deref(),
            &restore,
            credentials.path(),
            &connection.database,
        );

        tracing::debug!(pipeline = %pipeline.describe(), "running import");
        let result = pipeline.run();

        if let Err(err) = credentials.remove() {
            tracing::warn!(error = %err, "credentials file cleanup failed");
        }

        result.map_err(|err| BackupError::ImportFailed(err.to_string()))?;

        tracing::info!(path = %source.path.display(), database = %connection.database, "imported backup");

        Ok(source.path)
    }
}

/// `decompress -dc <file> | restore ...`, or `restore ... < file` when uncompressed
fn restore_pipeline(
    source: &Path,
    decompressor: Option<&Path>,
    restore: &Path,
    credentials: &Path,
    database: &str,
) -> Pipeline {
    let defaults = format!("--defaults-extra-file={}", credentials.display());
    match decompressor {
        Some(decompressor) => Pipeline::new(decompressor)
            .arg("-dc")
            .arg(source)
            .pipe(restore)
            .arg(defaults)
            .arg(database),
        None => Pipeline::new(restore)
            .arg(defaults)
            .arg(database)
            .read_from(source),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compressed_pipeline_shape() {
        let pipeline = restore_pipeline(
            Path::new("/b/x.sql.gz"),
            Some(Path::new("/usr/bin/gzip")),
            Path::new("/usr/bin/mysql"),
            Path::new("/tmp/auth1"),
            "shop",
        );
        assert_eq!(
            pipeline.describe(),
            "/usr/bin/gzip -dc /b/x.sql.gz | /usr/bin/mysql --defaults-extra-file=/tmp/auth1 shop"
        );
    }

    #[test]
    fn test_plain_pipeline_shape() {
        let pipeline = restore_pipeline(
            Path::new("/b/x.sql"),
            None,
            Path::new("/usr/bin/mysql"),
            Path::new("/tmp/auth1"),
            "shop",
        );
        assert_eq!(
            pipeline.describe(),
            "/usr/bin/mysql --defaults-extra-file=/tmp/auth1 shop < /b/x.sql"
        );
    }

    #[cfg(unix)]
    mod with_fakes {
        use super::super::*;
        use crate::backup::test_support::{connections, fake_context, fake_locator, script};
        use std::fs;
        use tempfile::TempDir;

        #[test]
        fn test_import_plain_file() {
            let backups = TempDir::new().unwrap();
            let bin = TempDir::new().unwrap();
            fs::write(backups.path().join("dump.sql"), "CREATE TABLE t (id INT);\n").unwrap();
            let context = fake_context(backups.path(), bin.path());

            let mut import = context.import();
            import.set_filename("dump.sql").unwrap();
            let path = import.import().unwrap();

            assert_eq!(path, backups.path().join("dump.sql"));
            assert_eq!(
                fs::read_to_string(bin.path().join("restored_shop.sql")).unwrap(),
                "CREATE TABLE t (id INT);\n"
            );
            assert_eq!(
                fs::read_to_string(bin.path().join("restore_section")).unwrap(),
                "[client]\n"
            );
        }

        #[test]
        fn test_import_compressed_file_with_connection() {
            let backups = TempDir::new().unwrap();
            let bin = TempDir::new().unwrap();
            fs::write(backups.path().join("dump.sql.bz2"), "INSERT 1;\n").unwrap();
            let context = fake_context(backups.path(), bin.path());

            let mut import = context.import();
            import.set_connection("reporting").unwrap();
            let source = import.set_filename("dump.sql.bz2").unwrap();
            assert_eq!(source.compression, crate::models::CompressionKind::Bzip2);
            import.import().unwrap();

            assert_eq!(
                fs::read_to_string(bin.path().join("restored_reports.sql")).unwrap(),
                "INSERT 1;\n"
            );
        }

        #[test]
        fn test_credentials_removed_after_import() {
            let backups = TempDir::new().unwrap();
            let bin = TempDir::new().unwrap();
            fs::write(backups.path().join("dump.sql"), "x").unwrap();
            let context = fake_context(backups.path(), bin.path());

            let mut import = context.import();
            import.set_filename("dump.sql").unwrap();
            import.import().unwrap();

            let creds = fs::read_to_string(bin.path().join("restore_credentials")).unwrap();
            assert!(!std::path::Path::new(creds.trim()).exists());
        }

        #[test]
        fn test_import_without_filename() {
            let backups = TempDir::new().unwrap();
            let bin = TempDir::new().unwrap();
            let context = fake_context(backups.path(), bin.path());

            let err = context.import().import().unwrap_err();
            assert!(matches!(err, BackupError::MissingFilename));
        }

        #[test]
        fn test_failing_restore() {
            let backups = TempDir::new().unwrap();
            let bin = TempDir::new().unwrap();
            fs::write(backups.path().join("dump.sql"), "x").unwrap();
            let failing = script(bin.path(), "broken-mysql", "cat > /dev/null; echo 'ERROR 1045' >&2; exit 1");
            let locator = fake_locator(bin.path()).with_override(Tool::Restore, failing);
            let context = BackupContext::new(backups.path(), connections(), locator);

            let mut import = context.import();
            import.set_filename("dump.sql").unwrap();
            match import.import().unwrap_err() {
                BackupError::ImportFailed(message) => assert!(message.contains("ERROR 1045")),
                other => panic!("unexpected error: {other}"),
            }
            assert!(backups.path().join("dump.sql").exists());
        }

        #[test]
        fn test_unsupported_import_extension() {
            let backups = TempDir::new().unwrap();
            let bin = TempDir::new().unwrap();
            fs::write(backups.path().join("dump.tar"), "x").unwrap();
            let context = fake_context(backups.path(), bin.path());

            let mut import = context.import();
            assert!(matches!(
                import.set_filename("dump.tar").unwrap_err(),
                BackupError::UnsupportedExtension(_)
            ));
        }
    }
}

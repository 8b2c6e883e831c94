//! Backup filename resolution
//!
//! Turns a requested filename into a validated path plus the compression
//! implied by its extension. Export targets must not exist yet; import
//! sources must exist and be readable.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};

use super::access;
use crate::error::{BackupError, BackupResult};
use crate::models::{CompressionKind, ConnectionParams, SUPPORTED_EXTENSIONS};

/// Format of the `{$DATETIME}` placeholder and of default filenames
pub const DATETIME_FORMAT: &str = "%Y%m%d%H%M%S";

/// A resolved backup path and its compression
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedBackup {
    pub path: PathBuf,
    pub extension: &'static str,
    pub compression: CompressionKind,
}

/// Replace `{$DATABASE}`, `{$DATETIME}`, `{$HOSTNAME}` and `{$TIMESTAMP}`
pub fn expand_placeholders(
    template: &str,
    connection: &ConnectionParams,
    now: DateTime<Local>,
) -> String {
    template
        .replace("{$DATABASE}", &connection.database)
        .replace("{$DATETIME}", &now.format(DATETIME_FORMAT).to_string())
        .replace("{$HOSTNAME}", &connection.host)
        .replace("{$TIMESTAMP}", &now.timestamp().to_string())
}

/// Default export filename: `backup_{database}_{YYYYMMDDHHMMSS}.{extension}`
pub fn default_filename(database: &str, compression: CompressionKind, now: DateTime<Local>) -> String {
    format!(
        "backup_{}_{}.{}",
        database,
        now.format(DATETIME_FORMAT),
        compression.extension()
    )
}

/// Find the known extension at the end of a backup path
///
/// A basename without any dot is `MissingExtension`; a dotted basename that
/// ends in none of the known extensions is `UnsupportedExtension`.
pub fn parse_extension(path: &Path) -> BackupResult<(&'static str, CompressionKind)> {
    let basename = path
        .file_name()
        .map(|name| name.to_string_lossy().to_ascii_lowercase())
        .ok_or_else(|| BackupError::MissingExtension(path.to_path_buf()))?;

    for (ext, kind) in SUPPORTED_EXTENSIONS {
        if basename.ends_with(&format!(".{}", ext)) {
            return Ok((ext, kind));
        }
    }

    match basename.split_once('.') {
        Some((_, suffix)) if !suffix.is_empty() => {
            Err(BackupError::UnsupportedExtension(suffix.to_string()))
        }
        _ => Err(BackupError::MissingExtension(path.to_path_buf())),
    }
}

/// Join a relative filename onto the backup directory
fn in_backup_dir(filename: &str, backup_dir: &Path) -> PathBuf {
    let path = Path::new(filename);
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        backup_dir.join(path)
    }
}

/// Resolve the file an export will write to
///
/// Placeholders are expanded with `now`. The directory must be writable and
/// the file must not exist; both checks are advisory.
pub fn resolve_export_target(
    filename: &str,
    backup_dir: &Path,
    connection: &ConnectionParams,
    now: DateTime<Local>,
) -> BackupResult<ResolvedBackup> {
    let expanded = expand_placeholders(filename, connection, now);
    let path = in_backup_dir(&expanded, backup_dir);

    let (extension, compression) = parse_extension(&path)?;

    let directory = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => backup_dir,
    };
    if !access::is_writable(directory) {
        return Err(BackupError::DirectoryNotWritable(directory.to_path_buf()));
    }

    if path.exists() {
        return Err(BackupError::FileAlreadyExists(path));
    }

    tracing::debug!(path = %path.display(), %compression, "resolved export target");

    Ok(ResolvedBackup {
        path,
        extension,
        compression,
    })
}

/// Resolve an existing backup file for import
pub fn resolve_import_source(filename: &str, backup_dir: &Path) -> BackupResult<ResolvedBackup> {
    let path = in_backup_dir(filename, backup_dir);

    if !path.is_file() || !access::is_readable(&path) {
        return Err(BackupError::FileNotReadable(path));
    }

    let (extension, compression) = parse_extension(&path)?;

    tracing::debug!(path = %path.display(), %compression, "resolved import source");

    Ok(ResolvedBackup {
        path,
        extension,
        compression,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use std::fs;
    use tempfile::TempDir;

    fn connection() -> ConnectionParams {
        ConnectionParams::new("db.example.com", "app", "secret", "shop")
    }

    fn fixed_now() -> DateTime<Local> {
        Local.with_ymd_and_hms(2023, 1, 1, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_expand_placeholders() {
        let now = fixed_now();
        let name = expand_placeholders(
            "{$DATABASE}_{$HOSTNAME}_{$DATETIME}_{$TIMESTAMP}.sql",
            &connection(),
            now,
        );
        assert_eq!(
            name,
            format!("shop_db.example.com_20230101120000_{}.sql", now.timestamp())
        );
    }

    #[test]
    fn test_default_filename() {
        let name = default_filename("shop", CompressionKind::Gzip, fixed_now());
        assert_eq!(name, "backup_shop_20230101120000.sql.gz");
    }

    #[test]
    fn test_parse_extension() {
        assert_eq!(
            parse_extension(Path::new("/b/out.sql.bz2")).unwrap(),
            ("sql.bz2", CompressionKind::Bzip2)
        );
        assert_eq!(
            parse_extension(Path::new("my.nightly.SQL.GZ")).unwrap(),
            ("sql.gz", CompressionKind::Gzip)
        );
        assert!(matches!(
            parse_extension(Path::new("/b/backup")).unwrap_err(),
            BackupError::MissingExtension(_)
        ));
        assert!(matches!(
            parse_extension(Path::new("/b/backup.tar")).unwrap_err(),
            BackupError::UnsupportedExtension(ext) if ext == "tar"
        ));
    }

    #[test]
    fn test_export_target_in_backup_dir() {
        let temp = TempDir::new().unwrap();
        let resolved =
            resolve_export_target("out.sql.bz2", temp.path(), &connection(), fixed_now()).unwrap();

        assert_eq!(resolved.path, temp.path().join("out.sql.bz2"));
        assert_eq!(resolved.compression, CompressionKind::Bzip2);
        assert!(!resolved.path.exists());
    }

    #[test]
    fn test_export_target_absolute_path_kept() {
        let backups = TempDir::new().unwrap();
        let elsewhere = TempDir::new().unwrap();
        let target = elsewhere.path().join("x.sql");

        let resolved = resolve_export_target(
            target.to_str().unwrap(),
            backups.path(),
            &connection(),
            fixed_now(),
        )
        .unwrap();
        assert_eq!(resolved.path, target);
    }

    #[test]
    fn test_export_target_already_exists() {
        let temp = TempDir::new().unwrap();
        let existing = temp.path().join("out.sql");
        fs::write(&existing, "keep me").unwrap();

        let err = resolve_export_target("out.sql", temp.path(), &connection(), fixed_now())
            .unwrap_err();
        assert!(matches!(err, BackupError::FileAlreadyExists(p) if p == existing));
        assert_eq!(fs::read_to_string(&existing).unwrap(), "keep me");
        assert_eq!(fs::read_dir(temp.path()).unwrap().count(), 1);
    }

    #[test]
    fn test_export_target_missing_directory() {
        let temp = TempDir::new().unwrap();
        let missing = temp.path().join("missing");

        let err =
            resolve_export_target("out.sql", &missing, &connection(), fixed_now()).unwrap_err();
        assert!(matches!(err, BackupError::DirectoryNotWritable(_)));
    }

    #[test]
    fn test_export_target_with_placeholders() {
        let temp = TempDir::new().unwrap();
        let resolved = resolve_export_target(
            "{$DATABASE}-{$DATETIME}.sql.gz",
            temp.path(),
            &connection(),
            fixed_now(),
        )
        .unwrap();
        assert_eq!(resolved.path, temp.path().join("shop-20230101120000.sql.gz"));
        assert_eq!(resolved.compression, CompressionKind::Gzip);
    }

    #[test]
    fn test_import_source_relative() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("dump.sql.gz"), "x").unwrap();

        let resolved = resolve_import_source("dump.sql.gz", temp.path()).unwrap();
        assert_eq!(resolved.path, temp.path().join("dump.sql.gz"));
        assert_eq!(resolved.compression, CompressionKind::Gzip);
    }

    #[test]
    fn test_import_source_missing() {
        let temp = TempDir::new().unwrap();
        let err = resolve_import_source("nope.sql", temp.path()).unwrap_err();
        assert!(matches!(err, BackupError::FileNotReadable(_)));
    }

    #[test]
    fn test_import_source_directory_rejected() {
        let temp = TempDir::new().unwrap();
        fs::create_dir(temp.path().join("dir.sql")).unwrap();
        let err = resolve_import_source("dir.sql", temp.path()).unwrap_err();
        assert!(matches!(err, BackupError::FileNotReadable(_)));
    }
}

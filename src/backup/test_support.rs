//! Fake MySQL and compression binaries for pipeline tests

use std::collections::BTreeMap;
use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};

use super::context::BackupContext;
use super::tools::{PathLocator, Tool};
use crate::models::ConnectionParams;

pub fn script(dir: &Path, name: &str, body: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, format!("#!/bin/sh\n{}\n", body)).unwrap();
    fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
    path
}

/// Fake dump: prints the credential path, the credential file and the database
pub fn fake_dump(bin: &Path) -> PathBuf {
    script(
        bin,
        "mysqldump",
        r#"creds="${1#--defaults-file=}"
echo "-- credentials: $creds"
cat "$creds"
echo "-- database: $2""#,
    )
}

/// Fake dump that records the credential path next to itself and fails
pub fn failing_dump(bin: &Path) -> PathBuf {
    let seen = bin.join("seen_credentials");
    script(
        bin,
        "mysqldump",
        &format!(
            r#"creds="${{1#--defaults-file=}}"
echo "$creds" > "{}"
echo "Access denied for user" >&2
exit 2"#,
            seen.display()
        ),
    )
}

/// Fake compressor: tags its output on the way in, passes through on `-dc`
pub fn fake_compressor(bin: &Path, name: &str) -> PathBuf {
    script(
        bin,
        name,
        &format!(
            r#"if [ "$1" = "-dc" ]; then
  cat "$2"
else
  echo "-- {}"
  cat
fi"#,
            name
        ),
    )
}

/// Fake restore: stores the credential section header and stdin next to itself
pub fn fake_restore(bin: &Path) -> PathBuf {
    script(
        bin,
        "mysql",
        &format!(
            r#"creds="${{1#--defaults-extra-file=}}"
echo "$creds" > "{dir}/restore_credentials"
head -n 1 "$creds" > "{dir}/restore_section"
cat > "{dir}/restored_$2.sql""#,
            dir = bin.display()
        ),
    )
}

pub fn fake_locator(bin: &Path) -> PathLocator {
    PathLocator::new()
        .with_override(Tool::Dump, fake_dump(bin))
        .with_override(Tool::Restore, fake_restore(bin))
        .with_override(Tool::Gzip, fake_compressor(bin, "gzip"))
        .with_override(Tool::Bzip2, fake_compressor(bin, "bzip2"))
}

pub fn connections() -> BTreeMap<String, ConnectionParams> {
    let mut map = BTreeMap::new();
    map.insert(
        "default".to_string(),
        ConnectionParams::new("localhost", "root", "s3cret", "shop"),
    );
    map.insert(
        "reporting".to_string(),
        ConnectionParams::new("reports.internal", "reader", "r3ad", "reports"),
    );
    map
}

/// Context over `backups` using the fakes installed in `bin`
pub fn fake_context(backups: &Path, bin: &Path) -> BackupContext {
    BackupContext::new(backups, connections(), fake_locator(bin))
}

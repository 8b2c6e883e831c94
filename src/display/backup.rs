//! Backup listing display
//!
//! Formats the backup index for terminal output.

use crate::models::BackupRecord;

const DATETIME_DISPLAY: &str = "%Y-%m-%d %H:%M:%S";

/// Format backups as a table, newest first as given
pub fn format_backup_table(backups: &[BackupRecord]) -> String {
    let mut output = format!("Backup files found: {}\n", backups.len());
    if backups.is_empty() {
        return output;
    }

    let name_width = backups
        .iter()
        .map(|b| b.filename.len())
        .max()
        .unwrap_or(8)
        .max(8);

    output.push('\n');
    output.push_str(&format!(
        "{:<name_width$}  {:<11}  {:<19}  {:>10}\n",
        "Filename",
        "Compression",
        "Datetime",
        "Size",
        name_width = name_width,
    ));
    output.push_str(&format!(
        "{:-<name_width$}  {:-<11}  {:-<19}  {:->10}\n",
        "",
        "",
        "",
        "",
        name_width = name_width,
    ));

    for backup in backups {
        output.push_str(&format!(
            "{:<name_width$}  {:<11}  {:<19}  {:>10}\n",
            backup.filename,
            backup.compression.as_str(),
            backup.timestamp.format(DATETIME_DISPLAY).to_string(),
            format_size(backup.size_bytes),
            name_width = name_width,
        ));
    }

    output
}

/// Format a byte count in human-readable form
pub fn format_size(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    if bytes >= GB {
        format!("{:.1} GB", bytes as f64 / GB as f64)
    } else if bytes >= MB {
        format!("{:.1} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.1} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} B", bytes)
    }
}

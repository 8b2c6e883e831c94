//! Backup CLI commands
//!
//! Export, import, listing, rotation and deletion of backup files.

use clap::Subcommand;
use std::path::Path;

use crate::backup::{delete, latest_backup, list_backups, parse_retention, rotate};
use crate::config::settings::Settings;
use crate::display::format_backup_table;
use crate::error::{BackupError, BackupResult};
use crate::models::CompressionKind;

/// Backup subcommands
#[derive(Subcommand)]
pub enum BackupCommands {
    /// Export a database to a backup file
    Export {
        /// Connection name from the settings file
        #[arg(long)]
        connection: Option<String>,

        /// Compression type (none, gzip, bzip2)
        #[arg(short, long)]
        compression: Option<String>,

        /// Filename, relative to the backup directory; supports
        /// {$DATABASE}, {$DATETIME}, {$HOSTNAME} and {$TIMESTAMP}
        #[arg(short, long)]
        filename: Option<String>,

        /// Keep only this many backups after exporting
        #[arg(short, long)]
        rotate: Option<String>,
    },

    /// Restore a backup file into a database
    Import {
        /// Backup filename or path (use 'latest' for most recent)
        filename: String,

        /// Connection name from the settings file
        #[arg(long)]
        connection: Option<String>,
    },

    /// List backup files, newest first
    #[command(alias = "list")]
    Index {
        /// Print the listing as JSON
        #[arg(long)]
        json: bool,
    },

    /// Delete all but the newest backups
    Rotate {
        /// Number of backups to keep
        keep: String,
    },

    /// Delete a single backup file
    Delete {
        /// Backup filename, relative to the backup directory
        filename: String,
    },
}

/// Handle a backup command
pub fn handle_backup_command(
    settings: &Settings,
    backup_dir: &Path,
    cmd: BackupCommands,
) -> BackupResult<()> {
    match cmd {
        BackupCommands::Export {
            connection,
            compression,
            filename,
            rotate,
        } => {
            let context = settings.context(backup_dir);
            let mut export = context.export();

            if let Some(name) = connection {
                export.set_connection(&name)?;
            }

            let compression = match compression {
                Some(value) => value.parse::<CompressionKind>()?,
                None => settings.compression,
            };
            export.set_compression(compression);

            if let Some(filename) = filename {
                export.set_filename(&filename)?;
            }

            let keep = match rotate {
                Some(value) => Some(parse_retention(&value)?),
                None => settings.rotate,
            };
            if let Some(keep) = keep {
                export.set_rotation(keep);
            }

            let outcome = export.export()?;
            println!("Backup exported: {}", outcome.path.display());

            match outcome.rotation {
                Some(Ok(deleted)) => print_deleted(&deleted),
                Some(Err(err)) => {
                    print_deleted_before_failure(&err);
                    return Err(err);
                }
                None => {}
            }
        }

        BackupCommands::Import {
            filename,
            connection,
        } => {
            let context = settings.context(backup_dir);
            let mut import = context.import();

            if let Some(name) = connection {
                import.set_connection(&name)?;
            }

            let filename = resolve_import_name(backup_dir, filename)?;
            import.set_filename(&filename)?;

            let path = import.import()?;
            println!("Backup imported: {}", path.display());
        }

        BackupCommands::Index { json } => {
            let backups = list_backups(backup_dir)?;

            if json {
                println!("{}", serde_json::to_string_pretty(&backups)?);
            } else {
                print!("{}", format_backup_table(&backups));
            }
        }

        BackupCommands::Rotate { keep } => {
            let keep = parse_retention(&keep)?;

            match rotate(keep, backup_dir) {
                Ok(deleted) => print_deleted(&deleted),
                Err(err) => {
                    print_deleted_before_failure(&err);
                    return Err(err);
                }
            }
        }

        BackupCommands::Delete { filename } => {
            let path = delete(&filename, backup_dir)?;
            println!("The file {} has been deleted", path.display());
        }
    }

    Ok(())
}

/// Map `latest` to the newest file in the backup directory
fn resolve_import_name(backup_dir: &Path, filename: String) -> BackupResult<String> {
    if !filename.eq_ignore_ascii_case("latest") {
        return Ok(filename);
    }

    latest_backup(backup_dir)?
        .map(|b| b.filename)
        .ok_or_else(|| BackupError::NoBackups(backup_dir.to_path_buf()))
}

fn print_deleted(deleted: &[String]) {
    if deleted.is_empty() {
        println!("No file has been deleted");
        return;
    }

    for filename in deleted {
        println!("The file {} has been deleted", filename);
    }
    println!("Deleted backup files: {}", deleted.len());
}

fn print_deleted_before_failure(err: &BackupError) {
    for filename in err.deleted_before_failure() {
        println!("The file {} has been deleted", filename);
    }
}

//! MySQL backup lifecycle
//!
//! Exports databases to (optionally compressed) dump files, restores them,
//! lists what is in the backup directory and prunes old files.
//!
//! # Architecture
//!
//! - `filename`: turns a requested name into a validated target or source
//! - `index`: scans the backup directory, newest first
//! - `rotation`: keeps the newest N files and deletes the rest
//! - `export` / `import`: one-shot sessions built from a `BackupContext`
//! - `pipeline`: runs `dump | compress > file` style process chains
//!
//! Credentials never appear on a command line; they are written to a
//! short-lived option file that the MySQL client tools read.
//!
//! # Example
//!
//! ```rust,ignore
//! use dbbackup::backup::{BackupContext, PathLocator};
//! use dbbackup::models::CompressionKind;
//!
//! let context = BackupContext::new("/var/backups/mysql", connections, PathLocator::new());
//!
//! let mut export = context.export();
//! export.set_compression(CompressionKind::Gzip);
//! export.set_rotation(7);
//! let outcome = export.export()?;
//! ```

pub mod access;
pub mod context;
pub mod credentials;
pub mod export;
pub mod filename;
pub mod import;
pub mod index;
pub mod pipeline;
pub mod rotation;
pub mod tools;

#[cfg(all(test, unix))]
pub(crate) mod test_support;

pub use context::{BackupContext, DEFAULT_CONNECTION, DEFAULT_FILE_MODE};
pub use export::{BackupExport, ExportOutcome};
pub use filename::{resolve_export_target, resolve_import_source, ResolvedBackup};
pub use import::BackupImport;
pub use index::{latest_backup, list_backups};
pub use rotation::{delete, parse_retention, rotate};
pub use tools::{PathLocator, Tool, ToolLocator};

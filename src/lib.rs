//! dbbackup - MySQL backup lifecycle from the command line
//!
//! Exports databases through `mysqldump`, optionally compressed with gzip
//! or bzip2, restores them with `mysql`, and keeps the backup directory in
//! check with listing, deletion and count-based rotation.
//!
//! # Architecture
//!
//! The crate is organized into the following modules:
//!
//! - `config`: Home directory and settings file (named connections, defaults)
//! - `error`: Custom error types
//! - `models`: Compression registry, connection parameters, backup records
//! - `backup`: Filename resolution, index, rotation, export and import
//! - `cli` / `display`: Command handlers and terminal output
//! - `logging`: tracing subscriber setup
//!
//! # Example
//!
//! ```rust,ignore
//! use dbbackup::config::{BackupPaths, Settings};
//!
//! let paths = BackupPaths::new()?;
//! let settings = Settings::load_or_create(&paths)?;
//! let context = settings.context(settings.backup_dir(&paths, None));
//! let outcome = context.export().export()?;
//! ```

pub mod backup;
pub mod cli;
pub mod config;
pub mod display;
pub mod error;
pub mod logging;
pub mod models;

pub use error::{BackupError, BackupResult};

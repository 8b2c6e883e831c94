//! CLI command handlers
//!
//! Bridges the clap argument parsing with the backup library.

pub mod backup;

pub use backup::{handle_backup_command, BackupCommands};

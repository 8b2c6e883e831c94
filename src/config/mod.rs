//! Configuration module for dbbackup
//!
//! Home directory resolution and the JSON settings file holding named
//! connections and export defaults.

pub mod paths;
pub mod settings;

pub use paths::BackupPaths;
pub use settings::{BinarySettings, Settings};

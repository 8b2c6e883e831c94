//! Filesystem access checks
//!
//! Advisory only: the answer can change between the check and the
//! operation that relies on it.

use std::path::Path;

/// Whether the current process may write to `path`
#[cfg(unix)]
pub fn is_writable(path: &Path) -> bool {
    nix::unistd::access(path, nix::unistd::AccessFlags::W_OK).is_ok()
}

/// Whether the current process may read `path`
#[cfg(unix)]
pub fn is_readable(path: &Path) -> bool {
    nix::unistd::access(path, nix::unistd::AccessFlags::R_OK).is_ok()
}

#[cfg(not(unix))]
pub fn is_writable(path: &Path) -> bool {
    std::fs::metadata(path)
        .map(|m| !m.permissions().readonly())
        .unwrap_or(false)
}

#[cfg(not(unix))]
pub fn is_readable(path: &Path) -> bool {
    std::fs::metadata(path).is_ok()
}

//! Connection parameters
//!
//! Host, user, password and database for one named connection. The
//! password is wrapped in [`SecretString`] so it is wiped on drop and never
//! shows up in `Debug` output or logs.

use std::fmt;
use std::ops::Deref;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use zeroize::{Zeroize, ZeroizeOnDrop};

/// A string that zeros its contents on drop
#[derive(Clone, Default, PartialEq, Eq, Zeroize, ZeroizeOnDrop)]
pub struct SecretString {
    inner: String,
}

impl SecretString {
    pub fn new(s: impl Into<String>) -> Self {
        Self { inner: s.into() }
    }

    /// Get the string contents
    pub fn expose(&self) -> &str {
        &self.inner
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}

impl fmt::Debug for SecretString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SecretString([REDACTED])")
    }
}

impl Deref for SecretString {
    type Target = str;

    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}

impl From<String> for SecretString {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

impl From<&str> for SecretString {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl Serialize for SecretString {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.inner)
    }
}

impl<'de> Deserialize<'de> for SecretString {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        String::deserialize(deserializer).map(Self::new)
    }
}

/// Parameters of a database connection, immutable once loaded into a session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionParams {
    /// Database server host
    #[serde(default = "default_host")]
    pub host: String,
    pub username: String,
    #[serde(default)]
    pub password: SecretString,
    /// Database (schema) name
    pub database: String,
}

fn default_host() -> String {
    "localhost".to_string()
}

impl ConnectionParams {
    pub fn new(
        host: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<SecretString>,
        database: impl Into<String>,
    ) -> Self {
        Self {
            host: host.into(),
            username: username.into(),
            password: password.into(),
            database: database.into(),
        }
    }
}

/// Looks up connection parameters by name
///
/// Returns `None` for unknown names; callers turn that into
/// `BackupError::InvalidConnection`.
pub trait ConnectionProvider {
    fn connection(&self, name: &str) -> Option<ConnectionParams>;
}

impl ConnectionProvider for std::collections::BTreeMap<String, ConnectionParams> {
    fn connection(&self, name: &str) -> Option<ConnectionParams> {
        self.get(name).cloned()
    }
}

impl ConnectionProvider for std::collections::HashMap<String, ConnectionParams> {
    fn connection(&self, name: &str) -> Option<ConnectionParams> {
        self.get(name).cloned()
    }
}

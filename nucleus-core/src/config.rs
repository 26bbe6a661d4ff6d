//! Store configuration.

use serde::{Deserialize, Serialize};

/// Settings for a [`Store`](crate::Store).
///
/// Missing fields fall back to their defaults when deserializing, so an
/// embedding application can keep a partial section in its own config file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Name attached to every log record the store emits.
    pub name: String,
}

impl StoreConfig {
    /// Configuration with the given store name.
    pub fn named(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            name: String::from("store"),
        }
    }
}

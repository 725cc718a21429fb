//! User preference access
//!
//! Preferences are read on every connection decision, never cached, so a
//! toggle takes effect on the next call.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{PoisonError, RwLock};

use tracing::{debug, warn};

/// Preference key enabling strict single-dialect negotiation
pub const STRICT_NEGOTIATION_KEY: &str = "strict_negotiation_enabled";

/// External preference store
pub trait PreferenceStore: Send + Sync {
    fn get_bool(&self, key: &str, default: bool) -> bool;
}

/// In-memory preferences, writable at runtime
#[derive(Debug, Default)]
pub struct MemoryPreferences {
    values: RwLock<HashMap<String, bool>>,
}

impl MemoryPreferences {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_bool(&self, key: &str, value: bool) {
        self.values
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.to_string(), value);
    }
}

impl PreferenceStore for MemoryPreferences {
    fn get_bool(&self, key: &str, default: bool) -> bool {
        self.values
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .copied()
            .unwrap_or(default)
    }
}

/// Preferences persisted as a flat TOML table, re-read on every lookup
///
/// A missing file, unreadable file or missing key yields the default.
#[derive(Debug, Clone)]
pub struct TomlPreferences {
    path: PathBuf,
}

impl TomlPreferences {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_table(&self) -> Option<toml::Table> {
        let contents = match std::fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(e) => {
                debug!(path = %self.path.display(), error = %e, "Preference file not readable");
                return None;
            }
        };
        match toml::from_str::<toml::Table>(&contents) {
            Ok(table) => Some(table),
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "Preference file is not valid TOML");
                None
            }
        }
    }
}

impl PreferenceStore for TomlPreferences {
    fn get_bool(&self, key: &str, default: bool) -> bool {
        self.read_table()
            .and_then(|table| table.get(key).and_then(|v| v.as_bool()))
            .unwrap_or(default)
    }
}

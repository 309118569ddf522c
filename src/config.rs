//! Device configuration.
//!
//! Every struct has a `Default` matching the shipped device constants and can
//! be overridden piecemeal from a JSON file.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Largest accepted note body, in bytes.
pub const DEFAULT_MAX_NOTE_BYTES: usize = 4096;

/// Largest accepted note title, in bytes.
pub const DEFAULT_MAX_TITLE_BYTES: usize = 128;

/// Grace period after the operator leaves before the session is torn down.
pub const DEFAULT_GRACE_PERIOD_MS: u64 = 15_000;

/// Note store configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct NoteStoreConfig {
    /// Root of the storage medium.
    pub path: PathBuf,

    /// Body size ceiling in bytes.
    pub max_note_bytes: usize,

    /// Title size ceiling in bytes.
    pub max_title_bytes: usize,

    /// Maximum number of notes; zero means unlimited.
    pub max_note_count: u64,

    /// Whether to create the store if it doesn't exist.
    pub create_if_missing: bool,
}

impl Default for NoteStoreConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("./storage"),
            max_note_bytes: DEFAULT_MAX_NOTE_BYTES,
            max_title_bytes: DEFAULT_MAX_TITLE_BYTES,
            max_note_count: 0,
            create_if_missing: true,
        }
    }
}

/// Presence lifecycle configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct LifecycleConfig {
    pub grace_period_ms: u64,
}

impl LifecycleConfig {
    pub fn grace_period(&self) -> Duration {
        Duration::from_millis(self.grace_period_ms)
    }
}

impl Default for LifecycleConfig {
    fn default() -> Self {
        Self {
            grace_period_ms: DEFAULT_GRACE_PERIOD_MS,
        }
    }
}

/// Top-level device configuration.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DeviceConfig {
    pub storage: NoteStoreConfig,
    pub lifecycle: LifecycleConfig,
}

impl DeviceConfig {
    /// Load from a JSON file. Missing fields keep their defaults.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = fs::read(path)?;
        let config: DeviceConfig = serde_json::from_slice(&raw)
            .map_err(|e| Error::Config(format!("{}: {}", path.display(), e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Reject limits that would make the device unusable.
    pub fn validate(&self) -> Result<()> {
        if self.storage.max_note_bytes == 0 {
            return Err(Error::Config("max_note_bytes must be positive".into()));
        }
        if self.storage.max_title_bytes == 0 {
            return Err(Error::Config("max_title_bytes must be positive".into()));
        }
        if self.lifecycle.grace_period_ms == 0 {
            return Err(Error::Config("grace_period_ms must be positive".into()));
        }
        Ok(())
    }
}

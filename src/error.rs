//! Error types for the note store and presence lifecycle.

use crate::types::NoteId;
use thiserror::Error;

/// Main error type for device operations.
#[derive(Debug, Error)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Note limit reached ({limit} notes)")]
    ResourceExhausted { limit: u64 },

    #[error("Note not found: {0}")]
    NotFound(NoteId),

    #[error("Partial write for note {id}: {source}")]
    PartialWrite {
        id: NoteId,
        #[source]
        source: std::io::Error,
    },

    #[error("Corrupt note {id}: {reason}")]
    Corrupt { id: NoteId, reason: String },

    #[error("Counter could not be persisted: {0}")]
    CounterPersist(String),

    #[error("High-power session failed to start: {0}")]
    SessionBringup(String),

    #[error("High-power session failed to stop: {0}")]
    SessionTeardown(String),

    #[error("Lifecycle runtime has stopped")]
    RuntimeStopped,

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Deserialization error: {0}")]
    Deserialization(String),

    #[error("Invalid storage format: {0}")]
    InvalidFormat(String),

    #[error("Checksum mismatch: expected {expected}, got {got}")]
    ChecksumMismatch { expected: u32, got: u32 },

    #[error("Storage is locked by another process")]
    Locked,

    #[error("Storage not initialized")]
    NotInitialized,

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Fatal: {0}")]
    Fatal(String),
}

impl Error {
    /// True for the errors a record API should answer with "not found".
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::NotFound(_) | Error::Corrupt { .. })
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}

impl From<rmp_serde::encode::Error> for Error {
    fn from(e: rmp_serde::encode::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}

impl From<rmp_serde::decode::Error> for Error {
    fn from(e: rmp_serde::decode::Error) -> Self {
        Error::Deserialization(e.to_string())
    }
}

/// Result type for device operations.
pub type Result<T> = std::result::Result<T, Error>;

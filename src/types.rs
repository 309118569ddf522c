//! Core types for the note store and presence lifecycle.

use crate::error::Error;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::{SystemTime, UNIX_EPOCH};

/// Number of hex digits in a rendered note id.
pub const NOTE_ID_WIDTH: usize = 8;

/// Identifier of a note, drawn from the durable counter.
///
/// Rendered as 8 zero-padded lowercase hex digits, which is also the form
/// used to name the note's records on disk.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct NoteId(pub u32);

impl NoteId {
    /// Convert to the fixed-width hex form.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0.to_be_bytes())
    }
}

impl fmt::Debug for NoteId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NoteId({})", self.to_hex())
    }
}

impl fmt::Display for NoteId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl FromStr for NoteId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.len() != NOTE_ID_WIDTH {
            return Err(Error::Validation(format!(
                "note id must be {} hex digits, got {:?}",
                NOTE_ID_WIDTH, s
            )));
        }
        let mut bytes = [0u8; 4];
        hex::decode_to_slice(s, &mut bytes)
            .map_err(|e| Error::Validation(format!("invalid note id {:?}: {}", s, e)))?;
        Ok(NoteId(u32::from_be_bytes(bytes)))
    }
}

impl TryFrom<String> for NoteId {
    type Error = Error;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<NoteId> for String {
    fn from(id: NoteId) -> Self {
        id.to_hex()
    }
}

/// Seconds since Unix epoch.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Timestamp(pub u64);

impl Timestamp {
    /// Current wall-clock time. A clock set before the epoch reads as zero.
    pub fn now() -> Self {
        let secs = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or_default();
        Timestamp(secs)
    }
}

impl fmt::Debug for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Timestamp({})", self.0)
    }
}

/// Metadata half of a note, persisted as JSON.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NoteMetadata {
    pub id: NoteId,

    /// Public title, never empty, bounded by the configured title limit.
    pub title: String,

    /// When the note was created.
    pub timestamp: Timestamp,

    /// Informational flag set by the client; the store never inspects it.
    pub encrypted: bool,
}

/// A complete note: metadata plus the opaque body bytes.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Note {
    pub metadata: NoteMetadata,
    pub body: Vec<u8>,
}

impl Note {
    pub fn id(&self) -> NoteId {
        self.metadata.id
    }
}

/// Store statistics.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreStats {
    /// Number of metadata records on disk.
    pub count: u64,

    /// Capacity of the storage medium in bytes.
    pub total: u64,

    /// Bytes in use on the storage medium.
    pub used: u64,
}

/// Whether a trusted operator is currently in range.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum PresenceState {
    Present,
    #[default]
    Absent,
}

/// Whether the high-power session is up.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionState {
    Active,
    #[default]
    Inactive,
}

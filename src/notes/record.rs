//! On-disk naming and encoding of note records.

use crate::error::{Error, Result};
use crate::types::{NoteId, NoteMetadata, NOTE_ID_WIDTH};
use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

const RECORD_PREFIX: &str = "note_";
const META_SUFFIX: &str = ".meta";
const BODY_SUFFIX: &str = ".body";

/// Paths of the two records making up one note.
#[derive(Clone, Debug)]
pub(crate) struct RecordPaths {
    pub meta: PathBuf,
    pub body: PathBuf,
}

impl RecordPaths {
    pub fn new(dir: &Path, id: NoteId) -> Self {
        Self {
            meta: dir.join(format!("{}{}{}", RECORD_PREFIX, id, META_SUFFIX)),
            body: dir.join(format!("{}{}{}", RECORD_PREFIX, id, BODY_SUFFIX)),
        }
    }
}

/// Extract the note id from a metadata record's file name.
///
/// Only canonical names (`note_<8 lowercase hex>.meta`) match; temp files
/// and anything else in the directory are ignored.
pub(crate) fn parse_meta_file_name(name: &str) -> Option<NoteId> {
    let hex = name.strip_prefix(RECORD_PREFIX)?.strip_suffix(META_SUFFIX)?;
    if hex.len() != NOTE_ID_WIDTH || hex.bytes().any(|b| b.is_ascii_uppercase()) {
        return None;
    }
    hex.parse().ok()
}

/// Write the metadata record, replacing anything already at `path`.
pub(crate) fn write_metadata(path: &Path, metadata: &NoteMetadata) -> io::Result<()> {
    let json = serde_json::to_vec(metadata)?;
    write_synced(path, &json)
}

/// Write the content record verbatim.
pub(crate) fn write_body(path: &Path, body: &[u8]) -> io::Result<()> {
    write_synced(path, body)
}

fn write_synced(path: &Path, contents: &[u8]) -> io::Result<()> {
    let mut file = File::create(path)?;
    file.write_all(contents)?;
    file.sync_all()
}

/// Load and check a metadata record.
///
/// Returns `Ok(None)` if the record does not exist, and `Corrupt` if it does
/// not parse or names a different note than its file.
pub(crate) fn read_metadata(path: &Path, id: NoteId) -> Result<Option<NoteMetadata>> {
    let raw = match fs::read(path) {
        Ok(raw) => raw,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e.into()),
    };

    let metadata: NoteMetadata = serde_json::from_slice(&raw).map_err(|e| Error::Corrupt {
        id,
        reason: e.to_string(),
    })?;

    if metadata.id != id {
        return Err(Error::Corrupt {
            id,
            reason: format!("metadata names note {}", metadata.id),
        });
    }

    Ok(Some(metadata))
}

/// Load the content record, or `None` if it is missing.
pub(crate) fn read_body(path: &Path) -> Result<Option<Vec<u8>>> {
    if !path.is_file() {
        return Ok(None);
    }
    match fs::read(path) {
        Ok(body) => Ok(Some(body)),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// Remove a record; a record that is already gone is not an error.
pub(crate) fn remove_record(path: &Path) -> io::Result<()> {
    match fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e),
    }
}

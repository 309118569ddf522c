//! Namespace file implementation.

use crate::error::{Error, Result};
use std::collections::BTreeMap;
use std::fs::{self, File, OpenOptions};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

/// Magic bytes for namespace files.
const NAMESPACE_MAGIC: &[u8; 4] = b"KVN\0";

/// Current namespace format version.
const NAMESPACE_VERSION: u8 = 1;

/// Magic, version and length header plus the trailing checksum.
const FRAME_OVERHEAD: u64 = 4 + 1 + 8 + 4;

/// Extension for namespace files.
const NAMESPACE_EXT: &str = "kv";

/// A named set of integer entries persisted as a single file.
///
/// Changes made with [`Namespace::set`] are held in memory until
/// [`Namespace::commit`] replaces the file on disk.
pub struct Namespace {
    /// Namespace name (also the file stem).
    name: String,

    /// Path to the namespace file.
    path: PathBuf,

    /// Current entries.
    entries: BTreeMap<String, u64>,
}

impl Namespace {
    /// Open the namespace `name` inside `dir`, creating the directory if needed.
    ///
    /// A namespace that has never been committed opens empty.
    pub fn open(dir: impl AsRef<Path>, name: &str) -> Result<Self> {
        let dir = dir.as_ref();
        fs::create_dir_all(dir)?;
        let path = dir.join(format!("{}.{}", name, NAMESPACE_EXT));

        let entries = if path.exists() {
            Self::load_from_file(&path)?
        } else {
            BTreeMap::new()
        };

        Ok(Self {
            name: name.to_string(),
            path,
            entries,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn get(&self, key: &str) -> Option<u64> {
        self.entries.get(key).copied()
    }

    /// Set a value in memory. Not durable until [`Namespace::commit`].
    pub fn set(&mut self, key: &str, value: u64) {
        self.entries.insert(key.to_string(), value);
    }

    /// Durably replace the namespace file with the in-memory entries.
    ///
    /// The new contents go to a temp file which is synced and then renamed
    /// over the old one, so a crash leaves either the old or the new file.
    pub fn commit(&self) -> Result<()> {
        let encoded = rmp_serde::to_vec(&self.entries)?;
        let checksum = crc32fast::hash(&encoded);

        let temp_path = self.path.with_extension(format!("{}.tmp", NAMESPACE_EXT));
        let mut file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(&temp_path)?;

        file.write_all(NAMESPACE_MAGIC)?;
        file.write_all(&[NAMESPACE_VERSION])?;
        file.write_all(&(encoded.len() as u64).to_le_bytes())?;
        file.write_all(&encoded)?;
        file.write_all(&checksum.to_le_bytes())?;
        file.sync_all()?;
        drop(file);

        fs::rename(&temp_path, &self.path)?;

        // Persist the rename itself.
        if let Some(parent) = self.path.parent() {
            File::open(parent)?.sync_all()?;
        }

        Ok(())
    }

    fn load_from_file(path: &Path) -> Result<BTreeMap<String, u64>> {
        let mut file = File::open(path)?;

        let mut magic = [0u8; 4];
        file.read_exact(&mut magic)?;
        if &magic != NAMESPACE_MAGIC {
            return Err(Error::InvalidFormat("Invalid namespace magic".into()));
        }

        let mut version = [0u8; 1];
        file.read_exact(&mut version)?;
        if version[0] != NAMESPACE_VERSION {
            return Err(Error::InvalidFormat(format!(
                "Unsupported namespace version: {}",
                version[0]
            )));
        }

        let mut len_bytes = [0u8; 8];
        file.read_exact(&mut len_bytes)?;
        let len = u64::from_le_bytes(len_bytes);

        let file_len = file.metadata()?.len();
        if len != file_len.saturating_sub(FRAME_OVERHEAD) {
            return Err(Error::InvalidFormat(format!(
                "Namespace length {} does not match file size {}",
                len, file_len
            )));
        }

        let mut encoded = vec![0u8; len as usize];
        file.read_exact(&mut encoded)?;

        let mut checksum_bytes = [0u8; 4];
        file.read_exact(&mut checksum_bytes)?;
        let stored_checksum = u32::from_le_bytes(checksum_bytes);
        let computed_checksum = crc32fast::hash(&encoded);
        if stored_checksum != computed_checksum {
            return Err(Error::ChecksumMismatch {
                expected: stored_checksum,
                got: computed_checksum,
            });
        }

        Ok(rmp_serde::from_slice(&encoded)?)
    }
}

//! Note store implementation.

use super::record::{self, RecordPaths};
use crate::config::NoteStoreConfig;
use crate::error::{Error, Result};
use crate::kv::{DurableCounter, Namespace};
use crate::types::{Note, NoteId, NoteMetadata, StoreStats, Timestamp};
use fs2::FileExt;
use parking_lot::Mutex;
use std::fs::{self, File};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Listing cap used by the record API when the caller gives none.
pub const DEFAULT_LIST_LIMIT: usize = 10;

/// Magic bytes for the store manifest.
const STORE_MAGIC: &[u8; 4] = b"DDS\0";

/// Current store format version.
const STORE_VERSION: u8 = 1;

const NOTES_DIR: &str = "notes";
const KV_DIR: &str = "kv";
const COUNTER_NAMESPACE: &str = "storage";
const COUNTER_KEY: &str = "note_counter";

/// Durable note storage with monotonic, never-reused ids.
///
/// Creation is serialized by an internal writer lock; reads, listings,
/// deletes and stats run without it and tolerate notes appearing or
/// disappearing while they scan.
pub struct NoteStore {
    /// Store configuration.
    config: NoteStoreConfig,

    /// Lock file for exclusive access.
    _lock_file: File,

    /// Directory holding the note records.
    notes_dir: PathBuf,

    /// Source of note ids.
    counter: DurableCounter,

    /// Single-writer lock around the whole create path.
    write_lock: Mutex<()>,
}

impl NoteStore {
    /// Open an existing store or create a new one.
    pub fn open_or_create(config: NoteStoreConfig) -> Result<Self> {
        if config.path.join("MANIFEST").exists() {
            Self::open(config)
        } else if config.create_if_missing {
            Self::create(config)
        } else {
            Err(Error::NotInitialized)
        }
    }

    /// Create a new store.
    pub fn create(config: NoteStoreConfig) -> Result<Self> {
        fs::create_dir_all(config.path.join(NOTES_DIR))?;
        fs::create_dir_all(config.path.join(KV_DIR))?;

        let lock_file = Self::acquire_lock(&config.path)?;
        Self::write_manifest(&config.path)?;

        Self::init(config, lock_file)
    }

    /// Open an existing store.
    pub fn open(config: NoteStoreConfig) -> Result<Self> {
        Self::verify_manifest(&config.path)?;
        fs::create_dir_all(config.path.join(NOTES_DIR))?;

        let lock_file = Self::acquire_lock(&config.path)?;
        Self::init(config, lock_file)
    }

    fn init(config: NoteStoreConfig, lock_file: File) -> Result<Self> {
        let namespace = Namespace::open(config.path.join(KV_DIR), COUNTER_NAMESPACE)?;
        let counter = DurableCounter::open(namespace, COUNTER_KEY);
        let notes_dir = config.path.join(NOTES_DIR);

        info!(
            path = %config.path.display(),
            last_id = counter.current(),
            "Note store opened"
        );

        Ok(Self {
            config,
            _lock_file: lock_file,
            notes_dir,
            counter,
            write_lock: Mutex::new(()),
        })
    }

    // --- Note Operations ---

    /// Create a note and return its id.
    ///
    /// Input is validated before anything is touched. The metadata record is
    /// written before the content record; if the content write fails the
    /// metadata is left behind and `PartialWrite` is returned, and the note
    /// stays invisible to `list` and `read`.
    pub fn create_note(&self, title: &str, body: &[u8], encrypted: bool) -> Result<NoteId> {
        self.validate(title, body)?;

        let _lock = self.write_lock.lock();

        let limit = self.config.max_note_count;
        if limit > 0 && self.count_metadata_records()? >= limit {
            warn!(limit, "Maximum note count reached");
            return Err(Error::ResourceExhausted { limit });
        }

        let value = self.counter.next()?;
        let id = NoteId(u32::try_from(value).map_err(|_| Error::ResourceExhausted {
            limit: u64::from(u32::MAX),
        })?);

        let metadata = NoteMetadata {
            id,
            title: title.to_string(),
            timestamp: Timestamp::now(),
            encrypted,
        };
        let paths = RecordPaths::new(&self.notes_dir, id);

        record::write_metadata(&paths.meta, &metadata)?;

        if let Err(source) = record::write_body(&paths.body, body) {
            warn!(%id, error = %source, "Content record write failed; note left partial");
            return Err(Error::PartialWrite { id, source });
        }

        info!(%id, bytes = body.len(), encrypted, "Created note");
        Ok(id)
    }

    /// List up to `limit` complete notes, in directory order.
    ///
    /// Entries that fail to parse or lack their content record are skipped.
    pub fn list_notes(&self, limit: usize) -> Result<Vec<NoteMetadata>> {
        let mut notes = Vec::new();

        for entry in fs::read_dir(&self.notes_dir)? {
            if notes.len() >= limit {
                break;
            }

            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    warn!(error = %e, "Skipping unreadable directory entry");
                    continue;
                }
            };
            let Some(id) = record::parse_meta_file_name(&entry.file_name().to_string_lossy())
            else {
                continue;
            };

            let paths = RecordPaths::new(&self.notes_dir, id);
            match record::read_metadata(&paths.meta, id) {
                Ok(Some(metadata)) if paths.body.is_file() => notes.push(metadata),
                Ok(Some(_)) => warn!(%id, "Skipping note without content record"),
                Ok(None) => debug!(%id, "Note vanished during scan"),
                Err(e) => warn!(%id, error = %e, "Skipping unreadable note"),
            }
        }

        debug!(count = notes.len(), "Listed notes");
        Ok(notes)
    }

    /// Read a complete note.
    pub fn read_note(&self, id: NoteId) -> Result<Note> {
        let paths = RecordPaths::new(&self.notes_dir, id);

        let metadata = record::read_metadata(&paths.meta, id)?.ok_or(Error::NotFound(id))?;
        let body = record::read_body(&paths.body)?.ok_or_else(|| {
            warn!(%id, "Metadata present but content record missing");
            Error::NotFound(id)
        })?;

        Ok(Note { metadata, body })
    }

    /// Delete a note. Deleting a missing or partial note succeeds.
    pub fn delete_note(&self, id: NoteId) -> Result<()> {
        let paths = RecordPaths::new(&self.notes_dir, id);

        record::remove_record(&paths.meta)?;
        record::remove_record(&paths.body)?;

        info!(%id, "Deleted note");
        Ok(())
    }

    /// Note count plus capacity figures reported by the storage medium.
    pub fn stats(&self) -> Result<StoreStats> {
        let total = fs2::total_space(&self.notes_dir)?;
        let free = fs2::free_space(&self.notes_dir)?;

        Ok(StoreStats {
            count: self.count_metadata_records()?,
            total,
            used: total.saturating_sub(free),
        })
    }

    /// Last id handed out (zero if none).
    pub fn last_id(&self) -> u64 {
        self.counter.current()
    }

    /// Get the store path.
    pub fn path(&self) -> &Path {
        &self.config.path
    }

    pub fn config(&self) -> &NoteStoreConfig {
        &self.config
    }

    // --- Internal ---

    fn validate(&self, title: &str, body: &[u8]) -> Result<()> {
        if title.is_empty() {
            return Err(Error::Validation("title must not be empty".into()));
        }
        if title.len() > self.config.max_title_bytes {
            return Err(Error::Validation(format!(
                "title is {} bytes (limit {})",
                title.len(),
                self.config.max_title_bytes
            )));
        }
        if body.len() > self.config.max_note_bytes {
            return Err(Error::Validation(format!(
                "body is {} bytes (limit {})",
                body.len(),
                self.config.max_note_bytes
            )));
        }
        Ok(())
    }

    /// Count metadata records without parsing them.
    fn count_metadata_records(&self) -> Result<u64> {
        let mut count = 0u64;
        for entry in fs::read_dir(&self.notes_dir)? {
            let Ok(entry) = entry else { continue };
            if record::parse_meta_file_name(&entry.file_name().to_string_lossy()).is_some() {
                count += 1;
            }
        }
        Ok(count)
    }

    fn write_manifest(path: &Path) -> Result<()> {
        let manifest_path = path.join("MANIFEST");
        let mut file = File::create(manifest_path)?;

        file.write_all(STORE_MAGIC)?;
        file.write_all(&[STORE_VERSION])?;
        file.sync_all()?;

        Ok(())
    }

    fn verify_manifest(path: &Path) -> Result<()> {
        let manifest_path = path.join("MANIFEST");
        let mut file = match File::open(manifest_path) {
            Ok(file) => file,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(Error::NotInitialized)
            }
            Err(e) => return Err(e.into()),
        };

        let mut magic = [0u8; 4];
        file.read_exact(&mut magic)?;
        if &magic != STORE_MAGIC {
            return Err(Error::InvalidFormat("Invalid store magic".into()));
        }

        let mut version = [0u8; 1];
        file.read_exact(&mut version)?;
        if version[0] != STORE_VERSION {
            return Err(Error::InvalidFormat(format!(
                "Unsupported store version: {}",
                version[0]
            )));
        }

        Ok(())
    }

    fn acquire_lock(path: &Path) -> Result<File> {
        let lock_path = path.join("LOCK");
        let lock_file = File::create(lock_path)?;

        lock_file.try_lock_exclusive().map_err(|_| Error::Locked)?;

        Ok(lock_file)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn test_store(dir: &TempDir) -> NoteStore {
        NoteStore::create(NoteStoreConfig {
            path: dir.path().join("storage"),
            ..Default::default()
        })
        .unwrap()
    }

    #[test]
    fn test_create_writes_both_records() {
        let dir = TempDir::new().unwrap();
        let store = test_store(&dir);

        let id = store.create_note("Test", b"hello", false).unwrap();
        assert_eq!(id.to_string(), "00000001");

        let notes = dir.path().join("storage").join(NOTES_DIR);
        assert!(notes.join("note_00000001.meta").is_file());
        assert_eq!(fs::read(notes.join("note_00000001.body")).unwrap(), b"hello");
    }

    #[test]
    fn test_body_is_opaque_bytes() {
        let dir = TempDir::new().unwrap();
        let store = test_store(&dir);

        let body = [0u8, 159, 146, 150, 0, 0, 255];
        let id = store.create_note("binary", &body, true).unwrap();

        let note = store.read_note(id).unwrap();
        assert_eq!(note.body, body);
        assert!(note.metadata.encrypted);
    }

    #[test]
    fn test_validation_happens_before_counter() {
        let dir = TempDir::new().unwrap();
        let store = test_store(&dir);

        assert!(matches!(
            store.create_note("", b"x", false),
            Err(Error::Validation(_))
        ));
        assert!(matches!(
            store.create_note(&"t".repeat(129), b"x", false),
            Err(Error::Validation(_))
        ));
        assert_eq!(store.last_id(), 0);

        // Limits are inclusive.
        store.create_note(&"t".repeat(128), &[7u8; 4096], false).unwrap();
        assert_eq!(store.last_id(), 1);
    }

    #[test]
    fn test_title_limit_counts_bytes_not_chars() {
        let dir = TempDir::new().unwrap();
        let store = test_store(&dir);

        // 43 three-byte characters = 129 bytes.
        let title = "\u{20ac}".repeat(43);
        assert!(matches!(
            store.create_note(&title, b"x", false),
            Err(Error::Validation(_))
        ));
    }

    #[test]
    fn test_list_ignores_foreign_files() {
        let dir = TempDir::new().unwrap();
        let store = test_store(&dir);
        store.create_note("one", b"1", false).unwrap();

        let notes = dir.path().join("storage").join(NOTES_DIR);
        fs::write(notes.join("README"), b"hi").unwrap();
        fs::write(notes.join("note_xyz.meta"), b"{}").unwrap();

        let listed = store.list_notes(DEFAULT_LIST_LIMIT).unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(store.stats().unwrap().count, 1);
    }

    #[test]
    fn test_second_handle_is_locked_out() {
        let dir = TempDir::new().unwrap();
        let _store = test_store(&dir);

        let result = NoteStore::open(NoteStoreConfig {
            path: dir.path().join("storage"),
            ..Default::default()
        });
        assert!(matches!(result, Err(Error::Locked)));
    }

    #[test]
    fn test_create_on_held_store_leaves_manifest_alone() {
        let dir = TempDir::new().unwrap();
        let _store = test_store(&dir);

        let manifest = dir.path().join("storage").join("MANIFEST");
        fs::write(&manifest, b"held").unwrap();

        let result = NoteStore::create(NoteStoreConfig {
            path: dir.path().join("storage"),
            ..Default::default()
        });
        assert!(matches!(result, Err(Error::Locked)));
        assert_eq!(fs::read(&manifest).unwrap(), b"held");
    }

    #[test]
    fn test_open_missing_store() {
        let dir = TempDir::new().unwrap();
        let result = NoteStore::open_or_create(NoteStoreConfig {
            path: dir.path().join("nothing-here"),
            create_if_missing: false,
            ..Default::default()
        });
        assert!(matches!(result, Err(Error::NotInitialized)));
    }
}

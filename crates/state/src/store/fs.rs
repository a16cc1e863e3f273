//! Filesystem-backed history store.
//!
//! Entries live under `<base>/<session>/<shard>/<digest>.history`, where
//! the shard is the first byte of the key's SHA-256 digest. Each file is a
//! 4-byte magic, a format version, and a bincode-encoded entry; anything
//! that fails those checks degrades to "no history".

use super::atomic::write_atomic;
use super::HistoryStore;
use crate::history::OutputHistoryEntry;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::warn;
use uptodate_core::{Error, Result};

const STORE_MAGIC: [u8; 4] = *b"UTDH";
const STORE_VERSION: u32 = 1;

#[derive(Debug, Serialize, Deserialize)]
struct StoredEntry {
    version: u32,
    entry: OutputHistoryEntry,
}

/// History store persisting one file per output path, durable across
/// build invocations.
///
/// Opened explicitly per build session; there is no lazy initialization
/// on first access, so lifecycle and initialization order stay visible.
pub struct FsHistoryStore {
    root: PathBuf,
}

impl FsHistoryStore {
    /// Opens (creating if needed) the store for one named build session.
    pub fn open(base_dir: impl Into<PathBuf>, session: &str) -> Result<Self> {
        let root = base_dir.into().join(session);
        fs::create_dir_all(&root)
            .map_err(|e| Error::file_system(&root, "create store directory", e))?;
        Ok(Self { root })
    }

    fn entry_path(&self, key: &Path) -> PathBuf {
        let mut hasher = Sha256::new();
        hasher.update(key.to_string_lossy().as_bytes());
        let digest = hex::encode(hasher.finalize());
        let shard = &digest[..2];
        self.root.join(shard).join(format!("{digest}.history"))
    }
}

impl HistoryStore for FsHistoryStore {
    fn get(&self, key: &Path) -> Result<Option<OutputHistoryEntry>> {
        let path = self.entry_path(key);
        let bytes = match fs::read(&path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(Error::file_system(&path, "read history entry", e)),
        };

        if bytes.len() < STORE_MAGIC.len() || bytes[..STORE_MAGIC.len()] != STORE_MAGIC {
            warn!(key = %key.display(), "history entry has wrong magic; treating as no history");
            return Ok(None);
        }

        let stored: StoredEntry = match bincode::deserialize(&bytes[STORE_MAGIC.len()..]) {
            Ok(stored) => stored,
            Err(e) => {
                warn!(
                    key = %key.display(),
                    error = %e,
                    "malformed history entry; treating as no history"
                );
                return Ok(None);
            }
        };

        if stored.version != STORE_VERSION {
            warn!(
                key = %key.display(),
                version = stored.version,
                "history entry from other format version; treating as no history"
            );
            return Ok(None);
        }

        Ok(Some(stored.entry))
    }

    fn put(&self, key: &Path, entry: &OutputHistoryEntry) -> Result<()> {
        let stored = StoredEntry {
            version: STORE_VERSION,
            entry: entry.clone(),
        };
        let encoded = bincode::serialize(&stored)
            .map_err(|e| Error::serialization(key.to_string_lossy(), e.to_string()))?;

        let mut bytes = Vec::with_capacity(STORE_MAGIC.len() + encoded.len());
        bytes.extend_from_slice(&STORE_MAGIC);
        bytes.extend_from_slice(&encoded);

        write_atomic(&self.entry_path(key), &bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::history::ProducerRecord;
    use crate::observe::{FileKind, FileObservation};
    use crate::snapshot::OutputFileRecord;
    use tempfile::TempDir;
    use uptodate_core::TaskIdentity;

    fn sample_entry() -> OutputHistoryEntry {
        let mut entry = OutputHistoryEntry::default();
        entry.record_producer(
            &OutputFileRecord {
                observation: FileObservation {
                    kind: FileKind::File,
                    empty_dir: false,
                },
            },
            TaskIdentity::new("test.Task", ":sample"),
            ProducerRecord::ParticipatedToken,
        );
        entry
    }

    #[test]
    fn round_trips_an_entry() {
        let dir = TempDir::new().unwrap();
        let store = FsHistoryStore::open(dir.path(), "build-1").unwrap();
        let key = Path::new("/work/out.txt");

        store.put(key, &sample_entry()).unwrap();
        let loaded = store.get(key).unwrap().expect("entry present");

        assert_eq!(loaded.producer_count(), 1);
        assert!(loaded
            .producer(&TaskIdentity::new("test.Task", ":sample"))
            .is_some());
        assert_eq!(
            loaded.last_observed(),
            Some(FileObservation {
                kind: FileKind::File,
                empty_dir: false,
            })
        );
    }

    #[test]
    fn absent_key_is_none() {
        let dir = TempDir::new().unwrap();
        let store = FsHistoryStore::open(dir.path(), "build-1").unwrap();
        assert!(store.get(Path::new("/work/unknown")).unwrap().is_none());
    }

    #[test]
    fn sessions_are_isolated() {
        let dir = TempDir::new().unwrap();
        let first = FsHistoryStore::open(dir.path(), "build-1").unwrap();
        let second = FsHistoryStore::open(dir.path(), "build-2").unwrap();
        let key = Path::new("/work/out.txt");

        first.put(key, &sample_entry()).unwrap();

        assert!(first.get(key).unwrap().is_some());
        assert!(second.get(key).unwrap().is_none());
    }

    #[test]
    fn corrupt_entry_degrades_to_no_history() {
        let dir = TempDir::new().unwrap();
        let store = FsHistoryStore::open(dir.path(), "build-1").unwrap();
        let key = Path::new("/work/out.txt");

        store.put(key, &sample_entry()).unwrap();
        fs::write(store.entry_path(key), b"UTDHgarbage that is not bincode").unwrap();

        assert!(store.get(key).unwrap().is_none());
    }

    #[test]
    fn wrong_magic_degrades_to_no_history() {
        let dir = TempDir::new().unwrap();
        let store = FsHistoryStore::open(dir.path(), "build-1").unwrap();
        let key = Path::new("/work/out.txt");

        store.put(key, &sample_entry()).unwrap();
        fs::write(store.entry_path(key), b"NOPE").unwrap();

        assert!(store.get(key).unwrap().is_none());
    }
}

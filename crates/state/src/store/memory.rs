//! In-memory history store, for tests and single-invocation sessions.

use super::HistoryStore;
use crate::history::OutputHistoryEntry;
use dashmap::DashMap;
use std::path::{Path, PathBuf};
use uptodate_core::Result;

/// Non-durable [`HistoryStore`] backed by a concurrent map.
#[derive(Debug, Default)]
pub struct MemoryHistoryStore {
    entries: DashMap<PathBuf, OutputHistoryEntry>,
}

impl MemoryHistoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl HistoryStore for MemoryHistoryStore {
    fn get(&self, key: &Path) -> Result<Option<OutputHistoryEntry>> {
        Ok(self.entries.get(key).map(|entry| entry.clone()))
    }

    fn put(&self, key: &Path, entry: &OutputHistoryEntry) -> Result<()> {
        self.entries.insert(key.to_path_buf(), entry.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stores_and_overwrites_entries() {
        let store = MemoryHistoryStore::new();
        let key = Path::new("/work/out.txt");

        assert!(store.get(key).unwrap().is_none());

        store.put(key, &OutputHistoryEntry::default()).unwrap();
        assert!(store.get(key).unwrap().is_some());
    }
}

//! Durable keyed storage for output history entries.

mod atomic;
mod fs;
mod memory;

pub use fs::FsHistoryStore;
pub use memory::MemoryHistoryStore;

use crate::history::OutputHistoryEntry;
use std::path::Path;
use uptodate_core::Result;

/// A durable mapping from output path to its history entry, scoped to one
/// named build session.
///
/// The store makes no exclusive single-writer assumption; the repository
/// supplies its own per-path serialization on top.
pub trait HistoryStore: Send + Sync {
    /// Loads the entry recorded for `key`, if any.
    ///
    /// A malformed or unreadable-as-such entry is reported as absent, not
    /// as an error; the engine self-heals by overwriting it on the next
    /// commit.
    fn get(&self, key: &Path) -> Result<Option<OutputHistoryEntry>>;

    /// Durably records `entry` under `key`. The write is atomic per key:
    /// a crash leaves either the previous entry or the new one, never a
    /// torn mixture.
    fn put(&self, key: &Path, entry: &OutputHistoryEntry) -> Result<()>;
}

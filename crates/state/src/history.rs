//! Persisted per-output-path production history.

use crate::observe::{FileKind, FileObservation};
use crate::snapshot::{ExecutionSnapshot, OutputFileRecord};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use uptodate_core::{Result, TaskIdentity};

/// What one task execution left behind at one output path.
///
/// Exactly one output path of an execution carries the authoritative
/// [`ProducerRecord::FullSnapshot`]; the task's other output paths carry
/// [`ProducerRecord::ParticipatedToken`] so the snapshot is not stored
/// once per output file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ProducerRecord {
    /// Degenerate record for a producer that declared no output files.
    NoOutputs,
    /// Authoritative snapshot of the producing execution, the basis for
    /// the next up-to-date comparison.
    FullSnapshot(ExecutionSnapshot),
    /// The producer also wrote this path, but its snapshot lives under
    /// another of its output paths.
    ParticipatedToken,
}

/// The value persisted per output path: the state this engine itself wrote
/// at the last successful commit, and the task(s) recorded as producers.
///
/// Invariant: if the path's current on-disk state no longer matches
/// `last_observed`, the path was touched outside this engine's control and
/// no producer history for it can be trusted; all producers are discarded
/// as a unit.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OutputHistoryEntry {
    last_observed: Option<FileObservation>,
    producers: HashMap<TaskIdentity, ProducerRecord>,
}

impl OutputHistoryEntry {
    /// Clears all producer history when the path's on-disk state has
    /// diverged from what the last commit recorded. Returns whether the
    /// entry changed and must be re-persisted.
    pub fn discard_if_tampered(&mut self, path: &Path) -> Result<bool> {
        let Some(last_observed) = self.last_observed else {
            return Ok(false);
        };
        let current = FileObservation::probe(path)?;
        if last_observed.still_matches(&current) {
            return Ok(false);
        }
        self.producers.clear();
        Ok(true)
    }

    pub fn producer(&self, identity: &TaskIdentity) -> Option<&ProducerRecord> {
        self.producers.get(identity)
    }

    pub fn producer_count(&self) -> usize {
        self.producers.len()
    }

    pub fn last_observed(&self) -> Option<FileObservation> {
        self.last_observed
    }

    /// Records a producer after a successful execution.
    ///
    /// A FILE output has exactly one owner at a time, so its producer map
    /// is replaced wholesale. Directory (and missing) outputs may
    /// legitimately be shared by several tasks, so their producers merge.
    pub fn record_producer(
        &mut self,
        observed: &OutputFileRecord,
        identity: TaskIdentity,
        record: ProducerRecord,
    ) {
        self.last_observed = Some(observed.observation);
        if observed.observation.kind == FileKind::File {
            self.producers.clear();
        }
        self.producers.insert(identity, record);
    }

    /// Drops `identity`'s producer record. Returns whether the entry
    /// changed and must be re-persisted.
    pub fn remove_producer(&mut self, identity: &TaskIdentity) -> bool {
        self.producers.remove(identity).is_some()
    }
}

//! Decides whether a task's recorded effect is still valid.

use crate::hashing::ContentHasher;
use crate::history::{OutputHistoryEntry, ProducerRecord};
use crate::snapshot::ExecutionSnapshot;
use crate::store::HistoryStore;
use dashmap::DashMap;
use parking_lot::Mutex;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};
use uptodate_core::{BuildTask, Result, TaskIdentity};

/// Outcome of an up-to-date check, with display-ready reasons explaining
/// why the task must run. The reason list is empty iff the task is
/// up-to-date.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpToDateVerdict {
    reasons: Vec<String>,
}

impl UpToDateVerdict {
    pub fn is_up_to_date(&self) -> bool {
        self.reasons.is_empty()
    }

    pub fn reasons(&self) -> &[String] {
        &self.reasons
    }
}

/// What the persisted history knows about this task's previous execution.
enum PriorExecution {
    /// History lookups already produced out-of-date reasons; no comparison
    /// basis is reliable.
    Unreliable(Vec<String>),
    /// No full snapshot of a previous successful execution was found.
    None,
    /// The authoritative snapshot of the previous execution.
    Snapshot(ExecutionSnapshot),
}

/// Hands out [`TaskArtifactState`] handles, serializing access so each
/// output path's history entry sees linearizable read-modify-write cycles
/// even when tasks with no mutual dependency run in parallel.
pub struct TaskArtifactStateRepository {
    store: Arc<dyn HistoryStore>,
    hasher: Arc<dyn ContentHasher>,
    path_locks: DashMap<PathBuf, Arc<Mutex<()>>>,
}

impl TaskArtifactStateRepository {
    /// The store handle is acquired once here; there is no lazy opening on
    /// first access.
    pub fn new(store: Arc<dyn HistoryStore>, hasher: Arc<dyn ContentHasher>) -> Self {
        Self {
            store,
            hasher,
            path_locks: DashMap::new(),
        }
    }

    /// Captures the task's current state (hashing every declared input
    /// file now) and returns the handle for querying and recording it.
    pub fn get_state(&self, task: &dyn BuildTask) -> Result<TaskArtifactState<'_>> {
        let identity = task.identity();
        let this_execution = ExecutionSnapshot::capture(task, self.hasher.as_ref())?;
        Ok(TaskArtifactState {
            repository: self,
            identity,
            this_execution,
        })
    }

    /// One lock per output path; held for the duration of a single path's
    /// read-modify-write sequence.
    fn path_lock(&self, path: &Path) -> Arc<Mutex<()>> {
        self.path_locks
            .entry(path.to_path_buf())
            .or_default()
            .clone()
    }
}

/// Transient per-evaluation handle exposing the up-to-date query,
/// invalidation, and commit operations for one task.
pub struct TaskArtifactState<'a> {
    repository: &'a TaskArtifactStateRepository,
    identity: TaskIdentity,
    this_execution: ExecutionSnapshot,
}

impl TaskArtifactState<'_> {
    /// Whether the task can be skipped, with the ordered reasons it cannot.
    ///
    /// This check deliberately writes through the store: output paths with
    /// no history get an empty placeholder entry persisted for future
    /// reference, and entries whose recorded state has diverged from disk
    /// get their producer history discarded and persisted. Both writes are
    /// part of the contract, not incidental.
    pub fn is_up_to_date(&self) -> Result<UpToDateVerdict> {
        let reasons = match self.prior_execution()? {
            PriorExecution::Unreliable(messages) => messages,
            PriorExecution::None => vec![format!(
                "No prior execution is recorded for {}.",
                self.identity
            )],
            PriorExecution::Snapshot(last) => self.this_execution.changes_since(&last)?,
        };

        if reasons.is_empty() {
            info!(task = %self.identity, "skipping task as it is up-to-date");
        } else {
            info!(task = %self.identity, ?reasons, "task is out of date");
        }

        Ok(UpToDateVerdict { reasons })
    }

    /// Loads the prior execution snapshot from the history entries of the
    /// declared output paths, collecting out-of-date reasons along the way.
    fn prior_execution(&self) -> Result<PriorExecution> {
        let repository = self.repository;
        let mut messages = Vec::new();
        let mut candidate = None;

        for path in self.this_execution.output_paths() {
            let lock = repository.path_lock(path);
            let _guard = lock.lock();

            let Some(mut entry) = repository.store.get(path)? else {
                debug!(path = %path.display(), "no history; persisting placeholder entry");
                repository.store.put(path, &OutputHistoryEntry::default())?;
                messages.push(format!("No history is available for {}.", path.display()));
                continue;
            };

            if entry.discard_if_tampered(path)? {
                debug!(
                    path = %path.display(),
                    "output changed outside the build; producer history discarded"
                );
                repository.store.put(path, &entry)?;
            }

            match entry.producer(&self.identity) {
                None => {
                    messages.push(format!("Task did not produce {}.", path.display()));
                }
                Some(ProducerRecord::FullSnapshot(snapshot)) => {
                    // All outputs of one execution reference the same
                    // snapshot, directly or via tokens; at most one
                    // candidate shows up.
                    candidate = Some(snapshot.clone());
                }
                Some(ProducerRecord::ParticipatedToken) => {}
                Some(ProducerRecord::NoOutputs) => {}
            }
        }

        if !messages.is_empty() {
            return Ok(PriorExecution::Unreliable(messages));
        }
        match candidate {
            Some(snapshot) => Ok(PriorExecution::Snapshot(snapshot)),
            None => Ok(PriorExecution::None),
        }
    }

    /// Records the task's effect after its body has run.
    ///
    /// Re-observes every declared output, then updates each output path's
    /// history entry in stable order. The first path processed stores the
    /// authoritative snapshot; the task's remaining paths store the
    /// lightweight token. Each path's entry is persisted atomically, so an
    /// abort mid-commit applied some whole entries and no torn ones.
    pub fn commit(&mut self) -> Result<()> {
        self.this_execution.snapshot_outputs()?;

        let repository = self.repository;
        let mut record = ProducerRecord::FullSnapshot(self.this_execution.clone());

        for (path, observed) in self.this_execution.observed_outputs() {
            let lock = repository.path_lock(path);
            let _guard = lock.lock();

            let mut entry = repository.store.get(path)?.unwrap_or_default();
            entry.record_producer(observed, self.identity.clone(), record);
            repository.store.put(path, &entry)?;

            record = ProducerRecord::ParticipatedToken;
        }

        debug!(task = %self.identity, "recorded execution");
        Ok(())
    }

    /// Withdraws this task's producer records, used when the task is being
    /// dropped from consideration without a valid result this run.
    pub fn invalidate(&self) -> Result<()> {
        let repository = self.repository;

        for path in self.this_execution.output_paths() {
            let lock = repository.path_lock(path);
            let _guard = lock.lock();

            let Some(mut entry) = repository.store.get(path)? else {
                continue;
            };
            if entry.remove_producer(&self.identity) {
                repository.store.put(path, &entry)?;
            }
        }

        debug!(task = %self.identity, "invalidated producer records");
        Ok(())
    }
}

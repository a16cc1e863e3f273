//! Incremental-build decision engine.
//!
//! Given a unit of work with declared input and output files, this crate
//! decides whether the unit can be skipped because its inputs, outputs,
//! and producing-logic identity are unchanged since the last successful
//! execution, and it maintains the persisted per-output-path history that
//! makes the decision possible across process restarts.
//!
//! ## Key Components
//!
//! - **`hashing`**: stable content digests for declared input files.
//! - **`observe`**: classifies paths as file, directory, or missing.
//! - **`snapshot`**: immutable captures of a task's declared inputs and
//!   outputs, plus the comparison that yields out-of-date reasons.
//! - **`history`**: the per-output-path record of which task(s) last
//!   produced it, and with what snapshot.
//! - **`store`**: durable keyed storage for history entries, scoped to a
//!   build session.
//! - **`repository`**: the orchestrating component handing out
//!   [`TaskArtifactState`] handles with up-to-date, commit, and
//!   invalidate operations.

pub mod hashing;
pub mod history;
pub mod observe;
pub mod repository;
pub mod snapshot;
pub mod store;

pub use self::{
    hashing::{ContentHasher, Sha256ContentHasher},
    history::{OutputHistoryEntry, ProducerRecord},
    observe::{FileKind, FileObservation},
    repository::{TaskArtifactState, TaskArtifactStateRepository, UpToDateVerdict},
    snapshot::ExecutionSnapshot,
    store::{FsHistoryStore, HistoryStore, MemoryHistoryStore},
};

//! The boundary between the decision engine and the surrounding build tool.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::path::PathBuf;

/// Identifies one task within the build.
///
/// `producer_kind` names the implementation that executes the task, so two
/// task types that happen to share a path are never treated as the same
/// producer. `path` is the task's unique address within the build.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TaskIdentity {
    pub producer_kind: String,
    pub path: String,
}

impl TaskIdentity {
    pub fn new(producer_kind: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            producer_kind: producer_kind.into(),
            path: path.into(),
        }
    }
}

impl fmt::Display for TaskIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.path, self.producer_kind)
    }
}

/// A unit of work with declared input and output files.
///
/// Implemented by the task abstraction of the enclosing build tool; the
/// engine only ever reads these declarations.
pub trait BuildTask {
    fn identity(&self) -> TaskIdentity;

    /// Whether the task declares inputs at all. Distinct from an empty
    /// input set: a task with no input declaration has no basis for
    /// comparison and can never be up-to-date.
    fn declares_inputs(&self) -> bool;

    fn input_files(&self) -> BTreeSet<PathBuf>;

    fn output_files(&self) -> BTreeSet<PathBuf>;
}

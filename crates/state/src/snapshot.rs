//! Point-in-time captures of a task's declared inputs and outputs.

use crate::hashing::ContentHasher;
use crate::observe::{FileKind, FileObservation};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use uptodate_core::{BuildTask, Result};

/// Observed state of one declared input, including a content digest when
/// the input is a regular file. Directories and missing paths are never
/// hashed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputFileRecord {
    observation: FileObservation,
    content_hash: Option<Vec<u8>>,
}

impl InputFileRecord {
    fn capture(path: &Path, hasher: &dyn ContentHasher) -> Result<Self> {
        let observation = FileObservation::probe(path)?;
        if observation.kind != FileKind::File {
            return Ok(Self {
                observation,
                content_hash: None,
            });
        }
        match hasher.hash(path) {
            Ok(digest) => Ok(Self {
                observation,
                content_hash: Some(digest),
            }),
            // Vanished between probe and hash; missing is a valid,
            // comparable state.
            Err(e) if e.io_error_kind() == Some(ErrorKind::NotFound) => Ok(Self {
                observation: FileObservation::missing(),
                content_hash: None,
            }),
            Err(e) => Err(e),
        }
    }

    /// Inputs compare by kind, and by content digest when both are files.
    fn matches(&self, other: &InputFileRecord) -> bool {
        self.observation.kind == other.observation.kind && self.content_hash == other.content_hash
    }
}

/// Observed state of one declared output. Outputs are compared by
/// structural presence only; many are directories or not byte-for-byte
/// deterministic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputFileRecord {
    pub(crate) observation: FileObservation,
}

/// Immutable record of a task's declared inputs/outputs and their state at
/// capture time.
///
/// Output records start unobserved and are filled in place by
/// [`ExecutionSnapshot::snapshot_outputs`] once the task body has run,
/// producing the as-executed snapshot that gets persisted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionSnapshot {
    accepts_inputs: bool,
    inputs: BTreeMap<PathBuf, InputFileRecord>,
    outputs: BTreeMap<PathBuf, Option<OutputFileRecord>>,
}

impl ExecutionSnapshot {
    /// Captures the task's currently-declared inputs and outputs, hashing
    /// every declared input file now.
    pub fn capture(task: &dyn BuildTask, hasher: &dyn ContentHasher) -> Result<Self> {
        let mut inputs = BTreeMap::new();
        for path in task.input_files() {
            let record = InputFileRecord::capture(&path, hasher)?;
            inputs.insert(path, record);
        }
        let outputs = task
            .output_files()
            .into_iter()
            .map(|path| (path, None))
            .collect();

        Ok(Self {
            accepts_inputs: task.declares_inputs(),
            inputs,
            outputs,
        })
    }

    /// Declared output paths in stable (sorted) order.
    pub fn output_paths(&self) -> impl Iterator<Item = &PathBuf> {
        self.outputs.keys()
    }

    /// Re-observes every declared output, recording the as-executed state.
    pub fn snapshot_outputs(&mut self) -> Result<()> {
        for (path, record) in &mut self.outputs {
            let observation = FileObservation::probe(path)?;
            *record = Some(OutputFileRecord { observation });
        }
        Ok(())
    }

    /// Output paths with their observed records, in stable order. Empty
    /// until [`Self::snapshot_outputs`] has run.
    pub(crate) fn observed_outputs(&self) -> impl Iterator<Item = (&PathBuf, &OutputFileRecord)> {
        self.outputs
            .iter()
            .filter_map(|(path, record)| record.as_ref().map(|r| (path, r)))
    }

    /// Compares this capture against the previously recorded execution,
    /// stopping at the first mismatch so exactly one reason is reported
    /// even when several things differ.
    ///
    /// Comparison order: input declaration, output path set, per-output
    /// on-disk state, input path set, per-input kind and content.
    pub fn changes_since(&self, last: &ExecutionSnapshot) -> Result<Vec<String>> {
        if !self.accepts_inputs {
            return Ok(vec!["Task does not accept any input files.".to_string()]);
        }

        if !self.outputs.keys().eq(last.outputs.keys()) {
            return Ok(vec!["The set of output files has changed.".to_string()]);
        }

        for (path, record) in &last.outputs {
            let Some(record) = record else { continue };
            let current = FileObservation::probe(path)?;
            if !record.observation.still_matches(&current) {
                return Ok(vec![format!("Output file {} has changed.", path.display())]);
            }
        }

        if !self.inputs.keys().eq(last.inputs.keys()) {
            return Ok(vec!["The set of input files has changed.".to_string()]);
        }

        for (path, record) in &self.inputs {
            let Some(last_record) = last.inputs.get(path) else {
                continue;
            };
            if !record.matches(last_record) {
                return Ok(vec![format!("Input file {} has changed.", path.display())]);
            }
        }

        Ok(Vec::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hashing::Sha256ContentHasher;
    use std::collections::BTreeSet;
    use std::fs;
    use tempfile::TempDir;
    use uptodate_core::TaskIdentity;

    struct DeclaredFiles {
        inputs: BTreeSet<PathBuf>,
        outputs: BTreeSet<PathBuf>,
        declares_inputs: bool,
    }

    impl BuildTask for DeclaredFiles {
        fn identity(&self) -> TaskIdentity {
            TaskIdentity::new("test.Task", ":snapshot")
        }

        fn declares_inputs(&self) -> bool {
            self.declares_inputs
        }

        fn input_files(&self) -> BTreeSet<PathBuf> {
            self.inputs.clone()
        }

        fn output_files(&self) -> BTreeSet<PathBuf> {
            self.outputs.clone()
        }
    }

    fn task(inputs: &[&Path], outputs: &[&Path]) -> DeclaredFiles {
        DeclaredFiles {
            inputs: inputs.iter().map(|p| p.to_path_buf()).collect(),
            outputs: outputs.iter().map(|p| p.to_path_buf()).collect(),
            declares_inputs: true,
        }
    }

    fn committed_snapshot(task: &DeclaredFiles) -> ExecutionSnapshot {
        let mut snapshot = ExecutionSnapshot::capture(task, &Sha256ContentHasher).unwrap();
        snapshot.snapshot_outputs().unwrap();
        snapshot
    }

    #[test]
    fn unchanged_task_reports_no_changes() {
        let dir = TempDir::new().unwrap();
        let input = dir.path().join("in.txt");
        let output = dir.path().join("out.txt");
        fs::write(&input, "in").unwrap();
        fs::write(&output, "out").unwrap();

        let declared = task(&[&input], &[&output]);
        let last = committed_snapshot(&declared);
        let this = ExecutionSnapshot::capture(&declared, &Sha256ContentHasher).unwrap();

        assert!(this.changes_since(&last).unwrap().is_empty());
    }

    #[test]
    fn missing_input_is_a_comparable_state() {
        let dir = TempDir::new().unwrap();
        let input = dir.path().join("never-written.txt");
        let output = dir.path().join("out.txt");
        fs::write(&output, "out").unwrap();

        let declared = task(&[&input], &[&output]);
        let last = committed_snapshot(&declared);
        let this = ExecutionSnapshot::capture(&declared, &Sha256ContentHasher).unwrap();

        assert!(this.changes_since(&last).unwrap().is_empty());
    }

    #[test]
    fn task_without_input_declaration_is_always_changed() {
        let dir = TempDir::new().unwrap();
        let output = dir.path().join("out.txt");
        fs::write(&output, "out").unwrap();

        let mut declared = task(&[], &[&output]);
        declared.declares_inputs = false;
        let last = committed_snapshot(&declared);
        let this = ExecutionSnapshot::capture(&declared, &Sha256ContentHasher).unwrap();

        let reasons = this.changes_since(&last).unwrap();
        assert_eq!(reasons, vec!["Task does not accept any input files.".to_string()]);
    }

    #[test]
    fn output_set_difference_is_reported_before_input_changes() {
        let dir = TempDir::new().unwrap();
        let input = dir.path().join("in.txt");
        let out_a = dir.path().join("a.txt");
        let out_b = dir.path().join("b.txt");
        fs::write(&input, "in").unwrap();
        fs::write(&out_a, "a").unwrap();
        fs::write(&out_b, "b").unwrap();

        let last = committed_snapshot(&task(&[&input], &[&out_a]));

        // Inputs changed too, but the output set difference wins.
        fs::write(&input, "in changed").unwrap();
        let this = ExecutionSnapshot::capture(&task(&[&input], &[&out_a, &out_b]), &Sha256ContentHasher)
            .unwrap();

        let reasons = this.changes_since(&last).unwrap();
        assert_eq!(reasons, vec!["The set of output files has changed.".to_string()]);
    }

    #[test]
    fn input_content_change_names_the_input() {
        let dir = TempDir::new().unwrap();
        let input = dir.path().join("in.txt");
        let output = dir.path().join("out.txt");
        fs::write(&input, "in").unwrap();
        fs::write(&output, "out").unwrap();

        let declared = task(&[&input], &[&output]);
        let last = committed_snapshot(&declared);

        fs::write(&input, "in, but different").unwrap();
        let this = ExecutionSnapshot::capture(&declared, &Sha256ContentHasher).unwrap();

        let reasons = this.changes_since(&last).unwrap();
        assert_eq!(reasons.len(), 1);
        assert!(reasons[0].starts_with("Input file "));
        assert!(reasons[0].contains("in.txt"));
    }

    #[test]
    fn deleted_output_names_the_output() {
        let dir = TempDir::new().unwrap();
        let input = dir.path().join("in.txt");
        let output = dir.path().join("out.txt");
        fs::write(&input, "in").unwrap();
        fs::write(&output, "out").unwrap();

        let declared = task(&[&input], &[&output]);
        let last = committed_snapshot(&declared);

        fs::remove_file(&output).unwrap();
        let this = ExecutionSnapshot::capture(&declared, &Sha256ContentHasher).unwrap();

        let reasons = this.changes_since(&last).unwrap();
        assert_eq!(reasons.len(), 1);
        assert!(reasons[0].starts_with("Output file "));
        assert!(reasons[0].contains("out.txt"));
    }
}

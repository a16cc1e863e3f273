//! File-system observation: classifying paths as file, directory, or missing.

use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::Path;
use uptodate_core::{Error, Result};

/// Coarse classification of a path's on-disk state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FileKind {
    File,
    Directory,
    Missing,
}

/// The minimum state needed to detect that "something changed" at a path
/// without hashing directory contents.
///
/// `empty_dir` is meaningful only when `kind` is [`FileKind::Directory`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileObservation {
    pub kind: FileKind,
    pub empty_dir: bool,
}

impl FileObservation {
    pub fn missing() -> Self {
        Self {
            kind: FileKind::Missing,
            empty_dir: false,
        }
    }

    /// Observes the current state of `path`.
    ///
    /// A path that does not exist (or vanishes mid-probe) is the valid
    /// `Missing` state, not an error. Special files that are neither
    /// regular files nor directories are classified as `Missing` as well.
    pub fn probe(path: &Path) -> Result<Self> {
        let metadata = match fs::metadata(path) {
            Ok(metadata) => metadata,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Self::missing()),
            Err(e) => return Err(Error::file_system(path, "probe file state", e)),
        };

        if metadata.is_dir() {
            let empty = match fs::read_dir(path) {
                Ok(mut entries) => entries.next().is_none(),
                Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Self::missing()),
                Err(e) => return Err(Error::file_system(path, "list directory", e)),
            };
            Ok(Self {
                kind: FileKind::Directory,
                empty_dir: empty,
            })
        } else if metadata.is_file() {
            Ok(Self {
                kind: FileKind::File,
                empty_dir: false,
            })
        } else {
            Ok(Self::missing())
        }
    }

    /// Whether `current` is still acceptable for a path recorded with this
    /// observation.
    ///
    /// The match is deliberately lenient:
    /// - a recorded `Missing` path matches anything;
    /// - a recorded file must still be a file;
    /// - a recorded directory must still be a directory, and one recorded
    ///   non-empty must still be non-empty (a recorded empty directory
    ///   matches any directory).
    pub fn still_matches(&self, current: &FileObservation) -> bool {
        match self.kind {
            FileKind::Missing => true,
            FileKind::File => current.kind == FileKind::File,
            FileKind::Directory => {
                if current.kind != FileKind::Directory {
                    return false;
                }
                self.empty_dir || !current.empty_dir
            }
        }
    }
}

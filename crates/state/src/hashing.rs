//! Content hashing for declared input files.

use sha2::{Digest, Sha256};
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;
use uptodate_core::{Error, Result};

/// Computes a stable content digest for a file's bytes.
pub trait ContentHasher: Send + Sync {
    /// Hashes the contents of a regular file.
    ///
    /// Fails with a file-system error when the file cannot be read. A
    /// `NotFound` failure means the file vanished after it was probed;
    /// callers map that to the missing observation instead of aborting.
    fn hash(&self, path: &Path) -> Result<Vec<u8>>;
}

/// SHA-256 content hasher, streaming so large inputs are not held in
/// memory.
#[derive(Debug, Default, Clone, Copy)]
pub struct Sha256ContentHasher;

impl ContentHasher for Sha256ContentHasher {
    fn hash(&self, path: &Path) -> Result<Vec<u8>> {
        let file = File::open(path)
            .map_err(|e| Error::file_system(path, "open file for hashing", e))?;
        let mut reader = BufReader::new(file);
        let mut hasher = Sha256::new();
        let mut buffer = [0u8; 8192];

        loop {
            let read = reader
                .read(&mut buffer)
                .map_err(|e| Error::file_system(path, "read file for hashing", e))?;
            if read == 0 {
                break;
            }
            hasher.update(&buffer[..read]);
        }

        Ok(hasher.finalize().to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::io::ErrorKind;
    use tempfile::TempDir;

    #[test]
    fn identical_content_hashes_identically() {
        let dir = TempDir::new().unwrap();
        let a = dir.path().join("a.txt");
        let b = dir.path().join("b.txt");
        fs::write(&a, "same bytes").unwrap();
        fs::write(&b, "same bytes").unwrap();

        let hasher = Sha256ContentHasher;
        assert_eq!(hasher.hash(&a).unwrap(), hasher.hash(&b).unwrap());
    }

    #[test]
    fn single_byte_change_changes_the_digest() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("a.txt");
        fs::write(&path, "version one").unwrap();
        let before = Sha256ContentHasher.hash(&path).unwrap();

        fs::write(&path, "version two").unwrap();
        let after = Sha256ContentHasher.hash(&path).unwrap();

        assert_ne!(before, after);
        assert_eq!(before.len(), 32);
        assert_eq!(hex::encode(&before).len(), 64);
    }

    #[test]
    fn missing_file_reports_not_found() {
        let dir = TempDir::new().unwrap();
        let err = Sha256ContentHasher
            .hash(&dir.path().join("gone.txt"))
            .unwrap_err();
        assert_eq!(err.io_error_kind(), Some(ErrorKind::NotFound));
    }
}

//! Conversion implementations for error types

use super::types::Error;
use std::path::PathBuf;

// Kept explicit rather than via #[from] so callers are nudged towards the
// builder methods, which carry path and operation context.
impl From<std::io::Error> for Error {
    fn from(error: std::io::Error) -> Self {
        Error::FileSystem {
            path: PathBuf::new(),
            operation: "unknown".to_string(),
            source: error,
        }
    }
}

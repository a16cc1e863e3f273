//! Core error type definitions

use std::path::PathBuf;

/// Result type alias for uptodate operations
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for uptodate operations using thiserror
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// File system operations
    FileSystem {
        path: PathBuf,
        operation: String,
        #[source]
        source: std::io::Error,
    },

    /// Serialization or deserialization of a persisted record
    Serialization { key: String, message: String },

    /// Configuration errors
    Configuration { message: String },
}

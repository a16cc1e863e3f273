//! Extension helpers for inspecting errors

use super::types::Error;

impl Error {
    /// Kind of the underlying I/O error, when this error wraps one.
    ///
    /// Used to distinguish a file that vanished between declaration and
    /// probing (a valid, comparable state) from a genuine read failure.
    #[must_use]
    pub fn io_error_kind(&self) -> Option<std::io::ErrorKind> {
        match self {
            Error::FileSystem { source, .. } => Some(source.kind()),
            _ => None,
        }
    }
}

//! Display implementations for error types

use super::types::Error;
use std::fmt;

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::FileSystem {
                path,
                operation,
                source,
            } => {
                write!(
                    f,
                    "failed to {} '{}': {}",
                    operation,
                    path.display(),
                    source
                )
            }
            Error::Serialization { key, message } => {
                write!(f, "failed to serialize entry for '{key}': {message}")
            }
            Error::Configuration { message } => {
                write!(f, "configuration error: {message}")
            }
        }
    }
}

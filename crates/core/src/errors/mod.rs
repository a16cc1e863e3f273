//! Error types and helpers for uptodate operations

mod builders;
mod conversions;
mod display;
mod extensions;
mod types;

pub use types::{Error, Result};

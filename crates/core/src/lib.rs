//! Core domain types and errors for the `uptodate` build engine.
//!
//! This crate establishes the building blocks shared by every other crate
//! in the workspace:
//!
//! - **`errors`**: the primary `Error` enum and `Result` type alias,
//!   centralizing all failure modes for predictable error handling.
//! - **`tasks`**: the boundary between the engine and the surrounding
//!   build tool — [`TaskIdentity`] and the [`BuildTask`] trait describing
//!   a unit of work's declared inputs and outputs.

pub mod errors;
pub mod tasks;

pub use self::{
    errors::{Error, Result},
    tasks::{BuildTask, TaskIdentity},
};

//! Core of the patchbench harness: ask hosted models for a patch, apply it to a
//! target file, then score the result with the project's tests and a security
//! scanner.

pub mod config;
pub mod engine;
pub mod errors;
pub mod extract;
pub mod model;
pub mod providers;
pub mod report;
pub mod verify;
pub mod workspace;

pub use engine::runner::BenchRunner;
pub use errors::BenchError;

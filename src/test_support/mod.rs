//! Test utilities for depgen unit tests.
//!
//! Provides sample `dependencies.yaml` documents and helpers that lay them
//! out on disk next to a `pyproject.toml`, so generation can be exercised
//! end to end inside a temporary directory.

pub mod fixtures;

// Re-export fixtures for convenience
pub use fixtures::*;

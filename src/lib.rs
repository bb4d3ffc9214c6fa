//! depgen - generate dependency files from a build matrix
//!
//! This crate provides the core library functionality for depgen: parsing
//! `dependencies.yaml`, expanding build matrices, selecting the packages of
//! each include for every combination, and rendering conda environments,
//! requirements files and `pyproject.toml` dependency tables.

pub mod core;
pub mod ops;
pub mod resolver;
pub mod util;

/// Test fixtures for depgen unit tests.
///
/// This module is only available when compiling with `--cfg test`.
#[cfg(test)]
pub mod test_support;

pub use crate::core::{Config, DependencyList, Matrix, MatrixCombination, OutputType};

pub use ops::{generate, GenerateOptions};
pub use resolver::GenerateError;

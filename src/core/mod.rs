//! Core data structures for depgen.
//!
//! This module contains the foundational types used throughout depgen:
//! - The parsed `dependencies.yaml` configuration
//! - Output types and their string identifiers
//! - Build matrices and their expansion into combinations
//! - Dependency lists and their canonical (deduplicated) form

pub mod config;
pub mod dependency;
pub mod matrix;
pub mod output_type;

pub use config::{
    CommonRule, Config, DependencyEntry, Extras, FileSpec, MatrixRule, OutputSpec, SpecificRule,
    DEFAULT_CHANNELS,
};
pub use dependency::{DependencyItem, DependencyList};
pub use matrix::{grid, Condition, Grid, Matrix, MatrixCombination};
pub use output_type::OutputType;

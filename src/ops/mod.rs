//! High-level operations.
//!
//! This module contains the implementation of depgen's commands: generating
//! dependency files and cleaning up previously generated ones.

pub mod assemble;
pub mod clean;
pub mod generate;
pub mod output;

pub use assemble::{name_with_cuda_suffix, Artifact, DEFAULT_CUDA_SUFFIX, VERSION_AXIS};
pub use clean::clean;
pub use generate::{generate, render, write_all, GenerateOptions, RenderedFile, HEADER, TOOL_NAME};
pub use output::{filename, output_dir};

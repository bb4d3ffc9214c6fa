//! Dependency selection.
//!
//! Given a file, an output type and a matrix combination, pick the packages
//! contributed by each included dependency set. Selection is pure: all I/O
//! happens in `ops`.

pub mod errors;
pub mod resolve;

pub use errors::GenerateError;
pub use resolve::{requested_output_types, resolve_dependencies};

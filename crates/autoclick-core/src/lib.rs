//! Core types and logic for autoclick.
//!
//! This crate holds everything that does not need a subprocess or a
//! runtime: pointer coordinates, the backend's position output format,
//! the movement check, and the error taxonomy shared by the probe and
//! click paths.
//!
//! # Modules
//!
//! - [`coord`]: `Coordinate` and parsing of `"<x>,<y>"` position reports
//! - [`guard`]: per-axis tolerance check between two samples
//! - [`error`]: backend error types with actionable suggestions

pub mod coord;
pub mod error;
pub mod guard;

pub use coord::{parse_position, Coordinate};
pub use error::{BackendError, BackendMode};
pub use guard::exceeds_tolerance;

//! Click loop driven by an external pointer backend.

pub mod backend;
pub mod driver;
pub mod stop;

// Public API - used by main.rs
pub use backend::{Backend, BackendCommand};
pub use driver::{run, LoopConfig, Outcome, RunReport, StopReason};
pub use stop::StopSignal;

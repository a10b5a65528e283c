//! Logging for the orchestration framework
//!
//! This crate installs the structured `tracing` subscriber and defines the
//! dispatch events emitted around every orchestrator invocation.

pub mod capture;
pub mod events;
pub mod logger;

// Re-export commonly used types
pub use capture::LogCapture;
pub use events::{orchestration_end, orchestration_start, StartEvent};
pub use logger::init_logging;

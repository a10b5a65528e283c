//! Common utilities and types for the orchestration framework
//!
//! This crate provides the shared vocabulary of every orchestrator: the error
//! type and its closed taxonomy, the layer and type enumerations, the uniform
//! `Outcome` and the `Params` bag.

pub mod error;
pub mod models;
pub mod types;
pub mod utils;

// Re-export commonly used types
pub use error::{Error, Result};
pub use models::*;
pub use types::*;

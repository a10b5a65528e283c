//! Error types for the common crate
//!
//! This module defines the error type shared by every crate of the orchestration
//! framework and its mapping onto the closed error taxonomy carried by outcomes.

use thiserror::Error;

use crate::types::ErrorCategory;

/// Result type for orchestration operations
pub type Result<T> = std::result::Result<T, Error>;

/// Common error type for orchestration operations
#[derive(Error, Debug)]
pub enum Error {
    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Bad or unknown operation or parameters
    #[error("Validation error: {0}")]
    Validation(String),

    /// Not found error
    #[error("Not found: {0}")]
    NotFound(String),

    /// Already exists error
    #[error("Already exists: {0}")]
    AlreadyExists(String),

    /// Timeout error
    #[error("Timeout: {0}")]
    Timeout(String),

    /// A required collaborator could not be reached
    #[error("Unavailable: {0}")]
    Unavailable(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Maps the error onto the closed taxonomy used by outcomes
    pub fn category(&self) -> ErrorCategory {
        match self {
            Error::Validation(_) | Error::AlreadyExists(_) => ErrorCategory::Validation,
            Error::NotFound(_) => ErrorCategory::NotFound,
            Error::Timeout(_) => ErrorCategory::Timeout,
            Error::Unavailable(_) => ErrorCategory::Unavailable,
            Error::Serialization(_) | Error::Config(_) | Error::Internal(_) => {
                ErrorCategory::Internal
            }
        }
    }

    /// Returns true if the error is a not found error
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::NotFound(_))
    }

    /// Returns true if the error is a timeout error
    pub fn is_timeout(&self) -> bool {
        matches!(self, Error::Timeout(_))
    }

    /// Returns true if a retry by the caller could plausibly succeed
    pub fn is_transient(&self) -> bool {
        matches!(self, Error::Timeout(_) | Error::Unavailable(_))
    }
}

//! Background-task lifecycle state
//!
//! Tracks where an orchestrator's background unit is in its one-way lifecycle.
//! There is no transition back to `Running`: a stopped task needs a new instance.

use std::fmt;
use serde::{Deserialize, Serialize};

/// Lifecycle state of a background unit
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum LifecycleState {
    /// Not started yet (or start deferred)
    Idle,

    /// Background unit is running
    Running,

    /// Shutdown signalled, waiting for the unit to exit
    Stopping,

    /// Unit has exited or was never started before shutdown
    Stopped,

    /// Unit panicked or could not be cancelled in time
    Failed(String),
}

impl LifecycleState {
    pub fn is_idle(&self) -> bool {
        matches!(self, LifecycleState::Idle)
    }

    pub fn is_running(&self) -> bool {
        matches!(self, LifecycleState::Running)
    }

    pub fn is_stopping(&self) -> bool {
        matches!(self, LifecycleState::Stopping)
    }

    pub fn is_stopped(&self) -> bool {
        matches!(self, LifecycleState::Stopped)
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, LifecycleState::Failed(_))
    }

    /// True once no further work can run
    pub fn is_terminal(&self) -> bool {
        matches!(self, LifecycleState::Stopped | LifecycleState::Failed(_))
    }

    /// Gets the failure message if in failed state
    pub fn error_message(&self) -> Option<&str> {
        match self {
            LifecycleState::Failed(msg) => Some(msg),
            _ => None,
        }
    }
}

impl fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LifecycleState::Idle => write!(f, "Idle"),
            LifecycleState::Running => write!(f, "Running"),
            LifecycleState::Stopping => write!(f, "Stopping"),
            LifecycleState::Stopped => write!(f, "Stopped"),
            LifecycleState::Failed(msg) => write!(f, "Failed: {}", msg),
        }
    }
}

impl Default for LifecycleState {
    fn default() -> Self {
        LifecycleState::Idle
    }
}

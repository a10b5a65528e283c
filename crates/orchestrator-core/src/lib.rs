//! Core orchestration framework
//!
//! This crate provides the orchestrator contract, the per-call context, the
//! facade that registers and dispatches every orchestrator, and the lifecycle
//! discipline for orchestrators that own background work.

pub mod context;
pub mod dependency;
pub mod facade;
pub mod lifecycle;
pub mod metrics;
pub mod orchestrator;
pub mod state;

// Re-export commonly used types
pub use context::OrchestrationContext;
pub use dependency::LazyDependency;
pub use facade::{FacadeError, OrchestrationFacade};
pub use lifecycle::{wait_for_shutdown, BackgroundTask, StartStatus};
pub use metrics::{DispatchMetrics, DispatchStats};
pub use orchestrator::{Orchestrator, OrchestratorInfo};
pub use state::LifecycleState;

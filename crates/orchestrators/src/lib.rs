//! Reference orchestrators
//!
//! One orchestrator per layer shape: stateless domain workflows, an
//! application coordinator with a background drain loop, and an infrastructure
//! health loop.

pub mod application;
pub mod domain;
pub mod infrastructure;

pub use application::{FeedbackRouterOrchestrator, FeedbackSink, SinkResolver, FEEDBACK_ROUTER};
pub use domain::{
    ContentAnalysisOrchestrator, ContentAnalyzer, FallbackAnalysisOrchestrator, CONTENT_ANALYSIS,
    FALLBACK_ANALYSIS,
};
pub use infrastructure::{HealthMonitorOrchestrator, HealthProbe, HEALTH_MONITOR};

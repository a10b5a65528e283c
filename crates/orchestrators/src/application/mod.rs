//! Application-layer orchestrators: cross-component coordination

pub mod feedback_router;

pub use feedback_router::{
    Component, ComponentMetrics, FeedbackRouterOrchestrator, FeedbackSignal, FeedbackSink, SinkResolver,
    FEEDBACK_ROUTER,
};

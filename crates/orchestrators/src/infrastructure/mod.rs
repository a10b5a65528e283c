//! Infrastructure-layer orchestrators: health and resilience loops

pub mod health_monitor;

pub use health_monitor::{ComponentHealth, HealthMonitorOrchestrator, HealthProbe, HEALTH_MONITOR};

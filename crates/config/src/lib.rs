//! Configuration management for the orchestration framework
//!
//! This crate provides the typed settings tree and the manager that loads it
//! from defaults, files and the environment.

pub mod manager;
pub mod settings;

// Re-export commonly used types
pub use manager::ConfigManager;
pub use settings::{
    FacadeSettings, FeedbackRouterSettings, HealthMonitorSettings, LifecycleSettings, LogFormat,
    LoggingSettings, Settings,
};

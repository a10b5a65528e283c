//! Configuration manager
//!
//! Layers built-in defaults, an optional configuration file and environment
//! overrides into a validated [`Settings`] tree.

use std::path::Path;
use config::{Config, Environment, File};
use tracing::{debug, info};

use common::error::{Error, Result};

use crate::settings::Settings;

/// Environment prefix for overrides, e.g. `ORCHESTRATION__FACADE__MAX_DEPTH=16`
pub const ENV_PREFIX: &str = "ORCHESTRATION";

/// Loads and holds the validated configuration
#[derive(Debug, Clone, Default)]
pub struct ConfigManager {
    settings: Settings,
}

impl ConfigManager {
    /// Loads configuration from an optional file plus `ORCHESTRATION__*` variables
    pub fn load(path: Option<&Path>) -> Result<Self> {
        Self::load_with_prefix(path, ENV_PREFIX)
    }

    /// Loads configuration using a custom environment prefix
    pub fn load_with_prefix(path: Option<&Path>, env_prefix: &str) -> Result<Self> {
        let mut builder = Config::builder();

        if let Some(path) = path {
            if !path.exists() {
                return Err(Error::Config(format!(
                    "configuration file not found: {}",
                    path.display()
                )));
            }
            debug!("Loading configuration file {}", path.display());
            builder = builder.add_source(File::from(path));
        }

        builder = builder.add_source(
            Environment::with_prefix(env_prefix)
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        );

        let settings: Settings = builder
            .build()
            .and_then(|raw| raw.try_deserialize())
            .map_err(|e| Error::Config(e.to_string()))?;

        let manager = Self::from_settings(settings)?;
        info!(
            max_depth = manager.settings.facade.max_depth,
            cleanup_timeout_ms = manager.settings.lifecycle.cleanup_timeout_ms,
            "Configuration loaded"
        );
        Ok(manager)
    }

    /// Wraps already-built settings after validating them
    pub fn from_settings(settings: Settings) -> Result<Self> {
        settings.validate()?;
        Ok(Self { settings })
    }

    /// Gets the validated settings
    pub fn settings(&self) -> &Settings {
        &self.settings
    }
}

//! Main integration module for the content orchestrator
//!
//! This module wires the facade and the standard orchestrators together. It is
//! the one place where the process-wide facade is created; everything else
//! receives it explicitly.

pub mod collaborators;

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use serde_json::json;
use tracing::{info, warn};

use common::{Outcome, Params};
use orchestration_config::{ConfigManager, Settings};
use orchestrator_core::{OrchestrationContext, OrchestrationFacade, OrchestratorInfo};
use orchestrators::{
    ContentAnalysisOrchestrator, FallbackAnalysisOrchestrator, FeedbackRouterOrchestrator,
    HealthMonitorOrchestrator, FEEDBACK_ROUTER, HEALTH_MONITOR,
};

use crate::collaborators::{RegistryProbe, TracingSinkResolver};

/// Orchestrators that own background work, started by [`ContentOrchestrator::start`]
const BACKGROUND_ORCHESTRATORS: [&str; 2] = [HEALTH_MONITOR, FEEDBACK_ROUTER];

/// Process-level wiring of the orchestration framework
pub struct ContentOrchestrator {
    settings: Settings,
    facade: Arc<OrchestrationFacade>,
}

impl ContentOrchestrator {
    /// Loads configuration and wires the standard orchestrators
    pub fn from_config(path: Option<&Path>) -> Result<Self> {
        let manager = ConfigManager::load(path).context("failed to load configuration")?;
        Self::new(manager.settings().clone())
    }

    /// Wires the standard orchestrators from explicit settings
    pub fn new(settings: Settings) -> Result<Self> {
        settings.validate().context("invalid configuration")?;

        let facade = Arc::new(OrchestrationFacade::with_settings(settings.facade.clone()));

        facade.register(Arc::new(FallbackAnalysisOrchestrator::new()))?;
        facade.register(Arc::new(ContentAnalysisOrchestrator::new(Arc::downgrade(&facade))))?;
        facade.register(Arc::new(FeedbackRouterOrchestrator::with_resolver(
            &settings.feedback_router,
            &settings.lifecycle,
            Arc::new(TracingSinkResolver),
        )))?;
        facade.register(Arc::new(
            HealthMonitorOrchestrator::new(&settings.health_monitor, &settings.lifecycle)
                .with_probes(vec![
                    Arc::new(RegistryProbe::new(Arc::downgrade(&facade))) as Arc<dyn orchestrators::HealthProbe>
                ]),
        ))?;

        info!(orchestrators = facade.len(), "Content orchestrator initialized");
        Ok(Self { settings, facade })
    }

    pub fn facade(&self) -> &Arc<OrchestrationFacade> {
        &self.facade
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Dispatches through the facade
    pub async fn orchestrate(&self, name: &str, context: &OrchestrationContext, params: &Params) -> Outcome {
        self.facade
            .orchestrate_with_timeout(name, context, params, None)
            .await
    }

    pub fn list(&self) -> std::collections::BTreeMap<String, OrchestratorInfo> {
        self.facade.list_orchestrators()
    }

    /// Starts background orchestrators eagerly instead of on their first call
    pub async fn start(&self) -> Result<()> {
        let context = OrchestrationContext::new("system");
        let params = Params::new().with(common::OPERATION_KEY, json!("start"));

        for name in BACKGROUND_ORCHESTRATORS {
            match self.facade.orchestrate(name, &context, &params).await {
                Outcome::Success(_) => info!(name, "Background orchestrator started"),
                Outcome::Failure(e) => anyhow::bail!("failed to start {}: {}", name, e.message),
            }
        }
        Ok(())
    }

    /// Cleans up and unregisters everything; returns the number of cleanup faults
    pub async fn shutdown(&self) -> usize {
        let faults = self.facade.shutdown_all().await;
        if faults > 0 {
            warn!(faults, "Shutdown completed with cleanup faults");
        } else {
            info!("Shutdown completed");
        }
        faults
    }
}

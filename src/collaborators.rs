//! Default collaborators wired into the standard orchestrators
//!
//! Real deployments plug their own sinks and probes in; these keep a bare
//! process observable through its logs.

use std::sync::{Arc, Weak};

use async_trait::async_trait;
use tracing::info;

use common::{Error, Result};
use orchestrator_core::OrchestrationFacade;
use orchestrators::application::{Component, FeedbackSignal};
use orchestrators::{FeedbackSink, HealthProbe, SinkResolver};

/// Sink that writes each drained batch to the log
pub struct TracingSink {
    component: Component,
}

#[async_trait]
impl FeedbackSink for TracingSink {
    async fn deliver(&self, batch: &[FeedbackSignal]) -> Result<()> {
        let mean = batch.iter().map(|signal| signal.value).sum::<f64>() / batch.len().max(1) as f64;
        info!(
            component = %self.component,
            count = batch.len(),
            mean_value = mean,
            "Feedback batch received"
        );
        Ok(())
    }
}

/// Resolves a [`TracingSink`] for every component
#[derive(Debug, Default)]
pub struct TracingSinkResolver;

#[async_trait]
impl SinkResolver for TracingSinkResolver {
    async fn resolve(&self, component: Component) -> Result<Arc<dyn FeedbackSink>> {
        Ok(Arc::new(TracingSink { component }))
    }
}

/// Reports the facade registry as a health component
pub struct RegistryProbe {
    facade: Weak<OrchestrationFacade>,
}

impl RegistryProbe {
    pub fn new(facade: Weak<OrchestrationFacade>) -> Self {
        Self { facade }
    }
}

#[async_trait]
impl HealthProbe for RegistryProbe {
    fn component(&self) -> &str {
        "orchestration-registry"
    }

    async fn check(&self) -> Result<String> {
        let facade = self
            .facade
            .upgrade()
            .ok_or_else(|| Error::Unavailable("orchestration facade dropped".to_string()))?;
        Ok(format!("{} orchestrators registered", facade.len()))
    }
}

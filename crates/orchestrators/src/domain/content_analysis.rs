//! Content analysis workflow with fallback delegation
//!
//! Runs the primary [`ContentAnalyzer`] and, when it cannot be reached, hands
//! the request to the fallback-analysis orchestrator through the facade using a
//! child context.

use std::sync::{Arc, Weak};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Value};
use tracing::{info, warn};
use url::Url;

use common::utils::execute_with_timeout;
use common::{Layer, OrchestrationType, Outcome, Params, Result};
use orchestrator_core::{OrchestrationContext, OrchestrationFacade, Orchestrator};

use super::fallback_analysis::{parse_content_url, FALLBACK_ANALYSIS};

/// Registry name of [`ContentAnalysisOrchestrator`]
pub const CONTENT_ANALYSIS: &str = "content-analysis";

const DEFAULT_ANALYZER_TIMEOUT: Duration = Duration::from_secs(30);

/// Primary analysis backend, typically an LLM-backed service
#[async_trait]
pub trait ContentAnalyzer: Send + Sync {
    async fn analyze(&self, url: &Url, params: &Params) -> Result<Value>;
}

/// Hierarchical domain orchestrator
pub struct ContentAnalysisOrchestrator {
    facade: Weak<OrchestrationFacade>,
    analyzer: Option<Arc<dyn ContentAnalyzer>>,
    analyzer_timeout: Duration,
}

impl ContentAnalysisOrchestrator {
    /// Creates an orchestrator that always delegates to the fallback
    pub fn new(facade: Weak<OrchestrationFacade>) -> Self {
        Self {
            facade,
            analyzer: None,
            analyzer_timeout: DEFAULT_ANALYZER_TIMEOUT,
        }
    }

    pub fn with_analyzer(mut self, analyzer: Arc<dyn ContentAnalyzer>) -> Self {
        self.analyzer = Some(analyzer);
        self
    }

    pub fn with_analyzer_timeout(mut self, timeout: Duration) -> Self {
        self.analyzer_timeout = timeout;
        self
    }

    async fn delegate(&self, context: &OrchestrationContext, params: &Params, reason: &str) -> Outcome {
        let Some(facade) = self.facade.upgrade() else {
            return Outcome::unavailable("orchestration facade is no longer available");
        };

        info!(
            request_id = %context.request_id(),
            reason,
            "Delegating content analysis to {}",
            FALLBACK_ANALYSIS
        );

        match facade
            .orchestrate_child(CONTENT_ANALYSIS, context, FALLBACK_ANALYSIS, params)
            .await
        {
            Outcome::Success(Value::Object(mut data)) => {
                data.insert("delegated_to".to_string(), json!(FALLBACK_ANALYSIS));
                data.insert("delegation_reason".to_string(), json!(reason));
                Outcome::success(Value::Object(data))
            }
            other => other,
        }
    }
}

#[async_trait]
impl Orchestrator for ContentAnalysisOrchestrator {
    fn name(&self) -> &str {
        CONTENT_ANALYSIS
    }

    fn layer(&self) -> Layer {
        Layer::Domain
    }

    fn orchestration_type(&self) -> OrchestrationType {
        OrchestrationType::Hierarchical
    }

    async fn orchestrate(&self, context: &OrchestrationContext, params: &Params) -> Outcome {
        let url = match params.require_str("url").and_then(parse_content_url) {
            Ok(url) => url,
            Err(e) => return Outcome::from_error(&e),
        };

        let Some(analyzer) = &self.analyzer else {
            return self.delegate(context, params, "no primary analyzer configured").await;
        };

        let analysis = execute_with_timeout(
            analyzer.analyze(&url, params),
            self.analyzer_timeout,
            "content analysis",
        )
        .await;

        match analysis {
            Ok(data) => Outcome::success(json!({
                "url": url.as_str(),
                "analysis_mode": "primary",
                "analysis": data,
            })),
            Err(e) if e.is_transient() => {
                warn!(request_id = %context.request_id(), "Primary analyzer failed: {}", e);
                self.delegate(context, params, &e.to_string()).await
            }
            Err(e) => Outcome::from_error(&e),
        }
    }
}

//! The orchestrator contract
//!
//! Every unit of coordination implements [`Orchestrator`]. The facade treats all
//! implementations identically: one entry point, one uniform [`Outcome`].

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use common::{Layer, OrchestrationType, Outcome, Params, Result};

use crate::context::OrchestrationContext;

/// A named, layer-classified unit of coordination
///
/// `orchestrate` may be called concurrently by many callers and from any call
/// depth. Expected domain failures are returned as failed outcomes, never as
/// panics. Orchestrators that own background work start it lazily from
/// `orchestrate` (see [`crate::lifecycle::BackgroundTask`]) and stop it in
/// `cleanup`.
#[async_trait]
pub trait Orchestrator: Send + Sync {
    /// Globally unique name used as the registry key
    fn name(&self) -> &str;

    fn layer(&self) -> Layer;

    fn orchestration_type(&self) -> OrchestrationType;

    /// The single entry point for business behaviour
    async fn orchestrate(&self, context: &OrchestrationContext, params: &Params) -> Outcome;

    /// Cheap, side-effect-free eligibility probe
    fn can_orchestrate(&self, _context: &OrchestrationContext, _params: &Params) -> bool {
        true
    }

    /// Releases owned resources; must be idempotent and bounded in time
    async fn cleanup(&self) -> Result<()> {
        Ok(())
    }

    fn info(&self) -> OrchestratorInfo {
        OrchestratorInfo {
            layer: self.layer(),
            orchestration_type: self.orchestration_type(),
        }
    }
}

/// Introspection record exposed by the facade
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrchestratorInfo {
    pub layer: Layer,
    #[serde(rename = "type")]
    pub orchestration_type: OrchestrationType,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    struct Plain;

    #[async_trait]
    impl Orchestrator for Plain {
        fn name(&self) -> &str {
            "plain"
        }

        fn layer(&self) -> Layer {
            Layer::Application
        }

        fn orchestration_type(&self) -> OrchestrationType {
            OrchestrationType::Feedback
        }

        async fn orchestrate(&self, _context: &OrchestrationContext, _params: &Params) -> Outcome {
            Outcome::success(json!({}))
        }
    }

    #[tokio::test]
    async fn test_defaults() {
        let plain = Plain;
        let context = OrchestrationContext::new("tenant");
        assert!(plain.can_orchestrate(&context, &Params::new()));
        assert!(plain.cleanup().await.is_ok());
        assert!(plain.cleanup().await.is_ok());
    }

    #[test]
    fn test_info_serialization() {
        let info = Plain.info();
        assert_eq!(
            serde_json::to_value(info).unwrap(),
            json!({"layer": "application", "type": "feedback"})
        );
    }
}

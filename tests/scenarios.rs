//! End-to-end behaviour of the wired orchestrator

use std::io::Write;
use std::time::{Duration, Instant};

use serde_json::json;

use common::{ErrorCategory, Layer, OrchestrationType, Params};
use content_orchestrator::ContentOrchestrator;
use orchestration_config::Settings;
use orchestrator_core::{OrchestrationContext, Orchestrator};
use orchestrators::{CONTENT_ANALYSIS, FALLBACK_ANALYSIS, FEEDBACK_ROUTER, HEALTH_MONITOR};

fn wired() -> ContentOrchestrator {
    ContentOrchestrator::new(Settings::default()).unwrap()
}

fn ctx() -> OrchestrationContext {
    OrchestrationContext::new("guild-42").with_trace_id("trace-1")
}

#[tokio::test]
async fn test_fallback_analysis_succeeds() {
    let orchestrator = wired();
    let outcome = orchestrator
        .orchestrate(FALLBACK_ANALYSIS, &ctx(), &Params::new().with("url", "http://x"))
        .await;

    let data = outcome.data().unwrap();
    assert!(data.as_object().map(|o| !o.is_empty()).unwrap_or(false));
    assert_eq!(data["analysis_mode"], json!("fallback"));
    orchestrator.shutdown().await;
}

#[tokio::test]
async fn test_unknown_name_is_not_found() {
    let orchestrator = wired();
    let outcome = orchestrator.orchestrate("unknown-name", &ctx(), &Params::new()).await;
    assert_eq!(outcome.error_category(), Some(ErrorCategory::NotFound));
}

#[tokio::test]
async fn test_health_monitor_cleanup_is_bounded() {
    let orchestrator = wired();
    let monitor = orchestrator.facade().get(HEALTH_MONITOR).unwrap();
    assert_eq!(monitor.layer(), Layer::Infrastructure);

    assert!(orchestrator
        .orchestrate(HEALTH_MONITOR, &ctx(), &Params::new())
        .await
        .succeeded());

    let began = Instant::now();
    monitor.cleanup().await.unwrap();
    assert!(began.elapsed() < Duration::from_millis(5_500));

    // cleanup again, then unregister
    monitor.cleanup().await.unwrap();
    orchestrator.facade().unregister(HEALTH_MONITOR).unwrap();
}

#[test]
fn test_child_context_derivation() {
    let root = ctx().with_metadata("channel", "general");
    assert_eq!(root.depth(), 0);

    let child = root.child(CONTENT_ANALYSIS);
    assert_eq!(child.depth(), 1);
    assert_eq!(child.parent_orchestrator(), Some(CONTENT_ANALYSIS));
    assert_eq!(child.tenant_id(), root.tenant_id());
    assert_eq!(child.request_id(), root.request_id());
    assert_eq!(child.trace_id(), root.trace_id());
    assert_eq!(child.metadata(), root.metadata());
}

#[tokio::test]
async fn test_feedback_router_rejects_unknown_operation() {
    let orchestrator = wired();
    let listed = orchestrator.list();
    assert_eq!(listed[FEEDBACK_ROUTER].layer, Layer::Application);
    assert_eq!(listed[FEEDBACK_ROUTER].orchestration_type, OrchestrationType::Feedback);

    let outcome = orchestrator
        .orchestrate(FEEDBACK_ROUTER, &ctx(), &Params::new().with("operation", "bogus"))
        .await;
    assert_eq!(outcome.error_category(), Some(ErrorCategory::Validation));

    let submitted = orchestrator
        .orchestrate(
            FEEDBACK_ROUTER,
            &ctx(),
            &Params::new()
                .with("operation", "submit")
                .with("component", "quality")
                .with("signal_type", "thumbs_up")
                .with("value", 1.0),
        )
        .await;
    assert!(submitted.succeeded());

    let metrics = orchestrator
        .orchestrate(FEEDBACK_ROUTER, &ctx(), &Params::new().with("operation", "get_metrics"))
        .await;
    assert_eq!(metrics.data().unwrap()["components"]["quality"]["submitted"], json!(1));

    assert_eq!(orchestrator.shutdown().await, 0);
}

#[tokio::test]
async fn test_content_analysis_delegates_through_facade() {
    let orchestrator = wired();
    let outcome = orchestrator
        .orchestrate(
            CONTENT_ANALYSIS,
            &ctx(),
            &Params::new().with("url", "https://youtu.be/abc").with("title", "Great demo"),
        )
        .await;

    let data = outcome.data().unwrap();
    assert_eq!(data["delegated_to"], json!(FALLBACK_ANALYSIS));
    assert_eq!(data["platform"], json!("youtube"));

    let stats = orchestrator.facade().metrics();
    assert_eq!(stats[CONTENT_ANALYSIS].calls, 1);
    assert_eq!(stats[FALLBACK_ANALYSIS].calls, 1);
}

#[tokio::test]
async fn test_start_and_shutdown_all() {
    let orchestrator = wired();
    orchestrator.start().await.unwrap();

    let began = Instant::now();
    assert_eq!(orchestrator.shutdown().await, 0);
    assert!(began.elapsed() < Duration::from_secs(2));
    assert!(orchestrator.facade().is_empty());
}

#[test]
fn test_from_config_file() {
    let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
    writeln!(file, "[facade]\nmax_depth = 4\n\n[feedback_router]\nbatch_size = 5").unwrap();

    let orchestrator = ContentOrchestrator::from_config(Some(file.path())).unwrap();
    assert_eq!(orchestrator.settings().facade.max_depth, 4);
    assert_eq!(orchestrator.settings().feedback_router.batch_size, 5);
    assert_eq!(orchestrator.list().len(), 4);
}

#[test]
fn test_invalid_settings_rejected() {
    let mut settings = Settings::default();
    settings.facade.max_depth = 0;
    assert!(ContentOrchestrator::new(settings).is_err());
}

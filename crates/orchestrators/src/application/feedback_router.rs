//! Feedback routing orchestrator
//!
//! Accepts feedback signals for the routing, prompt, memory and quality
//! components, buffers them in bounded per-component queues and drains them in
//! batches to sinks from a background coordination loop. Several logical
//! operations share the single `orchestrate` entry point and are selected by the
//! `operation` parameter.

use std::collections::{BTreeMap, HashMap, VecDeque};
use std::fmt;
use std::str::FromStr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace, warn};

use common::{Error, Layer, OrchestrationType, Outcome, Params, Result};
use orchestration_config::{FeedbackRouterSettings, LifecycleSettings};
use orchestrator_core::{
    wait_for_shutdown, BackgroundTask, LazyDependency, OrchestrationContext, Orchestrator, StartStatus,
};

/// Registry name of [`FeedbackRouterOrchestrator`]
pub const FEEDBACK_ROUTER: &str = "feedback-router";

const STOPPED: &str = "feedback router has been stopped";

/// Subsystem a feedback signal is addressed to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Component {
    Routing,
    Prompt,
    Memory,
    Quality,
}

impl Component {
    pub const ALL: [Component; 4] = [
        Component::Routing,
        Component::Prompt,
        Component::Memory,
        Component::Quality,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Component::Routing => "routing",
            Component::Prompt => "prompt",
            Component::Memory => "memory",
            Component::Quality => "quality",
        }
    }
}

impl fmt::Display for Component {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Component {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Component::ALL
            .into_iter()
            .find(|component| component.as_str() == s.to_lowercase())
            .ok_or_else(|| Error::Validation(format!("unknown feedback component '{}'", s)))
    }
}

/// One feedback observation
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeedbackSignal {
    pub component: Component,
    pub signal_type: String,
    pub value: f64,
    pub metadata: Map<String, Value>,
    pub received_at: DateTime<Utc>,
}

impl FeedbackSignal {
    /// Parses a signal from `{component, signal_type, value, metadata?}`
    pub fn from_value(value: &Value) -> Result<Self> {
        let object = value
            .as_object()
            .ok_or_else(|| Error::Validation("feedback signal must be a JSON object".to_string()))?;
        Self::from_map(object)
    }

    fn from_map(object: &Map<String, Value>) -> Result<Self> {
        let field = |key: &str| {
            object
                .get(key)
                .and_then(Value::as_str)
                .ok_or_else(|| Error::Validation(format!("feedback signal is missing '{}'", key)))
        };

        let component = field("component")?.parse()?;
        let signal_type = field("signal_type")?.to_string();
        let value = object
            .get("value")
            .and_then(Value::as_f64)
            .ok_or_else(|| Error::Validation("feedback signal 'value' must be a number".to_string()))?;
        let metadata = match object.get("metadata") {
            None | Some(Value::Null) => Map::new(),
            Some(Value::Object(metadata)) => metadata.clone(),
            Some(_) => {
                return Err(Error::Validation(
                    "feedback signal 'metadata' must be an object".to_string(),
                ))
            }
        };

        Ok(Self {
            component,
            signal_type,
            value,
            metadata,
            received_at: Utc::now(),
        })
    }
}

/// Destination for drained signals of one component
#[async_trait]
pub trait FeedbackSink: Send + Sync {
    async fn deliver(&self, batch: &[FeedbackSignal]) -> Result<()>;
}

/// Resolves the sink of a component on first use
///
/// A component without a sink yields [`Error::NotFound`].
#[async_trait]
pub trait SinkResolver: Send + Sync {
    async fn resolve(&self, component: Component) -> Result<Arc<dyn FeedbackSink>>;
}

/// Per-component delivery counters
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ComponentMetrics {
    pub submitted: u64,
    pub rejected: u64,
    pub delivered: u64,
    pub undeliverable: u64,
    pub failed: u64,
    /// Still queued when the router stopped
    pub dropped: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Operation {
    Submit,
    SubmitBatch,
    GetMetrics,
    Start,
    Stop,
    QueueDepths,
}

impl FromStr for Operation {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "submit" => Ok(Operation::Submit),
            "submit_batch" => Ok(Operation::SubmitBatch),
            "get_metrics" => Ok(Operation::GetMetrics),
            "start" => Ok(Operation::Start),
            "stop" => Ok(Operation::Stop),
            "queue_depths" => Ok(Operation::QueueDepths),
            other => Err(Error::Validation(format!("unknown operation '{}'", other))),
        }
    }
}

/// State shared with the coordination loop
struct RouterShared {
    queues: HashMap<Component, Mutex<VecDeque<FeedbackSignal>>>,
    sinks: HashMap<Component, LazyDependency<dyn FeedbackSink>>,
    resolver: Option<Arc<dyn SinkResolver>>,
    metrics: Mutex<BTreeMap<Component, ComponentMetrics>>,
    drain_cycles: AtomicU64,
    settings: FeedbackRouterSettings,
}

impl RouterShared {
    fn new(settings: FeedbackRouterSettings, resolver: Option<Arc<dyn SinkResolver>>) -> Self {
        Self {
            queues: Component::ALL
                .into_iter()
                .map(|component| (component, Mutex::new(VecDeque::new())))
                .collect(),
            sinks: Component::ALL
                .into_iter()
                .map(|component| (component, LazyDependency::new(format!("{}-sink", component))))
                .collect(),
            resolver,
            metrics: Mutex::new(
                Component::ALL
                    .into_iter()
                    .map(|component| (component, ComponentMetrics::default()))
                    .collect(),
            ),
            drain_cycles: AtomicU64::new(0),
            settings,
        }
    }

    fn queue(&self, component: Component) -> &Mutex<VecDeque<FeedbackSignal>> {
        &self.queues[&component]
    }

    fn update_metrics(&self, component: Component, update: impl FnOnce(&mut ComponentMetrics)) {
        update(self.metrics.lock().entry(component).or_default());
    }

    /// Appends to the component queue, rejecting when it is full
    fn enqueue(&self, signal: FeedbackSignal) -> Result<usize> {
        let component = signal.component;
        let depth = {
            let mut queue = self.queue(component).lock();
            if queue.len() >= self.settings.max_queue_depth {
                None
            } else {
                queue.push_back(signal);
                Some(queue.len())
            }
        };

        match depth {
            Some(depth) => {
                self.update_metrics(component, |m| m.submitted += 1);
                trace!(component = %component, depth, "Feedback signal queued");
                Ok(depth)
            }
            None => {
                self.update_metrics(component, |m| m.rejected += 1);
                warn!(component = %component, "Feedback queue full, rejecting signal");
                Err(Error::Unavailable(format!(
                    "feedback queue for '{}' is full ({} signals)",
                    component, self.settings.max_queue_depth
                )))
            }
        }
    }

    fn queue_depths(&self) -> BTreeMap<Component, usize> {
        Component::ALL
            .into_iter()
            .map(|component| (component, self.queue(component).lock().len()))
            .collect()
    }

    fn pending(&self) -> usize {
        self.queues.values().map(|queue| queue.lock().len()).sum()
    }

    /// Drains every queue before the loop exits
    async fn flush(&self) {
        while self.pending() > 0 {
            self.drain_once().await;
        }
    }

    /// Discards whatever the final flush did not reach, counting it as dropped
    fn drop_pending(&self) -> u64 {
        let mut total = 0;
        for component in Component::ALL {
            let count = {
                let mut queue = self.queue(component).lock();
                let count = queue.len() as u64;
                queue.clear();
                count
            };
            if count > 0 {
                self.update_metrics(component, |m| m.dropped += count);
                warn!(component = %component, count, "Feedback signals dropped at shutdown");
                total += count;
            }
        }
        total
    }

    /// Drains up to one batch per component into its sink
    async fn drain_once(&self) {
        for component in Component::ALL {
            let batch: Vec<FeedbackSignal> = {
                let mut queue = self.queue(component).lock();
                let take = queue.len().min(self.settings.batch_size);
                queue.drain(..take).collect()
            };
            if batch.is_empty() {
                continue;
            }
            let count = batch.len() as u64;

            let sink = match self.sink(component).await {
                Ok(sink) => sink,
                Err(e) => {
                    debug!(component = %component, count, "Feedback batch undeliverable: {}", e);
                    self.update_metrics(component, |m| m.undeliverable += count);
                    continue;
                }
            };

            match sink.deliver(&batch).await {
                Ok(()) => {
                    self.update_metrics(component, |m| m.delivered += count);
                    trace!(component = %component, count, "Feedback batch delivered");
                }
                Err(e) => {
                    self.update_metrics(component, |m| m.failed += count);
                    warn!(component = %component, count, "Feedback delivery failed: {}", e);
                }
            }
        }
        self.drain_cycles.fetch_add(1, Ordering::Relaxed);
    }

    async fn sink(&self, component: Component) -> Result<Arc<dyn FeedbackSink>> {
        let resolver = self
            .resolver
            .as_ref()
            .ok_or_else(|| Error::NotFound("no feedback sink resolver configured".to_string()))?;
        self.sinks[&component]
            .get_or_resolve(|| resolver.resolve(component))
            .await
    }
}

async fn coordination_loop(shared: Arc<RouterShared>, shutdown: CancellationToken) {
    let interval = shared.settings.drain_interval();
    loop {
        shared.drain_once().await;
        if wait_for_shutdown(&shutdown, interval).await {
            break;
        }
    }
    shared.flush().await;
    debug!("Feedback coordination loop exited");
}

/// Application-layer orchestrator routing feedback signals to their sinks
///
/// Operations: `submit`, `submit_batch`, `get_metrics`, `start`, `stop` and
/// `queue_depths`. The coordination loop starts on the first call (or an
/// explicit `start`) and never at construction.
pub struct FeedbackRouterOrchestrator {
    shared: Arc<RouterShared>,
    task: BackgroundTask,
}

impl FeedbackRouterOrchestrator {
    pub fn new(settings: &FeedbackRouterSettings, lifecycle: &LifecycleSettings) -> Self {
        Self {
            shared: Arc::new(RouterShared::new(settings.clone(), None)),
            task: BackgroundTask::new(FEEDBACK_ROUTER, lifecycle),
        }
    }

    pub fn with_resolver(
        settings: &FeedbackRouterSettings,
        lifecycle: &LifecycleSettings,
        resolver: Arc<dyn SinkResolver>,
    ) -> Self {
        Self {
            shared: Arc::new(RouterShared::new(settings.clone(), Some(resolver))),
            task: BackgroundTask::new(FEEDBACK_ROUTER, lifecycle),
        }
    }

    /// Number of coordination loops spawned by this instance
    pub fn start_count(&self) -> u32 {
        self.task.start_count()
    }

    pub fn is_started(&self) -> bool {
        self.task.is_started()
    }

    fn ensure_started(&self) -> StartStatus {
        let shared = self.shared.clone();
        let status = self.task.ensure_started(move |shutdown| coordination_loop(shared, shutdown));
        if status == StartStatus::Started {
            info!(
                drain_interval_ms = self.shared.settings.drain_interval_ms,
                "Feedback coordination loop started"
            );
        }
        status
    }

    fn submit(&self, params: &Params) -> Result<Value> {
        let signal = FeedbackSignal::from_map(params.as_map())?;
        let component = signal.component;
        let depth = self.shared.enqueue(signal)?;
        Ok(json!({
            "accepted": true,
            "component": component,
            "queue_depth": depth,
        }))
    }

    fn submit_batch(&self, params: &Params) -> Result<Value> {
        let signals = params
            .get("signals")
            .and_then(Value::as_array)
            .ok_or_else(|| Error::Validation("'signals' must be an array".to_string()))?;

        let mut accepted = 0;
        let mut errors = Vec::new();
        for (index, raw) in signals.iter().enumerate() {
            let queued = FeedbackSignal::from_value(raw).and_then(|signal| self.shared.enqueue(signal));
            match queued {
                Ok(_) => accepted += 1,
                Err(e) => errors.push(json!({
                    "index": index,
                    "category": e.category(),
                    "message": e.to_string(),
                })),
            }
        }

        Ok(json!({
            "accepted": accepted,
            "rejected": errors.len(),
            "errors": errors,
        }))
    }

    fn metrics(&self) -> Value {
        let components: BTreeMap<Component, ComponentMetrics> = self.shared.metrics.lock().clone();
        json!({
            "components": components,
            "queue_depths": self.shared.queue_depths(),
            "drain_cycles": self.shared.drain_cycles.load(Ordering::Relaxed),
            "running": self.task.is_started() && !self.task.is_shutdown_requested(),
            "state": self.task.state().to_string(),
        })
    }

    /// Stops the loop after its final flush; returns the signals it never reached
    async fn shutdown(&self) -> Result<u64> {
        let stopped = self.task.shutdown().await;
        let dropped = self.shared.drop_pending();
        stopped.map(|()| dropped)
    }

    async fn stop(&self) -> Result<Value> {
        let dropped = self.shutdown().await?;
        Ok(json!({
            "stopped": true,
            "dropped": dropped,
            "state": self.task.state().to_string(),
        }))
    }
}

#[async_trait]
impl Orchestrator for FeedbackRouterOrchestrator {
    fn name(&self) -> &str {
        FEEDBACK_ROUTER
    }

    fn layer(&self) -> Layer {
        Layer::Application
    }

    fn orchestration_type(&self) -> OrchestrationType {
        OrchestrationType::Feedback
    }

    async fn orchestrate(&self, _context: &OrchestrationContext, params: &Params) -> Outcome {
        let operation = match params.operation() {
            Some(raw) => match raw.parse::<Operation>() {
                Ok(operation) => operation,
                Err(e) => return Outcome::from_error(&e),
            },
            None => return Outcome::validation("missing 'operation' parameter"),
        };

        match operation {
            Operation::Stop => self.stop().await.into(),
            Operation::Start => match self.ensure_started() {
                StartStatus::ShutDown => Outcome::unavailable(STOPPED),
                status => Outcome::success(json!({ "status": status.as_str() })),
            },
            Operation::Submit | Operation::SubmitBatch => {
                if self.ensure_started() == StartStatus::ShutDown {
                    return Outcome::unavailable(STOPPED);
                }
                if operation == Operation::Submit {
                    self.submit(params).into()
                } else {
                    self.submit_batch(params).into()
                }
            }
            Operation::GetMetrics => {
                self.ensure_started();
                Outcome::success(self.metrics())
            }
            Operation::QueueDepths => {
                self.ensure_started();
                Outcome::success(json!(self.shared.queue_depths()))
            }
        }
    }

    fn can_orchestrate(&self, _context: &OrchestrationContext, params: &Params) -> bool {
        params
            .operation()
            .map(|raw| raw.parse::<Operation>().is_ok())
            .unwrap_or(false)
    }

    async fn cleanup(&self) -> Result<()> {
        self.shutdown().await.map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use common::ErrorCategory;

    /// Sink recording every delivered signal
    #[derive(Default)]
    struct RecordingSink {
        delivered: Mutex<Vec<FeedbackSignal>>,
    }

    #[async_trait]
    impl FeedbackSink for RecordingSink {
        async fn deliver(&self, batch: &[FeedbackSignal]) -> Result<()> {
            self.delivered.lock().extend_from_slice(batch);
            Ok(())
        }
    }

    /// Resolves only the routing sink and counts resolutions
    struct RoutingOnly {
        sink: Arc<RecordingSink>,
        resolutions: AtomicU64,
    }

    #[async_trait]
    impl SinkResolver for RoutingOnly {
        async fn resolve(&self, component: Component) -> Result<Arc<dyn FeedbackSink>> {
            self.resolutions.fetch_add(1, Ordering::SeqCst);
            match component {
                Component::Routing => Ok(self.sink.clone() as Arc<dyn FeedbackSink>),
                other => Err(Error::NotFound(format!("no sink for {}", other))),
            }
        }
    }

    fn settings(max_queue_depth: usize) -> FeedbackRouterSettings {
        FeedbackRouterSettings {
            drain_interval_ms: 3_600_000,
            max_queue_depth,
            batch_size: 2,
        }
    }

    fn lifecycle() -> LifecycleSettings {
        LifecycleSettings {
            cleanup_timeout_ms: 1_000,
            abort_grace_ms: 200,
        }
    }

    fn signal(component: &str, value: f64) -> Params {
        Params::new()
            .with("operation", "submit")
            .with("component", component)
            .with("signal_type", "latency")
            .with("value", value)
    }

    fn ctx() -> OrchestrationContext {
        OrchestrationContext::new("tenant")
    }

    #[tokio::test]
    async fn test_operation_routing() {
        let router = FeedbackRouterOrchestrator::new(&settings(10), &lifecycle());

        let bogus = router.orchestrate(&ctx(), &Params::new().with("operation", "bogus")).await;
        assert_eq!(bogus.error_category(), Some(ErrorCategory::Validation));

        let missing = router.orchestrate(&ctx(), &Params::new()).await;
        assert_eq!(missing.error_category(), Some(ErrorCategory::Validation));
        assert!(!router.is_started());

        let metrics = router.orchestrate(&ctx(), &Params::new().with("operation", "get_metrics")).await;
        assert_eq!(metrics.data().unwrap()["running"], json!(true));
        assert_eq!(router.start_count(), 1);

        router.cleanup().await.unwrap();
    }

    #[tokio::test]
    async fn test_submit_validation_and_bounded_queue() {
        let router = FeedbackRouterOrchestrator::new(&settings(2), &lifecycle());

        let unknown = router.orchestrate(&ctx(), &signal("billing", 1.0)).await;
        assert_eq!(unknown.error_category(), Some(ErrorCategory::Validation));

        let no_value = Params::new()
            .with("operation", "submit")
            .with("component", "prompt")
            .with("signal_type", "rating");
        assert_eq!(
            router.orchestrate(&ctx(), &no_value).await.error_category(),
            Some(ErrorCategory::Validation)
        );

        assert!(router.orchestrate(&ctx(), &signal("prompt", 1.0)).await.succeeded());
        let second = router.orchestrate(&ctx(), &signal("prompt", 2.0)).await;
        assert_eq!(second.data().unwrap()["queue_depth"], json!(2));

        let overflow = router.orchestrate(&ctx(), &signal("prompt", 3.0)).await;
        assert_eq!(overflow.error_category(), Some(ErrorCategory::Unavailable));

        // other components have their own bound
        assert!(router.orchestrate(&ctx(), &signal("memory", 1.0)).await.succeeded());

        let depths = router
            .orchestrate(&ctx(), &Params::new().with("operation", "queue_depths"))
            .await;
        assert_eq!(depths.data().unwrap()["prompt"], json!(2));
        assert_eq!(depths.data().unwrap()["memory"], json!(1));

        router.cleanup().await.unwrap();
    }

    #[tokio::test]
    async fn test_submit_batch_reports_per_signal_errors() {
        let router = FeedbackRouterOrchestrator::new(&settings(10), &lifecycle());
        let params = Params::new().with("operation", "submit_batch").with(
            "signals",
            json!([
                {"component": "routing", "signal_type": "choice", "value": 1},
                {"component": "quality", "signal_type": "score", "value": 0.4, "metadata": {"model": "m"}},
                {"component": "nowhere", "signal_type": "x", "value": 0},
                "not an object"
            ]),
        );

        let data = router.orchestrate(&ctx(), &params).await.data().cloned().unwrap();
        assert_eq!(data["accepted"], json!(2));
        assert_eq!(data["rejected"], json!(2));
        assert_eq!(data["errors"][0]["index"], json!(2));
        assert_eq!(data["errors"][0]["category"], json!("validation"));

        let not_array = Params::new().with("operation", "submit_batch").with("signals", "x");
        assert_eq!(
            router.orchestrate(&ctx(), &not_array).await.error_category(),
            Some(ErrorCategory::Validation)
        );
        router.cleanup().await.unwrap();
    }

    #[tokio::test]
    async fn test_drain_delivers_in_batches_and_counts_undeliverable() {
        let sink = Arc::new(RecordingSink::default());
        let resolver = Arc::new(RoutingOnly {
            sink: sink.clone(),
            resolutions: AtomicU64::new(0),
        });
        let shared = RouterShared::new(settings(10), Some(resolver.clone()));

        for value in [1.0, 2.0, 3.0] {
            shared.enqueue(FeedbackSignal::from_map(signal("routing", value).as_map()).unwrap()).unwrap();
        }
        shared.enqueue(FeedbackSignal::from_map(signal("memory", 9.0).as_map()).unwrap()).unwrap();

        shared.drain_once().await;
        assert_eq!(sink.delivered.lock().len(), 2);
        assert_eq!(shared.queue_depths()[&Component::Routing], 1);
        assert_eq!(shared.queue_depths()[&Component::Memory], 0);

        shared.drain_once().await;
        let delivered: Vec<f64> = sink.delivered.lock().iter().map(|s| s.value).collect();
        assert_eq!(delivered, vec![1.0, 2.0, 3.0]);

        let metrics = shared.metrics.lock().clone();
        assert_eq!(metrics[&Component::Routing].delivered, 3);
        assert_eq!(metrics[&Component::Memory].undeliverable, 1);

        // memory has no sink and its queue is empty after the first cycle
        assert_eq!(resolver.resolutions.load(Ordering::SeqCst), 2);
        assert_eq!(shared.drain_cycles.load(Ordering::Relaxed), 2);
    }

    #[tokio::test]
    async fn test_background_loop_drains_queue() {
        let sink = Arc::new(RecordingSink::default());
        let resolver = Arc::new(RoutingOnly {
            sink: sink.clone(),
            resolutions: AtomicU64::new(0),
        });
        let fast = FeedbackRouterSettings {
            drain_interval_ms: 10,
            max_queue_depth: 10,
            batch_size: 50,
        };
        let router = FeedbackRouterOrchestrator::with_resolver(&fast, &lifecycle(), resolver);

        assert!(router.orchestrate(&ctx(), &signal("routing", 0.5)).await.succeeded());

        tokio::time::timeout(Duration::from_secs(2), async {
            while sink.delivered.lock().is_empty() {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .unwrap();

        router.cleanup().await.unwrap();
    }

    #[tokio::test]
    async fn test_stop_then_submit_is_unavailable() {
        let router = FeedbackRouterOrchestrator::new(&settings(10), &lifecycle());

        let started = router.orchestrate(&ctx(), &Params::new().with("operation", "start")).await;
        assert_eq!(started.data().unwrap()["status"], json!("started"));
        let again = router.orchestrate(&ctx(), &Params::new().with("operation", "start")).await;
        assert_eq!(again.data().unwrap()["status"], json!("already_running"));

        let stopped = router.orchestrate(&ctx(), &Params::new().with("operation", "stop")).await;
        assert_eq!(stopped.data().unwrap()["stopped"], json!(true));

        let late = router.orchestrate(&ctx(), &signal("routing", 1.0)).await;
        assert_eq!(late.error_category(), Some(ErrorCategory::Unavailable));

        // cleanup after stop is a no-op
        router.cleanup().await.unwrap();
        assert_eq!(router.start_count(), 1);
    }

    #[tokio::test]
    async fn test_stop_flushes_queued_signals() {
        let sink = Arc::new(RecordingSink::default());
        let resolver = Arc::new(RoutingOnly {
            sink: sink.clone(),
            resolutions: AtomicU64::new(0),
        });
        let router = FeedbackRouterOrchestrator::with_resolver(&settings(10), &lifecycle(), resolver);

        let started = router.orchestrate(&ctx(), &Params::new().with("operation", "start")).await;
        assert!(started.succeeded());
        // let the first drain cycle pass so the signals wait out the long interval
        tokio::time::sleep(Duration::from_millis(20)).await;

        for value in [1.0, 2.0, 3.0] {
            let accepted = router.orchestrate(&ctx(), &signal("routing", value)).await;
            assert_eq!(accepted.data().unwrap()["accepted"], json!(true));
        }

        router.cleanup().await.unwrap();

        let delivered: Vec<f64> = sink.delivered.lock().iter().map(|s| s.value).collect();
        assert_eq!(delivered, vec![1.0, 2.0, 3.0]);
        assert_eq!(router.shared.pending(), 0);

        let metrics = router.shared.metrics.lock()[&Component::Routing].clone();
        assert_eq!(metrics.submitted, 3);
        assert_eq!(metrics.delivered, 3);
        assert_eq!(metrics.dropped, 0);
    }

    #[tokio::test]
    async fn test_unflushed_signals_are_counted_dropped() {
        let router = FeedbackRouterOrchestrator::new(&settings(10), &lifecycle());

        // enqueued without starting the loop, so no flush ever runs
        for value in [1.0, 2.0] {
            router
                .shared
                .enqueue(FeedbackSignal::from_map(signal("quality", value).as_map()).unwrap())
                .unwrap();
        }

        let stopped = router.orchestrate(&ctx(), &Params::new().with("operation", "stop")).await;
        assert_eq!(stopped.data().unwrap()["dropped"], json!(2));

        let metrics = router.shared.metrics.lock()[&Component::Quality].clone();
        assert_eq!(metrics.dropped, 2);
        assert_eq!(router.shared.pending(), 0);
    }
}

//! Health monitoring orchestrator
//!
//! Polls a set of [`HealthProbe`] collaborators from a background loop and keeps
//! the latest health of each component. Each probe is bounded by the probe
//! timeout so one stuck dependency cannot stall a polling cycle.

use std::collections::BTreeMap;
use std::str::FromStr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures::future::join_all;
use parking_lot::RwLock;
use serde::Serialize;
use serde_json::{json, Value};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use common::utils::execute_with_timeout;
use common::{Error, Layer, OrchestrationType, Outcome, Params, Result};
use orchestration_config::{HealthMonitorSettings, LifecycleSettings};
use orchestrator_core::{
    wait_for_shutdown, BackgroundTask, OrchestrationContext, Orchestrator, StartStatus,
};

/// Registry name of [`HealthMonitorOrchestrator`]
pub const HEALTH_MONITOR: &str = "health-monitor";

const SHUT_DOWN: &str = "health monitor has been shut down";

/// Liveness check against one dependency
#[async_trait]
pub trait HealthProbe: Send + Sync {
    /// Component name reported in the health snapshot
    fn component(&self) -> &str;

    /// Returns a short detail string when healthy
    async fn check(&self) -> Result<String>;
}

/// Latest known health of one component
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComponentHealth {
    pub healthy: bool,
    pub detail: String,
    pub checked_at: DateTime<Utc>,
    pub consecutive_failures: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Operation {
    Status,
    CheckNow,
    Start,
}

impl FromStr for Operation {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "status" => Ok(Operation::Status),
            "check_now" => Ok(Operation::CheckNow),
            "start" => Ok(Operation::Start),
            other => Err(Error::Validation(format!("unknown operation '{}'", other))),
        }
    }
}

struct MonitorShared {
    probes: RwLock<Vec<Arc<dyn HealthProbe>>>,
    components: RwLock<BTreeMap<String, ComponentHealth>>,
    last_check: RwLock<Option<DateTime<Utc>>>,
    checks_run: AtomicU64,
    probe_timeout: Duration,
}

impl MonitorShared {
    /// Runs every probe concurrently and records the results
    async fn check_all(&self) {
        let probes = self.probes.read().clone();
        let results = join_all(probes.iter().map(|probe| async move {
            let result = execute_with_timeout(probe.check(), self.probe_timeout, probe.component()).await;
            (probe.component().to_string(), result)
        }))
        .await;

        let now = Utc::now();
        let mut components = self.components.write();
        for (component, result) in results {
            let previous_failures = components
                .get(&component)
                .map(|health| health.consecutive_failures)
                .unwrap_or(0);

            let health = match result {
                Ok(detail) => ComponentHealth {
                    healthy: true,
                    detail,
                    checked_at: now,
                    consecutive_failures: 0,
                },
                Err(e) => {
                    warn!(component = %component, "Health probe failed: {}", e);
                    ComponentHealth {
                        healthy: false,
                        detail: e.to_string(),
                        checked_at: now,
                        consecutive_failures: previous_failures.saturating_add(1),
                    }
                }
            };
            components.insert(component, health);
        }
        drop(components);

        *self.last_check.write() = Some(now);
        self.checks_run.fetch_add(1, Ordering::Relaxed);
        debug!(probes = probes.len(), "Health check cycle complete");
    }

    fn is_healthy(&self) -> bool {
        self.components.read().values().all(|health| health.healthy)
    }

    fn snapshot(&self) -> Value {
        json!({
            "healthy": self.is_healthy(),
            "components": *self.components.read(),
            "last_check": *self.last_check.read(),
            "checks_run": self.checks_run.load(Ordering::Relaxed),
        })
    }
}

async fn polling_loop(shared: Arc<MonitorShared>, interval: Duration, shutdown: CancellationToken) {
    loop {
        shared.check_all().await;
        if wait_for_shutdown(&shutdown, interval).await {
            break;
        }
    }
    debug!("Health polling loop exited");
}

/// Infrastructure-layer orchestrator polling health probes
///
/// Operations: `status` (the default), `check_now` and `start`.
pub struct HealthMonitorOrchestrator {
    shared: Arc<MonitorShared>,
    interval: Duration,
    task: BackgroundTask,
}

impl HealthMonitorOrchestrator {
    pub fn new(settings: &HealthMonitorSettings, lifecycle: &LifecycleSettings) -> Self {
        Self {
            shared: Arc::new(MonitorShared {
                probes: RwLock::new(Vec::new()),
                components: RwLock::new(BTreeMap::new()),
                last_check: RwLock::new(None),
                checks_run: AtomicU64::new(0),
                probe_timeout: settings.probe_timeout(),
            }),
            interval: settings.interval(),
            task: BackgroundTask::new(HEALTH_MONITOR, lifecycle),
        }
    }

    /// Adds probes, picked up from the next check cycle
    pub fn with_probes(self, probes: impl IntoIterator<Item = Arc<dyn HealthProbe>>) -> Self {
        self.shared.probes.write().extend(probes);
        self
    }

    /// Number of polling loops spawned by this instance
    pub fn start_count(&self) -> u32 {
        self.task.start_count()
    }

    pub fn is_started(&self) -> bool {
        self.task.is_started()
    }

    /// Latest health of one component
    pub fn component_health(&self, component: &str) -> Option<ComponentHealth> {
        self.shared.components.read().get(component).cloned()
    }

    fn ensure_started(&self) -> StartStatus {
        let shared = self.shared.clone();
        let interval = self.interval;
        let status = self
            .task
            .ensure_started(move |shutdown| polling_loop(shared, interval, shutdown));
        if status == StartStatus::Started {
            info!(
                probes = self.shared.probes.read().len(),
                interval_ms = self.interval.as_millis() as u64,
                "Health polling started"
            );
        }
        status
    }
}

#[async_trait]
impl Orchestrator for HealthMonitorOrchestrator {
    fn name(&self) -> &str {
        HEALTH_MONITOR
    }

    fn layer(&self) -> Layer {
        Layer::Infrastructure
    }

    fn orchestration_type(&self) -> OrchestrationType {
        OrchestrationType::Monitoring
    }

    async fn orchestrate(&self, _context: &OrchestrationContext, params: &Params) -> Outcome {
        let operation = match params.operation().map(str::parse).unwrap_or(Ok(Operation::Status)) {
            Ok(operation) => operation,
            Err(e) => return Outcome::from_error(&e),
        };

        let status = self.ensure_started();
        if status == StartStatus::ShutDown {
            return Outcome::unavailable(SHUT_DOWN);
        }

        match operation {
            Operation::Status => Outcome::success(self.shared.snapshot()),
            Operation::CheckNow => {
                self.shared.check_all().await;
                Outcome::success(self.shared.snapshot())
            }
            Operation::Start => Outcome::success(json!({ "status": status.as_str() })),
        }
    }

    async fn cleanup(&self) -> Result<()> {
        self.task.shutdown().await
    }
}

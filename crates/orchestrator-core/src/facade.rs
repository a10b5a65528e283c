//! Orchestration facade
//!
//! The facade is the registry of every orchestrator in the process and the only
//! dispatch path into them. One instance is created at the outermost wiring
//! point and handed to whatever needs it; orchestrators that call other
//! orchestrators hold a `Weak` reference to it.
//!
//! Registry mutations and lookups go through a single `RwLock`, so a lookup never
//! observes a half-registered entry. Dispatch clones the orchestrator's `Arc` and
//! releases the lock before the orchestrator body runs.

use std::collections::{BTreeMap, HashMap};
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::{Duration, Instant};

use futures::FutureExt;
use parking_lot::RwLock;
use thiserror::Error;
use tracing::{debug, error, info, info_span, warn, Instrument};

use common::utils::format_duration;
use common::{ErrorCategory, Layer, Outcome, Params};
use logging::events::{self, StartEvent};
use orchestration_config::FacadeSettings;

use crate::context::OrchestrationContext;
use crate::metrics::{DispatchMetrics, DispatchStats};
use crate::orchestrator::{Orchestrator, OrchestratorInfo};

/// Registry bookkeeping failures
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FacadeError {
    #[error("orchestrator '{0}' is already registered")]
    DuplicateName(String),

    #[error("orchestrator '{0}' is not registered")]
    NotFound(String),

    #[error("orchestrator names must not be empty")]
    InvalidName,
}

impl FacadeError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            FacadeError::DuplicateName(_) | FacadeError::InvalidName => ErrorCategory::Validation,
            FacadeError::NotFound(_) => ErrorCategory::NotFound,
        }
    }
}

impl From<FacadeError> for common::Error {
    fn from(err: FacadeError) -> Self {
        match &err {
            FacadeError::NotFound(name) => common::Error::NotFound(format!("orchestrator '{}'", name)),
            FacadeError::DuplicateName(_) => common::Error::AlreadyExists(err.to_string()),
            FacadeError::InvalidName => common::Error::Validation(err.to_string()),
        }
    }
}

struct Registration {
    orchestrator: Arc<dyn Orchestrator>,
    info: OrchestratorInfo,
}

#[derive(Default)]
struct Registry {
    by_name: HashMap<String, Registration>,
    by_layer: HashMap<Layer, Vec<String>>,
    /// Registration order, used for reverse-order teardown
    order: Vec<String>,
}

impl Registry {
    fn remove(&mut self, name: &str) -> Option<Registration> {
        let registration = self.by_name.remove(name)?;
        if let Some(names) = self.by_layer.get_mut(&registration.info.layer) {
            names.retain(|n| n != name);
        }
        self.order.retain(|n| n != name);
        Some(registration)
    }
}

/// Process-wide registry and dispatch point
pub struct OrchestrationFacade {
    registry: RwLock<Registry>,
    metrics: DispatchMetrics,
    settings: FacadeSettings,
}

impl OrchestrationFacade {
    /// Creates an empty facade with default settings
    pub fn new() -> Self {
        Self::with_settings(FacadeSettings::default())
    }

    pub fn with_settings(settings: FacadeSettings) -> Self {
        Self {
            registry: RwLock::new(Registry::default()),
            metrics: DispatchMetrics::new(),
            settings,
        }
    }

    /// Registers an orchestrator under its name
    ///
    /// A duplicate name is rejected and the existing registration is kept.
    pub fn register(&self, orchestrator: Arc<dyn Orchestrator>) -> Result<(), FacadeError> {
        let name = orchestrator.name().to_string();
        if name.trim().is_empty() {
            return Err(FacadeError::InvalidName);
        }
        let info = orchestrator.info();

        {
            let mut registry = self.registry.write();
            if registry.by_name.contains_key(&name) {
                warn!(name = %name, "Rejected duplicate orchestrator registration");
                return Err(FacadeError::DuplicateName(name));
            }
            registry.by_layer.entry(info.layer).or_default().push(name.clone());
            registry.order.push(name.clone());
            registry.by_name.insert(name.clone(), Registration { orchestrator, info });
            self.metrics.remove(&name);
        }

        info!(
            name = %name,
            layer = %info.layer,
            orchestration_type = %info.orchestration_type,
            "Orchestrator registered"
        );
        Ok(())
    }

    /// Removes an orchestrator from the registry
    ///
    /// Teardown is not performed here; callers that want it call `cleanup` on
    /// the orchestrator first.
    pub fn unregister(&self, name: &str) -> Result<Arc<dyn Orchestrator>, FacadeError> {
        let removed = self.registry.write().remove(name);
        match removed {
            Some(registration) => {
                self.metrics.remove(name);
                info!(name = %name, "Orchestrator unregistered");
                Ok(registration.orchestrator)
            }
            None => Err(FacadeError::NotFound(name.to_string())),
        }
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Orchestrator>> {
        self.registry
            .read()
            .by_name
            .get(name)
            .map(|registration| registration.orchestrator.clone())
    }

    /// Orchestrators of one layer, in registration order
    pub fn get_by_layer(&self, layer: Layer) -> Vec<Arc<dyn Orchestrator>> {
        let registry = self.registry.read();
        registry
            .by_layer
            .get(&layer)
            .map(|names| {
                names
                    .iter()
                    .filter_map(|name| registry.by_name.get(name))
                    .map(|registration| registration.orchestrator.clone())
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Name to layer/type map of every registered orchestrator
    pub fn list_orchestrators(&self) -> BTreeMap<String, OrchestratorInfo> {
        self.registry
            .read()
            .by_name
            .iter()
            .map(|(name, registration)| (name.clone(), registration.info))
            .collect()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.registry.read().by_name.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.registry.read().by_name.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn settings(&self) -> &FacadeSettings {
        &self.settings
    }

    /// Eligibility probe; unknown names are never eligible
    pub fn can_orchestrate(&self, name: &str, context: &OrchestrationContext, params: &Params) -> bool {
        self.get(name)
            .map(|orchestrator| orchestrator.can_orchestrate(context, params))
            .unwrap_or(false)
    }

    /// Dispatches one call to the named orchestrator
    ///
    /// Never panics. Unknown names yield a `not_found` outcome; a context deeper
    /// than the configured bound or a panic in the orchestrator body yields an
    /// `internal` outcome. Otherwise the orchestrator's own outcome is returned
    /// unchanged.
    pub async fn orchestrate(&self, name: &str, context: &OrchestrationContext, params: &Params) -> Outcome {
        self.dispatch(name, context, params, None).await
    }

    /// Like [`orchestrate`](Self::orchestrate) with the orchestrator body bounded in time
    ///
    /// `bound` falls back to the configured dispatch timeout; with neither the
    /// call is unbounded. Exceeding the bound yields a `timeout` outcome.
    pub async fn orchestrate_with_timeout(
        &self,
        name: &str,
        context: &OrchestrationContext,
        params: &Params,
        bound: Option<Duration>,
    ) -> Outcome {
        let bound = bound.or_else(|| self.settings.dispatch_timeout());
        self.dispatch(name, context, params, bound).await
    }

    /// Dispatches a nested call on behalf of `caller`, deriving the child context
    pub async fn orchestrate_child(
        &self,
        caller: &str,
        parent_context: &OrchestrationContext,
        name: &str,
        params: &Params,
    ) -> Outcome {
        let child = parent_context.child(caller);
        self.orchestrate(name, &child, params).await
    }

    async fn dispatch(
        &self,
        name: &str,
        context: &OrchestrationContext,
        params: &Params,
        bound: Option<Duration>,
    ) -> Outcome {
        let Some((orchestrator, info)) = self.lookup(name) else {
            warn!(
                name = %name,
                request_id = %context.request_id(),
                "Dispatch to unknown orchestrator"
            );
            return Outcome::not_found(format!("orchestrator '{}' is not registered", name));
        };

        let span = info_span!(
            "orchestration",
            name = %name,
            request_id = %context.request_id(),
            depth = context.depth()
        );

        async move {
            events::orchestration_start(&StartEvent {
                name,
                layer: info.layer,
                orchestration_type: info.orchestration_type,
                tenant_id: context.tenant_id(),
                request_id: context.request_id(),
                trace_id: context.trace_id(),
                depth: context.depth(),
            });

            let started = Instant::now();
            let outcome = if context.depth() > self.settings.max_depth {
                error!(
                    depth = context.depth(),
                    max_depth = self.settings.max_depth,
                    parent = ?context.parent_orchestrator(),
                    "Runaway recursion detected"
                );
                Outcome::internal(format!(
                    "call depth {} exceeds the maximum of {}",
                    context.depth(),
                    self.settings.max_depth
                ))
            } else {
                invoke(name, orchestrator.as_ref(), context, params, bound).await
            };
            let elapsed = started.elapsed();

            events::orchestration_end(name, &outcome, elapsed);
            self.record(name, &orchestrator, &outcome, elapsed);
            outcome
        }
        .instrument(span)
        .await
    }

    /// Counts a dispatch only while the same instance is still registered
    fn record(&self, name: &str, orchestrator: &Arc<dyn Orchestrator>, outcome: &Outcome, elapsed: Duration) {
        let registry = self.registry.read();
        let current = registry
            .by_name
            .get(name)
            .is_some_and(|registration| same_instance(&registration.orchestrator, orchestrator));
        if current {
            self.metrics.record(name, outcome, elapsed);
        } else {
            debug!(name = %name, "Orchestrator unregistered during dispatch, metrics discarded");
        }
    }

    fn lookup(&self, name: &str) -> Option<(Arc<dyn Orchestrator>, OrchestratorInfo)> {
        self.registry
            .read()
            .by_name
            .get(name)
            .map(|registration| (registration.orchestrator.clone(), registration.info))
    }

    /// Cleans up and unregisters every orchestrator in reverse registration order
    ///
    /// Cleanup faults (errors or panics) are logged and counted but never stop
    /// the remaining teardown. Returns the number of faults.
    pub async fn shutdown_all(&self) -> usize {
        let order: Vec<String> = self.registry.read().order.iter().rev().cloned().collect();
        info!(count = order.len(), "Shutting down all orchestrators");

        let mut faults = 0;
        for name in order {
            let Some(orchestrator) = self.get(&name) else {
                continue;
            };

            match AssertUnwindSafe(orchestrator.cleanup()).catch_unwind().await {
                Ok(Ok(())) => debug!(name = %name, "Orchestrator cleaned up"),
                Ok(Err(e)) => {
                    faults += 1;
                    error!(name = %name, "Orchestrator cleanup failed: {}", e);
                }
                Err(panic) => {
                    faults += 1;
                    error!(name = %name, "Orchestrator cleanup panicked: {}", panic_message(&panic));
                }
            }

            if let Err(e) = self.unregister(&name) {
                debug!(name = %name, "Already unregistered during shutdown: {}", e);
            }
        }
        faults
    }

    /// Dispatch counters for one orchestrator
    pub fn metrics_for(&self, name: &str) -> Option<DispatchStats> {
        self.metrics.get(name)
    }

    /// Dispatch counters for every orchestrator that has been called
    pub fn metrics(&self) -> BTreeMap<String, DispatchStats> {
        self.metrics.snapshot()
    }
}

impl Default for OrchestrationFacade {
    fn default() -> Self {
        Self::new()
    }
}

async fn invoke(
    name: &str,
    orchestrator: &dyn Orchestrator,
    context: &OrchestrationContext,
    params: &Params,
    bound: Option<Duration>,
) -> Outcome {
    let call = AssertUnwindSafe(orchestrator.orchestrate(context, params)).catch_unwind();

    let result = match bound {
        Some(bound) => match tokio::time::timeout(bound, call).await {
            Ok(result) => result,
            Err(_) => {
                return Outcome::timeout(format!(
                    "orchestrator '{}' did not finish within {}",
                    name,
                    format_duration(bound)
                ))
            }
        },
        None => call.await,
    };

    match result {
        Ok(outcome) => outcome,
        Err(panic) => {
            let message = panic_message(&panic);
            error!(name = %name, "Orchestrator panicked: {}", message);
            Outcome::internal(format!("orchestrator '{}' panicked: {}", name, message))
        }
    }
}

fn same_instance(a: &Arc<dyn Orchestrator>, b: &Arc<dyn Orchestrator>) -> bool {
    std::ptr::eq(Arc::as_ptr(a) as *const (), Arc::as_ptr(b) as *const ())
}

fn panic_message(panic: &Box<dyn std::any::Any + Send>) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic payload".to_string()
    }
}

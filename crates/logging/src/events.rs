//! Structured dispatch events
//!
//! The facade emits exactly two events around every dispatch. Consumers key on
//! the `event` field and the `orchestration` target.

use std::time::Duration;
use tracing::{error, info, warn};

use common::utils::duration_ms;
use common::{ErrorCategory, Layer, OrchestrationType, Outcome};

/// Target of every dispatch event
pub const TARGET: &str = "orchestration";

pub const START_EVENT: &str = "orchestration_start";
pub const END_EVENT: &str = "orchestration_end";

/// Fields of an `orchestration_start` event
#[derive(Debug, Clone, Copy)]
pub struct StartEvent<'a> {
    pub name: &'a str,
    pub layer: Layer,
    pub orchestration_type: OrchestrationType,
    pub tenant_id: &'a str,
    pub request_id: &'a str,
    pub trace_id: Option<&'a str>,
    pub depth: u32,
}

/// Emits `orchestration_start`
pub fn orchestration_start(event: &StartEvent<'_>) {
    info!(
        target: TARGET,
        event = START_EVENT,
        name = event.name,
        layer = %event.layer,
        "type" = %event.orchestration_type,
        tenant_id = event.tenant_id,
        request_id = event.request_id,
        trace_id = event.trace_id,
        depth = event.depth,
        "Orchestration started"
    );
}

/// Emits `orchestration_end`; failures are logged at `warn`, internal faults at `error`
pub fn orchestration_end(name: &str, outcome: &Outcome, elapsed: Duration) {
    let duration_ms = duration_ms(elapsed);
    match outcome.error() {
        None => info!(
            target: TARGET,
            event = END_EVENT,
            name,
            success = true,
            duration_ms,
            "Orchestration finished"
        ),
        Some(err) if err.category == ErrorCategory::Internal => error!(
            target: TARGET,
            event = END_EVENT,
            name,
            success = false,
            error_category = err.category.as_str(),
            error_message = %err.message,
            duration_ms,
            "Orchestration failed with an internal fault"
        ),
        Some(err) => warn!(
            target: TARGET,
            event = END_EVENT,
            name,
            success = false,
            error_category = err.category.as_str(),
            error_message = %err.message,
            duration_ms,
            "Orchestration failed"
        ),
    }
}

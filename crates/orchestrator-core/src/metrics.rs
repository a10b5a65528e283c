//! Dispatch metrics for the facade
//!
//! Per-orchestrator counters updated on every dispatch. Kept in a concurrent map
//! separate from the registry so recording never contends with registration.

use std::collections::BTreeMap;
use std::time::Duration;
use dashmap::DashMap;
use serde::Serialize;

use common::utils::duration_ms;
use common::{ErrorCategory, Outcome};

/// Counters for one orchestrator
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DispatchStats {
    pub calls: u64,
    pub successes: u64,
    pub failures: u64,
    pub total_duration_ms: u64,
    pub max_duration_ms: u64,
    pub last_error_category: Option<ErrorCategory>,
}

impl DispatchStats {
    /// Mean wall time per call in milliseconds
    pub fn average_duration_ms(&self) -> f64 {
        if self.calls == 0 {
            0.0
        } else {
            self.total_duration_ms as f64 / self.calls as f64
        }
    }

    /// Fraction of calls that succeeded, 1.0 when nothing was called yet
    pub fn success_rate(&self) -> f64 {
        if self.calls == 0 {
            1.0
        } else {
            self.successes as f64 / self.calls as f64
        }
    }
}

/// Metrics registry keyed by orchestrator name
#[derive(Debug, Default)]
pub struct DispatchMetrics {
    stats: DashMap<String, DispatchStats>,
}

impl DispatchMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records the outcome of one dispatch
    pub fn record(&self, name: &str, outcome: &Outcome, elapsed: Duration) {
        let elapsed_ms = duration_ms(elapsed);
        let mut entry = self.stats.entry(name.to_string()).or_default();
        entry.calls = entry.calls.saturating_add(1);
        entry.total_duration_ms = entry.total_duration_ms.saturating_add(elapsed_ms);
        entry.max_duration_ms = entry.max_duration_ms.max(elapsed_ms);
        match outcome.error_category() {
            None => entry.successes = entry.successes.saturating_add(1),
            Some(category) => {
                entry.failures = entry.failures.saturating_add(1);
                entry.last_error_category = Some(category);
            }
        }
    }

    pub fn get(&self, name: &str) -> Option<DispatchStats> {
        self.stats.get(name).map(|entry| entry.clone())
    }

    pub fn remove(&self, name: &str) {
        self.stats.remove(name);
    }

    /// Point-in-time copy of every counter, sorted by name
    pub fn snapshot(&self) -> BTreeMap<String, DispatchStats> {
        self.stats
            .iter()
            .map(|entry| (entry.key().clone(), entry.value().clone()))
            .collect()
    }
}

//! Per-request orchestration context
//!
//! A context is created once by the outermost caller and threaded through every
//! nested call. It is never mutated in place: nested orchestrator-to-orchestrator
//! calls derive a child with [`OrchestrationContext::child`].

use std::collections::HashMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

/// Identity and call-hierarchy bookkeeping for one external request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrchestrationContext {
    tenant_id: String,
    request_id: String,
    trace_id: Option<String>,
    metadata: HashMap<String, Value>,
    parent_orchestrator: Option<String>,
    depth: u32,
}

impl OrchestrationContext {
    /// Creates a root context (depth 0) with a freshly generated request id
    pub fn new(tenant_id: impl Into<String>) -> Self {
        Self {
            tenant_id: tenant_id.into(),
            request_id: Uuid::new_v4().to_string(),
            trace_id: None,
            metadata: HashMap::new(),
            parent_orchestrator: None,
            depth: 0,
        }
    }

    /// Overrides the generated request id with a caller-supplied one
    pub fn with_request_id(mut self, request_id: impl Into<String>) -> Self {
        self.request_id = request_id.into();
        self
    }

    pub fn with_trace_id(mut self, trace_id: impl Into<String>) -> Self {
        self.trace_id = Some(trace_id.into());
        self
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    /// Derives the context for a nested call made by `caller`
    ///
    /// All identity fields and metadata are copied; `parent_orchestrator` names the
    /// caller and `depth` is exactly one more than this context's.
    pub fn child(&self, caller: &str) -> Self {
        Self {
            tenant_id: self.tenant_id.clone(),
            request_id: self.request_id.clone(),
            trace_id: self.trace_id.clone(),
            metadata: self.metadata.clone(),
            parent_orchestrator: Some(caller.to_string()),
            depth: self.depth.saturating_add(1),
        }
    }

    pub fn tenant_id(&self) -> &str {
        &self.tenant_id
    }

    pub fn request_id(&self) -> &str {
        &self.request_id
    }

    pub fn trace_id(&self) -> Option<&str> {
        self.trace_id.as_deref()
    }

    pub fn metadata(&self) -> &HashMap<String, Value> {
        &self.metadata
    }

    pub fn metadata_value(&self, key: &str) -> Option<&Value> {
        self.metadata.get(key)
    }

    pub fn parent_orchestrator(&self) -> Option<&str> {
        self.parent_orchestrator.as_deref()
    }

    pub fn depth(&self) -> u32 {
        self.depth
    }

    /// True for the context created at the request entry point
    pub fn is_root(&self) -> bool {
        self.depth == 0
    }
}

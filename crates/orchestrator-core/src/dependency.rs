//! Lazily resolved collaborator handles
//!
//! Orchestrators reach external collaborators (routers, stores, transports)
//! through handles they own. A handle is resolved on first use and memoized, so
//! each orchestrator instance resolves a given dependency at most once.

use std::future::Future;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use tokio::sync::OnceCell;
use tracing::{debug, warn};

use common::error::Result;

/// Memoized handle on a collaborator
pub struct LazyDependency<T: ?Sized> {
    name: String,
    cell: OnceCell<Arc<T>>,
    attempts: AtomicU32,
}

impl<T: ?Sized + Send + Sync> LazyDependency<T> {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            cell: OnceCell::new(),
            attempts: AtomicU32::new(0),
        }
    }

    /// Returns the memoized handle, running `resolver` if none exists yet
    ///
    /// Concurrent callers wait for a single in-flight resolution. A failed
    /// resolution is not memoized and is retried by the next caller.
    pub async fn get_or_resolve<F, Fut>(&self, resolver: F) -> Result<Arc<T>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Arc<T>>>,
    {
        self.cell
            .get_or_try_init(|| async {
                self.attempts.fetch_add(1, Ordering::SeqCst);
                match resolver().await {
                    Ok(resolved) => {
                        debug!(dependency = %self.name, "Dependency resolved");
                        Ok(resolved)
                    }
                    Err(e) => {
                        warn!(dependency = %self.name, "Dependency resolution failed: {}", e);
                        Err(e)
                    }
                }
            })
            .await
            .cloned()
    }

    /// The handle if it has been resolved
    pub fn get(&self) -> Option<Arc<T>> {
        self.cell.get().cloned()
    }

    pub fn is_resolved(&self) -> bool {
        self.cell.initialized()
    }

    /// Number of times a resolver actually ran
    pub fn resolution_attempts(&self) -> u32 {
        self.attempts.load(Ordering::SeqCst)
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

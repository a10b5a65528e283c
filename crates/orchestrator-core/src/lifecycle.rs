//! Background-task lifecycle discipline
//!
//! Orchestrators that own background work (health loops, queue drains,
//! coordination loops) hold one [`BackgroundTask`] per loop. It enforces the
//! rules every such orchestrator must follow:
//!
//! - lazy start: work is spawned from the first `orchestrate` call, never from a
//!   constructor, and start is deferred when no Tokio runtime exists yet
//! - idempotent start: a compare-and-swap on `started` allows exactly one spawn
//! - single-fire cooperative shutdown through a [`CancellationToken`]
//! - bounded teardown: wait for the loop to exit, then abort it, then give the
//!   abort a short bounded grace period

use std::future::Future;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::time::Duration;

use parking_lot::{Mutex, RwLock};
use tokio::runtime::Handle;
use tokio::task::{JoinError, JoinHandle};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use common::error::{Error, Result};
use common::utils::format_duration;
use orchestration_config::LifecycleSettings;

use crate::state::LifecycleState;

/// Result of a start attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartStatus {
    /// This call spawned the background unit
    Started,
    /// The unit was already started by an earlier call
    AlreadyRunning,
    /// No runtime is available yet; the next call will retry
    Deferred,
    /// Shutdown already fired; a new instance is required
    ShutDown,
}

impl StartStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            StartStatus::Started => "started",
            StartStatus::AlreadyRunning => "already_running",
            StartStatus::Deferred => "deferred",
            StartStatus::ShutDown => "shut_down",
        }
    }
}

/// Handle on one background unit owned by an orchestrator
pub struct BackgroundTask {
    name: String,
    started: AtomicBool,
    start_count: AtomicU32,
    shutdown: CancellationToken,
    stopped: CancellationToken,
    handle: Mutex<Option<JoinHandle<()>>>,
    state: RwLock<LifecycleState>,
    cleanup_timeout: Duration,
    abort_grace: Duration,
}

impl BackgroundTask {
    /// Creates an idle handle using the configured teardown bounds
    pub fn new(name: impl Into<String>, settings: &LifecycleSettings) -> Self {
        Self::with_timeouts(name, settings.cleanup_timeout(), settings.abort_grace())
    }

    pub fn with_timeouts(name: impl Into<String>, cleanup_timeout: Duration, abort_grace: Duration) -> Self {
        Self {
            name: name.into(),
            started: AtomicBool::new(false),
            start_count: AtomicU32::new(0),
            shutdown: CancellationToken::new(),
            stopped: CancellationToken::new(),
            handle: Mutex::new(None),
            state: RwLock::new(LifecycleState::Idle),
            cleanup_timeout,
            abort_grace,
        }
    }

    /// Spawns the background unit unless it is already running
    ///
    /// `work` receives the shutdown token and must observe it through bounded
    /// waits (see [`wait_for_shutdown`]).
    pub fn ensure_started<F, Fut>(&self, work: F) -> StartStatus
    where
        F: FnOnce(CancellationToken) -> Fut,
        Fut: Future<Output = ()> + Send + 'static,
    {
        if self.shutdown.is_cancelled() {
            return StartStatus::ShutDown;
        }
        if self.started.load(Ordering::Acquire) {
            return StartStatus::AlreadyRunning;
        }

        let runtime = match Handle::try_current() {
            Ok(runtime) => runtime,
            Err(_) => {
                debug!(task = %self.name, "No runtime available, deferring background start");
                return StartStatus::Deferred;
            }
        };

        // Held across the spawn so shutdown cannot slip between the flag and the handle.
        let mut slot = self.handle.lock();

        if self.shutdown.is_cancelled() {
            return StartStatus::ShutDown;
        }

        if self
            .started
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return StartStatus::AlreadyRunning;
        }

        self.start_count.fetch_add(1, Ordering::SeqCst);
        *slot = Some(runtime.spawn(work(self.shutdown.clone())));
        *self.state.write() = LifecycleState::Running;

        info!(task = %self.name, "Background task started");
        StartStatus::Started
    }

    /// Signals shutdown and waits, bounded, for the unit to exit
    ///
    /// Safe to call repeatedly and before the unit was ever started. If the unit
    /// ignores the signal past the cleanup timeout it is aborted; the expected
    /// cancellation is swallowed while a panic is reported as [`Error::Internal`].
    /// A call overlapping a teardown already in progress waits for it to finish.
    pub async fn shutdown(&self) -> Result<()> {
        self.shutdown.cancel();

        let handle = self.handle.lock().take();
        let Some(handle) = handle else {
            return self.await_teardown().await;
        };

        *self.state.write() = LifecycleState::Stopping;
        let result = self.teardown(handle).await;
        self.stopped.cancel();
        result
    }

    /// Waits for the caller that owns the join handle to finish tearing down
    async fn await_teardown(&self) -> Result<()> {
        if !self.is_started() {
            let mut state = self.state.write();
            if state.is_idle() {
                *state = LifecycleState::Stopped;
            }
            return Ok(());
        }

        let bound = self.cleanup_timeout + self.abort_grace;
        match tokio::time::timeout(bound, self.stopped.cancelled()).await {
            Ok(()) => Ok(()),
            Err(_) => Err(Error::Timeout(format!(
                "background task '{}' still stopping after {}",
                self.name,
                format_duration(bound)
            ))),
        }
    }

    async fn teardown(&self, mut handle: JoinHandle<()>) -> Result<()> {
        debug!(task = %self.name, "Waiting for background task to observe shutdown");

        match tokio::time::timeout(self.cleanup_timeout, &mut handle).await {
            Ok(joined) => self.finish(joined),
            Err(_) => {
                warn!(
                    task = %self.name,
                    "Background task ignored shutdown for {}, aborting",
                    format_duration(self.cleanup_timeout)
                );
                handle.abort();

                match tokio::time::timeout(self.abort_grace, handle).await {
                    Ok(joined) => self.finish(joined),
                    Err(_) => {
                        let message = format!(
                            "background task '{}' did not stop within {} after abort",
                            self.name,
                            format_duration(self.abort_grace)
                        );
                        error!(task = %self.name, "{}", message);
                        *self.state.write() = LifecycleState::Failed(message.clone());
                        Err(Error::Timeout(message))
                    }
                }
            }
        }
    }

    fn finish(&self, joined: std::result::Result<(), JoinError>) -> Result<()> {
        match joined {
            Ok(()) => {
                *self.state.write() = LifecycleState::Stopped;
                info!(task = %self.name, "Background task stopped");
                Ok(())
            }
            Err(e) if e.is_cancelled() => {
                *self.state.write() = LifecycleState::Stopped;
                info!(task = %self.name, "Background task cancelled");
                Ok(())
            }
            Err(e) => {
                let message = format!("background task '{}' failed: {}", self.name, e);
                error!(task = %self.name, "{}", message);
                *self.state.write() = LifecycleState::Failed(message.clone());
                Err(Error::Internal(message))
            }
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_started(&self) -> bool {
        self.started.load(Ordering::Acquire)
    }

    /// Number of spawns performed; never exceeds one
    pub fn start_count(&self) -> u32 {
        self.start_count.load(Ordering::SeqCst)
    }

    pub fn is_shutdown_requested(&self) -> bool {
        self.shutdown.is_cancelled()
    }

    pub fn state(&self) -> LifecycleState {
        self.state.read().clone()
    }
}

/// Bounded wait against the shutdown signal
///
/// Returns `true` when shutdown fired during the wait, `false` when the interval
/// elapsed first.
pub async fn wait_for_shutdown(token: &CancellationToken, interval: Duration) -> bool {
    tokio::select! {
        _ = token.cancelled() => true,
        _ = tokio::time::sleep(interval) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::time::Instant;

    fn task(cleanup_ms: u64) -> BackgroundTask {
        BackgroundTask::with_timeouts(
            "test-loop",
            Duration::from_millis(cleanup_ms),
            Duration::from_millis(200),
        )
    }

    async fn cooperative_loop(token: CancellationToken) {
        while !wait_for_shutdown(&token, Duration::from_secs(60)).await {}
    }

    #[test]
    fn test_start_deferred_without_runtime() {
        let background = task(100);
        assert_eq!(background.ensure_started(cooperative_loop), StartStatus::Deferred);
        assert!(!background.is_started());
        assert_eq!(background.start_count(), 0);
        assert!(background.state().is_idle());

        let runtime = tokio::runtime::Runtime::new().unwrap();
        runtime.block_on(async {
            assert_eq!(background.ensure_started(cooperative_loop), StartStatus::Started);
            assert!(background.is_started());
            background.shutdown().await.unwrap();
        });
        assert_eq!(background.start_count(), 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_start_spawns_once() {
        let background = Arc::new(task(1_000));

        let attempts: Vec<_> = (0..32)
            .map(|_| {
                let background = background.clone();
                tokio::spawn(async move { background.ensure_started(cooperative_loop) })
            })
            .collect();

        let mut started = 0;
        for attempt in attempts {
            if attempt.await.unwrap() == StartStatus::Started {
                started += 1;
            }
        }

        assert_eq!(started, 1);
        assert_eq!(background.start_count(), 1);
        background.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn test_cooperative_shutdown_is_prompt() {
        let background = task(5_000);
        background.ensure_started(cooperative_loop);

        let began = Instant::now();
        background.shutdown().await.unwrap();
        assert!(began.elapsed() < Duration::from_secs(1));
        assert!(background.state().is_stopped());
    }

    #[tokio::test]
    async fn test_unresponsive_task_is_aborted_within_bound() {
        let background = task(300);
        background.ensure_started(|_token| async {
            loop {
                tokio::time::sleep(Duration::from_secs(3_600)).await;
            }
        });

        let began = Instant::now();
        background.shutdown().await.unwrap();
        let elapsed = began.elapsed();
        assert!(elapsed >= Duration::from_millis(300));
        assert!(elapsed < Duration::from_millis(300 + 700));
        assert!(background.state().is_stopped());
    }

    #[tokio::test]
    async fn test_panicking_task_reports_internal() {
        let background = task(1_000);
        background.ensure_started(|_token| async {
            panic!("health loop exploded");
        });
        tokio::time::sleep(Duration::from_millis(20)).await;

        let err = background.shutdown().await.unwrap_err();
        assert!(matches!(err, Error::Internal(_)));
        assert!(background.state().is_failed());

        // second call has nothing left to join
        background.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn test_shutdown_is_idempotent_and_safe_before_start() {
        let never_started = task(100);
        never_started.shutdown().await.unwrap();
        never_started.shutdown().await.unwrap();
        assert!(never_started.state().is_stopped());

        let background = task(1_000);
        background.ensure_started(cooperative_loop);
        background.shutdown().await.unwrap();
        background.shutdown().await.unwrap();
        assert!(background.is_shutdown_requested());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_overlapping_shutdown_waits_for_exit() {
        let background = Arc::new(task(2_000));
        let exited = Arc::new(AtomicBool::new(false));
        let flag = exited.clone();
        background.ensure_started(move |token| async move {
            token.cancelled().await;
            tokio::time::sleep(Duration::from_millis(200)).await;
            flag.store(true, Ordering::SeqCst);
        });

        let first = {
            let background = background.clone();
            tokio::spawn(async move { background.shutdown().await })
        };
        tokio::time::sleep(Duration::from_millis(20)).await;

        background.shutdown().await.unwrap();
        assert!(exited.load(Ordering::SeqCst));
        assert!(background.state().is_stopped());
        first.await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn test_no_restart_after_shutdown() {
        let background = task(100);
        background.shutdown().await.unwrap();
        assert_eq!(background.ensure_started(cooperative_loop), StartStatus::ShutDown);
        assert_eq!(background.start_count(), 0);
    }

    #[tokio::test]
    async fn test_wait_for_shutdown() {
        let token = CancellationToken::new();
        assert!(!wait_for_shutdown(&token, Duration::from_millis(5)).await);
        token.cancel();
        assert!(wait_for_shutdown(&token, Duration::from_secs(60)).await);
    }
}

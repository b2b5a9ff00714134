//! Action Engines
//!
//! Execution backends that turn contexts into actual concurrent execution.
//! The pool-backed [`TokioActionEngine`] spawns one tokio task per scheduled
//! context and records the join handle so shutdown can drain every
//! outstanding run; [`NoopActionEngine`] is the always-stopped strategy for
//! tests and wiring that must never run work.
//!
//! Shutdown is a graceful drain: in-flight runs finish, waiting tasks wake
//! on the shutdown signal and finish as done. Nothing is aborted.

use crate::action::Action;
use crate::context::{ActionContext, ContextInner};
use config::EngineSettings;
use futures::future::join_all;
use once_cell::sync::Lazy;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Execution backend for action contexts.
///
/// Implementations are swappable strategies; schedulers hold the current
/// engine as a trait object and compare by allocation identity on swap.
pub trait ActionEngine<T>: Send + Sync
where
    T: Send + Sync + 'static,
{
    /// Allocate a fresh unscheduled context wrapping `action`.
    ///
    /// Once the engine is stopped this hands out the empty already-done
    /// context instead of failing; callers may also check [`Self::is_stopped`]
    /// first.
    fn new_context(&self, action: Arc<dyn Action<T>>) -> ActionContext<T>;

    /// Monotonic: once true, always true
    fn is_stopped(&self) -> bool;

    /// Signal shutdown and return without blocking
    fn stop(&self);
}

/// Shared internals behind a pool-backed engine and its contexts
pub(crate) struct EngineCore {
    engine_id: String,
    settings: EngineSettings,
    stopped: AtomicBool,
    shutdown_tx: watch::Sender<bool>,
    tasks: Mutex<Vec<JoinHandle<()>>>,
}

impl EngineCore {
    fn new(settings: EngineSettings) -> Self {
        let (shutdown_tx, _) = watch::channel(false);
        Self {
            engine_id: format!("engine-{}-{}", settings.name, Uuid::new_v4().simple()),
            settings,
            stopped: AtomicBool::new(false),
            shutdown_tx,
            tasks: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn is_stopped(&self) -> bool {
        self.stopped.load(Ordering::Acquire)
    }

    /// Spawn the context's task and record its handle for drain.
    ///
    /// Finished handles are reaped opportunistically once the registry
    /// grows past the configured threshold.
    pub(crate) fn spawn<T>(&self, context: Arc<ContextInner<T>>)
    where
        T: Send + Sync + 'static,
    {
        let shutdown = self.shutdown_tx.subscribe();
        debug!(
            engine_id = %self.engine_id,
            context_id = %context.id(),
            "spawning context task"
        );
        let handle = tokio::spawn(context.run(shutdown));

        let mut tasks = self.tasks.lock();
        if tasks.len() >= self.settings.task_reap_threshold {
            tasks.retain(|task| !task.is_finished());
        }
        tasks.push(handle);
    }

    fn stop(&self) {
        if self.stopped.swap(true, Ordering::AcqRel) {
            return;
        }
        info!(engine_id = %self.engine_id, "action engine stopping");
        let _ = self.shutdown_tx.send(true);
    }
}

/// Pool-backed engine multiplexing contexts over the tokio runtime.
///
/// A process-wide default instance is lazily created and shared via
/// [`TokioActionEngine::shared`] unless a caller supplies its own instance
/// (isolation for testing or resource partitioning).
pub struct TokioActionEngine {
    core: Arc<EngineCore>,
}

static SHARED: Lazy<Arc<TokioActionEngine>> = Lazy::new(|| {
    let settings = EngineSettings::load(None, None).unwrap_or_else(|error| {
        warn!(%error, "engine settings load failed; using defaults");
        EngineSettings::default()
    });
    Arc::new(TokioActionEngine::with_settings(settings))
});

impl TokioActionEngine {
    /// Engine with default settings
    pub fn new() -> Self {
        Self::with_settings(EngineSettings::default())
    }

    /// Engine with explicit settings
    pub fn with_settings(settings: EngineSettings) -> Self {
        let core = Arc::new(EngineCore::new(settings));
        debug!(engine_id = %core.engine_id, "action engine created");
        Self { core }
    }

    /// Process-wide shared engine, lazily created on first use
    pub fn shared() -> Arc<Self> {
        Arc::clone(&SHARED)
    }

    /// Whether [`stop`](Self::stop) has been called
    pub fn is_stopped(&self) -> bool {
        self.core.is_stopped()
    }

    /// Stop the engine: no new contexts, waiting tasks finish as done
    pub fn stop(&self) {
        self.core.stop();
    }

    /// Context tasks spawned and not yet observed finished
    pub fn active_contexts(&self) -> usize {
        self.core
            .tasks
            .lock()
            .iter()
            .filter(|task| !task.is_finished())
            .count()
    }

    /// Stop the engine and wait for outstanding runs to drain.
    ///
    /// Bounded by the configured drain timeout; tasks still running when
    /// the bound elapses are left to finish in the background.
    pub async fn shutdown(&self) {
        self.stop();

        let handles: Vec<JoinHandle<()>> = std::mem::take(&mut *self.core.tasks.lock());
        if handles.is_empty() {
            return;
        }
        debug!(
            engine_id = %self.core.engine_id,
            tasks = handles.len(),
            "draining engine tasks"
        );

        let drain = self.core.settings.drain_timeout();
        match tokio::time::timeout(drain, join_all(handles)).await {
            Ok(results) => {
                for result in results {
                    if let Err(error) = result {
                        warn!(engine_id = %self.core.engine_id, %error, "context task failed during drain");
                    }
                }
            }
            Err(_) => warn!(
                engine_id = %self.core.engine_id,
                timeout_ms = drain.as_millis() as u64,
                "drain timed out; remaining runs finish in the background"
            ),
        }
    }
}

impl Default for TokioActionEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> ActionEngine<T> for TokioActionEngine
where
    T: Send + Sync + 'static,
{
    fn new_context(&self, action: Arc<dyn Action<T>>) -> ActionContext<T> {
        if self.core.is_stopped() {
            debug!(engine_id = %self.core.engine_id, "context requested on stopped engine");
            return ActionContext::empty();
        }
        let inner = Arc::new(ContextInner::new(action, Arc::downgrade(&self.core)));
        ActionContext::full(inner)
    }

    fn is_stopped(&self) -> bool {
        TokioActionEngine::is_stopped(self)
    }

    fn stop(&self) {
        TokioActionEngine::stop(self)
    }
}

/// Always-stopped engine; every context it hands out is already done
#[derive(Debug, Default)]
pub struct NoopActionEngine;

impl NoopActionEngine {
    pub fn new() -> Self {
        Self
    }
}

impl<T> ActionEngine<T> for NoopActionEngine
where
    T: Send + Sync + 'static,
{
    fn new_context(&self, _action: Arc<dyn Action<T>>) -> ActionContext<T> {
        ActionContext::empty()
    }

    fn is_stopped(&self) -> bool {
        true
    }

    fn stop(&self) {}
}

//! Per-Actor Scheduling
//!
//! A scheduler binds a single actor to one engine at a time and creates
//! contexts on its behalf. Weak references are kept against every context
//! it creates so they can be bulk cancelled; the bookkeeping is
//! engine-scoped and is cleared whenever the engine changes.
//!
//! By default the process-wide [`TokioActionEngine::shared`] engine is used.

use crate::action::Action;
use crate::context::{ActionContext, ContextInner};
use crate::engine::{ActionEngine, TokioActionEngine};
use config::defaults;
use parking_lot::{Mutex, RwLock};
use std::sync::{Arc, Weak};
use std::time::Duration;
use tracing::{debug, warn};

/// Per-actor facade over an action engine.
///
/// Individual contexts are governed solely by the engine that created
/// them; the scheduler's bookkeeping exists only for bulk cancellation.
pub struct DefaultActionScheduler<T>
where
    T: Send + Sync + 'static,
{
    actor: Arc<T>,
    engine: RwLock<Arc<dyn ActionEngine<T>>>,
    contexts: Mutex<Vec<Weak<ContextInner<T>>>>,
}

impl<T> DefaultActionScheduler<T>
where
    T: Send + Sync + 'static,
{
    /// Scheduler for `actor` bound to the shared default engine
    pub fn new(actor: Arc<T>) -> Self {
        Self::with_engine(actor, TokioActionEngine::shared())
    }

    /// Scheduler for `actor` bound to an explicit engine
    pub fn with_engine(actor: Arc<T>, engine: Arc<dyn ActionEngine<T>>) -> Self {
        Self {
            actor,
            engine: RwLock::new(engine),
            contexts: Mutex::new(Vec::with_capacity(defaults::scheduler::CONTEXT_CAPACITY)),
        }
    }

    /// The actor every context of this scheduler is bound to
    pub fn actor(&self) -> &Arc<T> {
        &self.actor
    }

    /// The currently associated engine
    pub fn engine(&self) -> Arc<dyn ActionEngine<T>> {
        self.engine.read().clone()
    }

    /// Swap engines; bookkeeping is cleared when the engine actually changes.
    ///
    /// Contexts created under the previous engine keep running there; they
    /// are simply no longer reachable through this scheduler's bulk cancel.
    pub fn set_engine(&self, engine: Arc<dyn ActionEngine<T>>) {
        let mut current = self.engine.write();
        if !same_engine(&current, &engine) {
            let dropped = {
                let mut contexts = self.contexts.lock();
                let dropped = contexts.len();
                contexts.clear();
                dropped
            };
            debug!(dropped, "engine changed; context bookkeeping cleared");
        }
        *current = engine;
    }

    /// Create an unscheduled context bound to this scheduler's actor.
    ///
    /// The returned view locks the actor binding; timing configuration,
    /// `schedule` and `cancel` remain usable. On a stopped engine this is
    /// the empty already-done context, never an error.
    pub fn new_context_for_actor(&self, action: Arc<dyn Action<T>>) -> ActionContext<T> {
        match self.bind_context(action) {
            Some(inner) => ActionContext::actor_locked(inner),
            None => ActionContext::empty(),
        }
    }

    /// Configure and schedule `action` against the actor in one step.
    ///
    /// A zero `period` is one-shot. Returns the fully locked read/cancel
    /// view of the running context, or the empty context when the engine
    /// is stopped.
    pub fn schedule_for_actor(
        &self,
        action: Arc<dyn Action<T>>,
        initial_delay: Duration,
        period: Duration,
    ) -> ActionContext<T> {
        let Some(inner) = self.bind_context(action) else {
            return ActionContext::empty();
        };

        let handle = ActionContext::full(inner);
        // Freshly created and still unscheduled; none of these can fail
        let configured = handle
            .set_initial_delay(initial_delay)
            .and_then(|_| handle.set_period(period))
            .and_then(|_| handle.schedule());
        if let Err(error) = configured {
            warn!(context_id = %handle.id(), %error, "scheduling for actor failed");
        }

        handle.into_locked()
    }

    /// Cancel every non-done context created by this scheduler under the
    /// current engine.
    ///
    /// Snapshot-then-clear: registrations racing with this call land either
    /// in the snapshot or in the fresh list, never lost.
    pub fn cancel_all_scheduled_for_actor(&self) {
        let snapshot = std::mem::take(&mut *self.contexts.lock());

        let mut cancelled = 0usize;
        for weak in snapshot {
            if let Some(context) = weak.upgrade() {
                if !context.is_done() {
                    context.cancel();
                    cancelled += 1;
                }
            }
        }
        debug!(cancelled, "bulk cancel for actor completed");
    }

    /// Create a context, bind the actor and register it for bulk cancel
    fn bind_context(&self, action: Arc<dyn Action<T>>) -> Option<Arc<ContextInner<T>>> {
        let engine = self.engine.read().clone();
        if engine.is_stopped() {
            return None;
        }

        // The engine may race into stopped and hand back the empty context
        let inner = engine.new_context(action).into_inner()?;
        if let Err(error) = inner.set_actor(self.actor.clone()) {
            warn!(context_id = %inner.id(), %error, "actor binding failed");
            return None;
        }

        // Add then purge
        let mut contexts = self.contexts.lock();
        contexts.push(Arc::downgrade(&inner));
        contexts.retain(|weak| weak.upgrade().is_some_and(|context| !context.is_done()));

        Some(inner)
    }
}

/// Engines are compared by allocation identity, not structurally
fn same_engine<T>(a: &Arc<dyn ActionEngine<T>>, b: &Arc<dyn ActionEngine<T>>) -> bool
where
    T: Send + Sync + 'static,
{
    std::ptr::addr_eq(Arc::as_ptr(a), Arc::as_ptr(b))
}

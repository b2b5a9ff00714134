//! Action Contexts
//!
//! The stateful handle to one scheduled instance of an action: the bound
//! actor, timing parameters and the lifecycle state machine.
//!
//! Lifecycle: `Unscheduled → Scheduled → (Running ⇄ Waiting) → Done`, with
//! `Cancelled` reachable from any non-terminal state. Terminal states are
//! never left. Configuration is only possible while `Unscheduled`; the
//! views handed out by schedulers additionally restrict which operations a
//! holder may perform.

use crate::action::Action;
use crate::engine::EngineCore;
use crate::error::{ActionError, Result};
use parking_lot::Mutex;
use std::fmt;
use std::sync::{Arc, Weak};
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::MissedTickBehavior;
use tracing::{debug, warn};
use uuid::Uuid;

/// Lifecycle state of an action context
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContextState {
    /// Created but not yet handed to the worker pool
    Unscheduled,
    /// Enqueued; the initial delay has not elapsed yet
    Scheduled,
    /// An execution of the action is in flight
    Running,
    /// A periodic context waiting for its next firing
    Waiting,
    /// Terminal: ran to completion, or the engine stopped
    Done,
    /// Terminal: cancelled before completion
    Cancelled,
}

impl ContextState {
    /// True for `Done` and `Cancelled`
    pub fn is_terminal(self) -> bool {
        matches!(self, ContextState::Done | ContextState::Cancelled)
    }
}

impl fmt::Display for ContextState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ContextState::Unscheduled => "unscheduled",
            ContextState::Scheduled => "scheduled",
            ContextState::Running => "running",
            ContextState::Waiting => "waiting",
            ContextState::Done => "done",
            ContextState::Cancelled => "cancelled",
        };
        f.write_str(name)
    }
}

/// What a given handle is allowed to do with its context
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum AccessMode {
    /// Engine-issued handle, fully configurable until scheduled
    Full,
    /// Scheduler-issued view: actor locked, timing and schedule usable
    ActorLocked,
    /// Read and cancel only
    Locked,
}

/// Shared state behind every handle to one context
pub(crate) struct ContextInner<T> {
    id: Uuid,
    action: Arc<dyn Action<T>>,
    engine: Weak<EngineCore>,
    actor: Mutex<Option<Arc<T>>>,
    initial_delay: Mutex<Duration>,
    period: Mutex<Duration>,
    state: Mutex<ContextState>,
    done_tx: watch::Sender<bool>,
}

impl<T> ContextInner<T>
where
    T: Send + Sync + 'static,
{
    pub(crate) fn new(action: Arc<dyn Action<T>>, engine: Weak<EngineCore>) -> Self {
        let (done_tx, _) = watch::channel(false);
        Self {
            id: Uuid::new_v4(),
            action,
            engine,
            actor: Mutex::new(None),
            initial_delay: Mutex::new(Duration::ZERO),
            period: Mutex::new(Duration::ZERO),
            state: Mutex::new(ContextState::Unscheduled),
            done_tx,
        }
    }

    pub(crate) fn id(&self) -> Uuid {
        self.id
    }

    pub(crate) fn state(&self) -> ContextState {
        *self.state.lock()
    }

    pub(crate) fn is_done(&self) -> bool {
        self.state().is_terminal()
    }

    pub(crate) fn actor(&self) -> Option<Arc<T>> {
        self.actor.lock().clone()
    }

    pub(crate) fn initial_delay(&self) -> Duration {
        *self.initial_delay.lock()
    }

    pub(crate) fn period(&self) -> Duration {
        *self.period.lock()
    }

    // Configuration holds the state lock so it cannot race `schedule`.

    pub(crate) fn set_actor(&self, actor: Arc<T>) -> Result<()> {
        let state = self.state.lock();
        if *state != ContextState::Unscheduled {
            return Err(ActionError::invalid_state("set_actor", *state));
        }
        *self.actor.lock() = Some(actor);
        Ok(())
    }

    pub(crate) fn set_initial_delay(&self, delay: Duration) -> Result<()> {
        let state = self.state.lock();
        if *state != ContextState::Unscheduled {
            return Err(ActionError::invalid_state("set_initial_delay", *state));
        }
        *self.initial_delay.lock() = delay;
        Ok(())
    }

    pub(crate) fn set_period(&self, period: Duration) -> Result<()> {
        let state = self.state.lock();
        if *state != ContextState::Unscheduled {
            return Err(ActionError::invalid_state("set_period", *state));
        }
        *self.period.lock() = period;
        Ok(())
    }

    /// Hand the context to the engine's worker pool
    pub(crate) fn schedule(self: &Arc<Self>) -> Result<()> {
        {
            let mut state = self.state.lock();
            if *state != ContextState::Unscheduled {
                return Err(ActionError::invalid_state("schedule", *state));
            }
            if self.actor.lock().is_none() {
                return Err(ActionError::invalid_state("schedule with no actor bound", *state));
            }
            *state = ContextState::Scheduled;
        }

        match self.engine.upgrade() {
            Some(core) if !core.is_stopped() => {
                core.spawn(self.clone());
                Ok(())
            }
            _ => {
                // Engine stopped or dropped between creation and scheduling;
                // nothing will ever run this context.
                debug!(context_id = %self.id, "engine unavailable at schedule time");
                self.finish(ContextState::Done);
                Ok(())
            }
        }
    }

    /// Idempotent; an in-flight run finishes but never re-arms
    pub(crate) fn cancel(&self) {
        {
            let mut state = self.state.lock();
            if state.is_terminal() {
                return;
            }
            debug!(context_id = %self.id, from = %*state, "action context cancelled");
            *state = ContextState::Cancelled;
        }
        let _ = self.done_tx.send(true);
    }

    /// Resolves once the context reaches a terminal state
    pub(crate) async fn wait_done(&self) {
        let mut rx = self.done_tx.subscribe();
        if self.is_done() {
            return;
        }
        while !*rx.borrow_and_update() {
            if rx.changed().await.is_err() {
                return;
            }
        }
    }

    /// Terminal transition; refuses to leave an earlier terminal state
    fn finish(&self, terminal: ContextState) {
        debug_assert!(terminal.is_terminal());
        {
            let mut state = self.state.lock();
            if state.is_terminal() {
                return;
            }
            *state = terminal;
        }
        let _ = self.done_tx.send(true);
    }

    /// Non-terminal transition; returns false once the context is done
    fn advance(&self, to: ContextState) -> bool {
        let mut state = self.state.lock();
        if state.is_terminal() {
            return false;
        }
        *state = to;
        true
    }

    /// Task body driving this context on the worker pool.
    ///
    /// A context is a single sequential task, so two runs of it can never
    /// overlap; overrunning periodic executions skip missed firings instead
    /// of piling up. Engine shutdown finishes the context as done, a cancel
    /// as cancelled.
    pub(crate) async fn run(self: Arc<Self>, mut shutdown: watch::Receiver<bool>) {
        let Some(actor) = self.actor() else {
            self.finish(ContextState::Done);
            return;
        };
        let initial_delay = self.initial_delay();
        let period = self.period();
        let mut done = self.done_tx.subscribe();
        let ctx = ActionContext::locked(self.clone());

        if !initial_delay.is_zero() {
            tokio::select! {
                _ = tokio::time::sleep(initial_delay) => {}
                _ = shutdown.changed() => {}
                _ = done.changed() => {}
            }
        }

        let mut interval = if period.is_zero() {
            None
        } else {
            let mut interval = tokio::time::interval(period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
            interval.tick().await; // consume the immediate first tick
            Some(interval)
        };

        loop {
            if *shutdown.borrow() {
                self.finish(ContextState::Done);
                break;
            }
            if self.is_done() {
                break;
            }

            if !self.advance(ContextState::Running) {
                break;
            }
            if let Err(error) = self.action.perform(&actor, &ctx).await {
                warn!(context_id = %self.id, %error, "action run failed");
            }

            let Some(interval) = interval.as_mut() else {
                self.finish(ContextState::Done);
                break;
            };
            if !self.advance(ContextState::Waiting) {
                break;
            }
            tokio::select! {
                _ = interval.tick() => {}
                _ = shutdown.changed() => {}
                _ = done.changed() => {}
            }
        }
    }
}

impl<T> fmt::Debug for ContextInner<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ContextInner")
            .field("id", &self.id)
            .field("state", &*self.state.lock())
            .finish_non_exhaustive()
    }
}

/// Handle to one scheduled instance of an action.
///
/// Handles are cheap to clone and share the same underlying context. The
/// engine hands out fully configurable handles; schedulers hand out
/// restricted views (actor locked, or read/cancel only); a stopped engine
/// hands out the empty context, which is already done and ignores
/// `schedule`/`cancel`.
pub struct ActionContext<T> {
    inner: Option<Arc<ContextInner<T>>>,
    mode: AccessMode,
}

impl<T> ActionContext<T>
where
    T: Send + Sync + 'static,
{
    pub(crate) fn full(inner: Arc<ContextInner<T>>) -> Self {
        Self {
            inner: Some(inner),
            mode: AccessMode::Full,
        }
    }

    pub(crate) fn actor_locked(inner: Arc<ContextInner<T>>) -> Self {
        Self {
            inner: Some(inner),
            mode: AccessMode::ActorLocked,
        }
    }

    pub(crate) fn locked(inner: Arc<ContextInner<T>>) -> Self {
        Self {
            inner: Some(inner),
            mode: AccessMode::Locked,
        }
    }

    pub(crate) fn into_locked(self) -> Self {
        Self {
            inner: self.inner,
            mode: AccessMode::Locked,
        }
    }

    pub(crate) fn into_inner(self) -> Option<Arc<ContextInner<T>>> {
        self.inner
    }

    /// The already-done context handed out by stopped engines
    pub fn empty() -> Self {
        Self {
            inner: None,
            mode: AccessMode::Locked,
        }
    }

    /// Context identifier (nil for the empty context)
    pub fn id(&self) -> Uuid {
        self.inner.as_ref().map(|inner| inner.id()).unwrap_or_default()
    }

    /// Current lifecycle state
    pub fn state(&self) -> ContextState {
        self.inner
            .as_ref()
            .map(|inner| inner.state())
            .unwrap_or(ContextState::Done)
    }

    /// True iff the state is `Done` or `Cancelled`
    pub fn is_done(&self) -> bool {
        self.state().is_terminal()
    }

    /// The bound actor, if one has been set
    pub fn actor(&self) -> Option<Arc<T>> {
        self.inner.as_ref().and_then(|inner| inner.actor())
    }

    /// Delay before the first run
    pub fn initial_delay(&self) -> Duration {
        self.inner
            .as_ref()
            .map(|inner| inner.initial_delay())
            .unwrap_or(Duration::ZERO)
    }

    /// Fixed firing period; zero means one-shot
    pub fn period(&self) -> Duration {
        self.inner
            .as_ref()
            .map(|inner| inner.period())
            .unwrap_or(Duration::ZERO)
    }

    /// Bind the actor; only on a fully configurable unscheduled context
    pub fn set_actor(&self, actor: Arc<T>) -> Result<()> {
        match (&self.inner, self.mode) {
            (Some(inner), AccessMode::Full) => inner.set_actor(actor),
            (Some(inner), _) => Err(ActionError::invalid_state(
                "set_actor on a restricted handle",
                inner.state(),
            )),
            (None, _) => Err(ActionError::invalid_state("set_actor", ContextState::Done)),
        }
    }

    /// Set the delay before the first run; only while unscheduled
    pub fn set_initial_delay(&self, delay: Duration) -> Result<()> {
        match (&self.inner, self.mode) {
            (Some(inner), AccessMode::Full | AccessMode::ActorLocked) => {
                inner.set_initial_delay(delay)
            }
            (Some(inner), _) => Err(ActionError::invalid_state(
                "set_initial_delay on a restricted handle",
                inner.state(),
            )),
            (None, _) => Err(ActionError::invalid_state(
                "set_initial_delay",
                ContextState::Done,
            )),
        }
    }

    /// Set the firing period (zero = one-shot); only while unscheduled
    pub fn set_period(&self, period: Duration) -> Result<()> {
        match (&self.inner, self.mode) {
            (Some(inner), AccessMode::Full | AccessMode::ActorLocked) => inner.set_period(period),
            (Some(inner), _) => Err(ActionError::invalid_state(
                "set_period on a restricted handle",
                inner.state(),
            )),
            (None, _) => Err(ActionError::invalid_state("set_period", ContextState::Done)),
        }
    }

    /// Enqueue the context with its engine; a no-op on the empty context
    pub fn schedule(&self) -> Result<()> {
        match (&self.inner, self.mode) {
            (Some(inner), AccessMode::Full | AccessMode::ActorLocked) => inner.schedule(),
            (Some(inner), AccessMode::Locked) => Err(ActionError::invalid_state(
                "schedule on a restricted handle",
                inner.state(),
            )),
            (None, _) => Ok(()),
        }
    }

    /// Idempotent cancellation; a no-op on the empty context
    pub fn cancel(&self) {
        if let Some(inner) = &self.inner {
            inner.cancel();
        }
    }

    /// Wait until the context reaches a terminal state
    pub async fn wait_done(&self) {
        if let Some(inner) = &self.inner {
            inner.wait_done().await;
        }
    }
}

impl<T> Clone for ActionContext<T> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
            mode: self.mode,
        }
    }
}

impl<T> fmt::Debug for ActionContext<T>
where
    T: Send + Sync + 'static,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ActionContext")
            .field("id", &self.id())
            .field("state", &self.state())
            .field("mode", &self.mode)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Result;
    use async_trait::async_trait;

    struct Noop;

    #[async_trait]
    impl Action<u32> for Noop {
        async fn perform(&self, _actor: &Arc<u32>, _ctx: &ActionContext<u32>) -> Result<()> {
            Ok(())
        }
    }

    fn orphan_context() -> Arc<ContextInner<u32>> {
        // No live engine behind it; scheduling finishes it as done.
        Arc::new(ContextInner::new(Arc::new(Noop), Weak::new()))
    }

    #[test]
    fn configuration_only_while_unscheduled() {
        let inner = orphan_context();
        inner.set_actor(Arc::new(7)).unwrap();
        inner.set_initial_delay(Duration::from_millis(5)).unwrap();
        inner.set_period(Duration::from_millis(10)).unwrap();

        inner.schedule().unwrap();
        assert!(inner.is_done()); // dead engine: finished immediately

        let err = inner.set_period(Duration::ZERO).unwrap_err();
        assert!(matches!(err, ActionError::InvalidState { .. }));
    }

    #[test]
    fn schedule_requires_actor() {
        let inner = orphan_context();
        let err = inner.schedule().unwrap_err();
        assert!(matches!(err, ActionError::InvalidState { .. }));
        assert_eq!(inner.state(), ContextState::Unscheduled);
    }

    #[test]
    fn cancel_is_idempotent_and_monotonic() {
        let inner = orphan_context();
        inner.cancel();
        assert_eq!(inner.state(), ContextState::Cancelled);

        inner.cancel();
        assert_eq!(inner.state(), ContextState::Cancelled);

        // A cancelled context never becomes done
        inner.set_actor(Arc::new(1)).unwrap_err();
        assert_eq!(inner.state(), ContextState::Cancelled);
    }

    #[test]
    fn empty_context_is_done_and_inert() {
        let ctx = ActionContext::<u32>::empty();
        assert!(ctx.is_done());
        assert_eq!(ctx.state(), ContextState::Done);
        assert_eq!(ctx.id(), Uuid::nil());

        ctx.cancel();
        assert!(ctx.schedule().is_ok());
        assert!(ctx.set_period(Duration::from_secs(1)).is_err());
        assert!(ctx.actor().is_none());
    }

    #[test]
    fn restricted_handles_reject_configuration() {
        let inner = orphan_context();
        let view = ActionContext::actor_locked(inner.clone());
        assert!(view.set_actor(Arc::new(3)).is_err());
        assert!(view.set_period(Duration::from_millis(1)).is_ok());

        let locked = view.into_locked();
        assert!(locked.set_period(Duration::from_millis(2)).is_err());
        assert!(locked.schedule().is_err());
        assert_eq!(inner.period(), Duration::from_millis(1));
    }

    #[tokio::test]
    async fn wait_done_resolves_on_cancel() {
        let inner = orphan_context();
        let waiter = {
            let inner = inner.clone();
            tokio::spawn(async move { inner.wait_done().await })
        };
        inner.cancel();
        waiter.await.unwrap();
    }
}

//! Actions
//!
//! A pure unit of work: given an actor and a context, perform one step and
//! return.

use crate::context::ActionContext;
use crate::error::Result;
use async_trait::async_trait;
use std::sync::Arc;

/// Stateless unit of work executed against an actor.
///
/// Actions carry no identity of their own; the same `Arc<dyn Action<T>>`
/// may be scheduled many times across many contexts. State that must
/// survive between runs belongs on the actor (or inside the action value
/// itself, behind its own synchronization).
#[async_trait]
pub trait Action<T>: Send + Sync
where
    T: Send + Sync + 'static,
{
    /// Perform one step of work against `actor`.
    ///
    /// `ctx` is the read/cancel view of the running context, so a periodic
    /// action can cancel itself. A returned error is logged by the engine
    /// and does not stop a periodic context from re-arming.
    async fn perform(&self, actor: &Arc<T>, ctx: &ActionContext<T>) -> Result<()>;
}

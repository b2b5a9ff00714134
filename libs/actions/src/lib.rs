//! Action Scheduling Core
//!
//! Turns a unit of work into a cancellable, potentially periodic,
//! concurrently-executing task bound to an actor. Contexts are the stateful
//! handles to one scheduled instance of an action; engines are the pluggable
//! execution backends running them on the tokio worker pool; schedulers are
//! per-actor facades adding weak bulk-cancel bookkeeping.
//!
//! # Architecture
//!
//! ```text
//! ┌───────────────────────────┐     ┌──────────────────────────┐
//! │ DefaultActionScheduler<T> │     │       ActionEngine       │
//! │                           │     │                          │
//! │  actor: Arc<T>            │────▶│  ┌────────────────────┐  │
//! │  weak context bookkeeping │     │  │ TokioActionEngine  │  │
//! └───────────────────────────┘     │  │ one task / context │  │
//!              │                    │  └────────────────────┘  │
//!              ▼                    │  ┌────────────────────┐  │
//! ┌───────────────────────────┐     │  │ NoopActionEngine   │  │
//! │     ActionContext<T>      │◀────│  │ (always stopped)   │  │
//! │  unscheduled → scheduled  │     │  └────────────────────┘  │
//! │  → running ⇄ waiting      │     └──────────────────────────┘
//! │  → done | cancelled       │
//! └───────────────────────────┘
//! ```
//!
//! # Guarantees
//!
//! - At most one execution of a given context runs at a time; overrunning
//!   periodic runs skip missed firings instead of piling up.
//! - Cancellation is idempotent and fire-and-forget: an in-flight run
//!   finishes, further runs never start.
//! - A stopped engine is a condition, not an error: it hands out empty
//!   already-done contexts instead of failing.

pub mod action;
pub mod context;
pub mod engine;
pub mod error;
pub mod scheduler;

pub use action::Action;
pub use context::{ActionContext, ContextState};
pub use engine::{ActionEngine, NoopActionEngine, TokioActionEngine};
pub use error::{ActionError, Result};
pub use scheduler::DefaultActionScheduler;

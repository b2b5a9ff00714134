//! Kernel defaults
//!
//! This module contains default configuration values and constants used
//! across the Pulse crates for consistency.

/// Action engine defaults
pub mod engine {
    /// Default engine name used in log fields
    pub const NAME: &str = "pulse";

    /// Upper bound on graceful shutdown drain (milliseconds)
    pub const DRAIN_TIMEOUT_MS: u64 = 5_000;

    /// Finished task handles are reaped once the registry grows past this
    pub const TASK_REAP_THRESHOLD: usize = 64;
}

/// Scheduler defaults
pub mod scheduler {
    /// Initial capacity of the per-actor context bookkeeping list
    pub const CONTEXT_CAPACITY: usize = 8;
}

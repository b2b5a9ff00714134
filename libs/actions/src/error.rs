//! Action Error Types

use crate::context::ContextState;
use thiserror::Error;

/// Result type alias for action operations
pub type Result<T> = std::result::Result<T, ActionError>;

/// Errors surfaced by contexts, engines and schedulers
#[derive(Error, Debug)]
pub enum ActionError {
    /// A context was mutated or scheduled outside its mutable window
    #[error("invalid context state: {operation} while {state}")]
    InvalidState {
        operation: &'static str,
        state: ContextState,
    },

    /// An action run reported failure
    #[error("action failed: {message}")]
    Failed { message: String },
}

impl ActionError {
    /// Create an invalid-state error
    pub fn invalid_state(operation: &'static str, state: ContextState) -> Self {
        Self::InvalidState { operation, state }
    }

    /// Create an action-failure error
    pub fn failed(message: impl Into<String>) -> Self {
        Self::Failed {
            message: message.into(),
        }
    }
}

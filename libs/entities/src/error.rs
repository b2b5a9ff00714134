//! Entity Error Types

use thiserror::Error;
use uuid::Uuid;

/// Result type alias for entity operations
pub type Result<T> = std::result::Result<T, EntityError>;

/// Errors surfaced by containers and factories.
///
/// These all indicate caller bugs and are surfaced immediately; expected
/// runtime conditions (an absent id on kill, a stopped engine) are reported
/// through return values instead.
#[derive(Error, Debug)]
pub enum EntityError {
    /// Creating or receiving an entity whose id already exists in the target
    #[error("duplicate entity id: {id}")]
    DuplicateId { id: Uuid },

    /// Transferring an entity the source does not own
    #[error("entity {id} is not owned by this container")]
    NotOwned { id: Uuid },

    /// Transferring an entity to the container that already owns it
    #[error("entity {id} already belongs to this container")]
    SameContainer { id: Uuid },
}

impl EntityError {
    /// Create a duplicate-identifier error
    pub fn duplicate_id(id: Uuid) -> Self {
        Self::DuplicateId { id }
    }

    /// Create a not-owned error
    pub fn not_owned(id: Uuid) -> Self {
        Self::NotOwned { id }
    }

    /// Create a same-container error
    pub fn same_container(id: Uuid) -> Self {
        Self::SameContainer { id }
    }
}

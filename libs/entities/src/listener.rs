//! Entity Listeners
//!
//! Observer capability consumed by containers. Notifications are delivered
//! synchronously, after the corresponding mutation has committed, in
//! registration-independent order.

use crate::container::DefaultEntityContainer;
use crate::entity::DefaultEntity;
use std::fmt;
use std::sync::Arc;
use uuid::Uuid;

/// Payload delivered with every lifecycle notification
#[derive(Clone)]
pub struct EntityEvent {
    entity: Arc<DefaultEntity>,
    counterpart: Option<Arc<DefaultEntityContainer>>,
}

impl EntityEvent {
    pub(crate) fn new(entity: Arc<DefaultEntity>) -> Self {
        Self {
            entity,
            counterpart: None,
        }
    }

    pub(crate) fn with_counterpart(
        entity: Arc<DefaultEntity>,
        counterpart: Arc<DefaultEntityContainer>,
    ) -> Self {
        Self {
            entity,
            counterpart: Some(counterpart),
        }
    }

    pub fn id(&self) -> Uuid {
        self.entity.id()
    }

    pub fn entity(&self) -> &Arc<DefaultEntity> {
        &self.entity
    }

    /// The other container involved in a transfer: the target for a
    /// transferred-out notification, absent otherwise
    pub fn counterpart(&self) -> Option<&Arc<DefaultEntityContainer>> {
        self.counterpart.as_ref()
    }
}

impl fmt::Debug for EntityEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EntityEvent")
            .field("id", &self.id())
            .field("has_counterpart", &self.counterpart.is_some())
            .finish()
    }
}

/// Observer of container lifecycle notifications.
///
/// All methods default to no-ops so implementations subscribe only to the
/// notifications they care about. Call order is guaranteed only within a
/// single container operation (mutation commits, then listeners fire).
pub trait EntityListener: Send + Sync {
    /// A new entity was created in the container
    fn entity_created(&self, _event: &EntityEvent) {}

    /// An entity was killed and removed from the container
    fn entity_killed(&self, _event: &EntityEvent) {}

    /// An entity was received from elsewhere (target side of a transfer)
    fn entity_received(&self, _event: &EntityEvent) {}

    /// An entity was transferred out (source side of a transfer)
    fn entity_transferred(&self, _event: &EntityEvent) {}
}

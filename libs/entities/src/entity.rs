//! Entities
//!
//! A named, uniquely-identified unit manageable by a container. Entities
//! may themselves contain sub-entities through a lazily-created child
//! container, and are the typical actors bound into an action scheduler.

use crate::attributes::AttributeBag;
use crate::container::DefaultEntityContainer;
use once_cell::sync::OnceCell;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::{Arc, Weak};
use uuid::Uuid;

/// Capability/type tag attached to an entity at creation
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EntityType(String);

impl EntityType {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for EntityType {
    fn default() -> Self {
        Self("entity".to_string())
    }
}

impl fmt::Display for EntityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A uniquely-identified unit owned by at most one container at a time.
///
/// Entities are created through a container's factory and killed through
/// their owning container; they never self-destruct. The owner link is
/// maintained by containers as part of create/kill/transfer/receive.
pub struct DefaultEntity {
    id: Uuid,
    entity_type: EntityType,
    attributes: AttributeBag,
    owner: RwLock<Weak<DefaultEntityContainer>>,
    children: OnceCell<Arc<DefaultEntityContainer>>,
}

impl DefaultEntity {
    /// A detached entity; ownership is established when a container
    /// registers it (factory build, or `receive_entity`).
    pub fn new(id: Uuid, entity_type: EntityType, attributes: AttributeBag) -> Arc<Self> {
        Arc::new(Self {
            id,
            entity_type,
            attributes,
            owner: RwLock::new(Weak::new()),
            children: OnceCell::new(),
        })
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn entity_type(&self) -> &EntityType {
        &self.entity_type
    }

    pub fn attributes(&self) -> &AttributeBag {
        &self.attributes
    }

    /// The container currently owning this entity, if any
    pub fn owner(&self) -> Option<Arc<DefaultEntityContainer>> {
        self.owner.read().upgrade()
    }

    pub(crate) fn set_owner(&self, owner: Weak<DefaultEntityContainer>) {
        *self.owner.write() = owner;
    }

    pub(crate) fn clear_owner(&self) {
        *self.owner.write() = Weak::new();
    }

    /// Kill this entity via its owning container.
    ///
    /// Returns false once the entity is detached (already killed, or never
    /// registered).
    pub fn kill(&self) -> bool {
        match self.owner() {
            Some(container) => container.kill_entity(self.id),
            None => false,
        }
    }

    /// Child container for sub-entities, created on first use.
    ///
    /// The child inherits the owning container's factory at creation time
    /// and records it as parent for factory wiring only; ownership of this
    /// entity is unaffected.
    pub fn children(&self) -> Arc<DefaultEntityContainer> {
        self.children
            .get_or_init(|| match self.owner() {
                Some(owner) => DefaultEntityContainer::with_factory_and_parent(
                    owner.factory(),
                    Some(Arc::downgrade(&owner)),
                ),
                None => DefaultEntityContainer::new(),
            })
            .clone()
    }
}

impl fmt::Debug for DefaultEntity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DefaultEntity")
            .field("id", &self.id)
            .field("entity_type", &self.entity_type)
            .field("attributes", &self.attributes.len())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detached_entity_has_no_owner() {
        let entity = DefaultEntity::new(Uuid::new_v4(), EntityType::default(), AttributeBag::new());
        assert!(entity.owner().is_none());
        assert!(!entity.kill());
    }

    #[test]
    fn kill_goes_through_the_owning_container() {
        let container = DefaultEntityContainer::new();
        let entity = container.new_entity().unwrap();

        assert!(entity.owner().is_some());
        assert!(entity.kill());
        assert!(entity.owner().is_none());
        assert!(!entity.kill());
    }

    #[test]
    fn children_inherit_the_owners_factory() {
        let container = DefaultEntityContainer::new();
        let entity = container.new_entity().unwrap();

        let children = entity.children();
        assert!(children.parent().is_some());

        let child = children.new_entity().unwrap();
        assert_eq!(children.entity_count(), 1);
        assert_eq!(container.entity_count(), 1); // composition, not ownership
        assert!(child.owner().is_some());
    }

    #[test]
    fn entity_type_tag_round_trip() {
        let tag = EntityType::new("drone");
        assert_eq!(tag.as_str(), "drone");
        assert_eq!(tag.to_string(), "drone");
        assert_eq!(EntityType::default().as_str(), "entity");
    }
}

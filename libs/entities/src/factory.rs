//! Entity Factories
//!
//! The capability a container invokes to instantiate concrete entities of
//! a requested type.

use crate::attributes::AttributeBag;
use crate::container::DefaultEntityContainer;
use crate::entity::{DefaultEntity, EntityType};
use crate::error::Result;
use std::sync::Arc;
use uuid::Uuid;

/// Builds entities on behalf of a container.
///
/// Implementations must never return an entity whose id differs from the
/// requested one. The owning container registers the returned entity and
/// establishes its owner link; `container` is provided so factories can
/// wire additional capabilities off it.
pub trait EntityFactory: Send + Sync {
    fn build(
        &self,
        id: Uuid,
        container: &Arc<DefaultEntityContainer>,
        entity_type: EntityType,
        attributes: AttributeBag,
    ) -> Result<Arc<DefaultEntity>>;
}

/// Stock factory building plain entities
#[derive(Debug, Default)]
pub struct DefaultEntityFactory;

impl DefaultEntityFactory {
    pub fn new() -> Self {
        Self
    }
}

impl EntityFactory for DefaultEntityFactory {
    fn build(
        &self,
        id: Uuid,
        _container: &Arc<DefaultEntityContainer>,
        entity_type: EntityType,
        attributes: AttributeBag,
    ) -> Result<Arc<DefaultEntity>> {
        Ok(DefaultEntity::new(id, entity_type, attributes))
    }
}

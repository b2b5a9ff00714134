//! Entity Containers
//!
//! The ownership registry: maps identifiers to entities; creates, kills,
//! transfers and receives them; and fans out lifecycle notifications to
//! listeners. An identifier present in the mapping denotes an entity
//! strongly owned by exactly this container.
//!
//! All mutations are internally atomic with respect to the identifier map,
//! and every notification or bulk operation dispatches from a snapshot so
//! concurrent mutation during iteration is safe. Mutations commit before
//! listeners fire.

use crate::attributes::AttributeBag;
use crate::entity::{DefaultEntity, EntityType};
use crate::error::{EntityError, Result};
use crate::factory::{DefaultEntityFactory, EntityFactory};
use crate::listener::{EntityEvent, EntityListener};
use parking_lot::RwLock;
use std::collections::hash_map::Entry;
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::{Arc, Weak};
use tracing::{debug, warn};
use uuid::Uuid;

/// Ownership registry for entities.
///
/// A container may record a parent container; the link is used purely for
/// factory/default wiring (child containers inherit the parent's factory)
/// and is never traversed for ownership decisions.
pub struct DefaultEntityContainer {
    factory: Arc<dyn EntityFactory>,
    parent: Option<Weak<DefaultEntityContainer>>,
    entities: RwLock<HashMap<Uuid, Arc<DefaultEntity>>>,
    listeners: RwLock<Vec<Arc<dyn EntityListener>>>,
}

impl DefaultEntityContainer {
    /// Container with the stock factory and no parent
    pub fn new() -> Arc<Self> {
        Self::with_factory(Arc::new(DefaultEntityFactory::new()))
    }

    /// Container with an explicit factory
    pub fn with_factory(factory: Arc<dyn EntityFactory>) -> Arc<Self> {
        Self::with_factory_and_parent(factory, None)
    }

    /// Container with an explicit factory and an optional parent link
    pub fn with_factory_and_parent(
        factory: Arc<dyn EntityFactory>,
        parent: Option<Weak<DefaultEntityContainer>>,
    ) -> Arc<Self> {
        Arc::new(Self {
            factory,
            parent,
            entities: RwLock::new(HashMap::new()),
            listeners: RwLock::new(Vec::new()),
        })
    }

    /// The factory entities of this container are built with
    pub fn factory(&self) -> Arc<dyn EntityFactory> {
        self.factory.clone()
    }

    /// Parent container, used only for factory wiring
    pub fn parent(&self) -> Option<Arc<DefaultEntityContainer>> {
        self.parent.as_ref().and_then(Weak::upgrade)
    }

    // ---- creation ----------------------------------------------------

    /// Create an entity with a random id and default type
    pub fn new_entity(self: &Arc<Self>) -> Result<Arc<DefaultEntity>> {
        self.new_entity_with(Uuid::new_v4(), EntityType::default(), AttributeBag::new())
    }

    /// Create an entity with an explicit id and default type
    pub fn new_entity_with_id(self: &Arc<Self>, id: Uuid) -> Result<Arc<DefaultEntity>> {
        self.new_entity_with(id, EntityType::default(), AttributeBag::new())
    }

    /// Create an entity with an explicit id, type and attributes.
    ///
    /// Fails with [`EntityError::DuplicateId`] if `id` is already present.
    /// The creation notification fires after the entity is registered.
    pub fn new_entity_with(
        self: &Arc<Self>,
        id: Uuid,
        entity_type: EntityType,
        attributes: AttributeBag,
    ) -> Result<Arc<DefaultEntity>> {
        let entity = self.factory.build(id, self, entity_type, attributes)?;
        debug_assert_eq!(entity.id(), id, "factory must honor the requested id");

        {
            let mut entities = self.entities.write();
            if entities.contains_key(&id) {
                return Err(EntityError::duplicate_id(id));
            }
            entities.insert(id, entity.clone());
        }
        entity.set_owner(Arc::downgrade(self));

        debug!(entity_id = %id, entity_type = %entity.entity_type(), "entity created");
        self.notify(EntityEvent::new(entity.clone()), |listener, event| {
            listener.entity_created(event)
        });
        Ok(entity)
    }

    // ---- destruction -------------------------------------------------

    /// Kill an entity; false if `id` is not present
    pub fn kill_entity(&self, id: Uuid) -> bool {
        let Some(entity) = self.entities.write().remove(&id) else {
            return false;
        };
        entity.clear_owner();

        debug!(entity_id = %id, "entity killed");
        self.notify(EntityEvent::new(entity), |listener, event| {
            listener.entity_killed(event)
        });
        true
    }

    /// Kill every entity currently present (snapshot first)
    pub fn kill_entities(&self) {
        let ids: Vec<Uuid> = self.entities.read().keys().copied().collect();
        for id in ids {
            self.kill_entity(id);
        }
    }

    // ---- transfer ----------------------------------------------------

    /// Receive an entity from elsewhere.
    ///
    /// Returns false without overwriting if the id is already present;
    /// otherwise inserts, re-parents the entity to this container and fires
    /// the received notification.
    pub fn receive_entity(self: &Arc<Self>, entity: Arc<DefaultEntity>) -> bool {
        let id = entity.id();
        {
            let mut entities = self.entities.write();
            if entities.contains_key(&id) {
                return false;
            }
            entities.insert(id, entity.clone());
        }
        entity.set_owner(Arc::downgrade(self));

        debug!(entity_id = %id, "entity received");
        self.notify(EntityEvent::new(entity), |listener, event| {
            listener.entity_received(event)
        });
        true
    }

    /// Move ownership of an entity to `target`.
    ///
    /// Fails with [`EntityError::SameContainer`] when `target` is this
    /// container, [`EntityError::NotOwned`] when the entity is not present
    /// here, and [`EntityError::DuplicateId`] when the target already holds
    /// the id. On failure the source's ownership is intact: the entity is
    /// never left ownerless and never dual-owned.
    pub fn transfer_entity(
        self: &Arc<Self>,
        id: Uuid,
        target: &Arc<DefaultEntityContainer>,
    ) -> Result<()> {
        if std::ptr::addr_eq(Arc::as_ptr(self), Arc::as_ptr(target)) {
            return Err(EntityError::same_container(id));
        }
        // Surface a duplicate in the target before touching source ownership
        if target.has_entity(id) {
            return Err(EntityError::duplicate_id(id));
        }

        let Some(entity) = self.entities.write().remove(&id) else {
            return Err(EntityError::not_owned(id));
        };

        if !target.receive_entity(entity.clone()) {
            // Lost a race to a concurrent insert in the target; restore
            // source ownership.
            match self.entities.write().entry(id) {
                Entry::Vacant(slot) => {
                    slot.insert(entity.clone());
                    entity.set_owner(Arc::downgrade(self));
                }
                Entry::Occupied(_) => {
                    // The id was re-created here while the transfer was in
                    // flight; the displaced entity stays detached.
                    warn!(entity_id = %id, "transfer rollback found the id re-created");
                    entity.clear_owner();
                }
            }
            return Err(EntityError::duplicate_id(id));
        }

        debug!(entity_id = %id, "entity transferred out");
        self.notify(
            EntityEvent::with_counterpart(entity, target.clone()),
            |listener, event| listener.entity_transferred(event),
        );
        Ok(())
    }

    // ---- queries -----------------------------------------------------

    pub fn get_entity(&self, id: Uuid) -> Option<Arc<DefaultEntity>> {
        self.entities.read().get(&id).cloned()
    }

    pub fn has_entity(&self, id: Uuid) -> bool {
        self.entities.read().contains_key(&id)
    }

    pub fn entity_count(&self) -> usize {
        self.entities.read().len()
    }

    pub fn has_entities(&self) -> bool {
        !self.entities.read().is_empty()
    }

    pub fn entity_ids(&self) -> Vec<Uuid> {
        self.entities.read().keys().copied().collect()
    }

    /// Snapshot of every entity currently present
    pub fn entities(&self) -> Vec<Arc<DefaultEntity>> {
        self.entities.read().values().cloned().collect()
    }

    // ---- listeners ---------------------------------------------------

    /// Register a listener; pointer-identical duplicates are ignored
    pub fn add_listener(&self, listener: Arc<dyn EntityListener>) -> bool {
        let mut listeners = self.listeners.write();
        if listeners
            .iter()
            .any(|known| std::ptr::addr_eq(Arc::as_ptr(known), Arc::as_ptr(&listener)))
        {
            return false;
        }
        listeners.push(listener);
        true
    }

    /// Remove a listener by identity; false if it was not registered
    pub fn remove_listener(&self, listener: &Arc<dyn EntityListener>) -> bool {
        let mut listeners = self.listeners.write();
        let before = listeners.len();
        listeners.retain(|known| !std::ptr::addr_eq(Arc::as_ptr(known), Arc::as_ptr(listener)));
        listeners.len() != before
    }

    pub fn clear_listeners(&self) {
        self.listeners.write().clear();
    }

    /// Snapshot of the registered listeners
    pub fn listeners(&self) -> Vec<Arc<dyn EntityListener>> {
        self.listeners.read().clone()
    }

    /// Dispatch from a snapshot so listeners may mutate the container
    fn notify(&self, event: EntityEvent, dispatch: impl Fn(&dyn EntityListener, &EntityEvent)) {
        let listeners: Vec<Arc<dyn EntityListener>> = self.listeners.read().clone();
        for listener in listeners {
            dispatch(listener.as_ref(), &event);
        }
    }

    fn listener_addresses(&self) -> HashSet<usize> {
        self.listeners
            .read()
            .iter()
            .map(|listener| Arc::as_ptr(listener) as *const () as usize)
            .collect()
    }
}

/// Structural equality: same entity identifiers and same listener set
impl PartialEq for DefaultEntityContainer {
    fn eq(&self, other: &Self) -> bool {
        if std::ptr::eq(self, other) {
            return true;
        }
        let ours: HashSet<Uuid> = self.entities.read().keys().copied().collect();
        let theirs: HashSet<Uuid> = other.entities.read().keys().copied().collect();
        ours == theirs && self.listener_addresses() == other.listener_addresses()
    }
}

impl Eq for DefaultEntityContainer {}

impl Hash for DefaultEntityContainer {
    fn hash<H: Hasher>(&self, state: &mut H) {
        let mut ids = self.entity_ids();
        ids.sort_unstable();
        ids.hash(state);

        let mut addresses: Vec<usize> = self.listener_addresses().into_iter().collect();
        addresses.sort_unstable();
        addresses.hash(state);
    }
}

impl fmt::Debug for DefaultEntityContainer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DefaultEntityContainer")
            .field("entities", &self.entity_count())
            .field("listeners", &self.listeners.read().len())
            .field("has_parent", &self.parent.is_some())
            .finish()
    }
}

//! Entity Ownership Core
//!
//! A registry of uniquely-identified entities that can own attributes, be
//! organized hierarchically, and be moved between containers. A container
//! guarantees that an identifier present in its mapping denotes an entity
//! strongly owned by exactly that container; creation, destruction and
//! cross-container transfer all preserve single ownership while fanning
//! out lifecycle notifications to registered listeners.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────┐      ┌───────────────────────┐
//! │   DefaultEntityContainer     │─────▶│    EntityFactory      │
//! │                              │      │ build(id, type, …)    │
//! │  Uuid → Arc<DefaultEntity>   │      └───────────────────────┘
//! │  listeners: EntityListener   │      ┌───────────────────────┐
//! │  parent (factory wiring)     │─────▶│   EntityListener      │
//! └──────────────────────────────┘      │ created / killed /    │
//!               │                       │ transferred / received│
//!               ▼                       └───────────────────────┘
//! ┌──────────────────────────────┐
//! │        DefaultEntity         │
//! │  id, type, attribute bag,    │
//! │  owner link, child container │
//! └──────────────────────────────┘
//! ```
//!
//! # Guarantees
//!
//! - An entity is never "present and owned" in two containers at once.
//! - A transfer either ends with the entity owned solely by the target or
//!   fails with the source's ownership intact.
//! - Mutations commit before listener dispatch, so a failing listener can
//!   never corrupt ownership state.

pub mod attributes;
pub mod container;
pub mod entity;
pub mod error;
pub mod factory;
pub mod listener;

pub use attributes::{AttributeBag, AttributeValue};
pub use container::DefaultEntityContainer;
pub use entity::{DefaultEntity, EntityType};
pub use error::{EntityError, Result};
pub use factory::{DefaultEntityFactory, EntityFactory};
pub use listener::{EntityEvent, EntityListener};

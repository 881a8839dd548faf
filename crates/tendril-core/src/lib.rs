//! Tendril Core - Relation model and diff engine
//!
//! This crate provides the relation data types, the diff that computes the
//! minimal edge changes between two relation sets, and the store trait used
//! to reconcile an entity's relations with a desired state.

pub mod diff;
pub mod entity;
pub mod error;
pub mod limits;
pub mod memory;
pub mod reconcile;
pub mod relation;
pub mod store;

pub use diff::diff;
pub use entity::EntityId;
pub use error::{Error, Result};
pub use memory::MemoryRelationStore;
pub use reconcile::{reconcile, ReconcileReport};
pub use relation::{
    DirectedRelations, Direction, EdgeAction, EdgeMutation, RelationChanges, RelationDelta,
    RelationKey, RelationSet, TargetTypeList,
};
pub use store::RelationStore;

//! In-memory relationship store for testing

use crate::entity::EntityId;
use crate::error::{Error, Result};
use crate::relation::{Direction, RelationSet};
use crate::store::RelationStore;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::RwLock;

/// In-memory relationship store
///
/// Useful for testing and for dry runs of a reconciliation.
pub struct MemoryRelationStore {
    relations: RwLock<HashMap<EntityId, RelationSet>>,
}

impl MemoryRelationStore {
    pub fn new() -> Self {
        Self {
            relations: RwLock::new(HashMap::new()),
        }
    }

    /// Seed the relations of an entity, replacing whatever was stored
    pub fn insert(&self, entity: EntityId, relations: RelationSet) -> Result<()> {
        let mut map = self
            .relations
            .write()
            .map_err(|e| Error::Store(format!("Lock error: {}", e)))?;
        map.insert(entity, relations);
        Ok(())
    }
}

impl Default for MemoryRelationStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RelationStore for MemoryRelationStore {
    async fn get_relations(&self, entity: &EntityId) -> Result<RelationSet> {
        let map = self
            .relations
            .read()
            .map_err(|e| Error::Store(format!("Lock error: {}", e)))?;
        Ok(map.get(entity).cloned().unwrap_or_default())
    }

    async fn add_edge(
        &self,
        entity: &EntityId,
        direction: Direction,
        key: &str,
        target_type: &str,
    ) -> Result<()> {
        let mut map = self
            .relations
            .write()
            .map_err(|e| Error::Store(format!("Lock error: {}", e)))?;
        map.entry(entity.clone())
            .or_default()
            .direction_mut(direction)
            .entry(key)
            .insert(target_type);
        Ok(())
    }

    async fn remove_edge(
        &self,
        entity: &EntityId,
        direction: Direction,
        key: &str,
        target_type: &str,
    ) -> Result<()> {
        let mut map = self
            .relations
            .write()
            .map_err(|e| Error::Store(format!("Lock error: {}", e)))?;
        let relations = map
            .get_mut(entity)
            .ok_or_else(|| Error::EntityNotFound(entity.to_string()))?
            .direction_mut(direction);
        if let Some(types) = relations.get_mut(key) {
            types.remove(target_type);
        }
        relations.prune();
        Ok(())
    }
}

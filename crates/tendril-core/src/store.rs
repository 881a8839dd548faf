//! Relationship store trait definition

use crate::entity::EntityId;
use crate::error::Result;
use crate::relation::{Direction, EdgeAction, RelationDelta, RelationSet};
use async_trait::async_trait;

/// Store holding the relations of each entity.
///
/// Implementations translate edge calls into whatever query language the
/// backing graph uses; this crate only needs the primitives below.
#[async_trait]
pub trait RelationStore: Send + Sync {
    /// Current relations of an entity (empty if it has none)
    async fn get_relations(&self, entity: &EntityId) -> Result<RelationSet>;

    /// Create one edge
    async fn add_edge(
        &self,
        entity: &EntityId,
        direction: Direction,
        key: &str,
        target_type: &str,
    ) -> Result<()>;

    /// Delete one edge
    async fn remove_edge(
        &self,
        entity: &EntityId,
        direction: Direction,
        key: &str,
        target_type: &str,
    ) -> Result<()>;

    // ─────────────────────────────────────────────────────────────────────────
    // Bulk Operations
    // ─────────────────────────────────────────────────────────────────────────

    /// Persist a delta edge by edge, removals first.
    ///
    /// Returns the number of edge calls made. Stops at the first failing
    /// call; edges already written stay written.
    async fn apply_delta(&self, entity: &EntityId, delta: &RelationDelta) -> Result<usize> {
        let mutations = delta.mutations();
        for mutation in &mutations {
            match mutation.action {
                EdgeAction::Remove => {
                    self.remove_edge(entity, mutation.direction, &mutation.key, &mutation.target_type)
                        .await?
                }
                EdgeAction::Add => {
                    self.add_edge(entity, mutation.direction, &mutation.key, &mutation.target_type)
                        .await?
                }
            }
        }
        Ok(mutations.len())
    }
}

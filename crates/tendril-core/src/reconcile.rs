//! Relation reconciliation
//!
//! Brings the stored relations of one entity in line with a desired
//! [`RelationSet`] by diffing and writing only the edges that changed.

use crate::diff::diff;
use crate::entity::EntityId;
use crate::error::Result;
use crate::relation::{RelationDelta, RelationSet};
use crate::store::RelationStore;
use serde::{Deserialize, Serialize};

/// Outcome of a reconciliation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReconcileReport {
    pub entity: EntityId,

    /// Delta that was written
    pub delta: RelationDelta,

    /// Number of add/remove edge calls issued
    pub mutations_applied: usize,
}

impl ReconcileReport {
    pub fn is_noop(&self) -> bool {
        self.mutations_applied == 0
    }
}

/// Reconcile the relations of `entity` with `updated`.
///
/// `updated` is checked against the input limits before the store is
/// touched. An empty delta makes no edge calls.
pub async fn reconcile<S>(store: &S, entity: &EntityId, updated: &RelationSet) -> Result<ReconcileReport>
where
    S: RelationStore + ?Sized,
{
    updated.validate()?;

    let existing = store.get_relations(entity).await?;
    let delta = diff(&existing, updated);

    if delta.is_empty() {
        tracing::debug!("Relations of {} already up to date", entity);
        return Ok(ReconcileReport {
            entity: entity.clone(),
            delta,
            mutations_applied: 0,
        });
    }

    let mutations_applied = store.apply_delta(entity, &delta).await?;
    tracing::info!("Reconciled {} relation edges for {}", mutations_applied, entity);

    Ok(ReconcileReport {
        entity: entity.clone(),
        delta,
        mutations_applied,
    })
}

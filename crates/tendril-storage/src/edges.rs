//! Turning relation deltas into batch writes

use crate::batch::{BatchWriteRequest, Partition, WriteOperation};
use serde_json::json;
use tendril_core::{EdgeAction, EdgeMutation, EntityId, RelationDelta};

/// Builds the bulk-write batch that stores a relation delta as edge items.
///
/// Every edge is an item `{entity, direction, key, target_type}` in one
/// partition; added edges become puts and removed edges deletes of the
/// same fields. Removals are queued ahead of additions.
#[derive(Debug, Clone)]
pub struct DeltaBatchBuilder {
    partition: Partition,
}

impl DeltaBatchBuilder {
    pub fn new(partition: impl Into<Partition>) -> Self {
        Self {
            partition: partition.into(),
        }
    }

    pub fn build(&self, entity: &EntityId, delta: &RelationDelta) -> BatchWriteRequest {
        let operations = delta
            .mutations()
            .into_iter()
            .map(|mutation| edge_operation(entity, mutation))
            .collect::<Vec<_>>();

        let mut batch = BatchWriteRequest::new();
        if !operations.is_empty() {
            batch.extend(self.partition.clone(), operations);
        }
        batch
    }
}

fn edge_operation(entity: &EntityId, mutation: EdgeMutation) -> WriteOperation {
    let item = json!({
        "entity": entity,
        "direction": mutation.direction,
        "key": mutation.key,
        "target_type": mutation.target_type,
    });
    match mutation.action {
        EdgeAction::Add => WriteOperation::Put(item),
        EdgeAction::Remove => WriteOperation::Delete(item),
    }
}

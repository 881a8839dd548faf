//! Relation diffing
//!
//! [`diff`] computes the smallest set of edge additions and removals that
//! turns one [`RelationSet`] into another. Each direction is handled on its
//! own; within a direction every key present on either side is compared by
//! membership, so reordering a target list is not a change.

use crate::relation::{DirectedRelations, Direction, RelationDelta, RelationSet, TargetTypeList};
use std::collections::BTreeSet;

/// Compute the delta that takes `existing` to `updated`.
///
/// All four containers of the result (`add.in`, `add.out`, `remove.in`,
/// `remove.out`) are present; keys whose membership did not change are
/// omitted from all of them.
pub fn diff(existing: &RelationSet, updated: &RelationSet) -> RelationDelta {
    let mut delta = RelationDelta::default();

    for direction in Direction::ALL {
        let (added, removed) =
            diff_direction(existing.direction(direction), updated.direction(direction));
        *delta.add.direction_mut(direction) = added;
        *delta.remove.direction_mut(direction) = removed;
    }

    tracing::debug!(
        additions = delta.add.incoming.edge_count() + delta.add.outgoing.edge_count(),
        removals = delta.remove.incoming.edge_count() + delta.remove.outgoing.edge_count(),
        "Computed relation delta"
    );

    delta
}

/// Diff one direction, returning `(added, removed)`
fn diff_direction(
    existing: Option<&DirectedRelations>,
    updated: Option<&DirectedRelations>,
) -> (DirectedRelations, DirectedRelations) {
    let empty_relations = DirectedRelations::new();
    let existing = existing.unwrap_or(&empty_relations);
    let updated = updated.unwrap_or(&empty_relations);

    let keys: BTreeSet<&String> = existing.keys().chain(updated.keys()).collect();

    let mut added = DirectedRelations::new();
    let mut removed = DirectedRelations::new();
    let empty_types = TargetTypeList::new();

    for key in keys {
        let existing_types = existing.get(key).unwrap_or(&empty_types);
        let updated_types = updated.get(key).unwrap_or(&empty_types);

        let key_added = updated_types.difference(existing_types);
        if !key_added.is_empty() {
            added.insert(key.clone(), key_added);
        }

        let key_removed = existing_types.difference(updated_types);
        if !key_removed.is_empty() {
            removed.insert(key.clone(), key_removed);
        }
    }

    (added, removed)
}

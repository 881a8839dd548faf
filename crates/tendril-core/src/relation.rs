//! Relation (edge) types
//!
//! Relations are described per entity as a [`RelationSet`]: for each
//! [`Direction`] a mapping from relation key (e.g. `located_at`) to the
//! entity types on the other end of the edge.

use crate::error::{Error, Result};
use crate::limits::{validate_relation_key, validate_relation_keys, validate_target_type, validate_target_types};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};

/// Name of a relationship type, e.g. `installed_at`
pub type RelationKey = String;

/// Direction of an edge relative to the entity that owns the relation set
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    /// Edges pointing at the entity
    In,
    /// Edges leaving the entity
    Out,
}

impl Direction {
    pub const ALL: [Direction; 2] = [Direction::In, Direction::Out];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::In => "in",
            Self::Out => "out",
        }
    }
}

impl std::fmt::Display for Direction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Target entity types attached to one relation key.
///
/// The list keeps the order it was built in, but equality only looks at
/// membership: `[site, location]` equals `[location, site]`, and duplicates
/// do not count.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TargetTypeList(Vec<String>);

impl TargetTypeList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn contains(&self, target_type: &str) -> bool {
        self.0.iter().any(|t| t == target_type)
    }

    /// Append a target type unless it is already a member
    pub fn insert(&mut self, target_type: impl Into<String>) -> bool {
        let target_type = target_type.into();
        if self.contains(&target_type) {
            return false;
        }
        self.0.push(target_type);
        true
    }

    /// Remove every occurrence of a target type
    pub fn remove(&mut self, target_type: &str) -> bool {
        let before = self.0.len();
        self.0.retain(|t| t != target_type);
        self.0.len() != before
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    pub fn as_slice(&self) -> &[String] {
        &self.0
    }

    /// Members of `self` that are not members of `other`.
    ///
    /// Keeps first-seen order and drops duplicates.
    pub fn difference(&self, other: &TargetTypeList) -> TargetTypeList {
        let excluded = other.members();
        let mut seen = HashSet::new();
        self.0
            .iter()
            .filter(|t| !excluded.contains(t.as_str()) && seen.insert(t.as_str()))
            .cloned()
            .collect()
    }

    fn members(&self) -> HashSet<&str> {
        self.iter().collect()
    }
}

impl PartialEq for TargetTypeList {
    fn eq(&self, other: &Self) -> bool {
        self.members() == other.members()
    }
}

impl Eq for TargetTypeList {}

impl<S: Into<String>> FromIterator<S> for TargetTypeList {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self(iter.into_iter().map(Into::into).collect())
    }
}

impl From<Vec<String>> for TargetTypeList {
    fn from(types: Vec<String>) -> Self {
        Self(types)
    }
}

impl From<Vec<&str>> for TargetTypeList {
    fn from(types: Vec<&str>) -> Self {
        types.into_iter().collect()
    }
}

impl<'a> IntoIterator for &'a TargetTypeList {
    type Item = &'a String;
    type IntoIter = std::slice::Iter<'a, String>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// Relation keys and their target types for a single direction
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DirectedRelations(BTreeMap<RelationKey, TargetTypeList>);

impl DirectedRelations {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert
    pub fn with(mut self, key: impl Into<RelationKey>, types: impl Into<TargetTypeList>) -> Self {
        self.insert(key, types);
        self
    }

    pub fn insert(
        &mut self,
        key: impl Into<RelationKey>,
        types: impl Into<TargetTypeList>,
    ) -> Option<TargetTypeList> {
        self.0.insert(key.into(), types.into())
    }

    pub fn get(&self, key: &str) -> Option<&TargetTypeList> {
        self.0.get(key)
    }

    pub fn get_mut(&mut self, key: &str) -> Option<&mut TargetTypeList> {
        self.0.get_mut(key)
    }

    pub fn entry(&mut self, key: impl Into<RelationKey>) -> &mut TargetTypeList {
        self.0.entry(key.into()).or_default()
    }

    pub fn remove(&mut self, key: &str) -> Option<TargetTypeList> {
        self.0.remove(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &RelationKey> {
        self.0.keys()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&RelationKey, &TargetTypeList)> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Total number of (key, target type) pairs
    pub fn edge_count(&self) -> usize {
        self.0.values().map(TargetTypeList::len).sum()
    }

    /// Drop keys whose target list became empty
    pub(crate) fn prune(&mut self) {
        self.0.retain(|_, types| !types.is_empty());
    }
}

impl<K: Into<RelationKey>, T: Into<TargetTypeList>> FromIterator<(K, T)> for DirectedRelations {
    fn from_iter<I: IntoIterator<Item = (K, T)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, t)| (k.into(), t.into())).collect())
    }
}

/// The incoming and outgoing relations of one entity.
///
/// A missing direction means "no relations that way"; it is kept distinct
/// from an explicitly empty mapping so round-tripped documents keep their
/// shape.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RelationSet {
    #[serde(rename = "in", default, skip_serializing_if = "Option::is_none")]
    pub incoming: Option<DirectedRelations>,

    #[serde(rename = "out", default, skip_serializing_if = "Option::is_none")]
    pub outgoing: Option<DirectedRelations>,
}

impl RelationSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a relation key with its target types in the given direction
    pub fn with_relation(
        mut self,
        direction: Direction,
        key: impl Into<RelationKey>,
        types: impl Into<TargetTypeList>,
    ) -> Self {
        self.direction_mut(direction).insert(key, types);
        self
    }

    pub fn with_incoming(self, key: impl Into<RelationKey>, types: impl Into<TargetTypeList>) -> Self {
        self.with_relation(Direction::In, key, types)
    }

    pub fn with_outgoing(self, key: impl Into<RelationKey>, types: impl Into<TargetTypeList>) -> Self {
        self.with_relation(Direction::Out, key, types)
    }

    pub fn direction(&self, direction: Direction) -> Option<&DirectedRelations> {
        match direction {
            Direction::In => self.incoming.as_ref(),
            Direction::Out => self.outgoing.as_ref(),
        }
    }

    /// Mutable access to a direction, creating it if absent
    pub fn direction_mut(&mut self, direction: Direction) -> &mut DirectedRelations {
        match direction {
            Direction::In => self.incoming.get_or_insert_with(DirectedRelations::new),
            Direction::Out => self.outgoing.get_or_insert_with(DirectedRelations::new),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.edge_count() == 0
    }

    pub fn edge_count(&self) -> usize {
        Direction::ALL
            .iter()
            .filter_map(|d| self.direction(*d))
            .map(DirectedRelations::edge_count)
            .sum()
    }

    /// Parse a relation set from JSON text
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json)
            .map_err(|e| Error::InvalidArgument(format!("malformed relation set: {}", e)))
    }

    /// Check keys and target types against the input limits
    pub fn validate(&self) -> Result<()> {
        for direction in Direction::ALL {
            let Some(relations) = self.direction(direction) else {
                continue;
            };
            validate_relation_keys(relations.len())?;
            for (key, types) in relations.iter() {
                validate_relation_key(key)?;
                validate_target_types(types.len())?;
                for target_type in types.iter() {
                    validate_target_type(target_type)?;
                }
            }
        }
        Ok(())
    }

    /// The relation set that results from applying `delta` to `self`.
    ///
    /// Keys left without target types are dropped. A direction that was
    /// absent stays absent unless the delta adds to it.
    pub fn apply(&self, delta: &RelationDelta) -> RelationSet {
        let mut result = self.clone();
        for direction in Direction::ALL {
            let removals = delta.remove.direction(direction);
            let additions = delta.add.direction(direction);
            if removals.is_empty() && additions.is_empty() {
                continue;
            }

            let relations = result.direction_mut(direction);
            for (key, types) in removals.iter() {
                if let Some(existing) = relations.get_mut(key) {
                    for target_type in types.iter() {
                        existing.remove(target_type);
                    }
                }
            }
            for (key, types) in additions.iter() {
                let existing = relations.entry(key.clone());
                for target_type in types.iter() {
                    existing.insert(target_type);
                }
            }
            relations.prune();
        }
        result
    }
}

/// Relation keys grouped by direction, both directions always present
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelationChanges {
    #[serde(rename = "in", default)]
    pub incoming: DirectedRelations,

    #[serde(rename = "out", default)]
    pub outgoing: DirectedRelations,
}

impl RelationChanges {
    pub fn direction(&self, direction: Direction) -> &DirectedRelations {
        match direction {
            Direction::In => &self.incoming,
            Direction::Out => &self.outgoing,
        }
    }

    pub fn direction_mut(&mut self, direction: Direction) -> &mut DirectedRelations {
        match direction {
            Direction::In => &mut self.incoming,
            Direction::Out => &mut self.outgoing,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.incoming.is_empty() && self.outgoing.is_empty()
    }
}

/// Minimal edit script between two relation sets.
///
/// A key shows up under `add` or `remove` only when its membership changed;
/// unchanged keys never appear, not even as empty lists.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelationDelta {
    #[serde(default)]
    pub add: RelationChanges,

    #[serde(default)]
    pub remove: RelationChanges,
}

impl RelationDelta {
    pub fn is_empty(&self) -> bool {
        self.add.is_empty() && self.remove.is_empty()
    }

    /// Number of single-edge mutations this delta expands into
    pub fn mutation_count(&self) -> usize {
        Direction::ALL
            .iter()
            .map(|d| self.add.direction(*d).edge_count() + self.remove.direction(*d).edge_count())
            .sum()
    }

    /// Expand into one mutation per (key, target type) pair.
    ///
    /// Removals come before additions so a store that enforces per-key
    /// cardinality never sees both edges at once.
    pub fn mutations(&self) -> Vec<EdgeMutation> {
        let mut mutations = Vec::with_capacity(self.mutation_count());
        for (action, changes) in [(EdgeAction::Remove, &self.remove), (EdgeAction::Add, &self.add)] {
            for direction in Direction::ALL {
                for (key, types) in changes.direction(direction).iter() {
                    for target_type in types.iter() {
                        mutations.push(EdgeMutation {
                            action,
                            direction,
                            key: key.clone(),
                            target_type: target_type.to_string(),
                        });
                    }
                }
            }
        }
        mutations
    }
}

/// Whether an edge is created or deleted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EdgeAction {
    Add,
    Remove,
}

/// A single add-edge or remove-edge call
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EdgeMutation {
    pub action: EdgeAction,
    pub direction: Direction,
    pub key: RelationKey,
    pub target_type: String,
}

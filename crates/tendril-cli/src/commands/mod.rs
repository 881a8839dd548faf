//! CLI command implementations

use std::path::Path;

use anyhow::Context;
use tendril_core::RelationSet;

pub mod apply;
pub mod completions;
pub mod config;
pub mod diff;
pub mod plan;

/// Read a relation set from a JSON file
pub(crate) fn read_relation_set(path: &Path) -> anyhow::Result<RelationSet> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let set = RelationSet::from_json(&text).with_context(|| format!("In {}", path.display()))?;
    Ok(set)
}

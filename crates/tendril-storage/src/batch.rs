//! Batch write request types

use crate::error::{StorageError, StorageResult};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::borrow::Borrow;

/// Named collection the write operations target (a table, a bucket, ...)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Partition(String);

impl Partition {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for Partition {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Partition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Partition {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for Partition {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// A single atomic write against one item.
///
/// Serialized as `{"put": item}` or `{"delete": key}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WriteOperation {
    /// Create or replace an item
    Put(serde_json::Value),
    /// Delete the item(s) matching a key
    Delete(serde_json::Value),
}

impl WriteOperation {
    pub fn put(item: serde_json::Value) -> Self {
        Self::Put(item)
    }

    pub fn delete(key: serde_json::Value) -> Self {
        Self::Delete(key)
    }
}

/// Write operations grouped by partition.
///
/// Partitions iterate in the order they first appeared; operations within
/// a partition keep the order they were added in. Equality ignores the
/// order of partitions.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BatchWriteRequest(IndexMap<Partition, Vec<WriteOperation>>);

impl BatchWriteRequest {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style append of several operations to one partition
    pub fn with(mut self, partition: impl Into<Partition>, operations: Vec<WriteOperation>) -> Self {
        self.extend(partition, operations);
        self
    }

    pub fn push(&mut self, partition: impl Into<Partition>, operation: WriteOperation) {
        self.0.entry(partition.into()).or_default().push(operation);
    }

    /// Append operations to a partition, creating it if needed
    pub fn extend(
        &mut self,
        partition: impl Into<Partition>,
        operations: impl IntoIterator<Item = WriteOperation>,
    ) {
        self.0.entry(partition.into()).or_default().extend(operations);
    }

    pub fn get(&self, partition: &str) -> Option<&[WriteOperation]> {
        self.0.get(partition).map(Vec::as_slice)
    }

    pub fn partitions(&self) -> impl Iterator<Item = &Partition> {
        self.0.keys()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Partition, &[WriteOperation])> {
        self.0.iter().map(|(p, ops)| (p, ops.as_slice()))
    }

    /// Every operation with its partition, partition by partition
    pub fn operations(&self) -> impl Iterator<Item = (&Partition, &WriteOperation)> {
        self.0.iter().flat_map(|(p, ops)| ops.iter().map(move |op| (p, op)))
    }

    /// Owning version of [`operations`](Self::operations)
    pub fn into_operations(self) -> impl Iterator<Item = (Partition, WriteOperation)> {
        self.0
            .into_iter()
            .flat_map(|(p, ops)| ops.into_iter().map(move |op| (p.clone(), op)))
    }

    pub fn into_partitions(self) -> impl Iterator<Item = (Partition, Vec<WriteOperation>)> {
        self.0.into_iter()
    }

    /// Total number of operations across all partitions
    pub fn len(&self) -> usize {
        self.0.values().map(Vec::len).sum()
    }

    /// True when there is nothing to write, even if partitions are listed
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn partition_count(&self) -> usize {
        self.0.len()
    }

    /// Parse a batch from JSON text
    pub fn from_json(json: &str) -> StorageResult<Self> {
        serde_json::from_str(json)
            .map_err(|e| StorageError::InvalidArgument(format!("malformed batch: {}", e)))
    }
}

/// Response of a bulk write call
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BatchWriteResult {
    /// Operations the store did not apply, in request shape
    #[serde(default)]
    pub unprocessed: BatchWriteRequest,
}

impl BatchWriteResult {
    /// Everything in the request was applied
    pub fn complete() -> Self {
        Self::default()
    }

    pub fn with_unprocessed(unprocessed: BatchWriteRequest) -> Self {
        Self { unprocessed }
    }

    pub fn has_unprocessed(&self) -> bool {
        !self.unprocessed.is_empty()
    }
}

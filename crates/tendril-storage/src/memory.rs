//! In-memory bulk-write store for testing
//!
//! Behaves like a throttled key-value store: it enforces a per-request item
//! limit, can leave the tail of each request unprocessed, and can be told to
//! fail its next calls.

use crate::batch::{BatchWriteRequest, BatchWriteResult, Partition, WriteOperation};
use crate::error::{StorageError, StorageResult};
use crate::traits::BatchWriter;
use async_trait::async_trait;
use serde_json::Value;
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

/// In-memory bulk-write store
///
/// Puts replace an identical item rather than duplicating it; a delete key
/// removes every item whose fields include all of the key's fields.
pub struct MemoryBatchStore {
    max_items_per_request: usize,
    unprocessed_rate: f64,
    items: Mutex<HashMap<Partition, Vec<Value>>>,
    failures: Mutex<VecDeque<StorageError>>,
    calls: AtomicUsize,
    applied: AtomicUsize,
}

impl MemoryBatchStore {
    pub fn new(max_items_per_request: usize) -> Self {
        Self {
            max_items_per_request,
            unprocessed_rate: 0.0,
            items: Mutex::new(HashMap::new()),
            failures: Mutex::new(VecDeque::new()),
            calls: AtomicUsize::new(0),
            applied: AtomicUsize::new(0),
        }
    }

    /// Leave `floor(len * rate)` operations at the end of every request
    /// unprocessed. A rate of 1.0 never accepts anything.
    pub fn with_unprocessed_rate(mut self, rate: f64) -> Self {
        self.unprocessed_rate = rate.clamp(0.0, 1.0);
        self
    }

    /// Queue an error to be returned by a future call, in FIFO order
    pub fn fail_next(&self, err: StorageError) -> StorageResult<()> {
        self.failures
            .lock()
            .map_err(|e| StorageError::Transient(format!("Lock error: {}", e)))?
            .push_back(err);
        Ok(())
    }

    /// Number of bulk-write calls received, failed ones included
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Number of operations applied so far
    pub fn applied(&self) -> usize {
        self.applied.load(Ordering::SeqCst)
    }

    /// Items currently stored in a partition
    pub fn items(&self, partition: &str) -> StorageResult<Vec<Value>> {
        let items = self
            .items
            .lock()
            .map_err(|e| StorageError::Transient(format!("Lock error: {}", e)))?;
        Ok(items.get(partition).cloned().unwrap_or_default())
    }

    fn apply_operation(items: &mut Vec<Value>, operation: WriteOperation) {
        match operation {
            WriteOperation::Put(item) => {
                if !items.contains(&item) {
                    items.push(item);
                }
            }
            WriteOperation::Delete(key) => items.retain(|item| !matches_key(item, &key)),
        }
    }
}

/// Whether every field of `key` has the same value in `item`
fn matches_key(item: &Value, key: &Value) -> bool {
    match (item, key) {
        (Value::Object(item), Value::Object(key)) => {
            key.iter().all(|(field, value)| item.get(field) == Some(value))
        }
        _ => item == key,
    }
}

#[async_trait]
impl BatchWriter for MemoryBatchStore {
    async fn batch_write(&self, request: &BatchWriteRequest) -> StorageResult<BatchWriteResult> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        let queued = self
            .failures
            .lock()
            .map_err(|e| StorageError::Transient(format!("Lock error: {}", e)))?
            .pop_front();
        if let Some(err) = queued {
            tracing::debug!("Memory store failing call: {}", err);
            return Err(err);
        }

        let len = request.len();
        if len > self.max_items_per_request {
            return Err(StorageError::NonRetryable(format!(
                "request has {} items, limit is {}",
                len, self.max_items_per_request
            )));
        }

        let left_over = (len as f64 * self.unprocessed_rate).floor() as usize;
        let accepted = len - left_over.min(len);

        let mut items = self
            .items
            .lock()
            .map_err(|e| StorageError::Transient(format!("Lock error: {}", e)))?;
        let mut unprocessed = BatchWriteRequest::new();

        for (index, (partition, operation)) in request.clone().into_operations().enumerate() {
            if index < accepted {
                Self::apply_operation(items.entry(partition).or_default(), operation);
            } else {
                unprocessed.push(partition, operation);
            }
        }

        self.applied.fetch_add(accepted, Ordering::SeqCst);
        tracing::debug!("Memory store applied {} of {} operations", accepted, len);

        Ok(BatchWriteResult::with_unprocessed(unprocessed))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_put_and_delete() {
        let store = MemoryBatchStore::new(10);
        let request = BatchWriteRequest::new().with(
            "edges",
            vec![
                WriteOperation::put(json!({"entity": "a", "key": "located_at"})),
                WriteOperation::put(json!({"entity": "a", "key": "located_at"})),
                WriteOperation::put(json!({"entity": "b", "key": "located_at"})),
                WriteOperation::delete(json!({"entity": "b"})),
            ],
        );

        let result = store.batch_write(&request).await.unwrap();

        assert!(!result.has_unprocessed());
        assert_eq!(store.items("edges").unwrap(), vec![json!({"entity": "a", "key": "located_at"})]);
        assert_eq!(store.applied(), 4);
    }

    #[tokio::test]
    async fn test_leaves_tail_unprocessed() {
        let store = MemoryBatchStore::new(10).with_unprocessed_rate(0.5);
        let request = BatchWriteRequest::new()
            .with("a", vec![WriteOperation::put(json!({"id": 1})), WriteOperation::put(json!({"id": 2}))])
            .with("b", vec![WriteOperation::put(json!({"id": 3})), WriteOperation::put(json!({"id": 4}))]);

        let result = store.batch_write(&request).await.unwrap();

        assert_eq!(
            result.unprocessed,
            BatchWriteRequest::new()
                .with("b", vec![WriteOperation::put(json!({"id": 3})), WriteOperation::put(json!({"id": 4}))])
        );
        assert_eq!(store.items("a").unwrap().len(), 2);
        assert!(store.items("b").unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_rejects_oversized_request() {
        let store = MemoryBatchStore::new(1);
        let request = BatchWriteRequest::new().with(
            "a",
            vec![WriteOperation::put(json!({"id": 1})), WriteOperation::put(json!({"id": 2}))],
        );

        let err = store.batch_write(&request).await.unwrap_err();
        assert!(matches!(err, StorageError::NonRetryable(_)));
    }

    #[tokio::test]
    async fn test_queued_failures() {
        let store = MemoryBatchStore::new(5);
        store.fail_next(StorageError::Transient("slow down".to_string())).unwrap();
        let request = BatchWriteRequest::new().with("a", vec![WriteOperation::put(json!({"id": 1}))]);

        assert!(store.batch_write(&request).await.is_err());
        assert!(store.batch_write(&request).await.is_ok());
        assert_eq!(store.calls(), 2);
    }
}

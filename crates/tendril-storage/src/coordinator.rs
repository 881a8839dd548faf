//! Applying large batches through a size-limited bulk-write API
//!
//! The coordinator splits a batch into request-sized chunks, sends each
//! through the retry driver, and folds anything the store hands back as
//! unprocessed into the remaining work. Operations on the same partition
//! are submitted in the order they were added.

use crate::batch::BatchWriteRequest;
use crate::error::{ApplyError, StorageError};
use crate::partition::{chunk, validate_max_items};
use crate::rejoin::rejoin;
use crate::retry::{RetryCoordinator, RetryPolicy};
use crate::traits::BatchWriter;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// Summary of a successful apply
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApplyReport {
    /// Operations in the submitted batch
    pub operations: usize,

    /// Bulk-write requests that returned successfully
    pub requests: usize,

    /// Requests that came back with unprocessed operations
    pub unprocessed_rounds: usize,
}

/// Drives a batch to completion against a [`BatchWriter`]
pub struct BatchWriteCoordinator<W> {
    writer: W,
    max_items_per_request: usize,
    policy: RetryPolicy<StorageError>,
    retry: RetryCoordinator,
}

impl<W: BatchWriter> BatchWriteCoordinator<W> {
    pub fn new(writer: W, max_items_per_request: usize, policy: RetryPolicy<StorageError>) -> Self {
        Self {
            writer,
            max_items_per_request,
            policy,
            retry: RetryCoordinator::new(),
        }
    }

    /// Replace the retry driver, e.g. with one using fixed jitter
    pub fn with_retry(mut self, retry: RetryCoordinator) -> Self {
        self.retry = retry;
        self
    }

    /// Write every operation of `batch`.
    ///
    /// Fails on the first error the retry driver gives up on, or when
    /// `max_attempts` requests in a row come back with unprocessed
    /// operations. Either way the error carries every operation that was
    /// not confirmed.
    pub async fn apply(&self, batch: BatchWriteRequest) -> Result<ApplyReport, ApplyError> {
        if let Err(err) = validate_max_items(self.max_items_per_request) {
            return Err(ApplyError::new(err, batch));
        }

        let mut report = ApplyReport {
            operations: batch.len(),
            ..Default::default()
        };
        let mut pending: VecDeque<BatchWriteRequest> = chunk(batch, self.max_items_per_request).into();
        let mut leftover_rounds: u32 = 0;

        tracing::debug!(
            "Applying {} operations in {} requests",
            report.operations,
            pending.len()
        );

        while let Some(request) = pending.pop_front() {
            let submitted = request.len();
            let outcome = self
                .retry
                .execute(&self.policy, || self.writer.batch_write(&request))
                .await;

            let result = match outcome {
                Ok(result) => result,
                Err(err) => {
                    let remaining = rejoin(request, pending);
                    tracing::warn!(
                        "Batch apply failed with {} operations left: {}",
                        remaining.len(),
                        err
                    );
                    return Err(ApplyError::new(err, remaining));
                }
            };
            report.requests += 1;

            if !result.has_unprocessed() {
                leftover_rounds = 0;
                continue;
            }

            let left_over = result.unprocessed.len();
            report.unprocessed_rounds += 1;
            leftover_rounds += 1;

            let remaining = rejoin(result.unprocessed, pending.drain(..));
            if leftover_rounds >= self.policy.max_attempts.max(1) {
                let err = StorageError::Transient(format!(
                    "unprocessed items remained after {} attempts",
                    leftover_rounds
                ));
                tracing::warn!("{} ({} operations left)", err, remaining.len());
                return Err(ApplyError::new(err, remaining));
            }

            let delay = self.retry.backoff_delay(&self.policy, leftover_rounds);
            tracing::warn!(
                "{} of {} operations unprocessed, resubmitting in {:?}",
                left_over,
                submitted,
                delay
            );
            tokio::time::sleep(delay).await;

            pending = chunk(remaining, self.max_items_per_request).into();
        }

        tracing::info!(
            "Applied {} operations in {} requests",
            report.operations,
            report.requests
        );
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::batch::{BatchWriteResult, WriteOperation};
    use crate::memory::MemoryBatchStore;
    use crate::retry::FixedJitter;
    use crate::traits::FnWriter;
    use serde_json::json;
    use std::sync::{Arc, Mutex};

    fn op(n: u32) -> WriteOperation {
        WriteOperation::put(json!({ "id": n }))
    }

    fn batch_of(partition: &str, ids: std::ops::Range<u32>) -> BatchWriteRequest {
        BatchWriteRequest::new().with(partition, ids.map(op).collect())
    }

    fn coordinator<W: BatchWriter>(writer: W, max_items: usize, max_attempts: u32) -> BatchWriteCoordinator<W> {
        BatchWriteCoordinator::new(writer, max_items, RetryPolicy::for_storage(max_attempts, 10))
            .with_retry(RetryCoordinator::with_jitter(FixedJitter(0.0)))
    }

    #[tokio::test]
    async fn test_applies_in_bounded_requests() {
        let store = Arc::new(MemoryBatchStore::new(3));
        let batch = batch_of("table1", 0..2).with("table2", (2..9).map(op).collect());

        let report = coordinator(Arc::clone(&store), 3, 3).apply(batch).await.unwrap();

        assert_eq!(report.operations, 9);
        assert_eq!(report.requests, 3);
        assert_eq!(report.unprocessed_rounds, 0);
        assert_eq!(store.applied(), 9);
        assert_eq!(store.items("table2").unwrap().len(), 7);
    }

    #[tokio::test]
    async fn test_resubmits_unprocessed_until_drained() {
        let store = Arc::new(MemoryBatchStore::new(4).with_unprocessed_rate(0.5));
        let batch = batch_of("edges", 0..10);

        let report = coordinator(Arc::clone(&store), 4, 8).apply(batch).await.unwrap();

        assert_eq!(store.applied(), 10);
        assert!(report.unprocessed_rounds > 0);
        assert_eq!(store.items("edges").unwrap(), (0..10).map(|n| json!({ "id": n })).collect::<Vec<_>>());
    }

    #[tokio::test]
    async fn test_preserves_partition_order_across_requests() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let calls = Arc::new(Mutex::new(0usize));
        let writer = {
            let seen = Arc::clone(&seen);
            let calls = Arc::clone(&calls);
            FnWriter::new(move |request: BatchWriteRequest| {
                let seen = Arc::clone(&seen);
                let calls = Arc::clone(&calls);
                async move {
                    let mut call = calls.lock().unwrap();
                    *call += 1;
                    // first call: leave the last operation unprocessed
                    let mut unprocessed = BatchWriteRequest::new();
                    let total = request.len();
                    for (index, (partition, operation)) in request.into_operations().enumerate() {
                        if *call == 1 && index + 1 == total {
                            unprocessed.push(partition, operation);
                        } else {
                            seen.lock().unwrap().push(operation);
                        }
                    }
                    Ok::<_, StorageError>(BatchWriteResult::with_unprocessed(unprocessed))
                }
            })
        };

        let batch = batch_of("edges", 0..5);
        coordinator(writer, 2, 3).apply(batch).await.unwrap();

        assert_eq!(*seen.lock().unwrap(), (0..5).map(op).collect::<Vec<_>>());
    }

    #[tokio::test]
    async fn test_retries_transient_failures() {
        let store = Arc::new(MemoryBatchStore::new(5));
        store.fail_next(StorageError::Transient("throttled".to_string())).unwrap();
        store.fail_next(StorageError::Transient("throttled".to_string())).unwrap();

        let report = coordinator(Arc::clone(&store), 5, 3).apply(batch_of("a", 0..5)).await.unwrap();

        assert_eq!(report.requests, 1);
        assert_eq!(store.calls(), 3);
        assert_eq!(store.applied(), 5);
    }

    #[tokio::test]
    async fn test_exhausted_retries_surface_remaining_operations() {
        let store = Arc::new(MemoryBatchStore::new(2));
        store.fail_next(StorageError::Transient("down".to_string())).unwrap();
        store.fail_next(StorageError::Transient("down".to_string())).unwrap();

        let err = coordinator(Arc::clone(&store), 2, 2)
            .apply(batch_of("a", 0..6))
            .await
            .unwrap_err();

        assert_eq!(err.source, StorageError::Transient("down".to_string()));
        assert_eq!(err.remaining, batch_of("a", 0..6));
        assert_eq!(store.calls(), 2);
        assert_eq!(store.applied(), 0);
    }

    #[tokio::test]
    async fn test_error_keeps_unsent_requests() {
        let calls = Arc::new(Mutex::new(0usize));
        let writer = {
            let calls = Arc::clone(&calls);
            FnWriter::new(move |_request: BatchWriteRequest| {
                let calls = Arc::clone(&calls);
                async move {
                    let mut call = calls.lock().unwrap();
                    *call += 1;
                    if *call == 1 {
                        Ok(BatchWriteResult::complete())
                    } else {
                        Err(StorageError::NonRetryable("access denied".to_string()))
                    }
                }
            })
        };

        let err = coordinator(writer, 2, 5).apply(batch_of("a", 0..6)).await.unwrap_err();

        assert_eq!(err.source, StorageError::NonRetryable("access denied".to_string()));
        assert_eq!(err.remaining, batch_of("a", 2..6));
        assert_eq!(*calls.lock().unwrap(), 2);
    }

    #[tokio::test]
    async fn test_stalled_store_is_bounded_by_max_attempts() {
        let store = Arc::new(MemoryBatchStore::new(5).with_unprocessed_rate(1.0));

        let err = coordinator(Arc::clone(&store), 5, 3)
            .apply(batch_of("a", 0..4))
            .await
            .unwrap_err();

        assert!(matches!(err.source, StorageError::Transient(_)));
        assert_eq!(err.remaining, batch_of("a", 0..4));
        assert_eq!(store.calls(), 3);
        assert_eq!(store.applied(), 0);
    }

    #[tokio::test]
    async fn test_trickling_store_is_bounded_by_max_attempts() {
        let calls = Arc::new(Mutex::new(0usize));
        let writer = {
            let calls = Arc::clone(&calls);
            FnWriter::new(move |request: BatchWriteRequest| {
                let calls = Arc::clone(&calls);
                async move {
                    *calls.lock().unwrap() += 1;
                    // accept the first operation, hand back the rest
                    let mut unprocessed = BatchWriteRequest::new();
                    for (partition, operation) in request.into_operations().skip(1) {
                        unprocessed.push(partition, operation);
                    }
                    Ok::<_, StorageError>(BatchWriteResult::with_unprocessed(unprocessed))
                }
            })
        };

        let err = coordinator(writer, 5, 2).apply(batch_of("a", 0..10)).await.unwrap_err();

        assert!(matches!(err.source, StorageError::Transient(_)));
        assert_eq!(err.remaining, batch_of("a", 2..10));
        assert_eq!(*calls.lock().unwrap(), 2);
    }

    #[tokio::test]
    async fn test_drained_request_resets_leftover_count() {
        let calls = Arc::new(Mutex::new(0usize));
        let writer = {
            let calls = Arc::clone(&calls);
            FnWriter::new(move |request: BatchWriteRequest| {
                let calls = Arc::clone(&calls);
                async move {
                    let mut call = calls.lock().unwrap();
                    *call += 1;
                    // every other call hands the whole request back
                    if *call % 2 == 1 {
                        Ok::<_, StorageError>(BatchWriteResult::with_unprocessed(request))
                    } else {
                        Ok(BatchWriteResult::complete())
                    }
                }
            })
        };

        let report = coordinator(writer, 1, 2).apply(batch_of("a", 0..4)).await.unwrap();

        assert_eq!(report.requests, 8);
        assert_eq!(report.unprocessed_rounds, 4);
        assert_eq!(*calls.lock().unwrap(), 8);
    }

    #[tokio::test]
    async fn test_zero_limit_is_invalid_argument() {
        let store = MemoryBatchStore::new(5);
        let batch = batch_of("a", 0..2);

        let err = coordinator(store, 0, 3).apply(batch.clone()).await.unwrap_err();

        assert!(matches!(err.source, StorageError::InvalidArgument(_)));
        assert_eq!(err.remaining, batch);
    }

    #[tokio::test]
    async fn test_empty_batch_makes_no_requests() {
        let store = Arc::new(MemoryBatchStore::new(5));
        let report = coordinator(Arc::clone(&store), 5, 3)
            .apply(BatchWriteRequest::new())
            .await
            .unwrap();

        assert_eq!(report, ApplyReport::default());
        assert_eq!(store.calls(), 0);
    }
}

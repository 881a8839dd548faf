//! Splitting batches into request-sized chunks

use crate::batch::BatchWriteRequest;
use crate::error::{StorageError, StorageResult};

/// Reject a per-request limit that could never make progress
pub fn validate_max_items(max_items_per_request: usize) -> StorageResult<()> {
    if max_items_per_request == 0 {
        return Err(StorageError::InvalidArgument(
            "max items per request must be at least 1".to_string(),
        ));
    }
    Ok(())
}

/// Split a batch into sub-batches of at most `max_items_per_request`
/// operations each.
///
/// Partitions are walked in order and operations are never divided, so a
/// partition may continue in the next sub-batch. Flattening the output in
/// order gives back exactly the input operations.
pub fn split(
    batch: BatchWriteRequest,
    max_items_per_request: usize,
) -> StorageResult<Vec<BatchWriteRequest>> {
    validate_max_items(max_items_per_request)?;
    Ok(chunk(batch, max_items_per_request))
}

/// [`split`] without the limit check; callers must pass a limit of at least 1
pub(crate) fn chunk(batch: BatchWriteRequest, max_items_per_request: usize) -> Vec<BatchWriteRequest> {
    let mut batches = Vec::with_capacity(batch.len().div_ceil(max_items_per_request.max(1)));
    let mut current = BatchWriteRequest::new();
    let mut current_len = 0;

    for (partition, operation) in batch.into_operations() {
        if current_len >= max_items_per_request {
            batches.push(std::mem::take(&mut current));
            current_len = 0;
        }
        current.push(partition, operation);
        current_len += 1;
    }

    if current_len > 0 {
        batches.push(current);
    }

    batches
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::batch::{Partition, WriteOperation};
    use proptest::prelude::*;
    use serde_json::json;

    fn op(n: u32) -> WriteOperation {
        WriteOperation::put(json!({ "id": n }))
    }

    fn flatten(batches: &[BatchWriteRequest]) -> Vec<(Partition, WriteOperation)> {
        batches
            .iter()
            .flat_map(|b| b.operations().map(|(p, o)| (p.clone(), o.clone())))
            .collect()
    }

    #[test]
    fn test_split_spans_partitions() {
        let batch = BatchWriteRequest::new()
            .with("table1", vec![op(1), op(2)])
            .with("table2", vec![op(3), op(4), op(5)]);

        let batches = split(batch, 3).unwrap();

        assert_eq!(
            batches,
            vec![
                BatchWriteRequest::new()
                    .with("table1", vec![op(1), op(2)])
                    .with("table2", vec![op(3)]),
                BatchWriteRequest::new().with("table2", vec![op(4), op(5)]),
            ]
        );
    }

    #[test]
    fn test_split_small_batch_is_single_request() {
        let batch = BatchWriteRequest::new().with("table1", vec![op(1), op(2)]);
        let batches = split(batch.clone(), 25).unwrap();
        assert_eq!(batches, vec![batch]);
    }

    #[test]
    fn test_split_empty_batch() {
        assert!(split(BatchWriteRequest::new(), 3).unwrap().is_empty());
        let only_empty = BatchWriteRequest::new().with("table1", vec![]);
        assert!(split(only_empty, 3).unwrap().is_empty());
    }

    #[test]
    fn test_split_limit_of_one() {
        let batch = BatchWriteRequest::new().with("table1", vec![op(1), op(2), op(3)]);
        let batches = split(batch, 1).unwrap();
        assert_eq!(batches.len(), 3);
        assert!(batches.iter().all(|b| b.len() == 1));
    }

    #[test]
    fn test_split_keeps_input_partition_order() {
        let batch = BatchWriteRequest::from_json(
            r#"{"zeta": [{"put": {"id": 1}}], "alpha": [{"put": {"id": 2}}]}"#,
        )
        .unwrap();

        let batches = split(batch, 1).unwrap();
        let order: Vec<&str> = batches
            .iter()
            .flat_map(|b| b.partitions().map(Partition::as_str))
            .collect();
        assert_eq!(order, vec!["zeta", "alpha"]);
    }

    #[test]
    fn test_split_rejects_zero_limit() {
        let batch = BatchWriteRequest::new().with("table1", vec![op(1)]);
        assert!(matches!(split(batch, 0), Err(StorageError::InvalidArgument(_))));
    }

    fn arb_batch() -> impl Strategy<Value = BatchWriteRequest> {
        prop::collection::btree_map("[a-d]", prop::collection::vec(0u32..1000, 0..12), 0..4).prop_map(
            |map| {
                map.into_iter().fold(BatchWriteRequest::new(), |batch, (partition, ids)| {
                    batch.with(partition, ids.into_iter().map(op).collect())
                })
            },
        )
    }

    proptest! {
        #[test]
        fn prop_split_round_trips(batch in arb_batch(), limit in 1usize..8) {
            let expected: Vec<_> = batch.operations().map(|(p, o)| (p.clone(), o.clone())).collect();
            let batches = split(batch, limit).unwrap();

            prop_assert!(batches.iter().all(|b| b.len() <= limit && !b.is_empty()));
            prop_assert_eq!(flatten(&batches), expected);
        }

        #[test]
        fn prop_split_fills_all_but_last(batch in arb_batch(), limit in 1usize..8) {
            let batches = split(batch, limit).unwrap();
            if let Some((_, full)) = batches.split_last() {
                prop_assert!(full.iter().all(|b| b.len() == limit));
            }
        }
    }
}

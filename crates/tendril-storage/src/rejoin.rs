//! Requeueing unprocessed operations

use crate::batch::BatchWriteRequest;

/// Merge leftover operations with the batches still waiting to be sent.
///
/// For every partition, operations from `unprocessed` come first, then the
/// operations of each pending batch in order. Partitions that appear in no
/// input do not appear in the result.
pub fn rejoin<I>(unprocessed: BatchWriteRequest, still_pending: I) -> BatchWriteRequest
where
    I: IntoIterator<Item = BatchWriteRequest>,
{
    let mut combined = unprocessed;
    for pending in still_pending {
        for (partition, operations) in pending.into_partitions() {
            combined.extend(partition, operations);
        }
    }
    combined
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::batch::WriteOperation;
    use proptest::prelude::*;
    use serde_json::json;

    fn op(n: u32) -> WriteOperation {
        WriteOperation::put(json!({ "id": n }))
    }

    #[test]
    fn test_unprocessed_goes_first() {
        let unprocessed = BatchWriteRequest::new().with("table2", vec![op(3)]);
        let pending = vec![
            BatchWriteRequest::new().with("table2", vec![op(4), op(5)]),
            BatchWriteRequest::new().with("table1", vec![op(6)]).with("table2", vec![op(7)]),
        ];

        let combined = rejoin(unprocessed, pending);

        assert_eq!(
            combined,
            BatchWriteRequest::new()
                .with("table1", vec![op(6)])
                .with("table2", vec![op(3), op(4), op(5), op(7)])
        );
    }

    #[test]
    fn test_rejoin_without_pending() {
        let unprocessed = BatchWriteRequest::new().with("table1", vec![op(1)]);
        assert_eq!(rejoin(unprocessed.clone(), Vec::new()), unprocessed);
    }

    #[test]
    fn test_rejoin_nothing() {
        let combined = rejoin(BatchWriteRequest::new(), Vec::new());
        assert_eq!(combined.partition_count(), 0);
    }

    fn arb_batch() -> impl Strategy<Value = BatchWriteRequest> {
        prop::collection::btree_map("[a-c]", prop::collection::vec(0u32..100, 0..5), 0..3).prop_map(
            |map| {
                map.into_iter().fold(BatchWriteRequest::new(), |batch, (partition, ids)| {
                    batch.with(partition, ids.into_iter().map(op).collect())
                })
            },
        )
    }

    proptest! {
        #[test]
        fn prop_repeated_rejoin_matches_single_rejoin(
            first in arb_batch(),
            second in arb_batch(),
            pending in prop::collection::vec(arb_batch(), 0..3),
        ) {
            // second failure cycle: `first` comes back unprocessed ahead of
            // what was requeued after the earlier `second` failure
            let in_sequence = rejoin(first.clone(), vec![rejoin(second.clone(), pending.clone())]);
            let at_once = rejoin(rejoin(first, vec![second]), pending);
            prop_assert_eq!(in_sequence, at_once);
        }

        #[test]
        fn prop_rejoin_keeps_every_operation(
            unprocessed in arb_batch(),
            pending in prop::collection::vec(arb_batch(), 0..3),
        ) {
            let expected = unprocessed.len() + pending.iter().map(BatchWriteRequest::len).sum::<usize>();
            prop_assert_eq!(rejoin(unprocessed, pending).len(), expected);
        }
    }
}

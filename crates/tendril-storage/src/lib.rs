//! Tendril Storage - Batched delivery to bulk-write stores
//!
//! This crate splits write batches into request-sized chunks, retries them
//! with full-jitter exponential backoff, and requeues whatever the store
//! leaves unprocessed until the batch drains.

pub mod batch;
pub mod coordinator;
pub mod edges;
pub mod error;
pub mod memory;
pub mod partition;
pub mod rejoin;
pub mod retry;
pub mod traits;

pub use batch::{BatchWriteRequest, BatchWriteResult, Partition, WriteOperation};
pub use coordinator::{ApplyReport, BatchWriteCoordinator};
pub use edges::DeltaBatchBuilder;
pub use error::{ApplyError, StorageError, StorageResult};
pub use memory::MemoryBatchStore;
pub use partition::split;
pub use rejoin::rejoin;
pub use retry::{FixedJitter, Jitter, RetryCoordinator, RetryPolicy, ThreadRngJitter};
pub use traits::{BatchWriter, FnWriter};

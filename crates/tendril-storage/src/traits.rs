//! Bulk write trait definitions

use crate::batch::{BatchWriteRequest, BatchWriteResult};
use crate::error::StorageResult;
use async_trait::async_trait;
use std::future::Future;
use std::sync::Arc;

/// A backing store's bulk-write call.
///
/// A call may apply only part of the request; whatever was not applied
/// comes back in [`BatchWriteResult::unprocessed`]. Applying the same put
/// or delete twice must be harmless.
#[async_trait]
pub trait BatchWriter: Send + Sync {
    async fn batch_write(&self, request: &BatchWriteRequest) -> StorageResult<BatchWriteResult>;
}

#[async_trait]
impl<W: BatchWriter + ?Sized> BatchWriter for Arc<W> {
    async fn batch_write(&self, request: &BatchWriteRequest) -> StorageResult<BatchWriteResult> {
        (**self).batch_write(request).await
    }
}

/// Adapts a plain async function into a [`BatchWriter`]
pub struct FnWriter<F> {
    write: F,
}

impl<F, Fut> FnWriter<F>
where
    F: Fn(BatchWriteRequest) -> Fut + Send + Sync,
    Fut: Future<Output = StorageResult<BatchWriteResult>> + Send + 'static,
{
    pub fn new(write: F) -> Self {
        Self { write }
    }
}

#[async_trait]
impl<F, Fut> BatchWriter for FnWriter<F>
where
    F: Fn(BatchWriteRequest) -> Fut + Send + Sync,
    Fut: Future<Output = StorageResult<BatchWriteResult>> + Send + 'static,
{
    async fn batch_write(&self, request: &BatchWriteRequest) -> StorageResult<BatchWriteResult> {
        (self.write)(request.clone()).await
    }
}

//! Retry with full-jitter exponential backoff
//!
//! [`RetryCoordinator::execute`] runs an async operation until it succeeds,
//! the error is not retryable, or the policy runs out of attempts. The error
//! handed back is always the one from the last attempt.

use crate::error::StorageError;
use rand::Rng;
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

/// Predicate deciding whether an error is worth another attempt
pub type ShouldRetry<E> = Arc<dyn Fn(&E) -> bool + Send + Sync>;

/// Highest power of two applied to the starting delay
const MAX_BACKOFF_EXPONENT: u32 = 32;

/// How often and how patiently to retry.
///
/// ```text
/// let policy = RetryPolicy::new(3, 100).with_should_retry(|e: &StorageError| e.is_retryable());
/// ```
pub struct RetryPolicy<E = StorageError> {
    /// Attempts allowed in total, the first one included
    pub max_attempts: u32,
    /// Base of the exponential backoff in milliseconds
    pub starting_delay_ms: u64,
    should_retry: ShouldRetry<E>,
}

impl<E: 'static> RetryPolicy<E> {
    /// Policy that retries every error
    pub fn new(max_attempts: u32, starting_delay_ms: u64) -> Self {
        Self {
            max_attempts,
            starting_delay_ms,
            should_retry: Arc::new(|_: &E| true),
        }
    }

    pub fn with_should_retry<F>(mut self, should_retry: F) -> Self
    where
        F: Fn(&E) -> bool + Send + Sync + 'static,
    {
        self.should_retry = Arc::new(should_retry);
        self
    }
}

impl<E> RetryPolicy<E> {
    pub fn should_retry(&self, err: &E) -> bool {
        (self.should_retry)(err)
    }

    /// Upper bound of the delay after `attempts` failed attempts
    pub fn max_delay(&self, attempts: u32) -> Duration {
        self.backoff_delay(attempts, 1.0)
    }

    /// `round(starting_delay_ms * 2^attempts * sample)`, `sample` in `[0, 1)`
    pub fn backoff_delay(&self, attempts: u32, sample: f64) -> Duration {
        let scale = 2f64.powi(attempts.min(MAX_BACKOFF_EXPONENT) as i32);
        let delay_ms = (self.starting_delay_ms as f64 * scale * sample.clamp(0.0, 1.0)).round();
        Duration::from_millis(delay_ms as u64)
    }
}

impl RetryPolicy<StorageError> {
    /// Policy retrying only [`StorageError::is_retryable`] errors
    pub fn for_storage(max_attempts: u32, starting_delay_ms: u64) -> Self {
        Self::new(max_attempts, starting_delay_ms).with_should_retry(StorageError::is_retryable)
    }
}

impl Default for RetryPolicy<StorageError> {
    fn default() -> Self {
        Self::for_storage(5, 50)
    }
}

impl<E> Clone for RetryPolicy<E> {
    fn clone(&self) -> Self {
        Self {
            max_attempts: self.max_attempts,
            starting_delay_ms: self.starting_delay_ms,
            should_retry: Arc::clone(&self.should_retry),
        }
    }
}

impl<E> fmt::Debug for RetryPolicy<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RetryPolicy")
            .field("max_attempts", &self.max_attempts)
            .field("starting_delay_ms", &self.starting_delay_ms)
            .finish_non_exhaustive()
    }
}

/// Source of the random factor in a backoff delay
pub trait Jitter: Send + Sync {
    /// A value uniformly distributed in `[0, 1)`
    fn sample(&self) -> f64;
}

/// Jitter drawn from the thread-local RNG
#[derive(Debug, Clone, Copy, Default)]
pub struct ThreadRngJitter;

impl Jitter for ThreadRngJitter {
    fn sample(&self) -> f64 {
        rand::thread_rng().gen::<f64>()
    }
}

/// Constant jitter, for deterministic delays in tests
#[derive(Debug, Clone, Copy)]
pub struct FixedJitter(pub f64);

impl Jitter for FixedJitter {
    fn sample(&self) -> f64 {
        self.0
    }
}

/// Runs operations under a [`RetryPolicy`]
#[derive(Clone)]
pub struct RetryCoordinator {
    jitter: Arc<dyn Jitter>,
}

impl RetryCoordinator {
    pub fn new() -> Self {
        Self::with_jitter(ThreadRngJitter)
    }

    pub fn with_jitter(jitter: impl Jitter + 'static) -> Self {
        Self {
            jitter: Arc::new(jitter),
        }
    }

    /// Delay to wait after `attempts` failed attempts
    pub fn backoff_delay<E>(&self, policy: &RetryPolicy<E>, attempts: u32) -> Duration {
        policy.backoff_delay(attempts, self.jitter.sample())
    }

    /// Run `operation` until it succeeds or the policy gives up.
    ///
    /// A failure is final when the attempt count reaches
    /// `policy.max_attempts` or `policy.should_retry` rejects the error;
    /// that error is returned unchanged.
    pub async fn execute<T, E, F, Fut>(&self, policy: &RetryPolicy<E>, mut operation: F) -> Result<T, E>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: fmt::Display,
    {
        let mut attempts: u32 = 0;

        loop {
            let err = match operation().await {
                Ok(value) => return Ok(value),
                Err(err) => err,
            };
            attempts += 1;

            if !policy.should_retry(&err) {
                tracing::debug!("Not retrying after attempt {}: {}", attempts, err);
                return Err(err);
            }
            if attempts >= policy.max_attempts {
                tracing::warn!("Giving up after {} attempts: {}", attempts, err);
                return Err(err);
            }

            let delay = self.backoff_delay(policy, attempts);
            tracing::warn!(
                attempt = attempts,
                max_attempts = policy.max_attempts,
                delay_ms = delay.as_millis() as u64,
                "Attempt failed, retrying: {}",
                err
            );
            tokio::time::sleep(delay).await;
        }
    }
}

impl Default for RetryCoordinator {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for RetryCoordinator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RetryCoordinator").finish_non_exhaustive()
    }
}

use std::future::Future;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use backoff::ExponentialBackoffBuilder;
use tracing::{debug, warn};

use crate::domain::models::ProvidersConfig;
use crate::domain::ports::ProviderError;

/// Retry policy for provider calls.
///
/// Retries only transient failures (429, 5xx, transport) with exponential
/// backoff, up to `max_retries` extra attempts. Permanent failures return
/// immediately.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    max_retries: u32,
    initial_backoff: Duration,
    max_backoff: Duration,
}

impl RetryPolicy {
    /// Policy with `max_retries` extra attempts and backoff bounds in milliseconds.
    pub fn new(max_retries: u32, initial_backoff_ms: u64, max_backoff_ms: u64) -> Self {
        Self {
            max_retries,
            initial_backoff: Duration::from_millis(initial_backoff_ms),
            max_backoff: Duration::from_millis(max_backoff_ms.max(initial_backoff_ms)),
        }
    }

    /// Policy from the `providers` config section.
    pub fn from_config(config: &ProvidersConfig) -> Self {
        Self::new(
            config.max_retries,
            config.initial_backoff_ms,
            config.max_backoff_ms,
        )
    }

    pub fn max_retries(&self) -> u32 {
        self.max_retries
    }

    /// Run `operation` until it succeeds, fails permanently or runs out of retries.
    pub async fn execute<F, Fut, T>(&self, mut operation: F) -> Result<T, ProviderError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, ProviderError>>,
    {
        let attempts = AtomicU32::new(0);
        let max_retries = self.max_retries;
        let policy = ExponentialBackoffBuilder::new()
            .with_initial_interval(self.initial_backoff)
            .with_max_interval(self.max_backoff)
            .with_max_elapsed_time(None)
            .build();

        let result = backoff::future::retry_notify(
            policy,
            || {
                let attempt = attempts.fetch_add(1, Ordering::SeqCst);
                let call = operation();
                async move {
                    match call.await {
                        Ok(value) => Ok(value),
                        Err(err) if err.is_transient() && attempt < max_retries => {
                            Err(backoff::Error::transient(err))
                        }
                        Err(err) => Err(backoff::Error::permanent(err)),
                    }
                }
            },
            |err: ProviderError, wait: Duration| {
                warn!(error = %err, retry_in = ?wait, "transient provider error; retrying");
            },
        )
        .await;

        let used = attempts.load(Ordering::SeqCst);
        if used > 1 {
            debug!(attempts = used, succeeded = result.is_ok(), "provider call retried");
        }
        result
    }
}

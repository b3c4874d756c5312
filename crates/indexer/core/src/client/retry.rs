//! Bounded exponential retry with a hard per-attempt timeout.

use super::ChainClientError;
use crate::metrics::Metrics;
use backon::{ExponentialBuilder, Retryable};
use std::{future::Future, time::Duration};
use tracing::warn;

/// Retry policy for chain client requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryConfig {
    /// Retries after the first attempt.
    pub max_times: usize,
    /// Delay before the first retry.
    pub min_delay: Duration,
    /// Upper bound of the delay between retries.
    pub max_delay: Duration,
    /// Hard timeout of a single attempt.
    pub request_timeout: Duration,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_times: 8,
            min_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(30),
            request_timeout: Duration::from_secs(30),
        }
    }
}

impl RetryConfig {
    fn backoff(&self) -> ExponentialBuilder {
        ExponentialBuilder::default()
            .with_min_delay(self.min_delay)
            .with_max_delay(self.max_delay)
            .with_max_times(self.max_times)
            .with_jitter()
    }

    /// Runs `request` until it succeeds, fails with a non-transient error, or the retry budget
    /// is spent. Each attempt is cut off after `request_timeout`.
    pub async fn run<T, F, Fut>(
        &self,
        operation: &'static str,
        mut request: F,
    ) -> Result<T, ChainClientError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, ChainClientError>>,
    {
        let timeout = self.request_timeout;
        let attempt = move || {
            let call = request();
            async move {
                match tokio::time::timeout(timeout, call).await {
                    Ok(result) => result,
                    Err(_) => Err(ChainClientError::Timeout(timeout)),
                }
            }
        };

        attempt
            .retry(self.backoff())
            .when(ChainClientError::is_transient)
            .notify(|err, delay| {
                Metrics::record_chain_client_retry(operation);
                warn!(
                    target: "chain_client",
                    operation,
                    %err,
                    ?delay,
                    "Chain client request failed, retrying"
                );
            })
            .await
    }
}

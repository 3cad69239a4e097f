use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tokio::time::sleep;
use tracing::{debug, info, warn};
use xbird_core::{ClientConfig, ErrorExt, GenerationFailure};

/// Configuration for retry behavior
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Total attempts, the first one included
    pub max_attempts: u32,
    /// Delay unit; the wait after attempt `n` is `n * base_delay_ms`
    pub base_delay_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay_ms: 1000,
        }
    }
}

impl From<&ClientConfig> for RetryConfig {
    fn from(config: &ClientConfig) -> Self {
        Self {
            max_attempts: config.max_attempts,
            base_delay_ms: config.retry_base_ms,
        }
    }
}

/// Retry strategy based on failure kind
#[derive(Debug, Clone, PartialEq)]
pub enum RetryStrategy {
    /// Retry on the linear backoff schedule
    Retry,
    /// Don't retry (credential faults, timeouts, response-shape faults)
    NoRetry,
}

pub fn get_retry_strategy(failure: &GenerationFailure) -> RetryStrategy {
    if failure.is_retryable() {
        RetryStrategy::Retry
    } else {
        RetryStrategy::NoRetry
    }
}

/// Linear backoff: `attempt * base`, where `attempt` is the 1-based attempt that just failed.
pub fn calculate_delay(attempt: u32, config: &RetryConfig) -> Duration {
    Duration::from_millis(config.base_delay_ms.saturating_mul(attempt as u64))
}

#[derive(Debug, Clone, Default)]
pub struct RetryMetrics {
    pub total_attempts: u64,
    pub total_retries: u64,
    pub successful_retries: u64,
    pub failed_operations: u64,
    /// Every backoff slept, in order
    pub delays: Vec<Duration>,
}

/// Runs an attempt closure in a bounded loop with linear backoff.
#[derive(Debug)]
pub struct RetryExecutor {
    config: RetryConfig,
    metrics: Arc<Mutex<RetryMetrics>>,
}

impl RetryExecutor {
    pub fn new(config: RetryConfig) -> Self {
        Self {
            config,
            metrics: Arc::new(Mutex::new(RetryMetrics::default())),
        }
    }

    pub async fn execute<F, Fut, T>(
        &self,
        operation_name: &str,
        mut operation: F,
    ) -> Result<T, GenerationFailure>
    where
        F: FnMut(u32) -> Fut,
        Fut: std::future::Future<Output = Result<T, GenerationFailure>>,
    {
        let max_attempts = self.config.max_attempts.max(1);
        let mut attempt = 1;

        loop {
            let start_time = Instant::now();
            self.record(|m| m.total_attempts += 1);

            let failure = match operation(attempt).await {
                Ok(result) => {
                    if attempt > 1 {
                        self.record(|m| m.successful_retries += 1);
                        info!(
                            "Operation {} succeeded after {} retries",
                            operation_name,
                            attempt - 1
                        );
                    }
                    return Ok(result);
                }
                Err(failure) => failure,
            };

            debug!(
                "Attempt {} failed for {} after {:?}: {}",
                attempt,
                operation_name,
                start_time.elapsed(),
                failure
            );

            let strategy = get_retry_strategy(&failure);
            if strategy == RetryStrategy::NoRetry || attempt >= max_attempts {
                if strategy == RetryStrategy::Retry {
                    warn!(
                        "Operation {} failed after {} attempts: {}",
                        operation_name, attempt, failure
                    );
                }
                self.record(|m| m.failed_operations += 1);
                return Err(failure);
            }

            let delay = calculate_delay(attempt, &self.config);
            info!(
                "Retrying {} in {:?} due to: {}",
                operation_name, delay, failure
            );
            self.record(|m| {
                m.total_retries += 1;
                m.delays.push(delay);
            });
            sleep(delay).await;
            attempt += 1;
        }
    }

    fn record(&self, update: impl FnOnce(&mut RetryMetrics)) {
        if let Ok(mut metrics) = self.metrics.lock() {
            update(&mut metrics);
        }
    }

    pub fn get_metrics(&self) -> RetryMetrics {
        self.metrics
            .lock()
            .map(|m| m.clone())
            .unwrap_or_default()
    }

    pub fn reset_metrics(&self) {
        self.record(|m| *m = RetryMetrics::default());
    }
}

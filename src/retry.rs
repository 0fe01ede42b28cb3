//! Retry logic for remote publish calls
//!
//! This module wraps an async send operation in the bounded retry loop the
//! publisher uses. Two kinds of failure are distinguished:
//!
//! - A flow-control signal from the platform ("too many requests" with a
//!   `retry_after` duration) pauses the loop for exactly the signaled time and
//!   repeats the *same* attempt. It never consumes an attempt slot.
//! - Every other failure consumes one attempt slot and backs off
//!   exponentially before the next try.
//!
//! Exhausting all attempt slots returns the last error to the caller.
//!
//! # Example
//!
//! ```no_run
//! use subject_relay::retry::send_with_retry;
//! use subject_relay::config::RetryConfig;
//! use subject_relay::error::Error;
//!
//! # async fn example() -> Result<(), Error> {
//! let config = RetryConfig::default();
//! let message_id = send_with_retry(&config, || async {
//!     // Your send operation here
//!     Ok::<_, Error>(42)
//! })
//! .await?;
//! # Ok(())
//! # }
//! ```

use crate::config::RetryConfig;
use crate::error::{Error, Result};
use rand::Rng;
use std::future::Future;
use std::time::Duration;

/// Backoff delay before the retry that follows failure number `failed_attempts`
/// (zero-based).
///
/// Grows exponentially from `initial_delay` by `backoff_multiplier` and is
/// capped at `max_delay`. With the default policy (1s base, 2.0 multiplier)
/// the sequence is 1s, 2s, 4s, ...
pub fn backoff_delay(config: &RetryConfig, failed_attempts: u32) -> Duration {
    let factor = config.backoff_multiplier.powi(failed_attempts as i32);
    let raw = Duration::from_secs_f64(config.initial_delay.as_secs_f64() * factor);
    let capped = raw.min(config.max_delay);
    if config.jitter { add_jitter(capped) } else { capped }
}

/// Execute an async send operation with flow-control-aware retry logic
///
/// # Arguments
///
/// * `config` - Retry configuration (attempt budget, delays, backoff multiplier, jitter)
/// * `operation` - Async closure performing one send attempt
///
/// # Returns
///
/// Returns the successful result, or the last error once `max_attempts`
/// attempts have failed. Flow-control pauses do not count against the budget.
pub async fn send_with_retry<F, Fut, T>(config: &RetryConfig, mut operation: F) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let mut failed_attempts: u32 = 0;

    loop {
        match operation().await {
            Ok(value) => {
                if failed_attempts > 0 {
                    tracing::info!(
                        attempts = failed_attempts + 1,
                        "send succeeded after retry"
                    );
                }
                return Ok(value);
            }
            Err(e) => {
                // Flow control pauses the same attempt rather than failing it
                if let Error::Telegram(api) = &e {
                    if let Some(wait) = api.flood_wait() {
                        tracing::warn!(
                            wait_secs = wait.as_secs(),
                            "platform requested a pause, repeating the attempt"
                        );
                        tokio::time::sleep(wait).await;
                        continue;
                    }
                }

                failed_attempts += 1;
                if failed_attempts >= config.max_attempts {
                    tracing::error!(
                        error = %e,
                        attempts = failed_attempts,
                        "send failed after all retry attempts exhausted"
                    );
                    return Err(e);
                }

                let delay = backoff_delay(config, failed_attempts - 1);
                tracing::warn!(
                    error = %e,
                    attempt = failed_attempts,
                    max_attempts = config.max_attempts,
                    delay_ms = delay.as_millis(),
                    "send failed, retrying"
                );
                tokio::time::sleep(delay).await;
            }
        }
    }
}

/// Add random jitter to a delay to prevent thundering herd
///
/// Jitter is uniformly distributed between 0% and 100% of the delay.
/// This means the actual delay will be between `delay` and `2 * delay`.
fn add_jitter(delay: Duration) -> Duration {
    let mut rng = rand::thread_rng();
    let jitter_factor: f64 = rng.gen_range(0.0..=1.0);
    let jittered_secs = delay.as_secs_f64() * (1.0 + jitter_factor);
    Duration::from_secs_f64(jittered_secs)
}

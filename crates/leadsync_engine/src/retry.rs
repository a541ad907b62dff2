//! Retry with exponential backoff.
//!
//! Every remote call in both adapters goes through [`call_with_retry`] with
//! an explicit [`RetryPolicy`]; there is no ambient retry state.

use crate::error::{SyncError, SyncResult};
use std::time::Duration;
use tracing::debug;

/// Configuration for retry behavior.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Maximum number of attempts (not retries; 1 means no retry).
    pub max_attempts: u32,
    /// Delay before the first retry.
    pub initial_delay: Duration,
    /// Cap on the delay between attempts.
    pub max_delay: Duration,
    /// Multiplier for exponential backoff.
    pub backoff_multiplier: f64,
    /// Whether to add jitter to delays.
    pub add_jitter: bool,
}

impl RetryPolicy {
    /// Creates a policy with the standard backoff curve.
    pub fn new(max_attempts: u32) -> Self {
        Self {
            max_attempts,
            initial_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(8),
            backoff_multiplier: 2.0,
            add_jitter: false,
        }
    }

    /// Creates a policy that never retries.
    pub fn no_retry() -> Self {
        Self {
            max_attempts: 1,
            initial_delay: Duration::ZERO,
            max_delay: Duration::ZERO,
            backoff_multiplier: 1.0,
            add_jitter: false,
        }
    }

    /// Sets the initial delay.
    pub fn with_initial_delay(mut self, delay: Duration) -> Self {
        self.initial_delay = delay;
        self
    }

    /// Sets the maximum delay.
    pub fn with_max_delay(mut self, delay: Duration) -> Self {
        self.max_delay = delay;
        self
    }

    /// Sets the backoff multiplier.
    pub fn with_backoff_multiplier(mut self, multiplier: f64) -> Self {
        self.backoff_multiplier = multiplier;
        self
    }

    /// Enables jitter of up to 25% of each delay.
    pub fn with_jitter(mut self) -> Self {
        self.add_jitter = true;
        self
    }

    /// Calculates the delay for a given attempt (0-indexed).
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        if attempt == 0 {
            return Duration::ZERO;
        }

        let base_delay = self.initial_delay.as_secs_f64()
            * self.backoff_multiplier.powi(attempt.saturating_sub(1) as i32);

        let delay_secs = base_delay.min(self.max_delay.as_secs_f64());

        if self.add_jitter {
            let jitter = delay_secs * 0.25 * rand_jitter();
            Duration::from_secs_f64(delay_secs + jitter)
        } else {
            Duration::from_secs_f64(delay_secs)
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(3)
    }
}

/// Simple deterministic "jitter" (no external RNG dependency).
fn rand_jitter() -> f64 {
    use std::time::SystemTime;
    let nanos = SystemTime::now()
        .duration_since(SystemTime::UNIX_EPOCH)
        .unwrap_or_default()
        .subsec_nanos();
    (nanos % 1000) as f64 / 1000.0
}

/// Runs a remote call under a retry policy.
///
/// The closure returns the per-attempt failure as a string cause. Any
/// failed attempt is retried after backoff; when the budget is exhausted
/// the last cause is surfaced as [`SyncError::Upstream`].
pub fn call_with_retry<T, F>(policy: &RetryPolicy, operation: &str, mut call: F) -> SyncResult<T>
where
    F: FnMut() -> Result<T, String>,
{
    let mut last_cause = String::from("no attempts made");

    for attempt in 0..policy.max_attempts {
        if attempt > 0 {
            std::thread::sleep(policy.delay_for_attempt(attempt));
        }

        match call() {
            Ok(value) => return Ok(value),
            Err(cause) => {
                debug!(operation, attempt, %cause, "attempt failed");
                last_cause = cause;
            }
        }
    }

    Err(SyncError::upstream(
        operation,
        policy.max_attempts,
        last_cause,
    ))
}

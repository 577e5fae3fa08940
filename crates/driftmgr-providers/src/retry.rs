//! Retry/backoff policy shared by every invocation through the registry, per
//! spec.md §4.1: exponential, deterministic (no jitter), capped at a maximum
//! delay, and retried only for `ErrorKind::is_retryable` failures.

use std::time::Duration;

use driftmgr_core::error::{DriftError, ErrorKind};

#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub initial_delay: Duration,
    pub max_delay: Duration,
    pub factor: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            initial_delay: Duration::from_millis(250),
            max_delay: Duration::from_secs(30),
            factor: 2.0,
        }
    }
}

impl RetryPolicy {
    pub fn next_delay(&self, current: Duration) -> Duration {
        let scaled = current.as_secs_f64() * self.factor;
        Duration::from_secs_f64(scaled.min(self.max_delay.as_secs_f64()))
    }

    pub fn should_retry(&self, attempt: u32, err: &DriftError) -> bool {
        attempt < self.max_attempts && err.kind.is_retryable()
    }
}

pub(crate) fn is_cancelled(err: &DriftError) -> bool {
    err.kind == ErrorKind::Cancelled
}

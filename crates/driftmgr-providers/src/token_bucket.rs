//! Hand-rolled token bucket, per spec.md §4.1's `invoke` algorithm. We don't
//! reach for the `governor` crate here because the spec calls for an
//! explicit "wait proportionally, then record a `rate_limit_hit` metric"
//! step that must itself be cancellable — `governor`'s check-and-reject API
//! doesn't expose a cancellable wait point. Grounded in the
//! atomics-plus-mutex shape `aion-core::metrics::EnterpriseMetrics` uses for
//! its own mutable counters.

use std::time::{Duration, Instant};
use tokio::sync::Mutex;

#[derive(Debug, Clone, Copy)]
pub struct RateLimitParams {
    pub capacity: f64,
    pub refill_per_second: f64,
}

struct BucketState {
    tokens: f64,
    last_refill: Instant,
}

pub struct TokenBucket {
    params: RateLimitParams,
    state: Mutex<BucketState>,
}

impl TokenBucket {
    pub fn new(params: RateLimitParams) -> Self {
        Self {
            params,
            state: Mutex::new(BucketState { tokens: params.capacity, last_refill: Instant::now() }),
        }
    }

    /// Refills based on elapsed wall-clock time, then either takes a token
    /// immediately or reports how long the caller must wait before one will
    /// be available. Never sleeps itself, so the caller can race the wait
    /// against cancellation.
    pub async fn try_acquire(&self) -> AcquireOutcome {
        let mut state = self.state.lock().await;
        let now = Instant::now();
        let elapsed = now.duration_since(state.last_refill).as_secs_f64();
        state.tokens = (state.tokens + elapsed * self.params.refill_per_second).min(self.params.capacity);
        state.last_refill = now;

        if state.tokens >= 1.0 {
            state.tokens -= 1.0;
            AcquireOutcome::Acquired
        } else {
            let deficit = 1.0 - state.tokens;
            let wait = Duration::from_secs_f64(deficit / self.params.refill_per_second);
            AcquireOutcome::Wait(wait)
        }
    }
}

#[derive(Debug, PartialEq)]
pub enum AcquireOutcome {
    Acquired,
    Wait(Duration),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn allows_burst_up_to_capacity_then_requires_wait() {
        let bucket = TokenBucket::new(RateLimitParams { capacity: 2.0, refill_per_second: 1.0 });
        assert_eq!(bucket.try_acquire().await, AcquireOutcome::Acquired);
        assert_eq!(bucket.try_acquire().await, AcquireOutcome::Acquired);
        match bucket.try_acquire().await {
            AcquireOutcome::Wait(d) => assert!(d > Duration::ZERO),
            AcquireOutcome::Acquired => panic!("expected bucket to be exhausted"),
        }
    }

    #[tokio::test]
    async fn refills_proportionally_to_elapsed_time() {
        let bucket = TokenBucket::new(RateLimitParams { capacity: 1.0, refill_per_second: 100.0 });
        assert_eq!(bucket.try_acquire().await, AcquireOutcome::Acquired);
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert_eq!(bucket.try_acquire().await, AcquireOutcome::Acquired);
    }
}

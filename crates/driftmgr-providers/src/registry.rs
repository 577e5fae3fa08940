//! The provider registry and rate-limited invoker (C2), per spec.md §4.1.
//! The registry holds one `Arc<dyn CloudSdk>` per `CloudProviderKind` plus
//! its token bucket and metrics; `invoke` is the single chokepoint every
//! caller in the workspace routes cloud calls through.

use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

use dashmap::DashMap;
use driftmgr_core::error::{DriftError, ErrorKind};
use driftmgr_core::model::CloudProviderKind;
use driftmgr_core::sdk::{CloudSdk, SdkMetrics};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::retry::RetryPolicy;
use crate::token_bucket::{AcquireOutcome, RateLimitParams, TokenBucket};

#[derive(Debug, Clone, Default)]
pub struct ProviderMetrics {
    pub total_calls: u64,
    pub average_latency_ms: f64,
    pub rate_limit_hits: u64,
    pub retries: u64,
}

impl ProviderMetrics {
    /// Exponential moving average, matching `aion-core::metrics`'s rolling
    /// latency tracker.
    fn record_call(&mut self, latency: Duration) {
        const ALPHA: f64 = 0.2;
        let sample_ms = latency.as_secs_f64() * 1000.0;
        self.average_latency_ms = if self.total_calls == 0 {
            sample_ms
        } else {
            ALPHA * sample_ms + (1.0 - ALPHA) * self.average_latency_ms
        };
        self.total_calls += 1;
    }
}

struct ProviderEntry {
    sdk: Arc<dyn CloudSdk>,
    bucket: TokenBucket,
}

/// Holds every registered provider adapter plus the shared rate-limit and
/// retry configuration used to invoke them.
pub struct ProviderRegistry {
    providers: DashMap<CloudProviderKind, ProviderEntry>,
    metrics: DashMap<CloudProviderKind, ProviderMetrics>,
    retry_policy: RetryPolicy,
}

impl ProviderRegistry {
    pub fn new(retry_policy: RetryPolicy) -> Self {
        Self { providers: DashMap::new(), metrics: DashMap::new(), retry_policy }
    }

    pub fn register(&self, provider: CloudProviderKind, sdk: Arc<dyn CloudSdk>, rate_limit: RateLimitParams) {
        self.providers.insert(provider, ProviderEntry { sdk, bucket: TokenBucket::new(rate_limit) });
        self.metrics.insert(provider, ProviderMetrics::default());
    }

    pub fn sdk(&self, provider: CloudProviderKind) -> Option<Arc<dyn CloudSdk>> {
        self.providers.get(&provider).map(|e| e.sdk.clone())
    }

    pub fn metrics(&self, provider: CloudProviderKind) -> ProviderMetrics {
        self.metrics.get(&provider).map(|m| m.clone()).unwrap_or_default()
    }

    pub fn sdk_metrics(&self, provider: CloudProviderKind) -> Option<SdkMetrics> {
        self.providers.get(&provider).map(|e| e.sdk.metrics())
    }

    /// The single chokepoint every cloud call routes through: acquires a
    /// rate-limit token (waiting, cancellably, if none is available), runs
    /// `op`, and retries retryable failures with deterministic exponential
    /// backoff up to the configured attempt ceiling.
    pub async fn invoke<F, Fut, T>(
        &self,
        provider: CloudProviderKind,
        operation: &str,
        cancel: &CancellationToken,
        mut op: F,
    ) -> Result<T, DriftError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, DriftError>>,
    {
        let mut delay = self.retry_policy.initial_delay;
        let mut attempt: u32 = 0;

        loop {
            attempt += 1;

            if let Some(entry) = self.providers.get(&provider) {
                match entry.bucket.try_acquire().await {
                    AcquireOutcome::Acquired => {}
                    AcquireOutcome::Wait(wait) => {
                        self.bump_rate_limit_hit(provider);
                        debug!(%provider, wait_ms = wait.as_millis() as u64, "rate limit wait");
                        if self.wait_or_cancelled(wait, cancel).await.is_err() {
                            return Err(DriftError::cancelled(operation));
                        }
                    }
                }
            } else {
                return Err(DriftError::new(
                    ErrorKind::NotFound,
                    operation,
                    format!("no adapter registered for provider {provider}"),
                ));
            }

            let started = Instant::now();
            let result = op().await;
            self.record_latency(provider, started.elapsed());

            match result {
                Ok(value) => return Ok(value),
                Err(err) if err.kind == ErrorKind::Cancelled => return Err(err),
                Err(err) if self.retry_policy.should_retry(attempt, &err) => {
                    self.bump_retry(provider);
                    warn!(%provider, attempt, kind = ?err.kind, "retrying after transient failure");
                    if self.wait_or_cancelled(delay, cancel).await.is_err() {
                        return Err(DriftError::cancelled(operation));
                    }
                    delay = self.retry_policy.next_delay(delay);
                }
                Err(err) => return Err(err),
            }
        }
    }

    async fn wait_or_cancelled(&self, wait: Duration, cancel: &CancellationToken) -> Result<(), ()> {
        tokio::select! {
            _ = tokio::time::sleep(wait) => Ok(()),
            _ = cancel.cancelled() => Err(()),
        }
    }

    fn record_latency(&self, provider: CloudProviderKind, elapsed: Duration) {
        if let Some(mut m) = self.metrics.get_mut(&provider) {
            m.record_call(elapsed);
        }
    }

    fn bump_rate_limit_hit(&self, provider: CloudProviderKind) {
        if let Some(mut m) = self.metrics.get_mut(&provider) {
            m.rate_limit_hits += 1;
        }
    }

    fn bump_retry(&self, provider: CloudProviderKind) {
        if let Some(mut m) = self.metrics.get_mut(&provider) {
            m.retries += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use driftmgr_core::boundary::CloudCredentials;
    use driftmgr_core::model::Resource;
    use driftmgr_core::sdk::{ListResourcesParams};
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicU32, Ordering};

    struct FlakySdk {
        failures_remaining: AtomicU32,
    }

    #[async_trait]
    impl CloudSdk for FlakySdk {
        async fn initialize(&self, _credentials: &CloudCredentials) -> Result<(), DriftError> {
            Ok(())
        }

        async fn list_resources(
            &self,
            _resource_type: &str,
            _params: &ListResourcesParams,
        ) -> Result<Vec<Resource>, DriftError> {
            Ok(vec![])
        }

        async fn get_resource(&self, _id: &str) -> Result<Resource, DriftError> {
            if self.failures_remaining.fetch_sub(1, Ordering::SeqCst) > 0 {
                Err(DriftError::new(ErrorKind::Transient, "get_resource", "temporary blip"))
            } else {
                Err(DriftError::new(ErrorKind::NotFound, "get_resource", "gone"))
            }
        }

        async fn tag_resource(&self, _id: &str, _tags: &HashMap<String, String>) -> Result<(), DriftError> {
            Ok(())
        }

        fn metrics(&self) -> SdkMetrics {
            SdkMetrics::default()
        }

        fn supported_resource_types(&self) -> &'static [&'static str] {
            &["compute-instance"]
        }
    }

    #[tokio::test]
    async fn retries_transient_failures_then_surfaces_terminal_error() {
        let registry = ProviderRegistry::new(RetryPolicy {
            max_attempts: 5,
            initial_delay: Duration::from_millis(1),
            max_delay: Duration::from_millis(5),
            factor: 2.0,
        });
        registry.register(
            CloudProviderKind::Aws,
            Arc::new(FlakySdk { failures_remaining: AtomicU32::new(2) }),
            RateLimitParams { capacity: 100.0, refill_per_second: 1000.0 },
        );

        let cancel = CancellationToken::new();
        let sdk = registry.sdk(CloudProviderKind::Aws).unwrap();
        let result = registry
            .invoke(CloudProviderKind::Aws, "get_resource", &cancel, || {
                let sdk = sdk.clone();
                async move { sdk.get_resource("i-1").await }
            })
            .await;

        assert_eq!(result.unwrap_err().kind, ErrorKind::NotFound);
        assert_eq!(registry.metrics(CloudProviderKind::Aws).retries, 2);
    }

    #[tokio::test]
    async fn cancellation_short_circuits_a_pending_wait() {
        let registry = ProviderRegistry::new(RetryPolicy::default());
        registry.register(
            CloudProviderKind::Gcp,
            Arc::new(FlakySdk { failures_remaining: AtomicU32::new(0) }),
            RateLimitParams { capacity: 0.0, refill_per_second: 0.001 },
        );

        let cancel = CancellationToken::new();
        cancel.cancel();
        let sdk = registry.sdk(CloudProviderKind::Gcp).unwrap();
        let result = registry
            .invoke(CloudProviderKind::Gcp, "get_resource", &cancel, || {
                let sdk = sdk.clone();
                async move { sdk.get_resource("i-1").await }
            })
            .await;

        assert_eq!(result.unwrap_err().kind, ErrorKind::Cancelled);
    }
}

//! `DriftManager`: the facade a binary (or an embedder) talks to instead of
//! reaching into the nine component crates directly.

use std::path::Path;
use std::sync::Arc;

use driftmgr_core::boundary::StateStore;
use driftmgr_core::config::{DriftManagerConfig, ExtrasPolicy as CoreExtrasPolicy};
use driftmgr_core::error::DriftError;
use driftmgr_core::memstore::InMemoryStateStore;
use driftmgr_core::model::{CloudProviderKind, DriftItem, Inventory};
use driftmgr_core::sdk::CloudSdk;
use driftmgr_events::{EventBus, JobRegistry};
use driftmgr_providers::{ProviderRegistry, RateLimitParams, RetryPolicy};
use tokio_util::sync::CancellationToken;

use driftmgr_categorize::CategorizationContext;
use driftmgr_discovery::{DiscoveryOptions, DiscoveryOrchestrator, DiscoveryOutcome, ExtrasPolicy as DiscoveryExtrasPolicy};
use driftmgr_listener::CloudEventListener;
use driftmgr_remediation::{build_plan, ActionInput};
use driftmgr_state::{detect_backend, find_state_files, load, DeclaredInventory};

pub struct DriftManager {
    pub config: DriftManagerConfig,
    pub providers: Arc<ProviderRegistry>,
    pub events: Arc<EventBus>,
    pub jobs: Arc<JobRegistry>,
    pub state_store: Arc<dyn StateStore>,
    discovery: DiscoveryOrchestrator,
}

impl DriftManager {
    pub fn new(config: DriftManagerConfig) -> Self {
        let providers = Arc::new(ProviderRegistry::new(RetryPolicy::default()));
        let events = Arc::new(EventBus::new());
        let jobs = Arc::new(JobRegistry::new());
        let state_store: Arc<dyn StateStore> = Arc::new(InMemoryStateStore::new());
        let discovery = DiscoveryOrchestrator::new(providers.clone(), events.clone(), jobs.clone());

        Self { config, providers, events, jobs, state_store, discovery }
    }

    pub fn register_provider(&self, provider: CloudProviderKind, sdk: Arc<dyn CloudSdk>, rate_limit: RateLimitParams) {
        self.providers.register(provider, sdk, rate_limit);
    }

    pub fn listener(&self) -> CloudEventListener {
        CloudEventListener::new(self.events.clone())
    }

    /// Runs one full discovery cycle (C3) over the given provider/region/
    /// resource-type space, honoring the configured extras policy.
    pub async fn run_discovery(
        &self,
        providers: &[CloudProviderKind],
        regions: &[String],
        resource_types: &[String],
        cancel: CancellationToken,
    ) -> Result<(String, DiscoveryOutcome), DriftError> {
        let extras_policy = match self.config.discovery.extras_policy {
            CoreExtrasPolicy::Delete => DiscoveryExtrasPolicy::Delete,
            CoreExtrasPolicy::Import => DiscoveryExtrasPolicy::Import,
        };
        let options = DiscoveryOptions {
            extras_policy,
            environment: Some(format!("{:?}", self.config.discovery.environment).to_lowercase()),
            parallel_workers: self.config.discovery.parallel_workers,
        };
        self.discovery.discover(providers, regions, resource_types, options, cancel).await
    }

    /// Walks `root_path` for Terraform-style state files (C4) and merges
    /// every one found into a single declared inventory.
    pub fn load_declared_state(&self, root_path: &Path) -> Result<DeclaredInventory, DriftError> {
        let mut inventory = DeclaredInventory { resources: Vec::new() };
        for path in find_state_files(root_path)? {
            let dir = path.parent().unwrap_or(root_path);
            let _backend = detect_backend(dir);
            let loaded = load(&path, None)?;
            inventory.merge(loaded);
        }
        Ok(inventory)
    }

    /// Compares declared against discovered state (C5) and applies the
    /// environment's smart-filter noise reduction.
    pub fn detect_drift(&self, declared: &DeclaredInventory, discovered: &Inventory, ctx: &CategorizationContext) -> Vec<DriftItem> {
        let items = driftmgr_drift::detect(declared, discovered, ctx);
        driftmgr_drift::apply_smart_filter(items, self.config.discovery.environment)
    }

    /// Builds one remediation plan (C7) covering every supplied drift item.
    pub fn plan_remediation(&self, inputs: Vec<ActionInput>, provider: CloudProviderKind) -> driftmgr_core::model::RemediationPlan {
        build_plan(inputs, provider, self.config.discovery.extras_policy, self.config.remediation.approval_threshold)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn a_freshly_constructed_manager_has_no_registered_providers() {
        let manager = DriftManager::new(DriftManagerConfig::default());
        assert!(manager.providers.sdk(CloudProviderKind::Aws).is_none());
    }
}

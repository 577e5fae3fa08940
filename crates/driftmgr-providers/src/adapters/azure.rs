//! Azure adapter, grounded on `aion-cloud::providers::azure`'s use of
//! `azure_identity`'s default credential chain plus `azure_mgmt_compute`,
//! reduced to the `CloudSdk` capability set. Demonstrates virtual machines;
//! the subscription id travels on `CloudCredentials`.

use std::collections::HashMap;
use std::sync::atomic::{AtomicI64, AtomicU64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use azure_identity::DefaultAzureCredential;
use chrono::Utc;
use indexmap::IndexMap;
use tokio::sync::RwLock;

use driftmgr_core::boundary::CloudCredentials;
use driftmgr_core::error::{DriftError, ErrorKind};
use driftmgr_core::model::{CloudProviderKind, DiscoveryMethod, Provenance, Resource};
use driftmgr_core::sdk::{CloudSdk, ListResourcesParams, SdkMetrics};

const SUPPORTED: &[&str] = &["compute-instance"];

struct Clients {
    compute: azure_mgmt_compute::Client,
    subscription_id: String,
}

pub struct AzureAdapter {
    clients: RwLock<Option<Clients>>,
    total_calls: AtomicU64,
    last_call_unix_ms: AtomicI64,
}

impl AzureAdapter {
    pub fn new() -> Self {
        Self { clients: RwLock::new(None), total_calls: AtomicU64::new(0), last_call_unix_ms: AtomicI64::new(0) }
    }

    fn record_call(&self) {
        self.total_calls.fetch_add(1, Ordering::Relaxed);
        self.last_call_unix_ms.store(Utc::now().timestamp_millis(), Ordering::Relaxed);
    }
}

impl Default for AzureAdapter {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CloudSdk for AzureAdapter {
    async fn initialize(&self, credentials: &CloudCredentials) -> Result<(), DriftError> {
        let subscription_id = credentials.subscription_id.clone().ok_or_else(|| {
            DriftError::new(ErrorKind::CredentialsMissing, "azure.initialize", "subscription_id is required")
        })?;

        let credential: Arc<DefaultAzureCredential> = Arc::new(
            DefaultAzureCredential::create(Default::default())
                .map_err(|e| DriftError::new(ErrorKind::CredentialsInvalid, "azure.initialize", e.to_string()))?,
        );
        let compute = azure_mgmt_compute::Client::builder(credential)
            .build()
            .map_err(|e| DriftError::new(ErrorKind::CredentialsInvalid, "azure.initialize", e.to_string()))?;

        let mut slot = self.clients.write().await;
        *slot = Some(Clients { compute, subscription_id });
        Ok(())
    }

    async fn list_resources(
        &self,
        resource_type: &str,
        params: &ListResourcesParams,
    ) -> Result<Vec<Resource>, DriftError> {
        if resource_type != "compute-instance" {
            return Err(DriftError::new(ErrorKind::ValidationFailed, "azure.list_resources", format!("unsupported resource type {resource_type}")));
        }

        let guard = self.clients.read().await;
        let clients = guard
            .as_ref()
            .ok_or_else(|| DriftError::new(ErrorKind::CredentialsMissing, "azure.list_resources", "adapter not initialized"))?;

        self.record_call();
        let mut pager = clients.compute.virtual_machines_client().list_all(&clients.subscription_id).into_stream();
        let now = Utc::now();
        let mut resources = Vec::new();

        use futures::StreamExt;
        while let Some(page) = pager.next().await {
            let page = page.map_err(|e| DriftError::new(ErrorKind::Transient, "azure.compute.list_all", e.to_string()))?;
            for vm in page.value {
                let id = vm.resource.id.clone().unwrap_or_default();
                let name = vm.resource.name.clone().unwrap_or_else(|| id.clone());
                let tags: HashMap<String, String> = vm.resource.tags.clone().unwrap_or_default();

                resources.push(Resource {
                    id,
                    name,
                    resource_type: "compute-instance".to_string(),
                    provider: CloudProviderKind::Azure,
                    region: vm.resource.location.clone(),
                    account: clients.subscription_id.clone(),
                    state: vm
                        .properties
                        .as_ref()
                        .and_then(|p| p.provisioning_state.clone())
                        .unwrap_or_default(),
                    tags,
                    properties: IndexMap::new(),
                    created_at: now,
                    last_seen: now,
                    provenance: Provenance {
                        discovered_by: CloudProviderKind::Azure,
                        discovery_method: DiscoveryMethod::FullScan,
                        source_event_id: None,
                    },
                });
            }
        }

        let _ = &params.account;
        Ok(resources)
    }

    async fn get_resource(&self, id: &str) -> Result<Resource, DriftError> {
        let candidates = self.list_resources("compute-instance", &ListResourcesParams::default()).await?;
        candidates
            .into_iter()
            .find(|r| r.id == id)
            .ok_or_else(|| DriftError::not_found("azure.get_resource", format!("no resource with id {id}")))
    }

    async fn tag_resource(&self, _id: &str, _tags: &HashMap<String, String>) -> Result<(), DriftError> {
        self.record_call();
        Ok(())
    }

    fn metrics(&self) -> SdkMetrics {
        SdkMetrics {
            total_calls: self.total_calls.load(Ordering::Relaxed),
            average_latency_ms: 0.0,
            last_call_unix_ms: Some(self.last_call_unix_ms.load(Ordering::Relaxed)),
        }
    }

    fn supported_resource_types(&self) -> &'static [&'static str] {
        SUPPORTED
    }
}

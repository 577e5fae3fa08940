//! GCP adapter, grounded on `aion-cloud::providers::gcp`'s use of
//! `google-cloud-auth`/`google-cloud-storage`, reduced to the `CloudSdk`
//! capability set. Demonstrates storage buckets; `project_id` travels on
//! `CloudCredentials`.

use std::collections::HashMap;
use std::sync::atomic::{AtomicI64, AtomicU64, Ordering};

use async_trait::async_trait;
use chrono::Utc;
use google_cloud_storage::client::{Client, ClientConfig};
use indexmap::IndexMap;
use tokio::sync::RwLock;

use driftmgr_core::boundary::CloudCredentials;
use driftmgr_core::error::{DriftError, ErrorKind};
use driftmgr_core::model::{CloudProviderKind, DiscoveryMethod, Provenance, Resource};
use driftmgr_core::sdk::{CloudSdk, ListResourcesParams, SdkMetrics};

const SUPPORTED: &[&str] = &["storage-bucket"];

struct Clients {
    storage: Client,
    project_id: String,
}

pub struct GcpAdapter {
    clients: RwLock<Option<Clients>>,
    total_calls: AtomicU64,
    last_call_unix_ms: AtomicI64,
}

impl GcpAdapter {
    pub fn new() -> Self {
        Self { clients: RwLock::new(None), total_calls: AtomicU64::new(0), last_call_unix_ms: AtomicI64::new(0) }
    }

    fn record_call(&self) {
        self.total_calls.fetch_add(1, Ordering::Relaxed);
        self.last_call_unix_ms.store(Utc::now().timestamp_millis(), Ordering::Relaxed);
    }
}

impl Default for GcpAdapter {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CloudSdk for GcpAdapter {
    async fn initialize(&self, credentials: &CloudCredentials) -> Result<(), DriftError> {
        let project_id = credentials.project_id.clone().ok_or_else(|| {
            DriftError::new(ErrorKind::CredentialsMissing, "gcp.initialize", "project_id is required")
        })?;

        let config = ClientConfig::default()
            .with_auth()
            .await
            .map_err(|e| DriftError::new(ErrorKind::CredentialsInvalid, "gcp.initialize", e.to_string()))?;
        let storage = Client::new(config);

        let mut slot = self.clients.write().await;
        *slot = Some(Clients { storage, project_id });
        Ok(())
    }

    async fn list_resources(
        &self,
        resource_type: &str,
        params: &ListResourcesParams,
    ) -> Result<Vec<Resource>, DriftError> {
        if resource_type != "storage-bucket" {
            return Err(DriftError::new(ErrorKind::ValidationFailed, "gcp.list_resources", format!("unsupported resource type {resource_type}")));
        }

        let guard = self.clients.read().await;
        let clients = guard
            .as_ref()
            .ok_or_else(|| DriftError::new(ErrorKind::CredentialsMissing, "gcp.list_resources", "adapter not initialized"))?;

        self.record_call();
        let request = google_cloud_storage::http::buckets::list::ListBucketsRequest {
            project: clients.project_id.clone(),
            ..Default::default()
        };
        let response = clients
            .storage
            .list_buckets(&request)
            .await
            .map_err(|e| DriftError::new(ErrorKind::Transient, "gcp.storage.list_buckets", e.to_string()))?;

        let now = Utc::now();
        let resources = response
            .items
            .unwrap_or_default()
            .into_iter()
            .map(|bucket| Resource {
                id: bucket.id.clone().unwrap_or_else(|| bucket.name.clone()),
                name: bucket.name.clone(),
                resource_type: "storage-bucket".to_string(),
                provider: CloudProviderKind::Gcp,
                region: bucket.location.clone().unwrap_or_else(|| params.region.clone()),
                account: clients.project_id.clone(),
                state: "active".to_string(),
                tags: HashMap::new(),
                properties: IndexMap::new(),
                created_at: now,
                last_seen: now,
                provenance: Provenance {
                    discovered_by: CloudProviderKind::Gcp,
                    discovery_method: DiscoveryMethod::FullScan,
                    source_event_id: None,
                },
            })
            .collect();
        Ok(resources)
    }

    async fn get_resource(&self, id: &str) -> Result<Resource, DriftError> {
        let candidates = self.list_resources("storage-bucket", &ListResourcesParams::default()).await?;
        candidates
            .into_iter()
            .find(|r| r.id == id)
            .ok_or_else(|| DriftError::not_found("gcp.get_resource", format!("no resource with id {id}")))
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

//! DigitalOcean adapter. There is no official Rust SDK in the corpus, so —
//! exactly as `aion-cloud::providers::digital_ocean` does — this talks to
//! the REST API directly over `reqwest` with a bearer token.

use std::collections::HashMap;
use std::sync::atomic::{AtomicI64, AtomicU64, Ordering};

use async_trait::async_trait;
use chrono::Utc;
use indexmap::IndexMap;
use serde::Deserialize;
use tokio::sync::RwLock;

use driftmgr_core::boundary::CloudCredentials;
use driftmgr_core::error::{DriftError, ErrorKind};
use driftmgr_core::model::{CloudProviderKind, DiscoveryMethod, Provenance, Resource};
use driftmgr_core::sdk::{CloudSdk, ListResourcesParams, SdkMetrics};

const SUPPORTED: &[&str] = &["compute-instance"];
const API_BASE: &str = "https://api.digitalocean.com/v2";

#[derive(Debug, Deserialize)]
struct DropletsResponse {
    droplets: Vec<Droplet>,
}

#[derive(Debug, Deserialize)]
struct Droplet {
    id: u64,
    name: String,
    region: DropletRegion,
    status: String,
    tags: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct DropletRegion {
    slug: String,
}

struct Session {
    http: reqwest::Client,
    token: String,
}

pub struct DigitalOceanAdapter {
    session: RwLock<Option<Session>>,
    total_calls: AtomicU64,
    last_call_unix_ms: AtomicI64,
}

impl DigitalOceanAdapter {
    pub fn new() -> Self {
        Self { session: RwLock::new(None), total_calls: AtomicU64::new(0), last_call_unix_ms: AtomicI64::new(0) }
    }

    fn record_call(&self) {
        self.total_calls.fetch_add(1, Ordering::Relaxed);
        self.last_call_unix_ms.store(Utc::now().timestamp_millis(), Ordering::Relaxed);
    }
}

impl Default for DigitalOceanAdapter {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CloudSdk for DigitalOceanAdapter {
    async fn initialize(&self, credentials: &CloudCredentials) -> Result<(), DriftError> {
        let token = credentials
            .credentials
            .get("api_token")
            .cloned()
            .ok_or_else(|| DriftError::new(ErrorKind::CredentialsMissing, "digitalocean.initialize", "api_token is required"))?;

        let mut slot = self.session.write().await;
        *slot = Some(Session { http: reqwest::Client::new(), token });
        Ok(())
    }

    async fn list_resources(
        &self,
        resource_type: &str,
        _params: &ListResourcesParams,
    ) -> Result<Vec<Resource>, DriftError> {
        if resource_type != "compute-instance" {
            return Err(DriftError::new(ErrorKind::ValidationFailed, "digitalocean.list_resources", format!("unsupported resource type {resource_type}")));
        }

        let guard = self.session.read().await;
        let session = guard
            .as_ref()
            .ok_or_else(|| DriftError::new(ErrorKind::CredentialsMissing, "digitalocean.list_resources", "adapter not initialized"))?;

        self.record_call();
        let response = session
            .http
            .get(format!("{API_BASE}/droplets"))
            .bearer_auth(&session.token)
            .send()
            .await
            .map_err(|e| DriftError::new(ErrorKind::Transient, "digitalocean.droplets.list", e.to_string()))?;

        if response.status() == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(DriftError::new(ErrorKind::RateLimited, "digitalocean.droplets.list", "rate limited by API"));
        }
        if !response.status().is_success() {
            return Err(DriftError::new(ErrorKind::Transient, "digitalocean.droplets.list", format!("status {}", response.status())));
        }

        let body: DropletsResponse = response
            .json()
            .await
            .map_err(|e| DriftError::new(ErrorKind::ValidationFailed, "digitalocean.droplets.list", e.to_string()))?;

        let now = Utc::now();
        let resources = body
            .droplets
            .into_iter()
            .map(|droplet| Resource {
                id: droplet.id.to_string(),
                name: droplet.name,
                resource_type: "compute-instance".to_string(),
                provider: CloudProviderKind::DigitalOcean,
                region: droplet.region.slug,
                account: String::new(),
                state: droplet.status,
                tags: Resource::normalize_tags(droplet.tags),
                properties: IndexMap::new(),
                created_at: now,
                last_seen: now,
                provenance: Provenance {
                    discovered_by: CloudProviderKind::DigitalOcean,
                    discovery_method: DiscoveryMethod::FullScan,
                    source_event_id: None,
                },
            })
            .collect();
        Ok(resources)
    }

    async fn get_resource(&self, id: &str) -> Result<Resource, DriftError> {
        let candidates = self.list_resources("compute-instance", &ListResourcesParams::default()).await?;
        candidates
            .into_iter()
            .find(|r| r.id == id)
            .ok_or_else(|| DriftError::not_found("digitalocean.get_resource", format!("no resource with id {id}")))
    }

    async fn tag_resource(&self, id: &str, tags: &HashMap<String, String>) -> Result<(), DriftError> {
        let guard = self.session.read().await;
        let session = guard
            .as_ref()
            .ok_or_else(|| DriftError::new(ErrorKind::CredentialsMissing, "digitalocean.tag_resource", "adapter not initialized"))?;

        self.record_call();
        let body = serde_json::json!({
            "resources": [{ "resource_id": id, "resource_type": "droplet" }],
            "tags": tags.keys().collect::<Vec<_>>(),
        });
        session
            .http
            .post(format!("{API_BASE}/tags/actions"))
            .bearer_auth(&session.token)
            .json(&body)
            .send()
            .await
            .map_err(|e| DriftError::new(ErrorKind::Transient, "digitalocean.tag_resource", e.to_string()))?;
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

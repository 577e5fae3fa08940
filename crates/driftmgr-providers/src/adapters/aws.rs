//! AWS adapter, reduced from `aion-cloud::providers::aws`'s per-service
//! client wrappers down to the `CloudSdk` capability set. Demonstrates EC2
//! instances and S3 buckets; further resource types are a matter of adding
//! another arm to `list_resources`/`get_resource`, not a new trait.

use std::collections::HashMap;
use std::sync::atomic::{AtomicI64, AtomicU64, Ordering};

use async_trait::async_trait;
use aws_config::meta::region::RegionProviderChain;
use aws_config::BehaviorVersion;
use chrono::Utc;
use indexmap::IndexMap;
use tokio::sync::RwLock;

use driftmgr_core::boundary::CloudCredentials;
use driftmgr_core::error::{DriftError, ErrorKind};
use driftmgr_core::model::{CloudProviderKind, DiscoveryMethod, Provenance, Resource};
use driftmgr_core::sdk::{CloudSdk, ListResourcesParams, SdkMetrics};

const SUPPORTED: &[&str] = &["compute-instance", "storage-bucket"];

struct Clients {
    ec2: aws_sdk_ec2::Client,
    s3: aws_sdk_s3::Client,
}

pub struct AwsAdapter {
    clients: RwLock<Option<Clients>>,
    total_calls: AtomicU64,
    last_call_unix_ms: AtomicI64,
}

impl AwsAdapter {
    pub fn new() -> Self {
        Self { clients: RwLock::new(None), total_calls: AtomicU64::new(0), last_call_unix_ms: AtomicI64::new(0) }
    }

    fn record_call(&self) {
        self.total_calls.fetch_add(1, Ordering::Relaxed);
        self.last_call_unix_ms.store(Utc::now().timestamp_millis(), Ordering::Relaxed);
    }
}

impl Default for AwsAdapter {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CloudSdk for AwsAdapter {
    async fn initialize(&self, credentials: &CloudCredentials) -> Result<(), DriftError> {
        let region = credentials.region.clone().unwrap_or_else(|| "us-east-1".to_string());
        let region_provider = RegionProviderChain::first_try(aws_sdk_ec2::config::Region::new(region)).or_default_provider();
        let shared_config = aws_config::defaults(BehaviorVersion::latest()).region(region_provider).load().await;

        let mut slot = self.clients.write().await;
        *slot = Some(Clients {
            ec2: aws_sdk_ec2::Client::new(&shared_config),
            s3: aws_sdk_s3::Client::new(&shared_config),
        });
        Ok(())
    }

    async fn list_resources(
        &self,
        resource_type: &str,
        params: &ListResourcesParams,
    ) -> Result<Vec<Resource>, DriftError> {
        let guard = self.clients.read().await;
        let clients = guard
            .as_ref()
            .ok_or_else(|| DriftError::new(ErrorKind::CredentialsMissing, "aws.list_resources", "adapter not initialized"))?;

        self.record_call();
        match resource_type {
            "compute-instance" => {
                let output = clients
                    .ec2
                    .describe_instances()
                    .send()
                    .await
                    .map_err(|e| DriftError::new(ErrorKind::Transient, "aws.ec2.describe_instances", e.to_string()))?;

                let now = Utc::now();
                let resources = output
                    .reservations()
                    .iter()
                    .flat_map(|r| r.instances())
                    .map(|instance| {
                        let id = instance.instance_id().unwrap_or_default().to_string();
                        let name = instance
                            .tags()
                            .iter()
                            .find(|t| t.key() == Some("Name"))
                            .and_then(|t| t.value())
                            .unwrap_or(&id)
                            .to_string();
                        let tags = instance
                            .tags()
                            .iter()
                            .filter_map(|t| Some((t.key()?.to_string(), t.value().unwrap_or_default().to_string())))
                            .collect::<HashMap<_, _>>();

                        Resource {
                            id,
                            name,
                            resource_type: "compute-instance".to_string(),
                            provider: CloudProviderKind::Aws,
                            region: params.region.clone(),
                            account: params.account.clone().unwrap_or_default(),
                            state: instance
                                .state()
                                .and_then(|s| s.name())
                                .map(|n| n.as_str().to_string())
                                .unwrap_or_default(),
                            tags,
                            properties: IndexMap::new(),
                            created_at: now,
                            last_seen: now,
                            provenance: Provenance {
                                discovered_by: CloudProviderKind::Aws,
                                discovery_method: DiscoveryMethod::FullScan,
                                source_event_id: None,
                            },
                        }
                    })
                    .collect();
                Ok(resources)
            }
            "storage-bucket" => {
                let output = clients
                    .s3
                    .list_buckets()
                    .send()
                    .await
                    .map_err(|e| DriftError::new(ErrorKind::Transient, "aws.s3.list_buckets", e.to_string()))?;

                let now = Utc::now();
                let resources = output
                    .buckets()
                    .iter()
                    .map(|bucket| {
                        let name = bucket.name().unwrap_or_default().to_string();
                        Resource {
                            id: name.clone(),
                            name,
                            resource_type: "storage-bucket".to_string(),
                            provider: CloudProviderKind::Aws,
                            region: params.region.clone(),
                            account: params.account.clone().unwrap_or_default(),
                            state: "active".to_string(),
                            tags: HashMap::new(),
                            properties: IndexMap::new(),
                            created_at: now,
                            last_seen: now,
                            provenance: Provenance {
                                discovered_by: CloudProviderKind::Aws,
                                discovery_method: DiscoveryMethod::FullScan,
                                source_event_id: None,
                            },
                        }
                    })
                    .collect();
                Ok(resources)
            }
            other => Err(DriftError::new(ErrorKind::ValidationFailed, "aws.list_resources", format!("unsupported resource type {other}"))),
        }
    }

    async fn get_resource(&self, id: &str) -> Result<Resource, DriftError> {
        let params = ListResourcesParams::default();
        let candidates = self.list_resources("compute-instance", &params).await?;
        candidates
            .into_iter()
            .find(|r| r.id == id)
            .ok_or_else(|| DriftError::not_found("aws.get_resource", format!("no resource with id {id}")))
    }

    async fn tag_resource(&self, id: &str, tags: &HashMap<String, String>) -> Result<(), DriftError> {
        let guard = self.clients.read().await;
        let clients = guard
            .as_ref()
            .ok_or_else(|| DriftError::new(ErrorKind::CredentialsMissing, "aws.tag_resource", "adapter not initialized"))?;

        self.record_call();
        let aws_tags = tags
            .iter()
            .map(|(k, v)| aws_sdk_ec2::types::Tag::builder().key(k).value(v).build())
            .collect::<Vec<_>>();

        clients
            .ec2
            .create_tags()
            .resources(id)
            .set_tags(Some(aws_tags))
            .send()
            .await
            .map_err(|e| DriftError::new(ErrorKind::Transient, "aws.tag_resource", e.to_string()))?;
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

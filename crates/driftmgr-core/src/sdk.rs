//! The capability set every provider adapter implements, per spec.md §4.1
//! and the "Polymorphic provider adapters" design note in §9: the core
//! never special-cases a provider, it only calls this trait.

use async_trait::async_trait;
use std::collections::HashMap;

use crate::boundary::CloudCredentials;
use crate::error::DriftError;
use crate::model::Resource;

#[derive(Debug, Clone, Default)]
pub struct ListResourcesParams {
    pub region: String,
    pub account: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct SdkMetrics {
    pub total_calls: u64,
    pub average_latency_ms: f64,
    pub last_call_unix_ms: Option<i64>,
}

#[async_trait]
pub trait CloudSdk: Send + Sync {
    async fn initialize(&self, credentials: &CloudCredentials) -> Result<(), DriftError>;

    async fn list_resources(
        &self,
        resource_type: &str,
        params: &ListResourcesParams,
    ) -> Result<Vec<Resource>, DriftError>;

    async fn get_resource(&self, id: &str) -> Result<Resource, DriftError>;

    async fn tag_resource(&self, id: &str, tags: &HashMap<String, String>) -> Result<(), DriftError>;

    fn metrics(&self) -> SdkMetrics;

    /// The `(region, resource_type)` combinations this adapter can discover;
    /// the orchestrator filters its Cartesian product against this table
    /// instead of issuing calls it knows will be unsupported.
    fn supported_resource_types(&self) -> &'static [&'static str];
}

//! Declared-state types (C4), per spec.md §3/§4.3. These mirror `Resource`
//! closely enough for the Drift Detector to match against it, but stay a
//! distinct type: a declared resource has no `last_seen`/`provenance`, and
//! instead carries the state-file path and workspace it came from.

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use driftmgr_core::model::{CloudProviderKind, PropertyValue};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BackendKind {
    Local,
    ObjectStore,
    BlobStore,
    Gcs,
    Remote,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeclaredResource {
    pub id: String,
    pub name: String,
    pub resource_type: String,
    pub provider: CloudProviderKind,
    pub region: String,
    pub properties: IndexMap<String, PropertyValue>,
    pub workspace: String,
    pub state_file_path: String,
    pub resource_address: String,
    pub timestamp: DateTime<Utc>,
}

impl DeclaredResource {
    pub fn key(&self) -> (CloudProviderKind, &str) {
        (self.provider, self.id.as_str())
    }

    pub fn fallback_key(&self) -> (CloudProviderKind, &str, &str, &str) {
        (self.provider, self.resource_type.as_str(), self.name.as_str(), self.region.as_str())
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DeclaredInventory {
    pub resources: Vec<DeclaredResource>,
}

impl DeclaredInventory {
    pub fn merge(&mut self, other: DeclaredInventory) {
        self.resources.extend(other.resources);
    }
}

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::value::PropertyValue;

/// The sentinel region for resources that aren't regional (IAM roles,
/// Route53 zones, etc).
pub const GLOBAL_REGION: &str = "global";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CloudProviderKind {
    Aws,
    Azure,
    Gcp,
    DigitalOcean,
}

impl CloudProviderKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            CloudProviderKind::Aws => "aws",
            CloudProviderKind::Azure => "azure",
            CloudProviderKind::Gcp => "gcp",
            CloudProviderKind::DigitalOcean => "digitalocean",
        }
    }
}

impl std::fmt::Display for CloudProviderKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// How a resource entered the inventory.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Provenance {
    pub discovered_by: CloudProviderKind,
    pub discovery_method: DiscoveryMethod,
    pub source_event_id: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DiscoveryMethod {
    FullScan,
    IncrementalEvent,
}

/// The universal cloud resource representation. `(provider, id)` is
/// globally unique by construction: the Discovery Orchestrator and Cloud
/// Event Listener are the only producers and both key on that pair.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Resource {
    pub id: String,
    pub name: String,
    pub resource_type: String,
    pub provider: CloudProviderKind,
    pub region: String,
    pub account: String,
    pub state: String,
    pub tags: HashMap<String, String>,
    pub properties: IndexMap<String, PropertyValue>,
    pub created_at: DateTime<Utc>,
    pub last_seen: DateTime<Utc>,
    pub provenance: Provenance,
}

impl Resource {
    /// `(provider, id)` key used by every matching and indexing operation.
    pub fn key(&self) -> (CloudProviderKind, &str) {
        (self.provider, self.id.as_str())
    }

    /// Fallback match key used when a declared resource has no live `id`
    /// counterpart yet (spec.md §4.4's secondary match).
    pub fn fallback_key(&self) -> (CloudProviderKind, &str, &str, &str) {
        (self.provider, self.resource_type.as_str(), self.name.as_str(), self.region.as_str())
    }

    pub fn property(&self, path: &str) -> Option<&PropertyValue> {
        self.properties.get(path)
    }

    /// Lifts a bare `Vec<String>` tag list to `{tag: ""}`, per the Open
    /// Question resolution in spec.md §9: the source mixes `map<k,v>` and
    /// `[]string` tag forms; the canonical form here is always a mapping.
    pub fn normalize_tags(list: Vec<String>) -> HashMap<String, String> {
        list.into_iter().map(|k| (k, String::new())).collect()
    }

    pub fn is_regional(&self) -> bool {
        self.region != GLOBAL_REGION
    }
}

/// An immutable, versioned snapshot of discovered resources.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Inventory {
    pub snapshot_id: u64,
    pub resources: Vec<Resource>,
}

impl Inventory {
    pub fn new(snapshot_id: u64, resources: Vec<Resource>) -> Self {
        Self { snapshot_id, resources }
    }

    /// Builds the `(provider, id)` index lazily; callers that only need a
    /// handful of lookups are not forced to eagerly index the whole vector
    /// more than once since this returns a borrowed view each call.
    pub fn index_by_key(&self) -> HashMap<(CloudProviderKind, &str), &Resource> {
        self.resources.iter().map(|r| (r.key(), r)).collect()
    }

    pub fn index_by_fallback_key(
        &self,
    ) -> HashMap<(CloudProviderKind, &str, &str, &str), &Resource> {
        self.resources.iter().map(|r| (r.fallback_key(), r)).collect()
    }

    pub fn by_type(&self, resource_type: &str) -> impl Iterator<Item = &Resource> {
        self.resources.iter().filter(move |r| r.resource_type == resource_type)
    }

    pub fn by_region<'a>(&'a self, region: &'a str) -> impl Iterator<Item = &'a Resource> {
        self.resources.iter().filter(move |r| r.region == region)
    }

    pub fn by_tag<'a>(&'a self, key: &'a str, value: &'a str) -> impl Iterator<Item = &'a Resource> {
        self.resources
            .iter()
            .filter(move |r| r.tags.get(key).map(|v| v.as_str()) == Some(value))
    }

    /// Invariant check used by tests and by discovery's aggregation step:
    /// no two resources may share a `(provider, id)` key.
    pub fn has_duplicates(&self) -> bool {
        let mut seen = std::collections::HashSet::new();
        self.resources.iter().any(|r| !seen.insert(r.key()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn sample(id: &str) -> Resource {
        Resource {
            id: id.to_string(),
            name: id.to_string(),
            resource_type: "compute-instance".to_string(),
            provider: CloudProviderKind::Aws,
            region: "us-east-1".to_string(),
            account: "123".to_string(),
            state: "active".to_string(),
            tags: HashMap::new(),
            properties: IndexMap::new(),
            created_at: Utc::now(),
            last_seen: Utc::now(),
            provenance: Provenance {
                discovered_by: CloudProviderKind::Aws,
                discovery_method: DiscoveryMethod::FullScan,
                source_event_id: None,
            },
        }
    }

    #[test]
    fn inventory_uniqueness_invariant() {
        let inv = Inventory::new(1, vec![sample("i-1"), sample("i-2")]);
        assert!(!inv.has_duplicates());

        let dup = Inventory::new(1, vec![sample("i-1"), sample("i-1")]);
        assert!(dup.has_duplicates());
    }

    #[test]
    fn normalize_tags_lifts_list_to_empty_valued_map() {
        let tags = Resource::normalize_tags(vec!["prod".to_string(), "team-a".to_string()]);
        assert_eq!(tags.get("prod"), Some(&String::new()));
        assert_eq!(tags.get("team-a"), Some(&String::new()));
    }
}

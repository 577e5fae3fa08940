//! Drift Detector (C5), per spec.md §4.4: matches declared against
//! discovered inventories and emits classified, deterministically sorted
//! drift items.

use std::collections::HashMap;

use chrono::Utc;

use driftmgr_core::model::{sort_drift_items, CloudProviderKind, DriftItem, DriftKind, Inventory, ResourceCategory, Severity};
use driftmgr_categorize::{categorize, CategorizationContext};
use driftmgr_state::DeclaredInventory;

use crate::compare::diff_properties;

const CRITICAL_RESOURCE_TYPES: &[&str] = &["database", "network-core", "security-group", "iam"];

pub fn detect(declared: &DeclaredInventory, discovered: &Inventory, categorize_ctx: &CategorizationContext) -> Vec<DriftItem> {
    let discovered_by_key: HashMap<(CloudProviderKind, &str), _> = discovered.index_by_key();
    let discovered_by_fallback: HashMap<(CloudProviderKind, &str, &str, &str), _> = discovered.index_by_fallback_key();

    let mut matched_discovered: std::collections::HashSet<(CloudProviderKind, String)> = std::collections::HashSet::new();
    let mut items = Vec::new();

    for declared_resource in &declared.resources {
        let live = discovered_by_key
            .get(&declared_resource.key())
            .copied()
            .or_else(|| discovered_by_fallback.get(&declared_resource.fallback_key()).copied());

        match live {
            None => {
                let severity = if CRITICAL_RESOURCE_TYPES.iter().any(|t| declared_resource.resource_type.contains(t)) {
                    Severity::Critical
                } else {
                    Severity::High
                };
                items.push(DriftItem {
                    resource_id: declared_resource.id.clone(),
                    resource_type: declared_resource.resource_type.clone(),
                    provider: declared_resource.provider,
                    kind: DriftKind::MissingFromCloud,
                    field_changes: Vec::new(),
                    severity,
                    sensitivity: driftmgr_core::model::Sensitivity::Medium,
                    detected_at: Utc::now(),
                });
            }
            Some(resource) => {
                matched_discovered.insert(resource.key().clone_owned());
                let field_changes = diff_properties(&declared_resource.properties, &resource.properties);
                if !field_changes.is_empty() {
                    let sensitivity = field_changes.iter().map(|c| c.sensitivity).max().unwrap_or(driftmgr_core::model::Sensitivity::Low);
                    let severity = severity_for_sensitivity(sensitivity);
                    items.push(DriftItem {
                        resource_id: resource.id.clone(),
                        resource_type: resource.resource_type.clone(),
                        provider: resource.provider,
                        kind: DriftKind::FieldMismatch,
                        field_changes,
                        severity,
                        sensitivity,
                        detected_at: Utc::now(),
                    });
                }
            }
        }
    }

    for resource in &discovered.resources {
        let key = (resource.provider, resource.id.clone());
        if matched_discovered.contains(&key) {
            continue;
        }

        let (category, _) = categorize(resource, false, categorize_ctx);
        if matches!(category, ResourceCategory::Unmanageable | ResourceCategory::Temporary) {
            continue;
        }

        items.push(DriftItem {
            resource_id: resource.id.clone(),
            resource_type: resource.resource_type.clone(),
            provider: resource.provider,
            kind: DriftKind::ExtraInCloud,
            field_changes: Vec::new(),
            severity: Severity::Medium,
            sensitivity: driftmgr_core::model::Sensitivity::Medium,
            detected_at: Utc::now(),
        });
    }

    sort_drift_items(&mut items);
    items
}

fn severity_for_sensitivity(sensitivity: driftmgr_core::model::Sensitivity) -> Severity {
    use driftmgr_core::model::Sensitivity;
    match sensitivity {
        Sensitivity::Critical => Severity::Critical,
        Sensitivity::High => Severity::High,
        Sensitivity::Medium => Severity::Medium,
        Sensitivity::Low => Severity::Low,
    }
}

trait OwnedKey {
    fn clone_owned(&self) -> (CloudProviderKind, String);
}

impl OwnedKey for (CloudProviderKind, &str) {
    fn clone_owned(&self) -> (CloudProviderKind, String) {
        (self.0, self.1.to_string())
    }
}

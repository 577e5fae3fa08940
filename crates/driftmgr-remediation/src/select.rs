//! Remediation-type selection, per spec.md §4.6's ordered decision rule:
//! the first matching rule wins.

use driftmgr_core::config::ExtrasPolicy;
use driftmgr_core::model::{DriftItem, DriftKind, RemediationType};

use crate::force_new::is_force_new_field;

/// Chooses the remediation type for a single drift item. `is_managed`
/// reflects whether the resource is already under declared management
/// (false for an `ExtraInCloud` resource the categorizer would accept as
/// an import candidate rather than delete outright).
pub fn select_remediation_type(item: &DriftItem, extras_policy: ExtrasPolicy) -> RemediationType {
    match item.kind {
        DriftKind::ExtraInCloud => match extras_policy {
            ExtrasPolicy::Delete => RemediationType::Delete,
            ExtrasPolicy::Import => RemediationType::Import,
        },
        DriftKind::MissingFromCloud => RemediationType::Create,
        DriftKind::FieldMismatch | DriftKind::StateMismatch => {
            let touches_force_new = item.field_changes.iter().any(|change| is_force_new_field(&item.resource_type, &change.path));
            if touches_force_new {
                RemediationType::Replace
            } else {
                RemediationType::Update
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use driftmgr_core::model::{CloudProviderKind, FieldChange, FieldChangeAction, Sensitivity, Severity};

    fn base_item(kind: DriftKind) -> DriftItem {
        DriftItem {
            resource_id: "i-1".to_string(),
            resource_type: "compute-instance".to_string(),
            provider: CloudProviderKind::Aws,
            kind,
            field_changes: Vec::new(),
            severity: Severity::Medium,
            sensitivity: Sensitivity::Medium,
            detected_at: Utc::now(),
        }
    }

    #[test]
    fn force_new_field_touch_selects_replace_over_update() {
        let mut item = base_item(DriftKind::FieldMismatch);
        item.field_changes.push(FieldChange {
            path: "instance_type".to_string(),
            old_value: None,
            new_value: None,
            action: FieldChangeAction::Update,
            sensitivity: Sensitivity::Medium,
        });
        assert_eq!(select_remediation_type(&item, ExtrasPolicy::Delete), RemediationType::Replace);
    }

    #[test]
    fn non_force_new_mismatch_selects_update() {
        let mut item = base_item(DriftKind::FieldMismatch);
        item.field_changes.push(FieldChange {
            path: "tags.owner".to_string(),
            old_value: None,
            new_value: None,
            action: FieldChangeAction::Update,
            sensitivity: Sensitivity::Low,
        });
        assert_eq!(select_remediation_type(&item, ExtrasPolicy::Delete), RemediationType::Update);
    }

    #[test]
    fn extra_in_cloud_follows_the_configured_extras_policy() {
        let item = base_item(DriftKind::ExtraInCloud);
        assert_eq!(select_remediation_type(&item, ExtrasPolicy::Delete), RemediationType::Delete);
        assert_eq!(select_remediation_type(&item, ExtrasPolicy::Import), RemediationType::Import);
    }

    #[test]
    fn missing_from_cloud_always_selects_create() {
        let item = base_item(DriftKind::MissingFromCloud);
        assert_eq!(select_remediation_type(&item, ExtrasPolicy::Delete), RemediationType::Create);
    }
}

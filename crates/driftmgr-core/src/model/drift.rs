use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::resource::CloudProviderKind;
use super::value::PropertyValue;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum DriftKind {
    MissingFromCloud,
    ExtraInCloud,
    FieldMismatch,
    StateMismatch,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Sensitivity {
    Low,
    Medium,
    High,
    Critical,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FieldChangeAction {
    Add,
    Remove,
    Update,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldChange {
    pub path: String,
    pub old_value: Option<PropertyValue>,
    pub new_value: Option<PropertyValue>,
    pub action: FieldChangeAction,
    pub sensitivity: Sensitivity,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DriftItem {
    pub resource_id: String,
    pub resource_type: String,
    pub provider: CloudProviderKind,
    pub kind: DriftKind,
    pub field_changes: Vec<FieldChange>,
    pub severity: Severity,
    pub sensitivity: Sensitivity,
    pub detected_at: DateTime<Utc>,
}

impl DriftItem {
    /// The `(provider, type, id)` sort key drift reports are published
    /// under, per the determinism requirement in spec.md §4.4.
    pub fn sort_key(&self) -> (&'static str, &str, &str) {
        (self.provider.as_str(), self.resource_type.as_str(), self.resource_id.as_str())
    }

    /// A single scalar used by the smart-filter noise-reduction pass;
    /// higher is noisier-but-more-important, i.e. higher priority to keep.
    pub fn priority_score(&self) -> f64 {
        let severity_weight = match self.severity {
            Severity::Critical => 4.0,
            Severity::High => 3.0,
            Severity::Medium => 2.0,
            Severity::Low => 1.0,
        };
        let sensitivity_weight = match self.sensitivity {
            Sensitivity::Critical => 4.0,
            Sensitivity::High => 3.0,
            Sensitivity::Medium => 2.0,
            Sensitivity::Low => 1.0,
        };
        severity_weight * 10.0 + sensitivity_weight + self.field_changes.len() as f64 * 0.01
    }
}

pub fn sort_drift_items(items: &mut [DriftItem]) {
    items.sort_by(|a, b| a.sort_key().cmp(&b.sort_key()));
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn item(severity: Severity) -> DriftItem {
        DriftItem {
            resource_id: "i-1".to_string(),
            resource_type: "compute-instance".to_string(),
            provider: CloudProviderKind::Aws,
            kind: DriftKind::FieldMismatch,
            field_changes: vec![],
            severity,
            sensitivity: Sensitivity::Medium,
            detected_at: Utc::now(),
        }
    }

    #[test]
    fn sorting_is_stable_by_provider_type_id() {
        let mut items = vec![item(Severity::Low), item(Severity::Critical)];
        items[0].resource_id = "i-2".to_string();
        items[1].resource_id = "i-1".to_string();
        sort_drift_items(&mut items);
        assert_eq!(items[0].resource_id, "i-1");
        assert_eq!(items[1].resource_id, "i-2");
    }

    #[test]
    fn critical_outranks_low_in_priority_score() {
        assert!(item(Severity::Critical).priority_score() > item(Severity::Low).priority_score());
    }
}

//! Smart filtering (C5), resolving the Open Question in spec.md §9: the
//! per-severity threshold is the *fraction of the lowest-priority items at
//! that severity to suppress* after sorting descending by priority score —
//! not an absolute score cutoff, which the source never actually compares
//! against anything.

use driftmgr_core::config::EnvironmentProfile;
use driftmgr_core::model::{DriftItem, Severity};

fn threshold(severity: Severity, environment: EnvironmentProfile) -> f64 {
    use EnvironmentProfile::*;
    use Severity::*;
    match (severity, environment) {
        (Critical, Production) => 0.00,
        (Critical, Staging) => 0.10,
        (Critical, Development) => 0.25,
        (High, Production) => 0.05,
        (High, Staging) => 0.25,
        (High, Development) => 0.50,
        (Medium, Production) => 0.15,
        (Medium, Staging) => 0.50,
        (Medium, Development) => 0.75,
        (Low, Production) => 0.75,
        (Low, Staging) => 0.85,
        (Low, Development) => 0.90,
    }
}

/// Applies the per-environment noise-reduction pass, grouping by severity,
/// sorting each group descending by priority score, and dropping the
/// bottom `threshold` fraction of each group.
pub fn apply_smart_filter(items: Vec<DriftItem>, environment: EnvironmentProfile) -> Vec<DriftItem> {
    let mut by_severity: std::collections::BTreeMap<Severity, Vec<DriftItem>> = std::collections::BTreeMap::new();
    for item in items {
        by_severity.entry(item.severity).or_default().push(item);
    }

    let mut kept = Vec::new();
    for (severity, mut group) in by_severity {
        group.sort_by(|a, b| b.priority_score().partial_cmp(&a.priority_score()).unwrap_or(std::cmp::Ordering::Equal));
        let suppress_fraction = threshold(severity, environment);
        let suppress_count = (group.len() as f64 * suppress_fraction).floor() as usize;
        let keep_count = group.len() - suppress_count.min(group.len());
        kept.extend(group.into_iter().take(keep_count));
    }

    driftmgr_core::model::sort_drift_items(&mut kept);
    kept
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use driftmgr_core::model::{CloudProviderKind, DriftKind, Sensitivity};

    fn item(id: &str, severity: Severity) -> DriftItem {
        DriftItem {
            resource_id: id.to_string(),
            resource_type: "compute-instance".to_string(),
            provider: CloudProviderKind::Aws,
            kind: DriftKind::FieldMismatch,
            field_changes: Vec::new(),
            severity,
            sensitivity: Sensitivity::Medium,
            detected_at: Utc::now(),
        }
    }

    #[test]
    fn production_never_suppresses_critical_drift() {
        let items = vec![item("a", Severity::Critical), item("b", Severity::Critical)];
        let filtered = apply_smart_filter(items, EnvironmentProfile::Production);
        assert_eq!(filtered.len(), 2);
    }

    #[test]
    fn development_suppresses_the_bottom_fraction_of_low_severity_items() {
        let items: Vec<_> = (0..10).map(|i| item(&i.to_string(), Severity::Low)).collect();
        let filtered = apply_smart_filter(items, EnvironmentProfile::Development);
        assert_eq!(filtered.len(), 1);
    }
}

//! Remediation Planner (C7), per spec.md §4.6: turns a batch of drift
//! items into one ordered, risk-assessed, rollback-covered plan.

use std::collections::BTreeMap;

use chrono::Utc;
use driftmgr_core::config::ExtrasPolicy;
use driftmgr_core::model::{
    Action, ActionType, CloudProviderKind, DriftItem, PropertyValue, RemediationPlan, RemediationType, Sensitivity, Severity,
};

use crate::depgraph::{references_resource, topological_order};
use crate::iac::generate_hcl;
use crate::impact::{assess, RiskDimensions};
use crate::rollback::build_rollback_plan;
use crate::select::select_remediation_type;

/// One drift item plus the property bags the planner needs to size an
/// action's `parameters` and the rollback snapshot, supplied by the caller
/// (the categorizer/detector pipeline already holds both).
pub struct ActionInput {
    pub drift: DriftItem,
    pub desired_properties: BTreeMap<String, PropertyValue>,
    pub current_properties: BTreeMap<String, PropertyValue>,
}

fn estimated_time_secs(action_type: ActionType) -> u64 {
    match action_type {
        ActionType::Create => 60,
        ActionType::Update => 30,
        ActionType::Delete => 20,
        ActionType::Import => 10,
        ActionType::Restore => 45,
    }
}

fn severity_weight(severity: Severity) -> f64 {
    match severity {
        Severity::Critical => 9.0,
        Severity::High => 7.0,
        Severity::Medium => 4.0,
        Severity::Low => 1.0,
    }
}

fn sensitivity_weight(sensitivity: Sensitivity) -> f64 {
    match sensitivity {
        Sensitivity::Critical => 9.0,
        Sensitivity::High => 7.0,
        Sensitivity::Medium => 4.0,
        Sensitivity::Low => 1.0,
    }
}

fn worst_plan_type(types: &[RemediationType]) -> RemediationType {
    let precedence = |t: RemediationType| match t {
        RemediationType::Replace => 4,
        RemediationType::Delete => 3,
        RemediationType::Create => 2,
        RemediationType::Import => 1,
        RemediationType::Update => 0,
    };
    types.iter().copied().max_by_key(|t| precedence(*t)).unwrap_or(RemediationType::Update)
}

/// Builds one `RemediationPlan` covering every supplied drift item.
/// `provider` picks which Terraform provider block the generated IaC
/// targets; callers should partition items by provider before calling this
/// when a discovery run spans more than one cloud.
pub fn build_plan(inputs: Vec<ActionInput>, provider: CloudProviderKind, extras_policy: ExtrasPolicy, approval_threshold: f64) -> RemediationPlan {
    let mut actions = Vec::new();
    let mut current_state: BTreeMap<String, PropertyValue> = BTreeMap::new();
    let mut desired_state: BTreeMap<String, PropertyValue> = BTreeMap::new();
    let mut plan_types = Vec::new();
    let mut affected_resources = Vec::new();

    let mut business_total = 0.0;
    let mut security_total = 0.0;
    let mut compliance_total: f64 = 0.0;

    for input in &inputs {
        let item = &input.drift;
        let remediation_type = select_remediation_type(item, extras_policy);
        plan_types.push(remediation_type);
        affected_resources.push(item.resource_id.clone());

        business_total += severity_weight(item.severity);
        security_total += sensitivity_weight(item.sensitivity);
        compliance_total = compliance_total.max(if item.sensitivity == Sensitivity::Critical { 9.0 } else { 2.0 });

        current_state.insert(item.resource_id.clone(), PropertyValue::Mapping(input.current_properties.clone().into_iter().collect()));
        desired_state.insert(item.resource_id.clone(), PropertyValue::Mapping(input.desired_properties.clone().into_iter().collect()));

        let risk = (item.priority_score() / 41.0).clamp(0.0, 1.0);

        match remediation_type {
            RemediationType::Replace => {
                let delete_id = format!("{}-replace-delete", item.resource_id);
                let create_id = format!("{}-replace-create", item.resource_id);
                actions.push(Action {
                    id: delete_id.clone(),
                    resource_id: item.resource_id.clone(),
                    action_type: ActionType::Delete,
                    parameters: BTreeMap::new(),
                    risk,
                    estimated_time_secs: estimated_time_secs(ActionType::Delete),
                    dependencies: Vec::new(),
                });
                actions.push(Action {
                    id: create_id,
                    resource_id: item.resource_id.clone(),
                    action_type: ActionType::Create,
                    parameters: input.desired_properties.clone(),
                    risk,
                    estimated_time_secs: estimated_time_secs(ActionType::Create),
                    dependencies: vec![delete_id],
                });
            }
            RemediationType::Update => actions.push(Action {
                id: format!("{}-update", item.resource_id),
                resource_id: item.resource_id.clone(),
                action_type: ActionType::Update,
                parameters: input.desired_properties.clone(),
                risk,
                estimated_time_secs: estimated_time_secs(ActionType::Update),
                dependencies: Vec::new(),
            }),
            RemediationType::Delete => actions.push(Action {
                id: format!("{}-delete", item.resource_id),
                resource_id: item.resource_id.clone(),
                action_type: ActionType::Delete,
                parameters: BTreeMap::new(),
                risk,
                estimated_time_secs: estimated_time_secs(ActionType::Delete),
                dependencies: Vec::new(),
            }),
            RemediationType::Create => actions.push(Action {
                id: format!("{}-create", item.resource_id),
                resource_id: item.resource_id.clone(),
                action_type: ActionType::Create,
                parameters: input.desired_properties.clone(),
                risk,
                estimated_time_secs: estimated_time_secs(ActionType::Create),
                dependencies: Vec::new(),
            }),
            RemediationType::Import => actions.push(Action {
                id: format!("{}-import", item.resource_id),
                resource_id: item.resource_id.clone(),
                action_type: ActionType::Import,
                parameters: input.current_properties.clone(),
                risk,
                estimated_time_secs: estimated_time_secs(ActionType::Import),
                dependencies: Vec::new(),
            }),
        }
    }

    // Cross-reference dependency edges: an action whose parameters mention
    // another action's resource id must run after it.
    let resource_ids: Vec<String> = actions.iter().map(|a| a.resource_id.clone()).collect();
    for action in &mut actions {
        for candidate_id in &resource_ids {
            if candidate_id == &action.resource_id {
                continue;
            }
            if references_resource(action, candidate_id) && !action.dependencies.iter().any(|d| d.starts_with(candidate_id)) {
                if let Some(dep_action) = actions_with_resource(&resource_ids, &actions, candidate_id) {
                    action.dependencies.push(dep_action);
                }
            }
        }
    }

    let ordered_actions = topological_order(actions);

    let business = if inputs.is_empty() { 0.0 } else { business_total / inputs.len() as f64 };
    let security = if inputs.is_empty() { 0.0 } else { security_total / inputs.len() as f64 };
    let dims = RiskDimensions { business, security, cost: 3.0, performance: 3.0, compliance: compliance_total };

    let plan_type = worst_plan_type(&plan_types);
    let impact = assess(plan_type, dims, affected_resources, 0.0, approval_threshold);
    let rollback = build_rollback_plan(&ordered_actions, &current_state_flat(&current_state), format!("snapshot-{}", uuid::Uuid::new_v4()), false);
    let generated_iac = generate_hcl(provider, &ordered_actions);

    RemediationPlan {
        id: uuid::Uuid::new_v4().to_string(),
        plan_type,
        current_state,
        desired_state,
        actions: ordered_actions,
        generated_iac,
        impact,
        rollback,
        status: driftmgr_core::model::PlanStatus::Draft,
        approved: false,
        created_at: Utc::now(),
    }
}

fn actions_with_resource(_resource_ids: &[String], actions: &[Action], resource_id: &str) -> Option<String> {
    actions.iter().find(|a| a.resource_id == resource_id).map(|a| a.id.clone())
}

/// Flattens the per-resource `Mapping` snapshot back into a single
/// property bag keyed by the original field names, for rollback
/// `Update` actions that look values up by bare key.
fn current_state_flat(current_state: &BTreeMap<String, PropertyValue>) -> BTreeMap<String, PropertyValue> {
    let mut flat = BTreeMap::new();
    for value in current_state.values() {
        if let PropertyValue::Mapping(map) = value {
            for (k, v) in map {
                flat.insert(k.clone(), v.clone());
            }
        }
    }
    flat
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc as ChronoUtc;
    use driftmgr_core::model::{DriftKind, FieldChange, FieldChangeAction};

    fn drift_item(resource_id: &str, kind: DriftKind, severity: Severity) -> DriftItem {
        DriftItem {
            resource_id: resource_id.to_string(),
            resource_type: "compute-instance".to_string(),
            provider: CloudProviderKind::Aws,
            kind,
            field_changes: Vec::new(),
            severity,
            sensitivity: Sensitivity::Medium,
            detected_at: ChronoUtc::now(),
        }
    }

    #[test]
    fn force_new_field_change_produces_a_replace_plan_with_downtime() {
        let mut item = drift_item("i-1", DriftKind::FieldMismatch, Severity::High);
        item.field_changes.push(FieldChange {
            path: "instance_type".to_string(),
            old_value: None,
            new_value: None,
            action: FieldChangeAction::Update,
            sensitivity: Sensitivity::Medium,
        });
        let input = ActionInput { drift: item, desired_properties: BTreeMap::new(), current_properties: BTreeMap::new() };
        let plan = build_plan(vec![input], CloudProviderKind::Aws, ExtrasPolicy::Delete, 7.0);
        assert_eq!(plan.plan_type, RemediationType::Replace);
        assert!(plan.impact.requires_downtime);
        assert_eq!(plan.actions.len(), 2);
    }

    #[test]
    fn extra_in_cloud_with_import_policy_produces_an_import_action() {
        let item = drift_item("i-2", DriftKind::ExtraInCloud, Severity::Medium);
        let input = ActionInput { drift: item, desired_properties: BTreeMap::new(), current_properties: BTreeMap::new() };
        let plan = build_plan(vec![input], CloudProviderKind::Aws, ExtrasPolicy::Import, 7.0);
        assert_eq!(plan.plan_type, RemediationType::Import);
        assert_eq!(plan.actions[0].action_type, ActionType::Import);
    }

    #[test]
    fn extra_in_cloud_with_delete_policy_produces_a_delete_action() {
        let item = drift_item("i-3", DriftKind::ExtraInCloud, Severity::Medium);
        let input = ActionInput { drift: item, desired_properties: BTreeMap::new(), current_properties: BTreeMap::new() };
        let plan = build_plan(vec![input], CloudProviderKind::Aws, ExtrasPolicy::Delete, 7.0);
        assert_eq!(plan.plan_type, RemediationType::Delete);
        assert_eq!(plan.actions[0].action_type, ActionType::Delete);
    }

    #[test]
    fn plan_with_only_low_risk_updates_does_not_require_approval() {
        let item = drift_item("i-4", DriftKind::FieldMismatch, Severity::Low);
        let input = ActionInput { drift: item, desired_properties: BTreeMap::new(), current_properties: BTreeMap::new() };
        let plan = build_plan(vec![input], CloudProviderKind::Aws, ExtrasPolicy::Delete, 7.0);
        assert!(!plan.impact.requires_approval);
        assert!(plan.can_execute());
    }
}

//! Rollback plan construction, per spec.md §4.6: every forward action has a
//! mirrored undo action, assembled ahead of execution rather than
//! synthesized after the fact.

use std::collections::BTreeMap;

use driftmgr_core::model::{Action, ActionType, PropertyValue, RollbackPlan};

fn mirror(action: &Action, prior_state: &BTreeMap<String, PropertyValue>) -> Action {
    let rollback_id = format!("{}-rollback", action.id);
    match action.action_type {
        ActionType::Create => Action {
            id: rollback_id,
            resource_id: action.resource_id.clone(),
            action_type: ActionType::Delete,
            parameters: BTreeMap::new(),
            risk: action.risk,
            estimated_time_secs: action.estimated_time_secs,
            dependencies: Vec::new(),
        },
        ActionType::Delete => Action {
            id: rollback_id,
            resource_id: action.resource_id.clone(),
            action_type: ActionType::Restore,
            parameters: prior_state.clone(),
            risk: action.risk,
            estimated_time_secs: action.estimated_time_secs,
            dependencies: Vec::new(),
        },
        ActionType::Update => {
            let reverted: BTreeMap<String, PropertyValue> = action
                .parameters
                .keys()
                .filter_map(|key| prior_state.get(key).map(|value| (key.clone(), value.clone())))
                .collect();
            Action {
                id: rollback_id,
                resource_id: action.resource_id.clone(),
                action_type: ActionType::Update,
                parameters: reverted,
                risk: action.risk,
                estimated_time_secs: action.estimated_time_secs,
                dependencies: Vec::new(),
            }
        }
        ActionType::Import => Action {
            id: rollback_id,
            resource_id: action.resource_id.clone(),
            action_type: ActionType::Delete,
            parameters: BTreeMap::new(),
            risk: action.risk,
            estimated_time_secs: action.estimated_time_secs,
            dependencies: Vec::new(),
        },
        ActionType::Restore => Action {
            id: rollback_id,
            resource_id: action.resource_id.clone(),
            action_type: ActionType::Restore,
            parameters: prior_state.clone(),
            risk: action.risk,
            estimated_time_secs: action.estimated_time_secs,
            dependencies: Vec::new(),
        },
    }
}

pub fn build_rollback_plan(
    actions: &[Action],
    prior_state: &BTreeMap<String, PropertyValue>,
    snapshot_reference: String,
    auto_rollback: bool,
) -> RollbackPlan {
    let mut rollback_actions: Vec<Action> = actions.iter().rev().map(|action| mirror(action, prior_state)).collect();
    // Mirroring reverses execution order so dependents are undone before
    // what they depended on.
    rollback_actions.reverse();
    RollbackPlan { actions: rollback_actions, snapshot_reference, auto_rollback }
}

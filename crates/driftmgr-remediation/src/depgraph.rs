//! Action ordering, per spec.md §4.6: actions on a resource that another
//! action's declared state references must run after it. We detect those
//! edges with a substring match against each action's resource id (the
//! same heuristic the teacher's planner used for dependency inference, see
//! DESIGN.md) and order the graph with Kahn's algorithm, walking a
//! `BTreeMap` so ties resolve lexicographically by action id without an
//! extra sort pass.

use std::collections::BTreeMap;

use driftmgr_core::model::Action;

/// Returns actions in an order that respects `dependencies` edges. Cycles
/// are broken deterministically: the lexicographically-first action id
/// among the still-unresolved set is forced out next, after any `Create`
/// actions touching the same cycle, so a replace-then-update pair on
/// coupled resources always favors creating before updating.
pub fn topological_order(actions: Vec<Action>) -> Vec<Action> {
    let mut by_id: BTreeMap<String, Action> = actions.into_iter().map(|a| (a.id.clone(), a)).collect();

    let mut in_degree: BTreeMap<String, usize> = by_id.keys().map(|id| (id.clone(), 0)).collect();
    let mut dependents: BTreeMap<String, Vec<String>> = by_id.keys().map(|id| (id.clone(), Vec::new())).collect();

    for (id, action) in &by_id {
        for dep in &action.dependencies {
            if by_id.contains_key(dep) {
                *in_degree.get_mut(id).unwrap() += 1;
                dependents.get_mut(dep).unwrap().push(id.clone());
            }
        }
    }

    let mut ordered = Vec::with_capacity(by_id.len());
    loop {
        let ready: Vec<String> = in_degree
            .iter()
            .filter(|(_, degree)| **degree == 0)
            .map(|(id, _)| id.clone())
            .collect();

        if ready.is_empty() {
            break;
        }

        for id in ready {
            in_degree.remove(&id);
            if let Some(action) = by_id.remove(&id) {
                for dependent in dependents.remove(&id).unwrap_or_default() {
                    if let Some(degree) = in_degree.get_mut(&dependent) {
                        *degree = degree.saturating_sub(1);
                    }
                }
                ordered.push(action);
            }
        }
    }

    // Remaining entries sit on a cycle. Break it deterministically: emit
    // `Create` actions first, then the rest in lexicographic id order.
    if !in_degree.is_empty() {
        let mut stuck: Vec<Action> = in_degree.keys().filter_map(|id| by_id.remove(id)).collect();
        stuck.sort_by(|a, b| {
            let a_is_create = matches!(a.action_type, driftmgr_core::model::ActionType::Create);
            let b_is_create = matches!(b.action_type, driftmgr_core::model::ActionType::Create);
            b_is_create.cmp(&a_is_create).then_with(|| a.id.cmp(&b.id))
        });
        ordered.extend(stuck);
    }

    ordered
}

/// Infers a dependency edge for `dependent` on `candidate` when the
/// candidate resource id appears inside one of the dependent's parameter
/// values (the declared-state cross-reference heuristic from spec.md §4.6).
pub fn references_resource(action: &Action, candidate_resource_id: &str) -> bool {
    action.parameters.values().any(|value| value.to_string().contains(candidate_resource_id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use driftmgr_core::model::ActionType;
    use std::collections::BTreeMap as Map;

    fn action(id: &str, action_type: ActionType, dependencies: &[&str]) -> Action {
        Action {
            id: id.to_string(),
            resource_id: id.to_string(),
            action_type,
            parameters: Map::new(),
            risk: 0.0,
            estimated_time_secs: 0,
            dependencies: dependencies.iter().map(|s| s.to_string()).collect(),
        }
    }

    #[test]
    fn dependents_are_ordered_after_their_dependencies() {
        let actions = vec![
            action("b", ActionType::Update, &["a"]),
            action("a", ActionType::Create, &[]),
            action("c", ActionType::Update, &["b"]),
        ];
        let ordered = topological_order(actions);
        let ids: Vec<_> = ordered.iter().map(|a| a.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b", "c"]);
    }

    #[test]
    fn independent_actions_resolve_in_lexicographic_order() {
        let actions = vec![action("z", ActionType::Update, &[]), action("a", ActionType::Update, &[])];
        let ordered = topological_order(actions);
        let ids: Vec<_> = ordered.iter().map(|a| a.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "z"]);
    }

    #[test]
    fn a_cycle_is_broken_with_create_actions_emitted_first() {
        let actions = vec![action("x", ActionType::Update, &["y"]), action("y", ActionType::Create, &["x"])];
        let ordered = topological_order(actions);
        assert_eq!(ordered.len(), 2);
        assert_eq!(ordered[0].id, "y");
    }
}

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::drift::Severity;
use super::value::PropertyValue;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RemediationType {
    Update,
    Replace,
    Delete,
    Import,
    Create,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ActionType {
    Create,
    Update,
    Delete,
    Import,
    Restore,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Action {
    pub id: String,
    pub resource_id: String,
    pub action_type: ActionType,
    pub parameters: std::collections::BTreeMap<String, PropertyValue>,
    pub risk: f64,
    pub estimated_time_secs: u64,
    pub dependencies: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImpactAssessment {
    pub severity: Severity,
    pub estimated_downtime_secs: u64,
    pub affected_resources: Vec<String>,
    pub cost_delta: f64,
    pub risk_score: f64,
    pub requires_approval: bool,
    pub requires_downtime: bool,
    pub reversible: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RollbackPlan {
    pub actions: Vec<Action>,
    pub snapshot_reference: String,
    pub auto_rollback: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum PlanStatus {
    Draft,
    Invalid,
    PendingApproval,
    Approved,
    Executing,
    Completed,
    Failed,
    RolledBack,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemediationPlan {
    pub id: String,
    pub plan_type: RemediationType,
    pub current_state: std::collections::BTreeMap<String, PropertyValue>,
    pub desired_state: std::collections::BTreeMap<String, PropertyValue>,
    pub actions: Vec<Action>,
    pub generated_iac: String,
    pub impact: ImpactAssessment,
    pub rollback: RollbackPlan,
    pub status: PlanStatus,
    pub approved: bool,
    pub created_at: DateTime<Utc>,
}

impl RemediationPlan {
    /// Approval-gate safety invariant from spec.md §8: a plan requiring
    /// approval may not begin executing without it.
    pub fn can_execute(&self) -> bool {
        if self.impact.requires_approval {
            self.approved
        } else {
            true
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn plan(requires_approval: bool, approved: bool) -> RemediationPlan {
        RemediationPlan {
            id: "p-1".to_string(),
            plan_type: RemediationType::Update,
            current_state: Default::default(),
            desired_state: Default::default(),
            actions: vec![],
            generated_iac: String::new(),
            impact: ImpactAssessment {
                severity: Severity::Medium,
                estimated_downtime_secs: 0,
                affected_resources: vec![],
                cost_delta: 0.0,
                risk_score: 7.5,
                requires_approval,
                requires_downtime: false,
                reversible: true,
            },
            rollback: RollbackPlan { actions: vec![], snapshot_reference: String::new(), auto_rollback: false },
            status: PlanStatus::Draft,
            approved,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn approval_gate_blocks_unapproved_high_risk_plan() {
        assert!(!plan(true, false).can_execute());
        assert!(plan(true, true).can_execute());
        assert!(plan(false, false).can_execute());
    }
}

//! Impact assessment, per spec.md §4.6: a weighted risk score drives the
//! approval gate, and each remediation type carries a fixed downtime and
//! reversibility profile.

use driftmgr_core::model::{ImpactAssessment, RemediationType, Severity};

const WEIGHT_BUSINESS: f64 = 0.30;
const WEIGHT_SECURITY: f64 = 0.25;
const WEIGHT_COST: f64 = 0.20;
const WEIGHT_PERFORMANCE: f64 = 0.15;
const WEIGHT_COMPLIANCE: f64 = 0.10;

/// The five dimension scores (each 0.0-10.0) the risk score is a weighted
/// blend of.
#[derive(Debug, Clone, Copy, Default)]
pub struct RiskDimensions {
    pub business: f64,
    pub security: f64,
    pub cost: f64,
    pub performance: f64,
    pub compliance: f64,
}

pub fn risk_score(dims: RiskDimensions) -> f64 {
    (dims.business * WEIGHT_BUSINESS
        + dims.security * WEIGHT_SECURITY
        + dims.cost * WEIGHT_COST
        + dims.performance * WEIGHT_PERFORMANCE
        + dims.compliance * WEIGHT_COMPLIANCE)
        .clamp(0.0, 10.0)
}

fn downtime_secs_for(remediation_type: RemediationType) -> u64 {
    match remediation_type {
        RemediationType::Replace => 120,
        RemediationType::Delete => 30,
        RemediationType::Create => 0,
        RemediationType::Import => 0,
        RemediationType::Update => 0,
    }
}

fn is_reversible(remediation_type: RemediationType) -> bool {
    !matches!(remediation_type, RemediationType::Delete | RemediationType::Replace)
}

fn severity_for_risk(risk_score: f64) -> Severity {
    if risk_score >= 8.0 {
        Severity::Critical
    } else if risk_score >= 6.0 {
        Severity::High
    } else if risk_score >= 3.0 {
        Severity::Medium
    } else {
        Severity::Low
    }
}

pub fn assess(
    remediation_type: RemediationType,
    dims: RiskDimensions,
    affected_resources: Vec<String>,
    cost_delta: f64,
    approval_threshold: f64,
) -> ImpactAssessment {
    let risk_score = risk_score(dims);
    let downtime = downtime_secs_for(remediation_type);
    ImpactAssessment {
        severity: severity_for_risk(risk_score),
        estimated_downtime_secs: downtime,
        affected_resources,
        cost_delta,
        risk_score,
        requires_approval: risk_score >= approval_threshold,
        requires_downtime: downtime > 0,
        reversible: is_reversible(remediation_type),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn replace_carries_downtime_and_is_not_reversible() {
        let assessment = assess(RemediationType::Replace, RiskDimensions::default(), vec!["i-1".to_string()], 0.0, 7.0);
        assert!(assessment.requires_downtime);
        assert!(!assessment.reversible);
    }

    #[test]
    fn high_risk_dimensions_require_approval_at_the_default_threshold() {
        let dims = RiskDimensions { business: 9.0, security: 9.0, cost: 5.0, performance: 5.0, compliance: 5.0 };
        let assessment = assess(RemediationType::Update, dims, vec![], 0.0, 7.0);
        assert!(assessment.requires_approval);
        assert_eq!(assessment.severity, Severity::High);
    }

    #[test]
    fn low_risk_update_does_not_require_approval() {
        let dims = RiskDimensions { business: 1.0, security: 1.0, cost: 1.0, performance: 1.0, compliance: 1.0 };
        let assessment = assess(RemediationType::Update, dims, vec![], 0.0, 7.0);
        assert!(!assessment.requires_approval);
        assert!(!assessment.requires_downtime);
    }
}

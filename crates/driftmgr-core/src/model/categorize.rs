use serde::{Deserialize, Serialize};

use super::resource::Resource;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ResourceCategory {
    Managed,
    Manageable,
    Unmanageable,
    Orphaned,
    ShadowIt,
    Temporary,
    Unknown,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComplianceIssue {
    pub rule: String,
    pub message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportCandidate {
    pub resource: Resource,
    pub category: ResourceCategory,
    pub score: u8,
    pub reasons: Vec<String>,
    pub target_iac_type: String,
    pub import_command: String,
    pub dependencies: Vec<String>,
    pub compliance_issues: Vec<ComplianceIssue>,
}

mod categorize;
mod drift;
mod job;
mod remediation;
mod resource;
mod value;

pub use categorize::{ComplianceIssue, ImportCandidate, ResourceCategory};
pub use drift::{sort_drift_items, DriftItem, DriftKind, FieldChange, FieldChangeAction, Sensitivity, Severity};
pub use job::{Job, JobStatus, JobStep, JobType};
pub use remediation::{Action, ActionType, ImpactAssessment, PlanStatus, RemediationPlan, RemediationType, RollbackPlan};
pub use resource::{CloudProviderKind, DiscoveryMethod, Inventory, Provenance, Resource, GLOBAL_REGION};
pub use value::PropertyValue;

pub mod depgraph;
pub mod force_new;
pub mod iac;
pub mod impact;
pub mod planner;
pub mod rollback;
pub mod select;

pub use planner::{build_plan, ActionInput};
pub use select::select_remediation_type;

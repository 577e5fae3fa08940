//! The provider audit-event shape the listener ingests, normalized across
//! CloudTrail/Activity Log/Cloud Audit Logs-style sources into one struct
//! before classification.

use chrono::{DateTime, Utc};
use driftmgr_core::model::CloudProviderKind;
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawCloudEvent {
    pub event_id: String,
    pub provider: CloudProviderKind,
    pub operation_name: String,
    pub event_time: DateTime<Utc>,
    pub is_role_assumption: bool,
    pub request_parameters: Value,
    pub response_elements: Value,
}

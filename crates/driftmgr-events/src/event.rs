//! Event schema, per spec.md §6: `{type, data, timestamp, metadata?}`.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventType {
    JobCreated,
    JobProgress,
    JobCompleted,
    DiscoveryProgress,
    DriftDetected,
    RemediationStarted,
    RemediationProgress,
    RemediationCompleted,
    ResourceChanged,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    #[serde(rename = "type")]
    pub event_type: EventType,
    pub data: serde_json::Value,
    pub timestamp: DateTime<Utc>,
    pub metadata: Option<HashMap<String, String>>,
}

impl Event {
    pub fn new(event_type: EventType, data: serde_json::Value) -> Self {
        Self { event_type, data, timestamp: Utc::now(), metadata: None }
    }

    pub fn with_metadata(mut self, metadata: HashMap<String, String>) -> Self {
        self.metadata = Some(metadata);
        self
    }
}

/// Per spec.md §4.2, one of these accompanies each completed discovery task.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiscoveryProgress {
    pub service: String,
    pub resource_type: String,
    pub count: usize,
    pub message: String,
}

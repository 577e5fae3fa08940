//! Trait boundaries to the collaborators spec.md §1 calls external: opaque
//! persistence, notification delivery, and credential stores. THE CORE only
//! ever depends on these traits, never on a concrete database or message
//! queue client.

use async_trait::async_trait;
use std::collections::HashMap;

use crate::error::DriftError;
use crate::model::CloudProviderKind;

/// The opaque key-value + SQL interface from spec.md §6. Keys are
/// namespaced by caller convention (`inventory:<snapshot_id>`,
/// `drift:<run_id>`, `plan:<plan_id>`, `history:<plan_id>`).
#[async_trait]
pub trait StateStore: Send + Sync {
    async fn save(&self, key: &str, value: serde_json::Value) -> Result<(), DriftError>;
    async fn load(&self, key: &str) -> Result<Option<serde_json::Value>, DriftError>;
    async fn list(&self, prefix: &str) -> Result<Vec<String>, DriftError>;
}

/// A single outbound notification, independent of delivery channel
/// (email/Slack/etc. are external collaborators per spec.md §1).
#[derive(Debug, Clone, serde::Serialize)]
pub struct NotificationMessage {
    pub title: String,
    pub body: String,
    pub severity: &'static str,
}

#[async_trait]
pub trait NotificationSink: Send + Sync {
    async fn notify(&self, message: &NotificationMessage) -> Result<(), DriftError>;
}

/// Provider credentials, opaque beyond a handful of well-known optional
/// identifiers (spec.md §6): the adapter alone knows how to interpret the
/// `credentials` map.
#[derive(Debug, Clone, Default)]
pub struct CloudCredentials {
    pub credentials: HashMap<String, String>,
    pub region: Option<String>,
    pub project_id: Option<String>,
    pub subscription_id: Option<String>,
}

#[async_trait]
pub trait CredentialStore: Send + Sync {
    async fn credentials_for(&self, provider: CloudProviderKind) -> Result<CloudCredentials, DriftError>;
}

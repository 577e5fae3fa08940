//! Merged runtime configuration, per spec.md §6's configuration table.
//!
//! Loading a config file and watching it for changes is explicitly out of
//! scope for THE CORE (spec.md §1); this module only owns the already-merged
//! shape and a `from_env` convenience constructor built on the `config`
//! crate, the way a composition root would call it once at startup.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::{DriftError, ErrorKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExtrasPolicy {
    Delete,
    Import,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EnvironmentProfile {
    Production,
    Staging,
    Development,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DiscoveryConfig {
    pub auto_discovery: bool,
    pub parallel_workers: usize,
    #[serde(with = "humantime_seconds")]
    pub cache_ttl: Duration,
    pub extras_policy: ExtrasPolicy,
    pub environment: EnvironmentProfile,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            auto_discovery: false,
            parallel_workers: 8,
            cache_ttl: Duration::from_secs(300),
            extras_policy: ExtrasPolicy::Import,
            environment: EnvironmentProfile::Production,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum MinimumSeverity {
    Low,
    Medium,
    High,
    Critical,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DriftDetectionConfig {
    pub enabled: bool,
    #[serde(with = "humantime_seconds")]
    pub interval: Duration,
    pub severity: MinimumSeverity,
}

impl Default for DriftDetectionConfig {
    fn default() -> Self {
        Self { enabled: true, interval: Duration::from_secs(3600), severity: MinimumSeverity::Low }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RemediationConfig {
    pub enabled: bool,
    pub dry_run: bool,
    pub approval_required: bool,
    pub max_retries: u32,
    pub approval_threshold: f64,
}

impl Default for RemediationConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            dry_run: true,
            approval_required: false,
            max_retries: 3,
            approval_threshold: 7.0,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DriftManagerConfig {
    pub discovery: DiscoveryConfig,
    pub drift_detection: DriftDetectionConfig,
    pub remediation: RemediationConfig,
}

impl DriftManagerConfig {
    /// Layers an optional config file over `DRIFTMGR__`-prefixed environment
    /// variables (e.g. `DRIFTMGR__DISCOVERY__PARALLEL_WORKERS=16`); every
    /// field carries a `#[serde(default)]`, so an absent file or a handful
    /// of overridden keys both deserialize cleanly. This is the one place a
    /// composition root calls before constructing any component.
    pub fn from_env(config_file: Option<&str>) -> Result<Self, DriftError> {
        let mut builder = config::Config::builder();

        if let Some(path) = config_file {
            builder = builder.add_source(config::File::with_name(path).required(false));
        }

        builder = builder.add_source(config::Environment::with_prefix("DRIFTMGR").separator("__"));

        let merged = builder
            .build()
            .map_err(|e| DriftError::new(ErrorKind::ValidationFailed, "config.build", e.to_string()))?;

        merged
            .try_deserialize()
            .map_err(|e| DriftError::new(ErrorKind::ValidationFailed, "config.deserialize", e.to_string()))
    }
}

mod humantime_seconds {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(d.as_secs())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        let secs = u64::deserialize(d)?;
        Ok(Duration::from_secs(secs))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_satisfy_the_configuration_table() {
        let cfg = DriftManagerConfig::default();
        assert!(!cfg.discovery.auto_discovery);
        assert_eq!(cfg.discovery.parallel_workers, 8);
        assert!(cfg.remediation.dry_run);
        assert_eq!(cfg.remediation.approval_threshold, 7.0);
    }
}

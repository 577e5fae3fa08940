//! Static rule tables consulted by `categorize`, per spec.md §4.5. Kept as
//! plain data so the categorizer itself stays a pure function of
//! `(resource, is_in_state, profile tables)`.

use driftmgr_core::model::CloudProviderKind;

pub const TEMPORARY_NAME_TOKENS: &[&str] = &["temp", "tmp", "test", "demo", "ephemeral"];

/// Known ephemeral patterns beyond simple name tokens: a young resource
/// whose name matches one of these is still `TEMPORARY` even without an
/// explicit TTL tag (e.g. Lambda-managed ENIs).
pub const EPHEMERAL_NAME_PATTERNS: &[&str] = &["lambda-auto-eni", "eks-managed-node"];

pub const SHADOW_IT_THRESHOLD: usize = 3;

/// `(provider, substring)` pairs recognized as provider-managed system
/// defaults: default VPCs, service-linked roles, and similar resources a
/// human never declares in IaC.
pub const SYSTEM_DEFAULT_PATTERNS: &[(CloudProviderKind, &str)] = &[
    (CloudProviderKind::Aws, "default-vpc"),
    (CloudProviderKind::Aws, "AWSServiceRoleFor"),
    (CloudProviderKind::Azure, "DefaultResourceGroup"),
    (CloudProviderKind::Gcp, "default-network"),
];

pub const MANAGED_BY_TAG_KEYS: &[&str] = &["managed_by", "ManagedBy"];
pub const MANAGED_BY_IAC_VALUES: &[&str] = &["terraform", "pulumi", "cloudformation"];

pub const REQUIRED_TAGS: &[&str] = &["owner", "environment", "cost-center"];

pub fn resource_type_criticality_base(resource_type: &str) -> f64 {
    let lower = resource_type.to_lowercase();
    if ["database", "network-core", "security-group", "iam"].iter().any(|t| lower.contains(t)) {
        40.0
    } else if lower.contains("compute") {
        30.0
    } else if lower.contains("storage") {
        25.0
    } else if lower.contains("network") {
        20.0
    } else {
        10.0
    }
}

pub fn follows_naming_convention(name: &str) -> bool {
    !name.is_empty()
        && name.chars().all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
        && name.contains('-')
}

//! Resource Categorizer (C6), per spec.md §4.5: a pure function with no
//! hidden state, so the "categorizer determinism" testable property holds
//! by construction — no mutex, no clock reads beyond the resource's own
//! timestamps.

use chrono::{DateTime, Utc};

use driftmgr_core::config::EnvironmentProfile;
use driftmgr_core::model::{ImportCandidate, Resource, ResourceCategory};

use crate::scoring::{import_command, score_import_candidate};
use crate::tables::{
    EPHEMERAL_NAME_PATTERNS, MANAGED_BY_IAC_VALUES, MANAGED_BY_TAG_KEYS, REQUIRED_TAGS, SHADOW_IT_THRESHOLD,
    SYSTEM_DEFAULT_PATTERNS, TEMPORARY_NAME_TOKENS,
};

#[derive(Debug, Clone, Default)]
pub struct CategorizationContext {
    pub environment: Option<EnvironmentProfile>,
    pub dependency_count: usize,
    pub estimated_cost_per_month: f64,
    pub security_sensitive: bool,
    pub console_origin: bool,
    pub now: Option<DateTime<Utc>>,
}

pub fn categorize(resource: &Resource, is_in_state: bool, ctx: &CategorizationContext) -> (ResourceCategory, Option<ImportCandidate>) {
    if is_in_state {
        return (ResourceCategory::Managed, None);
    }

    if is_system_default(resource) {
        return (ResourceCategory::Unmanageable, None);
    }

    if is_temporary(resource, ctx) {
        return (ResourceCategory::Temporary, None);
    }

    if is_orphaned(resource) {
        return (ResourceCategory::Orphaned, Some(build_candidate(resource, ResourceCategory::Orphaned, ctx)));
    }

    if shadow_it_indicator_count(resource, ctx) >= SHADOW_IT_THRESHOLD {
        return (ResourceCategory::ShadowIt, Some(build_candidate(resource, ResourceCategory::ShadowIt, ctx)));
    }

    if is_manageable(resource, ctx) {
        return (ResourceCategory::Manageable, Some(build_candidate(resource, ResourceCategory::Manageable, ctx)));
    }

    (ResourceCategory::Unknown, None)
}

fn is_system_default(resource: &Resource) -> bool {
    SYSTEM_DEFAULT_PATTERNS
        .iter()
        .any(|(provider, pattern)| *provider == resource.provider && (resource.name.contains(pattern) || resource.id.contains(pattern)))
}

fn is_temporary(resource: &Resource, ctx: &CategorizationContext) -> bool {
    let name_lower = resource.name.to_lowercase();
    if TEMPORARY_NAME_TOKENS.iter().any(|token| name_lower.contains(token)) {
        return true;
    }
    if resource.tags.contains_key("ttl") || resource.tags.contains_key("TTL") {
        return true;
    }

    let now = ctx.now.unwrap_or_else(Utc::now);
    let age = now.signed_duration_since(resource.created_at);
    let is_young = age.num_hours() < 24;
    is_young && EPHEMERAL_NAME_PATTERNS.iter().any(|pattern| name_lower.contains(pattern))
}

fn is_orphaned(resource: &Resource) -> bool {
    MANAGED_BY_TAG_KEYS.iter().any(|key| {
        resource
            .tags
            .get(*key)
            .map(|value| MANAGED_BY_IAC_VALUES.iter().any(|iac| value.eq_ignore_ascii_case(iac)))
            .unwrap_or(false)
    })
}

fn shadow_it_indicator_count(resource: &Resource, ctx: &CategorizationContext) -> usize {
    let mut count = 0;
    if !MANAGED_BY_TAG_KEYS.iter().any(|key| resource.tags.contains_key(*key)) {
        count += 1;
    }
    if !crate::tables::follows_naming_convention(&resource.name) {
        count += 1;
    }
    if missing_required_tags(resource) >= 2 {
        count += 1;
    }
    if ctx.console_origin {
        count += 1;
    }
    if ctx.dependency_count == 0 {
        count += 1;
    }
    count
}

fn missing_required_tags(resource: &Resource) -> usize {
    REQUIRED_TAGS.iter().filter(|tag| !resource.tags.contains_key(**tag)).count()
}

fn is_manageable(resource: &Resource, ctx: &CategorizationContext) -> bool {
    let production_like = matches!(ctx.environment, Some(EnvironmentProfile::Production));
    production_like
        || ctx.dependency_count > 0
        || ctx.estimated_cost_per_month > 100.0
        || ctx.security_sensitive
        || crate::tables::follows_naming_convention(&resource.name)
}

fn build_candidate(resource: &Resource, category: ResourceCategory, ctx: &CategorizationContext) -> ImportCandidate {
    let (score, reasons) = score_import_candidate(resource, ctx);
    ImportCandidate {
        resource: resource.clone(),
        category,
        score: score.round().clamp(0.0, 100.0) as u8,
        reasons,
        target_iac_type: resource.resource_type.clone(),
        import_command: import_command(resource),
        dependencies: Vec::new(),
        compliance_issues: Vec::new(),
    }
}

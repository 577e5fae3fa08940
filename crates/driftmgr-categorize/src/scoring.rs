//! Import-candidate scoring and command generation, per spec.md §4.5.

use chrono::Utc;

use driftmgr_core::config::EnvironmentProfile;
use driftmgr_core::model::Resource;

use crate::categorizer::CategorizationContext;
use crate::tables::{follows_naming_convention, resource_type_criticality_base, MANAGED_BY_TAG_KEYS, REQUIRED_TAGS};

pub fn score_import_candidate(resource: &Resource, ctx: &CategorizationContext) -> (f64, Vec<String>) {
    let mut score = resource_type_criticality_base(&resource.resource_type);
    let mut reasons = vec![format!("base score for resource type {}", resource.resource_type)];

    match ctx.environment {
        Some(EnvironmentProfile::Production) => {
            score += 30.0;
            reasons.push("production environment".to_string());
        }
        Some(EnvironmentProfile::Staging) => {
            score += 20.0;
            reasons.push("staging environment".to_string());
        }
        Some(EnvironmentProfile::Development) => {
            score += 10.0;
            reasons.push("development environment".to_string());
        }
        None => {}
    }

    if follows_naming_convention(&resource.name) {
        score += 15.0;
        reasons.push("follows naming convention".to_string());
    }

    let missing_tags = REQUIRED_TAGS.iter().filter(|tag| !resource.tags.contains_key(**tag)).count();
    if missing_tags == 0 {
        score += 10.0;
        reasons.push("all required tags present".to_string());
    } else {
        score -= 2.0 * missing_tags as f64;
        reasons.push(format!("{missing_tags} required tags missing"));
    }

    if ctx.dependency_count > 0 {
        score += 5.0 * ctx.dependency_count as f64;
        reasons.push(format!("{} dependent resources", ctx.dependency_count));
    }

    let now = ctx.now.unwrap_or_else(Utc::now);
    let age = now.signed_duration_since(resource.created_at);
    if age.num_days() <= 7 {
        score += 5.0;
        reasons.push("created within the last week".to_string());
    } else if age.num_days() > 90 {
        score += 10.0;
        reasons.push("older than 90 days".to_string());
    }

    if has_competing_automation_tool(resource) {
        score -= 10.0;
        reasons.push("shows indicators of a competing automation tool".to_string());
    }

    if ctx.security_sensitive {
        score += 20.0;
        reasons.push("security-sensitive resource type".to_string());
    }

    if ctx.estimated_cost_per_month > 100.0 {
        score += 15.0;
        reasons.push(format!("estimated cost ${:.2}/mo exceeds threshold", ctx.estimated_cost_per_month));
    }

    (score.clamp(0.0, 100.0), reasons)
}

fn has_competing_automation_tool(resource: &Resource) -> bool {
    MANAGED_BY_TAG_KEYS
        .iter()
        .any(|key| resource.tags.get(*key).map(|v| !v.is_empty() && v != "terraform").unwrap_or(false))
}

pub fn import_command(resource: &Resource) -> String {
    format!("terraform import {}.{} {}", resource.resource_type, sanitize_name(&resource.name), resource.id)
}

fn sanitize_name(name: &str) -> String {
    let sanitized: String = name.chars().map(|c| if c.is_ascii_alphanumeric() || c == '_' { c } else { '_' }).collect();
    if sanitized.chars().next().map(|c| c.is_ascii_digit()).unwrap_or(false) {
        format!("resource_{sanitized}")
    } else {
        sanitized
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sanitizes_non_word_characters_and_prefixes_leading_digits() {
        assert_eq!(sanitize_name("my bucket!"), "my_bucket_");
        assert_eq!(sanitize_name("123-bucket"), "resource_123_bucket");
    }

    #[test]
    fn score_is_clamped_to_the_valid_range() {
        let resource = Resource {
            id: "i-1".to_string(),
            name: "x".to_string(),
            resource_type: "database".to_string(),
            provider: driftmgr_core::model::CloudProviderKind::Aws,
            region: "us-east-1".to_string(),
            account: "1".to_string(),
            state: "active".to_string(),
            tags: std::collections::HashMap::new(),
            properties: indexmap::IndexMap::new(),
            created_at: Utc::now() - chrono::Duration::days(200),
            last_seen: Utc::now(),
            provenance: driftmgr_core::model::Provenance {
                discovered_by: driftmgr_core::model::CloudProviderKind::Aws,
                discovery_method: driftmgr_core::model::DiscoveryMethod::FullScan,
                source_event_id: None,
            },
        };
        let ctx = CategorizationContext {
            environment: Some(EnvironmentProfile::Production),
            dependency_count: 10,
            estimated_cost_per_month: 10_000.0,
            security_sensitive: true,
            ..Default::default()
        };

        let (score, _) = score_import_candidate(&resource, &ctx);
        assert!(score <= 100.0);
    }
}

//! Sensitivity/severity classification tables, per spec.md §4.4: evaluated
//! in this fixed order — first match wins, and the order is part of the
//! contract, not an incidental implementation detail.

use driftmgr_core::model::Sensitivity;

struct SensitivityRule {
    path_contains: &'static [&'static str],
    sensitivity: Sensitivity,
}

const RULES: &[SensitivityRule] = &[
    SensitivityRule {
        path_contains: &["security", "policy", "encryption", "ssl", "tls", "iam"],
        sensitivity: Sensitivity::Critical,
    },
    SensitivityRule { path_contains: &["subnet", "vpc", "cidr", "ip", "route"], sensitivity: Sensitivity::High },
    SensitivityRule {
        path_contains: &["instance-type", "instance_type", "size", "capacity", "cpu", "memory"],
        sensitivity: Sensitivity::Medium,
    },
    SensitivityRule { path_contains: &["tags", "metadata"], sensitivity: Sensitivity::Low },
];

pub fn classify_path(path: &str) -> Sensitivity {
    let lower = path.to_lowercase();
    for rule in RULES {
        if rule.path_contains.iter().any(|token| lower.contains(token)) {
            return rule.sensitivity;
        }
    }
    Sensitivity::Medium
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn security_tokens_win_even_when_network_tokens_also_present() {
        assert_eq!(classify_path("security_groups"), Sensitivity::Critical);
        assert_eq!(classify_path("vpc_security_policy"), Sensitivity::Critical);
    }

    #[test]
    fn unrecognized_paths_default_to_medium() {
        assert_eq!(classify_path("some_custom_field"), Sensitivity::Medium);
    }

    #[test]
    fn tag_paths_are_low_sensitivity() {
        assert_eq!(classify_path("tags.owner"), Sensitivity::Low);
    }
}

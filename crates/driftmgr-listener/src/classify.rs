//! Read-only filtering and change-kind classification, per spec.md §4.8:
//! both are ordered prefix-table lookups against the operation name, not a
//! fixed set — a new read verb or write verb slots in without touching the
//! caller.

use crate::raw_event::RawCloudEvent;

const READ_ONLY_PREFIXES: &[&str] = &["Describe", "List", "Get", "Head"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeKind {
    Created,
    Modified,
    Deleted,
    TagsModified,
    StateChanged,
}

// Listed longest/most-specific prefix first: "CreateTags" must be checked
// before the shorter "Create" or it would never be reached.
const CLASSIFICATION_TABLE: &[(&str, ChangeKind)] = &[
    ("CreateTags", ChangeKind::TagsModified),
    ("DeleteTags", ChangeKind::TagsModified),
    ("TagResource", ChangeKind::TagsModified),
    ("UntagResource", ChangeKind::TagsModified),
    ("Create", ChangeKind::Created),
    ("Run", ChangeKind::Created),
    ("Launch", ChangeKind::Created),
    ("Terminate", ChangeKind::Deleted),
    ("Remove", ChangeKind::Deleted),
    ("Delete", ChangeKind::Deleted),
    ("Start", ChangeKind::StateChanged),
    ("Stop", ChangeKind::StateChanged),
    ("Reboot", ChangeKind::StateChanged),
    ("Modify", ChangeKind::Modified),
    ("Update", ChangeKind::Modified),
    ("Put", ChangeKind::Modified),
    ("Set", ChangeKind::Modified),
];

/// `true` for events that never represent a mutation worth tracking:
/// read-only API calls and internal role-assumption noise.
pub fn is_ignorable(event: &RawCloudEvent) -> bool {
    if event.is_role_assumption {
        return true;
    }
    READ_ONLY_PREFIXES.iter().any(|prefix| event.operation_name.starts_with(prefix))
}

/// Classifies a mutating operation name against the ordered prefix table;
/// first match wins. Unrecognized verbs default to `Modified` rather than
/// being dropped, since we already know the event isn't read-only.
pub fn classify(operation_name: &str) -> ChangeKind {
    CLASSIFICATION_TABLE
        .iter()
        .find(|(prefix, _)| operation_name.starts_with(prefix))
        .map(|(_, kind)| *kind)
        .unwrap_or(ChangeKind::Modified)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use driftmgr_core::model::CloudProviderKind;
    use serde_json::json;

    fn event(operation_name: &str, is_role_assumption: bool) -> RawCloudEvent {
        RawCloudEvent {
            event_id: "e-1".to_string(),
            provider: CloudProviderKind::Aws,
            operation_name: operation_name.to_string(),
            event_time: Utc::now(),
            is_role_assumption,
            request_parameters: json!({}),
            response_elements: json!({}),
        }
    }

    #[test]
    fn describe_calls_are_ignorable() {
        assert!(is_ignorable(&event("DescribeInstances", false)));
        assert!(is_ignorable(&event("ListBuckets", false)));
    }

    #[test]
    fn role_assumption_events_are_ignorable_regardless_of_operation_name() {
        assert!(is_ignorable(&event("RunInstances", true)));
    }

    #[test]
    fn mutating_calls_are_not_ignorable_and_classify_correctly() {
        assert!(!is_ignorable(&event("RunInstances", false)));
        assert_eq!(classify("RunInstances"), ChangeKind::Created);
        assert_eq!(classify("TerminateInstances"), ChangeKind::Deleted);
        assert_eq!(classify("CreateTags"), ChangeKind::TagsModified);
        assert_eq!(classify("ModifyInstanceAttribute"), ChangeKind::Modified);
        assert_eq!(classify("StopInstances"), ChangeKind::StateChanged);
    }

    #[test]
    fn unrecognized_mutating_verb_defaults_to_modified() {
        assert_eq!(classify("AuthorizeSecurityGroupIngress"), ChangeKind::Modified);
    }
}

//! Static force-new field table, per spec.md §4.6: a change to any of these
//! paths, for the given resource type, mandates a `replace` instead of an
//! `update`.

const FORCE_NEW_FIELDS: &[(&str, &[&str])] = &[
    ("compute-instance", &["ami", "instance_type", "availability_zone"]),
    ("database", &["engine", "engine_version"]),
    ("storage-bucket", &["region", "name"]),
];

pub fn is_force_new_field(resource_type: &str, field_path: &str) -> bool {
    let lower_type = resource_type.to_lowercase();
    FORCE_NEW_FIELDS
        .iter()
        .filter(|(rt, _)| lower_type.contains(rt))
        .any(|(_, fields)| fields.iter().any(|f| field_path == *f || field_path.starts_with(&format!("{f}."))))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn instance_type_change_is_force_new_for_compute_instances() {
        assert!(is_force_new_field("compute-instance", "instance_type"));
        assert!(!is_force_new_field("compute-instance", "tags.owner"));
    }

    #[test]
    fn database_engine_version_is_force_new() {
        assert!(is_force_new_field("database", "engine_version"));
    }
}

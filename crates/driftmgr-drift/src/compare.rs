//! Recursive structural comparison between two property trees, per
//! spec.md §4.4: JSON-value semantics (numbers by numeric value, sequences
//! positionally, mappings key-wise). Each divergence becomes one
//! `FieldChange`.

use indexmap::IndexMap;

use driftmgr_core::model::{FieldChange, FieldChangeAction, PropertyValue};

use crate::sensitivity::classify_path;

pub fn diff_properties(declared: &IndexMap<String, PropertyValue>, discovered: &IndexMap<String, PropertyValue>) -> Vec<FieldChange> {
    let mut changes = Vec::new();
    let mut keys: Vec<&String> = declared.keys().chain(discovered.keys()).collect();
    keys.sort();
    keys.dedup();

    for key in keys {
        diff_value(key, declared.get(key), discovered.get(key), &mut changes);
    }
    changes
}

fn diff_value(path: &str, declared: Option<&PropertyValue>, discovered: Option<&PropertyValue>, changes: &mut Vec<FieldChange>) {
    match (declared, discovered) {
        (None, None) => {}
        (None, Some(new_value)) => changes.push(field_change(path, None, Some(new_value.clone()), FieldChangeAction::Add)),
        (Some(old_value), None) => changes.push(field_change(path, Some(old_value.clone()), None, FieldChangeAction::Remove)),
        (Some(old_value), Some(new_value)) => diff_present(path, old_value, new_value, changes),
    }
}

fn diff_present(path: &str, old_value: &PropertyValue, new_value: &PropertyValue, changes: &mut Vec<FieldChange>) {
    match (old_value, new_value) {
        (PropertyValue::Mapping(old_map), PropertyValue::Mapping(new_map)) => {
            let mut keys: Vec<&String> = old_map.keys().chain(new_map.keys()).collect();
            keys.sort();
            keys.dedup();
            for key in keys {
                let nested_path = format!("{path}.{key}");
                diff_value(&nested_path, old_map.get(key), new_map.get(key), changes);
            }
        }
        (PropertyValue::Sequence(old_seq), PropertyValue::Sequence(new_seq)) => {
            let max_len = old_seq.len().max(new_seq.len());
            for index in 0..max_len {
                let nested_path = format!("{path}[{index}]");
                diff_value(&nested_path, old_seq.get(index), new_seq.get(index), changes);
            }
        }
        (old_value, new_value) if old_value != new_value => {
            changes.push(field_change(path, Some(old_value.clone()), Some(new_value.clone()), FieldChangeAction::Update));
        }
        _ => {}
    }
}

fn field_change(path: &str, old_value: Option<PropertyValue>, new_value: Option<PropertyValue>, action: FieldChangeAction) -> FieldChange {
    FieldChange { path: path.to_string(), old_value, new_value, action, sensitivity: classify_path(path) }
}

#[cfg(test)]
mod tests {
    use super::*;
    use driftmgr_core::model::Sensitivity;

    fn seq(values: &[&str]) -> PropertyValue {
        PropertyValue::Sequence(values.iter().map(|v| PropertyValue::String(v.to_string())).collect())
    }

    #[test]
    fn detects_an_added_sequence_element_as_a_single_add_change() {
        let mut declared = IndexMap::new();
        declared.insert("security_groups".to_string(), seq(&["sg-a"]));
        let mut discovered = IndexMap::new();
        discovered.insert("security_groups".to_string(), seq(&["sg-a", "sg-b"]));

        let changes = diff_properties(&declared, &discovered);
        assert_eq!(changes.len(), 1);
        assert_eq!(changes[0].path, "security_groups[1]");
        assert_eq!(changes[0].action, FieldChangeAction::Add);
        assert_eq!(changes[0].sensitivity, Sensitivity::Critical);
    }

    #[test]
    fn numeric_values_compare_by_value_not_representation() {
        let mut declared = IndexMap::new();
        declared.insert("capacity".to_string(), PropertyValue::Number(10.0));
        let mut discovered = IndexMap::new();
        discovered.insert("capacity".to_string(), PropertyValue::Number(10.0));

        assert!(diff_properties(&declared, &discovered).is_empty());
    }

    #[test]
    fn nested_mapping_divergence_produces_a_dotted_path() {
        let mut declared = IndexMap::new();
        let mut old_nested = IndexMap::new();
        old_nested.insert("enabled".to_string(), PropertyValue::Bool(false));
        declared.insert("encryption".to_string(), PropertyValue::Mapping(old_nested));

        let mut discovered = IndexMap::new();
        let mut new_nested = IndexMap::new();
        new_nested.insert("enabled".to_string(), PropertyValue::Bool(true));
        discovered.insert("encryption".to_string(), PropertyValue::Mapping(new_nested));

        let changes = diff_properties(&declared, &discovered);
        assert_eq!(changes.len(), 1);
        assert_eq!(changes[0].path, "encryption.enabled");
        assert_eq!(changes[0].sensitivity, Sensitivity::Critical);
    }
}

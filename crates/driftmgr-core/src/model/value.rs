//! The recursive property-bag value type used throughout the model.
//!
//! Source systems mix free-form maps, typed scalars, and nested lists under
//! one `properties` bag. We collapse all of that into one enumerated sum
//! type so comparison and sensitivity analysis never have to branch on the
//! underlying representation.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A JSON-like value with order-preserving maps, used for resource
/// `properties` and for declared/discovered comparisons.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PropertyValue {
    Null,
    Bool(bool),
    Number(f64),
    String(String),
    Sequence(Vec<PropertyValue>),
    Mapping(IndexMap<String, PropertyValue>),
}

impl PropertyValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            PropertyValue::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            PropertyValue::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_sequence(&self) -> Option<&[PropertyValue]> {
        match self {
            PropertyValue::Sequence(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_mapping(&self) -> Option<&IndexMap<String, PropertyValue>> {
        match self {
            PropertyValue::Mapping(m) => Some(m),
            _ => None,
        }
    }

    pub fn get(&self, key: &str) -> Option<&PropertyValue> {
        self.as_mapping().and_then(|m| m.get(key))
    }

    /// `true` for the map/sequence variants; comparisons recurse into these.
    pub fn is_composite(&self) -> bool {
        matches!(self, PropertyValue::Sequence(_) | PropertyValue::Mapping(_))
    }
}

/// Structural equality by numeric value, not textual form: `PropertyValue`
/// never derives `PartialEq` because `f64` isn't `Eq`-total, so we implement
/// it by hand and treat NaN (which should never appear in cloud state) as
/// unequal to everything, matching IEEE-754 semantics.
impl PartialEq for PropertyValue {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (PropertyValue::Null, PropertyValue::Null) => true,
            (PropertyValue::Bool(a), PropertyValue::Bool(b)) => a == b,
            (PropertyValue::Number(a), PropertyValue::Number(b)) => a == b,
            (PropertyValue::String(a), PropertyValue::String(b)) => a == b,
            (PropertyValue::Sequence(a), PropertyValue::Sequence(b)) => a == b,
            (PropertyValue::Mapping(a), PropertyValue::Mapping(b)) => {
                a.len() == b.len() && a.iter().all(|(k, v)| b.get(k).map_or(false, |bv| bv == v))
            }
            _ => false,
        }
    }
}

impl fmt::Display for PropertyValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PropertyValue::Null => write!(f, "null"),
            PropertyValue::Bool(b) => write!(f, "{b}"),
            PropertyValue::Number(n) => write!(f, "{n}"),
            PropertyValue::String(s) => write!(f, "{s}"),
            PropertyValue::Sequence(_) | PropertyValue::Mapping(_) => {
                write!(f, "{}", serde_json::to_string(self).unwrap_or_default())
            }
        }
    }
}

impl From<serde_json::Value> for PropertyValue {
    fn from(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => PropertyValue::Null,
            serde_json::Value::Bool(b) => PropertyValue::Bool(b),
            serde_json::Value::Number(n) => PropertyValue::Number(n.as_f64().unwrap_or(0.0)),
            serde_json::Value::String(s) => PropertyValue::String(s),
            serde_json::Value::Array(a) => {
                PropertyValue::Sequence(a.into_iter().map(PropertyValue::from).collect())
            }
            serde_json::Value::Object(o) => PropertyValue::Mapping(
                o.into_iter().map(|(k, v)| (k, PropertyValue::from(v))).collect(),
            ),
        }
    }
}

impl From<PropertyValue> for serde_json::Value {
    fn from(value: PropertyValue) -> Self {
        match value {
            PropertyValue::Null => serde_json::Value::Null,
            PropertyValue::Bool(b) => serde_json::Value::Bool(b),
            PropertyValue::Number(n) => serde_json::json!(n),
            PropertyValue::String(s) => serde_json::Value::String(s),
            PropertyValue::Sequence(s) => {
                serde_json::Value::Array(s.into_iter().map(Into::into).collect())
            }
            PropertyValue::Mapping(m) => serde_json::Value::Object(
                m.into_iter().map(|(k, v)| (k, v.into())).collect(),
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numbers_compare_by_value_not_text() {
        let a = PropertyValue::Number(1.0);
        let b: PropertyValue = serde_json::from_str("1.0").unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn mapping_equality_is_key_wise_not_order_sensitive() {
        let a: PropertyValue = serde_json::json!({"a": 1, "b": 2}).into();
        let b: PropertyValue = serde_json::json!({"b": 2, "a": 1}).into();
        assert_eq!(a, b);
    }

    #[test]
    fn sequences_compare_positionally() {
        let a: PropertyValue = serde_json::json!(["x", "y"]).into();
        let b: PropertyValue = serde_json::json!(["y", "x"]).into();
        assert_ne!(a, b);
    }
}

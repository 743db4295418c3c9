//! Dirty-diff: derive the minimal change set from submitted values.

use serde_json::Value;

use crate::Values;
use crate::compiler::CompiledSchema;
use crate::model::Change;

/// Ordered set of changes produced by one submit.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChangeSet {
    changes: Vec<Change>,
}

impl ChangeSet {
    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }

    pub fn len(&self) -> usize {
        self.changes.len()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Change> {
        self.changes.iter()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.changes.iter().map(|c| c.key.as_str())
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.changes
            .iter()
            .find(|c| c.key == key)
            .map(|c| &c.value)
    }

    /// Changed keys as a `config` payload.
    pub fn to_values(&self) -> Values {
        self.changes
            .iter()
            .map(|c| (c.key.clone(), c.value.clone()))
            .collect()
    }
}

impl FromIterator<Change> for ChangeSet {
    fn from_iter<T: IntoIterator<Item = Change>>(iter: T) -> Self {
        Self {
            changes: iter.into_iter().collect(),
        }
    }
}

impl IntoIterator for ChangeSet {
    type Item = Change;
    type IntoIter = std::vec::IntoIter<Change>;

    fn into_iter(self) -> Self::IntoIter {
        self.changes.into_iter()
    }
}

impl<'a> IntoIterator for &'a ChangeSet {
    type Item = &'a Change;
    type IntoIter = std::slice::Iter<'a, Change>;

    fn into_iter(self) -> Self::IntoIter {
        self.changes.iter()
    }
}

/// Strict value equality as seen by the diff.
///
/// Numbers compare by numeric value (`1 == 1.0`); arrays and objects compare
/// element-wise.
pub fn values_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => match (x.as_i64(), y.as_i64()) {
            (Some(x), Some(y)) => x == y,
            _ => x.as_f64() == y.as_f64(),
        },
        (Value::Array(x), Value::Array(y)) => {
            x.len() == y.len() && x.iter().zip(y).all(|(x, y)| values_equal(x, y))
        }
        (Value::Object(x), Value::Object(y)) => {
            x.len() == y.len()
                && x
                    .iter()
                    .all(|(k, v)| y.get(k).is_some_and(|w| values_equal(v, w)))
        }
        _ => a == b,
    }
}

/// Diff `submitted` against the values recorded in the descriptors.
///
/// A key is emitted iff it belongs to `schema` and its submitted value is not
/// equal to `persisted[key]`. An absent persisted value counts as `null`.
/// Order follows `submitted`.
pub fn compute_changes(schema: &CompiledSchema, persisted: &Values, submitted: &Values) -> ChangeSet {
    submitted
        .iter()
        .filter(|(key, _)| {
            let known = schema.contains(key);
            if !known {
                tracing::debug!(key = key.as_str(), "Skipping value for undeclared setting");
            }
            known
        })
        .filter(|(key, value)| !values_equal(persisted.get(*key).unwrap_or(&Value::Null), value))
        .map(|(key, value)| Change {
            key: key.clone(),
            value: value.clone(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{FieldDescriptor, FieldType};
    use serde_json::json;

    fn schema(keys: &[&str]) -> CompiledSchema {
        let descriptors: Vec<FieldDescriptor> = keys
            .iter()
            .map(|k| {
                serde_json::from_value(json!({"key": k, "fieldType": "integer"})).unwrap()
            })
            .collect();
        CompiledSchema::from_settings(&descriptors).unwrap()
    }

    fn values(v: Value) -> Values {
        serde_json::from_value(v).unwrap()
    }

    #[test]
    fn test_only_changed_keys_are_emitted() {
        let changes = compute_changes(
            &schema(&["a", "b", "c"]),
            &values(json!({"a": 1, "b": 2, "c": 3})),
            &values(json!({"a": 1, "b": 9, "c": 3})),
        );
        assert_eq!(
            changes.iter().cloned().collect::<Vec<_>>(),
            vec![Change {
                key: "b".into(),
                value: json!(9)
            }]
        );
    }

    #[test]
    fn test_identical_values_produce_empty_set() {
        let saved = values(json!({"a": 1, "b": [1, "x"]}));
        assert!(compute_changes(&schema(&["a", "b"]), &saved, &saved.clone()).is_empty());
    }

    #[test]
    fn test_undeclared_keys_are_ignored() {
        let changes = compute_changes(
            &schema(&["a"]),
            &values(json!({"a": 1})),
            &values(json!({"a": 1, "rogue": 5})),
        );
        assert!(changes.is_empty());
    }

    #[test]
    fn test_absent_persisted_value_differs_from_concrete_submission() {
        let changes = compute_changes(&schema(&["a"]), &Values::new(), &values(json!({"a": 10})));
        assert_eq!(changes.get("a"), Some(&json!(10)));

        let cleared = compute_changes(&schema(&["a"]), &Values::new(), &values(json!({"a": null})));
        assert!(cleared.is_empty());
    }

    #[test]
    fn test_order_follows_submission() {
        let changes = compute_changes(
            &schema(&["a", "b", "c"]),
            &Values::new(),
            &values(json!({"c": 3, "a": 1})),
        );
        assert_eq!(changes.keys().collect::<Vec<_>>(), vec!["c", "a"]);
    }

    #[test]
    fn test_values_equal_numeric_and_nested() {
        assert!(values_equal(&json!(1), &json!(1.0)));
        assert!(!values_equal(&json!(1), &json!("1")));
        assert!(!values_equal(&json!(0), &json!(false)));
        assert!(values_equal(&json!(["a", 2]), &json!(["a", 2.0])));
        assert!(!values_equal(&json!(["a", "b"]), &json!(["b", "a"])));
        assert!(values_equal(&json!({"x": 1}), &json!({"x": 1.0})));
    }

    #[test]
    fn test_field_type_irrelevant_to_diff() {
        let d: FieldDescriptor =
            serde_json::from_value(json!({"key": "flag", "fieldType": "boolean"})).unwrap();
        assert_eq!(d.field_type, FieldType::Boolean);
        let schema = CompiledSchema::from_settings(&[d]).unwrap();
        let changes = compute_changes(
            &schema,
            &values(json!({"flag": false})),
            &values(json!({"flag": true})),
        );
        assert_eq!(changes.len(), 1);
    }
}

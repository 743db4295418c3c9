//! Per-panel form state: edited values against a saved baseline.

use indexmap::IndexMap;
use serde_json::Value;

use crate::Values;
use crate::compiler::{CompiledSchema, ValidationErrors};
use crate::diff::{ChangeSet, compute_changes, values_equal};
use crate::model::{Change, FieldDescriptor, PluginConfig};
use crate::SchemaError;

/// Errors from editing a form.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum FormError {
    #[error("unknown setting '{0}'")]
    UnknownField(String),

    #[error("unknown section '{0}'")]
    UnknownSection(String),

    #[error("invalid input for '{key}': {message}")]
    InvalidInput { key: String, message: String },
}

/// State for one open settings panel.
///
/// `persisted` is what the descriptors recorded at load time and is what
/// submissions are diffed against. `baseline` is what the form considers
/// saved for dirty tracking; it starts as the compiled defaults.
#[derive(Debug, Clone, Default)]
pub struct SettingsForm {
    schema: CompiledSchema,
    persisted: Values,
    baseline: Values,
    values: Values,
    sections: IndexMap<String, Vec<String>>,
}

impl SettingsForm {
    /// Build the form for a category's flat settings list.
    pub fn for_category(settings: &[FieldDescriptor]) -> Result<Self, SchemaError> {
        let schema = CompiledSchema::from_settings(settings)?;
        let persisted = settings
            .iter()
            .filter_map(|d| d.value.clone().map(|v| (d.key.clone(), v)))
            .collect();
        Ok(Self::with_schema(schema, persisted, IndexMap::new()))
    }

    /// Build the form for a plugin's sections.
    pub fn for_plugin(plugin: &PluginConfig) -> Result<Self, SchemaError> {
        let schema = CompiledSchema::from_plugin(plugin)?;
        let persisted = plugin
            .fields()
            .filter_map(|d| plugin.config.get(&d.key).map(|v| (d.key.clone(), v.clone())))
            .collect();
        let sections = plugin
            .sections
            .iter()
            .map(|s| (s.id.clone(), s.fields.iter().map(|f| f.key.clone()).collect()))
            .collect();
        Ok(Self::with_schema(schema, persisted, sections))
    }

    fn with_schema(
        schema: CompiledSchema,
        persisted: Values,
        sections: IndexMap<String, Vec<String>>,
    ) -> Self {
        let baseline = schema.defaults();
        Self {
            values: baseline.clone(),
            baseline,
            persisted,
            schema,
            sections,
        }
    }

    pub fn schema(&self) -> &CompiledSchema {
        &self.schema
    }

    /// `true` when there is nothing to edit.
    pub fn is_empty(&self) -> bool {
        self.schema.is_empty()
    }

    pub fn value(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    pub fn values(&self) -> &Values {
        &self.values
    }

    pub fn baseline(&self) -> &Values {
        &self.baseline
    }

    pub fn persisted(&self) -> &Values {
        &self.persisted
    }

    pub fn section_keys(&self, section: &str) -> Option<&[String]> {
        self.sections.get(section).map(Vec::as_slice)
    }

    /// Set a field's value. The value is not validated here.
    pub fn set(&mut self, key: &str, value: Value) -> Result<(), FormError> {
        let slot = self
            .values
            .get_mut(key)
            .ok_or_else(|| FormError::UnknownField(key.to_string()))?;
        *slot = value;
        Ok(())
    }

    /// Set a field from raw text input, coerced by the field's type.
    pub fn set_input(&mut self, key: &str, raw: &str) -> Result<(), FormError> {
        let field = self
            .schema
            .field(key)
            .ok_or_else(|| FormError::UnknownField(key.to_string()))?;
        let value = field
            .field_type
            .parse_input(raw)
            .map_err(|message| FormError::InvalidInput {
                key: key.to_string(),
                message,
            })?;
        self.set(key, value)
    }

    /// Clear a field to `null`.
    pub fn clear(&mut self, key: &str) -> Result<(), FormError> {
        self.set(key, Value::Null)
    }

    /// Keys whose edited value differs from the baseline.
    pub fn dirty_keys(&self) -> Vec<&str> {
        self.values
            .iter()
            .filter(|(k, v)| {
                self.baseline
                    .get(*k)
                    .is_none_or(|saved| !values_equal(saved, v))
            })
            .map(|(k, _)| k.as_str())
            .collect()
    }

    pub fn is_dirty(&self) -> bool {
        !self.dirty_keys().is_empty()
    }

    pub fn validate(&self) -> Result<(), ValidationErrors> {
        self.schema.validate(&self.values)
    }

    /// Inline error for one field, if its current value fails its rule.
    pub fn field_error(&self, key: &str) -> Option<String> {
        let value = self.values.get(key)?;
        self.schema.validate_field(key, value).err()
    }

    /// Whether the submit control should be enabled.
    pub fn can_submit(&self) -> bool {
        self.is_dirty() && self.validate().is_ok()
    }

    /// Changes the current values would submit.
    pub fn changes(&self) -> ChangeSet {
        compute_changes(&self.schema, &self.persisted, &self.values)
    }

    /// Set every field to its declared default. Local only; marks the form dirty
    /// wherever a default differs from the baseline.
    pub fn reset_to_defaults(&mut self) {
        for field in self.schema.fields() {
            self.values
                .insert(field.key.clone(), field.default_value.clone());
        }
    }

    /// Reset only the fields of one plugin section.
    pub fn reset_section_to_defaults(&mut self, section: &str) -> Result<(), FormError> {
        let keys = self
            .sections
            .get(section)
            .ok_or_else(|| FormError::UnknownSection(section.to_string()))?;
        for key in keys {
            if let Some(field) = self.schema.field(key) {
                self.values.insert(key.clone(), field.default_value.clone());
            }
        }
        Ok(())
    }

    /// Restore the last saved snapshot.
    pub fn discard(&mut self) {
        self.values = self.baseline.clone();
    }

    /// Record one accepted change as persisted and saved.
    pub fn commit_change(&mut self, change: &Change) {
        self.persisted
            .insert(change.key.clone(), change.value.clone());
        self.baseline
            .insert(change.key.clone(), change.value.clone());
    }

    /// Record accepted changes as persisted and saved.
    pub fn commit(&mut self, applied: &ChangeSet) {
        for change in applied {
            self.commit_change(change);
        }
    }

    /// After a fully successful save, the submitted values become the baseline.
    pub fn mark_saved(&mut self) {
        self.baseline = self.values.clone();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn category() -> Vec<FieldDescriptor> {
        serde_json::from_value(json!([
            {"key": "timeout", "fieldType": "integer", "defaultValue": 10, "value": 30,
             "validation": {"minValue": 1, "maxValue": 300}},
            {"key": "tls", "fieldType": "boolean", "defaultValue": true, "value": true},
            {"key": "base_dn", "fieldType": "string", "defaultValue": "dc=example,dc=org"}
        ]))
        .unwrap()
    }

    fn plugin() -> PluginConfig {
        serde_json::from_value(json!({
            "name": "posix",
            "version": "1.0.0",
            "enabled": true,
            "sections": [
                {"id": "ids", "label": "IDs", "fields": [
                    {"key": "uid_min", "fieldType": "integer", "defaultValue": 10000},
                    {"key": "gid_min", "fieldType": "integer", "defaultValue": 10000}
                ]},
                {"id": "naming", "label": "Naming", "fields": [
                    {"key": "rdn_attribute", "fieldType": "string", "defaultValue": "uid"}
                ]}
            ],
            "config": {"uid_min": 20000, "gid_min": 20000, "rdn_attribute": "cn"}
        }))
        .unwrap()
    }

    #[test]
    fn test_fresh_form_is_clean() {
        let form = SettingsForm::for_category(&category()).unwrap();
        assert!(!form.is_dirty());
        assert!(!form.can_submit());
        assert_eq!(form.value("timeout"), Some(&json!(30)));
        assert_eq!(form.value("base_dn"), Some(&json!("dc=example,dc=org")));
    }

    #[test]
    fn test_set_unknown_field_fails() {
        let mut form = SettingsForm::for_category(&category()).unwrap();
        assert_eq!(
            form.set("nope", json!(1)),
            Err(FormError::UnknownField("nope".into()))
        );
    }

    #[test]
    fn test_invalid_edit_blocks_submit() {
        let mut form = SettingsForm::for_category(&category()).unwrap();
        form.set_input("timeout", "500").unwrap();
        assert!(form.is_dirty());
        assert!(!form.can_submit());
        assert_eq!(form.field_error("timeout").as_deref(), Some("Must be at most 300"));
    }

    #[test]
    fn test_set_input_reports_unparseable_text() {
        let mut form = SettingsForm::for_category(&category()).unwrap();
        assert!(matches!(
            form.set_input("tls", "maybe"),
            Err(FormError::InvalidInput { .. })
        ));
    }

    #[test]
    fn test_discard_restores_baseline() {
        let mut form = SettingsForm::for_category(&category()).unwrap();
        form.set("timeout", json!(60)).unwrap();
        form.clear("tls").unwrap();
        form.discard();
        assert!(!form.is_dirty());
        assert_eq!(form.value("tls"), Some(&json!(true)));
    }

    #[test]
    fn test_reset_to_defaults_is_dirty_when_defaults_differ() {
        let mut form = SettingsForm::for_category(&category()).unwrap();
        form.reset_to_defaults();
        assert_eq!(form.value("timeout"), Some(&json!(10)));
        assert_eq!(form.dirty_keys(), vec!["timeout"]);
    }

    #[test]
    fn test_commit_then_mark_saved_makes_resave_a_noop() {
        let mut form = SettingsForm::for_category(&category()).unwrap();
        form.set("timeout", json!(60)).unwrap();
        let changes = form.changes();
        assert_eq!(changes.len(), 1);

        form.commit(&changes);
        form.mark_saved();
        assert!(form.changes().is_empty());
        assert!(!form.can_submit());
        assert_eq!(form.baseline()["timeout"], json!(60));
    }

    #[test]
    fn test_plugin_form_reads_config_and_sections() {
        let form = SettingsForm::for_plugin(&plugin()).unwrap();
        assert_eq!(form.value("uid_min"), Some(&json!(20000)));
        assert_eq!(
            form.section_keys("ids"),
            Some(&["uid_min".to_string(), "gid_min".to_string()][..])
        );
    }

    #[test]
    fn test_reset_section_only_touches_that_section() {
        let mut form = SettingsForm::for_plugin(&plugin()).unwrap();
        form.reset_section_to_defaults("naming").unwrap();
        assert_eq!(form.value("rdn_attribute"), Some(&json!("uid")));
        assert_eq!(form.value("uid_min"), Some(&json!(20000)));
        assert_eq!(
            form.reset_section_to_defaults("missing"),
            Err(FormError::UnknownSection("missing".into()))
        );
    }

    #[test]
    fn test_empty_category_form() {
        let mut form = SettingsForm::for_category(&[]).unwrap();
        assert!(form.is_empty());
        assert!(form.validate().is_ok());
        form.reset_to_defaults();
        assert!(!form.can_submit());
        assert!(form.changes().is_empty());
    }
}

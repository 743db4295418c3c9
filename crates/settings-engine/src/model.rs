//! Wire shapes exchanged with the Heracles config API.
//!
//! Field names follow the API's camelCase JSON exactly.

use serde::{Deserialize, Serialize};
use serde_json::{Number, Value};

use crate::Values;

/// Type tag of a configurable setting.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    Boolean,
    Integer,
    Float,
    Multiselect,
    /// Plain text. Unknown tags from the server land here too.
    #[default]
    #[serde(other)]
    String,
}

impl FieldType {
    /// Convert raw text input (as typed into a form control) into a JSON value.
    ///
    /// An empty input clears every non-text field to `null`. Numbers are
    /// parsed but not range-checked; that is the compiled rule's job.
    pub fn parse_input(self, raw: &str) -> Result<Value, String> {
        let trimmed = raw.trim();
        if self != Self::String && trimmed.is_empty() {
            return Ok(Value::Null);
        }
        match self {
            Self::String => Ok(Value::String(raw.to_string())),
            Self::Boolean => match trimmed.to_ascii_lowercase().as_str() {
                "true" => Ok(Value::Bool(true)),
                "false" => Ok(Value::Bool(false)),
                _ => Err("must be 'true' or 'false'".into()),
            },
            Self::Integer | Self::Float => parse_number(trimmed),
            Self::Multiselect => Ok(Value::Array(
                trimmed
                    .split(',')
                    .map(str::trim)
                    .filter(|item| !item.is_empty())
                    .map(|item| Value::String(item.to_string()))
                    .collect(),
            )),
        }
    }
}

fn parse_number(s: &str) -> Result<Value, String> {
    if let Ok(i) = s.parse::<i64>() {
        return Ok(Value::Number(i.into()));
    }
    let f: f64 = s.parse().map_err(|_| "must be a number")?;
    Number::from_f64(f)
        .map(Value::Number)
        .ok_or_else(|| "must be a finite number".into())
}

/// Optional constraints attached to a descriptor.
///
/// A missing bound and an explicit `null` bound both mean "unconstrained".
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Validation {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_value: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_value: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_length: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_length: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pattern_error: Option<String>,
}

/// A selectable choice for multiselect fields. Display only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SelectOption {
    pub value: Value,
    #[serde(default)]
    pub label: String,
}

/// Server-declared shape of one configurable setting.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldDescriptor {
    pub key: String,
    #[serde(default)]
    pub label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub field_type: FieldType,
    #[serde(default)]
    pub default_value: Value,
    /// Persisted value (category settings only). `None` when absent or `null`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub validation: Option<Validation>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<SelectOption>,
    #[serde(default)]
    pub sensitive: bool,
    #[serde(default)]
    pub requires_restart: bool,
}

/// A named group of settings, as returned by `GET config/{category}`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigCategory {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub settings: Vec<FieldDescriptor>,
}

/// A display section of a plugin's configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigSection {
    pub id: String,
    #[serde(default)]
    pub label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub fields: Vec<FieldDescriptor>,
}

/// A plugin with its declared sections and persisted config.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PluginConfig {
    pub name: String,
    #[serde(default)]
    pub version: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub sections: Vec<ConfigSection>,
    #[serde(default)]
    pub config: Values,
}

impl PluginConfig {
    /// All descriptors across sections, in display order.
    pub fn fields(&self) -> impl Iterator<Item = &FieldDescriptor> {
        self.sections.iter().flat_map(|s| s.fields.iter())
    }
}

/// One `key -> value` update, derived by diffing; never authored directly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Change {
    pub key: String,
    pub value: Value,
}

/// How existing entries are moved when their RDN attribute changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MigrationMode {
    Modrdn,
    CopyDelete,
    LeaveOrphaned,
}

/// Impact report for a setting change that renames existing entries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RdnChangeCheck {
    pub old_rdn: String,
    pub new_rdn: String,
    /// Authoritative number of affected entries.
    pub entries_count: u64,
    /// Truncated preview of affected DNs.
    #[serde(default)]
    pub entries_dns: Vec<String>,
    #[serde(default)]
    pub warnings: Vec<String>,
    #[serde(default)]
    pub supports_modrdn: bool,
    pub recommended_mode: MigrationMode,
}

impl RdnChangeCheck {
    /// Affected entries not included in the DN preview.
    pub fn hidden_entries(&self) -> u64 {
        self.entries_count
            .saturating_sub(self.entries_dns.len() as u64)
    }
}

/// Body of `PATCH config/{category}/{key}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SettingUpdateRequest {
    pub value: Value,
}

/// Body of `PATCH config/plugins/{name}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PluginUpdateRequest {
    pub config: Values,
    pub confirmed: bool,
    pub migrate_entries: bool,
}

/// Response of `PATCH config/plugins/{name}`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PluginUpdateResponse {
    #[serde(default)]
    pub requires_confirmation: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub migration_check: Option<RdnChangeCheck>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl PluginUpdateResponse {
    /// The impact report, if the server is asking for confirmation.
    pub fn pending_check(&self) -> Option<&RdnChangeCheck> {
        if self.requires_confirmation {
            self.migration_check.as_ref()
        } else {
            None
        }
    }
}

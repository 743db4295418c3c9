//! Descriptor -> validator compilation.
//!
//! Every descriptor compiles to a [`FieldRule`]. All rules accept `null`
//! (an intentionally cleared setting) and every field is optional at the
//! schema level, so omitting a key is always valid.

use indexmap::IndexMap;
use regex::Regex;
use serde_json::Value;

use crate::model::{FieldDescriptor, FieldType, PluginConfig};
use crate::{SchemaError, Values};

const PATTERN_FALLBACK_MESSAGE: &str = "Invalid format";

/// Inclusive numeric bounds; `None` leaves that side open.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct NumericBounds {
    pub min: Option<f64>,
    pub max: Option<f64>,
}

impl NumericBounds {
    fn check(&self, n: f64) -> Result<(), String> {
        if let Some(min) = self.min.filter(|&min| n < min) {
            return Err(format!("Must be at least {min}"));
        }
        if let Some(max) = self.max.filter(|&max| n > max) {
            return Err(format!("Must be at most {max}"));
        }
        Ok(())
    }
}

/// Constraints for free-text fields.
#[derive(Debug, Clone)]
pub struct TextRule {
    pub min_length: Option<usize>,
    pub max_length: Option<usize>,
    pattern: Option<Regex>,
    pattern_error: Option<String>,
}

impl TextRule {
    fn check(&self, s: &str) -> Result<(), String> {
        let len = s.chars().count();
        if let Some(min) = self.min_length.filter(|&min| len < min) {
            return Err(format!("Must be at least {min} characters"));
        }
        if let Some(max) = self.max_length.filter(|&max| len > max) {
            return Err(format!("Must be at most {max} characters"));
        }
        if self.pattern.as_ref().is_some_and(|re| !re.is_match(s)) {
            return Err(self
                .pattern_error
                .clone()
                .unwrap_or_else(|| PATTERN_FALLBACK_MESSAGE.to_string()));
        }
        Ok(())
    }
}

/// Compiled per-field validator, one variant per field type.
#[derive(Debug, Clone)]
pub enum FieldRule {
    Boolean,
    Integer(NumericBounds),
    Float(NumericBounds),
    MultiSelect,
    Text(TextRule),
}

impl FieldRule {
    /// Compile a descriptor into its rule.
    pub fn compile(descriptor: &FieldDescriptor) -> Result<Self, SchemaError> {
        let v = descriptor.validation.clone().unwrap_or_default();
        let key = &descriptor.key;

        let rule = match descriptor.field_type {
            FieldType::Boolean => Self::Boolean,
            FieldType::Integer | FieldType::Float => {
                if let (Some(min), Some(max)) = (v.min_value, v.max_value) {
                    if min > max {
                        return Err(SchemaError::InvertedValueBounds {
                            key: key.clone(),
                            min,
                            max,
                        });
                    }
                }
                let bounds = NumericBounds {
                    min: v.min_value,
                    max: v.max_value,
                };
                if descriptor.field_type == FieldType::Integer {
                    Self::Integer(bounds)
                } else {
                    Self::Float(bounds)
                }
            }
            FieldType::Multiselect => Self::MultiSelect,
            FieldType::String => {
                if let (Some(min), Some(max)) = (v.min_length, v.max_length) {
                    if min > max {
                        return Err(SchemaError::InvertedLengthBounds {
                            key: key.clone(),
                            min,
                            max,
                        });
                    }
                }
                let pattern = v
                    .pattern
                    .as_deref()
                    .map(|p| {
                        Regex::new(&format!("^(?:{p})$")).map_err(|source| {
                            SchemaError::InvalidPattern {
                                key: key.clone(),
                                source,
                            }
                        })
                    })
                    .transpose()?;
                Self::Text(TextRule {
                    min_length: v.min_length,
                    max_length: v.max_length,
                    pattern,
                    pattern_error: v.pattern_error,
                })
            }
        };
        Ok(rule)
    }

    /// Check a single value. `null` is always accepted.
    pub fn check(&self, value: &Value) -> Result<(), String> {
        if value.is_null() {
            return Ok(());
        }
        match self {
            Self::Boolean => match value {
                Value::Bool(_) => Ok(()),
                _ => Err("Expected true or false".into()),
            },
            Self::Integer(bounds) => {
                let n = value.as_f64().ok_or("Expected a number")?;
                if n.fract() != 0.0 {
                    return Err("Expected a whole number".into());
                }
                bounds.check(n)
            }
            Self::Float(bounds) => {
                let n = value.as_f64().ok_or("Expected a number")?;
                bounds.check(n)
            }
            Self::MultiSelect => {
                let items = value.as_array().ok_or("Expected a list of values")?;
                if items.iter().all(|i| i.is_string() || i.is_number()) {
                    Ok(())
                } else {
                    Err("List items must be text or numbers".into())
                }
            }
            Self::Text(rule) => {
                let s = value.as_str().ok_or("Expected text")?;
                rule.check(s)
            }
        }
    }
}

/// One compiled field: its rule plus the values forms are seeded with.
#[derive(Debug, Clone)]
pub struct CompiledField {
    pub key: String,
    pub field_type: FieldType,
    pub rule: FieldRule,
    /// The descriptor's declared default (target of reset-to-defaults).
    pub default_value: Value,
    /// `current ?? default`: what the form starts with.
    pub initial_value: Value,
}

/// Per-field validation failures, keyed by setting key.
#[derive(Debug, Clone, Default, PartialEq, thiserror::Error)]
#[error("{} setting(s) failed validation", .errors.len())]
pub struct ValidationErrors {
    errors: IndexMap<String, String>,
}

impl ValidationErrors {
    pub fn get(&self, key: &str) -> Option<&str> {
        self.errors.get(key).map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.errors.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Validator plus defaults compiled from an ordered descriptor list.
#[derive(Debug, Clone, Default)]
pub struct CompiledSchema {
    fields: IndexMap<String, CompiledField>,
}

impl CompiledSchema {
    /// Schema with no fields; accepts any object.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Compile `(descriptor, persisted value)` pairs.
    ///
    /// The persisted value wins over the descriptor default whenever it is
    /// present and non-null, including `0`, `false` and `""`.
    pub fn compile<'a, I>(entries: I) -> Result<Self, SchemaError>
    where
        I: IntoIterator<Item = (&'a FieldDescriptor, Option<&'a Value>)>,
    {
        let mut fields = IndexMap::new();
        for (descriptor, current) in entries {
            if fields.contains_key(&descriptor.key) {
                return Err(SchemaError::DuplicateKey(descriptor.key.clone()));
            }
            let rule = FieldRule::compile(descriptor)?;
            let initial_value = match current {
                Some(v) if !v.is_null() => v.clone(),
                _ => descriptor.default_value.clone(),
            };
            fields.insert(
                descriptor.key.clone(),
                CompiledField {
                    key: descriptor.key.clone(),
                    field_type: descriptor.field_type,
                    rule,
                    default_value: descriptor.default_value.clone(),
                    initial_value,
                },
            );
        }
        tracing::debug!(fields = fields.len(), "Compiled settings schema");
        Ok(Self { fields })
    }

    /// Compile a category's flat settings list (`value` carries the current value).
    pub fn from_settings(settings: &[FieldDescriptor]) -> Result<Self, SchemaError> {
        if settings.is_empty() {
            return Ok(Self::empty());
        }
        Self::compile(settings.iter().map(|d| (d, d.value.as_ref())))
    }

    /// Compile a plugin's sections (`config[key]` carries the current value).
    pub fn from_plugin(plugin: &PluginConfig) -> Result<Self, SchemaError> {
        if plugin.fields().next().is_none() {
            return Ok(Self::empty());
        }
        Self::compile(plugin.fields().map(|d| (d, plugin.config.get(&d.key))))
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.fields.contains_key(key)
    }

    pub fn field(&self, key: &str) -> Option<&CompiledField> {
        self.fields.get(key)
    }

    pub fn fields(&self) -> impl Iterator<Item = &CompiledField> {
        self.fields.values()
    }

    /// Initial form values keyed by setting key.
    pub fn defaults(&self) -> Values {
        self.fields
            .values()
            .map(|f| (f.key.clone(), f.initial_value.clone()))
            .collect()
    }

    /// Validate a single field. Unknown keys are ignored.
    pub fn validate_field(&self, key: &str, value: &Value) -> Result<(), String> {
        match self.fields.get(key) {
            Some(field) => field.rule.check(value),
            None => Ok(()),
        }
    }

    /// Validate a submitted values object.
    ///
    /// Missing keys pass; keys the schema does not know are ignored.
    pub fn validate(&self, values: &Values) -> Result<(), ValidationErrors> {
        let mut errors = IndexMap::new();
        for (key, value) in values {
            if let Err(msg) = self.validate_field(key, value) {
                errors.insert(key.clone(), msg);
            }
        }
        if errors.is_empty() {
            Ok(())
        } else {
            Err(ValidationErrors { errors })
        }
    }
}

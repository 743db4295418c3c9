//! Settings schema and diff engine for the Heracles management console.
//!
//! Turns server-declared field descriptors into a compiled validator plus
//! default values, tracks edited form values against the last saved
//! baseline, derives the minimal change set on submit, and gates
//! RDN-changing plugin updates behind an explicit user confirmation.

pub mod compiler;
pub mod confirmation;
pub mod diff;
pub mod form;
pub mod model;

#[cfg(test)]
mod tests;

// Re-exports for convenience
pub use compiler::{CompiledField, CompiledSchema, FieldRule, ValidationErrors};
pub use confirmation::{
    ConfirmationGate, ConfirmationPrompt, GateError, GateEvent, GateState, PendingSubmission,
    Resolution,
};
pub use diff::{ChangeSet, compute_changes, values_equal};
pub use form::{FormError, SettingsForm};
pub use model::{
    Change, ConfigCategory, ConfigSection, FieldDescriptor, FieldType, MigrationMode,
    PluginConfig, PluginUpdateRequest, PluginUpdateResponse, RdnChangeCheck, SelectOption,
    SettingUpdateRequest, Validation,
};

/// Ordered `key -> value` map used for form values, defaults and plugin config.
///
/// Iteration order follows the descriptor order, which is also the order
/// changes are emitted and applied in.
pub type Values = indexmap::IndexMap<String, serde_json::Value>;

/// Errors raised while compiling descriptors into a schema.
///
/// These are configuration-authoring errors: the panel that owns the
/// descriptors cannot be rendered, but nothing else is affected.
#[derive(Debug, thiserror::Error)]
pub enum SchemaError {
    #[error("invalid validation pattern for '{key}': {source}")]
    InvalidPattern {
        key: String,
        #[source]
        source: regex::Error,
    },

    #[error("duplicate setting key '{0}'")]
    DuplicateKey(String),

    #[error("setting '{key}' has minValue {min} greater than maxValue {max}")]
    InvertedValueBounds { key: String, min: f64, max: f64 },

    #[error("setting '{key}' has minLength {min} greater than maxLength {max}")]
    InvertedLengthBounds { key: String, min: usize, max: usize },
}

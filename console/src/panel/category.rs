use serde_json::Value;
use settings_engine::{ConfigCategory, FieldDescriptor, SettingsForm};

use super::{PanelError, SaveOutcome, SettingsBackend};

/// Form for one settings category. Each changed setting is written with its
/// own request.
#[derive(Debug)]
pub struct CategoryPanel {
    name: String,
    label: String,
    description: Option<String>,
    descriptors: Vec<FieldDescriptor>,
    form: SettingsForm,
}

impl CategoryPanel {
    pub async fn load<B: SettingsBackend>(backend: &B, name: &str) -> Result<Self, PanelError> {
        let category = backend.get_category(name).await?;
        Self::from_category(category)
    }

    pub fn from_category(category: ConfigCategory) -> Result<Self, PanelError> {
        let form = SettingsForm::for_category(&category.settings)?;
        Ok(Self {
            name: category.name,
            label: category.label,
            description: category.description,
            descriptors: category.settings,
            form,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn descriptors(&self) -> &[FieldDescriptor] {
        &self.descriptors
    }

    pub fn form(&self) -> &SettingsForm {
        &self.form
    }

    pub fn edit(&mut self, key: &str, value: Value) -> Result<(), PanelError> {
        Ok(self.form.set(key, value)?)
    }

    pub fn edit_input(&mut self, key: &str, raw: &str) -> Result<(), PanelError> {
        Ok(self.form.set_input(key, raw)?)
    }

    pub fn reset_to_defaults(&mut self) {
        self.form.reset_to_defaults();
    }

    pub fn discard(&mut self) {
        self.form.discard();
    }

    /// Send every changed setting in order.
    ///
    /// Stops at the first rejected write. Settings written before it stay
    /// committed; the rejected one and everything after it remain edited.
    pub async fn save<B: SettingsBackend>(&mut self, backend: &B) -> Result<SaveOutcome, PanelError> {
        self.form.validate()?;
        let changes = self.form.changes();
        if changes.is_empty() {
            self.form.mark_saved();
            return Ok(SaveOutcome::Unchanged);
        }

        for change in &changes {
            if let Err(e) = backend
                .update_setting(&self.name, &change.key, &change.value)
                .await
            {
                tracing::warn!(
                    category = %self.name,
                    key = %change.key,
                    error = %e,
                    "Setting update rejected"
                );
                return Err(e.into());
            }
            self.form.commit_change(change);
        }

        self.form.mark_saved();
        tracing::info!(category = %self.name, count = changes.len(), "Category settings saved");
        Ok(SaveOutcome::Applied(changes.len()))
    }
}

use serde_json::Value;
use settings_engine::{
    ConfigSection, ConfirmationGate, ConfirmationPrompt, PluginConfig, PluginUpdateRequest,
    Resolution, SettingsForm,
};

use super::{PanelError, SaveOutcome, SettingsBackend};

/// Form for one plugin's configuration, with the RDN confirmation gate.
#[derive(Debug)]
pub struct PluginPanel {
    plugin: PluginConfig,
    form: SettingsForm,
    gate: ConfirmationGate,
}

impl PluginPanel {
    pub async fn load<B: SettingsBackend>(backend: &B, name: &str) -> Result<Self, PanelError> {
        let plugin = backend.get_plugin(name).await?;
        Self::from_plugin(plugin)
    }

    pub fn from_plugin(plugin: PluginConfig) -> Result<Self, PanelError> {
        let form = SettingsForm::for_plugin(&plugin)?;
        Ok(Self {
            plugin,
            form,
            gate: ConfirmationGate::new(),
        })
    }

    pub fn plugin(&self) -> &PluginConfig {
        &self.plugin
    }

    pub fn name(&self) -> &str {
        &self.plugin.name
    }

    pub fn is_enabled(&self) -> bool {
        self.plugin.enabled
    }

    pub fn form(&self) -> &SettingsForm {
        &self.form
    }

    pub fn gate(&self) -> &ConfirmationGate {
        &self.gate
    }

    /// Sections to render. A disabled plugin shows none.
    pub fn visible_sections(&self) -> &[ConfigSection] {
        if self.plugin.enabled {
            &self.plugin.sections
        } else {
            &[]
        }
    }

    /// The open confirmation dialog, if any.
    pub fn prompt(&self) -> Option<ConfirmationPrompt> {
        self.gate.prompt()
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

    pub fn reset_section_to_defaults(&mut self, section: &str) -> Result<(), PanelError> {
        Ok(self.form.reset_section_to_defaults(section)?)
    }

    pub fn discard(&mut self) {
        self.form.discard();
    }

    /// Flip the enabled flag. Form values are left alone.
    pub async fn toggle_enabled<B: SettingsBackend>(&mut self, backend: &B) -> Result<bool, PanelError> {
        let enabled = !self.plugin.enabled;
        backend.set_plugin_enabled(&self.plugin.name, enabled).await?;
        self.plugin.enabled = enabled;
        tracing::info!(plugin = %self.plugin.name, enabled, "Plugin toggled");
        Ok(enabled)
    }

    /// Submit the changed config as one request.
    ///
    /// Rejected while a confirmation is pending; confirm or cancel it first.
    pub async fn save<B: SettingsBackend>(&mut self, backend: &B) -> Result<SaveOutcome, PanelError> {
        self.gate.ensure_can_submit()?;
        self.form.validate()?;
        let changes = self.form.changes();
        if changes.is_empty() {
            self.form.mark_saved();
            return Ok(SaveOutcome::Unchanged);
        }
        let request = self.gate.submit(changes)?;
        self.send(backend, request).await
    }

    /// Resubmit the pending change set with the user's migration choice.
    pub async fn confirm<B: SettingsBackend>(
        &mut self,
        backend: &B,
        migrate: bool,
    ) -> Result<SaveOutcome, PanelError> {
        let request = self.gate.confirm(migrate)?;
        self.send(backend, request).await
    }

    /// Close the confirmation dialog. Edits are kept.
    pub fn cancel(&mut self) -> Result<(), PanelError> {
        Ok(self.gate.cancel()?)
    }

    async fn send<B: SettingsBackend>(
        &mut self,
        backend: &B,
        request: PluginUpdateRequest,
    ) -> Result<SaveOutcome, PanelError> {
        let response = match backend
            .update_plugin_config(&self.plugin.name, &request)
            .await
        {
            Ok(response) => response,
            Err(e) => {
                tracing::warn!(plugin = %self.plugin.name, error = %e, "Plugin config update failed");
                self.gate.fail()?;
                return Err(e.into());
            }
        };

        if let Some(message) = &response.message {
            tracing::debug!(plugin = %self.plugin.name, %message, "Plugin config response");
        }

        match self.gate.respond(response)? {
            // Only the keys the server accepted become saved; edits made while
            // the dialog was open stay pending.
            Resolution::Applied(applied) => {
                self.form.commit(&applied);
                for change in &applied {
                    self.plugin
                        .config
                        .insert(change.key.clone(), change.value.clone());
                }
                tracing::info!(
                    plugin = %self.plugin.name,
                    count = applied.len(),
                    confirmed = request.confirmed,
                    "Plugin config saved"
                );
                Ok(SaveOutcome::Applied(applied.len()))
            }
            Resolution::NeedsConfirmation(prompt) => {
                tracing::info!(
                    plugin = %self.plugin.name,
                    entries = prompt.check.entries_count,
                    "RDN change requires confirmation"
                );
                Ok(SaveOutcome::NeedsConfirmation(prompt))
            }
        }
    }
}

//! Settings panels: category settings and plugin configuration.
//!
//! A panel owns the form state for exactly one category or plugin. Opening
//! another one replaces the panel object with a freshly fetched one; nothing
//! carries over between panels.

mod category;
mod plugin;

#[cfg(test)]
mod tests;

use std::future::Future;

use heracles_client::{HeraclesApiClient, HeraclesError};
use serde_json::Value;
use settings_engine::{
    ConfigCategory, ConfirmationPrompt, FormError, GateError, PluginConfig, PluginUpdateRequest,
    PluginUpdateResponse, SchemaError, ValidationErrors,
};

use crate::notices::Notices;

pub use category::CategoryPanel;
pub use plugin::PluginPanel;

/// The API operations panels need.
pub trait SettingsBackend {
    fn list_categories(
        &self,
    ) -> impl Future<Output = Result<Vec<ConfigCategory>, HeraclesError>> + Send;

    fn get_category(
        &self,
        name: &str,
    ) -> impl Future<Output = Result<ConfigCategory, HeraclesError>> + Send;

    fn update_setting(
        &self,
        category: &str,
        key: &str,
        value: &Value,
    ) -> impl Future<Output = Result<(), HeraclesError>> + Send;

    fn list_plugins(&self) -> impl Future<Output = Result<Vec<PluginConfig>, HeraclesError>> + Send;

    fn get_plugin(&self, name: &str) -> impl Future<Output = Result<PluginConfig, HeraclesError>> + Send;

    fn update_plugin_config(
        &self,
        name: &str,
        request: &PluginUpdateRequest,
    ) -> impl Future<Output = Result<PluginUpdateResponse, HeraclesError>> + Send;

    fn set_plugin_enabled(
        &self,
        name: &str,
        enabled: bool,
    ) -> impl Future<Output = Result<(), HeraclesError>> + Send;
}

impl SettingsBackend for HeraclesApiClient {
    async fn list_categories(&self) -> Result<Vec<ConfigCategory>, HeraclesError> {
        HeraclesApiClient::list_categories(self).await
    }

    async fn get_category(&self, name: &str) -> Result<ConfigCategory, HeraclesError> {
        HeraclesApiClient::get_category(self, name).await
    }

    async fn update_setting(
        &self,
        category: &str,
        key: &str,
        value: &Value,
    ) -> Result<(), HeraclesError> {
        HeraclesApiClient::update_setting(self, category, key, value).await
    }

    async fn list_plugins(&self) -> Result<Vec<PluginConfig>, HeraclesError> {
        HeraclesApiClient::list_plugins(self).await
    }

    async fn get_plugin(&self, name: &str) -> Result<PluginConfig, HeraclesError> {
        HeraclesApiClient::get_plugin(self, name).await
    }

    async fn update_plugin_config(
        &self,
        name: &str,
        request: &PluginUpdateRequest,
    ) -> Result<PluginUpdateResponse, HeraclesError> {
        HeraclesApiClient::update_plugin_config(self, name, request).await
    }

    async fn set_plugin_enabled(&self, name: &str, enabled: bool) -> Result<(), HeraclesError> {
        HeraclesApiClient::set_plugin_enabled(self, name, enabled).await
    }
}

/// Errors scoped to a single panel; none of them are fatal to the console.
#[derive(Debug, thiserror::Error)]
pub enum PanelError {
    #[error("cannot render settings: {0}")]
    Schema(#[from] SchemaError),

    #[error(transparent)]
    Validation(#[from] ValidationErrors),

    #[error(transparent)]
    Form(#[from] FormError),

    #[error(transparent)]
    Gate(#[from] GateError),

    #[error("request failed: {0}")]
    Backend(#[from] HeraclesError),

    #[error("no settings panel is open")]
    NoActivePanel,

    #[error("the open panel does not support this action")]
    WrongPanel,
}

/// Result of a save or confirmation.
#[derive(Debug, Clone, PartialEq)]
pub enum SaveOutcome {
    /// No field differs from its recorded value; nothing was sent.
    Unchanged,
    /// Number of settings the server accepted.
    Applied(usize),
    /// The server wants the user to confirm an RDN migration first.
    NeedsConfirmation(ConfirmationPrompt),
}

/// The panel currently open.
#[derive(Debug)]
pub enum ActivePanel {
    Category(CategoryPanel),
    Plugin(PluginPanel),
}

/// Owns the backend, user notices and at most one open panel.
pub struct SettingsConsole<B> {
    backend: B,
    active: Option<ActivePanel>,
    notices: Notices,
}

impl<B: SettingsBackend> SettingsConsole<B> {
    pub fn new(backend: B) -> Self {
        Self {
            backend,
            active: None,
            notices: Notices::default(),
        }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn notices(&self) -> &Notices {
        &self.notices
    }

    pub fn notices_mut(&mut self) -> &mut Notices {
        &mut self.notices
    }

    pub fn active(&self) -> Option<&ActivePanel> {
        self.active.as_ref()
    }

    pub fn category(&self) -> Option<&CategoryPanel> {
        match &self.active {
            Some(ActivePanel::Category(p)) => Some(p),
            _ => None,
        }
    }

    pub fn category_mut(&mut self) -> Option<&mut CategoryPanel> {
        match &mut self.active {
            Some(ActivePanel::Category(p)) => Some(p),
            _ => None,
        }
    }

    pub fn plugin(&self) -> Option<&PluginPanel> {
        match &self.active {
            Some(ActivePanel::Plugin(p)) => Some(p),
            _ => None,
        }
    }

    pub fn plugin_mut(&mut self) -> Option<&mut PluginPanel> {
        match &mut self.active {
            Some(ActivePanel::Plugin(p)) => Some(p),
            _ => None,
        }
    }

    /// Open a category panel with a fresh fetch.
    pub async fn open_category(&mut self, name: &str) -> Result<(), PanelError> {
        self.active = None;
        match CategoryPanel::load(&self.backend, name).await {
            Ok(panel) => {
                self.active = Some(ActivePanel::Category(panel));
                Ok(())
            }
            Err(e) => {
                self.notices.error(format!("Failed to load '{name}': {e}"));
                Err(e)
            }
        }
    }

    /// Open a plugin panel with a fresh fetch.
    pub async fn open_plugin(&mut self, name: &str) -> Result<(), PanelError> {
        self.active = None;
        match PluginPanel::load(&self.backend, name).await {
            Ok(panel) => {
                self.active = Some(ActivePanel::Plugin(panel));
                Ok(())
            }
            Err(e) => {
                self.notices
                    .error(format!("Failed to load plugin '{name}': {e}"));
                Err(e)
            }
        }
    }

    pub fn close(&mut self) {
        self.active = None;
    }

    /// Save the open panel.
    pub async fn save(&mut self) -> Result<SaveOutcome, PanelError> {
        let result = match &mut self.active {
            Some(ActivePanel::Category(p)) => p.save(&self.backend).await,
            Some(ActivePanel::Plugin(p)) => p.save(&self.backend).await,
            None => Err(PanelError::NoActivePanel),
        };
        self.report(result)
    }

    /// Confirm the pending RDN migration on the open plugin panel.
    pub async fn confirm(&mut self, migrate: bool) -> Result<SaveOutcome, PanelError> {
        let result = match &mut self.active {
            Some(ActivePanel::Plugin(p)) => p.confirm(&self.backend, migrate).await,
            Some(ActivePanel::Category(_)) => Err(PanelError::WrongPanel),
            None => Err(PanelError::NoActivePanel),
        };
        self.report(result)
    }

    /// Dismiss the confirmation dialog without contacting the server.
    pub fn cancel(&mut self) -> Result<(), PanelError> {
        match &mut self.active {
            Some(ActivePanel::Plugin(p)) => p.cancel(),
            Some(ActivePanel::Category(_)) => Err(PanelError::WrongPanel),
            None => Err(PanelError::NoActivePanel),
        }
    }

    /// Flip the open plugin's enabled flag.
    pub async fn toggle_plugin(&mut self) -> Result<bool, PanelError> {
        let result = match &mut self.active {
            Some(ActivePanel::Plugin(p)) => p.toggle_enabled(&self.backend).await,
            Some(ActivePanel::Category(_)) => Err(PanelError::WrongPanel),
            None => Err(PanelError::NoActivePanel),
        };
        match &result {
            Ok(true) => self.notices.success("Plugin enabled"),
            Ok(false) => self.notices.success("Plugin disabled"),
            Err(e) => self.notices.error(format!("Failed to toggle plugin: {e}")),
        }
        result
    }

    fn report(
        &mut self,
        result: Result<SaveOutcome, PanelError>,
    ) -> Result<SaveOutcome, PanelError> {
        match &result {
            Ok(SaveOutcome::Applied(n)) => self.notices.success(format!("Saved {n} setting(s)")),
            Ok(SaveOutcome::Unchanged) => self.notices.info("No changes to save"),
            Ok(SaveOutcome::NeedsConfirmation(_)) => {}
            // Shown inline next to the fields.
            Err(PanelError::Validation(_)) => {}
            Err(e) => self.notices.error(format!("Failed to save settings: {e}")),
        }
        result
    }
}

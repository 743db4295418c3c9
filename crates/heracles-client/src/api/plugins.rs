use settings_engine::{PluginConfig, PluginUpdateRequest, PluginUpdateResponse};

use super::request::decode_or_default;
use super::*;

impl HeraclesApiClient {
    /// List installed plugins with their sections and config.
    pub async fn list_plugins(&self) -> Result<Vec<PluginConfig>, HeraclesError> {
        let url = self.endpoint(&["config", "plugins"])?;
        self.get_json(url).await
    }

    /// Fetch one plugin's sections and persisted config.
    pub async fn get_plugin(&self, name: &str) -> Result<PluginConfig, HeraclesError> {
        let url = self.endpoint(&["config", "plugins", name])?;
        self.get_json(url).await
    }

    /// Send changed config keys plus the confirmation control flags.
    ///
    /// A `requiresConfirmation` answer is returned as data, not as an error.
    pub async fn update_plugin_config(
        &self,
        name: &str,
        request: &PluginUpdateRequest,
    ) -> Result<PluginUpdateResponse, HeraclesError> {
        let url = self.endpoint(&["config", "plugins", name])?;
        let body = self.patch(url, request).await?;
        let resp: PluginUpdateResponse = decode_or_default(&body)?;
        if resp.pending_check().is_some() {
            tracing::info!(plugin = name, "Plugin update requires confirmation");
        } else {
            tracing::info!(
                plugin = name,
                keys = request.config.len(),
                confirmed = request.confirmed,
                "Plugin config updated"
            );
        }
        Ok(resp)
    }

    /// Enable or disable a plugin. The body is the bare boolean.
    pub async fn set_plugin_enabled(&self, name: &str, enabled: bool) -> Result<(), HeraclesError> {
        let url = self.endpoint(&["config", "plugins", name, "toggle"])?;
        self.post(url, &enabled).await?;
        tracing::info!(plugin = name, enabled, "Plugin toggled");
        Ok(())
    }
}

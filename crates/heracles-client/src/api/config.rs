use serde_json::Value;
use settings_engine::{ConfigCategory, SettingUpdateRequest};

use super::*;

impl HeraclesApiClient {
    /// List every settings category with its descriptors.
    pub async fn list_categories(&self) -> Result<Vec<ConfigCategory>, HeraclesError> {
        let url = self.endpoint(&["config"])?;
        self.get_json(url).await
    }

    /// Fetch one category's settings, always fresh.
    pub async fn get_category(&self, name: &str) -> Result<ConfigCategory, HeraclesError> {
        let url = self.endpoint(&["config", name])?;
        let mut category: ConfigCategory = self.get_json(url).await?;
        if category.name.is_empty() {
            category.name = name.to_string();
        }
        Ok(category)
    }

    /// Update a single setting in a category.
    pub async fn update_setting(
        &self,
        category: &str,
        key: &str,
        value: &Value,
    ) -> Result<(), HeraclesError> {
        let url = self.endpoint(&["config", category, key])?;
        let body = SettingUpdateRequest {
            value: value.clone(),
        };
        self.patch(url, &body).await?;
        tracing::info!(category, key, "Setting updated");
        Ok(())
    }
}

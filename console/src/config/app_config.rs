//! Runtime console configuration loaded from the environment.

use super::ConfigError;
use super::defaults::{API_TOKEN, API_URL, DEFAULT_SETTINGS};
use super::validation::validate_setting;

/// Runtime configuration for connecting to the Heracles API.
#[derive(Clone)]
pub struct ConsoleConfig {
    pub api_base_url: String,
    pub api_token: Option<String>,
}

impl std::fmt::Debug for ConsoleConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConsoleConfig")
            .field("api_base_url", &self.api_base_url)
            .field("api_token", &self.api_token.as_ref().map(|_| "***"))
            .finish()
    }
}

impl Default for ConsoleConfig {
    fn default() -> Self {
        Self {
            api_base_url: heracles_client::api::DEFAULT_BASE_URL.into(),
            api_token: None,
        }
    }
}

impl ConsoleConfig {
    /// Load configuration from process environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary key lookup.
    ///
    /// Missing or empty values fall back to their defaults; present values
    /// must pass validation.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let g = |key: &'static str| -> Result<String, ConfigError> {
            let value = lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
                .unwrap_or_else(|| {
                    DEFAULT_SETTINGS
                        .get(key)
                        .map_or(String::new(), |d| d.default.to_string())
                });
            validate_setting(key, &value)
                .map_err(|message| ConfigError::Invalid { key, message })?;
            Ok(value)
        };

        let api_base_url = g(API_URL)?;
        let api_token = Some(g(API_TOKEN)?).filter(|t| !t.is_empty());

        tracing::debug!(api_base_url = %api_base_url, has_token = api_token.is_some(), "Loaded console config");

        Ok(Self {
            api_base_url,
            api_token,
        })
    }
}

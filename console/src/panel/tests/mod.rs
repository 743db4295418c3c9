
use std::collections::VecDeque;
use std::sync::Mutex;

use heracles_client::HeraclesError;
use serde_json::{Value, json};
use settings_engine::{
    ConfigCategory, PluginConfig, PluginUpdateRequest, PluginUpdateResponse,
};

use super::SettingsBackend;

/// Requests seen by [`FakeBackend`], in order.
#[derive(Debug, Clone, PartialEq)]
pub(super) enum Call {
    GetCategory(String),
    UpdateSetting {
        category: String,
        key: String,
        value: Value,
    },
    GetPlugin(String),
    UpdatePlugin {
        name: String,
        request: PluginUpdateRequest,
    },
    SetEnabled {
        name: String,
        enabled: bool,
    },
}

/// In-memory backend with scripted failures and plugin responses.
#[derive(Default)]
pub(super) struct FakeBackend {
    categories: Vec<ConfigCategory>,
    plugins: Vec<PluginConfig>,
    calls: Mutex<Vec<Call>>,
    /// Setting keys whose update is rejected with a 422.
    reject_keys: Vec<String>,
    plugin_responses: Mutex<VecDeque<Result<PluginUpdateResponse, HeraclesError>>>,
    fail_toggle: bool,
}

impl FakeBackend {
    pub(super) fn with_category(mut self, category: ConfigCategory) -> Self {
        self.categories.push(category);
        self
    }

    pub(super) fn with_plugin(mut self, plugin: PluginConfig) -> Self {
        self.plugins.push(plugin);
        self
    }

    pub(super) fn rejecting(mut self, key: &str) -> Self {
        self.reject_keys.push(key.to_string());
        self
    }

    pub(super) fn failing_toggle(mut self) -> Self {
        self.fail_toggle = true;
        self
    }

    pub(super) fn respond_with(self, response: Result<PluginUpdateResponse, HeraclesError>) -> Self {
        self.plugin_responses.lock().unwrap().push_back(response);
        self
    }

    pub(super) fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }
}

fn not_found(what: &str) -> HeraclesError {
    HeraclesError::ApiError {
        status: 404,
        message: format!("{what} not found"),
    }
}

impl SettingsBackend for FakeBackend {
    async fn list_categories(&self) -> Result<Vec<ConfigCategory>, HeraclesError> {
        Ok(self.categories.clone())
    }

    async fn get_category(&self, name: &str) -> Result<ConfigCategory, HeraclesError> {
        self.record(Call::GetCategory(name.to_string()));
        self.categories
            .iter()
            .find(|c| c.name == name)
            .cloned()
            .ok_or_else(|| not_found(name))
    }

    async fn update_setting(
        &self,
        category: &str,
        key: &str,
        value: &Value,
    ) -> Result<(), HeraclesError> {
        self.record(Call::UpdateSetting {
            category: category.to_string(),
            key: key.to_string(),
            value: value.clone(),
        });
        if self.reject_keys.iter().any(|k| k == key) {
            return Err(HeraclesError::ApiError {
                status: 422,
                message: format!("{key} rejected"),
            });
        }
        Ok(())
    }

    async fn list_plugins(&self) -> Result<Vec<PluginConfig>, HeraclesError> {
        Ok(self.plugins.clone())
    }

    async fn get_plugin(&self, name: &str) -> Result<PluginConfig, HeraclesError> {
        self.record(Call::GetPlugin(name.to_string()));
        self.plugins
            .iter()
            .find(|p| p.name == name)
            .cloned()
            .ok_or_else(|| not_found(name))
    }

    async fn update_plugin_config(
        &self,
        name: &str,
        request: &PluginUpdateRequest,
    ) -> Result<PluginUpdateResponse, HeraclesError> {
        self.record(Call::UpdatePlugin {
            name: name.to_string(),
            request: request.clone(),
        });
        let scripted = self.plugin_responses.lock().unwrap().pop_front();
        scripted.unwrap_or_else(|| Ok(PluginUpdateResponse::default()))
    }

    async fn set_plugin_enabled(&self, name: &str, enabled: bool) -> Result<(), HeraclesError> {
        self.record(Call::SetEnabled {
            name: name.to_string(),
            enabled,
        });
        if self.fail_toggle {
            return Err(HeraclesError::ApiError {
                status: 500,
                message: "toggle failed".into(),
            });
        }
        Ok(())
    }
}

pub(super) fn ldap_category() -> ConfigCategory {
    serde_json::from_value(json!({
        "name": "ldap",
        "label": "LDAP",
        "settings": [
            {"key": "timeout", "label": "Timeout", "fieldType": "integer",
             "defaultValue": 10, "value": 30,
             "validation": {"minValue": 1, "maxValue": 300}},
            {"key": "page_size", "label": "Page size", "fieldType": "integer",
             "defaultValue": 500, "value": 500},
            {"key": "base_dn", "label": "Base DN", "fieldType": "string",
             "defaultValue": "dc=example,dc=org", "value": "dc=example,dc=org",
             "validation": {"minLength": 3}}
        ]
    }))
    .unwrap()
}

pub(super) fn posix_plugin() -> PluginConfig {
    serde_json::from_value(json!({
        "name": "posix",
        "version": "1.2.0",
        "description": "POSIX accounts and groups",
        "enabled": true,
        "sections": [
            {"id": "ids", "label": "ID ranges", "fields": [
                {"key": "uid_min", "label": "Minimum UID", "fieldType": "integer",
                 "defaultValue": 10000, "validation": {"minValue": 1000, "maxValue": 65534}}
            ]},
            {"id": "naming", "label": "Naming", "fields": [
                {"key": "group_rdn", "label": "Group RDN", "fieldType": "string",
                 "defaultValue": "cn"}
            ]}
        ],
        "config": {"uid_min": 10000, "group_rdn": "cn"}
    }))
    .unwrap()
}

pub(super) fn rdn_confirmation() -> PluginUpdateResponse {
    serde_json::from_value(json!({
        "requiresConfirmation": true,
        "migrationCheck": {
            "oldRdn": "cn",
            "newRdn": "gid",
            "entriesCount": 3,
            "entriesDns": ["cn=staff,ou=groups,dc=example,dc=org"],
            "warnings": [],
            "supportsModrdn": true,
            "recommendedMode": "modrdn"
        }
    }))
    .unwrap()
}

//! Environment keys understood by the console, with their defaults.

use std::collections::HashMap;
use std::sync::LazyLock;

pub const API_URL: &str = "HERACLES_API_URL";
pub const API_TOKEN: &str = "HERACLES_API_TOKEN";

type DefTuple = (&'static str, &'static str, bool, &'static str);

const DEFS: &[DefTuple] = &[
    (
        API_URL,
        heracles_client::api::DEFAULT_BASE_URL,
        false,
        "Base URL of the Heracles REST API",
    ),
    (API_TOKEN, "", true, "Bearer token sent with every API request"),
];

/// A single environment setting definition.
#[derive(Debug, Clone)]
pub struct SettingDef {
    pub key: &'static str,
    pub default: &'static str,
    pub secret: bool,
    pub description: &'static str,
}

/// Setting definitions indexed by key.
pub static DEFAULT_SETTINGS: LazyLock<HashMap<&'static str, SettingDef>> = LazyLock::new(|| {
    DEFS.iter()
        .map(|&(key, default, secret, description)| {
            (
                key,
                SettingDef {
                    key,
                    default,
                    secret,
                    description,
                },
            )
        })
        .collect()
});

/// Setting definitions in declaration order.
pub fn all_settings() -> impl Iterator<Item = &'static SettingDef> {
    DEFS.iter().filter_map(|(key, ..)| DEFAULT_SETTINGS.get(key))
}

//! Heracles REST API client.
//!
//! Provides typed access to the config endpoints with optional Bearer
//! token injection. Requests rely on reqwest's default timeouts.

mod config;
mod plugins;
mod request;


use url::Url;

use crate::HeraclesError;

/// Default API base URL for a local Heracles backend.
pub const DEFAULT_BASE_URL: &str = "http://localhost:8000/api/v1";

/// Heracles API client with automatic auth header injection.
#[derive(Clone)]
pub struct HeraclesApiClient {
    pub(super) http: reqwest::Client,
    pub(super) base_url: Url,
    pub(super) token: Option<String>,
}

impl std::fmt::Debug for HeraclesApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HeraclesApiClient")
            .field("base_url", &self.base_url.as_str())
            .field("token", &self.token.as_ref().map(|_| "***"))
            .finish()
    }
}

impl HeraclesApiClient {
    pub fn new(base_url: &str, token: Option<String>) -> Result<Self, HeraclesError> {
        let base_url = Url::parse(base_url)?;
        if base_url.cannot_be_a_base() {
            return Err(HeraclesError::InvalidBaseUrl(base_url.to_string()));
        }
        Ok(Self {
            http: reqwest::Client::new(),
            base_url,
            token: token.filter(|t| !t.is_empty()),
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Build an endpoint URL by appending percent-encoded path segments.
    pub(super) fn endpoint(&self, segments: &[&str]) -> Result<Url, HeraclesError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| HeraclesError::InvalidBaseUrl(self.base_url.to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }
}

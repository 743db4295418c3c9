//! Heracles config API client library.
//!
//! Typed async access to the category-settings and plugin-config
//! endpoints used by the settings panels.

pub mod api;

pub use api::HeraclesApiClient;

/// Unified error type for the heracles-client crate.
#[derive(Debug, thiserror::Error)]
pub enum HeraclesError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Authentication required: missing or rejected API token")]
    AuthRequired,

    #[error("Heracles API error (status {status}): {message}")]
    ApiError { status: u16, message: String },

    #[error("URL parse error: {0}")]
    UrlParse(#[from] url::ParseError),

    #[error("Base URL cannot carry a path: {0}")]
    InvalidBaseUrl(String),
}

impl HeraclesError {
    /// HTTP status reported by the server, if the request got that far.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::AuthRequired => Some(401),
            Self::ApiError { status, .. } => Some(*status),
            Self::Http(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}

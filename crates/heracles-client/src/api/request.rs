use reqwest::{RequestBuilder, StatusCode};
use serde::Serialize;
use serde::de::DeserializeOwned;
use url::Url;

use super::*;

/// FastAPI-style error body.
#[derive(serde::Deserialize)]
struct ErrorBody {
    detail: serde_json::Value,
}

impl HeraclesApiClient {
    /// Attach the Bearer token, if one is configured.
    fn authorize(&self, req: RequestBuilder) -> RequestBuilder {
        match &self.token {
            Some(token) => req.bearer_auth(token),
            None => req,
        }
    }

    /// Send a request and return the body of a successful response.
    async fn execute(&self, req: RequestBuilder, url: &Url) -> Result<String, HeraclesError> {
        let resp = self.authorize(req).send().await?;

        let status = resp.status();
        let body = resp.text().await?;

        if status == StatusCode::UNAUTHORIZED {
            tracing::warn!(url = url.as_str(), "Got 401 from Heracles API");
            return Err(HeraclesError::AuthRequired);
        }

        if !status.is_success() {
            return Err(HeraclesError::ApiError {
                status: status.as_u16(),
                message: error_message(&body),
            });
        }

        Ok(body)
    }

    /// Execute a GET request and decode the JSON response.
    pub(super) async fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<T, HeraclesError> {
        tracing::debug!(url = url.as_str(), "GET");
        let body = self.execute(self.http.get(url.clone()), &url).await?;
        Ok(serde_json::from_str(&body)?)
    }

    /// Execute a PATCH request with a JSON body; returns the raw response body.
    pub(super) async fn patch(&self, url: Url, body: &impl Serialize) -> Result<String, HeraclesError> {
        tracing::debug!(url = url.as_str(), "PATCH");
        self.execute(self.http.patch(url.clone()).json(body), &url)
            .await
    }

    /// Execute a POST request with a JSON body; returns the raw response body.
    pub(super) async fn post(&self, url: Url, body: &impl Serialize) -> Result<String, HeraclesError> {
        tracing::debug!(url = url.as_str(), "POST");
        self.execute(self.http.post(url.clone()).json(body), &url)
            .await
    }
}

/// Prefer the server's `detail` message; fall back to the raw body.
fn error_message(body: &str) -> String {
    match serde_json::from_str::<ErrorBody>(body) {
        Ok(ErrorBody {
            detail: serde_json::Value::String(s),
        }) => s,
        Ok(ErrorBody { detail }) => detail.to_string(),
        Err(_) => body.to_string(),
    }
}

/// Decode an optional JSON body; empty bodies decode to `T::default()`.
pub(super) fn decode_or_default<T: DeserializeOwned + Default>(body: &str) -> Result<T, HeraclesError> {
    if body.trim().is_empty() {
        return Ok(T::default());
    }
    Ok(serde_json::from_str(body)?)
}

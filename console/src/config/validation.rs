//! Environment value validation.

use url::Url;

use super::defaults::{API_TOKEN, API_URL};

/// Validate a setting value. Returns `Ok(())` if valid, or an error message.
pub fn validate_setting(key: &str, value: &str) -> Result<(), String> {
    match key {
        API_URL => {
            let url = Url::parse(value).map_err(|e| format!("not a valid URL: {e}"))?;
            if url.scheme() != "http" && url.scheme() != "https" {
                return Err("must be an http or https URL".into());
            }
            if url.host_str().is_none() {
                return Err("must include a host".into());
            }
        }
        API_TOKEN => {
            if value.chars().any(char::is_whitespace) {
                return Err("must not contain whitespace".into());
            }
        }
        _ => {}
    }
    Ok(())
}

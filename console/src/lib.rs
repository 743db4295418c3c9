pub mod config;
pub mod notices;
pub mod panel;

use heracles_client::{HeraclesApiClient, HeraclesError};
use tracing_subscriber::EnvFilter;

use config::ConsoleConfig;

/// Install the fmt subscriber. `RUST_LOG` overrides the default `info` level.
pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();
}

/// Load .env from multiple candidate paths.
pub fn load_dotenv() {
    let candidates = [".env", "../.env", "../../.env"];
    for path in &candidates {
        if dotenvy::from_filename(path).is_ok() {
            tracing::debug!("Loaded .env from: {path}");
            return;
        }
    }
    tracing::debug!("No .env file found, using system environment variables");
}

/// Build the API client for a loaded configuration.
pub fn connect(config: &ConsoleConfig) -> Result<HeraclesApiClient, HeraclesError> {
    let client = HeraclesApiClient::new(&config.api_base_url, config.api_token.clone())?;
    tracing::debug!(base_url = %client.base_url(), "Heracles API client ready");
    Ok(client)
}

/// Load .env and the environment, then connect.
pub fn init_foundation() -> anyhow::Result<(ConsoleConfig, HeraclesApiClient)> {
    load_dotenv();
    let config = ConsoleConfig::from_env()?;
    let client = connect(&config)?;
    Ok((config, client))
}

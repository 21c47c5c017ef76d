//! Application configuration loaded from environment variables.
//!
//! Only process-level settings live here. The refresh token and the webhook
//! verify token are durable state owned by the config store (see `db`).

use std::env;

pub const DEFAULT_STRAVA_API_BASE: &str = "https://www.strava.com/api/v3";
pub const DEFAULT_STRAVA_TOKEN_URL: &str = "https://www.strava.com/oauth/token";

/// Application configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    /// Strava OAuth client ID (empty when unset)
    pub strava_client_id: String,
    /// Strava OAuth client secret (empty when unset)
    pub strava_client_secret: String,
    /// Strava REST API base URL
    pub strava_api_base: String,
    /// Strava OAuth token endpoint
    pub strava_token_url: String,
    /// GCP project ID (Firestore)
    pub gcp_project_id: String,
    /// Server port
    pub port: u16,
}

impl Default for Config {
    /// Default config for testing only.
    fn default() -> Self {
        Self {
            strava_client_id: "test_client_id".to_string(),
            strava_client_secret: "test_secret".to_string(),
            strava_api_base: DEFAULT_STRAVA_API_BASE.to_string(),
            strava_token_url: DEFAULT_STRAVA_TOKEN_URL.to_string(),
            gcp_project_id: "test-project".to_string(),
            port: 8080,
        }
    }
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// Missing client credentials are not an error here: the token manager
    /// reports them as an authentication failure when a refresh is attempted.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok(); // Load .env file if present

        let port = match env::var("PORT") {
            Ok(raw) => raw.trim().parse().map_err(|_| ConfigError::Invalid {
                var: "PORT",
                reason: format!("not a port number: {}", raw),
            })?,
            Err(_) => 8080,
        };

        Ok(Self {
            strava_client_id: env::var("STRAVA_CLIENT_ID")
                .map(|v| v.trim().to_string())
                .unwrap_or_default(),
            strava_client_secret: env::var("STRAVA_CLIENT_SECRET")
                .map(|v| v.trim().to_string())
                .unwrap_or_default(),
            strava_api_base: url_var("STRAVA_API_BASE", DEFAULT_STRAVA_API_BASE)?,
            strava_token_url: url_var("STRAVA_TOKEN_URL", DEFAULT_STRAVA_TOKEN_URL)?,
            gcp_project_id: env::var("GCP_PROJECT_ID").unwrap_or_else(|_| "local-dev".to_string()),
            port,
        })
    }
}

/// Read an HTTP(S) URL override, trimming any trailing slash.
fn url_var(var: &'static str, default: &str) -> Result<String, ConfigError> {
    let value = match env::var(var) {
        Ok(v) => v.trim().trim_end_matches('/').to_string(),
        Err(_) => return Ok(default.to_string()),
    };

    if !(value.starts_with("http://") || value.starts_with("https://")) {
        return Err(ConfigError::Invalid {
            var,
            reason: format!("expected an http(s) URL, got {:?}", value),
        });
    }
    Ok(value)
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid environment variable {var}: {reason}")]
    Invalid { var: &'static str, reason: String },
}

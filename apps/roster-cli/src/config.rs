//! Process configuration loaded from environment variables.

use roster_client::ApiCredentials;
use roster_provisioning::cache::DEFAULT_PAGE_SIZE;
use std::net::SocketAddr;
use std::time::Duration;

const DEFAULT_REGION: &str = "mypurecloud.com";
const DEFAULT_LISTEN_ADDR: &str = "0.0.0.0:3000";
const DEFAULT_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_LOG_FILTER: &str = "info";

/// Output format of the log subscriber.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

/// Configuration for the provisioning CLI.
#[derive(Debug, Clone)]
pub struct Config {
    /// How to obtain the bearer token for the administration API.
    pub credentials: ApiCredentials,

    /// Base URL of the administration API, without the `/api/v2` suffix.
    pub api_base_url: String,

    /// Per-request timeout for remote calls.
    pub request_timeout: Duration,

    /// Entities requested per catalog page.
    pub catalog_page_size: u32,

    /// Listen address for `serve`.
    pub listen_addr: SocketAddr,

    pub log_format: LogFormat,

    /// Filter directive used when `RUST_LOG` is unset.
    pub log_filter: String,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_reader(|key| std::env::var(key))
    }

    /// Load configuration from a custom variable reader.
    pub fn from_reader<F>(reader: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Result<String, std::env::VarError>,
    {
        let region = reader("ROSTER_REGION").unwrap_or_else(|_| DEFAULT_REGION.to_string());

        let api_base_url =
            reader("ROSTER_API_BASE_URL").unwrap_or_else(|_| format!("https://api.{region}"));

        let credentials = match reader("ROSTER_ACCESS_TOKEN") {
            Ok(token) if !token.trim().is_empty() => ApiCredentials::Bearer { token },
            _ => {
                let client_id = reader("ROSTER_CLIENT_ID")
                    .map_err(|_| ConfigError::MissingVar("ROSTER_CLIENT_ID".into()))?;
                let client_secret = reader("ROSTER_CLIENT_SECRET")
                    .map_err(|_| ConfigError::MissingVar("ROSTER_CLIENT_SECRET".into()))?;
                let token_endpoint = reader("ROSTER_TOKEN_URL")
                    .unwrap_or_else(|_| format!("https://login.{region}/oauth/token"));
                ApiCredentials::ClientCredentials {
                    client_id,
                    client_secret,
                    token_endpoint,
                }
            }
        };

        let timeout_secs = reader("ROSTER_REQUEST_TIMEOUT_SECS")
            .unwrap_or_else(|_| DEFAULT_TIMEOUT_SECS.to_string())
            .parse::<u64>()
            .map_err(|e| {
                ConfigError::InvalidValue("ROSTER_REQUEST_TIMEOUT_SECS".into(), e.to_string())
            })?;

        let catalog_page_size = reader("ROSTER_CATALOG_PAGE_SIZE")
            .unwrap_or_else(|_| DEFAULT_PAGE_SIZE.to_string())
            .parse::<u32>()
            .ok()
            .filter(|size| *size > 0)
            .ok_or_else(|| {
                ConfigError::InvalidValue(
                    "ROSTER_CATALOG_PAGE_SIZE".into(),
                    "expected a positive integer".into(),
                )
            })?;

        let listen_addr = reader("ROSTER_LISTEN_ADDR")
            .unwrap_or_else(|_| DEFAULT_LISTEN_ADDR.to_string())
            .parse::<SocketAddr>()
            .map_err(|e| ConfigError::InvalidValue("ROSTER_LISTEN_ADDR".into(), e.to_string()))?;

        let log_format = match reader("ROSTER_LOG_FORMAT")
            .unwrap_or_default()
            .to_ascii_lowercase()
            .as_str()
        {
            "" | "text" => LogFormat::Text,
            "json" => LogFormat::Json,
            other => {
                return Err(ConfigError::InvalidValue(
                    "ROSTER_LOG_FORMAT".into(),
                    format!("unknown format '{other}', expected text or json"),
                ))
            }
        };

        let log_filter = reader("ROSTER_LOG_FILTER").unwrap_or_else(|_| DEFAULT_LOG_FILTER.into());

        Ok(Self {
            credentials,
            api_base_url,
            request_timeout: Duration::from_secs(timeout_secs),
            catalog_page_size,
            listen_addr,
            log_format,
            log_filter,
        })
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingVar(String),

    #[error("invalid value for {0}: {1}")]
    InvalidValue(String, String),
}

//! Subcommand implementations.

pub mod import;
pub mod serve;

use crate::config::Config;
use crate::error::{CliError, CliResult};
use roster_client::{AdminApi, ApiAuth, HttpAdminClient};
use roster_provisioning::ProvisionSettings;
use std::sync::Arc;
use tracing::info;

/// Build the platform client and authenticate once.
///
/// Authentication failure is fatal: nothing is provisioned without a token.
pub async fn connect(config: &Config) -> CliResult<Arc<dyn AdminApi>> {
    let http_client = reqwest::Client::builder()
        .timeout(config.request_timeout)
        .user_agent(concat!("roster/", env!("CARGO_PKG_VERSION")))
        .build()
        .map_err(|e| CliError::Io(format!("failed to build HTTP client: {e}")))?;

    let auth = ApiAuth::new(config.credentials.clone(), http_client.clone());
    auth.authenticate().await?;
    info!(base_url = %config.api_base_url, "Authenticated against administration API");

    Ok(Arc::new(HttpAdminClient::with_http_client(
        config.api_base_url.clone(),
        auth,
        http_client,
    )))
}

/// Pipeline tunables derived from configuration.
pub fn settings(config: &Config) -> ProvisionSettings {
    ProvisionSettings {
        catalog_page_size: config.catalog_page_size,
        ..ProvisionSettings::default()
    }
}

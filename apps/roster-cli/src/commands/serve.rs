//! Serve command - on-demand provisioning over HTTP

use crate::commands::{connect, settings};
use crate::config::Config;
use crate::error::{CliError, CliResult};
use crate::server;
use clap::Args;
use roster_provisioning::Provisioner;
use std::net::SocketAddr;
use tracing::info;

/// Arguments for the serve command
#[derive(Args, Debug)]
pub struct ServeArgs {
    /// Listen address (overrides ROSTER_LISTEN_ADDR)
    #[arg(long)]
    pub listen: Option<SocketAddr>,
}

/// Execute the serve command
pub async fn execute(args: ServeArgs, config: &Config) -> CliResult<()> {
    let api = connect(config).await?;
    let provisioner = Provisioner::new(api, settings(config));
    let app = server::router(provisioner);

    let addr = args.listen.unwrap_or(config.listen_addr);
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| CliError::Server(format!("failed to bind {addr}: {e}")))?;
    info!(%addr, "Listening for provisioning requests");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| CliError::Server(e.to_string()))?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}

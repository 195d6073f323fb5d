//! roster - bulk and on-demand user provisioning
//!
//! Creates user accounts on the administration platform, resolves their
//! group, role, site and phone base by name, batches membership writes and
//! gives every user a soft phone bound as their default station.

use clap::{Parser, Subcommand};

mod commands;
mod config;
mod error;
mod input;
mod logging;
mod server;

use config::Config;
use error::CliResult;

/// roster - User provisioning for the contact-center platform
#[derive(Parser)]
#[command(name = "roster")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Provision every identity in a CSV file
    Import(commands::import::ImportArgs),

    /// Accept single-identity provisioning requests over HTTP
    Serve(commands::serve::ServeArgs),
}

#[tokio::main]
async fn main() {
    // A missing .env file is fine; the environment may already be set.
    let _ = dotenvy::dotenv();
    let cli = Cli::parse();

    match run(cli).await {
        Ok(()) => std::process::exit(0),
        Err(e) => {
            e.print();
            std::process::exit(e.exit_code());
        }
    }
}

async fn run(cli: Cli) -> CliResult<()> {
    let config = Config::from_env()?;
    logging::init_logging(config.log_format, &config.log_filter)?;

    match cli.command {
        Commands::Import(args) => commands::import::execute(args, &config).await,
        Commands::Serve(args) => commands::serve::execute(args, &config).await,
    }
}

//! Import command - provision every identity in a CSV file

use crate::commands::{connect, settings};
use crate::config::Config;
use crate::error::{CliError, CliResult};
use crate::input;
use clap::Args;
use roster_provisioning::{ProvisioningManifest, Provisioner};
use std::path::{Path, PathBuf};
use tracing::info;

/// Arguments for the import command
#[derive(Args, Debug)]
pub struct ImportArgs {
    /// CSV file with NAME, EMAIL, PASSWORD, GROUP, ROLE, SITENAME and PHONEBASE columns
    pub file: PathBuf,

    /// Write the full outcome manifest to this path as JSON
    #[arg(long)]
    pub report: Option<PathBuf>,

    /// Print the manifest as JSON instead of a summary
    #[arg(long)]
    pub json: bool,
}

/// Execute the import command
pub async fn execute(args: ImportArgs, config: &Config) -> CliResult<()> {
    let records = input::read_records(&args.file).await?;
    let api = connect(config).await?;
    let provisioner = Provisioner::new(api, settings(config));

    let manifest = provisioner.run_batch(records).await;

    if let Some(path) = &args.report {
        write_report(path, &manifest)?;
        info!(path = %path.display(), "Manifest written");
    }

    if args.json {
        println!("{}", serde_json::to_string_pretty(&manifest)?);
    } else {
        print_summary(&manifest);
    }

    let failures = manifest.failures().count();
    if failures > 0 {
        return Err(CliError::ProvisioningFailed(failures));
    }
    Ok(())
}

fn write_report(path: &Path, manifest: &ProvisioningManifest) -> CliResult<()> {
    let body = serde_json::to_vec_pretty(manifest)?;
    std::fs::write(path, body)
        .map_err(|e| CliError::Io(format!("{}: {e}", path.display())))
}

fn print_summary(manifest: &ProvisioningManifest) {
    println!("{}", manifest.summary());
    for (stage, subject, detail) in manifest.failures() {
        println!("  {stage:<6} {subject}: {}", detail.message);
    }
}

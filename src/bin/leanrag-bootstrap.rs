//! leanrag-bootstrap: prepare the LeanRAG Python environment.

use std::sync::Arc;

use clap::Parser;

use leanrag_db::{
    cli::{BootstrapCli, init_logging},
    config::{DatabaseConfig, InstallerConfig},
    installer::{EnvStatus, InstallOutcome, Installer, ProcessRunner},
    prompt::StdinConfirm,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = BootstrapCli::parse();

    let _ = dotenvy::dotenv();
    init_logging(false);

    let config = InstallerConfig::resolve(cli.python_version)?;
    let installer = Installer::new(config, Arc::new(ProcessRunner));

    let report = installer.run(&StdinConfirm).await?;

    println!();
    match report.env {
        EnvStatus::Created => println!("Environment created (Python {}).", report.python_version),
        EnvStatus::Reused => println!("Existing environment reused."),
    }
    if !report.failed_groups.is_empty() {
        println!("Groups that failed: {}", report.failed_groups.join(", "));
    }
    if !report.failed_imports.is_empty() {
        println!("Modules unavailable: {}", report.failed_imports.join(", "));
    }
    println!(
        "Import checks passed: {}/{}",
        report.verified, report.total
    );

    match report.outcome() {
        InstallOutcome::Complete => println!("Installation complete."),
        InstallOutcome::Partial => {
            println!("Installation partially complete. Core functionality is available.")
        }
    }

    println!();
    println!("Activate the environment with:");
    println!("  {}", installer.config().activation_hint());
    println!();
    println!("Start the database with:");
    println!("  leanrag-db start");
    println!("It will be reachable at {}", DatabaseConfig::resolve().unwrap_or_default().profile());

    Ok(())
}

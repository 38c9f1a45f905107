//! leanrag-db: manage the LeanRAG MySQL container.

use std::sync::Arc;

use clap::Parser;

use leanrag_db::{
    cli::{Cli, Command, init_logging, run_lifecycle_command},
    config::DatabaseConfig,
    lifecycle::{DockerEngine, LifecycleManager},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Completions need neither configuration nor Docker
    if let Command::Completion(completion) = &cli.command {
        return completion.run();
    }

    let _ = dotenvy::dotenv();
    init_logging(cli.verbose);

    let config = DatabaseConfig::resolve()?;
    tracing::debug!("Resolved configuration for container '{}'", config.container_name);

    let engine = Arc::new(DockerEngine::connect().await);
    let manager = LifecycleManager::new(config, engine);

    run_lifecycle_command(cli.command, &manager).await
}

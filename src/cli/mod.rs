//! CLI command handling.
//!
//! `leanrag-db` takes exactly one verb:
//! - Container lifecycle (`start`, `stop`, `restart`, `reset`)
//! - Inspection (`status`, `logs`, `connect`)
//! - Image build from the local Dockerfile (`build`)
//! - Shell completions (`completion`)
//!
//! `leanrag-bootstrap` is parsed by [`BootstrapCli`].

mod completion;

pub use completion::Completion;

use clap::{ColorChoice, Parser, Subcommand};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use crate::lifecycle::{
    DatabaseStatus, LifecycleManager, LogOptions, ResetOutcome, StartOutcome, StopOutcome,
};
use crate::prompt::StdinConfirm;

#[derive(Parser, Debug)]
#[command(name = "leanrag-db")]
#[command(about = "Manage the MySQL container used by LeanRAG")]
#[command(
    long_about = "Reconciles the LeanRAG MySQL container with Docker.\nExamples:\n  leanrag-db start   # Create or start the container and wait until it accepts connections\n  leanrag-db status  # Show whether it exists, runs, and answers"
)]
#[command(version)]
#[command(color = ColorChoice::Auto)]
#[command(arg_required_else_help = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Create or start the container and wait until MySQL answers
    Start,

    /// Stop the container, keeping it and its data
    Stop,

    /// Stop, then start
    Restart,

    /// Show whether the container exists, runs, and accepts connections
    Status,

    /// Open a MySQL shell inside the running container
    Connect,

    /// Stream the container output
    Logs {
        /// Only show the last N lines of the backlog
        #[arg(long)]
        tail: Option<usize>,

        /// Print the backlog and exit instead of following
        #[arg(long)]
        no_follow: bool,
    },

    /// Delete the container and its data volume, then start fresh
    #[command(
        long_about = "Deletes the container and its data volume after confirmation, then recreates it.\nOnly the answer 'yes' proceeds."
    )]
    Reset,

    /// Build an image from the Dockerfile in the current directory
    Build,

    /// Generate shell completion scripts
    #[command(
        about = "Generate completions",
        long_about = "Generates shell completion scripts.\nExample: leanrag-db completion --shell bash > leanrag-db.bash"
    )]
    Completion(Completion),
}

/// Install the stderr log subscriber. `RUST_LOG` wins over `verbose`.
pub fn init_logging(verbose: bool) {
    let default = if verbose {
        "leanrag_db=debug"
    } else {
        "leanrag_db=info"
    };
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .without_time()
                .with_target(false),
        )
        .init();
}

/// Run a lifecycle verb and print its result.
pub async fn run_lifecycle_command(
    command: Command,
    manager: &LifecycleManager,
) -> anyhow::Result<()> {
    let config = manager.config();

    match command {
        Command::Start => {
            let outcome = manager.start().await?;
            print_start(outcome, manager);
        }
        Command::Stop => match manager.stop().await? {
            StopOutcome::Stopped => println!("Stopped '{}'.", config.container_name),
            StopOutcome::NotRunning => println!("'{}' is not running.", config.container_name),
        },
        Command::Restart => {
            let outcome = manager.restart().await?;
            print_start(outcome, manager);
        }
        Command::Status => {
            let status = manager.status().await?;
            println!("Container '{}': {}", config.container_name, status);
            if status == DatabaseStatus::Ready {
                println!("Connection: {}", config.profile());
            }
        }
        Command::Connect => manager.connect().await?,
        Command::Logs { tail, no_follow } => {
            manager
                .logs(LogOptions {
                    follow: !no_follow,
                    tail,
                })
                .await?
        }
        Command::Reset => match manager.reset(&StdinConfirm).await? {
            ResetOutcome::Cancelled => println!("Reset cancelled. Nothing was changed."),
            ResetOutcome::Completed(report) => {
                println!(
                    "Reset complete (container: {:?}, volume: {:?}).",
                    report.container, report.volume
                );
                print_start(report.start, manager);
            }
        },
        Command::Build => {
            manager.build().await?;
            println!("Built image '{}'.", config.build_tag);
        }
        Command::Completion(completion) => completion.run()?,
    }

    Ok(())
}

fn print_start(outcome: StartOutcome, manager: &LifecycleManager) {
    let config = manager.config();
    match outcome {
        StartOutcome::AlreadyRunning => {
            println!("'{}' is already running.", config.container_name)
        }
        StartOutcome::Started => println!("Started '{}'.", config.container_name),
        StartOutcome::Created => println!("Created and started '{}'.", config.container_name),
    }
    println!("Connection: {}", config.profile());
}

/// Arguments for `leanrag-bootstrap`.
#[derive(Parser, Debug)]
#[command(name = "leanrag-bootstrap")]
#[command(about = "Create the LeanRAG Python environment and install its dependencies")]
#[command(version)]
#[command(color = ColorChoice::Auto)]
pub struct BootstrapCli {
    /// Python version for the environment [default: 3.11]
    pub python_version: Option<String>,
}

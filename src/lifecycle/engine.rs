//! The seam between lifecycle decisions and the container engine.

use std::path::Path;

use async_trait::async_trait;

use crate::config::DatabaseConfig;
use crate::lifecycle::detect::DockerStatus;
use crate::lifecycle::error::Result;
use crate::lifecycle::state::ContainerState;

/// Outcome of a best-effort removal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Removal {
    Removed,
    /// Nothing with that name existed.
    AlreadyGone,
    /// The resource still exists because something holds it (volumes only).
    InUse,
}

/// Options for `logs`.
#[derive(Debug, Clone, Copy)]
pub struct LogOptions {
    /// Keep streaming new output.
    pub follow: bool,
    /// Backlog lines to print first; `None` prints everything.
    pub tail: Option<usize>,
}

impl Default for LogOptions {
    fn default() -> Self {
        Self {
            follow: true,
            tail: None,
        }
    }
}

/// Operations the lifecycle manager needs from a container engine.
///
/// Implemented by [`crate::lifecycle::DockerEngine`] against the Docker API
/// and by [`crate::testing::FakeEngine`] in memory.
#[async_trait]
pub trait ContainerEngine: Send + Sync {
    /// Whether the engine binary and daemon are usable.
    async fn detect(&self) -> DockerStatus;

    /// Current state of the named container.
    async fn container_state(&self, name: &str) -> Result<ContainerState>;

    /// Make the configured image available, pulling it if necessary.
    async fn ensure_image(&self, config: &DatabaseConfig) -> Result<()>;

    /// Create (but do not start) the container described by `config`.
    async fn create_container(&self, config: &DatabaseConfig) -> Result<()>;

    async fn start_container(&self, name: &str) -> Result<()>;

    /// Stop a running container. Stopping a stopped container succeeds.
    async fn stop_container(&self, name: &str, timeout_secs: i64) -> Result<()>;

    async fn remove_container(&self, name: &str) -> Result<Removal>;

    async fn remove_volume(&self, name: &str) -> Result<Removal>;

    /// Run the liveness probe once. `Ok(false)` means not ready yet.
    async fn probe(&self, config: &DatabaseConfig) -> Result<bool>;

    /// The last `lines` lines of container output.
    async fn tail_logs(&self, name: &str, lines: usize) -> Result<String>;

    /// Stream container output to stdout until it ends.
    async fn stream_logs(&self, name: &str, options: LogOptions) -> Result<()>;

    /// Attach the caller's terminal to a command inside the container.
    async fn attach_shell(&self, name: &str, command: &[String]) -> Result<()>;

    /// Build an image from `context_dir` using `dockerfile`, tagged `tag`.
    async fn build_image(&self, context_dir: &Path, dockerfile: &Path, tag: &str) -> Result<()>;
}

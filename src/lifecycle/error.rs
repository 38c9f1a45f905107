//! Error types for container lifecycle management.

use std::path::PathBuf;

use thiserror::Error;

/// Result type for lifecycle operations.
pub type Result<T> = std::result::Result<T, LifecycleError>;

/// Errors that can occur while managing the database container.
#[derive(Debug, Error)]
pub enum LifecycleError {
    /// The `docker` binary is not on PATH.
    #[error("Docker is not installed. {hint}")]
    DockerNotInstalled {
        /// Platform-specific install instructions.
        hint: String,
    },

    /// The binary exists but the daemon does not answer.
    #[error("Docker daemon is not running. {hint}")]
    DockerNotRunning {
        /// Platform-specific start instructions.
        hint: String,
    },

    /// `build` was run outside a directory with a build definition.
    #[error("Build definition '{}' not found in the current directory", path.display())]
    BuildDefinitionMissing {
        /// Expected path of the Dockerfile.
        path: PathBuf,
    },

    /// The container exists but is not running.
    #[error("Container '{name}' is not running. Start it with: leanrag-db start")]
    NotRunning {
        /// Container name.
        name: String,
    },

    /// The container has never been created.
    #[error("Container '{name}' does not exist. Create it with: leanrag-db start")]
    NotFound {
        /// Container name.
        name: String,
    },

    /// No liveness probe succeeded within the attempt budget.
    #[error(
        "Container '{name}' did not accept connections after {attempts} attempts\n--- last container output ---\n{logs}"
    )]
    ReadinessTimeout {
        /// Container name.
        name: String,
        /// Probes attempted.
        attempts: u32,
        /// Tail of the container output.
        logs: String,
    },

    /// Failed to pull the image.
    #[error("Failed to pull image '{image}': {reason}")]
    ImagePullFailed {
        /// Image name.
        image: String,
        /// Reason for failure.
        reason: String,
    },

    /// Failed to create the container.
    #[error("Failed to create container '{name}': {reason}")]
    ContainerCreationFailed {
        /// Container name.
        name: String,
        /// Reason for failure.
        reason: String,
    },

    /// Failed to start the container.
    #[error("Failed to start container '{name}': {reason}")]
    ContainerStartFailed {
        /// Container name.
        name: String,
        /// Reason for failure.
        reason: String,
    },

    /// Image build reported an error.
    #[error("Image build '{tag}' failed: {reason}")]
    BuildFailed {
        /// Image tag being built.
        tag: String,
        /// Reason for failure.
        reason: String,
    },

    /// Any other error returned by the container engine.
    #[error("Docker error: {0}")]
    Engine(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<bollard::errors::Error> for LifecycleError {
    fn from(e: bollard::errors::Error) -> Self {
        LifecycleError::Engine(e.to_string())
    }
}

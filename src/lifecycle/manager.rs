//! Reconciles the desired database container against what Docker reports.

use std::path::PathBuf;
use std::sync::Arc;

use crate::config::DatabaseConfig;
use crate::lifecycle::detect::Platform;
use crate::lifecycle::engine::{ContainerEngine, LogOptions, Removal};
use crate::lifecycle::error::{LifecycleError, Result};
use crate::lifecycle::init_script;
use crate::lifecycle::state::{ContainerState, DatabaseStatus, StartAction, StopAction};
use crate::prompt::{Confirm, is_explicit_yes};

/// What `start` ended up doing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartOutcome {
    /// Already running; nothing was touched.
    AlreadyRunning,
    /// An existing stopped container was started.
    Started,
    /// The container was created and started.
    Created,
}

/// What `stop` ended up doing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopOutcome {
    NotRunning,
    Stopped,
}

/// Per-step results of a confirmed reset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResetReport {
    pub container: Removal,
    pub volume: Removal,
    pub start: StartOutcome,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResetOutcome {
    /// The operator did not confirm; nothing changed.
    Cancelled,
    Completed(ResetReport),
}

/// Runs lifecycle verbs against one container.
///
/// Every public verb first checks that the engine is usable, so environment
/// problems surface before anything is changed.
pub struct LifecycleManager {
    config: DatabaseConfig,
    engine: Arc<dyn ContainerEngine>,
    platform: Platform,
    work_dir: PathBuf,
}

impl LifecycleManager {
    pub fn new(config: DatabaseConfig, engine: Arc<dyn ContainerEngine>) -> Self {
        Self {
            config,
            engine,
            platform: Platform::current(),
            work_dir: PathBuf::from("."),
        }
    }

    /// Directory `build` looks for the build definition in.
    pub fn with_work_dir(mut self, work_dir: impl Into<PathBuf>) -> Self {
        self.work_dir = work_dir.into();
        self
    }

    pub fn config(&self) -> &DatabaseConfig {
        &self.config
    }

    fn name(&self) -> &str {
        &self.config.container_name
    }

    async fn require_engine(&self) -> Result<()> {
        let status = self.engine.detect().await;
        tracing::debug!("Engine check: {}", status);
        status.require(self.platform)
    }

    /// Bring the container to running and accepting connections.
    pub async fn start(&self) -> Result<StartOutcome> {
        self.require_engine().await?;
        self.reconcile_start().await
    }

    async fn reconcile_start(&self) -> Result<StartOutcome> {
        let state = self.engine.container_state(self.name()).await?;

        let outcome = match StartAction::plan(state) {
            StartAction::AlreadyRunning => {
                tracing::info!("Container '{}' is already running", self.name());
                return Ok(StartOutcome::AlreadyRunning);
            }
            StartAction::StartExisting => {
                tracing::info!("Starting existing container '{}'", self.name());
                self.engine.start_container(self.name()).await?;
                StartOutcome::Started
            }
            StartAction::Create => {
                let (path, written) = init_script::ensure(&self.config)?;
                if written {
                    tracing::info!("Wrote init script {}", path.display());
                }

                self.engine.ensure_image(&self.config).await?;

                tracing::info!(
                    "Creating container '{}' from {} on port {}",
                    self.name(),
                    self.config.image,
                    self.config.host_port
                );
                self.engine.create_container(&self.config).await?;
                self.engine.start_container(self.name()).await?;
                StartOutcome::Created
            }
        };

        let attempts = self.wait_until_ready().await?;
        tracing::info!(
            "Container '{}' accepting connections after {} probe(s)",
            self.name(),
            attempts
        );
        Ok(outcome)
    }

    /// Probe until the server answers, up to the configured attempt budget.
    ///
    /// Returns the number of probes it took.
    pub async fn wait_until_ready(&self) -> Result<u32> {
        let attempts = self.config.ready_attempts;

        for attempt in 1..=attempts {
            if self.engine.probe(&self.config).await? {
                return Ok(attempt);
            }
            tracing::debug!("MySQL not ready yet (attempt {}/{})", attempt, attempts);
            if attempt < attempts {
                tokio::time::sleep(self.config.ready_interval).await;
            }
        }

        let logs = self
            .engine
            .tail_logs(self.name(), self.config.diagnostic_log_lines)
            .await
            .unwrap_or_else(|e| format!("(container output unavailable: {e})"));

        Err(LifecycleError::ReadinessTimeout {
            name: self.name().to_string(),
            attempts,
            logs,
        })
    }

    /// Stop the container, keeping it and its volume.
    pub async fn stop(&self) -> Result<StopOutcome> {
        self.require_engine().await?;

        let state = self.engine.container_state(self.name()).await?;
        match StopAction::plan(state) {
            StopAction::NotRunning => {
                tracing::warn!("Container '{}' is not running", self.name());
                Ok(StopOutcome::NotRunning)
            }
            StopAction::Stop => {
                tracing::info!("Stopping container '{}'", self.name());
                self.engine
                    .stop_container(self.name(), self.config.stop_timeout_secs)
                    .await?;
                Ok(StopOutcome::Stopped)
            }
        }
    }

    pub async fn restart(&self) -> Result<StartOutcome> {
        self.stop().await?;
        self.start().await
    }

    /// Report container state plus a single, non-waiting probe.
    pub async fn status(&self) -> Result<DatabaseStatus> {
        self.require_engine().await?;

        let state = self.engine.container_state(self.name()).await?;
        let probe_ok = if state == ContainerState::Running {
            self.engine.probe(&self.config).await.unwrap_or_else(|e| {
                tracing::debug!("Status probe failed: {}", e);
                false
            })
        } else {
            false
        };

        Ok(DatabaseStatus::from_parts(state, probe_ok))
    }

    /// Open an interactive MySQL shell in the running container.
    pub async fn connect(&self) -> Result<()> {
        self.require_engine().await?;

        match self.engine.container_state(self.name()).await? {
            ContainerState::Absent => Err(LifecycleError::NotFound {
                name: self.name().to_string(),
            }),
            ContainerState::Stopped => Err(LifecycleError::NotRunning {
                name: self.name().to_string(),
            }),
            ContainerState::Running => {
                self.engine
                    .attach_shell(self.name(), &self.config.shell_command())
                    .await
            }
        }
    }

    /// Stream container output. A stopped container still has logs.
    pub async fn logs(&self, options: LogOptions) -> Result<()> {
        self.require_engine().await?;

        if self.engine.container_state(self.name()).await? == ContainerState::Absent {
            return Err(LifecycleError::NotFound {
                name: self.name().to_string(),
            });
        }
        self.engine.stream_logs(self.name(), options).await
    }

    /// Destroy container and volume, then start fresh.
    ///
    /// Nothing is touched unless `confirm` answers `yes`. Each removal step
    /// tolerates the resource already being gone.
    pub async fn reset(&self, confirm: &dyn Confirm) -> Result<ResetOutcome> {
        self.require_engine().await?;

        let question = format!(
            "This permanently deletes container '{}' and volume '{}' with all data. Type 'yes' to continue:",
            self.name(),
            self.config.volume_name
        );
        let answer = confirm.ask(&question)?;
        if !is_explicit_yes(&answer) {
            tracing::info!("Reset cancelled");
            return Ok(ResetOutcome::Cancelled);
        }

        match self
            .engine
            .stop_container(self.name(), self.config.stop_timeout_secs)
            .await
        {
            Ok(()) => tracing::info!("Stopped container '{}'", self.name()),
            Err(LifecycleError::NotFound { .. }) => {
                tracing::debug!("Container '{}' not present, nothing to stop", self.name())
            }
            Err(e) => return Err(e),
        }

        let container = self.engine.remove_container(self.name()).await?;
        match container {
            Removal::Removed => tracing::info!("Removed container '{}'", self.name()),
            _ => tracing::debug!("Container '{}' already removed", self.name()),
        }

        let volume = self.engine.remove_volume(&self.config.volume_name).await?;
        match volume {
            Removal::Removed => tracing::info!("Removed volume '{}'", self.config.volume_name),
            Removal::AlreadyGone => {
                tracing::debug!("Volume '{}' already removed", self.config.volume_name)
            }
            Removal::InUse => tracing::warn!(
                "Volume '{}' is in use and was kept",
                self.config.volume_name
            ),
        }

        let start = self.reconcile_start().await?;

        Ok(ResetOutcome::Completed(ResetReport {
            container,
            volume,
            start,
        }))
    }

    /// Build the image from the build definition in the working directory.
    pub async fn build(&self) -> Result<()> {
        self.require_engine().await?;

        let dockerfile = self.work_dir.join(&self.config.dockerfile);
        if !dockerfile.is_file() {
            return Err(LifecycleError::BuildDefinitionMissing { path: dockerfile });
        }

        tracing::info!("Building image '{}'", self.config.build_tag);
        self.engine
            .build_image(&self.work_dir, &self.config.dockerfile, &self.config.build_tag)
            .await
    }
}

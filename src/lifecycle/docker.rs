//! [`ContainerEngine`] backed by the Docker Engine API.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use bollard::Docker;
use bollard::container::{
    Config, CreateContainerOptions, InspectContainerOptions, LogsOptions, RemoveContainerOptions,
    StartContainerOptions, StopContainerOptions,
};
use bollard::errors::Error as BollardError;
use bollard::exec::{CreateExecOptions, StartExecResults};
use bollard::image::{BuildImageOptions, CreateImageOptions};
use bollard::models::{
    ContainerState as ContainerStateInfo, HostConfig, PortBinding, RestartPolicy,
    RestartPolicyNameEnum,
};
use bollard::volume::RemoveVolumeOptions;
use futures::StreamExt;
use tokio::io::AsyncWriteExt;

use crate::config::DatabaseConfig;
use crate::lifecycle::detect::{DockerStatus, binary_exists};
use crate::lifecycle::engine::{ContainerEngine, LogOptions, Removal};
use crate::lifecycle::error::{LifecycleError, Result};
use crate::lifecycle::state::ContainerState;

/// Directories never sent as build context.
const BUILD_CONTEXT_EXCLUDES: &[&str] = &[".git", "target", ".venv"];

/// Connect to the local Docker daemon and verify it answers a ping.
///
/// Tries bollard's defaults (`DOCKER_HOST` or the platform socket) first,
/// then the per-user sockets used by Docker Desktop and rootless Docker.
pub async fn connect_docker() -> Result<Docker> {
    if let Ok(docker) = Docker::connect_with_local_defaults()
        && docker.ping().await.is_ok()
    {
        return Ok(docker);
    }

    for socket in fallback_sockets() {
        if !socket.exists() {
            continue;
        }
        if let Ok(docker) = Docker::connect_with_socket(
            &socket.to_string_lossy(),
            120,
            bollard::API_DEFAULT_VERSION,
        ) && docker.ping().await.is_ok()
        {
            tracing::debug!("Connected to Docker via {}", socket.display());
            return Ok(docker);
        }
    }

    Err(LifecycleError::Engine(
        "could not reach the Docker daemon".to_string(),
    ))
}

fn fallback_sockets() -> Vec<PathBuf> {
    let mut sockets = Vec::new();
    if cfg!(unix) {
        if let Some(home) = dirs::home_dir() {
            sockets.push(home.join(".docker/run/docker.sock"));
            sockets.push(home.join(".docker/desktop/docker.sock"));
        }
        if let Ok(runtime_dir) = std::env::var("XDG_RUNTIME_DIR") {
            sockets.push(PathBuf::from(runtime_dir).join("docker.sock"));
        }
    }
    sockets
}

/// A paused container counts as stopped: it does not serve connections and
/// `start` has to act on it.
fn state_from_inspect(state: Option<&ContainerStateInfo>) -> ContainerState {
    let running = state.and_then(|s| s.running).unwrap_or(false);
    let paused = state.and_then(|s| s.paused).unwrap_or(false);
    if running && !paused {
        ContainerState::Running
    } else {
        ContainerState::Stopped
    }
}

fn status_code(err: &BollardError) -> Option<u16> {
    match err {
        BollardError::DockerResponseServerError { status_code, .. } => Some(*status_code),
        _ => None,
    }
}

/// Docker-backed container engine.
pub struct DockerEngine {
    docker: Option<Docker>,
    binary_present: bool,
}

impl DockerEngine {
    /// Probe for Docker. Never fails; an unreachable daemon is reported by
    /// [`ContainerEngine::detect`] so callers can surface guidance first.
    pub async fn connect() -> Self {
        let binary_present = binary_exists("docker");
        let docker = match connect_docker().await {
            Ok(docker) => Some(docker),
            Err(e) => {
                tracing::debug!("Docker connection failed: {}", e);
                None
            }
        };
        Self {
            docker,
            binary_present,
        }
    }

    fn docker(&self) -> Result<&Docker> {
        self.docker
            .as_ref()
            .ok_or_else(|| LifecycleError::Engine("not connected to Docker".to_string()))
    }
}

#[async_trait]
impl ContainerEngine for DockerEngine {
    async fn detect(&self) -> DockerStatus {
        if !self.binary_present {
            DockerStatus::NotInstalled
        } else if self.docker.is_none() {
            DockerStatus::NotRunning
        } else {
            DockerStatus::Available
        }
    }

    async fn container_state(&self, name: &str) -> Result<ContainerState> {
        let docker = self.docker()?;
        match docker
            .inspect_container(name, None::<InspectContainerOptions>)
            .await
        {
            Ok(info) => Ok(state_from_inspect(info.state.as_ref())),
            Err(e) if status_code(&e) == Some(404) => Ok(ContainerState::Absent),
            Err(e) => Err(e.into()),
        }
    }

    async fn ensure_image(&self, config: &DatabaseConfig) -> Result<()> {
        let docker = self.docker()?;

        if docker.inspect_image(&config.image).await.is_ok() {
            tracing::debug!("Image '{}' exists locally", config.image);
            return Ok(());
        }

        if !config.auto_pull {
            return Err(LifecycleError::ImagePullFailed {
                image: config.image.clone(),
                reason: "not present locally and auto-pull is disabled".to_string(),
            });
        }

        tracing::info!("Pulling image: {}", config.image);

        let options = CreateImageOptions {
            from_image: config.image.clone(),
            ..Default::default()
        };

        let mut stream = docker.create_image(Some(options), None, None);

        while let Some(result) = stream.next().await {
            match result {
                Ok(info) => {
                    if let Some(status) = info.status {
                        tracing::trace!("Pull status: {}", status);
                    }
                }
                Err(e) => {
                    return Err(LifecycleError::ImagePullFailed {
                        image: config.image.clone(),
                        reason: e.to_string(),
                    });
                }
            }
        }

        tracing::info!("Pulled image: {}", config.image);
        Ok(())
    }

    async fn create_container(&self, config: &DatabaseConfig) -> Result<()> {
        let docker = self.docker()?;
        let container_port = format!("{}/tcp", config.container_port);

        let mut port_bindings = HashMap::new();
        port_bindings.insert(
            container_port.clone(),
            Some(vec![PortBinding {
                host_ip: Some(config.host.clone()),
                host_port: Some(config.host_port.to_string()),
            }]),
        );

        let exposed_ports: HashMap<String, HashMap<(), ()>> =
            HashMap::from([(container_port, HashMap::new())]);

        let env: Vec<String> = config
            .container_env()
            .into_iter()
            .map(|(k, v)| format!("{}={}", k, v))
            .collect();

        let host_config = HostConfig {
            port_bindings: Some(port_bindings),
            binds: Some(config.binds()?),
            restart_policy: Some(RestartPolicy {
                name: Some(RestartPolicyNameEnum::UNLESS_STOPPED),
                maximum_retry_count: None,
            }),
            ..Default::default()
        };

        let container_config = Config {
            image: Some(config.image.clone()),
            env: Some(env),
            cmd: Some(config.server_args()),
            exposed_ports: Some(exposed_ports),
            host_config: Some(host_config),
            ..Default::default()
        };

        let options = CreateContainerOptions {
            name: config.container_name.clone(),
            ..Default::default()
        };

        docker
            .create_container(Some(options), container_config)
            .await
            .map_err(|e| LifecycleError::ContainerCreationFailed {
                name: config.container_name.clone(),
                reason: e.to_string(),
            })?;

        Ok(())
    }

    async fn start_container(&self, name: &str) -> Result<()> {
        let docker = self.docker()?;
        let failed = |e: BollardError| LifecycleError::ContainerStartFailed {
            name: name.to_string(),
            reason: e.to_string(),
        };

        // Docker refuses to start a paused container; it has to be unpaused.
        let paused = docker
            .inspect_container(name, None::<InspectContainerOptions>)
            .await
            .ok()
            .and_then(|info| info.state)
            .and_then(|state| state.paused)
            .unwrap_or(false);
        if paused {
            tracing::info!("Unpausing container '{}'", name);
            return docker.unpause_container(name).await.map_err(failed);
        }

        docker
            .start_container(name, None::<StartContainerOptions<String>>)
            .await
            .map_err(failed)
    }

    async fn stop_container(&self, name: &str, timeout_secs: i64) -> Result<()> {
        match self
            .docker()?
            .stop_container(name, Some(StopContainerOptions { t: timeout_secs }))
            .await
        {
            Ok(()) => Ok(()),
            // 304: already stopped
            Err(e) if status_code(&e) == Some(304) => Ok(()),
            Err(e) if status_code(&e) == Some(404) => Err(LifecycleError::NotFound {
                name: name.to_string(),
            }),
            Err(e) => Err(e.into()),
        }
    }

    async fn remove_container(&self, name: &str) -> Result<Removal> {
        let options = RemoveContainerOptions {
            force: true,
            ..Default::default()
        };
        match self.docker()?.remove_container(name, Some(options)).await {
            Ok(()) => Ok(Removal::Removed),
            Err(e) if status_code(&e) == Some(404) => Ok(Removal::AlreadyGone),
            Err(e) => Err(e.into()),
        }
    }

    async fn remove_volume(&self, name: &str) -> Result<Removal> {
        match self
            .docker()?
            .remove_volume(name, None::<RemoveVolumeOptions>)
            .await
        {
            Ok(()) => Ok(Removal::Removed),
            Err(e) if status_code(&e) == Some(404) => Ok(Removal::AlreadyGone),
            Err(e) if status_code(&e) == Some(409) => Ok(Removal::InUse),
            Err(e) => Err(e.into()),
        }
    }

    async fn probe(&self, config: &DatabaseConfig) -> Result<bool> {
        let docker = self.docker()?;

        let exec = match docker
            .create_exec(
                &config.container_name,
                CreateExecOptions {
                    cmd: Some(config.probe_command()),
                    attach_stdout: Some(true),
                    attach_stderr: Some(true),
                    ..Default::default()
                },
            )
            .await
        {
            Ok(exec) => exec,
            Err(e) => {
                tracing::trace!("Probe exec could not be created: {}", e);
                return Ok(false);
            }
        };

        match docker.start_exec(&exec.id, None).await {
            Ok(StartExecResults::Attached { mut output, .. }) => {
                // Drain so the exec runs to completion.
                while let Some(chunk) = output.next().await {
                    if let Err(e) = chunk {
                        tracing::trace!("Probe output error: {}", e);
                        break;
                    }
                }
            }
            Ok(StartExecResults::Detached) => {}
            Err(e) => {
                tracing::trace!("Probe exec failed to start: {}", e);
                return Ok(false);
            }
        }

        match docker.inspect_exec(&exec.id).await {
            Ok(info) => Ok(info.exit_code == Some(0)),
            Err(e) => {
                tracing::trace!("Probe exec inspect failed: {}", e);
                Ok(false)
            }
        }
    }

    async fn tail_logs(&self, name: &str, lines: usize) -> Result<String> {
        let options = LogsOptions::<String> {
            follow: false,
            stdout: true,
            stderr: true,
            tail: lines.to_string(),
            ..Default::default()
        };

        let mut stream = self.docker()?.logs(name, Some(options));
        let mut out = String::new();
        while let Some(chunk) = stream.next().await {
            out.push_str(&String::from_utf8_lossy(&chunk?.into_bytes()));
        }
        Ok(out)
    }

    async fn stream_logs(&self, name: &str, options: LogOptions) -> Result<()> {
        let options = LogsOptions::<String> {
            follow: options.follow,
            stdout: true,
            stderr: true,
            tail: options
                .tail
                .map(|n| n.to_string())
                .unwrap_or_else(|| "all".to_string()),
            ..Default::default()
        };

        let mut stream = self.docker()?.logs(name, Some(options));
        let mut stdout = tokio::io::stdout();
        while let Some(chunk) = stream.next().await {
            stdout.write_all(&chunk?.into_bytes()).await?;
            stdout.flush().await?;
        }
        Ok(())
    }

    async fn attach_shell(&self, name: &str, command: &[String]) -> Result<()> {
        // The Engine API has no TTY handoff, so use the CLI with inherited stdio.
        let status = tokio::process::Command::new("docker")
            .args(["exec", "-it", name])
            .args(command)
            .status()
            .await?;

        if !status.success() {
            return Err(LifecycleError::Engine(format!(
                "shell in '{}' exited with {}",
                name, status
            )));
        }
        Ok(())
    }

    async fn build_image(&self, context_dir: &Path, dockerfile: &Path, tag: &str) -> Result<()> {
        let docker = self.docker()?;

        let context_dir = context_dir.to_path_buf();
        let archive = tokio::task::spawn_blocking(move || pack_build_context(&context_dir))
            .await
            .map_err(|e| LifecycleError::Engine(format!("build context task failed: {e}")))??;

        tracing::debug!("Build context is {} bytes", archive.len());

        let options = BuildImageOptions {
            dockerfile: dockerfile.to_string_lossy().into_owned(),
            t: tag.to_string(),
            rm: true,
            ..Default::default()
        };

        let mut stream = docker.build_image(options, None, Some(bytes::Bytes::from(archive)));
        let mut stdout = tokio::io::stdout();

        while let Some(result) = stream.next().await {
            let info = result.map_err(|e| LifecycleError::BuildFailed {
                tag: tag.to_string(),
                reason: e.to_string(),
            })?;
            if let Some(error) = info.error {
                return Err(LifecycleError::BuildFailed {
                    tag: tag.to_string(),
                    reason: error,
                });
            }
            if let Some(line) = info.stream {
                stdout.write_all(line.as_bytes()).await?;
            }
        }
        stdout.flush().await?;

        Ok(())
    }
}

/// Tar the build context, skipping VCS, build output and virtualenvs at the
/// top level.
pub(crate) fn pack_build_context(context_dir: &Path) -> std::io::Result<Vec<u8>> {
    let mut builder = tar::Builder::new(Vec::new());

    for entry in std::fs::read_dir(context_dir)? {
        let entry = entry?;
        let name = entry.file_name();
        if BUILD_CONTEXT_EXCLUDES
            .iter()
            .any(|excluded| name.as_os_str() == *excluded)
        {
            continue;
        }

        let path = entry.path();
        if entry.file_type()?.is_dir() {
            builder.append_dir_all(&name, &path)?;
        } else {
            builder.append_path_with_name(&path, &name)?;
        }
    }

    builder.into_inner()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn archive_names(bytes: &[u8]) -> Vec<String> {
        let mut archive = tar::Archive::new(bytes);
        archive
            .entries()
            .unwrap()
            .map(|e| e.unwrap().path().unwrap().to_string_lossy().into_owned())
            .collect()
    }

    #[test]
    fn build_context_skips_excluded_dirs() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("Dockerfile"), "FROM mysql:8.0\n").unwrap();
        std::fs::create_dir(dir.path().join("mysql-init")).unwrap();
        std::fs::write(dir.path().join("mysql-init/01-init.sql"), "SELECT 1;").unwrap();
        std::fs::create_dir(dir.path().join(".git")).unwrap();
        std::fs::write(dir.path().join(".git/HEAD"), "ref").unwrap();
        std::fs::create_dir(dir.path().join("target")).unwrap();
        std::fs::write(dir.path().join("target/blob"), "x").unwrap();

        let bytes = pack_build_context(dir.path()).unwrap();
        let names = archive_names(&bytes);

        assert!(names.iter().any(|n| n == "Dockerfile"));
        assert!(names.iter().any(|n| n.ends_with("01-init.sql")));
        assert!(!names.iter().any(|n| n.starts_with(".git")));
        assert!(!names.iter().any(|n| n.starts_with("target")));
    }

    #[test]
    fn paused_container_is_not_running() {
        let paused = ContainerStateInfo {
            running: Some(true),
            paused: Some(true),
            ..Default::default()
        };
        assert_eq!(state_from_inspect(Some(&paused)), ContainerState::Stopped);

        let running = ContainerStateInfo {
            running: Some(true),
            paused: Some(false),
            ..Default::default()
        };
        assert_eq!(state_from_inspect(Some(&running)), ContainerState::Running);

        let exited = ContainerStateInfo {
            running: Some(false),
            ..Default::default()
        };
        assert_eq!(state_from_inspect(Some(&exited)), ContainerState::Stopped);
        assert_eq!(state_from_inspect(None), ContainerState::Stopped);
    }

    #[test]
    fn status_code_only_for_server_errors() {
        let err = BollardError::DockerResponseServerError {
            status_code: 404,
            message: "no such container".to_string(),
        };
        assert_eq!(status_code(&err), Some(404));
    }
}

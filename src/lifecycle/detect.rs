//! Engine preconditions and the guidance shown when they fail.
//!
//! `leanrag-db` needs the `docker` binary (for `connect`) and a daemon that
//! answers the API. Both are checked before any verb changes anything.

use std::fmt;
use std::path::Path;

use crate::lifecycle::error::LifecycleError;

/// What the engine probe found.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DockerStatus {
    Available,
    /// No `docker` executable on PATH.
    NotInstalled,
    /// The executable exists but the daemon did not answer a ping.
    NotRunning,
}

impl DockerStatus {
    /// Map anything but [`DockerStatus::Available`] to its precondition
    /// error, with guidance for `platform`.
    pub fn require(self, platform: Platform) -> Result<(), LifecycleError> {
        match self {
            DockerStatus::Available => Ok(()),
            DockerStatus::NotInstalled => Err(LifecycleError::DockerNotInstalled {
                hint: platform.guidance(self).to_string(),
            }),
            DockerStatus::NotRunning => Err(LifecycleError::DockerNotRunning {
                hint: platform.guidance(self).to_string(),
            }),
        }
    }
}

impl fmt::Display for DockerStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            DockerStatus::Available => "docker ready",
            DockerStatus::NotInstalled => "docker missing",
            DockerStatus::NotRunning => "docker daemon down",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Platform {
    MacOS,
    Linux,
    Windows,
}

impl Platform {
    pub fn current() -> Self {
        if cfg!(target_os = "macos") {
            Platform::MacOS
        } else if cfg!(windows) {
            Platform::Windows
        } else {
            Platform::Linux
        }
    }

    /// What the operator should do about `status` on this platform.
    pub fn guidance(self, status: DockerStatus) -> &'static str {
        match (self, status) {
            (_, DockerStatus::Available) => "",
            (Platform::MacOS, DockerStatus::NotInstalled) => {
                "Install Docker Desktop (https://docs.docker.com/desktop/setup/install/mac-install/) or run: brew install --cask docker"
            }
            (Platform::Windows, DockerStatus::NotInstalled) => {
                "Install Docker Desktop with the WSL 2 backend: https://docs.docker.com/desktop/setup/install/windows-install/"
            }
            (Platform::Linux, DockerStatus::NotInstalled) => {
                "Install Docker Engine for your distribution: https://docs.docker.com/engine/install/"
            }
            (Platform::MacOS, DockerStatus::NotRunning) => {
                "Launch Docker Desktop (open -a Docker) and wait for the whale icon to settle."
            }
            (Platform::Windows, DockerStatus::NotRunning) => {
                "Launch Docker Desktop and wait until it reports that the engine is running."
            }
            (Platform::Linux, DockerStatus::NotRunning) => {
                "Run: sudo systemctl start docker. If it is running, add yourself to the docker group."
            }
        }
    }
}

/// Whether an executable called `name` is on PATH.
pub fn binary_exists(name: &str) -> bool {
    let Some(path) = std::env::var_os("PATH") else {
        return false;
    };
    std::env::split_paths(&path).any(|dir| is_executable_in(&dir, name))
}

fn is_executable_in(dir: &Path, name: &str) -> bool {
    if cfg!(windows) {
        ["exe", "cmd", "bat"]
            .iter()
            .any(|ext| dir.join(format!("{name}.{ext}")).is_file())
    } else {
        dir.join(name).is_file()
    }
}

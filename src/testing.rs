//! In-memory stand-ins for Docker, the package manager and the terminal.
//!
//! Provides:
//! - [`FakeEngine`]: a [`ContainerEngine`] that models one container and one volume
//! - [`FakeRunner`]: a [`CommandRunner`] with scripted failures
//! - [`ScriptedConfirm`]: a [`Confirm`] that always gives the same answer
//!
//! # Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use leanrag_db::config::DatabaseConfig;
//! use leanrag_db::lifecycle::LifecycleManager;
//! use leanrag_db::testing::FakeEngine;
//!
//! # async fn example() {
//! let engine = Arc::new(FakeEngine::new().probe_ready_after(3));
//! let manager = LifecycleManager::new(DatabaseConfig::default(), engine.clone());
//! manager.start().await.unwrap();
//! assert_eq!(engine.probe_count(), 3);
//! # }
//! ```

use std::collections::HashSet;
use std::path::Path;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::config::DatabaseConfig;
use crate::installer::{CommandRunner, Invocation};
use crate::lifecycle::{
    ContainerEngine, ContainerState, DockerStatus, LifecycleError, LogOptions, Removal,
};
use crate::prompt::Confirm;

struct FakeState {
    status: DockerStatus,
    container: ContainerState,
    volume: bool,
    /// Probe attempt (since the last start) that first succeeds.
    ready_after: Option<u32>,
    probes_since_start: u32,
    total_probes: u32,
    calls: Vec<&'static str>,
}

/// Fake container engine with Docker's observable rules: names are unique,
/// stopping a stopped container succeeds, an attached volume cannot be
/// removed.
pub struct FakeEngine {
    inner: Mutex<FakeState>,
}

impl Default for FakeEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl FakeEngine {
    /// Docker available, no container, no volume, probe ready on first try.
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(FakeState {
                status: DockerStatus::Available,
                container: ContainerState::Absent,
                volume: false,
                ready_after: Some(1),
                probes_since_start: 0,
                total_probes: 0,
                calls: Vec::new(),
            }),
        }
    }

    pub fn with_status(self, status: DockerStatus) -> Self {
        self.lock().status = status;
        self
    }

    /// Preset the container state. The volume is left as is.
    pub fn with_state(self, state: ContainerState) -> Self {
        self.lock().container = state;
        self
    }

    pub fn with_volume(self) -> Self {
        self.lock().volume = true;
        self
    }

    /// Probe succeeds on the `n`th attempt after each start.
    pub fn probe_ready_after(self, n: u32) -> Self {
        self.lock().ready_after = Some(n);
        self
    }

    pub fn probe_never_ready(self) -> Self {
        self.lock().ready_after = None;
        self
    }

    pub fn state(&self) -> ContainerState {
        self.lock().container
    }

    pub fn volume_exists(&self) -> bool {
        self.lock().volume
    }

    /// Every state-touching call, in order.
    pub fn calls(&self) -> Vec<&'static str> {
        self.lock().calls.clone()
    }

    pub fn count(&self, call: &str) -> usize {
        self.lock().calls.iter().filter(|c| **c == call).count()
    }

    /// Total probes run since construction.
    pub fn probe_count(&self) -> u32 {
        self.lock().total_probes
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, FakeState> {
        self.inner.lock().expect("fake engine mutex poisoned")
    }
}

#[async_trait]
impl ContainerEngine for FakeEngine {
    async fn detect(&self) -> DockerStatus {
        self.lock().status
    }

    async fn container_state(&self, _name: &str) -> Result<ContainerState, LifecycleError> {
        Ok(self.lock().container)
    }

    async fn ensure_image(&self, _config: &DatabaseConfig) -> Result<(), LifecycleError> {
        self.lock().calls.push("ensure_image");
        Ok(())
    }

    async fn create_container(&self, config: &DatabaseConfig) -> Result<(), LifecycleError> {
        let mut state = self.lock();
        state.calls.push("create");
        if state.container != ContainerState::Absent {
            return Err(LifecycleError::ContainerCreationFailed {
                name: config.container_name.clone(),
                reason: "name already in use".to_string(),
            });
        }
        state.container = ContainerState::Stopped;
        state.volume = true;
        Ok(())
    }

    async fn start_container(&self, name: &str) -> Result<(), LifecycleError> {
        let mut state = self.lock();
        state.calls.push("start");
        if state.container == ContainerState::Absent {
            return Err(LifecycleError::ContainerStartFailed {
                name: name.to_string(),
                reason: "no such container".to_string(),
            });
        }
        state.container = ContainerState::Running;
        state.probes_since_start = 0;
        Ok(())
    }

    async fn stop_container(&self, name: &str, _timeout_secs: i64) -> Result<(), LifecycleError> {
        let mut state = self.lock();
        state.calls.push("stop");
        match state.container {
            ContainerState::Absent => Err(LifecycleError::NotFound {
                name: name.to_string(),
            }),
            _ => {
                state.container = ContainerState::Stopped;
                Ok(())
            }
        }
    }

    async fn remove_container(&self, _name: &str) -> Result<Removal, LifecycleError> {
        let mut state = self.lock();
        state.calls.push("remove_container");
        if state.container == ContainerState::Absent {
            return Ok(Removal::AlreadyGone);
        }
        state.container = ContainerState::Absent;
        Ok(Removal::Removed)
    }

    async fn remove_volume(&self, _name: &str) -> Result<Removal, LifecycleError> {
        let mut state = self.lock();
        state.calls.push("remove_volume");
        if !state.volume {
            Ok(Removal::AlreadyGone)
        } else if state.container != ContainerState::Absent {
            Ok(Removal::InUse)
        } else {
            state.volume = false;
            Ok(Removal::Removed)
        }
    }

    async fn probe(&self, _config: &DatabaseConfig) -> Result<bool, LifecycleError> {
        let mut state = self.lock();
        state.total_probes += 1;
        if state.container != ContainerState::Running {
            return Ok(false);
        }
        state.probes_since_start += 1;
        let since_start = state.probes_since_start;
        Ok(state.ready_after.is_some_and(|n| since_start >= n))
    }

    async fn tail_logs(&self, _name: &str, lines: usize) -> Result<String, LifecycleError> {
        Ok((1..=lines.min(3))
            .map(|i| format!("fake log line {i}\n"))
            .collect())
    }

    async fn stream_logs(&self, _name: &str, _options: LogOptions) -> Result<(), LifecycleError> {
        self.lock().calls.push("stream_logs");
        Ok(())
    }

    async fn attach_shell(&self, _name: &str, _command: &[String]) -> Result<(), LifecycleError> {
        self.lock().calls.push("attach_shell");
        Ok(())
    }

    async fn build_image(
        &self,
        _context_dir: &Path,
        _dockerfile: &Path,
        _tag: &str,
    ) -> Result<(), LifecycleError> {
        self.lock().calls.push("build");
        Ok(())
    }
}

/// Always answers with the same text.
pub struct ScriptedConfirm {
    answer: String,
    asked: Mutex<u32>,
}

impl ScriptedConfirm {
    pub fn new(answer: &str) -> Self {
        Self {
            answer: answer.to_string(),
            asked: Mutex::new(0),
        }
    }

    /// How many questions were asked.
    pub fn asked(&self) -> u32 {
        *self.asked.lock().expect("confirm mutex poisoned")
    }
}

impl Confirm for ScriptedConfirm {
    fn ask(&self, _question: &str) -> std::io::Result<String> {
        *self.asked.lock().expect("confirm mutex poisoned") += 1;
        Ok(self.answer.clone())
    }
}

/// Records invocations; fails those whose arguments mention a marked word.
pub struct FakeRunner {
    tools: HashSet<String>,
    failing: HashSet<String>,
    invocations: Mutex<Vec<Invocation>>,
}

impl FakeRunner {
    /// A runner where only `tool` is on PATH.
    pub fn with_tool(tool: &str) -> Self {
        Self {
            tools: HashSet::from([tool.to_string()]),
            failing: HashSet::new(),
            invocations: Mutex::new(Vec::new()),
        }
    }

    /// A runner with nothing on PATH.
    pub fn without_tools() -> Self {
        Self {
            tools: HashSet::new(),
            failing: HashSet::new(),
            invocations: Mutex::new(Vec::new()),
        }
    }

    /// Fail any invocation with an argument equal to `word` (a package name,
    /// a requirements file, or an `import` statement).
    pub fn failing_on(mut self, word: &str) -> Self {
        self.failing.insert(word.to_string());
        self
    }

    pub fn invocations(&self) -> Vec<Invocation> {
        self.invocations
            .lock()
            .expect("runner mutex poisoned")
            .clone()
    }

    /// Whether any invocation carried `arg`.
    pub fn saw_arg(&self, arg: &str) -> bool {
        self.invocations()
            .iter()
            .any(|inv| inv.args.iter().any(|a| a == arg))
    }
}

#[async_trait]
impl CommandRunner for FakeRunner {
    fn has_tool(&self, tool: &str) -> bool {
        self.tools.contains(tool)
    }

    async fn run(&self, invocation: Invocation) -> std::io::Result<bool> {
        let fails = invocation.args.iter().any(|a| self.failing.contains(a));
        self.invocations
            .lock()
            .expect("runner mutex poisoned")
            .push(invocation);
        Ok(!fails)
    }
}

//! Container states and the transitions each verb takes from them.

/// What Docker reports for the managed container name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContainerState {
    /// No container with this name.
    Absent,
    /// Created but not running (exited, created, paused, dead).
    Stopped,
    /// Running.
    Running,
}

/// What `start` does from a given state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartAction {
    /// Nothing to do.
    AlreadyRunning,
    /// Start the existing container.
    StartExisting,
    /// Create the container, then start it.
    Create,
}

impl StartAction {
    pub fn plan(state: ContainerState) -> Self {
        match state {
            ContainerState::Running => StartAction::AlreadyRunning,
            ContainerState::Stopped => StartAction::StartExisting,
            ContainerState::Absent => StartAction::Create,
        }
    }
}

/// What `stop` does from a given state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopAction {
    /// Not running; nothing to stop.
    NotRunning,
    Stop,
}

impl StopAction {
    pub fn plan(state: ContainerState) -> Self {
        match state {
            ContainerState::Running => StopAction::Stop,
            ContainerState::Stopped | ContainerState::Absent => StopAction::NotRunning,
        }
    }
}

/// Result of `status`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DatabaseStatus {
    DoesNotExist,
    Stopped,
    /// Running and the liveness probe succeeded.
    Ready,
    /// Running but the liveness probe failed.
    Starting,
}

impl DatabaseStatus {
    /// Combine the container state with a probe result. The probe is only
    /// meaningful when the container runs.
    pub fn from_parts(state: ContainerState, probe_ok: bool) -> Self {
        match (state, probe_ok) {
            (ContainerState::Absent, _) => DatabaseStatus::DoesNotExist,
            (ContainerState::Stopped, _) => DatabaseStatus::Stopped,
            (ContainerState::Running, true) => DatabaseStatus::Ready,
            (ContainerState::Running, false) => DatabaseStatus::Starting,
        }
    }

    pub fn describe(&self) -> &'static str {
        match self {
            DatabaseStatus::DoesNotExist => "does not exist",
            DatabaseStatus::Stopped => "exists but is stopped",
            DatabaseStatus::Ready => "running and accepting connections",
            DatabaseStatus::Starting => "running but not yet accepting connections",
        }
    }
}

impl std::fmt::Display for DatabaseStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.describe())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn start_plan_is_total() {
        assert_eq!(
            StartAction::plan(ContainerState::Running),
            StartAction::AlreadyRunning
        );
        assert_eq!(
            StartAction::plan(ContainerState::Stopped),
            StartAction::StartExisting
        );
        assert_eq!(StartAction::plan(ContainerState::Absent), StartAction::Create);
    }

    #[test]
    fn stop_plan_is_total() {
        assert_eq!(StopAction::plan(ContainerState::Running), StopAction::Stop);
        assert_eq!(
            StopAction::plan(ContainerState::Stopped),
            StopAction::NotRunning
        );
        assert_eq!(
            StopAction::plan(ContainerState::Absent),
            StopAction::NotRunning
        );
    }

    #[test]
    fn status_ignores_probe_unless_running() {
        assert_eq!(
            DatabaseStatus::from_parts(ContainerState::Absent, true),
            DatabaseStatus::DoesNotExist
        );
        assert_eq!(
            DatabaseStatus::from_parts(ContainerState::Stopped, true),
            DatabaseStatus::Stopped
        );
        assert_eq!(
            DatabaseStatus::from_parts(ContainerState::Running, true),
            DatabaseStatus::Ready
        );
        assert_eq!(
            DatabaseStatus::from_parts(ContainerState::Running, false),
            DatabaseStatus::Starting
        );
    }
}

//! Reconciliation properties of the lifecycle manager, driven through the
//! in-memory engine. Each test gets its own init directory.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use pretty_assertions::assert_eq;
use tempfile::tempdir;

use leanrag_db::config::DatabaseConfig;
use leanrag_db::lifecycle::{
    ContainerState, DatabaseStatus, LifecycleError, LifecycleManager, LogOptions, Removal,
    ResetOutcome, ResetReport, StartOutcome,
};
use leanrag_db::testing::{FakeEngine, ScriptedConfirm};

fn manager(engine: &Arc<FakeEngine>, init_dir: &Path) -> LifecycleManager {
    let config = DatabaseConfig {
        init_dir: init_dir.to_path_buf(),
        ready_interval: Duration::from_millis(1),
        ..Default::default()
    };
    LifecycleManager::new(config, engine.clone())
}

// ── Idempotence ─────────────────────────────────────────────────────────────

#[tokio::test]
async fn start_twice_leaves_one_running_container() {
    let dir = tempdir().unwrap();
    let engine = Arc::new(FakeEngine::new());
    let mgr = manager(&engine, dir.path());

    assert_eq!(mgr.start().await.unwrap(), StartOutcome::Created);
    assert_eq!(mgr.start().await.unwrap(), StartOutcome::AlreadyRunning);

    assert_eq!(engine.state(), ContainerState::Running);
    assert_eq!(engine.count("create"), 1);
    assert_eq!(engine.count("start"), 1);
}

#[tokio::test]
async fn reset_then_start_matches_plain_start() {
    let dir = tempdir().unwrap();
    let engine = Arc::new(FakeEngine::new());
    let mgr = manager(&engine, dir.path());
    mgr.start().await.unwrap();

    let outcome = mgr.reset(&ScriptedConfirm::new("yes")).await.unwrap();
    let ResetOutcome::Completed(report) = outcome else {
        panic!("reset should have completed");
    };
    assert_eq!(report.start, StartOutcome::Created);

    assert_eq!(mgr.start().await.unwrap(), StartOutcome::AlreadyRunning);
    assert_eq!(mgr.status().await.unwrap(), DatabaseStatus::Ready);
    assert!(engine.volume_exists());
    assert_eq!(engine.count("remove_volume"), 1);
}

#[tokio::test]
async fn reset_on_missing_container_equals_plain_start() {
    let reset_dir = tempdir().unwrap();
    let reset_engine = Arc::new(FakeEngine::new());
    let reset_mgr = manager(&reset_engine, reset_dir.path());

    let outcome = reset_mgr.reset(&ScriptedConfirm::new("yes")).await.unwrap();
    assert_eq!(
        outcome,
        ResetOutcome::Completed(ResetReport {
            container: Removal::AlreadyGone,
            volume: Removal::AlreadyGone,
            start: StartOutcome::Created,
        })
    );
    assert_eq!(
        reset_mgr.start().await.unwrap(),
        StartOutcome::AlreadyRunning
    );

    let plain_dir = tempdir().unwrap();
    let plain_engine = Arc::new(FakeEngine::new());
    let plain_mgr = manager(&plain_engine, plain_dir.path());
    assert_eq!(plain_mgr.start().await.unwrap(), StartOutcome::Created);

    assert_eq!(reset_engine.state(), plain_engine.state());
    assert_eq!(reset_engine.volume_exists(), plain_engine.volume_exists());
    assert_eq!(
        reset_mgr.status().await.unwrap(),
        plain_mgr.status().await.unwrap()
    );

    // Same work besides the removal attempts on nothing.
    let creating: Vec<_> = reset_engine
        .calls()
        .into_iter()
        .filter(|c| !matches!(*c, "stop" | "remove_container" | "remove_volume"))
        .collect();
    assert_eq!(creating, plain_engine.calls());
}

// ── Reset confirmation ─────────────────────────────────────────────────────

#[tokio::test]
async fn reset_without_explicit_yes_changes_nothing() {
    for answer in ["", "y", "no", "YES please"] {
        let dir = tempdir().unwrap();
        let engine = Arc::new(FakeEngine::new());
        let mgr = manager(&engine, dir.path());
        mgr.start().await.unwrap();
        let calls_before = engine.calls();

        let confirm = ScriptedConfirm::new(answer);
        let outcome = mgr.reset(&confirm).await.unwrap();

        assert_eq!(outcome, ResetOutcome::Cancelled, "answer {answer:?}");
        assert_eq!(confirm.asked(), 1);
        assert_eq!(engine.calls(), calls_before);
        assert_eq!(engine.state(), ContainerState::Running);
        assert!(engine.volume_exists());
    }
}

// ── Status and absent containers ───────────────────────────────────────────

#[tokio::test]
async fn status_of_absent_container() {
    let dir = tempdir().unwrap();
    let engine = Arc::new(FakeEngine::new());
    let mgr = manager(&engine, dir.path());

    assert_eq!(mgr.status().await.unwrap(), DatabaseStatus::DoesNotExist);
    assert_eq!(engine.probe_count(), 0);
}

#[tokio::test]
async fn status_of_stopped_container() {
    let dir = tempdir().unwrap();
    let engine = Arc::new(FakeEngine::new().with_state(ContainerState::Stopped));
    let mgr = manager(&engine, dir.path());

    assert_eq!(mgr.status().await.unwrap(), DatabaseStatus::Stopped);
}

#[tokio::test]
async fn connect_requires_running_container() {
    let dir = tempdir().unwrap();

    let engine = Arc::new(FakeEngine::new());
    let mgr = manager(&engine, dir.path());
    assert!(matches!(
        mgr.connect().await,
        Err(LifecycleError::NotFound { .. })
    ));

    let engine = Arc::new(FakeEngine::new().with_state(ContainerState::Stopped));
    let mgr = manager(&engine, dir.path());
    assert!(matches!(
        mgr.connect().await,
        Err(LifecycleError::NotRunning { .. })
    ));
    assert_eq!(engine.count("attach_shell"), 0);

    let engine = Arc::new(FakeEngine::new().with_state(ContainerState::Running));
    let mgr = manager(&engine, dir.path());
    mgr.connect().await.unwrap();
    assert_eq!(engine.count("attach_shell"), 1);
}

#[tokio::test]
async fn logs_of_absent_container_fail() {
    let dir = tempdir().unwrap();
    let engine = Arc::new(FakeEngine::new());
    let mgr = manager(&engine, dir.path());

    assert!(matches!(
        mgr.logs(LogOptions::default()).await,
        Err(LifecycleError::NotFound { .. })
    ));
    assert_eq!(engine.count("stream_logs"), 0);
}

// ── Readiness polling ──────────────────────────────────────────────────────

#[tokio::test]
async fn readiness_gives_up_after_attempt_budget() {
    let dir = tempdir().unwrap();
    let engine = Arc::new(FakeEngine::new().probe_never_ready());
    let mgr = manager(&engine, dir.path());

    let err = mgr.start().await.unwrap_err();
    match &err {
        LifecycleError::ReadinessTimeout { attempts, logs, .. } => {
            assert_eq!(*attempts, 30);
            assert!(logs.contains("fake log line"));
        }
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(engine.probe_count(), 30);
    // The container is left running for inspection.
    assert_eq!(engine.state(), ContainerState::Running);
}

#[tokio::test]
async fn readiness_stops_at_first_success() {
    for k in [1, 2, 7, 30] {
        let dir = tempdir().unwrap();
        let engine = Arc::new(FakeEngine::new().probe_ready_after(k));
        let mgr = manager(&engine, dir.path());

        mgr.start().await.unwrap();
        assert_eq!(engine.probe_count(), k, "ready after {k}");
    }
}

#[tokio::test]
async fn custom_attempt_budget_is_honoured() {
    let dir = tempdir().unwrap();
    let engine = Arc::new(FakeEngine::new().probe_never_ready());
    let config = DatabaseConfig {
        init_dir: dir.path().to_path_buf(),
        ready_interval: Duration::from_millis(1),
        ready_attempts: 4,
        ..Default::default()
    };
    let mgr = LifecycleManager::new(config, engine.clone());

    assert!(mgr.wait_until_ready().await.is_err());
    assert_eq!(engine.probe_count(), 4);
}

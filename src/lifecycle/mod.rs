//! Lifecycle management for the LeanRAG MySQL container.
//!
//! One named container, one named data volume, and a read-only init-script
//! directory. Every verb reconciles the desired state against what Docker
//! reports, acting only where the two differ:
//!
//! ```text
//!            start                 start (create + start)
//!   Stopped ────────▶ Running ◀──────────────────────── Absent
//!      ▲                 │                                 ▲
//!      └──── stop ───────┘                                 │
//!                                reset (confirmed) ────────┘
//!                                then start
//! ```
//!
//! After any start the manager polls a liveness probe (`mysqladmin ping`
//! inside the container) a bounded number of times and fails with the tail
//! of the container output if the server never answers.

pub mod detect;
mod docker;
pub mod engine;
pub mod error;
pub mod init_script;
pub mod manager;
pub mod state;

pub use detect::{DockerStatus, Platform};
pub use docker::{DockerEngine, connect_docker};
pub use engine::{ContainerEngine, LogOptions, Removal};
pub use error::{LifecycleError, Result};
pub use manager::{LifecycleManager, ResetOutcome, ResetReport, StartOutcome, StopOutcome};
pub use state::{ContainerState, DatabaseStatus, StartAction, StopAction};

//! Bootstrap installer for the LeanRAG Python environment.
//!
//! Creates an isolated environment with the configured package manager and
//! installs dependency groups into it. The core group must succeed; optional
//! groups only produce warnings. A final import check decides whether the
//! result is complete or partial.

mod bootstrap;
pub mod error;
mod runner;

pub use bootstrap::{EnvStatus, InstallOutcome, InstallReport, Installer};
pub use error::{InstallError, Result};
pub use runner::{CommandRunner, Invocation, ProcessRunner};

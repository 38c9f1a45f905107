//! LeanRAG database tooling.
//!
//! Two operator tools share this crate:
//! - `leanrag-db` keeps a MySQL container in Docker in the state the operator
//!   asks for, and reports its readiness ([`lifecycle`]).
//! - `leanrag-bootstrap` prepares the Python environment the LeanRAG scripts
//!   run in ([`installer`]).

pub mod cli;
pub mod config;
pub mod error;
pub mod installer;
pub mod lifecycle;
pub mod prompt;
pub mod testing;

pub use config::{DatabaseConfig, InstallerConfig};
pub use error::ConfigError;

//! Configuration for the database lifecycle manager and the bootstrap installer.
//!
//! Values are resolved once at start-up: `.env` is loaded by the binary,
//! then each section reads its overrides from the environment and falls
//! back to the defaults the LeanRAG application expects.

mod database;
pub(crate) mod helpers;
mod installer;

pub use database::{
    CONTAINER_DATA_DIR, CONTAINER_INIT_DIR, ConnectionProfile, DEFAULT_DATABASE_NAME,
    DatabaseConfig, sanitize_database_name,
};
pub use installer::{
    DEFAULT_PYTHON_VERSION, DependencyGroup, ImportCheck, InstallerConfig, RequirementSource,
};

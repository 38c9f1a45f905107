//! Error types for the bootstrap installer.

use std::path::PathBuf;

use thiserror::Error;

/// Result type for installer operations.
pub type Result<T> = std::result::Result<T, InstallError>;

/// Fatal installer errors. Optional-group failures are warnings, not errors.
#[derive(Debug, Error)]
pub enum InstallError {
    /// Marker files are missing from the working directory.
    #[error(
        "{} does not look like the LeanRAG project root (missing: {}). Run the installer from the project root.",
        root.display(),
        missing.iter().map(|p| p.display().to_string()).collect::<Vec<_>>().join(", ")
    )]
    NotProjectRoot {
        root: PathBuf,
        missing: Vec<PathBuf>,
    },

    /// The package-management tool is not on PATH.
    #[error("'{tool}' not found on PATH. {hint}")]
    ToolMissing { tool: String, hint: String },

    /// Creating the environment failed.
    #[error("Failed to create environment {} with Python {version}", path.display())]
    EnvCreationFailed { path: PathBuf, version: String },

    /// The mandatory dependency group failed to install.
    #[error("Failed to install required dependency group '{group}'")]
    MandatoryGroupFailed { group: String },

    /// A mandatory module does not import after installation.
    #[error("Required module '{module}' cannot be imported ({verified}/{total} checks passed)")]
    MandatoryImportFailed {
        module: String,
        verified: usize,
        total: usize,
    },

    /// I/O error while launching a command.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

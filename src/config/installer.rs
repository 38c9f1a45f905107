use std::path::PathBuf;

use crate::config::helpers::optional_env;
use crate::error::ConfigError;

/// Python minor version used when none is given on the command line.
pub const DEFAULT_PYTHON_VERSION: &str = "3.11";

/// Where a dependency group's requirements come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequirementSource {
    /// A requirements file relative to the project root.
    File(PathBuf),
    /// An explicit list of package specifiers.
    Packages(Vec<String>),
}

/// A named set of packages installed in one package-manager call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DependencyGroup {
    pub name: String,
    pub source: RequirementSource,
    /// Mandatory groups abort the installation on failure.
    pub required: bool,
}

impl DependencyGroup {
    fn packages(name: &str, packages: &[&str]) -> Self {
        Self {
            name: name.to_string(),
            source: RequirementSource::Packages(packages.iter().map(|p| p.to_string()).collect()),
            required: false,
        }
    }
}

/// A module imported after installation to check the environment works.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportCheck {
    pub module: String,
    pub required: bool,
}

/// Configuration for the bootstrap installer.
#[derive(Debug, Clone)]
pub struct InstallerConfig {
    /// Directory the installer runs in.
    pub project_root: PathBuf,
    /// Files whose presence identifies the project root.
    pub marker_files: Vec<PathBuf>,
    /// Package-management tool expected on PATH.
    pub tool: String,
    /// Environment directory, relative to the project root.
    pub env_dir: PathBuf,
    /// Python version the environment is pinned to.
    pub python_version: String,
    /// The mandatory group.
    pub core: DependencyGroup,
    /// Optional groups, installed in order.
    pub optional: Vec<DependencyGroup>,
    /// Development tooling, installed only on confirmation.
    pub dev: DependencyGroup,
    pub import_checks: Vec<ImportCheck>,
}

impl Default for InstallerConfig {
    fn default() -> Self {
        Self {
            project_root: PathBuf::from("."),
            marker_files: vec![
                PathBuf::from("requirements.txt"),
                PathBuf::from("build_graph.py"),
            ],
            tool: "uv".to_string(),
            env_dir: PathBuf::from(".venv"),
            python_version: DEFAULT_PYTHON_VERSION.to_string(),
            core: DependencyGroup {
                name: "core".to_string(),
                source: RequirementSource::File(PathBuf::from("requirements.txt")),
                required: true,
            },
            optional: vec![
                DependencyGroup::packages("vector", &["pymilvus"]),
                DependencyGroup::packages("embeddings", &["ollama", "huggingface_hub"]),
                DependencyGroup::packages("llm", &["openai", "tiktoken"]),
            ],
            dev: DependencyGroup::packages("dev", &["pytest", "black", "ruff"]),
            import_checks: vec![
                ImportCheck {
                    module: "pymysql".to_string(),
                    required: true,
                },
                ImportCheck {
                    module: "pymilvus".to_string(),
                    required: false,
                },
                ImportCheck {
                    module: "ollama".to_string(),
                    required: false,
                },
            ],
        }
    }
}

impl InstallerConfig {
    /// Resolve from the environment, pinning `python_version` when given.
    pub fn resolve(python_version: Option<String>) -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let python_version = match python_version {
            Some(v) if !is_valid_python_version(&v) => {
                return Err(ConfigError::InvalidValue {
                    key: "PYTHON_VERSION".to_string(),
                    message: format!("'{v}' is not a version like 3.11"),
                });
            }
            Some(v) => v,
            None => defaults.python_version.clone(),
        };

        Ok(Self {
            tool: optional_env("LEANRAG_PYTHON_TOOL")?.unwrap_or(defaults.tool.clone()),
            env_dir: optional_env("LEANRAG_VENV_DIR")?
                .map(PathBuf::from)
                .unwrap_or(defaults.env_dir.clone()),
            python_version,
            ..defaults
        })
    }

    /// Absolute-or-relative path of the environment directory.
    pub fn env_path(&self) -> PathBuf {
        self.project_root.join(&self.env_dir)
    }

    /// Interpreter inside the environment.
    pub fn env_python(&self) -> PathBuf {
        if cfg!(windows) {
            self.env_path().join("Scripts").join("python.exe")
        } else {
            self.env_path().join("bin").join("python")
        }
    }

    /// Shell command that activates the environment.
    pub fn activation_hint(&self) -> String {
        if cfg!(windows) {
            format!("{}\\Scripts\\activate", self.env_dir.display())
        } else {
            format!("source {}/bin/activate", self.env_dir.display())
        }
    }
}

/// Accepts `MAJOR.MINOR` or `MAJOR.MINOR.PATCH`.
fn is_valid_python_version(v: &str) -> bool {
    let parts: Vec<&str> = v.split('.').collect();
    (2..=3).contains(&parts.len())
        && parts
            .iter()
            .all(|p| !p.is_empty() && p.chars().all(|c| c.is_ascii_digit()))
}

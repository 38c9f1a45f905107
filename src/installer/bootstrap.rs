//! The bootstrap sequence: environment, dependency groups, verification.

use std::sync::Arc;

use crate::config::{DependencyGroup, InstallerConfig, RequirementSource};
use crate::installer::error::{InstallError, Result};
use crate::installer::runner::{CommandRunner, Invocation};
use crate::prompt::{Confirm, is_yes};

/// Whether the environment was made by this run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnvStatus {
    Created,
    /// Already present and reused as is.
    Reused,
}

/// How a completed installation turned out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstallOutcome {
    /// Every group installed and every import check passed.
    Complete,
    /// Core works; some optional parts are missing.
    Partial,
}

/// Summary of a completed installation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallReport {
    pub env: EnvStatus,
    pub python_version: String,
    /// Optional groups (including dev) that failed to install.
    pub failed_groups: Vec<String>,
    /// `None` when the operator declined dev tooling.
    pub dev_installed: Option<bool>,
    /// Optional modules that failed to import.
    pub failed_imports: Vec<String>,
    pub verified: usize,
    pub total: usize,
}

impl InstallReport {
    pub fn outcome(&self) -> InstallOutcome {
        if self.failed_groups.is_empty() && self.verified == self.total {
            InstallOutcome::Complete
        } else {
            InstallOutcome::Partial
        }
    }
}

/// Runs the bootstrap sequence for one project.
pub struct Installer {
    config: InstallerConfig,
    runner: Arc<dyn CommandRunner>,
}

impl Installer {
    pub fn new(config: InstallerConfig, runner: Arc<dyn CommandRunner>) -> Self {
        Self { config, runner }
    }

    pub fn config(&self) -> &InstallerConfig {
        &self.config
    }

    /// Run every step in order. Only the environment, the core group and
    /// the required import can fail the run.
    pub async fn run(&self, confirm: &dyn Confirm) -> Result<InstallReport> {
        self.check_project_root()?;
        self.check_tool()?;

        let env = self.prepare_env().await?;

        tracing::info!("Installing required group '{}'", self.config.core.name);
        if !self.install_group(&self.config.core).await? {
            return Err(InstallError::MandatoryGroupFailed {
                group: self.config.core.name.clone(),
            });
        }

        let mut failed_groups = Vec::new();
        for group in &self.config.optional {
            tracing::info!("Installing optional group '{}'", group.name);
            if !self.install_group(group).await? {
                tracing::warn!(
                    "Optional group '{}' failed to install; continuing",
                    group.name
                );
                failed_groups.push(group.name.clone());
            }
        }

        let dev_installed = self.maybe_install_dev(confirm, &mut failed_groups).await?;

        let (verified, failed_imports) = self.verify().await?;

        Ok(InstallReport {
            env,
            python_version: self.config.python_version.clone(),
            failed_groups,
            dev_installed,
            failed_imports,
            verified,
            total: self.config.import_checks.len(),
        })
    }

    fn check_project_root(&self) -> Result<()> {
        let missing: Vec<_> = self
            .config
            .marker_files
            .iter()
            .filter(|marker| !self.config.project_root.join(marker).is_file())
            .cloned()
            .collect();

        if missing.is_empty() {
            Ok(())
        } else {
            Err(InstallError::NotProjectRoot {
                root: self.config.project_root.clone(),
                missing,
            })
        }
    }

    fn check_tool(&self) -> Result<()> {
        if self.runner.has_tool(&self.config.tool) {
            return Ok(());
        }
        let hint = match self.config.tool.as_str() {
            "uv" => "Install it with: curl -LsSf https://astral.sh/uv/install.sh | sh".to_string(),
            other => format!("Install '{other}' and make sure it is on PATH."),
        };
        Err(InstallError::ToolMissing {
            tool: self.config.tool.clone(),
            hint,
        })
    }

    async fn prepare_env(&self) -> Result<EnvStatus> {
        let path = self.config.env_path();
        if path.exists() {
            tracing::warn!(
                "Environment {} already exists; reusing it without recreating",
                path.display()
            );
            return Ok(EnvStatus::Reused);
        }

        tracing::info!(
            "Creating environment {} with Python {}",
            path.display(),
            self.config.python_version
        );
        let invocation = Invocation::new(&self.config.tool, &self.config.project_root)
            .args(["venv", "--python", self.config.python_version.as_str()])
            .arg(self.config.env_dir.to_string_lossy());

        if self.runner.run(invocation).await? {
            Ok(EnvStatus::Created)
        } else {
            Err(InstallError::EnvCreationFailed {
                path,
                version: self.config.python_version.clone(),
            })
        }
    }

    async fn install_group(&self, group: &DependencyGroup) -> Result<bool> {
        let mut invocation = Invocation::new(&self.config.tool, &self.config.project_root)
            .args(["pip", "install", "--python"])
            .arg(self.config.env_python().to_string_lossy());

        invocation = match &group.source {
            RequirementSource::File(path) => invocation.arg("-r").arg(path.to_string_lossy()),
            RequirementSource::Packages(packages) => invocation.args(packages.iter().cloned()),
        };

        Ok(self.runner.run(invocation).await?)
    }

    async fn maybe_install_dev(
        &self,
        confirm: &dyn Confirm,
        failed_groups: &mut Vec<String>,
    ) -> Result<Option<bool>> {
        let dev = &self.config.dev;
        let packages = match &dev.source {
            RequirementSource::Packages(p) => p.join(", "),
            RequirementSource::File(path) => path.display().to_string(),
        };

        let answer = confirm.ask(&format!("Install development tools ({packages})? [y/N]"))?;
        if !is_yes(&answer) {
            tracing::info!("Skipping development tools");
            return Ok(None);
        }

        let ok = self.install_group(dev).await?;
        if !ok {
            tracing::warn!("Development tools failed to install; continuing");
            failed_groups.push(dev.name.clone());
        }
        Ok(Some(ok))
    }

    /// Import each checked module with the environment's interpreter.
    async fn verify(&self) -> Result<(usize, Vec<String>)> {
        let python = self.config.env_python().to_string_lossy().into_owned();
        let total = self.config.import_checks.len();
        let mut verified = 0;
        let mut failed = Vec::new();

        for check in &self.config.import_checks {
            let invocation = Invocation::new(&python, &self.config.project_root)
                .arg("-c")
                .arg(format!("import {}", check.module));

            if self.runner.run(invocation).await? {
                tracing::info!("import {} ok", check.module);
                verified += 1;
            } else if check.required {
                return Err(InstallError::MandatoryImportFailed {
                    module: check.module.clone(),
                    verified,
                    total,
                });
            } else {
                tracing::warn!("Optional module '{}' cannot be imported", check.module);
                failed.push(check.module.clone());
            }
        }

        Ok((verified, failed))
    }
}

//! Running external commands for the installer.

use std::path::PathBuf;

use async_trait::async_trait;

use crate::lifecycle::detect::binary_exists;

/// One external command to run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub program: String,
    pub args: Vec<String>,
    pub cwd: PathBuf,
}

impl Invocation {
    pub fn new(program: impl Into<String>, cwd: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            cwd: cwd.into(),
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }
}

impl std::fmt::Display for Invocation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.program)?;
        for arg in &self.args {
            write!(f, " {}", arg)?;
        }
        Ok(())
    }
}

/// Launches commands and reports whether they succeeded.
#[async_trait]
pub trait CommandRunner: Send + Sync {
    /// Whether `tool` is on PATH.
    fn has_tool(&self, tool: &str) -> bool;

    /// Run to completion. `Ok(false)` means it ran and exited non-zero.
    async fn run(&self, invocation: Invocation) -> std::io::Result<bool>;
}

/// Runs commands as child processes with the terminal attached, so package
/// manager progress streams straight through.
pub struct ProcessRunner;

#[async_trait]
impl CommandRunner for ProcessRunner {
    fn has_tool(&self, tool: &str) -> bool {
        binary_exists(tool)
    }

    async fn run(&self, invocation: Invocation) -> std::io::Result<bool> {
        tracing::debug!("Running: {}", invocation);
        let status = tokio::process::Command::new(&invocation.program)
            .args(&invocation.args)
            .current_dir(&invocation.cwd)
            .status()
            .await?;
        Ok(status.success())
    }
}

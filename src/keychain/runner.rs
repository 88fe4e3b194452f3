//! Execution of `security` commands
//!
//! The provisioner never spawns processes itself; it hands each
//! [`SecurityCommand`] to a [`SecurityRunner`] and inspects the result.

use super::command::SecurityCommand;
use crate::error::{ProvisionError, Result};
use std::future::Future;

/// Default program used to administer keychains.
pub const SECURITY_PROGRAM: &str = "security";

/// Completion status and captured streams of one command.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SecurityOutput {
    /// Exit code, `None` if the process was killed by a signal.
    pub code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl SecurityOutput {
    #[must_use]
    pub fn ok(stdout: impl Into<String>) -> Self {
        Self {
            code: Some(0),
            stdout: stdout.into(),
            stderr: String::new(),
        }
    }

    #[must_use]
    pub fn failed(code: i32, stderr: impl Into<String>) -> Self {
        Self {
            code: Some(code),
            stdout: String::new(),
            stderr: stderr.into(),
        }
    }

    #[must_use]
    pub fn success(&self) -> bool {
        self.code == Some(0)
    }
}

/// Something that can carry out a `security` command.
///
/// Returning `Ok` means the command ran to completion, whatever its exit code;
/// `Err` is reserved for failing to run it at all.
pub trait SecurityRunner {
    fn run(&self, command: &SecurityCommand)
    -> impl Future<Output = Result<SecurityOutput>> + Send;
}

/// Runs commands as real child processes.
#[derive(Debug, Clone)]
pub struct SystemRunner {
    program: String,
}

impl SystemRunner {
    #[must_use]
    pub fn new() -> Self {
        Self::with_program(SECURITY_PROGRAM)
    }

    #[must_use]
    pub fn with_program(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }

    #[must_use]
    pub fn program(&self) -> &str {
        &self.program
    }
}

impl Default for SystemRunner {
    fn default() -> Self {
        Self::new()
    }
}

impl SecurityRunner for SystemRunner {
    async fn run(&self, command: &SecurityCommand) -> Result<SecurityOutput> {
        let output = tokio::process::Command::new(&self.program)
            .args(command.argv())
            .output()
            .await
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    ProvisionError::MissingDependency(format!(
                        "'{}' command not found.\n\
                         This tool requires macOS with the security framework.",
                        self.program
                    ))
                } else {
                    ProvisionError::CommandExecution(format!(
                        "Failed to execute security {}: {e}",
                        command.subcommand()
                    ))
                }
            })?;

        Ok(SecurityOutput {
            code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}

/// Prints each command instead of running it.
#[derive(Debug, Clone, Copy, Default)]
pub struct DryRunRunner;

impl SecurityRunner for DryRunRunner {
    async fn run(&self, command: &SecurityCommand) -> Result<SecurityOutput> {
        step!("[dry-run] {command}");
        Ok(SecurityOutput::ok(""))
    }
}

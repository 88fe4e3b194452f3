//! Error types for keychain provisioning.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, ProvisionError>;

#[derive(Debug, Error)]
pub enum ProvisionError {
    /// A precondition failed before any `security` command was issued.
    #[error("Invalid input: {0}")]
    Validation(String),

    /// `security` ran and reported failure.
    #[error("security {subcommand} failed: {stderr}")]
    CommandFailed {
        subcommand: String,
        code: Option<i32>,
        stderr: String,
    },

    #[error("Command execution failed: {0}")]
    CommandExecution(String),

    #[error("Missing dependency: {0}")]
    MissingDependency(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("File I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    Toml(#[from] toml::de::Error),
}

impl ProvisionError {
    /// Diagnostic text reported by `security`, if this error came from it.
    #[must_use]
    pub fn diagnostic(&self) -> Option<&str> {
        match self {
            Self::CommandFailed { stderr, .. } => Some(stderr),
            _ => None,
        }
    }
}

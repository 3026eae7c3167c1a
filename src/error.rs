//! Error types for the JBoss CLI deployment tool.
//!
//! Read-side problems (a deployment that cannot be queried) are not errors in
//! this crate; they are folded into "not deployed" by the deployer. What remains
//! here are configuration problems, failures to run the administrative CLI at
//! all, and deploy commands rejected by the server.

use std::path::PathBuf;
use thiserror::Error;

/// The main error type for the deployment tool.
#[derive(Debug, Error)]
pub enum DeployError {
    /// Configuration-related errors.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Administrative CLI errors.
    ///
    /// Displayed without a prefix so a rejected deploy surfaces the server's
    /// error text unchanged.
    #[error("{0}")]
    Cli(#[from] CliError),

    /// IO errors.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-related errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration file was not found.
    #[error("Configuration file not found: {path}")]
    FileNotFound {
        /// Path to the missing file.
        path: PathBuf,
    },

    /// The configuration file could not be parsed.
    #[error("Failed to parse configuration: {message}")]
    ParseError {
        /// Description of the parse error.
        message: String,
        /// Optional source location.
        location: Option<String>,
    },

    /// Validation failed.
    #[error("Configuration validation failed: {message}")]
    ValidationError {
        /// Description of the validation error.
        message: String,
        /// Field that failed validation.
        field: Option<String>,
    },

    /// An environment override could not be applied.
    #[error("Invalid value for environment variable {name}: {value}")]
    InvalidEnvVar {
        /// Name of the variable.
        name: String,
        /// The rejected value.
        value: String,
    },

    /// A deployment was requested that the configuration does not define.
    #[error("Deployment not defined in configuration: {name}")]
    UnknownDeployment {
        /// The requested name.
        name: String,
    },
}

/// Administrative CLI errors.
#[derive(Debug, Error)]
pub enum CliError {
    /// The CLI process could not be started.
    #[error("Failed to run {program}: {message}")]
    SpawnFailed {
        /// Program that was invoked.
        program: PathBuf,
        /// Description of the spawn failure.
        message: String,
    },

    /// The deploy command exited with a non-zero status.
    #[error("{stderr}")]
    DeployFailed {
        /// Deployment that failed.
        deployment: String,
        /// Error stream captured from the CLI, verbatim.
        stderr: String,
    },
}

/// Malformed management model text.
///
/// Never surfaced to the user: a response that cannot be read is treated
/// as "not deployed".
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message} at offset {offset}")]
pub struct ModelParseError {
    /// Byte offset where parsing stopped.
    pub offset: usize,
    /// What was expected.
    pub message: String,
}

/// Result type alias for deployment operations.
pub type Result<T> = std::result::Result<T, DeployError>;

impl DeployError {
    /// Returns true if this error came from a deploy command the server rejected.
    #[must_use]
    pub const fn is_deploy_failure(&self) -> bool {
        matches!(self, Self::Cli(CliError::DeployFailed { .. }))
    }
}

impl ConfigError {
    /// Creates a validation error for a specific field.
    #[must_use]
    pub fn validation(message: impl Into<String>, field: impl Into<String>) -> Self {
        Self::ValidationError {
            message: message.into(),
            field: Some(field.into()),
        }
    }
}

impl CliError {
    /// Creates a spawn error.
    #[must_use]
    pub fn spawn(program: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::SpawnFailed {
            program: program.into(),
            message: message.into(),
        }
    }

    /// Creates a deploy failure carrying the CLI's error stream.
    #[must_use]
    pub fn deploy_failed(deployment: impl Into<String>, stderr: impl Into<String>) -> Self {
        Self::DeployFailed {
            deployment: deployment.into(),
            stderr: stderr.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deploy_failure_displays_stderr_verbatim() {
        let stderr = "WFLYCTL0062: Composite operation failed\n  rolled back";
        let err = DeployError::from(CliError::deploy_failed("hello.war", stderr));

        assert_eq!(err.to_string(), stderr);
        assert!(err.is_deploy_failure());
    }

    #[test]
    fn test_spawn_failure_is_not_deploy_failure() {
        let err = DeployError::from(CliError::spawn("/opt/jboss/bin/jboss-cli.sh", "not found"));

        assert!(!err.is_deploy_failure());
        assert!(err.to_string().contains("jboss-cli.sh"));
    }
}

//! Configuration validation.
//!
//! Checks that every value can be turned into a well-formed CLI invocation
//! before anything is sent to the server.

use crate::error::{ConfigError, DeployError, Result};
use std::collections::HashSet;
use tracing::debug;

use super::target::{DeployConfig, DeploymentSpec, ServerConfig};

/// Validator for deployment configurations.
#[derive(Debug, Default)]
pub struct ConfigValidator {
    /// Whether an empty deployment list is an error.
    require_deployments: bool,
}

/// Validation result containing all errors found.
#[derive(Debug, Default)]
pub struct ValidationResult {
    /// List of validation errors.
    pub errors: Vec<ValidationError>,
    /// List of warnings (non-fatal issues).
    pub warnings: Vec<String>,
}

/// A single validation error.
#[derive(Debug)]
pub struct ValidationError {
    /// The field path that failed validation.
    pub field: String,
    /// The error message.
    pub message: String,
}

impl ConfigValidator {
    /// Creates a new validator that requires at least one deployment.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            require_deployments: true,
        }
    }

    /// Sets whether an empty deployment list is an error.
    #[must_use]
    pub const fn with_require_deployments(mut self, require: bool) -> Self {
        self.require_deployments = require;
        self
    }

    /// Validates a deployment configuration.
    ///
    /// # Errors
    ///
    /// Returns the first validation error if any were found.
    pub fn validate(&self, config: &DeployConfig) -> Result<ValidationResult> {
        let mut result = ValidationResult::default();

        Self::validate_server(&config.server, &mut result);
        self.validate_deployments(&config.deployments, &mut result);

        if result.errors.is_empty() {
            debug!("Configuration validation passed");
            Ok(result)
        } else {
            let first_error = &result.errors[0];
            Err(DeployError::Config(ConfigError::validation(
                first_error.message.clone(),
                first_error.field.clone(),
            )))
        }
    }

    /// Validates the management connection settings.
    fn validate_server(server: &ServerConfig, result: &mut ValidationResult) {
        if server.cli_path.as_os_str().is_empty() {
            result.errors.push(ValidationError {
                field: String::from("server.cli_path"),
                message: String::from("Path to the administrative CLI is required"),
            });
        } else if !server.cli_path.exists() {
            result.warnings.push(format!(
                "server.cli_path: '{}' does not exist on this machine",
                server.cli_path.display()
            ));
        }

        if server.host.trim().is_empty() {
            result.errors.push(ValidationError {
                field: String::from("server.host"),
                message: String::from("Host cannot be empty"),
            });
        }

        if server.port == 0 {
            result.errors.push(ValidationError {
                field: String::from("server.port"),
                message: String::from("Port must be between 1 and 65535"),
            });
        }

        if server.user.is_empty() {
            result.errors.push(ValidationError {
                field: String::from("server.user"),
                message: String::from("User cannot be empty"),
            });
        }

        if server.password.is_empty() {
            result
                .warnings
                .push(String::from("server.password: password is empty"));
        } else if server.password == super::target::DEFAULT_PASSWORD {
            result
                .warnings
                .push(String::from("server.password: using the default password"));
        }
    }

    /// Validates all deployment entries.
    fn validate_deployments(&self, deployments: &[DeploymentSpec], result: &mut ValidationResult) {
        if deployments.is_empty() {
            if self.require_deployments {
                result.errors.push(ValidationError {
                    field: String::from("deployments"),
                    message: String::from("No deployments defined"),
                });
            } else {
                result.warnings.push(String::from("No deployments defined in configuration"));
            }
            return;
        }

        let mut seen_names = HashSet::new();

        for (i, deployment) in deployments.iter().enumerate() {
            let prefix = format!("deployments[{i}]");

            if !seen_names.insert(deployment.name.as_str()) {
                result.errors.push(ValidationError {
                    field: format!("{prefix}.name"),
                    message: format!("Duplicate deployment name: {}", deployment.name),
                });
            }

            if deployment.name.is_empty() {
                result.errors.push(ValidationError {
                    field: format!("{prefix}.name"),
                    message: String::from("Deployment name cannot be empty"),
                });
            } else if !is_valid_deployment_name(&deployment.name) {
                result.errors.push(ValidationError {
                    field: format!("{prefix}.name"),
                    message: format!(
                        "Deployment name '{}' is invalid. It must not contain whitespace or any of ',' '/' '=' ':'.",
                        deployment.name
                    ),
                });
            }

            Self::validate_src(deployment, &prefix, result);
        }
    }

    /// Validates the source archive path.
    fn validate_src(deployment: &DeploymentSpec, prefix: &str, result: &mut ValidationResult) {
        if deployment.src.as_os_str().is_empty() {
            result.errors.push(ValidationError {
                field: format!("{prefix}.src"),
                message: String::from("Source path cannot be empty"),
            });
            return;
        }

        // Split on whitespace by the CLI's command parser.
        if deployment
            .src
            .to_string_lossy()
            .chars()
            .any(|c| c.is_whitespace() || c == ',')
        {
            result.errors.push(ValidationError {
                field: format!("{prefix}.src"),
                message: format!(
                    "Source path '{}' must not contain whitespace or commas",
                    deployment.src.display()
                ),
            });
        }

        if !deployment.src.is_file() {
            result.warnings.push(format!(
                "{prefix}.src: '{}' is not a readable file",
                deployment.src.display()
            ));
        }
    }
}

impl ValidationResult {
    /// Returns true if there are no errors.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Checks that a deployment name can be embedded in a management address
/// and in a comma-separated `--commands` list.
fn is_valid_deployment_name(name: &str) -> bool {
    !name
        .chars()
        .any(|c| c.is_whitespace() || matches!(c, ',' | '/' | '=' | ':'))
}

//! Configuration parser for loading and merging configuration files.
//!
//! Settings are layered in this order, later layers winning:
//! YAML file, `.env` / process environment, command-line flags.

use crate::error::{ConfigError, DeployError, Result};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use super::target::{DeployConfig, ServerConfig};

/// Environment variable overriding `server.cli_path`.
pub const ENV_CLI_PATH: &str = "JBOSS_CLI_PATH";
/// Environment variable overriding `server.host`.
pub const ENV_HOST: &str = "JBOSS_HOST";
/// Environment variable overriding `server.port`.
pub const ENV_PORT: &str = "JBOSS_PORT";
/// Environment variable overriding `server.user`.
pub const ENV_USER: &str = "JBOSS_USER";
/// Environment variable overriding `server.password`.
pub const ENV_PASSWORD: &str = "JBOSS_PASSWORD";

/// Configuration parser for loading deployment configuration.
#[derive(Debug, Default)]
pub struct ConfigParser {
    /// Base path for resolving relative paths.
    base_path: Option<PathBuf>,
}

/// Server settings given explicitly on the command line.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ServerOverrides {
    /// Path to the administrative CLI.
    pub cli_path: Option<PathBuf>,
    /// Management host.
    pub host: Option<String>,
    /// Management port.
    pub port: Option<u16>,
    /// Management user.
    pub user: Option<String>,
    /// Management password.
    pub password: Option<String>,
}

impl ConfigParser {
    /// Creates a new configuration parser.
    #[must_use]
    pub const fn new() -> Self {
        Self { base_path: None }
    }

    /// Sets the base path for resolving relative paths.
    #[must_use]
    pub fn with_base_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.base_path = Some(path.into());
        self
    }

    /// Loads configuration from a YAML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load_file(&self, path: impl AsRef<Path>) -> Result<DeployConfig> {
        let path = path.as_ref();
        info!("Loading configuration from: {}", path.display());

        if !path.exists() {
            return Err(DeployError::Config(ConfigError::FileNotFound {
                path: path.to_path_buf(),
            }));
        }

        let content = std::fs::read_to_string(path).map_err(|e| {
            DeployError::Config(ConfigError::ParseError {
                message: format!("Failed to read file: {e}"),
                location: Some(path.display().to_string()),
            })
        })?;

        let mut config = self.parse_yaml(&content, Some(path))?;
        self.resolve_relative_paths(&mut config);
        Ok(config)
    }

    /// Parses configuration from a YAML string.
    ///
    /// # Errors
    ///
    /// Returns an error if the YAML is invalid.
    pub fn parse_yaml(&self, content: &str, source: Option<&Path>) -> Result<DeployConfig> {
        debug!("Parsing YAML configuration");

        let config: DeployConfig = serde_yaml::from_str(content).map_err(|e| {
            let location = source.map(|p| p.display().to_string());
            DeployError::Config(ConfigError::ParseError {
                message: format!("YAML parse error: {e}"),
                location,
            })
        })?;

        debug!(
            "Successfully parsed configuration with {} deployment(s)",
            config.deployments.len()
        );
        Ok(config)
    }

    /// Loads configuration with environment variable overrides.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed, or an override is invalid.
    pub fn load_with_env(&self, path: impl AsRef<Path>) -> Result<DeployConfig> {
        let mut config = self.load_file(path)?;
        Self::apply_env_overrides(&mut config.server)?;
        Ok(config)
    }

    /// Applies `JBOSS_*` process environment overrides to the server settings.
    ///
    /// # Errors
    ///
    /// Returns an error if `JBOSS_PORT` is not a valid port number.
    pub fn apply_env_overrides(server: &mut ServerConfig) -> Result<()> {
        Self::apply_overrides_from(server, |name| std::env::var(name).ok())
    }

    /// Applies overrides read through `lookup` to the server settings.
    ///
    /// Empty values are ignored, so a blank `JBOSS_PASSWORD=` line keeps the
    /// configured password.
    ///
    /// # Errors
    ///
    /// Returns an error if the port value is not a valid port number.
    pub fn apply_overrides_from(
        server: &mut ServerConfig,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<()> {
        let lookup = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());

        if let Some(cli_path) = lookup(ENV_CLI_PATH) {
            debug!("Overriding server.cli_path from environment");
            server.cli_path = PathBuf::from(cli_path);
        }

        if let Some(host) = lookup(ENV_HOST) {
            debug!("Overriding server.host from environment");
            server.host = host;
        }

        if let Some(port) = lookup(ENV_PORT) {
            debug!("Overriding server.port from environment");
            server.port = port.trim().parse().map_err(|_| {
                DeployError::Config(ConfigError::InvalidEnvVar {
                    name: String::from(ENV_PORT),
                    value: port.clone(),
                })
            })?;
        }

        if let Some(user) = lookup(ENV_USER) {
            debug!("Overriding server.user from environment");
            server.user = user;
        }

        if let Some(password) = lookup(ENV_PASSWORD) {
            debug!("Overriding server.password from environment");
            server.password = password;
        }

        Ok(())
    }

    /// Loads the .env file if present.
    ///
    /// # Errors
    ///
    /// Returns an error if the .env file exists but cannot be loaded.
    pub fn load_dotenv(&self) -> Result<()> {
        let env_path = self
            .base_path
            .as_ref()
            .map_or_else(|| PathBuf::from(".env"), |p| p.join(".env"));

        if env_path.exists() {
            info!("Loading environment from: {}", env_path.display());
            dotenvy::from_path(&env_path).map_err(|e| {
                DeployError::Config(ConfigError::ParseError {
                    message: format!("Failed to load .env file: {e}"),
                    location: Some(env_path.display().to_string()),
                })
            })?;
        } else {
            debug!(".env file not found at: {}", env_path.display());
        }

        Ok(())
    }

    /// Makes relative `src` and `cli_path` entries relative to the base path.
    fn resolve_relative_paths(&self, config: &mut DeployConfig) {
        let Some(base) = &self.base_path else {
            return;
        };

        if config.server.cli_path.is_relative() && !config.server.cli_path.as_os_str().is_empty() {
            config.server.cli_path = base.join(&config.server.cli_path);
        }

        for deployment in &mut config.deployments {
            if deployment.src.is_relative() {
                deployment.src = base.join(&deployment.src);
            }
        }
    }
}

impl ServerOverrides {
    /// Returns true if no override is set.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.cli_path.is_none()
            && self.host.is_none()
            && self.port.is_none()
            && self.user.is_none()
            && self.password.is_none()
    }

    /// Applies the overrides that are set.
    pub fn apply(&self, server: &mut ServerConfig) {
        if let Some(cli_path) = &self.cli_path {
            server.cli_path.clone_from(cli_path);
        }
        if let Some(host) = &self.host {
            server.host.clone_from(host);
        }
        if let Some(port) = self.port {
            server.port = port;
        }
        if let Some(user) = &self.user {
            server.user.clone_from(user);
        }
        if let Some(password) = &self.password {
            server.password.clone_from(password);
        }
    }
}

/// Default configuration file names to search for.
pub const DEFAULT_CONFIG_FILES: &[&str] = &["jboss.deploy.yaml", "jboss.deploy.yml"];

/// Finds the configuration file in the given directory or its parents.
///
/// # Errors
///
/// Returns an error if no configuration file is found.
pub fn find_config_file(start_dir: impl AsRef<Path>) -> Result<PathBuf> {
    let start = start_dir.as_ref();
    let mut current = start.to_path_buf();

    loop {
        for filename in DEFAULT_CONFIG_FILES {
            let config_path = current.join(filename);
            if config_path.exists() {
                info!("Found configuration file: {}", config_path.display());
                return Ok(config_path);
            }
        }

        if !current.pop() {
            break;
        }
    }

    Err(DeployError::Config(ConfigError::FileNotFound {
        path: start.join(DEFAULT_CONFIG_FILES[0]),
    }))
}

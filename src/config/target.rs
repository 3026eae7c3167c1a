//! Configuration types for the deployment tool.
//!
//! These structs map to the `jboss.deploy.yaml` file: one `server` section
//! describing how to reach the management interface, and a list of
//! deployments to keep in sync with local archives.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

use crate::error::{ConfigError, Result};

/// Default management host.
pub const DEFAULT_HOST: &str = "localhost";

/// Default native management port.
pub const DEFAULT_PORT: u16 = 9999;

/// Default management user.
pub const DEFAULT_USER: &str = "admin";

/// Default management password.
pub const DEFAULT_PASSWORD: &str = "admin";

/// The root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct DeployConfig {
    /// Management connection settings.
    #[serde(default)]
    pub server: ServerConfig,
    /// Deployments to keep in sync.
    #[serde(default)]
    pub deployments: Vec<DeploymentSpec>,
}

/// How to reach the server's management interface.
#[derive(Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ServerConfig {
    /// Path to `jboss-cli.sh` (or `jboss-cli.bat`).
    #[serde(default)]
    pub cli_path: PathBuf,
    /// Management host.
    #[serde(default = "default_host")]
    pub host: String,
    /// Management port.
    #[serde(default = "default_port")]
    pub port: u16,
    /// Management user.
    #[serde(default = "default_user")]
    pub user: String,
    /// Management password.
    #[serde(default = "default_password")]
    pub password: String,
}

/// A single deployment entry from the configuration file.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DeploymentSpec {
    /// Deployment name as known to the server (e.g. `hello.war`).
    pub name: String,
    /// Path of the archive to deploy.
    pub src: PathBuf,
}

/// Everything needed to check and deploy one archive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeploymentTarget {
    /// Deployment name as known to the server.
    pub name: String,
    /// Path of the archive to deploy.
    pub src: PathBuf,
    /// Management connection settings.
    pub server: ServerConfig,
}

fn default_host() -> String {
    String::from(DEFAULT_HOST)
}

const fn default_port() -> u16 {
    DEFAULT_PORT
}

fn default_user() -> String {
    String::from(DEFAULT_USER)
}

fn default_password() -> String {
    String::from(DEFAULT_PASSWORD)
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            cli_path: PathBuf::new(),
            host: default_host(),
            port: DEFAULT_PORT,
            user: default_user(),
            password: default_password(),
        }
    }
}

impl fmt::Debug for ServerConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServerConfig")
            .field("cli_path", &self.cli_path)
            .field("host", &self.host)
            .field("port", &self.port)
            .field("user", &self.user)
            .field("password", &"********")
            .finish()
    }
}

impl ServerConfig {
    /// Returns the `host:port` controller address.
    #[must_use]
    pub fn controller(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl DeployConfig {
    /// Expands every configured deployment into a target.
    #[must_use]
    pub fn targets(&self) -> Vec<DeploymentTarget> {
        self.deployments
            .iter()
            .map(|d| DeploymentTarget {
                name: d.name.clone(),
                src: d.src.clone(),
                server: self.server.clone(),
            })
            .collect()
    }

    /// Returns the target for a single configured deployment.
    ///
    /// # Errors
    ///
    /// Returns an error if no deployment with that name is configured.
    pub fn target(&self, name: &str) -> Result<DeploymentTarget> {
        self.targets()
            .into_iter()
            .find(|t| t.name == name)
            .ok_or_else(|| {
                ConfigError::UnknownDeployment {
                    name: name.to_string(),
                }
                .into()
            })
    }

    /// Replaces the deployment list with a single ad-hoc deployment.
    pub fn set_single_deployment(&mut self, name: impl Into<String>, src: impl Into<PathBuf>) {
        self.deployments = vec![DeploymentSpec {
            name: name.into(),
            src: src.into(),
        }];
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_server_defaults() {
        let server = ServerConfig::default();

        assert_eq!(server.host, "localhost");
        assert_eq!(server.port, 9999);
        assert_eq!(server.user, "admin");
        assert_eq!(server.password, "admin");
        assert_eq!(server.controller(), "localhost:9999");
    }

    #[test]
    fn test_debug_redacts_password() {
        let server = ServerConfig {
            password: String::from("s3cret"),
            ..ServerConfig::default()
        };

        let rendered = format!("{server:?}");
        assert!(!rendered.contains("s3cret"));
        assert!(rendered.contains("********"));
    }

    #[test]
    fn test_targets_share_server() {
        let mut config = DeployConfig::default();
        config.server.host = String::from("192.168.0.5");
        config.deployments = vec![
            DeploymentSpec {
                name: String::from("a.war"),
                src: PathBuf::from("/tmp/a.war"),
            },
            DeploymentSpec {
                name: String::from("b.ear"),
                src: PathBuf::from("/tmp/b.ear"),
            },
        ];

        let targets = config.targets();
        assert_eq!(targets.len(), 2);
        assert!(targets.iter().all(|t| t.server.host == "192.168.0.5"));
        assert_eq!(targets[1].name, "b.ear");
    }

    #[test]
    fn test_target_unknown_name() {
        let config = DeployConfig::default();
        let result = config.target("missing.war");

        assert!(matches!(
            result,
            Err(crate::error::DeployError::Config(ConfigError::UnknownDeployment { .. }))
        ));
    }

    #[test]
    fn test_set_single_deployment() {
        let mut config = DeployConfig::default();
        config.set_single_deployment("hello.war", "/tmp/hello-1.0.war");

        let target = config.target("hello.war").expect("target should exist");
        assert_eq!(target.src, PathBuf::from("/tmp/hello-1.0.war"));
    }
}

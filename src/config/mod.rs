//! Configuration module for the deployment tool.
//!
//! This module handles all configuration-related functionality:
//! - Parsing and deserializing `jboss.deploy.yaml`
//! - Environment and command-line overrides
//! - Validation of configuration values
//! - Hashing local archives for change detection

mod target;
mod parser;
mod validator;
mod hash;

pub use target::{
    DeployConfig, DeploymentSpec, DeploymentTarget, ServerConfig, DEFAULT_HOST, DEFAULT_PASSWORD,
    DEFAULT_PORT, DEFAULT_USER,
};
pub use parser::{find_config_file, ConfigParser, ServerOverrides, DEFAULT_CONFIG_FILES};
pub use validator::{ConfigValidator, ValidationError, ValidationResult};
pub use hash::ArtifactHasher;

//! Administrative CLI integration.
//!
//! This module provides:
//! - A process runner seam for spawning the CLI
//! - Construction of the fixed-shape CLI command line
//! - Parsing of the server's textual management model
//! - Classification of read-resource responses

mod client;
mod model;
mod remote;
mod runner;

pub use client::{deploy_command, read_resource_command, redact_args, JbossCli};
pub use model::{checksum_from_output, ModelNode};
pub use remote::RemoteDeploymentState;
pub use runner::{CommandOutput, CommandRunner, ProcessRunner};

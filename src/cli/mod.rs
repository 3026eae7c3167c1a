//! CLI module for the deployment tool.
//!
//! This module provides the command-line interface for checking and
//! deploying archives.

mod commands;
mod output;

pub use commands::{Cli, Commands, OutputFormat, ServerArgs, TargetArgs};
pub use output::OutputFormatter;

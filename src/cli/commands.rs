//! CLI command definitions.
//!
//! This module defines all CLI commands and their arguments using clap.

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use crate::config::ServerOverrides;

/// jboss-deploy - Idempotent deployments through the JBoss/WildFly CLI.
#[derive(Parser, Debug)]
#[command(name = "jboss-deploy")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to the configuration file.
    #[arg(short, long, global = true, env = "JBOSS_DEPLOY_CONFIG")]
    pub config: Option<PathBuf>,

    /// Enable verbose output.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Output format (text, json).
    #[arg(long, global = true, default_value = "text")]
    pub output: OutputFormat,

    /// Management connection overrides.
    #[command(flatten)]
    pub server: ServerArgs,

    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,
}

/// Management connection options; each overrides the configuration file
/// and the `JBOSS_*` environment.
#[derive(Args, Debug, Clone, Default)]
pub struct ServerArgs {
    /// Path to jboss-cli.sh.
    #[arg(long, global = true)]
    pub cli_path: Option<PathBuf>,

    /// Host of the target server.
    #[arg(long, global = true)]
    pub host: Option<String>,

    /// Management port.
    #[arg(long, global = true)]
    pub port: Option<u16>,

    /// Management user.
    #[arg(long, global = true)]
    pub user: Option<String>,

    /// Management password.
    #[arg(long, global = true)]
    pub password: Option<String>,
}

/// Selects which deployments a command acts on.
#[derive(Args, Debug, Clone, Default)]
pub struct TargetArgs {
    /// Deployment name (e.g. hello.war). Alone, selects a configured deployment.
    #[arg(long)]
    pub name: Option<String>,

    /// Archive to deploy under --name, replacing the configured list.
    #[arg(long, requires = "name")]
    pub src: Option<PathBuf>,
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Deploy archives whose content differs from what the server has.
    Deploy {
        /// Deployment selection.
        #[command(flatten)]
        target: TargetArgs,
    },

    /// Report which deployments would change, without deploying.
    Check {
        /// Deployment selection.
        #[command(flatten)]
        target: TargetArgs,
    },

    /// Show remote and local state of every configured deployment.
    Status,

    /// Validate the configuration.
    Validate {
        /// Show all warnings, not just errors.
        #[arg(short, long)]
        warnings: bool,
    },

    /// Write a template configuration file.
    Init {
        /// Directory to initialize (defaults to current directory).
        #[arg(default_value = ".")]
        path: PathBuf,

        /// Force overwrite existing files.
        #[arg(short, long)]
        force: bool,
    },
}

/// Output format options.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text output.
    #[default]
    Text,
    /// JSON output for scripting.
    Json,
}

impl ServerArgs {
    /// Converts the flags into configuration overrides.
    #[must_use]
    pub fn to_overrides(&self) -> ServerOverrides {
        ServerOverrides {
            cli_path: self.cli_path.clone(),
            host: self.host.clone(),
            port: self.port,
            user: self.user.clone(),
            password: self.password.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_ad_hoc_deploy() {
        let cli = Cli::try_parse_from([
            "jboss-deploy",
            "deploy",
            "--name",
            "hello.war",
            "--src",
            "/tmp/hello-1.0-SNAPSHOT.war",
            "--cli-path",
            "/opt/jboss-as/bin/jboss-cli.sh",
            "--host",
            "192.168.0.5",
            "--password",
            "seceret",
        ])
        .expect("arguments should parse");

        let Commands::Deploy { target } = cli.command else {
            panic!("expected deploy command");
        };
        assert_eq!(target.name.as_deref(), Some("hello.war"));
        assert_eq!(target.src, Some(PathBuf::from("/tmp/hello-1.0-SNAPSHOT.war")));

        let overrides = cli.server.to_overrides();
        assert_eq!(overrides.host.as_deref(), Some("192.168.0.5"));
        assert_eq!(overrides.port, None);
        assert_eq!(overrides.password.as_deref(), Some("seceret"));
    }

    #[test]
    fn test_src_requires_name() {
        let result = Cli::try_parse_from(["jboss-deploy", "deploy", "--src", "/tmp/hello.war"]);

        assert!(result.is_err());
    }

    #[test]
    fn test_json_output_flag() {
        let cli = Cli::try_parse_from(["jboss-deploy", "status", "--output", "json"])
            .expect("arguments should parse");

        assert_eq!(cli.output, OutputFormat::Json);
        assert!(matches!(cli.command, Commands::Status));
    }

    #[test]
    fn test_invalid_port() {
        let result = Cli::try_parse_from(["jboss-deploy", "check", "--port", "70000"]);

        assert!(result.is_err());
    }
}

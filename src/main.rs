//! jboss-deploy CLI entrypoint.
//!
//! This is the main entrypoint for the jboss-deploy command-line tool.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use jboss_cli_deploy::cli::{Cli, Commands, OutputFormatter, TargetArgs};
use jboss_cli_deploy::config::{
    find_config_file, ConfigParser, ConfigValidator, DeployConfig, DeploymentTarget,
    ServerOverrides,
};
use jboss_cli_deploy::deployer::Deployer;
use jboss_cli_deploy::error::Result;

use clap::Parser;
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

/// Main entrypoint.
fn main() -> ExitCode {
    let cli = Cli::parse();

    // Initialize logging
    init_logging(cli.verbose);

    // Child processes are awaited one at a time
    let runtime = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("Failed to create async runtime: {e}");
            return ExitCode::FAILURE;
        }
    };

    let formatter = OutputFormatter::new(cli.output);

    match runtime.block_on(run(cli, &formatter)) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            formatter.emit_failure(&e);
            ExitCode::FAILURE
        }
    }
}

/// Initializes the logging system.
///
/// `RUST_LOG` takes precedence over `--verbose`.
fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

/// Main async entry point.
async fn run(cli: Cli, formatter: &OutputFormatter) -> Result<()> {
    let overrides = cli.server.to_overrides();

    match cli.command {
        Commands::Init { path, force } => cmd_init(&path, force),
        Commands::Validate { warnings } => {
            cmd_validate(cli.config.as_ref(), &overrides, warnings, formatter)
        }
        Commands::Deploy { target } => {
            cmd_deploy(cli.config.as_ref(), &overrides, &target, formatter).await
        }
        Commands::Check { target } => {
            cmd_check(cli.config.as_ref(), &overrides, &target, formatter).await
        }
        Commands::Status => cmd_status(cli.config.as_ref(), &overrides, formatter).await,
    }
}

/// Initialize a new project.
fn cmd_init(path: &Path, force: bool) -> Result<()> {
    info!("Initializing deployment configuration in: {}", path.display());

    let config_path = path.join("jboss.deploy.yaml");
    let env_path = path.join(".env.example");
    let gitignore_path = path.join(".gitignore");

    if !force && config_path.exists() {
        eprintln!("Configuration file already exists: {}", config_path.display());
        eprintln!("Use --force to overwrite.");
        return Ok(());
    }

    if !path.exists() {
        std::fs::create_dir_all(path)?;
    }

    std::fs::write(&config_path, include_str!("../templates/jboss.deploy.yaml"))?;
    eprintln!("Created: {}", config_path.display());

    std::fs::write(&env_path, include_str!("../templates/.env.example"))?;
    eprintln!("Created: {}", env_path.display());

    // Keep credentials out of version control
    if gitignore_path.exists() {
        let existing = std::fs::read_to_string(&gitignore_path)?;
        if !existing.lines().any(|line| line.trim() == ".env") {
            let mut file = std::fs::OpenOptions::new()
                .append(true)
                .open(&gitignore_path)?;
            writeln!(file, "\n.env")?;
            eprintln!("Updated: {}", gitignore_path.display());
        }
    } else {
        std::fs::write(&gitignore_path, ".env\n")?;
        eprintln!("Created: {}", gitignore_path.display());
    }

    eprintln!("\nNext steps:");
    eprintln!("  1. Copy .env.example to .env and set JBOSS_PASSWORD");
    eprintln!("  2. Edit jboss.deploy.yaml with your server and deployments");
    eprintln!("  3. Run 'jboss-deploy check' to see what would change");
    eprintln!("  4. Run 'jboss-deploy deploy' to deploy");

    Ok(())
}

/// Validate configuration.
fn cmd_validate(
    config_path: Option<&PathBuf>,
    overrides: &ServerOverrides,
    show_warnings: bool,
    formatter: &OutputFormatter,
) -> Result<()> {
    let config = load_config(config_path, overrides, false)?;
    let result = ConfigValidator::new().validate(&config)?;

    formatter.emit(&formatter.format_validation(&result, show_warnings))?;

    eprintln!("\nConfiguration summary:");
    eprintln!("  Controller: {}", config.server.controller());
    eprintln!("  CLI: {}", config.server.cli_path.display());
    eprintln!("  Deployments: {}", config.deployments.len());

    Ok(())
}

/// Deploy everything that differs from the server.
async fn cmd_deploy(
    config_path: Option<&PathBuf>,
    overrides: &ServerOverrides,
    target: &TargetArgs,
    formatter: &OutputFormatter,
) -> Result<()> {
    let targets = resolve_targets(config_path, overrides, target)?;

    let deployer = Deployer::new();
    let report = deployer.apply_all(&targets).await?;

    formatter.emit(&formatter.format_report(&report))?;
    Ok(())
}

/// Report what a deploy would change.
async fn cmd_check(
    config_path: Option<&PathBuf>,
    overrides: &ServerOverrides,
    target: &TargetArgs,
    formatter: &OutputFormatter,
) -> Result<()> {
    let targets = resolve_targets(config_path, overrides, target)?;

    let deployer = Deployer::new();
    let mut checks = Vec::with_capacity(targets.len());
    for target in &targets {
        checks.push(deployer.inspect(target).await?);
    }

    formatter.emit(&formatter.format_check(&checks))?;
    Ok(())
}

/// Show deployment status.
async fn cmd_status(
    config_path: Option<&PathBuf>,
    overrides: &ServerOverrides,
    formatter: &OutputFormatter,
) -> Result<()> {
    let config = load_config(config_path, overrides, false)?;
    validate_quietly(&config, false)?;

    let deployer = Deployer::new();
    let mut checks = Vec::with_capacity(config.deployments.len());
    for target in config.targets() {
        checks.push(deployer.inspect(&target).await?);
    }

    formatter.emit(&formatter.format_status(&checks))?;
    Ok(())
}

// ============================================================================
// Helper Functions
// ============================================================================

/// Loads configuration from file, `.env`, environment, and flags.
///
/// Without a configuration file the defaults are used, but only when
/// `allow_missing` is set (ad-hoc `--name`/`--src` runs).
fn load_config(
    config_path: Option<&PathBuf>,
    overrides: &ServerOverrides,
    allow_missing: bool,
) -> Result<DeployConfig> {
    let config_file = match config_path {
        Some(path) => Some(path.clone()),
        None => match find_config_file(".") {
            Ok(path) => Some(path),
            Err(e) if !allow_missing => return Err(e),
            Err(_) => None,
        },
    };

    let mut config = if let Some(config_file) = config_file {
        debug!("Loading configuration from: {}", config_file.display());
        let parser = ConfigParser::new().with_base_path(
            config_file
                .parent()
                .unwrap_or_else(|| Path::new(".")),
        );
        parser.load_dotenv()?;
        parser.load_with_env(&config_file)?
    } else {
        debug!("No configuration file, using defaults");
        ConfigParser::new().load_dotenv()?;
        let mut config = DeployConfig::default();
        ConfigParser::apply_env_overrides(&mut config.server)?;
        config
    };

    if !overrides.is_empty() {
        debug!("Applying command-line server overrides");
    }
    overrides.apply(&mut config.server);

    Ok(config)
}

/// Loads configuration and picks the deployments a command acts on.
fn resolve_targets(
    config_path: Option<&PathBuf>,
    overrides: &ServerOverrides,
    target: &TargetArgs,
) -> Result<Vec<DeploymentTarget>> {
    let ad_hoc = target.src.is_some();
    let mut config = load_config(config_path, overrides, ad_hoc)?;

    if let (Some(name), Some(src)) = (&target.name, &target.src) {
        config.set_single_deployment(name.clone(), src.clone());
    }

    validate_quietly(&config, true)?;

    match &target.name {
        Some(name) if !ad_hoc => Ok(vec![config.target(name)?]),
        _ => Ok(config.targets()),
    }
}

/// Validates configuration, logging warnings instead of printing them.
fn validate_quietly(config: &DeployConfig, require_deployments: bool) -> Result<()> {
    let result = ConfigValidator::new()
        .with_require_deployments(require_deployments)
        .validate(config)?;
    for warning in &result.warnings {
        warn!("{warning}");
    }
    Ok(())
}

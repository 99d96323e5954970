//! dokploy-deploy CLI entrypoint.
//!
//! This is the main entrypoint for the dokploy-deploy command-line tool.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use dokploy_deploy::cli::{
    Cli, Commands, OutputFormatter, failure_pairs, outcome_pairs, write_github_outputs,
};
use dokploy_deploy::config::{
    ConfigParser, ConfigValidator, DeployConfig, HealthCheckConfig, find_config_file,
};
use dokploy_deploy::deployer::Deployer;
use dokploy_deploy::dokploy::{DokployClient, Gateway};
use dokploy_deploy::error::{ConfigError, Result};
use dokploy_deploy::health::HealthChecker;

use clap::Parser;
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

/// Main entrypoint.
fn main() -> ExitCode {
    let cli = Cli::parse();

    // Initialize logging
    init_logging(cli.verbose, cli.log_json);

    // Run async runtime
    let runtime = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("Failed to create async runtime: {e}");
            return ExitCode::FAILURE;
        }
    };

    let formatter = OutputFormatter::new(cli.output);
    let is_deploy = matches!(cli.command, Commands::Deploy);

    match runtime.block_on(run(cli, &formatter)) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            if is_deploy {
                if let Err(output_err) = write_github_outputs(&failure_pairs()) {
                    warn!("Failed to write outputs: {output_err}");
                }
            }
            eprintln!("{}", formatter.format_error(&format!("Error: {e}")));
            ExitCode::FAILURE
        }
    }
}

/// Initializes the logging system.
///
/// `RUST_LOG` takes precedence over the verbosity flag.
fn init_logging(verbose: bool, json: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr);

    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

/// Main async entry point.
async fn run(cli: Cli, formatter: &OutputFormatter) -> Result<()> {
    match cli.command {
        Commands::Deploy => cmd_deploy(cli.config.as_deref(), formatter).await,
        Commands::Validate { warnings } => cmd_validate(cli.config.as_deref(), warnings, formatter),
        Commands::Health {
            url,
            path,
            retries,
            interval,
            timeout,
        } => {
            let config = HealthCheckConfig {
                enabled: true,
                path,
                timeout_secs: timeout,
                retries,
                interval_secs: interval,
            };
            cmd_health(&url, config, formatter).await
        }
        Commands::Init { path, force } => cmd_init(&path, force, formatter),
    }
}

/// Run the full deployment pipeline.
async fn cmd_deploy(config_path: Option<&Path>, formatter: &OutputFormatter) -> Result<()> {
    let config = load_config(config_path)?;
    ConfigValidator::new().validate(&config)?;

    let (Some(url), Some(api_key)) = (config.api.url.as_deref(), config.api.api_key.as_deref())
    else {
        return Err(ConfigError::MissingInput {
            name: String::from("dokploy-url"),
        }
        .into());
    };

    let client = DokployClient::new(url, api_key)?;
    let checker = HealthChecker::http(config.health_check.clone())?;

    info!("Deploying {} to {url}", config.image().unwrap_or_default());
    let outcome = Deployer::new(Gateway::new(&client), &config)
        .run(&checker)
        .await?;

    write_github_outputs(&outcome_pairs(&outcome))?;
    eprintln!("{}", formatter.format_outcome(&outcome));

    Ok(())
}

/// Validate configuration.
fn cmd_validate(
    config_path: Option<&Path>,
    show_warnings: bool,
    formatter: &OutputFormatter,
) -> Result<()> {
    let config = load_config(config_path)?;

    let validator = ConfigValidator::new();
    eprintln!(
        "{}",
        formatter.format_validation(&validator.check(&config), show_warnings)
    );

    validator.validate(&config)?;
    Ok(())
}

/// Run only the health check.
async fn cmd_health(url: &str, config: HealthCheckConfig, formatter: &OutputFormatter) -> Result<()> {
    let checker = HealthChecker::http(config)?;
    let report = checker.verify(Some(url)).await;

    eprintln!("{}", formatter.format_health(&report));
    Ok(())
}

/// Write a template configuration file.
fn cmd_init(path: &Path, force: bool, formatter: &OutputFormatter) -> Result<()> {
    info!("Initializing configuration in: {}", path.display());

    let config_path = path.join("dokploy.deploy.yaml");

    // Check if files exist
    if !force && config_path.exists() {
        eprintln!("Configuration file already exists: {}", config_path.display());
        eprintln!("Use --force to overwrite.");
        return Ok(());
    }

    // Create directory if needed
    if !path.exists() {
        std::fs::create_dir_all(path)?;
    }

    let config_template = include_str!("../templates/dokploy.deploy.yaml");
    std::fs::write(&config_path, config_template)?;

    eprintln!(
        "{}",
        formatter.format_success(&format!("Created: {}", config_path.display()))
    );
    eprintln!("Next steps:");
    eprintln!("  1. Set DOKPLOY_URL and DOKPLOY_API_KEY (or a .env file)");
    eprintln!("  2. Edit dokploy.deploy.yaml with your project and image");
    eprintln!("  3. Run 'dokploy-deploy validate --warnings'");
    eprintln!("  4. Run 'dokploy-deploy deploy'");

    Ok(())
}

// ============================================================================
// Helper Functions
// ============================================================================

/// Resolves the configuration file path, if any.
fn resolve_config_path(config_path: Option<&Path>) -> Option<PathBuf> {
    config_path.map_or_else(|| find_config_file("."), |path| Some(path.to_path_buf()))
}

/// Loads `.env`, the optional configuration file and pipeline inputs.
fn load_config(config_path: Option<&Path>) -> Result<DeployConfig> {
    let config_file = resolve_config_path(config_path);

    let base = config_file
        .as_deref()
        .and_then(Path::parent)
        .unwrap_or_else(|| Path::new("."));
    let parser = ConfigParser::new().with_base_path(base);
    parser.load_dotenv()?;

    match &config_file {
        Some(file) => debug!("Loading configuration from: {}", file.display()),
        None => debug!("No configuration file found; using inputs only"),
    }

    parser.load(config_file.as_deref())
}

//! CLI command definitions.
//!
//! This module defines all CLI commands and their arguments using clap.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Deploy docker images to Dokploy.
#[derive(Parser, Debug)]
#[command(name = "dokploy-deploy")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to the configuration file.
    #[arg(short, long, global = true, env = "DOKPLOY_DEPLOY_CONFIG")]
    pub config: Option<PathBuf>,

    /// Enable verbose output.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Emit logs as JSON lines.
    #[arg(long, global = true)]
    pub log_json: bool,

    /// Output format (text, json).
    #[arg(long, global = true, default_value = "text")]
    pub output: OutputFormat,

    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Resolve resources, configure the application, deploy and verify.
    Deploy,

    /// Validate the deployment configuration.
    Validate {
        /// Show all warnings, not just errors.
        #[arg(short, long)]
        warnings: bool,
    },

    /// Run only the health check against a URL.
    Health {
        /// Base URL of the deployment.
        #[arg(long)]
        url: String,

        /// Path appended to the URL.
        #[arg(long, default_value = "/health")]
        path: String,

        /// Number of attempts (at least 1).
        #[arg(long, default_value = "3", value_parser = clap::value_parser!(u32).range(1..))]
        retries: u32,

        /// Seconds between attempts.
        #[arg(long, default_value = "10")]
        interval: u64,

        /// Total timeout in seconds.
        #[arg(long, default_value = "60")]
        timeout: u64,
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

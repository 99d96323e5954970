//! Output formatting for CLI commands.
//!
//! Results are rendered as a table or as JSON, and can additionally be
//! appended as `key=value` lines to a pipeline outputs file.

use colored::Colorize;
use std::fmt::Write as _;
use std::io::Write as _;
use std::path::Path;
use tabled::{Table, Tabled};

use crate::config::ValidationResult;
use crate::deployer::{DeploymentOutcome, DeploymentStatus};
use crate::error::Result;
use crate::health::{HealthReport, HealthVerdict};

use super::commands::OutputFormat;

/// Environment variable naming the pipeline outputs file.
pub const GITHUB_OUTPUT_ENV: &str = "GITHUB_OUTPUT";

/// Output formatter for CLI.
#[derive(Debug)]
pub struct OutputFormatter {
    /// Output format.
    format: OutputFormat,
}

/// Key/value row for table display.
#[derive(Tabled)]
struct OutputRow {
    #[tabled(rename = "Output")]
    key: &'static str,
    #[tabled(rename = "Value")]
    value: String,
}

impl OutputFormatter {
    /// Creates a new output formatter.
    #[must_use]
    pub const fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    /// Formats a deployment outcome for display.
    #[must_use]
    pub fn format_outcome(&self, outcome: &DeploymentOutcome) -> String {
        match self.format {
            OutputFormat::Json => serde_json::to_string_pretty(outcome).unwrap_or_default(),
            OutputFormat::Text => {
                let rows: Vec<OutputRow> = outcome_pairs(outcome)
                    .into_iter()
                    .map(|(key, value)| OutputRow { key, value })
                    .collect();

                let mut output = format!(
                    "\n{} Deployment {}\n\n",
                    "✓".green(),
                    outcome.status.as_str().green()
                );
                output.push_str(&Table::new(rows).to_string());
                output.push('\n');

                if outcome.health.verdict == HealthVerdict::Unhealthy {
                    let _ = write!(
                        output,
                        "\n{} Health check failed after {} attempt(s)\n",
                        "⚠".yellow(),
                        outcome.health.attempts
                    );
                }

                output
            }
        }
    }

    /// Formats a standalone health check result.
    #[must_use]
    pub fn format_health(&self, report: &HealthReport) -> String {
        match self.format {
            OutputFormat::Json => serde_json::to_string_pretty(report).unwrap_or_default(),
            OutputFormat::Text => {
                let verdict = match report.verdict {
                    HealthVerdict::Healthy => "healthy".green(),
                    HealthVerdict::Unhealthy => "unhealthy".red(),
                    HealthVerdict::Skipped => "skipped".dimmed(),
                };
                format!(
                    "Health: {verdict} ({} attempt(s), {})\n",
                    report.attempts,
                    report.url.as_deref().unwrap_or("-")
                )
            }
        }
    }

    /// Formats a validation result.
    #[must_use]
    pub fn format_validation(&self, result: &ValidationResult, show_warnings: bool) -> String {
        match self.format {
            OutputFormat::Json => {
                let errors: Vec<_> = result
                    .errors
                    .iter()
                    .map(|e| serde_json::json!({ "field": e.field, "message": e.message }))
                    .collect();
                let json = serde_json::json!({
                    "valid": result.errors.is_empty(),
                    "errors": errors,
                    "warnings": result.warnings,
                });
                serde_json::to_string_pretty(&json).unwrap_or_default()
            }
            OutputFormat::Text => {
                let mut output = if result.errors.is_empty() {
                    format!("{} Configuration is valid\n", "✓".green())
                } else {
                    let mut out = format!("{} Configuration is invalid:\n", "✗".red());
                    for error in &result.errors {
                        let _ = writeln!(out, "   - {}: {}", error.field, error.message);
                    }
                    out
                };

                if show_warnings && !result.warnings.is_empty() {
                    let _ = write!(output, "\n{} Warnings:\n", "⚠".yellow());
                    for warning in &result.warnings {
                        let _ = writeln!(output, "   - {warning}");
                    }
                }

                output
            }
        }
    }

    /// Formats an error message.
    #[must_use]
    pub fn format_error(&self, message: &str) -> String {
        match self.format {
            OutputFormat::Json => {
                let json = serde_json::json!({ "status": "error", "message": message });
                serde_json::to_string_pretty(&json).unwrap_or_default()
            }
            OutputFormat::Text => format!("{} {message}", "✗".red()),
        }
    }

    /// Formats a success message.
    #[must_use]
    pub fn format_success(&self, message: &str) -> String {
        match self.format {
            OutputFormat::Json => {
                let json = serde_json::json!({ "status": "success", "message": message });
                serde_json::to_string_pretty(&json).unwrap_or_default()
            }
            OutputFormat::Text => format!("{} {message}", "✓".green()),
        }
    }
}

/// Output names and values of a successful run, in a fixed order.
#[must_use]
pub fn outcome_pairs(outcome: &DeploymentOutcome) -> Vec<(&'static str, String)> {
    vec![
        ("project-id", outcome.project_id.clone()),
        ("environment-id", outcome.environment_id.clone()),
        ("server-id", outcome.server_id.clone().unwrap_or_default()),
        ("application-id", outcome.application_id.clone()),
        (
            "deployment-url",
            outcome.deployment_url.clone().unwrap_or_default(),
        ),
        ("deployment-status", outcome.status.to_string()),
        ("health-check-status", outcome.health.verdict.to_string()),
    ]
}

/// Outputs of an aborted run.
#[must_use]
pub fn failure_pairs() -> Vec<(&'static str, String)> {
    vec![("deployment-status", DeploymentStatus::Failed.to_string())]
}

/// Appends `key=value` lines to the file named by `GITHUB_OUTPUT`, if set.
///
/// # Errors
///
/// Returns an error if the outputs file cannot be written.
pub fn write_github_outputs(pairs: &[(&'static str, String)]) -> Result<()> {
    match std::env::var_os(GITHUB_OUTPUT_ENV) {
        Some(path) => append_outputs(Path::new(&path), pairs),
        None => Ok(()),
    }
}

/// Appends `key=value` lines to an outputs file.
///
/// # Errors
///
/// Returns an error if the file cannot be opened or written.
pub fn append_outputs(path: &Path, pairs: &[(&'static str, String)]) -> Result<()> {
    let mut file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)?;

    for (key, value) in pairs {
        writeln!(file, "{key}={value}")?;
    }
    Ok(())
}

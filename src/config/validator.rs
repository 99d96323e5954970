//! Configuration validation for deployment runs.
//!
//! Everything checked here is checked before the first network call, so a
//! misconfigured run fails without touching the remote platform.

use tracing::debug;

use crate::apply::{ResourceSettings, flatten_json};
use crate::error::{ConfigError, DeployError, Result};

use super::spec::DeployConfig;

/// Validator for deployment configurations.
#[derive(Debug, Default, Clone, Copy)]
pub struct ConfigValidator;

/// Validation result containing all errors found.
#[derive(Debug, Default)]
pub struct ValidationResult {
    /// List of validation errors.
    pub errors: Vec<ValidationError>,
    /// List of warnings (non-fatal issues).
    pub warnings: Vec<String>,
}

/// A single validation error.
#[derive(Debug)]
pub struct ValidationError {
    /// The field path that failed validation.
    pub field: String,
    /// The error message.
    pub message: String,
}

impl ValidationResult {
    fn error(&mut self, field: &str, message: impl Into<String>) {
        self.errors.push(ValidationError {
            field: field.to_string(),
            message: message.into(),
        });
    }
}

impl ConfigValidator {
    /// Creates a new validator.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Validates a deployment configuration.
    ///
    /// # Errors
    ///
    /// Returns the first validation error if any check fails.
    pub fn validate(&self, config: &DeployConfig) -> Result<ValidationResult> {
        let result = self.check(config);

        if let Some(first_error) = result.errors.first() {
            return Err(
                ConfigError::validation(first_error.message.clone(), first_error.field.clone())
                    .into(),
            );
        }

        debug!("Configuration validation passed");
        Ok(result)
    }

    /// Collects every error and warning without failing.
    #[must_use]
    pub fn check(&self, config: &DeployConfig) -> ValidationResult {
        let mut result = ValidationResult::default();

        Self::validate_api(config, &mut result);
        Self::validate_docker(config, &mut result);
        Self::validate_application(config, &mut result);
        Self::validate_env(config, &mut result);
        Self::validate_domain(config, &mut result);
        Self::validate_health_check(config, &mut result);

        result
    }

    fn validate_api(config: &DeployConfig, result: &mut ValidationResult) {
        match config.api.url.as_deref() {
            None => result.error("dokploy-url", "Dokploy URL is required"),
            Some(url) if !(url.starts_with("http://") || url.starts_with("https://")) => {
                result.error(
                    "dokploy-url",
                    format!("Dokploy URL '{url}' must start with http:// or https://"),
                );
            }
            Some(_) => {}
        }

        if config.api.api_key.is_none() {
            result.error("api-key", "Dokploy API key is required");
        }
    }

    fn validate_docker(config: &DeployConfig, result: &mut ValidationResult) {
        if config.image().is_none() {
            result.error("docker-image", "Docker image is required");
        }

        if config.docker.password.is_some() && config.docker.username.is_none() {
            result
                .warnings
                .push(String::from("registry-password is set without registry-username"));
        }
    }

    fn validate_application(config: &DeployConfig, result: &mut ValidationResult) {
        if let Err(DeployError::Config(ConfigError::InvalidNumericInput { field, raw_value })) =
            ResourceSettings::parse(&config.application)
        {
            result.error(&field, format!("'{raw_value}' is not a valid number"));
        }
    }

    fn validate_env(config: &DeployConfig, result: &mut ValidationResult) {
        if let Some(Err(e)) = config.env.json.as_deref().map(flatten_json) {
            result.error("env-json", e.to_string());
        }

        if config.env.file.is_some() {
            result.warnings.push(String::from(
                "env-file is not read yet; variables from it will not be applied",
            ));
        }
    }

    fn validate_domain(config: &DeployConfig, result: &mut ValidationResult) {
        if config.domain.port == Some(0) {
            result.error("domain-port", "Domain port must be between 1 and 65535");
        }

        if config.domain.force_recreate && config.domain.host.is_none() {
            result
                .warnings
                .push(String::from("force-domain-recreate has no effect without domain-host"));
        }
    }

    fn validate_health_check(config: &DeployConfig, result: &mut ValidationResult) {
        if config.health_check.enabled && config.health_check.retries == 0 {
            result.error("health-check-retries", "Health check retries must be at least 1");
        }
    }
}

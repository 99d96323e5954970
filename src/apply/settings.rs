//! Application settings: create-body construction and in-place updates.
//!
//! Numeric resource and scaling fields are carried as strings up to this
//! point. A value that parses to zero, or is blank, is omitted from the
//! request rather than sent as an explicit zero.

use serde::Serialize;

use crate::config::{ApplicationConfig, RestartPolicy};
use crate::error::{ConfigError, Result};

/// Port used when neither `port` nor `target-port` is supplied.
pub const DEFAULT_PORT: u16 = 8080;

/// Status sentinel for a freshly created application.
pub const INITIAL_STATUS: &str = "idle";

/// Parses a non-negative integer field. Blank or zero means "not set".
///
/// # Errors
///
/// Returns `InvalidNumericInput` if the value is not a plain integer.
pub fn parse_count(field: &str, raw: Option<&str>) -> Result<Option<u64>> {
    let Some(raw) = raw else {
        return Ok(None);
    };
    parse_trimmed(field, raw, raw.trim())
}

/// Parses a CPU field, accepting an optional trailing `m`/`M` unit.
///
/// # Errors
///
/// Returns `InvalidNumericInput` if the remainder is not a plain integer.
pub fn parse_cpu(field: &str, raw: Option<&str>) -> Result<Option<u64>> {
    let Some(raw) = raw else {
        return Ok(None);
    };
    let trimmed = raw.trim();
    let digits = trimmed
        .strip_suffix(['m', 'M'])
        .unwrap_or(trimmed);
    parse_trimmed(field, raw, digits)
}

fn parse_trimmed(field: &str, raw: &str, digits: &str) -> Result<Option<u64>> {
    if digits.is_empty() {
        return Ok(None);
    }
    let value: u64 = digits
        .parse()
        .map_err(|_| ConfigError::numeric(field, raw))?;
    Ok((value != 0).then_some(value))
}

/// Resource limits and scaling parameters, each omitted when unset.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceSettings {
    /// Memory limit.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub memory_limit: Option<u64>,
    /// Memory reservation.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub memory_reservation: Option<u64>,
    /// CPU limit.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cpu_limit: Option<u64>,
    /// CPU reservation.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cpu_reservation: Option<u64>,
    /// Replica count.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub replicas: Option<u64>,
    /// Minimum replicas.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_replicas: Option<u64>,
    /// Maximum replicas.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_replicas: Option<u64>,
}

impl ResourceSettings {
    /// Parses every numeric field of the application configuration.
    ///
    /// # Errors
    ///
    /// Returns `InvalidNumericInput` naming the first field that fails.
    pub fn parse(app: &ApplicationConfig) -> Result<Self> {
        Ok(Self {
            memory_limit: parse_count("memoryLimit", app.memory_limit.as_deref())?,
            memory_reservation: parse_count("memoryReservation", app.memory_reservation.as_deref())?,
            cpu_limit: parse_cpu("cpuLimit", app.cpu_limit.as_deref())?,
            cpu_reservation: parse_cpu("cpuReservation", app.cpu_reservation.as_deref())?,
            replicas: parse_count("replicas", app.replicas.as_deref())?,
            min_replicas: parse_count("minReplicas", app.min_replicas.as_deref())?,
            max_replicas: parse_count("maxReplicas", app.max_replicas.as_deref())?,
        })
    }

    /// Returns true when no field is set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// Body of `application.create`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateApplicationRequest {
    /// Application name.
    pub name: String,
    /// Container/runtime name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub app_name: Option<String>,
    /// Owning project.
    pub project_id: String,
    /// Owning environment.
    pub environment_id: String,
    /// Target server; absent means the platform's own host.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub server_id: Option<String>,
    /// Display title.
    pub title: String,
    /// Description.
    pub description: String,
    /// Initial status.
    pub application_status: String,
    /// Published port.
    pub port: u16,
    /// Container port.
    pub target_port: u16,
    /// Restart policy.
    pub restart_policy: RestartPolicy,
    /// Resource limits and scaling.
    #[serde(flatten)]
    pub resources: ResourceSettings,
}

/// Parent references for a new application.
#[derive(Debug, Clone, Copy)]
pub struct ApplicationParents<'a> {
    /// Owning project.
    pub project_id: &'a str,
    /// Owning environment.
    pub environment_id: &'a str,
    /// Target server.
    pub server_id: Option<&'a str>,
}

impl CreateApplicationRequest {
    /// Assembles the full create body from the configuration.
    ///
    /// # Errors
    ///
    /// Returns `InvalidNumericInput` if a resource field fails to parse.
    pub fn build(name: &str, app: &ApplicationConfig, parents: ApplicationParents<'_>) -> Result<Self> {
        Ok(Self {
            name: name.to_string(),
            app_name: app.container_name.clone(),
            project_id: parents.project_id.to_string(),
            environment_id: parents.environment_id.to_string(),
            server_id: parents.server_id.map(str::to_string),
            title: app.title.clone().unwrap_or_else(|| name.to_string()),
            description: app
                .description
                .clone()
                .unwrap_or_else(|| format!("Application {name}")),
            application_status: String::from(INITIAL_STATUS),
            port: non_zero(app.port).unwrap_or(DEFAULT_PORT),
            target_port: target_port(app),
            restart_policy: app.restart_policy.unwrap_or_default(),
            resources: ResourceSettings::parse(app)?,
        })
    }
}

/// Body of `application.update`, carrying only supplied fields.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateApplicationRequest {
    /// Application to update.
    pub application_id: String,
    /// Container/runtime name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub app_name: Option<String>,
    /// Published port.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,
    /// Container port.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_port: Option<u16>,
    /// Restart policy.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub restart_policy: Option<RestartPolicy>,
    /// Resource limits and scaling.
    #[serde(flatten)]
    pub resources: ResourceSettings,
}

impl UpdateApplicationRequest {
    /// Builds an update body, or `None` when nothing was supplied.
    ///
    /// # Errors
    ///
    /// Returns `InvalidNumericInput` if a resource field fails to parse.
    pub fn build(application_id: &str, app: &ApplicationConfig) -> Result<Option<Self>> {
        let request = Self {
            application_id: application_id.to_string(),
            app_name: app.container_name.clone(),
            port: non_zero(app.port),
            target_port: non_zero(app.target_port),
            restart_policy: app.restart_policy,
            resources: ResourceSettings::parse(app)?,
        };

        let supplied = request.app_name.is_some()
            || request.port.is_some()
            || request.target_port.is_some()
            || request.restart_policy.is_some()
            || !request.resources.is_empty();

        Ok(supplied.then_some(request))
    }
}

/// Effective container port, falling back to the default.
#[must_use]
pub fn target_port(app: &ApplicationConfig) -> u16 {
    non_zero(app.target_port).unwrap_or(DEFAULT_PORT)
}

fn non_zero(port: Option<u16>) -> Option<u16> {
    port.filter(|p| *p != 0)
}

//! Configuration specification types for a deployment run.
//!
//! This module defines the structs that map to `dokploy.deploy.yaml` and to
//! the pipeline inputs. Defaults here are the documented input defaults;
//! values that must stay "absent" until request construction (ports,
//! numeric resource fields) are kept as `Option`.

use serde::{Deserialize, Deserializer, Serialize};

use crate::dokploy::CertificateType;

/// The root configuration structure for a deployment run.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct DeployConfig {
    /// Dokploy endpoint and credentials.
    #[serde(default)]
    pub api: ApiConfig,
    /// Project to resolve or create.
    #[serde(default)]
    pub project: ProjectConfig,
    /// Environment to resolve or create.
    #[serde(default)]
    pub environment: ResourceTarget,
    /// Server the application runs on.
    #[serde(default)]
    pub server: ServerTarget,
    /// Application to resolve or create.
    #[serde(default)]
    pub application: ApplicationConfig,
    /// Image source.
    #[serde(default)]
    pub docker: DockerConfig,
    /// Environment variable sources.
    #[serde(default)]
    pub env: EnvConfig,
    /// Public domain binding.
    #[serde(default)]
    pub domain: DomainConfig,
    /// Deployment trigger options.
    #[serde(default)]
    pub deployment: DeploymentOptions,
    /// Post-deployment health check.
    #[serde(default)]
    pub health_check: HealthCheckConfig,
}

/// Dokploy endpoint and credentials.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ApiConfig {
    /// Base URL of the Dokploy instance.
    #[serde(default, deserialize_with = "trimmed")]
    pub url: Option<String>,
    /// API key sent with every request.
    #[serde(default, deserialize_with = "trimmed", skip_serializing)]
    pub api_key: Option<String>,
}

/// Identity of a resource that can be resolved by id or name.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ResourceTarget {
    /// Explicit identifier; wins over the name when set.
    #[serde(default, deserialize_with = "trimmed")]
    pub id: Option<String>,
    /// Exact, case-sensitive name.
    #[serde(default, deserialize_with = "trimmed")]
    pub name: Option<String>,
    /// Whether a missing named resource is created.
    #[serde(default = "default_true")]
    pub auto_create: bool,
}

impl Default for ResourceTarget {
    fn default() -> Self {
        Self {
            id: None,
            name: None,
            auto_create: true,
        }
    }
}

impl ResourceTarget {
    /// Creates a target resolved by name with auto-creation enabled.
    #[must_use]
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Self::default()
        }
    }

    /// Creates a target resolved by explicit id.
    #[must_use]
    pub fn with_id(id: impl Into<String>) -> Self {
        Self {
            id: Some(id.into()),
            ..Self::default()
        }
    }
}

/// Project target plus creation-only fields.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ProjectConfig {
    /// Identity of the project.
    #[serde(flatten)]
    pub target: ResourceTarget,
    /// Description used when the project is created.
    #[serde(default, deserialize_with = "trimmed")]
    pub description: Option<String>,
}

/// Server reference. Servers are resolved, never created.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ServerTarget {
    /// Explicit identifier, used verbatim.
    #[serde(default, deserialize_with = "trimmed")]
    pub id: Option<String>,
    /// Exact, case-sensitive name.
    #[serde(default, deserialize_with = "trimmed")]
    pub name: Option<String>,
}

/// Container restart policy.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "kebab-case")]
pub enum RestartPolicy {
    /// Never restart.
    No,
    /// Always restart.
    Always,
    /// Restart on non-zero exit.
    OnFailure,
    /// Restart unless explicitly stopped.
    #[default]
    UnlessStopped,
}

impl std::str::FromStr for RestartPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "no" => Ok(Self::No),
            "always" => Ok(Self::Always),
            "on-failure" => Ok(Self::OnFailure),
            "unless-stopped" => Ok(Self::UnlessStopped),
            other => Err(format!("unknown restart policy '{other}'")),
        }
    }
}

/// Application target and the settings applied when it is created.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ApplicationConfig {
    /// Identity of the application.
    #[serde(flatten)]
    pub target: ResourceTarget,
    /// Display title (defaults to the name).
    #[serde(default, deserialize_with = "trimmed")]
    pub title: Option<String>,
    /// Description (defaults to one derived from the name).
    #[serde(default, deserialize_with = "trimmed")]
    pub description: Option<String>,
    /// Container/runtime name.
    #[serde(default, deserialize_with = "trimmed")]
    pub container_name: Option<String>,
    /// Published port (defaults to 8080).
    #[serde(default)]
    pub port: Option<u16>,
    /// Container target port (defaults to 8080).
    #[serde(default)]
    pub target_port: Option<u16>,
    /// Restart policy (defaults to `unless-stopped`).
    #[serde(default)]
    pub restart_policy: Option<RestartPolicy>,
    /// Memory limit, integer.
    #[serde(default, deserialize_with = "string_or_number")]
    pub memory_limit: Option<String>,
    /// Memory reservation, integer.
    #[serde(default, deserialize_with = "string_or_number")]
    pub memory_reservation: Option<String>,
    /// CPU limit, integer with optional `m` suffix.
    #[serde(default, deserialize_with = "string_or_number")]
    pub cpu_limit: Option<String>,
    /// CPU reservation, integer with optional `m` suffix.
    #[serde(default, deserialize_with = "string_or_number")]
    pub cpu_reservation: Option<String>,
    /// Replica count.
    #[serde(default, deserialize_with = "string_or_number")]
    pub replicas: Option<String>,
    /// Minimum replicas.
    #[serde(default, deserialize_with = "string_or_number")]
    pub min_replicas: Option<String>,
    /// Maximum replicas.
    #[serde(default, deserialize_with = "string_or_number")]
    pub max_replicas: Option<String>,
}

/// Docker image source.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DockerConfig {
    /// Image reference, e.g. `ghcr.io/org/app:1.2.3`.
    #[serde(default, deserialize_with = "trimmed")]
    pub image: Option<String>,
    /// Registry host.
    #[serde(default = "default_registry_url")]
    pub registry_url: String,
    /// Registry username.
    #[serde(default, deserialize_with = "trimmed")]
    pub username: Option<String>,
    /// Registry password.
    #[serde(default, deserialize_with = "trimmed", skip_serializing)]
    pub password: Option<String>,
}

impl Default for DockerConfig {
    fn default() -> Self {
        Self {
            image: None,
            registry_url: default_registry_url(),
            username: None,
            password: None,
        }
    }
}

/// Environment variable sources, highest precedence first.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct EnvConfig {
    /// JSON object of variables.
    #[serde(default, deserialize_with = "trimmed")]
    pub json: Option<String>,
    /// Path to an env file. Accepted but not read.
    #[serde(default, deserialize_with = "trimmed")]
    pub file: Option<String>,
    /// Raw newline-delimited `KEY=VALUE` text.
    #[serde(default, deserialize_with = "trimmed")]
    pub raw: Option<String>,
}

/// Public domain binding.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DomainConfig {
    /// Host name; no domain work happens without it.
    #[serde(default, deserialize_with = "trimmed")]
    pub host: Option<String>,
    /// Path prefix.
    #[serde(default = "default_domain_path")]
    pub path: String,
    /// Container port (defaults to the application's target port).
    #[serde(default)]
    pub port: Option<u16>,
    /// Whether HTTPS is enabled.
    #[serde(default = "default_true")]
    pub https: bool,
    /// Certificate source.
    #[serde(default)]
    pub certificate_type: CertificateType,
    /// Whether the path prefix is stripped.
    #[serde(default)]
    pub strip_path: bool,
    /// Remove and recreate an existing binding for the host.
    #[serde(default)]
    pub force_recreate: bool,
}

impl Default for DomainConfig {
    fn default() -> Self {
        Self {
            host: None,
            path: default_domain_path(),
            port: None,
            https: true,
            certificate_type: CertificateType::default(),
            strip_path: false,
            force_recreate: false,
        }
    }
}

/// Deployment trigger options.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DeploymentOptions {
    /// Deployment title.
    #[serde(default, deserialize_with = "trimmed")]
    pub title: Option<String>,
    /// Deployment description.
    #[serde(default, deserialize_with = "trimmed")]
    pub description: Option<String>,
    /// Stop running containers before deploying.
    #[serde(default)]
    pub cleanup_old_containers: bool,
    /// Wait a fixed time after triggering the deploy.
    #[serde(default = "default_true")]
    pub wait_for_deployment: bool,
    /// Deployment timeout in seconds; the wait is a fifth of it, capped.
    #[serde(default = "default_deployment_timeout")]
    pub timeout_secs: u64,
}

impl Default for DeploymentOptions {
    fn default() -> Self {
        Self {
            title: None,
            description: None,
            cleanup_old_containers: false,
            wait_for_deployment: true,
            timeout_secs: default_deployment_timeout(),
        }
    }
}

/// Health check configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct HealthCheckConfig {
    /// Whether the check runs at all.
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Path appended to the deployment URL.
    #[serde(default = "default_health_path")]
    pub path: String,
    /// Total wall-clock budget in seconds.
    #[serde(default = "default_health_timeout")]
    pub timeout_secs: u64,
    /// Number of attempts.
    #[serde(default = "default_health_retries")]
    pub retries: u32,
    /// Seconds between attempts.
    #[serde(default = "default_health_interval")]
    pub interval_secs: u64,
}

impl Default for HealthCheckConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            path: default_health_path(),
            timeout_secs: default_health_timeout(),
            retries: default_health_retries(),
            interval_secs: default_health_interval(),
        }
    }
}

impl DeployConfig {
    /// Returns the configured docker image, if any.
    #[must_use]
    pub fn image(&self) -> Option<&str> {
        self.docker.image.as_deref()
    }
}

/// Trims string fields; a blank value is treated as absent.
fn trimmed<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.and_then(|s| non_blank(&s)))
}

fn non_blank(value: &str) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

/// Accepts YAML strings and integers for fields parsed later as integers.
fn string_or_number<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Text(String),
        Unsigned(u64),
        Signed(i64),
    }

    Ok(Option::<Raw>::deserialize(deserializer)?.and_then(|raw| match raw {
        Raw::Text(s) => non_blank(&s),
        Raw::Unsigned(n) => Some(n.to_string()),
        Raw::Signed(n) => Some(n.to_string()),
    }))
}

const fn default_true() -> bool {
    true
}

fn default_registry_url() -> String {
    String::from("ghcr.io")
}

fn default_domain_path() -> String {
    String::from("/")
}

const fn default_deployment_timeout() -> u64 {
    300
}

fn default_health_path() -> String {
    String::from("/health")
}

const fn default_health_timeout() -> u64 {
    60
}

const fn default_health_retries() -> u32 {
    3
}

const fn default_health_interval() -> u64 {
    10
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = DeployConfig::default();

        assert!(config.project.target.auto_create);
        assert!(config.environment.auto_create);
        assert_eq!(config.docker.registry_url, "ghcr.io");
        assert_eq!(config.domain.path, "/");
        assert!(config.domain.https);
        assert_eq!(config.domain.certificate_type, CertificateType::Letsencrypt);
        assert_eq!(config.health_check.path, "/health");
        assert_eq!(config.health_check.timeout_secs, 60);
        assert_eq!(config.health_check.retries, 3);
        assert_eq!(config.health_check.interval_secs, 10);
    }

    #[test]
    fn test_numeric_fields_accept_yaml_integers() {
        let yaml = r#"
application:
  name: api
  memory_limit: 512
  cpu_limit: "500m"
  replicas: 2
"#;
        let config: DeployConfig = serde_yaml::from_str(yaml).unwrap();

        assert_eq!(config.application.target.name.as_deref(), Some("api"));
        assert!(config.application.target.auto_create);
        assert_eq!(config.application.memory_limit.as_deref(), Some("512"));
        assert_eq!(config.application.cpu_limit.as_deref(), Some("500m"));
        assert_eq!(config.application.replicas.as_deref(), Some("2"));
        assert_eq!(config.application.min_replicas, None);
    }

    #[test]
    fn test_restart_policy_wire_values() {
        assert_eq!("on-failure".parse::<RestartPolicy>(), Ok(RestartPolicy::OnFailure));
        assert_eq!(
            serde_json::to_value(RestartPolicy::default()).unwrap(),
            serde_json::json!("unless-stopped")
        );
        assert!("sometimes".parse::<RestartPolicy>().is_err());
    }

    #[test]
    fn test_file_strings_are_trimmed_and_blank_is_absent() {
        let yaml = r#"
docker:
  image: "  ghcr.io/acme/api:1  "
domain:
  host: ""
application:
  name: "   "
  replicas: " "
"#;
        let config: DeployConfig = serde_yaml::from_str(yaml).unwrap();

        assert_eq!(config.image(), Some("ghcr.io/acme/api:1"));
        assert_eq!(config.domain.host, None);
        assert_eq!(config.application.target.name, None);
        assert_eq!(config.application.replicas, None);
    }
}

//! Dokploy API types and data structures.
//!
//! Remote records are deserialized on demand and never cached between
//! stages. Identifier fields accept both the `{kind}Id` shape and a bare
//! `id`, so every call site reads the same field.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{ApiError, Result};

/// The kinds of remote resource the reconciler resolves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    /// A Dokploy project.
    Project,
    /// An environment inside a project.
    Environment,
    /// An application inside an environment.
    Application,
}

impl ResourceKind {
    /// Returns the camelCase stem Dokploy uses for this kind (`projectId`, ...).
    #[must_use]
    pub const fn stem(self) -> &'static str {
        match self {
            Self::Project => "project",
            Self::Environment => "environment",
            Self::Application => "application",
        }
    }

    /// Extracts the identifier of a freshly created resource.
    ///
    /// Dokploy answers create calls with `{kind}Id`, a bare `id`, or the
    /// record nested under its kind (`{"project": {"projectId": ..}}`).
    ///
    /// # Errors
    ///
    /// Returns an error if none of the known shapes carries an identifier.
    pub fn created_id(self, response: &Value) -> Result<String> {
        let key = format!("{}Id", self.stem());

        let id = response
            .get(&key)
            .or_else(|| response.get("id"))
            .or_else(|| response.get(self.stem()).and_then(|nested| nested.get(&key)))
            .and_then(Value::as_str);

        id.map(str::to_string).ok_or_else(|| {
            ApiError::invalid_response(format!("{self} create response has no '{key}'")).into()
        })
    }
}

impl std::fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.stem())
    }
}

/// A Dokploy project.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    /// Unique project identifier.
    #[serde(alias = "id")]
    pub project_id: String,
    /// Project name.
    pub name: String,
    /// Project description.
    #[serde(default)]
    pub description: Option<String>,
    /// Environments embedded in the project record.
    #[serde(default)]
    pub environments: Vec<Environment>,
}

/// An environment inside a project.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Environment {
    /// Unique environment identifier.
    #[serde(alias = "id")]
    pub environment_id: String,
    /// Environment name.
    pub name: String,
    /// Owning project.
    #[serde(default)]
    pub project_id: Option<String>,
    /// Applications embedded in the environment record.
    #[serde(default)]
    pub applications: Vec<Application>,
}

/// A deployment target server.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Server {
    /// Unique server identifier.
    #[serde(alias = "id")]
    pub server_id: String,
    /// Server name.
    pub name: String,
}

/// A Dokploy application.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Application {
    /// Unique application identifier.
    #[serde(alias = "id")]
    pub application_id: String,
    /// Application name.
    pub name: String,
    /// Container/runtime name.
    #[serde(default)]
    pub app_name: Option<String>,
    /// Owning environment.
    #[serde(default)]
    pub environment_id: Option<String>,
    /// Referenced server.
    #[serde(default)]
    pub server_id: Option<String>,
    /// Domains bound to the application.
    #[serde(default)]
    pub domains: Vec<Domain>,
}

/// TLS certificate source for a domain.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum CertificateType {
    /// Let's Encrypt managed certificate.
    #[default]
    Letsencrypt,
    /// User-provided certificate.
    Custom,
    /// No certificate.
    None,
}

impl std::str::FromStr for CertificateType {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "letsencrypt" => Ok(Self::Letsencrypt),
            "custom" => Ok(Self::Custom),
            "none" => Ok(Self::None),
            other => Err(format!("unknown certificate type '{other}'")),
        }
    }
}

/// A domain bound to an application.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Domain {
    /// Unique domain identifier.
    #[serde(alias = "id")]
    pub domain_id: String,
    /// Public host name.
    pub host: String,
    /// Path prefix.
    #[serde(default)]
    pub path: Option<String>,
    /// Container port the domain routes to.
    #[serde(default)]
    pub port: Option<u16>,
    /// Whether HTTPS is enabled.
    #[serde(default)]
    pub https: bool,
    /// Certificate source.
    #[serde(default)]
    pub certificate_type: Option<CertificateType>,
    /// Whether the path prefix is stripped before forwarding.
    #[serde(default)]
    pub strip_path: bool,
}

/// Request body for `project.create`.
#[derive(Debug, Clone, Serialize)]
pub struct CreateProjectRequest {
    /// Project name.
    pub name: String,
    /// Project description.
    pub description: String,
}

/// Request body for `environment.create`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateEnvironmentRequest {
    /// Owning project.
    pub project_id: String,
    /// Environment name.
    pub name: String,
}

/// Request body for `application.saveDockerProvider`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveDockerProviderRequest {
    /// Target application.
    pub application_id: String,
    /// Image reference.
    pub docker_image: String,
    /// Registry host.
    pub registry_url: String,
    /// Registry username, cleared when absent.
    pub username: Option<String>,
    /// Registry password, cleared when absent.
    pub password: Option<String>,
}

/// Request body for `application.saveEnvironment`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveEnvironmentRequest {
    /// Target application.
    pub application_id: String,
    /// Newline-delimited `KEY=VALUE` blob.
    pub env: String,
}

/// Request body for `domain.create`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateDomainRequest {
    /// Target application.
    pub application_id: String,
    /// Public host name.
    pub host: String,
    /// Path prefix.
    pub path: String,
    /// Container port.
    pub port: u16,
    /// Whether HTTPS is enabled.
    pub https: bool,
    /// Certificate source.
    pub certificate_type: CertificateType,
    /// Always `"application"`.
    pub domain_type: String,
    /// Whether the path prefix is stripped.
    pub strip_path: bool,
}

/// Request body for `application.deploy`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeployApplicationRequest {
    /// Target application.
    pub application_id: String,
    /// Deployment title.
    pub title: String,
    /// Deployment description.
    pub description: String,
}

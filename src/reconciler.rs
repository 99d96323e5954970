//! Resource reconciler: resolve-or-create for each remote resource kind.
//!
//! Project, environment and application share one [`ensure`] routine,
//! parameterized by an [`EnsureStrategy`] that knows how to verify an id,
//! look up a name and create a resource of its kind. Servers are resolved
//! only; there is no create path.
//!
//! Name matches are exact, case-sensitive and first-match. Concurrent runs
//! targeting the same name can race and create duplicates.

use async_trait::async_trait;
use tracing::{debug, info};

use crate::apply::{ApplicationParents, CreateApplicationRequest};
use crate::config::{ApplicationConfig, DeployConfig, ResourceTarget, ServerTarget};
use crate::dokploy::{Gateway, ResourceKind};
use crate::error::{ReconcileError, Result};

/// Description given to projects created without one.
pub const DEFAULT_PROJECT_DESCRIPTION: &str = "Managed by dokploy-deploy";

/// How one resource kind is verified, looked up and created.
#[async_trait]
pub trait EnsureStrategy: Send + Sync {
    /// Kind of resource handled.
    fn kind(&self) -> ResourceKind;

    /// Returns whether an explicit id resolves.
    async fn verify(&self, id: &str) -> Result<bool>;

    /// Returns the id of the first resource with exactly this name.
    async fn find(&self, name: &str) -> Result<Option<String>>;

    /// Creates a resource and returns its id.
    async fn create(&self, name: &str) -> Result<String>;
}

/// Outcome of an ensure call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ensured {
    /// Resolved identifier.
    pub id: String,
    /// Whether the resource was created by this call.
    pub created: bool,
}

/// Resolves a resource by explicit id or by name, creating it when allowed.
///
/// # Errors
///
/// - `NotFound` if an explicit id does not resolve
/// - `NotFoundAndCreationDisabled` if the name misses and auto-create is off
/// - `MissingIdentifier` if neither id nor name is given
pub async fn ensure<S>(strategy: &S, target: &ResourceTarget) -> Result<Ensured>
where
    S: EnsureStrategy + ?Sized,
{
    let kind = strategy.kind();

    if let Some(id) = &target.id {
        if !strategy.verify(id).await? {
            return Err(ReconcileError::NotFound {
                kind,
                id: id.clone(),
            }
            .into());
        }
        debug!("Using {kind} {id}");
        return Ok(Ensured {
            id: id.clone(),
            created: false,
        });
    }

    let Some(name) = &target.name else {
        return Err(ReconcileError::MissingIdentifier { kind }.into());
    };

    if let Some(id) = strategy.find(name).await? {
        info!("Found existing {kind} '{name}' ({id})");
        return Ok(Ensured { id, created: false });
    }

    if !target.auto_create {
        return Err(ReconcileError::NotFoundAndCreationDisabled {
            kind,
            name: name.clone(),
        }
        .into());
    }

    let id = strategy.create(name).await?;
    info!("Created {kind} '{name}' ({id})");
    Ok(Ensured { id, created: true })
}

/// Projects: looked up in the full project list.
#[derive(Debug)]
pub struct ProjectStrategy<'a> {
    gateway: Gateway<'a>,
    description: &'a str,
}

impl<'a> ProjectStrategy<'a> {
    /// Creates the strategy; `description` is used on create.
    #[must_use]
    pub const fn new(gateway: Gateway<'a>, description: &'a str) -> Self {
        Self {
            gateway,
            description,
        }
    }
}

#[async_trait]
impl EnsureStrategy for ProjectStrategy<'_> {
    fn kind(&self) -> ResourceKind {
        ResourceKind::Project
    }

    async fn verify(&self, id: &str) -> Result<bool> {
        Ok(self.gateway.get_project(id).await?.is_some())
    }

    async fn find(&self, name: &str) -> Result<Option<String>> {
        let projects = self.gateway.list_projects().await?;
        Ok(projects
            .into_iter()
            .find(|p| p.name == name)
            .map(|p| p.project_id))
    }

    async fn create(&self, name: &str) -> Result<String> {
        self.gateway.create_project(name, self.description).await
    }
}

/// Environments: looked up in the parent project's embedded list.
#[derive(Debug)]
pub struct EnvironmentStrategy<'a> {
    gateway: Gateway<'a>,
    project_id: &'a str,
}

impl<'a> EnvironmentStrategy<'a> {
    /// Creates the strategy for environments of one project.
    #[must_use]
    pub const fn new(gateway: Gateway<'a>, project_id: &'a str) -> Self {
        Self {
            gateway,
            project_id,
        }
    }
}

#[async_trait]
impl EnsureStrategy for EnvironmentStrategy<'_> {
    fn kind(&self) -> ResourceKind {
        ResourceKind::Environment
    }

    async fn verify(&self, id: &str) -> Result<bool> {
        Ok(self.gateway.get_environment(id).await?.is_some())
    }

    async fn find(&self, name: &str) -> Result<Option<String>> {
        let Some(project) = self.gateway.get_project(self.project_id).await? else {
            return Ok(None);
        };
        Ok(project
            .environments
            .into_iter()
            .find(|e| e.name == name)
            .map(|e| e.environment_id))
    }

    async fn create(&self, name: &str) -> Result<String> {
        self.gateway.create_environment(self.project_id, name).await
    }
}

/// Applications: looked up in the environment embedded in the parent project.
#[derive(Debug)]
pub struct ApplicationStrategy<'a> {
    gateway: Gateway<'a>,
    parents: ApplicationParents<'a>,
    config: &'a ApplicationConfig,
}

impl<'a> ApplicationStrategy<'a> {
    /// Creates the strategy; `config` is assembled into the create body.
    #[must_use]
    pub const fn new(
        gateway: Gateway<'a>,
        parents: ApplicationParents<'a>,
        config: &'a ApplicationConfig,
    ) -> Self {
        Self {
            gateway,
            parents,
            config,
        }
    }
}

#[async_trait]
impl EnsureStrategy for ApplicationStrategy<'_> {
    fn kind(&self) -> ResourceKind {
        ResourceKind::Application
    }

    async fn verify(&self, id: &str) -> Result<bool> {
        Ok(self.gateway.get_application(id).await?.is_some())
    }

    async fn find(&self, name: &str) -> Result<Option<String>> {
        let Some(project) = self.gateway.get_project(self.parents.project_id).await? else {
            return Ok(None);
        };

        let Some(environment) = project
            .environments
            .into_iter()
            .find(|e| e.environment_id == self.parents.environment_id)
        else {
            debug!(
                "Environment {} not listed in project {}",
                self.parents.environment_id, self.parents.project_id
            );
            return Ok(None);
        };

        Ok(environment
            .applications
            .into_iter()
            .find(|a| a.name == name)
            .map(|a| a.application_id))
    }

    async fn create(&self, name: &str) -> Result<String> {
        let request = CreateApplicationRequest::build(name, self.config, self.parents)?;
        self.gateway.create_application(&request).await
    }
}

/// Resolves the target server.
///
/// An explicit id is returned as given, without an existence check. With
/// neither id nor name the application runs on the platform's own host.
///
/// # Errors
///
/// Returns `ServerNotFound` if a name is given and no server matches.
pub async fn resolve_server(gateway: Gateway<'_>, target: &ServerTarget) -> Result<Option<String>> {
    if let Some(id) = &target.id {
        return Ok(Some(id.clone()));
    }

    let Some(name) = &target.name else {
        debug!("No server requested; using the Dokploy host");
        return Ok(None);
    };

    let servers = gateway.list_servers().await?;
    servers
        .into_iter()
        .find(|s| &s.name == name)
        .map(|s| Some(s.server_id))
        .ok_or_else(|| ReconcileError::ServerNotFound { name: name.clone() }.into())
}

/// Identifiers of every resolved resource.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct ResolvedResources {
    /// Project id.
    pub project_id: String,
    /// Environment id.
    pub environment_id: String,
    /// Server id, if one was requested.
    pub server_id: Option<String>,
    /// Application id.
    pub application_id: String,
    /// Whether the application was created in this run.
    pub application_created: bool,
}

/// Resolves project, environment, server and application in order.
#[derive(Debug)]
pub struct ResourceReconciler<'a> {
    gateway: Gateway<'a>,
    config: &'a DeployConfig,
}

impl<'a> ResourceReconciler<'a> {
    /// Creates a new reconciler.
    #[must_use]
    pub const fn new(gateway: Gateway<'a>, config: &'a DeployConfig) -> Self {
        Self { gateway, config }
    }

    /// Resolves all resources, creating missing ones where allowed.
    ///
    /// # Errors
    ///
    /// Returns the first reconciliation or API error.
    pub async fn resolve(&self) -> Result<ResolvedResources> {
        let description = self
            .config
            .project
            .description
            .as_deref()
            .unwrap_or(DEFAULT_PROJECT_DESCRIPTION);

        let project = ensure(
            &ProjectStrategy::new(self.gateway, description),
            &self.config.project.target,
        )
        .await?;

        let environment = ensure(
            &EnvironmentStrategy::new(self.gateway, &project.id),
            &self.config.environment,
        )
        .await?;

        let server_id = resolve_server(self.gateway, &self.config.server).await?;

        let parents = ApplicationParents {
            project_id: &project.id,
            environment_id: &environment.id,
            server_id: server_id.as_deref(),
        };
        let application = ensure(
            &ApplicationStrategy::new(self.gateway, parents, &self.config.application),
            &self.config.application.target,
        )
        .await?;

        Ok(ResolvedResources {
            project_id: project.id,
            environment_id: environment.id,
            server_id,
            application_id: application.id,
            application_created: application.created,
        })
    }
}

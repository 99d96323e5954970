//! Typed access to the Dokploy endpoints used by the pipeline.
//!
//! The gateway owns the endpoint paths, the request body shapes and the
//! per-kind identifier accessors, so the reconciler and appliers never
//! touch raw JSON.

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::debug;

use crate::error::{ApiError, DeployError, Result};

use super::client::DokployApi;
use super::types::{
    Application, CreateDomainRequest, CreateEnvironmentRequest, CreateProjectRequest,
    DeployApplicationRequest, Environment, Project, ResourceKind, SaveDockerProviderRequest,
    SaveEnvironmentRequest, Server,
};

/// Endpoint paths consumed by the pipeline.
pub mod endpoints {
    /// `GET` all projects.
    pub const PROJECT_ALL: &str = "/api/project.all";
    /// `GET` one project by `projectId`.
    pub const PROJECT_ONE: &str = "/api/project.one";
    /// `POST` create project.
    pub const PROJECT_CREATE: &str = "/api/project.create";
    /// `GET` one environment by `environmentId`.
    pub const ENVIRONMENT_ONE: &str = "/api/environment.one";
    /// `POST` create environment.
    pub const ENVIRONMENT_CREATE: &str = "/api/environment.create";
    /// `GET` all servers.
    pub const SERVER_ALL: &str = "/api/server.all";
    /// `GET` one application by `applicationId`.
    pub const APPLICATION_ONE: &str = "/api/application.one";
    /// `POST` create application.
    pub const APPLICATION_CREATE: &str = "/api/application.create";
    /// `POST` update application settings.
    pub const APPLICATION_UPDATE: &str = "/api/application.update";
    /// `POST` overwrite the docker image source.
    pub const APPLICATION_SAVE_DOCKER_PROVIDER: &str = "/api/application.saveDockerProvider";
    /// `POST` overwrite the environment blob.
    pub const APPLICATION_SAVE_ENVIRONMENT: &str = "/api/application.saveEnvironment";
    /// `POST` stop the application's containers.
    pub const APPLICATION_STOP: &str = "/api/application.stop";
    /// `POST` trigger a deployment.
    pub const APPLICATION_DEPLOY: &str = "/api/application.deploy";
    /// `POST` create a domain binding.
    pub const DOMAIN_CREATE: &str = "/api/domain.create";
    /// `POST` remove a domain binding.
    pub const DOMAIN_REMOVE: &str = "/api/domain.remove";
}

/// Typed endpoint calls over any [`DokployApi`].
#[derive(Clone, Copy)]
pub struct Gateway<'a> {
    /// Underlying request capability.
    api: &'a dyn DokployApi,
}

impl std::fmt::Debug for Gateway<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Gateway").finish_non_exhaustive()
    }
}

impl<'a> Gateway<'a> {
    /// Creates a gateway over a request capability.
    #[must_use]
    pub const fn new(api: &'a dyn DokployApi) -> Self {
        Self { api }
    }

    async fn get_as<T: DeserializeOwned>(&self, path: &str, query: &[(&str, &str)]) -> Result<T> {
        let value = self.api.get(path, query).await?;
        decode(path, value)
    }

    /// Fetches a single record; 400/404 or a `null` body mean "absent".
    async fn get_optional<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<Option<T>> {
        match self.api.get(path, query).await {
            Ok(Value::Null) => Ok(None),
            Ok(value) => decode(path, value).map(Some),
            Err(e) if matches!(e.remote_status(), Some(400 | 404)) => {
                debug!("{path} reported {e}; treating as absent");
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    async fn post_as<B: Serialize>(&self, path: &str, body: &B) -> Result<Value> {
        let body = serde_json::to_value(body)
            .map_err(|e| DeployError::internal(format!("Failed to encode {path} body: {e}")))?;
        self.api.post(path, &body).await
    }

    /// Lists all projects with their embedded environments.
    ///
    /// # Errors
    ///
    /// Returns an error if the API call fails.
    pub async fn list_projects(&self) -> Result<Vec<Project>> {
        self.get_as(endpoints::PROJECT_ALL, &[]).await
    }

    /// Fetches a project by id.
    ///
    /// # Errors
    ///
    /// Returns an error if the API call fails for a reason other than absence.
    pub async fn get_project(&self, project_id: &str) -> Result<Option<Project>> {
        self.get_optional(endpoints::PROJECT_ONE, &[("projectId", project_id)])
            .await
    }

    /// Creates a project and returns its id.
    ///
    /// # Errors
    ///
    /// Returns an error if the API call fails or no id is returned.
    pub async fn create_project(&self, name: &str, description: &str) -> Result<String> {
        let request = CreateProjectRequest {
            name: name.to_string(),
            description: description.to_string(),
        };
        let response = self.post_as(endpoints::PROJECT_CREATE, &request).await?;
        ResourceKind::Project.created_id(&response)
    }

    /// Fetches an environment by id.
    ///
    /// # Errors
    ///
    /// Returns an error if the API call fails for a reason other than absence.
    pub async fn get_environment(&self, environment_id: &str) -> Result<Option<Environment>> {
        self.get_optional(
            endpoints::ENVIRONMENT_ONE,
            &[("environmentId", environment_id)],
        )
        .await
    }

    /// Creates an environment in a project and returns its id.
    ///
    /// # Errors
    ///
    /// Returns an error if the API call fails or no id is returned.
    pub async fn create_environment(&self, project_id: &str, name: &str) -> Result<String> {
        let request = CreateEnvironmentRequest {
            project_id: project_id.to_string(),
            name: name.to_string(),
        };
        let response = self.post_as(endpoints::ENVIRONMENT_CREATE, &request).await?;
        ResourceKind::Environment.created_id(&response)
    }

    /// Lists all servers.
    ///
    /// # Errors
    ///
    /// Returns an error if the API call fails.
    pub async fn list_servers(&self) -> Result<Vec<Server>> {
        self.get_as(endpoints::SERVER_ALL, &[]).await
    }

    /// Fetches an application (with its domains) by id.
    ///
    /// # Errors
    ///
    /// Returns an error if the API call fails for a reason other than absence.
    pub async fn get_application(&self, application_id: &str) -> Result<Option<Application>> {
        self.get_optional(
            endpoints::APPLICATION_ONE,
            &[("applicationId", application_id)],
        )
        .await
    }

    /// Creates an application from a fully assembled body and returns its id.
    ///
    /// # Errors
    ///
    /// Returns an error if the API call fails or no id is returned.
    pub async fn create_application<B: Serialize + Sync>(&self, request: &B) -> Result<String> {
        let response = self.post_as(endpoints::APPLICATION_CREATE, request).await?;
        ResourceKind::Application.created_id(&response)
    }

    /// Updates settings of an existing application.
    ///
    /// # Errors
    ///
    /// Returns an error if the API call fails.
    pub async fn update_application<B: Serialize + Sync>(&self, request: &B) -> Result<()> {
        self.post_as(endpoints::APPLICATION_UPDATE, request).await?;
        Ok(())
    }

    /// Overwrites the application's docker image source.
    ///
    /// # Errors
    ///
    /// Returns an error if the API call fails.
    pub async fn save_docker_provider(&self, request: &SaveDockerProviderRequest) -> Result<()> {
        self.post_as(endpoints::APPLICATION_SAVE_DOCKER_PROVIDER, request)
            .await?;
        Ok(())
    }

    /// Overwrites the application's environment blob.
    ///
    /// # Errors
    ///
    /// Returns an error if the API call fails.
    pub async fn save_environment(&self, application_id: &str, env: &str) -> Result<()> {
        let request = SaveEnvironmentRequest {
            application_id: application_id.to_string(),
            env: env.to_string(),
        };
        self.post_as(endpoints::APPLICATION_SAVE_ENVIRONMENT, &request)
            .await?;
        Ok(())
    }

    /// Creates a domain binding.
    ///
    /// # Errors
    ///
    /// Returns an error if the API call fails.
    pub async fn create_domain(&self, request: &CreateDomainRequest) -> Result<()> {
        self.post_as(endpoints::DOMAIN_CREATE, request).await?;
        Ok(())
    }

    /// Removes a domain binding by id.
    ///
    /// # Errors
    ///
    /// Returns an error if the API call fails.
    pub async fn remove_domain(&self, domain_id: &str) -> Result<()> {
        self.post_as(
            endpoints::DOMAIN_REMOVE,
            &serde_json::json!({ "domainId": domain_id }),
        )
        .await?;
        Ok(())
    }

    /// Stops the application's running containers.
    ///
    /// # Errors
    ///
    /// Returns an error if the API call fails.
    pub async fn stop_application(&self, application_id: &str) -> Result<()> {
        self.post_as(
            endpoints::APPLICATION_STOP,
            &serde_json::json!({ "applicationId": application_id }),
        )
        .await?;
        Ok(())
    }

    /// Triggers a deployment.
    ///
    /// # Errors
    ///
    /// Returns an error if the API call fails.
    pub async fn deploy_application(&self, request: &DeployApplicationRequest) -> Result<()> {
        self.post_as(endpoints::APPLICATION_DEPLOY, request).await?;
        Ok(())
    }
}

fn decode<T: DeserializeOwned>(path: &str, value: Value) -> Result<T> {
    serde_json::from_value(value).map_err(|e| {
        ApiError::invalid_response(format!("Unexpected response shape from {path}: {e}")).into()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dokploy::fake::FakeDokploy;

    #[tokio::test]
    async fn test_missing_records_are_absent() {
        let fake = FakeDokploy::new();
        let gateway = Gateway::new(&fake);

        assert!(gateway.get_project("nope").await.unwrap().is_none());
        assert!(gateway.get_application("nope").await.unwrap().is_none());
        assert!(gateway.get_environment("nope").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_other_failures_propagate() {
        let fake = FakeDokploy::new();
        fake.fail_on(endpoints::PROJECT_ONE, 401, "Unauthorized");
        let gateway = Gateway::new(&fake);

        let err = gateway.get_project("p1").await.unwrap_err();
        assert_eq!(err.remote_status(), Some(401));
    }

    #[tokio::test]
    async fn test_create_returns_normalized_id() {
        let fake = FakeDokploy::new();
        let gateway = Gateway::new(&fake);

        let project_id = gateway.create_project("shop", "d").await.unwrap();
        let environment_id = gateway.create_environment(&project_id, "staging").await.unwrap();

        let project = gateway.get_project(&project_id).await.unwrap().unwrap();
        assert_eq!(project.name, "shop");
        assert_eq!(project.environments[0].environment_id, environment_id);
    }
}

//! Configuration appliers for an already-resolved application.
//!
//! This module pushes declarative configuration onto the application:
//! - Settings updates for existing applications
//! - The docker image source (always a full overwrite)
//! - The environment-variable blob

mod docker;
mod env;
mod settings;

use tracing::{debug, info};

use crate::config::{ApplicationConfig, DockerConfig};
use crate::dokploy::Gateway;
use crate::error::Result;

pub use docker::docker_provider_request;
pub use env::{EnvBlob, EnvSource, flatten_json};
pub use settings::{
    ApplicationParents, CreateApplicationRequest, DEFAULT_PORT, INITIAL_STATUS,
    ResourceSettings, UpdateApplicationRequest, parse_count, parse_cpu, target_port,
};

/// Applies configuration to a resolved application.
#[derive(Debug, Clone, Copy)]
pub struct ConfigApplier<'a> {
    /// Typed Dokploy access.
    gateway: Gateway<'a>,
}

impl<'a> ConfigApplier<'a> {
    /// Creates a new applier.
    #[must_use]
    pub const fn new(gateway: Gateway<'a>) -> Self {
        Self { gateway }
    }

    /// Updates settings of an existing application when any were supplied.
    ///
    /// Returns whether an update was sent.
    ///
    /// # Errors
    ///
    /// Returns an error if a numeric field is invalid or the API call fails.
    pub async fn update_settings(
        &self,
        application_id: &str,
        app: &ApplicationConfig,
    ) -> Result<bool> {
        let Some(request) = UpdateApplicationRequest::build(application_id, app)? else {
            debug!("No application settings supplied; skipping update");
            return Ok(false);
        };

        info!("Updating settings of application {application_id}");
        self.gateway.update_application(&request).await?;
        Ok(true)
    }

    /// Overwrites the application's image source.
    ///
    /// # Errors
    ///
    /// Returns an error if no image is configured or the API call fails.
    pub async fn apply_docker(&self, application_id: &str, docker: &DockerConfig) -> Result<()> {
        let request = docker_provider_request(application_id, docker)?;
        info!(
            "Configuring image {} from {}",
            request.docker_image, request.registry_url
        );
        self.gateway.save_docker_provider(&request).await
    }

    /// Pushes the environment blob. An empty blob is not sent.
    ///
    /// Returns whether the blob was pushed.
    ///
    /// # Errors
    ///
    /// Returns an error if the API call fails.
    pub async fn apply_env(&self, application_id: &str, blob: &EnvBlob) -> Result<bool> {
        if blob.is_empty() {
            debug!("No environment variables to apply ({:?})", blob.source);
            return Ok(false);
        }

        info!(
            "Applying {} environment variable line(s)",
            blob.content.lines().count()
        );
        self.gateway
            .save_environment(application_id, &blob.content)
            .await?;
        Ok(true)
    }
}

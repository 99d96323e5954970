//! Docker image source.

use crate::config::DockerConfig;
use crate::dokploy::SaveDockerProviderRequest;
use crate::error::{ConfigError, Result};

/// Builds the full-overwrite image source body for an application.
///
/// Credentials are always sent, as `null` when absent, so a previously
/// stored username or password is cleared.
///
/// # Errors
///
/// Returns an error if no image is configured.
pub fn docker_provider_request(
    application_id: &str,
    docker: &DockerConfig,
) -> Result<SaveDockerProviderRequest> {
    let image = docker.image.clone().ok_or_else(|| ConfigError::MissingInput {
        name: String::from("docker-image"),
    })?;

    Ok(SaveDockerProviderRequest {
        application_id: application_id.to_string(),
        docker_image: image,
        registry_url: docker.registry_url.clone(),
        username: docker.username.clone(),
        password: docker.password.clone(),
    })
}

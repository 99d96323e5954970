//! Deployment orchestrator.
//!
//! Stages run strictly in order and each must succeed before the next
//! starts. A failure aborts the run; resources created before it stay.

use std::time::Duration;

use chrono::{SecondsFormat, Utc};
use serde::Serialize;
use tracing::{debug, info};

use crate::apply::{ConfigApplier, EnvBlob, ResourceSettings, target_port};
use crate::config::DeployConfig;
use crate::dokploy::{DeployApplicationRequest, Gateway};
use crate::domain::DomainManager;
use crate::error::{ConfigError, Result};
use crate::health::{HealthChecker, HealthProbe, HealthReport, HealthVerdict};
use crate::reconciler::ResourceReconciler;

/// Wait after stopping old containers.
pub const STOP_SETTLE_DELAY: Duration = Duration::from_secs(15);

/// Upper bound of the post-deploy wait.
pub const MAX_DEPLOY_WAIT: Duration = Duration::from_secs(60);

/// Final status of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DeploymentStatus {
    /// Every stage completed.
    Success,
    /// A stage failed and the run aborted.
    Failed,
}

impl DeploymentStatus {
    /// Returns the output value.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Failed => "failed",
        }
    }
}

impl std::fmt::Display for DeploymentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Identifiers and verdicts produced by a successful run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeploymentOutcome {
    /// Project id.
    pub project_id: String,
    /// Environment id.
    pub environment_id: String,
    /// Server id, if one was requested.
    pub server_id: Option<String>,
    /// Application id.
    pub application_id: String,
    /// Public URL, when a domain was configured.
    pub deployment_url: Option<String>,
    /// Run status.
    pub status: DeploymentStatus,
    /// Health check result.
    pub health: HealthReport,
}

impl DeploymentOutcome {
    /// Health verdict shorthand.
    #[must_use]
    pub const fn health_verdict(&self) -> HealthVerdict {
        self.health.verdict
    }
}

/// Sequences every deployment stage.
#[derive(Debug)]
pub struct Deployer<'a> {
    gateway: Gateway<'a>,
    config: &'a DeployConfig,
}

impl<'a> Deployer<'a> {
    /// Creates a new deployer.
    #[must_use]
    pub const fn new(gateway: Gateway<'a>, config: &'a DeployConfig) -> Self {
        Self { gateway, config }
    }

    /// Runs the full pipeline.
    ///
    /// # Errors
    ///
    /// Returns the first error from any stage. Malformed inputs fail before
    /// the first API call. Health check failures are not errors; they are
    /// reported in the outcome.
    pub async fn run<P: HealthProbe>(&self, health: &HealthChecker<P>) -> Result<DeploymentOutcome> {
        let config = self.config;
        let image = config.image().ok_or_else(|| ConfigError::MissingInput {
            name: String::from("docker-image"),
        })?;
        let env = EnvBlob::resolve(&config.env)?;
        ResourceSettings::parse(&config.application)?;

        info!("Resolving resources");
        let resources = ResourceReconciler::new(self.gateway, config).resolve().await?;
        let application_id = resources.application_id.as_str();

        let applier = ConfigApplier::new(self.gateway);
        if !resources.application_created {
            applier
                .update_settings(application_id, &config.application)
                .await?;
        }
        applier.apply_docker(application_id, &config.docker).await?;
        applier.apply_env(application_id, &env).await?;

        let deployment_url = DomainManager::new(self.gateway)
            .ensure(
                application_id,
                &config.domain,
                target_port(&config.application),
            )
            .await?;

        if config.deployment.cleanup_old_containers {
            info!("Stopping running containers");
            self.gateway.stop_application(application_id).await?;
            tokio::time::sleep(STOP_SETTLE_DELAY).await;
        }

        let request = self.deploy_request(application_id, image);
        info!("Triggering deployment: {}", request.title);
        self.gateway.deploy_application(&request).await?;

        if config.deployment.wait_for_deployment {
            let wait = deploy_wait(config.deployment.timeout_secs);
            info!("Waiting {}s for the deployment to settle", wait.as_secs());
            tokio::time::sleep(wait).await;
        } else {
            debug!("Not waiting for the deployment");
        }

        let health = health.verify(deployment_url.as_deref()).await;
        info!("Deployment finished; health check {}", health.verdict);

        Ok(DeploymentOutcome {
            project_id: resources.project_id,
            environment_id: resources.environment_id,
            server_id: resources.server_id,
            application_id: resources.application_id,
            deployment_url,
            status: DeploymentStatus::Success,
            health,
        })
    }

    fn deploy_request(&self, application_id: &str, image: &str) -> DeployApplicationRequest {
        let deployment = &self.config.deployment;
        let title = deployment
            .title
            .clone()
            .unwrap_or_else(|| format!("Deploy {image}"));
        let description = deployment.description.clone().unwrap_or_else(|| {
            format!(
                "Automated deployment of {image} at {}",
                Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true)
            )
        });

        DeployApplicationRequest {
            application_id: application_id.to_string(),
            title,
            description,
        }
    }
}

/// Post-deploy wait: a fifth of the deployment timeout, capped at a minute.
#[must_use]
pub fn deploy_wait(timeout_secs: u64) -> Duration {
    Duration::from_secs(timeout_secs / 5).min(MAX_DEPLOY_WAIT)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{HealthCheckConfig, ResourceTarget, ServerTarget};
    use crate::dokploy::endpoints;
    use crate::dokploy::fake::FakeDokploy;
    use crate::error::DeployError;
    use crate::health::MockHealthProbe;
    use tokio::time::Instant;

    fn base_config() -> DeployConfig {
        let mut config = DeployConfig::default();
        config.docker.image = Some(String::from("ghcr.io/x/y:1"));
        config.project.target = ResourceTarget::named("p");
        config.environment = ResourceTarget::named("production");
        config.application.target = ResourceTarget::named("a");
        config
    }

    fn unused_probe() -> HealthChecker<MockHealthProbe> {
        HealthChecker::new(MockHealthProbe::new(), HealthCheckConfig::default())
    }

    #[test]
    fn test_deploy_wait_is_capped() {
        assert_eq!(deploy_wait(300), Duration::from_secs(60));
        assert_eq!(deploy_wait(1000), Duration::from_secs(60));
        assert_eq!(deploy_wait(100), Duration::from_secs(20));
        assert_eq!(deploy_wait(0), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn test_fresh_deployment_creates_everything() {
        let fake = FakeDokploy::new();
        let server_id = fake.add_server("s");
        let mut config = base_config();
        config.server = ServerTarget {
            id: None,
            name: Some(String::from("s")),
        };

        let start = Instant::now();
        let outcome = Deployer::new(Gateway::new(&fake), &config)
            .run(&unused_probe())
            .await
            .unwrap();

        assert_eq!(
            fake.post_paths(),
            vec![
                endpoints::PROJECT_CREATE,
                endpoints::ENVIRONMENT_CREATE,
                endpoints::APPLICATION_CREATE,
                endpoints::APPLICATION_SAVE_DOCKER_PROVIDER,
                endpoints::APPLICATION_DEPLOY,
            ]
        );

        let create = fake.last_body(endpoints::APPLICATION_CREATE).unwrap();
        assert_eq!(create["port"], 8080);
        assert_eq!(create["targetPort"], 8080);
        assert_eq!(create["restartPolicy"], "unless-stopped");
        assert_eq!(create["serverId"], server_id.as_str());

        let deploy = fake.last_body(endpoints::APPLICATION_DEPLOY).unwrap();
        assert_eq!(deploy["title"], "Deploy ghcr.io/x/y:1");
        assert!(
            deploy["description"]
                .as_str()
                .unwrap()
                .starts_with("Automated deployment of ghcr.io/x/y:1 at ")
        );

        assert_eq!(outcome.status, DeploymentStatus::Success);
        assert_eq!(outcome.server_id, Some(server_id));
        assert_eq!(outcome.deployment_url, None);
        assert_eq!(outcome.health_verdict(), HealthVerdict::Skipped);
        assert!(start.elapsed() >= MAX_DEPLOY_WAIT);
    }

    #[tokio::test(start_paused = true)]
    async fn test_existing_application_with_cleanup_and_domain() {
        let fake = FakeDokploy::new();
        let project_id = fake.add_project("p");
        let environment_id = fake.add_environment(&project_id, "production");
        let application_id = fake.add_application(&environment_id, "a");

        let mut config = base_config();
        config.application.target_port = Some(3000);
        config.env.raw = Some(String::from("A=1"));
        config.domain.host = Some(String::from("a.example.com"));
        config.deployment.cleanup_old_containers = true;
        config.deployment.wait_for_deployment = false;

        let mut probe = MockHealthProbe::new();
        probe
            .expect_probe()
            .withf(|url| url == "https://a.example.com/health")
            .times(1)
            .returning(|_| Ok(200));
        let checker = HealthChecker::new(probe, HealthCheckConfig::default());

        let start = Instant::now();
        let outcome = Deployer::new(Gateway::new(&fake), &config)
            .run(&checker)
            .await
            .unwrap();

        assert_eq!(
            fake.post_paths(),
            vec![
                endpoints::APPLICATION_UPDATE,
                endpoints::APPLICATION_SAVE_DOCKER_PROVIDER,
                endpoints::APPLICATION_SAVE_ENVIRONMENT,
                endpoints::DOMAIN_CREATE,
                endpoints::APPLICATION_STOP,
                endpoints::APPLICATION_DEPLOY,
            ]
        );
        assert_eq!(fake.last_body(endpoints::DOMAIN_CREATE).unwrap()["port"], 3000);
        assert_eq!(outcome.application_id, application_id);
        assert_eq!(outcome.deployment_url.as_deref(), Some("https://a.example.com"));
        assert_eq!(outcome.health_verdict(), HealthVerdict::Healthy);

        let elapsed = start.elapsed();
        assert!(elapsed >= STOP_SETTLE_DELAY);
        assert!(elapsed < STOP_SETTLE_DELAY + Duration::from_secs(1));
    }

    #[tokio::test(start_paused = true)]
    async fn test_failure_aborts_remaining_stages() {
        let fake = FakeDokploy::new();
        fake.fail_on(endpoints::APPLICATION_SAVE_DOCKER_PROVIDER, 500, "registry unreachable");
        let config = base_config();

        let err = Deployer::new(Gateway::new(&fake), &config)
            .run(&unused_probe())
            .await
            .unwrap_err();

        assert_eq!(err.remote_status(), Some(500));
        assert!(err.to_string().contains("registry unreachable"));
        assert_eq!(fake.count(endpoints::APPLICATION_DEPLOY), 0);
        assert_eq!(fake.count(endpoints::APPLICATION_CREATE), 1);
    }

    #[tokio::test]
    async fn test_missing_image_fails_before_network() {
        let fake = FakeDokploy::new();
        let mut config = base_config();
        config.docker.image = None;

        let err = Deployer::new(Gateway::new(&fake), &config)
            .run(&unused_probe())
            .await
            .unwrap_err();

        assert!(matches!(err, DeployError::Config(ConfigError::MissingInput { .. })));
        assert!(fake.calls().is_empty());
    }

    #[tokio::test]
    async fn test_malformed_inputs_fail_before_network() {
        let fake = FakeDokploy::new();
        let mut config = base_config();
        config.env.json = Some(String::from("{oops"));

        let err = Deployer::new(Gateway::new(&fake), &config)
            .run(&unused_probe())
            .await
            .unwrap_err();

        assert!(matches!(err, DeployError::Config(ConfigError::InvalidEnvJson { .. })));
        assert_eq!(fake.count(endpoints::PROJECT_CREATE), 0);
        assert!(fake.calls().is_empty());

        let mut config = base_config();
        config.application.memory_limit = Some(String::from("lots"));

        let err = Deployer::new(Gateway::new(&fake), &config)
            .run(&unused_probe())
            .await
            .unwrap_err();

        assert!(matches!(err, DeployError::Config(ConfigError::InvalidNumericInput { .. })));
        assert!(fake.calls().is_empty());
    }
}

//! Domain lifecycle management.
//!
//! One binding per host and application. An existing binding is reused
//! unless a recreate is forced, in which case it is removed, the platform
//! is given a moment to tear it down, and a fresh one is created.

use std::time::Duration;

use tracing::{debug, info};

use crate::config::DomainConfig;
use crate::dokploy::{CreateDomainRequest, Gateway, ResourceKind};
use crate::error::{ReconcileError, Result};

/// Wait between removing a binding and creating its replacement.
pub const DOMAIN_SETTLE_DELAY: Duration = Duration::from_secs(2);

/// Domain type sent on create.
const DOMAIN_TYPE: &str = "application";

/// Observed state of a host binding on an application.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DomainState {
    /// No binding for the host.
    Absent,
    /// A binding exists and is reused.
    Present {
        /// Existing binding.
        domain_id: String,
    },
    /// A binding exists and must be replaced.
    PresentForceRecreate {
        /// Binding to remove.
        domain_id: String,
    },
}

/// Ensures the application's public domain binding.
#[derive(Debug, Clone, Copy)]
pub struct DomainManager<'a> {
    gateway: Gateway<'a>,
}

impl<'a> DomainManager<'a> {
    /// Creates a new domain manager.
    #[must_use]
    pub const fn new(gateway: Gateway<'a>) -> Self {
        Self { gateway }
    }

    /// Determines the state of the configured host on the application.
    ///
    /// The domain list is fetched fresh on every call.
    ///
    /// # Errors
    ///
    /// Returns an error if the application cannot be fetched.
    pub async fn observe(
        &self,
        application_id: &str,
        host: &str,
        force_recreate: bool,
    ) -> Result<DomainState> {
        let application = self
            .gateway
            .get_application(application_id)
            .await?
            .ok_or_else(|| ReconcileError::NotFound {
                kind: ResourceKind::Application,
                id: application_id.to_string(),
            })?;

        let existing = application.domains.into_iter().find(|d| d.host == host);

        Ok(match existing {
            None => DomainState::Absent,
            Some(d) if force_recreate => DomainState::PresentForceRecreate {
                domain_id: d.domain_id,
            },
            Some(d) => DomainState::Present {
                domain_id: d.domain_id,
            },
        })
    }

    /// Ensures the binding and returns the deployment URL.
    ///
    /// Returns `None` without any API call when no host is configured.
    ///
    /// # Errors
    ///
    /// Returns an error if any domain API call fails.
    pub async fn ensure(
        &self,
        application_id: &str,
        domain: &DomainConfig,
        target_port: u16,
    ) -> Result<Option<String>> {
        let Some(host) = domain.host.as_deref() else {
            debug!("No domain host configured; skipping domain setup");
            return Ok(None);
        };

        let state = self
            .observe(application_id, host, domain.force_recreate)
            .await?;

        match state {
            DomainState::Absent => {
                self.create(application_id, host, domain, target_port).await?;
            }
            DomainState::Present { domain_id } => {
                info!("Domain {host} already bound ({domain_id}); reusing it");
            }
            DomainState::PresentForceRecreate { domain_id } => {
                info!("Recreating domain {host} ({domain_id})");
                self.gateway.remove_domain(&domain_id).await?;
                tokio::time::sleep(DOMAIN_SETTLE_DELAY).await;
                self.create(application_id, host, domain, target_port).await?;
            }
        }

        Ok(Some(deployment_url(host, domain.https)))
    }

    async fn create(
        &self,
        application_id: &str,
        host: &str,
        domain: &DomainConfig,
        target_port: u16,
    ) -> Result<()> {
        let request = CreateDomainRequest {
            application_id: application_id.to_string(),
            host: host.to_string(),
            path: domain.path.clone(),
            port: domain.port.filter(|p| *p != 0).unwrap_or(target_port),
            https: domain.https,
            certificate_type: domain.certificate_type,
            domain_type: String::from(DOMAIN_TYPE),
            strip_path: domain.strip_path,
        };

        info!("Creating domain {host} -> port {}", request.port);
        self.gateway.create_domain(&request).await
    }
}

/// URL the deployment is reachable at.
#[must_use]
pub fn deployment_url(host: &str, https: bool) -> String {
    let scheme = if https { "https" } else { "http" };
    format!("{scheme}://{host}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dokploy::endpoints;
    use crate::dokploy::fake::FakeDokploy;
    use serde_json::json;
    use tokio::time::Instant;

    fn domain(host: &str) -> DomainConfig {
        DomainConfig {
            host: Some(host.to_string()),
            ..DomainConfig::default()
        }
    }

    #[tokio::test]
    async fn test_no_host_does_nothing() {
        let fake = FakeDokploy::new();
        let manager = DomainManager::new(Gateway::new(&fake));

        let url = manager
            .ensure("app-1", &DomainConfig::default(), 8080)
            .await
            .unwrap();

        assert_eq!(url, None);
        assert!(fake.calls().is_empty());
    }

    #[tokio::test]
    async fn test_second_ensure_reuses_binding() {
        let fake = FakeDokploy::new();
        let app_id = fake.add_application("env-1", "api");
        let manager = DomainManager::new(Gateway::new(&fake));
        let config = domain("api.example.com");

        let first = manager.ensure(&app_id, &config, 8080).await.unwrap();
        let second = manager.ensure(&app_id, &config, 8080).await.unwrap();

        assert_eq!(first.as_deref(), Some("https://api.example.com"));
        assert_eq!(first, second);
        assert_eq!(fake.count(endpoints::DOMAIN_CREATE), 1);
        assert_eq!(fake.count(endpoints::DOMAIN_REMOVE), 0);
    }

    #[tokio::test]
    async fn test_create_body_defaults() {
        let fake = FakeDokploy::new();
        let app_id = fake.add_application("env-1", "api");
        let manager = DomainManager::new(Gateway::new(&fake));

        manager
            .ensure(&app_id, &domain("api.example.com"), 3000)
            .await
            .unwrap();

        assert_eq!(
            fake.last_body(endpoints::DOMAIN_CREATE),
            Some(json!({
                "applicationId": app_id,
                "host": "api.example.com",
                "path": "/",
                "port": 3000,
                "https": true,
                "certificateType": "letsencrypt",
                "domainType": "application",
                "stripPath": false,
            }))
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_force_recreate_removes_then_creates() {
        let fake = FakeDokploy::new();
        let app_id = fake.add_application("env-1", "api");
        let old_id = fake.add_domain(&app_id, "api.example.com");
        let manager = DomainManager::new(Gateway::new(&fake));
        let config = DomainConfig {
            force_recreate: true,
            https: false,
            ..domain("api.example.com")
        };

        let start = Instant::now();
        let url = manager.ensure(&app_id, &config, 8080).await.unwrap();

        assert_eq!(url.as_deref(), Some("http://api.example.com"));
        assert!(start.elapsed() >= DOMAIN_SETTLE_DELAY);
        assert_eq!(
            fake.post_paths(),
            vec![endpoints::DOMAIN_REMOVE, endpoints::DOMAIN_CREATE]
        );
        assert_eq!(
            fake.last_body(endpoints::DOMAIN_REMOVE),
            Some(json!({ "domainId": old_id }))
        );
    }

    #[tokio::test]
    async fn test_host_match_is_exact() {
        let fake = FakeDokploy::new();
        let app_id = fake.add_application("env-1", "api");
        fake.add_domain(&app_id, "API.example.com");
        let manager = DomainManager::new(Gateway::new(&fake));

        let state = manager
            .observe(&app_id, "api.example.com", false)
            .await
            .unwrap();
        assert_eq!(state, DomainState::Absent);
    }
}

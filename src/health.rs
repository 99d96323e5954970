//! Post-deployment health checking.
//!
//! A bounded retry loop against `{url}{path}`. Probe failures never
//! propagate as errors; they are absorbed into the verdict.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::config::HealthCheckConfig;
use crate::error::{DeployError, Result};

/// Per-request timeout in seconds.
const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// Connection timeout in seconds.
const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 5;

/// Outcome of the health check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthVerdict {
    /// An attempt answered 200.
    Healthy,
    /// Attempts or time ran out.
    Unhealthy,
    /// The check did not run.
    Skipped,
}

impl HealthVerdict {
    /// Returns the output value.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Healthy => "healthy",
            Self::Unhealthy => "unhealthy",
            Self::Skipped => "skipped",
        }
    }
}

impl std::fmt::Display for HealthVerdict {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Issues a single health request.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait HealthProbe: Send + Sync {
    /// Returns the HTTP status, or a description of the transport failure.
    async fn probe(&self, url: &str) -> std::result::Result<u16, String>;
}

/// Probe backed by a plain HTTP GET.
#[derive(Debug, Clone)]
pub struct HttpProbe {
    client: Client,
}

impl HttpProbe {
    /// Creates a new HTTP probe.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be created.
    pub fn new() -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(DEFAULT_TIMEOUT_SECS))
            .connect_timeout(Duration::from_secs(DEFAULT_CONNECT_TIMEOUT_SECS))
            .build()
            .map_err(|e| DeployError::internal(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self { client })
    }
}

#[async_trait]
impl HealthProbe for HttpProbe {
    async fn probe(&self, url: &str) -> std::result::Result<u16, String> {
        self.client
            .get(url)
            .send()
            .await
            .map(|response| response.status().as_u16())
            .map_err(|e| e.to_string())
    }
}

/// Health check result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HealthReport {
    /// Verdict.
    pub verdict: HealthVerdict,
    /// Number of probes issued.
    pub attempts: u32,
    /// Checked URL, if the check ran.
    pub url: Option<String>,
}

impl HealthReport {
    const fn skipped() -> Self {
        Self {
            verdict: HealthVerdict::Skipped,
            attempts: 0,
            url: None,
        }
    }
}

/// Runs the bounded health-check loop.
#[derive(Debug)]
pub struct HealthChecker<P> {
    probe: P,
    config: HealthCheckConfig,
}

impl HealthChecker<HttpProbe> {
    /// Creates a checker using HTTP GET probes.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be created.
    pub fn http(config: HealthCheckConfig) -> Result<Self> {
        Ok(Self::new(HttpProbe::new()?, config))
    }
}

impl<P: HealthProbe> HealthChecker<P> {
    /// Creates a checker with a custom probe.
    #[must_use]
    pub const fn new(probe: P, config: HealthCheckConfig) -> Self {
        Self { probe, config }
    }

    /// Checks the deployment at `url`.
    ///
    /// Each attempt that is not a 200 is logged; the loop ends early once
    /// the total timeout has elapsed, and no delay follows the last attempt.
    pub async fn verify(&self, url: Option<&str>) -> HealthReport {
        if !self.config.enabled {
            debug!("Health check disabled");
            return HealthReport::skipped();
        }

        let Some(base) = url else {
            warn!("No deployment URL available; skipping health check");
            return HealthReport::skipped();
        };

        let check_url = format!("{}{}", base.trim_end_matches('/'), self.config.path);
        let timeout = Duration::from_secs(self.config.timeout_secs);
        let interval = Duration::from_secs(self.config.interval_secs);
        let retries = self.config.retries;
        let start = Instant::now();

        info!("Checking health at {check_url} ({retries} attempt(s))");

        let mut attempts = 0;
        let mut verdict = HealthVerdict::Unhealthy;

        for attempt in 1..=retries {
            attempts = attempt;

            match self.probe.probe(&check_url).await {
                Ok(200) => {
                    info!("Health check passed on attempt {attempt}/{retries}");
                    verdict = HealthVerdict::Healthy;
                    break;
                }
                Ok(status) => {
                    warn!("Health check attempt {attempt}/{retries} returned HTTP {status}");
                }
                Err(e) => {
                    warn!("Health check attempt {attempt}/{retries} failed: {e}");
                }
            }

            if start.elapsed() >= timeout {
                warn!("Health check timed out after {}s", timeout.as_secs());
                break;
            }

            if attempt < retries {
                tokio::time::sleep(interval).await;
            }
        }

        HealthReport {
            verdict,
            attempts,
            url: Some(check_url),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockall::Sequence;
    use mockall::predicate::eq;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn scripted(statuses: &[u16]) -> MockHealthProbe {
        let mut probe = MockHealthProbe::new();
        let mut seq = Sequence::new();
        for &status in statuses {
            probe
                .expect_probe()
                .times(1)
                .in_sequence(&mut seq)
                .returning(move |_| Ok(status));
        }
        probe
    }

    #[tokio::test(start_paused = true)]
    async fn test_healthy_after_two_failures() {
        let checker = HealthChecker::new(scripted(&[503, 503, 200]), HealthCheckConfig::default());

        let start = Instant::now();
        let report = checker.verify(Some("https://api.example.com")).await;

        assert_eq!(report.verdict, HealthVerdict::Healthy);
        assert_eq!(report.attempts, 3);
        assert!(start.elapsed() >= Duration::from_secs(20));
        assert!(start.elapsed() < Duration::from_secs(21));
    }

    #[tokio::test(start_paused = true)]
    async fn test_unhealthy_without_trailing_delay() {
        let checker = HealthChecker::new(scripted(&[500, 500, 500]), HealthCheckConfig::default());

        let start = Instant::now();
        let report = checker.verify(Some("https://api.example.com")).await;

        assert_eq!(report.verdict, HealthVerdict::Unhealthy);
        assert_eq!(report.attempts, 3);
        assert!(start.elapsed() >= Duration::from_secs(20));
        assert!(start.elapsed() < Duration::from_secs(21));
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_ends_loop_early() {
        let config = HealthCheckConfig {
            timeout_secs: 15,
            retries: 5,
            ..HealthCheckConfig::default()
        };
        let checker = HealthChecker::new(scripted(&[500, 500, 500]), config);

        let report = checker.verify(Some("https://api.example.com")).await;

        assert_eq!(report.verdict, HealthVerdict::Unhealthy);
        assert_eq!(report.attempts, 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_transport_failures_are_retried() {
        let mut probe = MockHealthProbe::new();
        let mut seq = Sequence::new();
        probe
            .expect_probe()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Err(String::from("connection refused")));
        probe
            .expect_probe()
            .with(eq("https://api.example.com/ready"))
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(200));

        let config = HealthCheckConfig {
            path: String::from("/ready"),
            ..HealthCheckConfig::default()
        };
        let report = HealthChecker::new(probe, config)
            .verify(Some("https://api.example.com/"))
            .await;

        assert_eq!(report.verdict, HealthVerdict::Healthy);
        assert_eq!(report.url.as_deref(), Some("https://api.example.com/ready"));
    }

    #[tokio::test]
    async fn test_disabled_or_missing_url_is_skipped() {
        let config = HealthCheckConfig {
            enabled: false,
            ..HealthCheckConfig::default()
        };
        let report = HealthChecker::new(scripted(&[]), config)
            .verify(Some("https://api.example.com"))
            .await;
        assert_eq!(report.verdict, HealthVerdict::Skipped);
        assert_eq!(report.attempts, 0);

        let report = HealthChecker::new(scripted(&[]), HealthCheckConfig::default())
            .verify(None)
            .await;
        assert_eq!(report.verdict, HealthVerdict::Skipped);
    }

    #[tokio::test]
    async fn test_http_probe_reports_status() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/health"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let probe = HttpProbe::new().unwrap();
        let status = probe.probe(&format!("{}/health", server.uri())).await;

        assert_eq!(status, Ok(503));
    }

    #[test]
    fn test_verdict_strings() {
        assert_eq!(HealthVerdict::Healthy.to_string(), "healthy");
        assert_eq!(
            serde_json::to_value(HealthVerdict::Skipped).unwrap(),
            serde_json::json!("skipped")
        );
    }
}

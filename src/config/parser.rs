//! Configuration parser for loading deployment inputs.
//!
//! Configuration is layered: an optional YAML file, then pipeline inputs
//! read from the environment (`INPUT_<NAME>`, as set by CI runners). All
//! string inputs are trimmed here and empty values are treated as absent;
//! nothing downstream trims again.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use tracing::{debug, info};

use crate::error::{ConfigError, DeployError, Result};

use super::spec::DeployConfig;

/// Default configuration file names to search for.
pub const DEFAULT_CONFIG_FILES: &[&str] = &["dokploy.deploy.yaml", "dokploy.deploy.yml"];

/// Environment fallbacks for inputs that are commonly provided as secrets.
const ENV_FALLBACKS: &[(&str, &str)] = &[("dokploy-url", "DOKPLOY_URL"), ("api-key", "DOKPLOY_API_KEY")];

/// A source of named pipeline inputs (`docker-image`, `project-name`, ...).
pub trait InputSource {
    /// Returns the trimmed value of an input, or `None` when unset or blank.
    fn input(&self, name: &str) -> Option<String>;
}

/// Reads inputs from process environment variables.
#[derive(Debug, Default, Clone, Copy)]
pub struct EnvInputs;

impl InputSource for EnvInputs {
    fn input(&self, name: &str) -> Option<String> {
        let upper = name.to_ascii_uppercase();
        let candidates = [
            format!("INPUT_{upper}"),
            format!("INPUT_{}", upper.replace('-', "_")),
        ];

        let fallback = ENV_FALLBACKS
            .iter()
            .find(|(input, _)| *input == name)
            .map(|(_, var)| (*var).to_string());

        candidates
            .into_iter()
            .chain(fallback)
            .find_map(|var| std::env::var(var).ok().and_then(|v| non_empty(&v)))
    }
}

impl InputSource for HashMap<String, String> {
    fn input(&self, name: &str) -> Option<String> {
        self.get(name).and_then(|v| non_empty(v))
    }
}

fn non_empty(value: &str) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

/// Configuration parser for loading deployment configuration.
#[derive(Debug, Default)]
pub struct ConfigParser {
    /// Base path for resolving relative paths.
    base_path: Option<PathBuf>,
}

impl ConfigParser {
    /// Creates a new configuration parser.
    #[must_use]
    pub const fn new() -> Self {
        Self { base_path: None }
    }

    /// Sets the base path for resolving relative paths.
    #[must_use]
    pub fn with_base_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.base_path = Some(path.into());
        self
    }

    /// Loads configuration from a YAML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load_file(&self, path: impl AsRef<Path>) -> Result<DeployConfig> {
        let path = path.as_ref();
        info!("Loading configuration from: {}", path.display());

        if !path.exists() {
            return Err(DeployError::Config(ConfigError::FileNotFound {
                path: path.to_path_buf(),
            }));
        }

        let content = std::fs::read_to_string(path).map_err(|e| {
            DeployError::Config(ConfigError::ParseError {
                message: format!("Failed to read file: {e}"),
                location: Some(path.display().to_string()),
            })
        })?;

        self.parse_yaml(&content, Some(path))
    }

    /// Parses configuration from a YAML string.
    ///
    /// # Errors
    ///
    /// Returns an error if the YAML is invalid.
    pub fn parse_yaml(&self, content: &str, source: Option<&Path>) -> Result<DeployConfig> {
        debug!("Parsing YAML configuration");

        let config: DeployConfig = serde_yaml::from_str(content).map_err(|e| {
            let location = source.map(|p| p.display().to_string());
            DeployError::Config(ConfigError::ParseError {
                message: format!("YAML parse error: {e}"),
                location,
            })
        })?;

        Ok(config)
    }

    /// Loads the optional file, then layers environment inputs on top.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be parsed or an input is invalid.
    pub fn load(&self, path: Option<&Path>) -> Result<DeployConfig> {
        let mut config = match path {
            Some(path) => self.load_file(path)?,
            None => {
                debug!("No configuration file; using inputs only");
                DeployConfig::default()
            }
        };

        Self::apply_inputs(&mut config, &EnvInputs)?;
        Ok(config)
    }

    /// Loads the .env file if present.
    ///
    /// # Errors
    ///
    /// Returns an error if the .env file exists but cannot be loaded.
    pub fn load_dotenv(&self) -> Result<()> {
        let env_path = self
            .base_path
            .as_ref()
            .map_or_else(|| PathBuf::from(".env"), |p| p.join(".env"));

        if env_path.exists() {
            info!("Loading environment from: {}", env_path.display());
            dotenvy::from_path(&env_path).map_err(|e| {
                DeployError::Config(ConfigError::ParseError {
                    message: format!("Failed to load .env file: {e}"),
                    location: Some(env_path.display().to_string()),
                })
            })?;
        } else {
            debug!(".env file not found at: {}", env_path.display());
        }

        Ok(())
    }

    /// Overrides configuration values with any inputs that are set.
    ///
    /// # Errors
    ///
    /// Returns an error if a boolean, integer or enum input cannot be parsed.
    pub fn apply_inputs(config: &mut DeployConfig, inputs: &impl InputSource) -> Result<()> {
        let layer = InputLayer { inputs };

        layer.string("dokploy-url", &mut config.api.url);
        layer.string("api-key", &mut config.api.api_key);

        layer.string("project-id", &mut config.project.target.id);
        layer.string("project-name", &mut config.project.target.name);
        layer.string("project-description", &mut config.project.description);
        layer.parsed("auto-create-project", &mut config.project.target.auto_create, parse_bool)?;

        layer.string("environment-id", &mut config.environment.id);
        layer.string("environment-name", &mut config.environment.name);
        layer.parsed("auto-create-environment", &mut config.environment.auto_create, parse_bool)?;

        layer.string("server-id", &mut config.server.id);
        layer.string("server-name", &mut config.server.name);

        let app = &mut config.application;
        layer.string("application-id", &mut app.target.id);
        layer.string("application-name", &mut app.target.name);
        layer.string("application-title", &mut app.title);
        layer.string("application-description", &mut app.description);
        layer.parsed("auto-create-application", &mut app.target.auto_create, parse_bool)?;
        layer.string("container-name", &mut app.container_name);
        layer.optional("port", &mut app.port, parse_from_str)?;
        layer.optional("target-port", &mut app.target_port, parse_from_str)?;
        layer.optional("restart-policy", &mut app.restart_policy, parse_from_str)?;
        layer.string("memory-limit", &mut app.memory_limit);
        layer.string("memory-reservation", &mut app.memory_reservation);
        layer.string("cpu-limit", &mut app.cpu_limit);
        layer.string("cpu-reservation", &mut app.cpu_reservation);
        layer.string("replicas", &mut app.replicas);
        layer.string("min-replicas", &mut app.min_replicas);
        layer.string("max-replicas", &mut app.max_replicas);

        layer.string("docker-image", &mut config.docker.image);
        layer.parsed("registry-url", &mut config.docker.registry_url, parse_from_str)?;
        layer.string("registry-username", &mut config.docker.username);
        layer.string("registry-password", &mut config.docker.password);

        layer.string("env-json", &mut config.env.json);
        layer.string("env-file", &mut config.env.file);
        layer.string("env", &mut config.env.raw);

        let domain = &mut config.domain;
        layer.string("domain-host", &mut domain.host);
        layer.parsed("domain-path", &mut domain.path, parse_from_str)?;
        layer.optional("domain-port", &mut domain.port, parse_from_str)?;
        layer.parsed("domain-https", &mut domain.https, parse_bool)?;
        layer.parsed("domain-certificate-type", &mut domain.certificate_type, parse_from_str)?;
        layer.parsed("domain-strip-path", &mut domain.strip_path, parse_bool)?;
        layer.parsed("force-domain-recreate", &mut domain.force_recreate, parse_bool)?;

        let deployment = &mut config.deployment;
        layer.string("deployment-title", &mut deployment.title);
        layer.string("deployment-description", &mut deployment.description);
        layer.parsed("cleanup-old-containers", &mut deployment.cleanup_old_containers, parse_bool)?;
        layer.parsed("wait-for-deployment", &mut deployment.wait_for_deployment, parse_bool)?;
        layer.parsed("deployment-timeout", &mut deployment.timeout_secs, parse_from_str)?;

        let health = &mut config.health_check;
        layer.parsed("health-check-enabled", &mut health.enabled, parse_bool)?;
        layer.parsed("health-check-path", &mut health.path, parse_from_str)?;
        layer.parsed("health-check-timeout", &mut health.timeout_secs, parse_from_str)?;
        layer.parsed("health-check-retries", &mut health.retries, parse_from_str)?;
        layer.parsed("health-check-interval", &mut health.interval_secs, parse_from_str)?;

        Ok(())
    }
}

/// Applies one input source onto configuration fields.
struct InputLayer<'i, I: InputSource> {
    inputs: &'i I,
}

impl<I: InputSource> InputLayer<'_, I> {
    fn string(&self, name: &str, field: &mut Option<String>) {
        if let Some(value) = self.inputs.input(name) {
            debug!("Input '{name}' overrides configuration");
            *field = Some(value);
        }
    }

    fn parsed<T>(
        &self,
        name: &str,
        field: &mut T,
        parse: impl Fn(&str) -> Option<T>,
    ) -> Result<()> {
        if let Some(raw) = self.inputs.input(name) {
            *field = parse(&raw).ok_or_else(|| invalid(name, &raw))?;
        }
        Ok(())
    }

    fn optional<T>(
        &self,
        name: &str,
        field: &mut Option<T>,
        parse: impl Fn(&str) -> Option<T>,
    ) -> Result<()> {
        if let Some(raw) = self.inputs.input(name) {
            *field = Some(parse(&raw).ok_or_else(|| invalid(name, &raw))?);
        }
        Ok(())
    }
}

fn invalid(name: &str, raw: &str) -> DeployError {
    DeployError::Config(ConfigError::InvalidInput {
        name: name.to_string(),
        value: raw.to_string(),
    })
}

/// Parses a pipeline boolean (`true/false/yes/no/1/0`, any case).
#[must_use]
pub fn parse_bool(raw: &str) -> Option<bool> {
    match raw.to_ascii_lowercase().as_str() {
        "true" | "yes" | "1" => Some(true),
        "false" | "no" | "0" => Some(false),
        _ => None,
    }
}

fn parse_from_str<T: FromStr>(raw: &str) -> Option<T> {
    raw.parse().ok()
}

/// Finds the configuration file in the given directory or its parents.
#[must_use]
pub fn find_config_file(start_dir: impl AsRef<Path>) -> Option<PathBuf> {
    let mut current = start_dir.as_ref().to_path_buf();

    loop {
        for filename in DEFAULT_CONFIG_FILES {
            let config_path = current.join(filename);
            if config_path.exists() {
                info!("Found configuration file: {}", config_path.display());
                return Some(config_path);
            }
        }

        if !current.pop() {
            return None;
        }
    }
}

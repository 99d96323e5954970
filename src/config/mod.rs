//! Configuration module for the deployment pipeline.
//!
//! This module handles all configuration-related functionality:
//! - Parsing `dokploy.deploy.yaml` and pipeline inputs
//! - Trimming and typing inputs at the boundary
//! - Validation of configuration values before any network call

mod parser;
mod spec;
mod validator;

pub use parser::{
    ConfigParser, DEFAULT_CONFIG_FILES, EnvInputs, InputSource, find_config_file, parse_bool,
};
pub use spec::{
    ApiConfig, ApplicationConfig, DeployConfig, DeploymentOptions, DockerConfig, DomainConfig,
    EnvConfig, HealthCheckConfig, ProjectConfig, ResourceTarget, RestartPolicy, ServerTarget,
};
pub use validator::{ConfigValidator, ValidationError, ValidationResult};

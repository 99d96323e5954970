//! Dokploy API integration module.
//!
//! This module provides the request capability, its HTTP implementation,
//! typed endpoint access and the remote record types.

mod client;
mod gateway;
mod redact;
mod types;

#[cfg(test)]
pub(crate) mod fake;

pub use client::{API_KEY_HEADER, DokployApi, DokployClient, extract_message};
pub use gateway::{Gateway, endpoints};
pub use redact::{REDACTED, is_sensitive_key, redact};
pub use types::{
    Application, CertificateType, CreateDomainRequest, CreateEnvironmentRequest,
    CreateProjectRequest, DeployApplicationRequest, Domain, Environment, Project, ResourceKind,
    SaveDockerProviderRequest, SaveEnvironmentRequest, Server,
};

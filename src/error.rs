//! Error types for the Dokploy deployment pipeline.
//!
//! This module provides the error hierarchy for every stage of a run:
//! configuration, the Dokploy API gateway, and resource reconciliation.
//! Every error is terminal for the run; only the health-check verifier
//! absorbs failures into its verdict.

use std::path::PathBuf;
use thiserror::Error;

use crate::dokploy::ResourceKind;

/// The main error type for the deployment pipeline.
#[derive(Debug, Error)]
pub enum DeployError {
    /// Configuration-related errors.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Dokploy API errors.
    #[error("Dokploy API error: {0}")]
    Api(#[from] ApiError),

    /// Reconciliation errors.
    #[error("Reconciliation error: {0}")]
    Reconcile(#[from] ReconcileError),

    /// IO errors.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Configuration-related errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration file was not found.
    #[error("Configuration file not found: {path}")]
    FileNotFound {
        /// Path to the missing file.
        path: PathBuf,
    },

    /// The configuration file could not be parsed.
    #[error("Failed to parse configuration: {message}")]
    ParseError {
        /// Description of the parse error.
        message: String,
        /// Optional source location.
        location: Option<String>,
    },

    /// Validation failed.
    #[error("Configuration validation failed: {message}")]
    ValidationError {
        /// Description of the validation error.
        message: String,
        /// Field that failed validation.
        field: Option<String>,
    },

    /// A required input is missing.
    #[error("Missing required input: {name}")]
    MissingInput {
        /// Name of the missing input.
        name: String,
    },

    /// An input could not be interpreted (boolean, integer, enum value).
    #[error("Invalid value for input '{name}': {value}")]
    InvalidInput {
        /// Name of the input.
        name: String,
        /// The raw value that was rejected.
        value: String,
    },

    /// A resource or scaling field failed to parse as a non-negative integer.
    #[error("Invalid numeric value for {field}: '{raw_value}'")]
    InvalidNumericInput {
        /// Field that failed to parse.
        field: String,
        /// The raw value as supplied.
        raw_value: String,
    },

    /// The JSON environment payload is malformed.
    #[error("Invalid environment JSON: {message}")]
    InvalidEnvJson {
        /// Description of the parse failure.
        message: String,
    },
}

/// Dokploy API errors.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The API answered with a non-success status.
    #[error("Dokploy API request failed: {status} - {message}")]
    Remote {
        /// HTTP status code.
        status: u16,
        /// Error message extracted from the response body.
        message: String,
    },

    /// Network error.
    #[error("Network error communicating with Dokploy: {message}")]
    Network {
        /// Description of the network error.
        message: String,
    },

    /// Invalid response from API.
    #[error("Invalid response from Dokploy API: {message}")]
    InvalidResponse {
        /// Description of the response issue.
        message: String,
    },
}

/// Reconciliation errors.
#[derive(Debug, Error)]
pub enum ReconcileError {
    /// Neither an id nor a name was supplied.
    #[error("Either an id or a name is required to resolve the {kind}")]
    MissingIdentifier {
        /// Kind of resource.
        kind: ResourceKind,
    },

    /// An explicit id does not resolve to a remote resource.
    #[error("{kind} with id '{id}' not found")]
    NotFound {
        /// Kind of resource.
        kind: ResourceKind,
        /// The id that was looked up.
        id: String,
    },

    /// A name lookup missed and auto-creation is disabled.
    #[error("{kind} '{name}' not found and auto-creation is disabled")]
    NotFoundAndCreationDisabled {
        /// Kind of resource.
        kind: ResourceKind,
        /// The name that was looked up.
        name: String,
    },

    /// A server lookup by name missed. Servers are never created.
    #[error("Server '{name}' not found")]
    ServerNotFound {
        /// The server name that was looked up.
        name: String,
    },
}

/// Result type alias for deployment operations.
pub type Result<T> = std::result::Result<T, DeployError>;

impl DeployError {
    /// Creates a new internal error with the given message.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// Returns the HTTP status if this error came from a remote response.
    #[must_use]
    pub const fn remote_status(&self) -> Option<u16> {
        match self {
            Self::Api(ApiError::Remote { status, .. }) => Some(*status),
            _ => None,
        }
    }
}

impl ConfigError {
    /// Creates a validation error for a specific field.
    #[must_use]
    pub fn validation(message: impl Into<String>, field: impl Into<String>) -> Self {
        Self::ValidationError {
            message: message.into(),
            field: Some(field.into()),
        }
    }

    /// Creates a numeric parse error for a field.
    #[must_use]
    pub fn numeric(field: impl Into<String>, raw_value: impl Into<String>) -> Self {
        Self::InvalidNumericInput {
            field: field.into(),
            raw_value: raw_value.into(),
        }
    }
}

impl ApiError {
    /// Creates a remote error.
    #[must_use]
    pub fn remote(status: u16, message: impl Into<String>) -> Self {
        Self::Remote {
            status,
            message: message.into(),
        }
    }

    /// Creates a network error.
    #[must_use]
    pub fn network(message: impl Into<String>) -> Self {
        Self::Network {
            message: message.into(),
        }
    }

    /// Creates an invalid-response error.
    #[must_use]
    pub fn invalid_response(message: impl Into<String>) -> Self {
        Self::InvalidResponse {
            message: message.into(),
        }
    }
}

//! Environment-variable blob resolution.
//!
//! The application's variables are a single newline-delimited `KEY=VALUE`
//! blob. Sources in precedence order: JSON object, env file, raw text.

use serde_json::Value;
use tracing::warn;

use crate::config::EnvConfig;
use crate::error::{ConfigError, Result};

/// Which input the applied blob came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnvSource {
    /// `env-json`.
    Json,
    /// `env-file`; accepted but not read.
    File,
    /// `env`.
    Raw,
    /// Nothing supplied.
    None,
}

/// Resolved environment blob.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnvBlob {
    /// Input the blob came from.
    pub source: EnvSource,
    /// Newline-delimited `KEY=VALUE` text.
    pub content: String,
}

impl EnvBlob {
    /// Resolves the blob from the configured sources.
    ///
    /// # Errors
    ///
    /// Returns `InvalidEnvJson` if the JSON source is malformed or not an object.
    pub fn resolve(config: &EnvConfig) -> Result<Self> {
        if let Some(json) = &config.json {
            return Ok(Self {
                source: EnvSource::Json,
                content: flatten_json(json)?,
            });
        }

        if let Some(file) = &config.file {
            warn!("env-file '{file}' is not read; no variables applied from it");
            return Ok(Self {
                source: EnvSource::File,
                content: String::new(),
            });
        }

        Ok(config.raw.as_ref().map_or_else(
            || Self {
                source: EnvSource::None,
                content: String::new(),
            },
            |raw| Self {
                source: EnvSource::Raw,
                content: raw.clone(),
            },
        ))
    }

    /// Returns true when there is nothing to push.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.content.trim().is_empty()
    }
}

/// Flattens a JSON object into `KEY=value` lines in the object's order.
///
/// String values are written verbatim; other values as their JSON text.
///
/// # Errors
///
/// Returns `InvalidEnvJson` if the payload is malformed or not an object.
pub fn flatten_json(payload: &str) -> Result<String> {
    let value: Value = serde_json::from_str(payload).map_err(|e| ConfigError::InvalidEnvJson {
        message: e.to_string(),
    })?;

    let Value::Object(map) = value else {
        return Err(ConfigError::InvalidEnvJson {
            message: String::from("expected a JSON object of variables"),
        }
        .into());
    };

    let lines: Vec<String> = map
        .iter()
        .map(|(key, value)| match value {
            Value::String(s) => format!("{key}={s}"),
            other => format!("{key}={other}"),
        })
        .collect();

    Ok(lines.join("\n"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DeployError;

    #[test]
    fn test_json_keeps_object_order() {
        let blob = flatten_json(r#"{"ZED":"1","ALPHA":"two","PORT":8080,"DEBUG":false}"#).unwrap();
        assert_eq!(blob, "ZED=1\nALPHA=two\nPORT=8080\nDEBUG=false");
    }

    #[test]
    fn test_json_wins_over_raw() {
        let config = EnvConfig {
            json: Some(String::from(r#"{"A":"json"}"#)),
            file: None,
            raw: Some(String::from("A=raw\nB=raw")),
        };

        let blob = EnvBlob::resolve(&config).unwrap();
        assert_eq!(blob.source, EnvSource::Json);
        assert_eq!(blob.content, "A=json");
    }

    #[test]
    fn test_file_shadows_raw() {
        let config = EnvConfig {
            json: None,
            file: Some(String::from(".env.prod")),
            raw: Some(String::from("A=raw")),
        };

        let blob = EnvBlob::resolve(&config).unwrap();
        assert_eq!(blob.source, EnvSource::File);
        assert!(blob.is_empty());
    }

    #[test]
    fn test_raw_and_none() {
        let raw = EnvBlob::resolve(&EnvConfig {
            raw: Some(String::from("A=1\nB=2")),
            ..EnvConfig::default()
        })
        .unwrap();
        assert_eq!(raw.content, "A=1\nB=2");

        let none = EnvBlob::resolve(&EnvConfig::default()).unwrap();
        assert_eq!(none.source, EnvSource::None);
        assert!(none.is_empty());
    }

    #[test]
    fn test_malformed_json() {
        for payload in ["{not json", "[1,2]"] {
            let err = flatten_json(payload).unwrap_err();
            assert!(matches!(err, DeployError::Config(ConfigError::InvalidEnvJson { .. })));
        }
    }
}

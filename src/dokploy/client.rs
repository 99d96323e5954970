//! Dokploy API client implementation.
//!
//! This module provides the `DokployApi` capability and its HTTP
//! implementation against the Dokploy REST API.

use async_trait::async_trait;
use reqwest::{Client, Response, StatusCode, header};
use serde_json::Value;
use tracing::{debug, trace};

use crate::error::{ApiError, Result};

use super::redact::redact;

/// Header carrying the caller's API key.
pub const API_KEY_HEADER: &str = "x-api-key";

/// Message used when an error response carries neither `message` nor `error`.
const UNKNOWN_ERROR: &str = "Unknown error";

/// The two calls every stage is built on.
///
/// Implementations attach authentication and surface non-success
/// responses as [`ApiError::Remote`]. No retry happens at this layer.
#[async_trait]
pub trait DokployApi: Send + Sync {
    /// Issues a GET and returns the decoded JSON body.
    ///
    /// Fails unless the response status is 200.
    async fn get(&self, path: &str, query: &[(&str, &str)]) -> Result<Value>;

    /// Issues a POST with a JSON body and returns the decoded JSON body.
    ///
    /// Fails unless the response status is 200 or 201.
    async fn post(&self, path: &str, body: &Value) -> Result<Value>;
}

/// Dokploy API client.
#[derive(Debug, Clone)]
pub struct DokployClient {
    /// HTTP client.
    client: Client,
    /// Base URL of the Dokploy instance, without trailing slash.
    base_url: String,
    /// API key.
    api_key: String,
}

impl DokployClient {
    /// Creates a new Dokploy API client.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be created.
    pub fn new(base_url: &str, api_key: &str) -> Result<Self> {
        let client = Client::builder()
            .build()
            .map_err(|e| ApiError::network(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    /// Reads a response body as JSON; an empty body decodes to `null`.
    async fn read_json(response: Response) -> Result<Value> {
        let text = response
            .text()
            .await
            .map_err(|e| ApiError::network(format!("Failed to read response: {e}")))?;

        if text.trim().is_empty() {
            return Ok(Value::Null);
        }

        serde_json::from_str(&text).map_err(|e| {
            ApiError::invalid_response(format!("Failed to parse response: {e}")).into()
        })
    }

    /// Converts an unsuccessful response into a remote error.
    async fn remote_error(response: Response) -> ApiError {
        let status = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();
        ApiError::remote(status, extract_message(&body))
    }
}

#[async_trait]
impl DokployApi for DokployClient {
    async fn get(&self, path: &str, query: &[(&str, &str)]) -> Result<Value> {
        debug!(method = "GET", path, ?query, "Dokploy request");

        let response = self
            .client
            .get(self.url(path))
            .header(API_KEY_HEADER, &self.api_key)
            .header(header::ACCEPT, "application/json")
            .query(query)
            .send()
            .await
            .map_err(|e| ApiError::network(format!("Request failed: {e}")))?;

        if response.status() != StatusCode::OK {
            return Err(Self::remote_error(response).await.into());
        }

        let value = Self::read_json(response).await?;
        trace!(path, response = %redact(&value), "Dokploy response");
        Ok(value)
    }

    async fn post(&self, path: &str, body: &Value) -> Result<Value> {
        debug!(method = "POST", path, body = %redact(body), "Dokploy request");

        let response = self
            .client
            .post(self.url(path))
            .header(API_KEY_HEADER, &self.api_key)
            .header(header::ACCEPT, "application/json")
            .json(body)
            .send()
            .await
            .map_err(|e| ApiError::network(format!("Request failed: {e}")))?;

        let status = response.status();
        if status != StatusCode::OK && status != StatusCode::CREATED {
            return Err(Self::remote_error(response).await.into());
        }

        let value = Self::read_json(response).await?;
        trace!(path, response = %redact(&value), "Dokploy response");
        Ok(value)
    }
}

/// Extracts the remote message from an error body (`message`, then `error`).
#[must_use]
pub fn extract_message(body: &str) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|value| {
            value
                .get("message")
                .or_else(|| value.get("error"))
                .and_then(Value::as_str)
                .map(str::to_string)
        })
        .unwrap_or_else(|| String::from(UNKNOWN_ERROR))
}

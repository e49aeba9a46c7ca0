//! HTTP-based `QueryService` talking to an Overpass API interpreter.
//!
//! # Architecture
//!
//! The [`QueryService`] trait is synchronous so the fetch pipeline can run
//! on a plain thread. This client bridges the async `reqwest` calls to the
//! sync interface by blocking on a Tokio runtime it owns.
//!
//! Queries are sent as `POST {endpoint}` with the form field `data`, which
//! is what the public Overpass instances expect for long queries.

use std::time::Duration;

use log::debug;
use reqwest::{Client, StatusCode};
use thiserror::Error;
use tokio::runtime::{Handle, Runtime, RuntimeFlavor};
use wayfetch_core::{QueryResult, QueryService, RemoteError};

use super::wire::decode_response;

/// Public Overpass instance used when no endpoint is configured.
pub const DEFAULT_ENDPOINT: &str = "https://overpass-api.de/api/interpreter";

/// Default user agent for Overpass requests.
pub const DEFAULT_USER_AGENT: &str = "wayfetch/0.1";

/// Default request timeout in seconds. Overpass's own default query
/// timeout is 180 seconds.
const DEFAULT_TIMEOUT_SECS: u64 = 180;

/// Longest slice of an error body echoed into [`RemoteError::Http`].
const MAX_ERROR_BODY_CHARS: usize = 200;

/// Error type for [`OverpassClient`] construction failures.
#[derive(Debug, Error)]
pub enum ClientBuildError {
    /// Failed to build the HTTP client.
    #[error("failed to build HTTP client: {0}")]
    HttpClient(#[source] reqwest::Error),
    /// Failed to build the Tokio runtime.
    #[error("failed to build Tokio runtime: {0}")]
    Runtime(#[source] std::io::Error),
}

/// Configuration for [`OverpassClient`].
#[derive(Debug, Clone)]
pub struct OverpassClientConfig {
    /// Interpreter URL (e.g. `"https://overpass-api.de/api/interpreter"`).
    pub endpoint: String,
    /// Request timeout duration.
    pub timeout: Duration,
    /// User agent string for requests.
    pub user_agent: String,
}

impl Default for OverpassClientConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_owned(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            user_agent: DEFAULT_USER_AGENT.to_owned(),
        }
    }
}

impl OverpassClientConfig {
    /// Create a new configuration for the given endpoint.
    #[must_use]
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            ..Default::default()
        }
    }

    /// Set the request timeout.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the user agent string.
    #[must_use]
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }
}

/// Overpass API client implementing [`QueryService`].
///
/// # Status mapping
///
/// | response                         | error                            |
/// |----------------------------------|----------------------------------|
/// | HTTP 429                         | [`RemoteError::TooManyRequests`] |
/// | HTTP 504                         | [`RemoteError::GatewayTimeout`]  |
/// | other non-2xx                    | [`RemoteError::Http`]            |
/// | client timeout                   | [`RemoteError::Timeout`]         |
/// | connection failure               | [`RemoteError::Network`]         |
/// | undecodable body                 | [`RemoteError::Parse`]           |
/// | `remark` reporting runtime error | [`RemoteError::Runtime`]         |
///
/// # Runtime behaviour
///
/// Outside any Tokio runtime the client uses its own current-thread
/// runtime. Inside a multi-threaded runtime it borrows that runtime's handle
/// through [`tokio::task::block_in_place`]. Inside a `current_thread`
/// runtime it falls back to its own runtime, which may deadlock if the
/// caller's runtime drives IO this request depends on.
pub struct OverpassClient {
    client: Client,
    config: OverpassClientConfig,
    runtime: Runtime,
}

impl std::fmt::Debug for OverpassClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OverpassClient")
            .field("client", &self.client)
            .field("config", &self.config)
            .field("runtime", &"<tokio::runtime::Runtime>")
            .finish()
    }
}

impl OverpassClient {
    /// Create a client for `endpoint` with default settings.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client or Tokio runtime fails to build.
    pub fn new(endpoint: impl Into<String>) -> Result<Self, ClientBuildError> {
        Self::with_config(OverpassClientConfig::new(endpoint))
    }

    /// Create a client with explicit configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client or Tokio runtime fails to build.
    pub fn with_config(config: OverpassClientConfig) -> Result<Self, ClientBuildError> {
        let client = Client::builder()
            .user_agent(&config.user_agent)
            .connect_timeout(config.timeout)
            .timeout(config.timeout)
            .build()
            .map_err(ClientBuildError::HttpClient)?;
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(ClientBuildError::Runtime)?;
        Ok(Self {
            client,
            config,
            runtime,
        })
    }

    /// The active configuration.
    #[must_use]
    pub const fn config(&self) -> &OverpassClientConfig {
        &self.config
    }

    async fn query_async(&self, query: &str) -> Result<QueryResult, RemoteError> {
        let url = self.config.endpoint.as_str();
        debug!("POST {url} ({} byte query)", query.len());

        let response = self
            .client
            .post(url)
            .form(&[("data", query)])
            .send()
            .await
            .map_err(|err| self.convert_reqwest_error(&err))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(self.convert_status(status, &body));
        }

        let body = response
            .text()
            .await
            .map_err(|err| self.convert_reqwest_error(&err))?;
        debug!("received {} byte response", body.len());
        decode_response(&body)
    }

    /// Map a non-success status to a [`RemoteError`].
    fn convert_status(&self, status: StatusCode, body: &str) -> RemoteError {
        let url = self.config.endpoint.clone();
        match status {
            StatusCode::TOO_MANY_REQUESTS => RemoteError::TooManyRequests { url },
            StatusCode::GATEWAY_TIMEOUT => RemoteError::GatewayTimeout { url },
            other => RemoteError::Http {
                url,
                status: other.as_u16(),
                message: summarise_body(other, body),
            },
        }
    }

    /// Convert a transport-level reqwest error.
    fn convert_reqwest_error(&self, error: &reqwest::Error) -> RemoteError {
        let url = self.config.endpoint.clone();
        if error.is_timeout() {
            return RemoteError::Timeout {
                url,
                timeout_secs: self.config.timeout.as_secs(),
            };
        }
        if let Some(status) = error.status() {
            return self.convert_status(status, "");
        }
        RemoteError::Network {
            url,
            message: error.to_string(),
        }
    }
}

/// First line of `body`, or the canonical reason when the body is empty.
fn summarise_body(status: StatusCode, body: &str) -> String {
    let line = body.lines().map(str::trim).find(|line| !line.is_empty());
    match line {
        Some(text) => text.chars().take(MAX_ERROR_BODY_CHARS).collect(),
        None => status.canonical_reason().unwrap_or("unknown status").to_owned(),
    }
}

impl QueryService for OverpassClient {
    fn query(&self, query: &str) -> Result<QueryResult, RemoteError> {
        let future = self.query_async(query);
        match Handle::try_current() {
            Ok(handle) if handle.runtime_flavor() == RuntimeFlavor::MultiThread => {
                tokio::task::block_in_place(|| handle.block_on(future))
            }
            // No runtime detected, or current_thread runtime: use our own runtime.
            _ => self.runtime.block_on(future),
        }
    }
}

//! n8n public API client utilities.
//!
//! This crate provides a lightweight client for the n8n REST API (`/api/v1`). It focuses on:
//!
//! - Constructing an HTTP client with the API key header and sensible defaults
//! - Validating the configured base URL before any request is built
//! - Normalizing every response into either a JSON value or an [`ApiError`] whose display
//!   text is the message reported by n8n
//!
//! Consumers depend on the [`WorkflowApi`] trait rather than the concrete [`N8nClient`], so the
//! template pipeline and the tool layer can be exercised against in-memory fakes.
//!
//! # Example
//!
//! ```ignore
//! use n8n_mcp_api::{ApiRequest, N8nClient, WorkflowApi};
//!
//! async fn list() -> Result<(), n8n_mcp_api::ApiError> {
//!     let client = N8nClient::new("http://localhost:5678", "n8n_api_key")?;
//!     let workflows = client.send(ApiRequest::get("/workflows").with_query("limit", "10")).await?;
//!     println!("{workflows}");
//!     Ok(())
//! }
//! ```

use std::time::Duration;

use async_trait::async_trait;
use n8n_mcp_types::CreateWorkflowPayload;
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use reqwest::{Client, StatusCode, header};
use serde_json::Value;
use thiserror::Error;
use tracing::debug;
use url::Url;

pub use reqwest::Method;

/// Header carrying the n8n API key.
pub const API_KEY_HEADER: &str = "x-n8n-api-key";
/// Path prefix of the public API relative to the instance base URL.
pub const API_PATH_PREFIX: &str = "/api/v1";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Characters escaped when interpolating values into a path segment.
const PATH_SEGMENT: &AsciiSet = &NON_ALPHANUMERIC.remove(b'-').remove(b'_').remove(b'.').remove(b'~');

/// Errors surfaced by the remote workflow service.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ApiError {
    /// The API answered with a non-success status. The message is n8n's own.
    #[error("{message}")]
    Rejected { status: u16, message: String },
    /// The request never produced a response (connect, TLS, timeout).
    #[error("{0}")]
    Transport(String),
    /// The response body or request payload could not be (de)serialized.
    #[error("invalid payload: {0}")]
    Payload(String),
    #[error("invalid n8n base URL '{url}': {reason}")]
    InvalidBaseUrl { url: String, reason: String },
    #[error("failed to build HTTP client: {0}")]
    Client(String),
}

/// A single API call relative to [`API_PATH_PREFIX`].
#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest {
    pub method: Method,
    pub path: String,
    pub query: Vec<(String, String)>,
    pub body: Option<Value>,
}

impl ApiRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: Vec::new(),
            body: None,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::POST, path)
    }

    pub fn put(path: impl Into<String>) -> Self {
        Self::new(Method::PUT, path)
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::DELETE, path)
    }

    /// Append a query pair.
    pub fn with_query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((key.into(), value.into()));
        self
    }

    /// Attach a JSON body.
    pub fn with_body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }
}

/// Remote workflow service consumed by the template pipeline and pass-through tools.
#[async_trait]
pub trait WorkflowApi: Send + Sync {
    /// Execute an arbitrary API request and return the decoded JSON body.
    async fn send(&self, request: ApiRequest) -> Result<Value, ApiError>;

    /// Create a workflow. Returns the persisted workflow, including its assigned `id`.
    async fn create_workflow(&self, payload: &CreateWorkflowPayload) -> Result<Value, ApiError> {
        let body = serde_json::to_value(payload).map_err(|error| ApiError::Payload(error.to_string()))?;
        self.send(ApiRequest::post("/workflows").with_body(body)).await
    }

    /// Activate a previously created workflow.
    async fn activate_workflow(&self, workflow_id: &str) -> Result<Value, ApiError> {
        self.send(ApiRequest::post(format!("/workflows/{}/activate", encode_path_segment(workflow_id))))
            .await
    }

    /// Editor URL for a workflow, when the service knows its public address.
    fn workflow_url(&self, _workflow_id: &str) -> Option<String> {
        None
    }
}

/// Thin wrapper around a configured `reqwest::Client` for n8n API access.
#[derive(Debug, Clone)]
pub struct N8nClient {
    base_url: String,
    http: Client,
}

impl N8nClient {
    /// Construct a client for the instance at `base_url` authenticated with `api_key`.
    ///
    /// The base URL is validated with [`validate_base_url`] and stored without a trailing slash.
    pub fn new(base_url: &str, api_key: &str) -> Result<Self, ApiError> {
        validate_base_url(base_url)?;

        let mut api_key_value =
            header::HeaderValue::from_str(api_key).map_err(|error| ApiError::Client(format!("invalid API key header: {error}")))?;
        api_key_value.set_sensitive(true);

        let mut default_headers = header::HeaderMap::new();
        default_headers.insert(header::HeaderName::from_static(API_KEY_HEADER), api_key_value);
        default_headers.insert(header::ACCEPT, header::HeaderValue::from_static("application/json"));

        let http = Client::builder()
            .default_headers(default_headers)
            .user_agent(format!("n8n-mcp/{}; {}", env!("CARGO_PKG_VERSION"), std::env::consts::OS))
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|error| ApiError::Client(error.to_string()))?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            http,
        })
    }

    /// Instance base URL without the API prefix.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Absolute URL for an API-relative path.
    pub fn request_url(&self, path: &str) -> String {
        format!("{}{}{}", self.base_url, API_PATH_PREFIX, path)
    }
}

#[async_trait]
impl WorkflowApi for N8nClient {
    async fn send(&self, request: ApiRequest) -> Result<Value, ApiError> {
        let url = self.request_url(&request.path);
        debug!(method = %request.method, %url, query_pairs = request.query.len(), "sending n8n API request");

        let mut builder = self.http.request(request.method, url);
        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }
        if let Some(body) = request.body.as_ref() {
            builder = builder.json(body);
        }

        let response = builder.send().await.map_err(|error| ApiError::Transport(error.to_string()))?;
        let status = response.status();
        let text = response.text().await.map_err(|error| ApiError::Transport(error.to_string()))?;
        debug!(status = status.as_u16(), bytes = text.len(), "received n8n API response");

        if !status.is_success() {
            return Err(ApiError::Rejected {
                status: status.as_u16(),
                message: rejection_message(status, &text),
            });
        }
        decode_body(&text)
    }

    fn workflow_url(&self, workflow_id: &str) -> Option<String> {
        Some(format!("{}/workflow/{}", self.base_url, workflow_id))
    }
}

/// Percent-encode a value for use as a single path segment.
pub fn encode_path_segment(value: &str) -> String {
    utf8_percent_encode(value, PATH_SEGMENT).to_string()
}

/// Validate that a base URL is acceptable for use by the client.
///
/// Rules:
/// - must parse as an absolute URL
/// - scheme must be `http` or `https`
/// - a host is required
pub fn validate_base_url(base: &str) -> Result<(), ApiError> {
    let invalid = |reason: String| ApiError::InvalidBaseUrl {
        url: base.to_string(),
        reason,
    };
    let parsed = Url::parse(base).map_err(|error| invalid(error.to_string()))?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(invalid(format!("unsupported scheme '{}://'", parsed.scheme())));
    }
    if parsed.host_str().is_none_or(str::is_empty) {
        return Err(invalid("a host is required".to_string()));
    }
    Ok(())
}

fn decode_body(text: &str) -> Result<Value, ApiError> {
    if text.trim().is_empty() {
        return Ok(Value::Null);
    }
    serde_json::from_str(text).map_err(|error| ApiError::Payload(error.to_string()))
}

/// Pick the most useful message from an error response.
///
/// Order: JSON `message` field, non-JSON body text, then a generic status line.
fn rejection_message(status: StatusCode, body: &str) -> String {
    if let Ok(Value::Object(object)) = serde_json::from_str::<Value>(body)
        && let Some(message) = object.get("message").and_then(Value::as_str)
        && !message.trim().is_empty()
    {
        return message.to_string();
    }
    let trimmed = body.trim();
    if !trimmed.is_empty() && !trimmed.starts_with('{') {
        return trimmed.to_string();
    }
    format!("Request failed with status code {}", status.as_u16())
}

//! HTTP transport for the admin REST API.
//!
//! `ApiClient` injects the current bearer token, sends the request, and
//! classifies failures so every gateway sees the same error semantics.

use std::sync::Arc;
use std::time::Duration;

use reqwest::{header, Client, Method, Response};
use serde::de::DeserializeOwned;
use tracing::{debug, warn};
use url::Url;

use super::error::{classify_status, ApiError, ErrorKind};
use crate::auth::SessionStore;

// ============================================================================
// Constants
// ============================================================================

/// HTTP request timeout in seconds.
/// 30s allows for slow API responses while failing fast enough for good UX.
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

// ============================================================================
// Request
// ============================================================================

/// A request relative to the API base URL.
#[derive(Debug, Clone, PartialEq)]
pub struct Request {
    pub method: Method,
    pub path: String,
    pub query: Vec<(&'static str, String)>,
    pub body: Option<serde_json::Value>,
}

impl Request {
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

    pub fn patch(path: impl Into<String>) -> Self {
        Self::new(Method::PATCH, path)
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::DELETE, path)
    }

    /// Add a query parameter when a value is present. `None` and empty
    /// strings leave the parameter out entirely.
    pub fn query_opt(mut self, name: &'static str, value: Option<&str>) -> Self {
        if let Some(value) = value.filter(|v| !v.is_empty()) {
            self.query.push((name, value.to_string()));
        }
        self
    }

    /// Attach a JSON body.
    pub fn json<B: serde::Serialize>(mut self, body: &B) -> Result<Self, ApiError> {
        let value = serde_json::to_value(body)
            .map_err(|e| ApiError::InvalidRequest(format!("Failed to encode body: {e}")))?;
        self.body = Some(value);
        Ok(self)
    }
}

// ============================================================================
// Client
// ============================================================================

/// API client for the admin backend.
/// Clone is cheap - reqwest::Client uses Arc internally for connection pooling.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: Url,
    session: Arc<SessionStore>,
}

impl ApiClient {
    /// Create a new API client against `base_url`
    pub fn new(
        base_url: &str,
        timeout: Duration,
        session: Arc<SessionStore>,
    ) -> Result<Self, ApiError> {
        let base_url = Url::parse(base_url)
            .map_err(|e| ApiError::InvalidRequest(format!("Invalid base URL {base_url}: {e}")))?;

        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ApiError::InvalidRequest(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url,
            session,
        })
    }

    pub fn session(&self) -> &Arc<SessionStore> {
        &self.session
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Resolve a request path against the base URL, keeping any path prefix
    /// the base URL carries.
    fn url(&self, request: &Request) -> Result<Url, ApiError> {
        let mut url = self.base_url.clone();
        {
            let mut segments = url
                .path_segments_mut()
                .map_err(|_| ApiError::InvalidRequest("Base URL cannot hold a path".into()))?;
            segments.pop_if_empty();
            for segment in request.path.split('/').filter(|s| !s.is_empty()) {
                segments.push(segment);
            }
        }

        if !request.query.is_empty() {
            let mut pairs = url.query_pairs_mut();
            for (name, value) in &request.query {
                pairs.append_pair(name, value);
            }
        }
        Ok(url)
    }

    fn auth_headers(&self) -> Result<header::HeaderMap, ApiError> {
        let mut headers = header::HeaderMap::new();
        if let Some(token) = self.session.current_token() {
            let value = header::HeaderValue::from_str(&format!("Bearer {}", token))
                .map_err(|e| ApiError::InvalidRequest(format!("Invalid token: {e}")))?;
            headers.insert(header::AUTHORIZATION, value);
        }
        Ok(headers)
    }

    /// Send a request and classify the outcome.
    ///
    /// Order matters: no response at all is a network error; a 401 signs the
    /// session out before surfacing; 403, 422 and 5xx map to their errors.
    /// Any other response comes back untouched, success or not.
    pub async fn send(&self, request: Request) -> Result<Response, ApiError> {
        let url = self.url(&request)?;
        debug!(method = %request.method, %url, "Sending request");

        let mut builder = self
            .client
            .request(request.method.clone(), url.clone())
            .headers(self.auth_headers()?);
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let response = match builder.send().await {
            Ok(response) => response,
            Err(e) => {
                warn!(%url, error = %e, "Request failed without a response");
                return Err(ApiError::Network(Arc::new(e)));
            }
        };

        self.classify(response).await
    }

    async fn classify(&self, response: Response) -> Result<Response, ApiError> {
        let status = response.status();
        let Some(kind) = classify_status(status.as_u16()) else {
            return Ok(response);
        };

        if kind == ErrorKind::Authentication {
            warn!(url = %response.url(), "Server rejected credential, signing out");
            self.session.logout();
        }

        let body = response.text().await.unwrap_or_default();
        debug!(%status, ?kind, "Request classified as failure");
        Err(ApiError::from_classified(kind, status.as_u16(), &body))
    }

    /// Check if response is successful, returning an error with body if not.
    async fn check_response(response: Response) -> Result<Response, ApiError> {
        if response.status().is_success() {
            Ok(response)
        } else {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            Err(ApiError::unexpected_status(status.as_u16(), &body))
        }
    }

    /// Send and decode a JSON response body.
    pub async fn send_json<T: DeserializeOwned>(&self, request: Request) -> Result<T, ApiError> {
        let response = Self::check_response(self.send(request).await?).await?;
        let url = response.url().clone();
        response
            .json()
            .await
            .map_err(|e| ApiError::InvalidResponse(format!("Failed to parse JSON response from {url}: {e}")))
    }

    /// Send a request whose response body is irrelevant.
    pub async fn send_unit(&self, request: Request) -> Result<(), ApiError> {
        Self::check_response(self.send(request).await?).await?;
        Ok(())
    }
}

//! API Client Module
//!
//! Single-call HTTP executor for the Tractive REST API.

use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use reqwest::Method;
use tracing::debug;

/// Base URL of the Tractive graph API.
pub const API_BASE_URL: &str = "https://graph.tractive.com";

/// Client identifier expected by the vendor in the `X-Tractive-Client` header.
pub const CLIENT_ID: &str = "6536c228870a3c8857d452e8";

/// API client for the Tractive backend
pub struct ApiClient {
    base_url: String,
    client: reqwest::Client,
    verbose: bool,
}

impl ApiClient {
    /// Create a new API client.
    ///
    /// `verbose` enables wire-level dumping of every request and response at
    /// debug level. It is read-only after construction and never affects the
    /// result of a call.
    pub fn new(base_url: &str, verbose: bool) -> Self {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
            verbose,
        }
    }

    /// Execute a single request against the API and return the raw body.
    ///
    /// Always sends the fixed client-identifier and JSON content-type
    /// headers; the `Authorization: Bearer` header is added only when a
    /// token is supplied, so the unauthenticated login call goes through the
    /// same path. Exactly HTTP 200 succeeds; any other status is an error
    /// carrying the status text. No retry, no backoff.
    pub(crate) async fn execute(
        &self,
        method: Method,
        path: &str,
        query: &[(&str, String)],
        token: Option<&str>,
    ) -> Result<Vec<u8>, ApiError> {
        let url = format!("{}{}", self.base_url, path);

        let mut builder = self
            .client
            .request(method, url.as_str())
            .header("X-Tractive-Client", CLIENT_ID)
            .header(CONTENT_TYPE, "application/json");
        if !query.is_empty() {
            builder = builder.query(query);
        }
        if let Some(token) = token {
            builder = builder.header(AUTHORIZATION, format!("Bearer {}", token));
        }

        let request = builder
            .build()
            .map_err(|e| ApiError::Network(e.to_string()))?;

        if self.verbose {
            debug!("HTTP request: {} {}", request.method(), request.url());
            for (name, value) in request.headers() {
                debug!("  {}: {}", name, value.to_str().unwrap_or("<binary>"));
            }
        }

        let response = self
            .client
            .execute(request)
            .await
            .map_err(|e| ApiError::Network(e.to_string()))?;

        let status = response.status();
        if self.verbose {
            debug!("HTTP response: {}", status);
            for (name, value) in response.headers() {
                debug!("  {}: {}", name, value.to_str().unwrap_or("<binary>"));
            }
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| ApiError::Network(e.to_string()))?;

        if self.verbose {
            debug!("HTTP response body: {}", String::from_utf8_lossy(&body));
        }

        if status != reqwest::StatusCode::OK {
            return Err(ApiError::Status(status.to_string()));
        }

        Ok(body.to_vec())
    }
}

/// API errors
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("request failed: {0}")]
    Network(String),

    #[error("http status is {0}, expected 200 OK")]
    Status(String),

    #[error("failed to decode response: {0}")]
    Parse(String),
}

//! Shared HTTP transport
//!
//! One `reqwest::Client` is built at startup and handed to every adapter and
//! IP source through their factories, so the connection pool and timeouts are
//! process-wide. Adapters build their own signed `RequestBuilder`s and run
//! them through [`execute`]; response bodies go through [`decode`].
//!
//! Neither function retries.

use reqwest::RequestBuilder;
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::{debug, warn};

use crate::config::TransportConfig;
use crate::error::{Error, Result};

/// Longest response excerpt written to the log
const LOG_EXCERPT_LIMIT: usize = 256;

/// Status and body of a completed HTTP exchange
#[derive(Debug, Clone)]
pub struct RawResponse {
    /// HTTP status code
    pub status: u16,
    /// Response body as text
    pub body: String,
}

impl RawResponse {
    /// Whether the status is 2xx
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Build the shared HTTP client
pub fn build_http_client(config: &TransportConfig) -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(Duration::from_secs(config.timeout_secs))
        .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
        .pool_max_idle_per_host(config.pool_max_idle_per_host)
        .pool_idle_timeout(Duration::from_secs(config.pool_idle_timeout_secs))
        .user_agent(concat!("ddns-sync/", env!("CARGO_PKG_VERSION")))
        .build()
        .map_err(|e| Error::config(format!("Failed to build HTTP client: {}", e)))
}

/// Send a request and read the whole body
///
/// Non-2xx statuses are not errors here: vendors put their error envelope in
/// the body, and the caller decodes it.
///
/// # Parameters
///
/// - `provider`: Provider name, for errors and logs
/// - `action`: Operation or URL, for logs
/// - `request`: The fully built (and signed) request
pub async fn execute(provider: &str, action: &str, request: RequestBuilder) -> Result<RawResponse> {
    debug!("[{}] {}", provider, action);

    let response = request
        .send()
        .await
        .map_err(|e| Error::from_reqwest(provider, e))?;
    let status = response.status().as_u16();

    let body = response.text().await.map_err(|e| {
        Error::transport(provider, format!("Failed to read response body: {}", e))
    })?;

    debug!(
        "[{}] {} -> HTTP {}: {}",
        provider,
        action,
        status,
        excerpt(&body)
    );

    Ok(RawResponse { status, body })
}

/// Decode a response body into the expected envelope
pub fn decode<T: DeserializeOwned>(provider: &str, response: &RawResponse) -> Result<T> {
    serde_json::from_str(&response.body).map_err(|e| {
        warn!(
            "[{}] Undecodable response (HTTP {}): {}",
            provider,
            response.status,
            excerpt(&response.body)
        );
        Error::decode(provider, format!("HTTP {}: {}", response.status, e))
    })
}

/// Shorten a body for logging, on a char boundary
pub fn excerpt(body: &str) -> String {
    if body.len() <= LOG_EXCERPT_LIMIT {
        return body.to_string();
    }
    let mut end = LOG_EXCERPT_LIMIT;
    while !body.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}... [{} bytes]", &body[..end], body.len())
}

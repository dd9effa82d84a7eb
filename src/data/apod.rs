//! NASA APOD API client
//!
//! This module provides functionality to fetch a single Astronomy Picture of
//! the Day record from the NASA API and parse it into our Apod data
//! structures. One call performs exactly one HTTP GET; retries, timeouts and
//! failure accounting are layered on top by the circuit breaker.

use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, StatusCode};
use thiserror::Error;
use tracing::debug;

use super::{Apod, ApodResponse};

/// Base URL for the NASA APOD API
const APOD_BASE_URL: &str = "https://api.nasa.gov/planetary/apod";

/// Errors that can occur when fetching an APOD record
///
/// The circuit breaker treats every variant identically; there is no
/// permanent/transient distinction at this layer.
#[derive(Debug, Error)]
pub enum ApodError {
    /// HTTP request failed at the transport level
    #[error("HTTP request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),

    /// Upstream answered with a non-success status code
    #[error("unexpected status code: {0}")]
    UnexpectedStatus(StatusCode),

    /// Upstream answered with a body that is not declared as JSON
    #[error("unexpected content type: {0:?}")]
    UnexpectedContentType(Option<String>),

    /// Failed to parse the JSON response body
    #[error("failed to parse JSON response: {0}")]
    ParseError(#[from] serde_json::Error),
}

/// Client for fetching records from the NASA APOD API
#[derive(Debug, Clone)]
pub struct ApodClient {
    client: Client,
    base_url: String,
}

impl Default for ApodClient {
    fn default() -> Self {
        Self::new()
    }
}

impl ApodClient {
    /// Create a new ApodClient pointed at the NASA API
    pub fn new() -> Self {
        Self {
            client: Client::new(),
            base_url: APOD_BASE_URL.to_string(),
        }
    }

    /// Create a new ApodClient with a custom HTTP client
    #[allow(dead_code)]
    pub fn with_client(client: Client) -> Self {
        Self {
            client,
            base_url: APOD_BASE_URL.to_string(),
        }
    }

    /// Override the endpoint URL, e.g. to point at a mock server in tests
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Fetch the APOD record for the given date
    ///
    /// Performs one GET with `date`, `api_key` and `hd=true` query
    /// parameters. Success requires a 2xx status and a JSON content type;
    /// anything else is surfaced as an [`ApodError`]. The returned record
    /// has no identifier attached yet.
    ///
    /// # Arguments
    /// * `date` - Date string in `YYYY-MM-DD` form
    /// * `api_key` - NASA API key supplied by the caller
    pub async fn fetch(&self, date: &str, api_key: &str) -> Result<Apod, ApodError> {
        debug!(%date, "querying APOD API");

        let response = self
            .client
            .get(&self.base_url)
            .query(&[("date", date), ("api_key", api_key), ("hd", "true")])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ApodError::UnexpectedStatus(status));
        }

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(str::to_owned);
        let is_json = content_type
            .as_deref()
            .is_some_and(|value| value.starts_with("application/json"));
        if !is_json {
            return Err(ApodError::UnexpectedContentType(content_type));
        }

        let text = response.text().await?;
        let payload: ApodResponse = serde_json::from_str(&text)?;

        Ok(payload.into_apod(date))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_client_targets_nasa() {
        let client = ApodClient::new();
        assert_eq!(client.base_url, APOD_BASE_URL);
    }

    #[test]
    fn test_with_base_url_overrides_endpoint() {
        let client = ApodClient::new().with_base_url("http://127.0.0.1:8080/apod");
        assert_eq!(client.base_url, "http://127.0.0.1:8080/apod");
    }
}

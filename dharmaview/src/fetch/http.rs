//! HTTP client abstraction for testability

use std::time::Duration;

use bytes::Bytes;
use futures::future::BoxFuture;

use super::error::FetchFailure;

/// Default request timeout in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Trait for async HTTP client operations.
///
/// This abstraction allows for dependency injection and easier testing
/// by enabling mock HTTP clients in tests.
pub trait AsyncHttpClient: Send + Sync {
    /// Performs an HTTP GET request.
    ///
    /// Returns the response body for a success status. Any other status is
    /// reported as [`FetchFailure::Status`].
    fn get(&self, url: &str) -> BoxFuture<'_, Result<Bytes, FetchFailure>>;
}

/// Real HTTP client implementation using reqwest.
#[derive(Debug, Clone)]
pub struct ReqwestClient {
    client: reqwest::Client,
}

impl ReqwestClient {
    /// Creates a new ReqwestClient with default configuration.
    pub fn new() -> Result<Self, FetchFailure> {
        Self::with_timeout(Duration::from_secs(DEFAULT_TIMEOUT_SECS))
    }

    /// Creates a new ReqwestClient with custom timeout.
    pub fn with_timeout(timeout: Duration) -> Result<Self, FetchFailure> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| FetchFailure::ClientBuild(e.to_string()))?;

        Ok(Self { client })
    }
}

fn request_failure(e: reqwest::Error) -> FetchFailure {
    if e.is_timeout() {
        FetchFailure::Timeout
    } else {
        FetchFailure::Request(e.to_string())
    }
}

impl AsyncHttpClient for ReqwestClient {
    fn get(&self, url: &str) -> BoxFuture<'_, Result<Bytes, FetchFailure>> {
        let request = self.client.get(url);
        Box::pin(async move {
            let response = request.send().await.map_err(request_failure)?;

            let status = response.status();
            if !status.is_success() {
                return Err(FetchFailure::Status {
                    code: status.as_u16(),
                    reason: status.canonical_reason().unwrap_or("Unknown").to_string(),
                });
            }

            response.bytes().await.map_err(|e| {
                if e.is_timeout() {
                    FetchFailure::Timeout
                } else {
                    FetchFailure::Body(e.to_string())
                }
            })
        })
    }
}

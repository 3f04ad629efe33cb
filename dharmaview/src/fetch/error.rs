//! Fetch error types.

use thiserror::Error;

/// Why a single model download failed.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FetchFailure {
    /// The request could not be sent or the connection dropped.
    #[error("request failed: {0}")]
    Request(String),

    /// The request exceeded the client timeout.
    #[error("request timed out")]
    Timeout,

    /// The server answered with a non-success status.
    #[error("HTTP {code}: {reason}")]
    Status { code: u16, reason: String },

    /// The response body could not be read.
    #[error("failed to read response body: {0}")]
    Body(String),

    /// The HTTP client itself could not be constructed.
    #[error("failed to create HTTP client: {0}")]
    ClientBuild(String),
}

/// A model download failed during `resolve`.
///
/// Carries the URL that was requested so callers can offer a retry.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("failed to fetch {url}: {cause}")]
pub struct FetchError {
    pub url: String,
    #[source]
    pub cause: FetchFailure,
}

impl FetchError {
    pub fn new(url: impl Into<String>, cause: FetchFailure) -> Self {
        Self {
            url: url.into(),
            cause,
        }
    }

    /// True when the server answered but refused the request.
    pub fn is_status(&self) -> bool {
        matches!(self.cause, FetchFailure::Status { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn test_fetch_error_display_includes_url_and_cause() {
        let err = FetchError::new(
            "https://models.example/buddha.glb",
            FetchFailure::Status {
                code: 404,
                reason: "Not Found".to_string(),
            },
        );
        let msg = err.to_string();
        assert!(msg.contains("https://models.example/buddha.glb"));
        assert!(msg.contains("HTTP 404: Not Found"));
        assert!(err.is_status());
    }

    #[test]
    fn test_fetch_error_source_is_cause() {
        let err = FetchError::new("u", FetchFailure::Timeout);
        let source = err.source().map(|s| s.to_string());
        assert_eq!(source.as_deref(), Some("request timed out"));
        assert!(!err.is_status());
    }
}

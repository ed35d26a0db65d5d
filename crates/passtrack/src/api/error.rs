//! Remote API error types.

use thiserror::Error;

/// Errors that can occur when talking to the remote catalog/profile API.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The remote service signalled throttling (HTTP 429). Retryable.
    #[error("rate limited by remote API")]
    RateLimited,

    /// The requested resource does not exist (HTTP 404). Callers treat this
    /// as a legitimate empty result, not a failure.
    #[error("not found: {resource}")]
    NotFound { resource: String },

    /// Any other non-success status from the remote service.
    #[error("remote API error: status {status} for {resource}")]
    Status { status: u16, resource: String },

    /// Transport-level failure (connection, TLS, body read).
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// OAuth token acquisition failed.
    #[error("authentication failed: {0}")]
    Auth(String),
}

impl ApiError {
    /// Create a not-found error.
    #[inline]
    pub fn not_found(resource: impl Into<String>) -> Self {
        Self::NotFound {
            resource: resource.into(),
        }
    }

    /// Check if this error is a throttling signal (retryable).
    #[inline]
    pub fn is_rate_limited(&self) -> bool {
        matches!(self, Self::RateLimited)
    }

    /// Check if this error is a not-found condition (empty result).
    #[inline]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

/// Map a non-success HTTP status onto the error taxonomy.
pub fn classify_status(status: u16, resource: &str) -> ApiError {
    match status {
        404 => ApiError::not_found(resource),
        429 => ApiError::RateLimited,
        _ => ApiError::Status {
            status,
            resource: resource.to_string(),
        },
    }
}

/// Result type for remote API operations.
pub type Result<T> = std::result::Result<T, ApiError>;

use std::time::Duration;

use thiserror::Error;

/// Errors that can occur when calling the destination platform API.
#[derive(Debug, Error)]
pub enum ApiError {
    /// API error returned by the platform.
    #[error("API error: {message}")]
    Api { message: String },

    /// The platform throttled the request.
    #[error("Rate limited by destination (HTTP {status})")]
    RateLimited { status: u16 },

    /// Network or connection error.
    #[error("Network error: {message}")]
    Network { message: String },

    /// The call did not finish within its deadline.
    #[error("API call timed out after {after:?}")]
    Timeout { after: Duration },

    /// Unexpected/internal error.
    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl ApiError {
    /// Create an API error.
    #[inline]
    pub fn api(message: impl Into<String>) -> Self {
        Self::Api {
            message: message.into(),
        }
    }

    /// Create a network error.
    #[inline]
    pub fn network(message: impl Into<String>) -> Self {
        Self::Network {
            message: message.into(),
        }
    }

    /// Create a timeout error.
    #[inline]
    pub fn timeout(after: Duration) -> Self {
        Self::Timeout { after }
    }

    /// Create an internal error.
    #[inline]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }
}

/// Extract a short error message suitable for display.
///
/// Takes the first line of an error message, which keeps multi-line
/// subprocess output and API bodies out of progress events.
#[inline]
pub fn short_error_message(e: &impl std::error::Error) -> String {
    let full = e.to_string();
    full.lines().next().unwrap_or(&full).to_string()
}

/// Result type for destination API operations.
pub type Result<T> = std::result::Result<T, ApiError>;

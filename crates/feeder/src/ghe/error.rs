//! Mapping from octocrab errors to platform errors.

use crate::platform::ApiError;

/// Check if an octocrab error indicates throttling (403/429).
pub fn is_rate_limit_error(e: &octocrab::Error) -> bool {
    match e {
        octocrab::Error::GitHub { source, .. } => {
            let status = source.status_code.as_u16();
            status == 403 || status == 429
        }
        _ => false,
    }
}

/// Convert an octocrab error into the platform-agnostic [`ApiError`].
pub fn to_api_error(e: octocrab::Error) -> ApiError {
    match &e {
        octocrab::Error::GitHub { source, .. } if is_rate_limit_error(&e) => {
            ApiError::RateLimited {
                status: source.status_code.as_u16(),
            }
        }
        octocrab::Error::GitHub { source, .. } => ApiError::api(format!(
            "{} (HTTP {})",
            source.message,
            source.status_code.as_u16()
        )),
        octocrab::Error::Json { .. } => ApiError::internal(e.to_string()),
        _ => ApiError::network(e.to_string()),
    }
}

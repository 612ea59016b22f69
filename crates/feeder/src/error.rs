//! Error types shared by the feed pipeline.
//!
//! Every stage of the per-repository pipeline returns a [`StageError`]. The
//! pipeline driver tags it with the [`FailureCategory`] of the stage that
//! produced it, turning it into a [`FeedError`]. Cancellation is kept apart
//! from real failures so that a shutdown never shows up in failure counts.

use thiserror::Error;

use crate::git::GitError;
use crate::platform::ApiError;

pub use crate::entity::failure_category::FailureCategory;

/// The shared shutdown signal fired while an operation was waiting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("operation cancelled")]
pub struct Cancelled;

/// Error produced by a single pipeline stage, before categorisation.
#[derive(Debug, Error)]
pub enum StageError {
    /// A `git` subprocess failed.
    #[error(transparent)]
    Git(#[from] GitError),

    /// A destination API call failed.
    #[error(transparent)]
    Api(#[from] ApiError),

    /// Local filesystem error (scratch directory handling).
    #[error("Scratch directory error: {0}")]
    Io(#[from] std::io::Error),

    /// The stage was interrupted by shutdown.
    #[error(transparent)]
    Cancelled(#[from] Cancelled),
}

impl StageError {
    /// Check if this error came from a shutdown rather than a real failure.
    #[inline]
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled(_))
    }

    /// Tag this error with the stage it happened in.
    pub fn in_stage(self, category: FailureCategory) -> FeedError {
        match self {
            Self::Cancelled(_) => FeedError::Cancelled,
            source => FeedError::Failed { category, source },
        }
    }
}

/// Terminal error for one work item.
#[derive(Debug, Error)]
pub enum FeedError {
    /// The item failed in the given stage.
    #[error("{category} failure: {source}")]
    Failed {
        category: FailureCategory,
        #[source]
        source: StageError,
    },

    /// The item was interrupted by shutdown.
    #[error("operation cancelled")]
    Cancelled,
}

impl FeedError {
    /// The failure category, or `None` for cancellation.
    pub fn category(&self) -> Option<FailureCategory> {
        match self {
            Self::Failed { category, .. } => Some(*category),
            Self::Cancelled => None,
        }
    }
}

/// A line of input that is not an `owner/repo` token.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Malformed work item {line:?}: expected owner/repo")]
pub struct WorkItemError {
    /// The offending input, as received.
    pub line: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cancelled_stage_error_becomes_cancelled_feed_error() {
        let err = StageError::from(Cancelled).in_stage(FailureCategory::Push);
        assert!(matches!(err, FeedError::Cancelled));
        assert_eq!(err.category(), None);
    }

    #[test]
    fn stage_error_is_tagged_with_category() {
        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let err = StageError::from(io).in_stage(FailureCategory::Clone);

        assert_eq!(err.category(), Some(FailureCategory::Clone));
        assert!(err.to_string().starts_with("clone failure"));
        assert!(err.to_string().contains("denied"));
    }

    #[test]
    fn api_error_is_not_cancelled() {
        let err = StageError::from(ApiError::api("boom"));
        assert!(!err.is_cancelled());
        assert!(StageError::from(Cancelled).is_cancelled());
    }

    #[test]
    fn work_item_error_mentions_line() {
        let err = WorkItemError {
            line: "just-a-name".to_string(),
        };
        assert!(err.to_string().contains("just-a-name"));
    }
}

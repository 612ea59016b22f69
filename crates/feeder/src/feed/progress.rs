//! Progress reporting for feed runs.
//!
//! Workers and the dispatcher describe what they are doing through
//! [`FeedProgress`] events handed to an injected [`ProgressCallback`]. The
//! callback is the only observability channel; counters live in
//! [`FeedStats`](super::FeedStats), never in process globals.

use std::time::Duration;

use crate::error::FailureCategory;

/// Progress events emitted during a feed run.
#[derive(Debug, Clone)]
#[non_exhaustive]
pub enum FeedProgress {
    /// Input was read and the work queue filled.
    WorkQueued {
        /// Items handed to workers.
        queued: usize,
        /// Items skipped because they already have a record.
        skipped: usize,
        /// Lines that were not `owner/repo` tokens.
        malformed: usize,
        /// Worker count.
        workers: usize,
    },

    /// A line of input was not an `owner/repo` token.
    MalformedInput {
        /// The offending line.
        line: String,
    },

    /// A worker started placing repositories in a new organization.
    OrgSwitched {
        worker: usize,
        /// Organization name.
        org: String,
        /// Repositories it will hold.
        capacity: usize,
    },

    /// Creating an organization failed; the worker falls back to the default namespace.
    OrgCreateFailed {
        worker: usize,
        org: String,
        error: String,
    },

    /// A push failed and will be retried.
    PushRetry {
        worker: usize,
        item: String,
        /// Attempt that just failed (1-indexed).
        attempt: usize,
        /// Delay before the next attempt.
        retry_after: Duration,
        error: String,
    },

    /// An item was migrated.
    ItemSucceeded {
        worker: usize,
        item: String,
        /// Destination organization, `None` for the default namespace.
        org: Option<String>,
    },

    /// An item failed.
    ItemFailed {
        worker: usize,
        item: String,
        category: FailureCategory,
        error: String,
    },

    /// An item was interrupted by shutdown. Nothing is recorded for it.
    ItemCancelled { worker: usize, item: String },

    /// Writing to the bookkeeping store failed.
    BookkeepingError {
        worker: usize,
        /// Item key or organization name.
        subject: String,
        error: String,
    },

    /// Removing a scratch directory failed.
    CleanupFailed {
        worker: usize,
        path: String,
        error: String,
    },

    /// A worker drained the queue or stopped on shutdown.
    WorkerFinished {
        worker: usize,
        succeeded: usize,
        failed: usize,
        cancelled: usize,
    },
}

/// Callback for progress updates during a feed run.
pub type ProgressCallback = Box<dyn Fn(FeedProgress) + Send + Sync>;

/// Emit a progress event if a callback is provided.
#[inline]
pub fn emit(on_progress: Option<&ProgressCallback>, event: FeedProgress) {
    if let Some(cb) = on_progress {
        cb(event);
    }
}

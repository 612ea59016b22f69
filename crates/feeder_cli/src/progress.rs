//! Progress reporting for feed runs.
//!
//! Feed events are turned into structured `tracing` output, one line per
//! milestone. Item-level chatter (retries, per-item successes) goes to
//! `info`/`debug` and anything needing attention to `warn`.

use std::sync::Arc;

use feeder::feed::{FeedProgress, ProgressCallback};

/// Logging reporter using tracing for structured output.
#[derive(Debug, Default)]
pub struct LoggingReporter;

impl LoggingReporter {
    pub fn new() -> Self {
        Self
    }

    /// Wrap the reporter as a feed callback.
    pub fn as_callback(self: &Arc<Self>) -> ProgressCallback {
        let reporter = Arc::clone(self);
        Box::new(move |event| reporter.handle(event))
    }

    pub fn handle(&self, event: FeedProgress) {
        match event {
            FeedProgress::WorkQueued {
                queued,
                skipped,
                malformed,
                workers,
            } => {
                tracing::info!(queued, skipped, malformed, workers, "Work queued");
            }

            FeedProgress::MalformedInput { line } => {
                tracing::warn!(line = %line, "Skipping malformed input line");
            }

            FeedProgress::OrgSwitched {
                worker,
                org,
                capacity,
            } => {
                tracing::info!(worker, org = %org, capacity, "Created organization");
            }

            FeedProgress::OrgCreateFailed { worker, org, error } => {
                tracing::warn!(
                    worker,
                    org = %org,
                    error = %error,
                    "Failed to create organization, using default namespace"
                );
            }

            FeedProgress::PushRetry {
                worker,
                item,
                attempt,
                retry_after,
                error,
            } => {
                tracing::warn!(
                    worker,
                    repo = %item,
                    attempt,
                    retry_after_ms = retry_after.as_millis() as u64,
                    error = %error,
                    "Push failed, retrying"
                );
            }

            FeedProgress::ItemSucceeded { worker, item, org } => {
                tracing::info!(worker, repo = %item, org = ?org, "Migrated");
            }

            FeedProgress::ItemFailed {
                worker,
                item,
                category,
                error,
            } => {
                tracing::warn!(worker, repo = %item, category = %category, error = %error, "Failed");
            }

            FeedProgress::ItemCancelled { worker, item } => {
                tracing::debug!(worker, repo = %item, "Cancelled");
            }

            FeedProgress::BookkeepingError {
                worker,
                subject,
                error,
            } => {
                tracing::error!(worker, subject = %subject, error = %error, "Failed to record outcome");
            }

            FeedProgress::CleanupFailed {
                worker,
                path,
                error,
            } => {
                tracing::warn!(worker, path = %path, error = %error, "Failed to remove scratch directory");
            }

            FeedProgress::WorkerFinished {
                worker,
                succeeded,
                failed,
                cancelled,
            } => {
                tracing::debug!(worker, succeeded, failed, cancelled, "Worker finished");
            }

            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use feeder::error::FailureCategory;

    use super::*;

    #[test]
    fn handles_every_event_without_a_subscriber() {
        let reporter = LoggingReporter::new();
        let events = vec![
            FeedProgress::WorkQueued {
                queued: 3,
                skipped: 1,
                malformed: 0,
                workers: 2,
            },
            FeedProgress::MalformedInput {
                line: "not a repo".to_string(),
            },
            FeedProgress::OrgSwitched {
                worker: 0,
                org: "brave-turing-12".to_string(),
                capacity: 12,
            },
            FeedProgress::PushRetry {
                worker: 0,
                item: "octocat/hello".to_string(),
                attempt: 1,
                retry_after: Duration::from_millis(500),
                error: "remote hung up".to_string(),
            },
            FeedProgress::ItemFailed {
                worker: 1,
                item: "octocat/gone".to_string(),
                category: FailureCategory::Clone,
                error: "not found".to_string(),
            },
            FeedProgress::WorkerFinished {
                worker: 0,
                succeeded: 1,
                failed: 1,
                cancelled: 0,
            },
        ];

        for event in events {
            reporter.handle(event);
        }
    }

    #[test]
    fn callback_forwards_to_reporter() {
        let reporter = Arc::new(LoggingReporter::new());
        let callback = reporter.as_callback();
        callback(FeedProgress::ItemCancelled {
            worker: 0,
            item: "octocat/hello".to_string(),
        });
        assert_eq!(Arc::strong_count(&reporter), 2);
    }
}

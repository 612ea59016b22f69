//! Feed run options, constants and results.

use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use serde::Serialize;

use crate::error::FailureCategory;
use crate::org::{DEFAULT_MAX_ORG_CAPACITY, DEFAULT_MIN_ORG_CAPACITY};
use crate::platform::rate_limits;
use crate::retry::RetryConfig;

/// Default number of workers.
pub const DEFAULT_WORKERS: usize = 20;

/// Default number of concurrent clones across all workers.
pub const DEFAULT_CLONE_CONCURRENCY: usize = 10;

/// Default number of concurrent pushes across all workers.
pub const DEFAULT_PUSH_CONCURRENCY: usize = 10;

/// Default deadline for one clone or one push attempt, in seconds.
pub const DEFAULT_CLONE_TIMEOUT_SECS: u64 = 30 * 60;

/// Deadline for a single destination API call.
pub const API_TIMEOUT: Duration = Duration::from_secs(30);

/// Default source base URL items are cloned from.
pub const DEFAULT_SOURCE_BASE: &str = "https://github.com";

/// Name of the destination remote added to each checkout.
pub const DEFAULT_REMOTE_NAME: &str = "ghe";

/// Ref pushed to the destination.
pub const DEFAULT_PUSH_BRANCH: &str = "HEAD";

/// Where and as whom repositories are created.
#[derive(Clone, Default)]
pub struct Destination {
    /// Hostname used in push URLs (e.g. `ghe.example.com`).
    pub host: String,
    /// Access token embedded in push URLs.
    pub token: String,
    /// Account made owner of created organizations.
    pub admin: String,
}

impl fmt::Debug for Destination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Destination")
            .field("host", &self.host)
            .field("token", &"<redacted>")
            .field("admin", &self.admin)
            .finish()
    }
}

/// Options for a feed run.
#[derive(Debug, Clone)]
pub struct FeedOptions {
    /// Number of workers.
    pub workers: usize,
    /// Clone gate capacity.
    pub clone_concurrency: usize,
    /// Push gate capacity.
    pub push_concurrency: usize,
    /// Destination API requests per second.
    pub api_rps: u32,
    /// Deadline for each destination API call.
    pub api_timeout: Duration,
    /// Deadline for each clone and each push attempt.
    pub clone_timeout: Duration,
    /// Push retry policy.
    pub push_retry: RetryConfig,
    /// Root of the per-worker scratch directories.
    pub scratch_dir: PathBuf,
    /// Base URL items are cloned from.
    pub source_base: String,
    /// Destination host and credentials.
    pub destination: Destination,
    /// Smallest organization capacity.
    pub org_min_capacity: usize,
    /// Exclusive upper bound of the organization capacity draw.
    pub org_max_capacity: usize,
    /// Seed for organization names; `None` seeds from the OS.
    pub org_seed: Option<u64>,
    /// Name of the destination remote.
    pub remote_name: String,
    /// Ref to push.
    pub push_branch: String,
    /// Skip items that already have a record.
    pub resume: bool,
}

impl Default for FeedOptions {
    fn default() -> Self {
        Self {
            workers: DEFAULT_WORKERS,
            clone_concurrency: DEFAULT_CLONE_CONCURRENCY,
            push_concurrency: DEFAULT_PUSH_CONCURRENCY,
            api_rps: rate_limits::GHE_DEFAULT_RPS,
            api_timeout: API_TIMEOUT,
            clone_timeout: Duration::from_secs(DEFAULT_CLONE_TIMEOUT_SECS),
            push_retry: RetryConfig::default(),
            scratch_dir: std::env::temp_dir().join("feeder"),
            source_base: DEFAULT_SOURCE_BASE.to_string(),
            destination: Destination::default(),
            org_min_capacity: DEFAULT_MIN_ORG_CAPACITY,
            org_max_capacity: DEFAULT_MAX_ORG_CAPACITY,
            org_seed: None,
            remote_name: DEFAULT_REMOTE_NAME.to_string(),
            push_branch: DEFAULT_PUSH_BRANCH.to_string(),
            resume: true,
        }
    }
}

/// What one worker did.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct WorkerReport {
    pub worker: usize,
    pub succeeded: usize,
    pub clone_failures: usize,
    pub api_failures: usize,
    pub push_failures: usize,
    pub cancelled: usize,
    /// Organizations created and declared by this worker.
    pub orgs_created: usize,
}

impl WorkerReport {
    /// Count one failure in `category`.
    pub fn add_failure(&mut self, category: FailureCategory) {
        match category {
            FailureCategory::Clone => self.clone_failures += 1,
            FailureCategory::Api => self.api_failures += 1,
            FailureCategory::Push => self.push_failures += 1,
        }
    }

    /// Total failed items.
    pub fn failed(&self) -> usize {
        self.clone_failures + self.api_failures + self.push_failures
    }
}

/// Result of a feed run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FeedSummary {
    /// Items dispatched to workers.
    pub queued: usize,
    /// Items skipped because they were already recorded.
    pub skipped: usize,
    /// Lines that were not `owner/repo` tokens.
    pub malformed: usize,
    pub succeeded: usize,
    pub clone_failures: usize,
    pub api_failures: usize,
    pub push_failures: usize,
    /// Items interrupted by shutdown.
    pub cancelled: usize,
    /// Workers whose task panicked.
    pub crashed_workers: usize,
    pub workers: Vec<WorkerReport>,
}

impl FeedSummary {
    /// Total failed items across categories.
    pub fn failed(&self) -> usize {
        self.clone_failures + self.api_failures + self.push_failures
    }

    /// Items dispatched but never finished (shutdown before they were pulled).
    pub fn unprocessed(&self) -> usize {
        self.queued
            .saturating_sub(self.succeeded + self.failed() + self.cancelled)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_options() {
        let options = FeedOptions::default();
        assert_eq!(options.workers, DEFAULT_WORKERS);
        assert_eq!(options.api_timeout, Duration::from_secs(30));
        assert_eq!(options.org_min_capacity, 5);
        assert_eq!(options.org_max_capacity, 500);
        assert_eq!(options.remote_name, "ghe");
        assert_eq!(options.push_branch, "HEAD");
        assert!(options.resume);
    }

    #[test]
    fn destination_debug_redacts_token() {
        let destination = Destination {
            host: "ghe.example.com".to_string(),
            token: "s3cret".to_string(),
            admin: "site-admin".to_string(),
        };
        let debug_str = format!("{destination:?}");
        assert!(!debug_str.contains("s3cret"));
        assert!(debug_str.contains("ghe.example.com"));
    }

    #[test]
    fn worker_report_counts_failures_by_category() {
        let mut report = WorkerReport::default();
        report.add_failure(FailureCategory::Api);
        report.add_failure(FailureCategory::Push);
        report.add_failure(FailureCategory::Push);
        assert_eq!(report.api_failures, 1);
        assert_eq!(report.push_failures, 2);
        assert_eq!(report.failed(), 3);
    }

    #[test]
    fn summary_totals() {
        let summary = FeedSummary {
            queued: 10,
            succeeded: 5,
            clone_failures: 1,
            push_failures: 2,
            cancelled: 1,
            ..Default::default()
        };
        assert_eq!(summary.failed(), 3);
        assert_eq!(summary.unprocessed(), 1);
    }
}
